//! Generic rendering used for unregistered strategies and as the fallback
//! of every specialised handler.

use serde_json::Value;

use super::{Command, ResultRenderer, SurfaceSlot, Surfaces};
use crate::render::{RenderNode, Surface, Tone};

#[derive(Debug, Clone, Default)]
pub struct DefaultRenderer;

impl ResultRenderer for DefaultRenderer {
    fn render_results(
        &mut self,
        data: Option<&Value>,
        message: Option<&str>,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        if let Some(data) = data {
            render_default(data, message, surfaces.get_mut(slot));
        }
        Vec::new()
    }
}

/// Message banner, present only for a non-empty message.
pub fn banner(message: Option<&str>) -> Option<RenderNode> {
    match message {
        Some(text) if !text.is_empty() => Some(RenderNode::Banner {
            text: text.to_string(),
            tone: Tone::Accent,
        }),
        _ => None,
    }
}

/// Structured data is shown verbatim as pretty JSON, primitives as text.
pub fn render_default(data: &Value, message: Option<&str>, surface: &mut Surface) {
    let mut nodes: Vec<RenderNode> = banner(message).into_iter().collect();
    nodes.push(match data {
        Value::String(text) => RenderNode::text(text.clone()),
        Value::Bool(_) | Value::Number(_) => RenderNode::text(data.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => RenderNode::Json {
            text: serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        },
    });
    surface.replace(nodes);
}

//! Triage results: one card per assessed dimension.

use serde_json::Value;
use tracing::debug;

use super::default::{banner, render_default};
use super::vault;
use super::{Command, Outcome, Purpose, ResultRenderer, SurfaceSlot, Surfaces};
use crate::descriptor::cell_text;
use crate::render::{Card, Control, Interaction, RenderNode, Tier};

/// One record of a triage payload. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionRecord {
    pub dimension: Value,
    pub status: Value,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
    pub focus: Option<String>,
}

impl DimensionRecord {
    /// Read each field on its own; a field of the wrong shape is dropped
    /// without affecting its neighbours. Non-object items yield an empty record.
    pub fn from_value(item: &Value) -> Self {
        let field = |key: &str| item.get(key).cloned().unwrap_or(Value::Null);
        let string = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            dimension: field("dimension"),
            status: field("status"),
            severity: string("severity"),
            confidence: item.get("confidence").and_then(number_like),
            focus: string("focus"),
        }
    }

    pub fn to_card(&self) -> Card {
        let focus = self
            .focus
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or("Analysis");
        Card {
            title: cell_text(&self.dimension),
            headline: cell_text(&self.status),
            tier: Tier::from_severity(self.severity.as_deref()),
            caption: focus.to_string(),
            badge: confidence_badge(self.confidence.unwrap_or(0.0)),
        }
    }
}

/// A JSON number, or a string holding one.
fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `0.92` → `"92% Conf"`.
pub fn confidence_badge(confidence: f64) -> String {
    format!("{}% Conf", (confidence * 100.0).round() as i64)
}

/// Accept a JSON array, or an object whose every key is an integer (an
/// array serialised as a map). Values of the latter come back ordered by key.
pub fn normalize_array_like(data: &Value) -> Option<Vec<Value>> {
    match data {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => {
            let mut indexed = Vec::with_capacity(map.len());
            for (key, value) in map {
                let index: i64 = key.trim().parse().ok()?;
                indexed.push((index, value.clone()));
            }
            indexed.sort_by_key(|(index, _)| *index);
            Some(indexed.into_iter().map(|(_, v)| v).collect())
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DimensionCardsRenderer {
    /// The dataset currently on screen, posted verbatim on save.
    records: Option<Vec<Value>>,
    rendered_in: Option<SurfaceSlot>,
    saving: bool,
}

impl DimensionCardsRenderer {
    pub fn records(&self) -> Option<&[Value]> {
        self.records.as_deref()
    }
}

impl ResultRenderer for DimensionCardsRenderer {
    fn render_results(
        &mut self,
        data: Option<&Value>,
        message: Option<&str>,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let Some(data) = data else {
            return Vec::new();
        };
        let surface = surfaces.get_mut(slot);

        let Some(items) = normalize_array_like(data) else {
            render_default(data, message, surface);
            return Vec::new();
        };

        debug!(count = items.len(), "Rendering dimension cards");
        let cards = items
            .iter()
            .map(|item| DimensionRecord::from_value(item).to_card())
            .collect();

        let mut nodes: Vec<RenderNode> = banner(message).into_iter().collect();
        nodes.push(RenderNode::Cards(cards));
        nodes.push(vault::save_button(self.saving));
        surface.replace(nodes);

        self.records = Some(items);
        self.rendered_in = Some(slot);
        Vec::new()
    }

    fn on_interaction(
        &mut self,
        interaction: Interaction,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        if interaction != Interaction::Press(Control::SaveAnalysis) || self.saving {
            return Vec::new();
        }
        let Some(records) = &self.records else {
            return vec![Command::notify(
                "No analysis data to save!",
                crate::render::Tone::Warning,
            )];
        };
        self.saving = true;
        vault::set_saving(surfaces.get_mut(slot), true);
        vec![vault::save_request(Value::Array(records.clone()), slot)]
    }

    fn on_response(
        &mut self,
        purpose: Purpose,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        if purpose != Purpose::SaveAnalysis {
            return Vec::new();
        }
        self.saving = false;
        let surface = surfaces.get_mut(self.rendered_in.unwrap_or(slot));
        vault::set_saving(surface, false);
        vault::save_outcome(outcome, surface)
    }
}

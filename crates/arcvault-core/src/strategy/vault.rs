//! Save-to-Vault affordance shared by the card handlers.

use serde_json::Value;
use tracing::warn;

use super::{BackendRequest, Command, Outcome, Purpose, SurfaceSlot};
use crate::render::{Control, RenderNode, Surface, Tone};

pub const SAVE_ACTION: &str = "save_analysis";
pub const SAVE_LABEL: &str = "Save to Vault";
const SAVING_LABEL: &str = "Saving...";

pub fn save_button(saving: bool) -> RenderNode {
    if saving {
        RenderNode::button(Control::SaveAnalysis, SAVING_LABEL, false)
    } else {
        RenderNode::button(Control::SaveAnalysis, SAVE_LABEL, true)
    }
}

/// Swap the save button in place, keeping the rest of the surface.
pub fn set_saving(surface: &mut Surface, saving: bool) {
    for node in surface.nodes.iter_mut() {
        if matches!(
            node,
            RenderNode::Button {
                control: Control::SaveAnalysis,
                ..
            }
        ) {
            *node = save_button(saving);
        }
    }
}

pub fn save_request(payload: Value, slot: SurfaceSlot) -> Command {
    Command::Run(BackendRequest::new(
        Purpose::SaveAnalysis,
        slot,
        SAVE_ACTION,
        Some(payload),
    ))
}

/// Notify the user of a save outcome. Transport failures also leave an
/// inline notice on the surface.
pub fn save_outcome(outcome: Outcome, surface: &mut Surface) -> Vec<Command> {
    match outcome {
        Ok(result) if result.is_success() => {
            let id = result.saved_id().unwrap_or_else(|| "unknown".to_string());
            vec![Command::notify(
                format!("Saved to Vault! ID: {id}"),
                Tone::Success,
            )]
        }
        Ok(result) => vec![Command::notify(
            format!("Save failed: {}", result.message),
            Tone::Error,
        )],
        Err(e) => {
            warn!("Save to vault failed: {}", e);
            surface.push(RenderNode::notice(
                format!("Error saving to vault: {e}"),
                Tone::Error,
            ));
            vec![Command::notify("Error saving to vault.", Tone::Error)]
        }
    }
}

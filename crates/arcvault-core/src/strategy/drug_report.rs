//! Pharmacy check results: optional patient summary plus one card per drug.

use serde_json::Value;
use tracing::debug;

use super::default::{banner, render_default};
use super::vault;
use super::{Command, Outcome, Purpose, ResultRenderer, SurfaceSlot, Surfaces};
use crate::descriptor::cell_text;
use crate::render::{CheckLine, Control, DrugCard, Interaction, RenderNode, Tier, Tone};

fn text_field(item: &Value, key: &str) -> String {
    item.get(key).map(cell_text).unwrap_or_default()
}

fn check_line(check: &Value) -> CheckLine {
    CheckLine {
        label: text_field(check, "label"),
        value: text_field(check, "value"),
        tier: Tier::from_severity(check.get("status").and_then(Value::as_str)),
    }
}

/// Each field is read on its own so one malformed value cannot blank the
/// rest of the drug. A `checks` that is not an array means no checks.
fn drug_card(item: &Value) -> DrugCard {
    let checks = match item.get("checks") {
        Some(Value::Array(checks)) => checks.iter().map(check_line).collect(),
        _ => Vec::new(),
    };
    DrugCard {
        name: text_field(item, "name"),
        structure: text_field(item, "smiles"),
        checks,
    }
}

fn drug_cards(drugs: &Value) -> Vec<DrugCard> {
    let Value::Array(items) = drugs else {
        return Vec::new();
    };
    items.iter().map(drug_card).collect()
}

#[derive(Debug, Clone, Default)]
pub struct DrugReportRenderer {
    /// Whole `data` object of the last report, saved as-is.
    report: Option<Value>,
    rendered_in: Option<SurfaceSlot>,
    saving: bool,
}

impl ResultRenderer for DrugReportRenderer {
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

        let drugs = match data.get("drugs") {
            Some(drugs) if !drugs.is_null() => drugs,
            _ => {
                render_default(data, message, surface);
                return Vec::new();
            }
        };

        let cards = drug_cards(drugs);
        debug!(count = cards.len(), "Rendering drug report");

        let mut nodes: Vec<RenderNode> = banner(message).into_iter().collect();
        match data.get("summary") {
            Some(Value::Null) | None => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(summary) => nodes.push(RenderNode::Summary {
                title: "Patient Summary".to_string(),
                text: cell_text(summary),
            }),
        }
        nodes.push(RenderNode::DrugCards(cards));
        nodes.push(vault::save_button(self.saving));
        surface.replace(nodes);

        self.report = Some(data.clone());
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
        let Some(report) = &self.report else {
            return vec![Command::notify("No analysis data to save!", Tone::Warning)];
        };
        self.saving = true;
        vault::set_saving(surfaces.get_mut(slot), true);
        vec![vault::save_request(report.clone(), slot)]
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

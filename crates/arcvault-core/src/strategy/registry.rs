//! Strategy id → handler resolution.

use tracing::debug;

use super::{
    ConsultationController, ConversationController, DefaultRenderer, DimensionCardsRenderer,
    DrugReportRenderer, Handler,
};
use crate::config::ArcvaultConfig;

/// Resolves a strategy identifier to a freshly constructed handler.
///
/// The set of specialised handlers is fixed at compile time; any other id
/// gets the generic renderer.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRegistry {
    max_turns: u32,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_TURNS)
    }
}

impl StrategyRegistry {
    pub fn new(max_turns: u32) -> Self {
        Self { max_turns }
    }

    pub fn from_config(config: &ArcvaultConfig) -> Self {
        Self::new(config.conversation.max_turns)
    }

    pub fn resolve(&self, id: &str) -> Handler {
        let handler = match id {
            "home_triage" => Handler::DimensionCards(DimensionCardsRenderer::default()),
            "pharmacy" => Handler::DrugReport(DrugReportRenderer::default()),
            "intake" => Handler::Conversational(ConversationController::new(self.max_turns)),
            "consult" => Handler::Consultation(ConsultationController::default()),
            _ => Handler::Default(DefaultRenderer),
        };
        debug!(strategy = id, handler = handler.name(), "Resolved strategy handler");
        handler
    }
}

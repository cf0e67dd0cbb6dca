//! Strategy handlers: the rendering side of each clinical workflow.
//!
//! A handler receives opaque result payloads and user interactions, writes
//! render nodes into the surfaces it is given and returns the side effects it
//! wants performed as `Command`s. The dashboard routes the outcome of every
//! backend call back to the handler that asked for it.

pub mod consultation;
pub mod conversation;
pub mod default;
pub mod dimension_cards;
pub mod drug_report;
pub mod registry;
mod vault;

use std::time::Duration;

use serde_json::Value;

use crate::render::{Interaction, Surface, Tone};
use crate::result::ActionResult;

pub use consultation::{ConsultationController, TranscriptSegment};
pub use conversation::{ConversationController, ConversationPhase};
pub use default::DefaultRenderer;
pub use dimension_cards::DimensionCardsRenderer;
pub use drug_report::DrugReportRenderer;
pub use registry::StrategyRegistry;

/// Which of the two surfaces of the strategy panel is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSlot {
    /// Generic result area, hidden until the first action runs.
    Result,
    /// Area a handler may take over as soon as the strategy is mounted.
    Custom,
}

/// The two surfaces owned by the active strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Surfaces {
    pub result: Surface,
    pub custom: Surface,
}

impl Default for Surfaces {
    fn default() -> Self {
        Self {
            result: Surface::hidden(),
            custom: Surface {
                visible: true,
                ..Surface::default()
            },
        }
    }
}

impl Surfaces {
    pub fn get(&self, slot: SurfaceSlot) -> &Surface {
        match slot {
            SurfaceSlot::Result => &self.result,
            SurfaceSlot::Custom => &self.custom,
        }
    }

    pub fn get_mut(&mut self, slot: SurfaceSlot) -> &mut Surface {
        match slot {
            SurfaceSlot::Result => &mut self.result,
            SurfaceSlot::Custom => &mut self.custom,
        }
    }
}

/// Why a handler issued a backend call; echoed back with the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    SaveAnalysis,
    StartConversation,
    SendMessage,
    GenerateReport,
    SaveReport,
    LoadAudio,
    Transcribe,
    GenerateNote,
    SaveNote,
}

/// A backend call requested by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub purpose: Purpose,
    pub slot: SurfaceSlot,
    pub action: String,
    pub payload: Option<Value>,
}

impl BackendRequest {
    pub fn new(
        purpose: Purpose,
        slot: SurfaceSlot,
        action: impl Into<String>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            purpose,
            slot,
            action: action.into(),
            payload,
        }
    }
}

/// Side effects a handler asks the runtime to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(BackendRequest),
    /// Transient user notification (the status line).
    Notify { text: String, tone: Tone },
    /// Start the simulated loading timer for this handler.
    StartProgress,
    /// Cancel the simulated loading timer.
    StopProgress,
    /// Discard this handler and activate the strategy again.
    Reactivate,
}

impl Command {
    pub fn notify(text: impl Into<String>, tone: Tone) -> Self {
        Command::Notify {
            text: text.into(),
            tone,
        }
    }
}

/// Result of a backend call: the parsed response or a transport error.
pub type Outcome = std::result::Result<ActionResult, String>;

/// Rendering contract shared by every strategy handler.
pub trait ResultRenderer {
    /// Render `data` (with an optional status `message`) into `slot`.
    ///
    /// Called with `data == None` right after the strategy is mounted so
    /// handlers that own their UI can initialise it.
    fn render_results(
        &mut self,
        data: Option<&Value>,
        message: Option<&str>,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command>;

    /// A button press or text submission on `slot`.
    fn on_interaction(
        &mut self,
        interaction: Interaction,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let _ = (interaction, slot, surfaces);
        Vec::new()
    }

    /// Completion of a request this handler issued.
    fn on_response(
        &mut self,
        purpose: Purpose,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let _ = (purpose, outcome, slot, surfaces);
        Vec::new()
    }

    /// One period of the loading-progress timer.
    fn on_progress_tick(&mut self, surfaces: &mut Surfaces) {
        let _ = surfaces;
    }

    /// UI clock tick.
    fn on_tick(&mut self, elapsed: Duration, surfaces: &mut Surfaces) {
        let _ = (elapsed, surfaces);
    }
}

/// The closed set of handler variants, resolved by `StrategyRegistry`.
#[derive(Debug, Clone)]
pub enum Handler {
    Default(DefaultRenderer),
    DimensionCards(DimensionCardsRenderer),
    DrugReport(DrugReportRenderer),
    Conversational(ConversationController),
    Consultation(ConsultationController),
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Default(_) => "default",
            Handler::DimensionCards(_) => "dimension_cards",
            Handler::DrugReport(_) => "drug_report",
            Handler::Conversational(_) => "conversational",
            Handler::Consultation(_) => "consultation",
        }
    }

    fn renderer(&mut self) -> &mut dyn ResultRenderer {
        match self {
            Handler::Default(h) => h,
            Handler::DimensionCards(h) => h,
            Handler::DrugReport(h) => h,
            Handler::Conversational(h) => h,
            Handler::Consultation(h) => h,
        }
    }
}

impl ResultRenderer for Handler {
    fn render_results(
        &mut self,
        data: Option<&Value>,
        message: Option<&str>,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        self.renderer().render_results(data, message, slot, surfaces)
    }

    fn on_interaction(
        &mut self,
        interaction: Interaction,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        self.renderer().on_interaction(interaction, slot, surfaces)
    }

    fn on_response(
        &mut self,
        purpose: Purpose,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        self.renderer().on_response(purpose, outcome, slot, surfaces)
    }

    fn on_progress_tick(&mut self, surfaces: &mut Surfaces) {
        self.renderer().on_progress_tick(surfaces)
    }

    fn on_tick(&mut self, elapsed: Duration, surfaces: &mut Surfaces) {
        self.renderer().on_tick(elapsed, surfaces)
    }
}

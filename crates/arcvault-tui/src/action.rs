//! Action enum, the message bus of the TUI.
//! All user interactions and async results flow through here.

use uuid::Uuid;

use arcvault_core::dashboard::Origin;
use arcvault_core::descriptor::StrategyDescriptor;
use arcvault_core::render::{Interaction, Tone};
use arcvault_core::strategy::{Outcome, SurfaceSlot};

/// Every possible action that can occur in the application.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Global ──────────────────────────────────────────────
    /// Quit the application.
    Quit,
    /// Toggle help overlay.
    ToggleHelp,
    /// Display a message in the status bar.
    Notify { text: String, tone: Tone },
    /// Clear the status message.
    ClearStatus,
    /// A tick event for animations and the playback clock.
    Tick,
    /// Re-fetch the strategy list.
    Refresh,

    // ── Focus ───────────────────────────────────────────────
    /// Move keyboard focus between the sidebar and the strategy panel.
    FocusNext,
    FocusPrev,

    // ── Dashboard ───────────────────────────────────────────
    /// Open a strategy from the navigation list.
    SelectStrategy(String),
    /// Run a descriptor action with the current input values.
    TriggerAction(String),
    /// Commit the value of an input field.
    SetInput { index: usize, value: String },
    /// A control pressed or text submitted on a surface.
    Interact {
        slot: SurfaceSlot,
        interaction: Interaction,
    },

    // ── Async results ───────────────────────────────────────
    /// `GET /api/strategies` completed.
    StrategiesLoaded(Result<Vec<StrategyDescriptor>, String>),
    /// A `POST /api/run/:id` completed.
    RunFinished {
        instance: Uuid,
        origin: Origin,
        outcome: Outcome,
    },
    /// One period of the loading-progress timer.
    ProgressTick(Uuid),

    // ── Text Input ───────────────────────────────────────────
    /// A character was typed (only sent when in input mode).
    CharInput(char),
    /// Backspace pressed (only sent when in input mode).
    BackspaceInput,
    /// Delete word (Ctrl+W).
    DeleteWord,
    /// Bulk paste from bracketed paste mode (terminal sends entire text at once).
    PasteBulk(String),
    /// Enter in input mode.
    SubmitInput,
    /// Esc in input mode.
    CancelInput,

    // ── Scrolling / Selection ───────────────────────────────
    SelectNext,
    SelectPrev,
    Confirm,
}

/// Whether the app is in a text-input mode where raw keys should
/// be forwarded to the active component instead of interpreted as
/// global shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keys are global shortcuts.
    Normal,
    /// Keys go to the field being edited.
    Editing,
}

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Sidebar,
    Panel,
}

impl Focus {
    pub fn toggle(self) -> Focus {
        match self {
            Focus::Sidebar => Focus::Panel,
            Focus::Panel => Focus::Sidebar,
        }
    }
}

//! Component trait and all TUI components.
//!
//! Each component owns its view state (cursor, edit buffers) and a snapshot
//! of the dashboard data it draws, refreshed by the App after every action.

pub mod help;
pub mod sidebar;
pub mod status_bar;
pub mod strategy_panel;
pub mod surface_view;

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::action::Action;

/// Trait implemented by all TUI components.
pub trait Component {
    /// Handle an action and optionally return a new action to dispatch.
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        let _ = action;
        None
    }

    /// Render the component into the given area.
    fn render(&self, frame: &mut Frame, area: Rect);
}

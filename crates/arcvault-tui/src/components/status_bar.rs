//! Status bar at the bottom of the TUI.

use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use arcvault_core::render::Tone;

use crate::action::{Action, Focus};
use crate::components::Component;
use crate::theme::Theme;

/// A user notification and when it was raised.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
    pub at: DateTime<Local>,
}

pub struct StatusBarComponent {
    pub message: Option<StatusMessage>,
    pub focus: Focus,
    /// Name of the active strategy.
    pub strategy: Option<String>,
    /// The startup message is still showing.
    connecting: bool,
}

impl StatusBarComponent {
    pub fn new() -> Self {
        Self {
            message: Some(StatusMessage {
                text: "Connecting to ArcVault backend...".to_string(),
                tone: Tone::Muted,
                at: Local::now(),
            }),
            focus: Focus::Sidebar,
            strategy: None,
            connecting: true,
        }
    }

    fn badge(&self) -> String {
        match (&self.strategy, self.focus) {
            (_, Focus::Sidebar) => "Strategies".to_string(),
            (Some(name), Focus::Panel) => name.clone(),
            (None, Focus::Panel) => "Panel".to_string(),
        }
    }
}

impl Component for StatusBarComponent {
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        match action {
            Action::StrategiesLoaded(Ok(_)) if self.connecting => {
                self.connecting = false;
                self.message = None;
                None
            }
            Action::Notify { text, tone } => {
                self.connecting = false;
                self.message = Some(StatusMessage {
                    text: text.clone(),
                    tone: *tone,
                    at: Local::now(),
                });
                None
            }
            Action::ClearStatus => {
                self.message = None;
                None
            }
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let width = area.width as usize;

        let hints = "q·?·Tab·Enter·r";
        let hints_len = hints.chars().count() + 1;

        let badge = self.badge();
        let badge_len = badge.chars().count() + 2;

        let (stamp, text, tone) = match &self.message {
            Some(m) => (m.at.format("%H:%M:%S ").to_string(), m.text.as_str(), m.tone),
            None => (String::new(), "", Tone::Muted),
        };

        let msg_budget = width
            .saturating_sub(badge_len)
            .saturating_sub(hints_len)
            .saturating_sub(stamp.len())
            .saturating_sub(4);
        let msg: String = if text.chars().count() > msg_budget {
            if msg_budget > 3 {
                let cut: String = text.chars().take(msg_budget - 3).collect();
                format!("{cut}...")
            } else {
                String::new()
            }
        } else {
            text.to_string()
        };

        let used = badge_len + 2 + stamp.len() + msg.chars().count();
        let pad = width.saturating_sub(used + hints_len);

        let line = Line::from(vec![
            Span::styled(format!(" {badge} "), Theme::muted()),
            Span::styled("  ", Theme::dim()),
            Span::styled(stamp, Theme::dim()),
            Span::styled(msg, Style::default().fg(Theme::tone(tone))),
            Span::raw(" ".repeat(pad)),
            Span::styled(hints, Theme::key_hint()),
            Span::raw(" "),
        ]);

        frame.render_widget(Paragraph::new(line).style(Theme::status_bar()), area);
    }
}

//! Help overlay: keybinding reference.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::action::Action;
use crate::components::Component;
use crate::theme::Theme;

pub struct HelpComponent {
    pub visible: bool,
}

impl HelpComponent {
    pub fn new() -> Self {
        Self { visible: false }
    }
}

pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(height),
        Constraint::Min(0),
    ])
    .flex(Flex::Center)
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(width),
        Constraint::Min(0),
    ])
    .flex(Flex::Center)
    .areas(middle);

    center
}

impl Component for HelpComponent {
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        match action {
            Action::ToggleHelp => {
                self.visible = !self.visible;
                None
            }
            // Timers and backend results must not dismiss the overlay.
            Action::Tick
            | Action::ProgressTick(_)
            | Action::StrategiesLoaded(_)
            | Action::RunFinished { .. }
            | Action::Notify { .. } => None,
            _ if self.visible => {
                self.visible = false;
                None
            }
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.visible {
            return;
        }

        let dialog = centered_rect(area, 56, 20);
        frame.render_widget(Clear, dialog);

        let block = Block::default()
            .title(" Help: Keybindings ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Theme::accent()));

        let help_text = vec![
            Line::from(""),
            key_line("q / Ctrl+C", "Quit"),
            key_line("?", "Toggle this help"),
            key_line("Tab / Shift+Tab", "Switch between list and panel"),
            key_line("Up / Down / j / k", "Move selection"),
            key_line("Enter / Space", "Open, press or edit"),
            key_line("r", "Reload strategy list"),
            key_line("Esc", "Clear status message"),
            Line::from(""),
            Line::from(Span::styled("── While editing ──", Theme::header())),
            Line::from(""),
            key_line("Enter", "Commit field / send message"),
            key_line("Esc", "Stop editing"),
            key_line("Ctrl+W", "Delete word"),
            Line::from(""),
            Line::from(Span::styled(
                "  Intake ends after the configured turn limit.",
                Theme::dim(),
            )),
        ];

        let paragraph = Paragraph::new(help_text).block(block);
        frame.render_widget(paragraph, dialog);
    }
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {key:<20}"), Theme::selected()),
        Span::styled(desc, Theme::normal()),
    ])
}

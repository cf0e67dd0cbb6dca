//! Navigation list of strategies.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use arcvault_core::descriptor::StrategyDescriptor;

use crate::action::Action;
use crate::components::Component;
use crate::theme::Theme;

/// One row of the navigation list.
#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub id: String,
    pub title: String,
}

impl From<&StrategyDescriptor> for NavEntry {
    fn from(descriptor: &StrategyDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            title: descriptor.nav_title().to_string(),
        }
    }
}

pub struct SidebarComponent {
    pub entries: Vec<NavEntry>,
    /// Strategy currently shown in the panel.
    pub active_id: Option<String>,
    /// Highlighted row.
    pub cursor: usize,
    pub focused: bool,
    pub load_error: Option<String>,
}

impl SidebarComponent {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            active_id: None,
            cursor: 0,
            focused: true,
            load_error: None,
        }
    }

    /// Replace the list, keeping the cursor on the active strategy.
    pub fn sync(
        &mut self,
        strategies: &[StrategyDescriptor],
        active_id: Option<&str>,
        load_error: Option<&str>,
    ) {
        let entries: Vec<NavEntry> = strategies.iter().map(NavEntry::from).collect();
        let active_changed = self.active_id.as_deref() != active_id;
        if entries != self.entries || active_changed {
            if let Some(pos) = active_id.and_then(|id| entries.iter().position(|e| e.id == id)) {
                self.cursor = pos;
            }
        }
        self.entries = entries;
        self.active_id = active_id.map(str::to_string);
        self.load_error = load_error.map(str::to_string);
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
    }
}

impl Component for SidebarComponent {
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        if !self.focused {
            return None;
        }
        match action {
            Action::SelectPrev => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            Action::SelectNext => {
                if self.cursor + 1 < self.entries.len() {
                    self.cursor += 1;
                }
                None
            }
            Action::Confirm => self
                .entries
                .get(self.cursor)
                .map(|entry| Action::SelectStrategy(entry.id.clone())),
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" ArcVault ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(if self.focused {
                Theme::border_focused()
            } else {
                Theme::border()
            });

        if let Some(error) = &self.load_error {
            let text = vec![
                Line::from(Span::styled("Could not load strategies", Theme::header())),
                Line::from(""),
                Line::from(Span::styled(error.as_str(), Theme::dim())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("r", Theme::key_hint()),
                    Span::styled(" to retry", Theme::dim()),
                ]),
            ];
            frame.render_widget(
                Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
                area,
            );
            return;
        }

        if self.entries.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("Loading...", Theme::dim())).block(block),
                area,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let active = self.active_id.as_deref() == Some(entry.id.as_str());
                let marker = if active { "▸ " } else { "  " };
                let style = if active {
                    Theme::selected()
                } else {
                    Theme::normal()
                };
                let item = ListItem::new(Line::from(vec![
                    Span::styled(marker, Theme::key_hint()),
                    Span::styled(entry.title.as_str(), style),
                ]));
                if self.focused && i == self.cursor {
                    item.style(Theme::selection())
                } else {
                    item
                }
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTerminal;
    use serde_json::json;

    fn descriptors() -> Vec<StrategyDescriptor> {
        serde_json::from_value(json!([
            {"id": "home_triage", "title": "🏠 Home Triage"},
            {"id": "pharmacy", "title": "💊 Pharmacy Check"},
            {"id": "monitoring", "title": "Monitoring"}
        ]))
        .unwrap()
    }

    #[test]
    fn renders_titles_without_icons() {
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(&descriptors(), Some("pharmacy"), None);

        let mut term = TestTerminal::with_size(40, 10);
        term.render_component(&sidebar);
        assert!(term.buffer_contains("Home Triage"));
        assert!(term.buffer_contains("▸ Pharmacy Check"));
        assert!(term.buffer_contains("Monitoring"));
    }

    #[test]
    fn cursor_follows_active_strategy() {
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(&descriptors(), Some("monitoring"), None);
        assert_eq!(sidebar.cursor, 2);
    }

    #[test]
    fn confirm_selects_entry_under_cursor() {
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(&descriptors(), Some("home_triage"), None);

        sidebar.handle_action(&Action::SelectNext);
        let next = sidebar.handle_action(&Action::Confirm);
        assert!(matches!(next, Some(Action::SelectStrategy(id)) if id == "pharmacy"));
    }

    #[test]
    fn ignores_keys_without_focus() {
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(&descriptors(), Some("home_triage"), None);
        sidebar.focused = false;

        sidebar.handle_action(&Action::SelectNext);
        assert_eq!(sidebar.cursor, 0);
        assert!(sidebar.handle_action(&Action::Confirm).is_none());
    }

    #[test]
    fn shows_load_error() {
        let mut sidebar = SidebarComponent::new();
        sidebar.sync(&[], None, Some("Failed to connect to server."));

        let mut term = TestTerminal::with_size(40, 10);
        term.render_component(&sidebar);
        assert!(term.buffer_contains("Could not load strategies"));
        assert!(term.buffer_contains("Failed to connect"));
    }
}

//! Draws a handler-owned `Surface` as styled text.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use arcvault_core::render::{
    Card, ChatView, Control, DrugCard, RenderNode, Role, Surface, TranscriptLine,
};
use arcvault_core::strategy::SurfaceSlot;

use crate::theme::Theme;

/// Braille spinner frames.
pub const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const BAR_WIDTH: usize = 20;

/// Element of a surface that can hold keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTarget {
    Control(SurfaceSlot, Control),
    ChatInput(SurfaceSlot),
}

/// What the panel passes down for drawing one surface.
pub struct SurfaceView<'a> {
    pub surface: &'a Surface,
    pub slot: SurfaceSlot,
    pub focus: Option<SurfaceTarget>,
    /// Text typed into the chat box so far.
    pub chat_buffer: &'a str,
    pub editing: bool,
    pub spinner_tick: usize,
}

impl SurfaceView<'_> {
    fn control_focused(&self, control: Control) -> bool {
        self.focus == Some(SurfaceTarget::Control(self.slot, control))
    }

    fn chat_focused(&self) -> bool {
        self.focus == Some(SurfaceTarget::ChatInput(self.slot))
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_tick % SPINNER.len()]
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let mut buttons: Vec<Span<'static>> = Vec::new();

        for node in &self.surface.nodes {
            if let RenderNode::Button {
                control,
                label,
                enabled,
            } = node
            {
                let style = Theme::button(*enabled, self.control_focused(*control));
                buttons.push(Span::styled(format!("[ {label} ]"), style));
                buttons.push(Span::raw(" "));
                continue;
            }
            if !buttons.is_empty() {
                lines.push(Line::from(std::mem::take(&mut buttons)));
            }
            self.node_lines(node, &mut lines);
        }
        if !buttons.is_empty() {
            lines.push(Line::from(buttons));
        }
        lines
    }

    fn node_lines(&self, node: &RenderNode, out: &mut Vec<Line<'static>>) {
        match node {
            RenderNode::Banner { text, tone } => {
                out.push(Line::from(Span::styled(
                    format!("● {text}"),
                    Style::default()
                        .fg(Theme::tone(*tone))
                        .add_modifier(Modifier::BOLD),
                )));
                out.push(Line::from(""));
            }
            RenderNode::Text { text } => push_text(out, text, Theme::normal()),
            RenderNode::Json { text } => push_text(out, text, Theme::muted()),
            RenderNode::Cards(cards) => {
                for card in cards {
                    card_lines(card, out);
                }
            }
            RenderNode::Summary { title, text } => {
                out.push(Line::from(Span::styled(title.clone(), Theme::header())));
                push_text(out, text, Theme::normal());
                out.push(Line::from(""));
            }
            RenderNode::DrugCards(cards) => {
                for card in cards {
                    drug_lines(card, out);
                }
            }
            RenderNode::Chat(view) => self.chat_lines(view, out),
            RenderNode::Loading { title, detail } => {
                out.push(Line::from(vec![
                    Span::styled(format!("{} ", self.spinner()), Theme::key_hint()),
                    Span::styled(title.clone(), Theme::header()),
                ]));
                out.push(Line::from(Span::styled(detail.clone(), Theme::dim())));
            }
            RenderNode::Report { title, body } => {
                out.push(Line::from(Span::styled(
                    title.clone(),
                    Style::default()
                        .fg(Theme::success())
                        .add_modifier(Modifier::BOLD),
                )));
                out.push(Line::from(""));
                push_text(out, body, Theme::normal());
                out.push(Line::from(""));
            }
            RenderNode::Media { title, status } => {
                out.push(Line::from(vec![
                    Span::styled("♪ ", Theme::key_hint()),
                    Span::styled(title.clone(), Theme::header()),
                ]));
                out.push(Line::from(Span::styled(status.clone(), Theme::dim())));
                out.push(Line::from(""));
            }
            RenderNode::Transcript { lines, placeholder } => {
                if lines.is_empty() {
                    out.push(Line::from(Span::styled(placeholder.clone(), Theme::dim())));
                } else {
                    out.extend(lines.iter().map(transcript_line));
                }
                out.push(Line::from(""));
            }
            RenderNode::Notice { text, tone } => {
                out.push(Line::from(Span::styled(
                    text.clone(),
                    Style::default().fg(Theme::tone(*tone)),
                )));
            }
            RenderNode::Button { .. } => {}
        }
    }

    fn chat_lines(&self, view: &ChatView, out: &mut Vec<Line<'static>>) {
        out.push(Line::from(vec![
            Span::styled(view.title.clone(), Theme::title()),
            Span::styled(
                format!("   Turn {}/{}", view.turn_count, view.max_turns),
                Theme::muted(),
            ),
        ]));
        out.push(Line::from(""));

        for turn in &view.turns {
            let (who, style) = match turn.role {
                Role::User => ("You", Style::default().fg(Theme::accent())),
                Role::Assistant => ("Assistant", Style::default().fg(Theme::success())),
                Role::System => ("System", Theme::muted()),
            };
            let mut text_lines = turn.text.lines();
            let first = text_lines.next().unwrap_or_default().to_string();
            out.push(Line::from(vec![
                Span::styled(format!("{who}: "), style.add_modifier(Modifier::BOLD)),
                Span::styled(first, Theme::normal()),
            ]));
            for rest in text_lines {
                out.push(Line::from(Span::styled(format!("  {rest}"), Theme::normal())));
            }
        }

        if let Some(progress) = &view.progress {
            out.push(Line::from(""));
            out.push(Line::from(vec![
                Span::styled(format!("{} ", self.spinner()), Theme::key_hint()),
                Span::styled(progress_bar(progress.percent()), Theme::key_hint()),
                Span::styled(format!(" {:>3.0}%  ", progress.percent()), Theme::normal()),
                Span::styled(progress.caption(), Theme::dim()),
            ]));
        }

        out.push(Line::from(""));
        let focused = self.chat_focused();
        let prompt_style = if focused {
            Theme::key_hint()
        } else {
            Theme::dim()
        };
        let typing = self.editing && focused;
        let input = if view.input_enabled && (typing || !self.chat_buffer.is_empty()) {
            let cursor = if typing { "▏" } else { "" };
            Span::styled(format!("{}{cursor}", self.chat_buffer), Theme::normal())
        } else {
            Span::styled(view.placeholder.clone(), Theme::dim())
        };
        let mut line = Line::from(vec![Span::styled("> ", prompt_style), input]);
        if focused {
            line = line.style(Theme::selection());
        }
        out.push(line);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
        let block = Block::default()
            .title(format!(" {title} "))
            .title_style(Style::default().fg(Theme::tone(self.surface.tone)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Theme::tone(self.surface.tone)));

        let lines = self.lines();
        let inner_height = area.height.saturating_sub(2) as usize;
        // Keep the latest chat turn and the input box on screen.
        let scroll = if self.surface.has_chat() {
            lines.len().saturating_sub(inner_height) as u16
        } else {
            0
        };

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        frame.render_widget(paragraph, area);
    }
}

fn push_text(out: &mut Vec<Line<'static>>, text: &str, style: Style) {
    out.extend(text.lines().map(|l| Line::from(Span::styled(l.to_string(), style))));
}

fn card_lines(card: &Card, out: &mut Vec<Line<'static>>) {
    let color = Style::default().fg(Theme::tier(card.tier));
    out.push(Line::from(vec![
        Span::styled("▌ ", color),
        Span::styled(card.title.clone(), Theme::header()),
        Span::styled(format!("  {}", card.badge), Theme::muted()),
    ]));
    out.push(Line::from(vec![
        Span::styled("▌ ", color),
        Span::styled(
            format!("{} {}", card.tier.icon(), card.headline),
            color.add_modifier(Modifier::BOLD),
        ),
    ]));
    out.push(Line::from(vec![
        Span::styled("▌ ", color),
        Span::styled(card.caption.clone(), Theme::dim()),
    ]));
    out.push(Line::from(""));
}

fn drug_lines(card: &DrugCard, out: &mut Vec<Line<'static>>) {
    out.push(Line::from(Span::styled(card.name.clone(), Theme::header())));
    if !card.structure.is_empty() {
        out.push(Line::from(Span::styled(
            format!("  {}", card.structure),
            Theme::dim(),
        )));
    }
    for check in &card.checks {
        out.push(Line::from(vec![
            Span::styled(format!("  {:<16}", check.label), Theme::muted()),
            Span::styled(
                format!("{} {}", check.tier.icon(), check.value),
                Style::default().fg(Theme::tier(check.tier)),
            ),
        ]));
    }
    out.push(Line::from(""));
}

fn transcript_line(line: &TranscriptLine) -> Line<'static> {
    Line::from(Span::styled(line.text.clone(), Theme::segment(line.state)))
}

fn progress_bar(percent: f32) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f32).round() as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH.saturating_sub(filled))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTerminal;
    use arcvault_core::progress::LoadingProgress;
    use arcvault_core::render::{CheckLine, ChatTurn, SegmentState, Tier, Tone};

    fn view(surface: &Surface) -> SurfaceView<'_> {
        SurfaceView {
            surface,
            slot: SurfaceSlot::Result,
            focus: None,
            chat_buffer: "",
            editing: false,
            spinner_tick: 0,
        }
    }

    fn draw(view: &SurfaceView<'_>) -> TestTerminal {
        let mut term = TestTerminal::new();
        term.draw_with(|frame, area| view.render(frame, area, "Results"));
        term
    }

    #[test]
    fn renders_dimension_cards() {
        let mut surface = Surface::new();
        surface.push(RenderNode::Banner {
            text: "Triage complete".into(),
            tone: Tone::Accent,
        });
        surface.push(RenderNode::Cards(vec![Card {
            title: "Respiratory".into(),
            headline: "Mild wheeze".into(),
            tier: Tier::Yellow,
            caption: "Analysis".into(),
            badge: "92% Conf".into(),
        }]));
        surface.push(RenderNode::button(Control::SaveAnalysis, "Save to Vault", true));

        let term = draw(&view(&surface));
        assert!(term.buffer_contains("● Triage complete"));
        assert!(term.buffer_contains("Respiratory  92% Conf"));
        assert!(term.buffer_contains("⚠ Mild wheeze"));
        assert!(term.buffer_contains("[ Save to Vault ]"));
    }

    #[test]
    fn adjacent_buttons_share_a_line() {
        let mut surface = Surface::new();
        surface.push(RenderNode::button(Control::Restart, "Restart", true));
        surface.push(RenderNode::button(Control::SaveReport, "Save to Vault", true));

        let lines = view(&surface).lines();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn renders_drug_checks_with_icons() {
        let mut surface = Surface::new();
        surface.push(RenderNode::DrugCards(vec![DrugCard {
            name: "Warfarin".into(),
            structure: "CC(=O)".into(),
            checks: vec![CheckLine {
                label: "Interaction".into(),
                value: "Aspirin".into(),
                tier: Tier::Red,
            }],
        }]));

        let term = draw(&view(&surface));
        assert!(term.buffer_contains("Warfarin"));
        assert!(term.buffer_contains("✖ Aspirin"));
    }

    #[test]
    fn chat_shows_progress_and_placeholder() {
        let mut progress = LoadingProgress::new();
        for _ in 0..5 {
            progress.advance();
        }
        let mut surface = Surface::new();
        surface.push(RenderNode::Chat(ChatView {
            title: "Medical Assistant".into(),
            turns: vec![ChatTurn::new(Role::Assistant, "Hello, what brings you in?")],
            turn_count: 1,
            max_turns: 5,
            input_enabled: false,
            placeholder: "Type your response...".into(),
            progress: Some(progress),
        }));

        let term = draw(&view(&surface));
        assert!(term.buffer_contains("Turn 1/5"));
        assert!(term.buffer_contains("Assistant: Hello, what brings you in?"));
        assert!(term.buffer_contains("10%"));
        assert!(term.buffer_contains("Analyzing input..."));
        assert!(term.buffer_contains("> Type your response..."));
    }

    #[test]
    fn focused_chat_shows_buffer() {
        let mut surface = Surface::new();
        surface.push(RenderNode::Chat(ChatView {
            title: "Medical Assistant".into(),
            turns: Vec::new(),
            turn_count: 0,
            max_turns: 5,
            input_enabled: true,
            placeholder: "Type your response...".into(),
            progress: None,
        }));
        let mut v = view(&surface);
        v.focus = Some(SurfaceTarget::ChatInput(SurfaceSlot::Result));
        v.chat_buffer = "chest pain";
        v.editing = true;

        let term = draw(&v);
        assert!(term.buffer_contains("> chest pain"));
        assert!(!term.buffer_contains("Type your response"));
    }

    #[test]
    fn transcript_placeholder_when_empty() {
        let mut surface = Surface::new();
        surface.push(RenderNode::Transcript {
            lines: Vec::new(),
            placeholder: "Transcript will appear here".into(),
        });
        let term = draw(&view(&surface));
        assert!(term.buffer_contains("Transcript will appear here"));

        let mut surface = Surface::new();
        surface.push(RenderNode::Transcript {
            lines: vec![TranscriptLine {
                text: "Doctor: Good morning".into(),
                state: SegmentState::Active,
            }],
            placeholder: String::new(),
        });
        let term = draw(&view(&surface));
        assert!(term.buffer_contains("Doctor: Good morning"));
    }

    #[test]
    fn progress_bar_has_fixed_width() {
        assert_eq!(progress_bar(0.0).chars().count(), BAR_WIDTH);
        assert_eq!(progress_bar(90.0).chars().count(), BAR_WIDTH);
        assert_eq!(progress_bar(150.0), "█".repeat(BAR_WIDTH));
    }
}

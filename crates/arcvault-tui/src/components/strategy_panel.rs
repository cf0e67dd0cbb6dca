//! Strategy panel: header, static content, inputs, action buttons and the
//! two handler-owned surfaces.
//!
//! Focus moves over a flat list of targets (input fields, visible actions,
//! surface controls, chat box). Enter on an input or the chat box switches
//! to editing; Enter again commits.

use std::str::FromStr;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap,
};
use ratatui::Frame;
use uuid::Uuid;

use arcvault_core::dashboard::ActiveStrategy;
use arcvault_core::descriptor::{cell_text, ChartPoint, ContentBlock, StrategyDescriptor};
use arcvault_core::render::{Interaction, Surface};
use arcvault_core::strategy::{SurfaceSlot, Surfaces};

use crate::action::Action;
use crate::components::surface_view::{SurfaceTarget, SurfaceView};
use crate::components::Component;
use crate::theme::Theme;

const CHART_HEIGHT: u16 = 10;
const INPUT_HEIGHT: u16 = 3;
const SURFACE_MIN_HEIGHT: u16 = 6;

/// Copy of the active strategy the panel draws from.
#[derive(Debug, Clone)]
pub struct PanelSnapshot {
    pub instance: Uuid,
    pub descriptor: StrategyDescriptor,
    pub inputs: Vec<String>,
    pub surfaces: Surfaces,
    pub pending_action: Option<String>,
}

impl From<&ActiveStrategy> for PanelSnapshot {
    fn from(active: &ActiveStrategy) -> Self {
        Self {
            instance: active.instance,
            descriptor: active.descriptor.clone(),
            inputs: active.inputs.clone(),
            surfaces: active.surfaces.clone(),
            pending_action: active.pending_action.clone(),
        }
    }
}

/// Something in the panel that can hold keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Input(usize),
    /// Index into `descriptor.actions`.
    Action(usize),
    Surface(SurfaceTarget),
}

pub struct StrategyPanelComponent {
    pub strategy: Option<PanelSnapshot>,
    pub focused: bool,
    cursor: usize,
    editing: Option<Target>,
    /// Draft value of the input field being edited.
    edit_buffer: String,
    chat_buffer: String,
    spinner_tick: usize,
}

impl StrategyPanelComponent {
    pub fn new() -> Self {
        Self {
            strategy: None,
            focused: false,
            cursor: 0,
            editing: None,
            edit_buffer: String::new(),
            chat_buffer: String::new(),
            spinner_tick: 0,
        }
    }

    /// Whether this component wants to capture raw key input.
    pub fn wants_input(&self) -> bool {
        self.focused && self.editing.is_some()
    }

    pub fn sync(&mut self, active: Option<&ActiveStrategy>) {
        let next = active.map(PanelSnapshot::from);
        let replaced = match (&self.strategy, &next) {
            (Some(a), Some(b)) => a.instance != b.instance,
            (None, None) => false,
            _ => true,
        };
        self.strategy = next;

        if replaced {
            self.cursor = 0;
            self.editing = None;
            self.edit_buffer.clear();
            self.chat_buffer.clear();
            // Land on the chat box when the strategy is a conversation.
            if let Some(pos) = self
                .targets()
                .iter()
                .position(|t| matches!(t, Target::Surface(SurfaceTarget::ChatInput(_))))
            {
                self.cursor = pos;
            }
        }

        let targets = self.targets();
        if let Some(Target::Surface(SurfaceTarget::ChatInput(slot))) = self.editing {
            if !targets.contains(&Target::Surface(SurfaceTarget::ChatInput(slot))) {
                self.editing = None;
            }
        }
        if self.cursor >= targets.len() {
            self.cursor = targets.len().saturating_sub(1);
        }
    }

    /// Focus targets in display order.
    pub fn targets(&self) -> Vec<Target> {
        let Some(strategy) = &self.strategy else {
            return Vec::new();
        };
        let mut targets: Vec<Target> = (0..strategy.descriptor.inputs.len())
            .map(Target::Input)
            .collect();
        targets.extend(
            strategy
                .descriptor
                .actions
                .iter()
                .enumerate()
                .filter(|(_, a)| a.visible)
                .map(|(i, _)| Target::Action(i)),
        );
        for slot in [SurfaceSlot::Result, SurfaceSlot::Custom] {
            let surface = strategy.surfaces.get(slot);
            if !surface.visible {
                continue;
            }
            if surface.accepts_text() {
                targets.push(Target::Surface(SurfaceTarget::ChatInput(slot)));
            }
            targets.extend(
                surface
                    .controls()
                    .into_iter()
                    .map(|c| Target::Surface(SurfaceTarget::Control(slot, c))),
            );
        }
        targets
    }

    fn current(&self) -> Option<Target> {
        self.targets().get(self.cursor).copied()
    }

    fn buffer_mut(&mut self) -> Option<&mut String> {
        match self.editing? {
            Target::Input(_) => Some(&mut self.edit_buffer),
            Target::Surface(SurfaceTarget::ChatInput(_)) => Some(&mut self.chat_buffer),
            _ => None,
        }
    }

    fn handle_editing(&mut self, target: Target, action: &Action) -> Option<Action> {
        match action {
            Action::CharInput(c) => {
                if let Some(buffer) = self.buffer_mut() {
                    buffer.push(*c);
                }
                None
            }
            Action::BackspaceInput => {
                if let Some(buffer) = self.buffer_mut() {
                    buffer.pop();
                }
                None
            }
            Action::DeleteWord => {
                if let Some(buffer) = self.buffer_mut() {
                    delete_word(buffer);
                }
                None
            }
            Action::PasteBulk(text) => {
                // Inputs and the chat box are single-line.
                let flat = text.replace(['\r', '\n'], " ");
                if let Some(buffer) = self.buffer_mut() {
                    buffer.push_str(&flat);
                }
                None
            }
            Action::SubmitInput => match target {
                Target::Input(index) => {
                    self.editing = None;
                    Some(Action::SetInput {
                        index,
                        value: std::mem::take(&mut self.edit_buffer),
                    })
                }
                Target::Surface(SurfaceTarget::ChatInput(slot)) => {
                    if self.chat_buffer.trim().is_empty() {
                        return None;
                    }
                    self.editing = None;
                    Some(Action::Interact {
                        slot,
                        interaction: Interaction::Submit(std::mem::take(&mut self.chat_buffer)),
                    })
                }
                _ => None,
            },
            Action::CancelInput => {
                if let Target::Input(_) = target {
                    self.edit_buffer.clear();
                }
                self.editing = None;
                None
            }
            _ => None,
        }
    }

    fn handle_normal(&mut self, action: &Action) -> Option<Action> {
        match action {
            Action::SelectPrev => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            Action::SelectNext => {
                if self.cursor + 1 < self.targets().len() {
                    self.cursor += 1;
                }
                None
            }
            Action::Confirm => {
                let target = self.current()?;
                let strategy = self.strategy.as_ref()?;
                match target {
                    Target::Input(index) => {
                        self.edit_buffer = strategy.inputs.get(index).cloned().unwrap_or_default();
                        self.editing = Some(target);
                        None
                    }
                    Target::Action(index) => {
                        if strategy.pending_action.is_some() {
                            return None;
                        }
                        strategy
                            .descriptor
                            .actions
                            .get(index)
                            .map(|a| Action::TriggerAction(a.name.clone()))
                    }
                    Target::Surface(SurfaceTarget::Control(slot, control)) => {
                        Some(Action::Interact {
                            slot,
                            interaction: Interaction::Press(control),
                        })
                    }
                    Target::Surface(SurfaceTarget::ChatInput(_)) => {
                        self.editing = Some(target);
                        None
                    }
                }
            }
            _ => None,
        }
    }

    // ── Rendering ───────────────────────────────────────────

    fn render_content(&self, frame: &mut Frame, area: Rect, block: &ContentBlock) {
        match block {
            ContentBlock::Text { text, style } => {
                let paragraph = Paragraph::new(text.as_str())
                    .style(Theme::text_block(style.as_deref()))
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, area);
            }
            ContentBlock::Table { headers, rows } => {
                let columns = headers
                    .len()
                    .max(rows.iter().map(Vec::len).max().unwrap_or(0))
                    .max(1);
                let header = Row::new(headers.iter().map(|h| Cell::from(h.as_str())))
                    .style(Theme::header());
                let body = rows.iter().map(|row| {
                    Row::new(row.iter().map(|v| Cell::from(cell_text(v)))).style(Theme::normal())
                });
                let table = Table::new(body, vec![Constraint::Fill(1); columns])
                    .header(header)
                    .column_spacing(2);
                frame.render_widget(table, area);
            }
            ContentBlock::Chart {
                label, data, color, ..
            } => render_chart(frame, area, label, data, color.as_deref()),
            ContentBlock::Unsupported => {}
        }
    }

    fn render_inputs(&self, frame: &mut Frame, areas: &[Rect], strategy: &PanelSnapshot) {
        let current = self.current();
        for (i, (field, area)) in strategy.descriptor.inputs.iter().zip(areas).enumerate() {
            let focused = self.focused && current == Some(Target::Input(i));
            let editing = focused && self.editing == Some(Target::Input(i));
            let value = if editing {
                self.edit_buffer.as_str()
            } else {
                strategy.inputs.get(i).map(String::as_str).unwrap_or_default()
            };

            let content = if value.is_empty() && !editing {
                Span::styled(field.placeholder.clone().unwrap_or_default(), Theme::dim())
            } else if editing {
                Span::styled(format!("{value}▏"), Theme::normal())
            } else {
                Span::styled(value.to_string(), Theme::normal())
            };

            let label = if field.label.is_empty() {
                &field.name
            } else {
                &field.label
            };
            let block = Block::default()
                .title(format!(" {label} "))
                .title_style(if focused { Theme::selected() } else { Theme::muted() })
                .borders(Borders::ALL)
                .border_style(if focused {
                    Theme::border_focused()
                } else {
                    Theme::border()
                });
            frame.render_widget(Paragraph::new(Line::from(content)).block(block), *area);
        }
    }

    fn render_actions(&self, frame: &mut Frame, area: Rect, strategy: &PanelSnapshot) {
        let current = self.current();
        let enabled = strategy.pending_action.is_none();
        let mut spans = Vec::new();
        for (i, action) in strategy.descriptor.actions.iter().enumerate() {
            if !action.visible {
                continue;
            }
            let focused = self.focused && current == Some(Target::Action(i));
            let label = if action.label.is_empty() {
                &action.name
            } else {
                &action.label
            };
            spans.push(Span::styled(
                format!("[ {label} ]"),
                Theme::button(enabled, focused),
            ));
            spans.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn surface_view<'a>(&'a self, surface: &'a Surface, slot: SurfaceSlot) -> SurfaceView<'a> {
        let focus = match self.current() {
            Some(Target::Surface(target)) if self.focused => Some(target),
            _ => None,
        };
        SurfaceView {
            surface,
            slot,
            focus,
            chat_buffer: &self.chat_buffer,
            editing: self.editing.is_some(),
            spinner_tick: self.spinner_tick,
        }
    }
}

impl Component for StrategyPanelComponent {
    fn handle_action(&mut self, action: &Action) -> Option<Action> {
        if let Action::Tick = action {
            self.spinner_tick = self.spinner_tick.wrapping_add(1);
            return None;
        }
        if !self.focused {
            return None;
        }
        match self.editing {
            Some(target) => self.handle_editing(target, action),
            None => self.handle_normal(action),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.focused {
                Theme::border_focused()
            } else {
                Theme::border()
            });

        let Some(strategy) = &self.strategy else {
            let hint = Paragraph::new(Span::styled("Select a strategy", Theme::dim())).block(block);
            frame.render_widget(hint, area);
            return;
        };

        let block = block
            .title(format!(" {} ", strategy.descriptor.title))
            .title_style(Theme::title());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let descriptor = &strategy.descriptor;
        let width = inner.width.max(1) as usize;
        let has_actions = descriptor.visible_actions().next().is_some();
        let surfaces: Vec<(SurfaceSlot, &Surface)> = [SurfaceSlot::Result, SurfaceSlot::Custom]
            .into_iter()
            .map(|slot| (slot, strategy.surfaces.get(slot)))
            .filter(|(_, s)| s.visible && !s.nodes.is_empty())
            .collect();

        let mut constraints = vec![Constraint::Length(if descriptor.description.is_empty() {
            0
        } else {
            2
        })];
        constraints.extend(descriptor.content.iter().map(|b| content_height(b, width)));
        constraints.extend(descriptor.inputs.iter().map(|_| Constraint::Length(INPUT_HEIGHT)));
        constraints.push(Constraint::Length(if has_actions { 2 } else { 0 }));
        constraints.extend(surfaces.iter().map(|_| Constraint::Min(SURFACE_MIN_HEIGHT)));
        if surfaces.is_empty() {
            constraints.push(Constraint::Min(0));
        }
        let rows = Layout::vertical(constraints).split(inner);

        let mut row = 0;
        frame.render_widget(
            Paragraph::new(Span::styled(descriptor.description.as_str(), Theme::muted()))
                .wrap(Wrap { trim: true }),
            rows[row],
        );
        row += 1;

        for content in &descriptor.content {
            self.render_content(frame, rows[row], content);
            row += 1;
        }

        let n_inputs = descriptor.inputs.len();
        self.render_inputs(frame, &rows[row..row + n_inputs], strategy);
        row += n_inputs;

        if has_actions {
            self.render_actions(frame, rows[row], strategy);
        }
        row += 1;

        for (slot, surface) in surfaces {
            let title = match slot {
                SurfaceSlot::Result => "Results",
                SurfaceSlot::Custom => descriptor.nav_title(),
            };
            self.surface_view(surface, slot).render(frame, rows[row], title);
            row += 1;
        }
    }
}

fn content_height(block: &ContentBlock, width: usize) -> Constraint {
    let rows = match block {
        ContentBlock::Text { text, .. } => {
            let wrapped: usize = text
                .lines()
                .map(|l| l.chars().count().div_ceil(width).max(1))
                .sum();
            wrapped as u16 + 1
        }
        ContentBlock::Table { rows, .. } => rows.len() as u16 + 2,
        ContentBlock::Chart { .. } => CHART_HEIGHT,
        ContentBlock::Unsupported => 0,
    };
    Constraint::Length(rows)
}

fn render_chart(frame: &mut Frame, area: Rect, label: &str, data: &[ChartPoint], color: Option<&str>) {
    let points: Vec<(f64, f64)> = data.iter().map(|p| (p.x, p.y)).collect();
    let color = color
        .and_then(|c| Color::from_str(c).ok())
        .unwrap_or_else(Theme::accent);

    let (x_min, x_max) = bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = bounds(points.iter().map(|p| p.1));
    let y_pad = ((y_max - y_min) * 0.1).max(1.0);

    let dataset = Dataset::default()
        .name(label.to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .style(Theme::dim())
                .bounds([x_min, x_max])
                .labels([format!("Day {x_min}"), format!("Day {x_max}")]),
        )
        .y_axis(
            Axis::default()
                .style(Theme::dim())
                .bounds([y_min - y_pad, y_max + y_pad])
                .labels([format!("{y_min}"), format!("{y_max}")]),
        );
    frame.render_widget(chart, area);
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        (min, max)
    } else {
        (0.0, 1.0)
    }
}

fn delete_word(buffer: &mut String) {
    let trimmed = buffer.trim_end_matches(' ').len();
    let start = buffer[..trimmed].rfind(' ').map(|i| i + 1).unwrap_or(0);
    buffer.truncate(start);
}

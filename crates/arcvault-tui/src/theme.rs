//! Color scheme and styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

use arcvault_core::render::{SegmentState, Tier, Tone};

/// The color palette for the ArcVault dashboard.
///
/// Clinical palette: calm blue accent, traffic-light tiers for findings.
pub struct Theme;

impl Theme {
    // ── Base colors ─────────────────────────────────────────
    pub fn fg() -> Color {
        Color::Rgb(200, 200, 200)
    }

    pub fn fg_dim() -> Color {
        Color::Rgb(100, 100, 100)
    }

    pub fn fg_muted() -> Color {
        Color::Rgb(140, 140, 140)
    }

    // ── Accent colors ───────────────────────────────────────
    pub fn accent() -> Color {
        Color::Rgb(110, 170, 255)
    }

    pub fn info() -> Color {
        Color::Rgb(120, 200, 230)
    }

    pub fn success() -> Color {
        Color::Rgb(80, 200, 120)
    }

    pub fn warning() -> Color {
        Color::Rgb(230, 180, 80)
    }

    pub fn error() -> Color {
        Color::Rgb(240, 80, 80)
    }

    // ── Structural colors ───────────────────────────────────
    pub fn border_color() -> Color {
        Color::Rgb(60, 60, 60)
    }

    pub fn selection_bg() -> Color {
        Color::Rgb(40, 40, 60)
    }

    // ── Domain colors ───────────────────────────────────────

    pub fn tone(tone: Tone) -> Color {
        match tone {
            Tone::Accent => Self::accent(),
            Tone::Success => Self::success(),
            Tone::Warning => Self::warning(),
            Tone::Error => Self::error(),
            Tone::Info => Self::info(),
            Tone::Muted => Self::fg_muted(),
        }
    }

    pub fn tier(tier: Tier) -> Color {
        match tier {
            Tier::Green => Self::success(),
            Tier::Yellow => Self::warning(),
            Tier::Red => Self::error(),
        }
    }

    /// Text styles named by `ContentBlock::Text.style`.
    pub fn text_block(style: Option<&str>) -> Style {
        match style {
            Some("highlight") => Style::default()
                .fg(Self::accent())
                .add_modifier(Modifier::BOLD),
            Some("info") => Style::default().fg(Self::info()),
            Some("success") => Style::default().fg(Self::success()),
            Some("warning") => Style::default().fg(Self::warning()),
            Some("error") => Style::default().fg(Self::error()),
            _ => Self::normal(),
        }
    }

    pub fn segment(state: SegmentState) -> Style {
        match state {
            SegmentState::Active => Style::default()
                .fg(Self::accent())
                .add_modifier(Modifier::BOLD),
            SegmentState::Done => Self::muted(),
            SegmentState::Upcoming => Self::dim(),
        }
    }

    // ── Composite styles ────────────────────────────────────

    pub fn title() -> Style {
        Style::default()
            .fg(Self::accent())
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().fg(Self::fg()).add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .fg(Self::accent())
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(Self::fg())
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::fg_dim())
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::fg_muted())
    }

    pub fn border() -> Style {
        Style::default().fg(Self::border_color())
    }

    /// Border of the pane holding keyboard focus.
    pub fn border_focused() -> Style {
        Style::default().fg(Self::accent())
    }

    pub fn key_hint() -> Style {
        Style::default().fg(Self::accent())
    }

    pub fn selection() -> Style {
        Style::default().bg(Self::selection_bg())
    }

    pub fn button(enabled: bool, focused: bool) -> Style {
        match (enabled, focused) {
            (false, _) => Self::dim(),
            (true, true) => Style::default()
                .fg(Self::accent())
                .bg(Self::selection_bg())
                .add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Self::accent()),
        }
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::fg_muted())
    }
}

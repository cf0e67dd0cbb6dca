//! Render tree produced by strategy handlers.
//!
//! Handlers never draw. They replace or append `RenderNode`s on a `Surface`
//! and the TUI turns the nodes into widgets. Keeping the tree plain data lets
//! every handler be exercised without a terminal.

use crate::progress::LoadingProgress;

/// Colour family of a banner, notice or whole surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Accent,
    Success,
    Warning,
    Error,
    Info,
    Muted,
}

/// Three-level classification applied to triage dimensions and drug checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
    #[default]
    Green,
    Yellow,
    Red,
}

impl Tier {
    /// `red` and `yellow` are recognised; everything else is green.
    pub fn from_severity(severity: Option<&str>) -> Tier {
        match severity {
            Some("red") => Tier::Red,
            Some("yellow") => Tier::Yellow,
            _ => Tier::Green,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Tier::Green => "✓",
            Tier::Yellow => "⚠",
            Tier::Red => "✖",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Green => "normal",
            Tier::Yellow => "warning",
            Tier::Red => "critical",
        }
    }
}

/// A user-triggerable affordance inside a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    SaveAnalysis,
    Finish,
    SaveReport,
    Restart,
    LoadAudio,
    TogglePlayback,
    GenerateNote,
    SaveNote,
    CloseNote,
}

/// What the user did to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Press(Control),
    /// Text submitted from a chat input.
    Submit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub headline: String,
    pub tier: Tier,
    pub caption: String,
    pub badge: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckLine {
    pub label: String,
    pub value: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrugCard {
    pub name: String,
    /// Chemical structure notation (SMILES).
    pub structure: String,
    pub checks: Vec<CheckLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub title: String,
    pub turns: Vec<ChatTurn>,
    pub turn_count: u32,
    pub max_turns: u32,
    pub input_enabled: bool,
    pub placeholder: String,
    /// Present while a request is in flight.
    pub progress: Option<LoadingProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Upcoming,
    Active,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    pub text: String,
    pub state: SegmentState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Banner { text: String, tone: Tone },
    Text { text: String },
    /// Pretty-printed structured payload.
    Json { text: String },
    Cards(Vec<Card>),
    Summary { title: String, text: String },
    DrugCards(Vec<DrugCard>),
    Chat(ChatView),
    Loading { title: String, detail: String },
    Report { title: String, body: String },
    Media { title: String, status: String },
    Transcript { lines: Vec<TranscriptLine>, placeholder: String },
    Notice { text: String, tone: Tone },
    Button {
        control: Control,
        label: String,
        enabled: bool,
    },
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text { text: text.into() }
    }

    pub fn notice(text: impl Into<String>, tone: Tone) -> Self {
        RenderNode::Notice {
            text: text.into(),
            tone,
        }
    }

    pub fn button(control: Control, label: impl Into<String>, enabled: bool) -> Self {
        RenderNode::Button {
            control,
            label: label.into(),
            enabled,
        }
    }

    /// Every human-readable string carried by the node, in display order.
    pub fn texts(&self) -> Vec<String> {
        match self {
            RenderNode::Banner { text, .. }
            | RenderNode::Text { text }
            | RenderNode::Json { text }
            | RenderNode::Notice { text, .. } => vec![text.clone()],
            RenderNode::Cards(cards) => cards
                .iter()
                .flat_map(|c| {
                    [
                        c.title.clone(),
                        c.headline.clone(),
                        c.caption.clone(),
                        c.badge.clone(),
                    ]
                })
                .collect(),
            RenderNode::Summary { title, text } => vec![title.clone(), text.clone()],
            RenderNode::DrugCards(cards) => cards
                .iter()
                .flat_map(|d| {
                    let mut out = vec![d.name.clone(), d.structure.clone()];
                    for check in &d.checks {
                        out.push(check.label.clone());
                        out.push(format!("{} {}", check.tier.icon(), check.value));
                    }
                    out
                })
                .collect(),
            RenderNode::Chat(view) => {
                let mut out = vec![
                    view.title.clone(),
                    format!("Turn {}/{}", view.turn_count, view.max_turns),
                ];
                out.extend(view.turns.iter().map(|t| t.text.clone()));
                if let Some(progress) = &view.progress {
                    out.push(progress.caption().to_string());
                }
                out
            }
            RenderNode::Loading { title, detail } => vec![title.clone(), detail.clone()],
            RenderNode::Report { title, body } => vec![title.clone(), body.clone()],
            RenderNode::Media { title, status } => vec![title.clone(), status.clone()],
            RenderNode::Transcript { lines, placeholder } => {
                if lines.is_empty() {
                    vec![placeholder.clone()]
                } else {
                    lines.iter().map(|l| l.text.clone()).collect()
                }
            }
            RenderNode::Button { label, .. } => vec![label.clone()],
        }
    }
}

/// A region of the strategy panel owned by the active handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Surface {
    pub visible: bool,
    pub tone: Tone,
    pub nodes: Vec<RenderNode>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::default()
        }
    }

    /// Replace the whole surface content.
    pub fn replace(&mut self, nodes: Vec<RenderNode>) {
        self.nodes = nodes;
    }

    pub fn push(&mut self, node: RenderNode) {
        self.nodes.push(node);
    }

    /// Recolour the surface and its banners.
    pub fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
        for node in self.nodes.iter_mut() {
            if let RenderNode::Banner { tone: t, .. } = node {
                *t = tone;
            }
        }
    }

    pub fn has_chat(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, RenderNode::Chat(_)))
    }

    pub fn chat_mut(&mut self) -> Option<&mut ChatView> {
        self.nodes.iter_mut().find_map(|n| match n {
            RenderNode::Chat(view) => Some(view),
            _ => None,
        })
    }

    /// Controls the user can currently activate, in display order.
    pub fn controls(&self) -> Vec<Control> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                RenderNode::Button {
                    control,
                    enabled: true,
                    ..
                } => Some(*control),
                _ => None,
            })
            .collect()
    }

    pub fn button(&self, control: Control) -> Option<(&str, bool)> {
        self.nodes.iter().find_map(|n| match n {
            RenderNode::Button {
                control: c,
                label,
                enabled,
            } if *c == control => Some((label.as_str(), *enabled)),
            _ => None,
        })
    }

    /// Whether a chat input is present and accepting text.
    pub fn accepts_text(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, RenderNode::Chat(view) if view.input_enabled))
    }

    /// All text on the surface joined by newlines.
    pub fn plain_text(&self) -> String {
        self.nodes
            .iter()
            .flat_map(RenderNode::texts)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

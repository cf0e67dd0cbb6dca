//! Consultation recording: load audio, transcribe, follow the transcript
//! while the recording plays, then draft a clinical note from it.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::default::render_default;
use super::{BackendRequest, Command, Outcome, Purpose, ResultRenderer, SurfaceSlot, Surfaces};
use crate::descriptor::cell_text;
use crate::render::{Control, Interaction, RenderNode, SegmentState, Surface, Tone, TranscriptLine};

const RECORDING_TITLE: &str = "Consultation Recording: CAR0001";
const NOTE_TITLE: &str = "📝 Clinical Consultation Note";
/// Length assumed for a segment without an end timestamp.
const DEFAULT_SEGMENT_SECS: f64 = 5.0;

/// One transcribed utterance, `timestamp` is `[start, end?]` in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    timestamp: Vec<Option<f64>>,
}

impl TranscriptSegment {
    /// Lenient parse of one wire segment. Non-object items are rejected; a
    /// bad `text` becomes empty and unreadable timestamp entries become unset.
    pub fn from_value(item: &Value) -> Option<Self> {
        let object = item.as_object()?;
        let text = object.get("text").map(cell_text).unwrap_or_default();
        let timestamp = match object.get("timestamp") {
            Some(Value::Array(parts)) => parts.iter().map(seconds).collect(),
            Some(single) => vec![seconds(single)],
            None => Vec::new(),
        };
        Some(Self { text, timestamp })
    }

    pub fn new(text: impl Into<String>, start: f64, end: Option<f64>) -> Self {
        Self {
            text: text.into(),
            timestamp: vec![Some(start), end],
        }
    }

    pub fn start(&self) -> f64 {
        self.timestamp.first().copied().flatten().unwrap_or(0.0)
    }

    pub fn end(&self) -> f64 {
        match self.timestamp.get(1).copied().flatten() {
            Some(end) if end > 0.0 => end,
            _ => self.start() + DEFAULT_SEGMENT_SECS,
        }
    }

    pub fn state_at(&self, t: f64) -> SegmentState {
        if t >= self.end() {
            SegmentState::Done
        } else if t >= self.start() {
            SegmentState::Active
        } else {
            SegmentState::Upcoming
        }
    }
}

fn seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse the `segments` array item by item, dropping only unusable entries.
fn parse_segments(segments: Option<&Value>) -> Vec<TranscriptSegment> {
    let Some(Value::Array(items)) = segments else {
        if segments.is_some_and(|v| !v.is_null()) {
            warn!("Transcript segments are not an array");
        }
        return Vec::new();
    };
    let parsed: Vec<TranscriptSegment> =
        items.iter().filter_map(TranscriptSegment::from_value).collect();
    if parsed.len() != items.len() {
        warn!(
            skipped = items.len() - parsed.len(),
            "Skipped malformed transcript segments"
        );
    }
    parsed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsultationPhase {
    #[default]
    Idle,
    LoadingAudio,
    Transcribing,
    Ready,
    GeneratingNote,
    NoteReady,
}

#[derive(Debug, Clone, Default)]
pub struct ConsultationController {
    phase: ConsultationPhase,
    audio_url: Option<String>,
    segments: Vec<TranscriptSegment>,
    /// Simulated playback position in seconds.
    clock: f64,
    playing: bool,
    note: Option<String>,
    saving_note: bool,
    failure: Option<String>,
    mounted: Option<SurfaceSlot>,
}

impl ConsultationController {
    pub fn phase(&self) -> ConsultationPhase {
        self.phase
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn slot(&self, fallback: SurfaceSlot) -> SurfaceSlot {
        self.mounted.unwrap_or(fallback)
    }

    fn playback_end(&self) -> f64 {
        self.segments
            .iter()
            .map(TranscriptSegment::end)
            .fold(0.0, f64::max)
    }

    fn media_status(&self) -> String {
        match self.phase {
            ConsultationPhase::Idle if self.audio_url.is_some() => "Audio loaded".to_string(),
            ConsultationPhase::Idle => "No audio loaded".to_string(),
            ConsultationPhase::LoadingAudio => "Loading audio...".to_string(),
            ConsultationPhase::Transcribing => "Transcribing audio with MedASR...".to_string(),
            _ => {
                let secs = self.clock as u64;
                let icon = if self.playing { "▶" } else { "⏸" };
                format!(
                    "✓ Transcription Ready  {icon} {:02}:{:02}",
                    secs / 60,
                    secs % 60
                )
            }
        }
    }

    fn render(&self, surface: &mut Surface) {
        let mut nodes = vec![RenderNode::Media {
            title: RECORDING_TITLE.to_string(),
            status: self.media_status(),
        }];
        match self.phase {
            ConsultationPhase::Idle => nodes.push(RenderNode::button(
                Control::LoadAudio,
                "▶ Load Consultation Audio",
                true,
            )),
            ConsultationPhase::LoadingAudio | ConsultationPhase::Transcribing => nodes.push(
                RenderNode::button(Control::LoadAudio, "▶ Load Consultation Audio", false),
            ),
            _ => nodes.push(RenderNode::button(
                Control::TogglePlayback,
                if self.playing { "Pause" } else { "Play" },
                true,
            )),
        }
        if let Some(failure) = &self.failure {
            nodes.push(RenderNode::notice(failure.clone(), Tone::Error));
        }

        let placeholder = if self.phase == ConsultationPhase::Transcribing {
            "Transcribing... (This may take a moment)"
        } else {
            "Waiting for audio to start..."
        };
        nodes.push(RenderNode::Transcript {
            lines: self
                .segments
                .iter()
                .map(|s| TranscriptLine {
                    text: s.text.clone(),
                    state: s.state_at(self.clock),
                })
                .collect(),
            placeholder: placeholder.to_string(),
        });

        nodes.push(match self.phase {
            ConsultationPhase::GeneratingNote => {
                RenderNode::button(Control::GenerateNote, "Generating...", false)
            }
            phase => RenderNode::button(
                Control::GenerateNote,
                "Generate Clinical Note",
                phase == ConsultationPhase::Ready,
            ),
        });

        if let Some(note) = &self.note {
            nodes.push(RenderNode::Report {
                title: NOTE_TITLE.to_string(),
                body: note.clone(),
            });
            nodes.push(if self.saving_note {
                RenderNode::button(Control::SaveNote, "Saving...", false)
            } else {
                RenderNode::button(Control::SaveNote, "Save to Vault", true)
            });
            nodes.push(RenderNode::button(Control::CloseNote, "Close", !self.saving_note));
        }
        surface.replace(nodes);
    }

    fn request(&self, purpose: Purpose, slot: SurfaceSlot, action: &str, payload: Value) -> Command {
        Command::Run(BackendRequest::new(purpose, slot, action, Some(payload)))
    }

    fn on_audio(&mut self, outcome: Outcome, slot: SurfaceSlot) -> Vec<Command> {
        match outcome {
            Ok(result) if result.is_success() => {
                self.audio_url = result.data_str("url").map(str::to_string);
                self.phase = ConsultationPhase::Transcribing;
                debug!(url = ?self.audio_url, "Consultation audio loaded");
                vec![self.request(Purpose::Transcribe, slot, "transcribe", json!({}))]
            }
            Ok(result) => {
                self.phase = ConsultationPhase::Idle;
                vec![Command::notify(
                    format!("Error loading audio: {}", result.message),
                    Tone::Error,
                )]
            }
            Err(e) => {
                warn!("Loading consultation audio failed: {}", e);
                self.phase = ConsultationPhase::Idle;
                self.failure = Some(format!("Error loading audio: {e}"));
                vec![Command::notify("Error in consultation flow", Tone::Error)]
            }
        }
    }

    fn on_transcript(&mut self, outcome: Outcome) -> Vec<Command> {
        let failure = match outcome {
            Ok(result) if result.is_success() => {
                self.segments = parse_segments(result.data.get("segments"));
                self.phase = ConsultationPhase::Ready;
                self.clock = 0.0;
                self.playing = true;
                return Vec::new();
            }
            Ok(result) => result.message,
            Err(e) => {
                warn!("Transcription failed: {}", e);
                e
            }
        };
        self.phase = ConsultationPhase::Idle;
        let text = format!("Transcription Failed: {failure}");
        self.failure = Some(text.clone());
        vec![Command::notify(text, Tone::Error)]
    }

    fn on_note(&mut self, outcome: Outcome) -> Vec<Command> {
        self.phase = ConsultationPhase::Ready;
        match outcome {
            Ok(result) if result.is_success() => {
                self.note = Some(result.data_str("note").unwrap_or_default().to_string());
                self.phase = ConsultationPhase::NoteReady;
                Vec::new()
            }
            Ok(result) => vec![Command::notify(
                format!("Error generating note: {}", result.message),
                Tone::Error,
            )],
            Err(e) => {
                warn!("Note generation failed: {}", e);
                vec![Command::notify("Error generating note.", Tone::Error)]
            }
        }
    }

    fn on_note_saved(&mut self, outcome: Outcome) -> Vec<Command> {
        self.saving_note = false;
        match outcome {
            Ok(result) if result.is_success() => {
                let id = result.saved_id().unwrap_or_else(|| "unknown".to_string());
                self.note = None;
                self.phase = ConsultationPhase::Ready;
                vec![Command::notify(
                    format!("Clinical Note Saved! ID: {id}"),
                    Tone::Success,
                )]
            }
            Ok(_) => vec![Command::notify("Error saving note.", Tone::Error)],
            Err(e) => {
                warn!("Saving clinical note failed: {}", e);
                vec![Command::notify("Error saving note.", Tone::Error)]
            }
        }
    }
}

impl ResultRenderer for ConsultationController {
    fn render_results(
        &mut self,
        data: Option<&Value>,
        message: Option<&str>,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        if self.mounted.is_none() {
            self.mounted = Some(slot);
            self.render(surfaces.get_mut(slot));
        }
        if let Some(data) = data {
            if Some(slot) != self.mounted {
                render_default(data, message, surfaces.get_mut(slot));
            }
        }
        Vec::new()
    }

    fn on_interaction(
        &mut self,
        interaction: Interaction,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let slot = self.slot(slot);
        let commands = match interaction {
            Interaction::Press(Control::LoadAudio) if self.phase == ConsultationPhase::Idle => {
                self.phase = ConsultationPhase::LoadingAudio;
                self.failure = None;
                vec![self.request(Purpose::LoadAudio, slot, "get_audio", json!({}))]
            }
            Interaction::Press(Control::TogglePlayback) if !self.segments.is_empty() => {
                if !self.playing && self.clock >= self.playback_end() {
                    self.clock = 0.0;
                }
                self.playing = !self.playing;
                Vec::new()
            }
            Interaction::Press(Control::GenerateNote) if self.phase == ConsultationPhase::Ready => {
                self.phase = ConsultationPhase::GeneratingNote;
                let transcript = self
                    .segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                vec![self.request(
                    Purpose::GenerateNote,
                    slot,
                    "generate_note",
                    json!({ "transcript": transcript }),
                )]
            }
            Interaction::Press(Control::SaveNote) if !self.saving_note => {
                let Some(note) = self.note.clone() else {
                    return Vec::new();
                };
                self.saving_note = true;
                vec![self.request(Purpose::SaveNote, slot, "save_note", json!({ "note": note }))]
            }
            Interaction::Press(Control::CloseNote) if !self.saving_note && self.note.is_some() => {
                self.note = None;
                self.phase = ConsultationPhase::Ready;
                Vec::new()
            }
            _ => return Vec::new(),
        };
        self.render(surfaces.get_mut(slot));
        commands
    }

    fn on_response(
        &mut self,
        purpose: Purpose,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let slot = self.slot(slot);
        let commands = match purpose {
            Purpose::LoadAudio => self.on_audio(outcome, slot),
            Purpose::Transcribe => self.on_transcript(outcome),
            Purpose::GenerateNote => self.on_note(outcome),
            Purpose::SaveNote => self.on_note_saved(outcome),
            _ => return Vec::new(),
        };
        self.render(surfaces.get_mut(slot));
        commands
    }

    fn on_tick(&mut self, elapsed: Duration, surfaces: &mut Surfaces) {
        if !self.playing {
            return;
        }
        let Some(slot) = self.mounted else {
            return;
        };
        self.clock += elapsed.as_secs_f64();
        let end = self.playback_end();
        if self.clock >= end {
            self.clock = end;
            self.playing = false;
        }
        self.render(surfaces.get_mut(slot));
    }
}

//! Bounded intake interview with the medical assistant.
//!
//! The controller mounts a chat view, opens the conversation on its own,
//! exchanges at most `max_turns` turns, then offers to synthesise a
//! pre-briefing note that can be saved to the vault. The backend owns the
//! conversation `history` and the turn count; both are echoed back verbatim.

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::default::{banner, render_default};
use super::{BackendRequest, Command, Outcome, Purpose, ResultRenderer, SurfaceSlot, Surfaces};
use crate::progress::LoadingProgress;
use crate::render::{ChatTurn, ChatView, Control, Interaction, RenderNode, Role, Surface, Tone};

const CHAT_TITLE: &str = "Medical Assistant";
const INPUT_PLACEHOLDER: &str = "Type your response...";
const COMPLETE_PLACEHOLDER: &str = "Interview complete.";
const FINISH_LABEL: &str = "Generate Pre-Briefing Note ✨";
const REPORT_TITLE: &str = "Pre-Briefing Note Generated";

/// Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ConversationPhase {
    #[default]
    NotStarted,
    AwaitingFirstTurn,
    Active,
    /// Turn limit reached; only report generation remains.
    Completing,
    ReportReady,
    Saved,
}

#[derive(Debug, Clone)]
pub struct ConversationController {
    phase: ConversationPhase,
    turns: Vec<ChatTurn>,
    /// Opaque conversation history owned by the backend.
    history: Value,
    turn_count: u32,
    max_turns: u32,
    pending: bool,
    progress: Option<LoadingProgress>,
    mounted: Option<SurfaceSlot>,
    report: Option<String>,
    /// Inline error shown under the chat after a failed report request.
    notice: Option<String>,
}

impl ConversationController {
    pub fn new(max_turns: u32) -> Self {
        Self {
            phase: ConversationPhase::NotStarted,
            turns: Vec::new(),
            history: Value::Array(Vec::new()),
            turn_count: 0,
            max_turns,
            pending: false,
            progress: None,
            mounted: None,
            report: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn progress(&self) -> Option<&LoadingProgress> {
        self.progress.as_ref()
    }

    fn advance_to(&mut self, phase: ConversationPhase) {
        if phase > self.phase {
            debug!(from = ?self.phase, to = ?phase, "Conversation phase change");
            self.phase = phase;
        }
    }

    fn slot(&self, fallback: SurfaceSlot) -> SurfaceSlot {
        self.mounted.unwrap_or(fallback)
    }

    fn accepts_input(&self) -> bool {
        self.phase == ConversationPhase::Active && !self.pending && self.turn_count < self.max_turns
    }

    /// The backend is the source of truth; the count only ever grows and
    /// never passes the limit.
    fn adopt_turn_count(&mut self, data: &Value) {
        if let Some(reported) = data.get("turn_count").and_then(Value::as_u64) {
            let reported = u32::try_from(reported).unwrap_or(u32::MAX);
            self.turn_count = reported.max(self.turn_count).min(self.max_turns);
        }
        if self.turn_count >= self.max_turns {
            self.advance_to(ConversationPhase::Completing);
        }
    }

    fn adopt_history(&mut self, data: &Value) {
        if let Some(history) = data.get("history").filter(|h| !h.is_null()) {
            self.history = history.clone();
        }
    }

    fn chat_view(&self) -> ChatView {
        let completing = self.phase >= ConversationPhase::Completing;
        ChatView {
            title: CHAT_TITLE.to_string(),
            turns: self.turns.clone(),
            turn_count: self.turn_count,
            max_turns: self.max_turns,
            input_enabled: self.accepts_input(),
            placeholder: if completing {
                COMPLETE_PLACEHOLDER
            } else {
                INPUT_PLACEHOLDER
            }
            .to_string(),
            progress: self.progress.clone(),
        }
    }

    fn render_chat(&self, surface: &mut Surface) {
        let mut nodes = vec![RenderNode::Chat(self.chat_view())];
        if let Some(notice) = &self.notice {
            nodes.push(RenderNode::notice(notice.clone(), Tone::Error));
        }
        if self.phase == ConversationPhase::Completing {
            nodes.push(RenderNode::button(Control::Finish, FINISH_LABEL, !self.pending));
        }
        surface.replace(nodes);
    }

    fn render_report(&self, message: Option<&str>, surface: &mut Surface, saving: bool) {
        let mut nodes: Vec<RenderNode> = banner(message).into_iter().collect();
        nodes.push(RenderNode::Report {
            title: REPORT_TITLE.to_string(),
            body: self.report.clone().unwrap_or_default(),
        });
        nodes.push(RenderNode::button(Control::Restart, "Restart", true));
        nodes.push(match (self.phase, saving) {
            (ConversationPhase::Saved, _) => RenderNode::button(Control::SaveReport, "Saved ✓", false),
            (_, true) => RenderNode::button(Control::SaveReport, "Saving...", false),
            _ => RenderNode::button(Control::SaveReport, "Save to Vault", true),
        });
        surface.replace(nodes);
    }

    fn request(&self, purpose: Purpose, slot: SurfaceSlot, action: &str, payload: Option<Value>) -> Command {
        Command::Run(BackendRequest::new(purpose, self.slot(slot), action, payload))
    }

    fn mount(&mut self, slot: SurfaceSlot, surfaces: &mut Surfaces) -> Vec<Command> {
        self.mounted = Some(slot);
        let mut commands = Vec::new();
        if self.phase == ConversationPhase::NotStarted && self.turns.is_empty() {
            self.advance_to(ConversationPhase::AwaitingFirstTurn);
            self.pending = true;
            self.progress = Some(LoadingProgress::new());
            commands.push(Command::StartProgress);
            commands.push(self.request(Purpose::StartConversation, slot, "start_intake", None));
        }
        self.render_chat(surfaces.get_mut(slot));
        commands
    }

    fn finish_request(&mut self, surfaces: &mut Surfaces, slot: SurfaceSlot) {
        self.pending = false;
        if self.progress.take().is_some() {
            if let Some(chat) = surfaces.get_mut(slot).chat_mut() {
                chat.progress = None;
            }
        }
    }

    fn on_start(&mut self, outcome: Outcome, slot: SurfaceSlot, surfaces: &mut Surfaces) {
        self.finish_request(surfaces, slot);
        match outcome {
            Ok(result) if result.data.is_object() => {
                self.adopt_history(&result.data);
                if let Some(opening) = result.data_str("message") {
                    self.turns.push(ChatTurn::new(Role::Assistant, opening));
                }
                self.advance_to(ConversationPhase::Active);
                self.adopt_turn_count(&result.data);
            }
            Ok(result) => {
                warn!("Intake start rejected: {}", result.message);
                let text = if result.message.is_empty() {
                    "Error starting conversation.".to_string()
                } else {
                    result.message
                };
                self.turns.push(ChatTurn::new(Role::System, text));
                self.advance_to(ConversationPhase::Active);
            }
            Err(e) => {
                warn!("Intake start failed: {}", e);
                self.turns
                    .push(ChatTurn::new(Role::System, "Error starting conversation."));
                self.advance_to(ConversationPhase::Active);
            }
        }
        self.render_chat(surfaces.get_mut(slot));
    }

    fn on_reply(&mut self, outcome: Outcome, slot: SurfaceSlot, surfaces: &mut Surfaces) {
        self.finish_request(surfaces, slot);
        match outcome {
            Ok(result) if result.data.is_object() => {
                self.adopt_history(&result.data);
                self.adopt_turn_count(&result.data);
                if let Some(reply) = result.data_str("message") {
                    self.turns.push(ChatTurn::new(Role::Assistant, reply));
                }
            }
            Ok(result) => {
                warn!("Intake turn rejected: {}", result.message);
                let text = if result.message.is_empty() {
                    "Error sending message.".to_string()
                } else {
                    result.message
                };
                self.turns.push(ChatTurn::new(Role::System, text));
            }
            Err(e) => {
                warn!("Intake turn failed: {}", e);
                self.turns.push(ChatTurn::new(Role::System, "Error sending message."));
            }
        }
        self.render_chat(surfaces.get_mut(slot));
    }

    fn on_report(
        &mut self,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        self.pending = false;
        let failure = match outcome {
            Ok(result) if result.is_success() => {
                let message = (!result.message.is_empty()).then_some(result.message.as_str());
                let commands = self.render_results(Some(&result.data), message, slot, surfaces);
                if self.phase >= ConversationPhase::ReportReady {
                    return commands;
                }
                "Error generating report.".to_string()
            }
            Ok(result) => format!("Error generating report: {}", result.message),
            Err(e) => {
                warn!("Report generation failed: {}", e);
                format!("Error generating report: {e}")
            }
        };
        self.notice = Some(failure);
        self.render_chat(surfaces.get_mut(slot));
        Vec::new()
    }

    fn on_saved(
        &mut self,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        self.pending = false;
        let commands = match outcome {
            Ok(result) if result.is_success() => {
                self.advance_to(ConversationPhase::Saved);
                let id = result.saved_id().unwrap_or_else(|| "unknown".to_string());
                vec![Command::notify(format!("Saved to Vault! ID: {id}"), Tone::Success)]
            }
            Ok(result) => vec![Command::notify(
                format!("Error: {}", result.message),
                Tone::Error,
            )],
            Err(e) => {
                warn!("Pre-briefing save failed: {}", e);
                vec![Command::notify("Error saving to vault.", Tone::Error)]
            }
        };
        self.render_report(None, surfaces.get_mut(slot), false);
        commands
    }
}

impl ResultRenderer for ConversationController {
    fn render_results(
        &mut self,
        data: Option<&Value>,
        message: Option<&str>,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.mounted.is_none() {
            commands = self.mount(slot, surfaces);
        }
        let Some(data) = data else {
            return commands;
        };
        let chat_slot = self.slot(slot);

        let reply = data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());
        let report = data
            .get("report")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty());
        let saved = data.get("id").and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        });

        if let Some(reply) = reply {
            self.turns.push(ChatTurn::new(Role::Assistant, reply));
            self.adopt_history(data);
            self.adopt_turn_count(data);
            if self.phase < ConversationPhase::ReportReady {
                self.render_chat(surfaces.get_mut(chat_slot));
            }
        } else if let Some(report) = report {
            self.report = Some(report.to_string());
            self.notice = None;
            self.advance_to(ConversationPhase::ReportReady);
            self.render_report(message, surfaces.get_mut(chat_slot), false);
        } else if let Some(id) = saved {
            commands.push(Command::notify(
                format!("Pre-Briefing saved to Vault! (ID: {id})"),
                Tone::Success,
            ));
        } else if slot != chat_slot {
            render_default(data, message, surfaces.get_mut(slot));
        } else {
            debug!("Ignoring unrecognised intake payload");
        }
        commands
    }

    fn on_interaction(
        &mut self,
        interaction: Interaction,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let slot = self.slot(slot);
        match interaction {
            Interaction::Submit(text) => {
                let text = text.trim();
                if !self.accepts_input() || text.is_empty() {
                    return Vec::new();
                }
                self.turns.push(ChatTurn::new(Role::User, text));
                self.pending = true;
                self.progress = Some(LoadingProgress::new());
                self.render_chat(surfaces.get_mut(slot));
                let payload = json!({
                    "message": text,
                    "history": self.history,
                    "turn_count": self.turn_count,
                });
                vec![
                    Command::StartProgress,
                    self.request(Purpose::SendMessage, slot, "send_message", Some(payload)),
                ]
            }
            Interaction::Press(Control::Finish) => {
                if self.phase != ConversationPhase::Completing || self.pending {
                    return Vec::new();
                }
                self.pending = true;
                self.notice = None;
                surfaces.get_mut(slot).replace(vec![RenderNode::Loading {
                    title: "Analyzing Interview...".to_string(),
                    detail: "Generating structured SOAP note with MedGemma".to_string(),
                }]);
                let payload = json!({ "history": self.history });
                vec![self.request(Purpose::GenerateReport, slot, "generate_report", Some(payload))]
            }
            Interaction::Press(Control::SaveReport) => {
                if self.phase != ConversationPhase::ReportReady || self.pending {
                    return Vec::new();
                }
                let Some(report) = self.report.clone() else {
                    return Vec::new();
                };
                self.pending = true;
                self.render_report(None, surfaces.get_mut(slot), true);
                let payload = json!({ "report": report });
                vec![self.request(Purpose::SaveReport, slot, "save_pre_briefing", Some(payload))]
            }
            Interaction::Press(Control::Restart) => {
                if self.phase >= ConversationPhase::ReportReady && !self.pending {
                    vec![Command::Reactivate]
                } else {
                    Vec::new()
                }
            }
            Interaction::Press(_) => Vec::new(),
        }
    }

    fn on_response(
        &mut self,
        purpose: Purpose,
        outcome: Outcome,
        slot: SurfaceSlot,
        surfaces: &mut Surfaces,
    ) -> Vec<Command> {
        let slot = self.slot(slot);
        match purpose {
            Purpose::StartConversation => {
                self.on_start(outcome, slot, surfaces);
                vec![Command::StopProgress]
            }
            Purpose::SendMessage => {
                self.on_reply(outcome, slot, surfaces);
                vec![Command::StopProgress]
            }
            Purpose::GenerateReport => self.on_report(outcome, slot, surfaces),
            Purpose::SaveReport => self.on_saved(outcome, slot, surfaces),
            _ => Vec::new(),
        }
    }

    fn on_progress_tick(&mut self, surfaces: &mut Surfaces) {
        let Some(slot) = self.mounted else {
            return;
        };
        let Some(progress) = self.progress.as_mut() else {
            return;
        };
        progress.advance();
        let snapshot = progress.clone();
        if let Some(chat) = surfaces.get_mut(slot).chat_mut() {
            chat.progress = Some(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ActionResult;

    fn ok(data: Value) -> Outcome {
        Ok(serde_json::from_value::<ActionResult>(json!({"status": "success", "message": "", "data": data})).unwrap())
    }

    fn runs(commands: &[Command]) -> Vec<&BackendRequest> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Run(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn chat(surfaces: &Surfaces) -> ChatView {
        surfaces
            .custom
            .nodes
            .iter()
            .find_map(|n| match n {
                RenderNode::Chat(view) => Some(view.clone()),
                _ => None,
            })
            .expect("chat view")
    }

    /// Mounted and answered opening turn.
    fn started(max_turns: u32) -> (ConversationController, Surfaces) {
        let mut c = ConversationController::new(max_turns);
        let mut surfaces = Surfaces::default();
        c.render_results(None, None, SurfaceSlot::Custom, &mut surfaces);
        c.on_response(
            Purpose::StartConversation,
            ok(json!({"message": "Hello, what brings you in?", "history": ["h0"]})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        (c, surfaces)
    }

    fn send(c: &mut ConversationController, surfaces: &mut Surfaces, text: &str) -> Vec<Command> {
        c.on_interaction(Interaction::Submit(text.into()), SurfaceSlot::Custom, surfaces)
    }

    #[test]
    fn mount_issues_exactly_one_start_request() {
        let mut c = ConversationController::new(5);
        let mut surfaces = Surfaces::default();
        let cmds = c.render_results(None, None, SurfaceSlot::Custom, &mut surfaces);

        assert_eq!(cmds[0], Command::StartProgress);
        let requests = runs(&cmds);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].action, "start_intake");
        assert_eq!(requests[0].payload, None);
        assert_eq!(c.phase(), ConversationPhase::AwaitingFirstTurn);

        let view = chat(&surfaces);
        assert!(!view.input_enabled);
        assert!(view.progress.is_some());

        // Text submitted before the opening turn is ignored.
        assert!(send(&mut c, &mut surfaces, "hi").is_empty());
        // A second mount call does not restart.
        assert!(c.render_results(None, None, SurfaceSlot::Custom, &mut surfaces).is_empty());
    }

    #[test]
    fn indicator_removed_on_response_whatever_the_percentage() {
        let mut c = ConversationController::new(5);
        let mut surfaces = Surfaces::default();
        c.render_results(None, None, SurfaceSlot::Custom, &mut surfaces);
        for _ in 0..20 {
            c.on_progress_tick(&mut surfaces);
        }
        assert!(chat(&surfaces).progress.unwrap().percent() > 30.0);

        let cmds = c.on_response(
            Purpose::StartConversation,
            ok(json!({"message": "Hello", "history": []})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(cmds, vec![Command::StopProgress]);
        assert!(c.progress().is_none());
        let view = chat(&surfaces);
        assert!(view.progress.is_none());
        assert!(view.input_enabled);
        assert_eq!(view.turns, vec![ChatTurn::new(Role::Assistant, "Hello")]);
        assert_eq!(c.phase(), ConversationPhase::Active);
    }

    #[test]
    fn send_is_optimistic_and_echoes_history() {
        let (mut c, mut surfaces) = started(5);
        let cmds = send(&mut c, &mut surfaces, "  headache since monday ");
        let requests = runs(&cmds);
        assert_eq!(requests[0].action, "send_message");
        assert_eq!(
            requests[0].payload,
            Some(json!({"message": "headache since monday", "history": ["h0"], "turn_count": 0}))
        );
        let view = chat(&surfaces);
        assert_eq!(view.turns.last().unwrap(), &ChatTurn::new(Role::User, "headache since monday"));
        assert!(!view.input_enabled);

        // One request in flight at a time.
        assert!(send(&mut c, &mut surfaces, "again").is_empty());
    }

    #[test]
    fn blank_input_is_ignored() {
        let (mut c, mut surfaces) = started(5);
        assert!(send(&mut c, &mut surfaces, "   ").is_empty());
        assert!(!c.is_pending());
    }

    #[test]
    fn turn_count_is_backend_reported() {
        let (mut c, mut surfaces) = started(5);
        send(&mut c, &mut surfaces, "one");
        c.on_response(
            Purpose::SendMessage,
            ok(json!({"message": "ok", "history": ["h1"], "turn_count": 1})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(c.turn_count(), 1);

        send(&mut c, &mut surfaces, "two");
        c.on_response(
            Purpose::SendMessage,
            ok(json!({"message": "ok", "history": ["h2"], "turn_count": 3})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(c.turn_count(), 3);
        assert_eq!(chat(&surfaces).turn_count, 3);
        assert_eq!(c.phase(), ConversationPhase::Active);
    }

    #[test]
    fn failed_turn_keeps_count_and_reenables_input() {
        let (mut c, mut surfaces) = started(5);
        send(&mut c, &mut surfaces, "one");
        let cmds = c.on_response(
            Purpose::SendMessage,
            Err("timeout".into()),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(cmds, vec![Command::StopProgress]);
        assert_eq!(c.turn_count(), 0);
        let view = chat(&surfaces);
        assert!(view.input_enabled);
        assert_eq!(view.turns.last().unwrap(), &ChatTurn::new(Role::System, "Error sending message."));
    }

    #[test]
    fn reaching_max_locks_input_and_offers_finish() {
        let (mut c, mut surfaces) = started(2);
        send(&mut c, &mut surfaces, "one");
        c.on_response(
            Purpose::SendMessage,
            ok(json!({"message": "last", "history": ["h"], "turn_count": 9})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(c.turn_count(), 2);
        assert_eq!(c.phase(), ConversationPhase::Completing);
        let view = chat(&surfaces);
        assert!(!view.input_enabled);
        assert_eq!(view.placeholder, "Interview complete.");
        assert_eq!(surfaces.custom.controls(), vec![Control::Finish]);

        let before = c.turns().len();
        assert!(send(&mut c, &mut surfaces, "more").is_empty());
        assert_eq!(c.turns().len(), before);
        assert_eq!(c.turn_count(), 2);
    }

    #[test]
    fn finish_generates_report_then_saves() {
        let (mut c, mut surfaces) = started(1);
        send(&mut c, &mut surfaces, "one");
        c.on_response(
            Purpose::SendMessage,
            ok(json!({"message": "thanks", "history": ["full"], "turn_count": 1})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );

        let cmds = c.on_interaction(Interaction::Press(Control::Finish), SurfaceSlot::Custom, &mut surfaces);
        assert_eq!(runs(&cmds)[0].action, "generate_report");
        assert_eq!(runs(&cmds)[0].payload, Some(json!({"history": ["full"]})));
        assert!(surfaces.custom.plain_text().contains("Analyzing Interview..."));

        c.on_response(
            Purpose::GenerateReport,
            ok(json!({"report": "S: headache"})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(c.phase(), ConversationPhase::ReportReady);
        assert!(surfaces.custom.plain_text().contains("S: headache"));
        assert_eq!(surfaces.custom.controls(), vec![Control::Restart, Control::SaveReport]);

        let cmds = c.on_interaction(Interaction::Press(Control::SaveReport), SurfaceSlot::Custom, &mut surfaces);
        assert_eq!(runs(&cmds)[0].action, "save_pre_briefing");
        assert_eq!(runs(&cmds)[0].payload, Some(json!({"report": "S: headache"})));

        let failed = c.on_response(
            Purpose::SaveReport,
            Err("down".into()),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(failed, vec![Command::notify("Error saving to vault.", Tone::Error)]);
        assert_eq!(c.phase(), ConversationPhase::ReportReady);

        c.on_interaction(Interaction::Press(Control::SaveReport), SurfaceSlot::Custom, &mut surfaces);
        let saved = c.on_response(
            Purpose::SaveReport,
            ok(json!({"id": 12})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(saved, vec![Command::notify("Saved to Vault! ID: 12", Tone::Success)]);
        assert_eq!(c.phase(), ConversationPhase::Saved);
        assert_eq!(surfaces.custom.button(Control::SaveReport), Some(("Saved ✓", false)));

        let restart = c.on_interaction(Interaction::Press(Control::Restart), SurfaceSlot::Custom, &mut surfaces);
        assert_eq!(restart, vec![Command::Reactivate]);
    }

    #[test]
    fn report_failure_restores_finish() {
        let (mut c, mut surfaces) = started(1);
        send(&mut c, &mut surfaces, "one");
        c.on_response(
            Purpose::SendMessage,
            ok(json!({"message": "done", "turn_count": 1})),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        c.on_interaction(Interaction::Press(Control::Finish), SurfaceSlot::Custom, &mut surfaces);
        c.on_response(
            Purpose::GenerateReport,
            Err("502 Bad Gateway".into()),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(c.phase(), ConversationPhase::Completing);
        assert!(surfaces.custom.plain_text().contains("502 Bad Gateway"));
        assert_eq!(surfaces.custom.controls(), vec![Control::Finish]);
    }

    #[test]
    fn message_shape_wins_over_report() {
        let (mut c, mut surfaces) = started(5);
        c.render_results(
            Some(&json!({"message": "still talking", "report": "ignored"})),
            None,
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        assert_eq!(c.phase(), ConversationPhase::Active);
        assert!(surfaces.custom.has_chat());
        assert_eq!(c.turns().last().unwrap().text, "still talking");
    }

    #[test]
    fn id_shape_only_notifies() {
        let (mut c, mut surfaces) = started(5);
        let before = surfaces.clone();
        let cmds = c.render_results(Some(&json!({"id": "abc"})), None, SurfaceSlot::Custom, &mut surfaces);
        assert_eq!(
            cmds,
            vec![Command::notify("Pre-Briefing saved to Vault! (ID: abc)", Tone::Success)]
        );
        assert_eq!(surfaces, before);
    }

    #[test]
    fn empty_or_zero_id_is_ignored() {
        let (mut c, mut surfaces) = started(5);
        let before = surfaces.clone();
        for id in [json!(0), json!(""), json!(false), json!(null)] {
            let cmds = c.render_results(Some(&json!({"id": id.clone()})), None, SurfaceSlot::Custom, &mut surfaces);
            assert!(cmds.is_empty(), "{id}");
        }
        assert_eq!(surfaces, before);

        let cmds = c.render_results(Some(&json!({"id": 7})), None, SurfaceSlot::Custom, &mut surfaces);
        assert_eq!(
            cmds,
            vec![Command::notify("Pre-Briefing saved to Vault! (ID: 7)", Tone::Success)]
        );
    }

    #[test]
    fn failed_start_still_allows_input() {
        let mut c = ConversationController::new(5);
        let mut surfaces = Surfaces::default();
        c.render_results(None, None, SurfaceSlot::Custom, &mut surfaces);
        c.on_response(
            Purpose::StartConversation,
            Err("connection refused".into()),
            SurfaceSlot::Custom,
            &mut surfaces,
        );
        let view = chat(&surfaces);
        assert!(view.input_enabled);
        assert_eq!(view.turns, vec![ChatTurn::new(Role::System, "Error starting conversation.")]);
    }
}

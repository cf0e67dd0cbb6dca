//! Dashboard shell: strategy list, selection, action dispatch.
//!
//! `Dashboard` is a state machine. Every operation returns the `Effect`s the
//! runtime has to perform (fetch the list, call the backend, run a timer) and
//! the runtime feeds the outcomes back in. Backend outcomes are tagged with
//! the handler instance that asked for them so late answers for a strategy
//! the user has already left are dropped.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::descriptor::StrategyDescriptor;
use crate::render::{Interaction, RenderNode, Tone};
use crate::result::ResultStatus;
use crate::strategy::{
    Command, Handler, Outcome, Purpose, ResultRenderer, StrategyRegistry, SurfaceSlot, Surfaces,
};

pub const CONNECTION_FAILED: &str = "Failed to connect to server. Ensure backend is running.";
const PROCESSING: &str = "Processing with MedGemma...";
const ACTION_FAILED: &str = "Error executing action.";

/// Who is waiting for a backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// A descriptor action triggered from the strategy panel.
    Shell { action: String },
    /// A request issued by the active handler itself.
    Handler { purpose: Purpose, slot: SurfaceSlot },
}

/// Body of `POST /api/run/:id`, wrapped as `{"data": ...}` on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBody {
    pub action: String,
    pub payload: Option<Value>,
    /// Input values keyed by field name.
    pub fields: Vec<(String, String)>,
}

impl ActionBody {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: None,
            fields: Vec::new(),
        }
    }

    /// `{<field>: <value>..., "action": name, "payload"?: ...}`
    pub fn to_data(&self) -> Value {
        let mut data = Map::new();
        for (name, value) in &self.fields {
            data.insert(name.clone(), Value::String(value.clone()));
        }
        data.insert("action".to_string(), Value::String(self.action.clone()));
        if let Some(payload) = &self.payload {
            data.insert("payload".to_string(), payload.clone());
        }
        Value::Object(data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunEffect {
    pub instance: Uuid,
    pub strategy_id: String,
    pub origin: Origin,
    pub body: ActionBody,
}

/// Work the runtime performs on behalf of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStrategies,
    Run(RunEffect),
    Notify { text: String, tone: Tone },
    StartProgress { instance: Uuid },
    StopProgress { instance: Uuid },
}

/// The strategy on screen and everything owned by its activation.
#[derive(Debug, Clone)]
pub struct ActiveStrategy {
    pub instance: Uuid,
    pub descriptor: StrategyDescriptor,
    handler: Handler,
    /// Current values, parallel to `descriptor.inputs`.
    pub inputs: Vec<String>,
    pub surfaces: Surfaces,
    /// Descriptor action awaiting its response.
    pub pending_action: Option<String>,
}

impl ActiveStrategy {
    pub fn handler_name(&self) -> &'static str {
        self.handler.name()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    registry: StrategyRegistry,
    strategies: Vec<StrategyDescriptor>,
    selected: Option<String>,
    /// Selection waiting for the list re-fetch.
    pending_selection: Option<String>,
    /// Strategy to open first instead of the head of the list.
    preferred: Option<String>,
    load_error: Option<String>,
    active: Option<ActiveStrategy>,
}

impl Dashboard {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn with_preferred(mut self, id: Option<String>) -> Self {
        self.preferred = id;
        self
    }

    pub fn strategies(&self) -> &[StrategyDescriptor] {
        &self.strategies
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn active(&self) -> Option<&ActiveStrategy> {
        self.active.as_ref()
    }

    pub fn active_instance(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.instance)
    }

    /// Start (or refresh) the dashboard by fetching the strategy list.
    pub fn activate(&mut self) -> Vec<Effect> {
        vec![Effect::FetchStrategies]
    }

    /// User picked a navigation entry. The list is re-fetched before the
    /// strategy is loaded.
    pub fn select(&mut self, id: &str) -> Vec<Effect> {
        info!(strategy = id, "Strategy selected");
        self.selected = Some(id.to_string());
        self.pending_selection = Some(id.to_string());
        vec![Effect::FetchStrategies]
    }

    pub fn on_strategies(
        &mut self,
        result: std::result::Result<Vec<StrategyDescriptor>, String>,
    ) -> Vec<Effect> {
        let strategies = match result {
            Ok(strategies) => strategies,
            Err(e) => {
                warn!("Failed to load strategies: {}", e);
                self.pending_selection = None;
                self.selected = self.active.as_ref().map(|a| a.descriptor.id.clone());
                self.load_error = Some(CONNECTION_FAILED.to_string());
                return Vec::new();
            }
        };
        debug!(count = strategies.len(), "Strategy list received");
        self.load_error = None;
        self.strategies = strategies;

        let target = match self.pending_selection.take() {
            Some(id) => id,
            None if self.active.is_none() => {
                let preferred = self
                    .preferred
                    .take()
                    .filter(|id| self.strategies.iter().any(|s| &s.id == id));
                match preferred.or_else(|| self.strategies.first().map(|s| s.id.clone())) {
                    Some(id) => id,
                    None => return Vec::new(),
                }
            }
            None => return Vec::new(),
        };

        match self.strategies.iter().find(|s| s.id == target).cloned() {
            Some(descriptor) => self.load_strategy(descriptor),
            None => {
                warn!(strategy = %target, "Selected strategy not in list");
                self.selected = self.active.as_ref().map(|a| a.descriptor.id.clone());
                vec![Effect::Notify {
                    text: format!("Strategy '{target}' is not available"),
                    tone: Tone::Warning,
                }]
            }
        }
    }

    fn load_strategy(&mut self, descriptor: StrategyDescriptor) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(previous) = self.active.take() {
            effects.push(Effect::StopProgress {
                instance: previous.instance,
            });
        }

        let instance = Uuid::new_v4();
        let handler = self.registry.resolve(&descriptor.id);
        info!(strategy = %descriptor.id, %instance, handler = handler.name(), "Loading strategy");

        self.selected = Some(descriptor.id.clone());
        self.active = Some(ActiveStrategy {
            instance,
            inputs: vec![String::new(); descriptor.inputs.len()],
            descriptor,
            handler,
            surfaces: Surfaces::default(),
            pending_action: None,
        });

        let commands = match self.active.as_mut() {
            Some(active) => {
                active
                    .handler
                    .render_results(None, None, SurfaceSlot::Custom, &mut active.surfaces)
            }
            None => Vec::new(),
        };
        effects.extend(self.execute(commands));
        effects
    }

    pub fn set_input(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self
            .active
            .as_mut()
            .and_then(|a| a.inputs.get_mut(index))
        {
            *slot = value.into();
        }
    }

    /// Run a descriptor action with the current input values.
    pub fn trigger_action(&mut self, name: &str) -> Vec<Effect> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if let Some(pending) = &active.pending_action {
            debug!(pending = %pending, requested = name, "Action already in flight");
            return Vec::new();
        }
        if !active.descriptor.actions.iter().any(|a| a.name == name) {
            warn!(action = name, strategy = %active.descriptor.id, "Unknown action");
            return Vec::new();
        }

        active.pending_action = Some(name.to_string());
        let result = &mut active.surfaces.result;
        result.visible = true;
        result.tone = Tone::Accent;
        result.replace(vec![RenderNode::Loading {
            title: PROCESSING.to_string(),
            detail: String::new(),
        }]);

        let fields = active
            .descriptor
            .inputs
            .iter()
            .zip(&active.inputs)
            .map(|(field, value)| (field.name.clone(), value.clone()))
            .collect();

        vec![Effect::Run(RunEffect {
            instance: active.instance,
            strategy_id: active.descriptor.id.clone(),
            origin: Origin::Shell {
                action: name.to_string(),
            },
            body: ActionBody {
                action: name.to_string(),
                payload: None,
                fields,
            },
        })]
    }

    /// Outcome of a `Run` effect.
    pub fn on_run_result(&mut self, instance: Uuid, origin: Origin, outcome: Outcome) -> Vec<Effect> {
        let Some(active) = self.active.as_mut().filter(|a| a.instance == instance) else {
            debug!(%instance, "Dropping response for a replaced strategy");
            return Vec::new();
        };

        let commands = match origin {
            Origin::Shell { action } => {
                active.pending_action = None;
                match outcome {
                    Ok(result) => {
                        debug!(action = %action, status = ?result.status, "Action completed");
                        let message = (!result.message.is_empty()).then_some(result.message.as_str());
                        let commands = active.handler.render_results(
                            Some(&result.data),
                            message,
                            SurfaceSlot::Result,
                            &mut active.surfaces,
                        );
                        active.surfaces.result.set_tone(match result.status {
                            ResultStatus::Success => Tone::Accent,
                            ResultStatus::Warning => Tone::Warning,
                            ResultStatus::Error => Tone::Error,
                        });
                        commands
                    }
                    Err(e) => {
                        warn!(action = %action, "Action failed: {}", e);
                        let result = &mut active.surfaces.result;
                        result.tone = Tone::Error;
                        result.replace(vec![RenderNode::notice(ACTION_FAILED, Tone::Error)]);
                        Vec::new()
                    }
                }
            }
            Origin::Handler { purpose, slot } => {
                active
                    .handler
                    .on_response(purpose, outcome, slot, &mut active.surfaces)
            }
        };
        self.execute(commands)
    }

    /// A control pressed or text submitted on one of the active surfaces.
    pub fn interact(&mut self, slot: SurfaceSlot, interaction: Interaction) -> Vec<Effect> {
        let commands = match self.active.as_mut() {
            Some(active) => active
                .handler
                .on_interaction(interaction, slot, &mut active.surfaces),
            None => return Vec::new(),
        };
        self.execute(commands)
    }

    /// One period of the loading timer started for `instance`.
    pub fn progress_tick(&mut self, instance: Uuid) {
        if let Some(active) = self.active.as_mut().filter(|a| a.instance == instance) {
            active.handler.on_progress_tick(&mut active.surfaces);
        }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        if let Some(active) = self.active.as_mut() {
            active.handler.on_tick(elapsed, &mut active.surfaces);
        }
    }

    fn execute(&mut self, commands: Vec<Command>) -> Vec<Effect> {
        let Some(active) = self.active.as_ref() else {
            return Vec::new();
        };
        let instance = active.instance;
        let strategy_id = active.descriptor.id.clone();

        let mut effects = Vec::new();
        for command in commands {
            match command {
                Command::Run(request) => effects.push(Effect::Run(RunEffect {
                    instance,
                    strategy_id: strategy_id.clone(),
                    origin: Origin::Handler {
                        purpose: request.purpose,
                        slot: request.slot,
                    },
                    body: ActionBody {
                        action: request.action,
                        payload: request.payload,
                        fields: Vec::new(),
                    },
                })),
                Command::Notify { text, tone } => effects.push(Effect::Notify { text, tone }),
                Command::StartProgress => effects.push(Effect::StartProgress { instance }),
                Command::StopProgress => effects.push(Effect::StopProgress { instance }),
                Command::Reactivate => effects.extend(self.select(&strategy_id)),
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Control;
    use crate::result::ActionResult;
    use serde_json::json;

    fn descriptors(value: Value) -> Vec<StrategyDescriptor> {
        serde_json::from_value(value).unwrap()
    }

    fn result(value: Value) -> Outcome {
        Ok(serde_json::from_value::<ActionResult>(value).unwrap())
    }

    fn runs(effects: &[Effect]) -> Vec<&RunEffect> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Run(run) => Some(run),
                _ => None,
            })
            .collect()
    }

    fn triage_list() -> Vec<StrategyDescriptor> {
        descriptors(json!([
            {"id": "home_triage", "title": "🏠 Home Triage", "actions": [{"name": "analyze", "label": "Analyze"}]},
            {"id": "monitoring", "title": "📈 Monitoring", "inputs": [{"name": "patient", "label": "Patient"}],
             "actions": [{"name": "refresh", "label": "Refresh"}, {"name": "sync", "label": "Sync", "visible": false}]}
        ]))
    }

    #[test]
    fn activation_fetches_and_selects_first() {
        let mut dash = Dashboard::default();
        assert_eq!(dash.activate(), vec![Effect::FetchStrategies]);
        let effects = dash.on_strategies(Ok(triage_list()));
        assert!(effects.is_empty());
        assert_eq!(dash.selected(), Some("home_triage"));
        let active = dash.active().unwrap();
        assert_eq!(active.handler_name(), "dimension_cards");
        assert!(!active.surfaces.result.visible);
    }

    #[test]
    fn connection_failure_is_reported() {
        let mut dash = Dashboard::default();
        dash.activate();
        dash.on_strategies(Err("connection refused".into()));
        assert_eq!(dash.load_error(), Some(CONNECTION_FAILED));
        assert!(dash.active().is_none());
    }

    #[test]
    fn preferred_strategy_opens_first() {
        let mut dash = Dashboard::default().with_preferred(Some("monitoring".into()));
        dash.on_strategies(Ok(triage_list()));
        assert_eq!(dash.selected(), Some("monitoring"));
    }

    #[test]
    fn triage_end_to_end() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(triage_list()));

        let effects = dash.trigger_action("analyze");
        let run = runs(&effects)[0].clone();
        assert_eq!(run.strategy_id, "home_triage");
        assert_eq!(run.body.to_data(), json!({"action": "analyze"}));
        let active = dash.active().unwrap();
        assert!(active.surfaces.result.visible);
        assert!(active.surfaces.result.plain_text().contains("Processing"));

        let data = json!([{"dimension": "Fever", "status": "Normal", "severity": "green", "confidence": 0.92}]);
        dash.on_run_result(
            run.instance,
            run.origin.clone(),
            result(json!({"status": "success", "message": "Done", "data": data})),
        );
        let text = dash.active().unwrap().surfaces.result.plain_text();
        for expected in ["Done", "Fever", "Normal", "92% Conf"] {
            assert!(text.contains(expected), "missing {expected}");
        }

        let effects = dash.interact(SurfaceSlot::Result, Interaction::Press(Control::SaveAnalysis));
        let save = runs(&effects)[0];
        assert_eq!(
            save.body.to_data(),
            json!({"action": "save_analysis", "payload": data})
        );
        assert_eq!(
            save.origin,
            Origin::Handler {
                purpose: Purpose::SaveAnalysis,
                slot: SurfaceSlot::Result
            }
        );
    }

    #[test]
    fn inputs_are_sent_with_action_and_hidden_actions_stay_invocable() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(triage_list()));
        dash.select("monitoring");
        dash.on_strategies(Ok(triage_list()));
        dash.set_input(0, "CAR0001");

        let visible: Vec<&str> = dash
            .active()
            .unwrap()
            .descriptor
            .visible_actions()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(visible, vec!["refresh"]);

        let effects = dash.trigger_action("sync");
        assert_eq!(
            runs(&effects)[0].body.to_data(),
            json!({"action": "sync", "patient": "CAR0001"})
        );
    }

    #[test]
    fn one_pending_action_at_a_time() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(triage_list()));
        let first = dash.trigger_action("analyze");
        assert_eq!(runs(&first).len(), 1);
        assert!(dash.trigger_action("analyze").is_empty());

        let run = runs(&first)[0].clone();
        dash.on_run_result(run.instance, run.origin, Err("timed out".into()));
        let surface = &dash.active().unwrap().surfaces.result;
        assert_eq!(surface.plain_text(), ACTION_FAILED);
        assert_eq!(runs(&dash.trigger_action("analyze")).len(), 1);
    }

    #[test]
    fn warning_status_tints_result() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(descriptors(json!([
            {"id": "monitoring", "title": "Monitoring", "actions": [{"name": "refresh", "label": "Refresh"}]}
        ]))));
        let effects = dash.trigger_action("refresh");
        let run = runs(&effects)[0].clone();
        dash.on_run_result(
            run.instance,
            run.origin,
            result(json!({"status": "warning", "message": "Stale data", "data": "Refresh complete"})),
        );
        let surface = &dash.active().unwrap().surfaces.result;
        assert_eq!(surface.tone, Tone::Warning);
        assert!(matches!(&surface.nodes[0], RenderNode::Banner { tone: Tone::Warning, .. }));
        assert_eq!(surface.nodes[1], RenderNode::text("Refresh complete"));
    }

    #[test]
    fn unknown_selection_changes_nothing() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(triage_list()));
        let before = dash.active_instance();
        dash.select("retired");
        let effects = dash.on_strategies(Ok(triage_list()));
        assert!(matches!(&effects[..], [Effect::Notify { tone: Tone::Warning, .. }]));
        assert_eq!(dash.active_instance(), before);
        assert_eq!(dash.selected(), Some("home_triage"));
    }

    #[test]
    fn failed_refetch_keeps_selection_on_active_strategy() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(triage_list()));
        let before = dash.active_instance();
        dash.select("monitoring");
        assert_eq!(dash.selected(), Some("monitoring"));
        dash.on_strategies(Err("connection refused".into()));
        assert_eq!(dash.selected(), Some("home_triage"));
        assert_eq!(dash.active_instance(), before);
        assert_eq!(dash.load_error(), Some(CONNECTION_FAILED));
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut dash = Dashboard::default();
        dash.on_strategies(Ok(triage_list()));
        let effects = dash.trigger_action("analyze");
        let stale = runs(&effects)[0].clone();

        dash.select("monitoring");
        let effects = dash.on_strategies(Ok(triage_list()));
        assert!(effects.contains(&Effect::StopProgress { instance: stale.instance }));

        let after = dash.on_run_result(
            stale.instance,
            stale.origin,
            result(json!({"status": "success", "message": "Done", "data": []})),
        );
        assert!(after.is_empty());
        assert!(!dash.active().unwrap().surfaces.result.visible);
    }

    #[test]
    fn intake_starts_once_and_drops_indicator_on_reply() {
        let mut dash = Dashboard::default();
        let effects = dash.on_strategies(Ok(descriptors(json!([
            {"id": "intake", "title": "💬 Patient Intake"}
        ]))));
        let instance = dash.active_instance().unwrap();
        assert!(effects.contains(&Effect::StartProgress { instance }));
        let starts = runs(&effects);
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].body.to_data(), json!({"action": "start_intake"}));

        for _ in 0..40 {
            dash.progress_tick(instance);
        }
        let effects = dash.on_run_result(
            instance,
            starts[0].origin.clone(),
            result(json!({"status": "success", "message": "", "data": {"message": "Hi, I'm the intake assistant.", "history": []}})),
        );
        assert_eq!(effects, vec![Effect::StopProgress { instance }]);
        let custom = &dash.active().unwrap().surfaces.custom;
        assert!(custom.accepts_text());
        assert!(!custom.plain_text().contains("Generating clinical response"));
        assert!(!custom.plain_text().contains("Loading medical knowledge"));
    }

    #[test]
    fn restart_reloads_with_fresh_handler() {
        let list = descriptors(json!([{"id": "intake", "title": "Intake"}]));
        let mut dash = Dashboard::new(StrategyRegistry::new(1));
        let effects = dash.on_strategies(Ok(list.clone()));
        let first = dash.active_instance().unwrap();
        let start = runs(&effects)[0].clone();
        dash.on_run_result(first, start.origin, result(json!({"status": "success", "data": {"message": "Hi"}})));

        let effects = dash.interact(SurfaceSlot::Custom, Interaction::Submit("fine".into()));
        let send = runs(&effects)[0].clone();
        dash.on_run_result(first, send.origin, result(json!({"status": "success", "data": {"message": "ok", "turn_count": 1}})));
        let effects = dash.interact(SurfaceSlot::Custom, Interaction::Press(Control::Finish));
        let report = runs(&effects)[0].clone();
        dash.on_run_result(first, report.origin, result(json!({"status": "success", "data": {"report": "note"}})));

        let effects = dash.interact(SurfaceSlot::Custom, Interaction::Press(Control::Restart));
        assert_eq!(effects, vec![Effect::FetchStrategies]);
        let effects = dash.on_strategies(Ok(list));
        assert!(effects.contains(&Effect::StopProgress { instance: first }));
        assert_ne!(dash.active_instance(), Some(first));
        assert_eq!(runs(&effects)[0].body.action, "start_intake");
    }
}

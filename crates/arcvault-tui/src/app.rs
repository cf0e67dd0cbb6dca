//! Main application state and render loop.

use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::Terminal;
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use arcvault_client::BackendClient;
use arcvault_core::dashboard::{Dashboard, Effect, RunEffect};
use arcvault_core::render::Tone;
use arcvault_core::strategy::StrategyRegistry;
use arcvault_core::ArcvaultConfig;

use crate::action::{Action, Focus, InputMode};
use crate::components::help::HelpComponent;
use crate::components::sidebar::SidebarComponent;
use crate::components::status_bar::StatusBarComponent;
use crate::components::strategy_panel::StrategyPanelComponent;
use crate::components::Component;
use crate::event::{self, EventHandler, InputModeFlag};
use crate::ticker::ProgressTicker;

const SIDEBAR_WIDTH: u16 = 28;

/// Main application state.
pub struct App {
    /// Whether the app should exit.
    should_quit: bool,
    /// Shared flag to tell the EventHandler which key-mapping to use.
    input_mode_flag: InputModeFlag,
    tick_rate: Duration,
    last_tick: Instant,
    focus: Focus,

    client: BackendClient,
    dashboard: Dashboard,
    ticker: ProgressTicker,

    // Components
    sidebar: SidebarComponent,
    panel: StrategyPanelComponent,
    status_bar: StatusBarComponent,
    help: HelpComponent,
}

impl App {
    pub fn new(config: &ArcvaultConfig) -> anyhow::Result<Self> {
        Ok(Self {
            should_quit: false,
            input_mode_flag: event::new_input_mode_flag(),
            tick_rate: Duration::from_millis(config.ui.tick_rate_ms),
            last_tick: Instant::now(),
            focus: Focus::Sidebar,
            client: BackendClient::from_config(&config.backend)?,
            dashboard: Dashboard::new(StrategyRegistry::from_config(config)),
            ticker: ProgressTicker::new(Duration::from_millis(config.conversation.progress_tick_ms)),
            sidebar: SidebarComponent::new(),
            panel: StrategyPanelComponent::new(),
            status_bar: StatusBarComponent::new(),
            help: HelpComponent::new(),
        })
    }

    /// Open this strategy once the list arrives instead of the first one.
    pub fn with_initial_strategy(mut self, id: Option<String>) -> Self {
        self.dashboard = self.dashboard.with_preferred(id);
        self
    }

    /// Run the TUI application.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Set up terminal.
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Create the action channel.
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

        // Start the event handler with the shared input mode flag.
        let event_handler =
            EventHandler::new(tx.clone(), self.tick_rate, self.input_mode_flag.clone());
        tokio::spawn(async move {
            event_handler.run().await;
        });

        info!(backend = self.client.base_url(), "Dashboard starting");
        let effects = self.dashboard.activate();
        self.execute(effects, &tx);
        self.sync_components();

        // Main loop.
        loop {
            terminal.draw(|frame| {
                self.render(frame);
            })?;

            if let Some(action) = rx.recv().await {
                self.handle_action(&action, &tx);

                if self.should_quit {
                    break;
                }
            }
        }

        self.ticker.stop();

        // Restore terminal.
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Determine and set the correct input mode. Called after every action.
    fn sync_input_mode(&self) {
        event::set_input_mode(&self.input_mode_flag, self.current_input_mode());
    }

    fn current_input_mode(&self) -> InputMode {
        if self.help.visible {
            return InputMode::Normal;
        }
        if self.focus == Focus::Panel && self.panel.wants_input() {
            InputMode::Editing
        } else {
            InputMode::Normal
        }
    }

    /// Push dashboard state into the components that draw it.
    fn sync_components(&mut self) {
        self.sidebar.sync(
            self.dashboard.strategies(),
            self.dashboard.selected(),
            self.dashboard.load_error(),
        );
        self.panel.sync(self.dashboard.active());
        self.sidebar.focused = self.focus == Focus::Sidebar;
        self.panel.focused = self.focus == Focus::Panel;
        self.status_bar.focus = self.focus;
        self.status_bar.strategy = self
            .dashboard
            .active()
            .map(|a| a.descriptor.nav_title().to_string());
    }

    /// Dispatch an action to the dashboard and all relevant components.
    fn handle_action(&mut self, action: &Action, tx: &mpsc::UnboundedSender<Action>) {
        // Any key dismisses help without reaching the panels.
        if self.help.visible && !matches!(action, Action::Quit) {
            self.help.handle_action(action);
            if is_input(action) {
                self.sync_input_mode();
                return;
            }
        }

        let effects = match action {
            Action::Quit => {
                self.should_quit = true;
                return;
            }
            Action::Tick => {
                let now = Instant::now();
                self.dashboard.tick(now.duration_since(self.last_tick));
                self.last_tick = now;
                Vec::new()
            }
            Action::Refresh => self.dashboard.activate(),
            Action::FocusNext | Action::FocusPrev => {
                self.focus = self.focus.toggle();
                Vec::new()
            }
            Action::SelectStrategy(id) => {
                self.focus = Focus::Panel;
                self.dashboard.select(id)
            }
            Action::TriggerAction(name) => self.dashboard.trigger_action(name),
            Action::SetInput { index, value } => {
                self.dashboard.set_input(*index, value.clone());
                Vec::new()
            }
            Action::Interact { slot, interaction } => {
                self.dashboard.interact(*slot, interaction.clone())
            }
            Action::StrategiesLoaded(result) => {
                if let Err(e) = result {
                    let _ = tx.send(Action::Notify {
                        text: format!("Backend unreachable: {e}"),
                        tone: Tone::Error,
                    });
                }
                self.dashboard.on_strategies(result.clone())
            }
            Action::RunFinished {
                instance,
                origin,
                outcome,
            } => self
                .dashboard
                .on_run_result(*instance, origin.clone(), outcome.clone()),
            Action::ProgressTick(instance) => {
                self.dashboard.progress_tick(*instance);
                Vec::new()
            }
            _ => Vec::new(),
        };
        self.execute(effects, tx);
        self.sync_components();

        let chained = match self.focus {
            Focus::Sidebar => self.sidebar.handle_action(action),
            Focus::Panel => self.panel.handle_action(action),
        };
        // The spinner animates in both panes.
        if matches!(action, Action::Tick) && self.focus == Focus::Sidebar {
            self.panel.handle_action(action);
        }
        if !self.help.visible {
            self.help.handle_action(action);
        }
        self.status_bar.handle_action(action);

        self.sync_input_mode();

        if let Some(chained) = chained {
            self.handle_action(&chained, tx);
        }
    }

    /// Perform the work the dashboard asked for.
    fn execute(&mut self, effects: Vec<Effect>, tx: &mpsc::UnboundedSender<Action>) {
        for effect in effects {
            match effect {
                Effect::FetchStrategies => self.spawn_fetch_strategies(tx.clone()),
                Effect::Run(run) => self.spawn_run(run, tx.clone()),
                Effect::Notify { text, tone } => {
                    let _ = tx.send(Action::Notify { text, tone });
                }
                Effect::StartProgress { instance } => self.ticker.start(instance, tx.clone()),
                Effect::StopProgress { instance } => self.ticker.stop_for(instance),
            }
        }
    }

    // ── Async task spawners ─────────────────────────────────────

    fn spawn_fetch_strategies(&self, tx: mpsc::UnboundedSender<Action>) {
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.list_strategies().await.map_err(|e| {
                error!("Failed to fetch strategies: {:#}", e);
                format!("{e:#}")
            });
            let _ = tx.send(Action::StrategiesLoaded(result));
        });
    }

    fn spawn_run(&self, run: RunEffect, tx: mpsc::UnboundedSender<Action>) {
        let client = self.client.clone();
        let RunEffect {
            instance,
            strategy_id,
            origin,
            body,
        } = run;
        debug!(strategy = %strategy_id, action = %body.action, "Dispatching action");
        tokio::spawn(async move {
            let outcome = client
                .run_action(&strategy_id, &body)
                .await
                .map_err(|e| {
                    error!(strategy = %strategy_id, action = %body.action, "Action failed: {:#}", e);
                    format!("{e:#}")
                });
            let _ = tx.send(Action::RunFinished {
                instance,
                origin,
                outcome,
            });
        });
    }

    // ── Rendering ───────────────────────────────────────────────

    fn render(&self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        let [main, status] =
            Layout::vertical([Constraint::Min(10), Constraint::Length(1)]).areas(area);
        let [nav, content] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
                .areas(main);

        self.sidebar.render(frame, nav);
        self.panel.render(frame, content);
        self.status_bar.render(frame, status);

        // Overlays (rendered on top)
        self.help.render(frame, area);
    }
}

/// Keyboard-originated actions, as opposed to timers and backend results.
fn is_input(action: &Action) -> bool {
    !matches!(
        action,
        Action::Tick
            | Action::ProgressTick(_)
            | Action::StrategiesLoaded(_)
            | Action::RunFinished { .. }
            | Action::Notify { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTerminal;
    use arcvault_core::descriptor::StrategyDescriptor;
    use serde_json::json;

    fn list() -> Vec<StrategyDescriptor> {
        serde_json::from_value(json!([
            {"id": "home_triage", "title": "🏠 Home Triage", "description": "Assess symptoms",
             "inputs": [{"name": "symptoms", "label": "Symptoms"}],
             "actions": [{"name": "analyze", "label": "Analyze"}]},
            {"id": "monitoring", "title": "📉 Monitoring", "description": "Vitals"}
        ]))
        .unwrap()
    }

    fn app() -> (App, mpsc::UnboundedSender<Action>, mpsc::UnboundedReceiver<Action>) {
        let mut config = ArcvaultConfig::default();
        config.backend.base_url = "http://127.0.0.1:9".into();
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(&config).unwrap(), tx, rx)
    }

    fn draw(app: &App) -> TestTerminal {
        let mut term = TestTerminal::with_size(100, 30);
        term.draw_with(|frame, _| app.render(frame));
        term
    }

    #[tokio::test]
    async fn loaded_list_opens_first_strategy() {
        let (mut app, tx, _rx) = app();
        app.handle_action(&Action::StrategiesLoaded(Ok(list())), &tx);

        assert_eq!(app.dashboard.selected(), Some("home_triage"));
        let term = draw(&app);
        assert!(term.buffer_contains("Home Triage"));
        assert!(term.buffer_contains("Assess symptoms"));
        assert!(term.buffer_contains("[ Analyze ]"));
    }

    #[tokio::test]
    async fn load_failure_is_shown_in_sidebar() {
        let (mut app, tx, mut rx) = app();
        app.handle_action(&Action::StrategiesLoaded(Err("connection refused".into())), &tx);

        let term = draw(&app);
        assert!(term.buffer_contains("Could not load strategies"));
        assert!(matches!(rx.try_recv(), Ok(Action::Notify { tone: Tone::Error, .. })));
    }

    #[tokio::test]
    async fn typing_into_an_input_switches_to_editing() {
        let (mut app, tx, _rx) = app();
        app.handle_action(&Action::StrategiesLoaded(Ok(list())), &tx);
        app.handle_action(&Action::FocusNext, &tx);
        app.handle_action(&Action::Confirm, &tx);
        assert_eq!(app.current_input_mode(), InputMode::Editing);

        for c in "fever".chars() {
            app.handle_action(&Action::CharInput(c), &tx);
        }
        app.handle_action(&Action::SubmitInput, &tx);

        assert_eq!(app.current_input_mode(), InputMode::Normal);
        assert_eq!(app.dashboard.active().unwrap().inputs, vec!["fever".to_string()]);
    }

    #[tokio::test]
    async fn pressing_an_action_shows_processing() {
        let (mut app, tx, _rx) = app();
        app.handle_action(&Action::StrategiesLoaded(Ok(list())), &tx);
        app.handle_action(&Action::FocusNext, &tx);
        app.handle_action(&Action::SelectNext, &tx);
        app.handle_action(&Action::Confirm, &tx);

        let active = app.dashboard.active().unwrap();
        assert_eq!(active.pending_action.as_deref(), Some("analyze"));
        assert!(draw(&app).buffer_contains("Processing with MedGemma..."));
    }

    #[tokio::test]
    async fn help_swallows_the_closing_key() {
        let (mut app, tx, _rx) = app();
        app.handle_action(&Action::StrategiesLoaded(Ok(list())), &tx);
        app.handle_action(&Action::ToggleHelp, &tx);
        assert!(app.help.visible);

        app.handle_action(&Action::SelectNext, &tx);
        assert!(!app.help.visible);
        assert_eq!(app.sidebar.cursor, 0);
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let (mut app, tx, _rx) = app();
        app.handle_action(&Action::Quit, &tx);
        assert!(app.should_quit);
    }
}

use crossterm::event::Event;
use ratatui::style::Color;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::runner::{
    update_channel, CommandRunner, Execution, OutputUpdate, SupersedePolicy, UpdateKind,
    UpdateReceiver, UpdateSender,
};
use crate::ui::command::Command;
use crate::ui::layout::{
    compute_layout, GridCell, DEFAULT_GRID, HELP_VIEW, OUTPUT_VIEW, TARGETS_VIEW,
};
use crate::ui::view::ViewRegistry;

use anyhow::Result;

pub const TARGETS_TITLE: &str = "Makefile Targets";
pub const OUTPUT_TITLE: &str = "Command Output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Views may exist but have not been styled or populated.
    Uninitialized,
    /// `setup` ran; the loop is handling events.
    Ready,
    /// Quit was requested.
    Terminated,
}

/// Whether the event loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    views: ViewRegistry,
    catalog: Catalog,
    runner: CommandRunner,
    grid: Vec<GridCell>,
    phase: Phase,
    supersede_policy: SupersedePolicy,
    show_exit_status: bool,
    last_generation: u64,
    active: Option<Execution>,
    updates_tx: UpdateSender,
    updates_rx: UpdateReceiver,
}

impl App {
    pub fn new(catalog: Catalog, runner: CommandRunner) -> Self {
        let (updates_tx, updates_rx) = update_channel();
        Self {
            views: ViewRegistry::new(),
            catalog,
            runner,
            grid: DEFAULT_GRID.to_vec(),
            phase: Phase::Uninitialized,
            supersede_policy: SupersedePolicy::default(),
            show_exit_status: true,
            last_generation: 0,
            active: None,
            updates_tx,
            updates_rx,
        }
    }

    /// Build an app with the runner and policies described by `config`.
    pub fn from_config(catalog: Catalog, config: &Config, working_dir: &std::path::Path) -> Self {
        let runner = CommandRunner::new(config.program.clone(), config.args.clone())
            .with_working_dir(working_dir);
        Self::new(catalog, runner)
            .with_supersede_policy(config.on_supersede)
            .with_exit_status(config.show_exit_status)
    }

    pub fn with_supersede_policy(mut self, policy: SupersedePolicy) -> Self {
        self.supersede_policy = policy;
        self
    }

    pub fn with_exit_status(mut self, show: bool) -> Self {
        self.show_exit_status = show;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }

    /// Generation whose output is currently routed to the output view, or 0.
    pub fn active_generation(&self) -> u64 {
        self.active.as_ref().map_or(0, |e| e.generation)
    }

    pub fn active_execution(&self) -> Option<&Execution> {
        self.active.as_ref()
    }

    /// Whether the active execution is still producing output.
    pub fn is_streaming(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|e| e.status.is_running())
    }

    /// Lay the views out for a `width` x `height` terminal. Safe to call on
    /// every pass; existing views keep their content.
    pub fn layout(&mut self, width: u16, height: u16) {
        let layout = compute_layout(&self.grid, width, height);
        for name in self.views.apply_layout(&layout) {
            tracing::debug!(view = name, "created view");
        }
    }

    /// One-time styling and population. Requires [`layout`](Self::layout) to
    /// have created the views.
    pub fn setup(&mut self) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            anyhow::bail!("setup already ran");
        }

        let targets = self.views.view_mut(TARGETS_VIEW)?;
        targets.title = TARGETS_TITLE.to_string();
        targets.sel_bg = Color::Blue;
        targets.sel_fg = Color::Black;
        targets.highlight = true;
        for name in self.catalog.names() {
            targets.push_line(name);
        }
        self.views.set_focus(TARGETS_VIEW)?;

        let output = self.views.view_mut(OUTPUT_VIEW)?;
        output.title = OUTPUT_TITLE.to_string();
        output.autoscroll = true;

        self.views.view(HELP_VIEW)?;

        tracing::info!(targets = self.catalog.len(), "dashboard ready");
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Per-pass refresh: show the documentation of the highlighted target.
    pub fn update(&mut self) -> Result<()> {
        let doc = self
            .views
            .view(TARGETS_VIEW)?
            .current_line()
            .filter(|line| !line.is_empty())
            .and_then(|line| self.catalog.doc(line))
            .unwrap_or_default()
            .to_string();

        let help = self.views.view_mut(HELP_VIEW)?;
        help.clear();
        help.set_content(&doc);
        help.wrap = !doc.is_empty();
        Ok(())
    }

    /// Translate a terminal event into a command and run it.
    pub fn handle_event(&mut self, event: &Event) -> Flow {
        match event {
            Event::Key(key) => match Command::from_key(key) {
                Some(command) => self.dispatch(command),
                None => Flow::Continue,
            },
            _ => Flow::Continue,
        }
    }

    /// Run `command`. Handler errors are logged and the loop continues.
    pub fn dispatch(&mut self, command: Command) -> Flow {
        if command == Command::Quit {
            self.phase = Phase::Terminated;
            return Flow::Quit;
        }
        if let Err(e) = self.apply(command) {
            tracing::warn!("{command:?} failed: {e:#}");
        }
        Flow::Continue
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::MoveUp => self.views.view_mut(TARGETS_VIEW)?.move_cursor(-1),
            Command::MoveDown => self.views.view_mut(TARGETS_VIEW)?.move_cursor(1),
            Command::Execute => self.execute_selected()?,
            Command::Quit => {}
        }
        Ok(())
    }

    /// Run the highlighted target.
    pub fn execute_selected(&mut self) -> Result<()> {
        let target = match self.views.view(TARGETS_VIEW)?.current_line() {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => {
                tracing::debug!("nothing selected to execute");
                return Ok(());
            }
        };
        self.start_execution(target)
    }

    /// Start a new generation for `target`, clearing the output view.
    ///
    /// A spawn failure is reported as a line in the output view, not as an
    /// error.
    pub fn start_execution(&mut self, target: String) -> Result<()> {
        self.last_generation += 1;
        let generation = self.last_generation;

        if let Some(previous) = self.active.take() {
            previous.supersede(self.supersede_policy);
        }

        let output = self.views.view_mut(OUTPUT_VIEW)?;
        output.clear();

        let execution = match self
            .runner
            .spawn(generation, &target, self.updates_tx.clone())
        {
            Ok(handle) => {
                tracing::info!(generation, target_name = %target, "execution started");
                Execution::running(generation, target, handle)
            }
            Err(e) => {
                tracing::warn!(generation, target_name = %target, "spawn failed: {e:#}");
                output.push_line(format!(
                    "failed to start {}: {e:#}",
                    self.runner.describe(&target)
                ));
                Execution::failed_to_start(generation, target)
            }
        };

        self.active = Some(execution);
        self.refresh_output_title()
    }

    /// Apply every queued update. Returns how many were applied (stale
    /// generations are dropped and not counted).
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            if self.apply_update(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next update and apply it. Returns whether it was applied.
    pub async fn recv_update(&mut self) -> bool {
        match self.updates_rx.recv().await {
            Some(update) => self.apply_update(update),
            None => false,
        }
    }

    fn apply_update(&mut self, update: OutputUpdate) -> bool {
        let Some(active) = self.active.as_mut() else {
            tracing::trace!(generation = update.generation, "dropping update, no execution");
            return false;
        };
        if update.generation != active.generation {
            tracing::trace!(
                generation = update.generation,
                active = active.generation,
                "dropping stale update"
            );
            return false;
        }

        match update.kind {
            UpdateKind::Line(line) => match self.views.get_mut(OUTPUT_VIEW) {
                Some(output) => output.push_line(line),
                None => return false,
            },
            UpdateKind::Exited(status) => {
                active.finish(status);
                tracing::info!(
                    generation = active.generation,
                    status = %status.label(),
                    "execution finished"
                );
                if let Err(e) = self.refresh_output_title() {
                    tracing::warn!("failed to update output title: {e:#}");
                }
            }
        }
        true
    }

    fn refresh_output_title(&mut self) -> Result<()> {
        let title = match (&self.active, self.show_exit_status) {
            (Some(execution), true) => format!(
                "{OUTPUT_TITLE}: {} ({})",
                execution.target,
                execution.status.label()
            ),
            _ => OUTPUT_TITLE.to_string(),
        };
        self.views.view_mut(OUTPUT_VIEW)?.title = title;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ExecutionStatus;

    fn create_test_app() -> App {
        let catalog = Catalog::parse("test: run unit tests\nbuild: compile the project\nlint:\n")
            .expect("parse");
        let mut app = App::new(catalog, CommandRunner::new("make", Vec::new()));
        app.layout(120, 48);
        app.setup().expect("setup");
        app
    }

    fn targets(app: &App) -> Vec<String> {
        app.views()
            .view(TARGETS_VIEW)
            .expect("targets view")
            .lines()
            .to_vec()
    }

    #[test]
    fn test_setup_populates_sorted_targets() {
        let app = create_test_app();
        assert_eq!(targets(&app), vec!["build", "lint", "test"]);
        assert_eq!(app.phase(), Phase::Ready);
        assert_eq!(app.views().focus(), Some(TARGETS_VIEW));
    }

    #[test]
    fn test_setup_styles_views() {
        let app = create_test_app();
        let list = app.views().view(TARGETS_VIEW).expect("targets");
        assert_eq!(list.title, TARGETS_TITLE);
        assert!(list.highlight);
        assert_eq!(list.sel_bg, Color::Blue);
        assert_eq!(list.sel_fg, Color::Black);

        let output = app.views().view(OUTPUT_VIEW).expect("output");
        assert_eq!(output.title, OUTPUT_TITLE);
        assert!(output.autoscroll);

        let help = app.views().view(HELP_VIEW).expect("help");
        assert_eq!(help.title, HELP_VIEW);
    }

    #[test]
    fn test_setup_requires_layout() {
        let mut app = App::new(Catalog::default(), CommandRunner::new("make", Vec::new()));
        assert!(app.setup().is_err());
        assert_eq!(app.phase(), Phase::Uninitialized);
    }

    #[test]
    fn test_setup_twice_is_error() {
        let mut app = create_test_app();
        assert!(app.setup().is_err());
        assert_eq!(targets(&app).len(), 3);
    }

    #[test]
    fn test_update_shows_selected_doc() {
        let mut app = create_test_app();
        app.update().expect("update");
        let help = app.views().view(HELP_VIEW).expect("help");
        assert_eq!(help.lines(), &["compile the project"]);
        assert!(help.wrap);

        app.dispatch(Command::MoveDown);
        app.update().expect("update");
        let help = app.views().view(HELP_VIEW).expect("help");
        assert!(help.lines().is_empty());
        assert!(!help.wrap);
    }

    #[test]
    fn test_quit_terminates() {
        let mut app = create_test_app();
        assert_eq!(app.dispatch(Command::Quit), Flow::Quit);
        assert_eq!(app.phase(), Phase::Terminated);
    }

    #[test]
    fn test_stale_update_is_dropped() {
        let mut app = create_test_app();
        assert!(!app.apply_update(OutputUpdate::line(1, "orphan")));
        assert!(app
            .views()
            .view(OUTPUT_VIEW)
            .expect("output")
            .lines()
            .is_empty());
    }

    #[test]
    fn test_execute_with_empty_catalog_is_noop() {
        let mut app = App::new(Catalog::default(), CommandRunner::new("make", Vec::new()));
        app.layout(80, 24);
        app.setup().expect("setup");
        app.execute_selected().expect("execute");
        assert_eq!(app.last_generation(), 0);
        assert!(app.active_execution().is_none());
    }

    #[tokio::test]
    async fn test_spawn_failure_reported_inline() {
        let catalog = Catalog::parse("build: b\n").expect("parse");
        let mut app = App::new(
            catalog,
            CommandRunner::new("/nonexistent/mktui-build-tool", Vec::new()),
        );
        app.layout(80, 24);
        app.setup().expect("setup");

        assert_eq!(app.dispatch(Command::Execute), Flow::Continue);

        let output = app.views().view(OUTPUT_VIEW).expect("output");
        assert_eq!(output.lines().len(), 1);
        assert!(output.lines()[0].starts_with("failed to start /nonexistent/mktui-build-tool build:"));
        assert_eq!(output.title, "Command Output: build (failed)");
        assert_eq!(app.active_generation(), 1);
        assert_eq!(
            app.active_execution().map(|e| e.status),
            Some(ExecutionStatus::Failed(None))
        );
    }

    #[tokio::test]
    async fn test_exit_status_hidden_when_disabled() {
        let catalog = Catalog::parse("build: b\n").expect("parse");
        let mut app = App::new(
            catalog,
            CommandRunner::new("/nonexistent/mktui-build-tool", Vec::new()),
        )
        .with_exit_status(false);
        app.layout(80, 24);
        app.setup().expect("setup");
        app.execute_selected().expect("execute");

        assert_eq!(app.views().view(OUTPUT_VIEW).expect("output").title, OUTPUT_TITLE);
    }
}

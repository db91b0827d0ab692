// Export modules for testing
pub mod about;
pub mod cli;
pub mod config;
pub mod error;
pub mod state;
pub mod status;
pub mod transport;
pub mod ui;
pub mod widget;
pub mod worker;

// Re-export main types for testing
pub use crate::config::{ConfigData, ServiceConfig};
pub use crate::error::PanelError;
pub use crate::state::State;
pub use crate::status::ServiceStatus;
pub use crate::transport::{HttpTransport, Transport};
pub use crate::widget::{ServiceAction, ServiceWidget};

use eframe::{egui, glow};
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use widget::refresh_deadline;
use worker::{Job, Outcome, RequestWorker};

// Constants
pub const PROGRAM_TITLE: &str = "Game Server Panel";
pub const INITIAL_WIDTH: f32 = 520.0;
pub const INITIAL_HEIGHT: f32 = 320.0;
const REPAINT_MS: u64 = 100;

// Type alias for the worker's run flag
pub type SharedStateFlag = Arc<(Mutex<bool>, Condvar)>;

// Args struct for command line parsing
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Backend base URL, overrides the saved configuration
    #[arg(short, long)]
    pub server: Option<String>,

    /// Configuration file to use instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch and print the status of a service
    Status { service: String },
    /// Start a service, then print its status
    Start { service: String },
    /// Stop a service, then print its status
    Stop { service: String },
    /// List the services the backend hosts
    Services,
}

pub use fast_config::Config;

// The main application struct
pub struct ControlPanel {
    pub state: State,
    pub widgets: Vec<ServiceWidget>,
    pub config: Config<ConfigData>,
    transport: Arc<dyn Transport>,
    worker: Option<RequestWorker>,
    last_poll: Instant,
}

impl ControlPanel {
    pub fn new(config: Config<ConfigData>, transport: Arc<dyn Transport>) -> Self {
        let widgets = config
            .data
            .services
            .iter()
            .cloned()
            .map(ServiceWidget::new)
            .collect();

        Self {
            state: State::Initialising,
            widgets,
            config,
            transport,
            worker: None,
            last_poll: Instant::now(),
        }
    }

    // Initialization logic called once at the start
    fn init(&mut self) {
        match RequestWorker::spawn(self.transport.clone()) {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => log::error!("Failed to spawn request worker: {}", e),
        }

        if self.config.data.discover_services {
            let _ = self.submit(Job::Discover);
        }
        if self.config.data.refresh_on_launch {
            for index in 0..self.widgets.len() {
                self.handle_refresh(index, true);
            }
        }

        self.last_poll = Instant::now();
        self.state = State::Running;
        log::info!("Initialization complete. State set to Running.");
    }

    // Returns whether the job was queued
    fn submit(&self, job: Job) -> bool {
        let result = match &self.worker {
            Some(worker) => worker.submit(job),
            None => Err(PanelError::WorkerStopped),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Could not queue request: {}", e);
                false
            }
        }
    }

    pub fn worker_running(&self) -> bool {
        self.worker.as_ref().is_some_and(RequestWorker::is_running)
    }

    fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.config.data.refresh_delay_ms)
    }

    // --- Actions, called from the UI ---

    pub(crate) fn handle_command(&mut self, index: usize, action: ServiceAction) {
        let refresh_at = refresh_deadline(Instant::now(), self.refresh_delay());
        let Some(widget) = self.widgets.get_mut(index) else {
            return;
        };
        let path = widget.queue_command(action, refresh_at);
        let _ = self.submit(Job::Post { service: index, path });
    }

    pub(crate) fn handle_refresh(&mut self, index: usize, force: bool) {
        let Some(widget) = self.widgets.get_mut(index) else {
            return;
        };
        let Some(ticket) = widget.begin_refresh(force) else {
            return;
        };
        let path = widget.status_path();
        if !self.submit(Job::Fetch { service: index, ticket, path }) {
            // Nothing will ever answer this ticket
            if let Some(widget) = self.widgets.get_mut(index) {
                let _ = widget.apply_response(ticket, Err(PanelError::WorkerStopped));
            }
        }
    }

    // --- Per-frame bookkeeping ---

    // Applies finished requests and fires due refreshes
    fn tick(&mut self, now: Instant) {
        let outcomes = self.worker.as_ref().map(RequestWorker::drain).unwrap_or_default();
        for outcome in outcomes {
            self.apply_outcome(outcome);
        }

        for index in 0..self.widgets.len() {
            if self.widgets[index].take_due_refresh(now) {
                self.handle_refresh(index, true);
            }
        }

        let interval = self.config.data.poll_interval_secs;
        if interval > 0 && now.duration_since(self.last_poll) >= Duration::from_secs(interval) {
            log::debug!("Polling running services.");
            for index in 0..self.widgets.len() {
                // A slow backend must not pile up fetches behind the one in flight
                if self.widgets[index].refresh_pending() {
                    log::debug!("{}: previous refresh still running.", self.widgets[index].name());
                    continue;
                }
                self.handle_refresh(index, false);
            }
            self.last_poll = now;
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Posted { path, result, .. } => match result {
                Ok(()) => log::info!("POST {} accepted.", path),
                Err(e) => log::warn!("POST {} failed: {}", path, e),
            },
            Outcome::Fetched { service, ticket, result } => {
                if let Some(widget) = self.widgets.get_mut(service) {
                    // Failures are logged and rendered by the widget itself
                    let _ = widget.apply_response(ticket, result);
                }
            }
            Outcome::Discovered(Ok(names)) => {
                for service in self.config.data.merge_discovered(&names) {
                    log::info!("Discovered service '{}'.", service.name);
                    self.widgets.push(ServiceWidget::new(service));
                }
            }
            Outcome::Discovered(Err(e)) => log::warn!("Service discovery failed: {}", e),
        }
    }

    // Graceful shutdown logic
    fn shutdown_app(&mut self) {
        log::info!("Shutdown requested.");
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }

        if let Err(e) = self.config.save() {
            log::error!("Failed to save configuration on exit: {}", e);
        } else {
            log::info!("Configuration saved.");
        }
        log::info!("Shutdown complete.");
    }
}

// Main eframe application loop
impl eframe::App for ControlPanel {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep drawing so finished requests and due refreshes show up promptly
        ctx.request_repaint_after(Duration::from_millis(REPAINT_MS));

        if self.state == State::Running {
            self.tick(Instant::now());
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            State::Initialising => {
                ui.centered_and_justified(|ui| {
                    ui.label("Initialising...");
                });
                self.init();
            }
            State::About => ui::draw_about_screen(self, ui),
            State::Running => ui::draw_running_state(self, ui, ctx),
        });
    }

    // Called when the application is about to close
    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.shutdown_app();
    }
}

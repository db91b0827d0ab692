//! The control widget for a single managed service.
//!
//! A [`ServiceWidget`] owns everything the panel knows about one service: the
//! running flag, the status line and the refreshes it has scheduled. It never
//! talks to the network on its own. Callers either hand it a [`Transport`]
//! (the blocking `start`/`stop`/`refresh` used by the command line) or split
//! the work with [`ServiceWidget::begin_refresh`] and
//! [`ServiceWidget::apply_response`] when the request runs elsewhere, as the
//! GUI does through the request worker.

use crate::config::ServiceConfig;
use crate::error::PanelError;
use crate::status::{ServiceStatus, FALLBACK_STATUS, INITIAL_STATUS};
use crate::transport::Transport;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Commands the backend accepts for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }
}

/// When a refresh delayed by `delay` from `now` is due. A delay too large to
/// represent fires right away.
pub fn refresh_deadline(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay).unwrap_or(now)
}

/// Orders the refreshes of one widget. Only a response carrying a ticket newer
/// than the last applied one may change the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug)]
pub struct ServiceWidget {
    config: ServiceConfig,
    is_running: bool,
    status_text: String,
    last_error: Option<String>,
    last_updated: Option<DateTime<Local>>,
    scheduled: Vec<Instant>, // Pending forced refreshes, one per command
    issued: u64,
    applied: u64,
}

impl ServiceWidget {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            is_running: false,
            status_text: INITIAL_STATUS.to_string(),
            last_error: None,
            last_updated: None,
            scheduled: Vec::new(),
            issued: 0,
            applied: 0,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn command_path(&self, action: ServiceAction) -> String {
        format!("/{}/{}", self.config.endpoint, action.as_str())
    }

    pub fn status_path(&self) -> String {
        format!("/{}/get_status", self.config.endpoint)
    }

    // --- Scheduling ---

    /// Records a command and schedules the refresh that follows it.
    /// Returns the path the command must be POSTed to.
    pub fn queue_command(&mut self, action: ServiceAction, refresh_at: Instant) -> String {
        info!("{}: {} requested", self.config.name, action.as_str());
        self.schedule_refresh(refresh_at);
        self.command_path(action)
    }

    pub fn schedule_refresh(&mut self, at: Instant) {
        self.scheduled.push(at);
    }

    /// Removes every scheduled refresh due at `now`. Several due deadlines
    /// collapse into one refresh since they would fetch the same thing.
    pub fn take_due_refresh(&mut self, now: Instant) -> bool {
        let before = self.scheduled.len();
        self.scheduled.retain(|deadline| *deadline > now);
        self.scheduled.len() != before
    }

    pub fn next_scheduled_refresh(&self) -> Option<Instant> {
        self.scheduled.iter().min().copied()
    }

    /// True while a refresh has been issued whose response (or a newer one)
    /// has not been applied yet.
    pub fn refresh_pending(&self) -> bool {
        self.issued > self.applied
    }

    // --- Refreshing ---

    /// Starts a refresh if one is warranted.
    ///
    /// Without `force` nothing happens while the service is believed to be
    /// off, so background polling costs nothing for stopped servers.
    pub fn begin_refresh(&mut self, force: bool) -> Option<RefreshTicket> {
        if !force && !self.is_running {
            debug!("{}: skipping refresh, service is off", self.config.name);
            return None;
        }
        self.issued += 1;
        Some(RefreshTicket(self.issued))
    }

    /// Applies the outcome of the refresh identified by `ticket`.
    ///
    /// A failed request or a malformed payload switches the widget to
    /// [`FALLBACK_STATUS`], records the error and leaves the running flag as it
    /// was. The error is handed back to the caller as well.
    pub fn apply_response(
        &mut self,
        ticket: RefreshTicket,
        response: Result<String, PanelError>,
    ) -> Result<(), PanelError> {
        if ticket.0 <= self.applied {
            debug!(
                "{}: dropping stale refresh {} (already applied {})",
                self.config.name, ticket.0, self.applied
            );
            return Ok(());
        }
        self.applied = ticket.0;

        match response.and_then(|body| ServiceStatus::from_json(&body)) {
            Ok(status) => {
                debug!("{}: {:?}", self.config.name, status);
                self.is_running = status.is_on();
                self.status_text = status.display_text();
                self.last_error = None;
                self.last_updated = Some(Local::now());
                Ok(())
            }
            Err(e) => {
                warn!("{}: refresh failed: {}", self.config.name, e);
                self.status_text = FALLBACK_STATUS.to_string();
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // --- Blocking operations ---

    /// Fetches and applies the status right away.
    /// Returns whether a request was made.
    pub fn refresh(&mut self, force: bool, transport: &dyn Transport) -> Result<bool, PanelError> {
        let Some(ticket) = self.begin_refresh(force) else {
            return Ok(false);
        };
        let response = transport.get_text(&self.status_path());
        self.apply_response(ticket, response)?;
        Ok(true)
    }

    /// Sends `action` and schedules a refresh `delay` from now. The refresh is
    /// scheduled even if the send fails.
    pub fn send_command(
        &mut self,
        action: ServiceAction,
        transport: &dyn Transport,
        delay: Duration,
    ) -> Result<(), PanelError> {
        let path = self.queue_command(action, refresh_deadline(Instant::now(), delay));
        transport.send_post(&path).map_err(|e| {
            warn!("{}: {} failed: {}", self.config.name, action.as_str(), e);
            e
        })
    }

    pub fn start(&mut self, transport: &dyn Transport, delay: Duration) -> Result<(), PanelError> {
        self.send_command(ServiceAction::Start, transport, delay)
    }

    pub fn stop(&mut self, transport: &dyn Transport, delay: Duration) -> Result<(), PanelError> {
        self.send_command(ServiceAction::Stop, transport, delay)
    }
}

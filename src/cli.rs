//! Headless mode: the same widget logic as the GUI, driven once from the
//! command line and printed to a writer.

use crate::config::ConfigData;
use crate::error::PanelError;
use crate::transport::{available_services, Transport};
use crate::widget::{ServiceAction, ServiceWidget};
use crate::Command;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

fn widget_for(config: &ConfigData, name: &str) -> Result<ServiceWidget, PanelError> {
    config
        .find_service(name)
        .cloned()
        .map(ServiceWidget::new)
        .ok_or_else(|| PanelError::UnknownService(name.to_string()))
}

// Sends the command, waits out the refresh it scheduled, then refreshes
fn command_then_refresh(
    widget: &mut ServiceWidget,
    action: ServiceAction,
    transport: &dyn Transport,
    delay: Duration,
) -> Result<(), PanelError> {
    // A failed send is reported but the status is still fetched, as in the GUI
    if let Err(e) = widget.send_command(action, transport, delay) {
        log::error!("{} {} failed: {}", action.as_str(), widget.name(), e);
    }

    if let Some(deadline) = widget.next_scheduled_refresh() {
        thread::sleep(deadline.saturating_duration_since(Instant::now()));
    }
    if widget.take_due_refresh(Instant::now()) {
        widget.refresh(true, transport)?;
    }
    Ok(())
}

/// Runs one subcommand and writes its result to `out`.
///
/// # Errors
/// Unknown services, failed status requests and write failures are returned.
pub fn run(
    command: &Command,
    config: &ConfigData,
    transport: &dyn Transport,
    out: &mut dyn Write,
) -> Result<(), PanelError> {
    let delay = Duration::from_millis(config.refresh_delay_ms);

    match command {
        Command::Status { service } => {
            let mut widget = widget_for(config, service)?;
            widget.refresh(true, transport)?;
            writeln!(out, "{}", widget.status_text())?;
        }
        Command::Start { service } => {
            let mut widget = widget_for(config, service)?;
            command_then_refresh(&mut widget, ServiceAction::Start, transport, delay)?;
            writeln!(out, "{}", widget.status_text())?;
        }
        Command::Stop { service } => {
            let mut widget = widget_for(config, service)?;
            command_then_refresh(&mut widget, ServiceAction::Stop, transport, delay)?;
            writeln!(out, "{}", widget.status_text())?;
        }
        Command::Services => {
            for name in available_services(transport)? {
                let marker = if config.find_service(&name).is_some() { "*" } else { " " };
                writeln!(out, "{}{}", marker, name)?;
            }
        }
    }
    Ok(())
}

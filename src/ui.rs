use crate::about;
use crate::state::State;
use crate::widget::{ServiceAction, ServiceWidget};
use crate::{ControlPanel, INITIAL_WIDTH, PROGRAM_TITLE};
use eframe::egui::{self, Color32, Context, ScrollArea, Ui};

const ON_COLOR: Color32 = Color32::GREEN;
const ERROR_COLOR: Color32 = Color32::from_rgb(255, 0, 0);

// A button press inside one service section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetInput {
    Command(ServiceAction),
    Update,
}

impl ControlPanel {
    // --- Button/Action Handlers (called from draw_running_state) ---

    fn handle_input(&mut self, index: usize, input: WidgetInput) {
        match input {
            WidgetInput::Command(action) => self.handle_command(index, action),
            WidgetInput::Update => self.handle_refresh(index, true),
        }
    }
}

// --- UI Drawing Functions ---

pub(crate) fn draw_about_screen(app: &mut ControlPanel, ui: &mut Ui) {
    ui.set_width(INITIAL_WIDTH);
    ui.vertical_centered(|ui| {
        ui.heading(format!("About {}", PROGRAM_TITLE));
        ui.separator();
        for line in about::about() {
            ui.label(line);
        }
        ui.separator();
        if ui.button("OK").clicked() {
            app.state = State::Running;
        }
    });
}

pub(crate) fn draw_running_state(app: &mut ControlPanel, ui: &mut Ui, ctx: &Context) {
    let mut inputs = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, true])
        .max_height((ui.available_height() - 40.0).max(0.0))
        .show(ui, |ui| {
            for (index, widget) in app.widgets.iter().enumerate() {
                if let Some(input) = draw_service_section(ui, widget) {
                    inputs.push((index, input));
                }
                ui.separator();
            }
        });

    // Handlers need &mut app, so run them once drawing is done
    for (index, input) in inputs {
        app.handle_input(index, input);
    }

    draw_footer(app, ui, ctx);
}

/// Draws one service: heading, the Start/Stop/Update buttons and the status
/// line. Returns the button pressed this frame, if any.
fn draw_service_section(ui: &mut Ui, widget: &ServiceWidget) -> Option<WidgetInput> {
    let config = widget.config();
    let mut input = None;

    ui.push_id(&config.element_id, |ui| {
        ui.heading(format!("{} Control", config.title));
        ui.horizontal(|ui| {
            if ui.button("Start").clicked() {
                input = Some(WidgetInput::Command(ServiceAction::Start));
            }
            if ui.button("Stop").clicked() {
                input = Some(WidgetInput::Command(ServiceAction::Stop));
            }
            if ui.button("Update").clicked() {
                input = Some(WidgetInput::Update);
            }
        });

        ui.horizontal(|ui| {
            let text = egui::RichText::new(widget.status_text());
            match status_color(widget) {
                Some(color) => ui.label(text.color(color)),
                None => ui.label(text),
            };
            if let Some(updated) = widget.last_updated() {
                ui.weak(format!("(updated {})", updated.format("%H:%M:%S")));
            }
        });

        if let Some(error) = widget.last_error() {
            ui.colored_label(ERROR_COLOR, error);
        }
    });

    input
}

// Green only for a confirmed running service, never for the fallback line
fn status_color(widget: &ServiceWidget) -> Option<Color32> {
    if widget.is_running() && widget.last_error().is_none() {
        Some(ON_COLOR)
    } else {
        None
    }
}

fn draw_footer(app: &mut ControlPanel, ui: &mut Ui, ctx: &Context) {
    ui.horizontal(|ui| {
        let (text, color) = if app.worker_running() {
            ("READY", ON_COLOR)
        } else {
            ("WORKER STOPPED", ERROR_COLOR)
        };
        ui.label(egui::RichText::new(text).color(color));
        ui.weak(app.config.data.base_url.as_str());

        if ui.button("About").clicked() {
            app.state = State::About;
        }

        if ui.button("Exit").clicked() {
            // Ask eframe to close the window. `on_exit` will be called.
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

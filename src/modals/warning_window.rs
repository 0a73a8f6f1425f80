use std::rc::Rc;

use egui::{vec2, Align2, Context, Window};

use crate::gui::ClickerApp;
use crate::modals::ModalWindow;

/// Blocking message box: the main panel is disabled until the user clicks Ok.
pub struct DefaultWarningWindow {
    title: String,
    lines: Vec<String>,
}

impl DefaultWarningWindow {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Rc<dyn ModalWindow> {
        Rc::new(Self {
            title: title.into(),
            lines,
        })
    }
}

impl ModalWindow for DefaultWarningWindow {
    fn update(&self, app: &mut ClickerApp, ctx: &Context) {
        let window = Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0));

        window.show(ctx, |ui| {
            for line in self.lines.iter() {
                ui.allocate_space(vec2(0.0, 10.0));
                ui.label(line);
            }

            ui.allocate_space(vec2(0.0, 10.0));

            if ui.button("Ok").clicked() {
                app.modal = None;
            }
        });
    }
}

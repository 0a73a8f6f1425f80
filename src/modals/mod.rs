use egui::Context;

use crate::gui::ClickerApp;

pub mod warning_window;

pub trait ModalWindow {
    fn update(&self, app: &mut ClickerApp, ctx: &Context);
}

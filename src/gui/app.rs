use std::time::Duration;

use eframe::App;
use egui::{CentralPanel, Color32, Context, Frame};

use super::ClickerApp;
use crate::region_select::SelectionOutcome;

impl App for ClickerApp {
    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        if self.selector.is_some() {
            egui::Rgba::TRANSPARENT.to_array()
        } else {
            visuals.window_fill().to_normalized_gamma_f32()
        }
    }

    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if self.selector.is_some() {
            let outcome = CentralPanel::default()
                .frame(Frame::none().fill(Color32::TRANSPARENT))
                .show(ctx, |ui| {
                    self.selector
                        .as_mut()
                        .map(|selector| selector.update(ui))
                        .unwrap_or(SelectionOutcome::Pending)
                })
                .inner;

            if let SelectionOutcome::Finished(region) = outcome {
                self.finish_area_selection(ctx, region);
            }

            ctx.request_repaint();
            return;
        }

        self.poll_job();

        CentralPanel::default().show(ctx, |ui| {
            ui.set_enabled(self.modal.is_none());
            self.main_panel(ui, ctx);
        });

        if let Some(modal) = self.modal.clone() {
            modal.update(self, ctx);
        }

        // Keep polling the worker while a run is active so the status label
        // notices a killswitch stop without user input.
        if self.is_running() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

use egui::{Context, DragValue, ScrollArea, TextEdit, Ui};

use super::ClickerApp;
use crate::region_select::region_label;
use crate::templates::IMAGE_EXTENSIONS;

impl ClickerApp {
    pub fn main_panel(&mut self, ui: &mut Ui, ctx: &Context) {
        ui.heading("Template Clicker");
        ui.separator();

        self.template_section(ui);
        ui.separator();
        self.settings_section(ui);
        ui.separator();
        self.control_section(ui, ctx);
    }

    fn template_section(&mut self, ui: &mut Ui) {
        ui.label("Registered templates:");

        ScrollArea::vertical().max_height(140.0).show(ui, |ui| {
            let names: Vec<String> = self
                .templates
                .iter()
                .map(|template| template.name.clone())
                .collect();

            for (index, name) in names.iter().enumerate() {
                let selected = self.selected_template == Some(index);
                if ui.selectable_label(selected, name).clicked() {
                    self.selected_template = if selected { None } else { Some(index) };
                }
            }

            if names.is_empty() {
                ui.weak("none");
            }
        });

        ui.horizontal(|ui| {
            if ui.button("Add images").clicked() {
                self.add_templates();
            }

            if ui.button("Remove selected").clicked() {
                if let Some(index) = self.selected_template.take() {
                    self.templates.remove(index);
                }
            }
        });
    }

    fn add_templates(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Image files", IMAGE_EXTENSIONS)
            .pick_files()
        else {
            return;
        };

        for path in paths {
            self.templates.add(path);
        }
    }

    fn settings_section(&mut self, ui: &mut Ui) {
        let mut params = self.params.lock().expect("params mutex poisoned");

        ui.horizontal(|ui| {
            ui.label("Threshold:");
            ui.add(
                DragValue::new(&mut params.threshold)
                    .clamp_range(0.1..=1.0)
                    .speed(0.1)
                    .fixed_decimals(2),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Click delay (s):");
            ui.add(
                DragValue::new(&mut params.click_delay_secs)
                    .clamp_range(0.01..=5.0)
                    .speed(0.01)
                    .fixed_decimals(2),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Killswitch key:");
            ui.add(TextEdit::singleline(&mut params.killswitch_key).desired_width(60.0));
        });
    }

    fn control_section(&mut self, ui: &mut Ui, ctx: &Context) {
        ui.horizontal(|ui| {
            if ui.button("Select area").clicked() {
                self.begin_area_selection(ctx);
            }
            ui.label(format!("Selected area: {}", region_label(self.region)));
        });

        let toggle_label = if self.is_running() { "Stop" } else { "Start" };
        if ui.button(toggle_label).clicked() {
            self.toggle_clicking();
        }

        ui.label(format!("Status: {}", self.status.label()));
    }
}

//! Drag-to-select overlay. While active, the main window is borderless,
//! fullscreen and transparent; the user drags out a rectangle which is
//! normalized (origin at the component-wise minimum, so drag direction does
//! not matter) and converted from logical points to screen pixels.
//!
//! A zero-area drag (click without movement) and Escape both finish with
//! no region, which the controller treats as full-screen capture.

use egui::{Color32, Key, Pos2, Rect, Sense, Stroke, Ui};

use crate::surface::Region;

#[derive(Debug, PartialEq)]
pub enum SelectionOutcome {
    Pending,
    Finished(Option<Region>),
}

#[derive(Default)]
pub struct RegionSelector {
    drag_start: Option<Pos2>,
    drag_end: Option<Pos2>,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, ui: &mut Ui) -> SelectionOutcome {
        let full_rect = ui.max_rect();
        let response = ui.allocate_rect(full_rect, Sense::click_and_drag());

        ui.painter()
            .rect_filled(full_rect, 0.0, Color32::from_black_alpha(100));

        if response.drag_started() {
            self.drag_start = response.interact_pointer_pos();
            self.drag_end = self.drag_start;
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_end = Some(pos);
            }
        }

        if let (Some(start), Some(end)) = (self.drag_start, self.drag_end) {
            ui.painter().rect_stroke(
                Rect::from_two_pos(start, end),
                0.0,
                Stroke::new(2.0, Color32::RED),
            );
        }

        if ui.input(|input| input.key_pressed(Key::Escape)) {
            return SelectionOutcome::Finished(None);
        }

        if response.drag_stopped() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_end = Some(pos);
            }

            let region = match (self.drag_start, self.drag_end) {
                (Some(start), Some(end)) => {
                    let region = normalized_region(start, end, ui.ctx().pixels_per_point());
                    if region.is_empty() {
                        None
                    } else {
                        Some(region)
                    }
                }
                _ => None,
            };

            return SelectionOutcome::Finished(region);
        }

        SelectionOutcome::Pending
    }
}

/// Screen-pixel rectangle spanned by two drag points in logical coordinates.
/// Assumes the overlay's top-left sits at the screen origin, which holds for
/// the fullscreen selection mode on the primary monitor.
pub fn normalized_region(a: Pos2, b: Pos2, pixels_per_point: f32) -> Region {
    let min_x = a.x.min(b.x) * pixels_per_point;
    let min_y = a.y.min(b.y) * pixels_per_point;
    let width = (a.x - b.x).abs() * pixels_per_point;
    let height = (a.y - b.y).abs() * pixels_per_point;

    Region {
        x: min_x.round() as i32,
        y: min_y.round() as i32,
        width: width.round() as u32,
        height: height.round() as u32,
    }
}

pub fn region_label(region: Option<Region>) -> String {
    match region {
        Some(region) => format!(
            "({}, {}) {}x{}",
            region.x, region.y, region.width, region.height
        ),
        None => "none (full screen)".into(),
    }
}

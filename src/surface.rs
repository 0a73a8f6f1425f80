//! Screen capture and synthetic clicks behind one capability trait, so the
//! automation loop can run against a fake during tests.

use std::sync::Mutex;

use anyhow::{Context, Result};
use enigo::{Enigo, MouseButton, MouseControllable};
use image::{GrayImage, RgbaImage};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use screenshots::Screen;

/// Capture rectangle in absolute screen pixels. `None` anywhere a region is
/// expected means "entire screen".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

pub trait Surface {
    fn capture(&self, region: Option<Region>) -> Result<GrayImage>;
    fn click(&self, x: i32, y: i32) -> Result<()>;
}

static ENIGO: Lazy<Mutex<Enigo>> = Lazy::new(|| Mutex::new(Enigo::new()));

/// The real desktop: `screenshots` for pixels, `enigo` for input.
pub struct DesktopSurface;

impl Surface for DesktopSurface {
    fn capture(&self, region: Option<Region>) -> Result<GrayImage> {
        let shot = match region {
            Some(region) => {
                let screen = Screen::from_point(region.x, region.y)
                    .context("no screen at region origin")?;
                screen.capture_area(
                    region.x - screen.display_info.x,
                    region.y - screen.display_info.y,
                    region.width,
                    region.height,
                )?
            }
            None => {
                let screens = Screen::all().context("failed to enumerate screens")?;
                let screen = screens.first().context("no screens found")?;
                screen.capture()?
            }
        };

        let (width, height) = (shot.width(), shot.height());
        let rgba = RgbaImage::from_raw(width, height, shot.to_vec())
            .context("captured frame had an unexpected buffer size")?;

        Ok(rgba_to_gray(&rgba))
    }

    fn click(&self, x: i32, y: i32) -> Result<()> {
        let mut enigo = ENIGO.lock().expect("enigo mutex poisoned");
        enigo.mouse_move_to(x, y);
        enigo.mouse_click(MouseButton::Left);
        Ok(())
    }
}

/// Rec. 601 luma conversion, one rayon task per pixel row's worth of chunks.
pub fn rgba_to_gray(image: &RgbaImage) -> GrayImage {
    let pixels = image
        .as_raw()
        .par_chunks(4)
        .map(|rgba| {
            let red = rgba[0] as f32;
            let green = rgba[1] as f32;
            let blue = rgba[2] as f32;
            (0.299 * red + 0.587 * green + 0.114 * blue) as u8
        })
        .collect();

    GrayImage::from_raw(image.width(), image.height(), pixels)
        .expect("luma buffer length matches source dimensions")
}

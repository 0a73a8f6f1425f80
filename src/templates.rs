use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::GrayImage;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// A reference image registered by the user. Pixels are re-read from disk on
/// every scan rather than cached, so edits to the file take effect live.
#[derive(Clone)]
pub struct Template {
    pub path: PathBuf,
    pub name: String,
}

impl Template {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Self { path, name }
    }

    pub fn load_gray(&self) -> Result<GrayImage> {
        let image = image::open(&self.path)
            .with_context(|| format!("failed to read template {}", self.path.display()))?;

        Ok(image.to_luma8())
    }
}

/// Ordered list of templates backing the visible list widget. Scan order is
/// registration order.
#[derive(Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl TemplateStore {
    // Duplicate paths are ignored, matching the file picker behavior.
    pub fn add(&mut self, path: PathBuf) -> bool {
        if self.templates.iter().any(|template| template.path == path) {
            return false;
        }

        self.templates.push(Template::new(path));
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<Template> {
        if index < self.templates.len() {
            Some(self.templates.remove(index))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Template> {
        self.templates.clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.templates.iter().any(|template| template.path == path)
    }
}

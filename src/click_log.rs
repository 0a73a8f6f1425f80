use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;

pub const CLICK_LOG_FILE: &str = "clicker.log";

/// Append-only record of every synthetic click, one line per click:
/// `<timestamp> - INFO: Clicked on <path> at (<x>, <y>)`.
#[derive(Clone)]
pub struct ClickLog {
    file: Arc<Mutex<File>>,
}

impl ClickLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open click log {}", path.display()))?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn record(&self, template: &Path, x: i32, y: i32) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let mut file = self.file.lock().expect("click log mutex poisoned");

        writeln!(
            file,
            "{} - INFO: Clicked on {} at ({}, {})",
            timestamp,
            template.display(),
            x,
            y
        )
        .context("failed to append to click log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn records_one_line_per_click() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicker.log");

        let log = ClickLog::open(&path).unwrap();
        log.record(&PathBuf::from("button.png"), 12, 34).unwrap();
        log.record(&PathBuf::from("icon.png"), 5, 6).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("- INFO: Clicked on button.png at (12, 34)"));
        assert!(lines[1].ends_with("- INFO: Clicked on icon.png at (5, 6)"));
        // Timestamp prefix like "2024-01-01 12:00:00.123".
        assert_eq!(&lines[0][4..5], "-");
        assert_eq!(&lines[0][7..8], "-");
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicker.log");

        ClickLog::open(&path)
            .unwrap()
            .record(&PathBuf::from("a.png"), 1, 1)
            .unwrap();
        ClickLog::open(&path)
            .unwrap()
            .record(&PathBuf::from("b.png"), 2, 2)
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use eframe::CreationContext;
use egui::{vec2, Context, FontFamily, FontId, TextStyle, ViewportCommand, Visuals, WindowLevel};
use tracing::info;

use crate::click_log::{ClickLog, CLICK_LOG_FILE};
use crate::engine::{self, ClickerJob, MatchParams};
use crate::keymap;
use crate::killswitch::{self, DeviceQueryProbe};
use crate::modals::{warning_window::DefaultWarningWindow, ModalWindow};
use crate::region_select::RegionSelector;
use crate::surface::{DesktopSurface, Region};
use crate::templates::TemplateStore;

pub mod app;
pub mod main_panel;

pub const WINDOW_SIZE: egui::Vec2 = vec2(560.0, 520.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Waiting,
    Running,
    Stopped,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Waiting => "waiting",
            Status::Running => "running",
            Status::Stopped => "stopped",
        }
    }
}

pub struct ClickerApp {
    pub templates: TemplateStore,
    pub selected_template: Option<usize>,
    pub region: Option<Region>,
    pub params: Arc<Mutex<MatchParams>>,
    pub status: Status,
    pub job: Option<ClickerJob>,
    pub modal: Option<Rc<dyn ModalWindow>>,
    pub selector: Option<RegionSelector>,
    surface: Arc<DesktopSurface>,
}

impl ClickerApp {
    pub fn new(cc: &CreationContext) -> Self {
        cc.egui_ctx.set_visuals(Visuals::dark());

        let mut style = (*cc.egui_ctx.style()).clone();
        style.text_styles.insert(
            TextStyle::Heading,
            FontId::new(22.0, FontFamily::Proportional),
        );
        style.spacing.item_spacing = vec2(8.0, 6.0);
        cc.egui_ctx.set_style(style);

        Self {
            templates: TemplateStore::default(),
            selected_template: None,
            region: None,
            params: Arc::new(Mutex::new(MatchParams::default())),
            status: Status::Waiting,
            job: None,
            modal: None,
            selector: None,
            surface: Arc::new(DesktopSurface),
        }
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn toggle_clicking(&mut self) {
        if self.is_running() {
            self.stop_clicking();
        } else {
            self.start_clicking();
        }
    }

    fn start_clicking(&mut self) {
        if self.templates.is_empty() {
            self.modal = Some(DefaultWarningWindow::new(
                "Warning",
                vec!["Add at least one template image first.".into()],
            ));
            return;
        }

        let key_text = {
            let params = self.params.lock().expect("params mutex poisoned");
            params.killswitch_key.clone()
        };
        let Some(killswitch_key) = keymap::parse_key(&key_text) else {
            self.modal = Some(DefaultWarningWindow::new(
                "Warning",
                vec![format!("Unknown killswitch key \"{key_text}\".")],
            ));
            return;
        };

        let log = match ClickLog::open(CLICK_LOG_FILE) {
            Ok(log) => log,
            Err(error) => {
                self.modal = Some(DefaultWarningWindow::new(
                    "Click Log Error",
                    vec!["Could not open the click log:".into(), error.to_string()],
                ));
                return;
            }
        };

        let Some(job) = engine::spawn(
            self.surface.clone(),
            self.templates.snapshot(),
            self.region,
            self.params.clone(),
            log,
        ) else {
            return;
        };

        killswitch::spawn_monitor(DeviceQueryProbe::new, killswitch_key, job.flags.clone());

        info!(region = ?self.region, "run started");
        self.job = Some(job);
        self.status = Status::Running;
    }

    // The job is kept until the worker actually exits; `poll_job` makes the
    // final transition back to waiting.
    fn stop_clicking(&mut self) {
        if let Some(job) = &self.job {
            job.stop();
        }
        self.status = Status::Stopped;
        info!("stop requested");
    }

    // Worker wound down (manual stop, killswitch, or exhausted run).
    pub fn poll_job(&mut self) {
        let finished = self
            .job
            .as_ref()
            .map(|job| job.is_finished())
            .unwrap_or(false);

        if finished {
            self.job = None;
            self.status = Status::Waiting;
        }
    }

    pub fn begin_area_selection(&mut self, ctx: &Context) {
        self.selector = Some(RegionSelector::new());
        ctx.send_viewport_cmd(ViewportCommand::Decorations(false));
        ctx.send_viewport_cmd(ViewportCommand::Fullscreen(true));
        ctx.send_viewport_cmd(ViewportCommand::WindowLevel(WindowLevel::AlwaysOnTop));
    }

    pub fn finish_area_selection(&mut self, ctx: &Context, region: Option<Region>) {
        self.region = region;
        self.selector = None;
        ctx.send_viewport_cmd(ViewportCommand::Fullscreen(false));
        ctx.send_viewport_cmd(ViewportCommand::Decorations(true));
        ctx.send_viewport_cmd(ViewportCommand::WindowLevel(WindowLevel::Normal));
        ctx.send_viewport_cmd(ViewportCommand::InnerSize(WINDOW_SIZE));
        info!(?region, "area selection finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::Template;
    use std::thread;
    use std::time::{Duration, Instant};

    fn idle_app() -> ClickerApp {
        ClickerApp {
            templates: TemplateStore::default(),
            selected_template: None,
            region: None,
            params: Arc::new(Mutex::new(MatchParams::default())),
            status: Status::Waiting,
            job: None,
            modal: None,
            selector: None,
            surface: Arc::new(DesktopSurface),
        }
    }

    // A job whose worker just spins: the template file does not exist, so
    // every scan skips it until the flags go inactive.
    fn running_app(dir: &tempfile::TempDir) -> ClickerApp {
        let mut app = idle_app();
        let log = ClickLog::open(dir.path().join("clicker.log")).unwrap();

        let job = engine::spawn(
            app.surface.clone(),
            vec![Template::new(dir.path().join("missing.png"))],
            None,
            app.params.clone(),
            log,
        )
        .unwrap();

        app.job = Some(job);
        app.status = Status::Running;
        app
    }

    fn wait_until_finished(app: &ClickerApp) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !app.job.as_ref().unwrap().is_finished() {
            assert!(Instant::now() < deadline, "worker did not stop in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn manual_stop_goes_back_to_waiting_once_the_worker_exits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = running_app(&dir);

        app.stop_clicking();
        assert_eq!(app.status, Status::Stopped);
        assert!(app.job.is_some(), "job is kept until the worker exits");

        wait_until_finished(&app);
        app.poll_job();

        assert_eq!(app.status, Status::Waiting);
        assert!(app.job.is_none());
    }

    #[test]
    fn poll_leaves_a_live_run_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = running_app(&dir);

        app.poll_job();
        assert_eq!(app.status, Status::Running);
        assert!(app.job.is_some());

        app.stop_clicking();
        wait_until_finished(&app);
    }
}

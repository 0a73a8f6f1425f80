//! The automation loop: capture, match, click, repeat.
//!
//! One worker thread per run. Stop requests arrive through a pair of
//! monotonic atomic flags shared with the controller and the killswitch
//! monitor; the loop polls them between every template and every click, so
//! worst-case shutdown latency is one click delay plus the scan in progress.
//! Stopping is best-effort: nobody joins the worker, it just winds down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::click_log::ClickLog;
use crate::matching;
use crate::surface::{Region, Surface};
use crate::templates::Template;

// Pause before retrying after a failed capture, so a persistently broken
// screen source doesn't spin the CPU.
const CAPTURE_RETRY_PAUSE: Duration = Duration::from_millis(250);

/// Settings read fresh from the GUI on every loop iteration.
#[derive(Clone)]
pub struct MatchParams {
    pub threshold: f32,
    pub click_delay_secs: f64,
    pub killswitch_key: String,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            click_delay_secs: 0.01,
            killswitch_key: "q".into(),
        }
    }
}

impl MatchParams {
    pub fn click_delay(&self) -> Duration {
        Duration::from_secs_f64(self.click_delay_secs)
    }
}

/// Shared stop signals. Both flags are monotonic within a run (`running`
/// only ever goes true to false, `killswitch` false to true), so relaxed
/// loads are enough; consumers only poll them to decide to stop.
#[derive(Clone)]
pub struct RunFlags {
    running: Arc<AtomicBool>,
    killswitch: Arc<AtomicBool>,
}

impl RunFlags {
    pub fn start() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            killswitch: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::Relaxed) && !self.killswitch.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn trip_killswitch(&self) {
        self.killswitch.store(true, Ordering::Relaxed);
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn killswitch_tripped(&self) -> bool {
        self.killswitch.load(Ordering::Relaxed)
    }
}

pub struct ClickerJob {
    pub flags: RunFlags,
    handle: JoinHandle<()>,
}

impl ClickerJob {
    pub fn stop(&self) {
        self.flags.request_stop();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns the worker thread. Returns `None` without spawning anything when
/// there are no templates to scan for.
pub fn spawn<S>(
    surface: Arc<S>,
    templates: Vec<Template>,
    region: Option<Region>,
    params: Arc<Mutex<MatchParams>>,
    log: ClickLog,
) -> Option<ClickerJob>
where
    S: Surface + Send + Sync + 'static,
{
    if templates.is_empty() {
        return None;
    }

    let flags = RunFlags::start();
    let thread_flags = flags.clone();

    let handle = thread::spawn(move || {
        search_and_click(surface, templates, region, params, log, thread_flags);
    });

    Some(ClickerJob { flags, handle })
}

fn search_and_click<S: Surface>(
    surface: Arc<S>,
    templates: Vec<Template>,
    region: Option<Region>,
    params: Arc<Mutex<MatchParams>>,
    log: ClickLog,
    flags: RunFlags,
) {
    info!(templates = templates.len(), ?region, "automation loop started");

    while flags.is_active() {
        let (threshold, click_delay) = {
            let params = params.lock().expect("params mutex poisoned");
            (params.threshold, params.click_delay())
        };

        let frame = match surface.capture(region) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(%error, "screen capture failed, retrying");
                thread::sleep(CAPTURE_RETRY_PAUSE);
                continue;
            }
        };

        for template in &templates {
            if !flags.is_active() {
                break;
            }

            // Unreadable files are skipped rather than killing the run; the
            // user may still be editing the template on disk.
            let pixels = match template.load_gray() {
                Ok(pixels) => pixels,
                Err(error) => {
                    warn!(template = %template.path.display(), %error, "skipping template");
                    continue;
                }
            };

            if !matching::template_fits(&frame, &pixels) {
                warn!(
                    template = %template.path.display(),
                    "template is larger than the captured frame, skipping"
                );
                continue;
            }

            let matches = matching::find_matches(&frame, &pixels, threshold);
            debug!(template = %template.name, found = matches.len(), "scan finished");

            for found in &matches {
                if !flags.is_active() {
                    break;
                }

                let (x, y) = matching::click_point(found, &pixels, region);

                if let Err(error) = surface.click(x, y) {
                    warn!(%error, x, y, "synthetic click failed");
                    continue;
                }

                info!(template = %template.path.display(), x, y, score = found.score, "clicked");
                if let Err(error) = log.record(&template.path, x, y) {
                    warn!(%error, "could not append to the click log");
                }

                thread::sleep(click_delay);
            }
        }
    }

    // Reflect idle state for anyone still watching the flags.
    flags.request_stop();
    info!("automation loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Region;
    use image::{GrayImage, Luma};
    use std::time::Instant;

    /// Fake desktop: hands out a fixed frame and records clicks.
    struct FakeSurface {
        frame: GrayImage,
        clicks: Mutex<Vec<(i32, i32)>>,
    }

    impl FakeSurface {
        fn new(frame: GrayImage) -> Arc<Self> {
            Arc::new(Self {
                frame,
                clicks: Mutex::new(Vec::new()),
            })
        }

        fn with_block(block_x: u32, block_y: u32) -> GrayImage {
            let mut frame = GrayImage::from_pixel(64, 64, Luma([10u8]));
            for (dx, dy, pixel) in striped(8).enumerate_pixels() {
                frame.put_pixel(block_x + dx, block_y + dy, *pixel);
            }
            frame
        }
    }

    // Half bright, half dark, so the zero-mean correlation has contrast to
    // lock onto and only the exact alignment clears the test threshold.
    fn striped(side: u32) -> GrayImage {
        let mut image = GrayImage::from_pixel(side, side, Luma([0u8]));
        for y in 0..side {
            for x in 0..side / 2 {
                image.put_pixel(x, y, Luma([255u8]));
            }
        }
        image
    }

    impl Surface for FakeSurface {
        fn capture(&self, _region: Option<Region>) -> anyhow::Result<GrayImage> {
            Ok(self.frame.clone())
        }

        fn click(&self, x: i32, y: i32) -> anyhow::Result<()> {
            self.clicks.lock().unwrap().push((x, y));
            Ok(())
        }
    }

    fn template_file(dir: &tempfile::TempDir) -> Template {
        let path = dir.path().join("block.png");
        striped(8).save(&path).unwrap();
        Template::new(path)
    }

    fn test_params() -> Arc<Mutex<MatchParams>> {
        Arc::new(Mutex::new(MatchParams {
            threshold: 0.999,
            click_delay_secs: 0.001,
            killswitch_key: "q".into(),
        }))
    }

    fn test_log(dir: &tempfile::TempDir) -> ClickLog {
        ClickLog::open(dir.path().join("clicker.log")).unwrap()
    }

    fn wait_until_finished(job: &ClickerJob) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !job.is_finished() {
            assert!(Instant::now() < deadline, "worker did not stop in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn wait_for_first_click(surface: &FakeSurface) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while surface.clicks.lock().unwrap().is_empty() {
            assert!(Instant::now() < deadline, "no click recorded in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn spawn_with_no_templates_stays_idle() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FakeSurface::new(GrayImage::from_pixel(8, 8, Luma([10u8])));

        let job = spawn(surface, Vec::new(), None, test_params(), test_log(&dir));
        assert!(job.is_none());
    }

    #[test]
    fn clicks_the_center_of_each_match() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FakeSurface::new(FakeSurface::with_block(20, 10));

        let job = spawn(
            surface.clone(),
            vec![template_file(&dir)],
            None,
            test_params(),
            test_log(&dir),
        )
        .unwrap();

        wait_for_first_click(&surface);
        job.stop();
        wait_until_finished(&job);

        let clicks = surface.clicks.lock().unwrap();
        assert!(clicks.iter().all(|&click| click == (24, 14)));
    }

    #[test]
    fn region_origin_is_added_to_click_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FakeSurface::new(FakeSurface::with_block(20, 10));
        let region = Region { x: 100, y: 50, width: 64, height: 64 };

        let job = spawn(
            surface.clone(),
            vec![template_file(&dir)],
            Some(region),
            test_params(),
            test_log(&dir),
        )
        .unwrap();

        wait_for_first_click(&surface);
        job.stop();
        wait_until_finished(&job);

        assert_eq!(surface.clicks.lock().unwrap()[0], (124, 64));
    }

    #[test]
    fn killswitch_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FakeSurface::new(GrayImage::from_pixel(64, 64, Luma([10u8])));

        let job = spawn(
            surface,
            vec![template_file(&dir)],
            None,
            test_params(),
            test_log(&dir),
        )
        .unwrap();

        job.flags.trip_killswitch();
        wait_until_finished(&job);
        assert!(job.flags.killswitch_tripped());
        assert!(!job.flags.is_active());
    }

    #[test]
    fn unreadable_template_is_skipped_without_crashing() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("missing.png");
        let surface = FakeSurface::new(FakeSurface::with_block(20, 10));

        let job = spawn(
            surface.clone(),
            vec![Template::new(bogus), template_file(&dir)],
            None,
            test_params(),
            test_log(&dir),
        )
        .unwrap();

        wait_for_first_click(&surface);
        job.stop();
        wait_until_finished(&job);
    }
}

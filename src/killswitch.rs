//! Global hotkey monitor. Polls the keyboard state on a fixed interval while
//! a run is active and trips the stop flags when the configured key goes
//! down. The automation loop never waits for this thread; stopping is
//! best-effort, observed at the loop's next flag check.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use device_query::{DeviceQuery, DeviceState, Keycode};
use tracing::info;

use crate::engine::RunFlags;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Keyboard-state query capability. The production implementation asks the
/// OS through `device_query`; tests substitute a flag-backed fake.
pub trait KeyboardProbe {
    fn is_pressed(&self, key: Keycode) -> bool;
}

pub struct DeviceQueryProbe {
    state: DeviceState,
}

impl DeviceQueryProbe {
    pub fn new() -> Self {
        Self {
            state: DeviceState::new(),
        }
    }
}

impl Default for DeviceQueryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardProbe for DeviceQueryProbe {
    fn is_pressed(&self, key: Keycode) -> bool {
        self.state.get_keys().contains(&key)
    }
}

/// The probe is constructed inside the monitor thread; platform keyboard
/// handles are not guaranteed to move across threads.
pub fn spawn_monitor<P, F>(make_probe: F, key: Keycode, flags: RunFlags) -> JoinHandle<()>
where
    P: KeyboardProbe,
    F: FnOnce() -> P + Send + 'static,
{
    thread::spawn(move || {
        let probe = make_probe();

        while flags.is_active() {
            if probe.is_pressed(key) {
                info!(?key, "killswitch pressed, stopping");
                flags.trip_killswitch();
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    struct FakeProbe {
        pressed: Arc<AtomicBool>,
    }

    impl KeyboardProbe for FakeProbe {
        fn is_pressed(&self, _key: Keycode) -> bool {
            self.pressed.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn pressing_the_key_trips_both_flags() {
        let pressed = Arc::new(AtomicBool::new(false));
        let flags = RunFlags::start();

        let probe_pressed = pressed.clone();
        let handle = spawn_monitor(
            move || FakeProbe { pressed: probe_pressed },
            Keycode::Q,
            flags.clone(),
        );

        pressed.store(true, Ordering::Relaxed);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !flags.killswitch_tripped() {
            assert!(Instant::now() < deadline, "killswitch never tripped");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!flags.is_active());
        handle.join().unwrap();
    }

    #[test]
    fn monitor_exits_when_the_run_stops_first() {
        let flags = RunFlags::start();

        let handle = spawn_monitor(
            || FakeProbe {
                pressed: Arc::new(AtomicBool::new(false)),
            },
            Keycode::Q,
            flags.clone(),
        );

        flags.request_stop();
        handle.join().unwrap();
        assert!(!flags.killswitch_tripped());
    }
}

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use deckstats_core::protocol::INPUT_REPORT_LEN;
use deckstats_core::{
    Dashboard, DeckTransport, KEY_COUNT, KeyStates, SensorSource, default_sources, key_changes,
    parse_key_states, prepare_device,
};

use super::Overrides;
use crate::hid::{HidTransport, hid_api, open_deck};

/// Longest uninterrupted sleep, so Ctrl+C is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);
/// How long the input reader blocks per read before rechecking the stop flag.
const INPUT_POLL_MS: i32 = 100;

pub struct RunCommandConfig<'a> {
    pub config_path: Option<&'a Path>,
    pub interval_ms: Option<u64>,
    pub brightness: Option<u8>,
    pub keep_going: bool,
    pub read_input: bool,
    pub hwmon_root: Option<&'a Path>,
    pub serial: Option<&'a str>,
}

pub fn run(cmd: RunCommandConfig<'_>) {
    let config = super::effective_config_or_exit(
        cmd.config_path,
        Overrides {
            interval_ms: cmd.interval_ms,
            brightness: cmd.brightness,
        },
    );

    let api = match hid_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error initialising HID: {e}");
            std::process::exit(1);
        }
    };
    let mut deck = match open_deck(&api, cmd.serial) {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = prepare_device(&config, &mut deck) {
        eprintln!("Error preparing deck: {e}");
        std::process::exit(1);
    }

    let mut dashboard = match Dashboard::new(&config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("cannot install Ctrl+C handler: {e}");
    }

    let reader = if cmd.read_input {
        match open_deck(&api, cmd.serial) {
            Ok(input) => spawn_input_reader(input, running.clone()),
            Err(e) => {
                warn!("key input disabled: {e}");
                None
            }
        }
    } else {
        None
    };

    let mut sources = default_sources(cmd.hwmon_root);
    let interval = Duration::from_millis(config.interval_ms);
    info!(
        "updating {} panel(s) every {}ms, Ctrl+C to stop",
        dashboard.panels().len(),
        config.interval_ms
    );

    let mut updates = 0u64;
    let mut failures = 0u64;
    let mut fatal = false;

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        let readings = sources.poll();
        match dashboard.tick(&readings, &mut deck) {
            Ok(report) => {
                updates += 1;
                debug!(
                    "update {updates}: {} key(s) written, {} panel(s) without data",
                    report.keys_written,
                    report.missing.len()
                );
            }
            Err(e) => {
                failures += 1;
                error!("update failed: {e}");
                if !cmd.keep_going {
                    fatal = true;
                    break;
                }
            }
        }

        let deadline = started + interval;
        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }

    running.store(false, Ordering::SeqCst);
    if let Some(handle) = reader {
        if handle.join().is_err() {
            warn!("input reader panicked");
        }
    }

    info!("stopped after {updates} update(s), {failures} failure(s)");
    if fatal {
        eprintln!("Stopped on device error. Use --keep-going to ride out transient failures.");
        std::process::exit(1);
    }
}

fn spawn_input_reader(mut input: HidTransport, running: Arc<AtomicBool>) -> Option<JoinHandle<()>> {
    let spawned = std::thread::Builder::new()
        .name("deck-input".to_string())
        .spawn(move || read_input(&mut input, &running));
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("key input disabled: {e}");
            None
        }
    }
}

/// Log key presses until `running` clears or the device stops answering.
fn read_input<T: DeckTransport + ?Sized>(input: &mut T, running: &AtomicBool) {
    let mut buf = [0u8; INPUT_REPORT_LEN];
    let mut previous: KeyStates = [false; KEY_COUNT as usize];
    while running.load(Ordering::SeqCst) {
        match input.read_timeout(&mut buf, INPUT_POLL_MS) {
            Ok(0) => {}
            Ok(n) => previous = log_key_changes(&previous, &buf[..n]),
            Err(e) => {
                warn!("input reader stopped: {e}");
                return;
            }
        }
    }
}

/// Log every key whose state changed; returns the new states.
fn log_key_changes(previous: &KeyStates, report: &[u8]) -> KeyStates {
    let Some(current) = parse_key_states(report) else {
        debug!("ignoring {}-byte input report", report.len());
        return *previous;
    };
    for (key, pressed) in key_changes(previous, &current) {
        info!(
            "key {key} {}",
            if pressed { "pressed" } else { "released" }
        );
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckstats_core::{DeckError, RecordingTransport};

    fn report(pressed: &[usize]) -> Vec<u8> {
        let mut r = vec![0u8; 1 + KEY_COUNT as usize];
        r[0] = 0x01;
        for &k in pressed {
            r[1 + k] = 1;
        }
        r
    }

    #[test]
    fn key_changes_update_state() {
        let idle = [false; KEY_COUNT as usize];
        let states = log_key_changes(&idle, &report(&[2, 7]));
        assert!(states[2] && states[7]);
        let states = log_key_changes(&states, &report(&[7]));
        assert!(!states[2] && states[7]);
    }

    #[test]
    fn foreign_report_keeps_previous_state() {
        let mut previous = [false; KEY_COUNT as usize];
        previous[4] = true;
        let states = log_key_changes(&previous, &[0x02, 0, 0]);
        assert_eq!(states, previous);
    }

    /// Hands out queued reports, then fails so the reader loop ends.
    struct ScriptedInput(RecordingTransport);

    impl DeckTransport for ScriptedInput {
        fn write(&mut self, data: &[u8]) -> deckstats_core::Result<usize> {
            self.0.write(data)
        }

        fn send_feature_report(&mut self, data: &[u8]) -> deckstats_core::Result<()> {
            self.0.send_feature_report(data)
        }

        fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> deckstats_core::Result<usize> {
            if self.0.pending_input.is_empty() {
                return Err(DeckError::Transport("unplugged".to_string()));
            }
            self.0.read_timeout(buf, timeout_ms)
        }
    }

    #[test]
    fn reader_stops_on_transport_error() {
        let mut inner = RecordingTransport::new();
        inner.queue_input(report(&[0]));
        inner.queue_input(report(&[]));
        let mut input = ScriptedInput(inner);
        let running = AtomicBool::new(true);
        read_input(&mut input, &running);
        assert!(input.0.pending_input.is_empty());
    }

    #[test]
    fn reader_exits_when_stopped() {
        let mut input = RecordingTransport::new();
        input.queue_input(report(&[1]));
        let running = AtomicBool::new(false);
        read_input(&mut input, &running);
        // Nothing read once the flag is already clear.
        assert_eq!(input.pending_input.len(), 1);
    }
}

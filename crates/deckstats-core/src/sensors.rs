//! Sensor sources that feed the dashboard.
//!
//! Sources are best-effort: a sensor that cannot be read is left out of the
//! poll result rather than guessed. Readings are named `<chip>.<label>` with
//! both parts normalized to lowercase `snake_case`, e.g.
//! `k10temp.tctl` or `amdgpu.edge`.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Default location of the Linux hwmon class directory.
pub const HWMON_ROOT: &str = "/sys/class/hwmon";

/// One instantaneous sensor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub name: String,
    pub value: f32,
    pub unit: String,
}

impl SensorReading {
    pub fn new(name: impl Into<String>, value: f32, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Anything that can be polled for a batch of readings.
pub trait SensorSource: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Read every sensor this source knows about.
    fn poll(&mut self) -> Vec<SensorReading>;
}

/// Find the first reading whose name contains `pattern` (case-insensitive).
///
/// `pattern` may list alternatives separated by `|`; they are tried in order,
/// so `"coretemp.package|k10temp.tctl"` prefers an Intel package sensor and
/// falls back to the AMD one.
pub fn find_reading<'a>(readings: &'a [SensorReading], pattern: &str) -> Option<&'a SensorReading> {
    pattern
        .split('|')
        .map(|alt| alt.trim().to_lowercase())
        .filter(|alt| !alt.is_empty())
        .find_map(|alt| {
            readings
                .iter()
                .find(|r| r.name.to_lowercase().contains(&alt))
        })
}

fn push_reading(out: &mut Vec<SensorReading>, name: String, value: f64, unit: &str) {
    if !value.is_finite() {
        return;
    }
    out.push(SensorReading::new(name, value as f32, unit));
}

fn read_trimmed(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let v = raw.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

/// Lowercase, collapse runs of non-alphanumerics into one `_`, trim `_`.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_us = false;
    for ch in raw.to_ascii_lowercase().chars() {
        let mapped = if ch.is_ascii_alphanumeric() { ch } else { '_' };
        if mapped == '_' {
            if !prev_us {
                out.push(mapped);
            }
            prev_us = true;
        } else {
            out.push(mapped);
            prev_us = false;
        }
    }
    out.trim_matches('_').to_string()
}

// ---------------------------------------------------------------------------
// hwmon
// ---------------------------------------------------------------------------

/// Linux hwmon sensors: temperatures, fans, voltages, currents and power.
#[derive(Debug, Clone)]
pub struct HwmonSource {
    root: PathBuf,
}

impl HwmonSource {
    pub fn new() -> Self {
        Self::with_root(HWMON_ROOT)
    }

    /// Read from a different hwmon tree (fixtures, containers with a bind mount).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect_chip(dir: &Path, out: &mut Vec<SensorReading>) {
        let chip = read_trimmed(&dir.join("name"))
            .map(|s| normalize_key(&s))
            .unwrap_or_else(|| {
                normalize_key(
                    dir.file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown_hwmon"),
                )
            });

        let Ok(files) = std::fs::read_dir(dir) else {
            warn!("hwmon: cannot list {}", dir.display());
            return;
        };
        let mut paths: Vec<PathBuf> = files.flatten().map(|f| f.path()).collect();
        paths.sort();

        for path in paths {
            let Some(name_os) = path.file_name() else {
                continue;
            };
            let fname = name_os.to_string_lossy();
            if !fname.ends_with("_input") {
                continue;
            }
            let Some(raw) = read_trimmed(&path).and_then(|s| s.parse::<f64>().ok()) else {
                debug!("hwmon: skipping unreadable {}", path.display());
                continue;
            };

            let label_path = dir.join(fname.replace("_input", "_label"));
            let label = read_trimmed(&label_path)
                .map(|s| normalize_key(&s))
                .unwrap_or_else(|| normalize_key(fname.trim_end_matches("_input")));
            let key = format!("{chip}.{label}");

            if fname.starts_with("temp") {
                push_reading(out, key, raw / 1000.0, "C");
            } else if fname.starts_with("fan") {
                push_reading(out, key, raw, "rpm");
            } else if fname.starts_with("in") {
                push_reading(out, key, raw / 1000.0, "V");
            } else if fname.starts_with("curr") {
                push_reading(out, key, raw / 1000.0, "A");
            } else if fname.starts_with("power") {
                push_reading(out, key, raw / 1_000_000.0, "W");
            }
        }
    }
}

impl Default for HwmonSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for HwmonSource {
    fn name(&self) -> &str {
        "hwmon"
    }

    fn poll(&mut self) -> Vec<SensorReading> {
        let mut out = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            debug!("hwmon: {} not present", self.root.display());
            return out;
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            Self::collect_chip(&dir, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Load average
// ---------------------------------------------------------------------------

/// System load averages as `system.load_1m`, `system.load_5m`, `system.load_15m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadAverageSource;

impl SensorSource for LoadAverageSource {
    fn name(&self) -> &str {
        "loadavg"
    }

    fn poll(&mut self) -> Vec<SensorReading> {
        let mut out = Vec::new();
        #[cfg(unix)]
        {
            let mut values = [0.0_f64; 3];
            // SAFETY: `getloadavg` writes up to `n` doubles to a valid buffer.
            let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
            let names = ["system.load_1m", "system.load_5m", "system.load_15m"];
            for (name, value) in names.iter().zip(values).take(n.max(0) as usize) {
                push_reading(&mut out, name.to_string(), value, "load");
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Fixed and composite sources
// ---------------------------------------------------------------------------

/// Returns the same readings on every poll.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub readings: Vec<SensorReading>,
}

impl StaticSource {
    pub fn new(readings: Vec<SensorReading>) -> Self {
        Self { readings }
    }
}

impl SensorSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn poll(&mut self) -> Vec<SensorReading> {
        self.readings.clone()
    }
}

/// Concatenates the readings of several sources, in order.
#[derive(Default)]
pub struct CompositeSource {
    sources: Vec<Box<dyn SensorSource>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: Box<dyn SensorSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl SensorSource for CompositeSource {
    fn name(&self) -> &str {
        "composite"
    }

    fn poll(&mut self) -> Vec<SensorReading> {
        let mut out = Vec::new();
        for source in &mut self.sources {
            let readings = source.poll();
            debug!("{}: {} reading(s)", source.name(), readings.len());
            out.extend(readings);
        }
        out
    }
}

/// hwmon under `hwmon_root` (or the system default) followed by load averages.
pub fn default_sources(hwmon_root: Option<&Path>) -> CompositeSource {
    let hwmon = match hwmon_root {
        Some(root) => HwmonSource::with_root(root),
        None => HwmonSource::new(),
    };
    CompositeSource::new()
        .with(Box::new(hwmon))
        .with(Box::new(LoadAverageSource))
}

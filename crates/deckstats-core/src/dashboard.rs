//! The poll/render cycle.
//!
//! A [`Dashboard`] owns one [`Panel`] per monitored metric, and each panel
//! owns the [`TelemetryBuffer`] holding that metric's history. The caller
//! drives the cycle: poll sensors, hand the readings to [`Dashboard::tick`]
//! together with a transport, sleep, repeat.

use log::{debug, warn};

use crate::buffer::TelemetryBuffer;
use crate::config::{DashboardConfig, PanelConfig};
use crate::encode::encode;
use crate::error::Result;
use crate::graph::{PartialBucket, render_graph};
use crate::grid::PixelGrid;
use crate::protocol::{reset, set_brightness, write_key_image};
use crate::reading::render_reading;
use crate::sensors::{SensorReading, find_reading};
use crate::transport::DeckTransport;

/// One metric: its key assignment and its history.
#[derive(Debug, Clone)]
pub struct Panel {
    config: PanelConfig,
    history: TelemetryBuffer,
    /// Set once a missing sensor has been reported, cleared when it returns.
    missing_reported: bool,
}

impl Panel {
    pub fn new(config: PanelConfig, history_capacity: usize) -> Result<Self> {
        Ok(Self {
            config,
            history: TelemetryBuffer::new(history_capacity)?,
            missing_reported: false,
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn history(&self) -> &TelemetryBuffer {
        &self.history
    }

    /// Append one sample to the history.
    pub fn record(&mut self, value: f32) {
        self.history.push(value);
    }

    /// Key image with the most recent value, or `None` before the first sample.
    pub fn reading_image(&self) -> Option<PixelGrid> {
        let value = self.history.latest()?;
        Some(render_reading(
            &self.config.label,
            value,
            self.config.text_rgb(),
        ))
    }

    /// Key image with the history graph.
    pub fn graph_image(&self, bucket_width: usize, partial: PartialBucket) -> Result<PixelGrid> {
        render_graph(
            &self.history.snapshot(),
            bucket_width,
            partial,
            &self.config.graph_style(),
        )
    }
}

/// Outcome of one [`Dashboard::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// `(panel label, sensor name, value)` for every panel that found its sensor.
    pub matched: Vec<(String, String, f32)>,
    /// Labels of panels whose sensor was absent this tick.
    pub missing: Vec<String>,
    /// Key images written to the device.
    pub keys_written: usize,
}

/// All panels plus the graph settings shared between them.
#[derive(Debug, Clone)]
pub struct Dashboard {
    panels: Vec<Panel>,
    bucket_width: usize,
    partial: PartialBucket,
}

impl Dashboard {
    /// Build panels from a configuration, validating it first.
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;
        let panels = config
            .panels
            .iter()
            .map(|p| Panel::new(p.clone(), config.history_capacity))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            panels,
            bucket_width: config.bucket_width,
            partial: config.partial_buckets,
        })
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Record one round of readings and push every affected key image.
    ///
    /// A panel whose sensor is missing is skipped and its keys keep their last
    /// image. The first transport failure aborts the tick and is returned;
    /// samples recorded before the failure stay recorded.
    pub fn tick<T: DeckTransport + ?Sized>(
        &mut self,
        readings: &[SensorReading],
        transport: &mut T,
    ) -> Result<TickReport> {
        let mut report = TickReport::default();

        for panel in &mut self.panels {
            let Some(reading) = find_reading(readings, &panel.config.metric) else {
                if panel.missing_reported {
                    debug!(
                        "{}: still no sensor matching '{}'",
                        panel.config.label, panel.config.metric
                    );
                } else {
                    warn!(
                        "{}: no sensor matches '{}'",
                        panel.config.label, panel.config.metric
                    );
                    panel.missing_reported = true;
                }
                report.missing.push(panel.config.label.clone());
                continue;
            };
            panel.missing_reported = false;

            debug!(
                "{}: {} = {:.2}{}",
                panel.config.label, reading.name, reading.value, reading.unit
            );
            panel.record(reading.value);
            report.matched.push((
                panel.config.label.clone(),
                reading.name.clone(),
                reading.value,
            ));

            if let (Some(key), Some(image)) = (panel.config.reading_key, panel.reading_image()) {
                write_key_image(transport, key, &encode(&image))?;
                report.keys_written += 1;
            }
            if let Some(key) = panel.config.graph_key {
                let image = panel.graph_image(self.bucket_width, self.partial)?;
                write_key_image(transport, key, &encode(&image))?;
                report.keys_written += 1;
            }
        }

        Ok(report)
    }

    /// Forget all history, e.g. after the device was reconnected.
    pub fn reset_history(&mut self) {
        for panel in &mut self.panels {
            panel.history.reset();
        }
    }
}

/// Apply the startup device settings from `config`: reset first, then brightness.
pub fn prepare_device<T: DeckTransport + ?Sized>(
    config: &DashboardConfig,
    transport: &mut T,
) -> Result<()> {
    if config.reset_on_start {
        reset(transport)?;
    }
    if let Some(percent) = config.brightness {
        set_brightness(transport, percent)?;
    }
    Ok(())
}

//! # deckstats-core
//!
//! **Live hardware telemetry on a 15-key Stream Deck.**
//!
//! `deckstats-core` keeps a short rolling history per monitored sensor,
//! renders it as a bar graph (and the latest value as text) onto 72x72 key
//! icons, and frames those icons into the device's two-page HID output
//! reports. Talking to actual hardware is left to a [`DeckTransport`]
//! implementation; the `deckstats` CLI provides one over hidapi.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deckstats_core::{Dashboard, DashboardConfig, RecordingTransport, SensorSource};
//!
//! let config = DashboardConfig::default();
//! let mut dashboard = Dashboard::new(&config).unwrap();
//! let mut sources = deckstats_core::default_sources(None);
//! let mut deck = RecordingTransport::new();
//!
//! let report = dashboard.tick(&sources.poll(), &mut deck).unwrap();
//! println!("{} key images written", report.keys_written);
//! ```
//!
//! ## Architecture
//!
//! Sensor reading → [`TelemetryBuffer`] → snapshot → [`render_graph`] →
//! [`PixelGrid`] → [`encode`] → [`write_key_image`] → two device writes
//!
//! Everything up to the transport is a pure, synchronous transform. The
//! [`Dashboard`] owns one buffer per panel and drives the cycle once per
//! [`Dashboard::tick`]; scheduling belongs to the caller.

pub mod buffer;
pub mod config;
pub mod dashboard;
pub mod encode;
pub mod error;
pub mod graph;
pub mod grid;
pub mod protocol;
pub mod reading;
pub mod sensors;
pub mod transport;

pub use buffer::TelemetryBuffer;
pub use config::{DashboardConfig, PanelConfig};
pub use dashboard::{Dashboard, Panel, TickReport, prepare_device};
pub use encode::{EncodedImage, decode, encode};
pub use error::{DeckError, Result};
pub use graph::{GraphBar, GraphStyle, PartialBucket, draw_graph, graph_bars, render_graph};
pub use grid::{ICON_SIZE, PixelGrid};
pub use protocol::{
    KEY_COUNT, KeyStates, frame_key_image, key_changes, parse_key_states, reset, set_brightness,
    write_key_image,
};
pub use reading::{format_reading, render_reading};
pub use sensors::{
    CompositeSource, HwmonSource, LoadAverageSource, SensorReading, SensorSource, StaticSource,
    default_sources, find_reading,
};
pub use transport::{DeckTransport, RecordingTransport};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! The display transport seam.
//!
//! The framer only needs to hand fixed-length packets to *something*. The CLI
//! provides a HID-backed implementation; [`RecordingTransport`] keeps every
//! packet in memory for tests and dry runs.

use std::collections::VecDeque;

use crate::error::{DeckError, Result};

/// Packetized connection to a key display device.
pub trait DeckTransport {
    /// Send one output report. Returns the number of bytes the device accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Send one feature report (reset, brightness).
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()>;

    /// Read one input report, waiting at most `timeout_ms` (-1 blocks).
    /// Returns 0 when the timeout expires without data.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;
}

impl<T: DeckTransport + ?Sized> DeckTransport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        (**self).send_feature_report(data)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        (**self).read_timeout(buf, timeout_ms)
    }
}

/// In-memory transport that records everything written to it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub writes: Vec<Vec<u8>>,
    pub feature_reports: Vec<Vec<u8>>,
    /// Input reports handed out by `read_timeout`, front first.
    pub pending_input: VecDeque<Vec<u8>>,
    fail_write_at: Option<usize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th write (0-based, counted over the transport's lifetime) fail.
    pub fn fail_write_at(mut self, n: usize) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    /// Queue an input report for a later `read_timeout`.
    pub fn queue_input(&mut self, report: Vec<u8>) {
        self.pending_input.push_back(report);
    }
}

impl DeckTransport for RecordingTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.fail_write_at == Some(self.writes.len()) {
            self.fail_write_at = None;
            return Err(DeckError::Transport("injected write failure".to_string()));
        }
        self.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.feature_reports.push(data.to_vec());
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: i32) -> Result<usize> {
        let Some(report) = self.pending_input.pop_front() else {
            return Ok(0);
        };
        let n = report.len().min(buf.len());
        buf[..n].copy_from_slice(&report[..n]);
        Ok(n)
    }
}

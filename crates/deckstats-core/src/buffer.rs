//! Fixed-capacity circular history of `f32` telemetry samples.
//!
//! A [`TelemetryBuffer`] of capacity N keeps the N most recent samples. New
//! writes overwrite the oldest data once the ring is full, and
//! [`TelemetryBuffer::snapshot`] always reads the retained samples back
//! oldest-first regardless of where the wrap point currently sits.
//!
//! Appends never allocate: the storage is a boxed slice sized once at
//! construction and reused across [`TelemetryBuffer::reset`].

use crate::error::{DeckError, Result};

/// Circular buffer of telemetry samples for a single metric.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    data: Box<[f32]>,
    /// Index of the next slot to overwrite. Always in `0..capacity`.
    write_cursor: usize,
    /// Every sample ever appended, including ones evicted in the same call.
    written: u64,
}

impl TelemetryBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DeckError::InvalidArgument(
                "telemetry buffer capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            data: vec![0.0; capacity].into_boxed_slice(),
            write_cursor: 0,
            written: 0,
        })
    }

    /// Append samples in chronological order, overwriting the oldest data.
    ///
    /// The total-written counter grows by `samples.len()` even when the burst
    /// is longer than the ring; in that case only its last `capacity` samples
    /// are stored.
    pub fn append(&mut self, samples: &[f32]) {
        self.written += samples.len() as u64;

        let capacity = self.data.len();
        let samples = if samples.len() > capacity {
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        let remain = capacity - self.write_cursor;
        let head = samples.len().min(remain);
        self.data[self.write_cursor..self.write_cursor + head].copy_from_slice(&samples[..head]);
        let tail = &samples[head..];
        self.data[..tail.len()].copy_from_slice(tail);

        self.write_cursor = (self.write_cursor + samples.len()) % capacity;
    }

    /// Append a single sample.
    pub fn push(&mut self, sample: f32) {
        self.append(std::slice::from_ref(&sample));
    }

    /// Fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Total number of samples ever appended since creation or the last reset.
    pub fn total_written(&self) -> u64 {
        self.written
    }

    /// Number of samples currently retrievable.
    pub fn len(&self) -> usize {
        self.written.min(self.data.len() as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Whether the ring has wrapped at least once (every slot holds live data).
    pub fn is_full(&self) -> bool {
        self.written >= self.data.len() as u64
    }

    /// Most recently appended sample.
    pub fn latest(&self) -> Option<f32> {
        if self.written == 0 {
            return None;
        }
        let capacity = self.data.len();
        Some(self.data[(self.write_cursor + capacity - 1) % capacity])
    }

    /// Point-in-time copy of the retained samples, oldest first.
    ///
    /// Later appends do not affect a snapshot that has already been taken.
    pub fn snapshot(&self) -> Vec<f32> {
        let capacity = self.data.len();
        if self.written == 0 {
            Vec::new()
        } else if self.written < capacity as u64 {
            self.data[..self.write_cursor].to_vec()
        } else if self.write_cursor == 0 {
            self.data.to_vec()
        } else {
            let mut out = Vec::with_capacity(capacity);
            out.extend_from_slice(&self.data[self.write_cursor..]);
            out.extend_from_slice(&self.data[..self.write_cursor]);
            out
        }
    }

    /// Logically empty the buffer. Storage is kept; stale slots become unreachable.
    pub fn reset(&mut self) {
        self.write_cursor = 0;
        self.written = 0;
    }
}

//! Chunked, paced bulk transmission of receipt segments

use std::thread;
use std::time::Duration;

use tracing::{debug, info, instrument};

use super::{BulkOutEndpoint, ClaimedInterface, UsbDevice};
use crate::error::{PrintError, PrintResult};
use crate::escpos::Segment;

/// Smallest chunk used when derived from the endpoint packet size
const MIN_CHUNK_SIZE: usize = 64;

/// Writes segments to a bulk OUT endpoint
///
/// - each segment is split into chunks of at most `chunk_size` bytes
/// - every bulk write is bounded by `write_timeout`
/// - `segment_pacing` separates consecutive segments
/// - `drain_delay` follows the last byte so the printer can empty its buffer
///   before the interface is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmitter {
    write_timeout: Duration,
    chunk_size: Option<usize>,
    segment_pacing: Duration,
    drain_delay: Duration,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_millis(5000),
            chunk_size: None,
            segment_pacing: Duration::from_millis(50),
            drain_delay: Duration::from_millis(200),
        }
    }
}

impl Transmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Fix the chunk size instead of deriving it from the endpoint (minimum 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    pub fn with_segment_pacing(mut self, pacing: Duration) -> Self {
        self.segment_pacing = pacing;
        self
    }

    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Chunk size used for `endpoint`
    pub fn chunk_size_for(&self, endpoint: &BulkOutEndpoint) -> usize {
        self.chunk_size
            .unwrap_or_else(|| usize::from(endpoint.max_packet_size).max(MIN_CHUNK_SIZE))
    }

    /// Send segments in order; returns the number of bytes written
    ///
    /// The first failing write aborts the remaining segments.
    #[instrument(skip_all, fields(endpoint = endpoint.address))]
    pub fn send<'s, D, I>(
        &self,
        claimed: &mut ClaimedInterface<'_, D>,
        endpoint: &BulkOutEndpoint,
        segments: I,
    ) -> PrintResult<usize>
    where
        D: UsbDevice,
        I: IntoIterator<Item = (Segment, &'s [u8])>,
    {
        let chunk_size = self.chunk_size_for(endpoint);
        let mut total = 0;

        for (index, (segment, bytes)) in segments.into_iter().enumerate() {
            if index > 0 && !self.segment_pacing.is_zero() {
                thread::sleep(self.segment_pacing);
            }
            self.write_segment(claimed.device_mut(), endpoint, segment, bytes, chunk_size)?;
            total += bytes.len();
        }

        if !self.drain_delay.is_zero() {
            thread::sleep(self.drain_delay);
        }

        info!(bytes = total, "Transmission complete");
        Ok(total)
    }

    fn write_segment<D: UsbDevice>(
        &self,
        device: &mut D,
        endpoint: &BulkOutEndpoint,
        segment: Segment,
        bytes: &[u8],
        chunk_size: usize,
    ) -> PrintResult<()> {
        for chunk in bytes.chunks(chunk_size) {
            let mut offset = 0;
            while offset < chunk.len() {
                let written = device
                    .write_bulk(endpoint.address, &chunk[offset..], self.write_timeout)
                    .map_err(|e| match e {
                        rusb::Error::Timeout => PrintError::TransmissionTimeout {
                            segment,
                            timeout: self.write_timeout,
                        },
                        source => PrintError::Transmission { segment, source },
                    })?;

                if written == 0 {
                    return Err(PrintError::Transmission {
                        segment,
                        source: rusb::Error::Io,
                    });
                }
                offset += written;
            }
        }

        debug!(%segment, bytes = bytes.len(), "Segment written");
        Ok(())
    }
}

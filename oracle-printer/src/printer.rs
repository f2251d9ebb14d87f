//! Printer adapters for sending ESC/POS data
//!
//! [`UsbPrinter`] runs one print job at a time: locate, claim, resolve the
//! bulk OUT endpoint, transmit, release. Jobs from concurrent callers queue on
//! the printer's job lock, so two claims on the same interface never overlap.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, instrument, warn};

use crate::config::{PrinterConfig, PrinterIdentity};
use crate::encoding::TextEncoder;
use crate::error::{PrintError, PrintResult};
use crate::escpos::{ReceiptFrame, Segment};
use crate::usb::{RusbBus, Transmitter, UsbBus, acquire, locate, resolve_bulk_out};

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// USB thermal printer
///
/// Cloning is cheap; clones share the bus and the job lock.
pub struct UsbPrinter<B: UsbBus = RusbBus> {
    inner: Arc<Inner<B>>,
}

struct Inner<B> {
    bus: B,
    identity: PrinterIdentity,
    encoder: TextEncoder,
    transmitter: Transmitter,
    job_lock: Mutex<()>,
}

impl<B: UsbBus> Clone for UsbPrinter<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl UsbPrinter<RusbBus> {
    /// Create a printer on a fresh libusb context
    pub fn new(config: PrinterConfig) -> PrintResult<Self> {
        Ok(Self::with_bus(RusbBus::new()?, config))
    }
}

impl<B: UsbBus> UsbPrinter<B> {
    /// Create a printer on a specific bus
    pub fn with_bus(bus: B, config: PrinterConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                identity: config.identity,
                encoder: TextEncoder::new(config.code_page),
                transmitter: config.transmitter,
                job_lock: Mutex::new(()),
            }),
        }
    }

    pub fn identity(&self) -> &PrinterIdentity {
        &self.inner.identity
    }

    pub fn bus(&self) -> &B {
        &self.inner.bus
    }

    /// Encode and frame text without touching the device
    pub fn render(&self, text: &str) -> ReceiptFrame {
        ReceiptFrame::new(self.inner.encoder.encode(text))
    }

    /// Print oracle text as a framed receipt (blocking)
    pub fn print_text_blocking(&self, text: &str) -> PrintResult<()> {
        self.print_frame_blocking(&self.render(text))
    }

    /// Print a framed receipt (blocking)
    #[instrument(skip(self, frame), fields(bytes = frame.len()))]
    pub fn print_frame_blocking(&self, frame: &ReceiptFrame) -> PrintResult<()> {
        self.run_job(frame.segments())
    }

    /// Send a pre-built ESC/POS stream as a single segment (blocking)
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub fn print_raw_blocking(&self, data: &[u8]) -> PrintResult<()> {
        self.run_job([(Segment::Body, data)])
    }

    /// Whether the configured device is attached, without claiming it
    pub fn is_online_blocking(&self) -> bool {
        match self.inner.bus.devices() {
            Ok(devices) => devices.iter().any(|d| self.inner.identity.matches(d)),
            Err(e) => {
                warn!(error = %e, "USB enumeration failed");
                false
            }
        }
    }

    /// One complete job under the job lock
    fn run_job<'s, I>(&self, segments: I) -> PrintResult<()>
    where
        I: IntoIterator<Item = (Segment, &'s [u8])>,
    {
        let _job = self
            .inner
            .job_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self.transmit(segments) {
            Ok(bytes) => {
                info!(bytes, "Print job sent successfully");
                Ok(())
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Print job failed");
                Err(e)
            }
        }
    }

    /// Locals drop in reverse order: the interface is released before the
    /// device is closed, on success and on every error path.
    fn transmit<'s, I>(&self, segments: I) -> PrintResult<usize>
    where
        I: IntoIterator<Item = (Segment, &'s [u8])>,
    {
        let identity = &self.inner.identity;
        let mut device = locate(&self.inner.bus, identity)?;
        let mut claimed = acquire(&mut device, identity.interface)?;
        let endpoint = resolve_bulk_out(&claimed)?;
        self.inner.transmitter.send(&mut claimed, &endpoint, segments)
    }
}

impl<B> UsbPrinter<B>
where
    B: UsbBus + Send + Sync + 'static,
{
    /// Print oracle text as a framed receipt
    pub async fn print_text(&self, text: &str) -> PrintResult<()> {
        let frame = self.render(text);
        self.print_frame(frame).await
    }

    /// Print a framed receipt on the blocking pool
    pub async fn print_frame(&self, frame: ReceiptFrame) -> PrintResult<()> {
        let printer = self.clone();
        tokio::task::spawn_blocking(move || printer.print_frame_blocking(&frame))
            .await
            .map_err(|e| PrintError::Task(format!("Task join failed: {}", e)))?
    }
}

impl<B> Printer for UsbPrinter<B>
where
    B: UsbBus + Send + Sync + 'static,
{
    #[instrument(skip(self, data), fields(vendor_id = self.inner.identity.vendor_id, product_id = self.inner.identity.product_id, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        // USB printing is synchronous, run in blocking task
        let printer = self.clone();
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || printer.print_raw_blocking(&data))
            .await
            .map_err(|e| PrintError::Task(format!("Task join failed: {}", e)))?
    }

    async fn is_online(&self) -> bool {
        let printer = self.clone();
        tokio::task::spawn_blocking(move || printer.is_online_blocking())
            .await
            .unwrap_or(false)
    }
}

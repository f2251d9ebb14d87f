//! Printer configuration
//!
//! Read once at startup and passed explicitly to [`crate::UsbPrinter`].
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | PRINTER_VENDOR_ID | (required) | USB vendor id, decimal or `0x` hex |
//! | PRINTER_PRODUCT_ID | (required) | USB product id, decimal or `0x` hex |
//! | PRINTER_INTERFACE | 0 | interface number to claim |
//! | PRINTER_ENCODING | cp437 | printer code page |
//! | PRINTER_WRITE_TIMEOUT_MS | 5000 | timeout per bulk write |
//! | PRINTER_CHUNK_SIZE | endpoint packet size | max bytes per bulk write |
//! | PRINTER_SEGMENT_PACING_MS | 50 | pause between segments |
//! | PRINTER_DRAIN_MS | 200 | pause after the last byte |

use std::time::Duration;

use crate::encoding::CodePage;
use crate::error::{PrintError, PrintResult};
use crate::usb::{DeviceInfo, Transmitter};

/// Which USB device and interface the printer is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
}

impl PrinterIdentity {
    /// Identity on interface 0
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            interface: 0,
        }
    }

    pub fn with_interface(mut self, interface: u8) -> Self {
        self.interface = interface;
        self
    }

    /// Exact vendor and product match
    pub fn matches(&self, info: &DeviceInfo) -> bool {
        info.vendor_id == self.vendor_id && info.product_id == self.product_id
    }
}

/// Complete printer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterConfig {
    pub identity: PrinterIdentity,
    pub code_page: CodePage,
    pub transmitter: Transmitter,
}

impl PrinterConfig {
    /// Defaults for everything except the device identity
    pub fn new(identity: PrinterIdentity) -> Self {
        Self {
            identity,
            code_page: CodePage::default(),
            transmitter: Transmitter::default(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> PrintResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> PrintResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let vendor_id = var("PRINTER_VENDOR_ID")
            .ok_or_else(|| PrintError::InvalidConfig("PRINTER_VENDOR_ID must be set".into()))
            .and_then(|v| parse_usb_id("PRINTER_VENDOR_ID", &v))?;
        let product_id = var("PRINTER_PRODUCT_ID")
            .ok_or_else(|| PrintError::InvalidConfig("PRINTER_PRODUCT_ID must be set".into()))
            .and_then(|v| parse_usb_id("PRINTER_PRODUCT_ID", &v))?;
        let interface = parse_or("PRINTER_INTERFACE", var("PRINTER_INTERFACE"), 0u8)?;

        let code_page = match var("PRINTER_ENCODING") {
            Some(label) => CodePage::for_label(&label)?,
            None => CodePage::default(),
        };

        let mut transmitter = Transmitter::new()
            .with_write_timeout(Duration::from_millis(parse_or(
                "PRINTER_WRITE_TIMEOUT_MS",
                var("PRINTER_WRITE_TIMEOUT_MS"),
                5000u64,
            )?))
            .with_segment_pacing(Duration::from_millis(parse_or(
                "PRINTER_SEGMENT_PACING_MS",
                var("PRINTER_SEGMENT_PACING_MS"),
                50u64,
            )?))
            .with_drain_delay(Duration::from_millis(parse_or(
                "PRINTER_DRAIN_MS",
                var("PRINTER_DRAIN_MS"),
                200u64,
            )?));

        if let Some(size) = var("PRINTER_CHUNK_SIZE") {
            let size: usize = parse_or("PRINTER_CHUNK_SIZE", Some(size), 0)?;
            if size == 0 {
                return Err(PrintError::InvalidConfig(
                    "PRINTER_CHUNK_SIZE must be greater than 0".into(),
                ));
            }
            transmitter = transmitter.with_chunk_size(size);
        }

        if transmitter.write_timeout().is_zero() {
            // libusb treats 0 as "wait forever"
            return Err(PrintError::InvalidConfig(
                "PRINTER_WRITE_TIMEOUT_MS must be greater than 0".into(),
            ));
        }

        Ok(Self {
            identity: PrinterIdentity {
                vendor_id,
                product_id,
                interface,
            },
            code_page,
            transmitter,
        })
    }
}

/// Parse a 16-bit USB id given as decimal or `0x`-prefixed hex
pub fn parse_usb_id(name: &str, value: &str) -> PrintResult<u16> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| PrintError::InvalidConfig(format!("{name}: invalid USB id {value:?}")))
}

fn parse_or<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> PrintResult<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("{name}: invalid value {v:?}"))),
        None => Ok(default),
    }
}

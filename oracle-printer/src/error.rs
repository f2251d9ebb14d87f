//! Error types for the printer library

use std::time::Duration;

use thiserror::Error;

use crate::escpos::Segment;

/// Printer error types
///
/// Every variant except [`PrintError::Usb`], [`PrintError::InvalidConfig`],
/// [`PrintError::UnsupportedEncoding`] and [`PrintError::Task`] maps to one
/// step of a print job. Any of them aborts the job; the claimed interface is
/// still released before the error reaches the caller.
#[derive(Debug, Error)]
pub enum PrintError {
    /// No attached device matches the configured vendor/product pair
    #[error("Printer not found: {vendor_id:04x}:{product_id:04x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// Device could not be brought into a configured state
    #[error("Configuration failed: {0}")]
    Configuration(#[source] rusb::Error),

    /// Interface is held by someone else or the device refused the claim
    #[error("Failed to claim interface {interface}: {source}")]
    InterfaceClaim {
        interface: u8,
        #[source]
        source: rusb::Error,
    },

    /// Claimed interface has no bulk OUT endpoint
    #[error("No bulk OUT endpoint on interface {interface}")]
    EndpointNotFound { interface: u8 },

    /// A bulk write did not complete in time
    #[error("Timeout writing {segment} segment after {timeout:?}")]
    TransmissionTimeout { segment: Segment, timeout: Duration },

    /// A bulk write failed
    #[error("Write failed in {segment} segment: {source}")]
    Transmission {
        segment: Segment,
        #[source]
        source: rusb::Error,
    },

    /// USB enumeration or open error
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Encoding label is unknown or not a single-byte code page
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Blocking print task could not be joined
    #[error("Print task failed: {0}")]
    Task(String),
}

impl PrintError {
    /// Stable name of the failure kind, for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeviceNotFound { .. } => "device_not_found",
            Self::Configuration(_) => "configuration_error",
            Self::InterfaceClaim { .. } => "interface_claim_error",
            Self::EndpointNotFound { .. } => "endpoint_not_found",
            Self::TransmissionTimeout { .. } => "transmission_timeout",
            Self::Transmission { .. } => "transmission_error",
            Self::Usb(_) => "usb_error",
            Self::InvalidConfig(_) => "invalid_config",
            Self::UnsupportedEncoding(_) => "unsupported_encoding",
            Self::Task(_) => "task_error",
        }
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

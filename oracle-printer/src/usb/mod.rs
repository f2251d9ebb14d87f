//! USB transport for ESC/POS printers
//!
//! A print job walks a strict acquire/use/release chain:
//!
//! 1. [`locate`] finds and opens the device by vendor/product id
//! 2. [`acquire`] configures the device, detaches a kernel driver, claims the interface
//! 3. [`resolve_bulk_out`] picks the bulk OUT endpoint of the claimed interface
//! 4. [`Transmitter::send`] writes the receipt segments
//! 5. dropping the [`ClaimedInterface`] releases the interface, dropping the device closes it
//!
//! Hardware access goes through the [`UsbBus`] and [`UsbDevice`] traits.
//! [`RusbBus`] is the libusb implementation; tests plug in recording fakes.

mod backend;
mod claim;
mod endpoint;
mod locator;
mod transmit;

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

pub use backend::{RusbBus, RusbDevice};
pub use claim::{ClaimedInterface, InterfaceState, acquire};
pub use endpoint::{BulkOutEndpoint, resolve_bulk_out};
pub use locator::{list_devices, locate};
pub use transmit::Transmitter;

/// Identification of an attached device, as seen during enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub bus_number: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Endpoint descriptor fields needed to pick a transfer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: u8,
    pub direction: rusb::Direction,
    pub transfer_type: rusb::TransferType,
    pub max_packet_size: u16,
}

/// Enumeration and opening of USB devices
pub trait UsbBus {
    type Device: UsbDevice;

    /// All attached devices
    fn devices(&self) -> rusb::Result<Vec<DeviceInfo>>;

    /// Open an enumerated device
    fn open(&self, info: &DeviceInfo) -> rusb::Result<Self::Device>;
}

/// An opened USB device
///
/// Dropping the value disposes of every device-level resource.
pub trait UsbDevice {
    /// Active configuration value, `0` when the device is unconfigured
    fn active_configuration(&self) -> rusb::Result<u8>;

    /// Select the first configuration descriptor
    fn set_default_configuration(&mut self) -> rusb::Result<()>;

    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool>;

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()>;

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()>;

    /// Endpoints of alternate setting 0 of `interface` in the active configuration
    fn interface_endpoints(&self, interface: u8) -> rusb::Result<Vec<EndpointInfo>>;

    /// Bulk OUT transfer, returns the number of bytes accepted
    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize>;
}

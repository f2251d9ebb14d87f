//! Device discovery by vendor/product id

use tracing::{debug, info, instrument, warn};

use super::{DeviceInfo, UsbBus};
use crate::config::PrinterIdentity;
use crate::error::{PrintError, PrintResult};

/// Find and open the first device matching `identity`
///
/// Fails with [`PrintError::DeviceNotFound`] when nothing matches. No other
/// device is tried as a fallback.
#[instrument(skip(bus), fields(vendor_id = %format_args!("{:04x}", identity.vendor_id), product_id = %format_args!("{:04x}", identity.product_id)))]
pub fn locate<B: UsbBus>(bus: &B, identity: &PrinterIdentity) -> PrintResult<B::Device> {
    let devices = bus.devices()?;
    debug!(count = devices.len(), "Enumerated USB devices");

    let Some(info) = devices.iter().find(|d| identity.matches(d)) else {
        warn!("Printer not attached");
        return Err(PrintError::DeviceNotFound {
            vendor_id: identity.vendor_id,
            product_id: identity.product_id,
        });
    };

    let device = bus.open(info)?;
    info!(bus = info.bus_number, address = info.address, "Printer located");
    Ok(device)
}

/// All attached devices, for diagnostics
pub fn list_devices<B: UsbBus>(bus: &B) -> PrintResult<Vec<DeviceInfo>> {
    Ok(bus.devices()?)
}

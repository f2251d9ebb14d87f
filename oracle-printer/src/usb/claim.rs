//! Interface lifecycle: configure, detach, claim, release
//!
//! [`acquire`] drives the device from `Unclaimed` to `Claimed` and returns a
//! [`ClaimedInterface`] guard. The guard borrows the device mutably, so the
//! device cannot be closed while the claim is alive, and its `Drop` releases
//! the interface on every exit path.

use tracing::{debug, info, instrument, warn};

use super::UsbDevice;
use crate::error::{PrintError, PrintResult};

/// Lifecycle states of an interface during a print job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceState {
    Unclaimed,
    ConfigurationReady,
    DriverDetached,
    Claimed,
    Released,
}

/// Exclusive claim on one interface of an open device
///
/// Released exactly once when dropped. Release failures are logged and
/// swallowed so they never replace the error that ended the job.
pub struct ClaimedInterface<'a, D: UsbDevice> {
    device: &'a mut D,
    interface: u8,
}

impl<D: UsbDevice> ClaimedInterface<'_, D> {
    pub fn interface(&self) -> u8 {
        self.interface
    }

    pub fn device(&self) -> &D {
        &*self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut *self.device
    }
}

impl<D: UsbDevice> Drop for ClaimedInterface<'_, D> {
    fn drop(&mut self) {
        match self.device.release_interface(self.interface) {
            Ok(()) => debug!(
                interface = self.interface,
                state = ?InterfaceState::Released,
                "Interface released"
            ),
            Err(e) => warn!(
                interface = self.interface,
                error = %e,
                "Interface release failed, ignoring"
            ),
        }
    }
}

/// Bring `device` into a usable state and claim `interface`
///
/// 1. Set the default configuration if none is active (fatal on failure)
/// 2. Detach a kernel driver bound to the interface (failures ignored)
/// 3. Claim the interface (fatal on failure, no retry)
#[instrument(skip(device))]
pub fn acquire<D: UsbDevice>(device: &mut D, interface: u8) -> PrintResult<ClaimedInterface<'_, D>> {
    debug!(state = ?InterfaceState::Unclaimed);

    ensure_configuration(device)?;
    debug!(state = ?InterfaceState::ConfigurationReady);

    detach_kernel_driver(device, interface);
    debug!(state = ?InterfaceState::DriverDetached);

    device
        .claim_interface(interface)
        .map_err(|source| PrintError::InterfaceClaim { interface, source })?;
    info!(state = ?InterfaceState::Claimed, "Interface claimed");

    Ok(ClaimedInterface { device, interface })
}

fn ensure_configuration<D: UsbDevice>(device: &mut D) -> PrintResult<()> {
    match device.active_configuration() {
        Ok(0) => debug!("Device unconfigured"),
        Ok(config) => {
            debug!(config, "Configuration already active");
            return Ok(());
        }
        Err(e) => debug!(error = %e, "Active configuration unreadable"),
    }

    device
        .set_default_configuration()
        .map_err(PrintError::Configuration)?;
    info!("Default configuration set");
    Ok(())
}

/// Best effort: platforms without kernel drivers report `NotSupported`
fn detach_kernel_driver<D: UsbDevice>(device: &mut D, interface: u8) {
    match device.kernel_driver_active(interface) {
        Ok(true) => match device.detach_kernel_driver(interface) {
            Ok(()) => info!(interface, "Kernel driver detached"),
            Err(e) => warn!(interface, error = %e, "Kernel driver detach failed, continuing"),
        },
        Ok(false) => {}
        Err(e) => debug!(interface, error = %e, "Kernel driver query failed, continuing"),
    }
}

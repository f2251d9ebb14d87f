//! libusb backend via `rusb`

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};
use tracing::debug;

use super::{DeviceInfo, EndpointInfo, UsbBus, UsbDevice};

/// USB bus backed by a private libusb context
#[derive(Clone)]
pub struct RusbBus {
    context: Context,
}

impl RusbBus {
    pub fn new() -> rusb::Result<Self> {
        Ok(Self {
            context: Context::new()?,
        })
    }
}

impl UsbBus for RusbBus {
    type Device = RusbDevice;

    fn devices(&self) -> rusb::Result<Vec<DeviceInfo>> {
        let mut found = Vec::new();
        for device in self.context.devices()?.iter() {
            // Devices that vanish mid-enumeration are skipped
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            found.push(DeviceInfo {
                bus_number: device.bus_number(),
                address: device.address(),
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
            });
        }
        Ok(found)
    }

    fn open(&self, info: &DeviceInfo) -> rusb::Result<RusbDevice> {
        let device = self
            .context
            .devices()?
            .iter()
            .find(|d| d.bus_number() == info.bus_number && d.address() == info.address)
            .ok_or(rusb::Error::NoDevice)?;

        let handle = device.open()?;
        debug!(bus = info.bus_number, address = info.address, "Device opened");
        Ok(RusbDevice { device, handle })
    }
}

/// Opened libusb device; the handle is closed on drop
pub struct RusbDevice {
    device: Device<Context>,
    handle: DeviceHandle<Context>,
}

impl UsbDevice for RusbDevice {
    fn active_configuration(&self) -> rusb::Result<u8> {
        self.handle.active_configuration()
    }

    fn set_default_configuration(&mut self) -> rusb::Result<()> {
        let config = self.device.config_descriptor(0)?;
        self.handle.set_active_configuration(config.number())
    }

    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        self.handle.kernel_driver_active(interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        self.handle.detach_kernel_driver(interface)
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.handle.claim_interface(interface)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.handle.release_interface(interface)
    }

    fn interface_endpoints(&self, interface: u8) -> rusb::Result<Vec<EndpointInfo>> {
        let config = self.device.active_config_descriptor()?;

        let endpoints = config
            .interfaces()
            .filter(|i| i.number() == interface)
            .flat_map(|i| i.descriptors())
            .filter(|alt| alt.setting_number() == 0)
            .flat_map(|alt| {
                alt.endpoint_descriptors()
                    .map(|ep| EndpointInfo {
                        address: ep.address(),
                        direction: ep.direction(),
                        transfer_type: ep.transfer_type(),
                        max_packet_size: ep.max_packet_size(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(endpoints)
    }

    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize> {
        self.handle.write_bulk(endpoint, data, timeout)
    }
}

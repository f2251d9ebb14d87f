//! Recording USB fakes for unit tests

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusb::{Direction, TransferType};

use super::{DeviceInfo, EndpointInfo, UsbBus, UsbDevice};

pub const VENDOR_ID: u16 = 0x6868;
pub const PRODUCT_ID: u16 = 0x0200;
pub const EP_OUT: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Device address
    Open(u8),
    ActiveConfiguration,
    SetConfiguration,
    KernelDriverActive(u8),
    DetachKernelDriver(u8),
    Claim(u8),
    Release(u8),
    Endpoints(u8),
    Write(u8, Vec<u8>),
    Dispose,
}

/// Shared device behaviour and call log
#[derive(Debug)]
pub struct MockState {
    pub calls: Vec<Call>,
    pub active_config: rusb::Result<u8>,
    pub set_config_error: Option<rusb::Error>,
    pub kernel_driver: rusb::Result<bool>,
    pub detach_error: Option<rusb::Error>,
    pub claim_error: Option<rusb::Error>,
    pub release_error: Option<rusb::Error>,
    pub endpoints: Vec<EndpointInfo>,
    /// Zero-based index of the write that fails
    pub fail_write: Option<(usize, rusb::Error)>,
    /// Upper bound on bytes accepted per write
    pub accept_limit: Option<usize>,
    /// Write attempts so far, including failed ones
    pub writes: usize,
    /// When each entry of `calls` was recorded
    pub stamps: Vec<Instant>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            active_config: Ok(1),
            set_config_error: None,
            kernel_driver: Ok(false),
            detach_error: None,
            claim_error: None,
            release_error: None,
            endpoints: vec![bulk_in(0x81), bulk_out(EP_OUT)],
            fail_write: None,
            accept_limit: None,
            writes: 0,
            stamps: Vec::new(),
        }
    }
}

impl MockState {
    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn written(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(_, data) => Some(data.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    fn push(&mut self, call: Call) {
        self.calls.push(call);
        self.stamps.push(Instant::now());
    }

    /// Time `call` was first recorded
    pub fn stamp_of(&self, call: &Call) -> Option<Instant> {
        self.calls
            .iter()
            .position(|c| c == call)
            .map(|i| self.stamps[i])
    }

    /// Times of all bulk writes, in order
    pub fn write_stamps(&self) -> Vec<Instant> {
        self.calls
            .iter()
            .zip(&self.stamps)
            .filter(|(c, _)| matches!(c, Call::Write(..)))
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Write(..)))
            .count()
    }
}

pub fn bulk_out(address: u8) -> EndpointInfo {
    EndpointInfo {
        address,
        direction: Direction::Out,
        transfer_type: TransferType::Bulk,
        max_packet_size: 64,
    }
}

pub fn bulk_in(address: u8) -> EndpointInfo {
    EndpointInfo {
        address,
        direction: Direction::In,
        transfer_type: TransferType::Bulk,
        max_packet_size: 64,
    }
}

pub fn interrupt_out(address: u8) -> EndpointInfo {
    EndpointInfo {
        address,
        direction: Direction::Out,
        transfer_type: TransferType::Interrupt,
        max_packet_size: 8,
    }
}

pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub fn new(state: Arc<Mutex<MockState>>) -> Self {
        Self { state }
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().push(call);
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.record(Call::Dispose);
    }
}

impl UsbDevice for MockDevice {
    fn active_configuration(&self) -> rusb::Result<u8> {
        self.record(Call::ActiveConfiguration);
        self.state.lock().unwrap().active_config
    }

    fn set_default_configuration(&mut self) -> rusb::Result<()> {
        self.record(Call::SetConfiguration);
        let mut state = self.state.lock().unwrap();
        match state.set_config_error {
            Some(e) => Err(e),
            None => {
                state.active_config = Ok(1);
                Ok(())
            }
        }
    }

    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        self.record(Call::KernelDriverActive(interface));
        self.state.lock().unwrap().kernel_driver
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        self.record(Call::DetachKernelDriver(interface));
        self.state.lock().unwrap().detach_error.map_or(Ok(()), Err)
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.record(Call::Claim(interface));
        self.state.lock().unwrap().claim_error.map_or(Ok(()), Err)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.record(Call::Release(interface));
        self.state.lock().unwrap().release_error.map_or(Ok(()), Err)
    }

    fn interface_endpoints(&self, interface: u8) -> rusb::Result<Vec<EndpointInfo>> {
        self.record(Call::Endpoints(interface));
        Ok(self.state.lock().unwrap().endpoints.clone())
    }

    fn write_bulk(&mut self, endpoint: u8, data: &[u8], _timeout: Duration) -> rusb::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let index = state.writes;
        state.writes += 1;

        if let Some((fail_at, error)) = state.fail_write
            && fail_at == index
        {
            return Err(error);
        }

        let accepted = state.accept_limit.map_or(data.len(), |n| n.min(data.len()));
        state.push(Call::Write(endpoint, data[..accepted].to_vec()));
        Ok(accepted)
    }
}

/// Bus exposing a fixed device list; every open shares one state
pub struct MockBus {
    pub devices: Vec<DeviceInfo>,
    pub state: Arc<Mutex<MockState>>,
}

impl MockBus {
    /// Bus with the default printer attached
    pub fn with_printer() -> Self {
        Self {
            devices: vec![
                DeviceInfo {
                    bus_number: 1,
                    address: 2,
                    vendor_id: 0x1d6b,
                    product_id: 0x0002,
                },
                DeviceInfo {
                    bus_number: 1,
                    address: 5,
                    vendor_id: VENDOR_ID,
                    product_id: PRODUCT_ID,
                },
            ],
            state: Arc::default(),
        }
    }

    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            state: Arc::default(),
        }
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl UsbBus for MockBus {
    type Device = MockDevice;

    fn devices(&self) -> rusb::Result<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn open(&self, info: &DeviceInfo) -> rusb::Result<MockDevice> {
        self.state.lock().unwrap().push(Call::Open(info.address));
        Ok(MockDevice::new(Arc::clone(&self.state)))
    }
}

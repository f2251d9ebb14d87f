//! Bulk OUT endpoint discovery

use rusb::{Direction, TransferType};
use tracing::{debug, instrument, warn};

use super::{ClaimedInterface, UsbDevice};
use crate::error::{PrintError, PrintResult};

/// Host-to-device bulk endpoint of a claimed interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutEndpoint {
    pub address: u8,
    pub max_packet_size: u16,
}

/// First endpoint of the claimed interface that is both OUT and bulk
#[instrument(skip(claimed), fields(interface = claimed.interface()))]
pub fn resolve_bulk_out<D: UsbDevice>(claimed: &ClaimedInterface<'_, D>) -> PrintResult<BulkOutEndpoint> {
    let interface = claimed.interface();
    let endpoints = claimed.device().interface_endpoints(interface)?;

    let endpoint = endpoints
        .iter()
        .find(|ep| ep.direction == Direction::Out && ep.transfer_type == TransferType::Bulk)
        .map(|ep| BulkOutEndpoint {
            address: ep.address,
            max_packet_size: ep.max_packet_size,
        });

    match endpoint {
        Some(ep) => {
            debug!(address = %format_args!("{:#04x}", ep.address), max_packet_size = ep.max_packet_size, "Bulk OUT endpoint");
            Ok(ep)
        }
        None => {
            warn!(endpoints = endpoints.len(), "No bulk OUT endpoint");
            Err(PrintError::EndpointNotFound { interface })
        }
    }
}

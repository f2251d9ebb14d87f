//! oracle-print: prints one oracle receipt
//!
//! Reads the oracle text from stdin, frames it and sends it to the USB
//! printer named by `PRINTER_VENDOR_ID` / `PRINTER_PRODUCT_ID`.
//! With `ORACLE_TEST_PAGE=1` the built-in test page is printed instead;
//! `ORACLE_TEST_PAGE=raw` sends the same text without the receipt framing.

mod logger;

use std::path::PathBuf;

use anyhow::Context;
use oracle_printer::{
    PrintError, Printer, PrinterConfig, ReceiptFrame, UsbPrinter, list_devices, test_page_bytes,
};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let log_dir = std::env::var("LOG_DIR")
        .ok()
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from);
    logger::init_logger(&level, env_flag("LOG_JSON"), log_dir.as_deref())?;

    let config = PrinterConfig::from_env().context("Invalid printer configuration")?;
    tracing::info!(
        vendor_id = %format_args!("{:04x}", config.identity.vendor_id),
        product_id = %format_args!("{:04x}", config.identity.product_id),
        interface = config.identity.interface,
        encoding = config.code_page.name(),
        "Starting oracle-print"
    );

    let printer = UsbPrinter::new(config)?;

    let test_page = std::env::var("ORACLE_TEST_PAGE").unwrap_or_default();
    let result = if test_page.trim().eq_ignore_ascii_case("raw") {
        printer.print(&test_page_bytes()).await
    } else if is_truthy(&test_page) {
        printer.print_frame(ReceiptFrame::test_page()).await
    } else {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read oracle text from stdin")?;
        printer.print_frame(printer.render(&text)).await
    };

    if let Err(e) = result {
        if matches!(e, PrintError::DeviceNotFound { .. }) {
            log_attached_devices(&printer);
        }
        return Err(e.into());
    }

    Ok(())
}

/// `1`, `true` or `yes`, case-insensitive
fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| is_truthy(&v))
}

fn log_attached_devices(printer: &UsbPrinter) {
    match list_devices(printer.bus()) {
        Ok(devices) => {
            for d in devices {
                tracing::debug!(
                    bus = d.bus_number,
                    address = d.address,
                    "Attached device {:04x}:{:04x}",
                    d.vendor_id,
                    d.product_id
                );
            }
        }
        Err(e) => tracing::debug!(error = %e, "Could not list attached devices"),
    }
}

//! # oracle-printer
//!
//! ESC/POS receipt printing over raw USB.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Code page encoding (CP437 and single-byte WHATWG encodings)
//! - Receipt framing (init, header, body, footer, cut)
//! - USB discovery, interface claim and guaranteed release
//! - Chunked bulk transmission with pacing and timeouts
//!
//! WHAT to print (the oracle text) comes from the caller.
//!
//! ## Example
//!
//! ```ignore
//! use oracle_printer::{PrinterConfig, UsbPrinter};
//!
//! let config = PrinterConfig::from_env()?;
//! let printer = UsbPrinter::new(config)?;
//! printer.print_text("Candlelight finds you.").await?;
//! ```
//!
//! ## Concurrency
//!
//! All USB calls block. A [`UsbPrinter`] and its clones run one job at a
//! time; create a single printer per physical device and share it.

mod config;
mod encoding;
mod error;
mod escpos;
mod printer;
pub mod usb;

// Re-exports
pub use config::{PrinterConfig, PrinterIdentity, parse_usb_id};
pub use encoding::{CodePage, PLACEHOLDER, TextEncoder, encode_for_printer};
pub use error::{PrintError, PrintResult};
pub use escpos::{
    CUT, FEED_CUT, FOOTER, HEADER, INIT, ReceiptFrame, Segment, TEST_PAGE_TEXT, frame,
    test_page_bytes,
};
pub use printer::{Printer, UsbPrinter};
pub use usb::{DeviceInfo, Transmitter, list_devices};

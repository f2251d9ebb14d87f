//! ESC/POS receipt framing
//!
//! A receipt is always five segments sent in this order:
//!
//! ```text
//! INIT   ESC @                  reset printer state
//! HEADER banner + divider       fixed text
//! BODY   encoded oracle text    only variable segment, may be empty
//! FOOTER divider + closing      fixed text
//! CUT    GS V 1                 cut paper
//! ```
//!
//! No wrapping or truncation happens here; the printer firmware wraps long lines.

use std::fmt;

/// Initialize printer (ESC @)
pub const INIT: &[u8] = &[0x1B, 0x40];

/// Cut paper (GS V 1)
pub const CUT: &[u8] = &[0x1D, 0x56, 0x01];

/// Banner printed above the body
pub const HEADER: &[u8] = b"\n\n*** THE ORACLE ***\nwhispers from the dark\n--------------------\n\n";

/// Divider and closing lines printed below the body
pub const FOOTER: &[u8] = b"\n\n--------------------\ncarry this softly\ntrust the quiet pull\n\n";

/// Feed to the cutter, then full cut (GS V A 0)
pub const FEED_CUT: &[u8] = &[0x1D, 0x56, 0x41, 0x30];

/// Body of the self-test page
///
/// [`ReceiptFrame::test_page`] prints it inside the oracle banner with [`CUT`].
/// [`test_page_bytes`] sends it bare, ending in [`FEED_CUT`], for checking the
/// USB path without the receipt framing.
pub const TEST_PAGE_TEXT: &[u8] = b"The oracle is awake.\nYour path is unfolding.\n\n";

/// Position of a segment inside a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Init,
    Header,
    Body,
    Footer,
    Cut,
}

impl Segment {
    /// All segments in transmission order
    pub const ORDER: [Segment; 5] = [
        Segment::Init,
        Segment::Header,
        Segment::Body,
        Segment::Footer,
        Segment::Cut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Init => "INIT",
            Segment::Header => "HEADER",
            Segment::Body => "BODY",
            Segment::Footer => "FOOTER",
            Segment::Cut => "CUT",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete receipt as ordered byte segments
///
/// Only the body is owned; the fixed segments are static constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFrame {
    body: Vec<u8>,
}

impl ReceiptFrame {
    /// Frame already-encoded body bytes
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }

    /// Diagnostic page with a fixed body, framed like any receipt
    pub fn test_page() -> Self {
        Self::new(TEST_PAGE_TEXT.to_vec())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Bytes of a single segment
    pub fn segment(&self, segment: Segment) -> &[u8] {
        match segment {
            Segment::Init => INIT,
            Segment::Header => HEADER,
            Segment::Body => &self.body,
            Segment::Footer => FOOTER,
            Segment::Cut => CUT,
        }
    }

    /// Segments in transmission order
    pub fn segments(&self) -> impl Iterator<Item = (Segment, &[u8])> + '_ {
        Segment::ORDER.into_iter().map(|s| (s, self.segment(s)))
    }

    /// Total payload size in bytes
    pub fn len(&self) -> usize {
        INIT.len() + HEADER.len() + self.body.len() + FOOTER.len() + CUT.len()
    }

    /// A frame always carries its fixed segments
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Concatenate all segments into the exact payload sent to the printer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        for (_, bytes) in self.segments() {
            buf.extend_from_slice(bytes);
        }
        buf
    }
}

/// Bare diagnostic stream: init, test text, feed and cut
///
/// No header or footer. Meant for [`crate::Printer::print`].
pub fn test_page_bytes() -> Vec<u8> {
    [INIT, TEST_PAGE_TEXT, FEED_CUT].concat()
}

/// Frame encoded body bytes into a receipt
pub fn frame(body: Vec<u8>) -> ReceiptFrame {
    ReceiptFrame::new(body)
}

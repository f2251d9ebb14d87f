//! Code page encoding for thermal printer text
//!
//! Receipt printers only understand a fixed single-byte character table.
//! Text is NFKD-normalized first so composed characters split into a base
//! letter plus combining marks, then every code point is looked up in the
//! active table. Anything without an entry becomes [`PLACEHOLDER`].
//!
//! Supported tables:
//! - CP437 (printer power-on default)
//! - Any single-byte encoding known to `encoding_rs` (windows-1252, IBM866, ISO-8859-x, ...)

use codepage_437::CP437_CONTROL;
use encoding_rs::{EncoderResult, Encoding};
use tracing::instrument;
use unicode_normalization::UnicodeNormalization;

use crate::error::{PrintError, PrintResult};

/// Byte written for code points the table cannot represent
pub const PLACEHOLDER: u8 = b'?';

/// Labels that select CP437
const CP437_LABELS: &[&str] = &["cp437", "ibm437", "pc437", "437", "cp-437"];

/// Single-byte table used by the printer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodePage {
    /// IBM PC code page 437, control range kept as control bytes
    #[default]
    Cp437,
    /// A single-byte WHATWG encoding
    SingleByte(&'static Encoding),
}

impl CodePage {
    /// Resolve a code page from its label (case-insensitive)
    ///
    /// Multi-byte encodings (UTF-8, GBK, Shift_JIS, ...) are rejected.
    pub fn for_label(label: &str) -> PrintResult<Self> {
        let label = label.trim().to_ascii_lowercase();
        if CP437_LABELS.contains(&label.as_str()) {
            return Ok(Self::Cp437);
        }

        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding.is_single_byte() => Ok(Self::SingleByte(encoding)),
            Some(encoding) => Err(PrintError::UnsupportedEncoding(format!(
                "{} is not a single-byte encoding",
                encoding.name()
            ))),
            None => Err(PrintError::UnsupportedEncoding(label)),
        }
    }

    /// Canonical name of the table
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cp437 => "cp437",
            Self::SingleByte(encoding) => encoding.name(),
        }
    }
}

/// Unicode to code page encoder
///
/// Encoding is total: it never fails, unmappable characters are substituted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoder {
    code_page: CodePage,
}

impl TextEncoder {
    pub fn new(code_page: CodePage) -> Self {
        Self { code_page }
    }

    /// Create an encoder from a code page label
    pub fn for_label(label: &str) -> PrintResult<Self> {
        CodePage::for_label(label).map(Self::new)
    }

    pub fn code_page(&self) -> CodePage {
        self.code_page
    }

    /// Normalize and encode text into the printer's table
    #[instrument(skip(self, text), fields(code_page = self.code_page.name(), text_len = text.len()))]
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let normalized: String = text.nfkd().collect();
        match self.code_page {
            CodePage::Cp437 => encode_cp437(&normalized),
            CodePage::SingleByte(encoding) => encode_single_byte(encoding, &normalized),
        }
    }
}

/// Encode text for the default CP437 printer table
pub fn encode_for_printer(text: &str) -> Vec<u8> {
    TextEncoder::default().encode(text)
}

fn encode_cp437(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| CP437_CONTROL.encode(c).unwrap_or(PLACEHOLDER))
        .collect()
}

fn encode_single_byte(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut result = Vec::with_capacity(text.len());
    let mut buf = [0u8; 256];
    let mut rest = text;

    loop {
        let (status, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut buf, true);
        result.extend_from_slice(&buf[..written]);
        rest = &rest[read..];

        match status {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            // The unmappable character is already consumed by `read`
            EncoderResult::Unmappable(_) => result.push(PLACEHOLDER),
        }
    }

    result
}

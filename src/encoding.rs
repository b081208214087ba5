//! Fixed-priority text decoding for list, label, and JSON files.
//!
//! Files produced on Korean Windows machines are frequently EUC-KR or CP949
//! rather than UTF-8. Decoders are tried in the order UTF-8, EUC-KR, CP949,
//! ASCII and the first one that succeeds wins. No charset detection is
//! attempted.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::LabelOpsError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The decoder that produced a file's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    EucKr,
    Cp949,
    Ascii,
}

impl TextEncoding {
    /// Decoder order.
    pub const PRIORITY: [TextEncoding; 4] = [
        TextEncoding::Utf8,
        TextEncoding::EucKr,
        TextEncoding::Cp949,
        TextEncoding::Ascii,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::EucKr => "euc-kr",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Decode `bytes` with this encoding, returning `None` on any malformed
    /// sequence.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_string)
            }
            TextEncoding::EucKr => {
                // Strict EUC-KR (KS X 1001) keeps every non-ASCII byte in 0xA1..=0xFE.
                if !bytes.iter().all(|&b| b < 0x80 || (0xA1..=0xFE).contains(&b)) {
                    return None;
                }
                decode_windows_949(bytes)
            }
            TextEncoding::Cp949 => decode_windows_949(bytes),
            TextEncoding::Ascii => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes).ok().map(str::to_string)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_windows_949(bytes: &[u8]) -> Option<String> {
    encoding_rs::EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Text read from disk along with the decoder that accepted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode `bytes` using the first encoding in [`TextEncoding::PRIORITY`]
/// that accepts them.
pub fn decode_bytes(bytes: &[u8]) -> Option<DecodedText> {
    TextEncoding::PRIORITY.iter().find_map(|encoding| {
        encoding.decode(bytes).map(|text| DecodedText {
            text,
            encoding: *encoding,
        })
    })
}

/// Read and decode a text file.
///
/// Returns [`LabelOpsError::Undecodable`] when none of the decoders accept
/// the content; callers decide whether that is fatal.
pub fn read_text(path: &Path) -> Result<DecodedText, LabelOpsError> {
    let bytes = fs::read(path).map_err(|source| LabelOpsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode_bytes(&bytes).ok_or_else(|| LabelOpsError::Undecodable {
        path: path.to_path_buf(),
    })?;

    if decoded.encoding != TextEncoding::Utf8 {
        log::info!("decoded {} as {}", path.display(), decoded.encoding);
    }

    Ok(decoded)
}

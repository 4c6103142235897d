//! Legacy code page text decoding for delimited uploads.

use encoding_rs::Encoding;
use thiserror::Error;

/// Windows Latin-1, the code page uploads are written in.
pub(crate) const WINDOWS_LATIN_1: u16 = 1252;

/// Bytes with no assigned character in code page 1252.
const UNDEFINED_1252_BYTES: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Errors raised while decoding legacy text
#[derive(Error, Debug, PartialEq)]
pub enum EncodingError {
    #[error("Unknown code page '{0}'")]
    CodePageError(u16),

    #[error("Byte 0x{byte:02X} at offset {offset} is not valid in code page {code_page}")]
    InvalidByteError { code_page: u16, byte: u8, offset: usize },
}

/// Decodes bytes in the given code page into a string.
///
/// The WHATWG mapping used by `encoding_rs` assigns C1 controls to the holes
/// of code page 1252, so those bytes are rejected explicitly.
pub(crate) fn decode(bytes: &[u8], code_page: u16) -> Result<String, EncodingError> {
    let encoding: &'static Encoding = codepage::to_encoding(code_page)
        .ok_or(EncodingError::CodePageError(code_page))?;
    if code_page == WINDOWS_LATIN_1 {
        if let Some(offset) = bytes.iter().position(|byte| UNDEFINED_1252_BYTES.contains(byte)) {
            Err(EncodingError::InvalidByteError { code_page, byte: bytes[offset], offset })?;
        }
    }
    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => Ok(text.into_owned()),
        None => Err(EncodingError::InvalidByteError {
            code_page,
            byte: 0,
            offset: 0,
        }),
    }
}

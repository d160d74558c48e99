//! Fixed-layout decoding of the NDEF read buffer into a URL.
//!
//! The tag family this crate targets stores a short NDEF URI record at the
//! start of its NDEF file. The record's payload length sits at a fixed
//! offset, followed by the record type and a one-byte URI identifier code
//! before the URL text itself. Decoding works on named offsets with bounds
//! checks; a declared length that overruns the bytes actually read is an
//! error, not a silent out-of-range slice.

/// Capacity of the linear read, in bytes.
pub const READ_CAPACITY: usize = 200;

/// Offset of the NDEF record's payload-length byte.
const LENGTH_FIELD_OFFSET: usize = 4;

/// Offset of the URL text within the buffer.
const PAYLOAD_OFFSET: usize = 7;

/// The URI identifier code byte preceding the URL text. It counts towards
/// the declared payload length but is not part of the URL.
const URI_CODE_LEN: usize = 1;

/// Raw tag memory returned by one linear read.
pub struct ReadBuffer {
    data: [u8; READ_CAPACITY],
    len: u16,
}

impl ReadBuffer {
    pub fn new(data: [u8; READ_CAPACITY], len: u16) -> Self {
        Self { data, len }
    }

    /// The bytes the driver actually returned.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..usize::min(self.len as usize, READ_CAPACITY)]
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Read returned only {0} bytes, too short for an NDEF record header")]
    TooShort(usize),

    #[error("NDEF record declares an empty payload")]
    EmptyPayload,

    #[error("Declared NDEF payload of {declared} bytes overruns the {available} bytes read")]
    Truncated { declared: usize, available: usize },

    #[error("NDEF payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// Extracts the URL carried by the buffer's NDEF URI record.
///
/// Fails closed on anything malformed: truncated records and non-UTF-8
/// payloads are rejected rather than passed on to a browser command line.
pub fn parse_url(buf: &ReadBuffer) -> Result<String, ParseError> {
    let bytes = buf.bytes();
    let declared = *bytes
        .get(LENGTH_FIELD_OFFSET)
        .ok_or(ParseError::TooShort(bytes.len()))? as usize;

    if declared < URI_CODE_LEN {
        return Err(ParseError::EmptyPayload);
    }

    let url = bytes
        .get(PAYLOAD_OFFSET..PAYLOAD_OFFSET + declared - URI_CODE_LEN)
        .ok_or(ParseError::Truncated {
            declared,
            available: bytes.len(),
        })?;

    Ok(std::str::from_utf8(url)?.to_owned())
}

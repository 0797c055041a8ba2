//! Frame codec.
//!
//! Integrity relies solely on the declared payload length matching the number of
//! bytes that follow the header. There is no checksum and no compression.

use crate::error::{V2vError, V2vResult};

/// Width of the hexadecimal message-id field.
pub const ID_DIGITS: usize = 4;
/// Width of the hexadecimal payload-length field.
pub const LEN_DIGITS: usize = 6;
pub const HEADER_LEN: usize = ID_DIGITS + LEN_DIGITS;
/// Largest payload the 6-digit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 0xFF_FFFF;

/// A decoded frame: the message id and its still-serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub id: u16,
    pub payload: Vec<u8>,
}

impl WireMessage {
    pub fn new(id: u16, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }
}

/// Frames `payload` under message `id`.
pub fn encode(id: u16, payload: &[u8]) -> V2vResult<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(V2vError::malformed(format!(
            "payload of {} bytes exceeds the {} byte frame limit",
            payload.len(),
            MAX_PAYLOAD_LEN
        )));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(format!("{:04x}{:06x}", id, payload.len()).as_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Splits a frame into id and payload.
///
/// Fails with [`V2vError::Malformed`] when the frame is shorter than the header,
/// the header is not hexadecimal, or the declared length differs from the bytes
/// actually present.
pub fn decode(frame: &[u8]) -> V2vResult<WireMessage> {
    if frame.len() < HEADER_LEN {
        return Err(V2vError::malformed(format!(
            "frame of {} bytes is shorter than the {} byte header",
            frame.len(),
            HEADER_LEN
        )));
    }

    let (header, payload) = frame.split_at(HEADER_LEN);
    let id = parse_hex(&header[..ID_DIGITS])? as u16;
    let declared = parse_hex(&header[ID_DIGITS..])? as usize;

    if declared != payload.len() {
        return Err(V2vError::malformed(format!(
            "declared length {} but {} payload bytes follow",
            declared,
            payload.len()
        )));
    }

    Ok(WireMessage::new(id, payload.to_vec()))
}

fn parse_hex(field: &[u8]) -> V2vResult<u32> {
    if !field.iter().all(u8::is_ascii_hexdigit) {
        return Err(V2vError::malformed(format!(
            "header field {:?} is not hexadecimal",
            String::from_utf8_lossy(field)
        )));
    }

    // Only ASCII hex digits remain, so both conversions are infallible here.
    let text = std::str::from_utf8(field).map_err(|e| V2vError::malformed(e.to_string()))?;
    u32::from_str_radix(text, 16).map_err(|e| V2vError::malformed(e.to_string()))
}

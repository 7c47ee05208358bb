/// Datagram codec: magic bytes followed by a bincode-encoded [`Envelope`].

use thiserror::Error;

use super::msg::Envelope;

pub const WIRE_MAGIC: &[u8; 4] = b"RCMD";

/// Largest datagram the receiving side reads. Anything longer is truncated
/// by the socket and fails to decode.
pub const MAX_DATAGRAM_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid datagram magic")]
    InvalidMagic,
    #[error("bincode error: {0}")]
    Codec(#[from] bincode::Error),
}

pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, WireError> {
    let mut payload = Vec::with_capacity(64);
    payload.extend_from_slice(WIRE_MAGIC);
    bincode::serialize_into(&mut payload, envelope)?;
    Ok(payload)
}

pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, WireError> {
    let Some(body) = bytes.strip_prefix(WIRE_MAGIC.as_slice()) else {
        return Err(WireError::InvalidMagic);
    };
    Ok(bincode::deserialize(body)?)
}

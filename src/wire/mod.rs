//! Wire Format Module
//!
//! Every datagram exchanged between vehicles is a *frame*: a 4-hex-digit message id,
//! a 6-hex-digit payload length, then the raw payload bytes.
//!
//! ```text
//! 03ea 000001 <payload>
//! ^id  ^len   ^bincode-encoded message fields
//! ```
//!
//! - **`codec`**: Stateless framing (`encode`/`decode`) with the declared-length check.
//! - **`messages`**: Message ids and the typed protocol messages carried inside frames.

pub mod codec;
pub mod messages;

#[cfg(test)]
mod tests;

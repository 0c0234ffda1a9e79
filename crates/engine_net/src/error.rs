//! Network-layer error types.

/// Reasons a datagram is rejected before any event is built from it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// The buffer cannot hold a full header.
    #[error("packet of {len} bytes is shorter than the {min}-byte header")]
    TooShort {
        /// Bytes received.
        len: usize,
        /// Required header length.
        min: usize,
    },

    /// The header declares more payload than the buffer carries.
    #[error("header declares {declared} payload bytes but only {available} follow")]
    PayloadOverrun {
        /// Payload size from the header.
        declared: usize,
        /// Bytes actually following the header.
        available: usize,
    },

    /// The sender speaks a different protocol version.
    #[error("unsupported protocol version {version} (expected {expected})")]
    UnsupportedVersion {
        /// Version byte received.
        version: u8,
        /// Version this build speaks.
        expected: u8,
    },

    /// Sequence number and packet count are inconsistent.
    #[error("invalid fragment {sequence} of {total}")]
    InvalidFragment {
        /// Sequence number from the header.
        sequence: u16,
        /// Total packet count from the header.
        total: u16,
    },
}

/// Errors that can occur while turning datagrams into events.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// The packet header was malformed.
    #[error("malformed packet: {0}")]
    Header(#[from] HeaderError),

    /// No decoder is registered for this message-type tag.
    #[error("no decoder registered for message type {tag:#04x}")]
    UnknownMessageType {
        /// The message-type tag from the header.
        tag: u8,
    },

    /// Failed to encode a message to MessagePack.
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a message from MessagePack.
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A payload does not fit the header's 16-bit size and count fields.
    #[error("payload of {len} bytes cannot be framed")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
    },

    /// A multi-packet message claims more fragments than the receiver allows.
    #[error("message of {total} fragments exceeds the limit of {max}")]
    TooManyFragments {
        /// Fragment count from the header.
        total: u16,
        /// Configured maximum.
        max: u16,
    },

    /// A multi-packet message would not fit in the reassembly byte budget.
    #[error("message needs more than the {budget}-byte reassembly budget")]
    ReassemblyBudget {
        /// Configured byte budget.
        budget: usize,
    },

    /// Socket error.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_message_type_display() {
        let err = NetError::UnknownMessageType { tag: 0x2a };
        assert_eq!(err.to_string(), "no decoder registered for message type 0x2a");
    }

    #[test]
    fn test_header_error_converts() {
        let err: NetError = HeaderError::TooShort { len: 3, min: 16 }.into();
        assert!(matches!(err, NetError::Header(HeaderError::TooShort { len: 3, .. })));
        assert_eq!(
            err.to_string(),
            "malformed packet: packet of 3 bytes is shorter than the 16-byte header"
        );
    }
}

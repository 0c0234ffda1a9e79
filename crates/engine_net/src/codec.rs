//! MessagePack payload helpers.
//!
//! Message payloads travel as MessagePack. Structs are written as maps so
//! fields can be added on the sending side without breaking older decoders.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::NetError;

/// Encode a message to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec_named(value).map_err(NetError::Encode)
}

/// Decode a message from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if the bytes are not a valid `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Move {
        entity: u64,
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct MoveV0 {
        entity: u64,
    }

    #[test]
    fn test_named_fields_tolerate_extra_keys() {
        let bytes = encode(&Move {
            entity: 3,
            x: 1.0,
            y: 2.0,
        })
        .unwrap();
        let older: MoveV0 = decode(&bytes).unwrap();
        assert_eq!(older, MoveV0 { entity: 3 });
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<Move, _> = decode(&[0xFF, 0xFF]);
        assert!(matches!(result, Err(NetError::Decode(_))));
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = encode(&Move {
            entity: 1,
            x: 0.0,
            y: 0.0,
        })
        .unwrap();
        let result: Result<Move, _> = decode(&bytes[..bytes.len() - 1]);
        assert!(result.is_err());
    }
}

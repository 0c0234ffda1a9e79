//! Message-type dispatch: turns envelopes into typed events.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec;
use crate::envelope::Envelope;
use crate::error::NetError;

/// A decoded message together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<P> {
    /// Message-type tag from the header.
    pub type_tag: u8,
    /// Decoded payload.
    pub payload: P,
    /// Peer that sent the message.
    pub sender: SocketAddr,
    /// Packet id from the header.
    pub packet_id: u64,
}

type DecodeFn<P> = Box<dyn Fn(&[u8]) -> Result<P, NetError> + Send + Sync>;

/// Lookup from message-type tag to payload decoder.
///
/// Every decoder produces the same payload type `P`, usually an enum with
/// one variant per message kind.
pub struct DecoderTable<P> {
    decoders: HashMap<u8, DecodeFn<P>>,
}

impl<P> Default for DecoderTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> DecoderTable<P> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a raw decoder for `tag`, replacing any previous one.
    pub fn register<F>(&mut self, tag: u8, decode: F) -> &mut Self
    where
        F: Fn(&[u8]) -> Result<P, NetError> + Send + Sync + 'static,
    {
        if self.decoders.insert(tag, Box::new(decode)).is_some() {
            debug!(tag, "replaced decoder");
        }
        self
    }

    /// Register a MessagePack decoder for `M` under `tag`, wrapped into the
    /// payload type by `wrap`.
    pub fn register_message<M, W>(&mut self, tag: u8, wrap: W) -> &mut Self
    where
        M: DeserializeOwned,
        W: Fn(M) -> P + Send + Sync + 'static,
    {
        self.register(tag, move |bytes| codec::decode::<M>(bytes).map(&wrap))
    }

    /// Decode an envelope from `sender` into an event.
    ///
    /// # Errors
    ///
    /// - [`NetError::UnknownMessageType`] if no decoder is registered for the tag.
    /// - Whatever the decoder returns for a malformed payload.
    pub fn decode(&self, envelope: &Envelope, sender: SocketAddr) -> Result<Event<P>, NetError> {
        let decode = self
            .decoders
            .get(&envelope.msg_type)
            .ok_or(NetError::UnknownMessageType {
                tag: envelope.msg_type,
            })?;
        let payload = decode(&envelope.payload[..])?;
        Ok(Event {
            type_tag: envelope.msg_type,
            payload,
            sender,
            packet_id: envelope.packet_id,
        })
    }

    /// Returns `true` if a decoder is registered for `tag`.
    #[must_use]
    pub fn contains(&self, tag: u8) -> bool {
        self.decoders.contains_key(&tag)
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Returns `true` if no decoder is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl<P> fmt::Debug for DecoderTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.decoders.keys().copied().collect();
        tags.sort_unstable();
        f.debug_struct("DecoderTable").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u32,
    }

    #[derive(Debug, PartialEq)]
    enum Payload {
        Ping(Ping),
        Raw(Vec<u8>),
    }

    fn sender() -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 1], 4000))
    }

    fn table() -> DecoderTable<Payload> {
        let mut table = DecoderTable::new();
        table
            .register_message(0x01, Payload::Ping)
            .register(0x02, |bytes| Ok(Payload::Raw(bytes.to_vec())));
        table
    }

    #[test]
    fn test_decode_registered_message() {
        let bytes = codec::encode(&Ping { seq: 12 }).unwrap();
        let event = table()
            .decode(&Envelope::new(0x01, 44, bytes), sender())
            .unwrap();
        assert_eq!(
            event,
            Event {
                type_tag: 0x01,
                payload: Payload::Ping(Ping { seq: 12 }),
                sender: sender(),
                packet_id: 44,
            }
        );
    }

    #[test]
    fn test_raw_decoder() {
        let event = table()
            .decode(&Envelope::new(0x02, 1, vec![9u8, 8]), sender())
            .unwrap();
        assert_eq!(event.payload, Payload::Raw(vec![9, 8]));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = table()
            .decode(&Envelope::new(0x7f, 1, Vec::new()), sender())
            .unwrap_err();
        assert!(matches!(err, NetError::UnknownMessageType { tag: 0x7f }));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let err = table()
            .decode(&Envelope::new(0x01, 1, vec![0xc1u8]), sender())
            .unwrap_err();
        assert!(matches!(err, NetError::Decode(_)));
    }

    #[test]
    fn test_contains_and_len() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert!(table.contains(0x02));
        assert!(!table.contains(0x03));
        assert!(DecoderTable::<Payload>::default().is_empty());
    }
}

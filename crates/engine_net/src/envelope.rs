//! Logical messages and their packet framing.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::NetError;
use crate::header::{HEADER_LEN, PacketHeader};

/// Largest payload a single packet can carry.
pub const MAX_PACKET_PAYLOAD: usize = u16::MAX as usize;

/// A complete message: one packet, or several reassembled in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Message-type tag used to pick a decoder.
    pub msg_type: u8,
    /// Identifier shared by all packets of the message.
    pub packet_id: u64,
    /// Concatenated payload bytes.
    pub payload: Bytes,
}

impl Envelope {
    /// Create an envelope from its parts.
    #[must_use]
    pub fn new(msg_type: u8, packet_id: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            packet_id,
            payload: payload.into(),
        }
    }

    /// Build an envelope from a single, unfragmented packet.
    #[must_use]
    pub fn from_packet(header: &PacketHeader, payload: &[u8]) -> Self {
        Self::new(
            header.msg_type,
            header.packet_id,
            Bytes::copy_from_slice(payload),
        )
    }

    /// Frame the message into packets carrying at most `max_payload` bytes
    /// each. An empty payload still produces one header-only packet.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::PayloadTooLarge`] if the message needs more than
    /// `u16::MAX` packets.
    ///
    /// # Panics
    ///
    /// Panics if `max_payload` is zero or above [`MAX_PACKET_PAYLOAD`].
    pub fn encode(&self, max_payload: usize) -> Result<Vec<Bytes>, NetError> {
        assert!(
            (1..=MAX_PACKET_PAYLOAD).contains(&max_payload),
            "max_payload must be between 1 and {MAX_PACKET_PAYLOAD}"
        );

        let total = self.payload.len().div_ceil(max_payload).max(1);
        let total_packets =
            u16::try_from(total).map_err(|_| NetError::PayloadTooLarge {
                len: self.payload.len(),
            })?;

        let mut packets = Vec::with_capacity(total);
        for sequence in 0..total_packets {
            let start = usize::from(sequence) * max_payload;
            let end = (start + max_payload).min(self.payload.len());
            let chunk = &self.payload[start..end];

            let header = PacketHeader {
                sequence,
                total_packets,
                // chunk.len() <= max_payload <= u16::MAX
                ..PacketHeader::single(self.msg_type, self.packet_id, chunk.len() as u16)
            };
            let mut buf = BytesMut::with_capacity(HEADER_LEN + chunk.len());
            header.encode(&mut buf);
            buf.put_slice(chunk);
            packets.push(buf.freeze());
        }
        Ok(packets)
    }
}

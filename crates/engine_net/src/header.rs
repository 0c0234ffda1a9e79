//! The fixed 16-byte packet header.
//!
//! ```text
//!  0        1        2                                      10       12       14       16
//! +--------+--------+--------------------------------------+--------+--------+--------+
//! |version |msg type|              packet id               |  size  |  seq   | total  |
//! +--------+--------+--------------------------------------+--------+--------+--------+
//! ```
//!
//! All multi-byte fields are big-endian (network byte order). `size` is the
//! number of payload bytes that follow the header; `seq` and `total` place the
//! packet within a multi-packet message (`total == 1` for single packets).

use bytes::{Buf, BufMut};

use crate::error::HeaderError;

/// Length of the header in bytes.
pub const HEADER_LEN: usize = 16;

/// Protocol version written by this build and required on receive.
pub const PROTOCOL_VERSION: u8 = 1;

/// A parsed packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketHeader {
    /// Protocol version.
    pub version: u8,
    /// Message-type tag used to pick a decoder.
    pub msg_type: u8,
    /// Identifier shared by all packets of one message.
    pub packet_id: u64,
    /// Number of payload bytes following the header.
    pub payload_size: u16,
    /// Index of this packet within its message.
    pub sequence: u16,
    /// Number of packets making up the message.
    pub total_packets: u16,
}

impl PacketHeader {
    /// Header for a message that fits in a single packet.
    #[must_use]
    pub fn single(msg_type: u8, packet_id: u64, payload_size: u16) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            msg_type,
            packet_id,
            payload_size,
            sequence: 0,
            total_packets: 1,
        }
    }

    /// Parse and validate the header at the start of `buf`.
    ///
    /// Returns the header together with exactly `payload_size` payload bytes;
    /// anything after the declared payload is ignored.
    ///
    /// # Errors
    ///
    /// - [`HeaderError::TooShort`] if `buf` is shorter than [`HEADER_LEN`].
    /// - [`HeaderError::PayloadOverrun`] if the declared payload size exceeds
    ///   the bytes after the header.
    /// - [`HeaderError::UnsupportedVersion`] on a version mismatch.
    /// - [`HeaderError::InvalidFragment`] if `total` is zero or `seq >= total`.
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), HeaderError> {
        if buf.len() < HEADER_LEN {
            return Err(HeaderError::TooShort {
                len: buf.len(),
                min: HEADER_LEN,
            });
        }

        let (mut head, rest) = buf.split_at(HEADER_LEN);
        let header = Self {
            version: head.get_u8(),
            msg_type: head.get_u8(),
            packet_id: head.get_u64(),
            payload_size: head.get_u16(),
            sequence: head.get_u16(),
            total_packets: head.get_u16(),
        };

        let declared = usize::from(header.payload_size);
        if declared > rest.len() {
            return Err(HeaderError::PayloadOverrun {
                declared,
                available: rest.len(),
            });
        }
        if header.version != PROTOCOL_VERSION {
            return Err(HeaderError::UnsupportedVersion {
                version: header.version,
                expected: PROTOCOL_VERSION,
            });
        }
        if header.total_packets == 0 || header.sequence >= header.total_packets {
            return Err(HeaderError::InvalidFragment {
                sequence: header.sequence,
                total: header.total_packets,
            });
        }

        Ok((header, &rest[..declared]))
    }

    /// Append the 16 header bytes to `out`.
    pub fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u8(self.version);
        out.put_u8(self.msg_type);
        out.put_u64(self.packet_id);
        out.put_u16(self.payload_size);
        out.put_u16(self.sequence);
        out.put_u16(self.total_packets);
    }

    /// The header as a fixed byte array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        self.encode(&mut &mut bytes[..]);
        bytes
    }

    /// Returns `true` if the message spans more than one packet.
    #[must_use]
    pub fn is_fragmented(&self) -> bool {
        self.total_packets > 1
    }
}

//! Reassembly of messages that span several packets.
//!
//! Memory held for incomplete messages is bounded three ways: by the number
//! of partial messages, by the fragment count a single message may claim,
//! and by the total payload bytes buffered across all partials. Storage
//! grows with the fragments that actually arrive, never with the count a
//! header claims.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::NetError;
use crate::header::PacketHeader;

/// Default cap on partially received messages.
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Default cap on the fragment count of a single message.
pub const DEFAULT_MAX_FRAGMENTS: u16 = 64;

/// Default cap on payload bytes buffered across all partial messages.
pub const DEFAULT_MAX_BUFFERED_BYTES: usize = 4 * 1024 * 1024;

type FragmentKey = (SocketAddr, u64);

#[derive(Debug)]
struct Partial {
    msg_type: u8,
    total: u16,
    /// Arrival order, for oldest-first eviction.
    started: u64,
    bytes: usize,
    fragments: BTreeMap<u16, Bytes>,
}

/// Buffers fragments per `(sender, packet_id)` until every sequence number
/// has arrived.
#[derive(Debug)]
pub struct Reassembler {
    pending: HashMap<FragmentKey, Partial>,
    max_pending: usize,
    max_fragments: u16,
    max_buffered_bytes: usize,
    buffered_bytes: usize,
    counter: u64,
    evicted: u64,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

impl Reassembler {
    /// Create a reassembler holding at most `max_pending` partial messages,
    /// with the default fragment and byte limits.
    ///
    /// # Panics
    ///
    /// Panics if `max_pending` is zero.
    #[must_use]
    pub fn new(max_pending: usize) -> Self {
        assert!(max_pending > 0, "max_pending must be non-zero");
        Self {
            pending: HashMap::new(),
            max_pending,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            max_buffered_bytes: DEFAULT_MAX_BUFFERED_BYTES,
            buffered_bytes: 0,
            counter: 0,
            evicted: 0,
        }
    }

    /// Reject messages claiming more than `max_fragments` packets.
    ///
    /// # Panics
    ///
    /// Panics if `max_fragments` is below 2.
    #[must_use]
    pub fn with_max_fragments(mut self, max_fragments: u16) -> Self {
        assert!(max_fragments >= 2, "max_fragments must allow at least two packets");
        self.max_fragments = max_fragments;
        self
    }

    /// Cap the payload bytes buffered across all partial messages.
    ///
    /// # Panics
    ///
    /// Panics if `max_buffered_bytes` is zero.
    #[must_use]
    pub fn with_max_buffered_bytes(mut self, max_buffered_bytes: usize) -> Self {
        assert!(max_buffered_bytes > 0, "max_buffered_bytes must be non-zero");
        self.max_buffered_bytes = max_buffered_bytes;
        self
    }

    /// Feed one parsed packet.
    ///
    /// Unfragmented packets pass straight through. Fragments are buffered and
    /// the complete envelope is returned once the last missing one arrives.
    /// Duplicates and fragments disagreeing with the first one seen for the
    /// same key are ignored.
    ///
    /// # Errors
    ///
    /// - [`NetError::TooManyFragments`] if the header claims more packets
    ///   than allowed. Nothing is buffered.
    /// - [`NetError::ReassemblyBudget`] if the message cannot fit in the byte
    ///   budget even after evicting every other partial. The message is
    ///   dropped.
    pub fn accept(
        &mut self,
        sender: SocketAddr,
        header: &PacketHeader,
        payload: &[u8],
    ) -> Result<Option<Envelope>, NetError> {
        if !header.is_fragmented() {
            return Ok(Some(Envelope::from_packet(header, payload)));
        }
        if header.total_packets > self.max_fragments {
            return Err(NetError::TooManyFragments {
                total: header.total_packets,
                max: self.max_fragments,
            });
        }
        if header.sequence >= header.total_packets {
            return Ok(None);
        }

        let key = (sender, header.packet_id);
        if !self.pending.contains_key(&key) {
            self.evict_while(Some(key), |r| r.pending.len() >= r.max_pending);
            self.counter += 1;
            self.pending.insert(
                key,
                Partial {
                    msg_type: header.msg_type,
                    total: header.total_packets,
                    started: self.counter,
                    bytes: 0,
                    fragments: BTreeMap::new(),
                },
            );
        }

        let Some(partial) = self.pending.get(&key) else {
            return Ok(None);
        };
        if partial.msg_type != header.msg_type || partial.total != header.total_packets {
            debug!(%sender, packet_id = header.packet_id, "inconsistent fragment ignored");
            return Ok(None);
        }
        if partial.fragments.contains_key(&header.sequence) {
            return Ok(None);
        }

        let needed = payload.len();
        self.evict_while(Some(key), |r| r.buffered_bytes + needed > r.max_buffered_bytes);
        if self.buffered_bytes + needed > self.max_buffered_bytes {
            self.drop_partial(&key);
            return Err(NetError::ReassemblyBudget {
                budget: self.max_buffered_bytes,
            });
        }

        let Some(partial) = self.pending.get_mut(&key) else {
            return Ok(None);
        };
        partial
            .fragments
            .insert(header.sequence, Bytes::copy_from_slice(payload));
        partial.bytes += needed;
        self.buffered_bytes += needed;
        if partial.fragments.len() < usize::from(partial.total) {
            return Ok(None);
        }

        let Some(partial) = self.drop_partial(&key) else {
            return Ok(None);
        };
        let mut joined = BytesMut::with_capacity(partial.bytes);
        for fragment in partial.fragments.values() {
            joined.extend_from_slice(fragment);
        }
        Ok(Some(Envelope::new(
            partial.msg_type,
            header.packet_id,
            joined.freeze(),
        )))
    }

    fn drop_partial(&mut self, key: &FragmentKey) -> Option<Partial> {
        let partial = self.pending.remove(key)?;
        self.buffered_bytes -= partial.bytes;
        Some(partial)
    }

    /// Evict the oldest partial other than `keep` while `over` holds.
    fn evict_while(&mut self, keep: Option<FragmentKey>, over: impl Fn(&Self) -> bool) {
        while over(self) {
            let Some(oldest) = self
                .pending
                .iter()
                .filter(|(k, _)| Some(**k) != keep)
                .min_by_key(|(_, p)| p.started)
                .map(|(k, _)| *k)
            else {
                return;
            };
            self.drop_partial(&oldest);
            self.evicted += 1;
            warn!(sender = %oldest.0, packet_id = oldest.1, "evicted incomplete message");
        }
    }

    /// Number of partially received messages.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Payload bytes currently held for partial messages.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    /// Number of incomplete messages dropped to respect the caps.
    #[must_use]
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }
}

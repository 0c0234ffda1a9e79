//! UDP receive loop feeding the event queue.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::{debug, info, warn};

use crate::decoder::{DecoderTable, Event};
use crate::error::NetError;
use crate::fragment::Reassembler;
use crate::header::PacketHeader;
use crate::queue::EventQueue;

/// Receive buffer size; large enough for any UDP datagram.
const RECV_BUFFER_LEN: usize = 65_536;

/// Counters kept by the receive loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Datagrams read from the socket.
    pub datagrams: u64,
    /// Events pushed onto the queue.
    pub events: u64,
    /// Datagrams or messages dropped as malformed or undecodable.
    pub rejected: u64,
}

/// Binds a UDP socket and turns every valid message into an [`Event`] on
/// the shared queue.
pub struct Transport<P> {
    socket: UdpSocket,
    decoders: DecoderTable<P>,
    reassembler: Reassembler,
    queue: Arc<EventQueue<Event<P>>>,
    stats: TransportStats,
}

impl<P> Transport<P> {
    /// Bind to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Io`] if the socket cannot be bound.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        decoders: DecoderTable<P>,
        reassembler: Reassembler,
        queue: Arc<EventQueue<Event<P>>>,
    ) -> Result<Self, NetError> {
        let socket = UdpSocket::bind(addr).await?;
        info!(addr = %socket.local_addr()?, decoders = decoders.len(), "transport bound");
        Ok(Self {
            socket,
            decoders,
            reassembler,
            queue,
            stats: TransportStats::default(),
        })
    }

    /// The address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Io`] if the OS cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.socket.local_addr()?)
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    /// Process one datagram: parse, reassemble, decode, push.
    ///
    /// Returns `Ok(true)` if an event was queued and `Ok(false)` if the
    /// datagram was a fragment of a still-incomplete message.
    ///
    /// # Errors
    ///
    /// Returns the reason the datagram was rejected. Nothing is queued.
    pub fn handle_datagram(&mut self, datagram: &[u8], sender: SocketAddr) -> Result<bool, NetError> {
        self.stats.datagrams += 1;
        let result = self.process(datagram, sender);
        match &result {
            Ok(true) => self.stats.events += 1,
            Ok(false) => {}
            Err(_) => self.stats.rejected += 1,
        }
        result
    }

    fn process(&mut self, datagram: &[u8], sender: SocketAddr) -> Result<bool, NetError> {
        let (header, payload) = PacketHeader::parse(datagram)?;
        let Some(envelope) = self.reassembler.accept(sender, &header, payload)? else {
            debug!(%sender, packet_id = header.packet_id, sequence = header.sequence, "buffered fragment");
            return Ok(false);
        };
        let event = self.decoders.decode(&envelope, sender)?;
        self.queue.push(event);
        Ok(true)
    }

    /// Receive until the socket fails. Bad datagrams and transient receive
    /// errors are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Io`] when receiving fails with an error that is
    /// not transient.
    pub async fn run(mut self) -> Result<(), NetError> {
        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        loop {
            let (len, sender) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) if is_transient(&e) => {
                    warn!(error = %e, "receive failed, continuing");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if let Err(e) = self.handle_datagram(&buf[..len], sender) {
                warn!(%sender, len, error = %e, "dropped datagram");
            }
        }
    }
}

/// Receive errors that concern a single datagram or peer, not the socket.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

impl<P> std::fmt::Debug for Transport<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("local_addr", &self.socket.local_addr().ok())
            .field("decoders", &self.decoders)
            .field("pending_fragments", &self.reassembler.pending_count())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::codec;
    use crate::envelope::Envelope;
    use crate::error::HeaderError;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    async fn transport() -> (Transport<Note>, Arc<EventQueue<Event<Note>>>) {
        let mut decoders = DecoderTable::new();
        decoders.register_message(0x01, |note: Note| note);
        let queue = Arc::new(EventQueue::new());
        let transport = Transport::bind("127.0.0.1:0", decoders, Reassembler::default(), Arc::clone(&queue))
            .await
            .unwrap();
        (transport, queue)
    }

    fn note_packets(text: &str, max_payload: usize) -> Vec<bytes::Bytes> {
        let payload = codec::encode(&Note { text: text.into() }).unwrap();
        Envelope::new(0x01, 77, payload).encode(max_payload).unwrap()
    }

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 9))
    }

    #[tokio::test]
    async fn test_handle_datagram_queues_event() {
        let (mut transport, queue) = transport().await;
        let packets = note_packets("hi", 1024);

        assert!(transport.handle_datagram(&packets[0], peer()).unwrap());
        let events = queue.drain_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, Note { text: "hi".into() });
        assert_eq!(events[0].packet_id, 77);
        assert_eq!(events[0].sender, peer());
    }

    #[tokio::test]
    async fn test_rejected_datagrams_queue_nothing() {
        let (mut transport, queue) = transport().await;

        let err = transport.handle_datagram(&[0u8; 15], peer()).unwrap_err();
        assert!(matches!(err, NetError::Header(HeaderError::TooShort { .. })));

        let unknown = Envelope::new(0x42, 1, Vec::new()).encode(64).unwrap();
        let err = transport.handle_datagram(&unknown[0], peer()).unwrap_err();
        assert!(matches!(err, NetError::UnknownMessageType { tag: 0x42 }));

        assert!(queue.is_empty());
        assert_eq!(
            transport.stats(),
            TransportStats {
                datagrams: 2,
                events: 0,
                rejected: 2
            }
        );
    }

    #[test]
    fn test_transient_receive_errors() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_oversized_fragment_count_rejected() {
        let (mut transport, queue) = transport().await;
        let header = PacketHeader {
            sequence: 0,
            total_packets: u16::MAX,
            ..PacketHeader::single(0x01, 5, 0)
        };
        let err = transport.handle_datagram(&header.to_bytes(), peer()).unwrap_err();
        assert!(matches!(err, NetError::TooManyFragments { .. }));
        assert!(queue.is_empty());
        assert_eq!(transport.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_fragments_become_one_event() {
        let (mut transport, queue) = transport().await;
        let packets = note_packets("a longer note split over packets", 4);
        assert!(packets.len() > 1);

        let (last, rest) = packets.split_last().unwrap();
        for packet in rest {
            assert!(!transport.handle_datagram(packet, peer()).unwrap());
        }
        assert!(queue.is_empty());
        assert!(transport.handle_datagram(last, peer()).unwrap());
        assert_eq!(queue.pop().unwrap().payload.text, "a longer note split over packets");
    }

    #[tokio::test]
    async fn test_run_receives_over_udp() {
        let (transport, queue) = transport().await;
        let addr = transport.local_addr().unwrap();
        let task = tokio::spawn(transport.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"garbage", addr).await.unwrap();
        for packet in note_packets("over the wire", 1024) {
            client.send_to(&packet, addr).await.unwrap();
        }

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(queue.drain_all());
            if !events.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload.text, "over the wire");
        assert_eq!(events[0].sender, client.local_addr().unwrap());
    }
}

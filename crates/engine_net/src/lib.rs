//! # engine_net
//!
//! The I/O side of the engine: turns UDP datagrams into typed events and
//! hands them to the simulation thread.
//!
//! - [`header`]: the fixed 16-byte packet header.
//! - [`envelope`]: logical messages and their framing into packets.
//! - [`fragment`]: reassembly of multi-packet messages.
//! - [`decoder`]: message-type tag to payload decoder dispatch.
//! - [`codec`]: MessagePack helpers for payloads.
//! - [`queue`]: the thread-safe FIFO between transport and simulation.
//! - [`transport`]: the tokio UDP receive loop.
//! - [`error`]: network-layer error types.
//!
//! The simulation side never touches a socket; it only drains the
//! [`EventQueue`].

pub mod codec;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod fragment;
pub mod header;
pub mod queue;
pub mod transport;

pub use decoder::{DecoderTable, Event};
pub use envelope::Envelope;
pub use error::{HeaderError, NetError};
pub use fragment::Reassembler;
pub use header::{HEADER_LEN, PROTOCOL_VERSION, PacketHeader};
pub use queue::EventQueue;
pub use transport::{Transport, TransportStats};

//! # Binary Replication Codec
//!
//! Change-masked, little-endian packets carrying the subset of entity state
//! that changed since it was last sent.
//!
//! ## Modules
//!
//! - [`cursor`]: bounded read/write positions
//! - [`compression`]: quantized vector and smallest-three rotation packing
//! - [`state`]: last-sent values per field
//! - [`packet`]: packet header, writer and reader

pub mod compression;
pub mod cursor;
pub mod packet;
pub mod state;

pub use cursor::{ReadCursor, WriteCursor};
pub use packet::{PacketHeader, PacketReader, PacketSummary, PacketWriter, HEADER_SIZE};
pub use state::SentStateCache;

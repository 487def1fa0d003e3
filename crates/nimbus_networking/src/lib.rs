//! # NIMBUS Networking
//!
//! Delta-encoded binary replication of world state between peers.
//!
//! ## Architecture
//!
//! - **Codec**: change-masked little-endian packets; unchanged data costs
//!   zero bytes
//! - **Schemas**: one writer/reader pair per replicated component group,
//!   each owning a bit of the entity change mask
//! - **Authority**: exactly one peer writes each entity; readers drop
//!   self-echo and untrusted senders while keeping the cursor in step
//!
//! ## Authority Model
//!
//! ```text
//! AUTHORITY                         PEER
//!   |--- [header][entity...] ------->|
//!   |                                | <- sender is authority: apply
//!   |                                | <- otherwise: consume and drop
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use nimbus_networking::{
//!     NetworkObject, NetworkObjects, NetworkSchemaRegistry, PacketReader, PacketWriter,
//!     ReplicationConfig,
//! };
//!
//! let config = ReplicationConfig::from_toml_file("replication.toml")?;
//! let schemas = NetworkSchemaRegistry::with_defaults(&config)?;
//! let mut writer = PacketWriter::new(local_peer, config)?;
//! let reader = PacketReader::new(local_peer);
//!
//! // Every tick
//! let packet = writer.write(&world, &objects, &schemas, tick, time)?.to_vec();
//! transport.send(&packet);
//!
//! // On receive
//! reader.read(&mut world, &objects, &schemas, &incoming)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod authority;
pub mod codec;
pub mod config;
pub mod error;
pub mod object;
pub mod schema;

pub use authority::{AuthorityPolicy, TrustRule};
pub use codec::{
    PacketHeader, PacketReader, PacketSummary, PacketWriter, ReadCursor, SentStateCache,
    WriteCursor, HEADER_SIZE,
};
pub use config::ReplicationConfig;
pub use error::{NetworkError, NetworkResult};
pub use object::{NetworkObject, NetworkObjects, NetworkPeriodicUpdate, PeerIndex};
pub use schema::{
    CompressedTransformSchema, NetworkSchema, NetworkSchemaRegistry, ReadContext,
    TransformSchema, VelocitySchema, WriteContext, MAX_MASK_BITS,
};

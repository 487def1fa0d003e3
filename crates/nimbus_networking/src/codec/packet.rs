//! # Packet Writer and Reader
//!
//! ```text
//! [peerIndex: u32][simulationTime: f64][entityCount: u32]
//! entityCount x {
//!   [networkId: u32][ownerPeerIndex: u32][entityChangeMask: u8]
//!   per set bit, in schema order: schema payload
//! }
//! ```
//!
//! Entities with nothing to send are rewound out of the packet, and a batch
//! with no entities at all encodes to zero bytes.

use std::collections::HashSet;

use nimbus_core::{EntityId, World};

use crate::authority::AuthorityPolicy;
use crate::codec::cursor::{ReadCursor, WriteCursor};
use crate::codec::state::SentStateCache;
use crate::config::ReplicationConfig;
use crate::error::{NetworkError, NetworkResult};
use crate::object::{NetworkObject, NetworkObjects, NetworkPeriodicUpdate, PeerIndex};
use crate::schema::{NetworkSchemaRegistry, ReadContext, WriteContext, MAX_MASK_BITS};

/// Encoded size of [`PacketHeader`].
pub const HEADER_SIZE: usize = 16;

/// Fixed packet prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketHeader {
    /// Sending peer.
    pub peer: PeerIndex,
    /// Sender's simulation time.
    pub simulation_time: f64,
    /// Number of entity records that follow.
    pub entity_count: u32,
}

impl PacketHeader {
    /// Reads the header.
    ///
    /// # Errors
    ///
    /// [`NetworkError::OutOfBounds`], including for an empty packet.
    pub fn read(cursor: &mut ReadCursor<'_>) -> NetworkResult<Self> {
        Ok(Self {
            peer: cursor.read_u32()?,
            simulation_time: cursor.read_f64()?,
            entity_count: cursor.read_u32()?,
        })
    }
}

/// Result of reading one packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketSummary {
    /// The decoded header.
    pub header: PacketHeader,
    /// Entities that had at least one schema applied.
    pub applied: u32,
    /// Entities whose values were all discarded.
    pub discarded: u32,
}

/// Encodes the local peer's authoritative entities.
#[derive(Debug)]
pub struct PacketWriter {
    policy: AuthorityPolicy,
    config: ReplicationConfig,
    cursor: WriteCursor,
    sent: SentStateCache,
}

impl PacketWriter {
    /// Creates a writer for `local_peer`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConfig`].
    pub fn new(local_peer: PeerIndex, config: ReplicationConfig) -> NetworkResult<Self> {
        config.validate()?;
        Ok(Self {
            policy: AuthorityPolicy::new(local_peer),
            cursor: WriteCursor::with_limit(config.max_packet_size),
            config,
            sent: SentStateCache::new(),
        })
    }

    /// The writing peer.
    #[must_use]
    pub const fn local_peer(&self) -> PeerIndex {
        self.policy.local_peer()
    }

    /// Values recorded as sent.
    #[must_use]
    pub const fn sent_state(&self) -> &SentStateCache {
        &self.sent
    }

    /// Forgets what was sent for an entity, e.g. after it despawned.
    pub fn forget(&mut self, entity: EntityId) {
        self.sent.forget(entity);
    }

    /// Encodes every entity the local peer is authority for. Returns the
    /// packet bytes, empty when nothing changed.
    ///
    /// Fields count as sent only once the whole packet encoded.
    ///
    /// # Errors
    ///
    /// [`NetworkError::OutOfBounds`] when the batch exceeds
    /// `max_packet_size`.
    pub fn write(
        &mut self,
        world: &World,
        objects: &NetworkObjects,
        schemas: &NetworkSchemaRegistry,
        tick: u64,
        simulation_time: f64,
    ) -> NetworkResult<&[u8]> {
        self.prune(world, objects);
        self.cursor.reset();
        match self.encode(world, objects, schemas, tick, simulation_time) {
            Ok(0) => {
                self.cursor.reset();
                self.sent.discard();
            }
            Ok(count) => {
                self.sent.commit();
                tracing::trace!(entities = count, bytes = self.cursor.len(), tick, "packet written");
            }
            Err(error) => {
                self.cursor.reset();
                self.sent.discard();
                return Err(error);
            }
        }
        Ok(self.cursor.as_slice())
    }

    /// Drops sent state for entities this peer no longer writes: despawned,
    /// disconnected, or handed to another authority. Regaining authority
    /// later resends every field.
    fn prune(&mut self, world: &World, objects: &NetworkObjects) {
        if self.sent.is_empty() {
            return;
        }
        let policy = self.policy;
        let writable: HashSet<EntityId> = objects
            .iter()
            .map(|(_, entity)| entity)
            .filter(|&entity| {
                world
                    .dense::<NetworkObject>(entity)
                    .is_some_and(|object| policy.may_write(object))
            })
            .collect();
        let before = self.sent.len();
        self.sent.retain_entities(|entity| writable.contains(&entity));
        let pruned = before - self.sent.len();
        if pruned > 0 {
            tracing::trace!(pruned, "sent state pruned");
        }
    }

    fn encode(
        &mut self,
        world: &World,
        objects: &NetworkObjects,
        schemas: &NetworkSchemaRegistry,
        tick: u64,
        simulation_time: f64,
    ) -> NetworkResult<u32> {
        self.cursor.write_u32(self.policy.local_peer())?;
        self.cursor.write_f64(simulation_time)?;
        let count_at = self.cursor.reserve_u32()?;

        let mut count = 0u32;
        for (network_id, entity) in objects.iter() {
            let Some(object) = world.dense::<NetworkObject>(entity).copied() else {
                continue;
            };
            if !self.policy.may_write(&object) {
                continue;
            }

            let force = world
                .dense::<NetworkPeriodicUpdate>(entity)
                .is_some_and(|tag| self.config.is_resync_tick(tick, tag.interval_ticks));

            let entity_at = self.cursor.position();
            self.cursor.write_u32(network_id)?;
            self.cursor.write_u32(object.owner_peer)?;
            let mask_at = self.cursor.reserve_u8()?;

            let mut mask = 0u8;
            for (bit, schema) in schemas.iter().enumerate() {
                let mut ctx = WriteContext {
                    cursor: &mut self.cursor,
                    world,
                    sent: &mut self.sent,
                    entity,
                    force,
                };
                if schema.write(&mut ctx)? {
                    mask |= 1 << bit;
                }
            }

            if mask == 0 {
                self.cursor.rewind(entity_at);
                continue;
            }
            self.cursor.backfill_u8(mask_at, mask)?;
            count += 1;
        }

        self.cursor.backfill_u32(count_at, count)?;
        Ok(count)
    }
}

/// Decodes packets into the local world.
#[derive(Debug, Clone, Copy)]
pub struct PacketReader {
    policy: AuthorityPolicy,
}

impl PacketReader {
    /// Creates a reader for `local_peer`.
    #[must_use]
    pub const fn new(local_peer: PeerIndex) -> Self {
        Self {
            policy: AuthorityPolicy::new(local_peer),
        }
    }

    /// Reads a packet. An empty packet is a no-op returning `None`.
    ///
    /// Values from senders that fail the authority check, and for unknown
    /// network ids, are consumed and dropped.
    ///
    /// # Errors
    ///
    /// - [`NetworkError::OutOfBounds`] for a truncated packet
    /// - [`NetworkError::UnexpectedMaskBit`] for a mask bit no registered
    ///   schema owns
    pub fn read(
        &self,
        world: &mut World,
        objects: &NetworkObjects,
        schemas: &NetworkSchemaRegistry,
        packet: &[u8],
    ) -> NetworkResult<Option<PacketSummary>> {
        if packet.is_empty() {
            return Ok(None);
        }

        let mut cursor = ReadCursor::new(packet);
        let header = PacketHeader::read(&mut cursor)?;
        let mut summary = PacketSummary {
            header,
            applied: 0,
            discarded: 0,
        };

        for _ in 0..header.entity_count {
            let network_id = cursor.read_u32()?;
            let owner_peer = cursor.read_u32()?;
            let mask = cursor.read_u8()?;

            let local = objects
                .entity(network_id)
                .and_then(|entity| world.dense::<NetworkObject>(entity).map(|object| (entity, *object)));
            match local {
                None => tracing::trace!(network_id, "update for unknown network object"),
                Some((_, object)) if object.owner_peer != owner_peer => {
                    tracing::trace!(network_id, local = object.owner_peer, wire = owner_peer, "owner mismatch");
                }
                Some(_) => {}
            }

            let mut applied = false;
            for bit in 0..MAX_MASK_BITS as u8 {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let schema = schemas.get(bit).ok_or(NetworkError::UnexpectedMaskBit(bit))?;
                let target = local
                    .filter(|(_, object)| self.policy.should_apply(header.peer, object, schema.trust()))
                    .map(|(entity, _)| entity);
                applied |= target.is_some();

                let mut ctx = ReadContext {
                    cursor: &mut cursor,
                    world: &mut *world,
                    target,
                };
                schema.read(&mut ctx)?;
            }

            if applied {
                summary.applied += 1;
            } else {
                summary.discarded += 1;
                if local.is_some() {
                    tracing::debug!(network_id, sender = header.peer, "discarded non-authoritative update");
                }
            }
        }

        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::{ComponentRegistry, Position, Rotation, Velocity};

    fn setup(local_peer: PeerIndex) -> (World, NetworkObjects, EntityId) {
        let mut world = World::new(ComponentRegistry::new());
        let mut objects = NetworkObjects::new();
        let entity = objects
            .spawn_object(&mut world, NetworkObject::owned_by(1, local_peer))
            .unwrap();
        (world, objects, entity)
    }

    fn schemas() -> NetworkSchemaRegistry {
        NetworkSchemaRegistry::with_defaults(&ReplicationConfig::default()).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let (mut world, objects, entity) = setup(5);
        world.set_dense(entity, Velocity::new(1.0, 0.0, 0.0)).unwrap();
        let mut writer = PacketWriter::new(5, ReplicationConfig::default()).unwrap();
        let packet = writer.write(&world, &objects, &schemas(), 1, 2.5).unwrap().to_vec();

        assert_eq!(&packet[0..4], &5u32.to_le_bytes());
        assert_eq!(&packet[4..12], &2.5f64.to_le_bytes());
        assert_eq!(&packet[12..16], &1u32.to_le_bytes());
        // networkId, owner, entity mask (velocity is bit 1)
        assert_eq!(&packet[16..20], &1u32.to_le_bytes());
        assert_eq!(&packet[20..24], &5u32.to_le_bytes());
        assert_eq!(packet[24], 0b10);
        // velocity mask, then x,y,z mask and three f64
        assert_eq!(packet[25], 0b1);
        assert_eq!(packet[26], 0b111);
        assert_eq!(packet.len(), 27 + 3 * 8);
    }

    #[test]
    fn test_unchanged_entities_cost_nothing() {
        let (mut world, objects, entity) = setup(5);
        world.set_dense(entity, Position::new(1.0, 2.0, 3.0)).unwrap();
        let schemas = schemas();
        let mut writer = PacketWriter::new(5, ReplicationConfig::default()).unwrap();

        assert!(!writer.write(&world, &objects, &schemas, 1, 0.0).unwrap().is_empty());
        assert!(writer.write(&world, &objects, &schemas, 2, 0.0).unwrap().is_empty());

        // Only y changed: one f64 behind the masks
        world.dense_mut::<Position>(entity).unwrap().y = 4.0;
        let packet = writer.write(&world, &objects, &schemas, 3, 0.0).unwrap();
        assert_eq!(packet.len(), HEADER_SIZE + 9 + 1 + 1 + 8);
    }

    #[test]
    fn test_only_authoritative_entities_are_written() {
        let (mut world, objects, entity) = setup(5);
        world.set_dense(entity, Position::new(1.0, 2.0, 3.0)).unwrap();
        let mut writer = PacketWriter::new(6, ReplicationConfig::default()).unwrap();
        assert!(writer.write(&world, &objects, &schemas(), 1, 0.0).unwrap().is_empty());
        assert!(writer.sent_state().is_empty());
    }

    #[test]
    fn test_oversized_batch_records_nothing() {
        let (mut world, objects, entity) = setup(5);
        world.set_dense(entity, Rotation::IDENTITY).unwrap();
        let config = ReplicationConfig {
            max_packet_size: HEADER_SIZE + 12,
            ..ReplicationConfig::default()
        };
        let mut writer = PacketWriter::new(5, config).unwrap();
        assert!(matches!(
            writer.write(&world, &objects, &schemas(), 1, 0.0),
            Err(NetworkError::OutOfBounds { .. })
        ));
        assert!(writer.sent_state().is_empty());
    }

    #[test]
    fn test_empty_packet() {
        let (mut world, objects, _) = setup(5);
        let reader = PacketReader::new(2);
        assert_eq!(reader.read(&mut world, &objects, &schemas(), &[]), Ok(None));
        assert!(matches!(
            PacketHeader::read(&mut ReadCursor::new(&[])),
            Err(NetworkError::OutOfBounds { needed: 4, remaining: 0 })
        ));
    }

    #[test]
    fn test_unregistered_mask_bit() {
        let (mut world, objects, _) = setup(5);
        let mut packet = Vec::new();
        packet.extend_from_slice(&5u32.to_le_bytes());
        packet.extend_from_slice(&0f64.to_le_bytes());
        packet.extend_from_slice(&1u32.to_le_bytes());
        packet.extend_from_slice(&1u32.to_le_bytes());
        packet.extend_from_slice(&5u32.to_le_bytes());
        packet.push(1 << 5);
        assert_eq!(
            PacketReader::new(2).read(&mut world, &objects, &schemas(), &packet),
            Err(NetworkError::UnexpectedMaskBit(5))
        );
    }
}

//! # Network Objects
//!
//! Replicated entities are addressed on the wire by a `u32` network id.
//! [`NetworkObjects`] maps those ids to local entities and owns their
//! lifecycle: created on a spawn announcement, authority transferable,
//! destroyed on despawn or when the owning peer disconnects.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use nimbus_core::{Component, EntityId, World};

use crate::error::{NetworkError, NetworkResult};

/// Index of a connected peer.
pub type PeerIndex = u32;

/// Wire identity of a replicated entity.
///
/// Stored as a dense component on the entity itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct NetworkObject {
    /// Id shared by every peer.
    pub network_id: u32,
    /// Peer that spawned the object.
    pub owner_peer: PeerIndex,
    /// Peer whose state is the truth for this object right now.
    pub authority_peer: PeerIndex,
}

impl Component for NetworkObject {
    const NAME: &'static str = "NetworkObject";
}

impl NetworkObject {
    /// Object whose owner is also its authority.
    #[inline]
    #[must_use]
    pub const fn owned_by(network_id: u32, owner_peer: PeerIndex) -> Self {
        Self {
            network_id,
            owner_peer,
            authority_peer: owner_peer,
        }
    }
}

/// Tags an entity for periodic full resends.
///
/// On resync ticks every field of the entity is written whether or not it
/// changed, bounding drift on peers that dropped packets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct NetworkPeriodicUpdate {
    /// Resync interval in ticks; `0` uses the configured interval.
    pub interval_ticks: u32,
}

impl Component for NetworkPeriodicUpdate {
    const NAME: &'static str = "NetworkPeriodicUpdate";
}

/// Network id to entity mapping.
#[derive(Debug, Default)]
pub struct NetworkObjects {
    entities: BTreeMap<u32, EntityId>,
    next_id: u32,
}

impl NetworkObjects {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an id not yet used by this mapping.
    pub fn allocate_id(&mut self) -> u32 {
        while self.entities.contains_key(&self.next_id) {
            self.next_id = self.next_id.wrapping_add(1);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Spawns an entity for an announced object.
    ///
    /// # Errors
    ///
    /// [`NetworkError::DuplicateNetworkObject`] if the id is taken.
    pub fn spawn_object(&mut self, world: &mut World, object: NetworkObject) -> NetworkResult<EntityId> {
        if self.entities.contains_key(&object.network_id) {
            return Err(NetworkError::DuplicateNetworkObject(object.network_id));
        }
        let entity = world.spawn();
        world.set_dense(entity, object)?;
        self.entities.insert(object.network_id, entity);
        tracing::debug!(
            network_id = object.network_id,
            owner = object.owner_peer,
            authority = object.authority_peer,
            %entity,
            "network object spawned"
        );
        Ok(entity)
    }

    /// Despawns an object and its entity. Returns the freed entity.
    pub fn despawn_object(&mut self, world: &mut World, network_id: u32) -> Option<EntityId> {
        let entity = self.entities.remove(&network_id)?;
        world.despawn(entity);
        tracing::debug!(network_id, %entity, "network object despawned");
        Some(entity)
    }

    /// Hands authority over an object to another peer.
    ///
    /// Packets still in flight from the previous authority are rejected by
    /// [`AuthorityPolicy`](crate::AuthorityPolicy) from here on.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnknownNetworkObject`].
    pub fn transfer_authority(
        &self,
        world: &mut World,
        network_id: u32,
        authority_peer: PeerIndex,
    ) -> NetworkResult<()> {
        let unknown = NetworkError::UnknownNetworkObject(network_id);
        let entity = self.entity(network_id).ok_or_else(|| unknown.clone())?;
        let object = world.dense_mut::<NetworkObject>(entity).ok_or(unknown)?;
        tracing::debug!(
            network_id,
            from = object.authority_peer,
            to = authority_peer,
            "authority transferred"
        );
        object.authority_peer = authority_peer;
        Ok(())
    }

    /// Despawns every object owned by a disconnected peer. Returns the
    /// freed entities.
    pub fn remove_peer_objects(&mut self, world: &mut World, peer: PeerIndex) -> Vec<EntityId> {
        let owned: Vec<u32> = self
            .entities
            .iter()
            .filter(|(_, entity)| {
                world
                    .dense::<NetworkObject>(**entity)
                    .is_some_and(|object| object.owner_peer == peer)
            })
            .map(|(&network_id, _)| network_id)
            .collect();

        let removed: Vec<EntityId> = owned
            .into_iter()
            .filter_map(|network_id| self.despawn_object(world, network_id))
            .collect();
        if !removed.is_empty() {
            tracing::debug!(peer, count = removed.len(), "peer objects removed");
        }
        removed
    }

    /// Entity for a network id.
    #[inline]
    #[must_use]
    pub fn entity(&self, network_id: u32) -> Option<EntityId> {
        self.entities.get(&network_id).copied()
    }

    /// Record for a network id, if its entity is still alive.
    #[must_use]
    pub fn object(&self, world: &World, network_id: u32) -> Option<NetworkObject> {
        self.entity(network_id)
            .and_then(|entity| world.dense::<NetworkObject>(entity))
            .copied()
    }

    /// `(network_id, entity)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, EntityId)> + '_ {
        self.entities.iter().map(|(&id, &entity)| (id, entity))
    }

    /// Number of tracked objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no objects are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::ComponentRegistry;

    fn world() -> World {
        World::new(ComponentRegistry::new())
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut world = world();
        let mut objects = NetworkObjects::new();
        let entity = objects
            .spawn_object(&mut world, NetworkObject::owned_by(7, 2))
            .unwrap();
        assert_eq!(objects.entity(7), Some(entity));
        assert_eq!(objects.object(&world, 7).unwrap().authority_peer, 2);
        assert_eq!(
            objects.spawn_object(&mut world, NetworkObject::owned_by(7, 3)),
            Err(NetworkError::DuplicateNetworkObject(7))
        );
    }

    #[test]
    fn test_allocate_skips_used_ids() {
        let mut world = world();
        let mut objects = NetworkObjects::new();
        objects.spawn_object(&mut world, NetworkObject::owned_by(0, 1)).unwrap();
        objects.spawn_object(&mut world, NetworkObject::owned_by(1, 1)).unwrap();
        assert_eq!(objects.allocate_id(), 2);
        assert_eq!(objects.allocate_id(), 3);
    }

    #[test]
    fn test_despawn_frees_entity() {
        let mut world = world();
        let mut objects = NetworkObjects::new();
        let entity = objects.spawn_object(&mut world, NetworkObject::owned_by(1, 1)).unwrap();
        assert_eq!(objects.despawn_object(&mut world, 1), Some(entity));
        assert!(!world.is_alive(entity));
        assert!(objects.is_empty());
        assert_eq!(objects.despawn_object(&mut world, 1), None);
    }

    #[test]
    fn test_transfer_authority() {
        let mut world = world();
        let mut objects = NetworkObjects::new();
        objects.spawn_object(&mut world, NetworkObject::owned_by(4, 1)).unwrap();
        objects.transfer_authority(&mut world, 4, 9).unwrap();
        let object = objects.object(&world, 4).unwrap();
        assert_eq!(object.owner_peer, 1);
        assert_eq!(object.authority_peer, 9);
        assert_eq!(
            objects.transfer_authority(&mut world, 5, 9),
            Err(NetworkError::UnknownNetworkObject(5))
        );
    }

    #[test]
    fn test_remove_peer_objects() {
        let mut world = world();
        let mut objects = NetworkObjects::new();
        objects.spawn_object(&mut world, NetworkObject::owned_by(1, 1)).unwrap();
        objects.spawn_object(&mut world, NetworkObject::owned_by(2, 2)).unwrap();
        objects.spawn_object(&mut world, NetworkObject::owned_by(3, 1)).unwrap();

        assert_eq!(objects.remove_peer_objects(&mut world, 1).len(), 2);
        assert_eq!(objects.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(world.alive_count(), 1);
    }
}

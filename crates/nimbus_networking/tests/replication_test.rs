//! Integration tests for replication between peers.

use nimbus_core::{ComponentRegistry, EntityId, Position, Rotation, Velocity, World};
use nimbus_networking::{
    NetworkError, NetworkObject, NetworkObjects, NetworkPeriodicUpdate, NetworkSchemaRegistry,
    PacketHeader, PacketReader, PacketWriter, PeerIndex, ReadCursor, ReplicationConfig,
    TransformSchema, TrustRule, VelocitySchema,
};
use nimbus_shared::{Quaternion, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

struct Peer {
    world: World,
    objects: NetworkObjects,
    writer: PacketWriter,
    reader: PacketReader,
}

impl Peer {
    fn new(index: PeerIndex, config: &ReplicationConfig) -> Self {
        Self {
            world: World::new(ComponentRegistry::new()),
            objects: NetworkObjects::new(),
            writer: PacketWriter::new(index, config.clone()).unwrap(),
            reader: PacketReader::new(index),
        }
    }

    fn spawn(&mut self, object: NetworkObject) -> EntityId {
        self.objects.spawn_object(&mut self.world, object).unwrap()
    }

    fn send(&mut self, schemas: &NetworkSchemaRegistry, tick: u64) -> Vec<u8> {
        self.writer
            .write(&self.world, &self.objects, schemas, tick, tick as f64 / 60.0)
            .unwrap()
            .to_vec()
    }

    fn receive(&mut self, schemas: &NetworkSchemaRegistry, packet: &[u8]) -> (u32, u32) {
        self.reader
            .read(&mut self.world, &self.objects, schemas, packet)
            .unwrap()
            .map_or((0, 0), |summary| (summary.applied, summary.discarded))
    }

    fn position(&self, entity: EntityId) -> Option<Position> {
        self.world.dense::<Position>(entity).copied()
    }
}

fn random_rotation(rng: &mut StdRng) -> Rotation {
    let axis = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    let q = Quaternion::from_axis_angle(axis, rng.gen_range(0.0..std::f64::consts::TAU)).normalize();
    Rotation::from_quaternion(q)
}

fn same_rotation(a: Rotation, b: Rotation, tolerance: f64) -> bool {
    let (a, b) = (a.to_quaternion(), b.to_quaternion());
    let sign = if a.dot(b) < 0.0 { -1.0 } else { 1.0 };
    a.to_array()
        .iter()
        .zip(b.to_array())
        .all(|(x, y)| (x - sign * y).abs() <= tolerance)
}

/// Peer 1 owns `count` objects with random transforms; peer 2 mirrors them.
fn populated_pair(config: &ReplicationConfig, count: u32, seed: u64) -> (Peer, Peer, Vec<(EntityId, EntityId)>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sender = Peer::new(1, config);
    let mut receiver = Peer::new(2, config);
    let mut pairs = Vec::new();

    for network_id in 0..count {
        let local = sender.spawn(NetworkObject::owned_by(network_id, 1));
        let remote = receiver.spawn(NetworkObject::owned_by(network_id, 1));
        sender
            .world
            .set_dense(
                local,
                Position::new(
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                ),
            )
            .unwrap();
        sender.world.set_dense(local, random_rotation(&mut rng)).unwrap();
        sender
            .world
            .set_dense(
                local,
                Velocity::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), 0.0),
            )
            .unwrap();
        pairs.push((local, remote));
    }
    (sender, receiver, pairs)
}

#[test]
fn test_round_trip_is_exact() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    // Ten full entities stay under the default packet limit.
    let (mut sender, mut receiver, pairs) = populated_pair(&config, 10, 7);

    let packet = sender.send(&schemas, 1);
    assert_eq!(receiver.receive(&schemas, &packet), (10, 0));

    for (local, remote) in pairs {
        assert_eq!(receiver.position(remote), sender.position(local));
        assert_eq!(
            receiver.world.dense::<Rotation>(remote),
            sender.world.dense::<Rotation>(local)
        );
        assert_eq!(
            receiver.world.dense::<Velocity>(remote),
            sender.world.dense::<Velocity>(local)
        );
    }
}

#[test]
fn test_compressed_round_trip_within_tolerance() {
    let config = ReplicationConfig {
        compress_transforms: true,
        ..ReplicationConfig::default()
    };
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, pairs) = populated_pair(&config, 20, 11);

    let packet = sender.send(&schemas, 1);
    receiver.receive(&schemas, &packet);

    for (local, remote) in pairs {
        let sent = sender.position(local).unwrap();
        let got = receiver.position(remote).unwrap();
        assert!((sent.x - got.x).abs() <= 0.01);
        assert!((sent.y - got.y).abs() <= 0.01);
        assert!((sent.z - got.z).abs() <= 0.01);

        let sent = *sender.world.dense::<Rotation>(local).unwrap();
        let got = *receiver.world.dense::<Rotation>(remote).unwrap();
        assert!(same_rotation(sent, got, 0.01));
    }
}

#[test]
fn test_incremental_updates_apply_only_changed_fields() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, pairs) = populated_pair(&config, 3, 3);
    let packet = sender.send(&schemas, 1);
    receiver.receive(&schemas, &packet);

    let (local, remote) = pairs[1];
    sender.world.dense_mut::<Position>(local).unwrap().x = 42.0;
    let packet = sender.send(&schemas, 2);
    assert_eq!(receiver.receive(&schemas, &packet), (1, 0));
    assert_eq!(receiver.position(remote), sender.position(local));
}

#[test]
fn test_empty_batch_is_a_zero_length_packet() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, _) = populated_pair(&config, 5, 1);
    sender.send(&schemas, 1);

    let packet = sender.send(&schemas, 2);
    assert!(packet.is_empty());
    assert_eq!(
        receiver.reader.read(&mut receiver.world, &receiver.objects, &schemas, &packet),
        Ok(None)
    );
    assert!(matches!(
        PacketHeader::read(&mut ReadCursor::new(&packet)),
        Err(NetworkError::OutOfBounds { .. })
    ));
}

#[test]
fn test_truncated_packet_is_an_error() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, _) = populated_pair(&config, 2, 5);
    let packet = sender.send(&schemas, 1);

    let result = receiver
        .reader
        .read(&mut receiver.world, &receiver.objects, &schemas, &packet[..packet.len() - 3]);
    assert!(matches!(result, Err(NetworkError::OutOfBounds { .. })));
}

#[test]
fn test_non_authoritative_sender_is_skipped_in_step() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, pairs) = populated_pair(&config, 3, 9);

    // The receiver believes peer 3 holds authority over object 1.
    receiver.objects.transfer_authority(&mut receiver.world, 1, 3).unwrap();

    let packet = sender.send(&schemas, 1);
    assert_eq!(receiver.receive(&schemas, &packet), (2, 1));

    let (_, skipped) = pairs[1];
    assert_eq!(receiver.position(skipped), None);
    // Objects after the skipped one still decode correctly.
    let (local, remote) = pairs[2];
    assert_eq!(receiver.position(remote), sender.position(local));
}

#[test]
fn test_self_echo_is_rejected() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, _, pairs) = populated_pair(&config, 2, 13);
    let packet = sender.send(&schemas, 1);

    let (local, _) = pairs[0];
    sender.world.set_dense(local, Position::new(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(sender.receive(&schemas, &packet), (0, 2));
    assert_eq!(sender.position(local), Some(Position::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_authority_transfer_rejects_stale_packets() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut old_authority, mut observer, pairs) = populated_pair(&config, 1, 17);
    let stale = old_authority.send(&schemas, 1);

    // Hand object 0 to peer 2 everywhere before the stale packet arrives.
    old_authority.objects.transfer_authority(&mut old_authority.world, 0, 2).unwrap();
    observer.objects.transfer_authority(&mut observer.world, 0, 2).unwrap();
    assert_eq!(observer.receive(&schemas, &stale), (0, 1));

    // The old authority stops writing; the new one starts.
    assert!(old_authority.send(&schemas, 2).is_empty());
    let (_, remote) = pairs[0];
    observer.world.set_dense(remote, Position::new(5.0, 5.0, 5.0)).unwrap();
    let packet = observer.send(&schemas, 2);
    assert_eq!(old_authority.receive(&schemas, &packet), (1, 0));
    let (local, _) = pairs[0];
    assert_eq!(old_authority.position(local), Some(Position::new(5.0, 5.0, 5.0)));
}

#[test]
fn test_owner_trust_rule() {
    let config = ReplicationConfig::default();
    let mut schemas = NetworkSchemaRegistry::new();
    schemas
        .register(TransformSchema::new().with_trust(TrustRule::OwnerOrAuthority))
        .unwrap();
    schemas.register(VelocitySchema).unwrap();

    let mut owner = Peer::new(1, &config);
    let mut observer = Peer::new(3, &config);
    let local = owner.spawn(NetworkObject::owned_by(0, 1));
    let remote = observer.spawn(NetworkObject {
        network_id: 0,
        owner_peer: 1,
        authority_peer: 2,
    });
    owner.world.set_dense(local, Position::new(1.0, 1.0, 1.0)).unwrap();
    owner.world.set_dense(local, Velocity::new(2.0, 0.0, 0.0)).unwrap();

    let packet = owner.send(&schemas, 1);
    assert_eq!(observer.receive(&schemas, &packet), (1, 0));
    // Transform trusts the owner; velocity only the authority.
    assert_eq!(observer.position(remote), Some(Position::new(1.0, 1.0, 1.0)));
    assert_eq!(observer.world.dense::<Velocity>(remote), None);
}

#[test]
fn test_periodic_resync() {
    let config = ReplicationConfig {
        resync_interval_ticks: 10,
        ..ReplicationConfig::default()
    };
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, _, pairs) = populated_pair(&config, 2, 21);
    let (tagged, _) = pairs[0];
    sender
        .world
        .set_dense(tagged, NetworkPeriodicUpdate::default())
        .unwrap();

    let full = sender.send(&schemas, 1);
    assert!(sender.send(&schemas, 5).is_empty());

    // Tick 10 resends the tagged entity only: header plus half the batch.
    let resync = sender.send(&schemas, 10);
    assert_eq!(resync.len() - 16, (full.len() - 16) / 2);
    assert_eq!(u32::from_le_bytes(resync[12..16].try_into().unwrap()), 1);
    assert!(sender.send(&schemas, 11).is_empty());
}

#[test]
fn test_peer_disconnect_removes_owned_objects() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, _) = populated_pair(&config, 4, 23);
    let packet = sender.send(&schemas, 1);

    let removed = receiver.objects.remove_peer_objects(&mut receiver.world, 1);
    assert_eq!(removed.len(), 4);
    assert_eq!(receiver.world.alive_count(), 0);
    // Late packets for removed objects decode without effect.
    assert_eq!(receiver.receive(&schemas, &packet), (0, 4));
}

#[test]
fn test_despawned_objects_leave_no_sent_state() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let mut sender = Peer::new(1, &config);
    let mut per_round = None;

    for round in 0..50u32 {
        let entity = sender.spawn(NetworkObject::owned_by(round, 1));
        sender.world.set_dense(entity, Position::new(f64::from(round), 1.0, 2.0)).unwrap();
        assert!(!sender.send(&schemas, u64::from(round)).is_empty());

        let cached = sender.writer.sent_state().len();
        assert_eq!(*per_round.get_or_insert(cached), cached);
        sender.objects.despawn_object(&mut sender.world, round);
    }

    assert!(sender.send(&schemas, 50).is_empty());
    assert!(sender.writer.sent_state().is_empty());
}

#[test]
fn test_handing_off_authority_resets_sent_state() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, _, _) = populated_pair(&config, 2, 29);
    sender.send(&schemas, 1);
    let full = sender.writer.sent_state().len();

    // Both objects carry the same fields, so each holds half the cache.
    sender.objects.transfer_authority(&mut sender.world, 0, 2).unwrap();
    assert!(sender.send(&schemas, 2).is_empty());
    assert_eq!(sender.writer.sent_state().len(), full / 2);

    // Taking it back resends everything for that object.
    sender.objects.transfer_authority(&mut sender.world, 0, 1).unwrap();
    assert!(!sender.send(&schemas, 3).is_empty());
    assert_eq!(sender.writer.sent_state().len(), full);
}

#[test]
fn test_partial_update_onto_missing_component_fills_defaults() {
    let config = ReplicationConfig::default();
    let schemas = NetworkSchemaRegistry::with_defaults(&config).unwrap();
    let (mut sender, mut receiver, pairs) = populated_pair(&config, 1, 31);
    let (local, remote) = pairs[0];

    let packet = sender.send(&schemas, 1);
    receiver.receive(&schemas, &packet);
    receiver.world.remove_dense::<Position>(remote);

    let moved = sender.position(local).unwrap();
    sender
        .world
        .set_dense(local, Position::new(moved.x + 1.0, moved.y, moved.z))
        .unwrap();
    let packet = sender.send(&schemas, 2);
    assert_eq!(receiver.receive(&schemas, &packet), (1, 0));

    // Only x travelled; the rest come from the default component.
    assert_eq!(receiver.position(remote), Some(Position::new(moved.x + 1.0, 0.0, 0.0)));
}

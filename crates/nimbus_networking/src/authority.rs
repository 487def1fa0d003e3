//! # Ownership and Authority
//!
//! Each replicated entity has exactly one authority peer at a time. Only that
//! peer writes the entity; everybody else applies what it sends.
//!
//! ```text
//! AUTHORITY (peer 1)               PEER 2
//!   |--- state of object 7 ------->|  <- applied: sender is authority
//!   |                              |
//!   |<-- state of object 7 --------|  <- discarded: peer 2 is not authority
//!   |<-- echo of own state --------|  <- discarded: self-echo
//! ```
//!
//! Authority hand-off only updates the stored authority id. Packets still in
//! flight from the previous authority fail the sender check and are dropped.

use crate::object::{NetworkObject, PeerIndex};

/// Who besides the authority a network schema accepts writes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrustRule {
    /// Only the recorded authority.
    #[default]
    AuthorityOnly,
    /// The recorded authority or the object's owner.
    OwnerOrAuthority,
}

impl TrustRule {
    /// Whether `sender` is trusted for `object`.
    #[inline]
    #[must_use]
    pub const fn trusts(self, sender: PeerIndex, object: &NetworkObject) -> bool {
        match self {
            Self::AuthorityOnly => sender == object.authority_peer,
            Self::OwnerOrAuthority => sender == object.authority_peer || sender == object.owner_peer,
        }
    }
}

/// Write/apply decisions for one local peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorityPolicy {
    local_peer: PeerIndex,
}

impl AuthorityPolicy {
    /// Policy for the given local peer.
    #[must_use]
    pub const fn new(local_peer: PeerIndex) -> Self {
        Self { local_peer }
    }

    /// The local peer.
    #[inline]
    #[must_use]
    pub const fn local_peer(&self) -> PeerIndex {
        self.local_peer
    }

    /// Whether the local peer writes this object into outgoing packets.
    #[inline]
    #[must_use]
    pub const fn may_write(&self, object: &NetworkObject) -> bool {
        object.authority_peer == self.local_peer
    }

    /// Whether incoming values from `sender` may be applied to `object`.
    ///
    /// Rejects self-echo (the local peer is the authority) and senders the
    /// trust rule does not accept.
    #[inline]
    #[must_use]
    pub const fn should_apply(&self, sender: PeerIndex, object: &NetworkObject, trust: TrustRule) -> bool {
        !self.may_write(object) && trust.trusts(sender, object)
    }
}

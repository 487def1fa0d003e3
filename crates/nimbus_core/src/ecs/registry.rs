//! # Component Registry
//!
//! Name and json id lookup for registered components. The registry is an
//! explicit service: worlds share a handle to it, and [`ComponentRegistry::reset`]
//! clears it for test isolation or full engine shutdown.
//!
//! A reset starts a new epoch. Indices restart at zero, so kinds and worlds
//! from different epochs refuse to mix instead of aliasing each other's
//! state tables.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use super::definition::ComponentDefinition;
use crate::error::{EcsError, EcsResult};

/// A registered component: its bit index plus its definition.
#[derive(Clone)]
pub struct ComponentKind {
    index: usize,
    epoch: u64,
    definition: Arc<ComponentDefinition>,
}

impl ComponentKind {
    /// Bit index in membership sets.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Registry epoch the kind was registered in.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The shared definition.
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &Arc<ComponentDefinition> {
        &self.definition
    }
}

impl Deref for ComponentKind {
    type Target = ComponentDefinition;

    fn deref(&self) -> &Self::Target {
        &self.definition
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.epoch == other.epoch && Arc::ptr_eq(&self.definition, &other.definition)
    }
}

impl Eq for ComponentKind {}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKind")
            .field("index", &self.index)
            .field("name", &self.definition.name())
            .finish()
    }
}

#[derive(Default)]
struct RegistryInner {
    epoch: u64,
    kinds: Vec<ComponentKind>,
    by_name: HashMap<String, usize>,
    by_json_id: HashMap<String, usize>,
}

/// Shared handle to the set of registered components.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition and assigns it the next bit index.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if the name or json id is
    /// already taken.
    pub fn register(&self, definition: ComponentDefinition) -> EcsResult<ComponentKind> {
        let mut inner = self.inner.write();

        if inner.by_name.contains_key(definition.name()) {
            return Err(EcsError::DuplicateComponent(definition.name().to_string()));
        }
        if let Some(json_id) = definition.json_id() {
            if inner.by_json_id.contains_key(json_id) {
                return Err(EcsError::DuplicateComponent(json_id.to_string()));
            }
        }

        let index = inner.kinds.len();
        let kind = ComponentKind {
            index,
            epoch: inner.epoch,
            definition: Arc::new(definition),
        };
        inner.by_name.insert(kind.name().to_string(), index);
        if let Some(json_id) = kind.json_id() {
            inner.by_json_id.insert(json_id.to_string(), index);
        }
        inner.kinds.push(kind.clone());

        tracing::trace!(component = kind.name(), index, "component registered");
        Ok(kind)
    }

    /// Looks up a component by name.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentKind> {
        let inner = self.inner.read();
        inner
            .by_name
            .get(name)
            .and_then(|&index| inner.kinds.get(index))
            .cloned()
    }

    /// Looks up a component by json id.
    #[must_use]
    pub fn lookup_by_json_id(&self, json_id: &str) -> Option<ComponentKind> {
        let inner = self.inner.read();
        inner
            .by_json_id
            .get(json_id)
            .and_then(|&index| inner.kinds.get(index))
            .cloned()
    }

    /// Looks up a component by json id, failing when unknown.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`].
    pub fn require_json_id(&self, json_id: &str) -> EcsResult<ComponentKind> {
        self.lookup_by_json_id(json_id)
            .ok_or_else(|| EcsError::UnknownComponent(json_id.to_string()))
    }

    /// Component at a bit index.
    #[must_use]
    pub fn kind_at(&self, index: usize) -> Option<ComponentKind> {
        self.inner.read().kinds.get(index).cloned()
    }

    /// All registered components in index order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.inner.read().kinds.clone()
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().kinds.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().kinds.is_empty()
    }

    /// Current epoch; bumped by every [`ComponentRegistry::reset`].
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.read().epoch
    }

    /// Forgets every registration and starts a new epoch. Worlds built
    /// before the reset reject kinds registered after it, so rebuild them.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.kinds.clear();
        inner.by_name.clear();
        inner.by_json_id.clear();
        inner.epoch += 1;
        tracing::debug!(epoch = inner.epoch, "component registry reset");
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("kinds", &self.inner.read().kinds)
            .finish()
    }
}

//! # Component Storage
//!
//! Dense component storage indexed by entity index.
//!
//! Slots grow to the highest index ever written and gaps are default-filled,
//! so a presence bitset tells live slots apart.

use std::any::Any;

use super::bitset::BitSet;
use super::component::Component;

/// Dense storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - the stored Pod component
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Position> = ComponentStorage::with_capacity(1024);
/// storage.set(0, Position::new(1.0, 2.0, 3.0));
/// ```
pub struct ComponentStorage<C: Component> {
    /// One slot per entity index.
    data: Vec<C>,
    /// Which slots hold a live component.
    present: BitSet,
}

impl<C: Component> Default for ComponentStorage<C> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<C: Component> ComponentStorage<C> {
    /// Creates empty storage with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            present: BitSet::with_capacity(capacity),
        }
    }

    /// Number of live slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.present.len()
    }

    /// Whether no slot is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Whether the slot at `index` is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.present.contains(index)
    }

    /// Gets a live component by entity index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        if self.present.contains(index) {
            self.data.get(index)
        } else {
            None
        }
    }

    /// Gets a mutable live component by entity index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        if self.present.contains(index) {
            self.data.get_mut(index)
        } else {
            None
        }
    }

    /// Sets a component at the specified index, growing the column as needed.
    ///
    /// Returns the previous live value.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> Option<C> {
        if index >= self.data.len() {
            self.data.resize(index + 1, C::default());
        }
        let previous = self.present.contains(index).then(|| self.data[index]);
        self.data[index] = component;
        self.present.insert(index);
        previous
    }

    /// Removes the component at `index`, resetting the slot to its default.
    #[inline]
    pub fn remove(&mut self, index: usize) -> Option<C> {
        if !self.present.remove(index) {
            return None;
        }
        self.data
            .get_mut(index)
            .map(|slot| std::mem::take(slot))
    }

    /// Raw slice, including default-filled gaps.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Iterates over live components with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.present
            .iter()
            .filter_map(|index| self.data.get(index).map(|component| (index, component)))
    }

    /// Drops every component and resets presence.
    pub fn clear(&mut self) {
        for slot in &mut self.data {
            *slot = C::default();
        }
        self.present.clear();
    }
}

/// Type-erased handle to a column, so the world can reset slots on despawn.
pub(crate) trait DenseColumn: Send + Sync {
    fn remove_index(&mut self, index: usize);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> DenseColumn for ComponentStorage<C> {
    fn remove_index(&mut self, index: usize) {
        self.remove(index);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Position, Rotation};

    #[test]
    fn test_storage_get_set() {
        let mut storage: ComponentStorage<Position> = ComponentStorage::with_capacity(100);

        let pos = Position::new(1.0, 2.0, 3.0);
        assert!(storage.set(50, pos).is_none());

        assert_eq!(*storage.get(50).unwrap(), pos);
        assert!(storage.get(49).is_none());
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_storage_remove_resets_slot() {
        let mut storage: ComponentStorage<Rotation> = ComponentStorage::default();
        storage.set(3, Rotation::new(0.0, 1.0, 0.0, 0.0));
        assert!(storage.remove(3).is_some());
        assert!(storage.remove(3).is_none());
        assert_eq!(storage.as_slice()[3], Rotation::IDENTITY);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_storage_iter_skips_gaps() {
        let mut storage: ComponentStorage<Position> = ComponentStorage::default();
        storage.set(0, Position::new(1.0, 0.0, 0.0));
        storage.set(7, Position::new(7.0, 0.0, 0.0));
        let indices: Vec<usize> = storage.iter().map(|(index, _)| index).collect();
        assert_eq!(indices, vec![0, 7]);
    }
}

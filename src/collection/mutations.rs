use std::fmt;
use std::marker::PhantomData;

use super::{HasStatus, LocalMutation, MutationKey, Positioned, Rollback};
use crate::error::StoreError;
use crate::reorder::{arrange_by_ids, move_item};

/// Sets one record's status, remembering the previous value.
pub struct StatusChange<T: HasStatus> {
    id: T::Id,
    target: T::Status,
    _entity: PhantomData<fn() -> T>,
}

impl<T: HasStatus> StatusChange<T> {
    pub fn new(id: T::Id, target: T::Status) -> Self {
        Self {
            id,
            target,
            _entity: PhantomData,
        }
    }
}

impl<T: HasStatus> fmt::Debug for StatusChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusChange")
            .field("id", &self.id)
            .field("target", &self.target)
            .finish()
    }
}

impl<T: HasStatus> LocalMutation<T> for StatusChange<T> {
    fn key(&self) -> MutationKey<T::Id> {
        MutationKey::Entity(self.id.clone())
    }

    fn apply(&self, items: &mut Vec<T>) -> Result<Rollback<T>, StoreError> {
        let item = items
            .iter_mut()
            .find(|item| item.id() == &self.id)
            .ok_or_else(|| StoreError::NotFound(self.id.to_string()))?;
        let previous = item.status();
        item.set_status(self.target);

        let id = self.id.clone();
        Ok(Box::new(move |items: &mut Vec<T>| {
            // The record may have been removed meanwhile; nothing to restore then.
            if let Some(item) = items.iter_mut().find(|item| item.id() == &id) {
                item.set_status(previous);
            }
        }))
    }

    fn describe(&self) -> String {
        format!("{} -> {}", self.id, self.target)
    }
}

/// Moves one record from `from` to `to`; rolling back restores the previous id order.
///
/// Positions are renumbered after every move and after a rollback.
pub struct Reorder<T: Positioned> {
    from: usize,
    to: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Positioned> Reorder<T> {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            _entity: PhantomData,
        }
    }
}

impl<T: Positioned> fmt::Debug for Reorder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reorder").field("from", &self.from).field("to", &self.to).finish()
    }
}

impl<T: Positioned> LocalMutation<T> for Reorder<T> {
    fn key(&self) -> MutationKey<T::Id> {
        MutationKey::Ordering
    }

    fn apply(&self, items: &mut Vec<T>) -> Result<Rollback<T>, StoreError> {
        let previous: Vec<T::Id> = items.iter().map(|item| item.id().clone()).collect();
        move_item(items, self.from, self.to)?;
        renumber(items);
        Ok(Box::new(move |items: &mut Vec<T>| {
            arrange_by_ids(items, &previous);
            renumber(items);
        }))
    }

    fn describe(&self) -> String {
        format!("move {} -> {}", self.from, self.to)
    }
}

fn renumber<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index + 1);
    }
}

//! Locally held record collections.
//!
//! Each page-level list (orders, vendors, menu items, banners) is owned by a
//! [`CollectionActor`] task. All reads and writes go through its
//! [`CollectionClient`], so local state is only ever touched from one place,
//! the same way a UI event loop owns its component state.
//!
//! Optimistic writes are expressed as [`LocalMutation`]s. Applying one
//! registers a pending entry keyed by [`MutationKey`]; a second mutation for
//! the same key is rejected until the first is settled.

mod actor;
mod client;
mod mutations;

use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use tokio::sync::oneshot;

use crate::error::StoreError;

pub use actor::CollectionActor;
pub use client::CollectionClient;
pub use mutations::{Reorder, StatusChange};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// A record that can live in a collection.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    fn id(&self) -> &Self::Id;
}

/// A record carrying exactly one status from a fixed enumeration.
pub trait HasStatus: Entity {
    type Status: Copy + Eq + Send + Sync + Display + Debug + 'static;

    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
}

/// A record whose place in the list is also stored on the record.
pub trait Positioned: Entity {
    /// `position` is 1-based.
    fn set_position(&mut self, position: usize);
}

/// Identifies what a mutation touches. At most one mutation per key may be in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationKey<Id> {
    /// A single record.
    Entity(Id),
    /// The order of the whole list.
    Ordering,
}

impl<Id: Display> Display for MutationKey<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKey::Entity(id) => write!(f, "{}", id),
            MutationKey::Ordering => f.write_str("list order"),
        }
    }
}

/// Handle for one pending mutation. Settling with a stale token is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationToken(pub(crate) u64);

/// Undoes a previously applied mutation.
pub type Rollback<T> = Box<dyn FnOnce(&mut Vec<T>) + Send>;

/// A local edit that can be applied optimistically and undone later.
pub trait LocalMutation<T: Entity>: Debug + Send + 'static {
    fn key(&self) -> MutationKey<T::Id>;

    /// Edit `items` in place and return how to undo the edit.
    fn apply(&self, items: &mut Vec<T>) -> Result<Rollback<T>, StoreError>;

    fn describe(&self) -> String;
}

/// How a pending mutation ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Confirm,
    Rollback,
}

// =============================================================================
// 2. THE MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum CollectionRequest<T: Entity> {
    /// Replace the contents with freshly fetched records.
    Replace {
        items: Vec<T>,
        respond_to: Response<()>,
    },
    Snapshot {
        respond_to: Response<Vec<T>>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Upsert {
        item: T,
        respond_to: Response<()>,
    },
    Remove {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Apply {
        mutation: Box<dyn LocalMutation<T>>,
        respond_to: Response<MutationToken>,
    },
    Settle {
        key: MutationKey<T::Id>,
        token: MutationToken,
        outcome: Outcome,
        respond_to: Response<bool>,
    },
    Pending {
        respond_to: Response<Vec<MutationKey<T::Id>>>,
    },
}

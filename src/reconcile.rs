//! Optimistic mutation with confirm-or-rollback.
//!
//! Every optimistic write in the crate goes through [`Optimistic`]: apply the
//! local change, await the backend, then either confirm (keep the change and
//! notify success) or roll back (restore the captured value and notify the
//! failure reason).

use std::future::Future;

use tracing::{debug, error, info, instrument, warn};

use crate::collection::{
    CollectionClient, Entity, LocalMutation, MutationKey, MutationToken, Outcome,
};
use crate::error::{ApiError, BoardError};
use crate::notify::Notifier;

pub struct Optimistic<T: Entity> {
    collection: CollectionClient<T>,
    notifier: Notifier,
}

impl<T: Entity> Clone for Optimistic<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<T: Entity> Optimistic<T> {
    pub fn new(collection: CollectionClient<T>, notifier: Notifier) -> Self {
        Self { collection, notifier }
    }

    /// Applies `mutation`, then awaits `confirm`.
    ///
    /// `confirm` must be lazy (an `async` block or an un-polled future): it is
    /// first polled only after the local change has been applied.
    pub async fn run<M, F, R>(
        &self,
        mutation: M,
        confirm: F,
        success: impl Into<String>,
    ) -> Result<R, BoardError>
    where
        M: LocalMutation<T>,
        F: Future<Output = Result<R, ApiError>>,
    {
        self.run_with(mutation, move |_| confirm, success).await
    }

    /// Like [`run`](Self::run), but builds the confirming call from the
    /// collection as it looks right after the local change.
    ///
    /// Dropping the returned future after the change was applied rolls it back.
    #[instrument(name = "optimistic", skip_all, fields(mutation = %mutation.describe()))]
    pub async fn run_with<M, F, R>(
        &self,
        mutation: M,
        confirm: impl FnOnce(Vec<T>) -> F,
        success: impl Into<String>,
    ) -> Result<R, BoardError>
    where
        M: LocalMutation<T>,
        F: Future<Output = Result<R, ApiError>>,
    {
        let key = mutation.key();
        let token = match self.collection.apply(mutation).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Local change rejected");
                self.notifier.error(e.to_string());
                return Err(e.into());
            }
        };
        let mut pending = PendingGuard::new(&self.collection, key, token);

        let confirm = match self.collection.snapshot().await {
            Ok(snapshot) => confirm(snapshot),
            Err(e) => {
                error!(error = %e, "Collection unavailable after apply");
                pending.settle(Outcome::Rollback).await;
                self.notifier.error(e.to_string());
                return Err(e.into());
            }
        };

        debug!("Awaiting confirmation");
        match confirm.await {
            Ok(value) => {
                pending.settle(Outcome::Confirm).await;
                info!("Change confirmed");
                self.notifier.success(success);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Confirmation failed, rolling back");
                pending.settle(Outcome::Rollback).await;
                self.notifier.error(e.to_string());
                Err(e.into())
            }
        }
    }
}

/// An applied mutation that has not been settled yet.
///
/// Rolls the mutation back on drop unless [`settle`](Self::settle) ran first.
struct PendingGuard<'a, T: Entity> {
    collection: &'a CollectionClient<T>,
    key: MutationKey<T::Id>,
    token: MutationToken,
    settled: bool,
}

impl<'a, T: Entity> PendingGuard<'a, T> {
    fn new(
        collection: &'a CollectionClient<T>,
        key: MutationKey<T::Id>,
        token: MutationToken,
    ) -> Self {
        Self {
            collection,
            key,
            token,
            settled: false,
        }
    }

    /// Errors are logged, not returned.
    async fn settle(&mut self, outcome: Outcome) {
        if let Err(e) = self.collection.settle(self.key.clone(), self.token, outcome).await {
            error!(error = %e, ?outcome, "Could not settle mutation");
        }
        self.settled = true;
    }
}

impl<T: Entity> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(key = %self.key, "Mutation abandoned before confirmation, rolling back");
            self.collection.settle_detached(self.key.clone(), self.token, Outcome::Rollback);
        }
    }
}

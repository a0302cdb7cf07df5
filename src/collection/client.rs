use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

use super::{
    CollectionRequest, Entity, LocalMutation, MutationKey, MutationToken, Outcome, Response,
};
use crate::error::StoreError;

/// Cloneable handle to a [`CollectionActor`](super::CollectionActor).
pub struct CollectionClient<T: Entity> {
    sender: mpsc::Sender<CollectionRequest<T>>,
}

impl<T: Entity> Clone for CollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Entity> CollectionClient<T> {
    pub fn new(sender: mpsc::Sender<CollectionRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R>) -> CollectionRequest<T>,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::ActorCommunicationError("Actor dropped".to_string()))?
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn replace(&self, items: Vec<T>) -> Result<(), StoreError> {
        debug!("Sending request");
        self.call(|respond_to| CollectionRequest::Replace { items, respond_to }).await
    }

    pub async fn snapshot(&self) -> Result<Vec<T>, StoreError> {
        self.call(|respond_to| CollectionRequest::Snapshot { respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.call(|respond_to| CollectionRequest::Get { id, respond_to }).await
    }

    #[instrument(skip(self, item), fields(id = %item.id()))]
    pub async fn upsert(&self, item: T) -> Result<(), StoreError> {
        debug!("Sending request");
        self.call(|respond_to| CollectionRequest::Upsert { item, respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| CollectionRequest::Remove { id, respond_to }).await
    }

    /// Applies `mutation` locally. The change is visible to every later
    /// request on this collection once this returns.
    #[instrument(skip(self, mutation), fields(mutation = %mutation.describe()))]
    pub async fn apply(
        &self,
        mutation: impl LocalMutation<T>,
    ) -> Result<MutationToken, StoreError> {
        debug!("Sending request");
        let mutation: Box<dyn LocalMutation<T>> = Box::new(mutation);
        self.call(|respond_to| CollectionRequest::Apply { mutation, respond_to }).await
    }

    /// Returns `false` if the token no longer matches a pending mutation.
    #[instrument(skip(self, token))]
    pub async fn settle(
        &self,
        key: MutationKey<T::Id>,
        token: MutationToken,
        outcome: Outcome,
    ) -> Result<bool, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| CollectionRequest::Settle {
            key,
            token,
            outcome,
            respond_to,
        })
        .await
    }

    /// Queues a settle without waiting for the reply. Usable from `Drop`.
    ///
    /// Falls back to a spawned send when the inbox is full.
    pub fn settle_detached(
        &self,
        key: MutationKey<T::Id>,
        token: MutationToken,
        outcome: Outcome,
    ) {
        let (respond_to, _) = oneshot::channel();
        let request = CollectionRequest::Settle {
            key,
            token,
            outcome,
            respond_to,
        };
        match self.sender.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let sender = self.sender.clone();
                    runtime.spawn(async move {
                        let _ = sender.send(request).await;
                    });
                }
                Err(_) => warn!("No runtime to deliver settle, mutation stays pending"),
            },
            Err(TrySendError::Closed(_)) => debug!("Collection closed, nothing to settle"),
        }
    }

    pub async fn pending(&self) -> Result<Vec<MutationKey<T::Id>>, StoreError> {
        self.call(|respond_to| CollectionRequest::Pending { respond_to }).await
    }
}

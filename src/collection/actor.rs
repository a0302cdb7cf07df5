use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{
    CollectionClient, CollectionRequest, Entity, LocalMutation, MutationKey, MutationToken,
    Outcome, Response, Rollback,
};
use crate::error::StoreError;
use crate::reorder::arrange_by_ids;

struct PendingMutation<T> {
    token: MutationToken,
    rollback: Rollback<T>,
    description: String,
}

/// Owns one ordered list of records and the bookkeeping for in-flight mutations.
pub struct CollectionActor<T: Entity> {
    name: &'static str,
    receiver: mpsc::Receiver<CollectionRequest<T>>,
    items: Vec<T>,
    pending: HashMap<MutationKey<T::Id>, PendingMutation<T>>,
    next_token: u64,
}

impl<T: Entity> CollectionActor<T> {
    pub fn new(name: &'static str, buffer_size: usize) -> (Self, CollectionClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            name,
            receiver,
            items: Vec::new(),
            pending: HashMap::new(),
            next_token: 1,
        };
        (actor, CollectionClient::new(sender))
    }

    /// Runs until every client has been dropped.
    #[instrument(name = "collection_actor", fields(collection = self.name), skip(self))]
    pub async fn run(mut self) {
        info!("Collection starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CollectionRequest::Replace { items, respond_to } => {
                    self.handle_replace(items);
                    let _ = respond_to.send(Ok(()));
                }
                CollectionRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(Ok(self.items.clone()));
                }
                CollectionRequest::Get { id, respond_to } => {
                    let item = self.items.iter().find(|item| item.id() == &id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                CollectionRequest::Upsert { item, respond_to } => {
                    self.handle_upsert(item);
                    let _ = respond_to.send(Ok(()));
                }
                CollectionRequest::Remove { id, respond_to } => {
                    let removed = self
                        .items
                        .iter()
                        .position(|item| item.id() == &id)
                        .map(|index| self.items.remove(index));
                    let _ = respond_to.send(Ok(removed));
                }
                CollectionRequest::Apply { mutation, respond_to } => {
                    self.handle_apply(mutation, respond_to);
                }
                CollectionRequest::Settle { key, token, outcome, respond_to } => {
                    let settled = self.handle_settle(key, token, outcome);
                    let _ = respond_to.send(Ok(settled));
                }
                CollectionRequest::Pending { respond_to } => {
                    let _ = respond_to.send(Ok(self.pending.keys().cloned().collect()));
                }
            }
        }
        info!(pending = self.pending.len(), "Collection stopped");
    }

    /// Fetched data wins, except for records (and list order) with a pending
    /// mutation, which keep their local version until settled.
    fn handle_replace(&mut self, incoming: Vec<T>) {
        let previous_order: Vec<T::Id> = self.items.iter().map(|item| item.id().clone()).collect();
        let mut local: HashMap<T::Id, T> =
            self.items.drain(..).map(|item| (item.id().clone(), item)).collect();

        let mut kept = 0usize;
        let mut merged: Vec<T> = incoming
            .into_iter()
            .map(|item| {
                let key = MutationKey::Entity(item.id().clone());
                if self.pending.contains_key(&key) {
                    if let Some(local_item) = local.remove(item.id()) {
                        kept += 1;
                        return local_item;
                    }
                }
                item
            })
            .collect();

        if self.pending.contains_key(&MutationKey::Ordering) {
            arrange_by_ids(&mut merged, &previous_order);
        }

        debug!(count = merged.len(), kept_local = kept, "Collection replaced");
        self.items = merged;
    }

    fn handle_upsert(&mut self, item: T) {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    #[instrument(fields(mutation = %mutation.describe()), skip(self, mutation, respond_to))]
    fn handle_apply(
        &mut self,
        mutation: Box<dyn LocalMutation<T>>,
        respond_to: Response<MutationToken>,
    ) {
        let key = mutation.key();
        if let Some(pending) = self.pending.get(&key) {
            warn!(in_flight = %pending.description, "Rejected: mutation already in flight");
            let _ = respond_to.send(Err(StoreError::MutationInFlight(key.to_string())));
            return;
        }

        match mutation.apply(&mut self.items) {
            Ok(rollback) => {
                let token = MutationToken(self.next_token);
                self.next_token += 1;
                self.pending.insert(
                    key,
                    PendingMutation {
                        token,
                        rollback,
                        description: mutation.describe(),
                    },
                );
                debug!("Applied optimistically");
                let _ = respond_to.send(Ok(token));
            }
            Err(e) => {
                warn!(error = %e, "Mutation could not be applied");
                let _ = respond_to.send(Err(e));
            }
        }
    }

    fn handle_settle(
        &mut self,
        key: MutationKey<T::Id>,
        token: MutationToken,
        outcome: Outcome,
    ) -> bool {
        match self.pending.get(&key) {
            Some(pending) if pending.token == token => {}
            _ => {
                debug!(key = %key, "Ignoring settle for stale or unknown mutation");
                return false;
            }
        }

        let Some(pending) = self.pending.remove(&key) else {
            return false;
        };
        match outcome {
            Outcome::Confirm => debug!(mutation = %pending.description, "Mutation confirmed"),
            Outcome::Rollback => {
                warn!(mutation = %pending.description, "Rolling back mutation");
                (pending.rollback)(&mut self.items);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Reorder, StatusChange};
    use crate::domain::{Banner, Order, OrderStatus};
    use crate::mock_framework::sample_order;

    fn start<T: Entity>() -> CollectionClient<T> {
        let (actor, client) = CollectionActor::new("test", 8);
        tokio::spawn(actor.run());
        client
    }

    async fn status_of(client: &CollectionClient<Order>, id: &str) -> OrderStatus {
        client.get(id.to_string()).await.unwrap().unwrap().status
    }

    fn orders() -> Vec<Order> {
        vec![
            sample_order("o1", "Ada", "Pho Place", 12.0, OrderStatus::Placed),
            sample_order("o2", "Bob", "Pho Place", 30.0, OrderStatus::Accepted),
        ]
    }

    #[tokio::test]
    async fn test_apply_then_rollback_restores_status() {
        let client = start::<Order>();
        client.replace(orders()).await.unwrap();

        let change = StatusChange::<Order>::new("o1".to_string(), OrderStatus::Accepted);
        let key = change.key();
        let token = client.apply(change).await.unwrap();
        assert_eq!(status_of(&client, "o1").await, OrderStatus::Accepted);

        assert!(client.settle(key, token, Outcome::Rollback).await.unwrap());
        assert_eq!(status_of(&client, "o1").await, OrderStatus::Placed);
        assert!(client.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_mutation_on_same_key_is_rejected() {
        let client = start::<Order>();
        client.replace(orders()).await.unwrap();

        client
            .apply(StatusChange::<Order>::new("o1".to_string(), OrderStatus::Accepted))
            .await
            .unwrap();
        let second = client
            .apply(StatusChange::<Order>::new("o1".to_string(), OrderStatus::Cancelled))
            .await;
        assert_eq!(second, Err(StoreError::MutationInFlight("o1".to_string())));
        assert_eq!(status_of(&client, "o1").await, OrderStatus::Accepted);

        // Other keys are independent.
        assert!(client
            .apply(StatusChange::<Order>::new("o2".to_string(), OrderStatus::Preparing))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_stale_token_is_ignored() {
        let client = start::<Order>();
        client.replace(orders()).await.unwrap();

        let change = StatusChange::<Order>::new("o1".to_string(), OrderStatus::Accepted);
        let key = change.key();
        let first = client.apply(change).await.unwrap();
        client.settle(key.clone(), first, Outcome::Confirm).await.unwrap();

        let token = client
            .apply(StatusChange::<Order>::new("o1".to_string(), OrderStatus::Preparing))
            .await
            .unwrap();
        assert!(!client.settle(key.clone(), first, Outcome::Rollback).await.unwrap());
        assert_eq!(status_of(&client, "o1").await, OrderStatus::Preparing);
        assert!(client.settle(key, token, Outcome::Confirm).await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_keeps_pending_local_state() {
        let client = start::<Order>();
        client.replace(orders()).await.unwrap();
        client
            .apply(StatusChange::<Order>::new("o1".to_string(), OrderStatus::Accepted))
            .await
            .unwrap();

        let mut fetched = orders();
        fetched[1].status = OrderStatus::Ready;
        fetched.push(sample_order("o3", "Cy", "Taco Stand", 9.0, OrderStatus::Placed));
        client.replace(fetched).await.unwrap();

        let snapshot = client.snapshot().await.unwrap();
        let statuses: Vec<_> = snapshot.iter().map(|o| (o.id.as_str(), o.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("o1", OrderStatus::Accepted),
                ("o2", OrderStatus::Ready),
                ("o3", OrderStatus::Placed),
            ]
        );
    }

    #[tokio::test]
    async fn test_reorder_rollback_restores_previous_order() {
        let client = start::<Banner>();
        client
            .replace(vec![
                Banner::new("a", "A", 0),
                Banner::new("b", "B", 1),
                Banner::new("c", "C", 2),
            ])
            .await
            .unwrap();

        let reorder = Reorder::<Banner>::new(0, 2);
        let key = reorder.key();
        let token = client.apply(reorder).await.unwrap();
        let ids: Vec<_> = client.snapshot().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        client.settle(key, token, Outcome::Rollback).await.unwrap();
        let ids: Vec<_> = client.snapshot().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_apply_unknown_record_fails_without_pending_entry() {
        let client = start::<Order>();
        client.replace(orders()).await.unwrap();
        let result = client
            .apply(StatusChange::<Order>::new("missing".to_string(), OrderStatus::Accepted))
            .await;
        assert_eq!(result, Err(StoreError::NotFound("missing".to_string())));
        assert!(client.pending().await.unwrap().is_empty());
    }
}

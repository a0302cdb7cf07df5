use std::sync::Arc;

use tracing::{info, instrument};

use super::report;
use crate::api::{ConsoleBackend, OrderScope};
use crate::auth::{AuthContext, Role};
use crate::collection::{CollectionClient, StatusChange};
use crate::domain::{Order, OrderStatus};
use crate::error::{ApiError, BoardError, StoreError};
use crate::notify::Notifier;
use crate::reconcile::Optimistic;

/// Orders page. Vendors see their own orders, admins see all of them.
#[derive(Clone)]
pub struct OrderBoard {
    backend: Arc<dyn ConsoleBackend>,
    auth: AuthContext,
    orders: CollectionClient<Order>,
    optimistic: Optimistic<Order>,
    notifier: Notifier,
}

impl_board_reads!(OrderBoard, Order, orders, order, view);

impl OrderBoard {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        auth: AuthContext,
        orders: CollectionClient<Order>,
        notifier: Notifier,
    ) -> Self {
        let optimistic = Optimistic::new(orders.clone(), notifier.clone());
        Self {
            backend,
            auth,
            orders,
            optimistic,
            notifier,
        }
    }

    fn scope(&self) -> Result<OrderScope, ApiError> {
        let session = self.auth.session().ok_or(ApiError::Unauthenticated)?;
        match (session.role, session.vendor_id) {
            (Role::Admin, _) => Ok(OrderScope::All),
            (Role::Vendor, Some(vendor_id)) => Ok(OrderScope::Vendor(vendor_id)),
            (Role::Vendor, None) => {
                Err(ApiError::Forbidden("Vendor account has no vendor id".to_string()))
            }
        }
    }

    /// Fetches orders and merges them into the local list. Returns the number fetched.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        self.fetch().await.map_err(|e| report(&self.notifier, "refresh orders", e))
    }

    /// Refresh without the error notification, for background polling.
    pub(crate) async fn fetch(&self) -> Result<usize, BoardError> {
        let scope = self.scope()?;
        let orders = self.backend.list_orders(&scope).await?;
        let count = orders.len();
        self.orders.replace(orders).await?;
        info!(count, "Orders refreshed");
        Ok(count)
    }

    /// Shows `status` immediately and rolls back if the backend rejects it.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn transition(&self, id: &str, status: OrderStatus) -> Result<(), BoardError> {
        let backend = Arc::clone(&self.backend);
        let order_id = id.to_string();
        self.optimistic
            .run(
                StatusChange::<Order>::new(id.to_string(), status),
                async move { backend.update_order_status(&order_id, status).await },
                format!("Order {} is now {}", id, status),
            )
            .await
    }

    /// Moves the order one step along its lifecycle.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn advance(&self, id: &str) -> Result<OrderStatus, BoardError> {
        let current = self.current_status(id).await?;
        let Some(next) = current.next() else {
            return Err(report(
                &self.notifier,
                "advance order",
                BoardError::InvalidTransition {
                    from: current.to_string(),
                    to: "a later status".to_string(),
                },
            ));
        };
        self.transition(id, next).await?;
        Ok(next)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel(&self, id: &str) -> Result<(), BoardError> {
        let current = self.current_status(id).await?;
        if current.is_terminal() {
            return Err(report(
                &self.notifier,
                "cancel order",
                BoardError::InvalidTransition {
                    from: current.to_string(),
                    to: OrderStatus::Cancelled.to_string(),
                },
            ));
        }
        self.transition(id, OrderStatus::Cancelled).await
    }

    async fn current_status(&self, id: &str) -> Result<OrderStatus, BoardError> {
        match self.orders.get(id.to_string()).await {
            Ok(Some(order)) => Ok(order.status),
            Ok(None) => {
                Err(report(&self.notifier, "load order", StoreError::NotFound(id.to_string())))
            }
            Err(e) => Err(report(&self.notifier, "load order", e)),
        }
    }
}

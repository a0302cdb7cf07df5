//! # Mock Framework
//!
//! Test doubles for the two seams of the crate.
//!
//! - [`create_mock_collection`] returns a collection client plus the raw
//!   request receiver, so a test can play the collection actor itself with
//!   [`expect_apply`], [`expect_settle`] and friends.
//! - [`FakeBackend`] implements [`ConsoleBackend`] in memory. Calls can be
//!   scripted to fail ([`FakeBackend::fail_next`]) or held open
//!   ([`FakeBackend::gate`]) so a test can look at optimistic state before the
//!   backend answers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveTime, Utc, Weekday};
use tokio::sync::{mpsc, oneshot};

use crate::api::{
    AnalyticsSummary, Attachment, ConsoleBackend, MenuItemInput, MultipartForm, OrderScope,
    PlatformSettings,
};
use crate::auth::{IdToken, IdentityProvider, Role, Session};
use crate::collection::{
    CollectionClient, CollectionRequest, Entity, LocalMutation, MutationKey, MutationToken,
    Outcome,
};
use crate::domain::{
    Banner, Category, DocumentRef, MenuItem, Order, OrderStatus, Vendor, VendorStatus,
};
use crate::error::{ApiError, AuthError, StoreError};
use crate::wizard::{DayHours, RegistrationDraft};

// =============================================================================
// COLLECTION MOCKS
// =============================================================================

/// Creates a collection client whose requests arrive on the returned receiver
/// instead of at a real actor.
pub fn create_mock_collection<T: Entity>(
    buffer_size: usize,
) -> (CollectionClient<T>, mpsc::Receiver<CollectionRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CollectionClient::new(sender), receiver)
}

/// Helper to verify that the next message is an Apply request
pub async fn expect_apply<T: Entity>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<(Box<dyn LocalMutation<T>>, oneshot::Sender<Result<MutationToken, StoreError>>)> {
    match receiver.recv().await {
        Some(CollectionRequest::Apply { mutation, respond_to }) => Some((mutation, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Snapshot request
pub async fn expect_snapshot<T: Entity>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<oneshot::Sender<Result<Vec<T>, StoreError>>> {
    match receiver.recv().await {
        Some(CollectionRequest::Snapshot { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is a Settle request
pub async fn expect_settle<T: Entity>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<(
    MutationKey<T::Id>,
    MutationToken,
    Outcome,
    oneshot::Sender<Result<bool, StoreError>>,
)> {
    match receiver.recv().await {
        Some(CollectionRequest::Settle {
            key,
            token,
            outcome,
            respond_to,
        }) => Some((key, token, outcome, respond_to)),
        _ => None,
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

/// A session as the backend would return it. Vendor sessions use `uid` as vendor id.
pub fn session(uid: &str, role: Role) -> Session {
    Session {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        display_name: None,
        role,
        vendor_id: (role == Role::Vendor).then(|| uid.to_string()),
        verified_at: Utc::now(),
    }
}

/// An order created now. Customer and vendor ids are the lowercased names.
pub fn sample_order(
    id: &str,
    customer: &str,
    vendor: &str,
    total: f64,
    status: OrderStatus,
) -> Order {
    Order {
        id: id.to_string(),
        customer_id: customer.to_lowercase(),
        customer_name: customer.to_string(),
        vendor_id: vendor.to_lowercase(),
        vendor_name: vendor.to_string(),
        items: Vec::new(),
        total,
        status,
        created_at: Utc::now(),
        delivery_address: String::new(),
    }
}

pub fn token_expiring_in(token: &str, secs: i64) -> IdToken {
    IdToken::new(token, "refresh-token", secs)
}

/// A registration draft that passes every step.
pub fn complete_draft() -> RegistrationDraft {
    let mut draft = RegistrationDraft::default();
    draft.business.business_name = "Pho Place".to_string();
    draft.business.owner_name = "Linh Tran".to_string();
    draft.business.email = "owner@pho.example".to_string();
    draft.business.phone = "+1 (555) 010-2030".to_string();
    draft.business.description = "Noodle soups".to_string();
    draft.address.street = "12 Market St".to_string();
    draft.address.city = "Springfield".to_string();
    draft.address.state = "IL".to_string();
    draft.address.postal_code = "62701".to_string();
    draft.service.categories = vec!["vietnamese".to_string(), "noodles".to_string()];
    draft.service.hours = vec![
        DayHours::open(
            Weekday::Mon,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        ),
        DayHours::closed(Weekday::Sun),
    ];
    draft.documents.business_license =
        Some(Attachment::new("licence.pdf", "application/pdf", vec![1; 64]));
    draft.documents.identity_proof = Some(Attachment::new("id.png", "image/png", vec![2; 64]));
    draft
}

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// Accepts any credentials and always issues the same token.
pub struct StaticIdentity {
    token: String,
}

impl StaticIdentity {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<IdToken, AuthError> {
        Ok(token_expiring_in(&self.token, 3600))
    }

    async fn refresh(&self, _token: &IdToken) -> Result<IdToken, AuthError> {
        Ok(token_expiring_in(&self.token, 3600))
    }
}

// =============================================================================
// BACKEND
// =============================================================================

struct Gate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<Result<(), ApiError>>,
}

/// Test side of a gated backend call.
pub struct GateControl {
    started: oneshot::Receiver<()>,
    release: oneshot::Sender<Result<(), ApiError>>,
}

impl GateControl {
    /// Waits until the gated call has been made.
    pub async fn started(&mut self) {
        let _ = (&mut self.started).await;
    }

    pub fn succeed(self) {
        let _ = self.release.send(Ok(()));
    }

    pub fn fail(self, error: ApiError) {
        let _ = self.release.send(Err(error));
    }
}

#[derive(Default)]
struct State {
    session: Option<Session>,
    orders: Vec<Order>,
    vendors: Vec<Vendor>,
    documents: HashMap<String, Vec<DocumentRef>>,
    menu_items: Vec<MenuItem>,
    categories: Vec<Category>,
    banners: Vec<Banner>,
    settings: Option<PlatformSettings>,
    registrations: Vec<MultipartForm>,
    banner_orders: Vec<Vec<String>>,
    failures: HashMap<&'static str, ApiError>,
    gates: HashMap<&'static str, Gate>,
    calls: Vec<&'static str>,
    next_id: u64,
}

/// In-memory [`ConsoleBackend`].
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} not found", what),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_session(self, session: Session) -> Self {
        self.state().session = Some(session);
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.state().orders = orders;
        self
    }

    pub fn with_vendors(self, vendors: Vec<Vendor>) -> Self {
        self.state().vendors = vendors;
        self
    }

    pub fn with_documents(self, vendor_id: &str, documents: Vec<DocumentRef>) -> Self {
        self.state().documents.insert(vendor_id.to_string(), documents);
        self
    }

    pub fn with_menu_items(self, items: Vec<MenuItem>) -> Self {
        self.state().menu_items = items;
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.state().categories = categories;
        self
    }

    pub fn with_banners(self, banners: Vec<Banner>) -> Self {
        self.state().banners = banners;
        self
    }

    /// The next call to `op` fails with `error`.
    pub fn fail_next(&self, op: &'static str, error: ApiError) {
        self.state().failures.insert(op, error);
    }

    /// Holds the next call to `op` open until the returned control releases it.
    pub fn gate(&self, op: &'static str) -> GateControl {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.state().gates.insert(
            op,
            Gate {
                started: started_tx,
                release: release_rx,
            },
        );
        GateControl {
            started: started_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    /// Changes an order behind the console's back.
    pub fn set_order_status(&self, id: &str, status: OrderStatus) {
        if let Some(order) = self.state().orders.iter_mut().find(|o| o.id == id) {
            order.status = status;
        }
    }

    pub fn order_status(&self, id: &str) -> Option<OrderStatus> {
        self.state().orders.iter().find(|o| o.id == id).map(|o| o.status)
    }

    pub fn vendor_reason(&self, id: &str) -> Option<String> {
        self.state()
            .vendors
            .iter()
            .find(|v| v.id == id)
            .and_then(|v| v.rejection_reason.clone())
    }

    pub fn registrations(&self) -> Vec<MultipartForm> {
        self.state().registrations.clone()
    }

    pub fn saved_banner_orders(&self) -> Vec<Vec<String>> {
        self.state().banner_orders.clone()
    }

    /// Records the call, waits on its gate if one is set and returns any scripted failure.
    async fn enter(&self, op: &'static str) -> Result<(), ApiError> {
        let (gate, failure) = {
            let mut state = self.state();
            state.calls.push(op);
            (state.gates.remove(op), state.failures.remove(op))
        };
        if let Some(gate) = gate {
            let _ = gate.started.send(());
            if let Ok(result) = gate.release.await {
                result?;
            }
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }
}

fn item_from(id: String, input: &MenuItemInput) -> MenuItem {
    MenuItem {
        id,
        name: input.name.clone(),
        description: input.description.clone(),
        price: input.price,
        category_id: input.category_id.clone(),
        available: input.available,
        tags: input.tags.clone(),
        preparation_minutes: input.preparation_minutes,
        image_url: input.image_url.clone(),
    }
}

#[async_trait]
impl ConsoleBackend for FakeBackend {
    async fn fetch_session(&self, _id_token: &str) -> Result<Session, ApiError> {
        self.enter("fetch_session").await?;
        self.state().session.clone().ok_or(ApiError::Unauthenticated)
    }

    async fn list_orders(&self, scope: &OrderScope) -> Result<Vec<Order>, ApiError> {
        self.enter("list_orders").await?;
        let state = self.state();
        Ok(match scope {
            OrderScope::All => state.orders.clone(),
            OrderScope::Vendor(vendor_id) => {
                state.orders.iter().filter(|o| &o.vendor_id == vendor_id).cloned().collect()
            }
        })
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), ApiError> {
        self.enter("update_order_status").await?;
        let mut state = self.state();
        let order = state.orders.iter_mut().find(|o| o.id == id).ok_or_else(|| not_found("Order"))?;
        order.status = status;
        Ok(())
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>, ApiError> {
        self.enter("list_vendors").await?;
        Ok(self.state().vendors.clone())
    }

    async fn update_vendor_status(
        &self,
        id: &str,
        status: VendorStatus,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        self.enter("update_vendor_status").await?;
        let mut state = self.state();
        let vendor = state
            .vendors
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| not_found("Vendor"))?;
        vendor.status = status;
        vendor.rejection_reason = reason.map(str::to_string);
        Ok(())
    }

    async fn vendor_documents(&self, id: &str) -> Result<Vec<DocumentRef>, ApiError> {
        self.enter("vendor_documents").await?;
        Ok(self.state().documents.get(id).cloned().unwrap_or_default())
    }

    async fn register_vendor(&self, form: &MultipartForm) -> Result<(), ApiError> {
        self.enter("register_vendor").await?;
        self.state().registrations.push(form.clone());
        Ok(())
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, ApiError> {
        self.enter("list_menu_items").await?;
        Ok(self.state().menu_items.clone())
    }

    async fn create_menu_item(&self, input: &MenuItemInput) -> Result<MenuItem, ApiError> {
        self.enter("create_menu_item").await?;
        let item = item_from(self.next_id("item"), input);
        self.state().menu_items.push(item.clone());
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        id: &str,
        input: &MenuItemInput,
    ) -> Result<MenuItem, ApiError> {
        self.enter("update_menu_item").await?;
        let mut state = self.state();
        let existing = state
            .menu_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Menu item"))?;
        *existing = item_from(id.to_string(), input);
        Ok(existing.clone())
    }

    async fn delete_menu_item(&self, id: &str) -> Result<(), ApiError> {
        self.enter("delete_menu_item").await?;
        self.state().menu_items.retain(|i| i.id != id);
        Ok(())
    }

    async fn set_menu_item_availability(&self, id: &str, available: bool) -> Result<(), ApiError> {
        self.enter("set_menu_item_availability").await?;
        let mut state = self.state();
        let item = state
            .menu_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Menu item"))?;
        item.available = available;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.enter("list_categories").await?;
        Ok(self.state().categories.clone())
    }

    async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        self.enter("create_category").await?;
        let category = Category {
            id: self.next_id("category"),
            name: name.to_string(),
            item_count: 0,
        };
        self.state().categories.push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.enter("delete_category").await?;
        self.state().categories.retain(|c| c.id != id);
        Ok(())
    }

    async fn list_banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.enter("list_banners").await?;
        Ok(self.state().banners.clone())
    }

    async fn save_banner_order(&self, ids: &[String]) -> Result<(), ApiError> {
        self.enter("save_banner_order").await?;
        self.state().banner_orders.push(ids.to_vec());
        Ok(())
    }

    async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError> {
        self.enter("analytics_summary").await?;
        let state = self.state();
        let mut orders_by_status = std::collections::BTreeMap::new();
        for order in &state.orders {
            *orders_by_status.entry(order.status.to_string()).or_insert(0) += 1;
        }
        let count_vendors = |status: VendorStatus| {
            state.vendors.iter().filter(|v| v.status == status).count() as u64
        };
        Ok(AnalyticsSummary {
            total_orders: state.orders.len() as u64,
            total_revenue: state.orders.iter().map(|o| o.total).sum(),
            active_vendors: count_vendors(VendorStatus::Approved),
            pending_vendors: count_vendors(VendorStatus::Pending),
            orders_by_status,
        })
    }

    async fn settings(&self) -> Result<PlatformSettings, ApiError> {
        self.enter("settings").await?;
        Ok(self.state().settings.clone().unwrap_or(PlatformSettings {
            commission_rate: 0.15,
            delivery_fee: 2.99,
            minimum_order: 10.0,
            support_email: "support@example.com".to_string(),
            maintenance_mode: false,
        }))
    }

    async fn update_settings(
        &self,
        settings: &PlatformSettings,
    ) -> Result<PlatformSettings, ApiError> {
        self.enter("update_settings").await?;
        self.state().settings = Some(settings.clone());
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::StatusChange;

    #[tokio::test]
    async fn test_mock_collection() {
        let (client, mut receiver) = create_mock_collection::<Vendor>(10);

        let apply_task = tokio::spawn(async move {
            client
                .apply(StatusChange::<Vendor>::new("v1".to_string(), VendorStatus::Approved))
                .await
        });

        let (mutation, responder) =
            expect_apply(&mut receiver).await.expect("Expected Apply request");
        assert_eq!(mutation.key(), MutationKey::Entity("v1".to_string()));
        assert_eq!(mutation.describe(), "v1 -> approved");
        responder.send(Err(StoreError::NotFound("v1".to_string()))).unwrap();

        let result = apply_task.await.unwrap();
        assert_eq!(result, Err(StoreError::NotFound("v1".to_string())));
    }

    #[tokio::test]
    async fn test_gate_holds_call_until_released() {
        let backend = std::sync::Arc::new(FakeBackend::new().with_orders(vec![sample_order(
            "o1",
            "Ada",
            "Pho Place",
            12.0,
            OrderStatus::Placed,
        )]));
        let mut gate = backend.gate("update_order_status");

        let call = tokio::spawn({
            let backend = backend.clone();
            async move { backend.update_order_status("o1", OrderStatus::Accepted).await }
        });
        gate.started().await;
        assert_eq!(backend.order_status("o1"), Some(OrderStatus::Placed));
        gate.fail(ApiError::Transport("connection reset".to_string()));

        assert_eq!(call.await.unwrap(), Err(ApiError::Transport("connection reset".to_string())));
        assert_eq!(backend.order_status("o1"), Some(OrderStatus::Placed));
        assert_eq!(backend.calls(), vec!["update_order_status"]);
    }
}

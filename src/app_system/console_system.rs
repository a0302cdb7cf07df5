use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::api::{ApiClient, ConsoleBackend};
use crate::auth::{AuthContext, FirebaseIdentity, IdentityProvider, Role, Session, SessionCache};
use crate::boards::{
    AnalyticsBoard, BannerBoard, MenuBoard, OrderBoard, OrderPoller, PollerHandle, SettingsBoard,
    VendorBoard,
};
use crate::collection::{CollectionActor, CollectionClient, Entity};
use crate::config::Config;
use crate::error::{ApiError, AuthError};
use crate::notify::Notifier;

/// Everything one console process needs, wired together.
///
/// Starts one collection actor per board. Boards own the only long-lived
/// clients, so [`shutdown`](Self::shutdown) can drop them and join the actors.
pub struct ConsoleSystem {
    pub auth: AuthContext,
    pub notifier: Notifier,
    pub backend: Arc<dyn ConsoleBackend>,
    pub orders: OrderBoard,
    pub vendors: VendorBoard,
    pub menu: MenuBoard,
    pub banners: BannerBoard,
    pub analytics: AnalyticsBoard,
    pub settings: SettingsBoard,
    poll_interval: Duration,
    poller: Option<PollerHandle>,
    handles: Vec<JoinHandle<()>>,
}

impl ConsoleSystem {
    /// Builds the HTTP backend and identity provider from `config`.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        info!(api = %config.api_base_url, "Starting console system");
        let provider = config
            .identity_api_key
            .as_ref()
            .map(|key| Arc::new(FirebaseIdentity::new(key.clone())) as Arc<dyn IdentityProvider>);
        let cache = SessionCache::new(config.session_cache.clone());
        let auth = AuthContext::new(provider, Some(cache));
        let client =
            ApiClient::new(config.api_base_url.as_str(), config.request_timeout, auth.clone())?;
        let mut system = Self::with_backend(Arc::new(client), auth, config.actor_buffer);
        system.poll_interval = config.poll_interval;
        Ok(system)
    }

    /// Wires the boards over any backend. Polling stays off.
    pub fn with_backend(
        backend: Arc<dyn ConsoleBackend>,
        auth: AuthContext,
        buffer: usize,
    ) -> Self {
        let notifier = Notifier::default();
        let mut handles = Vec::new();

        let orders = spawn_collection("orders", buffer, &mut handles);
        let vendors = spawn_collection("vendors", buffer, &mut handles);
        let items = spawn_collection("menu_items", buffer, &mut handles);
        let categories = spawn_collection("categories", buffer, &mut handles);
        let banners = spawn_collection("banners", buffer, &mut handles);

        Self {
            orders: OrderBoard::new(backend.clone(), auth.clone(), orders, notifier.clone()),
            vendors: VendorBoard::new(backend.clone(), vendors, notifier.clone()),
            menu: MenuBoard::new(backend.clone(), items, categories, notifier.clone()),
            banners: BannerBoard::new(backend.clone(), banners, notifier.clone()),
            analytics: AnalyticsBoard::new(backend.clone(), notifier.clone()),
            settings: SettingsBoard::new(backend.clone(), notifier.clone()),
            auth,
            notifier,
            backend,
            poll_interval: Duration::ZERO,
            poller: None,
            handles,
        }
    }

    /// Signs in for the given console. Order polling starts here if configured.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &mut self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Session, AuthError> {
        let session = match self.auth.sign_in(self.backend.as_ref(), email, password, role).await {
            Ok(session) => session,
            Err(e) => {
                self.notifier.error(e.to_string());
                return Err(e);
            }
        };
        let name = session.display_name.as_deref().unwrap_or(&session.email);
        self.notifier.success(format!("Welcome, {}", name));
        if self.poller.is_none() {
            self.poller = OrderPoller::spawn(self.orders.clone(), self.poll_interval);
        }
        Ok(session)
    }

    pub async fn sign_out(&mut self) -> Result<(), String> {
        if let Some(poller) = self.poller.take() {
            poller.stop().await?;
        }
        self.auth.sign_out().await;
        Ok(())
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        if let Some(poller) = self.poller {
            poller.stop().await?;
        }

        // Dropping the boards closes every collection inbox.
        drop(self.orders);
        drop(self.vendors);
        drop(self.menu);
        drop(self.banners);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

fn spawn_collection<T: Entity>(
    name: &'static str,
    buffer: usize,
    handles: &mut Vec<JoinHandle<()>>,
) -> CollectionClient<T> {
    let (actor, client) = CollectionActor::<T>::new(name, buffer);
    handles.push(tokio::spawn(actor.run()));
    client
}

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::report;
use crate::api::ConsoleBackend;
use crate::collection::{CollectionClient, Reorder};
use crate::domain::Banner;
use crate::error::BoardError;
use crate::notify::Notifier;
use crate::reconcile::Optimistic;

/// Home-screen banner ordering (admin console).
#[derive(Clone)]
pub struct BannerBoard {
    backend: Arc<dyn ConsoleBackend>,
    banners: CollectionClient<Banner>,
    optimistic: Optimistic<Banner>,
    notifier: Notifier,
}

impl_board_reads!(BannerBoard, Banner, banners, banner);

impl BannerBoard {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        banners: CollectionClient<Banner>,
        notifier: Notifier,
    ) -> Self {
        let optimistic = Optimistic::new(banners.clone(), notifier.clone());
        Self {
            backend,
            banners,
            optimistic,
            notifier,
        }
    }

    /// Loads banners in the order the backend stores them.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        let result: Result<usize, BoardError> = async {
            let mut banners = self.backend.list_banners().await?;
            banners.sort_by_key(|b| b.position);
            let count = banners.len();
            self.banners.replace(banners).await?;
            Ok(count)
        }
        .await;
        let count = result.map_err(|e| report(&self.notifier, "refresh banners", e))?;
        info!(count, "Banners refreshed");
        Ok(count)
    }

    /// Drag-and-drop: moves the banner at `from` to `to` and persists the new
    /// order. The list reverts if the backend rejects it.
    #[instrument(skip(self))]
    pub async fn move_banner(&self, from: usize, to: usize) -> Result<(), BoardError> {
        if from == to {
            debug!("Dropped in place");
            return Ok(());
        }
        let backend = Arc::clone(&self.backend);
        self.optimistic
            .run_with(
                Reorder::<Banner>::new(from, to),
                move |arranged| async move {
                    let ids: Vec<String> = arranged.into_iter().map(|banner| banner.id).collect();
                    backend.save_banner_order(&ids).await
                },
                "Banner order saved",
            )
            .await
    }
}

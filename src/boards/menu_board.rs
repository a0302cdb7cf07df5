use std::sync::Arc;

use tracing::{info, instrument};

use super::report;
use crate::api::{ConsoleBackend, MenuItemInput};
use crate::collection::{CollectionClient, StatusChange};
use crate::domain::{Availability, Category, MenuItem};
use crate::error::BoardError;
use crate::notify::Notifier;
use crate::reconcile::Optimistic;

/// Menu management page (vendor console): items and their categories.
#[derive(Clone)]
pub struct MenuBoard {
    backend: Arc<dyn ConsoleBackend>,
    items: CollectionClient<MenuItem>,
    categories: CollectionClient<Category>,
    optimistic: Optimistic<MenuItem>,
    notifier: Notifier,
}

impl_board_reads!(MenuBoard, MenuItem, items, item, view);
impl_board_reads!(MenuBoard, Category, categories, category, view_categories);

impl MenuBoard {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        items: CollectionClient<MenuItem>,
        categories: CollectionClient<Category>,
        notifier: Notifier,
    ) -> Self {
        let optimistic = Optimistic::new(items.clone(), notifier.clone());
        Self {
            backend,
            items,
            categories,
            optimistic,
            notifier,
        }
    }

    /// Reloads items and categories together.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), BoardError> {
        let result: Result<(usize, usize), BoardError> = async {
            let (items, categories) =
                tokio::try_join!(self.backend.list_menu_items(), self.backend.list_categories())?;
            let counts = (items.len(), categories.len());
            self.items.replace(items).await?;
            self.categories.replace(categories).await?;
            Ok(counts)
        }
        .await;
        let (items, categories) = result.map_err(|e| report(&self.notifier, "refresh menu", e))?;
        info!(items, categories, "Menu refreshed");
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn set_availability(&self, id: &str, available: bool) -> Result<(), BoardError> {
        let backend = Arc::clone(&self.backend);
        let item_id = id.to_string();
        let target = Availability::from(available);
        self.optimistic
            .run(
                StatusChange::<MenuItem>::new(id.to_string(), target),
                async move { backend.set_menu_item_availability(&item_id, available).await },
                format!("Item marked {}", target),
            )
            .await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(&self, input: MenuItemInput) -> Result<MenuItem, BoardError> {
        let item = self
            .backend
            .create_menu_item(&input)
            .await
            .map_err(|e| report(&self.notifier, "create menu item", e))?;
        self.items.upsert(item.clone()).await?;
        self.notifier.success(format!("{} added to the menu", item.name));
        Ok(item)
    }

    #[instrument(skip(self, input), fields(item_id = %id))]
    pub async fn update_item(
        &self,
        id: &str,
        input: MenuItemInput,
    ) -> Result<MenuItem, BoardError> {
        let item = self
            .backend
            .update_menu_item(id, &input)
            .await
            .map_err(|e| report(&self.notifier, "update menu item", e))?;
        self.items.upsert(item.clone()).await?;
        self.notifier.success(format!("{} updated", item.name));
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete_item(&self, id: &str) -> Result<(), BoardError> {
        self.backend
            .delete_menu_item(id)
            .await
            .map_err(|e| report(&self.notifier, "delete menu item", e))?;
        self.items.remove(id.to_string()).await?;
        self.notifier.success("Menu item deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category, BoardError> {
        let category = self
            .backend
            .create_category(name.trim())
            .await
            .map_err(|e| report(&self.notifier, "create category", e))?;
        self.categories.upsert(category.clone()).await?;
        self.notifier.success(format!("Category {} created", category.name));
        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &str) -> Result<(), BoardError> {
        self.backend
            .delete_category(id)
            .await
            .map_err(|e| report(&self.notifier, "delete category", e))?;
        self.categories.remove(id.to_string()).await?;
        self.notifier.success("Category deleted");
        Ok(())
    }
}

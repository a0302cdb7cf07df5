use std::sync::Arc;

use tracing::{info, instrument};

use super::report;
use crate::api::ConsoleBackend;
use crate::collection::{CollectionClient, StatusChange};
use crate::domain::{DocumentRef, Vendor, VendorStatus};
use crate::error::BoardError;
use crate::notify::Notifier;
use crate::reconcile::Optimistic;

/// Vendor approval page (admin console).
#[derive(Clone)]
pub struct VendorBoard {
    backend: Arc<dyn ConsoleBackend>,
    vendors: CollectionClient<Vendor>,
    optimistic: Optimistic<Vendor>,
    notifier: Notifier,
}

impl_board_reads!(VendorBoard, Vendor, vendors, vendor, view);

impl VendorBoard {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        vendors: CollectionClient<Vendor>,
        notifier: Notifier,
    ) -> Self {
        let optimistic = Optimistic::new(vendors.clone(), notifier.clone());
        Self {
            backend,
            vendors,
            optimistic,
            notifier,
        }
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        let result: Result<usize, BoardError> = async {
            let vendors = self.backend.list_vendors().await?;
            let count = vendors.len();
            self.vendors.replace(vendors).await?;
            Ok(count)
        }
        .await;
        let count = result.map_err(|e| report(&self.notifier, "refresh vendors", e))?;
        info!(count, "Vendors refreshed");
        Ok(count)
    }

    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn approve(&self, id: &str) -> Result<(), BoardError> {
        let backend = Arc::clone(&self.backend);
        let vendor_id = id.to_string();
        self.optimistic
            .run(
                StatusChange::<Vendor>::new(id.to_string(), VendorStatus::Approved),
                async move {
                    backend.update_vendor_status(&vendor_id, VendorStatus::Approved, None).await
                },
                "Vendor approved",
            )
            .await
    }

    /// Rejects the vendor. A blank reason is sent as no reason.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn reject(&self, id: &str, reason: &str) -> Result<(), BoardError> {
        let backend = Arc::clone(&self.backend);
        let vendor_id = id.to_string();
        let reason = Some(reason.trim().to_string()).filter(|r| !r.is_empty());
        self.optimistic
            .run(
                StatusChange::<Vendor>::new(id.to_string(), VendorStatus::Rejected),
                async move {
                    backend
                        .update_vendor_status(&vendor_id, VendorStatus::Rejected, reason.as_deref())
                        .await
                },
                "Vendor rejected",
            )
            .await
    }

    /// Documents the vendor uploaded at registration.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn documents(&self, id: &str) -> Result<Vec<DocumentRef>, BoardError> {
        self.backend
            .vendor_documents(id)
            .await
            .map_err(|e| report(&self.notifier, "load vendor documents", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionActor;
    use crate::error::ApiError;
    use crate::mock_framework::FakeBackend;

    fn board(backend: FakeBackend) -> (VendorBoard, Arc<FakeBackend>) {
        let (actor, vendors) = CollectionActor::new("vendors", 8);
        tokio::spawn(actor.run());
        let backend = Arc::new(backend);
        (VendorBoard::new(backend.clone(), vendors, Notifier::default()), backend)
    }

    #[tokio::test]
    async fn test_reject_sends_trimmed_reason() {
        let vendor = Vendor::new("v1", "Pho Place", "pho@example.com");
        let (board, backend) = board(FakeBackend::new().with_vendors(vec![vendor]));
        board.refresh().await.unwrap();

        board.reject("v1", "  Licence expired ").await.unwrap();
        let vendor = board.get_vendor("v1").await.unwrap().unwrap();
        assert_eq!(vendor.status, VendorStatus::Rejected);
        assert_eq!(backend.vendor_reason("v1").as_deref(), Some("Licence expired"));
    }

    #[tokio::test]
    async fn test_documents_failure_is_reported() {
        let backend = FakeBackend::new();
        backend.fail_next(
            "vendor_documents",
            ApiError::Status {
                status: 404,
                message: "Vendor not found".to_string(),
            },
        );
        let (board, _) = board(backend);
        let result = board.documents("missing").await;
        assert!(matches!(result, Err(BoardError::Api(ApiError::Status { status: 404, .. }))));
    }
}

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::report;
use crate::api::{ConsoleBackend, PlatformSettings};
use crate::error::BoardError;
use crate::notify::Notifier;
use crate::wizard::{is_email, FieldErrors};

/// Platform settings page (admin console).
///
/// Saving waits for the backend; the values it returns are the ones to show.
#[derive(Clone)]
pub struct SettingsBoard {
    backend: Arc<dyn ConsoleBackend>,
    notifier: Notifier,
}

impl SettingsBoard {
    pub fn new(backend: Arc<dyn ConsoleBackend>, notifier: Notifier) -> Self {
        Self { backend, notifier }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<PlatformSettings, BoardError> {
        self.backend
            .settings()
            .await
            .map_err(|e| report(&self.notifier, "load settings", e))
    }

    /// Checks `settings` locally, then saves them. Nothing is sent if a check fails.
    #[instrument(skip_all)]
    pub async fn save(&self, settings: &PlatformSettings) -> Result<PlatformSettings, BoardError> {
        if let Err(errors) = check_settings(settings) {
            warn!(fields = errors.len(), "Settings rejected locally");
            return Err(report(&self.notifier, "save settings", BoardError::Invalid(errors)));
        }
        let saved = self
            .backend
            .update_settings(settings)
            .await
            .map_err(|e| report(&self.notifier, "save settings", e))?;
        info!(maintenance_mode = saved.maintenance_mode, "Settings saved");
        self.notifier.success("Settings saved");
        Ok(saved)
    }
}

fn check_settings(settings: &PlatformSettings) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if !(0.0..=1.0).contains(&settings.commission_rate) {
        errors.insert("commissionRate", "Commission rate must be between 0 and 1");
    }
    if !settings.delivery_fee.is_finite() || settings.delivery_fee < 0.0 {
        errors.insert("deliveryFee", "Delivery fee cannot be negative");
    }
    if !settings.minimum_order.is_finite() || settings.minimum_order < 0.0 {
        errors.insert("minimumOrder", "Minimum order cannot be negative");
    }
    if !is_email(&settings.support_email) {
        errors.insert("supportEmail", "Enter a valid email address");
    }
    errors.into_result()
}

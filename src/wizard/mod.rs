//! Four-step vendor registration.
//!
//! The draft accumulates across steps; "continue" validates, "back" never
//! does and never clears anything. The final step sends one multipart request.

mod draft;
mod validation;

use std::fmt;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::api::{Attachment, ConsoleBackend, MultipartForm};
use crate::error::WizardError;
use crate::notify::Notifier;

pub use draft::{Address, BusinessInfo, DayHours, Documents, RegistrationDraft, ServiceDetails};
pub use validation::{validate_step, FieldErrors};
pub(crate) use validation::is_email;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    #[default]
    BusinessInfo,
    Address,
    Hours,
    Documents,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::BusinessInfo, Step::Address, Step::Hours, Step::Documents];

    /// 1-based position shown to the user.
    pub fn number(&self) -> usize {
        match self {
            Step::BusinessInfo => 1,
            Step::Address => 2,
            Step::Hours => 3,
            Step::Documents => 4,
        }
    }

    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.number()).copied()
    }

    pub fn previous(&self) -> Option<Step> {
        self.number().checked_sub(2).and_then(|i| Step::ALL.get(i).copied())
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::BusinessInfo => "business info",
            Step::Address => "address",
            Step::Hours => "categories and hours",
            Step::Documents => "documents",
        };
        write!(f, "step {} ({})", self.number(), name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationWizard {
    draft: RegistrationDraft,
    step: Step,
}

impl RegistrationWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RegistrationDraft {
        &mut self.draft
    }

    /// Validates every step up to and including `last`, stopping at the first failure.
    pub fn validate_through(&self, last: Step) -> Result<(), (Step, FieldErrors)> {
        for step in Step::ALL.into_iter().take_while(|s| *s <= last) {
            validate_step(step, &self.draft).map_err(|errors| (step, errors))?;
        }
        Ok(())
    }

    /// "Continue": moves to the next step if everything so far is valid.
    /// On the last step this only validates.
    pub fn advance(&mut self) -> Result<Step, FieldErrors> {
        if let Err((failed, errors)) = self.validate_through(self.step) {
            warn!(step = %failed, errors = %errors, "Step incomplete");
            return Err(errors);
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// "Back": never validates and keeps all entered data.
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_form(&self) -> Result<MultipartForm, WizardError> {
        let draft = &self.draft;
        let categories = encode_field("categories", &draft.service.categories)?;
        let hours = encode_field("hours", &draft.service.hours)?;

        let mut form = MultipartForm::default();
        form.text("businessName", draft.business.business_name.trim())
            .text("ownerName", draft.business.owner_name.trim())
            .text("email", draft.business.email.trim())
            .text("phone", draft.business.phone.trim())
            .text("description", draft.business.description.trim())
            .text("street", draft.address.street.trim())
            .text("city", draft.address.city.trim())
            .text("state", draft.address.state.trim())
            .text("postalCode", draft.address.postal_code.trim())
            .text("categories", categories)
            .text("hours", hours);

        let files: [(&str, &Option<Attachment>); 3] = [
            ("businessLicense", &draft.documents.business_license),
            ("identityProof", &draft.documents.identity_proof),
            ("foodSafetyCertificate", &draft.documents.food_safety_certificate),
        ];
        for (name, file) in files {
            if let Some(file) = file {
                form.file(name, file.clone());
            }
        }
        Ok(form)
    }

    /// Sends the registration. Success resets the wizard; failure keeps every
    /// entered value and the current step.
    #[instrument(skip_all, fields(step = %self.step))]
    pub async fn submit(
        &mut self,
        backend: &dyn ConsoleBackend,
        notifier: &Notifier,
    ) -> Result<(), WizardError> {
        if !self.step.is_last() {
            return Err(WizardError::NotOnFinalStep(self.step));
        }
        if let Err((_, errors)) = self.validate_through(self.step) {
            notifier.error(errors.to_string());
            return Err(WizardError::Validation(errors));
        }

        let form = match self.to_form() {
            Ok(form) => form,
            Err(e) => {
                error!(error = %e, "Registration could not be encoded");
                notifier.error(e.to_string());
                return Err(e);
            }
        };
        match backend.register_vendor(&form).await {
            Ok(()) => {
                info!(business = %self.draft.business.business_name, "Registration submitted");
                notifier.success("Registration submitted for review");
                self.reset();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                notifier.error(e.to_string());
                Err(WizardError::Submit(e))
            }
        }
    }
}

fn encode_field<V: Serialize + ?Sized>(
    field: &'static str,
    value: &V,
) -> Result<String, WizardError> {
    serde_json::to_string(value).map_err(|e| WizardError::Encode {
        field,
        reason: e.to_string(),
    })
}

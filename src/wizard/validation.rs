use std::collections::BTreeMap;
use std::fmt;

use super::{Attachment, RegistrationDraft, Step};

const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;
const DOCUMENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub(crate) fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Checks the fields belonging to `step` only.
pub fn validate_step(step: Step, draft: &RegistrationDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    match step {
        Step::BusinessInfo => {
            let business = &draft.business;
            required(&mut errors, "business_name", &business.business_name);
            required(&mut errors, "owner_name", &business.owner_name);
            if required(&mut errors, "email", &business.email) && !is_email(&business.email) {
                errors.insert("email", "Enter a valid email address");
            }
            if required(&mut errors, "phone", &business.phone) && !is_phone(&business.phone) {
                errors.insert("phone", "Enter a valid phone number");
            }
        }
        Step::Address => {
            let address = &draft.address;
            required(&mut errors, "street", &address.street);
            required(&mut errors, "city", &address.city);
            required(&mut errors, "state", &address.state);
            if required(&mut errors, "postal_code", &address.postal_code)
                && !is_postal_code(&address.postal_code)
            {
                errors.insert("postal_code", "Enter a valid postal code");
            }
        }
        Step::Hours => {
            let service = &draft.service;
            if service.categories.iter().all(|c| c.trim().is_empty()) {
                errors.insert("categories", "Select at least one category");
            }
            let open_days: Vec<_> = service.hours.iter().filter(|h| !h.closed).collect();
            if open_days.is_empty() {
                errors.insert("hours", "Open on at least one day");
            } else if let Some(bad) = open_days.iter().find(|h| h.open >= h.close) {
                let message = format!("Closing time must be after opening time on {}", bad.day);
                errors.insert("hours", message);
            }
        }
        Step::Documents => {
            let documents = &draft.documents;
            match &documents.business_license {
                Some(file) => check_attachment(&mut errors, "business_license", file),
                None => errors.insert("business_license", "Business licence is required"),
            }
            match &documents.identity_proof {
                Some(file) => check_attachment(&mut errors, "identity_proof", file),
                None => errors.insert("identity_proof", "Proof of identity is required"),
            }
            if let Some(file) = &documents.food_safety_certificate {
                check_attachment(&mut errors, "food_safety_certificate", file);
            }
        }
    }
    errors.into_result()
}

// Records a "required" error and returns false when `value` is blank.
fn required(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, "This field is required");
        false
    } else {
        true
    }
}

pub(crate) fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_phone(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    allowed && (7..=15).contains(&digits)
}

fn is_postal_code(value: &str) -> bool {
    let value = value.trim();
    value.chars().any(|c| c.is_ascii_alphanumeric())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

fn check_attachment(errors: &mut FieldErrors, field: &'static str, file: &Attachment) {
    if file.bytes.is_empty() {
        errors.insert(field, "File is empty");
    } else if file.bytes.len() > MAX_DOCUMENT_BYTES {
        errors.insert(field, "File must be 5 MB or smaller");
    } else if !DOCUMENT_TYPES.contains(&file.content_type.as_str()) {
        errors.insert(field, "Upload a PDF, JPEG or PNG file");
    }
}

//! Declarative per-step validation rules.
//!
//! Each step owns a static list of [`FieldRule`]s. A rule's `applies`
//! predicate is evaluated against the current draft, so conditional fields
//! (the scheduled-delivery date and slot) are required only when their
//! sibling field selects them.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use super::draft::CheckoutDraft;
use super::wizard::CheckoutStep;

/// Start times of the scheduled-delivery slots, three hours each.
pub const TIME_SLOTS: [&str; 4] = ["09:00", "12:00", "15:00", "18:00"];

static ZIP_CODE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("zip code pattern is valid")
});

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// A checkout step's required fields did not validate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} step has {} invalid field(s)", .fields.len())]
pub struct ValidationError {
    pub step: CheckoutStep,
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Message for a specific field, if it failed.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }
}

/// Validation rule for a single draft field.
pub struct FieldRule {
    /// Field name as reported in [`FieldError`].
    pub field: &'static str,
    /// Whether the field is required for the draft as it stands.
    pub applies: fn(&CheckoutDraft) -> bool,
    /// Error message for an applicable field, if invalid.
    pub validate: fn(&CheckoutDraft, NaiveDate) -> Option<&'static str>,
}

const fn always(_: &CheckoutDraft) -> bool {
    true
}

fn when_scheduled(draft: &CheckoutDraft) -> bool {
    draft.is_scheduled()
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

static ADDRESS_RULES: [FieldRule; 4] = [
    FieldRule {
        field: "address_line1",
        applies: always,
        validate: validate_address_line1,
    },
    FieldRule {
        field: "city",
        applies: always,
        validate: validate_city,
    },
    FieldRule {
        field: "state",
        applies: always,
        validate: validate_state,
    },
    FieldRule {
        field: "zip_code",
        applies: always,
        validate: validate_zip_code,
    },
];

static DELIVERY_RULES: [FieldRule; 3] = [
    FieldRule {
        field: "delivery_type",
        applies: always,
        validate: validate_delivery_type,
    },
    FieldRule {
        field: "scheduled_date",
        applies: when_scheduled,
        validate: validate_scheduled_date,
    },
    FieldRule {
        field: "scheduled_time_start",
        applies: when_scheduled,
        validate: validate_time_slot,
    },
];

static PAYMENT_RULES: [FieldRule; 1] = [FieldRule {
    field: "payment_method",
    applies: always,
    validate: validate_payment_method,
}];

fn validate_address_line1(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    blank(&draft.address.address_line1).then_some("Address is required")
}

fn validate_city(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    blank(&draft.address.city).then_some("City is required")
}

fn validate_state(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    blank(&draft.address.state).then_some("State is required")
}

fn validate_zip_code(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    let zip = draft.address.zip_code.trim();
    if zip.is_empty() {
        Some("ZIP code is required")
    } else if !ZIP_CODE.is_match(zip) {
        Some("Enter a 5-digit ZIP code (optionally ZIP+4)")
    } else {
        None
    }
}

fn validate_scheduled_date(draft: &CheckoutDraft, today: NaiveDate) -> Option<&'static str> {
    match draft.scheduled_date {
        None => Some("Choose a delivery date"),
        Some(date) if date <= today => Some("Delivery date must be in the future"),
        Some(_) => None,
    }
}

fn validate_delivery_type(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    draft
        .delivery_type
        .is_none()
        .then_some("Choose a delivery option")
}

fn validate_payment_method(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    draft
        .payment_method
        .is_none()
        .then_some("Choose a payment method")
}

fn validate_time_slot(draft: &CheckoutDraft, _today: NaiveDate) -> Option<&'static str> {
    match draft.scheduled_time_start.as_deref() {
        None | Some("") => Some("Choose a delivery time slot"),
        Some(slot) if !TIME_SLOTS.contains(&slot) => Some("Choose one of the offered time slots"),
        Some(_) => None,
    }
}

/// Rules for a step. Review has none.
#[must_use]
pub fn rules_for(step: CheckoutStep) -> &'static [FieldRule] {
    match step {
        CheckoutStep::Address => &ADDRESS_RULES,
        CheckoutStep::Delivery => &DELIVERY_RULES,
        CheckoutStep::Payment => &PAYMENT_RULES,
        CheckoutStep::Review => &[],
    }
}

/// Evaluate every applicable rule for `step`, collecting all failures.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing each failing field.
pub fn validate_step(
    draft: &CheckoutDraft,
    step: CheckoutStep,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    let fields: Vec<FieldError> = rules_for(step)
        .iter()
        .filter(|rule| (rule.applies)(draft))
        .filter_map(|rule| {
            (rule.validate)(draft, today).map(|message| FieldError {
                field: rule.field,
                message,
            })
        })
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { step, fields })
    }
}

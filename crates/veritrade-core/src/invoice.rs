//! # Invoice Request Types and Validation
//!
//! The wire-facing verification request, the bounded metadata bag, and the
//! immutable [`InvoiceSnapshot`] written to the audit store once per
//! verification attempt. Snapshots are never deduplicated: resubmitting the
//! same invoice creates a new snapshot row.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of entries in the request metadata bag.
pub const METADATA_MAX_ENTRIES: usize = 16;
/// Maximum byte length of a metadata key.
pub const METADATA_MAX_KEY_LEN: usize = 64;
/// Maximum byte length of a metadata string value.
pub const METADATA_MAX_VALUE_LEN: usize = 256;

/// Longest accepted amount string. Every 18-digit value fits u64, so
/// accepted amounts always parse without overflow.
const AMOUNT_MAX_DIGITS: usize = 18;

/// Open key/value bag attached to a verification request.
///
/// Bounded so persisted records stay small: at most
/// [`METADATA_MAX_ENTRIES`] entries, scalar values only, keys up to
/// [`METADATA_MAX_KEY_LEN`] bytes and string values up to
/// [`METADATA_MAX_VALUE_LEN`] bytes. Enforced by
/// [`VerificationRequest::validate`].
pub type Metadata = BTreeMap<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Validation error
// ---------------------------------------------------------------------------

/// Errors arising from verification request validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field is empty or whitespace.
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// The amount is not an integer decimal string in smallest units.
    #[error("amount '{0}' is not an unsigned integer decimal string")]
    MalformedAmount(String),

    /// The amount exceeds the representable magnitude.
    #[error("amount has {0} digits, maximum is {AMOUNT_MAX_DIGITS}")]
    AmountTooLarge(usize),

    /// Too many metadata entries.
    #[error("metadata has {0} entries, maximum is {METADATA_MAX_ENTRIES}")]
    MetadataTooLarge(usize),

    /// A metadata key exceeds the length bound.
    #[error("metadata key '{0}' exceeds {METADATA_MAX_KEY_LEN} bytes")]
    MetadataKeyTooLong(String),

    /// A metadata value is not a scalar (string, number, boolean, null).
    #[error("metadata value for '{0}' must be a scalar")]
    MetadataValueNotScalar(String),

    /// A metadata string value exceeds the length bound.
    #[error("metadata value for '{0}' exceeds {METADATA_MAX_VALUE_LEN} bytes")]
    MetadataValueTooLong(String),
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Invoice fields submitted for verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvoiceDetails {
    /// Commodity description, e.g. "Electronics".
    pub commodity: String,
    /// Amount as an unsigned integer decimal string in smallest units.
    /// Never a float: decimal strings keep scoring deterministic.
    pub amount: String,
    pub supplier_country: String,
    pub buyer_country: String,
    pub exporter_name: String,
    pub buyer_name: String,
}

/// A complete verification request as received on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationRequest {
    /// External invoice identifier. Not unique across resubmissions.
    pub invoice_id: String,
    /// Opaque content reference for the underlying trade documents.
    pub document_hash: String,
    pub invoice_details: InvoiceDetails,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VerificationRequest {
    /// Validate the request before the pipeline runs.
    ///
    /// Input errors surface as a 400 without persisting anything, so this
    /// must reject every shape the pipeline cannot score deterministically.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("invoiceId", &self.invoice_id)?;
        require_non_empty("documentHash", &self.document_hash)?;
        require_non_empty("invoiceDetails.commodity", &self.invoice_details.commodity)?;
        require_non_empty(
            "invoiceDetails.supplierCountry",
            &self.invoice_details.supplier_country,
        )?;
        require_non_empty(
            "invoiceDetails.buyerCountry",
            &self.invoice_details.buyer_country,
        )?;
        require_non_empty(
            "invoiceDetails.exporterName",
            &self.invoice_details.exporter_name,
        )?;
        require_non_empty("invoiceDetails.buyerName", &self.invoice_details.buyer_name)?;
        self.parsed_amount()?;
        validate_metadata(&self.metadata)?;
        Ok(())
    }

    /// Parse the amount string into smallest units.
    pub fn parsed_amount(&self) -> Result<u64, ValidationError> {
        parse_amount(&self.invoice_details.amount)
    }
}

/// Parse an unsigned integer decimal amount string.
pub fn parse_amount(amount: &str) -> Result<u64, ValidationError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("invoiceDetails.amount"));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::MalformedAmount(amount.to_string()));
    }
    if trimmed.len() > AMOUNT_MAX_DIGITS {
        return Err(ValidationError::AmountTooLarge(trimmed.len()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| ValidationError::MalformedAmount(amount.to_string()))
}

fn require_non_empty(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(name));
    }
    Ok(())
}

fn validate_metadata(metadata: &Metadata) -> Result<(), ValidationError> {
    if metadata.len() > METADATA_MAX_ENTRIES {
        return Err(ValidationError::MetadataTooLarge(metadata.len()));
    }
    for (key, value) in metadata {
        if key.len() > METADATA_MAX_KEY_LEN {
            return Err(ValidationError::MetadataKeyTooLong(key.clone()));
        }
        match value {
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                return Err(ValidationError::MetadataValueNotScalar(key.clone()));
            }
            serde_json::Value::String(s) if s.len() > METADATA_MAX_VALUE_LEN => {
                return Err(ValidationError::MetadataValueTooLong(key.clone()));
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// InvoiceSnapshot
// ---------------------------------------------------------------------------

/// Immutable record of the invoice data supplied at verification time.
///
/// Created once per verification call and written to the audit store before
/// any check runs. Never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub invoice_id: String,
    pub document_hash: String,
    pub commodity: String,
    pub amount: String,
    pub supplier_country: String,
    pub buyer_country: String,
    pub exporter_name: String,
    pub buyer_name: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl InvoiceSnapshot {
    /// Build a snapshot from a validated request.
    pub fn from_request(request: &VerificationRequest) -> Self {
        Self {
            invoice_id: request.invoice_id.clone(),
            document_hash: request.document_hash.clone(),
            commodity: request.invoice_details.commodity.clone(),
            amount: request.invoice_details.amount.clone(),
            supplier_country: request.invoice_details.supplier_country.clone(),
            buyer_country: request.invoice_details.buyer_country.clone(),
            exporter_name: request.invoice_details.exporter_name.clone(),
            buyer_name: request.invoice_details.buyer_name.clone(),
            metadata: request.metadata.clone(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

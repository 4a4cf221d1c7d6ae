//! Contact records, the persisted unit.
//!
//! A [`ContactRecord`] is built once, right after a successful extraction,
//! and gets its identifier and `captured_at` at that moment. Edits replace
//! the other fields; those two never change afterwards.

use crate::extract::ExtractionResult;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Business classification. Anything the extraction service returns that is
/// not one of these four becomes [`BusinessType::Other`], and so does any
/// unknown name read back from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BusinessType {
    Trading,
    Manufacturing,
    Service,
    #[default]
    Other,
}

impl BusinessType {
    pub const ALL: [BusinessType; 4] = [
        BusinessType::Trading,
        BusinessType::Manufacturing,
        BusinessType::Service,
        BusinessType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Trading => "Trading",
            BusinessType::Manufacturing => "Manufacturing",
            BusinessType::Service => "Service",
            BusinessType::Other => "Other",
        }
    }

    /// Case-insensitive match on the four names; everything else is `Other`.
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw))
            .unwrap_or(BusinessType::Other)
    }
}

impl<'de> Deserialize<'de> for BusinessType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(&raw))
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only `id` and `capturedAt` are required when reading a stored record;
/// any other missing field reads as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub whatsapp_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub nature_of_business: String,
    #[serde(default)]
    pub business_type: BusinessType,
    #[serde(default)]
    pub notes: String,
    /// Milliseconds since the Unix epoch.
    pub captured_at: i64,
}

fn field(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl ContactRecord {
    /// Build a record from an extraction with the given identity.
    ///
    /// Absent fields become empty strings; `businessType` is normalized.
    pub fn from_extraction(result: ExtractionResult, id: String, captured_at: i64) -> Self {
        let business_type = result
            .business_type
            .as_deref()
            .map(BusinessType::normalize)
            .unwrap_or_default();

        Self {
            id,
            company_name: field(result.company_name),
            address: field(result.address),
            contact_person: field(result.contact_person),
            contact_number: field(result.contact_number),
            whatsapp_number: field(result.whatsapp_number),
            email: field(result.email),
            website: field(result.website),
            nature_of_business: field(result.nature_of_business),
            business_type,
            notes: field(result.notes),
            captured_at,
        }
    }

    /// Build a record with a fresh UUID and the current time.
    pub fn new_from_extraction(result: ExtractionResult) -> Self {
        Self::from_extraction(
            result,
            uuid::Uuid::new_v4().to_string(),
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Company name, or a placeholder when extraction found none.
    pub fn display_name(&self) -> &str {
        if self.company_name.is_empty() {
            "(unnamed)"
        } else {
            &self.company_name
        }
    }
}

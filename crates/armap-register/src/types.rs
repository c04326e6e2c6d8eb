//! Wire types for the register's appointed-representative endpoint.
//!
//! `GET /Firm/{frn}/AR` answers with an envelope:
//!
//! ```json
//! { "Status": "FSR-API-02-01-00", "Message": "Ok. Firm AR found", "Data": [ ... ] }
//! ```
//!
//! `Data` is `null` (or absent) for firms without representatives. Entry
//! fields use the register's display names as keys. Reference numbers are
//! sometimes emitted as numbers rather than strings, so every field is read
//! as "string or number".

use armap_core::ArDetail;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct RegisterEnvelope {
    #[serde(rename = "Status", default)]
    pub status: Option<String>,

    #[serde(rename = "Message", default)]
    pub message: Option<String>,

    #[serde(rename = "Data", default)]
    pub data: Option<Vec<RegisterAr>>,
}

/// One appointed representative as returned by the register.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterAr {
    #[serde(rename = "Name", default, deserialize_with = "loose_string")]
    pub name: String,

    #[serde(
        rename = "Insurance Distribution",
        default,
        deserialize_with = "loose_string"
    )]
    pub insurance_distribution: String,

    #[serde(rename = "Tied Agent", default, deserialize_with = "loose_string")]
    pub tied_agent: String,

    #[serde(rename = "EEA Tied Agent", default, deserialize_with = "loose_string")]
    pub eea_tied_agent: String,

    #[serde(
        rename = "Relationship",
        alias = "AR Relationship",
        default,
        deserialize_with = "loose_string"
    )]
    pub relationship: String,

    #[serde(rename = "FRN", default, deserialize_with = "loose_string")]
    pub frn: String,

    #[serde(
        rename = "Effective Date",
        alias = "Effective From",
        default,
        deserialize_with = "loose_string"
    )]
    pub effective_from: String,
}

impl From<RegisterAr> for ArDetail {
    fn from(ar: RegisterAr) -> Self {
        ArDetail {
            name: ar.name,
            insurance_distribution: ar.insurance_distribution,
            tied_agent: ar.tied_agent,
            eea_tied_agent: ar.eea_tied_agent,
            ar_relationship: ar.relationship,
            firm_reference_number: ar.frn,
            effective_from: ar.effective_from,
        }
    }
}

/// Accepts a string, a number, a bool or `null` and yields its trimmed text.
fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.trim().to_owned(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

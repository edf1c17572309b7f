//! The lab test record extracted from each report page.
//!
//! Models return loosely typed JSON: numbers where strings were asked for,
//! `"HIGH"` instead of `"high"`, `"N/A"` as a date. Deserialization here is
//! lenient so that one odd field degrades to "absent" instead of discarding
//! every record on the page.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One row of a lab report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabTestRecord {
    /// Test name exactly as printed.
    #[serde(default, deserialize_with = "lenient_text")]
    pub test: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,

    /// Result value, original formatting preserved (`"5.4 mmol/L"`, `"<0.1"`).
    #[serde(default, deserialize_with = "lenient_text")]
    pub result: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub reference_min: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub reference_max: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub payor_code: Option<String>,

    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<LabStatus>,

    /// ISO `YYYY-MM-DD`; serialized in the same form.
    #[serde(default, deserialize_with = "lenient_date")]
    pub test_date: Option<NaiveDate>,
}

/// Result position relative to the reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabStatus {
    Normal,
    High,
    Low,
}

impl LabStatus {
    /// Case-insensitive match on the three canonical words.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(LabStatus::Normal),
            "high" => Some(LabStatus::High),
            "low" => Some(LabStatus::Low),
            _ => None,
        }
    }
}

/// Accept strings, numbers and booleans as text; null and blanks become `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<LabStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.and_then(|s| LabStatus::parse(&s)))
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

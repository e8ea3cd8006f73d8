//! Wire and canonical types for court availability.
//!
//! `RawResource`/`RawSlot` mirror what the availability API returns for one
//! (tenant, date) pair. `CanonicalSlot` is the flattened, identity-bearing form
//! the monitor works with.
//!
//! Only `start_time` matters for filtering. The other upstream fields are
//! displayed or joined into the identity, so an unexpected type there degrades
//! that one field instead of rejecting the whole day.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Resource id used when the upstream record carries none.
pub const UNKNOWN_RESOURCE: &str = "Unknown";

/// A bookable resource (court) as returned by the availability endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawResource {
    /// Any scalar id is accepted; numbers and booleans are stringified.
    #[serde(default, deserialize_with = "lenient_id")]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub slots: Option<Vec<RawSlot>>,
}

impl RawResource {
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_deref().unwrap_or(UNKNOWN_RESOURCE)
    }

    pub fn slots(&self) -> &[RawSlot] {
        self.slots.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSlot {
    /// Local start time as sent upstream, usually `HH:MM:SS`.
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    /// Length of the slot in minutes. Unusable values become `None`.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration: Option<u32>,
}

/// Upstream prices arrive preformatted (`"24 EUR"`), as bare numbers, or
/// occasionally as something else entirely, which is shown as raw JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Text(String),
    Amount(f64),
    Other(Value),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Text(text) => f.write_str(text),
            Price::Amount(amount) => write!(f, "{}", amount),
            Price::Other(value) => write!(f, "{}", value),
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(id) => Some(id),
        other => Some(other.to_string()),
    })
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(minutes.and_then(|m| u32::try_from(m).ok()))
}

/// Everything one tenant reported for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub resources: Vec<RawResource>,
}

/// Identity of a slot across cycles: date, resource and raw start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(date: NaiveDate, resource_id: &str, start_time: &str) -> Self {
        Self(format!(
            "{}_{}_{}",
            date.format("%Y-%m-%d"),
            resource_id,
            start_time
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized slot that passed all filters.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSlot {
    pub date: NaiveDate,
    pub resource_id: String,
    pub start_time: String,
    pub price: Option<Price>,
    pub duration: Option<u32>,
}

impl CanonicalSlot {
    /// Price and duration are deliberately left out of the identity.
    pub fn id(&self) -> SlotId {
        SlotId::new(self.date, &self.resource_id, &self.start_time)
    }

    /// `HH:MM` prefix of the start time, or the raw value when shorter.
    pub fn display_time(&self) -> &str {
        self.start_time.get(..5).unwrap_or(&self.start_time)
    }
}

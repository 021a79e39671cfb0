use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// One insight observation from the upstream API: a day of totals, or one
/// dimension bucket (platform/position/device, age/gender, ...).
///
/// The upstream serializes numeric fields as strings. All counters are
/// deserialized leniently: absent or malformed values become 0, never an
/// error, so internal logic only ever sees numbers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InsightRow {
    #[serde(alias = "date_start", default, deserialize_with = "date_lenient")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "u64_lenient")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "u64_lenient")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub spend: f64,
    #[serde(default, deserialize_with = "u64_lenient")]
    pub reach: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(alias = "publisher_platform", default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(alias = "platform_position", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(alias = "impression_device", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionCount>,
}

/// A named conversion counter attached to an insight row (leads, purchases, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCount {
    pub action_type: String,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub value: f64,
}

/// Summed counters for a group of rows plus the ratios derived from those
/// sums. Ratios are always computed from the summed numerators and
/// denominators, never averaged across per-row ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub reach: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub frequency: f64,
}

impl AggregateMetrics {
    pub fn from_sums(impressions: u64, clicks: u64, spend: f64, reach: u64) -> Self {
        let ctr = if impressions == 0 {
            0.0
        } else {
            clicks as f64 / impressions as f64 * 100.0
        };
        let cpc = if clicks == 0 { 0.0 } else { spend / clicks as f64 };
        let cpm = if impressions == 0 {
            0.0
        } else {
            spend / impressions as f64 * 1000.0
        };
        let frequency = if reach == 0 {
            0.0
        } else {
            impressions as f64 / reach as f64
        };

        Self {
            impressions,
            clicks,
            spend,
            reach,
            ctr,
            cpc,
            cpm,
            frequency,
        }
    }

    /// True when every headline counter is zero: the "no data for these
    /// filters" signal.
    pub fn is_zero(&self) -> bool {
        self.impressions == 0 && self.clicks == 0 && self.spend == 0.0 && self.reach == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdAccount {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative: Option<Creative>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// The upstream wraps every list response in `{"data": [...]}`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(u64),
    Float(f64),
    Text(String),
}

fn u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Int(value)) => value,
        Some(RawNumber::Float(value)) if value.is_finite() && value >= 0.0 => value as u64,
        Some(RawNumber::Float(_)) => 0,
        Some(RawNumber::Text(text)) => parse_u64(text.trim()),
        None => 0,
    })
}

fn parse_u64(text: &str) -> u64 {
    if let Ok(value) = text.parse::<u64>() {
        return value;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value as u64,
        _ => 0,
    }
}

fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Int(value)) => value as f64,
        Some(RawNumber::Float(value)) if value.is_finite() => value,
        Some(RawNumber::Float(_)) => 0.0,
        Some(RawNumber::Text(text)) => match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => 0.0,
        },
        None => 0.0,
    })
}

fn date_lenient<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = text.parse::<NaiveDate>() {
        return Some(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.date_naive());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_parses_numeric_strings() {
        let row: InsightRow = serde_json::from_str(
            r#"{"date_start":"2026-02-01","impressions":"1200","clicks":"34","spend":"56.78","reach":"900"}"#,
        )
        .unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(row.impressions, 1200);
        assert_eq!(row.clicks, 34);
        assert_eq!(row.spend, 56.78);
        assert_eq!(row.reach, 900);
    }

    #[test]
    fn malformed_and_missing_numerics_become_zero() {
        let row: InsightRow = serde_json::from_str(
            r#"{"date_start":"2026-02-01","impressions":"n/a","spend":"NaN","reach":null}"#,
        )
        .unwrap();
        assert_eq!(row.impressions, 0);
        assert_eq!(row.clicks, 0);
        assert_eq!(row.spend, 0.0);
        assert_eq!(row.reach, 0);
    }

    #[test]
    fn datetime_dates_reduce_to_calendar_day() {
        let row: InsightRow =
            serde_json::from_str(r#"{"date":"2026-02-01T15:30:00+02:00","impressions":1}"#).unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2026, 2, 1));
    }

    #[test]
    fn breakdown_field_aliases_map_to_dimensions() {
        let row: InsightRow = serde_json::from_str(
            r#"{"publisher_platform":"facebook","platform_position":"feed","impression_device":"android_smartphone"}"#,
        )
        .unwrap();
        assert_eq!(row.platform.as_deref(), Some("facebook"));
        assert_eq!(row.position.as_deref(), Some("feed"));
        assert_eq!(row.device.as_deref(), Some("android_smartphone"));
    }

    #[test]
    fn action_values_parse_from_strings() {
        let row: InsightRow = serde_json::from_str(
            r#"{"actions":[{"action_type":"lead","value":"12"},{"action_type":"purchase","value":3}]}"#,
        )
        .unwrap();
        assert_eq!(row.actions.len(), 2);
        assert_eq!(row.actions[0].value, 12.0);
        assert_eq!(row.actions[1].value, 3.0);
    }

    #[test]
    fn zero_denominators_yield_zero_ratios() {
        let metrics = AggregateMetrics::from_sums(0, 0, 10.0, 0);
        assert_eq!(metrics.ctr, 0.0);
        assert_eq!(metrics.cpc, 0.0);
        assert_eq!(metrics.cpm, 0.0);
        assert_eq!(metrics.frequency, 0.0);
    }
}

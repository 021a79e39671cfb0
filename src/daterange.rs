use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// The reporting-window states a dashboard selection can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePreset {
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[serde(rename = "last-30-days")]
    Last30Days,
    #[serde(rename = "custom")]
    Custom,
}

impl RangePreset {
    fn days_back(self) -> Option<i64> {
        match self {
            RangePreset::Last7Days => Some(7),
            RangePreset::Last30Days => Some(30),
            RangePreset::Custom => None,
        }
    }

    /// The window a preset button computes: `[today - N days, today]`,
    /// inclusive. `None` for `Custom`, which carries its own dates.
    pub fn window(self, today: NaiveDate) -> Option<DateRange> {
        self.days_back().map(|days| DateRange {
            since: today - Duration::days(days),
            until: today,
        })
    }
}

/// An inclusive calendar-day window. Instants pin the first day to local
/// 00:00:00.000 and the last to 23:59:59.999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    pub fn start_instant(&self) -> DateTime<Local> {
        local_instant(self.since, NaiveTime::MIN)
    }

    pub fn end_instant(&self) -> DateTime<Local> {
        let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        local_instant(self.until, end)
    }

    /// The immediately preceding window of equal length, used as the
    /// comparison period for percent-change figures.
    pub fn preceding(&self) -> Self {
        let length = self.until - self.since;
        let until = self.since - Duration::days(1);
        Self {
            since: until - length,
            until,
        }
    }

    /// Re-derives the preset for this window: a calendar selection whose
    /// endpoints match a preset's boundaries to the millisecond is that
    /// preset, anything else is `Custom`.
    pub fn classify(&self, today: NaiveDate) -> RangePreset {
        for preset in [RangePreset::Last7Days, RangePreset::Last30Days] {
            let Some(window) = preset.window(today) else {
                continue;
            };
            let starts_match = window.start_instant().timestamp_millis()
                == self.start_instant().timestamp_millis();
            let ends_match =
                window.end_instant().timestamp_millis() == self.end_instant().timestamp_millis();
            if starts_match && ends_match {
                return preset;
            }
        }
        RangePreset::Custom
    }
}

/// Current selection: the preset state plus the concrete window it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelection {
    pub preset: RangePreset,
    pub range: DateRange,
}

impl RangeSelection {
    /// The selection emitted when the caller supplies none: last 30 days.
    pub fn default_at(today: NaiveDate) -> Self {
        Self::preset_at(RangePreset::Last30Days, today)
            .unwrap_or_else(|| Self::custom(today, today, today))
    }

    /// Enters a preset state, computing its window from `today`. `Custom`
    /// has no window of its own and yields `None`.
    pub fn preset_at(preset: RangePreset, today: NaiveDate) -> Option<Self> {
        preset.window(today).map(|range| Self { preset, range })
    }

    /// Enters the state for a calendar-picked window. Re-enters the matching
    /// preset when the window equals a preset's boundaries exactly.
    pub fn custom(since: NaiveDate, until: NaiveDate, today: NaiveDate) -> Self {
        let range = DateRange { since, until };
        Self {
            preset: range.classify(today),
            range,
        }
    }
}

fn local_instant(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn preset_window_is_inclusive_today_minus_n() {
        let today = day(2026, 3, 15);
        let range = RangePreset::Last7Days.window(today).unwrap();
        assert_eq!(range.since, day(2026, 3, 8));
        assert_eq!(range.until, today);
    }

    #[test]
    fn instants_pin_day_boundaries() {
        let range = DateRange {
            since: day(2026, 3, 8),
            until: day(2026, 3, 15),
        };
        let start = range.start_instant();
        let end = range.end_instant();
        assert_eq!(start.time(), NaiveTime::MIN);
        assert_eq!(end.time(), NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap());
    }

    #[test]
    fn identical_custom_window_reenters_preset() {
        let today = day(2026, 3, 15);
        let selection = RangeSelection::custom(day(2026, 3, 8), today, today);
        assert_eq!(selection.preset, RangePreset::Last7Days);
    }

    #[test]
    fn off_by_one_window_stays_custom() {
        let today = day(2026, 3, 15);
        let selection = RangeSelection::custom(day(2026, 3, 9), today, today);
        assert_eq!(selection.preset, RangePreset::Custom);

        let shifted = RangeSelection::custom(day(2026, 3, 8), day(2026, 3, 14), today);
        assert_eq!(shifted.preset, RangePreset::Custom);
    }

    #[test]
    fn default_selection_is_last_30_days() {
        let today = day(2026, 3, 15);
        let selection = RangeSelection::default_at(today);
        assert_eq!(selection.preset, RangePreset::Last30Days);
        assert_eq!(selection.range.since, day(2026, 2, 13));
        assert_eq!(selection.range.until, today);
    }

    #[test]
    fn preceding_window_abuts_and_matches_length() {
        let range = DateRange {
            since: day(2026, 2, 1),
            until: day(2026, 2, 7),
        };
        let previous = range.preceding();
        assert_eq!(previous.until, day(2026, 1, 31));
        assert_eq!(previous.since, day(2026, 1, 25));
        assert_eq!(previous.until - previous.since, range.until - range.since);
    }

    #[test]
    fn preset_labels_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&RangePreset::Last7Days).unwrap(),
            "\"last-7-days\""
        );
        assert_eq!(
            serde_json::to_string(&RangePreset::Last30Days).unwrap(),
            "\"last-30-days\""
        );
        assert_eq!(serde_json::to_string(&RangePreset::Custom).unwrap(), "\"custom\"");
    }
}

use crate::errors::AppError;
use crate::metrics::PlacementGroup;
use chrono::NaiveDate;

const COLUMNS: [&str; 9] = [
    "platform",
    "position",
    "device",
    "impressions",
    "clicks",
    "spend",
    "ctr",
    "cpc",
    "cpm",
];

/// Serializes placement groups to CSV: one header line plus one line per
/// group. The writer quotes values containing commas or quotes.
pub fn write_placements_csv(groups: &[PlacementGroup]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(AppError::internal)?;

    for group in groups {
        let m = &group.metrics;
        writer
            .write_record([
                group.platform.as_str(),
                group.position.as_str(),
                group.device.as_str(),
                &m.impressions.to_string(),
                &m.clicks.to_string(),
                &format!("{:.2}", m.spend),
                &format!("{:.2}", m.ctr),
                &format!("{:.2}", m.cpc),
                &format!("{:.2}", m.cpm),
            ])
            .map_err(AppError::internal)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::internal(err.error()))?;
    String::from_utf8(bytes).map_err(AppError::internal)
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("placement_insights_{date}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregateMetrics;

    fn group(platform: &str, position: &str, device: &str) -> PlacementGroup {
        PlacementGroup {
            platform: platform.to_string(),
            position: position.to_string(),
            device: device.to_string(),
            metrics: AggregateMetrics::from_sums(400, 25, 10.0, 300),
        }
    }

    #[test]
    fn export_has_header_plus_one_line_per_group() {
        let csv = write_placements_csv(&[
            group("facebook", "feed", "iphone"),
            group("instagram", "story", "android_smartphone"),
        ])
        .unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "platform,position,device,impressions,clicks,spend,ctr,cpc,cpm");
        assert!(lines[1].starts_with("facebook,feed,iphone,400,25,10.00,6.25,"));
    }

    #[test]
    fn values_with_commas_and_quotes_round_trip() {
        let csv = write_placements_csv(&[group("Foo, Bar", "say \"feed\"", "iphone")]).unwrap();
        assert!(csv.contains("\"Foo, Bar\""));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "Foo, Bar");
        assert_eq!(&record[1], "say \"feed\"");
    }

    #[test]
    fn filename_carries_iso_date() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(export_filename(date), "placement_insights_2026-03-15.csv");
    }
}

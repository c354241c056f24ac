/*!
 * The live satellite feed.
 *
 * The feed is a CSV file of active fire detections for the last 24 hours, as published by NASA
 * FIRMS. Only a handful of the columns are used, and they are found by name so the column order
 * doesn't matter.
 */
use crate::{
    error::TierFailure,
    geo::Coord,
    hotspot::{FireHotspot, SourceTier},
    source::IngestFilter,
};
use csv::StringRecord;
use log::debug;
use reqwest::blocking::Client;
use std::time::Duration;

/// MODIS active fires over South Asia for the last 24 hours.
pub const DEFAULT_FEED_URL: &str =
    "https://firms.modaps.eosdis.nasa.gov/data/active_fire/modis-c6.1/csv/MODIS_C6_1_South_Asia_24h.csv";

/// The name recorded in snapshot metadata for the default feed.
pub const DEFAULT_FEED_NAME: &str = "NASA-MODIS";

/// How long to wait on the feed before giving up on it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Brightness temperature (K) that maps to an intensity of 1.0.
const BRIGHTNESS_SCALE: f64 = 400.0;

/// The positions of the columns we need.
#[derive(Debug, Clone, Copy)]
struct FeedColumns {
    latitude: usize,
    longitude: usize,
    brightness: usize,
    confidence: usize,
    frp: usize,
}

impl FeedColumns {
    fn from_header(header: &StringRecord) -> Result<Self, TierFailure> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or(TierFailure::MissingColumn(name))
        };

        Ok(FeedColumns {
            latitude: find("latitude")?,
            longitude: find("longitude")?,
            brightness: find("brightness")?,
            confidence: find("confidence")?,
            frp: find("frp")?,
        })
    }

    /// Turn a row into a hotspot, or `None` if any needed field is not a number.
    fn parse_row(&self, row: &StringRecord, id: u32) -> Option<FireHotspot> {
        let lat: f64 = row.get(self.latitude)?.parse().ok()?;
        let lon: f64 = row.get(self.longitude)?.parse().ok()?;
        let brightness: f64 = row.get(self.brightness)?.parse().ok()?;
        let confidence: u8 = row.get(self.confidence)?.parse().ok()?;
        let frp: f64 = row.get(self.frp)?.parse().ok()?;

        let mut hotspot = FireHotspot::new(id, Coord::new(lat, lon), frp, confidence, SourceTier::Live);
        hotspot.brightness = Some(brightness);
        hotspot.intensity = Some(brightness / BRIGHTNESS_SCALE);

        Some(hotspot)
    }
}

/**
 * Parse the text of a feed into hotspots.
 *
 * Rows are silently dropped if they are short, have a non-numeric value in a needed column, lie
 * outside the region, or fall below the confidence threshold. Ids are assigned in order to the
 * rows that are kept.
 *
 * #Returns
 * An error only if the feed is not CSV or its header is missing a needed column.
 */
pub fn parse_feed(text: &str, filter: &IngestFilter) -> Result<Vec<FireHotspot>, TierFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader.headers()?.clone();
    let columns = FeedColumns::from_header(&header)?;

    let mut hotspots: Vec<FireHotspot> = vec![];
    let mut rejected = 0;

    for row in reader.records() {
        let row = match row {
            Ok(row) if row.len() >= header.len() => row,
            _ => {
                rejected += 1;
                continue;
            }
        };

        match columns.parse_row(&row, hotspots.len() as u32) {
            Some(hotspot) if filter.accepts(&hotspot) => hotspots.push(hotspot),
            _ => rejected += 1,
        }
    }

    debug!(
        "Kept {} rows from the feed, rejected {}.",
        hotspots.len(),
        rejected
    );

    Ok(hotspots)
}

/**
 * Download and parse the feed.
 *
 * The timeout is whatever the `client` was built with. Connection problems, timeouts, and
 * non-success statuses are all reported as a [TierFailure].
 */
pub fn fetch(client: &Client, url: &str, filter: &IngestFilter) -> Result<Vec<FireHotspot>, TierFailure> {
    debug!("Requesting fire feed from {}", url);

    let response = client.get(url).send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(TierFailure::Status(status.as_u16()));
    }

    let text = response.text()?;
    parse_feed(&text, filter)
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: &str = "latitude,longitude,brightness,scan,track,acq_date,acq_time,satellite,confidence,version,bright_t31,frp,daynight";

    fn feed(rows: &[&str]) -> String {
        let mut text = HEADER.to_owned();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn test_parse_good_rows() {
        let text = feed(&[
            "30.512,75.321,330.4,1.0,1.0,2025-11-03,0530,T,85,6.1NRT,295.1,42.7,D",
            "29.901,74.002,312.0,1.1,1.0,2025-11-03,0530,A,72,6.1NRT,290.3,12.1,D",
        ]);

        let hotspots = parse_feed(&text, &IngestFilter::default()).unwrap();

        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].id, 0);
        assert_eq!(hotspots[1].id, 1);
        assert_eq!(hotspots[0].position, Coord::new(30.512, 75.321));
        assert_eq!(hotspots[0].frp, 42.7);
        assert_eq!(hotspots[0].confidence, 85);
        assert_eq!(hotspots[0].brightness, Some(330.4));
        assert_eq!(hotspots[0].intensity, Some(330.4 / 400.0));
        assert_eq!(hotspots[0].source_tier, SourceTier::Live);
    }

    #[test]
    fn test_bad_rows_are_dropped() {
        let text = feed(&[
            // short row
            "30.5,75.3,330.4,1.0",
            // non-numeric latitude
            "abc,75.3,330.4,1.0,1.0,2025-11-03,0530,T,85,6.1NRT,295.1,42.7,D",
            // non-numeric confidence
            "30.5,75.3,330.4,1.0,1.0,2025-11-03,0530,T,h,6.1NRT,295.1,42.7,D",
            // outside the region
            "25.0,75.3,330.4,1.0,1.0,2025-11-03,0530,T,85,6.1NRT,295.1,42.7,D",
            // low confidence
            "30.5,75.3,330.4,1.0,1.0,2025-11-03,0530,T,40,6.1NRT,295.1,42.7,D",
            // negative fire power
            "30.5,75.3,330.4,1.0,1.0,2025-11-03,0530,T,85,6.1NRT,295.1,-2.0,D",
            // the only good one
            "30.5,75.3,330.4,1.0,1.0,2025-11-03,0530,T,85,6.1NRT,295.1,9.5,D",
        ]);

        let hotspots = parse_feed(&text, &IngestFilter::default()).unwrap();

        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].id, 0);
        assert_eq!(hotspots[0].frp, 9.5);
    }

    #[test]
    fn test_header_only_feed_is_empty() {
        let hotspots = parse_feed(HEADER, &IngestFilter::default()).unwrap();
        assert!(hotspots.is_empty());
    }

    #[test]
    fn test_columns_found_by_name() {
        let text = "frp,confidence,longitude,latitude,brightness\n20.0,90,75.0,30.0,350.0";
        let hotspots = parse_feed(text, &IngestFilter::default()).unwrap();

        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].position, Coord::new(30.0, 75.0));
        assert_eq!(hotspots[0].frp, 20.0);
    }

    #[test]
    fn test_missing_column_fails() {
        let text = "latitude,longitude,brightness,confidence\n30.0,75.0,350.0,90";
        let err = parse_feed(text, &IngestFilter::default()).unwrap_err();
        assert!(matches!(err, TierFailure::MissingColumn("frp")));

        let err = parse_feed("", &IngestFilter::default()).unwrap_err();
        assert!(matches!(err, TierFailure::MissingColumn(_)));
    }
}

//! Reading and cleaning raw listing exports (the `listings.csv` of Inside Airbnb and friends).
use std::{io::Read, path::Path};

use serde::Deserialize;

use crate::{listing::set_listing_idxs, Listing, NcResult};

/// One row of the raw export. Every column is read as text, cleaning happens in
/// [RawListing::clean]. Columns we don't know about are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct RawListing {
    pub id: Option<String>,
    pub host_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub neighbourhood: Option<String>,
    pub property_type: Option<String>,
    pub room_type: Option<String>,
    pub bathrooms_text: Option<String>,
    pub accommodates: Option<String>,
    pub bathrooms: Option<String>,
    pub bedrooms: Option<String>,
    pub beds: Option<String>,
    pub price: Option<String>,
}

impl RawListing {
    /// Turns a raw row into a [Listing].
    /// Returns None if the host id is missing or not a number.
    /// The returned listing might still be incomplete, see [Listing::is_complete].
    pub fn clean(self) -> Option<Listing> {
        let host_id = self.host_id.as_deref().and_then(parse_id)?;
        let bathrooms = self
            .bathrooms
            .as_deref()
            .and_then(parse_float)
            .or_else(|| self.bathrooms_text.as_deref().and_then(parse_bathrooms_text));

        Some(Listing {
            id: self.id.as_deref().and_then(parse_id).unwrap_or_default(),
            idx: None,
            host_id,
            name: non_empty(self.name),
            description: non_empty(self.description),
            neighbourhood: non_empty(self.neighbourhood),
            property_type: non_empty(self.property_type),
            room_type: non_empty(self.room_type),
            bathrooms_text: non_empty(self.bathrooms_text),
            accommodates: self.accommodates.as_deref().and_then(parse_count),
            bathrooms,
            bedrooms: self.bedrooms.as_deref().and_then(parse_count),
            beds: self.beds.as_deref().and_then(parse_count),
            price: self.price.as_deref().and_then(parse_price),
            provenance: None,
        })
    }
}

/// Read all listings from a comma separated file with a header row.
/// Rows which can't be parsed or are not complete (see [Listing::is_complete]) are dropped.
/// The remaining listings get consecutive [ListingIdx](crate::listing::ListingIdx)s.
pub fn read_listings_from_csv<P: AsRef<Path>>(path: P) -> NcResult<Vec<Listing>> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    read_listings(reader)
}

/// Like [read_listings_from_csv] but reading from anything implementing [Read].
pub fn read_listings_from_reader<R: Read>(reader: R) -> NcResult<Vec<Listing>> {
    read_listings(csv::ReaderBuilder::new().flexible(true).from_reader(reader))
}

fn read_listings<R: Read>(mut reader: csv::Reader<R>) -> NcResult<Vec<Listing>> {
    let mut total = 0usize;
    let mut unparsable = 0usize;
    let mut listings = Vec::new();

    for row in reader.deserialize::<RawListing>() {
        total += 1;
        match row {
            Ok(raw) => match raw.clean() {
                Some(listing) => listings.push(listing),
                None => unparsable += 1,
            },
            Err(err) => {
                log::debug!("Could not deserialize row {}: {}", total, err);
                unparsable += 1;
            }
        }
    }

    let parsed = listings.len();
    listings.retain(Listing::is_complete);
    set_listing_idxs(listings.iter_mut());

    log::info!(
        "Read {} rows. Dropped {} unparsable and {} incomplete rows.",
        total,
        unparsable,
        parsed - listings.len()
    );

    Ok(listings)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|string| string.trim().to_string())
        .filter(|string| !string.is_empty())
}

fn parse_id(input: &str) -> Option<u64> {
    input.trim().parse().ok()
}

fn parse_float(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses "3" as well as "3.0". Fractional or negative values are rejected.
fn parse_count(input: &str) -> Option<u32> {
    let value = parse_float(input)?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

/// Strips currency symbols and thousands separators, e.g. "$1,250.00" -> 1250.0.
fn parse_price(input: &str) -> Option<f64> {
    let stripped: String = input
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '€' | '£'))
        .collect();
    parse_float(&stripped)
}

/// Reads the bathroom count out of texts like "1.5 shared baths" or "Half-bath".
fn parse_bathrooms_text(input: &str) -> Option<f64> {
    let lowercase = input.trim().to_lowercase();
    if lowercase.contains("half-bath") {
        return Some(0.5);
    }
    lowercase
        .split_whitespace()
        .next()
        .and_then(parse_float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingIdx;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn parse_price_examples() {
        assert_approx_eq!(parse_price("$1,250.00").unwrap(), 1250.0);
        assert_approx_eq!(parse_price("89").unwrap(), 89.0);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("$"), None);
    }

    #[test]
    fn parse_count_examples() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn parse_bathrooms_text_examples() {
        assert_eq!(parse_bathrooms_text("1 bath"), Some(1.0));
        assert_eq!(parse_bathrooms_text("1.5 shared baths"), Some(1.5));
        assert_eq!(parse_bathrooms_text("Half-bath"), Some(0.5));
        assert_eq!(parse_bathrooms_text("Shared half-bath"), Some(0.5));
        assert_eq!(parse_bathrooms_text("Private half-bath"), Some(0.5));
        assert_eq!(parse_bathrooms_text("no idea"), None);
    }

    #[test]
    fn read_listings_drops_incomplete_rows() {
        let csv = "\
id,host_id,name,description,neighbourhood,property_type,room_type,bathrooms_text,accommodates,bathrooms,bedrooms,beds,price,amenities
1,10,Cosy flat,Near the park,Mitte,Entire rental unit,Entire home/apt,1 bath,2,,1,1,\"$1,100.00\",[]
2,10,Room,,Mitte,Private room in home,Private room,1.5 shared baths,1,,1,1,$45.00,[]
3,11,No price,,Mitte,Private room in home,Private room,1 bath,1,,1,1,,[]
4,abc,Broken host,,Mitte,Private room in home,Private room,1 bath,1,,1,1,$45.00,[]
5,12,No beds,,Mitte,Private room in home,Private room,1 bath,1,,1,0,$45.00,[]
";
        let listings = read_listings_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].host_id, 10);
        assert_approx_eq!(listings[0].price.unwrap(), 1100.0);
        assert_approx_eq!(listings[0].bathrooms.unwrap(), 1.0);
        assert_approx_eq!(listings[1].bathrooms.unwrap(), 1.5);
        assert_eq!(listings[1].description, None);
        assert_eq!(listings[1].bathrooms_text.as_deref(), Some("1.5 shared baths"));
        assert_eq!(
            listings.iter().map(|listing| listing.idx).collect::<Vec<_>>(),
            vec![Some(ListingIdx::from(0)), Some(ListingIdx::from(1))]
        );
    }

    #[test]
    fn numeric_bathrooms_column_wins_over_text() {
        let raw = RawListing {
            host_id: Some("1".into()),
            bathrooms: Some("2".into()),
            bathrooms_text: Some("1 bath".into()),
            ..RawListing::default()
        };
        assert_eq!(raw.clean().unwrap().bathrooms, Some(2.0));
    }
}

//! This module contains functions and constants related to [Listing].

use std::fmt;

use derive_builder::Builder;
use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Gives the smallest bathroom count we accept. Half-baths are a legitimate value.
pub const MIN_BATHROOMS: f64 = 0.5;
/// Gives the smallest value for accommodates, bedrooms and beds.
pub const MIN_COUNT: u32 = 1;

/// an Identifier for a listing.
/// It should be unique and consecutive.
/// It's useful for a low cost lookup-table for listings and can be set via [set_listing_idxs].
#[derive(Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, From, Into, Hash, Default)]
pub struct ListingIdx(usize);

/// Sets unique and consecutive [ListingIdx]s for the given Listings, starting from 0.
/// If the Listing.idx is already set, calling this function will overwrite it.
pub fn set_listing_idxs<'i>(listings: impl Iterator<Item = &'i mut Listing>) {
    listings
        .enumerate()
        .for_each(|(idx, listing)| listing.idx = Some(ListingIdx(idx)));
}

/// The numeric attributes of a listing we predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum NumericTarget {
    Accommodates,
    Bathrooms,
    Bedrooms,
    Beds,
    Price,
}

impl NumericTarget {
    /// All numeric targets, in column order.
    pub const ALL: [NumericTarget; 5] = [
        NumericTarget::Accommodates,
        NumericTarget::Bathrooms,
        NumericTarget::Bedrooms,
        NumericTarget::Beds,
        NumericTarget::Price,
    ];

    /// The column name of this target.
    pub fn name(self) -> &'static str {
        match self {
            NumericTarget::Accommodates => "accommodates",
            NumericTarget::Bathrooms => "bathrooms",
            NumericTarget::Bedrooms => "bedrooms",
            NumericTarget::Beds => "beds",
            NumericTarget::Price => "price",
        }
    }
}

/// The categorical attributes of a listing we predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum CategoricalTarget {
    PropertyType,
    RoomType,
    BathroomsText,
}

impl CategoricalTarget {
    /// All categorical targets, in column order.
    pub const ALL: [CategoricalTarget; 3] = [
        CategoricalTarget::PropertyType,
        CategoricalTarget::RoomType,
        CategoricalTarget::BathroomsText,
    ];

    /// The column name of this target.
    pub fn name(self) -> &'static str {
        match self {
            CategoricalTarget::PropertyType => "property_type",
            CategoricalTarget::RoomType => "room_type",
            CategoricalTarget::BathroomsText => "bathrooms_text",
        }
    }

    /// Must a complete listing carry this target?
    pub fn is_required(self) -> bool {
        !matches!(self, CategoricalTarget::BathroomsText)
    }
}

/// The names of all target columns, numeric ones first.
pub fn target_column_names() -> Vec<String> {
    NumericTarget::ALL
        .iter()
        .map(|target| target.name())
        .chain(CategoricalTarget::ALL.iter().map(|target| target.name()))
        .map(String::from)
        .collect()
}

/// Where did a prediction come from?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// The host's own training listings were aggregated.
    Host,
    /// The host was unknown, so the population default was used.
    Global,
    /// The learned model predicted from the free-text fields.
    Features,
}

impl Provenance {
    /// The tag used in logs and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Host => "host",
            Provenance::Global => "global",
            Provenance::Features => "features",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// This struct represents a short-term rental listing in our dataset.
#[derive(Clone, Debug, PartialEq, Default, Builder, Serialize, Deserialize)]
pub struct Listing {
    /// Gives the id of this listing, as found in the source data.
    #[builder(default)]
    pub id: u64,
    /// Might give the [ListingIdx], a unique identifer for the Listing.
    /// WARNING: You can only be safe that this is unique if you use [set_listing_idxs] for all listings **at once**
    #[builder(setter(strip_option), default)]
    #[serde(skip)]
    pub idx: Option<ListingIdx>,
    /// Gives the host owning this listing.
    #[builder(default)]
    pub host_id: u64,
    /// Might give the title of the listing.
    #[builder(setter(into, strip_option), default)]
    pub name: Option<String>,
    /// Might give the free-text description of the listing.
    #[builder(setter(into, strip_option), default)]
    pub description: Option<String>,
    /// Might give the neighbourhood as written by the host.
    #[builder(setter(into, strip_option), default)]
    pub neighbourhood: Option<String>,
    /// Might give the property type, e.g. "Entire rental unit".
    #[builder(setter(into, strip_option), default)]
    pub property_type: Option<String>,
    /// Might give the room type, e.g. "Private room".
    #[builder(setter(into, strip_option), default)]
    pub room_type: Option<String>,
    /// Might give the bathroom description, e.g. "1.5 shared baths".
    #[builder(setter(into, strip_option), default)]
    pub bathrooms_text: Option<String>,
    /// Might give how many guests fit.
    #[builder(setter(strip_option), default)]
    pub accommodates: Option<u32>,
    /// Might give the number of bathrooms, in steps of 0.5.
    #[builder(setter(strip_option), default)]
    pub bathrooms: Option<f64>,
    /// Might give the number of bedrooms.
    #[builder(setter(strip_option), default)]
    pub bedrooms: Option<u32>,
    /// Might give the number of beds.
    #[builder(setter(strip_option), default)]
    pub beds: Option<u32>,
    /// Might give the nightly price, currency symbols already stripped.
    #[builder(setter(strip_option), default)]
    pub price: Option<f64>,
    /// Set by predictors only: where the predicted targets came from.
    #[builder(setter(strip_option), default)]
    pub provenance: Option<Provenance>,
}

impl Listing {
    /// Returns the value of a numeric target, if set.
    /// # Example
    /// ```
    /// # use common::*;
    /// let listing = ListingBuilder::default().beds(2).price(80.0).build().unwrap();
    /// assert_eq!(listing.numeric_target(NumericTarget::Beds), Some(2.0));
    /// assert_eq!(listing.numeric_target(NumericTarget::Bedrooms), None);
    /// ```
    pub fn numeric_target(&self, target: NumericTarget) -> Option<f64> {
        match target {
            NumericTarget::Accommodates => self.accommodates.map(f64::from),
            NumericTarget::Bathrooms => self.bathrooms,
            NumericTarget::Bedrooms => self.bedrooms.map(f64::from),
            NumericTarget::Beds => self.beds.map(f64::from),
            NumericTarget::Price => self.price,
        }
    }

    /// Returns the value of a categorical target, if set.
    pub fn categorical_target(&self, target: CategoricalTarget) -> Option<&str> {
        match target {
            CategoricalTarget::PropertyType => self.property_type.as_deref(),
            CategoricalTarget::RoomType => self.room_type.as_deref(),
            CategoricalTarget::BathroomsText => self.bathrooms_text.as_deref(),
        }
    }

    /// Returns the free-text input fields in the order name, description, neighbourhood.
    /// Missing fields are given as empty strings.
    pub fn text_fields(&self) -> [&str; 3] {
        [
            self.name.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
            self.neighbourhood.as_deref().unwrap_or(""),
        ]
    }

    /// This function sets all fields to None, which a predictor is supposed to fill in.
    /// Identity and free-text fields are kept.
    /// # Example
    /// ```
    /// # use common::*;
    /// let mut listing = ListingBuilder::default().host_id(7).price(99.0).room_type("Private room").build().unwrap();
    /// listing.clear_target_information();
    /// assert!(listing.price.is_none());
    /// assert!(listing.room_type.is_none());
    /// assert_eq!(listing.host_id, 7);
    /// ```
    pub fn clear_target_information(&mut self) {
        self.property_type = None;
        self.room_type = None;
        self.bathrooms_text = None;
        self.accommodates = None;
        self.bathrooms = None;
        self.bedrooms = None;
        self.beds = None;
        self.price = None;
        self.provenance = None;
    }

    /// Does the listing carry every required target with a value inside its domain?
    /// That is: property and room type are set, counts are at least one, bathrooms are at least
    /// half a bath and price is positive and finite.
    /// # Example
    /// ```
    /// # use common::*;
    /// let complete = ListingBuilder::default()
    ///     .property_type("Entire home").room_type("Entire home/apt")
    ///     .accommodates(2).bedrooms(1).beds(1).bathrooms(1.0).price(120.0)
    ///     .build().unwrap();
    /// assert!(complete.is_complete());
    ///
    /// let mut free = complete.clone();
    /// free.price = Some(0.0);
    /// assert!(!free.is_complete());
    /// ```
    pub fn is_complete(&self) -> bool {
        let counts_valid = [self.accommodates, self.bedrooms, self.beds]
            .iter()
            .all(|count| count.map_or(false, |value| value >= MIN_COUNT));
        let bathrooms_valid = self
            .bathrooms
            .map_or(false, |value| value.is_finite() && value >= MIN_BATHROOMS);
        let price_valid = self
            .price
            .map_or(false, |value| value.is_finite() && value > 0.0);
        let categories_valid = CategoricalTarget::ALL
            .iter()
            .filter(|target| target.is_required())
            .all(|&target| self.categorical_target(target).is_some());

        counts_valid && bathrooms_valid && price_valid && categories_valid
    }

    /// Hashes the host id together with `seed` into a single byte.
    /// All listings of the same host get the same value.
    pub fn deterministic_host_index(&self, seed: &str) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        let seed_sha = hasher.finalize()[0];

        let mut hasher = Sha256::new();
        hasher.update(self.host_id.to_string());
        let host_id_sha = hasher.finalize()[0];

        seed_sha ^ host_id_sha
    }
}

/// A full set of predicted targets.
/// Counts are whole numbers, bathrooms a multiple of 0.5 and price has at most two decimals,
/// if produced by one of our predictors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ListingPrediction {
    pub property_type: String,
    pub room_type: String,
    pub bathrooms_text: Option<String>,
    pub accommodates: u32,
    pub bathrooms: f64,
    pub bedrooms: u32,
    pub beds: u32,
    pub price: f64,
}

impl ListingPrediction {
    /// Writes all predicted targets and the provenance into `listing`.
    pub fn apply_to(&self, listing: &mut Listing, provenance: Provenance) {
        listing.property_type = Some(self.property_type.clone());
        listing.room_type = Some(self.room_type.clone());
        listing.bathrooms_text = self.bathrooms_text.clone();
        listing.accommodates = Some(self.accommodates);
        listing.bathrooms = Some(self.bathrooms);
        listing.bedrooms = Some(self.bedrooms);
        listing.beds = Some(self.beds);
        listing.price = Some(self.price);
        listing.provenance = Some(provenance);
    }

    /// Returns the value of a numeric target.
    pub fn numeric_target(&self, target: NumericTarget) -> f64 {
        match target {
            NumericTarget::Accommodates => f64::from(self.accommodates),
            NumericTarget::Bathrooms => self.bathrooms,
            NumericTarget::Bedrooms => f64::from(self.bedrooms),
            NumericTarget::Beds => f64::from(self.beds),
            NumericTarget::Price => self.price,
        }
    }

    /// Returns the value of a categorical target.
    pub fn categorical_target(&self, target: CategoricalTarget) -> Option<&str> {
        match target {
            CategoricalTarget::PropertyType => Some(&self.property_type),
            CategoricalTarget::RoomType => Some(&self.room_type),
            CategoricalTarget::BathroomsText => self.bathrooms_text.as_deref(),
        }
    }
}

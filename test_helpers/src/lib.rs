#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]
//! This crate contains stuff that's really helpful for tests.
use common::{listing::set_listing_idxs, Listing, ListingBuilder};
use proptest::prelude::*;

/// This function creates a new, complete Listing of the given host.
/// All other values are fixed, so tests can overwrite just what they care about.
pub fn create_new_listing(host_id: u64) -> Listing {
    ListingBuilder::default()
        .host_id(host_id)
        .name("Sunny loft")
        .property_type("Entire rental unit")
        .room_type("Entire home/apt")
        .bathrooms_text("1 bath")
        .accommodates(2)
        .bathrooms(1.0)
        .bedrooms(1)
        .beds(1)
        .price(100.0)
        .build()
        .unwrap()
}

/// Gives a strategy generating property types.
pub fn property_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Entire rental unit".to_string()),
        Just("Private room in home".to_string()),
        Just("Entire loft".to_string()),
        Just("Room in boutique hotel".to_string()),
    ]
}

/// Gives a strategy generating room types.
pub fn room_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Entire home/apt".to_string()),
        Just("Private room".to_string()),
        Just("Shared room".to_string()),
        Just("Hotel room".to_string()),
    ]
}

/// Gives a strategy generating bathroom descriptions, or none at all.
pub fn bathrooms_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("1 bath".to_string())),
        Just(Some("1.5 shared baths".to_string())),
        Just(Some("Half-bath".to_string())),
    ]
}

/// Gives a strategy generating free text made of a few words.
pub fn free_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("cosy"),
            Just("sunny"),
            Just("loft"),
            Just("garden"),
            Just("station"),
            Just("quiet"),
            Just("mitte"),
            Just("kreuzberg"),
        ],
        0..8,
    )
    .prop_map(|words| words.join(" "))
}

prop_compose! {
    /// Gives a strategy that generates a complete Listing of one of the hosts `0..hosts`.
    pub fn full_listing_of_hosts(hosts: u64)(
        id in 0..u64::MAX,
        host_id in 0..hosts,
        name in free_text(),
        description in free_text(),
        neighbourhood in free_text(),
        property_type in property_type(),
        room_type in room_type(),
        bathrooms_text in bathrooms_text(),
        accommodates in 1u32..16u32,
        half_baths in 1u32..10u32,
        bedrooms in 1u32..8u32,
        beds in 1u32..12u32,
        cents in 100u64..1_000_000u64,
    ) -> Listing {
        Listing {
            id,
            idx: None,
            host_id,
            name: Some(name),
            description: Some(description),
            neighbourhood: Some(neighbourhood),
            property_type: Some(property_type),
            room_type: Some(room_type),
            bathrooms_text,
            accommodates: Some(accommodates),
            bathrooms: Some(f64::from(half_baths) * 0.5),
            bedrooms: Some(bedrooms),
            beds: Some(beds),
            price: Some(cents as f64 / 100.0),
            provenance: None,
        }
    }
}

/// Gives a strategy that generates a complete Listing.
/// Hosts are drawn from a small range, so hosts with several listings are common.
pub fn full_listing() -> impl Strategy<Value = Listing> {
    full_listing_of_hosts(32)
}

prop_compose! {
    /// Gives a strategy generating between one and `limit` many [full_listing]s.
    /// Calls [set_listing_idxs].
    pub fn full_listings(limit: usize)(mut listings in prop::collection::vec(full_listing(), 1..limit)) -> Vec<Listing> {
        set_listing_idxs(listings.iter_mut());
        listings
    }
}

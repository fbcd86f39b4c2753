//! Deterministic mock place data.
//!
//! Used whenever a requested place CSV is absent. A fixed seed produces a
//! byte-identical dataset across runs; the generated set is written back to
//! the CSV path so later calls in the same process observe the same data.

use super::{Place, PlaceCategory};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

/// Seed used when no explicit seed is supplied.
pub const DEFAULT_SEED: u64 = 42;

/// Number of places generated by default.
pub const DEFAULT_N_PLACES: usize = 200;

/// Rough lat/lng rectangle each category is biased toward (LA area).
fn category_region(category: PlaceCategory) -> ((f64, f64), (f64, f64)) {
    match category {
        PlaceCategory::Hotel => ((34.0, 34.2), (-118.4, -118.2)),
        PlaceCategory::Restaurant => ((34.05, 34.15), (-118.35, -118.25)),
        PlaceCategory::GasStation => ((34.0, 34.3), (-118.5, -118.1)),
        PlaceCategory::Attraction => ((34.05, 34.1), (-118.33, -118.28)),
        PlaceCategory::RestArea => ((34.02, 34.25), (-118.45, -118.15)),
    }
}

/// Name prefix pool per category; rest areas use a fixed pattern.
fn name_prefixes(category: PlaceCategory) -> &'static [&'static str] {
    match category {
        PlaceCategory::Hotel => &["Grand", "Luxury", "Comfort", "Budget", "Royal"],
        PlaceCategory::Restaurant => &["Tasty", "Delicious", "Gourmet", "Quick", "Fancy"],
        PlaceCategory::GasStation => &["Fast", "Quick", "Super", "Economy", "Value"],
        PlaceCategory::Attraction => &["Amazing", "Spectacular", "Historic", "Fun", "Must-See"],
        PlaceCategory::RestArea => &[],
    }
}

fn place_name(category: PlaceCategory, index: usize, rng: &mut StdRng) -> String {
    let prefixes = name_prefixes(category);
    match category {
        PlaceCategory::Hotel => format!("{} Hotel {index}", prefixes.choose(rng).expect("prefix pool is non-empty")),
        PlaceCategory::Restaurant => format!("{} Eats {index}", prefixes.choose(rng).expect("prefix pool is non-empty")),
        PlaceCategory::GasStation => format!("{} Gas {index}", prefixes.choose(rng).expect("prefix pool is non-empty")),
        PlaceCategory::Attraction => {
            format!("{} Attraction {index}", prefixes.choose(rng).expect("prefix pool is non-empty"))
        }
        PlaceCategory::RestArea => format!("Rest Stop {index}"),
    }
}

/// Generates `n` synthetic places with a fixed seed.
///
/// Each place gets a category-biased location, a rating in 1–5, a price
/// level in 1–4, a popularity score in 0–100, and a generated name and
/// address. The same `(n, seed)` pair always produces the same output.
#[must_use]
pub fn generate_places(n: usize, seed: u64) -> Vec<Place> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut places = Vec::with_capacity(n);

    for i in 0..n {
        let category = *PlaceCategory::ALL
            .choose(&mut rng)
            .expect("category set is non-empty");
        let ((lat_lo, lat_hi), (lng_lo, lng_hi)) = category_region(category);

        let latitude = rng.gen_range(lat_lo..lat_hi);
        let longitude = rng.gen_range(lng_lo..lng_hi);
        let rating = rng.gen_range(1.0f32..5.0);
        let price_level = rng.gen_range(1u8..5);
        let popularity_score = rng.gen_range(0.0f32..100.0);
        let name = place_name(category, i, &mut rng);

        places.push(Place {
            place_id: format!("place_{i}"),
            name,
            category,
            latitude,
            longitude,
            rating,
            price_level,
            popularity_score,
            address: format!("{i} Mock Street, Los Angeles, CA"),
            cluster: None,
        });
    }

    places
}

/// Writes places to a CSV file with one row per place.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_places_csv<P: AsRef<Path>>(path: P, places: &[Place]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for place in places {
        writer.serialize(place)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads places from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row fails to parse.
pub fn read_places_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Place>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut places = Vec::new();
    for row in reader.deserialize() {
        places.push(row?);
    }
    Ok(places)
}

/// Loads places from `path`, falling back to mock generation.
///
/// A missing file is not an error: the default mock dataset is generated,
/// persisted to `path` as a side effect, and returned.
///
/// # Errors
///
/// Returns an error if an existing file fails to parse or the fallback
/// write fails.
pub fn load_or_generate<P: AsRef<Path>>(path: P) -> Result<Vec<Place>> {
    let path = path.as_ref();
    if path.exists() {
        return read_places_csv(path);
    }
    info!(path = %path.display(), "place data missing, generating mock dataset");
    let places = generate_places(DEFAULT_N_PLACES, DEFAULT_SEED);
    write_places_csv(path, &places)?;
    Ok(places)
}

//! Deterministic mock travel data.
//!
//! Synthetic trips with a plausible speed model: free flow at 60 km/h,
//! slowed by rush hour and bad weather, slightly faster on holidays, with
//! multiplicative gaussian noise on the resulting time.

use super::{TravelFeatures, Weather};
use crate::error::{PredecirError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

/// Seed used when no explicit seed is supplied.
pub const DEFAULT_SEED: u64 = 42;

/// Number of trips generated by default.
pub const DEFAULT_N_TRIPS: usize = 1000;

/// Free-flow speed in km/h.
const BASE_SPEED_KMH: f32 = 60.0;

/// One labelled trip, as stored in CSV.
///
/// Boolean flags are stored as 0/1 so the file stays trivially loadable
/// by external tools.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TravelRecord {
    /// Trip distance in kilometers.
    pub distance_km: f32,
    /// Day of week, 0 = Sunday.
    pub day_of_week: u8,
    /// Hour of day, 0-23.
    pub hour_of_day: u8,
    /// Holiday flag, 0 or 1.
    pub is_holiday: u8,
    /// Rush hour flag, 0 or 1.
    pub is_rush_hour: u8,
    /// Weather code, 0-4.
    pub weather_code: u8,
    /// Observed travel time in minutes.
    pub travel_time_minutes: f32,
}

impl TravelRecord {
    /// The input-feature part of this record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored weather code is unknown.
    pub fn features(&self) -> Result<TravelFeatures> {
        let weather = Weather::from_code(self.weather_code).ok_or_else(|| {
            PredecirError::invalid_input("weather_code", "unknown weather code")
        })?;
        Ok(TravelFeatures {
            distance_km: self.distance_km,
            day_of_week: self.day_of_week,
            hour_of_day: self.hour_of_day,
            is_holiday: self.is_holiday != 0,
            is_rush_hour: self.is_rush_hour != 0,
            weather,
        })
    }
}

/// Standard gaussian sample via Box-Muller.
fn gaussian(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(0.0001..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Travel time in minutes for the given trip, before noise.
fn expected_minutes(features: &TravelFeatures) -> f32 {
    let mut speed = BASE_SPEED_KMH;
    if features.is_rush_hour {
        speed *= 0.7;
    }
    if features.is_holiday {
        speed *= 1.1;
    }
    speed *= features.weather.speed_factor();
    features.distance_km / speed * 60.0
}

/// Generates `n` labelled trips with a fixed seed.
///
/// Distances are uniform in 1-100 km, 10% of trips fall on holidays, 30%
/// in rush hour, weather is uniform over the known conditions. Observed
/// times carry 10% multiplicative gaussian noise and are floored at one
/// minute.
#[must_use]
pub fn generate_travel_data(n: usize, seed: u64) -> Vec<TravelRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(n);

    for _ in 0..n {
        let features = TravelFeatures {
            distance_km: rng.gen_range(1.0f32..100.0),
            day_of_week: rng.gen_range(0u8..7),
            hour_of_day: rng.gen_range(0u8..24),
            is_holiday: rng.gen_range(0.0f32..1.0) < 0.1,
            is_rush_hour: rng.gen_range(0.0f32..1.0) < 0.3,
            weather: *Weather::ALL
                .choose(&mut rng)
                .expect("weather set is non-empty"),
        };

        let noisy = expected_minutes(&features) * (1.0 + 0.1 * gaussian(&mut rng));
        let travel_time_minutes = noisy.max(1.0);

        records.push(TravelRecord {
            distance_km: features.distance_km,
            day_of_week: features.day_of_week,
            hour_of_day: features.hour_of_day,
            is_holiday: u8::from(features.is_holiday),
            is_rush_hour: u8::from(features.is_rush_hour),
            weather_code: features.weather.code(),
            travel_time_minutes,
        });
    }

    records
}

/// Writes trips to a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_travel_csv<P: AsRef<Path>>(path: P, records: &[TravelRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads trips from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row fails to parse.
pub fn read_travel_csv<P: AsRef<Path>>(path: P) -> Result<Vec<TravelRecord>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Loads trips from `path`, falling back to mock generation.
///
/// A missing file is not an error: the default mock dataset is generated,
/// persisted to `path` as a side effect, and returned.
///
/// # Errors
///
/// Returns an error if an existing file fails to parse or the fallback
/// write fails.
pub fn load_or_generate<P: AsRef<Path>>(path: P) -> Result<Vec<TravelRecord>> {
    let path = path.as_ref();
    if path.exists() {
        return read_travel_csv(path);
    }
    info!(path = %path.display(), "travel data missing, generating mock dataset");
    let records = generate_travel_data(DEFAULT_N_TRIPS, DEFAULT_SEED);
    write_travel_csv(path, &records)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let a = generate_travel_data(100, DEFAULT_SEED);
        let b = generate_travel_data(100, DEFAULT_SEED);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_attribute_ranges() {
        for r in generate_travel_data(300, DEFAULT_SEED) {
            assert!((1.0..100.0).contains(&r.distance_km));
            assert!(r.day_of_week < 7);
            assert!(r.hour_of_day < 24);
            assert!(r.is_holiday <= 1);
            assert!(r.is_rush_hour <= 1);
            assert!(r.weather_code < 5);
            assert!(r.travel_time_minutes >= 1.0);
        }
    }

    #[test]
    fn test_flag_rates_roughly_match() {
        let records = generate_travel_data(1000, DEFAULT_SEED);
        let holidays = records.iter().filter(|r| r.is_holiday == 1).count();
        let rush = records.iter().filter(|r| r.is_rush_hour == 1).count();
        assert!((50..200).contains(&holidays), "holidays = {holidays}");
        assert!((200..400).contains(&rush), "rush = {rush}");
    }

    #[test]
    fn test_expected_minutes_slower_in_rush_hour() {
        let base = TravelFeatures {
            distance_km: 30.0,
            day_of_week: 1,
            hour_of_day: 8,
            is_holiday: false,
            is_rush_hour: false,
            weather: Weather::Clear,
        };
        let rush = TravelFeatures {
            is_rush_hour: true,
            ..base
        };
        assert!((expected_minutes(&base) - 30.0).abs() < 1e-4);
        assert!(expected_minutes(&rush) > expected_minutes(&base));
    }

    #[test]
    fn test_record_features_round_trip() {
        let record = generate_travel_data(1, DEFAULT_SEED).remove(0);
        let features = record.features().unwrap();
        assert_eq!(features.distance_km, record.distance_km);
        assert_eq!(u8::from(features.is_holiday), record.is_holiday);
        assert_eq!(features.weather.code(), record.weather_code);
    }

    #[test]
    fn test_bad_weather_code_rejected() {
        let mut record = generate_travel_data(1, DEFAULT_SEED).remove(0);
        record.weather_code = 9;
        assert_eq!(record.features().unwrap_err().kind(), "invalid_input");
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel.csv");

        let records = generate_travel_data(25, DEFAULT_SEED);
        write_travel_csv(&path, &records).unwrap();
        let loaded = read_travel_csv(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_load_or_generate_writes_csv_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel.csv");

        let generated = load_or_generate(&path).unwrap();
        assert!(path.exists());
        assert_eq!(generated.len(), DEFAULT_N_TRIPS);

        let reloaded = load_or_generate(&path).unwrap();
        assert_eq!(reloaded, generated);
    }
}

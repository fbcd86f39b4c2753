//! Place recommendation pipeline.
//!
//! Points of interest are clustered on standardized features; at request
//! time candidates are filtered by preference predicates, scored by a
//! fixed blend of proximity, rating, and cluster affinity, and the top-K
//! returned.

pub mod geo;
pub mod mock;
pub mod model;
pub mod scorer;

pub use model::{ClusterSummary, PlaceRecommender, RecommenderContext};

use serde::{Deserialize, Serialize};

/// The fixed set of place categories known to the mock generator and the
/// preference filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    /// Overnight accommodation.
    Hotel,
    /// Food and drink.
    Restaurant,
    /// Fuel stop.
    GasStation,
    /// Sight or activity.
    Attraction,
    /// Highway rest area.
    RestArea,
}

impl PlaceCategory {
    /// All categories, in a stable order.
    pub const ALL: [PlaceCategory; 5] = [
        PlaceCategory::Hotel,
        PlaceCategory::Restaurant,
        PlaceCategory::GasStation,
        PlaceCategory::Attraction,
        PlaceCategory::RestArea,
    ];

    /// Snake-case label, as stored in CSV and request mappings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Hotel => "hotel",
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::GasStation => "gas_station",
            PlaceCategory::Attraction => "attraction",
            PlaceCategory::RestArea => "rest_area",
        }
    }

    /// Parses a snake-case label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "hotel" => Some(PlaceCategory::Hotel),
            "restaurant" => Some(PlaceCategory::Restaurant),
            "gas_station" => Some(PlaceCategory::GasStation),
            "attraction" => Some(PlaceCategory::Attraction),
            "rest_area" => Some(PlaceCategory::RestArea),
            _ => None,
        }
    }
}

/// A point of interest.
///
/// Immutable once loaded for a given request; `cluster` is attached by the
/// trainer after fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Stable identifier.
    pub place_id: String,
    /// Display name.
    pub name: String,
    /// Category from the fixed set.
    pub category: PlaceCategory,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Rating in 1–5.
    pub rating: f32,
    /// Price level in 1–4.
    pub price_level: u8,
    /// Popularity score in 0–100.
    pub popularity_score: f32,
    /// Street address.
    pub address: String,
    /// Assigned cluster id, present after training.
    #[serde(default)]
    pub cluster: Option<usize>,
}

/// A caller's location, one per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Optional preference predicates, each independently applicable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Keep places with `price_level <= max_price`.
    pub max_price: Option<u8>,
    /// Keep places with `rating >= min_rating`.
    pub min_rating: Option<f32>,
    /// Keep places of exactly this category.
    pub place_type: Option<PlaceCategory>,
}

impl Preferences {
    /// True when the place satisfies every supplied predicate.
    #[must_use]
    pub fn matches(&self, place: &Place) -> bool {
        if let Some(max_price) = self.max_price {
            if place.price_level > max_price {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if place.rating < min_rating {
                return false;
            }
        }
        if let Some(place_type) = self.place_type {
            if place.category != place_type {
                return false;
            }
        }
        true
    }
}

/// A place augmented with its computed distance and blended score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommended place.
    #[serde(flatten)]
    pub place: Place,
    /// Great-circle distance from the user in kilometers.
    pub distance_km: f64,
    /// Blended score in [0, 1].
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(category: PlaceCategory, rating: f32, price_level: u8) -> Place {
        Place {
            place_id: "p0".to_string(),
            name: "Test".to_string(),
            category,
            latitude: 34.1,
            longitude: -118.3,
            rating,
            price_level,
            popularity_score: 50.0,
            address: "1 Test St".to_string(),
            cluster: None,
        }
    }

    #[test]
    fn test_category_labels_round_trip() {
        for cat in PlaceCategory::ALL {
            assert_eq!(PlaceCategory::from_label(cat.as_str()), Some(cat));
        }
        assert_eq!(PlaceCategory::from_label("spaceport"), None);
    }

    #[test]
    fn test_empty_preferences_match_everything() {
        let prefs = Preferences::default();
        assert!(prefs.matches(&place(PlaceCategory::Hotel, 1.0, 4)));
    }

    #[test]
    fn test_max_price_predicate() {
        let prefs = Preferences {
            max_price: Some(2),
            ..Default::default()
        };
        assert!(prefs.matches(&place(PlaceCategory::Hotel, 3.0, 2)));
        assert!(!prefs.matches(&place(PlaceCategory::Hotel, 3.0, 3)));
    }

    #[test]
    fn test_min_rating_predicate() {
        let prefs = Preferences {
            min_rating: Some(4.0),
            ..Default::default()
        };
        assert!(prefs.matches(&place(PlaceCategory::Hotel, 4.0, 1)));
        assert!(!prefs.matches(&place(PlaceCategory::Hotel, 3.9, 1)));
    }

    #[test]
    fn test_place_type_predicate() {
        let prefs = Preferences {
            place_type: Some(PlaceCategory::Restaurant),
            ..Default::default()
        };
        assert!(prefs.matches(&place(PlaceCategory::Restaurant, 3.0, 1)));
        assert!(!prefs.matches(&place(PlaceCategory::Hotel, 3.0, 1)));
    }

    #[test]
    fn test_all_predicates_combine() {
        let prefs = Preferences {
            max_price: Some(3),
            min_rating: Some(4.0),
            place_type: Some(PlaceCategory::Restaurant),
        };
        assert!(prefs.matches(&place(PlaceCategory::Restaurant, 4.5, 2)));
        assert!(!prefs.matches(&place(PlaceCategory::Restaurant, 4.5, 4)));
        assert!(!prefs.matches(&place(PlaceCategory::Restaurant, 3.0, 2)));
        assert!(!prefs.matches(&place(PlaceCategory::Attraction, 4.5, 2)));
    }
}

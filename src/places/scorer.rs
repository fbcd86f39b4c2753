//! Candidate filtering and score blending.
//!
//! Candidates are filtered by the preference predicates first, then each
//! survivor is scored as a fixed blend of proximity, rating, and cluster
//! affinity. Proximity is normalized against the farthest survivor so the
//! distance term always lands in [0, 1] regardless of the query area.

use super::geo::haversine_km;
use super::{Place, Preferences, Recommendation, UserLocation};

/// Weight of the proximity term.
pub const W_DISTANCE: f64 = 0.5;
/// Weight of the rating term.
pub const W_RATING: f64 = 0.3;
/// Weight of the cluster-affinity term.
pub const W_CLUSTER: f64 = 0.2;

/// Filters, scores, and ranks candidates, returning the top `k`.
///
/// `user_cluster` is the cluster the user's position falls into; a place
/// in the same cluster receives the full affinity bonus. Ties keep the
/// candidates' original order. A candidate whose score comes out
/// non-finite (a NaN rating in the source data) is dropped rather than
/// ranked.
#[must_use]
pub fn rank(
    candidates: &[Place],
    user: &UserLocation,
    preferences: &Preferences,
    user_cluster: Option<usize>,
    k: usize,
) -> Vec<Recommendation> {
    let survivors: Vec<(&Place, f64)> = candidates
        .iter()
        .filter(|p| preferences.matches(p))
        .map(|p| {
            let d = haversine_km(user.latitude, user.longitude, p.latitude, p.longitude);
            (p, d)
        })
        .collect();

    if survivors.is_empty() {
        return Vec::new();
    }

    let max_distance = survivors
        .iter()
        .map(|&(_, d)| d)
        .fold(0.0f64, f64::max);
    // All survivors at the query point: avoid 0/0, every distance term is 1.
    let max_distance = if max_distance == 0.0 { 1.0 } else { max_distance };

    let mut ranked: Vec<Recommendation> = survivors
        .into_iter()
        .map(|(place, distance_km)| {
            let distance_score = 1.0 - distance_km / max_distance;
            let rating_score = f64::from(place.rating) / 5.0;
            let cluster_score = match (place.cluster, user_cluster) {
                (Some(p), Some(u)) if p == u => 1.0,
                _ => 0.0,
            };
            let score =
                W_DISTANCE * distance_score + W_RATING * rating_score + W_CLUSTER * cluster_score;
            Recommendation {
                place: place.clone(),
                distance_km,
                score,
            }
        })
        .filter(|rec| rec.score.is_finite())
        .collect();

    // sort_by is stable, so equal scores keep input order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    ranked
}

//! JSON service wrappers.
//!
//! Thin request/response adapters over the two contexts. Requests and
//! responses are `serde_json` values; every response carries a `status`
//! field, and failures map the error's `kind()` into a stable `error`
//! code so callers can branch without parsing messages.

use crate::error::{PredecirError, Result};
use crate::places::{PlaceCategory, Preferences, RecommenderContext, UserLocation};
use crate::travel::{PredictorContext, TravelFeatures, Weather};
use crate::travel::model::PREDICTION_CONFIDENCE;
use serde_json::{json, Value};
use tracing::warn;

/// Default number of recommendations when the request omits `limit`.
pub const DEFAULT_LIMIT: usize = 5;

fn error_envelope(err: &PredecirError) -> Value {
    warn!(error = %err, kind = err.kind(), "request failed");
    json!({
        "status": "error",
        "error": err.kind(),
        "message": err.to_string(),
    })
}

fn required_f64(request: &Value, field: &str) -> Result<f64> {
    request
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| PredecirError::invalid_input(field, "missing or not a number"))
}

fn optional_u64(request: &Value, field: &str) -> Result<Option<u64>> {
    match request.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| PredecirError::invalid_input(field, "not a non-negative integer")),
    }
}

fn required_u64(request: &Value, field: &str) -> Result<u64> {
    optional_u64(request, field)?
        .ok_or_else(|| PredecirError::invalid_input(field, "missing or not a non-negative integer"))
}

/// Flags arrive as JSON booleans or as 0/1 from form-ish clients.
fn required_flag(request: &Value, field: &str) -> Result<bool> {
    match request.get(field) {
        None | Some(Value::Null) => Err(PredecirError::invalid_input(field, "missing")),
        Some(Value::Bool(b)) => Ok(*b),
        Some(v) => match v.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(PredecirError::invalid_input(field, "expected a boolean or 0/1")),
        },
    }
}

fn parse_preferences(request: &Value) -> Result<Preferences> {
    let Some(prefs) = request.get("preferences") else {
        return Ok(Preferences::default());
    };
    if prefs.is_null() {
        return Ok(Preferences::default());
    }
    if !prefs.is_object() {
        return Err(PredecirError::invalid_input(
            "preferences",
            "expected an object",
        ));
    }

    let max_price = match optional_u64(prefs, "max_price")? {
        None => None,
        Some(p) => Some(
            u8::try_from(p)
                .ok()
                .filter(|&p| (1..=4).contains(&p))
                .ok_or_else(|| PredecirError::invalid_input("max_price", "must be in 1..=4"))?,
        ),
    };

    let min_rating = match prefs.get("min_rating") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let r = v.as_f64().ok_or_else(|| {
                PredecirError::invalid_input("min_rating", "not a number")
            })?;
            if !(0.0..=5.0).contains(&r) {
                return Err(PredecirError::invalid_input(
                    "min_rating",
                    "must be in 0..=5",
                ));
            }
            Some(r as f32)
        }
    };

    let place_type = match prefs.get("place_type") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let label = v.as_str().ok_or_else(|| {
                PredecirError::invalid_input("place_type", "not a string")
            })?;
            Some(PlaceCategory::from_label(label).ok_or_else(|| {
                PredecirError::invalid_input("place_type", "unknown category")
            })?)
        }
    };

    Ok(Preferences {
        max_price,
        min_rating,
        place_type,
    })
}

fn parse_weather(request: &Value) -> Result<Weather> {
    match request.get("weather_condition") {
        None | Some(Value::Null) => Err(PredecirError::invalid_input(
            "weather_condition",
            "missing",
        )),
        Some(Value::String(label)) => Weather::from_label(label)
            .ok_or_else(|| PredecirError::invalid_input("weather_condition", "unknown condition")),
        Some(v) => {
            let code = v
                .as_u64()
                .and_then(|c| u8::try_from(c).ok())
                .ok_or_else(|| {
                    PredecirError::invalid_input("weather_condition", "expected a code or label")
                })?;
            Weather::from_code(code).ok_or_else(|| {
                PredecirError::invalid_input("weather_condition", "unknown weather code")
            })
        }
    }
}

fn parse_recommendation_request(request: &Value) -> Result<(UserLocation, Preferences, usize)> {
    let user = UserLocation {
        latitude: required_f64(request, "latitude")?,
        longitude: required_f64(request, "longitude")?,
    };
    if !(-90.0..=90.0).contains(&user.latitude) {
        return Err(PredecirError::invalid_input("latitude", "must be in -90..=90"));
    }
    if !(-180.0..=180.0).contains(&user.longitude) {
        return Err(PredecirError::invalid_input(
            "longitude",
            "must be in -180..=180",
        ));
    }

    let preferences = parse_preferences(request)?;
    // limit 0 is allowed and yields an empty success response.
    let limit = match optional_u64(request, "limit")? {
        None => DEFAULT_LIMIT,
        Some(l) => usize::try_from(l)
            .map_err(|_| PredecirError::invalid_input("limit", "too large"))?,
    };

    Ok((user, preferences, limit))
}

/// Every trip field must be present; a request that omits one is
/// rejected rather than silently served with defaults.
fn parse_prediction_request(request: &Value) -> Result<TravelFeatures> {
    let distance = required_f64(request, "distance")?;
    let day_of_week = required_u64(request, "day_of_week")?;
    let hour_of_day = required_u64(request, "hour_of_day")?;

    let features = TravelFeatures {
        distance_km: distance as f32,
        day_of_week: u8::try_from(day_of_week)
            .map_err(|_| PredecirError::invalid_input("day_of_week", "must be in 0..=6"))?,
        hour_of_day: u8::try_from(hour_of_day)
            .map_err(|_| PredecirError::invalid_input("hour_of_day", "must be in 0..=23"))?,
        is_holiday: required_flag(request, "is_holiday")?,
        is_rush_hour: required_flag(request, "is_rush_hour")?,
        weather: parse_weather(request)?,
    };
    features.validate()?;
    Ok(features)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn recommend(ctx: &mut RecommenderContext, request: &Value) -> Result<Value> {
    let (user, preferences, limit) = parse_recommendation_request(request)?;
    let recommendations = ctx.recommend(&user, &preferences, limit)?;
    let recommendations = recommendations
        .into_iter()
        .map(|mut rec| {
            rec.distance_km = round2(rec.distance_km);
            rec.score = round2(rec.score);
            serde_json::to_value(rec)
                .map_err(|e| PredecirError::Serialization(format!("encode failed: {e}")))
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(json!({
        "status": "success",
        "count": recommendations.len(),
        "recommendations": recommendations,
    }))
}

fn predict(ctx: &mut PredictorContext, request: &Value) -> Result<Value> {
    let features = parse_prediction_request(request)?;
    let minutes = ctx.predict(&features)?;
    Ok(json!({
        "status": "success",
        "predicted_time_minutes": round2(f64::from(minutes)),
        "confidence": PREDICTION_CONFIDENCE,
    }))
}

/// Handles one recommendation request, never returning an error: failures
/// become the error envelope.
pub fn serve_recommendations(ctx: &mut RecommenderContext, request: &Value) -> Value {
    recommend(ctx, request).unwrap_or_else(|e| error_envelope(&e))
}

/// Handles one travel-time request, never returning an error: failures
/// become the error envelope.
pub fn serve_prediction(ctx: &mut PredictorContext, request: &Value) -> Value {
    predict(ctx, request).unwrap_or_else(|e| error_envelope(&e))
}

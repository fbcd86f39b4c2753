//! End-to-end tests: generate mock data, train, persist, reload, and serve
//! JSON requests through both pipelines.

use predecir::persist::TrainPolicy;
use predecir::places::{mock as place_mock, PlaceRecommender, RecommenderContext};
use predecir::service::{serve_prediction, serve_recommendations};
use predecir::travel::{
    mock as travel_mock, PredictorContext, TrainConfig, TravelTimeModel,
};
use serde_json::json;

fn small_travel_config() -> TrainConfig {
    TrainConfig {
        n_estimators: 25,
        max_depth: Some(10),
        seed: 42,
        test_size: 0.2,
    }
}

#[test]
fn recommendation_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("places.csv");
    let model_path = dir.path().join("places.bin");

    // Offline: generate data, train, persist.
    let places = place_mock::load_or_generate(&data_path).unwrap();
    assert_eq!(places.len(), place_mock::DEFAULT_N_PLACES);
    let model = PlaceRecommender::train_default(&places).unwrap();
    model.save(&model_path).unwrap();

    // Serving: a fresh context loads the artifact and answers requests.
    let mut ctx = RecommenderContext::new(&model_path, &data_path);
    let request = json!({
        "latitude": 34.1,
        "longitude": -118.3,
        "preferences": {"max_price": 3, "min_rating": 4.0, "place_type": "restaurant"},
        "limit": 5,
    });
    let response = serve_recommendations(&mut ctx, &request);

    assert_eq!(response["status"], "success");
    let recs = response["recommendations"].as_array().unwrap();
    assert_eq!(response["count"].as_u64().unwrap() as usize, recs.len());
    assert!(recs.len() <= 5);

    let mut last_score = f64::INFINITY;
    for rec in recs {
        assert_eq!(rec["category"], "restaurant");
        assert!(rec["price_level"].as_u64().unwrap() <= 3);
        assert!(rec["rating"].as_f64().unwrap() >= 4.0);

        let score = rec["score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
        assert!(score <= last_score, "results must be ranked");
        last_score = score;

        assert!(rec["distance_km"].as_f64().unwrap() >= 0.0);
        assert!(rec["place_id"].as_str().unwrap().starts_with("place_"));
    }
}

#[test]
fn travel_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("travel.csv");
    let model_path = dir.path().join("travel.bin");

    let records = travel_mock::generate_travel_data(400, 42);
    let (model, report) = TravelTimeModel::train(&records, &small_travel_config()).unwrap();
    assert!(report.r2_validation > 0.5, "r2 = {}", report.r2_validation);
    model.save(&model_path).unwrap();

    let mut ctx = PredictorContext::new(&model_path, &data_path);
    let base = json!({
        "distance": 50.0,
        "day_of_week": 2,
        "hour_of_day": 8,
        "is_holiday": false,
        "is_rush_hour": false,
        "weather_condition": "clear",
    });
    let free = serve_prediction(&mut ctx, &base);
    assert_eq!(free["status"], "success");
    assert_eq!(free["confidence"], 0.85);

    // Same trip in rush hour takes longer.
    let mut rush_request = base.clone();
    rush_request["is_rush_hour"] = json!(true);
    let rush = serve_prediction(&mut ctx, &rush_request);
    assert!(
        rush["predicted_time_minutes"].as_f64().unwrap()
            > free["predicted_time_minutes"].as_f64().unwrap()
    );
}

#[test]
fn contexts_train_on_mock_only_when_opted_in() {
    let dir = tempfile::tempdir().unwrap();

    // Default policy: missing artifact surfaces as a typed error.
    let mut strict =
        RecommenderContext::new(dir.path().join("p.bin"), dir.path().join("p.csv"));
    let response =
        serve_recommendations(&mut strict, &json!({"latitude": 34.1, "longitude": -118.3}));
    assert_eq!(response["error"], "model_unavailable");

    // Opt-in policy: trains, persists, and serves in one step.
    let model_path = dir.path().join("travel.bin");
    let mut lenient = PredictorContext::new(&model_path, dir.path().join("travel.csv"))
        .with_policy(TrainPolicy::TrainOnMockIfMissing)
        .with_config(small_travel_config());
    let request = json!({
        "distance": 30.0,
        "day_of_week": 2,
        "hour_of_day": 10,
        "is_holiday": false,
        "is_rush_hour": false,
        "weather_condition": "clear",
    });
    let response = serve_prediction(&mut lenient, &request);
    assert_eq!(response["status"], "success");
    assert!(model_path.exists());

    // The artifact written by the lenient context serves a strict one.
    let mut strict = PredictorContext::new(&model_path, dir.path().join("travel.csv"));
    let response = serve_prediction(&mut strict, &request);
    assert_eq!(response["status"], "success");
}

#[test]
fn retraining_is_picked_up_after_invalidate() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("places.bin");

    let places = place_mock::generate_places(100, 42);
    PlaceRecommender::train(&places, 4, 42)
        .unwrap()
        .save(&model_path)
        .unwrap();

    let mut ctx = RecommenderContext::new(&model_path, dir.path().join("places.csv"));
    let request = json!({"latitude": 34.1, "longitude": -118.3, "limit": 3});
    assert_eq!(serve_recommendations(&mut ctx, &request)["status"], "success");

    // Retrain out of band with a different dataset, then invalidate.
    let other = place_mock::generate_places(150, 7);
    PlaceRecommender::train(&other, 4, 7)
        .unwrap()
        .save(&model_path)
        .unwrap();
    ctx.invalidate();

    let response = serve_recommendations(&mut ctx, &request);
    assert_eq!(response["status"], "success");
    assert_eq!(response["count"], 3);
}

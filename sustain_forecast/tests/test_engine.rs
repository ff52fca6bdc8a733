use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use sustain_forecast::config::{ForecastConfig, ModelConfig, SyntheticConfig};
use sustain_forecast::data::{DataLoader, Dataset};
use sustain_forecast::engine::{FeatureAnchor, ForecastEngine, FEATURE_COLUMNS};
use sustain_forecast::error::ForecastError;
use sustain_forecast::features::{prepare, PreparedDataset};
use sustain_forecast::models::ModelKind;
use sustain_forecast::schema;

#[fixture]
fn prepared() -> PreparedDataset {
    let dataset = DataLoader::synthetic(&SyntheticConfig::default()).unwrap();
    prepare(&dataset).unwrap()
}

fn small_config() -> ModelConfig {
    ModelConfig {
        n_estimators: 20,
        ..ModelConfig::default()
    }
}

fn engine() -> ForecastEngine {
    ForecastEngine::new(small_config(), ForecastConfig::default())
}

#[rstest]
fn test_trajectory_for_ninety_days(prepared: PreparedDataset) {
    let outcome = engine()
        .forecast(&prepared, schema::CO2, 90, ModelKind::XgBoost)
        .unwrap();

    let offsets: Vec<u32> = outcome.trajectory.iter().map(|p| p.days_ahead).collect();
    assert_eq!(offsets.len(), 16);
    assert_eq!(offsets[0], 0);
    assert_eq!(offsets[1], 6);
    assert_eq!(offsets[15], 90);
    assert_eq!(outcome.horizon_days, 90);
    assert!(!outcome.substituted());
}

#[rstest]
fn test_one_day_horizon_includes_offset_zero(prepared: PreparedDataset) {
    let outcome = engine()
        .forecast(&prepared, schema::HEAT, 1, ModelKind::LightGbm)
        .unwrap();

    let offsets: Vec<u32> = outcome.trajectory.iter().map(|p| p.days_ahead).collect();
    assert_eq!(offsets, vec![0, 1]);
    assert_eq!(outcome.trajectory[1].prediction, outcome.prediction);
}

#[rstest]
#[case(ModelKind::XgBoost)]
#[case(ModelKind::LightGbm)]
#[case(ModelKind::RandomForest)]
fn test_forecast_is_deterministic(prepared: PreparedDataset, #[case] kind: ModelKind) {
    let first = engine().forecast(&prepared, schema::WASTE, 45, kind).unwrap();
    let second = engine().forecast(&prepared, schema::WASTE, 45, kind).unwrap();
    assert_eq!(first, second);
}

#[rstest]
fn test_score_is_reported_as_percentage(prepared: PreparedDataset) {
    let outcome = engine()
        .forecast(&prepared, schema::SCORE, 30, ModelKind::RandomForest)
        .unwrap();

    let latest = prepared.latest_value(schema::SCORE).unwrap();
    assert_eq!(outcome.current_value, latest * 100.0);
    for point in &outcome.trajectory {
        assert!((0.0..=100.0).contains(&point.prediction), "{:?}", point);
    }
    // Raw scores stay within [0, 1]; a 0..=1 prediction would mean it was not scaled
    let mean = outcome.trajectory.iter().map(|p| p.prediction).sum::<f64>()
        / outcome.trajectory.len() as f64;
    assert!(mean > 1.0, "mean {}", mean);
}

#[rstest]
fn test_disabled_model_is_substituted(prepared: PreparedDataset) {
    let config = ModelConfig {
        disabled: vec![ModelKind::XgBoost],
        ..small_config()
    };
    let engine = ForecastEngine::new(config, ForecastConfig::default());

    let outcome = engine
        .forecast(&prepared, schema::ELECTRICITY, 10, ModelKind::XgBoost)
        .unwrap();
    assert_eq!(outcome.requested_model, ModelKind::XgBoost);
    assert_eq!(outcome.used_model, ModelKind::RandomForest);
    assert!(outcome.substituted());

    let direct = engine
        .forecast(&prepared, schema::ELECTRICITY, 10, ModelKind::RandomForest)
        .unwrap();
    assert_eq!(outcome.prediction, direct.prediction);
}

#[rstest]
fn test_missing_metric_names_the_column(prepared: PreparedDataset) {
    let err = engine()
        .forecast(&prepared, "Water_Usage_L", 30, ModelKind::XgBoost)
        .unwrap_err();

    assert!(err.is_validation());
    assert!(err.to_string().contains("Water_Usage_L"));
}

#[rstest]
#[case(0)]
#[case(3651)]
fn test_horizon_limits(prepared: PreparedDataset, #[case] horizon: u32) {
    let err = engine()
        .forecast(&prepared, schema::CO2, horizon, ModelKind::XgBoost)
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidHorizon(_)));
}

#[test]
fn test_no_complete_rows_is_insufficient_data() {
    let dataset = Dataset::from_columns(
        vec!["2023-01-01".to_string(), "2023-01-02".to_string()],
        vec![
            (schema::CO2, vec![None, None]),
            (schema::ENERGY, vec![Some(1000.0), Some(1010.0)]),
        ],
    )
    .unwrap();
    let prepared = prepare(&dataset).unwrap();

    let err = engine()
        .forecast(&prepared, schema::CO2, 5, ModelKind::XgBoost)
        .unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientTrainingData(_)));
    assert!(err.is_validation());
}

#[test]
fn test_single_row_trains_without_holdout() {
    let dataset = Dataset::from_columns(
        vec!["2023-06-01".to_string()],
        vec![
            (schema::CO2, vec![Some(140.0)]),
            (schema::ENERGY, vec![Some(1000.0)]),
        ],
    )
    .unwrap();
    let prepared = prepare(&dataset).unwrap();

    let outcome = engine()
        .forecast(&prepared, schema::CO2, 3, ModelKind::RandomForest)
        .unwrap();
    assert_eq!(outcome.prediction, 140.0);
    assert_eq!(outcome.accuracy, None);
}

#[test]
fn test_anchor_wraps_month_and_day() {
    let dataset = Dataset::from_columns(
        vec!["2023-12-01".to_string(), "2023-12-31".to_string()],
        vec![(schema::ENERGY, vec![Some(900.0), Some(950.0)])],
    )
    .unwrap();
    let prepared = prepare(&dataset).unwrap();
    let anchor = FeatureAnchor::from_dataset(&prepared).unwrap();

    assert_eq!(anchor.last_month, 12);
    assert_eq!(anchor.last_day_of_year, 365);

    let row = anchor.row_at(90);
    assert_eq!(FEATURE_COLUMNS[2], schema::MONTH);
    assert_eq!(row, [950.0, 120.0, 3.0, 90.0]);
}

#[rstest]
fn test_daily_path_dates(prepared: PreparedDataset) {
    let trained = engine()
        .train(&prepared, schema::CO2, ModelKind::LightGbm)
        .unwrap();
    let path = trained.daily_path(3).unwrap();

    let dates: Vec<NaiveDate> = path.iter().map(|p| p.date.date()).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        ]
    );
    assert_eq!(path[2].days_ahead, 3);
    assert_eq!(path[2].prediction, trained.predict_at(3));
}

#[rstest]
fn test_holdout_accuracy_is_reported(prepared: PreparedDataset) {
    let trained = engine()
        .train(&prepared, schema::CO2, ModelKind::XgBoost)
        .unwrap();
    let accuracy = trained.accuracy().unwrap();
    assert!(accuracy.mae > 0.0);
    assert!(accuracy.rmse >= accuracy.mae);
}

use pretty_assertions::assert_eq;
use rstest::rstest;
use sustain_forecast::error::ForecastError;
use sustain_forecast::models::ModelKind;
use sustain_forecast::query::{ParsedQuestion, QuestionParser};
use sustain_forecast::schema;

#[test]
fn test_parse_full_question() {
    let parsed = QuestionParser::default()
        .parse("alpha 45 days beta lightgbm waste")
        .unwrap();

    assert_eq!(
        parsed,
        ParsedQuestion {
            metric: schema::WASTE.to_string(),
            horizon_days: 45,
            model: ModelKind::LightGbm,
        }
    );
}

#[test]
fn test_horizon_defaults_to_thirty_days() {
    let parsed = QuestionParser::default()
        .parse("no number here, just co2")
        .unwrap();
    assert_eq!(parsed.metric, schema::CO2);
    assert_eq!(parsed.horizon_days, 30);
    assert_eq!(parsed.model, ModelKind::RandomForest);
}

#[test]
fn test_custom_default_horizon() {
    let parsed = QuestionParser::new(7).parse("heat next week").unwrap();
    assert_eq!(parsed.horizon_days, 7);
}

#[test]
fn test_unrecognized_metric_lists_aliases() {
    let err = QuestionParser::default()
        .parse("nothing recognizable")
        .unwrap_err();

    match err {
        ForecastError::UnresolvedMetric { supported } => {
            for alias in ["CO2", "waste", "score", "sustainability", "heat", "electricity", "power"] {
                assert!(supported.contains(alias), "missing {}", alias);
            }
        }
        other => panic!("Expected UnresolvedMetric, got {:?}", other),
    }
}

#[rstest]
#[case("What will CO2 emissions be?", schema::CO2)]
#[case("waste and co2", schema::CO2)]
#[case("sustainability score please", schema::SCORE)]
#[case("HEAT output", schema::HEAT)]
#[case("power generation", schema::ELECTRICITY)]
#[case("electricity vs heat", schema::HEAT)]
fn test_metric_alias_order(#[case] question: &str, #[case] expected: &str) {
    let parsed = QuestionParser::default().parse(question).unwrap();
    assert_eq!(parsed.metric, expected);
}

#[rstest]
#[case("co2 after 90 days", 90)]
#[case("co2 in 1 day", 1)]
#[case("co2 in 12days", 12)]
#[case("co2 10 din baad", 10)]
#[case("co2 for 2024 and 15 days", 15)]
fn test_horizon_extraction(#[case] question: &str, #[case] expected: u32) {
    let parsed = QuestionParser::default().parse(question).unwrap();
    assert_eq!(parsed.horizon_days, expected);
}

#[rstest]
#[case("waste in 0 days")]
#[case("waste in 99999999999999999999 days")]
fn test_invalid_horizon(#[case] question: &str) {
    let err = QuestionParser::default().parse(question).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidHorizon(_)));
    assert!(err.is_validation());
}

#[rstest]
#[case("co2 with XGBoost", ModelKind::XgBoost)]
#[case("co2 with LightGBM and xgboost", ModelKind::LightGbm)]
#[case("co2 with catboost", ModelKind::RandomForest)]
fn test_model_selection(#[case] question: &str, #[case] expected: ModelKind) {
    let parsed = QuestionParser::default().parse(question).unwrap();
    assert_eq!(parsed.model, expected);
}

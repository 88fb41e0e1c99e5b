//! Integration tests for churnscope

use churnscope::{
    dispatch, evaluate, load_dataset, predict_customer, prepare_features, AppState, ChurnError,
    MenuAction, ModelConfig, View,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// 100 customers, 70 "No" / 30 "Yes", three numeric features
fn create_churn_csv(with_flat_column: bool) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let flat_header = if with_flat_column { ",Flat" } else { "" };
    writeln!(
        file,
        "customerID,Contract,tenure,MonthlyCharges,SupportCalls{},Churn",
        flat_header
    )
    .unwrap();

    for i in 0..100 {
        let churn = if i % 10 < 3 { "Yes" } else { "No" };
        let contract = if i % 2 == 0 { "Month-to-month" } else { "One year" };
        let tenure = (i * 7 % 13) as f64;
        let charges = (i * 11 % 17) as f64 + 0.5;
        let calls = (i % 5) * 10;
        let flat = if with_flat_column { ",1.0" } else { "" };
        writeln!(
            file,
            "C{:04},{},{},{},{}{},{}",
            i, contract, tenure, charges, calls, flat, churn
        )
        .unwrap();
    }
    file
}

fn path_of(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap()
}

#[test]
fn test_feature_preparation_shape() {
    let file = create_churn_csv(false);
    let df = load_dataset(path_of(&file)).unwrap();
    let prepared = prepare_features(&df).unwrap();

    assert_eq!(prepared.n_rows(), df.height());
    assert_eq!(
        prepared.feature_names,
        vec!["tenure", "MonthlyCharges", "SupportCalls"]
    );
    assert_eq!(prepared.features.shape(), &[100, 3]);
    assert_eq!(prepared.labels.iter().filter(|&&l| l == 1).count(), 30);
}

#[test]
fn test_evaluation_scenario() {
    let file = create_churn_csv(false);
    let df = load_dataset(path_of(&file)).unwrap();
    let prepared = prepare_features(&df).unwrap();

    let evaluation = evaluate(&prepared, &ModelConfig::default()).unwrap();

    assert_eq!(evaluation.split.test.len(), 20);
    assert_eq!(evaluation.split.train.len(), 80);
    assert_eq!(evaluation.confusion.total(), 20);
    assert!(evaluation.accuracy > 0.0 && evaluation.accuracy < 1.0);

    let correct = evaluation.confusion.true_positives() + evaluation.confusion.true_negatives();
    assert!((evaluation.accuracy - correct as f64 / 20.0).abs() < 1e-12);
    assert_eq!(
        evaluation.report.classes[0].support + evaluation.report.classes[1].support,
        20
    );
}

#[test]
fn test_evaluation_is_deterministic() {
    let file = create_churn_csv(false);
    let df = load_dataset(path_of(&file)).unwrap();
    let prepared = prepare_features(&df).unwrap();
    let config = ModelConfig::default();

    let first = evaluate(&prepared, &config).unwrap();
    let second = evaluate(&prepared, &config).unwrap();

    assert_eq!(first.split, second.split);
    assert_eq!(first.confusion, second.confusion);
    assert_eq!(first.accuracy, second.accuracy);
}

#[test]
fn test_missing_label_column_disables_modeling() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "tenure,MonthlyCharges").unwrap();
    writeln!(file, "1,29.85").unwrap();
    writeln!(file, "34,56.95").unwrap();

    let df = load_dataset(path_of(&file)).unwrap();
    let err = prepare_features(&df).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ChurnError>(),
        Some(&ChurnError::MissingLabelColumn("Churn".to_string()))
    );

    let state = AppState::default();
    let (state, _) = dispatch(state, &MenuAction::Load(path_of(&file).to_string()));
    for action in [
        MenuAction::Modeling,
        MenuAction::Prediction {
            values: Some(vec![1.0, 2.0]),
        },
    ] {
        let (_, view) = dispatch(state.clone(), &action);
        assert!(matches!(view, View::Error(_)), "unexpected view {:?}", view);
    }
}

#[test]
fn test_constant_column_range_and_prediction() {
    let file = create_churn_csv(true);
    let state = AppState::default();
    let (state, _) = dispatch(state, &MenuAction::Load(path_of(&file).to_string()));

    let (state, view) = dispatch(state, &MenuAction::Prediction { values: None });
    let ranges = match view {
        View::FeatureInputs(ranges) => ranges,
        other => panic!("unexpected view {:?}", other),
    };
    let flat = ranges.iter().find(|r| r.name == "Flat").unwrap();
    assert!(flat.is_fixed());
    assert_eq!(flat.min, 1.0);

    let action = MenuAction::Prediction {
        values: Some(vec![5.0, 10.5, 20.0, 1.0]),
    };
    let (_, view) = dispatch(state, &action);
    match view {
        View::Prediction {
            prediction,
            out_of_range,
        } => {
            assert!(prediction.label <= 1);
            assert!((0.0..=1.0).contains(&prediction.churn_probability));
            assert!(out_of_range.is_empty());
        }
        other => panic!("unexpected view {:?}", other),
    }
}

#[test]
fn test_predict_customer_end_to_end() {
    let file = create_churn_csv(false);
    let df = load_dataset(path_of(&file)).unwrap();
    let prepared = prepare_features(&df).unwrap();

    let config = ModelConfig::default();
    let prediction = predict_customer(&prepared, &[6.0, 8.5, 20.0], &config).unwrap();
    assert!(prediction.label <= 1);
    assert!(!prediction.message().is_empty());

    let err = predict_customer(&prepared, &[6.0], &config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChurnError>(),
        Some(ChurnError::FeatureCountMismatch {
            expected: 3,
            actual: 1
        })
    ));
}

#[test]
fn test_nan_cells_do_not_block_modeling() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "tenure,MonthlyCharges,Churn").unwrap();
    for i in 0..40 {
        let churn = if i % 4 == 0 { "Yes" } else { "No" };
        let charges = if i == 5 {
            "NaN".to_string()
        } else {
            format!("{}.5", 20 + i % 9)
        };
        writeln!(file, "{},{},{}", i % 13, charges, churn).unwrap();
    }

    let df = load_dataset(path_of(&file)).unwrap();
    let prepared = prepare_features(&df).unwrap();
    assert_eq!(prepared.features[[5, 1]], 0.0);

    let config = ModelConfig::default();
    let evaluation = evaluate(&prepared, &config).unwrap();
    assert_eq!(evaluation.confusion.total(), 8);
    assert!(predict_customer(&prepared, &[4.0, 25.0], &config).is_ok());
}

#[test]
fn test_session_load_then_views() {
    let file = create_churn_csv(false);
    let output_dir = tempfile::tempdir().unwrap();
    let mut state = AppState::default();
    state.settings.output_dir = output_dir.path().to_path_buf();

    let (state, view) = dispatch(state, &MenuAction::Load(path_of(&file).to_string()));
    assert!(matches!(view, View::Loaded { rows: 100, .. }));
    assert!(state.dataset.is_some());

    let (state, view) = dispatch(state, &MenuAction::ShowData);
    match &view {
        View::Data { overview, stats, .. } => {
            assert_eq!(overview.total_customers, 100);
            assert_eq!(overview.total_churn, Some(30));
            assert_eq!(overview.churn_rate, Some(30.0));
            assert_eq!(stats.len(), 3);
        }
        other => panic!("unexpected view {:?}", other),
    }

    let (state, view) = dispatch(state, &MenuAction::ChurnChart);
    match &view {
        View::ChurnChart { counts, charts } => {
            assert_eq!(counts, &vec![("No".to_string(), 70), ("Yes".to_string(), 30)]);
            assert_eq!(charts.len(), 2);
            assert!(charts.iter().all(|chart| chart.exists()));
        }
        other => panic!("unexpected view {:?}", other),
    }

    let (_, view) = dispatch(state, &MenuAction::Modeling);
    let text = view.to_string();
    assert!(text.contains("Accuracy"));
    assert!(text.contains("Confusion Matrix"));
}

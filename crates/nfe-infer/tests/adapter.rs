use std::fs;
use std::path::{Path, PathBuf};

use nfe_infer::{
    Booster, DecisionRule, InferenceAdapter, ModelError, Probabilities, encode_rows,
};
use nfe_model::{
    FeatureContract, FeatureKind, FeatureRow, FeatureValue, LabelTable, MODEL_ERROR_LABEL,
    PREDICTION_ERROR_LABEL,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use tempfile::TempDir;

const MULTICLASS_MODEL: &str = include_str!("fixtures/modelo_lgbm.txt");
const BINARY_MODEL: &str = include_str!("fixtures/modelo_binario.txt");

fn install_model(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("modelo_lgbm.txt");
    fs::write(&path, text).expect("write model");
    path
}

fn adapter(path: &Path, rule: DecisionRule) -> InferenceAdapter {
    InferenceAdapter::new(
        path,
        FeatureContract::standard(),
        LabelTable::tax_categories(),
        rule,
    )
}

fn row_with_uf(uf: &str) -> FeatureRow {
    let contract = FeatureContract::standard();
    let mut row = FeatureRow::new(contract, vec![FeatureValue::Integer(0); contract.len()]);
    row.set("COD_UF_EMIT", FeatureValue::Text(uf.to_string()));
    row.set("CEST_SEGMENTO", FeatureValue::Text("00".to_string()));
    row
}

#[test]
fn multiclass_model_labels_each_row() {
    let dir = TempDir::new().expect("tempdir");
    let path = install_model(&dir, MULTICLASS_MODEL);
    let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

    let labels = adapter.predict(&[row_with_uf("PE"), row_with_uf("SP"), row_with_uf("AM")]);
    assert_eq!(
        labels,
        vec!["3 -> ICMS ST", "0 -> ICMS ANT", "0 -> ICMS ANT"]
    );
}

#[test]
fn multiclass_probabilities_are_normalized() {
    let booster = Booster::parse(MULTICLASS_MODEL).expect("parse");
    assert_eq!(booster.num_outputs(), 5);
    assert_eq!(booster.pandas_categorical().map(<[_]>::len), Some(27));

    // code 0 of COD_UF_EMIT is PE
    let features = vec![0.0; 27];
    let Probabilities::Multiclass(rows) = booster.predict(&[features]).expect("predict") else {
        panic!("expected multiclass output");
    };
    let total: f64 = rows[0].iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn empty_batch_never_touches_the_model() {
    let dir = TempDir::new().expect("tempdir");
    let adapter = adapter(&dir.path().join("absent.txt"), DecisionRule::ArgmaxOnly);
    assert!(adapter.predict(&[]).is_empty());
}

#[test]
fn missing_artifact_labels_every_row_as_model_error() {
    let dir = TempDir::new().expect("tempdir");
    let adapter = adapter(&dir.path().join("absent.txt"), DecisionRule::ArgmaxOnly);

    let labels = adapter.predict(&[row_with_uf("PE"), row_with_uf("SP")]);
    assert_eq!(labels, vec![MODEL_ERROR_LABEL; 2]);
}

#[test]
fn corrupt_artifact_labels_every_row_as_model_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = install_model(&dir, "not a model\n");
    let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

    assert_eq!(adapter.predict(&[row_with_uf("PE")]), vec![MODEL_ERROR_LABEL]);
}

#[test]
fn non_utf8_artifact_is_not_text() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("modelo_lgbm.txt");
    fs::write(&path, [0x74, 0x72, 0xff, 0xfe]).expect("write model");
    let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

    assert!(matches!(adapter.load_model(), Err(ModelError::NotText { .. })));
    assert!(matches!(
        Booster::from_bytes(&[0xff], &path),
        Err(ModelError::NotText { .. })
    ));
}

#[test]
fn integral_float_submission_encodes_like_an_integer() {
    let contract = FeatureContract::standard();
    let booster = Booster::from_bytes(MULTICLASS_MODEL.as_bytes(), Path::new("modelo_lgbm.txt"))
        .expect("parse model");

    let submitted = |tip_fin: Value| {
        let mut raw = Map::new();
        for spec in contract.features() {
            let value = match spec.kind {
                FeatureKind::Numeric => json!(0),
                FeatureKind::Categorical => json!("0"),
            };
            raw.insert(spec.name.to_string(), value);
        }
        raw.insert("COD_UF_EMIT".to_string(), json!("PE"));
        raw.insert("TIP_FIN_NFE".to_string(), tip_fin);
        contract.validate_row(&raw).expect("valid row")
    };

    let rows = vec![submitted(json!(1)), submitted(json!(1.0))];
    let matrix = encode_rows(&rows, contract, booster.pandas_categorical()).expect("encode");
    let tip_fin = contract.position("TIP_FIN_NFE").expect("TIP_FIN_NFE");
    assert_eq!(matrix[0][tip_fin], 0.0);
    assert_eq!(matrix[1][tip_fin], 0.0);
    assert_eq!(matrix[0], matrix[1]);
    assert_eq!(rows[1].get("TIP_FIN_NFE"), Some(&FeatureValue::Integer(1)));
}

#[test]
fn feature_mismatch_is_a_model_error() {
    let dir = TempDir::new().expect("tempdir");
    let renamed = MULTICLASS_MODEL.replacen("COD_UF_EMIT TIP_FIN_NFE", "UF TIP_FIN_NFE", 1);
    let path = install_model(&dir, &renamed);
    let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

    assert!(matches!(
        adapter.load_model(),
        Err(ModelError::FeatureMismatch { .. })
    ));
    assert_eq!(adapter.predict(&[row_with_uf("PE")]), vec![MODEL_ERROR_LABEL]);
}

#[test]
fn binary_model_under_argmax_only_fails_the_batch() {
    let dir = TempDir::new().expect("tempdir");
    let path = install_model(&dir, BINARY_MODEL);
    let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

    let labels = adapter.predict(&[row_with_uf("PE"), row_with_uf("SP")]);
    assert_eq!(labels, vec![PREDICTION_ERROR_LABEL; 2]);
}

#[test]
fn binary_model_under_threshold_rule() {
    let dir = TempDir::new().expect("tempdir");
    let path = install_model(&dir, BINARY_MODEL);
    let adapter = adapter(&path, DecisionRule::BinaryThreshold);

    let labels = adapter.predict(&[row_with_uf("PE"), row_with_uf("SP")]);
    assert_eq!(labels, vec!["1 -> ICMS ANTEF", "0 -> ICMS ANT"]);
}

#[test]
fn replaced_artifact_is_picked_up_on_next_call() {
    let dir = TempDir::new().expect("tempdir");
    let path = install_model(&dir, MULTICLASS_MODEL);
    let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

    let first = adapter.load_model().expect("load");
    let again = adapter.load_model().expect("reload");
    assert!(std::sync::Arc::ptr_eq(&first, &again));
    assert_eq!(adapter.predict(&[row_with_uf("PE")]), vec!["3 -> ICMS ST"]);

    install_model(&dir, BINARY_MODEL);
    let replaced = adapter.load_model().expect("load replacement");
    assert!(!std::sync::Arc::ptr_eq(&first, &replaced));
    assert_eq!(replaced.num_outputs(), 1);
    assert_eq!(
        adapter.predict(&[row_with_uf("PE")]),
        vec![PREDICTION_ERROR_LABEL]
    );

    fs::remove_file(&path).expect("remove model");
    assert_eq!(adapter.predict(&[row_with_uf("PE")]), vec![MODEL_ERROR_LABEL]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn output_length_matches_input(ufs in prop::collection::vec("[A-Z]{2}", 0..12)) {
        let dir = TempDir::new().expect("tempdir");
        let path = install_model(&dir, MULTICLASS_MODEL);
        let adapter = adapter(&path, DecisionRule::ArgmaxOnly);

        let rows: Vec<FeatureRow> = ufs.iter().map(|uf| row_with_uf(uf)).collect();
        let labels = adapter.predict(&rows);
        prop_assert_eq!(labels.len(), rows.len());
        for (uf, label) in ufs.iter().zip(&labels) {
            let expected = if uf == "PE" { "3 -> ICMS ST" } else { "0 -> ICMS ANT" };
            prop_assert_eq!(label.as_str(), expected);
        }
    }
}

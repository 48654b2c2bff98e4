use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use nfe_infer::{DecisionRule, InferenceAdapter};
use nfe_ingest::DataStore;
use nfe_model::{FeatureContract, FeatureKind, LabelTable};
use nfe_server::{AppState, build_router};
use serde_json::{Map, Value, json};
use tempfile::{TempDir, tempdir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const MODEL: &str = include_str!("fixtures/modelo_lgbm.txt");

fn write_dataset(dir: &TempDir, ids: &[&str]) -> PathBuf {
    let contract = FeatureContract::standard();
    let mut lines = vec![
        std::iter::once("SEQ_NFE")
            .chain(contract.names())
            .collect::<Vec<_>>()
            .join(";"),
    ];
    for id in ids {
        let mut cells = vec![id.to_string()];
        for spec in contract.features() {
            cells.push(match (spec.name, spec.kind) {
                ("COD_UF_EMIT", _) => "PE".to_string(),
                ("CEST_SEGMENTO", _) => "00".to_string(),
                (_, FeatureKind::Numeric) => "1".to_string(),
                (_, FeatureKind::Categorical) => "AUSENTE".to_string(),
            });
        }
        lines.push(cells.join(";"));
    }
    let path = dir.path().join("base_para_teste.csv");
    fs::write(&path, lines.join("\n")).expect("write dataset");
    path
}

fn valid_row(key: &str, uf: &str) -> Value {
    let mut row = Map::new();
    row.insert("key".to_string(), json!(key));
    row.insert("SEQ_NFE".to_string(), json!(1001));
    for spec in FeatureContract::standard().features() {
        let value = match (spec.name, spec.kind) {
            ("COD_UF_EMIT", _) => json!(uf),
            (_, FeatureKind::Numeric) => json!(1),
            (_, FeatureKind::Categorical) => json!("AUSENTE"),
        };
        row.insert(spec.name.to_string(), value);
    }
    Value::Object(row)
}

fn app_state(data: Option<&Path>, model: &Path) -> AppState {
    let contract = FeatureContract::standard();
    let store = match data {
        Some(path) => DataStore::load(path, contract).expect("load dataset"),
        None => DataStore::empty(contract),
    };
    let adapter = InferenceAdapter::new(
        model,
        contract,
        LabelTable::tax_categories(),
        DecisionRule::ArgmaxOnly,
    );
    AppState::new(store, adapter)
}

async fn spawn_app(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<(&str, &str)>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some((content_type, payload)) = body {
        req.push_str(&format!(
            "Content-Type: {content_type}\r\nContent-Length: {}\r\n",
            payload.len()
        ));
        req.push_str("\r\n");
        req.push_str(payload);
    } else {
        req.push_str("\r\n");
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

async fn post_json(addr: SocketAddr, path: &str, payload: &Value) -> (u16, Value) {
    let text = payload.to_string();
    let (status, _, body) = send_raw(addr, "POST", path, Some(("application/json", &text))).await;
    let json = serde_json::from_str(&body).expect("json body");
    (status, json)
}

#[tokio::test]
async fn search_and_predict_scenarios() {
    let dir = tempdir().expect("tempdir");
    let data = write_dataset(&dir, &["1001", "1002", "1002"]);
    let addr = spawn_app(app_state(Some(&data), &dir.path().join("absent.txt"))).await;

    // found
    let (status, head, body) = send_raw(addr, "GET", "/search?seq_nfe=1001", None).await;
    assert_eq!(status, 200);
    assert!(head.to_lowercase().contains("content-type: text/html"));
    assert!(body.contains("data-key=\"row-1\""));
    assert!(!body.contains("data-key=\"row-2\""));
    assert!(body.contains("<th>Tipo Imposto</th>"));

    // not an integer
    let (status, _, body) = send_raw(addr, "GET", "/search?seq_nfe=abc", None).await;
    assert_eq!(status, 400);
    assert!(body.contains("abc"));

    // absent
    let (status, _, body) = send_raw(addr, "GET", "/search?seq_nfe=9999", None).await;
    assert_eq!(status, 404);
    assert!(body.contains("9999"));

    // empty batch answered in-band
    let (status, json) = post_json(addr, "/predict", &json!({ "data": [] })).await;
    assert_eq!(status, 200);
    assert!(json.get("error").and_then(Value::as_str).is_some());
    assert!(json.get("predictions").is_none());

    // missing model artifact
    let (status, json) = post_json(addr, "/predict", &json!({ "data": [valid_row("row-1", "PE")] })).await;
    assert_eq!(status, 200);
    insta::assert_json_snapshot!(json, @r#"
    {
      "predictions": {
        "row-1": "ERRO_MODELO"
      }
    }
    "#);
}

#[tokio::test]
async fn form_post_lists_every_duplicate_row() {
    let dir = tempdir().expect("tempdir");
    let data = write_dataset(&dir, &["1001", "1002", "1002"]);
    let addr = spawn_app(app_state(Some(&data), &dir.path().join("absent.txt"))).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/search",
        Some(("application/x-www-form-urlencoded", "seq_nfe=+1002+")),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body.contains("data-key=\"row-1\""));
    assert!(body.contains("data-key=\"row-2\""));
    assert!(!body.contains("data-key=\"row-3\""));
}

#[tokio::test]
async fn empty_store_reports_data_unavailable() {
    let dir = tempdir().expect("tempdir");
    let addr = spawn_app(app_state(None, &dir.path().join("absent.txt"))).await;

    // checked before the identifier is parsed
    let (status, _, body) = send_raw(addr, "GET", "/search?seq_nfe=abc", None).await;
    assert_eq!(status, 500);
    assert!(body.contains("Dados não carregados"));

    let (status, _, body) = send_raw(addr, "GET", "/health", None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("health json");
    assert_eq!(json, json!({ "status": "ok", "records": 0 }));
}

#[tokio::test]
async fn missing_search_field_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let data = write_dataset(&dir, &["1001"]);
    let addr = spawn_app(app_state(Some(&data), &dir.path().join("absent.txt"))).await;

    let (status, _, _) = send_raw(addr, "GET", "/search", None).await;
    assert!((400..500).contains(&status));
}

#[tokio::test]
async fn predictions_follow_client_keys() {
    let dir = tempdir().expect("tempdir");
    let data = write_dataset(&dir, &["1001"]);
    let model = dir.path().join("modelo_lgbm.txt");
    fs::write(&model, MODEL).expect("write model");
    let addr = spawn_app(app_state(Some(&data), &model)).await;

    let payload = json!({
        "data": [valid_row("row-2", "SP"), valid_row("row-1", "PE")]
    });
    let (status, json) = post_json(addr, "/predict", &payload).await;
    assert_eq!(status, 200);
    assert_eq!(
        json,
        json!({
            "predictions": {
                "row-1": "3 -> ICMS ST",
                "row-2": "0 -> ICMS ANT"
            }
        })
    );
}

#[tokio::test]
async fn invalid_rows_are_rejected_before_inference() {
    let dir = tempdir().expect("tempdir");
    let data = write_dataset(&dir, &["1001"]);
    let addr = spawn_app(app_state(Some(&data), &dir.path().join("absent.txt"))).await;

    let mut wrong_type = valid_row("row-1", "PE");
    wrong_type["COD_CST"] = json!("zero");
    let (status, json) = post_json(addr, "/predict", &json!({ "data": [wrong_type] })).await;
    assert_eq!(status, 422);
    let message = json.get("error").and_then(Value::as_str).expect("error message");
    assert!(message.contains("COD_CST"));

    let mut fractional = valid_row("row-1", "PE");
    fractional["TIP_FIN_NFE"] = json!(1.5);
    let (status, json) = post_json(addr, "/predict", &json!({ "data": [fractional] })).await;
    assert_eq!(status, 422);
    let message = json.get("error").and_then(Value::as_str).expect("error message");
    assert!(message.contains("TIP_FIN_NFE"));

    let mut missing_key = valid_row("row-1", "PE");
    missing_key.as_object_mut().expect("object").remove("key");
    let (status, json) = post_json(
        addr,
        "/predict",
        &json!({ "data": [valid_row("row-1", "PE"), missing_key] }),
    )
    .await;
    assert_eq!(status, 422);
    let message = json.get("error").and_then(Value::as_str).expect("error message");
    assert!(message.starts_with("row 1"));
}

#[tokio::test]
async fn home_page_serves_search_form() {
    let dir = tempdir().expect("tempdir");
    let addr = spawn_app(app_state(None, &dir.path().join("absent.txt"))).await;

    let (status, _, body) = send_raw(addr, "GET", "/", None).await;
    assert_eq!(status, 200);
    assert!(body.contains("action=\"/search\""));
    assert!(body.contains("name=\"seq_nfe\""));
}

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, LocalDiskStorage};
use migration::MigratorTrait;
use server::{ServerOptions, app};

const BOUNDARY: &str = "ledgerbook-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
const EXE: &[u8] = b"MZ\x90\0\x03\0\0\0\x04\0\0\0\xff\xff\0\0";
const MAX_RECEIPT_BYTES: usize = 1024;

struct TestApp {
    router: Router,
    receipts: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

async fn test_app(expose_detail: bool) -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalDiskStorage::init(
        dir.path().join("receipts"),
        "http://localhost:3000/receipts",
    )
    .await
    .unwrap();
    let receipts = storage.root().to_path_buf();
    let engine = Engine::builder()
        .database(db)
        .storage(Arc::new(storage))
        .build()
        .await
        .unwrap();

    let options = ServerOptions {
        expose_detail,
        max_receipt_bytes: MAX_RECEIPT_BYTES,
        receipts: None,
    };
    TestApp {
        router: app(engine, options),
        receipts,
        _dir: dir,
    }
}

fn form(fields: &[(&str, &str)], receipt: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = receipt {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"receipt\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: Method, uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

const COFFEE: &[(&str, &str)] = &[("name", "Coffee"), ("amount", "-450"), ("date", "2024-01-05")];

async fn add_coffee(app: &TestApp, receipt: Option<(&str, &[u8])>) -> Value {
    let (status, body) = send(
        app,
        multipart_request(Method::POST, "/record/add", form(COFFEE, receipt)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn receipt_count(app: &TestApp) -> usize {
    std::fs::read_dir(&app.receipts).unwrap().count()
}

#[tokio::test]
async fn ping_echoes_forwarded_address() {
    let app = test_app(false).await;
    let request = Request::builder()
        .uri("/ping")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"text": "Pong", "ip": "203.0.113.7"}));
}

#[tokio::test]
async fn unknown_path_uses_error_envelope() {
    let app = test_app(false).await;

    let (status, body) = send(&app, empty_request(Method::GET, "/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["code"], json!("PATH404"));
    assert_eq!(body["message"], json!("Path '/nope' is not found"));
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn detail_is_exposed_outside_production() {
    let app = test_app(true).await;

    let (status, body) = send(&app, empty_request(Method::GET, "/record/404")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("ID404"));
    assert!(body["detail"].as_str().unwrap().contains("KeyNotFound"));
}

#[tokio::test]
async fn non_numeric_id_is_an_unknown_path() {
    let app = test_app(false).await;

    let (status, body) = send(&app, empty_request(Method::GET, "/record/abc")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("PATH404"));
    assert_eq!(body["message"], json!("Path '/record/abc' is not found"));
}

#[tokio::test]
async fn add_get_and_list_records() {
    let app = test_app(false).await;

    let created = add_coffee(&app, Some(("scan.png", PNG))).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["name"], json!("Coffee"));
    assert_eq!(created["amount"], json!(-450));
    let attachment = created["attachment"].as_str().unwrap();
    assert!(attachment.starts_with("http://localhost:3000/receipts/"));
    assert!(attachment.ends_with(".png"));
    assert_eq!(receipt_count(&app), 1);

    let (status, fetched) = send(&app, empty_request(Method::GET, &format!("/record/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, listed) = send(&app, empty_request(Method::GET, "/record/list?type=out")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));

    let (_, inflows) = send(&app, empty_request(Method::GET, "/record/list?type=IN")).await;
    assert_eq!(inflows, json!([]));
}

#[tokio::test]
async fn list_rejects_invalid_parameters() {
    let app = test_app(false).await;

    for (uri, code) in [
        ("/record/list?order_by=amount:DROP", "INVALID_SORT"),
        ("/record/list?order_by=password:ASC", "INVALID_SORT"),
        ("/record/list?type=ALL", "INVALID_TYPE"),
        ("/record/list?limit=0", "INVALID_LIMIT"),
    ] {
        let (status, body) = send(&app, empty_request(Method::GET, uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], json!(code), "{uri}");
    }
}

#[tokio::test]
async fn executable_receipt_is_rejected() {
    let app = test_app(false).await;

    let (status, body) = send(
        &app,
        multipart_request(
            Method::POST,
            "/record/add",
            form(COFFEE, Some(("receipt.exe", EXE))),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("UNSUPPORTED_MEDIA_TYPE"));
    assert_eq!(receipt_count(&app), 0);
    let (_, listed) = send(&app, empty_request(Method::GET, "/record/list")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn oversized_receipt_is_rejected() {
    let app = test_app(false).await;
    let mut big = PNG.to_vec();
    big.resize(MAX_RECEIPT_BYTES * 2, 0);

    let (status, body) = send(
        &app,
        multipart_request(Method::POST, "/record/add", form(COFFEE, Some(("big.png", &big)))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("FILE_TOO_LARGE"));
    assert_eq!(receipt_count(&app), 0);
}

#[tokio::test]
async fn missing_name_is_a_validation_error() {
    let app = test_app(false).await;

    let (status, body) = send(
        &app,
        multipart_request(
            Method::POST,
            "/record/add",
            form(&[("amount", "-450"), ("date", "2024-01-05")], None),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_FIELD"));
}

#[tokio::test]
async fn edit_reports_changed_fields_only() {
    let app = test_app(false).await;
    let created = add_coffee(&app, None).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/record/edit/{id}"),
            form(
                &[("name", "Coffee"), ("amount", "-500"), ("date", "2024-01-05")],
                None,
            ),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], json!({"amount": {"old": -450, "new": -500}}));
    assert!(body.get("warning").is_none());

    let (status, body) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/record/edit/{id}"),
            form(
                &[("name", "Coffee"), ("amount", "-500"), ("date", "2024-01-05")],
                None,
            ),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("NO_CHANGES"));
}

#[tokio::test]
async fn edit_of_missing_record_is_id404() {
    let app = test_app(false).await;

    let (status, body) = send(
        &app,
        multipart_request(Method::PUT, "/record/edit/77", form(COFFEE, None)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("ID404"));
}

#[tokio::test]
async fn replacing_receipt_removes_the_old_file() {
    let app = test_app(false).await;
    let created = add_coffee(&app, Some(("a.png", PNG))).await;
    let id = created["id"].as_i64().unwrap();
    let gif: &[u8] = b"GIF89a\x01\0\x01\0\x80\0\0";

    let (status, body) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/record/edit/{id}"),
            form(COFFEE, Some(("b.gif", gif))),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"]["attachment"]["old"], created["attachment"]);
    assert!(body["updated"]["attachment"]["new"]
        .as_str()
        .unwrap()
        .ends_with(".gif"));
    assert_eq!(receipt_count(&app), 1);
}

#[tokio::test]
async fn delete_removes_record_and_receipt() {
    let app = test_app(false).await;
    let created = add_coffee(&app, Some(("a.png", PNG))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) =
        send(&app, empty_request(Method::DELETE, &format!("/record/{id}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        json!(format!("Record #{id} is successfully deleted"))
    );
    assert_eq!(body["deleted"], created);
    assert_eq!(receipt_count(&app), 0);

    let (status, body) =
        send(&app, empty_request(Method::DELETE, &format!("/record/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("ID404"));
}

#[tokio::test]
async fn search_and_summary() {
    let app = test_app(false).await;
    add_coffee(&app, None).await;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let (status, _) = send(
        &app,
        multipart_request(
            Method::POST,
            "/record/add",
            form(
                &[
                    ("name", "Salary"),
                    ("amount", "250000"),
                    ("date", today.as_str()),
                    ("notes", "January payroll"),
                ],
                None,
            ),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, found) = send(&app, empty_request(Method::GET, "/record/search/payroll")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], json!("Salary"));

    let (status, summary) = send(&app, empty_request(Method::GET, "/record/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary,
        json!({"number_of_records": 1, "balance": 249_550})
    );
}

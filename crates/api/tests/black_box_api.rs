use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use tradewh_api::app::{build_app, AppServices};
use tradewh_core::{SqlArg, SqlRow, SqlValue};
use tradewh_infra::{QueryTimeouts, RateLimitConfig, ScriptedExecutor};

struct TestServer {
    base_url: String,
    executor: Arc<ScriptedExecutor>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_rate_limit(RateLimitConfig::default()).await
    }

    async fn spawn_with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        // Same router as prod over a scripted executor, bound to an ephemeral port.
        let executor = Arc::new(ScriptedExecutor::new());
        let services = AppServices::new(executor.clone(), QueryTimeouts::default());
        let app = build_app(services, rate_limit);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            base_url,
            executor,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn year_rows(rows: &[(i32, i64)]) -> Vec<SqlRow> {
    rows.iter()
        .map(|(year, total)| SqlRow::new(vec![SqlValue::from(*year), SqlValue::Int(*total)]))
        .collect()
}

#[tokio::test]
async fn health_reports_database_state() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "healthy" }));

    srv.executor.fail_ping("connection refused");
    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn aggregate_by_year_returns_page_and_metadata() {
    let srv = TestServer::spawn().await;
    srv.executor
        .push_scalar(3)
        .push_rows(year_rows(&[(2022, 900), (2021, 700), (2020, 500)]));

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .header("x-request-id", "req-42")
        .json(&json!({
            "date_range": { "start_year": 2020, "end_year": 2022 },
            "group_by": ["year"],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "data": [
                { "year": 2022, "total_value": 900 },
                { "year": 2021, "total_value": 700 },
                { "year": 2020, "total_value": 500 },
            ],
            "pagination": { "current_page": 1, "page_size": 25, "total_count": 3, "total_pages": 1 },
        })
    );

    let calls = srv.executor.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls
        .iter()
        .any(|c| c.statement.sql.starts_with("SELECT COUNT(*) FROM (SELECT f.year FROM fact_trade_by_product_port f")));
}

#[tokio::test]
async fn null_request_objects_fall_back_to_defaults() {
    let srv = TestServer::spawn().await;
    srv.executor.push_scalar(1).push_rows(year_rows(&[(2021, 700)]));

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({
            "date_range": { "start_year": 2020, "end_year": 2022 },
            "group_by": ["year"],
            "filters": null,
            "pagination": null,
            "sorting": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["pagination"],
        json!({ "current_page": 1, "page_size": 25, "total_count": 1, "total_pages": 1 })
    );

    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({ "date_range": null, "group_by": ["year"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "date_range.start_year and date_range.end_year are required");
}

#[tokio::test]
async fn requested_null_dimensions_serialize_as_null() {
    let srv = TestServer::spawn().await;
    srv.executor.push_scalar(1).push_rows(vec![SqlRow::new(vec![
        SqlValue::Int(4),
        SqlValue::from("Jebel Ali"),
        SqlValue::Null,
        SqlValue::Int(1200),
    ])]);

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({
            "date_range": { "start_year": 2020, "end_year": 2022 },
            "group_by": ["port"],
            "filters": { "port_types": ["Sea"] },
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["data"][0],
        json!({ "port_id": 4, "port_name_en": "Jebel Ali", "port_name_ar": null, "total_value": 1200 })
    );
}

#[tokio::test]
async fn validation_failures_use_the_error_envelope() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({
            "date_range": { "start_year": 2020, "end_year": 2022 },
            "group_by": ["year"],
            "sorting": { "sort_by": "1=1; DROP TABLE x" },
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert_eq!(body["path"], "/api/v1/trade/aggregate");
    assert_eq!(body["method"], "POST");
    assert!(body["error"].as_str().unwrap().starts_with("invalid sort_by field: 1=1; DROP TABLE x"));

    // Nothing reached the database.
    assert!(srv.executor.calls().is_empty());
}

#[tokio::test]
async fn product_with_country_is_unprocessable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({
            "date_range": { "start_year": 2020, "end_year": 2022 },
            "group_by": ["product", "country"],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 422);
    assert!(srv.executor.calls().is_empty());
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");

    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({ "group_by": "year" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn execution_failures_are_generic_500s() {
    let srv = TestServer::spawn().await;
    srv.executor
        .push_scalar(10)
        .fail_next_fetch("relation \"fact_trade_by_product_port\" does not exist");

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/api/v1/trade/aggregate"))
        .json(&json!({
            "date_range": { "start_year": 2020, "end_year": 2022 },
            "group_by": ["trade_type"],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "error": "Internal Server Error",
            "code": 500,
            "path": "/api/v1/trade/aggregate",
            "method": "POST",
        })
    );
}

#[tokio::test]
async fn unknown_routes_and_methods_get_envelopes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/v1/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Cannot GET /api/v1/nope");
    assert_eq!(body["code"], 404);

    let res = client.get(srv.url("/api/v1/trade/aggregate")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["code"], 405);
}

#[tokio::test]
async fn summary_and_balance_validate_years() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/api/v1/trade/summary?start_year=2020"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "start_year and end_year are required");

    srv.executor.push_rows(vec![SqlRow::new(vec![
        SqlValue::Int(300),
        SqlValue::Int(250),
        SqlValue::Int(100),
        SqlValue::Int(50),
    ])]);
    let res = client
        .get(srv.url("/api/v1/trade/balance?start_year=2019&end_year=2021"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "start_year": 2019,
            "end_year": 2021,
            "total_import": 300,
            "total_export": 250,
            "total_reexport": 100,
            "trade_balance": 50,
        })
    );
}

#[tokio::test]
async fn dimension_lookups_clamp_limit_and_filter_port_type() {
    let srv = TestServer::spawn().await;
    srv.executor.push_rows(vec![SqlRow::new(vec![
        SqlValue::Int(4),
        SqlValue::from("Jebel Ali"),
        SqlValue::from("جبل علي"),
        SqlValue::from("Sea"),
        SqlValue::from("بحري"),
        SqlValue::Int(1),
    ])]);

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/api/v1/dimensions/ports?search=jebel&port_type=Sea&limit=9000"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["port_name_en"], "Jebel Ali");
    assert_eq!(body[0]["mode_id"], 1);

    let stmt = &srv.executor.calls()[0].statement;
    assert_eq!(
        stmt.args,
        vec![
            SqlArg::Text("%jebel%".into()),
            SqlArg::Text("Sea".into()),
            SqlArg::BigInt(500),
        ]
    );

    let res = client
        .get(srv.url("/api/v1/dimensions/products"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn clients_over_the_limit_are_throttled() {
    let srv = TestServer::spawn_with_rate_limit(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    })
    .await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let res = client.get(srv.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("retry-after"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "error": "Too Many Requests", "code": 429, "path": "/health", "method": "GET" })
    );
}

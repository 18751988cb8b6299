//! Admin surface tests driving the router directly, without a listener.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{test_order, TestHarness};
use gst_invoicing::api;
use gst_invoicing::services::invoice_number;

fn generate_request(order_ref: &str, generated_by: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/invoices/{}/generate", order_ref))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"generated_by": generated_by, "year": 2026}).to_string(),
        ))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generate_endpoint_returns_created_invoice() {
    let harness = TestHarness::new();
    harness.orders.insert(test_order("ord-1", "Maharashtra"));
    let router = api::router(harness.service.clone());

    let response = router
        .oneshot(generate_request("ord-1", "admin@acme.example"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(invoice_number::validate(body["invoice_number"].as_str().unwrap()));
    assert_eq!(body["order_ref"], "ord-1");
    assert_eq!(body["state"], "generated");
}

#[tokio::test]
async fn generate_endpoint_rejects_blank_actor() {
    let harness = TestHarness::new();
    harness.orders.insert(test_order("ord-1", "Maharashtra"));
    let router = api::router(harness.service.clone());

    let response = router
        .oneshot(generate_request("ord-1", "   "))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_endpoint_maps_missing_order_to_not_found() {
    let harness = TestHarness::new();
    let router = api::router(harness.service.clone());

    let response = router
        .oneshot(generate_request("no-such-order", "admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_generate_is_a_conflict() {
    let harness = TestHarness::new();
    harness.orders.insert(test_order("ord-1", "Maharashtra"));
    let router = api::router(harness.service.clone());

    let first = router
        .clone()
        .oneshot(generate_request("ord-1", "admin"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .oneshot(generate_request("ord-1", "admin"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_endpoint_reports_absent_invoice() {
    let harness = TestHarness::new();
    let router = api::router(harness.service.clone());

    let response = router
        .oneshot(get_request("/invoices/ord-1/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["exists"], false);
    assert_eq!(body["download_count"], 0);
}

#[tokio::test]
async fn malformed_number_lookup_is_a_bad_request() {
    let harness = TestHarness::new();
    let router = api::router(harness.service.clone());

    let response = router
        .oneshot(get_request("/invoices/by-number/INV_bad"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_endpoint_streams_a_pdf_attachment() {
    let harness = TestHarness::new();
    harness.orders.insert(test_order("ord-1", "Maharashtra"));
    let router = api::router(harness.service.clone());

    let created = router
        .clone()
        .oneshot(generate_request("ord-1", "admin"))
        .await
        .unwrap();
    let number = body_json(created).await["invoice_number"]
        .as_str()
        .unwrap()
        .to_string();

    let response = router
        .oneshot(get_request("/invoices/ord-1/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("invoice-{}.pdf", number)));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn list_endpoint_rejects_unknown_state_filter() {
    let harness = TestHarness::new();
    let router = api::router(harness.service.clone());

    let response = router
        .oneshot(get_request("/invoices?state=archived"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_endpoint_pages_with_a_cursor() {
    let harness = TestHarness::new();
    for n in 1..=3 {
        let order_ref = format!("ord-{}", n);
        harness.orders.insert(test_order(&order_ref, "Maharashtra"));
        harness
            .service
            .generate(&order_ref, "admin", 2026)
            .await
            .unwrap();
    }
    let router = api::router(harness.service.clone());

    let first_page = body_json(
        router
            .clone()
            .oneshot(get_request("/invoices?page_size=2"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first_page["invoices"].as_array().unwrap().len(), 2);
    let token = first_page["next_page_token"].as_str().unwrap().to_string();

    let second_page = body_json(
        router
            .oneshot(get_request(&format!(
                "/invoices?page_size=2&page_token={}",
                token
            )))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(second_page["invoices"].as_array().unwrap().len(), 1);
    assert!(second_page["next_page_token"].is_null());
}

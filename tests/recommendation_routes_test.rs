mod common;

use actix_web::{http::header, test};
use serde_json::{json, Value};

use common::{bearer, sample_plan, TestApp};

/// Percent-encode a query value. Test URIs must stay ASCII.
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["_id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_rt::test]
async fn test_list_defaults_to_latest_first() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/recommendations").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        ids(&body),
        vec!["user-rec-1", "user-rec-2", "user-rec-3", "user-rec-4"]
    );
}

#[actix_rt::test]
async fn test_list_filters_and_sorts() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    // Tag filter, most liked first
    let uri = format!(
        "/api/recommendations?tags={}&sortBy=popular",
        encode("바다")
    );
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(ids(&body), vec!["user-rec-1", "user-rec-4"]);

    // Duration range in days
    let req = test::TestRequest::get()
        .uri("/api/recommendations?duration=2-3")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(ids(&body), vec!["user-rec-3", "user-rec-4"]);

    // Free text search and "all" passthrough
    let uri = format!(
        "/api/recommendations?search={}&season=all&sortBy=rating",
        encode("불국사")
    );
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(ids(&body), vec!["user-rec-3"]);
}

#[actix_rt::test]
async fn test_facets() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/recommendations/facets")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["locations"].as_array().unwrap().len(), 4);
    assert_eq!(body["seasons"], json!(["가을", "봄", "여름"]));
    assert!(body["travelStyles"]
        .as_array()
        .unwrap()
        .contains(&json!("커플")));
}

#[actix_rt::test]
async fn test_like_requires_token() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/recommendations/user-rec-2/like")
        .to_request();
    let result = test::try_call_service(&app, req).await;
    match result {
        Ok(resp) => assert_eq!(resp.status(), 401),
        Err(err) => assert_eq!(err.as_response_error().status_code(), 401),
    }

    let req = test::TestRequest::post()
        .uri("/api/recommendations/user-rec-2/like")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let result = test::try_call_service(&app, req).await;
    match result {
        Ok(resp) => assert_eq!(resp.status(), 401),
        Err(err) => assert_eq!(err.as_response_error().status_code(), 401),
    }
}

#[actix_rt::test]
async fn test_like_toggles() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;
    let token = bearer("user-1", "민지");

    let req = test::TestRequest::post()
        .uri("/api/recommendations/user-rec-2/like")
        .insert_header((header::AUTHORIZATION, token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["likes"], 90);
    assert_eq!(body["liked"], true);

    let req = test::TestRequest::post()
        .uri("/api/recommendations/user-rec-2/like")
        .insert_header((header::AUTHORIZATION, token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["likes"], 89);
    assert_eq!(body["liked"], false);

    let req = test::TestRequest::post()
        .uri("/api/recommendations/nope/like")
        .insert_header((header::AUTHORIZATION, token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_use_recommendation_copies_plan() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/recommendations/user-rec-1/use/mine")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let stored: Value = test::read_body_json(resp).await;
    assert_eq!(stored["source"], "recommendation");
    assert_eq!(stored["title"], "부산 3박 4일 감성 여행 코스");
    assert_eq!(stored["days"][0]["day"], 1);

    let req = test::TestRequest::get().uri("/api/plans/mine").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/recommendations?sortBy=latest")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["views"], 2341);
}

#[actix_rt::test]
async fn test_create_recommendation() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(&json!({
            "title": "부산 1박 2일",
            "description": "짧은 주말 여행",
            "author": "민지",
            "location": "부산",
            "duration": 2,
            "tags": ["바다"],
            "rating": 7.0,
            "budget": "30만원 이하",
            "season": "여름",
            "travelStyle": "친구",
            "plans": sample_plan()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let created: Value = test::read_body_json(resp).await;
    assert!(created["_id"].as_str().unwrap().starts_with("user-rec-"));
    assert_eq!(created["rating"], 5.0);
    assert_eq!(created["likes"], 0);
    assert_eq!(created["plans"][0]["id"], "plan-0");

    let uri = format!("/api/recommendations?location={}", encode("부산"));
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Empty plan is rejected
    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(&json!({
            "title": "빈 여행",
            "description": "",
            "author": "민지",
            "location": "부산",
            "duration": 1,
            "budget": "",
            "season": "",
            "travelStyle": "",
            "plans": []
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_templates() {
    let test_app = TestApp::offline().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[0]["id"], "seoul-foodie-3days");

    let req = test::TestRequest::post()
        .uri("/api/templates/jeju-nature-4days/use/jeju")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let stored: Value = test::read_body_json(resp).await;
    assert_eq!(stored["source"], "template");
    assert!(!stored["days"].as_array().unwrap().is_empty());

    let req = test::TestRequest::post()
        .uri("/api/templates/unknown/use/jeju")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

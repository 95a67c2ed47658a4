use reqwest::StatusCode;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{SubmissionForm, TestApp};

const GENERIC_CSRF_MESSAGE: &str = "Security check failed. Please refresh the page and try again.";

#[tokio::test]
async fn token_endpoint_sets_a_guarded_cookie() {
    let app = TestApp::spawn().await;

    let res = app.form_token().await.expect("Failed to execute request");

    assert!(res.status().is_success());

    let cookie = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("__csrf_token="))
        .expect("No csrf cookie set")
        .to_string();

    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    // Session-scoped: no explicit expiry
    assert!(!cookie.contains("Max-Age"));
    assert!(!cookie.contains("Expires"));

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert!(body["csrfToken"].as_str().is_some());
}

#[tokio::test]
async fn token_endpoint_issues_distinct_tokens() {
    let app = TestApp::spawn().await;

    let (first, _) = app.issue_csrf_pair().await;
    let (second, _) = app.issue_csrf_pair().await;

    assert_ne!(first, second);
}

#[tokio::test]
async fn valid_submission_is_forwarded() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(serde_json::json!({
            "name": "Test Person",
            "email": "test@test.com",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.forms_server)
        .await;

    let (form_token, cookie_value) = app.issue_csrf_pair().await;

    let res = app
        .form_submit(&SubmissionForm::valid(&form_token), Some(&cookie_value))
        .await
        .expect("Failed to execute request");

    assert!(res.status().is_success());
}

#[tokio::test]
async fn submission_without_body_token_is_forbidden() {
    let app = TestApp::spawn().await;

    // Nothing may reach the forward endpoint
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.forms_server)
        .await;

    let (_, cookie_value) = app.issue_csrf_pair().await;

    let mut form = SubmissionForm::valid("unused");
    form.csrf_token = None;

    let res = app
        .form_submit(&form, Some(&cookie_value))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
    assert_generic_security_message(res).await;
}

#[tokio::test]
async fn submission_without_cookie_is_forbidden() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.forms_server)
        .await;

    let (form_token, _) = app.issue_csrf_pair().await;

    let res = app
        .form_submit(&SubmissionForm::valid(&form_token), None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
    assert_generic_security_message(res).await;
}

#[tokio::test]
async fn submission_with_mismatched_tokens_is_forbidden() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.forms_server)
        .await;

    // Token from one issuance, cookie from another
    let (form_token, _) = app.issue_csrf_pair().await;
    let (_, other_cookie) = app.issue_csrf_pair().await;

    let res = app
        .form_submit(&SubmissionForm::valid(&form_token), Some(&other_cookie))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
    assert_generic_security_message(res).await;
}

#[tokio::test]
async fn submission_with_malformed_cookie_is_forbidden() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.forms_server)
        .await;

    let (form_token, cookie_value) = app.issue_csrf_pair().await;

    // Strip the separator so the cookie no longer splits into value.signature
    let cookie_value = cookie_value.replace('.', "");

    let res = app
        .form_submit(&SubmissionForm::valid(&form_token), Some(&cookie_value))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
    assert_generic_security_message(res).await;
}

#[tokio::test]
async fn submission_with_tampered_signature_is_forbidden() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.forms_server)
        .await;

    let (form_token, cookie_value) = app.issue_csrf_pair().await;

    let (value, signature) = cookie_value.split_once('.').unwrap();
    let mut tampered: Vec<char> = signature.chars().collect();
    tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
    let cookie_value = format!("{}.{}", value, tampered.into_iter().collect::<String>());

    let res = app
        .form_submit(&SubmissionForm::valid(&form_token), Some(&cookie_value))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
    assert_generic_security_message(res).await;
}

#[tokio::test]
async fn invalid_fields_are_reported_per_field() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.forms_server)
        .await;

    let (form_token, cookie_value) = app.issue_csrf_pair().await;

    let mut form = SubmissionForm::valid(&form_token);
    form.email = Some("not an email".into());
    form.message = None;

    let res = app
        .form_submit(&form, Some(&cookie_value))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("No field detail in validation response")
        .iter()
        .filter_map(|entry| entry["field"].as_str())
        .collect();

    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"message"));
}

#[tokio::test]
async fn forward_failure_surfaces_as_bad_gateway() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.forms_server)
        .await;

    let (form_token, cookie_value) = app.issue_csrf_pair().await;

    let res = app
        .form_submit(&SubmissionForm::valid(&form_token), Some(&cookie_value))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_GATEWAY, res.status());

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("error", body["result"].as_str().unwrap());
}

async fn assert_generic_security_message(res: reqwest::Response) {
    let body: serde_json::Value = res.json().await.expect("Failed to parse error body");

    assert_eq!("error", body["result"].as_str().unwrap());
    // The reason taxonomy must not leak; every failure reads the same
    assert_eq!(GENERIC_CSRF_MESSAGE, body["message"].as_str().unwrap());
}

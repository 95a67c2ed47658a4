use reqwest::StatusCode;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{NewSubscriber, TestApp};

#[tokio::test]
async fn subscribe_inserts_an_active_subscriber() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/documents/subscribers"))
        .and(query_param("documentId", "test@test.com"))
        .and(body_partial_json(serde_json::json!({
            "fields": {
                "email": { "stringValue": "test@test.com" },
                "active": { "booleanValue": true },
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let new_subscriber = NewSubscriber {
        email: Some("test@test.com".into()),
        animal_type: Some("dog".into()),
        size: Some("any".into()),
        age: Some("young".into()),
    };

    let res = app
        .subscription_create(&new_subscriber)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CREATED, res.status());
}

#[tokio::test]
async fn omitted_preferences_default_to_wildcards() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/documents/subscribers"))
        .and(body_partial_json(serde_json::json!({
            "fields": {
                "preferences": {
                    "stringValue": r#"{"animalType":"any","size":"any","age":"any"}"#,
                },
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let new_subscriber = NewSubscriber {
        email: Some("test@test.com".into()),
        ..Default::default()
    };

    let res = app
        .subscription_create(&new_subscriber)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CREATED, res.status());
}

#[tokio::test]
async fn subscribe_rejects_bad_input_with_field_detail() {
    let app = TestApp::spawn().await;

    // No writes may reach the store
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.store_server)
        .await;

    let test_cases: Vec<(&str, NewSubscriber, &str)> = vec![
        (
            "missing email",
            NewSubscriber {
                email: None,
                ..Default::default()
            },
            "email",
        ),
        (
            "malformed email",
            NewSubscriber {
                email: Some("bad email address".into()),
                ..Default::default()
            },
            "email",
        ),
        (
            "unknown animal type",
            NewSubscriber {
                email: Some("test@test.com".into()),
                animal_type: Some("unicorn".into()),
                ..Default::default()
            },
            "animalType",
        ),
        (
            "unknown size",
            NewSubscriber {
                email: Some("test@test.com".into()),
                size: Some("colossal".into()),
                ..Default::default()
            },
            "size",
        ),
    ];

    for (desc, new_subscriber, expected_field) in test_cases {
        let res = app
            .subscription_create(&new_subscriber)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload was {}",
            desc
        );

        let body: serde_json::Value = res.json().await.expect("Failed to parse body");
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .expect("No field detail in validation response")
            .iter()
            .filter_map(|entry| entry["field"].as_str())
            .collect();

        assert!(
            fields.contains(&expected_field),
            "Missing {} in field detail for case: {}",
            expected_field,
            desc
        );
    }
}

#[tokio::test]
async fn subscribe_surfaces_store_failure_as_bad_gateway() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let new_subscriber = NewSubscriber {
        email: Some("test@test.com".into()),
        ..Default::default()
    };

    let res = app
        .subscription_create(&new_subscriber)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_GATEWAY, res.status());
}

#[tokio::test]
async fn subscribe_and_unsubscribe_address_the_same_document() {
    let app = TestApp::spawn().await;

    // The insert must pin the document id to the email address; a store
    // that assigns its own id would leave unsubscribe patching a document
    // that does not exist
    Mock::given(method("POST"))
        .and(path("/documents/subscribers"))
        .and(query_param("documentId", "someone@test.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.store_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/documents/subscribers/someone@test.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let new_subscriber = NewSubscriber {
        email: Some("someone@test.com".into()),
        ..Default::default()
    };

    let res = app
        .subscription_create(&new_subscriber)
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::CREATED, res.status());

    let res = app
        .unsubscribe("someone@test.com")
        .await
        .expect("Failed to execute request");
    assert!(res.status().is_success());
}

#[tokio::test]
async fn unsubscribe_flips_the_active_flag() {
    let app = TestApp::spawn().await;

    Mock::given(method("PATCH"))
        .and(path("/documents/subscribers/test@test.com"))
        .and(query_param("updateMask.fieldPaths", "active"))
        .and(body_partial_json(serde_json::json!({
            "fields": {
                "active": { "booleanValue": false },
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .unsubscribe("test@test.com")
        .await
        .expect("Failed to execute request");

    assert!(res.status().is_success());
}

#[tokio::test]
async fn unsubscribe_requires_a_valid_email() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.store_server)
        .await;

    let res = app
        .unsubscribe("not an email")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
}

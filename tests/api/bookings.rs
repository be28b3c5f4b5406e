use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use serde_json::{json, Value};

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{valid_booking, TestApp, UnreachableStore};

async fn mount_email_api(app: &TestApp, status: u16) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&app.email_server)
        .await;
}

/// Book a valid appointment for `name`, returning its stored ID
async fn book_as(app: &TestApp, name: &str) -> String {
    let mut booking = valid_booking();
    booking["name"] = json!(name);

    let res = app.book(&booking).await.expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    app.bookings()
        .await
        .into_iter()
        .find(|b| b["name"] == name)
        .and_then(|b| b["id"].as_str().map(String::from))
        .expect("Booking was not stored")
}

#[tokio::test]
async fn book_accepts_and_stores_valid_request() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;

    let res = app
        .book(&valid_booking())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(json!({ "accepted": true }), res.json::<Value>().await.unwrap());

    let bookings = app.bookings().await;
    assert_eq!(1, bookings.len());
    let stored = &bookings[0];
    for field in ["service", "date", "time", "name", "email", "phone"] {
        assert_eq!(valid_booking()[field], stored[field], "{} differs", field);
    }
    assert!(stored["id"].as_str().unwrap().parse::<Uuid>().is_ok());
    assert!(stored.get("createdAt").is_some());
}

#[tokio::test]
async fn book_sends_confirmation_to_customer() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;

    app.book(&valid_booking())
        .await
        .expect("Failed to execute request");

    let requests = app.email_requests(1).await;
    assert_eq!(1, requests.len());

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!("asha@example.com", body["To"]);
    assert_eq!("\"Bookings\" <bookings@test.com>", body["From"]);
    assert_eq!("booking-confirmation", body["Tag"]);
    let text = body["TextBody"].as_str().unwrap();
    assert!(text.contains("Math Tutoring"));
    assert!(text.contains("2024-05-01"));
    assert!(text.contains("10:00"));
}

#[tokio::test]
async fn book_is_accepted_when_email_credentials_are_rejected() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 401).await;

    let res = app
        .book(&valid_booking())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(json!({ "accepted": true }), res.json::<Value>().await.unwrap());

    // A single attempt is made, and the booking is kept
    assert_eq!(1, app.email_requests(1).await.len());
    assert_eq!(1, app.bookings().await.len());
}

#[tokio::test]
async fn book_is_accepted_when_email_api_is_down() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 500).await;

    let res = app
        .book(&valid_booking())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(1, app.bookings().await.len());
}

#[tokio::test]
async fn book_rejects_missing_details() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;

    let mut test_cases: Vec<(String, Value)> = ["service", "date", "time", "name", "email", "phone"]
        .into_iter()
        .map(|field| {
            let mut booking = valid_booking();
            booking.as_object_mut().unwrap().remove(field);
            (format!("missing {}", field), booking)
        })
        .collect();
    test_cases.push(("blank name".into(), {
        let mut booking = valid_booking();
        booking["name"] = json!("  ");
        booking
    }));
    test_cases.push(("empty body".into(), json!({})));

    for (desc, booking) in test_cases {
        let res = app.book(&booking).await.expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not reject the payload with {}",
            desc
        );
        assert_eq!(
            json!({ "accepted": false, "reason": "Missing details" }),
            res.json::<Value>().await.unwrap(),
            "Unexpected body for payload with {}",
            desc
        );
    }

    assert!(app.bookings().await.is_empty());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(app.email_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn book_rejects_malformed_json() {
    let app = TestApp::spawn().await;

    let res = app
        .request(reqwest::Method::POST, "book")
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert_eq!(
        json!({ "accepted": false, "reason": "Missing details" }),
        res.json::<Value>().await.unwrap()
    );
    assert!(app.bookings().await.is_empty());
}

#[tokio::test]
async fn book_rejects_non_string_fields() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;

    let test_cases = [
        ("phone", json!(5551234)),
        ("date", json!(null)),
        ("name", json!(["Asha"])),
        ("service", json!(true)),
    ];

    for (field, value) in test_cases {
        let mut booking = valid_booking();
        booking[field] = value.clone();

        let res = app.book(&booking).await.expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not reject {} = {}",
            field,
            value
        );
        assert_eq!(
            json!({ "accepted": false, "reason": "Missing details" }),
            res.json::<Value>().await.unwrap(),
            "Unexpected body for {} = {}",
            field,
            value
        );
    }

    assert!(app.bookings().await.is_empty());
}

#[tokio::test]
async fn book_accepts_body_without_json_content_type() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;

    let res = app
        .request(reqwest::Method::POST, "book")
        .body(valid_booking().to_string())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(json!({ "accepted": true }), res.json::<Value>().await.unwrap());
    assert_eq!(1, app.bookings().await.len());
}

#[tokio::test]
async fn book_rejects_empty_body_without_content_type() {
    let app = TestApp::spawn().await;

    let res = app
        .request(reqwest::Method::POST, "book")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert_eq!(
        json!({ "accepted": false, "reason": "Missing details" }),
        res.json::<Value>().await.unwrap()
    );
}

#[tokio::test]
async fn book_reports_generic_failure_when_store_fails() {
    let app = TestApp::spawn_with_store(Arc::new(UnreachableStore)).await;
    mount_email_api(&app, 200).await;

    let res = app
        .book(&valid_booking())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "accepted": false, "reason": "Booking failed" }),
        res.json::<Value>().await.unwrap()
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(app.email_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_is_empty_without_bookings() {
    let app = TestApp::spawn().await;

    let res = app.list().await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(json!([]), res.json::<Value>().await.unwrap());
}

#[tokio::test]
async fn list_returns_newest_first() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;

    for name in ["A", "B", "C"] {
        book_as(&app, name).await;
    }

    let first = app.bookings().await;
    let names: Vec<_> = first.iter().map(|b| b["name"].as_str().unwrap()).collect();
    assert_eq!(vec!["C", "B", "A"], names);

    assert_eq!(first, app.bookings().await);
}

#[tokio::test]
async fn list_reports_error_when_store_fails() {
    let app = TestApp::spawn_with_store(Arc::new(UnreachableStore)).await;

    let res = app.list().await.expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "error": "Error fetching bookings" }),
        res.json::<Value>().await.unwrap()
    );
}

#[tokio::test]
async fn reschedule_updates_only_date_and_time() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;
    let id = book_as(&app, "Asha").await;

    let res = app
        .reschedule(&id, &json!({ "date": "2024-06-01", "time": "11:00" }))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(
        json!({ "message": "Booking updated successfully" }),
        res.json::<Value>().await.unwrap()
    );

    let bookings = app.bookings().await;
    assert_eq!(id, bookings[0]["id"]);
    assert_eq!("2024-06-01", bookings[0]["date"]);
    assert_eq!("11:00", bookings[0]["time"]);
    assert_eq!("Math Tutoring", bookings[0]["service"]);
    assert_eq!("Asha", bookings[0]["name"]);
}

#[tokio::test]
async fn reschedule_rejects_incomplete_schedule() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;
    let id = book_as(&app, "Asha").await;
    let before = app.bookings().await;

    let test_cases = [
        ("missing time", json!({ "date": "2024-06-01" })),
        ("missing date", json!({ "time": "11:00" })),
        ("numeric time", json!({ "date": "2024-06-01", "time": 11 })),
    ];

    for (desc, schedule) in test_cases {
        let res = app
            .reschedule(&id, &schedule)
            .await
            .expect("Failed to execute request");

        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "{}", desc);
        let body = res.json::<Value>().await.unwrap();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Parse Error"), "{}: {}", desc, body);
    }

    assert_eq!(before, app.bookings().await);
}

#[tokio::test]
async fn reschedule_accepts_body_without_json_content_type() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;
    let id = book_as(&app, "Asha").await;

    let res = app
        .request(reqwest::Method::PUT, &format!("bookings/{}", id))
        .body(json!({ "date": "2024-06-01", "time": "11:00" }).to_string())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!("11:00", app.bookings().await[0]["time"]);
}

#[tokio::test]
async fn reschedule_unknown_booking_is_not_found() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;
    book_as(&app, "Asha").await;
    let before = app.bookings().await;

    for id in [Uuid::new_v4().to_string(), "not-a-booking-id".to_string()] {
        let res = app
            .reschedule(&id, &json!({ "date": "2024-06-01", "time": "11:00" }))
            .await
            .expect("Failed to execute request");

        assert_eq!(StatusCode::NOT_FOUND, res.status());
        assert_eq!(
            json!({ "message": "Booking not found" }),
            res.json::<Value>().await.unwrap()
        );
    }

    assert_eq!(before, app.bookings().await);
}

#[tokio::test]
async fn reschedule_reports_error_when_store_fails() {
    let app = TestApp::spawn_with_store(Arc::new(UnreachableStore)).await;

    let res = app
        .reschedule(
            &Uuid::new_v4().to_string(),
            &json!({ "date": "2024-06-01", "time": "11:00" }),
        )
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "message": "Update error" }),
        res.json::<Value>().await.unwrap()
    );
}

#[tokio::test]
async fn delete_removes_booking_once() {
    let app = TestApp::spawn().await;
    mount_email_api(&app, 200).await;
    let id = book_as(&app, "Asha").await;

    let res = app.delete(&id).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(
        json!({ "message": "Booking deleted successfully" }),
        res.json::<Value>().await.unwrap()
    );
    assert!(app.bookings().await.is_empty());

    let res = app.delete(&id).await.expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());
    assert_eq!(
        json!({ "message": "Booking not found" }),
        res.json::<Value>().await.unwrap()
    );
}

#[tokio::test]
async fn delete_reports_error_when_store_fails() {
    let app = TestApp::spawn_with_store(Arc::new(UnreachableStore)).await;

    let res = app
        .delete(&Uuid::new_v4().to_string())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "message": "Delete error" }),
        res.json::<Value>().await.unwrap()
    );
}

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use travel_api::{app, AppState};
use travel_core::registration::{self, RegistrationOutcome, UnregistrationOutcome};
use travel_core::{ClientTrip, CoreError, CoreResult, NewClient, Trip, TravelRepository};
use travel_store::memory_repo::Registration;
use travel_store::MemoryTravelRepository;

fn trip(id: i32, max_people: i32, country: &str) -> Trip {
    let at = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap().and_hms_opt(9, 30, 0).unwrap();
    Trip {
        id_trip: id,
        name: format!("Trip {id}"),
        description: format!("Tour of {country}"),
        date_from: at(7, 1),
        date_to: at(7, 10),
        max_people,
        country_name: country.to_string(),
    }
}

fn setup(trips: Vec<Trip>) -> (Router, Arc<MemoryTravelRepository>) {
    let repo = Arc::new(MemoryTravelRepository::with_trips(trips));
    (app(AppState::new(repo.clone())), repo)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

fn client_payload(n: u32) -> Value {
    json!({
        "firstName": "Jan",
        "lastName": format!("Nowak{n}"),
        "email": format!("jan{n}@example.com"),
        "telephone": "+48 600 100 200",
        "pesel": format!("{:011}", 90010100000u64 + n as u64),
    })
}

async fn create_client(app: &Router, n: u32) -> i64 {
    let (status, body) = send(app, "POST", "/api/clients", Some(client_payload(n))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_list_trips_returns_all_trips() {
    let (app, _) = setup(vec![trip(1, 10, "Poland"), trip(2, 5, "Italy")]);

    let (status, body) = send(&app, "GET", "/api/trips", None).await;
    assert_eq!(status, StatusCode::OK);

    let trips = body.as_array().unwrap();
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0]["idTrip"], 1);
    assert_eq!(trips[0]["countryName"], "Poland");
    assert_eq!(trips[0]["dateFrom"], "2025-07-01T09:30:00");
    assert_eq!(trips[1]["maxPeople"], 5);
}

#[tokio::test]
async fn test_list_trips_empty_is_ok() {
    let (app, _) = setup(vec![]);
    let (status, body) = send(&app, "GET", "/api/trips", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_client_returns_id_and_location() {
    let (app, _) = setup(vec![]);

    let request = Request::builder()
        .method("POST")
        .uri("/api/clients")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(client_payload(1).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(location, format!("/api/clients/{id}/trips"));

    let second = create_client(&app, 2).await;
    assert_ne!(id, second);
}

#[tokio::test]
async fn test_create_client_rejects_bad_pesel() {
    let (app, _) = setup(vec![]);
    let mut payload = client_payload(1);
    payload["pesel"] = json!("1234567890");

    let (status, body) = send(&app, "POST", "/api/clients", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["fields"]["pesel"].is_array());
    assert!(body["fields"].get("email").is_none());
}

#[tokio::test]
async fn test_create_client_reports_every_invalid_field() {
    let (app, _) = setup(vec![]);
    let payload = json!({
        "firstName": "x".repeat(51),
        "email": "nobody",
        "telephone": "not a phone",
        "pesel": "abc",
    });

    let (status, body) = send(&app, "POST", "/api/clients", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["firstName", "lastName", "email", "telephone", "pesel"] {
        assert!(body["fields"][field].is_array(), "missing violation for {field}");
    }
}

#[tokio::test]
async fn test_create_client_malformed_json() {
    let (app, _) = setup(vec![]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/clients")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"firstName\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["fields"]["body"].is_array());
}

#[tokio::test]
async fn test_register_and_list_client_trips() {
    let (app, _) = setup(vec![trip(3, 10, "Greece")]);
    let id = create_client(&app, 1).await;

    let (status, _) = send(&app, "GET", &format!("/api/clients/{id}/trips"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "PUT", &format!("/api/clients/{id}/trips/3"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Client {id} registered for trip 3."));

    let (status, body) = send(&app, "GET", &format!("/api/clients/{id}/trips"), None).await;
    assert_eq!(status, StatusCode::OK);
    let trips = body.as_array().unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0]["idTrip"], 3);
    assert_eq!(trips[0]["countryName"], "Greece");
    assert_eq!(trips[0]["registeredAt"], registration::today());
    assert_eq!(trips[0]["paymentDate"], Value::Null);
}

#[tokio::test]
async fn test_client_trips_show_payment_date() {
    let (app, repo) = setup(vec![trip(1, 10, "Spain")]);
    let id = create_client(&app, 1).await as i32;
    repo.insert_registration(Registration {
        client_id: id,
        trip_id: 1,
        registered_at: 20250101,
        payment_date: Some(20250115),
    })
    .await;

    let (status, body) = send(&app, "GET", &format!("/api/clients/{id}/trips"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["registeredAt"], 20250101);
    assert_eq!(body[0]["paymentDate"], 20250115);
}

#[tokio::test]
async fn test_unknown_client_trips_is_not_found() {
    let (app, _) = setup(vec![trip(1, 10, "Spain")]);
    let (status, body) = send(&app, "GET", "/api/clients/999/trips", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Client with id 999 does not exist or has no registered trips."
    );
}

#[tokio::test]
async fn test_register_unknown_client_or_trip() {
    let (app, repo) = setup(vec![trip(1, 10, "Spain")]);

    let (status, body) = send(&app, "PUT", "/api/clients/7/trips/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Client with id 7 does not exist.");
    assert!(repo.registrations().await.is_empty());

    let id = create_client(&app, 1).await;
    let (status, body) = send(&app, "PUT", &format!("/api/clients/{id}/trips/42"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Trip with id 42 does not exist.");
}

#[tokio::test]
async fn test_last_seat_then_capacity_reached() {
    let (app, repo) = setup(vec![trip(3, 10, "Croatia")]);
    for n in 0..9 {
        let id = create_client(&app, n).await;
        let (status, _) = send(&app, "PUT", &format!("/api/clients/{id}/trips/3"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let last = create_client(&app, 100).await;
    let (status, _) = send(&app, "PUT", &format!("/api/clients/{last}/trips/3"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repo.registration_count(3).await, 10);

    let late = create_client(&app, 101).await;
    let (status, body) = send(&app, "PUT", &format!("/api/clients/{late}/trips/3"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Trip 3 has reached its maximum number of participants.");
    assert_eq!(repo.registration_count(3).await, 10);
}

#[tokio::test]
async fn test_duplicate_registration_is_bad_request() {
    let (app, repo) = setup(vec![trip(1, 10, "Spain")]);
    let id = create_client(&app, 1).await;

    let (status, _) = send(&app, "PUT", &format!("/api/clients/{id}/trips/1"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "PUT", &format!("/api/clients/{id}/trips/1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], format!("Client {id} is already registered for trip 1."));
    assert_eq!(repo.registrations().await.len(), 1);
}

#[tokio::test]
async fn test_unregister() {
    let (app, repo) = setup(vec![trip(1, 10, "Spain"), trip(2, 10, "France")]);
    let id = create_client(&app, 1).await;
    send(&app, "PUT", &format!("/api/clients/{id}/trips/1"), None).await;
    send(&app, "PUT", &format!("/api/clients/{id}/trips/2"), None).await;

    let (status, body) = send(&app, "DELETE", "/api/clients/55/trips/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Registration of client 55 for trip 1 does not exist.");

    let (status, body) = send(&app, "DELETE", &format!("/api/clients/{id}/trips/1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Registration of client {id} for trip 1 removed."));

    let rows = repo.registrations().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trip_id, 2);

    let (status, _) = send(&app, "DELETE", &format!("/api/clients/{id}/trips/1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_integer_path_is_bad_request() {
    let (app, _) = setup(vec![trip(1, 10, "Spain")]);

    let (status, body) = send(&app, "PUT", "/api/clients/abc/trips/1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/api/clients/1.5/trips", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

struct FailingRepository;

#[async_trait]
impl TravelRepository for FailingRepository {
    async fn list_trips(&self) -> CoreResult<Vec<Trip>> {
        Err(CoreError::Internal("relation \"trip\" does not exist".into()))
    }

    async fn list_client_trips(&self, _client_id: i32) -> CoreResult<Vec<ClientTrip>> {
        Err(CoreError::Internal("relation \"client_trip\" does not exist".into()))
    }

    async fn create_client(&self, _client: &NewClient) -> CoreResult<i32> {
        Err(CoreError::Internal("duplicate key value violates constraint".into()))
    }

    async fn register_client_for_trip(&self, _client_id: i32, _trip_id: i32) -> CoreResult<RegistrationOutcome> {
        Err(CoreError::Internal("pool timed out while waiting for an open connection".into()))
    }

    async fn unregister_client_from_trip(&self, _client_id: i32, _trip_id: i32) -> CoreResult<UnregistrationOutcome> {
        Err(CoreError::Internal("pool timed out while waiting for an open connection".into()))
    }
}

#[tokio::test]
async fn test_store_failures_are_opaque() {
    let app = app(AppState::new(Arc::new(FailingRepository)));

    let requests = [
        ("GET", "/api/trips".to_string(), None),
        ("GET", "/api/clients/1/trips".to_string(), None),
        ("POST", "/api/clients".to_string(), Some(client_payload(1))),
        ("PUT", "/api/clients/1/trips/1".to_string(), None),
        ("DELETE", "/api/clients/1/trips/1".to_string(), None),
    ];

    for (method, uri, body) in requests {
        let (status, body) = send(&app, method, &uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["incidentId"].is_string());
        let text = body.to_string();
        assert!(!text.contains("relation") && !text.contains("pool") && !text.contains("constraint"));
    }
}

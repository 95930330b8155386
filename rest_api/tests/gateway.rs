// rest_api/tests/gateway.rs

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use lib::registry::{CensusPools, PatientRegistry};
use lib::simulator::Simulator;
use rest_api::{router, BroadcastGateway};

const ORIGIN: &str = "http://localhost:5173";

fn gateway(count: usize) -> BroadcastGateway {
    let mut rng = StdRng::seed_from_u64(31);
    let registry = PatientRegistry::create_all(count, &CensusPools::default(), &mut rng, Utc::now()).unwrap();
    BroadcastGateway::new(Arc::new(registry), 16)
}

fn app(gateway: &BroadcastGateway) -> Router {
    router(gateway.clone(), ORIGIN).unwrap()
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn should_report_health_with_iso_timestamp() {
    let gw = gateway(2);
    let (status, body) = get_json(app(&gw), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let stamp = body["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(stamp).is_ok(), "bad timestamp {}", stamp);
}

#[tokio::test]
async fn should_list_every_patient_in_creation_order() {
    let gw = gateway(20);
    let (status, body) = get_json(app(&gw), "/api/patients").await;
    assert_eq!(status, StatusCode::OK);

    let patients = body.as_array().unwrap();
    assert_eq!(patients.len(), 20);
    assert_eq!(patients[0]["id"], "PAT0001");
    assert_eq!(patients[19]["id"], "PAT0020");

    let first = &patients[0];
    for key in ["name", "age", "ward", "diagnosis", "status"] {
        assert!(!first[key].is_null(), "missing {}", key);
    }
    let vitals = &first["vitalSigns"];
    for key in ["heartRate", "systolic", "diastolic", "spo2", "temperature", "respiratoryRate", "timestamp"] {
        assert!(vitals[key].is_number(), "missing vitalSigns.{}", key);
    }
}

#[tokio::test]
async fn should_fetch_single_patient_or_404() {
    let gw = gateway(5);
    let (status, body) = get_json(app(&gw), "/api/patients/PAT0003").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "PAT0003");

    let (status, body) = get_json(app(&gw), "/api/patients/PAT0404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("PAT0404"));
}

#[tokio::test]
async fn should_summarize_census() {
    let gw = gateway(8);
    let (status, body) = get_json(app(&gw), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patientCount"], 8);
    let total = body["stableCount"].as_u64().unwrap()
        + body["warningCount"].as_u64().unwrap()
        + body["criticalCount"].as_u64().unwrap();
    assert_eq!(total, 8);
    assert!(body["avgHeartRate"].as_f64().unwrap() >= 40.0);
}

#[tokio::test]
async fn should_allow_configured_origin() {
    let gw = gateway(1);
    let response = app(&gw)
        .oneshot(
            Request::builder()
                .uri("/api/patients")
                .header(header::ORIGIN, ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).map(|v| v.to_str().unwrap()),
        Some(ORIGIN)
    );
}

#[test]
fn should_reject_unparseable_origin() {
    let gw = gateway(1);
    assert!(router(gw, "bad\norigin").is_err());
}

#[tokio::test]
async fn should_publish_snapshot_to_subscribers() {
    let gw = gateway(3);
    assert_eq!(gw.publish_snapshot(&gw.get_all()).unwrap(), 0);

    let mut first = gw.subscribe();
    let mut second = gw.subscribe();
    assert_eq!(gw.subscriber_count(), 2);
    assert_eq!(gw.publish_snapshot(&gw.get_all()).unwrap(), 2);

    for rx in [&mut first, &mut second] {
        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "vital-update");
        assert_eq!(frame["data"].as_array().map(Vec::len), Some(3));
    }
}

#[tokio::test]
async fn should_broadcast_each_simulator_tick() {
    let registry = Arc::new(
        PatientRegistry::create_all(4, &CensusPools::default(), &mut StdRng::seed_from_u64(31), Utc::now()).unwrap(),
    );
    let gw = BroadcastGateway::new(Arc::clone(&registry), 16);
    let mut rx = gw.subscribe();

    let simulator = Simulator::new(Arc::clone(&registry), Duration::from_millis(1_000));
    let before = gw.get_all();
    let report = simulator.tick_now(&gw).unwrap();
    assert!(report.sink_delivered);
    assert_eq!(report.updated, 4);

    let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["event"], "vital-update");
    let data = frame["data"].as_array().unwrap();
    assert_eq!(data.len(), 4);
    for (patient, old) in data.iter().zip(&before) {
        let stamp = patient["vitalSigns"]["timestamp"].as_i64().unwrap();
        assert!(stamp > old.vital_signs.captured_at.timestamp_millis());
    }
}

#[tokio::test]
async fn should_stream_ticks_while_running() {
    let registry = Arc::new(
        PatientRegistry::create_all(2, &CensusPools::default(), &mut StdRng::seed_from_u64(5), Utc::now()).unwrap(),
    );
    let gw = BroadcastGateway::new(Arc::clone(&registry), 16);
    let mut rx = gw.subscribe();

    let simulator = Simulator::new(registry, Duration::from_millis(20));
    assert!(simulator.start(Arc::new(gw.clone())));

    for _ in 0..2 {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert!(frame.contains("\"vital-update\""));
    }
    simulator.shutdown().await;
}

#[tokio::test]
async fn should_map_gateway_errors_to_status_codes() {
    use axum::response::IntoResponse;
    use rest_api::GatewayError;

    let not_found = GatewayError::PatientNotFound("PAT0404".to_string()).into_response();
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

    let origin = GatewayError::InvalidOrigin("bad".to_string()).into_response();
    assert_eq!(origin.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(origin.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid CORS origin: bad");
}

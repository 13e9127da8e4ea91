use chrono::NaiveDate;
use ridestream_alerts::{evaluate, render, AlertCategory, Notifier, WebhookNotifier};
use ridestream_schema::TripRow;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storm_row() -> TripRow {
    TripRow {
        ride_id: "6a2f41a3-c54c-4b8e-9c1c-2d6d0a3e5f11".into(),
        timestamp: NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap(),
        source: "Financial District".into(),
        destination: "Beacon Hill".into(),
        cab_type: "Lyft".into(),
        name: "Shared".into(),
        distance: Some(1.12),
        surge_multiplier: Some(1.6),
        temperature: 47.3,
        precip_intensity: 0.74,
        alert_trigger: Some("RUSH HOUR, STORM STARTED".into()),
    }
}

#[tokio::test]
async fn posts_embed_to_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/123/abc"))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{ "title": "⛈️ WEATHER ALERT: STORM", "color": 15105570 }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let row = storm_row();
    let category = evaluate(&row).unwrap();
    assert_eq!(category, AlertCategory::StormWeather);

    let notifier = WebhookNotifier::new(format!("{}/api/webhooks/123/abc", server.uri()));
    notifier.send(&render(category, &row)).await.unwrap();
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri());
    let err = notifier
        .send(&render(AlertCategory::HighSurge, &storm_row()))
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("429"), "{msg}");
    assert!(msg.contains("rate limited"), "{msg}");
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    let notifier = WebhookNotifier::new("http://127.0.0.1:9/webhook");
    assert!(notifier
        .send(&render(AlertCategory::DataQuality, &storm_row()))
        .await
        .is_err());
}

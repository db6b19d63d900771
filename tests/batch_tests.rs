//! Batch requests against a mock server.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use integrations_calendar::{BatchBuilder, CalendarErrorKind, UpsertEventRequest};
use serde_json::json;
use wiremock::matchers::body_json;

fn batch() -> BatchBuilder {
    let event = UpsertEventRequest::new(
        "evt_1",
        "Board meeting",
        Utc.with_ymd_and_hms(2014, 8, 5, 15, 30, 0).unwrap(),
        Utc.with_ymd_and_hms(2014, 8, 5, 17, 0, 0).unwrap(),
    );

    BatchBuilder::new()
        .upsert_event("cal_123", &event)
        .unwrap()
        .delete_event("cal_123", "evt_2")
}

fn expected_request() -> serde_json::Value {
    json!({
        "batch": [
            {
                "method": "POST",
                "relative_url": "/v1/calendars/cal_123/events",
                "data": {
                    "event_id": "evt_1",
                    "summary": "Board meeting",
                    "start": "2014-08-05T15:30:00Z",
                    "end": "2014-08-05T17:00:00Z"
                }
            },
            {
                "method": "DELETE",
                "relative_url": "/v1/calendars/cal_123/events",
                "data": { "event_id": "evt_2" }
            }
        ]
    })
}

#[tokio::test]
async fn test_batch_all_succeeded() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/v1/batch")
        .and(body_json(expected_request()))
        .respond_with(json_response(
            207,
            json!({ "batch": [{ "status": 202 }, { "status": 202 }] }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).batch().execute(batch()).await.unwrap();

    assert!(!result.has_errors());
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[1].request.method, "DELETE");
}

#[tokio::test]
async fn test_batch_partial_success() {
    let server = setup_mock_server().await;

    mock_with_auth("POST", "/v1/batch")
        .respond_with(json_response(
            207,
            json!({
                "batch": [
                    { "status": 202 },
                    {
                        "status": 404,
                        "headers": { "Content-Type": "application/json" },
                        "data": { "errors": { "event_id": [{ "key": "errors.not_found" }] } }
                    }
                ]
            }),
        ))
        .mount(&server)
        .await;

    let err = client(&server).batch().execute(batch()).await.unwrap_err();
    assert_eq!(err.kind(), CalendarErrorKind::PartialSuccess);

    let result = err.batch_response().unwrap();
    assert!(result.has_errors());

    let failed: Vec<_> = result.errors().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].status(), 404);
    assert_eq!(failed[0].request.relative_url, "/v1/calendars/cal_123/events");
}

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, NaiveTime, Timelike};
use helpers::{TestApp, app::campus_now, app::token, make_test_app};
use serde_json::{Value, json};
use services::capability::Role;

const STAFF: i64 = 30;
const ADMIN: i64 = 1;

fn hhmm(t: NaiveTime) -> String {
    format!("{:02}:{:02}:00", t.hour(), t.minute())
}

/// A shift for `user_id` that started half an hour ago and runs two more hours.
async fn running_shift(app: &TestApp, user_id: i64) -> Value {
    let starts = campus_now() - Duration::minutes(30);
    let ends = campus_now() + Duration::hours(2);
    let (status, json) = app
        .send(
            "POST",
            "/api/work-attendance/schedules",
            Some(&token(ADMIN, Role::Admin)),
            Some(json!({
                "user_id": user_id,
                "date": starts.date_naive().to_string(),
                "start_time": hhmm(starts.time()),
                "end_time": hhmm(ends.time()),
                "grace_minutes": 5,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"].clone()
}

#[tokio::test]
async fn shift_pattern_administration() {
    let app = make_test_app().await;
    let admin = token(ADMIN, Role::Admin);
    let lecturer = token(10, Role::Lecturer);
    let pattern = json!({
        "code": "day",
        "name": "Day shift",
        "start_time": "08:00:00",
        "end_time": "16:00:00",
        "grace_minutes": 10,
    });

    let (status, _) = app
        .send("POST", "/api/work-attendance/shift-patterns", Some(&lecturer), Some(pattern.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send("POST", "/api/work-attendance/shift-patterns", Some(&admin), Some(pattern.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["code"], "DAY");
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send("POST", "/api/work-attendance/shift-patterns", Some(&admin), Some(pattern.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/work-attendance/shift-patterns/{id}");
    let (status, json) = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "name": "Morning" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Morning");

    let (status, json) = app
        .send(
            "POST",
            "/api/work-attendance/user-shifts",
            Some(&admin),
            Some(json!({
                "user_id": STAFF,
                "shift_pattern_id": id,
                "effective_from": "2025-01-01",
                "effective_until": "2024-12-31",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{json}");

    let (status, _) = app
        .send(
            "POST",
            "/api/work-attendance/user-shifts",
            Some(&admin),
            Some(json!({ "user_id": STAFF, "shift_pattern_id": id, "effective_from": "2025-01-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = app
        .send(
            "POST",
            "/api/work-attendance/schedules",
            Some(&admin),
            Some(json!({ "user_id": STAFF, "date": "2025-03-03" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["start_time"], "08:00:00");
    assert_eq!(json["data"]["grace_minutes"], 10);

    let (_, json) = app
        .send(
            "GET",
            "/api/work-attendance/user-shifts?date=2025-03-03",
            Some(&token(STAFF, Role::Staff)),
            None,
        )
        .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("POST", "/api/work-attendance/shift-patterns", Some(&admin), Some(pattern))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn check_in_and_out_of_a_running_shift() {
    let app = make_test_app().await;
    let shift = running_shift(&app, STAFF).await;
    let shift_id = shift["id"].as_i64().unwrap();
    let staff = token(STAFF, Role::Staff);
    let body = json!({ "work_schedule_id": shift_id });

    let (status, _) = app
        .send("POST", "/api/work-attendance/check-out", Some(&staff), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(
            "POST",
            "/api/work-attendance/check-in",
            Some(&token(STAFF + 1, Role::Staff)),
            Some(body.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("POST", "/api/work-attendance/check-in", Some(&token(20, Role::Student)), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send("POST", "/api/work-attendance/check-in", Some(&staff), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "late");
    assert!(json["data"]["minutes_offset"].as_i64().unwrap() >= 29);

    let (status, _) = app
        .send("POST", "/api/work-attendance/check-in", Some(&staff), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app
        .send("POST", "/api/work-attendance/check-out", Some(&staff), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "early_leave");

    let (status, _) = app
        .send("POST", "/api/work-attendance/check-out", Some(&staff), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app
        .send("GET", "/api/work-attendance/records", Some(&staff), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let uri = format!("/api/work-attendance/records?user_id={STAFF}");
    let (status, _) = app
        .send("GET", &uri, Some(&token(20, Role::Student)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn check_in_with_coordinates_needs_a_geofence() {
    let app = make_test_app().await;
    db::models::geofence::Model::create(&app.db, "Office", 0.0, 0.0, 100.0)
        .await
        .unwrap();
    let shift = running_shift(&app, STAFF).await;
    let staff = token(STAFF, Role::Staff);

    let (status, _) = app
        .send(
            "POST",
            "/api/work-attendance/check-in",
            Some(&staff),
            Some(json!({ "work_schedule_id": shift["id"], "latitude": 5.0, "longitude": 5.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(
            "POST",
            "/api/work-attendance/check-in",
            Some(&staff),
            Some(json!({ "work_schedule_id": shift["id"], "latitude": 0.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = app
        .send(
            "POST",
            "/api/work-attendance/check-in",
            Some(&staff),
            Some(json!({ "work_schedule_id": shift["id"], "latitude": 0.0, "longitude": 0.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["data"]["geofence_id"].is_i64());
}

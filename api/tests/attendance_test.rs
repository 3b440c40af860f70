mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, NaiveTime, Timelike};
use db::models::class_schedule::{self, NewClassSchedule};
use db::models::geofence;
use helpers::{TestApp, app::campus_now, app::token, make_test_app};
use serde_json::json;
use services::capability::Role;

const LECTURER: i64 = 10;
const STUDENT: i64 = 20;
const STAFF: i64 = 30;

fn minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap()
}

/// A class taught by `LECTURER` starting a few minutes from now, so a scan
/// right away lands inside the graced window and before the start.
async fn upcoming_class(app: &TestApp) -> class_schedule::Model {
    let starts = campus_now() + Duration::minutes(5);
    let ends = starts + Duration::minutes(60);
    class_schedule::Model::create(
        &app.db,
        NewClassSchedule {
            course_id: 1,
            lecturer_id: LECTURER,
            room: Some("IT 4-1".into()),
            date: Some(starts.date_naive()),
            day_of_week: None,
            start_time: minute(starts.time()),
            end_time: minute(ends.time()),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn qr_session_issue_and_scan() {
    let app = make_test_app().await;
    let class = upcoming_class(&app).await;
    let lecturer = token(LECTURER, Role::Lecturer);
    let student = token(STUDENT, Role::Student);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&student),
            Some(json!({ "schedule_id": class.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&lecturer),
            Some(json!({ "schedule_id": class.id, "ttl_seconds": 120 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let first_token = json["data"]["session_token"].as_str().unwrap().to_string();
    assert_eq!(first_token.len(), 64);

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&lecturer),
            Some(json!({ "schedule_id": class.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let second_token = json["data"]["session_token"].as_str().unwrap().to_string();

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/qr/scan",
            Some(&student),
            Some(json!({ "session_token": first_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["message"].as_str().unwrap().contains("superseded"));

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/qr/scan",
            Some(&student),
            Some(json!({ "session_token": second_token })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "present");
    assert_eq!(json["data"]["kind"], "qr");
    assert_eq!(json["data"]["schedule_id"], class.id);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/scan",
            Some(&student),
            Some(json!({ "session_token": second_token })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/scan",
            Some(&lecturer),
            Some(json!({ "session_token": second_token })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/attendance/schedules/{}/records", class.id);
    let (status, json) = app.send("GET", &uri, Some(&lecturer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn generate_rejects_unknown_schedule_and_bad_ttl() {
    let app = make_test_app().await;
    let class = upcoming_class(&app).await;
    let lecturer = token(LECTURER, Role::Lecturer);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&lecturer),
            Some(json!({ "schedule_id": 9999 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&lecturer),
            Some(json!({ "schedule_id": class.id, "ttl_seconds": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    for ttl in [i64::MAX, i64::MAX / 1000 + 1, 3601] {
        let (status, json) = app
            .send(
                "POST",
                "/api/attendance/qr/generate",
                Some(&lecturer),
                Some(json!({ "schedule_id": class.id, "ttl_seconds": ttl })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "ttl {ttl}");
        assert_eq!(json["success"], false);
    }

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&token(LECTURER + 1, Role::Lecturer)),
            Some(json!({ "schedule_id": class.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn campus_tap_cycle() {
    let app = make_test_app().await;
    geofence::Model::create(&app.db, "Main campus", 0.0, 0.0, 100.0)
        .await
        .unwrap();
    let student = token(STUDENT, Role::Student);
    let inside = json!({ "latitude": 0.0, "longitude": 0.0 });

    let (status, json) = app
        .send("POST", "/api/attendance/tap-out", Some(&student), Some(inside.clone()))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/tap-in",
            Some(&student),
            Some(json!({ "latitude": 1.0, "longitude": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["message"].as_str().unwrap().contains("Main campus"));

    let (status, json) = app
        .send("POST", "/api/attendance/tap-in", Some(&student), Some(inside.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["kind"], "geofence_tap_in");

    let (status, _) = app
        .send("POST", "/api/attendance/tap-in", Some(&student), Some(inside.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app
        .send("GET", "/api/attendance/tap-status", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["tapped_in"], true);

    let (status, json) = app
        .send("POST", "/api/attendance/tap-out", Some(&student), Some(inside))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["kind"], "geofence_tap_out");
    assert!(json["data"]["check_out_at"].is_string());

    let (_, json) = app
        .send("GET", "/api/attendance/tap-status", Some(&student), None)
        .await;
    assert_eq!(json["data"]["tapped_in"], false);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/tap-in",
            Some(&student),
            Some(json!({ "latitude": 120.0, "longitude": 0.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn manual_override_update_and_delete() {
    let app = make_test_app().await;
    let lecturer = token(LECTURER, Role::Lecturer);
    let student = token(STUDENT, Role::Student);
    let today = campus_now().date_naive().to_string();
    let entry = json!({
        "user_id": STUDENT,
        "date": today,
        "label": "Career fair",
        "status": "excused",
    });

    let (status, _) = app
        .send("POST", "/api/attendance/manual", Some(&student), Some(entry.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send("POST", "/api/attendance/manual", Some(&lecturer), Some(entry.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["context"], "manual:career fair");
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send("POST", "/api/attendance/manual", Some(&lecturer), Some(entry.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/attendance/records/{id}");
    let (status, json) = app
        .send(
            "PUT",
            &uri,
            Some(&lecturer),
            Some(json!({ "status": "present", "notes": "arrived after all" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "present");

    let (status, _) = app.send("DELETE", &uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", &uri, Some(&lecturer), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("DELETE", &uri, Some(&lecturer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("POST", "/api/attendance/manual", Some(&lecturer), Some(entry))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn records_and_statistics() {
    let app = make_test_app().await;
    let staff = token(STAFF, Role::Staff);
    let student = token(STUDENT, Role::Student);
    let today = campus_now().date_naive();

    let (status, json) = app
        .send("GET", "/api/attendance/statistics", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["attendance_rate"], 0.0);

    for (label, status) in [("Open day", "present"), ("Sports day", "absent")] {
        let (code, _) = app
            .send(
                "POST",
                "/api/attendance/manual",
                Some(&staff),
                Some(json!({
                    "user_id": STUDENT,
                    "date": today.to_string(),
                    "label": label,
                    "status": status,
                })),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (_, json) = app
        .send("GET", "/api/attendance/statistics", Some(&student), None)
        .await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["by_status"]["present"], 1);
    assert_eq!(json["data"]["by_type"]["manual"], 2);
    assert_eq!(json["data"]["attendance_rate"], 0.5);

    let uri = format!("/api/attendance/statistics?user_id={STUDENT}");
    let (status, _) = app
        .send("GET", &uri, Some(&token(21, Role::Student)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("GET", &uri, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = app
        .send("GET", "/api/attendance/records?per_page=1", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["records"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send("GET", "/api/attendance/records?per_page=500", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let uri = format!(
        "/api/attendance/records?start_date={}&end_date={}",
        today,
        today - Duration::days(1)
    );
    let (status, _) = app.send("GET", &uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn course_attendance_and_overview() {
    let app = make_test_app().await;
    let class = upcoming_class(&app).await;
    let lecturer = token(LECTURER, Role::Lecturer);
    let student = token(STUDENT, Role::Student);
    let staff = token(STAFF, Role::Staff);

    let (_, json) = app
        .send(
            "POST",
            "/api/attendance/qr/generate",
            Some(&lecturer),
            Some(json!({ "schedule_id": class.id })),
        )
        .await;
    let session_token = json["data"]["session_token"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/qr/scan",
            Some(&student),
            Some(json!({ "session_token": session_token })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send("GET", "/api/attendance/by-course/1", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send("GET", "/api/attendance/by-course/1", Some(&token(11, Role::Lecturer)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send("GET", "/api/attendance/by-course/1", Some(&lecturer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["schedule_id"], class.id);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (status, json) = app
        .send("GET", "/api/attendance/by-course/2", Some(&staff), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].as_array().unwrap().is_empty());

    let (status, _) = app
        .send(
            "GET",
            "/api/attendance/by-course/1?start_date=2025-10-07&end_date=2025-10-06",
            Some(&staff),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = app
        .send("GET", "/api/attendance/overview", Some(&lecturer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["upcoming"][0]["schedule_id"], class.id);
    assert!(json["data"]["open_tap"].is_null());
    assert_eq!(json["data"]["statistics"]["total"], 0);

    let (status, json) = app
        .send("GET", "/api/attendance/overview", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["statistics"]["total"], 1);
}

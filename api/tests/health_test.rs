mod helpers;

use axum::http::StatusCode;
use helpers::make_test_app;

#[tokio::test]
async fn health_check_is_public() {
    let app = make_test_app().await;

    let (status, json) = app.send("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["database"], true);
    assert_eq!(json["message"], "Health check passed");
}

#[tokio::test]
async fn protected_groups_require_a_token() {
    let app = make_test_app().await;

    for uri in [
        "/api/attendance/tap-status",
        "/api/schedules/today",
        "/api/geofences",
        "/api/work-attendance/records",
    ] {
        let (status, json) = app.send("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json["success"], false);
    }

    let (status, _) = app
        .send("GET", "/api/geofences", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

//! HTTP integration tests against the demo fleet.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use serde_json::{Value, json};

use common::{admin_token, send, spawn, str_field};

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|b| str_field(b, "id").map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn health_reports_demo_source() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let Ok(response) = client.get(server.url("/health")).send().await else {
        panic!("health request");
    };
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(
        response
            .headers()
            .get("x-frame-options")
            .and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
    let body: Value = tokio_test::assert_ok!(response.json().await);
    assert_eq!(str_field(&body, "status"), Some("healthy"));
    assert_eq!(str_field(&body, "database"), Some("connected"));
    assert_eq!(str_field(&body, "dataSource"), Some("demo"));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let server = spawn().await;
    let client = reqwest::Client::new();
    let (status, body) = send(client.get(server.url("/api/v1/nope"))).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], json!(false));
    assert_eq!(str_field(&body, "path"), Some("/api/v1/nope"));
}

#[tokio::test]
async fn lists_seeded_fleet_in_order() {
    let server = spawn().await;
    let client = reqwest::Client::new();
    let (status, body) = send(client.get(server.url("/api/v1/dustbins"))).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        ids(&body["dustbins"]),
        vec!["001", "002", "003", "004", "005", "006", "007", "008"]
    );
    let first = &body["dustbins"][0];
    assert_eq!(str_field(first, "name"), Some("Dustbin #001"));
    assert!(first["criticalTimestamp"].is_i64());
    assert!(body["dustbins"][1]["criticalTimestamp"].is_null());
}

#[tokio::test]
async fn create_edit_and_validate() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = send(
        client
            .post(server.url("/api/v1/dustbins"))
            .json(&json!({"location": "  North Gate  "})),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(str_field(&body["dustbin"], "id"), Some("009"));
    assert_eq!(str_field(&body["dustbin"], "location"), Some("North Gate"));
    assert_eq!(body["dustbin"]["overallFillLevel"], json!(0));
    assert_eq!(body["dustbin"]["batteryLevel"], json!(100));

    let (status, body) = send(
        client
            .put(server.url("/api/v1/dustbins/009"))
            .json(&json!({"location": "South Gate"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(str_field(&body["dustbin"], "location"), Some("South Gate"));

    let (status, body) = send(
        client
            .post(server.url("/api/v1/dustbins"))
            .json(&json!({"location": "   "})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], json!(false));
    assert_eq!(str_field(&body, "error"), Some("Location is required"));

    let (status, _) = send(client.get(server.url("/api/v1/dustbins/999"))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn removal_renumbers_survivors() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = send(
        client
            .delete(server.url("/api/v1/dustbins"))
            .json(&json!({"dustbinIds": ["002", "005", "042"]})),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["removed"], json!(["002", "005"]));
    assert_eq!(
        ids(&body["renumberedDustbins"]),
        vec!["001", "002", "003", "004", "005", "006"]
    );
    assert_eq!(body["reassigned"][0], json!({"from": "003", "to": "002"}));
    // Old 003 keeps its location under the new id.
    assert_eq!(
        str_field(&body["renumberedDustbins"][1], "location"),
        Some("Residential Zone A")
    );
    assert_eq!(
        str_field(&body["renumberedDustbins"][1], "name"),
        Some("Dustbin #002")
    );

    // Notifications follow their bin: old 008 is now 006.
    let (_, notes) = send(client.get(server.url("/api/v1/notifications"))).await;
    let bins: Vec<&str> = notes["notifications"]
        .as_array()
        .map(|n| n.iter().filter_map(|x| str_field(x, "dustbinId")).collect())
        .unwrap_or_default();
    assert!(bins.contains(&"006"));
    assert!(!bins.contains(&"008"));

    let (status, body) = send(
        client
            .delete(server.url("/api/v1/dustbins"))
            .json(&json!({"dustbinIds": []})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        str_field(&body, "error"),
        Some("dustbinIds array is required")
    );
}

#[tokio::test]
async fn crossing_threshold_raises_one_notification() {
    let server = spawn().await;
    let client = reqwest::Client::new();
    let count = |client: reqwest::Client, url: String| async move {
        let (_, body) = send(client.get(url)).await;
        body["count"].as_i64().unwrap_or(-1)
    };
    let count_url = server.url("/api/v1/notifications/count");
    assert_eq!(count(client.clone(), count_url.clone()).await, 3);

    let reading = |overall: i32| {
        json!({
            "overallFillLevel": overall,
            "wetWasteFillLevel": overall,
            "dryWasteFillLevel": overall,
        })
    };
    let fill_url = server.url("/api/v1/dustbins/003/fill-level");

    let (status, body) = send(client.put(&fill_url).json(&reading(85))).await;
    assert_eq!(status, 200, "{body}");
    assert!(body["dustbin"]["criticalTimestamp"].is_i64());
    assert_eq!(body["dustbin"]["batteryLevel"], json!(78));
    assert_eq!(count(client.clone(), count_url.clone()).await, 4);

    // Staying critical does not raise another alert.
    send(client.put(&fill_url).json(&reading(90))).await;
    assert_eq!(count(client.clone(), count_url.clone()).await, 4);

    // Leaving and re-entering does.
    let (_, body) = send(client.put(&fill_url).json(&reading(40))).await;
    assert!(body["dustbin"]["criticalTimestamp"].is_null());
    send(client.put(&fill_url).json(&reading(80))).await;
    assert_eq!(count(client.clone(), count_url.clone()).await, 5);

    let (status, body) = send(
        client
            .put(&fill_url)
            .json(&json!({"overallFillLevel": 50, "wetWasteFillLevel": 50})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(str_field(&body, "error"), Some("Fill levels are required"));

    let (status, _) = send(client.put(&fill_url).json(&reading(101))).await;
    assert_eq!(status, 400);

    let (status, _) = send(
        client
            .put(server.url("/api/v1/dustbins/404/fill-level"))
            .json(&reading(10)),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn notification_lifecycle() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = send(client.get(server.url("/api/v1/notifications"))).await;
    assert_eq!(status, 200);
    let Some(first) = body["notifications"].as_array().and_then(|n| n.first()) else {
        panic!("seeded notifications missing: {body}");
    };
    // Most recent crossing first.
    assert_eq!(str_field(first, "dustbinId"), Some("004"));
    let id = first["id"].as_i64().unwrap_or_default();

    let (status, body) = send(client.put(server.url(&format!("/api/v1/notifications/{id}/read")))).await;
    assert_eq!(status, 200);
    assert_eq!(body["notification"]["isRead"], json!(true));

    let (_, body) = send(client.get(server.url("/api/v1/notifications/count"))).await;
    assert_eq!(body["count"], json!(2));

    let token = admin_token(&client, &server).await;
    let (status, body) = send(
        client
            .put(server.url(&format!("/api/v1/notifications/{id}/resolve")))
            .bearer_auth(&token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["notification"]["isResolved"], json!(true));
    let resolver = body["notification"]["resolvedBy"].clone();
    assert!(resolver.is_i64());

    // Resolving again keeps the first resolver.
    let (status, body) = send(client.put(server.url(&format!("/api/v1/notifications/{id}/resolve")))).await;
    assert_eq!(status, 200);
    assert_eq!(body["notification"]["resolvedBy"], resolver);

    let (_, body) = send(client.get(server.url("/api/v1/notifications"))).await;
    assert_eq!(body["notifications"].as_array().map(Vec::len), Some(2));

    let (status, _) = send(client.delete(server.url(&format!("/api/v1/notifications/{id}")))).await;
    assert_eq!(status, 200);
    let (status, _) = send(client.delete(server.url(&format!("/api/v1/notifications/{id}")))).await;
    assert_eq!(status, 404);
    let (status, _) = send(client.put(server.url("/api/v1/notifications/abc/read"))).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn analytics_endpoints() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = send(client.get(server.url("/api/v1/analytics?period=last-week"))).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(str_field(&body, "period"), Some("last-week"));
    let points = body["data"].as_array().cloned().unwrap_or_default();
    assert!(!points.is_empty() && points.len() <= 8);
    assert!(points[0]["wetWaste"].is_i64());

    let (status, body) = send(client.get(server.url(
        "/api/v1/analytics?period=last-month&dustbinId=001",
    )))
    .await;
    assert_eq!(status, 200);
    assert_eq!(str_field(&body, "dustbinId"), Some("001"));

    let (status, _) = send(client.get(server.url("/api/v1/analytics?period=month-2"))).await;
    assert_eq!(status, 200);

    let (status, _) = send(client.get(server.url("/api/v1/analytics"))).await;
    assert_eq!(status, 400);
    let (status, _) = send(client.get(server.url("/api/v1/analytics?period=yesterday"))).await;
    assert_eq!(status, 400);

    let (status, body) = send(client.get(server.url("/api/v1/analytics/summary"))).await;
    assert_eq!(status, 200);
    assert_eq!(body["summary"]["totalDustbins"], json!(8));
    assert_eq!(body["summary"]["criticalDustbins"], json!(3));

    let (status, body) = send(client.get(server.url("/api/v1/analytics/trends?days=3"))).await;
    assert_eq!(status, 200);
    assert_eq!(body["days"], json!(3));
    assert!(body["trends"].as_array().is_some_and(|t| !t.is_empty() && t.len() <= 3));
}

#[tokio::test]
async fn login_me_logout() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = send(
        client
            .post(server.url("/api/v1/auth/login"))
            .json(&json!({"email": "admin@binthere.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(str_field(&body, "error"), Some("Invalid email or password"));

    let (status, _) = send(
        client
            .post(server.url("/api/v1/auth/login"))
            .json(&json!({"email": ""})),
    )
    .await;
    assert_eq!(status, 400);

    let token = admin_token(&client, &server).await;
    let (status, body) = send(client.get(server.url("/api/v1/auth/me")).bearer_auth(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(str_field(&body["user"], "email"), Some("admin@binthere.com"));
    assert_eq!(str_field(&body["user"], "role"), Some("admin"));

    let (status, _) = send(client.post(server.url("/api/v1/auth/logout")).bearer_auth(&token)).await;
    assert_eq!(status, 200);
    let (status, _) = send(client.get(server.url("/api/v1/auth/me")).bearer_auth(&token)).await;
    assert_eq!(status, 401);
    let (status, _) = send(client.get(server.url("/api/v1/auth/me"))).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let mut config = binthere_gateway::config::GatewayConfig::demo();
    config.rate_limit_max_requests = 2;
    let server = common::spawn_with(config).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let (status, _) = send(client.get(server.url("/api/v1/dustbins"))).await;
        assert_eq!(status, 200);
    }
    let (status, body) = send(client.get(server.url("/api/v1/dustbins"))).await;
    assert_eq!(status, 429);
    assert_eq!(body["success"], json!(false));

    // Root endpoints are outside the limiter.
    let (status, _) = send(client.get(server.url("/health"))).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_budget() {
    let mut config = binthere_gateway::config::GatewayConfig::demo();
    config.rate_limit_max_requests = 2;
    let server = common::spawn_with(config).await;
    let client = reqwest::Client::new();

    for last in 1..=2 {
        let (status, _) = send(
            client
                .get(server.url("/api/v1/dustbins"))
                .header("x-forwarded-for", format!("198.51.100.{last}")),
        )
        .await;
        assert_eq!(status, 200);
    }
    let (status, _) = send(
        client
            .get(server.url("/api/v1/dustbins"))
            .header("x-forwarded-for", "198.51.100.3"),
    )
    .await;
    assert_eq!(status, 429);
}

#[tokio::test]
async fn summary_ignores_retired_bins() {
    let server = spawn().await;
    let client = reqwest::Client::new();

    let (status, _) = send(
        client
            .delete(server.url("/api/v1/dustbins"))
            .json(&json!({"dustbinIds": ["001", "002", "003", "004", "005", "006", "007"]})),
    )
    .await;
    assert_eq!(status, 200);
    let (status, _) = send(
        client
            .put(server.url("/api/v1/dustbins/001/fill-level"))
            .json(&json!({
                "overallFillLevel": 30,
                "wetWasteFillLevel": 30,
                "dryWasteFillLevel": 30,
            })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = send(client.get(server.url("/api/v1/analytics/summary"))).await;
    assert_eq!(status, 200);
    assert_eq!(body["summary"]["totalDustbins"], json!(1));
    assert_eq!(body["summary"]["reportingLast24h"], json!(1));
}

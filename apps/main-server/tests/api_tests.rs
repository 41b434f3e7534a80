use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use repairdesk_server::{config::Config, create_app, create_state};
use ticket_store::MemoryTicketStore;

fn app() -> Router {
    let store = MemoryTicketStore::new();
    create_app(create_state(Config::with_secret("test-secret"), store))
}

/// Send a request and return (status, JSON body).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

/// Register an account and return (id, token).
async fn register(app: &Router, username: &str, role: Option<&str>) -> (String, String) {
    let mut body = json!({
        "name": format!("{username} name"),
        "username": username,
        "email": format!("{username}@example.com"),
        "password": format!("{username}-pw"),
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, value) = send(app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {value}");
    (
        value["id"].as_str().unwrap().to_string(),
        value["token"].as_str().unwrap().to_string(),
    )
}

async fn create_ticket(app: &Router, token: &str, body: Value) -> Value {
    let (status, value) = send(app, "POST", "/tickets", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create ticket: {value}");
    value
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_duplicate() {
    let app = app();
    let (id, _) = register(&app, "alice", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "alice-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["role"], "user");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body.get("passwordHash").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Other Alice",
            "username": "alice",
            "email": "other@example.com",
            "password": "pw"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = app();
    register(&app, "alice", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Alice Two",
            "username": "alice2",
            "email": "alice@example.com",
            "password": "pw"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn login_failures_are_generic() {
    let app = app();
    register(&app, "alice", None).await;

    let (status, wrong_pw) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unknown) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "mallory", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_pw, unknown);
    assert_eq!(unknown["message"], "Invalid credentials");
}

#[tokio::test]
async fn registration_validation() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "No Password", "username": "np", "email": "np@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "password is required");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();

    let (status, body) = send(&app, "GET", "/tickets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, "GET", "/auth/me", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A token signed with another secret is rejected.
    let other = create_app(create_state(
        Config::with_secret("other-secret"),
        MemoryTicketStore::new(),
    ));
    let (_, foreign_token) = register(&other, "eve", None).await;
    let (status, _) = send(&app, "GET", "/tickets", Some(&foreign_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_profile() {
    let app = app();
    let (id, token) = register(&app, "alice", None).await;

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn ticket_lifecycle_and_access() {
    let app = app();
    let (alice_id, alice) = register(&app, "alice", None).await;
    let (_, bob) = register(&app, "bob", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;

    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Laptop", "description": "won't boot" }),
    )
    .await;
    assert_eq!(ticket["status"], "Submitted");
    assert_eq!(ticket["priority"], "Low");
    assert_eq!(ticket["user"], json!(alice_id));
    assert_eq!(ticket["stageIndex"], 0);
    let id = ticket["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/tickets/{id}"),
        Some(&admin),
        Some(json!({ "status": "Completed", "technician": "Sam", "estimatedCost": 120.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Completed");
    assert_eq!(updated["technician"], "Sam");
    assert_eq!(updated["estimatedCost"], 120.5);
    assert_eq!(updated["description"], "won't boot");

    let (status, seen) = send(&app, "GET", &format!("/tickets/{id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["status"], "Completed");
    assert_eq!(seen["stageIndex"], 3);

    let (status, body) = send(&app, "GET", &format!("/tickets/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Not authorized" }));

    let (status, _) = send(&app, "GET", &format!("/tickets/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;
    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Phone", "description": "cracked", "priority": "High" }),
    )
    .await;
    let uri = format!("/tickets/{}", ticket["id"].as_str().unwrap());

    send(&app, "PUT", &uri, Some(&admin), Some(json!({ "notes": "order glass" }))).await;
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({ "status": "Awaiting Parts" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Awaiting Parts");
    assert_eq!(body["notes"], "order glass");
    assert_eq!(body["priority"], "High");

    // Staff notes are not shown to the customer.
    let (_, own) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert!(own.get("notes").is_none());
}

#[tokio::test]
async fn update_requires_admin_and_existing_ticket() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;
    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Tablet", "description": "no sound" }),
    )
    .await;
    let id = ticket["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/tickets/{id}"),
        Some(&alice),
        Some(json!({ "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/tickets/{missing}"),
        Some(&admin),
        Some(json!({ "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Ticket not found");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/tickets/{id}"),
        Some(&admin),
        Some(json!({ "estimatedCost": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/tickets/{id}"),
        Some(&admin),
        Some(json!({ "status": "Lost" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn admin_check_runs_before_request_parsing() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Laptop", "description": "fan noise" }),
    )
    .await;
    let id = ticket["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/tickets/{id}"),
        Some(&alice),
        Some(json!({ "estimatedCost": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Not authorized" }));

    let (status, body) = send(
        &app,
        "PUT",
        "/tickets/not-a-uuid",
        Some(&alice),
        Some(json!({ "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (status, body) = send(
        &app,
        "GET",
        "/tickets/all/list?sort=size",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn unknown_routes_get_message_bodies() {
    let app = app();

    let (status, body) = send(&app, "GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not Found" }));

    let (status, body) = send(&app, "DELETE", "/auth/register", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "message": "Method not allowed" }));
}

#[tokio::test]
async fn legacy_status_values_are_accepted() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;
    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Other", "description": "smells burnt" }),
    )
    .await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/tickets/{}", ticket["id"].as_str().unwrap()),
        Some(&admin),
        Some(json!({ "status": "Closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Completed");
}

#[tokio::test]
async fn create_ticket_validation() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/tickets",
        Some(&alice),
        Some(json!({ "deviceType": "Toaster", "description": "burns bread" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("deviceType"));

    let (status, body) = send(
        &app,
        "POST",
        "/tickets",
        Some(&alice),
        Some(json!({ "deviceType": "Laptop" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "description is required");
}

#[tokio::test]
async fn malformed_json_gets_message_body() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;

    let request = Request::builder()
        .method("POST")
        .uri("/tickets")
        .header(header::AUTHORIZATION, format!("Bearer {alice}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn messages_keep_order_and_sender() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, bob) = register(&app, "bob", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;
    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Desktop", "description": "fan noise" }),
    )
    .await;
    let id = ticket["id"].as_str().unwrap();
    let uri = format!("/tickets/{id}/messages");

    let (status, _) = send(&app, "POST", &uri, Some(&alice), Some(json!({ "text": "hello" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        send(&app, "POST", &uri, Some(&admin), Some(json!({ "text": "reply" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);

    let (_, fetched) = send(&app, "GET", &format!("/tickets/{id}"), Some(&alice), None).await;
    let messages = fetched["messages"].as_array().unwrap();
    assert_eq!(messages[0]["text"], "hello");
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[1]["text"], "reply");
    assert_eq!(messages[1]["sender"], "admin");

    let (status, _) = send(&app, "POST", &uri, Some(&bob), Some(json!({ "text": "hi" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &uri, Some(&alice), Some(json!({ "text": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "text is required");

    let missing = format!("/tickets/{}/messages", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "POST", &missing, Some(&alice), Some(json!({ "text": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_messages_are_all_kept() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;
    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Laptop", "description": "hinge" }),
    )
    .await;
    let id = ticket["id"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for i in 0..10 {
        let app = app.clone();
        let token = if i % 2 == 0 { alice.clone() } else { admin.clone() };
        let uri = format!("/tickets/{id}/messages");
        handles.push(tokio::spawn(async move {
            send(&app, "POST", &uri, Some(&token), Some(json!({ "text": format!("m{i}") }))).await
        }));
    }
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, fetched) = send(&app, "GET", &format!("/tickets/{id}"), Some(&alice), None).await;
    let messages = fetched["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 10);
    for i in 0..10 {
        let text = format!("m{i}");
        let expected = if i % 2 == 0 { "user" } else { "admin" };
        let found: Vec<_> = messages.iter().filter(|m| m["text"] == json!(text)).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["sender"], expected);
    }
}

#[tokio::test]
async fn listings_and_admin_views() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, bob) = register(&app, "bob", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;

    create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Laptop", "description": "screen flicker", "priority": "Low" }),
    )
    .await;
    create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Phone", "description": "battery", "priority": "High" }),
    )
    .await;
    create_ticket(
        &app,
        &bob,
        json!({ "deviceType": "Tablet", "description": "screen cracked", "priority": "Medium" }),
    )
    .await;

    let (status, mine) = send(&app, "GET", "/tickets", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "GET", "/tickets/all/list", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "GET", "/users", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, all) = send(&app, "GET", "/tickets/all/list", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|t| t["user"]["name"].is_string()));
    assert!(all.iter().all(|t| t["user"]["email"].is_string()));
    assert!(all.iter().all(|t| t["user"].get("passwordHash").is_none()));

    let (_, sorted) = send(
        &app,
        "GET",
        "/tickets/all/list?search=screen&sort=priority",
        Some(&admin),
        None,
    )
    .await;
    let descriptions: Vec<_> = sorted
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(descriptions, vec!["screen cracked", "screen flicker"]);

    let (_, by_owner) = send(&app, "GET", "/tickets/all/list?search=bob", Some(&admin), None).await;
    assert_eq!(by_owner.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/tickets?sort=size", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, users) = send(&app, "GET", "/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn stats_endpoints() {
    let app = app();
    let (_, alice) = register(&app, "alice", None).await;
    let (_, bob) = register(&app, "bob", None).await;
    let (_, admin) = register(&app, "root", Some("admin")).await;

    let ticket = create_ticket(
        &app,
        &alice,
        json!({ "deviceType": "Laptop", "description": "keyboard" }),
    )
    .await;
    create_ticket(&app, &bob, json!({ "deviceType": "Phone", "description": "speaker" })).await;
    send(
        &app,
        "PUT",
        &format!("/tickets/{}", ticket["id"].as_str().unwrap()),
        Some(&admin),
        Some(json!({ "status": "In Progress" })),
    )
    .await;

    let (status, stats) = send(&app, "GET", "/tickets/all/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({ "total": 2, "active": 2, "inProgress": 1, "resolved": 0 })
    );

    let (status, mine) = send(&app, "GET", "/tickets/stats", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["inProgress"], 0);

    let (status, _) = send(&app, "GET", "/tickets/all/stats", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

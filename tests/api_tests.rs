use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use docuvault::config::Config;
use docuvault::entities::{confirmation_tokens, password_reset_tokens};
use docuvault::events::DomainEvent;
use docuvault::state::SharedState;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<SharedState>) {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    // A shared in-memory database needs a single connection.
    config.database.max_connections = 1;
    config.database.min_connections = 1;

    let shared = Arc::new(
        SharedState::new(config)
            .await
            .expect("Failed to create shared state"),
    );
    let state = docuvault::api::create_app_state(shared.clone(), None);
    (docuvault::api::router(state).await, shared)
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn registration_payload(email: &str, account: &str) -> serde_json::Value {
    serde_json::json!({
        "user": {
            "email": email,
            "password": "correct horse battery",
            "firstName": "Ada",
            "lastName": "Lovelace",
        },
        "account": {
            "name": account,
            "serviceLevel": "GOLD",
        },
    })
}

/// Registers a user and returns the confirmation token captured from the
/// event bus.
async fn register(
    app: &Router,
    rx: &mut broadcast::Receiver<DomainEvent>,
    email: &str,
    account: &str,
) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/register", &registration_payload(email, account)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    loop {
        match rx.recv().await.unwrap() {
            DomainEvent::RegistrationCompleted { token, .. } => return token,
            _ => {}
        }
    }
}

#[tokio::test]
async fn register_creates_disabled_user_and_confirm_activates() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/register",
            &registration_payload("ada@example.com", "analytical-engines"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["enabled"], false);

    let token = match rx.recv().await.unwrap() {
        DomainEvent::RegistrationCompleted { token, email, .. } => {
            assert_eq!(email, "ada@example.com");
            token
        }
        other => panic!("Unexpected event: {other:?}"),
    };

    let response = app
        .clone()
        .oneshot(get("/api/users/ada@example.com/enabled"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["enabled"], false);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/register/confirm?token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["activated"], true);

    let response = app
        .clone()
        .oneshot(get("/api/users/ada@example.com/enabled"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["enabled"], true);

    // The token is burned on activation; a replay does nothing.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/register/confirm?token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["activated"], false);
}

#[tokio::test]
async fn duplicate_registration_is_rejected_without_partial_rows() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    register(&app, &mut rx, "ada@example.com", "analytical-engines").await;

    // Same email, different account name.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/register",
            &registration_payload("ada@example.com", "other-account"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The rejected registration must not have created its account.
    let response = app
        .clone()
        .oneshot(get("/api/accounts?name=other-account"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Different email, clashing account name.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/register",
            &registration_payload("grace@example.com", "analytical-engines"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/users/grace@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_validation_failures_are_bad_requests() {
    let (app, _shared) = spawn_app().await;

    let mut payload = registration_payload("not-an-email", "acme");
    let response = app
        .clone()
        .oneshot(post_json("/api/register", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    payload = registration_payload("ada@example.com", "acme");
    payload["user"]["password"] = serde_json::json!("short");
    let response = app
        .clone()
        .oneshot(post_json("/api/register", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_flow_burns_the_token() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    register(&app, &mut rx, "ada@example.com", "analytical-engines").await;

    // Unknown email is a 404, not a silent success.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/resetPassword",
            &serde_json::json!({"email": "nobody@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A token nobody ever issued is a 404 too.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/changePassword",
            &serde_json::json!({
                "token": "00000000-0000-0000-0000-000000000000",
                "email": "ada@example.com",
                "newPassword": "a brand new password",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/resetPassword",
            &serde_json::json!({"email": "ada@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = loop {
        match rx.recv().await.unwrap() {
            DomainEvent::PasswordResetRequested { token, email } => {
                assert_eq!(email, "ada@example.com");
                break token;
            }
            _ => {}
        }
    };

    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/changePassword?token={token}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["valid"], true);

    // The token belongs to ada; using it for another email is rejected.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/changePassword",
            &serde_json::json!({
                "token": token,
                "email": "mallory@example.com",
                "newPassword": "a brand new password",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/changePassword",
            &serde_json::json!({
                "token": token,
                "email": "ada@example.com",
                "newPassword": "a brand new password",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The token row is flagged, not deleted.
    let row = password_reset_tokens::Entity::find()
        .filter(password_reset_tokens::Column::Token.eq(token.as_str()))
        .one(&shared.store.conn)
        .await
        .unwrap()
        .unwrap();
    assert!(row.used);

    // Single use: the same token cannot change the password twice.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/changePassword",
            &serde_json::json!({
                "token": token,
                "email": "ada@example.com",
                "newPassword": "yet another password",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The validity check only looks at presence and age, so the spent but
    // unexpired token still reports valid.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/changePassword?token={token}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["valid"], true);
}

#[tokio::test]
async fn expired_confirmation_token_does_not_activate() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    let token = register(&app, &mut rx, "ada@example.com", "analytical-engines").await;

    // Age the token past its expiry.
    let row = confirmation_tokens::Entity::find()
        .filter(confirmation_tokens::Column::Token.eq(token.as_str()))
        .one(&shared.store.conn)
        .await
        .unwrap()
        .unwrap();
    let mut active: confirmation_tokens::ActiveModel = row.into();
    active.expiry_date = Set(Utc::now() - Duration::hours(1));
    active.update(&shared.store.conn).await.unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/register/confirm?token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["activated"], false);

    // The user stays disabled.
    let response = app
        .clone()
        .oneshot(get("/api/users/ada@example.com/enabled"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["enabled"], false);
}

#[tokio::test]
async fn registration_succeeds_without_event_listeners() {
    let (app, _shared) = spawn_app().await;

    // Nobody subscribed to the bus; the registration itself must still
    // go through.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/register",
            &registration_payload("ada@example.com", "analytical-engines"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn account_documents_reject_duplicates_and_notify_members() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    register(&app, &mut rx, "ada@example.com", "analytical-engines").await;

    let response = app
        .clone()
        .oneshot(get("/api/accounts?name=analytical-engines"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let account_id = body["data"][0]["id"].as_i64().unwrap();
    assert_eq!(body["data"][0]["users"].as_array().unwrap().len(), 1);

    let doc = serde_json::json!({
        "name": "report.pdf",
        "extension": "pdf",
        "content": [1, 2, 3],
    });

    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/accounts/{account_id}/documents"), &doc))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["documents"].as_array().unwrap().len(), 1);

    let event = loop {
        match rx.recv().await.unwrap() {
            event @ DomainEvent::DocumentAdded { .. } => break event,
            _ => {}
        }
    };
    match event {
        DomainEvent::DocumentAdded {
            account_name,
            document_name,
            recipients,
        } => {
            assert_eq!(account_name, "analytical-engines");
            assert_eq!(document_name, "report.pdf");
            assert_eq!(recipients, vec!["ada@example.com".to_string()]);
        }
        other => panic!("Unexpected event: {other:?}"),
    }

    // Same name again on the same account.
    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/accounts/{account_id}/documents"), &doc))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/accounts/{account_id}/documents/report.pdf"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["documents"].as_array().unwrap().is_empty());

    // Removing a document that is not there is a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/accounts/{account_id}/documents/report.pdf"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accounts_support_crud_and_membership() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    register(&app, &mut rx, "ada@example.com", "analytical-engines").await;
    register(&app, &mut rx, "grace@example.com", "compilers").await;

    let response = app
        .clone()
        .oneshot(get("/api/users/ada@example.com"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let ada_id = body["data"]["id"].as_i64().unwrap();

    // A second account owned by ada.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/accounts",
            &serde_json::json!({
                "name": "difference-engines",
                "ownerId": ada_id,
                "serviceLevel": "BRONZE",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let account_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["serviceLevel"], "BRONZE");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/accounts?ownerId={ada_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Upgrade the tier and rename.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/accounts/{account_id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({"name": "engines", "serviceLevel": "ENTERPRISE"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "engines");
    assert_eq!(body["data"]["serviceLevel"], "ENTERPRISE");

    // Grace joins ada's account.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/accounts/{account_id}/members"),
            &serde_json::json!({"email": "grace@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);

    // Joining twice is rejected.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/accounts/{account_id}/members"),
            &serde_json::json!({"email": "grace@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/users/grace@example.com"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let grace_id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/accounts?memberId={grace_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    // Her own account plus ada's.
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn standalone_documents_roundtrip() {
    let (app, _shared) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/documents",
            &serde_json::json!({"name": "notes.txt", "extension": "txt", "content": [104, 105]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/documents/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "notes.txt");
    assert_eq!(body["data"]["content"], serde_json::json!([104, 105]));

    let response = app
        .clone()
        .oneshot(get("/api/documents?name=notes.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Names are globally unique for standalone uploads.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/documents",
            &serde_json::json!({"name": "notes.txt", "extension": "txt", "content": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/documents/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/documents/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_creates_role_binding() {
    let (app, shared) = spawn_app().await;
    let mut rx = shared.event_bus.subscribe();

    register(&app, &mut rx, "ada@example.com", "analytical-engines").await;

    let response = app
        .clone()
        .oneshot(get("/api/authGroups?username=ada@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["role"], "ROLE_USER");
    assert_eq!(groups[0]["username"], "ada@example.com");
}

#[tokio::test]
async fn system_endpoints_respond() {
    let (app, _shared) = spawn_app().await;

    let response = app.clone().oneshot(get("/api/system/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["databaseOk"], true);

    let response = app.clone().oneshot(get("/api/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/api/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

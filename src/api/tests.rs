use super::*;
use crate::engine::Dialect;
use axum::http::{HeaderMap, StatusCode as HttpStatus};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Starts `router` on a random local port and returns a config pointing at it.
async fn serve(router: Router) -> Config {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Config {
        api_base_url: format!("http://{address}/api/"),
        ..Config::default()
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

struct SharedStore(Arc<MemoryTokenStore>);

impl TokenStore for SharedStore {
    fn load(&self) -> Option<String> {
        self.0.load()
    }

    fn save(&self, token: &str) -> Result<(), Error> {
        self.0.save(token)
    }

    fn clear(&self) -> Result<(), Error> {
        self.0.clear()
    }
}

#[tokio::test]
async fn login_stores_the_token_and_sends_it_afterwards() {
    let router = Router::new()
        .route(
            "/api/auth/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], json!("ana@example.com"));
                Json(json!({"token": "t0k3n", "user": {"id": 1, "email": "ana@example.com"}}))
            }),
        )
        .route(
            "/api/connections",
            get(|headers: HeaderMap| async move {
                assert_eq!(bearer(&headers).as_deref(), Some("Bearer t0k3n"));
                Json(json!({"data": [{"id": 9, "name": "warehouse", "dbType": "postgres"}]}))
            }),
        );
    let config = serve(router).await;
    let store = Arc::new(MemoryTokenStore::default());
    let client = ApiClient::new(config, SharedStore(store.clone())).unwrap();

    assert!(!client.is_logged_in());

    let login = client.login("ana@example.com", "hunter2").await.unwrap();
    assert_eq!(login.user.unwrap().id, "1");
    assert_eq!(store.load().as_deref(), Some("t0k3n"));

    let connections = client.list_connections().await.unwrap();
    assert_eq!(connections[0].id, "9");
    assert_eq!(connections[0].dialect(Dialect::Generic), Dialect::Postgres);

    client.logout().unwrap();
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn unauthorized_clears_the_token() {
    let router = Router::new().route(
        "/api/playgrounds",
        get(|| async { (HttpStatus::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))) }),
    );
    let config = serve(router).await;
    let store = Arc::new(MemoryTokenStore::with_token("stale"));
    let client = ApiClient::new(config, SharedStore(store.clone())).unwrap();

    let error = client.list_playgrounds().await.unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn error_messages_come_from_the_body() {
    let router = Router::new()
        .route(
            "/api/connections/1",
            get(|| async { (HttpStatus::NOT_FOUND, Json(json!({"error": "No such connection"}))) }),
        )
        .route(
            "/api/connections/2",
            get(|| async { (HttpStatus::BAD_GATEWAY, "upstream down") }),
        );
    let config = serve(router).await;
    let client = ApiClient::new(config, MemoryTokenStore::with_token("t")).unwrap();

    let error = client.get_connection("1").await.unwrap_err().into_inner();
    match error {
        ErrorKind::ApiError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such connection");
        }
        other => panic!("Unexpected error: {other}"),
    }

    let error = client.get_connection("2").await.unwrap_err().into_inner();
    assert!(matches!(
        error,
        ErrorKind::ApiError { status: 502, message } if message == "upstream down"
    ));

    // Only a 401 throws the token away.
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn generate_and_execute() {
    // Handler panics only reach the test as a failed request, so the saved body is checked here.
    let saved = Arc::new(Mutex::new(None::<Value>));
    let saved_by_server = saved.clone();
    let router = Router::new()
        .route(
            "/api/queries/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["connectionId"], json!("4"));
                assert_eq!(body["enforceDQL"], json!(true));
                Json(json!({"data": {"query": {
                    "sqlQuery": "```sql\nSELECT COUNT(*) FROM users;\n```",
                    "explanation": "Counts users."
                }}}))
            }),
        )
        .route(
            "/api/gui-builder/execute",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["sqlQuery"], json!("SELECT COUNT(*) FROM users;"));
                assert!(body.get("parameters").is_none());
                Json(json!({
                    "columns": ["count"],
                    "rows": [{"count": 42}],
                    "totalRows": 1,
                    "executionTime": 7.25
                }))
            }),
        )
        .route(
            "/api/playgrounds/5",
            axum::routing::put(move |Json(body): Json<Value>| {
                let saved = saved_by_server.clone();
                async move {
                    *saved.lock().unwrap() = Some(body);
                    HttpStatus::NO_CONTENT
                }
            }),
        );
    let config = serve(router).await;
    let client = ApiClient::new(config.clone(), MemoryTokenStore::with_token("t")).unwrap();
    let record = PlaygroundRecord {
        id: "5".to_string(),
        name: "users".to_string(),
        connection_id: Some("4".to_string()),
        ..Default::default()
    };
    let mut playground = crate::playground::Playground::new(client, record, &config)
        .enforce_dql(true);

    let sql = playground
        .generate_sql_from_prompt("how many users")
        .await
        .unwrap();
    assert_eq!(sql, "SELECT COUNT(*) FROM users;");
    assert_eq!(playground.current_explanation(), Some("Counts users."));

    let result = playground.execute_query(false).await.unwrap();
    assert_eq!(result.value(&result.rows[0], "count"), &json!(42));
    assert_eq!(result.execution_time, 7.25);
    assert!(playground.history().last().unwrap().is_success());

    let saved = saved.lock().unwrap().take().expect("the playground was saved");
    assert_eq!(saved["history"].as_array().unwrap().len(), 1);
    assert_eq!(saved["currentSql"], json!("SELECT COUNT(*) FROM users;"));
}

#[tokio::test]
async fn failed_login_is_not_an_expired_session() {
    let router = Router::new().route(
        "/api/auth/login",
        post(|| async {
            (
                HttpStatus::UNAUTHORIZED,
                Json(json!({"message": "Invalid credentials"})),
            )
        }),
    );
    let config = serve(router).await;
    let store = Arc::new(MemoryTokenStore::with_token("previous"));
    let client = ApiClient::new(config, SharedStore(store.clone())).unwrap();

    let error = client.login("ana@example.com", "wrong").await.unwrap_err();

    assert!(!error.is_unauthorized());
    assert!(matches!(
        error.into_inner(),
        ErrorKind::ApiError { status: 401, message } if message == "Invalid credentials"
    ));
    assert_eq!(store.load().as_deref(), Some("previous"));
}

#[test]
fn error_message_fallbacks() {
    assert_eq!(
        error_message(r#"{"message": "bad sql"}"#, StatusCode::BAD_REQUEST),
        "bad sql"
    );
    assert_eq!(
        error_message("", StatusCode::INTERNAL_SERVER_ERROR),
        "Internal Server Error"
    );
}

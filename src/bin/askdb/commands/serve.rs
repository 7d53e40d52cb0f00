//! A local server that compiles query states, for UIs that build queries visually.
use askdb::query::{Dialect, QueryState};
use askdb::{compile, compile_parameterized, Error};
use axum::http::Method;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Builder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompileRequest {
    state: QueryState,
    #[serde(default)]
    dialect: Dialect,
    #[serde(default)]
    parameterized: bool,
}

#[derive(Debug, Serialize)]
struct CompileResponse {
    sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Vec<Value>>,
}

pub fn run(address: &str) -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    // One thread is enough for a server meant to be called by one person's browser.
    let tokio = Builder::new_current_thread()
        .enable_io()
        .build()
        .expect("Cannot build tokio runtime");

    tokio.block_on(async {
        let listener = tokio::net::TcpListener::bind(address).await?;
        info!("Compile server listening on {}", listener.local_addr()?);

        axum::serve(listener, app()).await?;

        Ok::<(), Error>(())
    })
}

fn app() -> Router {
    Router::new().route("/api/v1/compile", post(compile_handler)).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods([Method::POST]),
    )
}

async fn compile_handler(Json(request): Json<CompileRequest>) -> Json<CompileResponse> {
    info!(
        dialect = %request.dialect,
        parameterized = request.parameterized,
        "Compiling query state"
    );

    let response = if request.parameterized {
        let query = compile_parameterized(&request.state, request.dialect);

        CompileResponse {
            sql: query.sql,
            params: Some(query.params),
        }
    } else {
        CompileResponse {
            sql: compile(&request.state, request.dialect),
            params: None,
        }
    };

    Json(response)
}

//! A client for the remote API. Everything that actually touches a database happens over there.
mod session;
mod types;

#[cfg(test)]
mod tests;

pub use session::{AuthToken, CachedTokenStore, MemoryTokenStore, TokenStore};
pub use types::{
    Connection, ExecuteRequest, GenerateRequest, GeneratedQuery, LoginRequest, LoginResponse,
    NewConnection, NewPlayground, PlaygroundRecord, PlaygroundUpdate, QueryResult, User,
};

use crate::config::Config;
use crate::engine::sql::Schema;
use crate::error::ErrorKind;
use crate::playground::Backend;
use crate::Error;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use types::{Envelope, GenerateResponse};

pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
    tokens: Box<dyn TokenStore + Send + Sync>,
}

impl ApiClient {
    pub fn new<S>(config: Config, tokens: S) -> Result<Self, Error>
    where
        S: TokenStore + Send + Sync + 'static,
    {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(ApiClient {
            http,
            config,
            tokens: Box::new(tokens),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens.load().is_some()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        // A 401 here means bad credentials, not an expired session.
        let response = self
            .request(Method::POST, "/auth/login")
            .json(&request)
            .send()
            .await?;
        let body: Envelope<LoginResponse> = successful(response).await?.json().await?;
        let response = body.into_inner();

        self.tokens.save(&response.token)?;

        Ok(response)
    }

    /// Tokens are stateless on the server, logging out is forgetting the token.
    pub fn logout(&self) -> Result<(), Error> {
        self.tokens.clear()
    }

    pub async fn list_connections(&self) -> Result<Vec<Connection>, Error> {
        self.get("/connections").await
    }

    pub async fn get_connection(&self, id: &str) -> Result<Connection, Error> {
        self.get(&format!("/connections/{id}")).await
    }

    pub async fn create_connection(&self, connection: &NewConnection) -> Result<Connection, Error> {
        self.send_json(Method::POST, "/connections", connection)
            .await
    }

    pub async fn delete_connection(&self, id: &str) -> Result<(), Error> {
        self.send_empty(self.request(Method::DELETE, &format!("/connections/{id}")))
            .await
    }

    pub async fn connection_schema(&self, id: &str) -> Result<Schema, Error> {
        self.get(&format!("/connections/{id}/schema")).await
    }

    pub async fn list_playgrounds(&self) -> Result<Vec<PlaygroundRecord>, Error> {
        self.get("/playgrounds").await
    }

    pub async fn get_playground(&self, id: &str) -> Result<PlaygroundRecord, Error> {
        self.get(&format!("/playgrounds/{id}")).await
    }

    pub async fn create_playground(
        &self,
        playground: &NewPlayground,
    ) -> Result<PlaygroundRecord, Error> {
        self.send_json(Method::POST, "/playgrounds", playground)
            .await
    }

    pub async fn update_playground(&self, id: &str, update: &PlaygroundUpdate) -> Result<(), Error> {
        let request = self
            .request(Method::PUT, &format!("/playgrounds/{id}"))
            .json(update);

        self.send_empty(request).await
    }

    pub async fn delete_playground(&self, id: &str) -> Result<(), Error> {
        self.send_empty(self.request(Method::DELETE, &format!("/playgrounds/{id}")))
            .await
    }

    pub async fn generate_query(&self, request: &GenerateRequest) -> Result<GeneratedQuery, Error> {
        let response: GenerateResponse = self
            .send_json(Method::POST, "/queries/generate", request)
            .await?;

        Ok(response.query)
    }

    pub async fn execute_query(&self, request: &ExecuteRequest) -> Result<QueryResult, Error> {
        self.send_json(Method::POST, "/gui-builder/execute", request)
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.endpoint(path);
        debug!("{method} {url}");

        let request = self.http.request(method, url);

        match self.tokens.load() {
            Some(token) => request.header(AUTHORIZATION, self.config.authorization_header(&token)),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, path).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = self.check(request.send().await?).await?;
        let body: Envelope<T> = response.json().await?;

        Ok(body.into_inner())
    }

    /// For calls where we don't care about the response body.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), Error> {
        self.check(request.send().await?).await?;

        Ok(())
    }

    /// Turns non 2xx responses into errors.
    ///
    /// A 401 means our token is no good anymore, so it gets thrown away.
    async fn check(&self, response: Response) -> Result<Response, Error> {
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Got a 401, clearing the stored token");
            self.tokens.clear()?;

            return Err(ErrorKind::Unauthorized.into());
        }

        successful(response).await
    }
}

async fn successful(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    Err(ErrorKind::ApiError {
        status: status.as_u16(),
        message: error_message(&body, status),
    }
    .into())
}

/// Pulls a human readable message out of an error body.
fn error_message(body: &str, status: StatusCode) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        });

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn generate_sql(&self, request: &GenerateRequest) -> Result<GeneratedQuery, Error> {
        self.generate_query(request).await
    }

    async fn execute_sql(&self, request: &ExecuteRequest) -> Result<QueryResult, Error> {
        self.execute_query(request).await
    }

    async fn save_playground(&self, id: &str, update: &PlaygroundUpdate) -> Result<(), Error> {
        self.update_playground(id, update).await
    }
}

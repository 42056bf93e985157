//! Method dispatch: authentication, request validation and the two business methods.

use crate::auth::check_auth;
use crate::config::AuthConfig;
use crate::errors::MethodError;
use crate::fields::is_empty;
use crate::requests::{ClientsInterestsRequest, MethodRequest, OnlineScoreRequest};
use crate::scoring::{get_interests, get_score};
use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value, json};
use store::Store;

/// Score returned to the admin caller without consulting the store.
pub const ADMIN_SCORE: u64 = 42;

/// Per-request bookkeeping, logged once the request completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nclients: Option<usize>,
}

impl Context {
    pub fn new(request_id: impl Into<String>) -> Self {
        Context {
            request_id: request_id.into(),
            ..Default::default()
        }
    }
}

pub struct Dispatcher {
    auth: AuthConfig,
}

impl Dispatcher {
    pub fn new(auth: AuthConfig) -> Self {
        Dispatcher { auth }
    }

    /// Handles one decoded request body, returning the payload and its status.
    ///
    /// On failure the payload is the error message.
    pub async fn handle(
        &self,
        request: &Value,
        ctx: &mut Context,
        store: &Store,
    ) -> (Value, StatusCode) {
        match self.dispatch(request, ctx, store).await {
            Ok(response) => (response, StatusCode::OK),
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    tracing::error!(request_id = %ctx.request_id, error = %err, "method failed");
                } else {
                    tracing::info!(request_id = %ctx.request_id, error = %err, "method rejected");
                }
                (Value::String(err.public_message()), status)
            }
        }
    }

    async fn dispatch(
        &self,
        request: &Value,
        ctx: &mut Context,
        store: &Store,
    ) -> Result<Value, MethodError> {
        if is_empty(request) {
            return Err(MethodError::InvalidRequest("request body is empty".into()));
        }

        let method_request = MethodRequest::from_value(request)?;
        if !check_auth(&method_request, &self.auth) {
            return Err(MethodError::Forbidden);
        }

        tracing::debug!(
            request_id = %ctx.request_id,
            method = %method_request.method,
            login = method_request.login.as_deref().unwrap_or_default(),
            "dispatching method"
        );

        match method_request.method.as_str() {
            "online_score" => online_score(&method_request, ctx, store).await,
            "clients_interests" => clients_interests(&method_request, ctx, store).await,
            other => Err(MethodError::InvalidRequest(format!(
                "unknown method '{other}'"
            ))),
        }
    }
}

async fn online_score(
    method_request: &MethodRequest,
    ctx: &mut Context,
    store: &Store,
) -> Result<Value, MethodError> {
    let request = OnlineScoreRequest::from_arguments(&method_request.arguments)?;
    ctx.has = Some(request.filled.clone());

    if method_request.is_admin() {
        return Ok(json!({ "score": ADMIN_SCORE }));
    }

    let score = get_score(store, &request).await;
    Ok(json!({ "score": score }))
}

/// Fails as a whole if any lookup fails, never returning partial results.
async fn clients_interests(
    method_request: &MethodRequest,
    ctx: &mut Context,
    store: &Store,
) -> Result<Value, MethodError> {
    let request = ClientsInterestsRequest::from_arguments(&method_request.arguments)?;
    ctx.nclients = Some(request.client_ids.len());

    let mut interests = Map::new();
    for client_id in &request.client_ids {
        let client_interests = get_interests(store, *client_id).await?;
        interests.insert(client_id.to_string(), json!(client_interests));
    }
    Ok(Value::Object(interests))
}

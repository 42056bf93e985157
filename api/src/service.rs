use crate::errors::ApiError;
use crate::method::{Context, Dispatcher};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS, REQUESTS_INFLIGHT};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{Value, json};
use shared::http::make_json_response;
use shared::{counter, gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use store::Store;

const METHOD_PATH: &str = "/method";
const MAX_BODY_BYTES: usize = 64 * 1024;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wraps a method result into the response envelope.
///
/// Successful calls carry `response`, everything else carries `error`,
/// falling back to the status reason when there is no message.
pub fn envelope(code: StatusCode, payload: Option<Value>) -> Value {
    if code == StatusCode::OK {
        return json!({"response": payload.unwrap_or(Value::Null), "code": code.as_u16()});
    }

    let error = payload
        .unwrap_or_else(|| json!(code.canonical_reason().unwrap_or("Unknown Error")));
    json!({"error": error, "code": code.as_u16()})
}

/// Counts one in-flight request for as long as it lives, including when hyper
/// drops the response future of a disconnected client.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

fn request_id_of<B>(req: &Request<B>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

pub struct ScoringService {
    dispatcher: Arc<Dispatcher>,
    store: Arc<Store>,
}

impl ScoringService {
    pub fn new(dispatcher: Dispatcher, store: Arc<Store>) -> Self {
        ScoringService {
            dispatcher: Arc::new(dispatcher),
            store,
        }
    }
}

impl Service<Request<Incoming>> for ScoringService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = ApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let store = self.store.clone();

        Box::pin(async move {
            let start = Instant::now();
            let _inflight = InflightGuard::new();

            let request_id = request_id_of(&req);
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            let (ctx, payload, code) = route(req, &request_id, dispatcher, store).await;
            let body = envelope(code, payload);

            let code_tag = code.as_u16().to_string();
            counter!(REQUESTS, "code" => code_tag.clone()).increment(1);
            histogram!(REQUEST_DURATION, "code" => code_tag).record(start.elapsed().as_secs_f64());

            tracing::info!(
                request_id = %ctx.request_id,
                method = %method,
                path,
                code = code.as_u16(),
                has = ?ctx.has,
                nclients = ?ctx.nclients,
                duration_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );

            Ok(make_json_response(code, &body))
        })
    }
}

async fn route(
    req: Request<Incoming>,
    request_id: &str,
    dispatcher: Arc<Dispatcher>,
    store: Arc<Store>,
) -> (Context, Option<Value>, StatusCode) {
    let ctx = Context::new(request_id);

    if req.uri().path().trim_end_matches('/') != METHOD_PATH {
        return (ctx, None, StatusCode::NOT_FOUND);
    }
    if req.method() != Method::POST {
        return (ctx, None, StatusCode::METHOD_NOT_ALLOWED);
    }

    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            return (ctx, None, StatusCode::PAYLOAD_TOO_LARGE);
        }
        Err(err) => {
            tracing::debug!(request_id, error = %err, "failed to read request body");
            return (ctx, None, StatusCode::BAD_REQUEST);
        }
    };

    // An empty body is not a JSON document either.
    let request = match serde_json::from_slice::<Value>(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(request_id, error = %err, "request body is not JSON");
            return (ctx, None, StatusCode::BAD_REQUEST);
        }
    };

    // The dispatcher runs in its own task so a panic surfaces as a join error.
    let task = tokio::spawn(async move {
        let mut ctx = ctx;
        let (payload, code) = dispatcher.handle(&request, &mut ctx, &store).await;
        (ctx, payload, code)
    });

    match task.await {
        Ok((ctx, payload, code)) => (ctx, Some(payload), code),
        Err(err) => {
            tracing::error!(request_id, error = %err, "method handler crashed");
            (Context::new(request_id), None, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

//! Business functions behind the two methods.

use crate::errors::MethodError;
use crate::requests::{Gender, OnlineScoreRequest};
use sha2::{Digest, Sha256};
use std::time::Duration;
use store::Store;

/// How long a computed score stays in the cache.
pub const SCORE_TTL: Duration = Duration::from_secs(60 * 60);

fn score_key(request: &OnlineScoreRequest) -> String {
    let birthday = request
        .birthday
        .map(|date| date.format("%Y%m%d").to_string())
        .unwrap_or_default();
    let material = [
        request.first_name.as_deref().unwrap_or_default(),
        request.last_name.as_deref().unwrap_or_default(),
        request.phone.as_deref().unwrap_or_default(),
        &birthday,
    ]
    .concat();
    format!("uid:{}", hex::encode(Sha256::digest(material.as_bytes())))
}

fn compute_score(request: &OnlineScoreRequest) -> f64 {
    let mut score = 0.0;
    if request.phone.is_some() {
        score += 1.5;
    }
    if request.email.is_some() {
        score += 1.5;
    }
    // An unknown gender does not count.
    let known_gender = matches!(request.gender, Some(Gender::Male | Gender::Female));
    if request.birthday.is_some() && known_gender {
        score += 1.5;
    }
    if request.first_name.is_some() && request.last_name.is_some() {
        score += 0.5;
    }
    score
}

/// Returns the score for a request, consulting the cache first.
///
/// The cache is best-effort, so this never fails.
pub async fn get_score(store: &Store, request: &OnlineScoreRequest) -> f64 {
    let key = score_key(request);
    if let Some(cached) = store.cache_get(&key).await {
        match cached.parse::<f64>() {
            Ok(score) => return score,
            Err(err) => tracing::warn!(key = %key, error = %err, "ignoring malformed cached score"),
        }
    }

    let score = compute_score(request);
    store.cache_set(&key, &score.to_string(), SCORE_TTL).await;
    score
}

/// Reads the interests stored under `i:<client_id>`. A missing key means no interests.
pub async fn get_interests(store: &Store, client_id: i64) -> Result<Vec<String>, MethodError> {
    let Some(raw) = store.get(&format!("i:{client_id}")).await? else {
        return Ok(Vec::new());
    };

    serde_json::from_str(&raw).map_err(|err| {
        MethodError::Internal(format!("malformed interests for client {client_id}: {err}"))
    })
}

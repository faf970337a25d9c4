//! Ordered-candidate endpoint resolution. The backend's exact response shape
//! for "this user's liked videos" / "this user's subscriptions" varies by
//! deployment, so the resolver probes a fixed priority list and normalizes
//! the first recognized body. Per-candidate failure is expected, not
//! exceptional: most candidates do not exist on a given deployment.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::shape::{Shape, classify};
use crate::transport::Transport;

/// One guessed URL in a priority-ordered fallback list. Read-only
/// configuration; treat the list and its order as deployment knowledge, not
/// as a correctness guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEndpoint {
    pub path: String,
}

impl CandidateEndpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Candidate list for a user's liked videos, in observed priority order.
pub fn liked_candidates(username: &str) -> Vec<CandidateEndpoint> {
    vec![
        CandidateEndpoint::new("/likes"),
        CandidateEndpoint::new(format!("/users/{username}/likes")),
        CandidateEndpoint::new("/me/likes"),
        CandidateEndpoint::new("/videos/liked"),
    ]
}

/// Candidate list for a user's subscriptions, in observed priority order.
pub fn subscription_candidates(username: &str) -> Vec<CandidateEndpoint> {
    vec![
        CandidateEndpoint::new("/subscriptions"),
        CandidateEndpoint::new(format!("/users/{username}/subscriptions")),
        CandidateEndpoint::new(format!("/users/{username}/subscribed")),
        CandidateEndpoint::new("/me/subscriptions"),
        CandidateEndpoint::new(format!("/users/{username}/channels")),
    ]
}

/// Normalized resolution output. Callers branch on the variant; `NotFound`
/// is a normal result, and pages fall back to a default feed on it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolvedSet {
    Ids(BTreeSet<i64>),
    Objects(Vec<Value>),
    NotFound,
}

/// Walks `candidates` in declared order and returns the first recognized,
/// normalized body. Transport failures and unrecognized shapes both advance
/// to the next candidate; there is no merging across candidates. For a fixed
/// candidate list and fixed per-candidate responses the result is
/// deterministic: evaluation is sequential, never raced.
pub async fn resolve<T: Transport>(
    candidates: &[CandidateEndpoint],
    transport: &T,
) -> ResolvedSet {
    for candidate in candidates {
        let body = match transport.fetch(&candidate.path, &[]).await {
            Ok(body) => body,
            Err(err) => {
                log::debug!(
                    target: "streamify::resolve",
                    "candidate {} failed, advancing: {}",
                    candidate.path,
                    err
                );
                continue;
            }
        };
        match normalize(&body) {
            Some(set) => {
                log::info!(
                    target: "streamify::resolve",
                    "resolved via {}",
                    candidate.path
                );
                return set;
            }
            None => {
                log::debug!(
                    target: "streamify::resolve",
                    "candidate {} returned an unrecognized shape, advancing",
                    candidate.path
                );
            }
        }
    }
    log::info!(target: "streamify::resolve", "all candidates exhausted");
    ResolvedSet::NotFound
}

/// Normalizes one decoded body, or `None` when the shape is unrecognized.
fn normalize(body: &Value) -> Option<ResolvedSet> {
    match classify(body) {
        Shape::IdList => Some(ResolvedSet::Ids(collect_ids(body.as_array()?))),
        Shape::ObjectList => Some(ResolvedSet::Objects(body.as_array()?.clone())),
        Shape::WrappedIds { field } => {
            Some(ResolvedSet::Ids(collect_ids(body.get(field)?.as_array()?)))
        }
        Shape::WrappedObjects { field } => {
            Some(ResolvedSet::Objects(body.get(field)?.as_array()?.clone()))
        }
        Shape::Unrecognized => None,
    }
}

fn collect_ids(items: &[Value]) -> BTreeSet<i64> {
    items.iter().filter_map(Value::as_i64).collect()
}

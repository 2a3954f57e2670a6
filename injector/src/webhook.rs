use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

use crate::annotation::extract_annotation;
use crate::patcher::{PatchOutcome, WorkloadPatcher};
use crate::sidecar::SidecarPatch;
use crate::target::decode_targets;
use crate::workload::WorkloadClient;
use crate::{Error, Result};

/// Content type accepted by the webhook
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Largest request body accepted, matching the API server's request limit
pub const MAX_BODY_BYTES: u64 = 3 * 1024 * 1024;

/// Shared state for webhook handlers
pub struct WebhookState {
    patcher: WorkloadPatcher<dyn WorkloadClient>,
}

impl WebhookState {
    pub fn new(client: Arc<dyn WorkloadClient>, patch: Arc<SidecarPatch>) -> Self {
        Self {
            patcher: WorkloadPatcher::new(client, patch),
        }
    }

    /// Overrides the namespace used for targets that do not name one
    #[must_use]
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.patcher = self.patcher.with_default_namespace(namespace);
        self
    }

    /// Runs the injection pipeline for one request
    ///
    /// Every stage is a hard stop: the first error ends the request.
    pub async fn handle(
        &self,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<PatchOutcome>> {
        if body.is_empty() {
            return Err(Error::EmptyBody);
        }

        if content_type != Some(JSON_CONTENT_TYPE) {
            return Err(Error::UnsupportedContentType(content_type.map(String::from)));
        }

        let fragment = extract_annotation(body)?;
        let targets = decode_targets(&fragment)?;

        info!(
            targets = targets.len(),
            default_namespace = self.patcher.default_namespace(),
            "injecting sidecar"
        );

        self.patcher.ensure_sidecars(&targets).await
    }
}

/// Creates the warp filter serving `POST /mutate`
pub fn routes(
    state: Arc<WebhookState>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::post()
        .and(warp::path("mutate"))
        .and(warp::path::end())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(mutate)
}

fn with_state(
    state: Arc<WebhookState>,
) -> impl Filter<Extract = (Arc<WebhookState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn mutate(
    content_type: Option<String>,
    body: Bytes,
    state: Arc<WebhookState>,
) -> std::result::Result<Response, Infallible> {
    match state.handle(content_type.as_deref(), &body).await {
        Ok(outcomes) => {
            let patched = outcomes
                .iter()
                .filter(|o| matches!(o, PatchOutcome::Patched { .. }))
                .count();
            info!(
                patched,
                unchanged = outcomes.len() - patched,
                "mutation finished"
            );
            Ok(StatusCode::OK.into_response())
        }
        Err(err) => {
            let status = err.status_code();
            if status.is_client_error() {
                warn!(error = %err, status = status.as_u16(), "rejected request");
            } else {
                error!(error = %err, status = status.as_u16(), "mutation failed");
            }
            Ok(warp::reply::with_status(err.response_body(), status).into_response())
        }
    }
}

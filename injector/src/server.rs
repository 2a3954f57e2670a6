use std::sync::Arc;

use tracing::{error, info};
use warp::Filter;

use crate::config::Config;
use crate::webhook::{self, WebhookState};
use crate::{Error, Result};

/// HTTPS server hosting the webhook
pub struct Server {
    config: Config,
    state: Arc<WebhookState>,
}

impl Server {
    pub fn new(config: Config, state: impl Into<Arc<WebhookState>>) -> Self {
        Self {
            config,
            state: state.into(),
        }
    }

    /// Serves the webhook until SIGINT or SIGTERM is received
    pub async fn run(self) -> Result<()> {
        let routes = webhook::routes(self.state).with(warp::trace::request());

        let (addr, server) = warp::serve(routes)
            .tls()
            .cert_path(&self.config.tls_cert_file)
            .key_path(&self.config.tls_key_file)
            .try_bind_with_graceful_shutdown(self.config.addr(), shutdown_signal())
            .map_err(Error::Server)?;

        info!(%addr, "webhook server listening");
        server.await;
        info!("webhook server stopped");

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("got shutdown signal, shutting down webhook server gracefully");
}

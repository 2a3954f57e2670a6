use std::sync::Arc;

use clap::Parser;
use injector::{Config, KubeWorkloads, Server, SidecarPatch, SidecarSpec, WebhookState};
use kube::Client;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), injector::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();

    let patch = Arc::new(SidecarPatch::new(&SidecarSpec::default())?);
    let client = Client::try_default().await?;

    let state = WebhookState::new(Arc::new(KubeWorkloads::new(client)), patch)
        .with_default_namespace(config.default_namespace.clone());

    Server::new(config, state).run().await
}

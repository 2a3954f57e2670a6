use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::patcher::DEFAULT_NAMESPACE;

/// Sidecar injector webhook server
#[derive(Parser, Debug, Clone)]
#[command(name = "injector", version, about, long_about = None)]
pub struct Config {
    /// Webhook server port
    #[arg(long, env = "INJECTOR_PORT", default_value_t = 443)]
    pub port: u16,

    /// File containing the x509 certificate for HTTPS
    #[arg(
        long,
        alias = "tlsCertFile",
        env = "INJECTOR_TLS_CERT_FILE",
        default_value = "/etc/webhook/certs/cert.pem"
    )]
    pub tls_cert_file: PathBuf,

    /// File containing the x509 private key matching `--tls-cert-file`
    #[arg(
        long,
        alias = "tlsKeyFile",
        env = "INJECTOR_TLS_KEY_FILE",
        default_value = "/etc/webhook/certs/key.pem"
    )]
    pub tls_key_file: PathBuf,

    /// Namespace for targets that do not name one
    #[arg(long, env = "INJECTOR_DEFAULT_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub default_namespace: String,
}

impl Config {
    /// Address the server listens on, all interfaces
    pub fn addr(&self) -> SocketAddr {
        (Ipv4Addr::UNSPECIFIED, self.port).into()
    }
}

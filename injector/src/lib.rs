//! Mutating admission webhook injecting a sidecar container into Deployments
//!
//! The workloads to patch are read from the `kubectl.kubernetes.io/last-applied-configuration`
//! annotation of the admitted object, which is expected to carry a
//! `{"spec": {"containers": [{"name": ..., "namespace": ...}]}}` document.
//! Each named Deployment gets the sidecar appended to its pod template.

pub mod annotation;
pub mod config;
pub mod error;
pub mod patcher;
pub mod server;
pub mod sidecar;
pub mod target;
pub mod webhook;
pub mod workload;

pub use config::Config;
pub use error::{Error, Result};
pub use patcher::{PatchOutcome, WorkloadPatcher};
pub use server::Server;
pub use sidecar::{SidecarPatch, SidecarSpec};
pub use target::TargetDescriptor;
pub use webhook::WebhookState;
pub use workload::{KubeWorkloads, WorkloadClient};

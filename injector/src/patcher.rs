//! Applying the sidecar patch to the targeted workloads
//!
//! Targets are processed strictly in order and the first failure aborts the
//! batch. Workloads patched before the failure stay patched, nothing is
//! rolled back, and targets after it are never touched.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::sidecar::SidecarPatch;
use crate::target::TargetDescriptor;
use crate::workload::{WorkloadClient, template_container_names};
use crate::{Error, Result};

/// Namespace used for targets that do not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// What happened to a single target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The sidecar was appended to the pod template
    Patched { namespace: String, name: String },
    /// The pod template already runs a container with the sidecar's name
    AlreadyPresent { namespace: String, name: String },
}

pub struct WorkloadPatcher<C: ?Sized> {
    client: Arc<C>,
    patch: Arc<SidecarPatch>,
    default_namespace: String,
}

impl<C> WorkloadPatcher<C>
where
    C: WorkloadClient + ?Sized,
{
    pub fn new(client: Arc<C>, patch: Arc<SidecarPatch>) -> Self {
        Self {
            client,
            patch,
            default_namespace: DEFAULT_NAMESPACE.into(),
        }
    }

    #[must_use]
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Namespace a target is acted on in
    pub fn resolve_namespace<'a>(&'a self, target: &'a TargetDescriptor) -> &'a str {
        target.namespace_or(&self.default_namespace)
    }

    /// Ensures every target runs the sidecar, stopping at the first failure
    pub async fn ensure_sidecars(&self, targets: &[TargetDescriptor]) -> Result<Vec<PatchOutcome>> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            match self.ensure_sidecar(index, target).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    error!(
                        error = %err,
                        processed = outcomes.len(),
                        skipped = targets.len() - index - 1,
                        "aborting sidecar injection"
                    );
                    return Err(err);
                }
            }
        }

        Ok(outcomes)
    }

    /// Ensures a single target runs the sidecar
    ///
    /// The workload is read first. If its pod template already has a container
    /// with the sidecar's name no patch is sent.
    pub async fn ensure_sidecar(
        &self,
        index: usize,
        target: &TargetDescriptor,
    ) -> Result<PatchOutcome> {
        if target.name.is_empty() {
            return Err(Error::UnnamedTarget { index });
        }

        let name = target.name.as_str();
        let namespace = self.resolve_namespace(target);

        let workload = self
            .client
            .get_workload(namespace, name)
            .await
            .map_err(|source| Error::LookupFailed {
                namespace: namespace.into(),
                name: name.into(),
                source,
            })?
            .ok_or_else(|| Error::TargetNotFound {
                namespace: namespace.into(),
                name: name.into(),
            })?;

        if template_container_names(&workload).any(|c| c == self.patch.container_name()) {
            debug!(%namespace, %name, "sidecar already present");
            return Ok(PatchOutcome::AlreadyPresent {
                namespace: namespace.into(),
                name: name.into(),
            });
        }

        self.client
            .patch_workload(namespace, name, self.patch.patch())
            .await
            .map_err(|source| Error::PatchApplyFailed {
                namespace: namespace.into(),
                name: name.into(),
                source,
            })?;

        info!(%namespace, %name, "injected sidecar");

        Ok(PatchOutcome::Patched {
            namespace: namespace.into(),
            name: name.into(),
        })
    }
}

use async_trait::async_trait;
use json_patch::Patch;
use k8s_openapi::api::apps::v1::Deployment;
use kube::Client;
use kube::api::{Api, Patch as KubePatch, PatchParams};

/// Cluster operations the patcher needs on namespaced workloads
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    /// Reads a workload, `None` when it does not exist
    async fn get_workload(&self, namespace: &str, name: &str) -> kube::Result<Option<Deployment>>;

    /// Applies a JSON Patch to a workload
    async fn patch_workload(&self, namespace: &str, name: &str, patch: &Patch) -> kube::Result<()>;
}

/// `WorkloadClient` backed by the Deployments API
#[derive(Clone)]
pub struct KubeWorkloads {
    client: Client,
}

impl KubeWorkloads {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl WorkloadClient for KubeWorkloads {
    async fn get_workload(&self, namespace: &str, name: &str) -> kube::Result<Option<Deployment>> {
        self.api(namespace).get_opt(name).await
    }

    async fn patch_workload(&self, namespace: &str, name: &str, patch: &Patch) -> kube::Result<()> {
        self.api(namespace)
            .patch(
                name,
                &PatchParams::default(),
                &KubePatch::<()>::Json(patch.clone()),
            )
            .await?;

        Ok(())
    }
}

/// Names of the containers in a workload's pod template
pub fn template_container_names(workload: &Deployment) -> impl Iterator<Item = &str> {
    workload
        .spec
        .iter()
        .filter_map(|spec| spec.template.spec.as_ref())
        .flat_map(|pod| pod.containers.iter())
        .map(|container| container.name.as_str())
}

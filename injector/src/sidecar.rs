//! The sidecar container and the JSON Patch that appends it to a pod template

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, Patch, PatchOperation};
use k8s_openapi::api::core::v1::{Container, VolumeMount};

use crate::{Error, Result};

/// Description of the injected container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarSpec {
    pub name: String,
    pub image: String,
    pub volume_name: String,
    pub mount_path: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
}

impl Default for SidecarSpec {
    fn default() -> Self {
        Self {
            name: "sidecar".into(),
            image: "theiaide/theia".into(),
            volume_name: "shared-data".into(),
            mount_path: "/pod-data".into(),
            command: vec!["/bin/sh".into()],
            args: vec![
                "-c".into(),
                "echo Hello from the debian container > /pod-data/index.html".into(),
            ],
        }
    }
}

impl SidecarSpec {
    pub fn container(&self) -> Container {
        Container {
            name: self.name.clone(),
            image: Some(self.image.clone()),
            volume_mounts: Some(vec![VolumeMount {
                name: self.volume_name.clone(),
                mount_path: self.mount_path.clone(),
                ..Default::default()
            }]),
            command: Some(self.command.clone()),
            args: Some(self.args.clone()),
            ..Default::default()
        }
    }
}

/// Immutable patch document appending the sidecar to
/// `/spec/template/spec/containers`
///
/// Built once at startup and shared by every request.
#[derive(Debug, Clone)]
pub struct SidecarPatch {
    container_name: String,
    patch: Patch,
}

impl SidecarPatch {
    pub fn new(spec: &SidecarSpec) -> Result<Self> {
        let value = serde_json::to_value(spec.container()).map_err(Error::SerializationError)?;

        let patch = Patch(vec![PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["spec", "template", "spec", "containers", "-"]),
            value,
        })]);

        Ok(Self {
            container_name: spec.name.clone(),
            patch,
        })
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Name of the container the patch adds
    pub fn container_name(&self) -> &str {
        &self.container_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn single_add_operation_appending_to_pod_template() {
        let patch = SidecarPatch::new(&SidecarSpec::default()).unwrap();
        let ops = &patch.patch().0;

        assert_eq!(ops.len(), 1);
        let PatchOperation::Add(op) = &ops[0] else {
            panic!("expected an add operation, got {:?}", ops[0]);
        };
        assert_eq!(op.path.as_str(), "/spec/template/spec/containers/-");

        let container: Container = serde_json::from_value(op.value.clone()).unwrap();
        assert_eq!(container.name, "sidecar");
        assert_eq!(container.image.as_deref(), Some("theiaide/theia"));
    }

    #[test]
    fn serializes_to_cluster_json_patch() {
        let patch = SidecarPatch::new(&SidecarSpec::default()).unwrap();
        let text = serde_json::to_string(patch.patch()).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(
            doc,
            json!([{
                "op": "add",
                "path": "/spec/template/spec/containers/-",
                "value": {
                    "name": "sidecar",
                    "image": "theiaide/theia",
                    "volumeMounts": [{ "name": "shared-data", "mountPath": "/pod-data" }],
                    "command": ["/bin/sh"],
                    "args": ["-c", "echo Hello from the debian container > /pod-data/index.html"]
                }
            }])
        );
    }

    #[test]
    fn patch_is_identical_across_builds() {
        let spec = SidecarSpec::default();
        let a = SidecarPatch::new(&spec).unwrap();
        let b = SidecarPatch::new(&spec).unwrap();
        assert_eq!(a.patch(), b.patch());
        assert_eq!(a.container_name(), "sidecar");
    }
}

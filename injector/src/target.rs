use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A workload named in the annotation fragment
///
/// Mirrors one entry of the fragment's `spec.containers` list. Only `name`
/// and `namespace` carry meaning, any other string keys are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl TargetDescriptor {
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(String::from),
            extra: BTreeMap::new(),
        }
    }

    /// Namespace to act in, `fallback` when none or an empty one was given
    pub fn namespace_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => fallback,
        }
    }
}

#[derive(Deserialize)]
struct Fragment {
    spec: FragmentSpec,
}

#[derive(Deserialize)]
struct FragmentSpec {
    containers: Vec<TargetDescriptor>,
}

/// Decodes the sanitized annotation fragment into its target list
///
/// Order and duplicates are preserved. An empty list is valid.
pub fn decode_targets(fragment: &str) -> Result<Vec<TargetDescriptor>> {
    let fragment: Fragment = serde_json::from_str(fragment).map_err(Error::MalformedFragment)?;
    Ok(fragment.spec.containers)
}

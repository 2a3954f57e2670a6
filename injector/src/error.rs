use thiserror::Error;
use warp::http::StatusCode;

/// Errors that can occur while handling an injection request
#[derive(Error, Debug)]
pub enum Error {
    /// The request carried no body
    #[error("empty body")]
    EmptyBody,

    /// The request was not sent as `application/json`
    #[error("Content-Type={}, expect application/json", .0.as_deref().unwrap_or(""))]
    UnsupportedContentType(Option<String>),

    /// The last-applied-configuration annotation could not be located
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The embedded annotation fragment is not valid JSON of the expected shape
    #[error("malformed annotation fragment: {0}")]
    MalformedFragment(#[source] serde_json::Error),

    /// A target descriptor without a workload name
    #[error("target at index {index} has no name")]
    UnnamedTarget { index: usize },

    /// The named workload does not exist
    #[error("workload {namespace}/{name} not found")]
    TargetNotFound { namespace: String, name: String },

    /// Reading the named workload failed for a reason other than absence
    #[error("failed to read workload {namespace}/{name}: {source}")]
    LookupFailed {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    /// The cluster rejected the sidecar patch
    #[error("failed to patch workload {namespace}/{name}: {source}")]
    PatchApplyFailed {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    /// Error during JSON serialization/deserialization
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// Error from the Kubernetes client
    #[error("Kube Error: {0}")]
    KubeError(#[from] kube::Error),

    /// The HTTPS server could not load its certificate or bind its address
    #[error("Server Error: {0}")]
    Server(#[source] warp::Error),
}

impl Error {
    /// HTTP status the webhook answers with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyBody
            | Self::MissingField(_)
            | Self::MalformedFragment(_)
            | Self::UnnamedTarget { .. } => StatusCode::BAD_REQUEST,
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TargetNotFound { .. } => StatusCode::NOT_FOUND,
            Self::LookupFailed { .. } | Self::PatchApplyFailed { .. } | Self::KubeError(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::SerializationError(_) | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Plain-text body sent back to the caller
    pub fn response_body(&self) -> String {
        match self {
            Self::EmptyBody => "empty body".into(),
            Self::UnsupportedContentType(_) => {
                "invalid Content-Type, expect `application/json`".into()
            }
            Self::MissingField(_) | Self::MalformedFragment(_) => "bad item".into(),
            other => other.to_string(),
        }
    }
}

/// Result type for injector operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_client_statuses() {
        assert_eq!(Error::EmptyBody.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::UnsupportedContentType(Some("text/plain".into())).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            Error::MissingField("annotations").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn bad_item_body_hides_parser_details() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::MalformedFragment(err).response_body(), "bad item");
        assert_eq!(Error::MissingField("request").response_body(), "bad item");
    }

    #[test]
    fn cluster_errors_name_the_target() {
        let err = Error::TargetNotFound {
            namespace: "ns1".into(),
            name: "app1".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.response_body(), "workload ns1/app1 not found");
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error_msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error_msg.into()),
        }
    }
}

/// Body returned by each service's `/headpat` liveness route. The health
/// check only inspects the HTTP status, not this payload, but a shared shape
/// keeps both services' probes looking the same on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HeadpatResponse {
    pub message: String,
}

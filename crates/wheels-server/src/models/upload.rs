//! Upload DTOs

use serde::Deserialize;
use utoipa::ToSchema;

/// Request for a signed Cloud Storage upload URL
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Object path inside the bucket
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content_type: String,
}

//! Upload credentials handed to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Parameters a client needs for a signed Cloudinary upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadSignature {
    pub signature: String,
    pub timestamp: String,
    pub folder: String,
    pub context: String,
}

/// A pre-signed Cloud Storage `PUT` URL
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedUploadUrl {
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
    /// Headers the upload must carry for the signature to match
    pub headers: BTreeMap<String, String>,
}

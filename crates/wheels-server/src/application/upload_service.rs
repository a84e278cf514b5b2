//! Upload Credentials Service
//!
//! Signs Cloudinary upload parameters and Cloud Storage `PUT` URLs for
//! signed-in users.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::BTreeMap;

use wheels::domain::services::gcs_signer::{self, SignedUrlRequest};
use wheels::domain::services::signing::cloudinary_signature;
use wheels::{DomainError, SignedUploadUrl, UploadSignature};

use crate::config::{CloudinaryConfig, StorageConfig};

/// Lifetime of a signed upload URL
pub const UPLOAD_URL_TTL_MINUTES: i64 = 15;

const UPLOADED_BY_HEADER: &str = "x-goog-meta-uploadedBy";
const UPLOADED_AT_HEADER: &str = "x-goog-meta-uploadedAt";

#[derive(Clone, Default)]
pub struct UploadSigner {
    cloudinary: Option<CloudinaryConfig>,
    storage: Option<StorageConfig>,
}

impl UploadSigner {
    pub fn new(cloudinary: Option<CloudinaryConfig>, storage: Option<StorageConfig>) -> Self {
        Self {
            cloudinary,
            storage,
        }
    }

    pub fn signature(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UploadSignature, DomainError> {
        let cloudinary = self
            .cloudinary
            .as_ref()
            .ok_or_else(|| DomainError::NotConfigured("Cloudinary".into()))?;

        let context = format!("userId={user_id}");
        let timestamp = now.timestamp().to_string();

        let mut params = BTreeMap::new();
        params.insert("context".to_string(), context.clone());
        params.insert("folder".to_string(), cloudinary.folder.clone());
        params.insert("timestamp".to_string(), timestamp.clone());

        Ok(UploadSignature {
            signature: cloudinary_signature(&params, &cloudinary.api_secret),
            timestamp,
            folder: cloudinary.folder.clone(),
            context,
        })
    }

    pub fn upload_url(
        &self,
        user_id: &str,
        path: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedUploadUrl, DomainError> {
        let path = path.trim().trim_start_matches('/');
        let content_type = content_type.trim();
        if path.is_empty() || content_type.is_empty() {
            return Err(DomainError::Validation(
                "invalid-argument: path and content type are required".into(),
            ));
        }

        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| DomainError::NotConfigured("Cloud Storage".into()))?;

        let expires_in = Duration::minutes(UPLOAD_URL_TTL_MINUTES);
        let uploaded_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let request = SignedUrlRequest::upload(&storage.bucket, path, content_type, expires_in, now)
            .with_header(UPLOADED_BY_HEADER, user_id)
            .with_header(UPLOADED_AT_HEADER, &uploaded_at);
        let upload_url = gcs_signer::sign_url(&storage.key, &request)?;

        tracing::debug!(bucket = %storage.bucket, object = %path, "Signed upload URL issued");

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        headers.insert(UPLOADED_BY_HEADER.to_string(), user_id.to_string());
        headers.insert(UPLOADED_AT_HEADER.to_string(), uploaded_at);

        Ok(SignedUploadUrl {
            upload_url,
            expires_at: now + expires_in,
            headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wheels::domain::services::gcs_signer::HmacKey;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn signer() -> UploadSigner {
        UploadSigner::new(
            Some(CloudinaryConfig {
                api_secret: "cloud-secret".into(),
                folder: "listings".into(),
            }),
            Some(StorageConfig {
                bucket: "wheels-uploads".into(),
                key: HmacKey {
                    access_id: "GOOG1EXAMPLE".into(),
                    secret: "hmac-secret".into(),
                },
            }),
        )
    }

    #[test]
    fn test_cloudinary_signature() {
        let signature = signer().signature("u1", now()).unwrap();
        assert_eq!(signature.context, "userId=u1");
        assert_eq!(signature.folder, "listings");
        assert_eq!(signature.timestamp, "1700000000");
        assert_eq!(
            signature.signature,
            "bb1b17a0fcf97df3e2f092181a9c88958ecfe9c6d1fed74658f595e4fc71d182"
        );
    }

    #[test]
    fn test_upload_url_lists_required_headers() {
        let signed = signer()
            .upload_url("user-42", "/listings/car.jpg", "image/jpeg", now())
            .unwrap();

        assert!(signed
            .upload_url
            .starts_with("https://storage.googleapis.com/wheels-uploads/listings/car.jpg?"));
        assert!(signed.upload_url.contains("X-Goog-Expires=900"));
        assert_eq!(signed.expires_at, now() + Duration::minutes(15));
        assert_eq!(signed.headers["Content-Type"], "image/jpeg");
        assert_eq!(signed.headers["x-goog-meta-uploadedBy"], "user-42");
        assert_eq!(
            signed.headers["x-goog-meta-uploadedAt"],
            "2023-11-14T22:13:20.000Z"
        );
        assert!(signed.upload_url.contains(
            "X-Goog-SignedHeaders=content-type%3Bhost%3Bx-goog-meta-uploadedat%3Bx-goog-meta-uploadedby"
        ));
    }

    #[test]
    fn test_upload_url_requires_path_and_type() {
        let err = signer().upload_url("u1", " ", "image/png", now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(signer().upload_url("u1", "a.png", "", now()).is_err());
    }

    #[test]
    fn test_unconfigured_backends() {
        let signer = UploadSigner::default();
        assert!(matches!(
            signer.signature("u1", now()),
            Err(DomainError::NotConfigured(_))
        ));
        assert!(matches!(
            signer.upload_url("u1", "a.png", "image/png", now()),
            Err(DomainError::NotConfigured(_))
        ));
    }
}

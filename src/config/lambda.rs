#[cfg(feature = "lambda")]
use crate::core::Storage;
#[cfg(feature = "lambda")]
use crate::utils::error::{Result, SyncError};
#[cfg(feature = "lambda")]
use aws_sdk_s3::operation::get_object::GetObjectError;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

/// Where the Lambda keeps the watermark between scheduled invocations.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_key: String,
    pub s3_region: String,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            s3_bucket: env::var("WATERMARK_BUCKET").map_err(|_| SyncError::MissingConfigError {
                field: "WATERMARK_BUCKET".to_string(),
            })?,
            s3_key: env::var("WATERMARK_KEY")
                .unwrap_or_else(|_| crate::core::watermark::DEFAULT_WATERMARK_FILE.to_string()),
            s3_region: env::var("WATERMARK_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_s3_bucket_name("WATERMARK_BUCKET", &self.s3_bucket)?;
        validate_non_empty_string("WATERMARK_KEY", &self.s3_key)?;
        validate_aws_region("WATERMARK_REGION", &self.s3_region)?;
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| SyncError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("S3 bucket name must be between 3 and 63 characters"));
    }
    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }
    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid("S3 bucket name cannot start or end with a hyphen"));
    }
    Ok(())
}

#[cfg(feature = "lambda")]
fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                return match err.into_service_error() {
                    GetObjectError::NoSuchKey(_) => Ok(None),
                    other => Err(SyncError::StorageError {
                        message: format!("Failed to read s3://{}/{}: {}", self.bucket, path, other),
                    }),
                };
            }
        };

        let data = resp.body.collect().await.map_err(|e| SyncError::StorageError {
            message: format!("Failed to collect S3 data: {}", e),
        })?;

        Ok(Some(data.into_bytes().to_vec()))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| SyncError::StorageError {
                message: format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket,
                    path,
                    e.into_service_error()
                ),
            })?;
        Ok(())
    }
}

#[cfg(all(test, feature = "lambda"))]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_s3_bucket_name("bucket", "genesys-ops-state").is_ok());
        assert!(validate_s3_bucket_name("bucket", "ab").is_err());
        assert!(validate_s3_bucket_name("bucket", "Upper-Case").is_err());
        assert!(validate_s3_bucket_name("bucket", "-leading").is_err());
    }

    #[test]
    fn test_region_rules() {
        assert!(validate_aws_region("region", "eu-central-1").is_ok());
        assert!(validate_aws_region("region", "EU_CENTRAL").is_err());
    }
}

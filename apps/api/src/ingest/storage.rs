use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::parser::ResumeUpload;

/// Uploads the original resume file and returns its public URL.
pub async fn upload_resume(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    endpoint: &str,
    upload: &ResumeUpload,
) -> Result<String, AppError> {
    let key = format!("resumes/{}-{}", Uuid::new_v4(), safe_file_name(&upload.file_name));
    let content_type = upload
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(upload.bytes.clone()))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("resume upload failed: {e}")))?;

    info!("Uploaded resume to s3://{}/{}", bucket, key);
    Ok(format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key))
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

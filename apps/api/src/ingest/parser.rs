//! Resume parser: raw upload -> draft `PortfolioDocument`.
//!
//! `AppState` holds an `Arc<dyn ResumeParser>`; the default backend is
//! `LlmResumeParser`. A parse either yields a full draft or an
//! `AppError::Parse`; nothing partial is ever handed to the merger.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::ingest::prompts::{RESUME_PARSE_PROMPT, RESUME_PARSE_SYSTEM};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, VERBATIM_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::portfolio::PortfolioDocument;
use crate::reconcile::schema::SectionSchema;
use crate::reconcile::IdGenerator;

/// An uploaded resume file.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UploadKind {
    Pdf,
    Text,
}

impl ResumeUpload {
    fn kind(&self) -> Option<UploadKind> {
        let name = self.file_name.to_lowercase();
        match self.content_type.as_deref() {
            Some("application/pdf") => return Some(UploadKind::Pdf),
            Some(ct) if ct.starts_with("text/") => return Some(UploadKind::Text),
            _ => {}
        }
        if name.ends_with(".pdf") {
            Some(UploadKind::Pdf)
        } else if name.ends_with(".txt") || name.ends_with(".md") {
            Some(UploadKind::Text)
        } else {
            None
        }
    }
}

#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, upload: &ResumeUpload) -> Result<PortfolioDocument, AppError>;
}

/// Parses resumes with the LLM.
pub struct LlmResumeParser(pub LlmClient);

#[async_trait]
impl ResumeParser for LlmResumeParser {
    async fn parse(&self, upload: &ResumeUpload) -> Result<PortfolioDocument, AppError> {
        let text = extract_text(upload).await?;
        if text.trim().is_empty() {
            return Err(AppError::Parse(format!(
                "no text could be extracted from '{}'",
                upload.file_name
            )));
        }
        debug!("Extracted {} chars from {}", text.len(), upload.file_name);

        let prompt = RESUME_PARSE_PROMPT.replace("{resume_text}", &text);
        let system = format!("{RESUME_PARSE_SYSTEM} {JSON_ONLY_SYSTEM} {VERBATIM_INSTRUCTION}");
        let draft: PortfolioDocument =
            self.0
                .call_json(&prompt, &system)
                .await
                .map_err(|e| match e {
                    LlmError::MissingApiKey => AppError::Llm("no API key configured".to_string()),
                    other => AppError::Parse(other.to_string()),
                })?;

        info!(
            "Parsed resume '{}': {} experience, {} projects, {} education entries",
            upload.file_name,
            draft.experience.len(),
            draft.projects.len(),
            draft.education.len()
        );
        Ok(draft)
    }
}

/// Extracts plain text from a PDF or text upload. PDF decoding is CPU-bound
/// and runs on the blocking pool.
pub async fn extract_text(upload: &ResumeUpload) -> Result<String, AppError> {
    match upload.kind() {
        Some(UploadKind::Text) => String::from_utf8(upload.bytes.to_vec())
            .map_err(|_| AppError::Parse("text upload is not valid UTF-8".to_string())),
        Some(UploadKind::Pdf) => {
            let bytes = upload.bytes.clone();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
                .map_err(|e| AppError::Parse(format!("unreadable PDF: {e}")))
        }
        None => Err(AppError::Validation(format!(
            "unsupported resume format '{}'; upload a PDF or plain text file",
            upload.file_name
        ))),
    }
}

/// Prepares a parsed draft for merging: record-list entries get a permanent
/// id, grouped entries lose any id, and nothing carries provenance yet.
pub fn assign_ids(draft: &mut PortfolioDocument, ids: &dyn IdGenerator) {
    draft.for_each_record_mut(|section, record| {
        record.status = None;
        record.merge_group_id = None;
        match section.schema() {
            SectionSchema::RecordList { .. } => {
                if record.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
                    record.id = Some(ids.next_id());
                }
            }
            SectionSchema::Grouped { .. } | SectionSchema::ScalarList => record.id = None,
        }
    });
}

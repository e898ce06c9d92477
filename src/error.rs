use std::path::PathBuf;

use thiserror::Error;

use crate::model::Language;
use crate::report::IssueKind;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("chapter marker '{marker}' not found in {} text", channel.as_str())]
    MissingChapterMarker { marker: String, channel: Language },

    #[error("store unavailable at {target}: {source}")]
    StoreUnavailable {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("write failed for {key}: {reason}")]
    SectionWriteFailed { key: String, reason: String },
}

impl PipelineError {
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::MalformedDocument { .. } => IssueKind::MalformedDocument,
            Self::MissingChapterMarker { .. } => IssueKind::MissingChapterMarker,
            Self::StoreUnavailable { .. } => IssueKind::StoreUnavailable,
            Self::SectionWriteFailed { .. } => IssueKind::SectionWriteFailed,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

// Failure taxonomy for a report run
// One variant per way the pipeline can fail; the pure phases cannot.

use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong during one report run.
///
/// Each variant belongs to exactly one pipeline phase (see
/// [`PipelineError::phase`]). Aggregation and assembly are pure in-memory
/// transformations with no failure mode of their own.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configured reporting window is inverted. Raised before any I/O.
    #[error("invalid reporting window: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The source store or one of its relations could not be read.
    #[error("cannot read {what}")]
    SourceAccess {
        what: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A source relation was readable but violates the input contract
    /// (duplicate sku_id, negative price or quantity).
    #[error("source relation '{relation}' is malformed: {detail}")]
    MalformedSource { relation: String, detail: String },

    /// The destination table could not be replaced. The writer is
    /// transactional, so the previous contents are still intact.
    #[error("cannot replace destination table '{table}'")]
    Persistence {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl PipelineError {
    pub(crate) fn source_access(what: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::SourceAccess {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn malformed(relation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedSource {
            relation: relation.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn persistence(table: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Persistence {
            table: table.into(),
            source,
        }
    }

    /// The pipeline phase this failure surfaced in: `generate`, `load`, or
    /// `write`.
    pub fn phase(&self) -> &'static str {
        match self {
            PipelineError::InvalidRange { .. } => "generate",
            PipelineError::SourceAccess { .. } | PipelineError::MalformedSource { .. } => "load",
            PipelineError::Persistence { .. } => "write",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

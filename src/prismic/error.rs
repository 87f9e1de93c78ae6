use thiserror::Error;

/// Errors raised while talking to the content source
#[derive(Debug, Error)]
pub enum ContentError {
    /// Transport failure (`reqwest`)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the content source
    #[error("content source returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API entry point did not advertise a master ref
    #[error("no master ref advertised by {0}")]
    NoMasterRef(String),

    /// No document matches the requested uid
    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    /// A document is missing fields a page needs
    #[error("invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Result of content source operations
pub type ContentResult<T> = Result<T, ContentError>;

impl ContentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn not_found(doc_type: &str, uid: &str) -> Self {
        Self::NotFound {
            doc_type: doc_type.to_string(),
            uid: uid.to_string(),
        }
    }
}

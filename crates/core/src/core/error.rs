use crate::router::PageKey;
use thiserror::Error;

/// Boxed error returned by a page factory.
pub type PageBuildError = Box<dyn std::error::Error + 'static>;

/// A user-supplied numeric parameter violates its domain.
///
/// Raised at the boundary closest to user input; the caller keeps the last
/// valid state and shows a (debounced) notice.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid parameter `{name}`: {reason}")]
pub struct InvalidParameterError {
    pub name: String,
    pub reason: String,
}

impl InvalidParameterError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    /// Navigation to a topic or page that was never registered.
    #[error("unknown route: {topic}/{page}")]
    UnknownRoute { topic: String, page: String },

    /// Two factories registered under the same `(topic, page)` key.
    #[error("duplicate registration: {topic}/{page}")]
    DuplicateRegistration { topic: String, page: PageKey },

    /// The page factory failed; nothing was memoized.
    #[error("failed to construct {topic}/{page}: {source}")]
    Construction {
        topic: String,
        page: PageKey,
        #[source]
        source: PageBuildError,
    },
}

/// Errors raised by a replacement rule are opaque to the stream; they are
/// carried through unmodified.
pub type ReplaceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("cannot compile pattern `{pattern}`")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("replacement failed for match `{matched}`")]
    Replacement {
        matched: String,
        #[source]
        source: ReplaceError,
    },
}

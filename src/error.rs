use thiserror::Error;

/// Failure of a single node invocation.
///
/// Every variant stays typed inside the crate; only
/// [`LlamaChatNode::execute`](crate::node::LlamaChatNode::execute) turns it into
/// the text shown to the host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Malformed node inputs: empty prompt, bad URL, unparseable chat history.
    #[error("validation error: {0}")]
    Validation(String),

    /// The server could not be reached or did not answer in time.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with an error status or an unusable body.
    #[error("server error: {0}")]
    Server(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl NodeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

use remotion_lambda_core::contract::ValidationError;
use remotion_lambda_core::response::ResponseError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to invoke function {function_name}: {message}")]
    Invocation {
        function_name: String,
        message: String,
    },

    #[error("function {function_name} failed with {error_type}: {message}")]
    FunctionFailed {
        function_name: String,
        error_type: String,
        message: String,
        stack: Vec<String>,
    },

    #[error("failed to upload input props: {0}")]
    Storage(String),

    #[error("could not resolve renders bucket: {0}")]
    BucketLookup(String),

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("function {function_name} returned an unreadable response: {message}")]
    MalformedResponse {
        function_name: String,
        message: String,
    },
}

impl ClientError {
    pub(crate) fn from_response(function_name: &str, error: ResponseError) -> Self {
        match error {
            ResponseError::FunctionFailed {
                error_type,
                message,
                stack,
            } => Self::FunctionFailed {
                function_name: function_name.to_string(),
                error_type,
                message,
                stack,
            },
            other => Self::MalformedResponse {
                function_name: function_name.to_string(),
                message: other.to_string(),
            },
        }
    }
}

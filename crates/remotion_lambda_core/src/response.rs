use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub render_id: String,
    pub bucket_name: String,
    #[serde(default)]
    pub cloud_watch_logs: Option<String>,
    #[serde(default)]
    pub folder_in_s3_console: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CostsInfo {
    pub accrued_so_far: f64,
    pub display_cost: String,
    pub currency: String,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderErrorInfo {
    pub message: String,
    pub name: Option<String>,
    pub stack: Option<String>,
    pub chunk: Option<u32>,
    pub frame: Option<u32>,
    pub is_fatal: bool,
    pub attempt: Option<u32>,
    pub total_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderProgress {
    pub overall_progress: f64,
    pub done: bool,
    pub chunks: u32,
    pub render_id: Option<String>,
    pub bucket: Option<String>,
    pub output_file: Option<String>,
    pub out_key: Option<String>,
    pub output_size_in_bytes: Option<u64>,
    pub time_to_finish: Option<u64>,
    pub errors: Vec<RenderErrorInfo>,
    pub fatal_error_encountered: bool,
    pub current_time: Option<u64>,
    pub render_size: Option<u64>,
    pub lambdas_invoked: u32,
    pub frames_rendered: Option<u64>,
    pub costs: CostsInfo,
}

impl RenderProgress {
    /// Whether further polling can change the outcome.
    pub fn is_terminal(&self) -> bool {
        self.done || self.fatal_error_encountered
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderStillResponse {
    #[serde(rename = "output")]
    pub url: String,
    #[serde(rename = "size")]
    pub size_in_bytes: u64,
    pub bucket_name: String,
    pub render_id: String,
    #[serde(default)]
    pub estimated_price: CostsInfo,
    #[serde(default)]
    pub out_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("render function returned an empty response")]
    Empty,

    #[error("{error_type}: {message}")]
    FunctionFailed {
        error_type: String,
        message: String,
        stack: Vec<String>,
    },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes a render function reply, surfacing both the Lambda runtime's
/// error envelope and the renderer's own `{"type": "error"}` envelope.
pub fn parse_function_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, ResponseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ResponseError::Empty);
    }

    let value: Value = serde_json::from_slice(body)?;

    if let Some(message) = value.get("errorMessage").and_then(Value::as_str) {
        return Err(ResponseError::FunctionFailed {
            error_type: value
                .get("errorType")
                .and_then(Value::as_str)
                .unwrap_or("Error")
                .to_string(),
            message: message.to_string(),
            stack: string_lines(value.get("trace")),
        });
    }

    if value.get("type").and_then(Value::as_str) == Some("error") {
        return Err(ResponseError::FunctionFailed {
            error_type: "Error".to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
            stack: value
                .get("stack")
                .and_then(Value::as_str)
                .map(|stack| stack.lines().map(str::to_string).collect())
                .unwrap_or_default(),
        });
    }

    Ok(serde_json::from_value(value)?)
}

fn string_lines(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

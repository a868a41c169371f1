use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::input_props::SerializedInputProps;

/// Version the deployed render function must be running. The function rejects
/// payloads whose version does not match its own.
pub const LAMBDA_PROTOCOL_VERSION: &str = "4.0.0";
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_TIMEOUT_IN_MILLISECONDS: u64 = 30_000;
pub const MIN_FRAMES_PER_LAMBDA: u32 = 4;

pub type EnvVariables = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LambdaRoutine {
    Start,
    Status,
    Still,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Privacy {
    #[default]
    Public,
    Private,
    NoAcl,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    H264,
    H265,
    Vp8,
    Vp9,
    Mp3,
    Aac,
    Wav,
    Gif,
    Prores,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoImageFormat {
    #[default]
    Jpeg,
    Png,
    None,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StillImageFormat {
    #[default]
    Png,
    Jpeg,
    Pdf,
    Webp,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Verbose,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeleteAfter {
    #[serde(rename = "1-day")]
    OneDay,
    #[serde(rename = "3-days")]
    ThreeDays,
    #[serde(rename = "7-days")]
    SevenDays,
    #[serde(rename = "30-days")]
    ThirtyDays,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DownloadBehavior {
    #[default]
    PlayInBrowser,
    Download {
        #[serde(rename = "fileName")]
        file_name: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChromiumOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_certificate_errors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_security: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub url: String,
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
}

/// Inclusive frame range. A single frame is expressed as `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl Serialize for FrameRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.start == self.end {
            serializer.serialize_u32(self.start)
        } else {
            [self.start, self.end].serialize(serializer)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub composition: String,
    pub data: Value,
    pub codec: Codec,
    pub image_format: VideoImageFormat,
    pub crf: Option<u32>,
    pub env_variables: EnvVariables,
    pub pixel_format: Option<String>,
    pub pro_res_profile: Option<String>,
    pub x264_preset: Option<String>,
    pub jpeg_quality: u8,
    pub max_retries: u32,
    pub privacy: Privacy,
    pub log_level: LogLevel,
    pub frame_range: Option<FrameRange>,
    pub out_name: Option<String>,
    pub timeout_in_milliseconds: u64,
    pub chromium_options: ChromiumOptions,
    pub scale: f64,
    pub every_nth_frame: u32,
    pub number_of_gif_loops: Option<u32>,
    pub concurrency_per_lambda: u32,
    pub download_behavior: DownloadBehavior,
    pub muted: bool,
    pub overwrite: bool,
    pub audio_bitrate: Option<String>,
    pub video_bitrate: Option<String>,
    pub webhook: Option<Webhook>,
    pub force_width: Option<u32>,
    pub force_height: Option<u32>,
    pub audio_codec: Option<String>,
    pub renderer_function_name: Option<String>,
    pub frames_per_lambda: Option<u32>,
    pub bucket_name: Option<String>,
    pub delete_after: Option<DeleteAfter>,
    pub color_space: String,
}

impl RenderParams {
    pub fn new(composition: impl Into<String>) -> Self {
        Self {
            composition: composition.into(),
            data: Value::Object(Map::new()),
            codec: Codec::default(),
            image_format: VideoImageFormat::default(),
            crf: None,
            env_variables: EnvVariables::new(),
            pixel_format: None,
            pro_res_profile: None,
            x264_preset: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_retries: DEFAULT_MAX_RETRIES,
            privacy: Privacy::default(),
            log_level: LogLevel::default(),
            frame_range: None,
            out_name: None,
            timeout_in_milliseconds: DEFAULT_TIMEOUT_IN_MILLISECONDS,
            chromium_options: ChromiumOptions::default(),
            scale: 1.0,
            every_nth_frame: 1,
            number_of_gif_loops: None,
            concurrency_per_lambda: 1,
            download_behavior: DownloadBehavior::default(),
            muted: false,
            overwrite: false,
            audio_bitrate: None,
            video_bitrate: None,
            webhook: None,
            force_width: None,
            force_height: None,
            audio_codec: None,
            renderer_function_name: None,
            frames_per_lambda: None,
            bucket_name: None,
            delete_after: None,
            color_space: "default".to_string(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStillParams {
    pub composition: String,
    pub data: Value,
    pub image_format: StillImageFormat,
    pub privacy: Privacy,
    pub env_variables: EnvVariables,
    pub jpeg_quality: u8,
    pub max_retries: u32,
    pub frame: u32,
    pub log_level: LogLevel,
    pub out_name: Option<String>,
    pub timeout_in_milliseconds: u64,
    pub chromium_options: ChromiumOptions,
    pub scale: f64,
    pub download_behavior: DownloadBehavior,
    pub force_width: Option<u32>,
    pub force_height: Option<u32>,
    pub bucket_name: Option<String>,
    pub delete_after: Option<DeleteAfter>,
}

impl RenderStillParams {
    pub fn new(composition: impl Into<String>) -> Self {
        Self {
            composition: composition.into(),
            data: Value::Object(Map::new()),
            image_format: StillImageFormat::default(),
            privacy: Privacy::default(),
            env_variables: EnvVariables::new(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_retries: DEFAULT_MAX_RETRIES,
            frame: 0,
            log_level: LogLevel::default(),
            out_name: None,
            timeout_in_milliseconds: DEFAULT_TIMEOUT_IN_MILLISECONDS,
            chromium_options: ChromiumOptions::default(),
            scale: 1.0,
            download_behavior: DownloadBehavior::default(),
            force_width: None,
            force_height: None,
            bucket_name: None,
            delete_after: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderProgressParams {
    pub render_id: String,
    pub bucket_name: String,
    /// Overrides the client's function name for this call.
    pub function_name: Option<String>,
    /// Overrides the client's region for this call.
    pub region: Option<String>,
    pub log_level: LogLevel,
}

impl RenderProgressParams {
    pub fn new(render_id: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            render_id: render_id.into(),
            bucket_name: bucket_name.into(),
            function_name: None,
            region: None,
            log_level: LogLevel::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    #[serde(rename = "type")]
    pub routine: LambdaRoutine,
    pub version: String,
    pub serve_url: String,
    pub composition: String,
    pub input_props: SerializedInputProps,
    pub codec: Codec,
    pub image_format: VideoImageFormat,
    pub crf: Option<u32>,
    pub env_variables: EnvVariables,
    pub pixel_format: Option<String>,
    pub pro_res_profile: Option<String>,
    pub x264_preset: Option<String>,
    pub jpeg_quality: u8,
    pub max_retries: u32,
    pub privacy: Privacy,
    pub log_level: LogLevel,
    pub frame_range: Option<FrameRange>,
    pub out_name: Option<String>,
    pub timeout_in_milliseconds: u64,
    pub chromium_options: ChromiumOptions,
    pub scale: f64,
    pub every_nth_frame: u32,
    pub number_of_gif_loops: Option<u32>,
    pub concurrency_per_lambda: u32,
    pub download_behavior: DownloadBehavior,
    pub muted: bool,
    pub overwrite: bool,
    pub audio_bitrate: Option<String>,
    pub video_bitrate: Option<String>,
    pub webhook: Option<Webhook>,
    pub force_width: Option<u32>,
    pub force_height: Option<u32>,
    pub audio_codec: Option<String>,
    pub renderer_function_name: Option<String>,
    pub frames_per_lambda: Option<u32>,
    pub bucket_name: Option<String>,
    pub delete_after: Option<DeleteAfter>,
    pub color_space: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StillPayload {
    #[serde(rename = "type")]
    pub routine: LambdaRoutine,
    pub version: String,
    pub serve_url: String,
    pub composition: String,
    pub input_props: SerializedInputProps,
    pub image_format: StillImageFormat,
    pub privacy: Privacy,
    pub env_variables: EnvVariables,
    pub jpeg_quality: u8,
    pub max_retries: u32,
    pub frame: u32,
    pub attempt: u32,
    pub log_level: LogLevel,
    pub out_name: Option<String>,
    pub timeout_in_milliseconds: u64,
    pub chromium_options: ChromiumOptions,
    pub scale: f64,
    pub download_behavior: DownloadBehavior,
    pub force_width: Option<u32>,
    pub force_height: Option<u32>,
    pub bucket_name: Option<String>,
    pub delete_after: Option<DeleteAfter>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    #[serde(rename = "type")]
    pub routine: LambdaRoutine,
    pub version: String,
    pub render_id: String,
    pub bucket_name: String,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn validate_render_params(
    serve_url: &str,
    params: &RenderParams,
) -> Result<(), ValidationError> {
    validate_common(serve_url, &params.composition, params.jpeg_quality, params.scale)?;

    if params.every_nth_frame == 0 {
        return Err(ValidationError::new(
            "every_nth_frame must be a positive integer",
        ));
    }

    if let Some(frames_per_lambda) = params.frames_per_lambda {
        if frames_per_lambda < MIN_FRAMES_PER_LAMBDA {
            return Err(ValidationError::new(format!(
                "frames_per_lambda must be at least {MIN_FRAMES_PER_LAMBDA}, got {frames_per_lambda}"
            )));
        }
    }

    if let Some(range) = params.frame_range {
        if range.start > range.end {
            return Err(ValidationError::new(format!(
                "frame_range start {} must not exceed end {}",
                range.start, range.end
            )));
        }
    }

    if let Some(webhook) = &params.webhook {
        if webhook.url.trim().is_empty() {
            return Err(ValidationError::new("webhook url cannot be empty"));
        }
    }

    Ok(())
}

pub fn validate_still_params(
    serve_url: &str,
    params: &RenderStillParams,
) -> Result<(), ValidationError> {
    validate_common(serve_url, &params.composition, params.jpeg_quality, params.scale)
}

pub fn validate_progress_params(params: &RenderProgressParams) -> Result<(), ValidationError> {
    if params.render_id.trim().is_empty() {
        return Err(ValidationError::new("render_id cannot be empty"));
    }
    if params.bucket_name.trim().is_empty() {
        return Err(ValidationError::new("bucket_name cannot be empty"));
    }
    Ok(())
}

fn validate_common(
    serve_url: &str,
    composition: &str,
    jpeg_quality: u8,
    scale: f64,
) -> Result<(), ValidationError> {
    if serve_url.trim().is_empty() {
        return Err(ValidationError::new("serve_url cannot be empty"));
    }
    if composition.trim().is_empty() {
        return Err(ValidationError::new("composition cannot be empty"));
    }
    if jpeg_quality > 100 {
        return Err(ValidationError::new(format!(
            "jpeg_quality must be between 0 and 100, got {jpeg_quality}"
        )));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ValidationError::new(format!(
            "scale must be a positive number, got {scale}"
        )));
    }
    Ok(())
}

pub fn build_start_payload(
    serve_url: &str,
    params: &RenderParams,
    input_props: SerializedInputProps,
) -> StartPayload {
    StartPayload {
        routine: LambdaRoutine::Start,
        version: LAMBDA_PROTOCOL_VERSION.to_string(),
        serve_url: serve_url.to_string(),
        composition: params.composition.clone(),
        input_props,
        codec: params.codec,
        image_format: params.image_format,
        crf: params.crf,
        env_variables: params.env_variables.clone(),
        pixel_format: params.pixel_format.clone(),
        pro_res_profile: params.pro_res_profile.clone(),
        x264_preset: params.x264_preset.clone(),
        jpeg_quality: params.jpeg_quality,
        max_retries: params.max_retries,
        privacy: params.privacy,
        log_level: params.log_level,
        frame_range: params.frame_range,
        out_name: params.out_name.clone(),
        timeout_in_milliseconds: params.timeout_in_milliseconds,
        chromium_options: params.chromium_options.clone(),
        scale: params.scale,
        every_nth_frame: params.every_nth_frame,
        number_of_gif_loops: params.number_of_gif_loops,
        concurrency_per_lambda: params.concurrency_per_lambda,
        download_behavior: params.download_behavior.clone(),
        muted: params.muted,
        overwrite: params.overwrite,
        audio_bitrate: params.audio_bitrate.clone(),
        video_bitrate: params.video_bitrate.clone(),
        webhook: params.webhook.clone(),
        force_width: params.force_width,
        force_height: params.force_height,
        audio_codec: params.audio_codec.clone(),
        renderer_function_name: params.renderer_function_name.clone(),
        frames_per_lambda: params.frames_per_lambda,
        bucket_name: params.bucket_name.clone(),
        delete_after: params.delete_after,
        color_space: params.color_space.clone(),
    }
}

pub fn build_still_payload(
    serve_url: &str,
    params: &RenderStillParams,
    input_props: SerializedInputProps,
) -> StillPayload {
    StillPayload {
        routine: LambdaRoutine::Still,
        version: LAMBDA_PROTOCOL_VERSION.to_string(),
        serve_url: serve_url.to_string(),
        composition: params.composition.clone(),
        input_props,
        image_format: params.image_format,
        privacy: params.privacy,
        env_variables: params.env_variables.clone(),
        jpeg_quality: params.jpeg_quality,
        max_retries: params.max_retries,
        frame: params.frame,
        attempt: 1,
        log_level: params.log_level,
        out_name: params.out_name.clone(),
        timeout_in_milliseconds: params.timeout_in_milliseconds,
        chromium_options: params.chromium_options.clone(),
        scale: params.scale,
        download_behavior: params.download_behavior.clone(),
        force_width: params.force_width,
        force_height: params.force_height,
        bucket_name: params.bucket_name.clone(),
        delete_after: params.delete_after,
    }
}

pub fn build_status_payload(params: &RenderProgressParams) -> StatusPayload {
    StatusPayload {
        routine: LambdaRoutine::Status,
        version: LAMBDA_PROTOCOL_VERSION.to_string(),
        render_id: params.render_id.clone(),
        bucket_name: params.bucket_name.clone(),
        log_level: params.log_level,
    }
}

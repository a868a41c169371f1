use remotion_lambda_core::contract::{
    build_start_payload, build_status_payload, build_still_payload, validate_progress_params,
    validate_render_params, validate_still_params, RenderParams, RenderProgressParams,
    RenderStillParams,
};
use remotion_lambda_core::input_props::{
    plan_input_props, InputPropsPlan, RenderKind, SerializedInputProps,
};
use remotion_lambda_core::response::{
    parse_function_response, RenderProgress, RenderResponse, RenderStillResponse, ResponseError,
};
use remotion_lambda_core::storage_keys::REMOTION_BUCKET_PREFIX;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::adapters::invoke::{AwsLambdaInvoker, FunctionInvoker};
use crate::adapters::object_store::{PropsStore, S3PropsStore};
use crate::error::{ClientError, ClientResult};

pub type AwsRemotionClient = RemotionClient<AwsLambdaInvoker, S3PropsStore>;

/// Blocking client bound to one deployed render function and site.
pub struct RemotionClient<I, S> {
    region: String,
    serve_url: String,
    function_name: String,
    invoker: I,
    props_store: S,
}

impl AwsRemotionClient {
    /// Resolves AWS credentials from the default provider chain, pinned to
    /// `region`.
    pub async fn from_aws_config(
        region: impl Into<String>,
        serve_url: impl Into<String>,
        function_name: impl Into<String>,
    ) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;

        Self::new(
            region,
            serve_url,
            function_name,
            AwsLambdaInvoker::new(sdk_config.clone()),
            S3PropsStore::new(sdk_config),
        )
    }
}

impl<I: FunctionInvoker, S: PropsStore> RemotionClient<I, S> {
    pub fn new(
        region: impl Into<String>,
        serve_url: impl Into<String>,
        function_name: impl Into<String>,
        invoker: I,
        props_store: S,
    ) -> Self {
        Self {
            region: region.into(),
            serve_url: serve_url.into(),
            function_name: function_name.into(),
            invoker,
            props_store,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn serve_url(&self) -> &str {
        &self.serve_url
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn props_store(&self) -> &S {
        &self.props_store
    }

    /// Starts a media render and returns as soon as the function has accepted it.
    pub fn render_media_on_lambda(&self, params: &RenderParams) -> ClientResult<RenderResponse> {
        validate_render_params(&self.serve_url, params)?;
        let input_props = self.resolve_input_props(
            &params.data,
            RenderKind::Media,
            params.bucket_name.as_deref(),
        )?;
        let payload = build_start_payload(&self.serve_url, params, input_props);

        info!(
            function_name = %self.function_name,
            region = %self.region,
            composition = %params.composition,
            "submitting render"
        );
        let response: RenderResponse =
            self.call_function(&self.region, &self.function_name, &payload)?;
        info!(
            render_id = %response.render_id,
            bucket_name = %response.bucket_name,
            "render accepted"
        );
        Ok(response)
    }

    /// Renders a single frame. Unlike media renders this waits for the image.
    pub fn render_still_on_lambda(
        &self,
        params: &RenderStillParams,
    ) -> ClientResult<RenderStillResponse> {
        validate_still_params(&self.serve_url, params)?;
        let input_props = self.resolve_input_props(
            &params.data,
            RenderKind::Still,
            params.bucket_name.as_deref(),
        )?;
        let payload = build_still_payload(&self.serve_url, params, input_props);

        info!(
            function_name = %self.function_name,
            composition = %params.composition,
            frame = params.frame,
            "rendering still"
        );
        let response: RenderStillResponse =
            self.call_function(&self.region, &self.function_name, &payload)?;
        info!(
            render_id = %response.render_id,
            url = %response.url,
            size_in_bytes = response.size_in_bytes,
            "still rendered"
        );
        Ok(response)
    }

    pub fn get_render_progress(&self, params: &RenderProgressParams) -> ClientResult<RenderProgress> {
        validate_progress_params(params)?;
        let region = params.region.as_deref().unwrap_or(&self.region);
        let function_name = params
            .function_name
            .as_deref()
            .unwrap_or(&self.function_name);
        let payload = build_status_payload(params);

        let progress: RenderProgress = self.call_function(region, function_name, &payload)?;
        debug!(
            render_id = %params.render_id,
            overall_progress = progress.overall_progress,
            done = progress.done,
            "render progress"
        );
        Ok(progress)
    }

    fn resolve_input_props(
        &self,
        data: &Value,
        kind: RenderKind,
        bucket_name: Option<&str>,
    ) -> ClientResult<SerializedInputProps> {
        match plan_input_props(data, kind)? {
            InputPropsPlan::Inline(props) => Ok(props),
            InputPropsPlan::Upload(upload) => {
                let bucket = match bucket_name {
                    Some(name) => name.to_string(),
                    None => self.find_renders_bucket()?,
                };
                warn!(
                    bucket = %bucket,
                    object_key = %upload.object_key,
                    size_in_bytes = upload.body.len(),
                    "input props exceed inline limit, uploading to s3"
                );
                self.props_store
                    .write_object(
                        &self.region,
                        &bucket,
                        &upload.object_key,
                        upload.body.as_bytes(),
                    )
                    .map_err(ClientError::Storage)?;
                Ok(upload.into_reference(bucket))
            }
        }
    }

    fn find_renders_bucket(&self) -> ClientResult<String> {
        let mut buckets = self
            .props_store
            .find_remotion_buckets(&self.region)
            .map_err(ClientError::BucketLookup)?;

        match buckets.len() {
            0 => Err(ClientError::BucketLookup(format!(
                "no bucket starting with {REMOTION_BUCKET_PREFIX} exists in {}",
                self.region
            ))),
            1 => Ok(buckets.remove(0)),
            _ => Err(ClientError::BucketLookup(format!(
                "multiple buckets starting with {REMOTION_BUCKET_PREFIX} exist in {}: {}; set bucket_name explicitly",
                self.region,
                buckets.join(", ")
            ))),
        }
    }

    fn call_function<T: DeserializeOwned>(
        &self,
        region: &str,
        function_name: &str,
        payload: &impl Serialize,
    ) -> ClientResult<T> {
        let body = serde_json::to_vec(payload)?;
        debug!(function_name, payload_bytes = body.len(), "invoking function");

        let output = self
            .invoker
            .invoke_sync(region, function_name, &body)
            .map_err(|message| ClientError::Invocation {
                function_name: function_name.to_string(),
                message,
            })?;

        if !(200..300).contains(&output.status_code) && output.function_error.is_none() {
            return Err(ClientError::Invocation {
                function_name: function_name.to_string(),
                message: format!("unexpected status code {}", output.status_code),
            });
        }

        if let Some(function_error) = output.function_error {
            return Err(match parse_function_response::<Value>(&output.payload) {
                Err(error @ ResponseError::FunctionFailed { .. }) => {
                    ClientError::from_response(function_name, error)
                }
                _ => ClientError::FunctionFailed {
                    function_name: function_name.to_string(),
                    error_type: function_error,
                    message: String::from_utf8_lossy(&output.payload).into_owned(),
                    stack: Vec::new(),
                },
            });
        }

        parse_function_response(&output.payload)
            .map_err(|error| ClientError::from_response(function_name, error))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use remotion_lambda_core::input_props::MAX_INLINE_MEDIA_PROPS_BYTES;
    use remotion_lambda_core::storage_keys::is_remotion_bucket;
    use serde_json::json;

    use super::*;
    use crate::adapters::invoke::InvocationOutput;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        region: String,
        function_name: String,
        payload: Value,
    }

    struct ScriptedInvoker {
        replies: Mutex<VecDeque<Result<InvocationOutput, String>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedInvoker {
        fn replying(replies: Vec<Result<InvocationOutput, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().expect("poisoned mutex").clone()
        }
    }

    impl FunctionInvoker for ScriptedInvoker {
        fn invoke_sync(
            &self,
            region: &str,
            function_name: &str,
            payload: &[u8],
        ) -> Result<InvocationOutput, String> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push(RecordedCall {
                    region: region.to_string(),
                    function_name: function_name.to_string(),
                    payload: serde_json::from_slice(payload).expect("payload should be json"),
                });
            self.replies
                .lock()
                .expect("poisoned mutex")
                .pop_front()
                .expect("unexpected invocation")
        }
    }

    struct RecordingStore {
        buckets: Vec<String>,
        writes: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    impl RecordingStore {
        fn with_buckets(buckets: &[&str]) -> Self {
            Self {
                buckets: buckets.iter().map(|name| name.to_string()).collect(),
                writes: Mutex::new(Vec::new()),
            }
        }

        fn writes(&self) -> Vec<(String, String, Vec<u8>)> {
            self.writes.lock().expect("poisoned mutex").clone()
        }
    }

    impl PropsStore for RecordingStore {
        fn find_remotion_buckets(&self, _region: &str) -> Result<Vec<String>, String> {
            Ok(self
                .buckets
                .iter()
                .filter(|name| is_remotion_bucket(name))
                .cloned()
                .collect())
        }

        fn write_object(
            &self,
            _region: &str,
            bucket: &str,
            key: &str,
            body: &[u8],
        ) -> Result<(), String> {
            self.writes.lock().expect("poisoned mutex").push((
                bucket.to_string(),
                key.to_string(),
                body.to_vec(),
            ));
            Ok(())
        }
    }

    fn ok_reply(body: Value) -> Result<InvocationOutput, String> {
        Ok(InvocationOutput {
            status_code: 200,
            function_error: None,
            payload: body.to_string().into_bytes(),
        })
    }

    fn client_with(
        replies: Vec<Result<InvocationOutput, String>>,
        buckets: &[&str],
    ) -> RemotionClient<ScriptedInvoker, RecordingStore> {
        RemotionClient::new(
            "eu-central-1",
            "https://remotionlambda-abc.s3.eu-central-1.amazonaws.com/sites/demo/index.html",
            "remotion-render-fn",
            ScriptedInvoker::replying(replies),
            RecordingStore::with_buckets(buckets),
        )
    }

    #[test]
    fn render_sends_start_payload_with_inline_props() {
        let client = client_with(
            vec![ok_reply(json!({"renderId": "r1", "bucketName": "remotionlambda-b"}))],
            &[],
        );

        let params = RenderParams::new("main").with_data(json!({"hi": "there"}));
        let response = client
            .render_media_on_lambda(&params)
            .expect("render should succeed");

        assert_eq!(response.render_id, "r1");
        assert_eq!(response.bucket_name, "remotionlambda-b");

        let calls = client.invoker().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].region, "eu-central-1");
        assert_eq!(calls[0].function_name, "remotion-render-fn");
        assert_eq!(calls[0].payload["type"], "start");
        assert_eq!(calls[0].payload["composition"], "main");
        assert_eq!(
            calls[0].payload["inputProps"],
            json!({"type": "payload", "payload": "{\"hi\":\"there\"}"})
        );
        assert!(client.props_store().writes().is_empty());
    }

    #[test]
    fn invalid_render_is_rejected_before_invoking() {
        let client = client_with(Vec::new(), &[]);
        let error = client
            .render_media_on_lambda(&RenderParams::new(""))
            .expect_err("empty composition should fail");

        assert!(matches!(error, ClientError::Validation(_)));
        assert!(client.invoker().calls().is_empty());
    }

    #[test]
    fn large_props_are_uploaded_to_the_regional_bucket() {
        let client = client_with(
            vec![ok_reply(json!({"renderId": "r2", "bucketName": "remotionlambda-euc1"}))],
            &["unrelated-bucket", "remotionlambda-euc1"],
        );
        let blob = "x".repeat(MAX_INLINE_MEDIA_PROPS_BYTES);
        let params = RenderParams::new("main").with_data(json!({ "blob": blob }));

        client
            .render_media_on_lambda(&params)
            .expect("render should succeed");

        let writes = client.props_store().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "remotionlambda-euc1");
        assert!(writes[0].1.starts_with("input-props/"));

        let input_props = &client.invoker().calls()[0].payload["inputProps"];
        assert_eq!(input_props["type"], "bucket-url");
        assert_eq!(input_props["bucketName"], "remotionlambda-euc1");
    }

    #[test]
    fn upload_fails_when_bucket_is_ambiguous() {
        let client = client_with(
            Vec::new(),
            &["remotionlambda-one", "remotionlambda-two"],
        );
        let blob = "x".repeat(MAX_INLINE_MEDIA_PROPS_BYTES);
        let params = RenderParams::new("main").with_data(json!({ "blob": blob }));

        let error = client
            .render_media_on_lambda(&params)
            .expect_err("ambiguous bucket should fail");
        assert!(matches!(error, ClientError::BucketLookup(_)));
        assert!(error.to_string().contains("remotionlambda-one, remotionlambda-two"));
        assert!(client.invoker().calls().is_empty());
    }

    #[test]
    fn explicit_bucket_skips_lookup() {
        let client = client_with(
            vec![ok_reply(json!({"renderId": "r3", "bucketName": "chosen"}))],
            &[],
        );
        let blob = "x".repeat(MAX_INLINE_MEDIA_PROPS_BYTES);
        let mut params = RenderParams::new("main").with_data(json!({ "blob": blob }));
        params.bucket_name = Some("chosen".to_string());

        client
            .render_media_on_lambda(&params)
            .expect("render should succeed");
        assert_eq!(client.props_store().writes()[0].0, "chosen");
    }

    #[test]
    fn progress_honours_per_call_overrides() {
        let client = client_with(
            vec![ok_reply(json!({"overallProgress": 0.5, "chunks": 4}))],
            &[],
        );
        let mut params = RenderProgressParams::new("r1", "remotionlambda-b");
        params.region = Some("us-east-1".to_string());
        params.function_name = Some("other-fn".to_string());

        let progress = client
            .get_render_progress(&params)
            .expect("progress should succeed");
        assert_eq!(progress.overall_progress, 0.5);

        let calls = client.invoker().calls();
        assert_eq!(calls[0].region, "us-east-1");
        assert_eq!(calls[0].function_name, "other-fn");
        assert_eq!(calls[0].payload["type"], "status");
        assert_eq!(calls[0].payload["renderId"], "r1");
        assert_eq!(calls[0].payload["bucketName"], "remotionlambda-b");
    }

    #[test]
    fn unhandled_function_error_is_surfaced() {
        let client = client_with(
            vec![Ok(InvocationOutput {
                status_code: 200,
                function_error: Some("Unhandled".to_string()),
                payload: json!({
                    "errorType": "Error",
                    "errorMessage": "Version mismatch: expected 4.0.0",
                    "trace": ["Error: Version mismatch", "    at startHandler (index.js:10:5)"]
                })
                .to_string()
                .into_bytes(),
            })],
            &[],
        );

        let error = client
            .render_media_on_lambda(&RenderParams::new("main"))
            .expect_err("function error should fail");
        match error {
            ClientError::FunctionFailed {
                function_name,
                message,
                stack,
                ..
            } => {
                assert_eq!(function_name, "remotion-render-fn");
                assert!(message.contains("Version mismatch"));
                assert_eq!(
                    stack,
                    vec![
                        "Error: Version mismatch".to_string(),
                        "    at startHandler (index.js:10:5)".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn function_error_without_envelope_keeps_raw_body() {
        let client = client_with(
            vec![Ok(InvocationOutput {
                status_code: 200,
                function_error: Some("Unhandled".to_string()),
                payload: b"Task timed out".to_vec(),
            })],
            &[],
        );

        let error = client
            .get_render_progress(&RenderProgressParams::new("r1", "b"))
            .expect_err("function error should fail");
        match error {
            ClientError::FunctionFailed {
                error_type,
                message,
                ..
            } => {
                assert_eq!(error_type, "Unhandled");
                assert_eq!(message, "Task timed out");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_success_status_maps_to_invocation_error() {
        let client = client_with(
            vec![Ok(InvocationOutput {
                status_code: 429,
                function_error: None,
                payload: Vec::new(),
            })],
            &[],
        );

        let error = client
            .get_render_progress(&RenderProgressParams::new("r1", "b"))
            .expect_err("throttled invocation should fail");
        assert!(matches!(error, ClientError::Invocation { .. }));
        assert!(error.to_string().contains("unexpected status code 429"));
    }

    #[test]
    fn bucket_lookup_ignores_foreign_buckets() {
        let client = client_with(Vec::new(), &["unrelated-bucket", "my-remotionlambda-copy"]);
        let blob = "x".repeat(MAX_INLINE_MEDIA_PROPS_BYTES);
        let params = RenderParams::new("main").with_data(json!({ "blob": blob }));

        let error = client
            .render_media_on_lambda(&params)
            .expect_err("no remotion bucket should fail");
        assert!(error.to_string().contains("no bucket starting with remotionlambda-"));
    }

    #[test]
    fn transport_failure_maps_to_invocation_error() {
        let client = client_with(vec![Err("connection reset".to_string())], &[]);
        let error = client
            .get_render_progress(&RenderProgressParams::new("r1", "b"))
            .expect_err("transport failure should fail");
        assert!(matches!(error, ClientError::Invocation { .. }));
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn still_render_returns_output_url() {
        let client = client_with(
            vec![ok_reply(json!({
                "output": "https://example.com/out.png",
                "size": 2048,
                "bucketName": "remotionlambda-b",
                "renderId": "s1"
            }))],
            &[],
        );

        let response = client
            .render_still_on_lambda(&RenderStillParams::new("thumbnail"))
            .expect("still should succeed");
        assert_eq!(response.url, "https://example.com/out.png");
        assert_eq!(client.invoker().calls()[0].payload["type"], "still");
    }
}

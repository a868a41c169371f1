use aws_sdk_lambda::config::Region;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutput {
    pub status_code: i32,
    /// Set by Lambda when the handler threw (`Unhandled`) or returned an error.
    pub function_error: Option<String>,
    pub payload: Vec<u8>,
}

pub trait FunctionInvoker {
    fn invoke_sync(
        &self,
        region: &str,
        function_name: &str,
        payload: &[u8],
    ) -> Result<InvocationOutput, String>;
}

/// Invokes the render function with `RequestResponse` semantics and waits
/// for its reply. Must be called from a multi-threaded Tokio runtime.
pub struct AwsLambdaInvoker {
    sdk_config: aws_config::SdkConfig,
}

impl AwsLambdaInvoker {
    pub fn new(sdk_config: aws_config::SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client_for(&self, region: &str) -> aws_sdk_lambda::Client {
        let config = aws_sdk_lambda::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_lambda::Client::from_conf(config)
    }
}

impl FunctionInvoker for AwsLambdaInvoker {
    fn invoke_sync(
        &self,
        region: &str,
        function_name: &str,
        payload: &[u8],
    ) -> Result<InvocationOutput, String> {
        let client = self.client_for(region);
        let function_name = function_name.to_string();
        let request_payload = payload.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .invoke()
                    .function_name(function_name)
                    .invocation_type(InvocationType::RequestResponse)
                    .payload(Blob::new(request_payload))
                    .send()
                    .await
                    .map_err(|error| format!("lambda invoke request failed: {error}"))?;

                Ok(InvocationOutput {
                    status_code: output.status_code(),
                    function_error: output.function_error().map(str::to_string),
                    payload: output
                        .payload()
                        .map(|blob| blob.as_ref().to_vec())
                        .unwrap_or_default(),
                })
            })
        })
    }
}

use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use remotion_lambda_core::storage_keys::is_remotion_bucket;

pub trait PropsStore {
    /// Names of Remotion-owned buckets located in `region`.
    fn find_remotion_buckets(&self, region: &str) -> Result<Vec<String>, String>;

    fn write_object(&self, region: &str, bucket: &str, key: &str, body: &[u8])
        -> Result<(), String>;
}

pub struct S3PropsStore {
    sdk_config: aws_config::SdkConfig,
}

impl S3PropsStore {
    pub fn new(sdk_config: aws_config::SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client_for(&self, region: &str) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}

impl PropsStore for S3PropsStore {
    fn find_remotion_buckets(&self, region: &str) -> Result<Vec<String>, String> {
        let client = self.client_for(region);
        let region = region.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let listing = client
                    .list_buckets()
                    .send()
                    .await
                    .map_err(|error| format!("failed to list s3 buckets: {error}"))?;

                let mut matches = Vec::new();
                for bucket in listing.buckets() {
                    let Some(name) = bucket.name() else {
                        continue;
                    };
                    if !is_remotion_bucket(name) {
                        continue;
                    }

                    let location = client
                        .get_bucket_location()
                        .bucket(name)
                        .send()
                        .await
                        .map_err(|error| {
                            format!("failed to read location of bucket {name}: {error}")
                        })?;
                    // Buckets in us-east-1 report an empty location constraint.
                    let bucket_region = location
                        .location_constraint()
                        .map(|constraint| constraint.as_str().to_string())
                        .filter(|constraint| !constraint.is_empty())
                        .unwrap_or_else(|| "us-east-1".to_string());
                    if bucket_region == region {
                        matches.push(name.to_string());
                    }
                }
                Ok(matches)
            })
        })
    }

    fn write_object(
        &self,
        region: &str,
        bucket: &str,
        key: &str,
        body: &[u8],
    ) -> Result<(), String> {
        let client = self.client_for(region);
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .content_type("application/json")
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}

/// Bucket names created by the deploy tooling start with this prefix.
pub const REMOTION_BUCKET_PREFIX: &str = "remotionlambda-";

const INPUT_PROPS_PREFIX: &str = "input-props";

pub fn input_props_object_key(hash: &str) -> String {
    format!("{INPUT_PROPS_PREFIX}/{hash}.json")
}

pub fn is_remotion_bucket(bucket_name: &str) -> bool {
    bucket_name.starts_with(REMOTION_BUCKET_PREFIX)
}

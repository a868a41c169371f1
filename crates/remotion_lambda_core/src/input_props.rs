use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::storage_keys::input_props_object_key;

/// Headroom left in the invocation payload for the rest of the request.
const PAYLOAD_MARGIN_BYTES: usize = 5_000 + 7_000;
pub const MAX_INLINE_MEDIA_PROPS_BYTES: usize = 200_000 - PAYLOAD_MARGIN_BYTES;
pub const MAX_INLINE_STILL_PROPS_BYTES: usize = 5_000_000 - PAYLOAD_MARGIN_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Media,
    Still,
}

impl RenderKind {
    pub fn inline_limit(self) -> usize {
        match self {
            Self::Media => MAX_INLINE_MEDIA_PROPS_BYTES,
            Self::Still => MAX_INLINE_STILL_PROPS_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SerializedInputProps {
    Payload {
        payload: String,
    },
    BucketUrl {
        hash: String,
        #[serde(rename = "bucketName")]
        bucket_name: String,
    },
}

/// Props too large to travel inside the invocation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub hash: String,
    pub object_key: String,
    pub body: String,
}

impl PendingUpload {
    pub fn into_reference(self, bucket_name: impl Into<String>) -> SerializedInputProps {
        SerializedInputProps::BucketUrl {
            hash: self.hash,
            bucket_name: bucket_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPropsPlan {
    Inline(SerializedInputProps),
    Upload(PendingUpload),
}

pub fn plan_input_props(
    data: &Value,
    kind: RenderKind,
) -> Result<InputPropsPlan, serde_json::Error> {
    let serialized = serde_json::to_string(data)?;
    if serialized.len() < kind.inline_limit() {
        return Ok(InputPropsPlan::Inline(SerializedInputProps::Payload {
            payload: serialized,
        }));
    }

    let hash = props_hash(&serialized);
    Ok(InputPropsPlan::Upload(PendingUpload {
        object_key: input_props_object_key(&hash),
        hash,
        body: serialized,
    }))
}

pub fn props_hash(serialized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use remotion_lambda_client::adapters::invoke::{FunctionInvoker, InvocationOutput};
use remotion_lambda_client::adapters::object_store::PropsStore;
use remotion_lambda_client::RemotionClient;
use serde_json::Value;

pub const REGION: &str = "eu-central-1";
pub const FUNCTION_NAME: &str = "remotion-render-4-0-0-mem2048mb-disk2048mb-120sec";
pub const SERVE_URL: &str =
    "https://remotionlambda-eucentral1-abc.s3.eu-central-1.amazonaws.com/sites/demo/index.html";

/// Replays canned function replies in order and records every request body.
#[derive(Default)]
pub struct ReplayInvoker {
    replies: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<Value>>,
}

impl ReplayInvoker {
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("poisoned mutex").clone()
    }

    pub fn routines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl FunctionInvoker for ReplayInvoker {
    fn invoke_sync(
        &self,
        _region: &str,
        _function_name: &str,
        payload: &[u8],
    ) -> Result<InvocationOutput, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(serde_json::from_slice(payload).expect("request should be json"));
        let reply = self
            .replies
            .lock()
            .expect("poisoned mutex")
            .pop_front()
            .ok_or_else(|| "no scripted reply left".to_string())?;
        Ok(InvocationOutput {
            status_code: 200,
            function_error: None,
            payload: reply.to_string().into_bytes(),
        })
    }
}

pub struct NoBuckets;

impl PropsStore for NoBuckets {
    fn find_remotion_buckets(&self, _region: &str) -> Result<Vec<String>, String> {
        Ok(Vec::new())
    }

    fn write_object(
        &self,
        _region: &str,
        _bucket: &str,
        _key: &str,
        _body: &[u8],
    ) -> Result<(), String> {
        Err("uploads are not expected in this test".to_string())
    }
}

pub fn replay_client(replies: Vec<Value>) -> RemotionClient<ReplayInvoker, NoBuckets> {
    RemotionClient::new(
        REGION,
        SERVE_URL,
        FUNCTION_NAME,
        ReplayInvoker::new(replies),
        NoBuckets,
    )
}

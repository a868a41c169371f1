//! End-to-end check against a deployed render function: start one render,
//! then ask for its progress.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use remotion_lambda_core::contract::{RenderParams, RenderProgressParams};
use remotion_lambda_core::response::{RenderProgress, RenderResponse};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::adapters::invoke::FunctionInvoker;
use crate::adapters::object_store::PropsStore;
use crate::client::RemotionClient;

pub const DEFAULT_COMPOSITION: &str = "main";

#[derive(Debug, Clone, PartialEq)]
pub struct SmokeOptions {
    pub composition: String,
    pub input_props: Value,
    /// Keep asking for progress until the render finishes or fails.
    pub poll: bool,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for SmokeOptions {
    fn default() -> Self {
        Self {
            composition: DEFAULT_COMPOSITION.to_string(),
            input_props: json!({"hi": "there"}),
            poll: false,
            poll_interval: Duration::from_millis(1_000),
            max_polls: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmokeReport {
    pub render: RenderResponse,
    pub progress: RenderProgress,
    pub progress_requests: u32,
}

pub fn run_smoke<I: FunctionInvoker, S: PropsStore>(
    client: &RemotionClient<I, S>,
    options: &SmokeOptions,
    out: &mut impl Write,
) -> anyhow::Result<SmokeReport> {
    let params = RenderParams::new(options.composition.clone()).with_data(options.input_props.clone());

    writeln!(out, "\n")?;
    let render = client
        .render_media_on_lambda(&params)
        .context("render request failed")?;
    writeln!(out, "{}", render.render_id)?;
    writeln!(out, "{}", render.bucket_name)?;
    writeln!(out, "\n")?;

    let progress_params = RenderProgressParams::new(&render.render_id, &render.bucket_name);
    let mut progress_requests = 0u32;
    let progress = loop {
        let progress = client
            .get_render_progress(&progress_params)
            .context("progress request failed")?;
        if progress_requests == 0 {
            writeln!(out, "Overall progress")?;
        }
        progress_requests += 1;
        writeln!(out, "{}", format_progress(progress.overall_progress))?;

        if !options.poll || progress.is_terminal() {
            break progress;
        }
        if progress_requests >= options.max_polls {
            warn!(
                render_id = %render.render_id,
                polls = progress_requests,
                "render still running after max polls"
            );
            break progress;
        }
        std::thread::sleep(options.poll_interval);
    };
    writeln!(out, "\n")?;

    if progress.fatal_error_encountered {
        let messages: Vec<&str> = progress
            .errors
            .iter()
            .map(|error| error.message.as_str())
            .collect();
        bail!(
            "render {} failed: {}",
            render.render_id,
            messages.join("; ")
        );
    }

    if let Some(output_file) = &progress.output_file {
        info!(render_id = %render.render_id, output_file = %output_file, "render finished");
    }

    Ok(SmokeReport {
        render,
        progress,
        progress_requests,
    })
}

/// Always keeps the fractional part, so a fresh render prints `0.0`, not `0`.
fn format_progress(value: f64) -> String {
    format!("{value:?}")
}

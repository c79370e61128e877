use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::common::PipelineStage;

const PREVIEW_CHARS: usize = 200;

/// Observability record for one LLM call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub stage: PipelineStage,
    pub model: String,
    pub prompt_preview: String,
    pub latency: Duration,
    pub response_chars: usize,
    pub succeeded: bool,
}

impl TraceRecord {
    pub fn new(
        stage: PipelineStage,
        model: &str,
        prompt: &str,
        latency: Duration,
        response: &str
    ) -> Self {
        Self {
            stage,
            model: model.to_string(),
            prompt_preview: prompt.chars().take(PREVIEW_CHARS).collect(),
            latency,
            response_chars: response.chars().count(),
            succeeded: !response.is_empty(),
        }
    }
}

/// Fire-and-forget destination for trace records. `record` must neither
/// block nor fail.
pub trait TraceSink: Send + Sync {
    fn record(&self, trace: TraceRecord);
}

/// Writes traces as debug log lines
#[derive(Debug, Default, Clone)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn record(&self, trace: TraceRecord) {
        debug!(
            "trace stage={} model={} latency={}ms response_chars={} ok={} prompt={:?}",
            trace.stage,
            trace.model,
            trace.latency.as_millis(),
            trace.response_chars,
            trace.succeeded,
            trace.prompt_preview
        );
    }
}

/// Forwards traces over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelTraceSink {
    sender: mpsc::UnboundedSender<TraceRecord>,
}

impl ChannelTraceSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TraceRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TraceSink for ChannelTraceSink {
    fn record(&self, trace: TraceRecord) {
        // A dropped receiver just means nobody is listening
        let _ = self.sender.send(trace);
    }
}

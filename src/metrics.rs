use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing what the pipeline has done since startup.
#[derive(Default)]
pub struct PipelineMetrics {
    pages_loaded: AtomicU64,
    chunks_indexed: AtomicU64,
    queries_answered: AtomicU64,
    queries_failed: AtomicU64,
    tool_calls: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly built index and the page/chunk counts that went into it.
    pub fn record_index_build(&self, pages: u64, chunks: u64) {
        self.pages_loaded.fetch_add(pages, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunks, Ordering::Relaxed);
    }

    /// Record the outcome of one query through the crew.
    pub fn record_query(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.queries_answered
        } else {
            &self.queries_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a single search tool invocation made by an agent.
    pub fn record_tool_call(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_loaded: self.pages_loaded.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            queries_answered: self.queries_answered.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            tool_calls: self.tool_calls.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// PDF pages ingested by index builds in this process.
    pub pages_loaded: u64,
    /// Chunks embedded and persisted by index builds in this process.
    pub chunks_indexed: u64,
    /// Queries that produced a final answer.
    pub queries_answered: u64,
    /// Queries that ended in an error.
    pub queries_failed: u64,
    /// Search tool invocations issued by the research stage.
    pub tool_calls: u64,
}

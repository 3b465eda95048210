use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decode::parser::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2;
/// Largest accepted `maxDepth`; worker stacks are sized for it.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// Number of worker threads a [`WorkerPool`](crate::WorkerPool) starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "PoolSizeRepr", into = "PoolSizeRepr")]
pub enum PoolSize {
    /// One thread per available CPU.
    #[default]
    Unbounded,
    Threads(NonZeroUsize),
}

impl PoolSize {
    pub fn threads(count: usize) -> Result<Self> {
        NonZeroUsize::new(count)
            .map(PoolSize::Threads)
            .ok_or_else(|| Error::invalid_config("workerPoolSize must be positive"))
    }
}

impl fmt::Display for PoolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolSize::Unbounded => f.write_str("unbounded"),
            PoolSize::Threads(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PoolSizeRepr {
    Threads(usize),
    Named(String),
}

impl TryFrom<PoolSizeRepr> for PoolSize {
    type Error = String;

    fn try_from(repr: PoolSizeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PoolSizeRepr::Threads(count) => NonZeroUsize::new(count)
                .map(PoolSize::Threads)
                .ok_or_else(|| "workerPoolSize must be positive".to_string()),
            PoolSizeRepr::Named(name) if name == "unbounded" => Ok(PoolSize::Unbounded),
            PoolSizeRepr::Named(name) => Err(format!(
                "workerPoolSize must be a positive integer or \"unbounded\", got {name:?}"
            )),
        }
    }
}

impl From<PoolSize> for PoolSizeRepr {
    fn from(size: PoolSize) -> Self {
        match size {
            PoolSize::Unbounded => PoolSizeRepr::Named("unbounded".to_string()),
            PoolSize::Threads(n) => PoolSizeRepr::Threads(n.get()),
        }
    }
}

/// Tuning for a [`Codec`](crate::Codec). None of these settings change the
/// produced text, only how the work is split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CodecConfig {
    /// Sequence elements or record fields handled per task.
    pub batch_size: usize,
    pub worker_pool_size: PoolSize,
    /// Composites with fewer children than this are walked on the current task.
    pub parallel_threshold: usize,
    /// Deepest array/object nesting accepted when parsing, encoding and
    /// decoding.
    pub max_depth: usize,
    /// Deadline applied to every call that does not pass its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            worker_pool_size: PoolSize::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout_ms: None,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_worker_pool_size(mut self, worker_pool_size: PoolSize) -> Self {
        self.worker_pool_size = worker_pool_size;
        self
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid_config("batchSize must be positive"));
        }
        if self.parallel_threshold == 0 {
            return Err(Error::invalid_config("parallelThreshold must be positive"));
        }
        if self.max_depth == 0 {
            return Err(Error::invalid_config("maxDepth must be positive"));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(Error::invalid_config(format!(
                "maxDepth must be at most {MAX_DEPTH_LIMIT}"
            )));
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::invalid_config("timeoutMs must be positive"));
        }
        Ok(())
    }

    /// Loads a configuration from JSON; missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: CodecConfig =
            serde_json::from_str(text).map_err(|err| Error::invalid_config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

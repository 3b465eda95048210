use std::any::type_name;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::decode::{decode_node, parse_with_depth};
use crate::descriptor::{describe, Describe, Reflect, TypeDescriptor};
use crate::encode::encode_root;
use crate::options::CodecConfig;
use crate::parallel::{CancelToken, Context, Scope, WorkerPool};
use crate::value::Value;
use crate::{Error, Result};

/// A configuration bound to a worker pool.
///
/// Cloning is cheap and clones share the pool.
///
/// ```
/// use reflect_json::{reflect_record, Codec, CodecConfig};
///
/// #[derive(Debug, PartialEq)]
/// struct Item {
///     id: u32,
///     tags: Vec<String>,
/// }
///
/// reflect_record!(Item { id: u32, tags: Vec<String> });
///
/// let codec = Codec::new(CodecConfig::new().with_batch_size(16))?;
/// let item: Item = codec.decode(r#"{"id": 7, "tags": ["a", "b"]}"#)?;
/// assert_eq!(codec.encode(&item)?, r#"{"id":7,"tags":["a","b"]}"#);
/// # Ok::<(), reflect_json::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    config: CodecConfig,
    pool: WorkerPool,
}

impl Codec {
    /// Validates `config` and starts a pool sized by its `worker_pool_size`.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.worker_pool_size)?;
        Ok(Self { config, pool })
    }

    /// Uses an existing pool; `config.worker_pool_size` is ignored.
    pub fn with_pool(config: CodecConfig, pool: WorkerPool) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn encode<T: Describe>(&self, value: &T) -> Result<String> {
        self.encode_scoped(value, &self.scope(self.config.timeout()))
    }

    /// Encodes against an explicitly supplied descriptor.
    pub fn encode_with(&self, value: &dyn Reflect, descriptor: &TypeDescriptor) -> Result<String> {
        let scope = self.scope(self.config.timeout());
        self.run("encode", descriptor.kind_name(), &scope, |ctx| {
            encode_root(ctx, value, descriptor)
        })
    }

    pub fn encode_timeout<T: Describe>(&self, value: &T, timeout: Duration) -> Result<String> {
        self.encode_scoped(value, &self.scope(Some(timeout)))
    }

    /// Parses `text`, then rebuilds a `T`. Parse errors surface before any
    /// reconstruction starts.
    pub fn decode<T: Describe>(&self, text: &str) -> Result<T> {
        self.decode_scoped(text, &self.scope(self.config.timeout()))
    }

    pub fn decode_value<T: Describe>(&self, value: &Value) -> Result<T> {
        self.decode_value_scoped(value, &self.scope(self.config.timeout()))
    }

    pub fn decode_timeout<T: Describe>(&self, text: &str, timeout: Duration) -> Result<T> {
        self.decode_scoped(text, &self.scope(Some(timeout)))
    }

    /// Encodes on the pool without blocking the caller.
    pub fn spawn_encode<T: Describe>(&self, value: T) -> Pending<String> {
        let scope = self.scope(self.config.timeout());
        let codec = self.clone();
        self.spawn(scope, move |scope| codec.encode_scoped(&value, scope))
    }

    /// Decodes on the pool without blocking the caller.
    pub fn spawn_decode<T: Describe>(&self, text: impl Into<String>) -> Pending<T> {
        let text = text.into();
        let scope = self.scope(self.config.timeout());
        let codec = self.clone();
        self.spawn(scope, move |scope| codec.decode_scoped::<T>(&text, scope))
    }

    fn scope(&self, timeout: Option<Duration>) -> Scope {
        Scope::new(CancelToken::new(), timeout)
    }

    fn spawn<R, F>(&self, scope: Scope, job: F) -> Pending<R>
    where
        R: Send + 'static,
        F: FnOnce(&Scope) -> Result<R> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let token = scope.token().clone();
        self.pool.spawn(move || {
            // a dropped handle no longer listens
            let _ = sender.send(job(&scope));
        });
        Pending { receiver, token }
    }

    fn encode_scoped<T: Describe>(&self, value: &T, scope: &Scope) -> Result<String> {
        let descriptor = describe::<T>()?;
        self.run("encode", type_name::<T>(), scope, |ctx| {
            encode_root(ctx, value, descriptor)
        })
    }

    fn decode_scoped<T: Describe>(&self, text: &str, scope: &Scope) -> Result<T> {
        tracing::debug!(bytes = text.len(), max_depth = self.config.max_depth, "parsing input");
        let value = parse_with_depth(text, self.config.max_depth)?;
        self.decode_value_scoped(&value, scope)
    }

    fn decode_value_scoped<T: Describe>(&self, value: &Value, scope: &Scope) -> Result<T> {
        let descriptor = describe::<T>()?;
        let erased = self.run("decode", type_name::<T>(), scope, |ctx| {
            decode_node(ctx, value, descriptor)
        })?;
        T::from_erased(erased)
    }

    fn run<R, F>(&self, op: &'static str, target_type: &str, scope: &Scope, body: F) -> Result<R>
    where
        R: Send,
        F: FnOnce(&Context<'_>) -> Result<R> + Send,
    {
        let ctx = Context::new(&self.config, scope);
        let started = Instant::now();
        tracing::debug!(op, target_type, "root call started");
        let result = self.pool.install(|| body(&ctx));
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => tracing::debug!(op, target_type, ?elapsed, "root call finished"),
            Err(err) if err.is_interrupted() => {
                tracing::warn!(op, target_type, ?elapsed, error = %err, "root call interrupted")
            }
            Err(err) => tracing::debug!(op, target_type, ?elapsed, error = %err, "root call failed"),
        }
        result
    }
}

/// Handle to a call running on a worker pool. Dropping it cancels the call.
#[derive(Debug)]
pub struct Pending<T> {
    receiver: mpsc::Receiver<Result<T>>,
    token: CancelToken,
}

impl<T> Pending<T> {
    /// Blocks until the call finishes.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().unwrap_or_else(|_| Err(Error::cancelled()))
    }

    /// Returns the result if the call has finished. The result is handed
    /// out once; later calls report `Cancelled`.
    pub fn try_wait(&mut self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(Error::cancelled())),
        }
    }

    /// Asks the call to stop; it fails with `Cancelled` at its next node.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

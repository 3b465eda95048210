//! Worker pool, cancellation scope and ordered fan-out helpers.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::decode::parser::DEFAULT_MAX_DEPTH;
use crate::options::{
    CodecConfig, PoolSize, DEFAULT_BATCH_SIZE, DEFAULT_PARALLEL_THRESHOLD, MAX_DEPTH_LIMIT,
};
use crate::{Error, Result};

/// Stack reserved per worker thread: enough for a walk `MAX_DEPTH_LIMIT`
/// levels deep in an unoptimized build.
pub const WORKER_STACK_SIZE: usize = (1 << 20) + MAX_DEPTH_LIMIT * (64 << 10);

/// Caller-owned pool of worker threads. Clones share the same threads, so one
/// pool can back several codecs.
#[derive(Clone)]
pub struct WorkerPool {
    #[cfg(feature = "parallel")]
    inner: Arc<rayon::ThreadPool>,
    threads: usize,
}

impl WorkerPool {
    #[cfg(feature = "parallel")]
    pub fn new(size: PoolSize) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|idx| format!("reflect-json-{idx}"))
            .stack_size(WORKER_STACK_SIZE);
        if let PoolSize::Threads(count) = size {
            builder = builder.num_threads(count.get());
        }
        let pool = builder
            .build()
            .map_err(|err| Error::invalid_config(format!("worker pool failed to start: {err}")))?;
        let threads = pool.current_num_threads();
        tracing::debug!(threads, %size, stack_size = WORKER_STACK_SIZE, "worker pool started");
        Ok(Self {
            inner: Arc::new(pool),
            threads,
        })
    }

    #[cfg(not(feature = "parallel"))]
    pub fn new(size: PoolSize) -> Result<Self> {
        tracing::debug!(%size, "parallel feature disabled; running on the calling thread");
        Ok(Self { threads: 1 })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `op` inside the pool so nested fan-outs use its threads.
    #[cfg(feature = "parallel")]
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.inner.install(op)
    }

    #[cfg(not(feature = "parallel"))]
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        op()
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.spawn(job);
    }

    #[cfg(not(feature = "parallel"))]
    pub(crate) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // on failure the job is dropped and its handle reports `Cancelled`
        if let Err(err) = std::thread::Builder::new()
            .name("reflect-json-spawn".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(job)
        {
            tracing::warn!(error = %err, "worker thread failed to start");
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

/// Shared flag that stops every node of a call once set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cancellation token plus optional deadline for one root call.
#[derive(Debug, Clone)]
pub struct Scope {
    token: CancelToken,
    deadline: Option<(Instant, Duration)>,
}

impl Scope {
    pub fn new(token: CancelToken, timeout: Option<Duration>) -> Self {
        Self {
            token,
            deadline: timeout.map(|limit| (Instant::now() + limit, limit)),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(CancelToken::new(), None)
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Fails once the call has been cancelled or its deadline has passed.
    pub fn checkpoint(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::cancelled());
        }
        if let Some((deadline, limit)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::timeout(limit));
            }
        }
        Ok(())
    }
}

/// Per-call traversal settings shared by every node of one encode or decode.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
pub(crate) struct Context<'a> {
    batch_size: usize,
    parallel_threshold: usize,
    max_depth: usize,
    depth: usize,
    scope: &'a Scope,
    parallel: bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(config: &CodecConfig, scope: &'a Scope) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            parallel_threshold: config.parallel_threshold,
            max_depth: config.max_depth,
            depth: 0,
            scope,
            parallel: true,
        }
    }

    /// Walks every node on the calling thread.
    pub(crate) fn sequential(scope: &'a Scope) -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            scope,
            parallel: false,
        }
    }

    pub(crate) fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub(crate) fn checkpoint(&self) -> Result<()> {
        self.scope.checkpoint()
    }

    /// Context for the children of a sequence or record. Counts nesting the
    /// same way the parser does, so both accept the same values.
    pub(crate) fn descend(&self) -> Result<Context<'a>> {
        if self.depth >= self.max_depth {
            return Err(Error::depth_limit(self.max_depth));
        }
        Ok(Context {
            depth: self.depth + 1,
            ..*self
        })
    }

    #[cfg(feature = "parallel")]
    fn fans_out(&self, children: usize) -> bool {
        self.parallel && children >= self.parallel_threshold
    }

    /// Maps `func` over consecutive chunks of `items`, one task per chunk.
    /// `func` gets the index of the chunk's first item. Results come back in
    /// chunk order regardless of completion order.
    pub(crate) fn map_chunks<T, R, F>(&self, items: &[T], chunk: usize, func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &[T]) -> Result<R> + Sync + Send,
    {
        let chunk = chunk.max(1);
        #[cfg(feature = "parallel")]
        {
            if self.fans_out(items.len()) {
                return items
                    .par_chunks(chunk)
                    .enumerate()
                    .map(|(idx, batch)| func(idx * chunk, batch))
                    .collect();
            }
        }
        items
            .chunks(chunk)
            .enumerate()
            .map(|(idx, batch)| func(idx * chunk, batch))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[rstest::rstest]
    fn test_scope_cancel() {
        let scope = Scope::unbounded();
        assert!(scope.checkpoint().is_ok());
        scope.token().cancel();
        assert_eq!(scope.checkpoint().unwrap_err().into_kind(), ErrorKind::Cancelled);
    }

    #[rstest::rstest]
    fn test_scope_deadline() {
        let scope = Scope::new(CancelToken::new(), Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(scope.checkpoint().unwrap_err().is_timeout());
    }

    #[rstest::rstest]
    #[case(1)]
    #[case(3)]
    #[case(100)]
    fn test_map_chunks_keeps_order(#[case] chunk: usize) {
        let pool = WorkerPool::new(PoolSize::threads(4).unwrap()).unwrap();
        let scope = Scope::unbounded();
        let config = CodecConfig::new();
        let ctx = Context::new(&config, &scope);
        let items: Vec<usize> = (0..50).collect();
        let chunks = pool
            .install(|| ctx.map_chunks(&items, chunk, |start, batch| Ok((start, batch.to_vec()))))
            .unwrap();
        let flattened: Vec<usize> = chunks.iter().flat_map(|(_, b)| b.clone()).collect();
        assert_eq!(flattened, items);
        for (start, batch) in chunks {
            assert_eq!(batch[0], start);
        }
    }

    #[rstest::rstest]
    fn test_map_chunks_surfaces_error() {
        let scope = Scope::unbounded();
        let ctx = Context::sequential(&scope);
        let items = [1, 2, 3];
        let result: Result<Vec<i32>> = ctx.map_chunks(&items, 1, |idx, batch| {
            if batch[0] == 2 {
                Err(Error::missing_field("two").at_index(idx))
            } else {
                Ok(batch[0])
            }
        });
        assert_eq!(result.unwrap_err().to_string(), "missing required field `two` at $[1]");
    }

    #[rstest::rstest]
    fn test_descend_stops_at_max_depth() {
        let scope = Scope::unbounded();
        let config = CodecConfig::new().with_max_depth(2);
        let root = Context::new(&config, &scope);
        let second = root.descend().unwrap().descend().unwrap();
        assert_eq!(
            second.descend().unwrap_err().into_kind(),
            ErrorKind::DepthLimitExceeded { limit: 2 }
        );
    }

    #[rstest::rstest]
    fn test_pool_thread_count() {
        let pool = WorkerPool::new(PoolSize::threads(3).unwrap()).unwrap();
        #[cfg(feature = "parallel")]
        assert_eq!(pool.threads(), 3);
        #[cfg(not(feature = "parallel"))]
        assert_eq!(pool.threads(), 1);
    }
}

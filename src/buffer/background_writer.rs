//! Background maintenance of a shared buffer pool.
//!
//! Two periodic workers, each taking the pool's lock for the duration of
//! one pass:
//! - the **checkpointer** flushes every dirty page
//! - the **background writer** flushes at most `max_dirty_pages` of them

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use crate::buffer::BufferPoolManager;
use crate::common::config::WriterConfig;
use crate::common::{Error, Result};
use crate::storage::{PageFileStore, PageStore};

/// A buffer pool behind the single lock all of its users share.
pub type SharedBufferPool<S = PageFileStore> = Arc<Mutex<BufferPoolManager<S>>>;

/// Wrap a pool for sharing with a [`BackgroundWriter`].
pub fn shared<S: PageStore>(pool: BufferPoolManager<S>) -> SharedBufferPool<S> {
    Arc::new(Mutex::new(pool))
}

/// Stop flag the workers sleep on.
#[derive(Debug, Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    wakeup: Condvar,
}

impl Shutdown {
    /// Sleep for `period` or until shutdown. Returns `true` on shutdown.
    fn wait(&self, period: Duration) -> bool {
        let deadline = Instant::now() + period;
        let mut stopped = self.stopped.lock();
        // A wakeup without the flag set is spurious; sleep out the rest.
        while !*stopped {
            if self.wakeup.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn trigger(&self) {
        *self.stopped.lock() = true;
        self.wakeup.notify_all();
    }
}

/// Handle to the running checkpointer and background writer threads.
///
/// Dropping the handle stops both workers and joins them.
///
/// # Example
/// ```no_run
/// use slotdb::buffer::{shared, BackgroundWriter};
/// use slotdb::{BufferPoolConfig, BufferPoolManager, WriterConfig};
///
/// let pool = shared(BufferPoolManager::open(&BufferPoolConfig::default(), "t.heap")?);
/// let writer = BackgroundWriter::start(pool.clone(), WriterConfig::default())?;
/// // ... use `pool.lock()` as usual ...
/// writer.shutdown();
/// # Ok::<(), slotdb::Error>(())
/// ```
#[derive(Debug)]
pub struct BackgroundWriter {
    shutdown: Arc<Shutdown>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundWriter {
    /// Spawn both workers over `pool`.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` for a zero interval or batch size
    /// - `Error::Io` if a thread cannot be spawned
    pub fn start<S>(pool: SharedBufferPool<S>, config: WriterConfig) -> Result<Self>
    where
        S: PageStore + Send + 'static,
    {
        if config.checkpoint_interval.is_zero() || config.writer_interval.is_zero() {
            return Err(Error::InvalidArgument("writer intervals must be non-zero".into()));
        }
        if config.max_dirty_pages == 0 {
            return Err(Error::InvalidArgument("max_dirty_pages must be > 0".into()));
        }

        let mut writer = Self {
            shutdown: Arc::new(Shutdown::default()),
            handles: Vec::with_capacity(2),
        };

        writer.spawn(
            "slotdb-checkpointer",
            Arc::clone(&pool),
            config.checkpoint_interval,
            |bpm: &mut BufferPoolManager<S>| {
                let dirty = bpm.dirty_pages().len();
                bpm.flush_all_pages().map(|_| dirty)
            },
        )?;

        let batch = config.max_dirty_pages;
        writer.spawn(
            "slotdb-bgwriter",
            pool,
            config.writer_interval,
            move |bpm: &mut BufferPoolManager<S>| bpm.flush_dirty_batch(batch),
        )?;

        info!(
            "background writer started (checkpoint every {:?}, batch of {} every {:?})",
            config.checkpoint_interval, config.max_dirty_pages, config.writer_interval
        );
        Ok(writer)
    }

    fn spawn<S, F>(
        &mut self,
        name: &'static str,
        pool: SharedBufferPool<S>,
        period: Duration,
        pass: F,
    ) -> Result<()>
    where
        S: PageStore + Send + 'static,
        F: Fn(&mut BufferPoolManager<S>) -> Result<usize> + Send + 'static,
    {
        let shutdown = Arc::clone(&self.shutdown);
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            while !shutdown.wait(period) {
                let mut bpm = pool.lock();
                match pass(&mut *bpm) {
                    Ok(0) => {}
                    Ok(written) => debug!("{}: flushed {} pages", name, written),
                    // The pool stays usable; the next pass retries what is still dirty.
                    Err(e) => warn!("{}: flush failed: {}", name, e),
                }
            }
        });

        match handle {
            Ok(handle) => {
                self.handles.push(handle);
                Ok(())
            }
            Err(e) => {
                self.stop();
                Err(e.into())
            }
        }
    }

    /// Stop both workers and wait for them to finish their current pass.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.shutdown.trigger();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("background writer thread panicked");
            }
        }
        info!("background writer stopped");
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        self.stop();
    }
}

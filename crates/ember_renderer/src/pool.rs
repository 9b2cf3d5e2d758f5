//! Fixed-size worker pool with future-style result handles.
//!
//! An explicit pool instance is constructed once and passed by reference to
//! whoever submits work; there is no process-wide singleton. Dropping the
//! pool is the only teardown path: it stops the workers and joins every
//! thread, and a dropped pool cannot be restarted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,
    stopping: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    work_available: Condvar,
    idle: AtomicUsize,
}

/// A fixed-size pool of worker threads consuming a shared task queue.
pub struct TaskPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// Spawn a pool with one worker per hardware thread (at least one).
    pub fn with_default_size() -> Self {
        Self::new(num_cpus::get().max(1))
    }

    /// Spawn a pool with exactly `size` workers (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                stopping: false,
            }),
            work_available: Condvar::new(),
            idle: AtomicUsize::new(size),
        });

        let workers = (0..size)
            .map(|id| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("ember-worker-{id}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        log::debug!("task pool started with {} workers", size);
        TaskPool { shared, workers }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Workers currently waiting for work.
    pub fn idle_workers(&self) -> usize {
        self.shared.idle.load(Ordering::Relaxed)
    }

    /// Enqueue a task and return a handle for its result. Never blocks the
    /// caller; the closure runs on some worker thread.
    pub fn commit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let handle_state = Arc::new(HandleState {
            result: Mutex::new(None),
            ready: Condvar::new(),
        });

        let completion = Arc::clone(&handle_state);
        let job: Job = Box::new(move || {
            let value = task();
            *completion.result.lock().expect("poisoned result lock") = Some(value);
            completion.ready.notify_all();
        });

        {
            let mut state = self.shared.state.lock().expect("poisoned pool lock");
            state.queue.push_back(job);
        }
        self.shared.work_available.notify_one();

        TaskHandle { state: handle_state }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("poisoned pool lock");
            state.stopping = true;
        }
        self.shared.work_available.notify_all();
        for worker in self.workers.drain(..) {
            worker.join().expect("worker thread panicked");
        }
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let job = {
            let mut state = shared.state.lock().expect("poisoned pool lock");
            loop {
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }
                if state.stopping {
                    return;
                }
                state = shared
                    .work_available
                    .wait(state)
                    .expect("poisoned pool lock");
            }
        };

        shared.idle.fetch_sub(1, Ordering::Relaxed);
        job();
        shared.idle.fetch_add(1, Ordering::Relaxed);
    }
}

struct HandleState<T> {
    result: Mutex<Option<T>>,
    ready: Condvar,
}

/// Deferred result of a committed task.
pub struct TaskHandle<T> {
    state: Arc<HandleState<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes and take its result.
    pub fn wait(self) -> T {
        let mut result = self.state.result.lock().expect("poisoned result lock");
        while result.is_none() {
            result = self
                .state
                .ready
                .wait(result)
                .expect("poisoned result lock");
        }
        result.take().expect("result checked above")
    }

    /// True once the result is available.
    pub fn is_ready(&self) -> bool {
        self.state
            .result
            .lock()
            .expect("poisoned result lock")
            .is_some()
    }
}

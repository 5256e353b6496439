//! Confinement of backend mutation to one designated execution context.
//!
//! [`Gate`] is what callers use: `run` executes in place when already on the
//! context and otherwise queues the task and returns, `run_and_wait` blocks
//! the caller until the task has finished there. Nothing here is specific to
//! audio; UI code clearing a text pane uses the same primitive.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle, ThreadId},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::{AudioError, Result};

/// Unit of work shipped to the designated context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A single execution context that processes one task to completion before
/// the next, in submission order per submitting thread.
pub trait ExecutionContext: Send + Sync {
    /// Whether the calling thread is the designated context.
    fn is_current(&self) -> bool;

    /// Queues `task` for later execution. Fails once the context shut down.
    fn submit(&self, task: Task) -> Result<()>;
}

/// Cloneable handle over an [`ExecutionContext`].
#[derive(Clone)]
pub struct Gate {
    context: Arc<dyn ExecutionContext>,
}

impl Gate {
    pub fn new(context: Arc<dyn ExecutionContext>) -> Self {
        Self { context }
    }

    /// Gate whose every caller counts as the designated context.
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineContext))
    }

    pub fn is_current(&self) -> bool {
        self.context.is_current()
    }

    /// Runs `op` now if on the context, otherwise schedules it and returns.
    pub fn run<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.context.is_current() {
            op();
            Ok(())
        } else {
            self.context.submit(Box::new(op))
        }
    }

    /// Runs `op` on the context and blocks until it has completed.
    pub fn run_and_wait<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.context.is_current() {
            return Ok(op());
        }
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.context.submit(Box::new(move || {
            let _ = done_tx.send(op());
        }))?;
        done_rx
            .recv()
            .map_err(|_| AudioError::ContextClosed("task dropped before completing"))
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate").finish_non_exhaustive()
    }
}

/// Synchronous stand-in: every thread is "on" the context.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn is_current(&self) -> bool {
        true
    }

    fn submit(&self, task: Task) -> Result<()> {
        task();
        Ok(())
    }
}

enum Message {
    Run(Task),
    Shutdown,
}

/// Dedicated worker thread acting as the designated context.
pub struct ContextThread {
    sender: Sender<Message>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ContextThread {
    pub fn spawn(name: &str) -> Result<Arc<Self>> {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || context_loop(receiver))?;
        let thread_id = handle.thread().id();
        tracing::info!(name, "execution context started");

        Ok(Arc::new(Self {
            sender,
            thread_id,
            handle: Mutex::new(Some(handle)),
        }))
    }

    /// Stops accepting work after everything already queued has run, then
    /// joins the thread. Called from the context itself it only signals.
    pub fn shutdown(&self) {
        let handle = {
            let mut slot = self.handle.lock();
            let Some(handle) = slot.take() else {
                return;
            };
            let _ = self.sender.send(Message::Shutdown);
            handle
        };
        if thread::current().id() != self.thread_id {
            let _ = handle.join();
        }
    }
}

impl ExecutionContext for ContextThread {
    fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn submit(&self, task: Task) -> Result<()> {
        // Held across the send so no task can be queued behind `Shutdown`.
        let slot = self.handle.lock();
        if slot.is_none() {
            return Err(AudioError::ContextClosed("context thread shut down"));
        }
        self.sender
            .send(Message::Run(task))
            .map_err(|_| AudioError::ContextClosed("context thread exited"))
    }
}

impl Drop for ContextThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn context_loop(receiver: Receiver<Message>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Shutdown => break,
            Message::Run(task) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(%reason, "task panicked on execution context");
                }
            }
        }
    }
    tracing::debug!("execution context stopped");
}

//! # Command dispatcher.
//!
//! Accepts commands, runs each one as its own tokio task and reports every
//! lifecycle transition as a `TaskStatusChanged` event.
//!
//! ## Lifecycle
//! ```text
//! dispatch(cmd) ──► id = next_id++ ──► publish queued ──► spawn ──► return id
//!
//! spawned task:
//!   ├─► acquire permit (optional, cancellable)
//!   ├─► publish running
//!   ├─► run_once(cmd, ctx, timeout)
//!   └─► publish succeeded{output} | failed{reason}
//! ```
//!
//! ## Rules
//! - Ids are assigned in dispatch order, starting at 1.
//! - Per task the statuses are exactly `queued → running → succeeded|failed`;
//!   a transition the state machine rejects is logged and never published.
//! - Cancellation (explicit, `cancel_all`, or a `ClosingWorkspace` event) ends a
//!   task `failed` with reason `Cancelled`, including tasks still waiting for a
//!   permit, which still pass through `running`.
//! - Finished task records are kept for [`Dispatcher::status`] and
//!   [`Dispatcher::wait`]. Only the newest `Config::keep_finished` survive
//!   each dispatch; [`Dispatcher::prune`] drops them all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::runner::run_once;
use crate::commands::{CommandContext, CommandRef, TaskId, TaskSnapshot, TaskStatus};
use crate::config::Config;
use crate::error::TaskError;
use crate::events::{Broker, Event, EventKind};
use crate::services::Service;
use crate::subscribers::Subscribe;

/// Execution record of one task.
struct TaskRecord {
    id: TaskId,
    command: Arc<str>,
    token: CancellationToken,
    state: watch::Sender<TaskSnapshot>,
}

impl TaskRecord {
    fn status(&self) -> TaskStatus {
        self.state.borrow().status
    }

    /// Moves to `next` and publishes the transition; `false` if the move is illegal.
    fn advance(
        &self,
        broker: &Broker,
        next: TaskStatus,
        output: Option<Arc<str>>,
        reason: Option<Arc<str>>,
    ) -> bool {
        let (out, why) = (output.clone(), reason.clone());
        let moved = self.state.send_if_modified(move |snap| {
            if !snap.status.can_transition(next) {
                return false;
            }
            snap.status = next;
            snap.output = out;
            snap.reason = why;
            true
        });
        if !moved {
            warn!(task = %self.id, status = %self.status(), next = %next, "illegal task transition");
            return false;
        }

        debug!(task = %self.id, command = %self.command, status = %next, "task transition");
        let mut ev = Event::task_status(self.id, next).with_command(Arc::clone(&self.command));
        if let Some(output) = output {
            ev = ev.with_output(output);
        }
        if let Some(reason) = reason {
            ev = ev.with_reason(reason);
        }
        broker.publish(ev);
        true
    }

    fn finish(&self, broker: &Broker, res: Result<Option<String>, TaskError>) {
        match res {
            Ok(output) => {
                self.advance(broker, TaskStatus::Succeeded, output.map(Arc::from), None);
            }
            Err(err) => {
                if err.is_cancelled() {
                    info!(task = %self.id, command = %self.command, "task cancelled");
                } else {
                    warn!(task = %self.id, command = %self.command, error = %err, "task failed");
                }
                let reason: Arc<str> = Arc::from(err.to_string());
                self.advance(broker, TaskStatus::Failed, None, Some(reason));
            }
        }
    }
}

/// Asynchronous command executor.
///
/// Also a [`Service`] (`"command-dispatcher"`): its initialization subscribes
/// the `ClosingWorkspace` listener that cancels outstanding tasks.
pub struct Dispatcher {
    broker: Arc<Broker>,
    runtime_token: CancellationToken,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TaskId, Arc<TaskRecord>>>,
    keep_finished: usize,
    semaphore: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
    closer: Arc<CloseListener>,
    listening: AtomicBool,
}

impl Dispatcher {
    /// Service name of the dispatcher.
    pub const SERVICE_NAME: &'static str = "command-dispatcher";

    /// Creates a dispatcher publishing through `broker`.
    pub fn new(broker: Arc<Broker>, cfg: &Config) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            broker,
            runtime_token: CancellationToken::new(),
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
            keep_finished: cfg.keep_finished,
            semaphore: cfg.concurrency_limit().map(|n| Arc::new(Semaphore::new(n))),
            timeout: cfg.default_timeout(),
            closer: Arc::new(CloseListener {
                dispatcher: me.clone(),
            }),
            listening: AtomicBool::new(false),
        })
    }

    /// True once this dispatcher's `ClosingWorkspace` listener is subscribed.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TaskId, Arc<TaskRecord>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, id: TaskId) -> Option<Arc<TaskRecord>> {
        self.tasks().get(&id).cloned()
    }

    /// Enqueues `command` and returns its task id without waiting for it.
    ///
    /// The `queued` event is published before this returns.
    pub fn dispatch(&self, command: CommandRef) -> TaskId {
        let id = TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let kind: Arc<str> = Arc::from(command.kind());
        let (state, _) = watch::channel(TaskSnapshot::queued(id, Arc::clone(&kind)));
        let record = Arc::new(TaskRecord {
            id,
            command: kind,
            token: self.runtime_token.child_token(),
            state,
        });
        {
            let mut tasks = self.tasks();
            evict_finished(&mut tasks, self.keep_finished);
            tasks.insert(id, Arc::clone(&record));
        }

        debug!(task = %id, command = %record.command, "task queued");
        self.broker.publish(
            Event::task_status(id, TaskStatus::Queued).with_command(Arc::clone(&record.command)),
        );

        let broker = Arc::clone(&self.broker);
        let semaphore = self.semaphore.clone();
        let timeout = self.timeout;
        self.broker
            .runtime()
            .spawn(drive(broker, record, command, semaphore, timeout));
        id
    }

    /// Current snapshot of task `id`.
    pub fn status(&self, id: TaskId) -> Option<TaskSnapshot> {
        self.record(id).map(|r| r.state.borrow().clone())
    }

    /// Waits until task `id` is terminal and returns its final snapshot.
    ///
    /// `None` for unknown (or pruned) ids.
    pub async fn wait(&self, id: TaskId) -> Option<TaskSnapshot> {
        let record = self.record(id)?;
        let mut rx = record.state.subscribe();
        let snap = rx.wait_for(|s| s.status.is_terminal()).await.ok()?.clone();
        Some(snap)
    }

    /// Requests cancellation of task `id`; `false` if unknown or already terminal.
    pub fn cancel(&self, id: TaskId) -> bool {
        match self.record(id) {
            Some(record) if !record.status().is_terminal() => {
                record.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Requests cancellation of every non-terminal task; returns how many.
    pub fn cancel_all(&self) -> usize {
        let pending: Vec<Arc<TaskRecord>> = self
            .tasks()
            .values()
            .filter(|r| !r.status().is_terminal())
            .cloned()
            .collect();
        for record in &pending {
            record.token.cancel();
        }
        if !pending.is_empty() {
            info!(tasks = pending.len(), "cancelling outstanding tasks");
        }
        pending.len()
    }

    /// Ids of non-terminal tasks, ascending.
    pub fn outstanding(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .tasks()
            .values()
            .filter(|r| !r.status().is_terminal())
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Waits up to `grace` for every outstanding task to finish.
    ///
    /// Returns the ids still outstanding afterwards (empty on success).
    pub async fn wait_idle(&self, grace: Duration) -> Vec<TaskId> {
        let receivers: Vec<watch::Receiver<TaskSnapshot>> = self
            .tasks()
            .values()
            .filter(|r| !r.status().is_terminal())
            .map(|r| r.state.subscribe())
            .collect();

        let all = futures::future::join_all(receivers.into_iter().map(|mut rx| async move {
            let _ = rx.wait_for(|s| s.status.is_terminal()).await.map(|_| ());
        }));
        if time::timeout(grace, all).await.is_ok() {
            return Vec::new();
        }
        self.outstanding()
    }

    /// Drops the records of terminal tasks; returns how many.
    pub fn prune(&self) -> usize {
        let mut tasks = self.tasks();
        let before = tasks.len();
        tasks.retain(|_, r| !r.status().is_terminal());
        before - tasks.len()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

/// Keeps at most `keep` terminal records, dropping the oldest ids first.
fn evict_finished(tasks: &mut HashMap<TaskId, Arc<TaskRecord>>, keep: usize) {
    let mut finished: Vec<TaskId> = tasks
        .values()
        .filter(|r| r.status().is_terminal())
        .map(|r| r.id)
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort_unstable();
    let excess = finished.len() - keep;
    for id in &finished[..excess] {
        tasks.remove(id);
    }
    debug!(evicted = excess, "dropped finished task records");
}

async fn drive(
    broker: Arc<Broker>,
    record: Arc<TaskRecord>,
    command: CommandRef,
    semaphore: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
) {
    let mut permit = None;
    if let Some(sem) = semaphore {
        tokio::select! {
            biased;
            _ = record.token.cancelled() => {
                record.advance(&broker, TaskStatus::Running, None, None);
                record.finish(&broker, Err(TaskError::Cancelled));
                return;
            }
            acquired = sem.acquire_owned() => permit = acquired.ok(),
        }
    }

    record.advance(&broker, TaskStatus::Running, None, None);
    let ctx = CommandContext {
        task_id: record.id,
        token: record.token.clone(),
        broker: Arc::clone(&broker),
    };
    let res = run_once(command.as_ref(), ctx, timeout).await;
    drop(permit);
    record.finish(&broker, res);
}

/// Cancels outstanding tasks when the workspace closes.
struct CloseListener {
    dispatcher: Weak<Dispatcher>,
}

#[async_trait]
impl Subscribe for CloseListener {
    async fn on_event(&self, _event: &Event) -> anyhow::Result<()> {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.cancel_all();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        Dispatcher::SERVICE_NAME
    }
}

#[async_trait]
impl Service for Dispatcher {
    fn name(&self) -> &str {
        Self::SERVICE_NAME
    }

    async fn initialize(&self, broker: &Broker) -> anyhow::Result<()> {
        let closer: Arc<dyn Subscribe> = self.closer.clone();
        broker.subscribe(EventKind::ClosingWorkspace, closer);
        self.listening.store(true, Ordering::Release);
        Ok(())
    }
}

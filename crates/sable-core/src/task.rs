//! Cooperative task runtime.
//!
//! A task is the language's promise: it is pending with a list of
//! registered continuations, or terminal (fulfilled or rejected).
//! Terminal states are sticky. Continuations run in registration
//! order, immediately in the completing context; a continuation
//! registered on an already-terminal task runs immediately in the
//! registering context. All of this happens on one logical thread —
//! nothing here locks, and re-entry (a continuation completing
//! further tasks) is expected.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{normalize_thrown, Thrown};
use crate::value::Value;

/// Unique identifier for a task.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
    /// Generate a new unique TaskId.
    pub fn new() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// A deferred piece of work to run when a task reaches a terminal
/// state.
pub type Continuation = Box<dyn FnOnce()>;

/// Task state. `Pending → Fulfilled` and `Pending → Rejected` are the
/// only transitions.
enum TaskState {
    Pending { continuations: Vec<Continuation> },
    Fulfilled(Value),
    Rejected(Value),
}

impl std::fmt::Debug for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending { continuations } => f
                .debug_struct("Pending")
                .field("continuations", &continuations.len())
                .finish(),
            TaskState::Fulfilled(v) => f.debug_tuple("Fulfilled").field(v).finish(),
            TaskState::Rejected(v) => f.debug_tuple("Rejected").field(v).finish(),
        }
    }
}

/// Shared handle to a task. Cloning shares the same task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Rc<RefCell<TaskState>>,
}

impl TaskHandle {
    /// Create a pending task plus its one-shot completer.
    pub fn create() -> (TaskHandle, Completer) {
        let handle = TaskHandle {
            id: TaskId::new(),
            state: Rc::new(RefCell::new(TaskState::Pending {
                continuations: Vec::new(),
            })),
        };
        let completer = Completer {
            task: handle.clone(),
        };
        (handle, completer)
    }

    /// Create an already-fulfilled task.
    pub fn fulfilled(value: Value) -> TaskHandle {
        TaskHandle {
            id: TaskId::new(),
            state: Rc::new(RefCell::new(TaskState::Fulfilled(value))),
        }
    }

    /// Create an already-rejected task. The error is normalized so it
    /// always carries a message.
    pub fn rejected(error: Value) -> TaskHandle {
        TaskHandle {
            id: TaskId::new(),
            state: Rc::new(RefCell::new(TaskState::Rejected(normalize_thrown(error)))),
        }
    }

    /// Get the task's unique ID.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Whether two handles refer to the same task.
    pub fn same_task(&self, other: &TaskHandle) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Whether the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(&*self.state.borrow(), TaskState::Pending { .. })
    }

    /// Whether the task is fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(&*self.state.borrow(), TaskState::Fulfilled(_))
    }

    /// Whether the task is rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(&*self.state.borrow(), TaskState::Rejected(_))
    }

    /// The terminal outcome, if any: `Ok` for fulfilled, `Err` for
    /// rejected, `None` while pending.
    pub fn outcome(&self) -> Option<Result<Value, Value>> {
        match &*self.state.borrow() {
            TaskState::Pending { .. } => None,
            TaskState::Fulfilled(v) => Some(Ok(v.clone())),
            TaskState::Rejected(e) => Some(Err(e.clone())),
        }
    }

    /// Register a continuation to run at completion. Runs immediately
    /// if the task is already terminal.
    pub fn on_terminal(&self, continuation: Continuation) {
        {
            let mut state = self.state.borrow_mut();
            if let TaskState::Pending { continuations } = &mut *state {
                continuations.push(continuation);
                return;
            }
        }
        // Already terminal: run in the registering context.
        continuation();
    }

    /// Transition to a terminal state and dispatch continuations in
    /// registration order. Sticky: a second completion is ignored.
    fn complete(&self, outcome: Result<Value, Value>) {
        let continuations = {
            let mut state = self.state.borrow_mut();
            let TaskState::Pending { continuations } = &mut *state else {
                return;
            };
            let continuations = std::mem::take(continuations);
            *state = match outcome {
                Ok(v) => TaskState::Fulfilled(v),
                Err(e) => TaskState::Rejected(e),
            };
            continuations
        };
        // The borrow is released before continuations run: they may
        // re-enter the runtime and complete further tasks.
        for continuation in continuations {
            continuation();
        }
    }
}

/// One-shot completion capability for a task.
///
/// Consuming methods make double-completion unrepresentable; holders
/// that need optional completion keep the completer in an `Option`.
#[derive(Debug)]
pub struct Completer {
    task: TaskHandle,
}

impl Completer {
    /// Fulfill the task.
    pub fn set_value(self, value: Value) {
        self.task.complete(Ok(value));
    }

    /// Reject the task. The error is normalized so `catch (e)` can
    /// always read `e.message`.
    pub fn set_error(self, error: Value) {
        self.task.complete(Err(normalize_thrown(error)));
    }

    /// The task this completer resolves.
    pub fn task(&self) -> TaskHandle {
        self.task.clone()
    }
}

/// A small view over a task used by await sites: completion check,
/// result extraction, continuation registration.
#[derive(Debug, Clone)]
pub struct Awaiter {
    task: TaskHandle,
}

impl Awaiter {
    pub fn new(task: TaskHandle) -> Self {
        Awaiter { task }
    }

    /// Whether `get_result` would return without suspending.
    pub fn is_completed(&self) -> bool {
        self.task.is_terminal()
    }

    /// The fulfilled value — or the stored error, re-raised.
    pub fn get_result(&self) -> Result<Value, Thrown> {
        match self.task.outcome() {
            Some(Ok(value)) => Ok(value),
            Some(Err(error)) => Err(Thrown::new(error)),
            None => Err(Thrown::new(crate::error::error_object(
                "Error",
                "awaited task is still pending",
            ))),
        }
    }

    /// Register the continuation that resumes the awaiting machine.
    /// Called at most once per awaiter.
    pub fn on_completed(&self, continuation: Continuation) {
        self.task.on_terminal(continuation);
    }

    /// The underlying task.
    pub fn task(&self) -> &TaskHandle {
        &self.task
    }
}

/// Combine tasks: fulfills with the ordered array of per-task results
/// once every input fulfills; rejects with the *first* rejection (the
/// remaining tasks keep running but no longer affect the aggregate).
pub fn when_all(tasks: &[TaskHandle]) -> TaskHandle {
    let (aggregate, completer) = TaskHandle::create();
    if tasks.is_empty() {
        completer.set_value(Value::array(Vec::new()));
        return aggregate;
    }

    struct Join {
        results: Vec<Value>,
        remaining: usize,
        completer: Option<Completer>,
    }

    let join = Rc::new(RefCell::new(Join {
        results: vec![Value::Undefined; tasks.len()],
        remaining: tasks.len(),
        completer: Some(completer),
    }));

    for (i, task) in tasks.iter().enumerate() {
        let join = Rc::clone(&join);
        let task = task.clone();
        let awaiter = Awaiter::new(task.clone());
        awaiter.on_completed(Box::new(move || {
            let Some(outcome) = task.outcome() else {
                return;
            };
            let mut state = join.borrow_mut();
            match outcome {
                Ok(value) => {
                    state.results[i] = value;
                    state.remaining -= 1;
                    if state.remaining == 0 {
                        if let Some(completer) = state.completer.take() {
                            let results = std::mem::take(&mut state.results);
                            drop(state);
                            completer.set_value(Value::array(results));
                        }
                    }
                }
                Err(error) => {
                    if let Some(completer) = state.completer.take() {
                        drop(state);
                        completer.set_error(error);
                    }
                }
            }
        }));
    }

    aggregate
}

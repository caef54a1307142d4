//! Async state machine driver.
//!
//! An async method lowers to ordinary code plus one await site per
//! `await`; this module supplies the machine that makes the body
//! resumable. One machine exists per activation. Its `state` field is
//! a sentinel: `-1` while running or before the first step, `-2` once
//! the builder has been completed, `k ≥ 0` while parked on await
//! site `k`.
//!
//! The invoker ([`start_async`]) allocates the machine, copies the
//! arguments into its frame, creates the builder, and starts it —
//! which drives [`AsyncMachine::move_next`] exactly once
//! synchronously. If every await on the executed path completes
//! synchronously the returned task is already terminal when the
//! invoker returns.

use std::cell::RefCell;
use std::rc::Rc;

use sable_core::{Awaiter, Completer, TaskHandle, Value};

use crate::code::Code;
use crate::exec::{run, Frame, Step};
use crate::program::Program;

/// Machine state sentinel: running (or not yet started).
pub const STATE_RUNNING: i32 = -1;
/// Machine state sentinel: the builder has been completed.
pub const STATE_FINISHED: i32 = -2;

/// Per-activation owner of the produced task.
///
/// Exposes `set_result` / `set_exception` and keeps its completer in
/// an `Option` so the outer catch can never complete a finished
/// builder twice.
#[derive(Debug)]
pub struct TaskBuilder {
    task: TaskHandle,
    completer: RefCell<Option<Completer>>,
}

impl TaskBuilder {
    pub fn new() -> Self {
        let (task, completer) = TaskHandle::create();
        TaskBuilder {
            task,
            completer: RefCell::new(Some(completer)),
        }
    }

    /// The task this activation produces.
    pub fn task(&self) -> TaskHandle {
        self.task.clone()
    }

    /// Fulfill the produced task. No-op if already completed.
    pub fn set_result(&self, value: Value) {
        if let Some(completer) = self.completer.borrow_mut().take() {
            completer.set_value(value);
        }
    }

    /// Reject the produced task. No-op if already completed.
    pub fn set_exception(&self, error: Value) {
        if let Some(completer) = self.completer.borrow_mut().take() {
            completer.set_error(error);
        }
    }

    /// Detach the completer so completion can run after the machine
    /// borrow is released (continuations may re-enter the runtime).
    fn take_completer(&self) -> Option<Completer> {
        self.completer.borrow_mut().take()
    }

    /// Drive `MoveNext` exactly once, synchronously.
    pub fn start(machine: &Rc<RefCell<AsyncMachine>>) {
        AsyncMachine::move_next(machine);
    }

    /// Park `machine` on `awaiter`: when the awaited task reaches a
    /// terminal state, `MoveNext` re-enters.
    pub fn await_on_completed(awaiter: &Awaiter, machine: &Rc<RefCell<AsyncMachine>>) {
        let machine = Rc::clone(machine);
        awaiter.on_completed(Box::new(move || AsyncMachine::move_next(&machine)));
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The state machine for one async activation.
#[derive(Debug)]
pub struct AsyncMachine {
    /// `-1` running, `-2` finished, `k ≥ 0` parked on await site `k`.
    pub state: i32,
    /// The resumable frame: locals, operand stack, handler stack and
    /// program counter all survive suspension here.
    frame: Frame,
    /// The awaiter the machine is parked on, if any. A single shared
    /// slot suffices: at most one await site is pending per
    /// activation at a time.
    awaiter: Option<Awaiter>,
    builder: TaskBuilder,
    program: Program,
}

impl AsyncMachine {
    /// Which await site the machine is parked on, if suspended.
    pub fn parked_site(&self) -> Option<u16> {
        (self.state >= 0).then_some(self.state as u16)
    }

    /// Whether the produced task has been completed.
    pub fn is_finished(&self) -> bool {
        self.state == STATE_FINISHED
    }

    /// Resume or start the machine. Runs the lowered body until it
    /// returns, throws, or parks on a pending awaiter.
    pub fn move_next(this: &Rc<RefCell<AsyncMachine>>) {
        let mut machine = this.borrow_mut();
        if machine.state == STATE_FINISHED {
            return;
        }

        if machine.state >= 0 {
            // Resuming: back to the running sentinel, then pull the
            // awaited result. GetResult re-raises a rejection, which
            // must land in the handler active at the await site —
            // the frame's handler stack survived the suspension.
            machine.state = STATE_RUNNING;
            if let Some(awaiter) = machine.awaiter.take() {
                match awaiter.get_result() {
                    Ok(value) => machine.frame.stack.push(value),
                    Err(thrown) => {
                        if let Err(unhandled) = machine.frame.dispatch_throw(thrown) {
                            machine.state = STATE_FINISHED;
                            let completer = machine.builder.take_completer();
                            drop(machine);
                            if let Some(completer) = completer {
                                completer.set_error(unhandled.into_value());
                            }
                            return;
                        }
                    }
                }
            }
        }

        let program = machine.program.clone();
        match run(&program, &mut machine.frame) {
            Ok(Step::Return(value)) => {
                machine.state = STATE_FINISHED;
                let completer = machine.builder.take_completer();
                // SetResult runs outside the machine borrow: it
                // dispatches continuations that may re-enter the
                // runtime (and must be able to call MoveNext on
                // other machines immediately).
                drop(machine);
                if let Some(completer) = completer {
                    completer.set_value(value);
                }
            }
            Ok(Step::Suspend { site, awaiter }) => {
                machine.state = site as i32;
                machine.awaiter = Some(awaiter.clone());
                drop(machine);
                TaskBuilder::await_on_completed(&awaiter, this);
            }
            Err(thrown) => {
                // The single outer catch of the transform: any value
                // escaping the body rejects the produced task.
                machine.state = STATE_FINISHED;
                let completer = machine.builder.take_completer();
                drop(machine);
                if let Some(completer) = completer {
                    completer.set_error(thrown.into_value());
                }
            }
        }
    }
}

/// The invoker: allocate the machine in its initial state, copy the
/// parameters in, create a fresh builder, start it, and hand back the
/// builder's task.
pub fn start_async(
    program: &Program,
    code: Rc<Code>,
    this: Option<Value>,
    args: Vec<Value>,
    captures: Vec<Value>,
) -> TaskHandle {
    let frame = Frame::new(code, this, args, captures);
    let machine = AsyncMachine {
        state: STATE_RUNNING,
        frame,
        awaiter: None,
        builder: TaskBuilder::new(),
        program: program.clone(),
    };
    let task = machine.builder.task();
    let machine = Rc::new(RefCell::new(machine));
    TaskBuilder::start(&machine);
    task
}

//! Execution engine for lowered code.
//!
//! One instruction loop serves both back-end entry points: a
//! synchronous call runs a frame to completion, and an async
//! machine's `MoveNext` runs the same loop until the frame returns,
//! throws, or parks on a pending awaiter. The frame owns everything
//! that must survive a suspension: locals, operand stack, and the
//! active exception-handler stack, so a resume lands back inside the
//! protected region it suspended in.

use std::rc::Rc;

use sable_core::{
    error_object, normalize_thrown, type_error, Awaiter, ClassId, FuncId, Instance, PropMap,
    Thrown, Value,
};

use crate::builtins;
use crate::code::{BinOp, Code, Instr, UnOp};
use crate::machine;
use crate::program::{FunctionBody, Program};

/// An installed `try` handler.
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    /// Jump target of the catch block.
    pub catch_ip: u32,
    /// Operand-stack depth to unwind to before entering the catch.
    pub stack_depth: usize,
}

/// One activation of a compiled body.
#[derive(Debug)]
pub struct Frame {
    pub code: Rc<Code>,
    pub pc: usize,
    pub locals: Vec<Value>,
    pub stack: Vec<Value>,
    pub handlers: Vec<Handler>,
}

impl Frame {
    /// Bind a frame: receiver (when the code has one), then
    /// positional arguments padded with `undefined`, then captures,
    /// then locals.
    pub fn new(code: Rc<Code>, this: Option<Value>, args: Vec<Value>, captures: Vec<Value>) -> Frame {
        let mut locals = vec![Value::Undefined; code.local_count];
        let mut slot = 0;
        if code.has_this {
            locals[slot] = this.unwrap_or(Value::Undefined);
            slot += 1;
        }
        for i in 0..code.param_count {
            if let Some(arg) = args.get(i) {
                locals[slot + i] = arg.clone();
            }
        }
        slot += code.param_count;
        for (i, capture) in captures.into_iter().enumerate() {
            if slot + i < locals.len() {
                locals[slot + i] = capture;
            }
        }
        Frame {
            code,
            pc: 0,
            locals,
            stack: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Route a thrown value to the innermost installed handler:
    /// unwind the operand stack, jump to the catch target, and push
    /// the (normalized) thrown value for the catch binding. With no
    /// handler installed the throw escapes the frame.
    pub fn dispatch_throw(&mut self, thrown: Thrown) -> Result<(), Thrown> {
        let value = normalize_thrown(thrown.0);
        match self.handlers.pop() {
            Some(handler) => {
                self.stack.truncate(handler.stack_depth);
                self.pc = handler.catch_ip as usize;
                self.stack.push(value);
                Ok(())
            }
            None => Err(Thrown(value)),
        }
    }

    fn pop(&mut self) -> Result<Value, Thrown> {
        self.stack.pop().ok_or_else(|| internal("operand stack underflow"))
    }

    fn pop_args(&mut self, argc: usize) -> Result<Vec<Value>, Thrown> {
        if self.stack.len() < argc {
            return Err(internal("operand stack underflow in call"));
        }
        Ok(self.stack.split_off(self.stack.len() - argc))
    }
}

/// How a `run` invocation left the frame.
#[derive(Debug)]
pub enum Step {
    /// The body returned a value.
    Return(Value),
    /// An `await` hit a pending task: the machine must park in state
    /// `site` and resume when the awaiter completes.
    Suspend { site: u16, awaiter: Awaiter },
}

/// Per-instruction control flow.
enum Flow {
    Continue,
    Return(Value),
    Suspend { site: u16, awaiter: Awaiter },
}

fn internal(message: &str) -> Thrown {
    Thrown(error_object("InternalError", message))
}

/// Run a frame until it returns, suspends, or throws uncaught.
pub fn run(program: &Program, frame: &mut Frame) -> Result<Step, Thrown> {
    loop {
        let Some(&instr) = frame.code.instrs.get(frame.pc) else {
            return Err(internal("fell off the end of a body"));
        };
        frame.pc += 1;
        match step(program, frame, instr) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Return(value)) => return Ok(Step::Return(value)),
            Ok(Flow::Suspend { site, awaiter }) => return Ok(Step::Suspend { site, awaiter }),
            // A throw first consults the frame's own handlers; only
            // an unhandled one escapes to the caller.
            Err(thrown) => frame.dispatch_throw(thrown)?,
        }
    }
}

fn step(program: &Program, frame: &mut Frame, instr: Instr) -> Result<Flow, Thrown> {
    match instr {
        // ===== Constants & stack =====
        Instr::ConstUndefined => frame.stack.push(Value::Undefined),
        Instr::ConstNull => frame.stack.push(Value::Null),
        Instr::ConstTrue => frame.stack.push(Value::Bool(true)),
        Instr::ConstFalse => frame.stack.push(Value::Bool(false)),
        Instr::ConstNumber(n) => frame.stack.push(Value::Number(n)),
        Instr::ConstStr(id) => {
            let s = frame.code.strings[id as usize].clone();
            frame.stack.push(Value::Str(s));
        }
        Instr::ConstBuiltin(id) => frame.stack.push(Value::Builtin(builtins::builtin(id))),
        Instr::Pop => {
            frame.pop()?;
        }
        Instr::Dup => {
            let top = frame.pop()?;
            frame.stack.push(top.clone());
            frame.stack.push(top);
        }

        // ===== Locals =====
        Instr::LoadLocal(slot) => {
            let value = frame
                .locals
                .get(slot as usize)
                .cloned()
                .ok_or_else(|| internal("local slot out of range"))?;
            frame.stack.push(value);
        }
        Instr::StoreLocal(slot) => {
            let value = frame.pop()?;
            let slot = slot as usize;
            if slot >= frame.locals.len() {
                return Err(internal("local slot out of range"));
            }
            frame.locals[slot] = value;
        }

        // ===== Operators =====
        Instr::Binary(op) => {
            let right = frame.pop()?;
            let left = frame.pop()?;
            frame.stack.push(binary_op(op, left, right)?);
        }
        Instr::Unary(op) => {
            let operand = frame.pop()?;
            frame.stack.push(unary_op(op, operand)?);
        }

        // ===== Aggregates =====
        Instr::MakeArray(count) => {
            let elements = frame.pop_args(count as usize)?;
            frame.stack.push(Value::array(elements));
        }
        Instr::MakeObject(count) => {
            let count = count as usize;
            if frame.stack.len() < count * 2 {
                return Err(internal("object literal underflow"));
            }
            let pairs = frame.stack.split_off(frame.stack.len() - count * 2);
            let mut props = PropMap::new();
            for pair in pairs.chunks(2) {
                let key = pair[0]
                    .as_str()
                    .ok_or_else(|| internal("object literal key is not a string"))?;
                props.insert(key.to_string(), pair[1].clone());
            }
            frame.stack.push(Value::object(props));
        }
        Instr::MakeClosure { func, captures } => {
            let captured = frame.pop_args(captures as usize)?;
            frame
                .stack
                .push(Value::Closure(Rc::new(sable_core::Closure {
                    func,
                    captures: captured,
                })));
        }

        // ===== Properties, indexes, statics =====
        Instr::GetProp(name) => {
            let object = frame.pop()?;
            let name = frame.code.string(name).to_string();
            frame.stack.push(get_property(program, &object, &name)?);
        }
        Instr::SetProp(name) => {
            let value = frame.pop()?;
            let object = frame.pop()?;
            let name = frame.code.string(name).to_string();
            set_property(program, &object, &name, value.clone())?;
            frame.stack.push(value);
        }
        Instr::GetIndex => {
            let index = frame.pop()?;
            let object = frame.pop()?;
            frame.stack.push(get_index(program, &object, &index)?);
        }
        Instr::SetIndex => {
            let value = frame.pop()?;
            let index = frame.pop()?;
            let object = frame.pop()?;
            set_index(&object, &index, value.clone())?;
            frame.stack.push(value);
        }
        Instr::GetStatic { class, name } => {
            ensure_static_init(program, class)?;
            let name = frame.code.string(name);
            frame.stack.push(get_static_field(program, class, name));
        }
        Instr::SetStatic { class, name } => {
            ensure_static_init(program, class)?;
            let value = frame.pop()?;
            let name = frame.code.string(name).to_string();
            program
                .registry()
                .class(class)
                .static_fields
                .borrow_mut()
                .insert(name, value.clone());
            frame.stack.push(value);
        }

        // ===== Calls =====
        Instr::CallFunc { func, argc } => {
            let args = frame.pop_args(argc as usize)?;
            let result = call_function(program, func, None, args, Vec::new())?;
            frame.stack.push(result);
        }
        Instr::CallMethod { name, argc } => {
            let args = frame.pop_args(argc as usize)?;
            let receiver = frame.pop()?;
            let name = frame.code.string(name).to_string();
            frame
                .stack
                .push(call_method(program, receiver, &name, args)?);
        }
        Instr::CallStatic { class, name, argc } => {
            ensure_static_init(program, class)?;
            let args = frame.pop_args(argc as usize)?;
            let name = frame.code.string(name);
            let sig = program
                .registry()
                .resolve_static(class, name)
                .ok_or_else(|| {
                    type_error(format!(
                        "{}.{} is not a function",
                        program.registry().class(class).name,
                        name
                    ))
                })?;
            let handle = sig.handle;
            let result = call_function(program, handle, None, args, Vec::new())?;
            frame.stack.push(result);
        }
        Instr::CallValue { argc } => {
            let args = frame.pop_args(argc as usize)?;
            let callee = frame.pop()?;
            frame.stack.push(call_value(program, &callee, args)?);
        }
        Instr::CallSuper { argc } => {
            let args = frame.pop_args(argc as usize)?;
            let this = frame.locals.first().cloned().unwrap_or(Value::Undefined);
            let owner = frame
                .code
                .owner
                .ok_or_else(|| internal("super call outside a class body"))?;
            let parent = program
                .registry()
                .class(owner)
                .superclass
                .ok_or_else(|| internal("super call in a class with no superclass"))?;
            let ctor = program
                .registry()
                .class(parent)
                .constructor
                .ok_or_else(|| internal("superclass has no constructor"))?;
            call_function(program, ctor, Some(this), args, Vec::new())?;
            frame.stack.push(Value::Undefined);
        }
        Instr::CallSuperMethod { name, argc } => {
            let args = frame.pop_args(argc as usize)?;
            let this = frame.locals.first().cloned().unwrap_or(Value::Undefined);
            let name = frame.code.string(name).to_string();
            let owner = frame
                .code
                .owner
                .ok_or_else(|| internal("super call outside a class body"))?;
            let parent = program
                .registry()
                .class(owner)
                .superclass
                .ok_or_else(|| type_error(format!("'super.{}' in a class with no superclass", name)))?;
            let sig = program
                .registry()
                .resolve_virtual(parent, &name)
                .ok_or_else(|| type_error(format!("super.{} is not a function", name)))?;
            let handle = sig.handle;
            let result = call_function(program, handle, Some(this), args, Vec::new())?;
            frame.stack.push(result);
        }
        Instr::New { class, argc } => {
            let args = frame.pop_args(argc as usize)?;
            frame.stack.push(construct(program, class, args)?);
        }
        Instr::CallBuiltin { builtin, argc } => {
            let args = frame.pop_args(argc as usize)?;
            let method = builtins::builtin(builtin);
            if args.len() < method.min_args {
                return Err(type_error(format!(
                    "{} expects at least {} argument(s)",
                    method.name, method.min_args
                )));
            }
            frame.stack.push((method.body)(&args)?);
        }

        // ===== Control flow =====
        Instr::Jump(target) => frame.pc = target as usize,
        Instr::JumpIfFalse(target) => {
            if !frame.pop()?.is_truthy() {
                frame.pc = target as usize;
            }
        }
        Instr::JumpIfTrue(target) => {
            if frame.pop()?.is_truthy() {
                frame.pc = target as usize;
            }
        }

        // ===== Exceptions =====
        Instr::PushHandler { catch_ip } => {
            frame.handlers.push(Handler {
                catch_ip,
                stack_depth: frame.stack.len(),
            });
        }
        Instr::PopHandler => {
            frame
                .handlers
                .pop()
                .ok_or_else(|| internal("handler stack underflow"))?;
        }
        Instr::Throw => {
            let value = frame.pop()?;
            return Err(Thrown(value));
        }

        // ===== Suspension =====
        Instr::Await { site } => {
            let value = frame.pop()?;
            match value {
                Value::Task(task) => {
                    let awaiter = Awaiter::new(task);
                    if awaiter.is_completed() {
                        // Fast path: the result is ready; GetResult
                        // re-raises if the task rejected.
                        let result = awaiter.get_result()?;
                        frame.stack.push(result);
                    } else {
                        return Ok(Flow::Suspend { site, awaiter });
                    }
                }
                // Awaiting a non-task continues with the value itself.
                direct => frame.stack.push(direct),
            }
        }

        // ===== Return =====
        Instr::Return => {
            let value = frame.pop()?;
            return Ok(Flow::Return(value));
        }
    }
    Ok(Flow::Continue)
}

// =============================================================================
// Calls
// =============================================================================

/// Invoke a function-table entry. Synchronous bodies run to
/// completion on a fresh frame; async bodies start their state
/// machine and return its task immediately.
pub fn call_function(
    program: &Program,
    func: FuncId,
    this: Option<Value>,
    args: Vec<Value>,
    captures: Vec<Value>,
) -> Result<Value, Thrown> {
    let entry = program.function(func);
    match &entry.body {
        FunctionBody::Code(code) => {
            let code = Rc::clone(code);
            if code.is_async {
                let task = machine::start_async(program, code, this, args, captures);
                Ok(Value::Task(task))
            } else {
                let mut frame = Frame::new(code, this, args, captures);
                match run(program, &mut frame)? {
                    Step::Return(value) => Ok(value),
                    Step::Suspend { .. } => {
                        Err(internal("synchronous body reached an await"))
                    }
                }
            }
        }
        FunctionBody::AbstractTrap { class, method } => Err(type_error(format!(
            "abstract method invoked: {}.{}",
            class, method
        ))),
        FunctionBody::Open => Err(internal("call to a declared but undefined body")),
    }
}

/// Invoke a first-class value: a closure or a builtin.
pub fn call_value(program: &Program, callee: &Value, args: Vec<Value>) -> Result<Value, Thrown> {
    match callee {
        Value::Closure(closure) => call_function(
            program,
            closure.func,
            None,
            args,
            closure.captures.clone(),
        ),
        Value::Builtin(method) => {
            if args.len() < method.min_args {
                return Err(type_error(format!(
                    "{} expects at least {} argument(s)",
                    method.name, method.min_args
                )));
            }
            (method.body)(&args)
        }
        other => Err(type_error(format!("{} is not a function", other.type_name()))),
    }
}

/// Virtual dispatch: vtable chain first, then a callable stored in
/// the receiver's own property storage.
fn call_method(
    program: &Program,
    receiver: Value,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, Thrown> {
    match &receiver {
        Value::Instance(instance) => {
            if let Some(sig) = program.registry().resolve_virtual(instance.class, name) {
                let handle = sig.handle;
                return call_function(program, handle, Some(receiver.clone()), args, Vec::new());
            }
            if let Some(field) = instance.get_field(name) {
                if field.is_callable() {
                    return call_value(program, &field, args);
                }
            }
            Err(type_error(format!(
                "{}.{} is not a function",
                program.registry().class(instance.class).name,
                name
            )))
        }
        Value::Object(props) => {
            let field = props.borrow().get(name).cloned();
            match field {
                Some(field) if field.is_callable() => call_value(program, &field, args),
                _ => Err(type_error(format!("{} is not a function", name))),
            }
        }
        Value::Null | Value::Undefined => Err(type_error(format!(
            "cannot read properties of {} (reading '{}')",
            receiver.type_name(),
            name
        ))),
        other => Err(type_error(format!(
            "{}.{} is not a function",
            other.type_name(),
            name
        ))),
    }
}

/// `new Class(args…)`: allocate the field map, then run the
/// constructor chain on it. The map exists before the superclass
/// constructor runs, so ancestor constructors observe field writes.
pub fn construct(program: &Program, class: ClassId, args: Vec<Value>) -> Result<Value, Thrown> {
    ensure_static_init(program, class)?;
    let descriptor = program.registry().class(class);
    if descriptor.is_abstract {
        return Err(type_error(format!(
            "cannot instantiate abstract class '{}'",
            descriptor.name
        )));
    }
    let ctor = descriptor
        .constructor
        .ok_or_else(|| internal("class has no constructor"))?;
    let instance = Value::Instance(Rc::new(Instance::new(class)));
    call_function(program, ctor, Some(instance.clone()), args, Vec::new())?;
    Ok(instance)
}

/// Run a class's synthetic static constructor once, ancestors first,
/// before its first static use or instantiation.
pub fn ensure_static_init(program: &Program, class: ClassId) -> Result<(), Thrown> {
    if let Some(parent) = program.registry().class(class).superclass {
        ensure_static_init(program, parent)?;
    }
    let descriptor = program.registry().class(class);
    if descriptor.static_initialized.get() {
        return Ok(());
    }
    // Set before running so a static initializer referring back to
    // the class does not recurse.
    descriptor.static_initialized.set(true);
    if let Some(static_ctor) = descriptor.static_ctor {
        call_function(program, static_ctor, None, Vec::new(), Vec::new())?;
    }
    Ok(())
}

// =============================================================================
// Properties and indexing
// =============================================================================

/// Property read: getter chain, then the dynamic field map. Unknown
/// properties read as `undefined`; reading through null/undefined is
/// a TypeError.
pub fn get_property(program: &Program, object: &Value, name: &str) -> Result<Value, Thrown> {
    match object {
        Value::Instance(instance) => {
            if let Some(sig) = program.registry().resolve_getter(instance.class, name) {
                let handle = sig.handle;
                return call_function(
                    program,
                    handle,
                    Some(object.clone()),
                    Vec::new(),
                    Vec::new(),
                );
            }
            Ok(instance.get_field(name).unwrap_or(Value::Undefined))
        }
        Value::Object(props) => Ok(props.borrow().get(name).cloned().unwrap_or(Value::Undefined)),
        Value::Array(elements) => match name {
            "length" => Ok(Value::Number(elements.borrow().len() as f64)),
            _ => Ok(Value::Undefined),
        },
        Value::Str(s) => match name {
            "length" => Ok(Value::Number(s.chars().count() as f64)),
            _ => Ok(Value::Undefined),
        },
        Value::Null | Value::Undefined => Err(type_error(format!(
            "cannot read properties of {} (reading '{}')",
            object.type_name(),
            name
        ))),
        _ => Ok(Value::Undefined),
    }
}

/// Property write: setter chain, then the dynamic field map.
pub fn set_property(
    program: &Program,
    object: &Value,
    name: &str,
    value: Value,
) -> Result<(), Thrown> {
    match object {
        Value::Instance(instance) => {
            if let Some(sig) = program.registry().resolve_setter(instance.class, name) {
                let handle = sig.handle;
                call_function(program, handle, Some(object.clone()), vec![value], Vec::new())?;
                return Ok(());
            }
            instance.set_field(name, value);
            Ok(())
        }
        Value::Object(props) => {
            props.borrow_mut().insert(name.to_string(), value);
            Ok(())
        }
        Value::Null | Value::Undefined => Err(type_error(format!(
            "cannot set properties of {} (setting '{}')",
            object.type_name(),
            name
        ))),
        other => Err(type_error(format!(
            "cannot set property '{}' on {}",
            name,
            other.type_name()
        ))),
    }
}

fn get_index(program: &Program, object: &Value, index: &Value) -> Result<Value, Thrown> {
    match (object, index) {
        (Value::Array(elements), Value::Number(n)) => {
            let elements = elements.borrow();
            Ok(index_of(*n, elements.len())
                .and_then(|i| elements.get(i).cloned())
                .unwrap_or(Value::Undefined))
        }
        (Value::Str(s), Value::Number(n)) => Ok(index_of(*n, usize::MAX)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::str(c.to_string()))
            .unwrap_or(Value::Undefined)),
        (_, Value::Str(key)) => get_property(program, object, key),
        (Value::Null | Value::Undefined, _) => Err(type_error(format!(
            "cannot read properties of {}",
            object.type_name()
        ))),
        _ => Err(type_error(format!("cannot index {}", object.type_name()))),
    }
}

fn set_index(object: &Value, index: &Value, value: Value) -> Result<(), Thrown> {
    match (object, index) {
        (Value::Array(elements), Value::Number(n)) => {
            let Some(i) = index_of(*n, usize::MAX) else {
                return Err(type_error("invalid array index"));
            };
            let mut elements = elements.borrow_mut();
            // Element store past the end grows the array.
            if i >= elements.len() {
                elements.resize(i + 1, Value::Undefined);
            }
            elements[i] = value;
            Ok(())
        }
        (Value::Object(props), Value::Str(key)) => {
            props.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        (Value::Instance(instance), Value::Str(key)) => {
            instance.set_field(key, value);
            Ok(())
        }
        (Value::Null | Value::Undefined, _) => Err(type_error(format!(
            "cannot set properties of {}",
            object.type_name()
        ))),
        _ => Err(type_error(format!("cannot index {}", object.type_name()))),
    }
}

/// Convert an index number to a usize when it is a non-negative
/// integer below the bound; anything else misses.
fn index_of(n: f64, bound: usize) -> Option<usize> {
    if n.fract() != 0.0 || n < 0.0 || !n.is_finite() {
        return None;
    }
    let i = n as usize;
    (i < bound || bound == usize::MAX).then_some(i)
}

fn get_static_field(program: &Program, class: ClassId, name: &str) -> Value {
    let mut current = Some(class);
    while let Some(id) = current {
        let descriptor = program.registry().class(id);
        if let Some(value) = descriptor.static_fields.borrow().get(name) {
            return value.clone();
        }
        current = descriptor.superclass;
    }
    Value::Undefined
}

// =============================================================================
// Operators
// =============================================================================

fn binary_op(op: BinOp, left: Value, right: Value) -> Result<Value, Thrown> {
    match op {
        BinOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            // Either side being a string makes `+` concatenation.
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::str(format!(
                "{}{}",
                left.to_display_string(),
                right.to_display_string()
            ))),
            _ => Err(numeric_operands_error("+", &left, &right)),
        },
        BinOp::Sub => numeric(op, left, right, |a, b| a - b),
        BinOp::Mul => numeric(op, left, right, |a, b| a * b),
        // IEEE-754 semantics: dividing by zero produces
        // Infinity/NaN, never an error.
        BinOp::Div => numeric(op, left, right, |a, b| a / b),
        BinOp::Mod => numeric(op, left, right, |a, b| a % b),
        BinOp::Eq => Ok(Value::Bool(left.loose_equals(&right))),
        BinOp::Ne => Ok(Value::Bool(!left.loose_equals(&right))),
        BinOp::StrictEq => Ok(Value::Bool(left.strict_equals(&right))),
        BinOp::StrictNe => Ok(Value::Bool(!left.strict_equals(&right))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => compare(op, left, right),
    }
}

fn numeric(op: BinOp, left: Value, right: Value, f: impl Fn(f64, f64) -> f64) -> Result<Value, Thrown> {
    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(*a, *b))),
        _ => Err(numeric_operands_error(op_symbol(op), &left, &right)),
    }
}

fn compare(op: BinOp, left: Value, right: Value) -> Result<Value, Thrown> {
    let result = match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => unreachable!(),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => unreachable!(),
        },
        _ => return Err(numeric_operands_error(op_symbol(op), &left, &right)),
    };
    Ok(Value::Bool(result))
}

fn unary_op(op: UnOp, operand: Value) -> Result<Value, Thrown> {
    match op {
        UnOp::Neg => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(type_error(format!("cannot negate {}", other.type_name()))),
        },
        UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::StrictEq => "===",
        BinOp::StrictNe => "!==",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
    }
}

fn numeric_operands_error(op: &str, left: &Value, right: &Value) -> Thrown {
    type_error(format!(
        "unsupported operand types for {}: {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

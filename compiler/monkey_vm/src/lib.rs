//! Stack-based virtual machine for Monkey bytecode.
//!
//! Executes the compiler's instruction stream against a fixed-size
//! value stack, a globals slot array, and a call-frame stack. The entry
//! instructions run as a synthetic main frame. After a top-level
//! expression statement the compiler emits `Pop`, which decrements `sp`
//! but leaves the value in place; [`Vm::last_popped`] reads `stack[sp]`
//! to observe the program's result. That is a deliberate contract with
//! the driver and the tests, not an accident.

mod errors;


pub use errors::VmError;

use std::rc::Rc;

use errors::{frame_overflow, stack_overflow, unknown_opcode, unsupported_negation, unsupported_types};
use monkey_code::{read_u16, read_u8, Opcode};
use monkey_compile::Bytecode;
use monkey_ir::StringInterner;
use monkey_object::{
    division_by_zero, index_not_supported, integer_overflow, not_a_function,
    unknown_infix_operator, wrong_number_of_arguments, ClosureValue, CompiledFunction, FxIndexMap,
    HashKey, Value, BUILTINS,
};

/// Value stack depth.
pub const STACK_SIZE: usize = 2048;
/// Global binding slots.
pub const GLOBALS_SIZE: usize = 65536;
/// Maximum call depth.
pub const MAX_FRAMES: usize = 1024;

/// One call frame: the executing closure, its instruction pointer, and
/// where its locals start on the value stack.
struct Frame {
    closure: Rc<ClosureValue>,
    ip: usize,
    base_pointer: usize,
}

/// The virtual machine.
pub struct Vm<'a> {
    interner: &'a StringInterner,
    constants: Vec<Value>,
    stack: Vec<Value>,
    /// Next free stack slot; `stack[sp - 1]` is the top.
    sp: usize,
    globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl<'a> Vm<'a> {
    /// Create a VM with a fresh globals array.
    pub fn new(bytecode: Bytecode, interner: &'a StringInterner) -> Self {
        Self::with_globals(bytecode, interner, vec![Value::Null; GLOBALS_SIZE])
    }

    /// Create a VM reusing an existing globals array (REPL lines).
    pub fn with_globals(
        bytecode: Bytecode,
        interner: &'a StringInterner,
        globals: Vec<Value>,
    ) -> Self {
        let main_function = CompiledFunction::new(bytecode.instructions, 0, 0);
        let main_closure = ClosureValue::new(Rc::new(main_function), Vec::new());
        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame {
            closure: Rc::new(main_closure),
            ip: 0,
            base_pointer: 0,
        });
        Vm {
            interner,
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames,
        }
    }

    /// Give back the globals array for the next REPL line.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// The value most recently popped off the stack.
    pub fn last_popped(&self) -> &Value {
        &self.stack[self.sp]
    }

    /// Run to completion or to the first error.
    pub fn run(&mut self) -> Result<(), VmError> {
        loop {
            let (func, ip) = {
                let Some(frame) = self.frames.last() else {
                    return Ok(());
                };
                (Rc::clone(&frame.closure.func), frame.ip)
            };
            let ins = func.instructions.bytes();
            if ip >= ins.len() {
                return Ok(());
            }
            let op = Opcode::from_byte(ins[ip]).ok_or_else(|| unknown_opcode(ins[ip]))?;

            match op {
                Opcode::Constant => {
                    let index = read_u16(&ins[ip + 1..]);
                    self.set_ip(ip + 3);
                    let value = self.constants[index].clone();
                    self.push(value)?;
                }
                Opcode::Pop => {
                    self.set_ip(ip + 1);
                    self.pop();
                }
                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                    self.set_ip(ip + 1);
                    self.execute_binary(op)?;
                }
                Opcode::True => {
                    self.set_ip(ip + 1);
                    self.push(Value::Bool(true))?;
                }
                Opcode::False => {
                    self.set_ip(ip + 1);
                    self.push(Value::Bool(false))?;
                }
                Opcode::Null => {
                    self.set_ip(ip + 1);
                    self.push(Value::Null)?;
                }
                Opcode::Equal | Opcode::NotEqual | Opcode::GreaterThan => {
                    self.set_ip(ip + 1);
                    self.execute_comparison(op)?;
                }
                Opcode::Minus => {
                    self.set_ip(ip + 1);
                    match self.pop() {
                        Value::Int(value) => {
                            let negated = value
                                .checked_neg()
                                .ok_or_else(|| VmError::from(integer_overflow("negation")))?;
                            self.push(Value::Int(negated))?;
                        }
                        other => return Err(unsupported_negation(other.type_name())),
                    }
                }
                Opcode::Bang => {
                    self.set_ip(ip + 1);
                    let value = self.pop();
                    self.push(Value::from_bool(!value.is_truthy()))?;
                }
                Opcode::Jump => {
                    let target = read_u16(&ins[ip + 1..]);
                    self.set_ip(target);
                }
                Opcode::JumpIfNotTruthy => {
                    let target = read_u16(&ins[ip + 1..]);
                    self.set_ip(ip + 3);
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.set_ip(target);
                    }
                }
                Opcode::SetGlobal => {
                    let slot = read_u16(&ins[ip + 1..]);
                    self.set_ip(ip + 3);
                    self.globals[slot] = self.pop();
                }
                Opcode::GetGlobal => {
                    let slot = read_u16(&ins[ip + 1..]);
                    self.set_ip(ip + 3);
                    let value = self.globals[slot].clone();
                    self.push(value)?;
                }
                Opcode::Array => {
                    let count = read_u16(&ins[ip + 1..]);
                    self.set_ip(ip + 3);
                    let elements = self.stack[self.sp - count..self.sp].to_vec();
                    self.sp -= count;
                    self.push(Value::array(elements))?;
                }
                Opcode::Hash => {
                    let count = read_u16(&ins[ip + 1..]);
                    self.set_ip(ip + 3);
                    let mut entries = FxIndexMap::default();
                    for pair in self.stack[self.sp - count..self.sp].chunks_exact(2) {
                        let key = HashKey::from_value(&pair[0]).map_err(VmError::from)?;
                        entries.insert(key, pair[1].clone());
                    }
                    self.sp -= count;
                    self.push(Value::hash(entries))?;
                }
                Opcode::Index => {
                    self.set_ip(ip + 1);
                    let index = self.pop();
                    let left = self.pop();
                    let result = execute_index(&left, &index)?;
                    self.push(result)?;
                }
                Opcode::Call => {
                    let num_args = read_u8(&ins[ip + 1..]);
                    self.set_ip(ip + 2);
                    self.execute_call(num_args)?;
                }
                Opcode::ReturnValue => {
                    let value = self.pop();
                    if self.return_from_frame(value)? {
                        return Ok(());
                    }
                }
                Opcode::Return => {
                    if self.return_from_frame(Value::Null)? {
                        return Ok(());
                    }
                }
                Opcode::GetLocal => {
                    let slot = read_u8(&ins[ip + 1..]);
                    self.set_ip(ip + 2);
                    let base = self.current_base_pointer();
                    let value = self.stack[base + slot].clone();
                    self.push(value)?;
                }
                Opcode::SetLocal => {
                    let slot = read_u8(&ins[ip + 1..]);
                    self.set_ip(ip + 2);
                    let base = self.current_base_pointer();
                    self.stack[base + slot] = self.pop();
                }
                Opcode::Closure => {
                    let const_index = read_u16(&ins[ip + 1..]);
                    let num_free = read_u8(&ins[ip + 3..]);
                    self.set_ip(ip + 4);
                    self.push_closure(const_index, num_free)?;
                }
                Opcode::GetFree => {
                    let slot = read_u8(&ins[ip + 1..]);
                    self.set_ip(ip + 2);
                    let value = self.current_closure().free[slot].clone();
                    self.push(value)?;
                }
                Opcode::GetBuiltin => {
                    let index = read_u8(&ins[ip + 1..]);
                    self.set_ip(ip + 2);
                    self.push(Value::Builtin(&BUILTINS[index]))?;
                }
            }
        }
    }

    // ── stack primitives ────────────────────────────────────────────────

    fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.sp >= STACK_SIZE {
            return Err(stack_overflow());
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    /// Pop the top of stack. The slot keeps the value so
    /// [`Vm::last_popped`] can observe it.
    fn pop(&mut self) -> Value {
        if self.sp == 0 {
            return Value::Null;
        }
        self.sp -= 1;
        self.stack[self.sp].clone()
    }

    #[inline]
    fn set_ip(&mut self, ip: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.ip = ip;
        }
    }

    #[inline]
    fn current_base_pointer(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.base_pointer)
    }

    #[inline]
    fn current_closure(&self) -> Rc<ClosureValue> {
        self.frames
            .last()
            .map_or_else(|| unreachable!("no active frame"), |f| Rc::clone(&f.closure))
    }

    // ── operations ──────────────────────────────────────────────────────

    fn execute_binary(&mut self, op: Opcode) -> Result<(), VmError> {
        let right = self.pop();
        let left = self.pop();
        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => {
                let result = execute_int_binary(*a, *b, op)?;
                self.push(result)
            }
            (Value::Str(a), Value::Str(b)) => {
                if op == Opcode::Add {
                    self.push(Value::string(format!("{a}{b}")))
                } else {
                    Err(unknown_infix_operator("STRING", op_symbol(op), "STRING").into())
                }
            }
            _ => Err(unsupported_types(left.type_name(), right.type_name())),
        }
    }

    fn execute_comparison(&mut self, op: Opcode) -> Result<(), VmError> {
        let right = self.pop();
        let left = self.pop();
        let result = match op {
            Opcode::Equal => left == right,
            Opcode::NotEqual => left != right,
            _ => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => a > b,
                _ => return Err(unsupported_types(left.type_name(), right.type_name())),
            },
        };
        self.push(Value::from_bool(result))
    }

    fn execute_call(&mut self, num_args: usize) -> Result<(), VmError> {
        let callee = self.stack[self.sp - 1 - num_args].clone();
        match callee {
            Value::Closure(closure) => self.call_closure(closure, num_args),
            Value::Builtin(builtin) => {
                let args = self.stack[self.sp - num_args..self.sp].to_vec();
                let result = (builtin.func)(&args, self.interner).map_err(VmError::from)?;
                self.sp -= num_args + 1;
                self.push(result)
            }
            other => Err(not_a_function(other.type_name()).into()),
        }
    }

    fn call_closure(
        &mut self,
        closure: Rc<ClosureValue>,
        num_args: usize,
    ) -> Result<(), VmError> {
        if closure.func.num_parameters != num_args {
            return Err(wrong_number_of_arguments(closure.func.num_parameters, num_args).into());
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err(frame_overflow());
        }
        let base_pointer = self.sp - num_args;
        let frame_top = base_pointer + closure.func.num_locals;
        if frame_top > STACK_SIZE {
            return Err(stack_overflow());
        }
        self.frames.push(Frame {
            closure,
            ip: 0,
            base_pointer,
        });
        self.sp = frame_top;
        Ok(())
    }

    /// Unwind one frame, pushing `value` as the call's result.
    ///
    /// Returns `true` when the main frame itself returned (top-level
    /// `return`): the value is parked as the last-popped slot and the
    /// machine halts.
    fn return_from_frame(&mut self, value: Value) -> Result<bool, VmError> {
        let Some(frame) = self.frames.pop() else {
            return Ok(true);
        };
        if self.frames.is_empty() {
            self.push(value)?;
            self.sp -= 1;
            return Ok(true);
        }
        self.sp = frame.base_pointer - 1;
        self.push(value)?;
        Ok(false)
    }

    fn push_closure(&mut self, const_index: usize, num_free: usize) -> Result<(), VmError> {
        let Value::CompiledFunction(func) = self.constants[const_index].clone() else {
            return Err(not_a_function(self.constants[const_index].type_name()).into());
        };
        let free = self.stack[self.sp - num_free..self.sp].to_vec();
        self.sp -= num_free;
        self.push(Value::Closure(Rc::new(ClosureValue::new(func, free))))
    }
}

fn execute_int_binary(a: i64, b: i64, op: Opcode) -> Result<Value, VmError> {
    let result = match op {
        Opcode::Add => a.checked_add(b).ok_or_else(|| integer_overflow("addition"))?,
        Opcode::Sub => a
            .checked_sub(b)
            .ok_or_else(|| integer_overflow("subtraction"))?,
        Opcode::Mul => a
            .checked_mul(b)
            .ok_or_else(|| integer_overflow("multiplication"))?,
        Opcode::Div => {
            if b == 0 {
                return Err(division_by_zero().into());
            }
            a.checked_div(b).ok_or_else(|| integer_overflow("division"))?
        }
        _ => return Err(unknown_opcode(op as u8)),
    };
    Ok(Value::Int(result))
}

/// Index a collection: negative array indices count from the end; out
/// of range and missing hash keys yield null.
fn execute_index(left: &Value, index: &Value) -> Result<Value, VmError> {
    match (left, index) {
        (Value::Array(items), Value::Int(i)) => {
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let effective = if *i < 0 { len + i } else { *i };
            Ok(usize::try_from(effective)
                .ok()
                .and_then(|index| items.get(index).cloned())
                .unwrap_or(Value::Null))
        }
        (Value::Hash(entries), key) => {
            let key = HashKey::from_value(key).map_err(VmError::from)?;
            Ok(entries.get(&key).cloned().unwrap_or(Value::Null))
        }
        (other, _) => Err(index_not_supported(other.type_name()).into()),
    }
}

fn op_symbol(op: Opcode) -> &'static str {
    match op {
        Opcode::Add => "+",
        Opcode::Sub => "-",
        Opcode::Mul => "*",
        Opcode::Div => "/",
        _ => "?",
    }
}

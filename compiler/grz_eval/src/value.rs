//! Runtime values.
//!
//! Compound values refer into the VM heap by id: array elements are
//! [`ThunkId`]s so they stay lazy, objects are [`ObjId`]s so inheritance can
//! share layers. Every variant is cheap to clone.

use crate::heap::{EnvId, ObjId, ThunkId};
use crate::native::NativeFunction;
use crate::stdlib::Builtin;
use grz_ir::FunctionDef;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub(crate) enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    Array(Rc<[ThunkId]>),
    Object(ObjId),
    Function(Rc<FuncValue>),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

/// A callable value.
pub(crate) enum FuncValue {
    /// A Jsonnet `function` closed over its defining environment.
    Closure { def: Rc<FunctionDef>, env: EnvId },
    /// A std library function implemented in Rust.
    Builtin(&'static Builtin),
    /// A host function registered with [`crate::Vm::native_function`].
    Native(Rc<NativeFunction>),
}

impl FuncValue {
    /// Parameter names, in declaration order.
    pub fn param_names(&self) -> Vec<Rc<str>> {
        match self {
            FuncValue::Closure { def, .. } => def.params.iter().map(|p| Rc::clone(&p.name)).collect(),
            FuncValue::Builtin(builtin) => builtin.params.iter().map(|p| Rc::from(*p)).collect(),
            FuncValue::Native(native) => native.params.iter().map(|p| Rc::from(p.as_str())).collect(),
        }
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuncValue::Closure { env, .. } => write!(f, "Closure({env:?})"),
            FuncValue::Builtin(builtin) => write!(f, "Builtin(std.{})", builtin.name),
            FuncValue::Native(native) => write!(f, "Native({})", native.name),
        }
    }
}

//! Function application.

use super::Vm;
use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::heap::{EnvId, ThunkId};
use crate::stdlib::Args;
use crate::value::{FuncValue, Value};
use grz_ir::{Arg, ExprRef, Span};
use std::rc::Rc;

impl Vm {
    pub(super) fn eval_apply(
        &mut self,
        span: Span,
        target: &ExprRef,
        args: &[Arg],
        tailstrict: bool,
        env: EnvId,
    ) -> EvalResult<Value> {
        let func = match self.eval(target, env)? {
            Value::Function(func) => func,
            other => {
                return Err(EvalError::from_kind(EvalErrorKind::NotCallable {
                    got: other.type_name(),
                }));
            }
        };

        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            let thunk = if tailstrict {
                let value = self.eval(&arg.value, env)?;
                self.heap.alloc_ready(value)
            } else {
                self.delay(&arg.value, env)
            };
            match &arg.name {
                Some(name) => named.push((Rc::clone(name), thunk)),
                None => positional.push(thunk),
            }
        }

        self.call(&func, &positional, &named)
            .map_err(|err| err.with_frame(span))
    }

    /// Call `func` with lazily evaluated arguments.
    pub(crate) fn call(
        &mut self,
        func: &Rc<FuncValue>,
        positional: &[ThunkId],
        named: &[(Rc<str>, ThunkId)],
    ) -> EvalResult<Value> {
        match &**func {
            FuncValue::Closure { def, env } => {
                let names: Vec<&str> = def.params.iter().map(|p| &*p.name).collect();
                let bound = bind_args(&names, positional, named)?;
                // Defaults are evaluated in the call frame so they can see
                // the other parameters.
                let frame = self.heap.alloc_env(Some(*env));
                for (param, thunk) in def.params.iter().zip(bound) {
                    let thunk = match (thunk, &param.default) {
                        (Some(thunk), _) => thunk,
                        (None, Some(default)) => self.delay(default, frame),
                        (None, None) => return Err(missing_argument(&param.name)),
                    };
                    self.heap.bind(frame, Rc::clone(&param.name), thunk);
                }
                self.framed(|vm| vm.eval(&def.body, frame))
            }
            FuncValue::Builtin(builtin) => {
                let builtin = *builtin;
                let bound = bind_args(builtin.params, positional, named)?;
                if let Some(missing) = bound[..builtin.required].iter().position(Option::is_none) {
                    return Err(missing_argument(builtin.params[missing]));
                }
                self.framed(|vm| (builtin.func)(vm, &Args::new(builtin, &bound)))
            }
            FuncValue::Native(native) => {
                let names: Vec<&str> = native.params.iter().map(String::as_str).collect();
                let bound = bind_args(&names, positional, named)?;
                let mut json_args = Vec::with_capacity(bound.len());
                for (name, thunk) in names.iter().zip(&bound) {
                    let Some(thunk) = thunk else {
                        return Err(missing_argument(name));
                    };
                    let value = self.force(*thunk)?;
                    json_args.push(self.to_json(&value)?);
                }
                tracing::trace!(native = %native.name, "calling native function");
                let result = (native.handler)(&json_args)
                    .map_err(|message| EvalError::from_kind(EvalErrorKind::Native { message }))?;
                Ok(self.from_json(&result))
            }
        }
    }

    /// Call a function value with positional thunks.
    pub(crate) fn call_value(&mut self, func: &Value, args: &[ThunkId]) -> EvalResult<Value> {
        match func {
            Value::Function(func) => self.call(func, args, &[]),
            other => Err(EvalError::from_kind(EvalErrorKind::NotCallable {
                got: other.type_name(),
            })),
        }
    }

    /// Call a function value with already evaluated positional arguments.
    pub(crate) fn call_with_values(&mut self, func: &Value, args: &[Value]) -> EvalResult<Value> {
        let thunks: Vec<ThunkId> = args
            .iter()
            .map(|value| self.heap.alloc_ready(value.clone()))
            .collect();
        self.call_value(func, &thunks)
    }
}

/// Match call arguments to parameter slots.
fn bind_args(
    names: &[&str],
    positional: &[ThunkId],
    named: &[(Rc<str>, ThunkId)],
) -> EvalResult<Vec<Option<ThunkId>>> {
    if positional.len() > names.len() {
        return Err(EvalError::from_kind(EvalErrorKind::TooManyArgs {
            expected: names.len(),
            got: positional.len(),
        }));
    }
    let mut bound: Vec<Option<ThunkId>> = vec![None; names.len()];
    for (slot, thunk) in bound.iter_mut().zip(positional) {
        *slot = Some(*thunk);
    }
    for (name, thunk) in named {
        let Some(idx) = names.iter().position(|n| **n == **name) else {
            return Err(EvalError::from_kind(EvalErrorKind::UnknownParameter {
                name: name.to_string(),
            }));
        };
        if bound[idx].is_some() {
            return Err(EvalError::from_kind(EvalErrorKind::DuplicateArgument {
                name: name.to_string(),
            }));
        }
        bound[idx] = Some(*thunk);
    }
    Ok(bound)
}

#[cold]
fn missing_argument(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingArgument {
        name: name.to_string(),
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::heap::Heap;

    fn thunks(n: usize) -> Vec<ThunkId> {
        let mut heap = Heap::default();
        (0..n).map(|_| heap.alloc_ready(Value::Null)).collect()
    }

    #[test]
    fn test_bind_positional_and_named() {
        let t = thunks(2);
        let bound = bind_args(&["a", "b", "c"], &t[..1], &[(Rc::from("c"), t[1])]).unwrap();
        assert_eq!(bound, vec![Some(t[0]), None, Some(t[1])]);
    }

    #[test]
    fn test_bind_too_many() {
        let t = thunks(2);
        let err = bind_args(&["a"], &t, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "function expected 1 positional argument(s), but got 2"
        );
    }

    #[test]
    fn test_bind_duplicate_and_unknown() {
        let t = thunks(2);
        let err = bind_args(&["a"], &t[..1], &[(Rc::from("a"), t[1])]).unwrap_err();
        assert_eq!(err.to_string(), "argument a already provided");
        let err = bind_args(&["a"], &[], &[(Rc::from("z"), t[1])]).unwrap_err();
        assert_eq!(err.to_string(), "function has no parameter z");
    }
}

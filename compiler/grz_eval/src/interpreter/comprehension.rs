//! Array and object comprehensions.

use super::Vm;
use crate::errors::{type_mismatch, EvalResult};
use crate::heap::EnvId;
use crate::value::Value;
use grz_ir::CompSpec;
use std::rc::Rc;

impl Vm {
    /// One scope per produced element, in iteration order.
    ///
    /// Each `for` clause multiplies the scopes by its array's elements, each
    /// `if` clause filters them.
    pub(crate) fn expand_comprehension(
        &mut self,
        env: EnvId,
        specs: &[CompSpec],
    ) -> EvalResult<Vec<EnvId>> {
        let mut envs = vec![env];
        for spec in specs {
            match spec {
                CompSpec::For { var, iter } => {
                    let mut next = Vec::new();
                    for outer in envs {
                        let items = match self.eval(iter, outer)? {
                            Value::Array(items) => items,
                            other => {
                                return Err(type_mismatch(
                                    "for loop",
                                    "array",
                                    other.type_name(),
                                ));
                            }
                        };
                        for item in items.iter() {
                            let scope = self.heap.alloc_env(Some(outer));
                            self.heap.bind(scope, Rc::clone(var), *item);
                            next.push(scope);
                        }
                    }
                    envs = next;
                }
                CompSpec::If(cond) => {
                    let mut kept = Vec::with_capacity(envs.len());
                    for scope in envs {
                        match self.eval(cond, scope)? {
                            Value::Bool(true) => kept.push(scope),
                            Value::Bool(false) => {}
                            other => {
                                return Err(type_mismatch(
                                    "if condition",
                                    "boolean",
                                    other.type_name(),
                                ));
                            }
                        }
                    }
                    envs = kept;
                }
            }
        }
        Ok(envs)
    }
}

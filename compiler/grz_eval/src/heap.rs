//! Per-VM arenas for thunks, environments and objects.
//!
//! Closures capture environments, environments hold thunks, thunks hold
//! closures: the graph is cyclic. Storing every node in a `Vec` owned by the
//! VM and linking by index keeps ownership flat; everything is released at
//! once when the VM is dropped.

use crate::errors::{EvalError, EvalErrorKind, EvalResult};
use crate::object::ObjectData;
use crate::value::Value;
use grz_ir::{ExprRef, Ident};
use rustc_hash::FxHashMap;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ThunkId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EnvId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ObjId(u32);

/// Work a thunk will do when first forced.
#[derive(Clone, Debug)]
pub(crate) enum Pending {
    /// Evaluate `expr` in `env`.
    Expr { expr: ExprRef, env: EnvId },
    /// Call `func` with `args` (used by lazy std functions such as `map`).
    Apply { func: Value, args: Rc<[ThunkId]> },
    /// Read a field of an object.
    Field { obj: ObjId, name: Rc<str> },
}

#[derive(Debug)]
pub(crate) enum ThunkState {
    Pending(Pending),
    /// Currently being forced; forcing again means a value depends on itself.
    Forcing,
    Ready(Value),
}

/// `self`, `super` and `$` for code running inside an object.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ObjCtx {
    pub this: ObjId,
    /// Layers `0..super_limit` of `this` are visible through `super`.
    pub super_limit: usize,
    pub dollar: ObjId,
}

/// One lexical scope.
#[derive(Debug)]
pub(crate) struct EnvFrame {
    parent: Option<EnvId>,
    vars: FxHashMap<Ident, ThunkId>,
    ctx: Option<ObjCtx>,
}

#[derive(Default)]
pub(crate) struct Heap {
    thunks: Vec<ThunkState>,
    envs: Vec<EnvFrame>,
    objects: Vec<ObjectData>,
}

impl Heap {
    pub fn alloc_thunk(&mut self, pending: Pending) -> ThunkId {
        let id = ThunkId(self.thunks.len() as u32);
        self.thunks.push(ThunkState::Pending(pending));
        id
    }

    pub fn alloc_ready(&mut self, value: Value) -> ThunkId {
        let id = ThunkId(self.thunks.len() as u32);
        self.thunks.push(ThunkState::Ready(value));
        id
    }

    /// Take the pending work out of a thunk, marking it as being forced.
    ///
    /// Returns `Ok(Err(value))` when the thunk is already evaluated.
    pub fn begin_force(&mut self, id: ThunkId) -> EvalResult<Result<Pending, Value>> {
        let slot = &mut self.thunks[id.0 as usize];
        match std::mem::replace(slot, ThunkState::Forcing) {
            ThunkState::Ready(value) => {
                *slot = ThunkState::Ready(value.clone());
                Ok(Err(value))
            }
            ThunkState::Pending(pending) => Ok(Ok(pending)),
            ThunkState::Forcing => Err(EvalError::from_kind(EvalErrorKind::InfiniteRecursion)),
        }
    }

    pub fn finish_force(&mut self, id: ThunkId, value: Value) {
        self.thunks[id.0 as usize] = ThunkState::Ready(value);
    }

    /// Put the work back after a failed force so a later force reports the
    /// real error again instead of infinite recursion.
    pub fn abort_force(&mut self, id: ThunkId, pending: Pending) {
        self.thunks[id.0 as usize] = ThunkState::Pending(pending);
    }

    /// New empty scope under `parent`, inheriting its object context.
    pub fn alloc_env(&mut self, parent: Option<EnvId>) -> EnvId {
        let ctx = parent.and_then(|p| self.env(p).ctx);
        self.alloc_env_with_ctx(parent, ctx)
    }

    pub fn alloc_env_with_ctx(&mut self, parent: Option<EnvId>, ctx: Option<ObjCtx>) -> EnvId {
        let id = EnvId(self.envs.len() as u32);
        self.envs.push(EnvFrame {
            parent,
            vars: FxHashMap::default(),
            ctx,
        });
        id
    }

    fn env(&self, id: EnvId) -> &EnvFrame {
        &self.envs[id.0 as usize]
    }

    pub fn bind(&mut self, env: EnvId, name: Ident, thunk: ThunkId) {
        self.envs[env.0 as usize].vars.insert(name, thunk);
    }

    pub fn lookup(&self, mut env: EnvId, name: &str) -> Option<ThunkId> {
        loop {
            let frame = self.env(env);
            if let Some(thunk) = frame.vars.get(name) {
                return Some(*thunk);
            }
            env = frame.parent?;
        }
    }

    pub fn ctx(&self, env: EnvId) -> Option<ObjCtx> {
        self.env(env).ctx
    }

    pub fn alloc_object(&mut self, data: ObjectData) -> ObjId {
        let id = ObjId(self.objects.len() as u32);
        self.objects.push(data);
        id
    }

    pub fn object(&self, id: ObjId) -> &ObjectData {
        &self.objects[id.0 as usize]
    }

    pub fn object_mut(&mut self, id: ObjId) -> &mut ObjectData {
        &mut self.objects[id.0 as usize]
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let mut heap = Heap::default();
        let root = heap.alloc_env(None);
        let x = heap.alloc_ready(Value::Num(1.0));
        heap.bind(root, "x".into(), x);
        let child = heap.alloc_env(Some(root));
        assert_eq!(heap.lookup(child, "x"), Some(x));
        assert_eq!(heap.lookup(child, "y"), None);
    }

    #[test]
    fn test_forcing_twice_is_infinite_recursion() {
        let mut heap = Heap::default();
        let env = heap.alloc_env(None);
        let expr = grz_ir::Expr::new(grz_ir::ExprKind::Null, grz_ir::Span::DUMMY);
        let id = heap.alloc_thunk(Pending::Expr { expr, env });
        assert!(heap.begin_force(id).unwrap().is_ok());
        let err = heap.begin_force(id).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::InfiniteRecursion);
    }

    #[test]
    fn test_ready_thunk_returns_value() {
        let mut heap = Heap::default();
        let id = heap.alloc_ready(Value::Bool(true));
        let value = heap.begin_force(id).unwrap().unwrap_err();
        assert!(matches!(value, Value::Bool(true)));
    }
}

//! The tree-walking interpreter.
//!
//! [`Vm`] owns every piece of evaluation state: the heap arenas, the table
//! of loaded source files, import memoization, the field cache, registered
//! native functions and the importer. `eval` is split by concern across the
//! submodules; this file holds the public API, thunk forcing and the
//! expression dispatch.

mod call;
mod comprehension;
mod imports;
mod index;
mod objects;

pub(crate) use index::to_integer;

use crate::errors::{
    binary_types, division_by_zero, type_mismatch, undefined_variable, user_error, EvalError,
    EvalErrorKind, EvalResult,
};
use crate::heap::{EnvId, Heap, ObjId, Pending, ThunkId};
use crate::import::Importer;
use crate::native::NativeFunction;
use crate::object::{FieldBody, Layer, LayerField};
use crate::stdlib::BUILTINS;
use crate::value::{FuncValue, Value};
use grz_ir::{AssertDef, BinaryOp, ExprKind, ExprRef, FileId, SourceFile, Visibility};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Maximum number of trace lines printed under a runtime error.
const MAX_TRACE_LINES: usize = 20;

/// VM tuning knobs.
#[derive(Clone, Debug)]
pub struct VmOptions {
    /// Call depth at which evaluation fails with "max stack frames exceeded".
    pub max_stack: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        VmOptions { max_stack: 500 }
    }
}

/// A rendered evaluation failure (static or runtime).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct VmError {
    pub message: String,
}

/// A Jsonnet virtual machine.
///
/// One VM evaluates one program: imports are memoized for its lifetime and
/// its arenas only grow. Build a fresh VM per evaluation.
pub struct Vm {
    options: VmOptions,
    pub(crate) heap: Heap,
    files: Vec<SourceFile>,
    importer: Option<Box<dyn Importer>>,
    natives: FxHashMap<String, Rc<NativeFunction>>,
    std_layer: Rc<Layer>,
    std_objects: FxHashMap<FileId, ObjId>,
    field_cache: FxHashMap<ObjId, FxHashMap<Rc<str>, Value>>,
    code_imports: FxHashMap<String, ThunkId>,
    depth: usize,
}

impl Vm {
    pub fn new(options: VmOptions) -> Self {
        let mut heap = Heap::default();
        let mut std_layer = Layer::default();
        for builtin in BUILTINS {
            let thunk = heap.alloc_ready(Value::Function(Rc::new(FuncValue::Builtin(builtin))));
            std_layer.fields.insert(
                Rc::from(builtin.name),
                LayerField {
                    plus: false,
                    visibility: Visibility::Hidden,
                    body: FieldBody::Thunk(thunk),
                },
            );
        }

        Vm {
            options,
            heap,
            files: Vec::new(),
            importer: None,
            natives: FxHashMap::default(),
            std_layer: Rc::new(std_layer),
            std_objects: FxHashMap::default(),
            field_cache: FxHashMap::default(),
            code_imports: FxHashMap::default(),
            depth: 0,
        }
    }

    /// Install the importer used for every `import`, `importstr` and `importbin`.
    pub fn importer(&mut self, importer: impl Importer + 'static) {
        self.importer = Some(Box::new(importer));
    }

    /// Register a host function reachable through `std.native(name)`.
    pub fn native_function(&mut self, native: NativeFunction) {
        self.natives.insert(native.name.clone(), Rc::new(native));
    }

    /// Evaluate `snippet` as if it were the contents of `filename` and
    /// manifest the result as JSON text.
    ///
    /// `filename` is used for error messages, `std.thisFile` and as the base
    /// for relative imports.
    pub fn evaluate_anonymous_snippet(
        &mut self,
        filename: &str,
        snippet: &str,
    ) -> Result<String, VmError> {
        let result = self
            .evaluate_file(filename, snippet)
            .and_then(|value| self.manifest_output(&value));
        match result {
            Ok(mut json) => {
                json.push('\n');
                Ok(json)
            }
            Err(err) => Err(VmError {
                message: self.render_error(&err),
            }),
        }
    }

    /// Parse and evaluate one file's text to a value.
    pub(crate) fn evaluate_file(&mut self, path: &str, text: &str) -> EvalResult<Value> {
        let expr = self.load_source(path, text)?;
        let env = self.root_env(expr.span.file);
        self.eval(&expr, env)
    }

    /// Register a source file and parse it.
    pub(crate) fn load_source(&mut self, path: &str, text: &str) -> EvalResult<ExprRef> {
        let file = FileId(self.files.len() as u32);
        self.files.push(SourceFile::new(path, text));
        grz_parse::parse(text, file).map_err(|err| {
            let rendered = err.render(&self.files[file.index()]);
            EvalError::from_kind(EvalErrorKind::Static(rendered))
        })
    }

    pub(crate) fn file_path(&self, file: FileId) -> Option<&str> {
        self.files.get(file.index()).map(SourceFile::path)
    }

    /// The top-level scope of a file: just `std`, whose `thisFile` names it.
    fn root_env(&mut self, file: FileId) -> EnvId {
        let std_obj = self.std_object(file);
        let env = self.heap.alloc_env(None);
        let std_thunk = self.heap.alloc_ready(Value::Object(std_obj));
        self.heap.bind(env, Rc::from("std"), std_thunk);
        env
    }

    fn std_object(&mut self, file: FileId) -> ObjId {
        if let Some(obj) = self.std_objects.get(&file) {
            return *obj;
        }
        let path = self.file_path(file).unwrap_or_default().to_string();
        let this_file = self.heap.alloc_ready(Value::str(&path));
        let mut file_layer = Layer::from_thunks([(Rc::from("thisFile"), this_file)]);
        if let Some(field) = file_layer.fields.get_mut("thisFile") {
            field.visibility = Visibility::Hidden;
        }
        let obj = self.new_object(vec![Rc::clone(&self.std_layer), Rc::new(file_layer)]);
        self.std_objects.insert(file, obj);
        obj
    }

    pub(crate) fn native(&self, name: &str) -> Option<Rc<NativeFunction>> {
        self.natives.get(name).cloned()
    }

    /// Render an error as the text users see.
    fn render_error(&self, err: &EvalError) -> String {
        if let EvalErrorKind::Static(rendered) = &err.kind {
            return rendered.clone();
        }
        let mut out = format!("RUNTIME ERROR: {}", err.kind);
        for span in err.trace.iter().take(MAX_TRACE_LINES) {
            if let Some(file) = self.files.get(span.file.index()) {
                let pos = file.line_col(span.start);
                out.push_str(&format!("\n\t{}:{}:{}", file.path(), pos.line, pos.col));
            }
        }
        out
    }

    /// Run `f` as one stack frame, enforcing the depth limit.
    pub(crate) fn framed<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        if self.depth >= self.options.max_stack {
            return Err(EvalError::from_kind(EvalErrorKind::StackOverflow));
        }
        self.depth += 1;
        let result = grz_stack::grow_if_needed(|| f(self));
        self.depth -= 1;
        result
    }

    /// Force a thunk, evaluating it on first use.
    pub(crate) fn force(&mut self, id: ThunkId) -> EvalResult<Value> {
        let pending = match self.heap.begin_force(id)? {
            Ok(pending) => pending,
            Err(value) => return Ok(value),
        };
        match self.eval_pending(pending.clone()) {
            Ok(value) => {
                self.heap.finish_force(id, value.clone());
                Ok(value)
            }
            Err(err) => {
                self.heap.abort_force(id, pending);
                Err(err)
            }
        }
    }

    fn eval_pending(&mut self, pending: Pending) -> EvalResult<Value> {
        match pending {
            Pending::Expr { expr, env } => self.eval(&expr, env),
            Pending::Apply { func, args } => self.call_value(&func, &args),
            Pending::Field { obj, name } => self.get_field(obj, &name),
        }
    }

    /// Defer `expr` in `env`; literals are evaluated immediately.
    pub(crate) fn delay(&mut self, expr: &ExprRef, env: EnvId) -> ThunkId {
        let ready = match &expr.kind {
            ExprKind::Null => Some(Value::Null),
            ExprKind::True => Some(Value::Bool(true)),
            ExprKind::False => Some(Value::Bool(false)),
            ExprKind::Number(n) if n.is_finite() => Some(Value::Num(*n)),
            ExprKind::Str(s) => Some(Value::Str(Rc::clone(s))),
            _ => None,
        };
        match ready {
            Some(value) => self.heap.alloc_ready(value),
            None => self.heap.alloc_thunk(Pending::Expr {
                expr: Rc::clone(expr),
                env,
            }),
        }
    }

    /// Evaluate an expression, attributing a fresh error to its span.
    pub(crate) fn eval(&mut self, expr: &ExprRef, env: EnvId) -> EvalResult<Value> {
        grz_stack::grow_if_needed(|| self.eval_inner(expr, env)).map_err(|err| {
            if err.trace.is_empty() {
                err.with_frame(expr.span)
            } else {
                err
            }
        })
    }

    fn eval_inner(&mut self, expr: &ExprRef, env: EnvId) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::True => Ok(Value::Bool(true)),
            ExprKind::False => Ok(Value::Bool(false)),
            ExprKind::Str(s) => Ok(Value::Str(Rc::clone(s))),
            ExprKind::Number(n) if n.is_finite() => Ok(Value::Num(*n)),
            ExprKind::Number(_) => Err(EvalError::from_kind(EvalErrorKind::NotFinite)),
            ExprKind::SelfRef => {
                let ctx = self.object_ctx(env)?;
                Ok(Value::Object(ctx.this))
            }
            ExprKind::Dollar => {
                let ctx = self.object_ctx(env)?;
                Ok(Value::Object(ctx.dollar))
            }
            ExprKind::Var(name) => {
                let thunk = self
                    .heap
                    .lookup(env, name)
                    .ok_or_else(|| undefined_variable(name))?;
                self.force(thunk)
            }
            ExprKind::Array(items) => {
                let thunks: Vec<ThunkId> = items.iter().map(|item| self.delay(item, env)).collect();
                Ok(Value::Array(thunks.into()))
            }
            ExprKind::ArrayComp { body, specs } => {
                let envs = self.expand_comprehension(env, specs)?;
                let thunks: Vec<ThunkId> = envs.into_iter().map(|e| self.delay(body, e)).collect();
                Ok(Value::Array(thunks.into()))
            }
            ExprKind::Object(body) => self.build_object(body, env),
            ExprKind::ObjectComp(comp) => self.build_object_comp(comp, env),
            ExprKind::Local { binds, body } => {
                let frame = self.heap.alloc_env(Some(env));
                for bind in binds.iter() {
                    let thunk = self.delay(&bind.value, frame);
                    self.heap.bind(frame, Rc::clone(&bind.name), thunk);
                }
                self.eval(body, frame)
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => match self.eval(cond, env)? {
                Value::Bool(true) => self.eval(then_branch, env),
                Value::Bool(false) => self.eval(else_branch, env),
                other => Err(type_mismatch("if condition", "boolean", other.type_name())),
            },
            ExprKind::Function(def) => Ok(Value::Function(Rc::new(FuncValue::Closure {
                def: Rc::clone(def),
                env,
            }))),
            ExprKind::Apply {
                target,
                args,
                tailstrict,
            } => self.eval_apply(expr.span, target, args, *tailstrict, env),
            ExprKind::Index { target, index } => {
                let target = self.eval(target, env)?;
                let index = self.eval(index, env)?;
                self.index_value(&target, &index)
            }
            ExprKind::SuperIndex { index } => {
                let ctx = self.object_ctx(env)?;
                let name = match self.eval(index, env)? {
                    Value::Str(name) => name,
                    other => {
                        return Err(type_mismatch("super index", "string", other.type_name()));
                    }
                };
                self.super_field(ctx, &name)
            }
            ExprKind::InSuper { field } => {
                let ctx = self.object_ctx(env)?;
                match self.eval(field, env)? {
                    Value::Str(name) => Ok(Value::Bool(
                        self.heap
                            .object(ctx.this)
                            .find_layer(&name, ctx.super_limit)
                            .is_some(),
                    )),
                    other => Err(type_mismatch("in super", "string", other.type_name())),
                }
            }
            ExprKind::Slice {
                target,
                start,
                end,
                step,
            } => {
                let target = self.eval(target, env)?;
                let start = self.eval_optional(start.as_ref(), env)?;
                let end = self.eval_optional(end.as_ref(), env)?;
                let step = self.eval_optional(step.as_ref(), env)?;
                self.slice_value(&target, &start, &end, &step)
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                crate::operators::unary(*op, &value)
            }
            ExprKind::Error(message) => {
                let value = self.eval(message, env)?;
                let message = match value {
                    Value::Str(s) => s.to_string(),
                    other => self.manifest_output(&other)?,
                };
                Err(user_error(message))
            }
            ExprKind::Assert { assertion, rest } => {
                self.check_assertion(assertion, env)?;
                self.eval(rest, env)
            }
            ExprKind::Import { kind, path } => self.eval_import(*kind, path, expr.span),
        }
    }

    fn eval_optional(&mut self, expr: Option<&ExprRef>, env: EnvId) -> EvalResult<Value> {
        match expr {
            Some(expr) => self.eval(expr, env),
            None => Ok(Value::Null),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &ExprRef,
        right: &ExprRef,
        env: EnvId,
    ) -> EvalResult<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let lhs = match self.eval(left, env)? {
                    Value::Bool(b) => b,
                    other => return Err(type_mismatch(op.as_symbol(), "boolean", other.type_name())),
                };
                if (op == BinaryOp::And) != lhs {
                    return Ok(Value::Bool(lhs));
                }
                match self.eval(right, env)? {
                    Value::Bool(b) => Ok(Value::Bool(b)),
                    other => Err(type_mismatch(op.as_symbol(), "boolean", other.type_name())),
                }
            }
            _ => {
                let lhs = self.eval(left, env)?;
                let rhs = self.eval(right, env)?;
                self.apply_binary(op, &lhs, &rhs)
            }
        }
    }

    /// Binary operators on evaluated operands (everything but `&&`/`||`).
    pub(crate) fn apply_binary(&mut self, op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
        use crate::operators::{arithmetic, ordering_satisfies};
        match (op, lhs, rhs) {
            (BinaryOp::Add, Value::Str(_), _) | (BinaryOp::Add, _, Value::Str(_)) => {
                let mut out = self.to_string(lhs)?;
                out.push_str(&self.to_string(rhs)?);
                Ok(Value::str(&out))
            }
            (BinaryOp::Add, Value::Array(a), Value::Array(b)) => {
                let joined: Vec<ThunkId> = a.iter().chain(b.iter()).copied().collect();
                Ok(Value::Array(joined.into()))
            }
            (BinaryOp::Add, Value::Object(a), Value::Object(b)) => Ok(Value::Object(self.extend(*a, *b))),
            (BinaryOp::Mod, Value::Str(format), _) => {
                let formatted = self.format_string(format, rhs)?;
                Ok(Value::str(&formatted))
            }
            (BinaryOp::Eq, _, _) => Ok(Value::Bool(self.equals(lhs, rhs)?)),
            (BinaryOp::NotEq, _, _) => Ok(Value::Bool(!self.equals(lhs, rhs)?)),
            (BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq, _, _) => {
                let ordering = self.compare(lhs, rhs, op)?;
                Ok(Value::Bool(ordering_satisfies(op, ordering)))
            }
            (BinaryOp::In, Value::Str(name), Value::Object(obj)) => {
                Ok(Value::Bool(self.has_field(*obj, name, true)))
            }
            (BinaryOp::Div | BinaryOp::Mod, Value::Num(_), Value::Num(d)) if *d == 0.0 => {
                Err(division_by_zero())
            }
            (_, Value::Num(a), Value::Num(b)) => arithmetic(op, *a, *b),
            _ => Err(binary_types(op, lhs.type_name(), rhs.type_name())),
        }
    }

    pub(crate) fn check_assertion(&mut self, assertion: &AssertDef, env: EnvId) -> EvalResult<()> {
        match self.eval(&assertion.cond, env)? {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) => {
                let message = match &assertion.message {
                    Some(message) => match self.eval(message, env)? {
                        Value::Str(s) => s.to_string(),
                        other => self.manifest_output(&other)?,
                    },
                    None => String::new(),
                };
                Err(EvalError::from_kind(EvalErrorKind::AssertionFailed {
                    message,
                })
                .with_frame(assertion.span))
            }
            other => Err(type_mismatch("assert condition", "boolean", other.type_name())),
        }
    }

    /// String conversion used by `+` and `std.toString`: strings verbatim,
    /// everything else as single-line JSON.
    pub(crate) fn to_string(&mut self, value: &Value) -> EvalResult<String> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => self.manifest_single_line(other),
        }
    }

    /// Create an object from layers, base first.
    pub(crate) fn new_object(&mut self, layers: Vec<Rc<Layer>>) -> ObjId {
        self.heap
            .alloc_object(crate::object::ObjectData::new(layers.into()))
    }
}

//! Object construction, inheritance, field access and asserts.

use super::Vm;
use crate::errors::{no_such_field, type_mismatch, EvalError, EvalErrorKind, EvalResult};
use crate::heap::{EnvId, ObjCtx, ObjId, ThunkId};
use crate::object::{AssertState, FieldBody, Layer, LayerField};
use crate::value::Value;
use grz_ir::{BinaryOp, ExprRef, FieldName, ObjectBody, ObjectComp};
use std::rc::Rc;

impl Vm {
    /// The object context of the code running in `env`.
    pub(crate) fn object_ctx(&self, env: EnvId) -> EvalResult<ObjCtx> {
        self.heap
            .ctx(env)
            .ok_or_else(|| EvalError::from_kind(EvalErrorKind::NoSelf))
    }

    pub(crate) fn build_object(&mut self, body: &ObjectBody, env: EnvId) -> EvalResult<Value> {
        let mut layer = Layer {
            locals: Rc::clone(&body.locals),
            asserts: Rc::clone(&body.asserts),
            env: Some(env),
            ..Layer::default()
        };
        for field in &body.fields {
            let name = match &field.name {
                FieldName::Fixed(name) => Rc::clone(name),
                FieldName::Computed(key) => match self.field_key(key, env)? {
                    Some(name) => name,
                    None => continue,
                },
            };
            insert_field(
                &mut layer,
                name,
                LayerField {
                    plus: field.plus,
                    visibility: field.visibility,
                    body: FieldBody::Expr {
                        expr: Rc::clone(&field.value),
                        env,
                    },
                },
            )?;
        }
        Ok(Value::Object(self.new_object(vec![Rc::new(layer)])))
    }

    pub(crate) fn build_object_comp(&mut self, comp: &ObjectComp, env: EnvId) -> EvalResult<Value> {
        let envs = self.expand_comprehension(env, &comp.specs)?;
        let mut layer = Layer {
            locals: Rc::clone(&comp.locals),
            env: Some(env),
            ..Layer::default()
        };
        for field_env in envs {
            let Some(name) = self.field_key(&comp.key, field_env)? else {
                continue;
            };
            insert_field(
                &mut layer,
                name,
                LayerField {
                    plus: comp.plus,
                    visibility: comp.visibility,
                    body: FieldBody::Expr {
                        expr: Rc::clone(&comp.value),
                        env: field_env,
                    },
                },
            )?;
        }
        Ok(Value::Object(self.new_object(vec![Rc::new(layer)])))
    }

    /// Evaluate a computed field name; `null` omits the field.
    fn field_key(&mut self, key: &ExprRef, env: EnvId) -> EvalResult<Option<Rc<str>>> {
        match self.eval(key, env)? {
            Value::Str(name) => Ok(Some(name)),
            Value::Null => Ok(None),
            other => Err(type_mismatch("field name", "string", other.type_name())),
        }
    }

    /// Object made of plain values (std library results, decoded JSON).
    pub(crate) fn make_object(&mut self, fields: Vec<(Rc<str>, ThunkId)>) -> ObjId {
        self.new_object(vec![Rc::new(Layer::from_thunks(fields))])
    }

    /// `base + top`: `top`'s layers stacked over `base`'s.
    pub(crate) fn extend(&mut self, base: ObjId, top: ObjId) -> ObjId {
        let layers: Vec<Rc<Layer>> = self
            .heap
            .object(base)
            .layers
            .iter()
            .chain(self.heap.object(top).layers.iter())
            .cloned()
            .collect();
        self.new_object(layers)
    }

    pub(crate) fn has_field(&self, obj: ObjId, name: &str, include_hidden: bool) -> bool {
        let data = self.heap.object(obj);
        data.find_layer(name, data.layers.len()).is_some() && (include_hidden || data.is_visible(name))
    }

    pub(crate) fn field_names(&self, obj: ObjId, include_hidden: bool) -> Vec<Rc<str>> {
        self.heap.object(obj).field_names(include_hidden)
    }

    /// `obj.name`, running the object's asserts first and caching the result.
    pub(crate) fn get_field(&mut self, obj: ObjId, name: &str) -> EvalResult<Value> {
        self.ensure_asserts(obj)?;
        if let Some(value) = self.field_cache.get(&obj).and_then(|fields| fields.get(name)) {
            return Ok(value.clone());
        }
        let limit = self.heap.object(obj).layers.len();
        let value = self
            .field_below(obj, name, limit)?
            .ok_or_else(|| no_such_field(name))?;
        self.field_cache
            .entry(obj)
            .or_default()
            .insert(Rc::from(name), value.clone());
        Ok(value)
    }

    /// `super.name` from code running in `ctx`.
    pub(crate) fn super_field(&mut self, ctx: ObjCtx, name: &str) -> EvalResult<Value> {
        if ctx.super_limit == 0 {
            return Err(EvalError::from_kind(EvalErrorKind::NoSuper));
        }
        self.field_below(ctx.this, name, ctx.super_limit)?
            .ok_or_else(|| no_such_field(name))
    }

    /// Value of `name` as defined by layers `0..limit`, with `self` bound to
    /// the whole of `obj`. `+:` fields merge with what lies beneath them.
    fn field_below(&mut self, obj: ObjId, name: &str, limit: usize) -> EvalResult<Option<Value>> {
        let Some(idx) = self.heap.object(obj).find_layer(name, limit) else {
            return Ok(None);
        };
        let layer = Rc::clone(&self.heap.object(obj).layers[idx]);
        let Some(field) = layer.fields.get(name).cloned() else {
            return Ok(None);
        };

        let value = self.framed(|vm| match &field.body {
            FieldBody::Thunk(thunk) => vm.force(*thunk),
            FieldBody::Expr { expr, env } => {
                let frame = vm.field_env(obj, idx, &layer, *env);
                vm.eval(expr, frame)
            }
        })?;

        if field.plus {
            if let Some(inherited) = self.field_below(obj, name, idx)? {
                return self.apply_binary(BinaryOp::Add, &inherited, &value).map(Some);
            }
        }
        Ok(Some(value))
    }

    /// Scope for code inside layer `idx` of `obj`: the layer's locals plus
    /// `self`, `super` and `$`.
    fn field_env(&mut self, obj: ObjId, idx: usize, layer: &Layer, env: EnvId) -> EnvId {
        let dollar = self.heap.ctx(env).map_or(obj, |outer| outer.dollar);
        let ctx = ObjCtx {
            this: obj,
            super_limit: idx,
            dollar,
        };
        let frame = self.heap.alloc_env_with_ctx(Some(env), Some(ctx));
        for bind in layer.locals.iter() {
            let thunk = self.delay(&bind.value, frame);
            self.heap.bind(frame, Rc::clone(&bind.name), thunk);
        }
        frame
    }

    /// Run every layer's asserts once per object.
    ///
    /// While they run the object counts as checked, so asserts may read
    /// fields of `self`.
    pub(crate) fn ensure_asserts(&mut self, obj: ObjId) -> EvalResult<()> {
        if self.heap.object(obj).asserts != AssertState::Unchecked {
            return Ok(());
        }
        self.heap.object_mut(obj).asserts = AssertState::Checking;
        let layers = Rc::clone(&self.heap.object(obj).layers);
        for (idx, layer) in layers.iter().enumerate() {
            let Some(env) = layer.env else {
                continue;
            };
            if layer.asserts.is_empty() {
                continue;
            }
            let frame = self.field_env(obj, idx, layer, env);
            for assertion in layer.asserts.iter() {
                if let Err(err) = self.check_assertion(assertion, frame) {
                    self.heap.object_mut(obj).asserts = AssertState::Unchecked;
                    return Err(err);
                }
            }
        }
        self.heap.object_mut(obj).asserts = AssertState::Passed;
        Ok(())
    }
}

fn insert_field(layer: &mut Layer, name: Rc<str>, field: LayerField) -> EvalResult<()> {
    if layer.fields.contains_key(&name) {
        return Err(EvalError::from_kind(EvalErrorKind::DuplicateField {
            name: name.to_string(),
        }));
    }
    layer.fields.insert(name, field);
    Ok(())
}

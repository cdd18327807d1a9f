use super::{array_of, Args};
use crate::errors::EvalResult;
use crate::heap::{ObjId, Pending, ThunkId};
use crate::value::Value;
use crate::Vm;
use std::rc::Rc;

fn fields(vm: &mut Vm, args: &Args<'_>, include_hidden: bool) -> EvalResult<Value> {
    let obj = args.object(vm, 0)?;
    let names: Vec<Value> = vm
        .field_names(obj, include_hidden)
        .into_iter()
        .map(Value::Str)
        .collect();
    Ok(array_of(vm, names))
}

pub(super) fn object_fields(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    fields(vm, args, false)
}

pub(super) fn object_fields_all(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    fields(vm, args, true)
}

fn has(vm: &mut Vm, args: &Args<'_>, include_hidden: bool) -> EvalResult<Value> {
    let obj = args.object(vm, 0)?;
    let name = args.string(vm, 1)?;
    Ok(Value::Bool(vm.has_field(obj, &name, include_hidden)))
}

pub(super) fn object_has(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    has(vm, args, false)
}

pub(super) fn object_has_all(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    has(vm, args, true)
}

/// Lazy reference to `obj[name]`.
fn field_thunk(vm: &mut Vm, obj: ObjId, name: &Rc<str>) -> ThunkId {
    vm.heap.alloc_thunk(Pending::Field {
        obj,
        name: Rc::clone(name),
    })
}

fn values(vm: &mut Vm, args: &Args<'_>, include_hidden: bool) -> EvalResult<Value> {
    let obj = args.object(vm, 0)?;
    let thunks: Vec<ThunkId> = vm
        .field_names(obj, include_hidden)
        .iter()
        .map(|name| field_thunk(vm, obj, name))
        .collect();
    Ok(Value::Array(thunks.into()))
}

pub(super) fn object_values(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    values(vm, args, false)
}

pub(super) fn object_values_all(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    values(vm, args, true)
}

fn keys_values(vm: &mut Vm, args: &Args<'_>, include_hidden: bool) -> EvalResult<Value> {
    let obj = args.object(vm, 0)?;
    let mut pairs = Vec::new();
    for name in vm.field_names(obj, include_hidden) {
        let key = vm.heap.alloc_ready(Value::Str(Rc::clone(&name)));
        let value = field_thunk(vm, obj, &name);
        let pair = vm.make_object(vec![(Rc::from("key"), key), (Rc::from("value"), value)]);
        pairs.push(vm.heap.alloc_ready(Value::Object(pair)));
    }
    Ok(Value::Array(pairs.into()))
}

pub(super) fn object_keys_values(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    keys_values(vm, args, false)
}

pub(super) fn object_keys_values_all(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    keys_values(vm, args, true)
}

/// `o[f]` if present, else `default`. Hidden fields count unless
/// `inc_hidden` is false.
pub(super) fn get(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let obj = args.object(vm, 0)?;
    let name = args.string(vm, 1)?;
    let include_hidden = if args.is_given(3) {
        args.boolean(vm, 3)?
    } else {
        true
    };
    if vm.has_field(obj, &name, include_hidden) {
        vm.get_field(obj, &name)
    } else {
        args.value(vm, 2)
    }
}

/// RFC 7386 JSON merge patch.
pub(super) fn merge_patch(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let target = args.value(vm, 0)?;
    let patch = args.value(vm, 1)?;
    apply_patch(vm, &target, &patch)
}

fn apply_patch(vm: &mut Vm, target: &Value, patch: &Value) -> EvalResult<Value> {
    let Value::Object(patch_obj) = patch else {
        return Ok(patch.clone());
    };
    let target_obj = match target {
        Value::Object(obj) => Some(*obj),
        _ => None,
    };
    let target_names = target_obj.map(|obj| vm.field_names(obj, false)).unwrap_or_default();
    let patch_names = vm.field_names(*patch_obj, false);

    let mut names: Vec<Rc<str>> = target_names.iter().chain(&patch_names).cloned().collect();
    names.sort();
    names.dedup();

    let mut fields = Vec::new();
    for name in names {
        let in_patch = patch_names.contains(&name);
        let current = match target_obj {
            Some(obj) if target_names.contains(&name) => Some(vm.get_field(obj, &name)?),
            _ => None,
        };
        let merged = if in_patch {
            let patch_value = vm.get_field(*patch_obj, &name)?;
            if matches!(patch_value, Value::Null) {
                continue;
            }
            apply_patch(vm, &current.unwrap_or(Value::Null), &patch_value)?
        } else {
            match current {
                Some(value) => value,
                None => continue,
            }
        };
        fields.push((name, vm.heap.alloc_ready(merged)));
    }
    Ok(Value::Object(vm.make_object(fields)))
}

/// Recursively drop `null`, empty arrays and empty objects.
pub(super) fn prune(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    prune_value(vm, value)
}

fn is_empty_value(vm: &Vm, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => vm.field_names(*obj, false).is_empty(),
        _ => false,
    }
}

fn prune_value(vm: &mut Vm, value: Value) -> EvalResult<Value> {
    match value {
        Value::Array(items) => {
            let mut kept = Vec::new();
            for item in items.iter() {
                let item = vm.force(*item)?;
                let pruned = prune_value(vm, item)?;
                if !is_empty_value(vm, &pruned) {
                    kept.push(pruned);
                }
            }
            Ok(array_of(vm, kept))
        }
        Value::Object(obj) => {
            let mut fields = Vec::new();
            for name in vm.field_names(obj, false) {
                let field = vm.get_field(obj, &name)?;
                let pruned = prune_value(vm, field)?;
                if !is_empty_value(vm, &pruned) {
                    fields.push((name, vm.heap.alloc_ready(pruned)));
                }
            }
            Ok(Value::Object(vm.make_object(fields)))
        }
        other => Ok(other),
    }
}

/// Copy of `obj` without `key`; only visible fields are kept.
pub(super) fn object_remove_key(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let obj = args.object(vm, 0)?;
    let key = args.string(vm, 1)?;
    let fields: Vec<(Rc<str>, ThunkId)> = vm
        .field_names(obj, false)
        .into_iter()
        .filter(|name| **name != *key)
        .map(|name| {
            let value = field_thunk(vm, obj, &name);
            (name, value)
        })
        .collect();
    Ok(Value::Object(vm.make_object(fields)))
}

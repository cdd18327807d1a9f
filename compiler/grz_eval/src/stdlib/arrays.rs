use super::{array_of, force_all, Args};
use crate::errors::{EvalError, EvalResult};
use crate::heap::{Pending, ThunkId};
use crate::interpreter::to_integer;
use crate::value::Value;
use crate::Vm;
use grz_ir::BinaryOp;
use std::cmp::Ordering;
use std::rc::Rc;

/// Deferred `func(args...)`.
fn lazy_call(vm: &mut Vm, func: &Value, args: Vec<ThunkId>) -> ThunkId {
    vm.heap.alloc_thunk(Pending::Apply {
        func: func.clone(),
        args: args.into(),
    })
}

/// Elements of an array argument; strings count as arrays of characters.
fn elements(vm: &mut Vm, args: &Args<'_>, idx: usize) -> EvalResult<Rc<[ThunkId]>> {
    match args.value(vm, idx)? {
        Value::Array(items) => Ok(items),
        Value::Str(s) => Ok(s
            .chars()
            .map(|c| vm.heap.alloc_ready(Value::str(c.encode_utf8(&mut [0; 4]))))
            .collect()),
        other => Err(args.wrong_type(idx, "array or string", &other)),
    }
}

fn expect_bool(value: Value, what: &str) -> EvalResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::new(format!(
            "{what} must return a boolean, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn make_array(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let size = to_integer(args.number(vm, 0)?)?;
    let func = args.function(vm, 1)?;
    if size < 0 {
        return Err(EvalError::new(format!("makeArray requires size >= 0, got {size}")));
    }
    let thunks: Vec<ThunkId> = (0..size)
        .map(|i| {
            let index = vm.heap.alloc_ready(Value::Num(i as f64));
            lazy_call(vm, &func, vec![index])
        })
        .collect();
    Ok(Value::Array(thunks.into()))
}

/// Integers from `from` to `to`, inclusive.
pub(super) fn range(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let from = to_integer(args.number(vm, 0)?)?;
    let to = to_integer(args.number(vm, 1)?)?;
    let values: Vec<Value> = (from..=to).map(|i| Value::Num(i as f64)).collect();
    Ok(array_of(vm, values))
}

pub(super) fn map(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    let items = elements(vm, args, 1)?;
    let thunks: Vec<ThunkId> = items.iter().map(|item| lazy_call(vm, &func, vec![*item])).collect();
    Ok(Value::Array(thunks.into()))
}

pub(super) fn map_with_index(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    let items = elements(vm, args, 1)?;
    let thunks: Vec<ThunkId> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let index = vm.heap.alloc_ready(Value::Num(i as f64));
            lazy_call(vm, &func, vec![index, *item])
        })
        .collect();
    Ok(Value::Array(thunks.into()))
}

/// Object with the visible fields of `obj`, each mapped through
/// `func(key, value)`.
pub(super) fn map_with_key(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    let obj = args.object(vm, 1)?;
    let mut fields = Vec::new();
    for name in vm.field_names(obj, false) {
        let key = vm.heap.alloc_ready(Value::Str(Rc::clone(&name)));
        let value = vm.heap.alloc_thunk(Pending::Field {
            obj,
            name: Rc::clone(&name),
        });
        fields.push((name, lazy_call(vm, &func, vec![key, value])));
    }
    Ok(Value::Object(vm.make_object(fields)))
}

pub(super) fn filter(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    let items = args.array(vm, 1)?;
    let mut kept = Vec::new();
    for item in items.iter() {
        if expect_bool(vm.call_value(&func, &[*item])?, "filter function")? {
            kept.push(*item);
        }
    }
    Ok(Value::Array(kept.into()))
}

pub(super) fn filter_map(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let filter_func = args.function(vm, 0)?;
    let map_func = args.function(vm, 1)?;
    let items = args.array(vm, 2)?;
    let mut mapped = Vec::new();
    for item in items.iter() {
        if expect_bool(vm.call_value(&filter_func, &[*item])?, "filter function")? {
            mapped.push(lazy_call(vm, &map_func, vec![*item]));
        }
    }
    Ok(Value::Array(mapped.into()))
}

/// Map each element to an array and concatenate; over a string each
/// character maps to a string.
pub(super) fn flat_map(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    match args.value(vm, 1)? {
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items.iter() {
                match vm.call_value(&func, &[*item])? {
                    Value::Array(part) => out.extend(part.iter().copied()),
                    Value::Null => {}
                    other => {
                        return Err(EvalError::new(format!(
                            "flatMap function must return an array, got {}",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::Array(out.into()))
        }
        Value::Str(s) => {
            let mut out = String::new();
            for c in s.chars() {
                let arg = Value::str(c.encode_utf8(&mut [0; 4]));
                match vm.call_with_values(&func, &[arg])? {
                    Value::Str(part) => out.push_str(&part),
                    Value::Null => {}
                    other => {
                        return Err(EvalError::new(format!(
                            "flatMap function must return a string, got {}",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::str(&out))
        }
        other => Err(args.wrong_type(1, "array or string", &other)),
    }
}

pub(super) fn foldl(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    let items = elements(vm, args, 1)?;
    let mut acc = args.value(vm, 2)?;
    for item in items.iter() {
        let acc_thunk = vm.heap.alloc_ready(acc);
        acc = vm.call_value(&func, &[acc_thunk, *item])?;
    }
    Ok(acc)
}

pub(super) fn foldr(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let func = args.function(vm, 0)?;
    let items = elements(vm, args, 1)?;
    let mut acc = args.value(vm, 2)?;
    for item in items.iter().rev() {
        let acc_thunk = vm.heap.alloc_ready(acc);
        acc = vm.call_value(&func, &[*item, acc_thunk])?;
    }
    Ok(acc)
}

pub(super) fn flatten_arrays(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let mut out = Vec::new();
    for item in force_all(vm, &items)? {
        match item {
            Value::Array(part) => out.extend(part.iter().copied()),
            Value::Null => {}
            other => return Err(args.wrong_type(0, "array of arrays", &other)),
        }
    }
    Ok(Value::Array(out.into()))
}

pub(super) fn reverse(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let reversed: Vec<ThunkId> = items.iter().rev().copied().collect();
    Ok(Value::Array(reversed.into()))
}

/// Sort keys for `items`: the elements themselves, or `key_fn` of each.
fn sort_keys(vm: &mut Vm, items: &[ThunkId], key_fn: Option<&Value>) -> EvalResult<Vec<Value>> {
    match key_fn {
        Some(func) => items.iter().map(|item| vm.call_value(func, &[*item])).collect(),
        None => force_all(vm, items),
    }
}

fn compare_keys(vm: &mut Vm, a: &Value, b: &Value) -> EvalResult<Ordering> {
    vm.compare(a, b, BinaryOp::Lt)
}

/// Stable merge sort of `order` (indices into `keys`) with a fallible
/// comparison.
fn merge_sort(vm: &mut Vm, keys: &[Value], order: &mut Vec<usize>) -> EvalResult<()> {
    if order.len() <= 1 {
        return Ok(());
    }
    let mut right = order.split_off(order.len() / 2);
    merge_sort(vm, keys, order)?;
    merge_sort(vm, keys, &mut right)?;
    let left = std::mem::take(order);
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if compare_keys(vm, &keys[right[j]], &keys[left[i]])? == Ordering::Less {
            order.push(right[j]);
            j += 1;
        } else {
            order.push(left[i]);
            i += 1;
        }
    }
    order.extend_from_slice(&left[i..]);
    order.extend_from_slice(&right[j..]);
    Ok(())
}

/// Sorted elements together with their keys.
fn sorted(vm: &mut Vm, items: &[ThunkId], key_fn: Option<&Value>) -> EvalResult<(Vec<ThunkId>, Vec<Value>)> {
    let keys = sort_keys(vm, items, key_fn)?;
    let mut order: Vec<usize> = (0..items.len()).collect();
    merge_sort(vm, &keys, &mut order)?;
    Ok((
        order.iter().map(|i| items[*i]).collect(),
        order.iter().map(|i| keys[*i].clone()).collect(),
    ))
}

/// Drop elements whose key equals the previous element's key.
fn dedup_sorted(vm: &mut Vm, items: Vec<ThunkId>, keys: &[Value]) -> EvalResult<Vec<ThunkId>> {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if i == 0 || !vm.equals(&keys[i - 1], &keys[i])? {
            out.push(item);
        }
    }
    Ok(out)
}

pub(super) fn sort(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = elements(vm, args, 0)?;
    let key_fn = args.key_function(vm, 1)?;
    let (ordered, _) = sorted(vm, &items, key_fn.as_ref())?;
    Ok(Value::Array(ordered.into()))
}

pub(super) fn uniq(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let key_fn = args.key_function(vm, 1)?;
    let keys = sort_keys(vm, &items, key_fn.as_ref())?;
    let unique = dedup_sorted(vm, items.to_vec(), &keys)?;
    Ok(Value::Array(unique.into()))
}

pub(super) fn set(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let key_fn = args.key_function(vm, 1)?;
    let (ordered, keys) = sorted(vm, &items, key_fn.as_ref())?;
    let unique = dedup_sorted(vm, ordered, &keys)?;
    Ok(Value::Array(unique.into()))
}

pub(super) fn set_member(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let x = args.thunk(vm, 0);
    let items = args.array(vm, 1)?;
    let key_fn = args.key_function(vm, 2)?;
    let needle = sort_keys(vm, &[x], key_fn.as_ref())?;
    let keys = sort_keys(vm, &items, key_fn.as_ref())?;
    for key in &keys {
        if vm.equals(key, &needle[0])? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum SetOp {
    Union,
    Inter,
    Diff,
}

/// Merge two sets (sorted, duplicate-free arrays).
fn set_merge(vm: &mut Vm, args: &Args<'_>, op: SetOp) -> EvalResult<Value> {
    let a = args.array(vm, 0)?;
    let b = args.array(vm, 1)?;
    let key_fn = args.key_function(vm, 2)?;
    let ka = sort_keys(vm, &a, key_fn.as_ref())?;
    let kb = sort_keys(vm, &b, key_fn.as_ref())?;

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match compare_keys(vm, &ka[i], &kb[j])? {
            Ordering::Less => {
                if op != SetOp::Inter {
                    out.push(a[i]);
                }
                i += 1;
            }
            Ordering::Greater => {
                if op == SetOp::Union {
                    out.push(b[j]);
                }
                j += 1;
            }
            Ordering::Equal => {
                if op != SetOp::Diff {
                    out.push(a[i]);
                }
                i += 1;
                j += 1;
            }
        }
    }
    if op != SetOp::Inter {
        out.extend_from_slice(&a[i..]);
    }
    if op == SetOp::Union {
        out.extend_from_slice(&b[j..]);
    }
    Ok(Value::Array(out.into()))
}

pub(super) fn set_union(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    set_merge(vm, args, SetOp::Union)
}

pub(super) fn set_inter(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    set_merge(vm, args, SetOp::Inter)
}

pub(super) fn set_diff(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    set_merge(vm, args, SetOp::Diff)
}

/// Indices of the elements of `items` equal to `needle`.
fn matching(vm: &mut Vm, items: &[ThunkId], needle: &Value) -> EvalResult<Vec<usize>> {
    let mut found = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let value = vm.force(*item)?;
        if vm.equals(&value, needle)? {
            found.push(i);
        }
    }
    Ok(found)
}

pub(super) fn member(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let x = args.value(vm, 1)?;
    match args.value(vm, 0)? {
        Value::Str(s) => match x {
            Value::Str(sub) => Ok(Value::Bool(s.contains(&*sub))),
            other => Err(args.wrong_type(1, "string", &other)),
        },
        Value::Array(items) => Ok(Value::Bool(!matching(vm, &items, &x)?.is_empty())),
        other => Err(args.wrong_type(0, "array or string", &other)),
    }
}

pub(super) fn contains(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let elem = args.value(vm, 1)?;
    Ok(Value::Bool(!matching(vm, &items, &elem)?.is_empty()))
}

pub(super) fn count(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let x = args.value(vm, 1)?;
    Ok(Value::Num(matching(vm, &items, &x)?.len() as f64))
}

pub(super) fn find(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let value = args.value(vm, 0)?;
    let items = args.array(vm, 1)?;
    let indices = matching(vm, &items, &value)?;
    Ok(array_of(vm, indices.into_iter().map(|i| Value::Num(i as f64))))
}

pub(super) fn all(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    for item in items.iter() {
        if !expect_bool(vm.force(*item)?, "std.all element")? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub(super) fn any(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    for item in items.iter() {
        if expect_bool(vm.force(*item)?, "std.any element")? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

pub(super) fn sum(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let mut total = 0.0;
    for item in force_all(vm, &items)? {
        match item {
            Value::Num(n) => total += n,
            other => return Err(args.wrong_type(0, "array of numbers", &other)),
        }
    }
    Ok(Value::Num(total))
}

pub(super) fn slice(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let target = args.value(vm, 0)?;
    let start = args.value(vm, 1)?;
    let end = args.value(vm, 2)?;
    let step = args.value(vm, 3)?;
    vm.slice_value(&target, &start, &end, &step)
}

pub(super) fn repeat(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let what = args.value(vm, 0)?;
    let count = to_integer(args.number(vm, 1)?)?;
    let count = usize::try_from(count)
        .map_err(|_| EvalError::new(format!("std.repeat: count must be >= 0, got {count}")))?;
    match what {
        Value::Str(s) => Ok(Value::str(&s.repeat(count))),
        Value::Array(items) => Ok(Value::Array(items.repeat(count).into())),
        other => Err(args.wrong_type(0, "array or string", &other)),
    }
}

pub(super) fn remove_at(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let at = to_integer(args.number(vm, 1)?)?;
    let kept: Vec<ThunkId> = items
        .iter()
        .enumerate()
        .filter(|(i, _)| i64::try_from(*i).ok() != Some(at))
        .map(|(_, item)| *item)
        .collect();
    Ok(Value::Array(kept.into()))
}

/// Drop the first element equal to `elem`.
pub(super) fn remove(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let elem = args.value(vm, 1)?;
    let mut kept = items.to_vec();
    if let Some(first) = matching(vm, &items, &elem)?.first() {
        kept.remove(*first);
    }
    Ok(Value::Array(kept.into()))
}

/// Concatenate a string or an arbitrarily nested array of strings.
pub(super) fn deep_join(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    fn walk(vm: &mut Vm, value: Value, out: &mut String) -> EvalResult<()> {
        match value {
            Value::Str(s) => out.push_str(&s),
            Value::Array(items) => {
                for item in items.iter() {
                    let item = vm.force(*item)?;
                    walk(vm, item, out)?;
                }
            }
            other => {
                return Err(EvalError::new(format!(
                    "std.deepJoin: expected string or array, got {}",
                    other.type_name()
                )));
            }
        }
        Ok(())
    }
    let mut out = String::new();
    let value = args.value(vm, 0)?;
    walk(vm, value, &mut out)?;
    Ok(Value::str(&out))
}

/// Flatten nested arrays; any other value becomes a one-element array.
pub(super) fn flatten_deep_array(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    fn walk(vm: &mut Vm, thunk: ThunkId, out: &mut Vec<ThunkId>) -> EvalResult<()> {
        match vm.force(thunk)? {
            Value::Array(items) => {
                for item in items.iter() {
                    walk(vm, *item, out)?;
                }
            }
            _ => out.push(thunk),
        }
        Ok(())
    }
    let mut out = Vec::new();
    let value = args.thunk(vm, 0);
    walk(vm, value, &mut out)?;
    Ok(Value::Array(out.into()))
}

/// Smallest (or largest) element by key; `onEmpty` is returned for an
/// empty array when given.
fn extreme(vm: &mut Vm, args: &Args<'_>, wanted: Ordering) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    let key_fn = args.key_function(vm, 1)?;
    if items.is_empty() {
        if args.is_given(2) {
            return args.value(vm, 2);
        }
        return Err(EvalError::new(format!(
            "std.{}: expected at least one element in array, got none",
            args.name()
        )));
    }
    let keys = sort_keys(vm, &items, key_fn.as_ref())?;
    let mut best = 0;
    for i in 1..keys.len() {
        if compare_keys(vm, &keys[i], &keys[best])? == wanted {
            best = i;
        }
    }
    vm.force(items[best])
}

pub(super) fn min_array(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    extreme(vm, args, Ordering::Less)
}

pub(super) fn max_array(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    extreme(vm, args, Ordering::Greater)
}

pub(super) fn avg(vm: &mut Vm, args: &Args<'_>) -> EvalResult<Value> {
    let items = args.array(vm, 0)?;
    if items.is_empty() {
        return Err(EvalError::new("std.avg: cannot average an empty array"));
    }
    let Value::Num(total) = sum(vm, args)? else {
        return Err(EvalError::new("std.avg: expected an array of numbers"));
    };
    Ok(Value::Num(total / items.len() as f64))
}

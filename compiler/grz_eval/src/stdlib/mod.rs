//! The `std` object's functions, implemented natively.
//!
//! [`BUILTINS`] is the registration table: the VM installs every entry as a
//! hidden field of each file's `std`. Functions receive their arguments as
//! unforced thunks through [`Args`], so a function only evaluates what it
//! needs and can build lazy results.
//!
//! # Module Structure
//!
//! - [`types`]: type predicates, `type`, `length`, `equals`
//! - [`strings`]: string functions, `format`, JSON string helpers
//! - [`arrays`]: array construction, higher-order functions, sets
//! - [`objects`]: field introspection, `get`, `mergePatch`, `prune`
//! - [`math`]: numeric functions
//! - [`encoding`]: base64, UTF-8 byte arrays and hex digests
//! - [`misc`]: manifesting, `native`, `trace`, `extVar`, `assertEqual`

mod arrays;
mod encoding;
mod math;
mod misc;
mod objects;
mod strings;
mod types;

use crate::errors::{type_mismatch, EvalResult};
use crate::heap::{ObjId, ThunkId};
use crate::value::Value;
use crate::Vm;
use std::rc::Rc;

/// Native implementation of one `std` function.
pub(crate) type BuiltinFn = fn(&mut Vm, &Args<'_>) -> EvalResult<Value>;

pub(crate) struct Builtin {
    pub name: &'static str,
    pub params: &'static [&'static str],
    /// Leading parameters that must be supplied; the rest are optional.
    pub required: usize,
    pub func: BuiltinFn,
}

const fn builtin(
    name: &'static str,
    params: &'static [&'static str],
    required: usize,
    func: BuiltinFn,
) -> Builtin {
    Builtin {
        name,
        params,
        required,
        func,
    }
}

/// Every `std` function, in no particular order.
pub(crate) static BUILTINS: &[Builtin] = &[
    // types
    builtin("isString", &["v"], 1, types::is_string),
    builtin("isNumber", &["v"], 1, types::is_number),
    builtin("isBoolean", &["v"], 1, types::is_boolean),
    builtin("isObject", &["v"], 1, types::is_object),
    builtin("isArray", &["v"], 1, types::is_array),
    builtin("isFunction", &["v"], 1, types::is_function),
    builtin("type", &["x"], 1, types::type_of),
    builtin("length", &["x"], 1, types::length),
    builtin("equals", &["a", "b"], 2, types::equals),
    // strings
    builtin("toString", &["a"], 1, strings::to_string),
    builtin("codepoint", &["str"], 1, strings::codepoint),
    builtin("char", &["n"], 1, strings::char),
    builtin("substr", &["str", "from", "len"], 3, strings::substr),
    builtin("startsWith", &["a", "b"], 2, strings::starts_with),
    builtin("endsWith", &["a", "b"], 2, strings::ends_with),
    builtin("split", &["str", "c"], 2, strings::split),
    builtin("splitLimit", &["str", "c", "maxsplits"], 3, strings::split_limit),
    builtin("strReplace", &["str", "from", "to"], 3, strings::str_replace),
    builtin("asciiUpper", &["str"], 1, strings::ascii_upper),
    builtin("asciiLower", &["str"], 1, strings::ascii_lower),
    builtin("stringChars", &["str"], 1, strings::string_chars),
    builtin("join", &["sep", "arr"], 2, strings::join),
    builtin("lines", &["arr"], 1, strings::lines),
    builtin("trim", &["str"], 1, strings::trim),
    builtin("stripChars", &["str", "chars"], 2, strings::strip_chars),
    builtin("lstripChars", &["str", "chars"], 2, strings::lstrip_chars),
    builtin("rstripChars", &["str", "chars"], 2, strings::rstrip_chars),
    builtin("format", &["str", "vals"], 2, strings::format),
    builtin("escapeStringJson", &["str"], 1, strings::escape_string_json),
    builtin("parseInt", &["str"], 1, strings::parse_int),
    builtin("parseJson", &["str"], 1, strings::parse_json),
    builtin("isEmpty", &["str"], 1, strings::is_empty),
    builtin("findSubstr", &["pat", "str"], 2, strings::find_substr),
    builtin("equalsIgnoreCase", &["str1", "str2"], 2, strings::equals_ignore_case),
    // encoding
    builtin("base64", &["input"], 1, encoding::base64),
    builtin("base64Decode", &["str"], 1, encoding::base64_decode),
    builtin("base64DecodeBytes", &["str"], 1, encoding::base64_decode_bytes),
    builtin("encodeUTF8", &["str"], 1, encoding::encode_utf8),
    builtin("decodeUTF8", &["arr"], 1, encoding::decode_utf8),
    builtin("md5", &["s"], 1, encoding::md5),
    builtin("sha1", &["s"], 1, encoding::sha1),
    builtin("sha256", &["s"], 1, encoding::sha256),
    builtin("sha512", &["s"], 1, encoding::sha512),
    // arrays
    builtin("makeArray", &["sz", "func"], 2, arrays::make_array),
    builtin("range", &["from", "to"], 2, arrays::range),
    builtin("map", &["func", "arr"], 2, arrays::map),
    builtin("mapWithIndex", &["func", "arr"], 2, arrays::map_with_index),
    builtin("mapWithKey", &["func", "obj"], 2, arrays::map_with_key),
    builtin("filter", &["func", "arr"], 2, arrays::filter),
    builtin("filterMap", &["filter_func", "map_func", "arr"], 3, arrays::filter_map),
    builtin("flatMap", &["func", "arr"], 2, arrays::flat_map),
    builtin("foldl", &["func", "arr", "init"], 3, arrays::foldl),
    builtin("foldr", &["func", "arr", "init"], 3, arrays::foldr),
    builtin("flattenArrays", &["arrs"], 1, arrays::flatten_arrays),
    builtin("reverse", &["arr"], 1, arrays::reverse),
    builtin("sort", &["arr", "keyF"], 1, arrays::sort),
    builtin("uniq", &["arr", "keyF"], 1, arrays::uniq),
    builtin("set", &["arr", "keyF"], 1, arrays::set),
    builtin("setMember", &["x", "arr", "keyF"], 2, arrays::set_member),
    builtin("setUnion", &["a", "b", "keyF"], 2, arrays::set_union),
    builtin("setInter", &["a", "b", "keyF"], 2, arrays::set_inter),
    builtin("setDiff", &["a", "b", "keyF"], 2, arrays::set_diff),
    builtin("member", &["arr", "x"], 2, arrays::member),
    builtin("contains", &["arr", "elem"], 2, arrays::contains),
    builtin("count", &["arr", "x"], 2, arrays::count),
    builtin("find", &["value", "arr"], 2, arrays::find),
    builtin("all", &["arr"], 1, arrays::all),
    builtin("any", &["arr"], 1, arrays::any),
    builtin("sum", &["arr"], 1, arrays::sum),
    builtin("slice", &["indexable", "index", "end", "step"], 4, arrays::slice),
    builtin("repeat", &["what", "count"], 2, arrays::repeat),
    builtin("removeAt", &["arr", "at"], 2, arrays::remove_at),
    builtin("remove", &["arr", "elem"], 2, arrays::remove),
    builtin("deepJoin", &["arr"], 1, arrays::deep_join),
    builtin("flattenDeepArray", &["value"], 1, arrays::flatten_deep_array),
    builtin("minArray", &["arr", "keyF", "onEmpty"], 1, arrays::min_array),
    builtin("maxArray", &["arr", "keyF", "onEmpty"], 1, arrays::max_array),
    builtin("avg", &["arr"], 1, arrays::avg),
    // objects
    builtin("objectFields", &["o"], 1, objects::object_fields),
    builtin("objectFieldsAll", &["o"], 1, objects::object_fields_all),
    builtin("objectHas", &["o", "f"], 2, objects::object_has),
    builtin("objectHasAll", &["o", "f"], 2, objects::object_has_all),
    builtin("objectValues", &["o"], 1, objects::object_values),
    builtin("objectValuesAll", &["o"], 1, objects::object_values_all),
    builtin("objectKeysValues", &["o"], 1, objects::object_keys_values),
    builtin("objectKeysValuesAll", &["o"], 1, objects::object_keys_values_all),
    builtin("get", &["o", "f", "default", "inc_hidden"], 2, objects::get),
    builtin("mergePatch", &["target", "patch"], 2, objects::merge_patch),
    builtin("prune", &["a"], 1, objects::prune),
    builtin("objectRemoveKey", &["obj", "key"], 2, objects::object_remove_key),
    // math
    builtin("abs", &["n"], 1, math::abs),
    builtin("sign", &["n"], 1, math::sign),
    builtin("max", &["a", "b"], 2, math::max),
    builtin("min", &["a", "b"], 2, math::min),
    builtin("pow", &["x", "n"], 2, math::pow),
    builtin("floor", &["x"], 1, math::floor),
    builtin("ceil", &["x"], 1, math::ceil),
    builtin("sqrt", &["x"], 1, math::sqrt),
    builtin("round", &["x"], 1, math::round),
    builtin("mod", &["a", "b"], 2, math::modulo),
    builtin("isInteger", &["x"], 1, math::is_integer),
    builtin("isDecimal", &["x"], 1, math::is_decimal),
    builtin("isEven", &["x"], 1, math::is_even),
    builtin("isOdd", &["x"], 1, math::is_odd),
    builtin("clamp", &["x", "minVal", "maxVal"], 3, math::clamp),
    builtin("exp", &["x"], 1, math::exp),
    builtin("log", &["x"], 1, math::log),
    // misc
    builtin("manifestJson", &["value"], 1, misc::manifest_json),
    builtin("manifestJsonEx", &["value", "indent", "newline", "key_val_sep"], 2, misc::manifest_json_ex),
    builtin("manifestJsonMinified", &["value"], 1, misc::manifest_json_minified),
    builtin("native", &["name"], 1, misc::native),
    builtin("extVar", &["x"], 1, misc::ext_var),
    builtin("trace", &["str", "rest"], 2, misc::trace),
    builtin("assertEqual", &["a", "b"], 2, misc::assert_equal),
];

/// Arguments of one builtin call, bound to parameter slots but not forced.
pub(crate) struct Args<'a> {
    builtin: &'static Builtin,
    thunks: &'a [Option<ThunkId>],
}

impl<'a> Args<'a> {
    pub fn new(builtin: &'static Builtin, thunks: &'a [Option<ThunkId>]) -> Self {
        Args { builtin, thunks }
    }

    pub fn name(&self) -> &'static str {
        self.builtin.name
    }

    fn context(&self, idx: usize) -> String {
        format!("std.{}: parameter {}", self.builtin.name, self.builtin.params[idx])
    }

    pub fn is_given(&self, idx: usize) -> bool {
        matches!(self.thunks.get(idx), Some(Some(_)))
    }

    /// The unforced argument; optional parameters that were not given
    /// default to `null`.
    pub fn thunk(&self, vm: &mut Vm, idx: usize) -> ThunkId {
        match self.thunks.get(idx) {
            Some(Some(thunk)) => *thunk,
            _ => vm.heap.alloc_ready(Value::Null),
        }
    }

    pub fn value(&self, vm: &mut Vm, idx: usize) -> EvalResult<Value> {
        match self.thunks.get(idx) {
            Some(Some(thunk)) => vm.force(*thunk),
            _ => Ok(Value::Null),
        }
    }

    pub fn string(&self, vm: &mut Vm, idx: usize) -> EvalResult<Rc<str>> {
        match self.value(vm, idx)? {
            Value::Str(s) => Ok(s),
            other => Err(type_mismatch(&self.context(idx), "string", other.type_name())),
        }
    }

    pub fn number(&self, vm: &mut Vm, idx: usize) -> EvalResult<f64> {
        match self.value(vm, idx)? {
            Value::Num(n) => Ok(n),
            other => Err(type_mismatch(&self.context(idx), "number", other.type_name())),
        }
    }

    pub fn boolean(&self, vm: &mut Vm, idx: usize) -> EvalResult<bool> {
        match self.value(vm, idx)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch(&self.context(idx), "boolean", other.type_name())),
        }
    }

    pub fn array(&self, vm: &mut Vm, idx: usize) -> EvalResult<Rc<[ThunkId]>> {
        match self.value(vm, idx)? {
            Value::Array(items) => Ok(items),
            other => Err(type_mismatch(&self.context(idx), "array", other.type_name())),
        }
    }

    pub fn object(&self, vm: &mut Vm, idx: usize) -> EvalResult<ObjId> {
        match self.value(vm, idx)? {
            Value::Object(obj) => Ok(obj),
            other => Err(type_mismatch(&self.context(idx), "object", other.type_name())),
        }
    }

    pub fn function(&self, vm: &mut Vm, idx: usize) -> EvalResult<Value> {
        match self.value(vm, idx)? {
            func @ Value::Function(_) => Ok(func),
            other => Err(type_mismatch(&self.context(idx), "function", other.type_name())),
        }
    }

    /// Optional `keyF` argument; `None` means identity.
    pub fn key_function(&self, vm: &mut Vm, idx: usize) -> EvalResult<Option<Value>> {
        if self.is_given(idx) {
            self.function(vm, idx).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Type error for an argument that has none of the accepted types.
    pub fn wrong_type(&self, idx: usize, expected: &'static str, got: &Value) -> crate::errors::EvalError {
        type_mismatch(&self.context(idx), expected, got.type_name())
    }
}

/// Array of already evaluated values.
pub(crate) fn array_of(vm: &mut Vm, values: impl IntoIterator<Item = Value>) -> Value {
    let thunks: Vec<ThunkId> = values.into_iter().map(|v| vm.heap.alloc_ready(v)).collect();
    Value::Array(thunks.into())
}

/// Force every element of an array.
pub(crate) fn force_all(vm: &mut Vm, items: &[ThunkId]) -> EvalResult<Vec<Value>> {
    items.iter().map(|thunk| vm.force(*thunk)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_unique() {
        let mut names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_required_within_params() {
        for builtin in BUILTINS {
            assert!(builtin.required <= builtin.params.len(), "std.{}", builtin.name);
        }
    }
}

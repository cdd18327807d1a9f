//! Object representation.
//!
//! An object is a stack of layers, base first. Each object literal
//! contributes one layer; `a + b` produces a new object whose layers are
//! `a`'s followed by `b`'s. Field lookup searches from the top layer down,
//! and `super` inside layer `i` only sees layers below `i`.

use crate::heap::{EnvId, ThunkId};
use grz_ir::{AssertDef, Bind, ExprRef, Visibility};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// How a field's value is produced.
#[derive(Clone, Debug)]
pub(crate) enum FieldBody {
    /// Evaluate `expr` in a child of `env` that binds the layer's locals and
    /// the object context.
    Expr { expr: ExprRef, env: EnvId },
    /// Shared precomputed or lazily computed value, independent of `self`.
    Thunk(ThunkId),
}

#[derive(Clone, Debug)]
pub(crate) struct LayerField {
    pub plus: bool,
    pub visibility: Visibility,
    pub body: FieldBody,
}

/// Fields contributed by one object literal (or one builtin-made object).
#[derive(Debug)]
pub(crate) struct Layer {
    pub fields: FxHashMap<Rc<str>, LayerField>,
    /// Object-level `local`s, rebound for every field evaluation.
    pub locals: Rc<[Bind]>,
    pub asserts: Rc<[AssertDef]>,
    /// Scope the literal was evaluated in; asserts run in a child of it.
    pub env: Option<EnvId>,
}

impl Default for Layer {
    fn default() -> Self {
        Layer {
            fields: FxHashMap::default(),
            locals: Rc::from(Vec::new()),
            asserts: Rc::from(Vec::new()),
            env: None,
        }
    }
}

impl Layer {
    /// Layer made of already-known values, visible and without locals.
    pub fn from_thunks(fields: impl IntoIterator<Item = (Rc<str>, ThunkId)>) -> Self {
        Layer {
            fields: fields
                .into_iter()
                .map(|(name, thunk)| {
                    (
                        name,
                        LayerField {
                            plus: false,
                            visibility: Visibility::Inherit,
                            body: FieldBody::Thunk(thunk),
                        },
                    )
                })
                .collect(),
            ..Layer::default()
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum AssertState {
    Unchecked,
    Checking,
    Passed,
}

#[derive(Debug)]
pub(crate) struct ObjectData {
    pub layers: Rc<[Rc<Layer>]>,
    pub asserts: AssertState,
}

impl ObjectData {
    pub fn new(layers: Rc<[Rc<Layer>]>) -> Self {
        let has_asserts = layers.iter().any(|l| !l.asserts.is_empty());
        ObjectData {
            layers,
            asserts: if has_asserts {
                AssertState::Unchecked
            } else {
                AssertState::Passed
            },
        }
    }

    /// Index of the topmost layer below `limit` that defines `name`.
    pub fn find_layer(&self, name: &str, limit: usize) -> Option<usize> {
        self.layers[..limit.min(self.layers.len())]
            .iter()
            .rposition(|layer| layer.fields.contains_key(name))
    }

    /// Whether `name` shows up when the object is manifested or listed.
    ///
    /// The topmost layer with an explicit `::` or `:::` decides; a field
    /// declared only with `:` is visible.
    pub fn is_visible(&self, name: &str) -> bool {
        for layer in self.layers.iter().rev() {
            if let Some(field) = layer.fields.get(name) {
                match field.visibility {
                    Visibility::Hidden => return false,
                    Visibility::Forced => return true,
                    Visibility::Inherit => {}
                }
            }
        }
        true
    }

    /// All field names, sorted, optionally including hidden ones.
    pub fn field_names(&self, include_hidden: bool) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = Vec::new();
        for layer in self.layers.iter() {
            for name in layer.fields.keys() {
                names.push(Rc::clone(name));
            }
        }
        names.sort_unstable();
        names.dedup();
        if !include_hidden {
            names.retain(|name| self.is_visible(name));
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn layer(heap: &mut Heap, fields: &[(&str, Visibility)]) -> Rc<Layer> {
        let mut layer = Layer::default();
        for (name, visibility) in fields {
            let thunk = heap.alloc_ready(Value::Null);
            layer.fields.insert(
                Rc::from(*name),
                LayerField {
                    plus: false,
                    visibility: *visibility,
                    body: FieldBody::Thunk(thunk),
                },
            );
        }
        Rc::new(layer)
    }

    #[test]
    fn test_visibility_topmost_explicit_wins() {
        let mut heap = Heap::default();
        let base = layer(&mut heap, &[("a", Visibility::Hidden), ("b", Visibility::Inherit)]);
        let top = layer(&mut heap, &[("a", Visibility::Inherit), ("b", Visibility::Hidden)]);
        let obj = ObjectData::new(Rc::from(vec![base, top]));
        assert!(!obj.is_visible("a"));
        assert!(!obj.is_visible("b"));

        let forced = layer(&mut heap, &[("a", Visibility::Forced)]);
        let obj = ObjectData::new(Rc::from(vec![Rc::clone(&obj.layers[0]), forced]));
        assert!(obj.is_visible("a"));
    }

    #[test]
    fn test_field_names_sorted_and_deduplicated() {
        let mut heap = Heap::default();
        let base = layer(&mut heap, &[("z", Visibility::Inherit), ("h", Visibility::Hidden)]);
        let top = layer(&mut heap, &[("a", Visibility::Inherit), ("z", Visibility::Inherit)]);
        let obj = ObjectData::new(Rc::from(vec![base, top]));
        let names: Vec<String> = obj.field_names(false).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["a", "z"]);
        assert_eq!(obj.field_names(true).len(), 3);
    }

    #[test]
    fn test_find_layer_respects_limit() {
        let mut heap = Heap::default();
        let base = layer(&mut heap, &[("a", Visibility::Inherit)]);
        let top = layer(&mut heap, &[("a", Visibility::Inherit)]);
        let obj = ObjectData::new(Rc::from(vec![base, top]));
        assert_eq!(obj.find_layer("a", 2), Some(1));
        assert_eq!(obj.find_layer("a", 1), Some(0));
        assert_eq!(obj.find_layer("a", 0), None);
    }
}

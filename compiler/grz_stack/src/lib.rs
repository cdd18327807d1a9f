//! Stack growth for deeply nested Jsonnet.
//!
//! Jsonnet sources routinely nest objects, comprehensions and `+` chains
//! several hundred levels deep once libraries are imported, and both the
//! parser and the tree-walking evaluator recurse once per nesting level.
//! [`grow_if_needed`] wraps those recursive entry points so the host thread
//! never overflows; the evaluator's own frame limit is what reports runaway
//! recursion to the user.
//!
//! On `wasm32` the guard is a passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment (2MB).
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a fresh stack segment if the current one is
/// close to exhaustion.
///
/// ```text
/// fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
///     grow_if_needed(|| self.eval_inner(expr))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn grow_if_needed<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn grow_if_needed<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mirrors a right-nested `a + (b + (c + ...))` chain.
    fn nested_sum(depth: u32) -> u64 {
        grow_if_needed(|| {
            if depth == 0 {
                0
            } else {
                u64::from(depth) + nested_sum(depth - 1)
            }
        })
    }

    #[test]
    fn test_shallow_nesting() {
        assert_eq!(nested_sum(4), 10);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        // Well past what an 8MB main-thread stack survives unguarded.
        assert_eq!(nested_sum(200_000), 20_000_100_000);
    }

    #[test]
    fn test_passes_results_through() {
        let parsed: Result<u32, String> = grow_if_needed(|| "17".parse().map_err(|_| "bad".into()));
        assert_eq!(parsed, Ok(17));
    }
}

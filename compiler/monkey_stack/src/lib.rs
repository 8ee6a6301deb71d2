//! Stack safety for deep recursion.
//!
//! The parser and the tree-walking evaluator both recurse per nesting
//! level, so pathological inputs (`((((((...))))))`, deeply nested
//! calls) can exhaust the OS stack. Wrapping the recursive entry points
//! in [`ensure_sufficient_stack`] grows the stack on demand instead.
//!
//! On wasm32 this is a passthrough; WASM manages its own stack.

/// Remaining stack below which we grow (64KB).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 64 * 1024;

/// Stack allocated per growth (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_GROWTH: usize = 1024 * 1024;

/// Run `f`, growing the stack first if little space remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_GROWTH, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

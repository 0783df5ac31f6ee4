//! Construction-time name stack.
//!
//! While a schema is being built, each descriptor constructor pushes one
//! frame before reading its fully-qualified key and pops it (via
//! [`end_of_ctor`]) before returning, so a nested descriptor always sees
//! its ancestors' path. The stack is thread-local: schemas are built on
//! one thread, and nothing here is consulted after construction. The
//! one exception is sequence elements created while an unbounded
//! sequence resizes during validation; those re-base the stack with an
//! [`Frame::Anchor`] carrying the sequence's stored key.
//!
//! Push/pop is strict LIFO; unbalanced use is a programming error and
//! panics.

use std::cell::RefCell;

#[derive(Debug)]
pub(crate) enum Frame {
    /// A plain path segment (a descriptor name or `[i]` element index).
    Segment(String),
    /// A full key that restarts the path, ignoring frames below it.
    Anchor(String),
}

thread_local! {
    static NAME_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn push(frame: Frame) {
    NAME_STACK.with(|stack| stack.borrow_mut().push(frame));
}

/// Pops the frame pushed by the current descriptor's constructor.
pub(crate) fn end_of_ctor() {
    NAME_STACK.with(|stack| {
        stack
            .borrow_mut()
            .pop()
            .expect("name stack underflow: end_of_ctor without matching construction");
    });
}

/// The dotted key of the descriptor currently under construction.
///
/// Joins frames from the innermost anchor (or the bottom of the stack)
/// outward; `[i]` segments attach without a dot separator.
pub(crate) fn current_key() -> String {
    NAME_STACK.with(|stack| {
        let stack = stack.borrow();
        let start = stack
            .iter()
            .rposition(|frame| matches!(frame, Frame::Anchor(_)))
            .unwrap_or(0);
        let mut key = String::new();
        for frame in &stack[start..] {
            let text = match frame {
                Frame::Segment(s) => s,
                Frame::Anchor(s) => s,
            };
            if !key.is_empty() && !text.starts_with('[') {
                key.push('.');
            }
            key.push_str(text);
        }
        key
    })
}

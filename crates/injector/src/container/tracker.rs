use std::sync::{Mutex, PoisonError};

use crate::errors::InjectorError;

/// Stack of type names currently under construction
///
/// Used as the reentrancy guard of the injector: a type that is requested while
/// it is already on the stack is a circular reference.
#[derive(Debug, Clone, Default)]
pub struct InstantiationTracker {
    stack: Vec<String>,
}

impl InstantiationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, type_name: impl Into<String>) {
        self.stack.push(type_name.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.stack.pop()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.stack.iter().any(|entry| entry == type_name)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// In-progress types, outermost first
    pub fn chain(&self) -> &[String] {
        &self.stack
    }

    pub fn path_string(&self) -> String {
        self.stack.join(" -> ")
    }
}

/// Scoped tracker entry; the type is popped when the frame is dropped
///
/// Frames are created and dropped in strict LIFO order because they live on the
/// Rust call stack, so the tracker never keeps a stale entry after a failed
/// construction.
#[derive(Debug)]
pub struct TrackerFrame<'a> {
    tracker: &'a Mutex<InstantiationTracker>,
    type_name: String,
}

impl<'a> TrackerFrame<'a> {
    /// Push `type_name`, failing if it is already under construction
    pub fn enter(
        tracker: &'a Mutex<InstantiationTracker>,
        type_name: &str,
    ) -> Result<Self, InjectorError> {
        let mut stack = tracker.lock().unwrap_or_else(PoisonError::into_inner);
        if stack.contains(type_name) {
            let mut chain = stack.chain().to_vec();
            chain.push(type_name.to_string());
            tracing::warn!(
                type_name,
                chain = %chain.join(" -> "),
                "circular reference detected"
            );
            return Err(InjectorError::CircularReference {
                type_name: type_name.to_string(),
                chain,
            });
        }

        stack.push(type_name);
        tracing::trace!(type_name, depth = stack.depth(), "instantiation started");

        Ok(Self {
            tracker,
            type_name: type_name.to_string(),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Drop for TrackerFrame<'_> {
    fn drop(&mut self) {
        let mut stack = self.tracker.lock().unwrap_or_else(PoisonError::into_inner);
        let popped = stack.pop();
        if popped.as_deref() != Some(self.type_name.as_str()) {
            tracing::error!(
                type_name = %self.type_name,
                popped = ?popped,
                "instantiation tracker out of order"
            );
        }
        tracing::trace!(type_name = %self.type_name, depth = stack.depth(), "instantiation finished");
    }
}

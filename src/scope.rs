//! Lexical variable scopes for the interpreter
//!
//! A [`ScopeStack`] is a stack of name→[`Value`] frames. Entering a block
//! pushes a frame, leaving it pops one; lookups walk from the innermost
//! frame outwards, so inner definitions shadow outer ones.
//!
//! The interpreter owns its scope stack outright and runs on one thread,
//! so the methods take `&mut self` and there is no internal locking.

use crate::encoding::value::Value;
use crate::error::{RuntimeResult, StackError};
use std::collections::HashMap;

/// Stack of lexical scopes
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Value>>,
}

impl ScopeStack {
    /// Create a scope stack holding a single global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Enter a new innermost scope.
    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Leave the innermost scope, dropping its variables. The global
    /// frame is never popped; returns whether a frame was removed.
    pub fn pop_scope(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    /// Look a name up, innermost frame first.
    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
            .ok_or_else(|| StackError::KeyNotFound {
                key: name.to_string(),
            })
    }

    /// Define `name` in the innermost scope, shadowing any outer binding.
    pub fn set(&mut self, name: &str, value: Value) {
        self.frames
            .last_mut()
            .expect("a global frame always exists")
            .insert(name.to_string(), value);
    }

    /// Assign to an existing binding, innermost match first. Fails with
    /// `KeyNotFound` when no frame defines the name.
    pub fn update(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(StackError::KeyNotFound {
            key: name.to_string(),
        })
    }

    /// [`update`](Self::update) when the name is bound anywhere,
    /// [`set`](Self::set) in the innermost scope otherwise.
    pub fn set_or_update(&mut self, name: &str, value: Value) {
        if self.update(name, value.clone()).is_err() {
            self.set(name, value);
        }
    }

    /// Whether any frame binds the name.
    pub fn has(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| frame.contains_key(name))
    }

    /// Remove the innermost binding of `name`. Returns whether a binding
    /// was removed.
    pub fn delete(&mut self, name: &str) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if frame.remove(name).is_some() {
                return true;
            }
        }
        false
    }

    /// Number of frames, the global one included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop every variable in the innermost scope, keeping the frame.
    pub fn clear(&mut self) {
        self.frames
            .last_mut()
            .expect("a global frame always exists")
            .clear();
    }

    /// Back to a single empty global frame.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.frames.push(HashMap::new());
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_unwinding() {
        let mut scopes = ScopeStack::new();
        scopes.set("x", Value::Int(1));
        scopes.push_scope();
        scopes.set("x", Value::Int(2));
        assert_eq!(scopes.get("x").unwrap(), Value::Int(2));
        assert!(scopes.pop_scope());
        assert_eq!(scopes.get("x").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_update_targets_nearest_binding() {
        let mut scopes = ScopeStack::new();
        scopes.set("x", Value::Int(1));
        scopes.push_scope();
        scopes.update("x", Value::Int(5)).unwrap();
        scopes.pop_scope();
        assert_eq!(scopes.get("x").unwrap(), Value::Int(5));
        assert!(matches!(
            scopes.update("missing", Value::Nil),
            Err(StackError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_set_or_update() {
        let mut scopes = ScopeStack::new();
        scopes.set_or_update("x", Value::Int(1)); // defines
        scopes.push_scope();
        scopes.set_or_update("x", Value::Int(2)); // updates the outer one
        assert_eq!(scopes.depth(), 2);
        scopes.pop_scope();
        assert_eq!(scopes.get("x").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_global_frame_survives() {
        let mut scopes = ScopeStack::new();
        assert!(!scopes.pop_scope());
        assert_eq!(scopes.depth(), 1);
        scopes.set("x", Value::Bool(true));
        scopes.clear();
        assert!(!scopes.has("x"));
        assert_eq!(scopes.depth(), 1);
    }

    #[test]
    fn test_delete_and_reset() {
        let mut scopes = ScopeStack::new();
        scopes.set("x", Value::Int(1));
        scopes.push_scope();
        assert!(scopes.delete("x"));
        assert!(!scopes.delete("x"));
        scopes.set("y", Value::Int(2));
        scopes.reset();
        assert_eq!(scopes.depth(), 1);
        assert!(!scopes.has("y"));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut scopes = ScopeStack::new();
        scopes.set("x", Value::Int(1));
        let mut snapshot = scopes.clone();
        snapshot.set("x", Value::Int(9));
        assert_eq!(scopes.get("x").unwrap(), Value::Int(1));
    }
}

//! Variable scopes.

use mrepo_core::Value;

/// One frame of the variable environment.
///
/// Frames link to their parent by reference, so a frame created for a `let`
/// or an iterator body disappears when the body returns, on success or error.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    bindings: Vec<(String, Value)>,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'static> {
    /// The outermost frame, with `self` and `_it` bound to the context element.
    pub fn root(self_value: Value) -> Self {
        Self {
            bindings: vec![
                ("self".to_string(), self_value.clone()),
                ("_it".to_string(), self_value),
            ],
            parent: None,
        }
    }
}

impl<'a> Scope<'a> {
    /// A new empty frame nested in this one.
    pub fn child(&'a self) -> Scope<'a> {
        Scope {
            bindings: Vec::new(),
            parent: Some(self),
        }
    }

    /// Bind a name in this frame, shadowing outer bindings.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.bindings.push((name, value)),
        }
    }

    /// Look a name up, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut frame = Some(self);
        while let Some(scope) = frame {
            if let Some((_, value)) = scope.bindings.iter().find(|(n, _)| n == name) {
                return Some(value);
            }
            frame = scope.parent;
        }
        None
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

//! Local variable scopes of one callable body

use crate::codegen::error::{GenError, GenErrorKind, GenResult};
use crate::span::Position;
use crate::typeck::{Type, RECEIVER};
use std::collections::HashMap;

/// A parameter or local as it is spelled in C#
#[derive(Debug, Clone)]
pub struct Local {
    pub ty: Type,
    pub code: String,
}

#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<HashMap<String, Local>>,
    /// Type whose member is being generated, for access checks
    pub this_type: Option<Type>,
    /// Declared return type, `None` for void
    pub ret: Option<Type>,
    /// Name of the enclosing callable, for error messages
    pub owner_name: String,
    pub loop_depth: usize,
    pub switch_depth: usize,
    /// Nesting of `finally` blocks; control may not leave them
    pub finally_depth: usize,
}

impl Scope {
    pub fn new(owner_name: impl Into<String>, this_type: Option<Type>, ret: Option<Type>) -> Self {
        Self {
            frames: vec![HashMap::new()],
            this_type,
            ret,
            owner_name: owner_name.into(),
            loop_depth: 0,
            switch_depth: 0,
            finally_depth: 0,
        }
    }

    /// Makes `me` available as `this`.
    pub fn with_receiver(mut self) -> Self {
        if let Some(ty) = self.this_type.clone() {
            self.insert(RECEIVER, ty, "this");
        }
        self
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn lookup(&self, name: &str) -> Option<&Local> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Declare a parameter or local, returning its C# name.
    pub fn declare(&mut self, name: &str, ty: Type, pos: Position) -> GenResult<String> {
        if self.lookup(name).is_some() {
            return Err(GenError::new(
                GenErrorKind::DuplicateLocal {
                    name: name.to_string(),
                },
                pos,
            ));
        }
        let code = format!("_{name}");
        self.insert(name, ty, &code);
        Ok(code)
    }

    /// Bind `name` to a fixed C# spelling such as `this` or `value`.
    pub fn insert(&mut self, name: &str, ty: Type, code: &str) {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        let frame = self.frames.len() - 1;
        self.frames[frame].insert(
            name.to_string(),
            Local {
                ty,
                code: code.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_is_rejected() {
        let mut scope = Scope::new("f", None, None);
        let pos = Position::new(2, 5);
        assert_eq!(scope.declare("x", Type::INT, pos).unwrap(), "_x");
        scope.push();
        let err = scope.declare("x", Type::STR, pos).unwrap_err();
        assert!(matches!(err.kind, GenErrorKind::DuplicateLocal { .. }));
        scope.pop();
        assert_eq!(scope.lookup("x").map(|l| &l.ty), Some(&Type::INT));
    }

    #[test]
    fn test_locals_end_with_their_block() {
        let mut scope = Scope::new("f", None, None);
        scope.push();
        scope.declare("y", Type::INT, Position::new(1, 1)).unwrap();
        scope.pop();
        assert!(scope.lookup("y").is_none());
        scope.declare("y", Type::STR, Position::new(4, 1)).unwrap();
    }

    #[test]
    fn test_receiver() {
        let scope = Scope::new("m", Some(Type::STR), None).with_receiver();
        assert_eq!(scope.lookup("me").map(|l| l.code.as_str()), Some("this"));
        assert!(Scope::new("m", Some(Type::STR), None).lookup("me").is_none());
    }
}

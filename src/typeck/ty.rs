//! Resolved type representation
//!
//! These types are different from the AST's [`TypeAtom`](crate::ast::TypeAtom):
//! they are resolved and canonical. User types are identified by their
//! index in the [`Registry`](super::Registry), so two `Type`s are the same
//! type exactly when they compare equal.

use std::fmt;

macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub usize);
        )*
    };
}

id_type! {
    /// Index of a namespace in the registry
    NamespaceId;
    ClassId;
    StructId;
    InterfaceId;
    /// Index of a function, method or constructor signature
    CallableId;
    GlobalId;
}

/// Types every namespace knows without declaring them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Int,
    UInt,
    Long,
    Float,
    Double,
    Byte,
    SByte,
    Bool,
    Str,
    Any,
}

impl Builtin {
    pub const ALL: [Builtin; 10] = [
        Builtin::Int,
        Builtin::UInt,
        Builtin::Long,
        Builtin::Float,
        Builtin::Double,
        Builtin::Byte,
        Builtin::SByte,
        Builtin::Bool,
        Builtin::Str,
        Builtin::Any,
    ];

    /// Look up a builtin by its source spelling
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.source_name() == name)
    }

    pub fn source_name(self) -> &'static str {
        match self {
            Builtin::Int => "I",
            Builtin::UInt => "U",
            Builtin::Long => "II",
            Builtin::Float => "F",
            Builtin::Double => "FF",
            Builtin::Byte => "B",
            Builtin::SByte => "SB",
            Builtin::Bool => "Bool",
            Builtin::Str => "Str",
            Builtin::Any => "Any",
        }
    }

    pub fn cs_name(self) -> &'static str {
        match self {
            Builtin::Int => "int",
            Builtin::UInt => "uint",
            Builtin::Long => "long",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Byte => "byte",
            Builtin::SByte => "sbyte",
            Builtin::Bool => "bool",
            Builtin::Str => "string",
            Builtin::Any => "object",
        }
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Builtin::Int | Builtin::UInt | Builtin::Long | Builtin::Byte | Builtin::SByte
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Builtin::Float | Builtin::Double)
    }

    /// Numeric widening, excluding identity: `SByte/Byte -> Int -> Long`
    /// and `SByte/Byte/Int -> Float -> Double`.
    pub fn widens_to(self, target: Builtin) -> bool {
        use Builtin::*;
        matches!(
            (self, target),
            (Byte | SByte, Int | Long | Float | Double)
                | (Int, Long | Float | Double)
                | (Float, Double)
        )
    }
}

/// Name used for the array type constructor in source
pub const ARRAY_TYPE_NAME: &str = "A";

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(Builtin),
    /// Arrays nest for each extra dimension
    Array(Box<Type>),
    Class(ClassId),
    Struct(StructId),
    Interface(InterfaceId),
}

impl Type {
    pub const INT: Type = Type::Builtin(Builtin::Int);
    pub const LONG: Type = Type::Builtin(Builtin::Long);
    pub const DOUBLE: Type = Type::Builtin(Builtin::Double);
    pub const BOOL: Type = Type::Builtin(Builtin::Bool);
    pub const STR: Type = Type::Builtin(Builtin::Str);
    pub const ANY: Type = Type::Builtin(Builtin::Any);

    pub fn array_of(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self {
            Type::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.builtin().map_or(false, Builtin::is_numeric)
    }

    pub fn is_integer(&self) -> bool {
        self.builtin().map_or(false, Builtin::is_integer)
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Number of array levels, 0 for non-arrays
    pub fn array_depth(&self) -> usize {
        match self {
            Type::Array(elem) => 1 + elem.array_depth(),
            _ => 0,
        }
    }

    /// Innermost non-array type
    pub fn base(&self) -> &Type {
        match self {
            Type::Array(elem) => elem.base(),
            other => other,
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(Builtin::from_name("II"), Some(Builtin::Long));
        assert_eq!(Builtin::from_name("SB"), Some(Builtin::SByte));
        assert_eq!(Builtin::from_name("Widget"), None);
    }

    #[test]
    fn test_widening_is_not_symmetric() {
        assert!(Builtin::Byte.widens_to(Builtin::Int));
        assert!(!Builtin::Int.widens_to(Builtin::Byte));
        assert!(Builtin::Int.widens_to(Builtin::Double));
        assert!(!Builtin::Long.widens_to(Builtin::Float));
        assert!(!Builtin::Int.widens_to(Builtin::Int));
    }

    #[test]
    fn test_array_shape() {
        let ty = Type::array_of(Type::array_of(Type::INT));
        assert_eq!(ty.array_depth(), 2);
        assert_eq!(ty.base(), &Type::INT);
        assert_eq!(ty.element().map(Type::array_depth), Some(1));
    }
}

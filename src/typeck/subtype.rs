//! Subtyping
//!
//! The relation is a partial order with `Any` on top:
//! - numeric builtins widen per [`Builtin::widens_to`]
//! - a class is below its ancestors and every interface any of them implements
//! - an interface is below the interfaces it extends
//! - a struct is below the interfaces it declares, nothing else
//! - arrays are covariant at equal depth

use crate::typeck::context::Registry;
use crate::typeck::ty::{Builtin, ClassId, InterfaceId, Type};

impl Registry {
    /// `child <: parent`
    pub fn is_subtype(&self, child: &Type, parent: &Type) -> bool {
        if child == parent || *parent == Type::ANY {
            return true;
        }
        match (child, parent) {
            (Type::Builtin(c), Type::Builtin(p)) => c.widens_to(*p),
            (Type::Array(c), Type::Array(p)) => self.is_subtype(c, p),
            (Type::Class(c), Type::Class(p)) => self.class_descends(*c, *p),
            (Type::Class(c), Type::Interface(p)) => self.class_implements(*c, *p),
            (Type::Struct(s), Type::Interface(p)) => self
                .struct_info(*s)
                .interfaces
                .iter()
                .any(|i| self.interface_extends(*i, *p)),
            (Type::Interface(c), Type::Interface(p)) => self.interface_extends(*c, *p),
            _ => false,
        }
    }

    /// Reflexive, transitive walk up the parent chain
    pub fn class_descends(&self, child: ClassId, ancestor: ClassId) -> bool {
        self.class_chain(child).contains(&ancestor)
    }

    /// Reflexive, transitive walk up the interface parents
    pub fn interface_extends(&self, child: InterfaceId, ancestor: InterfaceId) -> bool {
        self.interface_closure(child).contains(&ancestor)
    }

    fn class_implements(&self, class: ClassId, iface: InterfaceId) -> bool {
        self.class_chain(class).into_iter().any(|c| {
            self.class(c)
                .interfaces
                .iter()
                .any(|i| self.interface_extends(*i, iface))
        })
    }

    /// Smallest type both sides widen to, used for operator operands
    pub fn numeric_join(&self, a: &Type, b: &Type) -> Option<Type> {
        let (x, y) = (a.builtin()?, b.builtin()?);
        if !x.is_numeric() || !y.is_numeric() {
            return None;
        }
        if x == y || x.widens_to(y) {
            return Some(Type::Builtin(y));
        }
        if y.widens_to(x) {
            return Some(Type::Builtin(x));
        }
        [Builtin::Int, Builtin::Long, Builtin::Float, Builtin::Double]
            .into_iter()
            .find(|t| x.widens_to(*t) && y.widens_to(*t))
            .map(Type::Builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AccessLevel;
    use crate::typeck::context::*;
    use crate::typeck::ty::{NamespaceId, StructId};

    struct World {
        registry: Registry,
        shape: ClassId,
        circle: ClassId,
        named: InterfaceId,
        drawable: InterfaceId,
        point: StructId,
    }

    fn class(registry: &mut Registry, ns: NamespaceId, name: &str, parent: Option<ClassId>) -> ClassId {
        registry.add_class(ClassInfo {
            name: name.into(),
            namespace: ns,
            access: AccessLevel::Public,
            parent,
            interfaces: Vec::new(),
            body: MemberTable::default(),
        })
    }

    fn interface(registry: &mut Registry, ns: NamespaceId, name: &str, parents: Vec<InterfaceId>) -> InterfaceId {
        registry.add_interface(InterfaceInfo {
            name: name.into(),
            namespace: ns,
            access: AccessLevel::Public,
            parents,
            methods: Default::default(),
            properties: Default::default(),
        })
    }

    fn world() -> World {
        let mut registry = Registry::new();
        let ns = registry.add_namespace(Namespace::new("geo"));
        let named = interface(&mut registry, ns, "Named", Vec::new());
        let drawable = interface(&mut registry, ns, "Drawable", vec![named]);
        let shape = class(&mut registry, ns, "Shape", None);
        registry.class_mut(shape).interfaces.push(drawable);
        let circle = class(&mut registry, ns, "Circle", Some(shape));
        let point = registry.add_struct(StructInfo {
            name: "Point".into(),
            namespace: ns,
            access: AccessLevel::Public,
            interfaces: vec![named],
            body: MemberTable::default(),
        });
        World {
            registry,
            shape,
            circle,
            named,
            drawable,
            point,
        }
    }

    const WIDENING: &[(Builtin, Builtin)] = &[
        (Builtin::SByte, Builtin::Int),
        (Builtin::Byte, Builtin::Int),
        (Builtin::Int, Builtin::Long),
        (Builtin::SByte, Builtin::Long),
        (Builtin::Byte, Builtin::Float),
        (Builtin::SByte, Builtin::Float),
        (Builtin::Int, Builtin::Float),
        (Builtin::Float, Builtin::Double),
        (Builtin::Int, Builtin::Double),
    ];

    #[test]
    fn test_widening_pairs_are_one_way() {
        let registry = Registry::new();
        for (child, parent) in WIDENING {
            let (c, p) = (Type::Builtin(*child), Type::Builtin(*parent));
            assert!(registry.is_subtype(&c, &p), "{child} <: {parent}");
            assert!(!registry.is_subtype(&p, &c), "{parent} </: {child}");
        }
    }

    #[test]
    fn test_everything_is_below_any() {
        let w = world();
        for ty in [Type::STR, Type::Class(w.circle), Type::array_of(Type::INT), Type::Struct(w.point)] {
            assert!(w.registry.is_subtype(&ty, &Type::ANY));
        }
        assert!(!w.registry.is_subtype(&Type::ANY, &Type::STR));
    }

    #[test]
    fn test_class_hierarchy() {
        let w = world();
        let r = &w.registry;
        assert!(r.is_subtype(&Type::Class(w.circle), &Type::Class(w.shape)));
        assert!(!r.is_subtype(&Type::Class(w.shape), &Type::Class(w.circle)));
        assert!(r.is_subtype(&Type::Class(w.circle), &Type::Interface(w.drawable)));
        assert!(r.is_subtype(&Type::Class(w.circle), &Type::Interface(w.named)));
    }

    #[test]
    fn test_struct_only_reaches_its_interfaces() {
        let w = world();
        let r = &w.registry;
        assert!(r.is_subtype(&Type::Struct(w.point), &Type::Interface(w.named)));
        assert!(!r.is_subtype(&Type::Struct(w.point), &Type::Interface(w.drawable)));
        assert!(!r.is_subtype(&Type::Struct(w.point), &Type::Class(w.shape)));
    }

    #[test]
    fn test_arrays_are_covariant_at_equal_depth() {
        let w = world();
        let r = &w.registry;
        let circles = Type::array_of(Type::Class(w.circle));
        let shapes = Type::array_of(Type::Class(w.shape));
        assert!(r.is_subtype(&circles, &shapes));
        assert!(!r.is_subtype(&shapes, &circles));
        assert!(!r.is_subtype(&Type::array_of(circles.clone()), &shapes));
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let mut w = world();
        w.registry.class_mut(w.shape).parent = Some(w.circle);
        assert!(w.registry.is_subtype(&Type::Class(w.shape), &Type::Class(w.circle)));
        assert!(!w.registry.is_subtype(&Type::Class(w.shape), &Type::STR));
    }

    #[test]
    fn test_numeric_join() {
        let r = Registry::new();
        let byte = Type::Builtin(Builtin::Byte);
        let sbyte = Type::Builtin(Builtin::SByte);
        assert_eq!(r.numeric_join(&byte, &Type::INT), Some(Type::INT));
        assert_eq!(r.numeric_join(&byte, &sbyte), Some(Type::INT));
        assert_eq!(r.numeric_join(&Type::LONG, &Type::DOUBLE), None);
        assert_eq!(r.numeric_join(&Type::STR, &Type::INT), None);
    }
}

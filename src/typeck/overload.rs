//! Overload tie-breaking
//!
//! Given every candidate whose arity and parameter types accept a call,
//! pick the one the call means or report that it is ambiguous.

use crate::typeck::context::Registry;
use crate::typeck::ty::{CallableId, Type};

impl Registry {
    /// Choose among matching candidates. `None` means the call is ambiguous.
    ///
    /// - a single candidate wins
    /// - two or more functions, or functions mixed with methods, are ambiguous
    /// - class receivers: the most derived class wins, equal classes are ambiguous
    /// - struct receivers: exactly one candidate is required
    /// - interface receivers only count when no class or struct candidate exists
    pub fn closest_matching_signature(&self, candidates: &[CallableId]) -> Option<CallableId> {
        match candidates {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }
        if candidates.iter().any(|id| !self.callable(*id).is_method()) {
            return None;
        }

        let mut classes = Vec::new();
        let mut structs = Vec::new();
        let mut interfaces = Vec::new();
        for id in candidates {
            match self.callable(*id).receiver() {
                Some(Type::Class(c)) => classes.push((*id, *c)),
                Some(Type::Struct(_)) => structs.push(*id),
                Some(Type::Interface(i)) => interfaces.push((*id, *i)),
                _ => return None,
            }
        }

        if !classes.is_empty() {
            if !structs.is_empty() {
                return None;
            }
            let (mut winner, mut winner_class) = classes[0];
            for &(id, class) in &classes[1..] {
                if class == winner_class {
                    return None;
                }
                if self.class_descends(class, winner_class) {
                    winner = id;
                    winner_class = class;
                } else if !self.class_descends(winner_class, class) {
                    return None;
                }
            }
            return Some(winner);
        }

        if !structs.is_empty() {
            return match structs.as_slice() {
                [only] => Some(*only),
                _ => None,
            };
        }

        let (mut winner, mut winner_iface) = interfaces[0];
        for &(id, iface) in &interfaces[1..] {
            if iface == winner_iface {
                return None;
            }
            if self.interface_extends(iface, winner_iface) {
                winner = id;
                winner_iface = iface;
            } else if !self.interface_extends(winner_iface, iface) {
                return None;
            }
        }
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::AccessLevel;
    use crate::typeck::context::*;
    use crate::typeck::ty::*;

    fn callable(registry: &mut Registry, ns: NamespaceId, receiver: Option<Type>) -> CallableId {
        let (kind, param_types) = match &receiver {
            Some(r) => (CallableKind::Method, vec![r.clone()]),
            None => (CallableKind::Function, vec![Type::INT]),
        };
        registry.add_callable(CallableInfo {
            name: "area".into(),
            kind,
            namespace: ns,
            param_names: vec!["me".into()],
            param_types,
            ret: Some(Type::DOUBLE),
            static_owner: None,
            access: AccessLevel::Public,
            owner: receiver,
        })
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

    fn setup() -> (Registry, NamespaceId) {
        let mut registry = Registry::new();
        let ns = registry.add_namespace(Namespace::new("geo"));
        (registry, ns)
    }

    #[test]
    fn test_most_derived_class_wins() {
        let (mut r, ns) = setup();
        let shape = class(&mut r, ns, "Shape", None);
        let circle = class(&mut r, ns, "Circle", Some(shape));
        let on_shape = callable(&mut r, ns, Some(Type::Class(shape)));
        let on_circle = callable(&mut r, ns, Some(Type::Class(circle)));
        assert_eq!(r.closest_matching_signature(&[on_shape, on_circle]), Some(on_circle));
        assert_eq!(r.closest_matching_signature(&[on_circle, on_shape]), Some(on_circle));
    }

    #[test]
    fn test_same_class_is_ambiguous() {
        let (mut r, ns) = setup();
        let shape = class(&mut r, ns, "Shape", None);
        let a = callable(&mut r, ns, Some(Type::Class(shape)));
        let b = callable(&mut r, ns, Some(Type::Class(shape)));
        assert_eq!(r.closest_matching_signature(&[a, b]), None);
    }

    #[test]
    fn test_functions_are_never_disambiguated() {
        let (mut r, ns) = setup();
        let shape = class(&mut r, ns, "Shape", None);
        let f = callable(&mut r, ns, None);
        let g = callable(&mut r, ns, None);
        let m = callable(&mut r, ns, Some(Type::Class(shape)));
        assert_eq!(r.closest_matching_signature(&[f]), Some(f));
        assert_eq!(r.closest_matching_signature(&[f, g]), None);
        assert_eq!(r.closest_matching_signature(&[f, m]), None);
    }

    #[test]
    fn test_class_candidates_shadow_interface_candidates() {
        let (mut r, ns) = setup();
        let iface = r.add_interface(InterfaceInfo {
            name: "Shaped".into(),
            namespace: ns,
            access: AccessLevel::Public,
            parents: Vec::new(),
            methods: Default::default(),
            properties: Default::default(),
        });
        let shape = class(&mut r, ns, "Shape", None);
        let on_iface = callable(&mut r, ns, Some(Type::Interface(iface)));
        let on_shape = callable(&mut r, ns, Some(Type::Class(shape)));
        assert_eq!(r.closest_matching_signature(&[on_iface, on_shape]), Some(on_shape));
    }

    #[test]
    fn test_struct_candidate_shadows_interface_candidate() {
        let (mut r, ns) = setup();
        let iface = r.add_interface(InterfaceInfo {
            name: "Shaped".into(),
            namespace: ns,
            access: AccessLevel::Public,
            parents: Vec::new(),
            methods: Default::default(),
            properties: Default::default(),
        });
        let point = r.add_struct(StructInfo {
            name: "Point".into(),
            namespace: ns,
            access: AccessLevel::Public,
            interfaces: vec![iface],
            body: MemberTable::default(),
        });
        let on_iface = callable(&mut r, ns, Some(Type::Interface(iface)));
        let on_point = callable(&mut r, ns, Some(Type::Struct(point)));
        assert_eq!(r.closest_matching_signature(&[on_iface, on_point]), Some(on_point));
        assert_eq!(r.closest_matching_signature(&[on_point, on_iface]), Some(on_point));
    }

    #[test]
    fn test_two_struct_candidates_are_ambiguous() {
        let (mut r, ns) = setup();
        let point = r.add_struct(StructInfo {
            name: "Point".into(),
            namespace: ns,
            access: AccessLevel::Public,
            interfaces: Vec::new(),
            body: MemberTable::default(),
        });
        let a = callable(&mut r, ns, Some(Type::Struct(point)));
        let b = callable(&mut r, ns, Some(Type::Struct(point)));
        assert_eq!(r.closest_matching_signature(&[a]), Some(a));
        assert_eq!(r.closest_matching_signature(&[a, b]), None);
    }
}

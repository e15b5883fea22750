//! Namespace resolution
//!
//! Builds a [`Namespace`] from a parsed [`TopDefs`] in dependency order:
//! imports first, then every type name, then bodies. Registering all names
//! up front lets supertypes and members refer to types declared later in
//! the same namespace.

use crate::ast::*;
use crate::error::CompileError;
use crate::span::Position;
use crate::typeck::context::*;
use crate::typeck::error::{ResolveError, ResolveResult};
use crate::typeck::ty::*;

/// Name of the implicit receiver parameter
pub const RECEIVER: &str = "me";

/// Compiles (or fetches from cache) the namespaces a namespace imports.
pub trait NamespaceLoader {
    fn load(&mut self, registry: &mut Registry, namespace: &str) -> Result<NamespaceId, CompileError>;
}

/// Dotted lowercase words: `app.core`
pub fn is_namespace_name(name: &str) -> bool {
    name.split('.').all(|part| {
        let mut chars = part.chars();
        chars.next().map_or(false, |c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Resolve `defs` as namespace `name`, loading imports through `loader`.
pub fn resolve(
    defs: &TopDefs,
    name: &str,
    registry: &mut Registry,
    loader: &mut dyn NamespaceLoader,
) -> ResolveResult<NamespaceId> {
    let decl = defs
        .namespace
        .as_ref()
        .ok_or_else(ResolveError::missing_namespace_decl)?;
    if !is_namespace_name(name) {
        return Err(ResolveError::invalid_namespace_name(name));
    }
    if decl.name != name {
        return Err(ResolveError::namespace_mismatch(name, &decl.name, decl.pos));
    }

    let ns = registry.add_namespace(Namespace::new(name));
    let mut resolver = Resolver { registry, ns, defs };
    resolver.resolve_imports(loader)?;
    resolver.register_types()?;
    resolver.resolve_interfaces()?;
    resolver.resolve_classes()?;
    resolver.resolve_functions()?;
    resolver.resolve_globals()?;
    resolver.resolve_structs()?;

    tracing::debug!(
        target: "resolve",
        namespace = name,
        classes = defs.classes.len(),
        structs = defs.structs.len(),
        interfaces = defs.interfaces.len(),
        funcs = defs.funcs.len(),
        "resolved namespace"
    );
    Ok(ns)
}

/// Non-public types are emitted as `internal`, so a public type cannot
/// derive from one.
fn check_base_access(
    name: &str,
    access: AccessLevel,
    base_name: &str,
    base_access: AccessLevel,
    pos: Position,
) -> ResolveResult<()> {
    if access == AccessLevel::Public && base_access != AccessLevel::Public {
        return Err(ResolveError::less_accessible_base(name, base_name, pos));
    }
    Ok(())
}

struct Resolver<'a> {
    registry: &'a mut Registry,
    ns: NamespaceId,
    defs: &'a TopDefs,
}

impl<'a> Resolver<'a> {
    fn ns(&self) -> &Namespace {
        self.registry.namespace(self.ns)
    }

    fn ns_mut(&mut self) -> &mut Namespace {
        self.registry.namespace_mut(self.ns)
    }

    fn resolve_type(&self, atom: &TypeAtom) -> ResolveResult<Type> {
        self.registry.resolve_type_atom(self.ns, atom)
    }

    fn resolve_types(&self, atoms: &[TypeAtom]) -> ResolveResult<Vec<Type>> {
        atoms.iter().map(|a| self.resolve_type(a)).collect()
    }

    fn resolve_ret(&self, atom: Option<&TypeAtom>) -> ResolveResult<Option<Type>> {
        atom.map(|a| self.resolve_type(a)).transpose()
    }

    // ============ Step 2: imports ============

    fn resolve_imports(&mut self, loader: &mut dyn NamespaceLoader) -> ResolveResult<()> {
        let defs = self.defs;
        for import in &defs.imports {
            if self.ns().imports.contains_key(&import.short_name) {
                return Err(ResolveError::duplicate_import(&import.short_name, import.pos));
            }
            let foreign = loader
                .load(self.registry, &import.namespace)
                .map_err(|e| ResolveError::import_failed(&import.namespace, e, import.pos))?;
            self.ns_mut()
                .imports
                .insert(import.short_name.clone(), foreign);
            self.merge_import(foreign, import.pos)?;
        }
        Ok(())
    }

    /// Copy every symbol declared directly in `foreign` into this namespace.
    fn merge_import(&mut self, foreign: NamespaceId, pos: Position) -> ResolveResult<()> {
        let registry = &*self.registry;
        let src = registry.namespace(foreign);
        let own = |ty: &Type| registry.declaring_namespace(ty) == Some(foreign);

        let mut types: Vec<(String, Type)> = src
            .classes
            .iter()
            .map(|(n, id)| (n.clone(), Type::Class(*id)))
            .chain(src.structs.iter().map(|(n, id)| (n.clone(), Type::Struct(*id))))
            .chain(
                src.interfaces
                    .iter()
                    .map(|(n, id)| (n.clone(), Type::Interface(*id))),
            )
            .filter(|(_, ty)| own(ty))
            .collect();
        types.sort_by(|a, b| a.0.cmp(&b.0));

        let mut globals: Vec<(String, GlobalId)> = src
            .globals
            .iter()
            .filter(|(_, id)| registry.global(**id).namespace == foreign)
            .map(|(n, id)| (n.clone(), *id))
            .collect();
        globals.sort_by(|a, b| a.0.cmp(&b.0));

        let declared = |ids: &Vec<CallableId>| -> Vec<CallableId> {
            ids.iter()
                .copied()
                .filter(|id| registry.callable(*id).namespace == foreign)
                .collect()
        };
        let funcs: Vec<(String, Vec<CallableId>)> = src
            .funcs
            .iter()
            .map(|(n, ids)| (n.clone(), declared(ids)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();
        let methods: Vec<(String, Vec<CallableId>)> = src
            .methods
            .iter()
            .map(|(n, ids)| (n.clone(), declared(ids)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();
        let foreign_name = src.name.clone();

        for (name, ty) in types {
            if self.ns().has_name(&name) {
                return Err(ResolveError::import_collision(&name, &foreign_name, pos));
            }
            let ns = self.ns_mut();
            match ty {
                Type::Class(id) => {
                    ns.classes.insert(name, id);
                }
                Type::Struct(id) => {
                    ns.structs.insert(name, id);
                }
                Type::Interface(id) => {
                    ns.interfaces.insert(name, id);
                }
                Type::Builtin(_) | Type::Array(_) => {}
            }
        }
        for (name, id) in globals {
            if self.ns().has_name(&name) {
                return Err(ResolveError::import_collision(&name, &foreign_name, pos));
            }
            self.ns_mut().globals.insert(name, id);
        }
        for (name, ids) in funcs {
            let clash = self.ns().funcs.get(&name).map_or(false, |known| {
                ids.iter().any(|id| {
                    let params = &self.registry.callable(*id).param_types;
                    known
                        .iter()
                        .any(|k| k != id && self.registry.callable(*k).param_types == *params)
                })
            });
            if clash {
                return Err(ResolveError::import_collision(&name, &foreign_name, pos));
            }
            let known = self.ns_mut().funcs.entry(name).or_default();
            for id in ids {
                if !known.contains(&id) {
                    known.push(id);
                }
            }
        }
        let ns = self.ns_mut();
        for (name, ids) in methods {
            ns.methods.entry(name).or_default().extend(ids);
        }
        Ok(())
    }

    // ============ Step 3: type names ============

    fn check_new_type_name(&self, name: &str, pos: Position) -> ResolveResult<()> {
        if name == ARRAY_TYPE_NAME || Builtin::from_name(name).is_some() {
            return Err(ResolveError::reserved_type_name(name, pos));
        }
        if self.ns().has_name(name) {
            return Err(ResolveError::name_collision(name, pos));
        }
        Ok(())
    }

    fn register_types(&mut self) -> ResolveResult<()> {
        let defs = self.defs;
        let ns = self.ns;
        for def in &defs.interfaces {
            self.check_new_type_name(&def.name, def.pos)?;
            let id = self.registry.add_interface(InterfaceInfo {
                name: def.name.clone(),
                namespace: ns,
                access: def.access,
                parents: Vec::new(),
                methods: Default::default(),
                properties: Default::default(),
            });
            self.ns_mut().interfaces.insert(def.name.clone(), id);
        }
        for def in &defs.structs {
            self.check_new_type_name(&def.name, def.pos)?;
            let id = self.registry.add_struct(StructInfo {
                name: def.name.clone(),
                namespace: ns,
                access: def.access,
                interfaces: Vec::new(),
                body: MemberTable::default(),
            });
            self.ns_mut().structs.insert(def.name.clone(), id);
        }
        for def in &defs.classes {
            self.check_new_type_name(&def.name, def.pos)?;
            let id = self.registry.add_class(ClassInfo {
                name: def.name.clone(),
                namespace: ns,
                access: def.access,
                parent: None,
                interfaces: Vec::new(),
                body: MemberTable::default(),
            });
            self.ns_mut().classes.insert(def.name.clone(), id);
        }
        Ok(())
    }

    fn interface_id(&self, name: &str) -> InterfaceId {
        self.ns().interfaces[name]
    }

    fn class_id(&self, name: &str) -> ClassId {
        self.ns().classes[name]
    }

    fn struct_id(&self, name: &str) -> StructId {
        self.ns().structs[name]
    }

    fn resolve_interface_list(&self, atoms: &[TypeAtom]) -> ResolveResult<Vec<InterfaceId>> {
        let mut out = Vec::new();
        for atom in atoms {
            match self.resolve_type(atom)? {
                Type::Interface(id) => out.push(id),
                _ => return Err(ResolveError::not_an_interface(atom.to_string(), atom.pos)),
            }
        }
        Ok(out)
    }

    // ============ Step 4: interfaces ============

    fn resolve_interfaces(&mut self) -> ResolveResult<()> {
        let defs = self.defs;
        for def in &defs.interfaces {
            let id = self.interface_id(&def.name);
            let parents = self.resolve_interface_list(&def.parents)?;
            for (atom, parent) in def.parents.iter().zip(&parents) {
                let base = self.registry.interface(*parent);
                check_base_access(&def.name, def.access, &base.name, base.access, atom.pos)?;
            }
            self.registry.interface_mut(id).parents = parents;
        }
        for def in &defs.interfaces {
            let id = self.interface_id(&def.name);
            let cyclic = self
                .registry
                .interface(id)
                .parents
                .iter()
                .any(|p| self.registry.interface_extends(*p, id));
            if cyclic {
                return Err(ResolveError::inheritance_cycle(&def.name, def.pos));
            }
        }

        for def in &defs.interfaces {
            let id = self.interface_id(&def.name);
            let owner = Type::Interface(id);
            for method in &def.methods {
                let explicit = self.resolve_types(&method.params)?;
                let ret = self.resolve_ret(method.ret.as_ref())?;
                let duplicate = self
                    .registry
                    .interface(id)
                    .methods
                    .get(&method.name)
                    .map_or(false, |ids| {
                        ids.iter()
                            .any(|c| self.registry.callable(*c).explicit_params() == explicit.as_slice())
                    });
                if duplicate {
                    return Err(ResolveError::duplicate_signature(
                        &method.name,
                        self.registry.type_list(&explicit),
                        method.pos,
                    ));
                }
                let mut param_names = vec![RECEIVER.to_string()];
                param_names.extend((0..explicit.len()).map(|i| format!("p{i}")));
                let mut param_types = vec![owner.clone()];
                param_types.extend(explicit);
                let callable = self.registry.add_callable(CallableInfo {
                    name: method.name.clone(),
                    kind: CallableKind::Method,
                    namespace: self.ns,
                    param_names,
                    param_types,
                    ret,
                    static_owner: None,
                    access: AccessLevel::Public,
                    owner: Some(owner.clone()),
                });
                self.registry
                    .interface_mut(id)
                    .methods
                    .entry(method.name.clone())
                    .or_default()
                    .push(callable);
                self.ns_mut()
                    .methods
                    .entry(method.name.clone())
                    .or_default()
                    .push(callable);
            }

            for prop in &def.properties {
                let iface = self.registry.interface(id);
                if iface.properties.contains_key(&prop.name) || iface.methods.contains_key(&prop.name) {
                    return Err(ResolveError::duplicate_member(&def.name, &prop.name, prop.pos));
                }
                let info = MemberInfo {
                    name: prop.name.clone(),
                    kind: MemberKind::Property,
                    ty: self.resolve_type(&prop.ty)?,
                    access: AccessLevel::Public,
                    is_static: false,
                    get: prop.get,
                    set: prop.set,
                    owner: owner.clone(),
                };
                self.registry
                    .interface_mut(id)
                    .properties
                    .insert(prop.name.clone(), info);
            }
        }
        Ok(())
    }

    // ============ Step 5: classes ============

    fn resolve_classes(&mut self) -> ResolveResult<()> {
        let defs = self.defs;
        for def in &defs.classes {
            let id = self.class_id(&def.name);
            let mut parent = None;
            let mut interfaces = Vec::new();
            for (i, atom) in def.supertypes.iter().enumerate() {
                match self.resolve_type(atom)? {
                    Type::Class(c) if i == 0 => {
                        let base = self.registry.class(c);
                        check_base_access(&def.name, def.access, &base.name, base.access, atom.pos)?;
                        parent = Some(c);
                    }
                    Type::Interface(iface) => interfaces.push(iface),
                    _ => return Err(ResolveError::not_an_interface(atom.to_string(), atom.pos)),
                }
            }
            let info = self.registry.class_mut(id);
            info.parent = parent;
            info.interfaces = interfaces;
        }
        for def in &defs.classes {
            let id = self.class_id(&def.name);
            let cyclic = self
                .registry
                .class(id)
                .parent
                .map_or(false, |p| self.registry.class_descends(p, id));
            if cyclic {
                return Err(ResolveError::inheritance_cycle(&def.name, def.pos));
            }
        }

        for def in &defs.classes {
            let id = self.class_id(&def.name);
            let body = self.resolve_members(Type::Class(id), &def.name, &def.members)?;
            self.registry.class_mut(id).body = body;
        }

        // Conformance runs last so inherited methods of later-declared
        // parents are already in place.
        for def in &defs.classes {
            let id = self.class_id(&def.name);
            let interfaces = self.registry.class(id).interfaces.clone();
            for iface in interfaces {
                self.check_conformance(&Type::Class(id), iface, def.pos)?;
            }
        }
        Ok(())
    }

    fn resolve_params(&self, params: &[Param]) -> ResolveResult<(Vec<String>, Vec<Type>)> {
        let names = params.iter().map(|p| p.name.clone()).collect();
        let types = params
            .iter()
            .map(|p| self.resolve_type(&p.ty))
            .collect::<ResolveResult<_>>()?;
        Ok((names, types))
    }

    /// Fields, properties, constructors and methods of a class or struct
    fn resolve_members(
        &mut self,
        owner: Type,
        owner_name: &str,
        members: &Members,
    ) -> ResolveResult<MemberTable> {
        let mut table = MemberTable::default();

        let fields = members
            .fields
            .iter()
            .map(|f| (&f.name, &f.ty, f.access, f.is_static, MemberKind::Field, f.pos));
        let properties = members
            .properties
            .iter()
            .map(|p| (&p.name, &p.ty, p.access, p.is_static, MemberKind::Property, p.pos));
        for (name, ty, access, is_static, kind, pos) in fields.chain(properties) {
            if table.members.contains_key(name) {
                return Err(ResolveError::duplicate_member(owner_name, name, pos));
            }
            let info = MemberInfo {
                name: name.clone(),
                kind,
                ty: self.resolve_type(ty)?,
                access,
                is_static,
                get: true,
                set: true,
                owner: owner.clone(),
            };
            table.members.insert(name.clone(), info);
        }

        for ctor in &members.constructors {
            let (param_names, param_types) = self.resolve_params(&ctor.params)?;
            let duplicate = table
                .constructors
                .iter()
                .any(|c| self.registry.callable(*c).param_types == param_types);
            if duplicate {
                return Err(ResolveError::duplicate_signature(
                    &format!("constructor of {owner_name}"),
                    self.registry.type_list(&param_types),
                    ctor.pos,
                ));
            }
            let id = self.registry.add_callable(CallableInfo {
                name: owner_name.to_string(),
                kind: CallableKind::Constructor,
                namespace: self.ns,
                param_names,
                param_types,
                ret: Some(owner.clone()),
                static_owner: None,
                access: ctor.access,
                owner: Some(owner.clone()),
            });
            table.constructors.push(id);
        }
        if members.constructors.is_empty() {
            let id = self.registry.add_callable(CallableInfo {
                name: owner_name.to_string(),
                kind: CallableKind::Constructor,
                namespace: self.ns,
                param_names: Vec::new(),
                param_types: Vec::new(),
                ret: Some(owner.clone()),
                static_owner: None,
                access: AccessLevel::Public,
                owner: Some(owner.clone()),
            });
            table.constructors.push(id);
        }

        for method in &members.methods {
            if table.members.contains_key(&method.name) {
                return Err(ResolveError::duplicate_member(owner_name, &method.name, method.pos));
            }
            let (names, explicit) = self.resolve_params(&method.params)?;
            let ret = self.resolve_ret(method.ret.as_ref())?;
            let duplicate = table.methods.get(&method.name).map_or(false, |ids| {
                ids.iter()
                    .any(|c| self.registry.callable(*c).explicit_params() == explicit.as_slice())
            });
            if duplicate {
                return Err(ResolveError::duplicate_signature(
                    &format!("{owner_name}.{}", method.name),
                    self.registry.type_list(&explicit),
                    method.pos,
                ));
            }

            let (param_names, param_types, static_owner) = if method.is_static {
                (names, explicit, Some(owner.clone()))
            } else {
                let mut param_names = vec![RECEIVER.to_string()];
                param_names.extend(names);
                let mut param_types = vec![owner.clone()];
                param_types.extend(explicit);
                (param_names, param_types, None)
            };
            let id = self.registry.add_callable(CallableInfo {
                name: method.name.clone(),
                kind: CallableKind::Method,
                namespace: self.ns,
                param_names,
                param_types,
                ret,
                static_owner,
                access: method.access,
                owner: Some(owner.clone()),
            });
            table.methods.entry(method.name.clone()).or_default().push(id);
            self.ns_mut()
                .methods
                .entry(method.name.clone())
                .or_default()
                .push(id);
        }
        Ok(table)
    }

    /// `ty` must provide every method and property of `iface` and of the
    /// interfaces it extends.
    fn check_conformance(&self, ty: &Type, iface: InterfaceId, pos: Position) -> ResolveResult<()> {
        let registry = &*self.registry;
        let ty_name = registry.type_name(ty);
        for required_iface in registry.interface_closure(iface) {
            let info = registry.interface(required_iface);
            let mut names: Vec<&String> = info.methods.keys().collect();
            names.sort();
            for name in names {
                for required in &info.methods[name] {
                    let required = registry.callable(*required);
                    let satisfied = registry.methods_named(ty, name).into_iter().any(|c| {
                        let candidate = registry.callable(c);
                        candidate.is_method()
                            && candidate.access == AccessLevel::Public
                            && candidate.explicit_params() == required.explicit_params()
                            && candidate.ret == required.ret
                    });
                    if !satisfied {
                        let signature = format!(
                            "{name}({})",
                            registry.type_list(required.explicit_params())
                        );
                        return Err(ResolveError::missing_interface_method(
                            &ty_name, &info.name, signature, pos,
                        ));
                    }
                }
            }

            for (name, required) in &info.properties {
                let satisfied = registry.find_member(ty, name).map_or(false, |m| {
                    m.kind == MemberKind::Property
                        && m.access == AccessLevel::Public
                        && !m.is_static
                        && m.ty == required.ty
                        && (m.get || !required.get)
                        && (m.set || !required.set)
                });
                if !satisfied {
                    return Err(ResolveError::missing_interface_property(
                        &ty_name, &info.name, name, pos,
                    ));
                }
            }
        }
        Ok(())
    }

    // ============ Step 6: functions and globals ============

    fn resolve_functions(&mut self) -> ResolveResult<()> {
        let defs = self.defs;
        for def in &defs.funcs {
            if self.ns().has_name(&def.name) {
                return Err(ResolveError::name_collision(&def.name, def.pos));
            }
            let (param_names, param_types) = self.resolve_params(&def.params)?;
            let ret = self.resolve_ret(def.ret.as_ref())?;
            // Imported overloads count too
            let duplicate = self.ns().funcs.get(&def.name).map_or(false, |ids| {
                ids.iter()
                    .any(|c| self.registry.callable(*c).param_types == param_types)
            });
            if duplicate {
                return Err(ResolveError::duplicate_signature(
                    &def.name,
                    self.registry.type_list(&param_types),
                    def.pos,
                ));
            }
            let id = self.registry.add_callable(CallableInfo {
                name: def.name.clone(),
                kind: CallableKind::Function,
                namespace: self.ns,
                param_names,
                param_types,
                ret,
                static_owner: None,
                access: AccessLevel::Public,
                owner: None,
            });
            self.ns_mut()
                .funcs
                .entry(def.name.clone())
                .or_default()
                .push(id);
        }
        Ok(())
    }

    fn resolve_globals(&mut self) -> ResolveResult<()> {
        let defs = self.defs;
        for def in &defs.globals {
            if self.ns().has_name(&def.name) || self.ns().funcs.contains_key(&def.name) {
                return Err(ResolveError::name_collision(&def.name, def.pos));
            }
            let ty = self.resolve_type(&def.ty)?;
            let id = self.registry.add_global(GlobalInfo {
                name: def.name.clone(),
                namespace: self.ns,
                ty,
            });
            self.ns_mut().globals.insert(def.name.clone(), id);
        }
        Ok(())
    }

    // ============ Step 7: structs ============

    fn resolve_structs(&mut self) -> ResolveResult<()> {
        let defs = self.defs;
        for def in &defs.structs {
            let id = self.struct_id(&def.name);
            let interfaces = self.resolve_interface_list(&def.interfaces)?;
            self.registry.struct_mut(id).interfaces = interfaces;
            let body = self.resolve_members(Type::Struct(id), &def.name, &def.members)?;
            self.registry.struct_mut(id).body = body;
        }
        for def in &defs.structs {
            let id = self.struct_id(&def.name);
            let interfaces = self.registry.struct_info(id).interfaces.clone();
            for iface in interfaces {
                self.check_conformance(&Type::Struct(id), iface, def.pos)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::reader::read;
    use crate::sources::SourceError;
    use crate::typeck::ResolveErrorKind;
    use std::collections::HashMap;

    fn defs(source: &str) -> TopDefs {
        let atoms = read(&lex(source).unwrap()).unwrap();
        let mut defs = TopDefs::default();
        parse(&atoms, &mut defs, true).unwrap();
        defs
    }

    /// Resolves imports from in-memory sources, reusing anything already
    /// in the registry.
    struct Deps(HashMap<&'static str, &'static str>);

    impl NamespaceLoader for Deps {
        fn load(&mut self, registry: &mut Registry, namespace: &str) -> Result<NamespaceId, CompileError> {
            if let Some(id) = registry.find_namespace(namespace) {
                return Ok(id);
            }
            let source = self.0.get(namespace).copied().ok_or_else(|| {
                CompileError::Source(SourceError::NotFound {
                    namespace: namespace.to_string(),
                })
            })?;
            resolve(&defs(source), namespace, registry, self).map_err(|e| CompileError::Resolve {
                namespace: namespace.to_string(),
                source: e,
            })
        }
    }

    fn resolve_with(main: &str, deps: &[(&'static str, &'static str)]) -> (Registry, ResolveResult<NamespaceId>) {
        let mut registry = Registry::new();
        let mut loader = Deps(deps.iter().copied().collect());
        let defs = defs(main);
        let name = defs.namespace.as_ref().map(|d| d.name.clone()).unwrap();
        let result = resolve(&defs, &name, &mut registry, &mut loader);
        (registry, result)
    }

    fn resolve_ok(main: &str) -> (Registry, NamespaceId) {
        match resolve_with(main, &[]) {
            (registry, Ok(ns)) => (registry, ns),
            (_, Err(e)) => panic!("unexpected resolve error: {e}"),
        }
    }

    fn resolve_err(main: &str, deps: &[(&'static str, &'static str)]) -> ResolveErrorKind {
        match resolve_with(main, deps).1 {
            Ok(_) => panic!("expected a resolve error"),
            Err(e) => e.kind,
        }
    }

    const WIDGETS_A: (&str, &str) = ("a", "ns a\n(class Widget)\n(func make)\n");
    const WIDGETS_B: (&str, &str) = ("b", "ns b\n(class Widget)\n");

    #[test]
    fn test_namespace_must_match() {
        let mut registry = Registry::new();
        let mut loader = Deps(HashMap::new());
        let err = resolve(&defs("ns geo\n"), "geometry", &mut registry, &mut loader).unwrap_err();
        assert!(matches!(err.kind, ResolveErrorKind::NamespaceMismatch { .. }));
    }

    #[test]
    fn test_duplicate_constructor_signature() {
        let kind = resolve_err(
            "ns geo\n(class Point\n    (constructor : x I y I)\n    (constructor : a I b I))\n",
            &[],
        );
        assert!(matches!(kind, ResolveErrorKind::DuplicateSignature { .. }));
    }

    #[test]
    fn test_constructor_is_synthesized() {
        let (registry, ns) = resolve_ok("ns geo\n(class Point)\n");
        let point = registry.namespace(ns).classes["Point"];
        let ctors = &registry.class(point).body.constructors;
        assert_eq!(ctors.len(), 1);
        assert!(registry.callable(ctors[0]).param_types.is_empty());
    }

    #[test]
    fn test_missing_interface_method() {
        let kind = resolve_err(
            "ns geo\n(interface Shaped (m area FF))\n(class Square : Shaped\n    (m area I (return 1)))\n",
            &[],
        );
        assert!(matches!(kind, ResolveErrorKind::MissingInterfaceMethod { .. }));
    }

    #[test]
    fn test_inherited_method_satisfies_interface() {
        resolve_ok(
            "ns geo\n(interface Shaped (m area FF))\n(class Shape (m area FF (return 1.0)))\n(class Circle : Shape Shaped)\n",
        );
    }

    #[test]
    fn test_parent_interface_methods_are_required() {
        let kind = resolve_err(
            "ns geo\n(interface Named (m name Str))\n(interface Shaped : Named (m area FF))\n(class Square : Shaped\n    (m area FF (return 1.0)))\n",
            &[],
        );
        match kind {
            ResolveErrorKind::MissingInterfaceMethod { interface, .. } => assert_eq!(interface, "Named"),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_struct_conformance() {
        resolve_ok("ns geo\n(interface Named (p name Str -get))\n(struct Point : Named (p name Str))\n");
        let kind = resolve_err(
            "ns geo\n(interface Named (p name Str -get))\n(struct Point : Named (f name Str))\n",
            &[],
        );
        assert!(matches!(kind, ResolveErrorKind::MissingInterfaceProperty { .. }));
    }

    #[test]
    fn test_import_collision() {
        let kind = resolve_err("ns app\n(import a)\n(import b)\n", &[WIDGETS_A, WIDGETS_B]);
        match kind {
            ResolveErrorKind::ImportCollision { name, namespace } => {
                assert_eq!(name, "Widget");
                assert_eq!(namespace, "b");
            }
            other => panic!("unexpected {other}"),
        }

        let (registry, result) = resolve_with("ns app\n(import a)\n", &[WIDGETS_A, WIDGETS_B]);
        let ns = registry.namespace(result.unwrap());
        assert!(ns.lookup_type("Widget").is_some());
        assert_eq!(ns.funcs["make"].len(), 1);
    }

    #[test]
    fn test_imports_are_not_transitive() {
        let middle = ("mid", "ns mid\n(import a)\n(class Gadget)\n");
        let (registry, result) = resolve_with("ns app\n(import mid)\n", &[WIDGETS_A, middle]);
        let ns = registry.namespace(result.unwrap());
        assert!(ns.lookup_type("Gadget").is_some());
        assert!(ns.lookup_type("Widget").is_none());
        assert!(!ns.funcs.contains_key("make"));
    }

    #[test]
    fn test_duplicate_import_short_name() {
        let kind = resolve_err("ns app\n(import a)\n(import b a)\n", &[WIDGETS_A, WIDGETS_B]);
        assert!(matches!(kind, ResolveErrorKind::DuplicateImport { .. }));
    }

    #[test]
    fn test_failed_import_is_wrapped() {
        let kind = resolve_err("ns app\n(import missing)\n", &[]);
        match kind {
            ResolveErrorKind::ImportFailed { namespace, source } => {
                assert_eq!(namespace, "missing");
                assert!(matches!(*source, CompileError::Source(SourceError::NotFound { .. })));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_unknown_parent() {
        let kind = resolve_err("ns geo\n(class Circle : Shape)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::UnknownType { .. }));
    }

    #[test]
    fn test_only_first_supertype_may_be_a_class() {
        let kind = resolve_err("ns geo\n(class A)\n(class B)\n(class C : A B)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::NotAnInterface { .. }));
    }

    #[test]
    fn test_inheritance_cycle() {
        let kind = resolve_err("ns geo\n(class A : B)\n(class B : A)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::InheritanceCycle { .. }));
        let kind = resolve_err("ns geo\n(interface A : B)\n(interface B : A)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::InheritanceCycle { .. }));
    }

    #[test]
    fn test_builtin_names_are_reserved() {
        let kind = resolve_err("ns geo\n(class Str)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::ReservedTypeName { .. }));
    }

    #[test]
    fn test_method_receivers() {
        let (registry, ns) = resolve_ok(
            "ns geo\n(class Shape\n    (m area FF (return 1.0))\n    (m -static unit Shape (return (Shape))))\n",
        );
        let shape = Type::Class(registry.namespace(ns).classes["Shape"]);
        let area = registry.callable(registry.namespace(ns).methods["area"][0]);
        assert_eq!(area.param_names, vec!["me"]);
        assert_eq!(area.receiver(), Some(&shape));

        let unit = registry.callable(registry.namespace(ns).methods["unit"][0]);
        assert!(!unit.is_method());
        assert_eq!(unit.static_owner.as_ref(), Some(&shape));
        assert!(unit.param_types.is_empty());
    }

    #[test]
    fn test_interface_methods_join_namespace_table() {
        let (registry, ns) = resolve_ok("ns geo\n(interface Shaped (m area FF : I))\n");
        let area = registry.callable(registry.namespace(ns).methods["area"][0]);
        assert!(matches!(area.receiver(), Some(Type::Interface(_))));
        assert_eq!(area.explicit_params(), &[Type::INT]);
    }

    #[test]
    fn test_function_overloads() {
        resolve_ok("ns geo\n(func f : x I)\n(func f : x F)\n");
        let kind = resolve_err("ns geo\n(func f : x I)\n(func f : y I)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::DuplicateSignature { .. }));
    }

    #[test]
    fn test_global_and_function_share_names() {
        let kind = resolve_err("ns geo\n(global count I)\n(func count I (return 1))\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::NameCollision { .. }));
    }

    #[test]
    fn test_base_must_be_as_accessible() {
        let kind = resolve_err("ns geo\n(class -priv Base)\n(class Shape : Base)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::LessAccessibleBase { .. }));
        let kind = resolve_err("ns geo\n(interface -prot Base)\n(interface Shaped : Base)\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::LessAccessibleBase { .. }));
        resolve_ok("ns geo\n(class -priv Base)\n(class -prot Shape : Base)\n");
        resolve_ok("ns geo\n(interface -priv Named)\n(class Shape : Named)\n");
    }

    #[test]
    fn test_function_clashing_with_import() {
        let lib = ("lib", "ns lib\n(func make : n I)\n");
        let kind = resolve_err("ns app\n(import lib)\n(func make : size I)\n", &[lib]);
        assert!(matches!(kind, ResolveErrorKind::DuplicateSignature { .. }));
        let (registry, result) = resolve_with("ns app\n(import lib)\n(func make : n FF)\n", &[lib]);
        let ns = registry.namespace(result.unwrap());
        assert_eq!(ns.funcs["make"].len(), 2);

        let other = ("other", "ns other\n(func make : n I)\n");
        let kind = resolve_err("ns app\n(import lib)\n(import other)\n", &[lib, other]);
        assert!(matches!(kind, ResolveErrorKind::ImportCollision { .. }));
    }

    #[test]
    fn test_duplicate_field() {
        let kind = resolve_err("ns geo\n(struct Point (f x I) (p x I))\n", &[]);
        assert!(matches!(kind, ResolveErrorKind::DuplicateMember { .. }));
    }
}

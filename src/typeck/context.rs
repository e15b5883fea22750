//! Registry and Namespace Symbol Tables
//!
//! The [`Registry`] owns every resolved namespace, type and signature of a
//! compilation. Types refer back to their namespace by [`NamespaceId`], so
//! the ownership graph stays a tree.

use crate::ast::{AccessLevel, TypeAtom};
use crate::typeck::error::{ResolveError, ResolveResult};
use crate::typeck::ty::*;
use std::collections::HashMap;

/// Name of the synthesized type that holds globals
pub const GLOBALS_CLASS: &str = "_Globals";
/// Name of the synthesized type that holds free functions
pub const FUNCS_CLASS: &str = "_Funcs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

/// A field or property of a class, struct or interface
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    pub ty: Type,
    pub access: AccessLevel,
    pub is_static: bool,
    /// Accessors a property exposes; fields always have both
    pub get: bool,
    pub set: bool,
    /// Type that declares the member
    pub owner: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    Method,
    Constructor,
}

/// Resolved signature of a function, method or constructor
#[derive(Debug, Clone, PartialEq)]
pub struct CallableInfo {
    pub name: String,
    pub kind: CallableKind,
    pub namespace: NamespaceId,
    /// Instance methods start with the receiver `me`
    pub param_names: Vec<String>,
    pub param_types: Vec<Type>,
    /// `None` is void
    pub ret: Option<Type>,
    /// Owner of a static method
    pub static_owner: Option<Type>,
    pub access: AccessLevel,
    /// Declaring type of methods and constructors
    pub owner: Option<Type>,
}

impl CallableInfo {
    /// Instance methods take their receiver as parameter 0.
    pub fn is_method(&self) -> bool {
        self.kind == CallableKind::Method && self.static_owner.is_none()
    }

    pub fn receiver(&self) -> Option<&Type> {
        if self.is_method() {
            self.param_types.first()
        } else {
            None
        }
    }

    /// Parameter types after the implicit receiver
    pub fn explicit_params(&self) -> &[Type] {
        if self.is_method() {
            &self.param_types[1..]
        } else {
            &self.param_types
        }
    }
}

/// Fields, properties and callables of a class or struct
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    pub members: HashMap<String, MemberInfo>,
    pub methods: HashMap<String, Vec<CallableId>>,
    pub constructors: Vec<CallableId>,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub namespace: NamespaceId,
    pub access: AccessLevel,
    pub parent: Option<ClassId>,
    pub interfaces: Vec<InterfaceId>,
    pub body: MemberTable,
}

#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub namespace: NamespaceId,
    pub access: AccessLevel,
    pub interfaces: Vec<InterfaceId>,
    pub body: MemberTable,
}

#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    pub name: String,
    pub namespace: NamespaceId,
    pub access: AccessLevel,
    pub parents: Vec<InterfaceId>,
    pub methods: HashMap<String, Vec<CallableId>>,
    pub properties: HashMap<String, MemberInfo>,
}

#[derive(Debug, Clone)]
pub struct GlobalInfo {
    pub name: String,
    pub namespace: NamespaceId,
    pub ty: Type,
}

/// The unit of compilation: own declarations merged with imported ones
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub name: String,
    /// Title-cased C# namespace name
    pub cs_name: String,
    pub imports: HashMap<String, NamespaceId>,
    pub classes: HashMap<String, ClassId>,
    pub structs: HashMap<String, StructId>,
    pub interfaces: HashMap<String, InterfaceId>,
    pub globals: HashMap<String, GlobalId>,
    pub funcs: HashMap<String, Vec<CallableId>>,
    pub methods: HashMap<String, Vec<CallableId>>,
}

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cs_name: cs_namespace_name(name),
            ..Default::default()
        }
    }

    /// Whether a type or global already uses `name`
    pub fn has_name(&self, name: &str) -> bool {
        self.classes.contains_key(name)
            || self.structs.contains_key(name)
            || self.interfaces.contains_key(name)
            || self.globals.contains_key(name)
    }

    /// Look up a user type by unqualified name
    pub fn lookup_type(&self, name: &str) -> Option<Type> {
        if let Some(id) = self.classes.get(name) {
            return Some(Type::Class(*id));
        }
        if let Some(id) = self.structs.get(name) {
            return Some(Type::Struct(*id));
        }
        self.interfaces.get(name).map(|id| Type::Interface(*id))
    }
}

/// `app.core` becomes `App.Core`
pub fn cs_namespace_name(name: &str) -> String {
    name.split('.')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Owns every namespace, type and signature of one compilation
#[derive(Debug, Default)]
pub struct Registry {
    namespaces: Vec<Namespace>,
    classes: Vec<ClassInfo>,
    structs: Vec<StructInfo>,
    interfaces: Vec<InterfaceInfo>,
    callables: Vec<CallableInfo>,
    globals: Vec<GlobalInfo>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Arena access ============

    pub fn add_namespace(&mut self, ns: Namespace) -> NamespaceId {
        self.namespaces.push(ns);
        NamespaceId(self.namespaces.len() - 1)
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0]
    }

    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut Namespace {
        &mut self.namespaces[id.0]
    }

    pub fn find_namespace(&self, name: &str) -> Option<NamespaceId> {
        self.namespaces
            .iter()
            .position(|ns| ns.name == name)
            .map(NamespaceId)
    }

    pub fn add_class(&mut self, info: ClassInfo) -> ClassId {
        self.classes.push(info);
        ClassId(self.classes.len() - 1)
    }

    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.0]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassInfo {
        &mut self.classes[id.0]
    }

    pub fn add_struct(&mut self, info: StructInfo) -> StructId {
        self.structs.push(info);
        StructId(self.structs.len() - 1)
    }

    pub fn struct_info(&self, id: StructId) -> &StructInfo {
        &self.structs[id.0]
    }

    pub fn struct_mut(&mut self, id: StructId) -> &mut StructInfo {
        &mut self.structs[id.0]
    }

    pub fn add_interface(&mut self, info: InterfaceInfo) -> InterfaceId {
        self.interfaces.push(info);
        InterfaceId(self.interfaces.len() - 1)
    }

    pub fn interface(&self, id: InterfaceId) -> &InterfaceInfo {
        &self.interfaces[id.0]
    }

    pub fn interface_mut(&mut self, id: InterfaceId) -> &mut InterfaceInfo {
        &mut self.interfaces[id.0]
    }

    pub fn add_callable(&mut self, info: CallableInfo) -> CallableId {
        self.callables.push(info);
        CallableId(self.callables.len() - 1)
    }

    pub fn callable(&self, id: CallableId) -> &CallableInfo {
        &self.callables[id.0]
    }

    pub fn add_global(&mut self, info: GlobalInfo) -> GlobalId {
        self.globals.push(info);
        GlobalId(self.globals.len() - 1)
    }

    pub fn global(&self, id: GlobalId) -> &GlobalInfo {
        &self.globals[id.0]
    }

    /// Member table of a class or struct
    pub fn body(&self, ty: &Type) -> Option<&MemberTable> {
        match ty {
            Type::Class(id) => Some(&self.class(*id).body),
            Type::Struct(id) => Some(&self.struct_info(*id).body),
            _ => None,
        }
    }

    /// Namespace that declares a user type
    pub fn declaring_namespace(&self, ty: &Type) -> Option<NamespaceId> {
        match ty {
            Type::Class(id) => Some(self.class(*id).namespace),
            Type::Struct(id) => Some(self.struct_info(*id).namespace),
            Type::Interface(id) => Some(self.interface(*id).namespace),
            _ => None,
        }
    }

    // ============ Type names ============

    /// Source-style name, qualified with the declaring namespace
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Builtin(b) => b.source_name().to_string(),
            Type::Array(elem) => format!("{ARRAY_TYPE_NAME}<{}>", self.type_name(elem)),
            Type::Class(id) => {
                let info = self.class(*id);
                format!("{}.{}", self.namespace(info.namespace).name, info.name)
            }
            Type::Struct(id) => {
                let info = self.struct_info(*id);
                format!("{}.{}", self.namespace(info.namespace).name, info.name)
            }
            Type::Interface(id) => {
                let info = self.interface(*id);
                format!("{}.{}", self.namespace(info.namespace).name, info.name)
            }
        }
    }

    /// Unqualified declared name of a user type
    pub fn short_type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Class(id) => self.class(*id).name.clone(),
            Type::Struct(id) => self.struct_info(*id).name.clone(),
            Type::Interface(id) => self.interface(*id).name.clone(),
            other => self.type_name(other),
        }
    }

    pub fn type_list(&self, types: &[Type]) -> String {
        types
            .iter()
            .map(|t| self.type_name(t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fully qualified C# spelling
    pub fn cs_type(&self, ty: &Type) -> String {
        match ty {
            Type::Builtin(b) => b.cs_name().to_string(),
            Type::Array(elem) => format!("{}[]", self.cs_type(elem)),
            Type::Class(_) | Type::Struct(_) | Type::Interface(_) => {
                let ns = self.declaring_namespace(ty).map(|id| self.namespace(id));
                let prefix = ns.map(|ns| ns.cs_name.as_str()).unwrap_or_default();
                format!("{prefix}.{}", self.short_type_name(ty))
            }
        }
    }

    // ============ Type resolution ============

    /// Resolve a type reference as seen from namespace `ns`.
    pub fn resolve_type_atom(&self, ns: NamespaceId, atom: &TypeAtom) -> ResolveResult<Type> {
        let scope = self.namespace(ns);
        if let Some(short) = &atom.namespace {
            let foreign = *scope
                .imports
                .get(short)
                .ok_or_else(|| ResolveError::unknown_import(short, atom.pos))?;
            let mut unqualified = atom.clone();
            unqualified.namespace = None;
            let ty = self.resolve_type_atom(foreign, &unqualified)?;
            return match self.declaring_namespace(&ty) {
                Some(owner) if owner != foreign => {
                    Err(ResolveError::unknown_type(atom.to_string(), atom.pos))
                }
                _ => Ok(ty),
            };
        }

        if atom.name == ARRAY_TYPE_NAME {
            if atom.params.len() != 1 {
                return Err(ResolveError::wrong_type_params(
                    &atom.name,
                    1,
                    atom.params.len(),
                    atom.pos,
                ));
            }
            let elem = self.resolve_type_atom(ns, &atom.params[0])?;
            return Ok(Type::array_of(elem));
        }

        let ty = match Builtin::from_name(&atom.name) {
            Some(b) => Type::Builtin(b),
            None => scope
                .lookup_type(&atom.name)
                .ok_or_else(|| ResolveError::unknown_type(atom.to_string(), atom.pos))?,
        };
        if !atom.params.is_empty() {
            return Err(ResolveError::wrong_type_params(
                &atom.name,
                0,
                atom.params.len(),
                atom.pos,
            ));
        }
        Ok(ty)
    }

    // ============ Member lookup ============

    /// Classes from `id` up through its ancestors, stopping on a cycle
    pub fn class_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = self.class(id).parent;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.class(parent).parent;
        }
        chain
    }

    /// `id` and every interface it extends, each once
    pub fn interface_closure(&self, id: InterfaceId) -> Vec<InterfaceId> {
        let mut seen = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            stack.extend(self.interface(current).parents.iter().copied());
        }
        seen
    }

    /// Find a field or property, walking class ancestors and parent
    /// interfaces.
    pub fn find_member(&self, ty: &Type, name: &str) -> Option<&MemberInfo> {
        match ty {
            Type::Class(id) => self
                .class_chain(*id)
                .into_iter()
                .find_map(|c| self.class(c).body.members.get(name)),
            Type::Struct(id) => self.struct_info(*id).body.members.get(name),
            Type::Interface(id) => self
                .interface_closure(*id)
                .into_iter()
                .find_map(|i| self.interface(i).properties.get(name)),
            _ => None,
        }
    }

    /// Every method named `name` visible on `ty`, most derived first
    pub fn methods_named(&self, ty: &Type, name: &str) -> Vec<CallableId> {
        let tables: Vec<&HashMap<String, Vec<CallableId>>> = match ty {
            Type::Class(id) => self
                .class_chain(*id)
                .into_iter()
                .map(|c| &self.class(c).body.methods)
                .collect(),
            Type::Struct(id) => vec![&self.struct_info(*id).body.methods],
            Type::Interface(id) => self
                .interface_closure(*id)
                .into_iter()
                .map(|i| &self.interface(i).methods)
                .collect(),
            _ => Vec::new(),
        };
        tables
            .into_iter()
            .filter_map(|table| table.get(name))
            .flatten()
            .copied()
            .collect()
    }
}

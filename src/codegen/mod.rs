//! C# Code Generation
//!
//! Lowers one resolved namespace to a single C# source file. Bodies are
//! type checked while they are lowered, so this stage also reports every
//! error that depends on expression types.
//!
//! # Layout of the output
//!
//! ```text
//! using System;
//! using System.Linq;
//!
//! namespace App.Core {
//!     public static class _Globals { ... }   every global
//!     public static class _Funcs { ... }     every free function
//!     public interface ... / class ... / struct ...
//! }
//! ```

mod error;
mod expr;
mod literal;
mod ops;
mod scope;
mod stmt;

pub use error::{GenError, GenErrorKind, GenResult};
pub use literal::{fits, lower_number, verbatim_string};
pub use ops::Operator;

use crate::ast::*;
use crate::span::Position;
use crate::typeck::*;
use scope::Scope;

/// Lower the declarations of namespace `ns` to C# source text.
pub fn generate(defs: &TopDefs, registry: &Registry, ns: NamespaceId) -> GenResult<String> {
    let mut gen = Generator::new(registry, ns);
    gen.emit_namespace(defs)?;
    let output = gen.out.finish();
    tracing::debug!(
        target: "codegen",
        namespace = %registry.namespace(ns).name,
        bytes = output.len(),
        "generated namespace"
    );
    Ok(output)
}

/// A lowered expression. `ty` is `None` for a call that returns nothing.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub code: String,
    pub ty: Option<Type>,
}

impl Fragment {
    pub fn new(code: impl Into<String>, ty: Type) -> Self {
        Self {
            code: code.into(),
            ty: Some(ty),
        }
    }
}

const CS_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Member names that are C# keywords get a `@` prefix.
pub fn escape_ident(name: &str) -> String {
    if CS_KEYWORDS.contains(&name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

/// `obsolete` becomes `Obsolete`
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Access keyword of a top-level type. C# has no private namespace
/// members, so anything not public is `internal`.
fn type_access(access: AccessLevel) -> &'static str {
    match access {
        AccessLevel::Public => "public",
        AccessLevel::Protected | AccessLevel::Private => "internal",
    }
}

fn supertype_list(supertypes: &[String]) -> String {
    if supertypes.is_empty() {
        String::new()
    } else {
        format!(" : {}", supertypes.join(", "))
    }
}

/// Indented line writer
#[derive(Debug, Default)]
struct Writer {
    output: String,
    indent: usize,
}

impl Writer {
    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push('\t');
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    /// `head {` and indent
    fn open(&mut self, head: &str) {
        self.line(&format!("{head} {{"));
        self.indent += 1;
    }

    /// A line at the enclosing level, such as `} else {`
    fn reopen(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.output
    }
}

/// Lowers one namespace. Expression lowering lives in `expr` and `ops`,
/// statements in `stmt`.
pub(crate) struct Generator<'a> {
    registry: &'a Registry,
    ns: NamespaceId,
    out: Writer,
}

impl<'a> Generator<'a> {
    fn new(registry: &'a Registry, ns: NamespaceId) -> Self {
        Self {
            registry,
            ns,
            out: Writer::default(),
        }
    }

    fn namespace(&self) -> &'a Namespace {
        self.registry.namespace(self.ns)
    }

    fn resolve_type(&self, atom: &TypeAtom) -> GenResult<Type> {
        Ok(self.registry.resolve_type_atom(self.ns, atom)?)
    }

    fn resolve_ret(&self, atom: Option<&TypeAtom>) -> GenResult<Option<Type>> {
        atom.map(|a| self.resolve_type(a)).transpose()
    }

    fn resolve_params(&self, params: &[Param]) -> GenResult<Vec<(String, Type)>> {
        params
            .iter()
            .map(|p| Ok((p.name.clone(), self.resolve_type(&p.ty)?)))
            .collect()
    }

    fn cs_ret(&self, ret: Option<&Type>) -> String {
        ret.map_or_else(|| "void".to_string(), |ty| self.registry.cs_type(ty))
    }

    /// Declare `params` in `scope`, returning the C# parameter list.
    fn declare_params(
        &self,
        scope: &mut Scope,
        params: &[(String, Type)],
        pos: Position,
    ) -> GenResult<String> {
        let mut list = Vec::with_capacity(params.len());
        for (name, ty) in params {
            let code = scope.declare(name, ty.clone(), pos)?;
            list.push(format!("{} {code}", self.registry.cs_type(ty)));
        }
        Ok(list.join(", "))
    }

    fn member_scope(&self, owner: &Type, name: &str, is_static: bool, ret: Option<Type>) -> Scope {
        let scope = Scope::new(name, Some(owner.clone()), ret);
        if is_static {
            scope
        } else {
            scope.with_receiver()
        }
    }

    /// `head {` body `}`, checking that a value-returning body returns.
    fn emit_body(&mut self, head: &str, mut scope: Scope, body: &[Stmt], pos: Position) -> GenResult<()> {
        if scope.ret.is_some() && !stmt::ends_in_return(body) {
            return Err(GenError::new(
                GenErrorKind::MissingReturn {
                    name: scope.owner_name.clone(),
                },
                pos,
            ));
        }
        self.out.open(head);
        self.block(&mut scope, body)?;
        self.out.close();
        Ok(())
    }

    fn emit_annotations(&mut self, annotations: &[Annotation]) -> GenResult<()> {
        let scope = Scope::default();
        for annotation in annotations {
            let mut args = Vec::with_capacity(annotation.args.len());
            for arg in &annotation.args {
                let code = match arg {
                    Expr::Number(lit) if fits(lit, Builtin::Int) => lower_number(lit, Some(Builtin::Int))?.0,
                    other => self.expr(&scope, other, None)?.code,
                };
                args.push(code);
            }
            let name = title_case(&annotation.name);
            if args.is_empty() {
                self.out.line(&format!("[{name}]"));
            } else {
                self.out.line(&format!("[{name}({})]", args.join(", ")));
            }
        }
        Ok(())
    }

    // ============ Namespace ============

    fn emit_namespace(&mut self, defs: &TopDefs) -> GenResult<()> {
        self.out.line("using System;");
        self.out.line("using System.Linq;");
        self.out.blank();
        let cs_name = &self.namespace().cs_name;
        self.out.open(&format!("namespace {cs_name}"));
        self.emit_globals(defs)?;
        self.emit_funcs(defs)?;
        for def in &defs.interfaces {
            self.emit_interface(def)?;
        }
        for def in &defs.classes {
            self.emit_class(def)?;
        }
        for def in &defs.structs {
            self.emit_struct(def)?;
        }
        self.out.close();
        Ok(())
    }

    fn emit_globals(&mut self, defs: &TopDefs) -> GenResult<()> {
        self.out.open(&format!("public static class {GLOBALS_CLASS}"));
        for def in &defs.globals {
            self.emit_annotations(&def.annotations)?;
            let ty = self.resolve_type(&def.ty)?;
            let cs = self.registry.cs_type(&ty);
            let name = escape_ident(&def.name);
            match &def.value {
                Some(value) => {
                    let scope = Scope::new(&def.name, None, None);
                    let init = self.value(&scope, value, &ty)?;
                    self.out.line(&format!("public static {cs} {name} = {init};"));
                }
                None => self.out.line(&format!("public static {cs} {name};")),
            }
        }
        self.out.close();
        Ok(())
    }

    fn emit_funcs(&mut self, defs: &TopDefs) -> GenResult<()> {
        self.out.open(&format!("public static class {FUNCS_CLASS}"));
        for def in &defs.funcs {
            self.emit_annotations(&def.annotations)?;
            let params = self.resolve_params(&def.params)?;
            let ret = self.resolve_ret(def.ret.as_ref())?;
            let ret_cs = self.cs_ret(ret.as_ref());
            let mut scope = Scope::new(&def.name, None, ret);
            let list = self.declare_params(&mut scope, &params, def.pos)?;
            let head = format!("public static {ret_cs} {}({list})", escape_ident(&def.name));
            self.emit_body(&head, scope, &def.body, def.pos)?;
        }
        if let Some(main) = defs.funcs.iter().find(|f| f.name == "main" && f.params.is_empty()) {
            self.emit_entry_point(main)?;
        }
        self.out.close();
        Ok(())
    }

    /// `Main` forwards to `main`. An `I` result becomes the exit code.
    fn emit_entry_point(&mut self, main: &FuncDef) -> GenResult<()> {
        match self.resolve_ret(main.ret.as_ref())? {
            None => {
                self.out.open("public static void Main(string[] args)");
                self.out.line("main();");
            }
            Some(ty) if ty == Type::INT => {
                self.out.open("public static int Main(string[] args)");
                self.out.line("return main();");
            }
            Some(ty) => {
                return Err(GenError::new(
                    GenErrorKind::BadMainReturn {
                        found: self.registry.type_name(&ty),
                    },
                    main.pos,
                ))
            }
        }
        self.out.close();
        Ok(())
    }

    // ============ Types ============

    fn emit_interface(&mut self, def: &InterfaceDef) -> GenResult<()> {
        let id = self.namespace().interfaces[&def.name];
        let parents: Vec<String> = self
            .registry
            .interface(id)
            .parents
            .iter()
            .map(|p| self.registry.cs_type(&Type::Interface(*p)))
            .collect();
        self.emit_annotations(&def.annotations)?;
        self.out.open(&format!(
            "{} interface {}{}",
            type_access(def.access),
            def.name,
            supertype_list(&parents)
        ));
        for method in &def.methods {
            let ret = self.resolve_ret(method.ret.as_ref())?;
            let mut params = Vec::with_capacity(method.params.len());
            for (i, atom) in method.params.iter().enumerate() {
                let ty = self.resolve_type(atom)?;
                params.push(format!("{} _p{i}", self.registry.cs_type(&ty)));
            }
            self.out.line(&format!(
                "{} {}({});",
                self.cs_ret(ret.as_ref()),
                escape_ident(&method.name),
                params.join(", ")
            ));
        }
        for prop in &def.properties {
            let ty = self.resolve_type(&prop.ty)?;
            let mut accessors = String::new();
            if prop.get {
                accessors.push_str("get; ");
            }
            if prop.set {
                accessors.push_str("set; ");
            }
            self.out.line(&format!(
                "{} {} {{ {accessors}}}",
                self.registry.cs_type(&ty),
                escape_ident(&prop.name)
            ));
        }
        self.out.close();
        Ok(())
    }

    fn emit_class(&mut self, def: &ClassDef) -> GenResult<()> {
        let id = self.namespace().classes[&def.name];
        let info = self.registry.class(id);
        let supertypes: Vec<String> = info
            .parent
            .map(Type::Class)
            .into_iter()
            .chain(info.interfaces.iter().map(|i| Type::Interface(*i)))
            .map(|ty| self.registry.cs_type(&ty))
            .collect();
        self.emit_annotations(&def.annotations)?;
        self.out.open(&format!(
            "{} class {}{}",
            type_access(def.access),
            def.name,
            supertype_list(&supertypes)
        ));
        self.emit_members(&Type::Class(id), &def.name, &def.members)?;
        self.out.close();
        Ok(())
    }

    fn emit_struct(&mut self, def: &StructDef) -> GenResult<()> {
        let id = self.namespace().structs[&def.name];
        let supertypes: Vec<String> = self
            .registry
            .struct_info(id)
            .interfaces
            .iter()
            .map(|i| self.registry.cs_type(&Type::Interface(*i)))
            .collect();
        self.emit_annotations(&def.annotations)?;
        self.out.open(&format!(
            "{} struct {}{}",
            type_access(def.access),
            def.name,
            supertype_list(&supertypes)
        ));
        self.emit_members(&Type::Struct(id), &def.name, &def.members)?;
        self.out.close();
        Ok(())
    }

    fn emit_members(&mut self, owner: &Type, owner_name: &str, members: &Members) -> GenResult<()> {
        let is_struct = matches!(owner, Type::Struct(_));
        // Struct instance fields cannot have initializers before C# 10, so
        // they are assigned at the top of every constructor instead.
        let mut field_inits = Vec::new();
        for field in &members.fields {
            self.emit_annotations(&field.annotations)?;
            let ty = self.resolve_type(&field.ty)?;
            let name = escape_ident(&field.name);
            let head = format!(
                "{}{} {} {name}",
                field.access.keyword(),
                if field.is_static { " static" } else { "" },
                self.registry.cs_type(&ty),
            );
            match &field.value {
                Some(value) => {
                    let scope = Scope::new(&field.name, Some(owner.clone()), None);
                    let init = self.value(&scope, value, &ty)?;
                    if is_struct && !field.is_static {
                        if members.constructors.is_empty() {
                            return Err(GenError::new(
                                GenErrorKind::StructFieldInitializer {
                                    owner: owner_name.to_string(),
                                    field: field.name.clone(),
                                },
                                field.pos,
                            ));
                        }
                        field_inits.push(format!("this.{name} = {init};"));
                        self.out.line(&format!("{head};"));
                    } else {
                        self.out.line(&format!("{head} = {init};"));
                    }
                }
                None => self.out.line(&format!("{head};")),
            }
        }

        for prop in &members.properties {
            self.emit_property(owner, prop)?;
        }

        for ctor in &members.constructors {
            self.emit_annotations(&ctor.annotations)?;
            let params = self.resolve_params(&ctor.params)?;
            let mut scope = self.member_scope(owner, owner_name, false, None);
            let list = self.declare_params(&mut scope, &params, ctor.pos)?;
            let head = format!("{} {owner_name}({list})", ctor.access.keyword());
            if is_struct {
                // `this()` zeroes every field first
                self.out.open(&format!("{head} : this()"));
                for line in &field_inits {
                    self.out.line(line);
                }
                self.block(&mut scope, &ctor.body)?;
                self.out.close();
            } else {
                self.emit_body(&head, scope, &ctor.body, ctor.pos)?;
            }
        }

        for method in &members.methods {
            self.emit_annotations(&method.annotations)?;
            let params = self.resolve_params(&method.params)?;
            let ret = self.resolve_ret(method.ret.as_ref())?;
            let explicit: Vec<Type> = params.iter().map(|(_, ty)| ty.clone()).collect();
            let modifier = match owner {
                _ if method.is_static => " static",
                Type::Class(id) if method.access != AccessLevel::Private => {
                    if self.overrides_ancestor(*id, &method.name, &explicit) {
                        " override"
                    } else {
                        " virtual"
                    }
                }
                _ => "",
            };
            let ret_cs = self.cs_ret(ret.as_ref());
            let mut scope = self.member_scope(owner, &method.name, method.is_static, ret);
            let list = self.declare_params(&mut scope, &params, method.pos)?;
            let head = format!(
                "{}{modifier} {ret_cs} {}({list})",
                method.access.keyword(),
                escape_ident(&method.name)
            );
            self.emit_body(&head, scope, &method.body, method.pos)?;
        }
        Ok(())
    }

    fn emit_property(&mut self, owner: &Type, prop: &PropertyDef) -> GenResult<()> {
        self.emit_annotations(&prop.annotations)?;
        let ty = self.resolve_type(&prop.ty)?;
        let cs = self.registry.cs_type(&ty);
        let is_static = if prop.is_static { " static" } else { "" };
        let name = escape_ident(&prop.name);
        let access = prop.access.keyword();
        match &prop.accessors {
            None => {
                let backing = format!("__{}", prop.name);
                self.out.line(&format!("private{is_static} {cs} {backing};"));
                self.out.line(&format!(
                    "{access}{is_static} {cs} {name} {{ get {{ return {backing}; }} set {{ {backing} = value; }} }}"
                ));
            }
            Some(accessors) => {
                self.out.open(&format!("{access}{is_static} {cs} {name}"));
                let getter = self.member_scope(owner, &prop.name, prop.is_static, Some(ty.clone()));
                self.emit_body("get", getter, &accessors.get, prop.pos)?;
                let mut setter = self.member_scope(owner, &prop.name, prop.is_static, None);
                setter.insert("value", ty, "value");
                self.emit_body("set", setter, &accessors.set, prop.pos)?;
                self.out.close();
            }
        }
        Ok(())
    }

    /// Whether a strict ancestor of `class` declares an instance method
    /// with the same name and parameter types.
    fn overrides_ancestor(&self, class: ClassId, name: &str, explicit: &[Type]) -> bool {
        self.registry
            .class_chain(class)
            .into_iter()
            .skip(1)
            .filter_map(|ancestor| self.registry.class(ancestor).body.methods.get(name))
            .flatten()
            .any(|id| {
                let info = self.registry.callable(*id);
                info.is_method() && info.access != AccessLevel::Private && info.explicit_params() == explicit
            })
    }
}

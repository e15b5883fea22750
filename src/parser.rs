//! Parser
//!
//! Walks the atom tree produced by the reader and builds the declarative
//! AST. Every file of a namespace is parsed into the same [`TopDefs`].
//!
//! Naming is enforced here: value and callable names start lowercase,
//! type names start uppercase.

use crate::ast::*;
use crate::lexer::unescape_str;
use crate::reader::{Atom, AtomKind};
use crate::span::Position;
use crate::token::Bracket;
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{pos}: {form} expects {expected}")]
    Arity {
        form: String,
        expected: &'static str,
        pos: Position,
    },

    #[error("{pos}: {what} name {name:?} must start with {case} letter")]
    Casing {
        what: &'static str,
        name: String,
        case: &'static str,
        pos: Position,
    },

    #[error("{pos}: expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
        pos: Position,
    },

    #[error("{pos}: malformed number literal {text}")]
    MalformedNumber { text: String, pos: Position },

    #[error("{pos}: improper expression as statement")]
    NotAStatement { pos: Position },

    #[error("{pos}: {what} is only allowed in the main file of a namespace")]
    MainFileOnly { what: &'static str, pos: Position },

    #[error("{pos}: {message}")]
    Custom { message: String, pos: Position },
}

impl ParseError {
    pub fn pos(&self) -> Position {
        match self {
            ParseError::Arity { pos, .. }
            | ParseError::Casing { pos, .. }
            | ParseError::Expected { pos, .. }
            | ParseError::MalformedNumber { pos, .. }
            | ParseError::NotAStatement { pos }
            | ParseError::MainFileOnly { pos, .. }
            | ParseError::Custom { pos, .. } => *pos,
        }
    }

    fn custom(message: impl Into<String>, pos: Position) -> Self {
        ParseError::Custom {
            message: message.into(),
            pos,
        }
    }

    fn expected(expected: &'static str, atom: &Atom) -> Self {
        ParseError::Expected {
            expected,
            found: atom.to_string(),
            pos: atom.pos,
        }
    }

    fn arity(form: &str, expected: &'static str, pos: Position) -> Self {
        ParseError::Arity {
            form: format!("({form} ...)"),
            expected,
            pos,
        }
    }
}

/// Parse result
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse one file's atoms into `defs`.
///
/// `is_main` marks the namespace's main file, the only one allowed to
/// import or to define `main`.
pub fn parse(atoms: &[Atom], defs: &mut TopDefs, is_main: bool) -> ParseResult<()> {
    let mut parser = Parser {
        is_main,
        annotations: Vec::new(),
    };
    parser.parse_file(atoms, defs)
}

struct Parser {
    is_main: bool,
    /// Annotations waiting for the next declaration
    annotations: Vec<Annotation>,
}

impl Parser {
    fn parse_file(&mut self, atoms: &[Atom], defs: &mut TopDefs) -> ParseResult<()> {
        let rest = self.parse_namespace_decl(atoms, defs)?;

        for atom in rest {
            let items = paren_items(atom, "top-level declaration")?;
            let Some(head) = items.first() else {
                return Err(ParseError::custom("empty top-level form", atom.pos));
            };
            if is_annotation_head(head) {
                let annotation = parse_annotation(items, atom.pos)?;
                self.annotations.push(annotation);
                continue;
            }
            match head.as_symbol() {
                Some("class") => {
                    let class = self.parse_class(items, atom.pos)?;
                    defs.classes.push(class);
                }
                Some("struct") => {
                    let def = self.parse_struct(items, atom.pos)?;
                    defs.structs.push(def);
                }
                Some("interface") => {
                    let def = self.parse_interface(items, atom.pos)?;
                    defs.interfaces.push(def);
                }
                Some("func") => {
                    let def = self.parse_func(items, atom.pos)?;
                    defs.funcs.push(def);
                }
                Some("global") => {
                    let def = self.parse_global(items, atom.pos)?;
                    defs.globals.push(def);
                }
                Some("import") => {
                    let def = self.parse_import(items, atom.pos)?;
                    defs.imports.push(def);
                }
                _ => return Err(ParseError::expected("declaration keyword", head)),
            }
        }

        if let Some(dangling) = self.annotations.first() {
            return Err(ParseError::custom(
                "annotation is not followed by a declaration",
                dangling.pos,
            ));
        }
        Ok(())
    }

    /// Consumes the leading `ns a.b.c` words.
    fn parse_namespace_decl<'a>(
        &self,
        atoms: &'a [Atom],
        defs: &mut TopDefs,
    ) -> ParseResult<&'a [Atom]> {
        let start = atoms.first().map_or(Position::new(1, 1), |a| a.pos);
        let (keyword, name_atom) = match atoms {
            [keyword, name, ..] if keyword.is_symbol("ns") => (keyword, name),
            _ => {
                return Err(ParseError::custom(
                    "file must begin with a namespace declaration `ns <name>`",
                    start,
                ))
            }
        };
        let name = parse_namespace_name(name_atom)?;
        match &defs.namespace {
            Some(existing) if existing.name != name => {
                return Err(ParseError::custom(
                    format!(
                        "namespace {name} does not match {} declared by another file",
                        existing.name
                    ),
                    keyword.pos,
                ))
            }
            Some(_) => {}
            None => {
                defs.namespace = Some(NamespaceDecl {
                    name,
                    pos: keyword.pos,
                })
            }
        }
        Ok(&atoms[2..])
    }

    fn take_annotations(&mut self) -> Vec<Annotation> {
        std::mem::take(&mut self.annotations)
    }

    fn parse_import(&mut self, items: &[Atom], pos: Position) -> ParseResult<ImportDef> {
        if !self.is_main {
            return Err(ParseError::MainFileOnly { what: "import", pos });
        }
        if !(2..=3).contains(&items.len()) {
            return Err(ParseError::arity("import", "a namespace and an optional short name", pos));
        }
        let namespace = parse_namespace_name(&items[1])?;
        let short_name = match items.get(2) {
            Some(atom) => value_name(atom, "import")?,
            None => namespace.rsplit('.').next().unwrap_or(namespace.as_str()).to_string(),
        };
        if !self.annotations.is_empty() {
            return Err(ParseError::custom("imports cannot be annotated", pos));
        }
        Ok(ImportDef {
            namespace,
            short_name,
            pos,
        })
    }

    fn parse_global(&mut self, items: &[Atom], pos: Position) -> ParseResult<GlobalDef> {
        if !(3..=4).contains(&items.len()) {
            return Err(ParseError::arity("global", "a name, a type and an optional value", pos));
        }
        Ok(GlobalDef {
            name: value_name(&items[1], "global")?,
            ty: type_atom(&items[2])?,
            value: items.get(3).map(parse_expr).transpose()?,
            annotations: self.take_annotations(),
            pos,
        })
    }

    fn parse_func(&mut self, items: &[Atom], pos: Position) -> ParseResult<FuncDef> {
        let name_atom = items
            .get(1)
            .ok_or_else(|| ParseError::arity("func", "a name", pos))?;
        let name = value_name(name_atom, "function")?;
        if name == "main" && !self.is_main {
            return Err(ParseError::MainFileOnly {
                what: "function main",
                pos,
            });
        }
        let (ret, idx) = optional_return_type(items, 2)?;
        let (params, idx) = parse_params(items, idx)?;
        Ok(FuncDef {
            name,
            params,
            ret,
            body: parse_body(&items[idx..])?,
            annotations: self.take_annotations(),
            pos,
        })
    }

    fn parse_class(&mut self, items: &[Atom], pos: Position) -> ParseResult<ClassDef> {
        let annotations = self.take_annotations();
        let (mods, idx) = parse_modifiers(items, 1)?;
        if mods.is_static {
            return Err(ParseError::custom("a class cannot be static", pos));
        }
        let name_atom = items
            .get(idx)
            .ok_or_else(|| ParseError::arity("class", "a type name", pos))?;
        let name = type_name(name_atom, "class")?;
        let (supertypes, idx) = parse_supertypes(items, idx + 1)?;
        let members = self.parse_members(&items[idx..], true)?;
        Ok(ClassDef {
            name,
            access: mods.access,
            supertypes,
            members,
            annotations,
            pos,
        })
    }

    fn parse_struct(&mut self, items: &[Atom], pos: Position) -> ParseResult<StructDef> {
        let annotations = self.take_annotations();
        let (mods, idx) = parse_modifiers(items, 1)?;
        if mods.is_static {
            return Err(ParseError::custom("a struct cannot be static", pos));
        }
        let name_atom = items
            .get(idx)
            .ok_or_else(|| ParseError::arity("struct", "a type name", pos))?;
        let name = type_name(name_atom, "struct")?;
        let (interfaces, idx) = parse_supertypes(items, idx + 1)?;
        let members = self.parse_members(&items[idx..], false)?;
        Ok(StructDef {
            name,
            access: mods.access,
            interfaces,
            members,
            annotations,
            pos,
        })
    }

    fn parse_members(&mut self, atoms: &[Atom], in_class: bool) -> ParseResult<Members> {
        let mut members = Members::default();
        for atom in atoms {
            let items = paren_items(atom, "member declaration")?;
            let Some(head) = items.first() else {
                return Err(ParseError::custom("empty member form", atom.pos));
            };
            if is_annotation_head(head) {
                let annotation = parse_annotation(items, atom.pos)?;
                self.annotations.push(annotation);
                continue;
            }
            match head.as_symbol() {
                Some("f") => {
                    let field = self.parse_field(items, atom.pos)?;
                    members.fields.push(field);
                }
                Some("p") => {
                    let property = self.parse_property(items, atom.pos)?;
                    members.properties.push(property);
                }
                Some("m") => {
                    let method = self.parse_method(items, atom.pos)?;
                    members.methods.push(method);
                }
                Some("constructor") => {
                    let ctor = self.parse_constructor(items, atom.pos)?;
                    members.constructors.push(ctor);
                }
                _ => {
                    let expected = if in_class { "class member" } else { "struct member" };
                    return Err(ParseError::expected(expected, head));
                }
            }
        }
        if let Some(dangling) = self.annotations.first() {
            return Err(ParseError::custom(
                "annotation is not followed by a member",
                dangling.pos,
            ));
        }
        Ok(members)
    }

    fn parse_field(&mut self, items: &[Atom], pos: Position) -> ParseResult<FieldDef> {
        let (mods, idx) = parse_modifiers(items, 1)?;
        let rest = &items[idx..];
        if !(2..=3).contains(&rest.len()) {
            return Err(ParseError::arity("f", "a name, a type and an optional value", pos));
        }
        Ok(FieldDef {
            name: value_name(&rest[0], "field")?,
            ty: type_atom(&rest[1])?,
            access: mods.access,
            is_static: mods.is_static,
            value: rest.get(2).map(parse_expr).transpose()?,
            annotations: self.take_annotations(),
            pos,
        })
    }

    fn parse_property(&mut self, items: &[Atom], pos: Position) -> ParseResult<PropertyDef> {
        let (mods, idx) = parse_modifiers(items, 1)?;
        let rest = &items[idx..];
        if rest.len() < 2 {
            return Err(ParseError::arity("p", "a name and a type", pos));
        }
        let name = value_name(&rest[0], "property")?;
        let ty = type_atom(&rest[1])?;

        let accessors = if rest.len() == 2 {
            None
        } else {
            let mut get = None;
            let mut set = None;
            let mut i = 2;
            while i < rest.len() {
                let flag = rest[i].as_flag();
                let slot = match flag {
                    Some("get") => &mut get,
                    Some("set") => &mut set,
                    _ => return Err(ParseError::expected("-get or -set", &rest[i])),
                };
                if slot.is_some() {
                    return Err(ParseError::custom("accessor declared twice", rest[i].pos));
                }
                let end = rest[i + 1..]
                    .iter()
                    .position(|a| a.as_flag().is_some())
                    .map_or(rest.len(), |p| i + 1 + p);
                *slot = Some(parse_body(&rest[i + 1..end])?);
                i = end;
            }
            match (get, set) {
                (Some(get), Some(set)) => Some(Accessors { get, set }),
                _ => {
                    return Err(ParseError::custom(
                        "a manual property needs both -get and -set bodies",
                        pos,
                    ))
                }
            }
        };

        Ok(PropertyDef {
            name,
            ty,
            access: mods.access,
            is_static: mods.is_static,
            accessors,
            annotations: self.take_annotations(),
            pos,
        })
    }

    fn parse_method(&mut self, items: &[Atom], pos: Position) -> ParseResult<MethodDef> {
        let (mods, idx) = parse_modifiers(items, 1)?;
        let name_atom = items
            .get(idx)
            .ok_or_else(|| ParseError::arity("m", "a name", pos))?;
        let name = value_name(name_atom, "method")?;
        let (ret, idx) = optional_return_type(items, idx + 1)?;
        let (params, idx) = parse_params(items, idx)?;
        Ok(MethodDef {
            name,
            access: mods.access,
            is_static: mods.is_static,
            params,
            ret,
            body: parse_body(&items[idx..])?,
            annotations: self.take_annotations(),
            pos,
        })
    }

    fn parse_constructor(&mut self, items: &[Atom], pos: Position) -> ParseResult<ConstructorDef> {
        let (mods, idx) = parse_modifiers(items, 1)?;
        if mods.is_static {
            return Err(ParseError::custom("a constructor cannot be static", pos));
        }
        let (params, idx) = parse_params(items, idx)?;
        Ok(ConstructorDef {
            access: mods.access,
            params,
            body: parse_body(&items[idx..])?,
            annotations: self.take_annotations(),
            pos,
        })
    }

    fn parse_interface(&mut self, items: &[Atom], pos: Position) -> ParseResult<InterfaceDef> {
        let annotations = self.take_annotations();
        let (mods, idx) = parse_modifiers(items, 1)?;
        if mods.is_static {
            return Err(ParseError::custom("an interface cannot be static", pos));
        }
        let name_atom = items
            .get(idx)
            .ok_or_else(|| ParseError::arity("interface", "a type name", pos))?;
        let name = type_name(name_atom, "interface")?;
        let (parents, idx) = parse_supertypes(items, idx + 1)?;

        let mut methods = Vec::new();
        let mut properties = Vec::new();
        for atom in &items[idx..] {
            let member = paren_items(atom, "interface member")?;
            match member.first().and_then(Atom::as_symbol) {
                Some("m") => methods.push(parse_interface_method(member, atom.pos)?),
                Some("p") => properties.push(parse_interface_property(member, atom.pos)?),
                _ => return Err(ParseError::expected("(m ...) or (p ...)", atom)),
            }
        }

        Ok(InterfaceDef {
            name,
            access: mods.access,
            parents,
            methods,
            properties,
            annotations,
            pos,
        })
    }
}

fn parse_interface_method(items: &[Atom], pos: Position) -> ParseResult<InterfaceMethod> {
    let name_atom = items
        .get(1)
        .ok_or_else(|| ParseError::arity("m", "a name", pos))?;
    let name = value_name(name_atom, "method")?;
    let (ret, mut idx) = optional_return_type(items, 2)?;
    let mut params = Vec::new();
    if items.get(idx).map_or(false, |a| a.is_sigil(':')) {
        idx += 1;
        while idx < items.len() {
            params.push(type_atom(&items[idx])?);
            idx += 1;
        }
    }
    if idx != items.len() {
        return Err(ParseError::custom("interface methods have no body", items[idx].pos));
    }
    Ok(InterfaceMethod {
        name,
        params,
        ret,
        pos,
    })
}

fn parse_interface_property(items: &[Atom], pos: Position) -> ParseResult<InterfaceProperty> {
    if items.len() < 3 {
        return Err(ParseError::arity("p", "a name and a type", pos));
    }
    let name = value_name(&items[1], "property")?;
    let ty = type_atom(&items[2])?;
    let mut get = false;
    let mut set = false;
    for atom in &items[3..] {
        match atom.as_flag() {
            Some("get") => get = true,
            Some("set") => set = true,
            _ => return Err(ParseError::expected("-get or -set", atom)),
        }
    }
    if !get && !set {
        get = true;
        set = true;
    }
    Ok(InterfaceProperty {
        name,
        ty,
        get,
        set,
        pos,
    })
}

// ============ Shared declaration pieces ============

#[derive(Debug, Default)]
struct Modifiers {
    access: AccessLevel,
    is_static: bool,
}

fn parse_modifiers(items: &[Atom], mut idx: usize) -> ParseResult<(Modifiers, usize)> {
    let mut mods = Modifiers::default();
    let mut access_seen = false;
    while let Some(flag) = items.get(idx).and_then(Atom::as_flag) {
        match flag {
            "priv" | "prot" => {
                if access_seen {
                    return Err(ParseError::custom("more than one access level", items[idx].pos));
                }
                access_seen = true;
                mods.access = if flag == "priv" {
                    AccessLevel::Private
                } else {
                    AccessLevel::Protected
                };
            }
            "static" => mods.is_static = true,
            _ => break,
        }
        idx += 1;
    }
    Ok((mods, idx))
}

/// `: Type Type ...` up to the first list
fn parse_supertypes(items: &[Atom], idx: usize) -> ParseResult<(Vec<TypeAtom>, usize)> {
    let mut supertypes = Vec::new();
    let Some(colon) = items.get(idx).filter(|a| a.is_sigil(':')) else {
        return Ok((supertypes, idx));
    };
    let mut idx = idx + 1;
    while let Some(atom) = items.get(idx) {
        if atom.as_list(Bracket::Paren).is_some() {
            break;
        }
        supertypes.push(type_atom(atom)?);
        idx += 1;
    }
    if supertypes.is_empty() {
        return Err(ParseError::custom("expected supertypes after ':'", colon.pos));
    }
    Ok((supertypes, idx))
}

/// A return type sits between the name and the parameter list.
fn optional_return_type(items: &[Atom], idx: usize) -> ParseResult<(Option<TypeAtom>, usize)> {
    match items.get(idx) {
        Some(atom) if !atom.is_sigil(':') && atom.as_list(Bracket::Paren).is_none() => {
            Ok((Some(type_atom(atom)?), idx + 1))
        }
        _ => Ok((None, idx)),
    }
}

/// `: name Type name Type ...` up to the first list
fn parse_params(items: &[Atom], idx: usize) -> ParseResult<(Vec<Param>, usize)> {
    let mut params: Vec<Param> = Vec::new();
    let Some(colon) = items.get(idx).filter(|a| a.is_sigil(':')) else {
        return Ok((params, idx));
    };
    let mut idx = idx + 1;
    while let Some(atom) = items.get(idx) {
        if atom.as_list(Bracket::Paren).is_some() {
            break;
        }
        let name = value_name(atom, "parameter")?;
        let ty_atom = items
            .get(idx + 1)
            .ok_or_else(|| ParseError::custom(format!("parameter {name} has no type"), atom.pos))?;
        if params.iter().any(|p| p.name == name) {
            return Err(ParseError::custom(format!("duplicate parameter {name}"), atom.pos));
        }
        params.push(Param {
            name,
            ty: type_atom(ty_atom)?,
        });
        idx += 2;
    }
    if params.is_empty() {
        return Err(ParseError::custom("expected parameters after ':'", colon.pos));
    }
    Ok((params, idx))
}

fn is_annotation_head(head: &Atom) -> bool {
    head.is_sigil('@') || head.as_chain().map_or(false, |c| c[0].is_sigil('@'))
}

/// `(@ name args...)` or `(@name args...)`
fn parse_annotation(items: &[Atom], pos: Position) -> ParseResult<Annotation> {
    let (name_atom, args) = match items[0].as_chain() {
        Some([_, name]) => (name, &items[1..]),
        Some(_) => return Err(ParseError::expected("annotation name", &items[0])),
        None => match items.get(1) {
            Some(name) => (name, &items[2..]),
            None => return Err(ParseError::arity("@", "a name", pos)),
        },
    };
    Ok(Annotation {
        name: value_name(name_atom, "annotation")?,
        args: args.iter().map(parse_expr).collect::<ParseResult<_>>()?,
        pos,
    })
}

fn paren_items<'a>(atom: &'a Atom, expected: &'static str) -> ParseResult<&'a [Atom]> {
    atom.as_list(Bracket::Paren)
        .ok_or_else(|| ParseError::expected(expected, atom))
}

// ============ Names ============

fn starts_lowercase(s: &str) -> bool {
    s.chars().next().map_or(false, |c| c.is_ascii_lowercase())
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().map_or(false, |c| c.is_ascii_uppercase())
}

fn value_name(atom: &Atom, what: &'static str) -> ParseResult<String> {
    let name = atom
        .as_symbol()
        .ok_or_else(|| ParseError::expected("a name", atom))?;
    if !starts_lowercase(name) {
        return Err(ParseError::Casing {
            what,
            name: name.to_string(),
            case: "a lowercase",
            pos: atom.pos,
        });
    }
    Ok(name.to_string())
}

fn type_name(atom: &Atom, what: &'static str) -> ParseResult<String> {
    let name = atom
        .as_symbol()
        .ok_or_else(|| ParseError::expected("a type name", atom))?;
    if !starts_uppercase(name) {
        return Err(ParseError::Casing {
            what,
            name: name.to_string(),
            case: "an uppercase",
            pos: atom.pos,
        });
    }
    Ok(name.to_string())
}

/// `a.b.c`, every component lowercase
fn parse_namespace_name(atom: &Atom) -> ParseResult<String> {
    let parts: Vec<&Atom> = match &atom.kind {
        AtomKind::Symbol(_) => vec![atom],
        AtomKind::Chain(items) => items.iter().collect(),
        _ => return Err(ParseError::expected("a namespace name", atom)),
    };
    let mut name = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 1 {
            if !part.is_sigil('.') || i + 1 == parts.len() {
                return Err(ParseError::expected("a dotted namespace name", atom));
            }
            name.push('.');
            continue;
        }
        name.push_str(&value_name(part, "namespace")?);
    }
    Ok(name)
}

/// A type reference: `Name`, `Name<T ...>`, optionally qualified `Name/short`.
pub fn type_atom(atom: &Atom) -> ParseResult<TypeAtom> {
    match &atom.kind {
        AtomKind::Symbol(_) => Ok(TypeAtom::new(type_name(atom, "type")?, atom.pos)),
        AtomKind::Chain(items) => {
            let mut ty = TypeAtom::new(type_name(&items[0], "type")?, atom.pos);
            let mut idx = 1;
            if let Some(params) = items.get(idx).and_then(|a| a.as_list(Bracket::Angle)) {
                if params.is_empty() {
                    return Err(ParseError::expected("type parameters", &items[idx]));
                }
                ty.params = params.iter().map(type_atom).collect::<ParseResult<_>>()?;
                idx += 1;
            }
            if let [slash, short] = &items[idx..] {
                if slash.is_sigil('/') {
                    ty.namespace = Some(value_name(short, "namespace")?);
                    idx += 2;
                }
            }
            if idx != items.len() {
                return Err(ParseError::expected("a type", atom));
            }
            Ok(ty)
        }
        _ => Err(ParseError::expected("a type", atom)),
    }
}

// ============ Statements ============

fn stmt_head<'a>(atom: &'a Atom) -> Option<(&'a str, &'a [Atom])> {
    let items = atom.as_list(Bracket::Paren)?;
    Some((items.first()?.as_symbol()?, items))
}

/// Parse a sequence of statement atoms.
pub fn parse_body(atoms: &[Atom]) -> ParseResult<Vec<Stmt>> {
    let mut stmts = Vec::new();
    let mut i = 0;
    while i < atoms.len() {
        let atom = &atoms[i];
        i += 1;
        let Some(items) = atom.as_list(Bracket::Paren) else {
            return Err(ParseError::NotAStatement { pos: atom.pos });
        };
        let keyword = items.first().and_then(Atom::as_symbol).unwrap_or("");
        let pos = atom.pos;
        let stmt = match keyword {
            "if" => {
                if items.len() < 2 {
                    return Err(ParseError::arity("if", "a condition", pos));
                }
                let mut stmt = IfStmt {
                    condition: parse_expr(&items[1])?,
                    body: parse_body(&items[2..])?,
                    elifs: Vec::new(),
                    else_body: None,
                    pos,
                };
                while let Some(("elif", elif)) = atoms.get(i).and_then(stmt_head) {
                    if elif.len() < 2 {
                        return Err(ParseError::arity("elif", "a condition", atoms[i].pos));
                    }
                    stmt.elifs.push((parse_expr(&elif[1])?, parse_body(&elif[2..])?));
                    i += 1;
                }
                if let Some(("else", els)) = atoms.get(i).and_then(stmt_head) {
                    stmt.else_body = Some(parse_body(&els[1..])?);
                    i += 1;
                }
                Stmt::If(stmt)
            }
            "for" => {
                if items.len() < 2 {
                    return Err(ParseError::arity("for", "a condition", pos));
                }
                Stmt::For(ForStmt {
                    condition: parse_expr(&items[1])?,
                    body: parse_body(&items[2..])?,
                    pos,
                })
            }
            "switch" => {
                if items.len() != 2 {
                    return Err(ParseError::arity("switch", "exactly one value", pos));
                }
                let mut stmt = SwitchStmt {
                    value: parse_expr(&items[1])?,
                    cases: Vec::new(),
                    default: None,
                    pos,
                };
                while let Some(("case", case)) = atoms.get(i).and_then(stmt_head) {
                    if case.len() < 2 {
                        return Err(ParseError::arity("case", "a value", atoms[i].pos));
                    }
                    stmt.cases.push(SwitchCase {
                        value: parse_expr(&case[1])?,
                        body: parse_body(&case[2..])?,
                    });
                    i += 1;
                }
                if let Some(("default", default)) = atoms.get(i).and_then(stmt_head) {
                    stmt.default = Some(parse_body(&default[1..])?);
                    i += 1;
                }
                Stmt::Switch(stmt)
            }
            "try" => {
                let mut stmt = TryStmt {
                    body: parse_body(&items[1..])?,
                    catches: Vec::new(),
                    finally: None,
                    pos,
                };
                while let Some(("catch", catch)) = atoms.get(i).and_then(stmt_head) {
                    stmt.catches.push(parse_catch(catch, atoms[i].pos)?);
                    i += 1;
                }
                if let Some(("finally", finally)) = atoms.get(i).and_then(stmt_head) {
                    stmt.finally = Some(parse_body(&finally[1..])?);
                    i += 1;
                }
                if stmt.catches.is_empty() && stmt.finally.is_none() {
                    return Err(ParseError::custom("try needs a catch or finally", pos));
                }
                Stmt::Try(stmt)
            }
            "elif" | "else" | "case" | "default" | "catch" | "finally" => {
                return Err(ParseError::custom(
                    format!("{keyword} without a preceding opening form"),
                    pos,
                ))
            }
            "return" => match items.len() {
                1 => Stmt::Return(ReturnStmt { value: None, pos }),
                2 => Stmt::Return(ReturnStmt {
                    value: Some(parse_expr(&items[1])?),
                    pos,
                }),
                _ => return Err(ParseError::arity("return", "at most one value", pos)),
            },
            "throw" => {
                if items.len() != 2 {
                    return Err(ParseError::arity("throw", "exactly one value", pos));
                }
                Stmt::Throw(ThrowStmt {
                    value: parse_expr(&items[1])?,
                    pos,
                })
            }
            "break" | "continue" => {
                if items.len() != 1 {
                    return Err(ParseError::arity(keyword, "no operands", pos));
                }
                if keyword == "break" {
                    Stmt::Break(pos)
                } else {
                    Stmt::Continue(pos)
                }
            }
            "var" => Stmt::Var(parse_var(items, pos)?),
            "as" => {
                if items.len() != 3 {
                    return Err(ParseError::arity("as", "a target and a value", pos));
                }
                let target = parse_expr(&items[1])?;
                if !matches!(target, Expr::Var(_) | Expr::Index(_)) {
                    return Err(ParseError::expected("assignable target", &items[1]));
                }
                Stmt::Assign(AssignStmt {
                    target,
                    value: parse_expr(&items[2])?,
                    pos,
                })
            }
            _ => match parse_expr(atom)? {
                Expr::Call(call) => Stmt::Call(call),
                _ => return Err(ParseError::NotAStatement { pos }),
            },
        };
        stmts.push(stmt);
    }
    Ok(stmts)
}

fn parse_catch(items: &[Atom], pos: Position) -> ParseResult<CatchClause> {
    let ty_atom = items
        .get(1)
        .ok_or_else(|| ParseError::arity("catch", "an exception type", pos))?;
    let ty = type_atom(ty_atom)?;
    let (name, idx) = match items.get(2) {
        Some(atom) if atom.as_symbol().is_some() => (Some(value_name(atom, "catch variable")?), 3),
        _ => (None, 2),
    };
    Ok(CatchClause {
        ty,
        name,
        body: parse_body(&items[idx..])?,
    })
}

fn parse_var(items: &[Atom], pos: Position) -> ParseResult<VarStmt> {
    let (ty, value) = match items.len() {
        3 => match type_atom(&items[2]) {
            Ok(ty) => (Some(ty), None),
            Err(_) => (None, Some(parse_expr(&items[2])?)),
        },
        4 => (Some(type_atom(&items[2])?), Some(parse_expr(&items[3])?)),
        _ => {
            return Err(ParseError::arity(
                "var",
                "a name followed by a type, a value, or both",
                pos,
            ))
        }
    };
    Ok(VarStmt {
        name: value_name(&items[1], "variable")?,
        ty,
        value,
        pos,
    })
}

// ============ Expressions ============

/// `name` or `name/short`
fn var_name(atom: &Atom) -> Option<(String, Option<String>)> {
    match &atom.kind {
        AtomKind::Symbol(s) if starts_lowercase(s) => Some((s.clone(), None)),
        AtomKind::Chain(items) => match items.as_slice() {
            [name, slash, short] if slash.is_sigil('/') => {
                let name = name.as_symbol().filter(|s| starts_lowercase(s))?;
                let short = short.as_symbol().filter(|s| starts_lowercase(s))?;
                Some((name.to_string(), Some(short.to_string())))
            }
            _ => None,
        },
        _ => None,
    }
}

/// `Type.name`, the head of a static method call
fn static_call_head(atom: &Atom) -> Option<(TypeAtom, String)> {
    let items = atom.as_chain()?;
    let [.., dot, name] = items else {
        return None;
    };
    if !dot.is_sigil('.') || items.len() < 3 {
        return None;
    }
    let method = name.as_symbol().filter(|s| starts_lowercase(s))?;
    let owner = &items[..items.len() - 2];
    let owner_atom = match owner {
        [single] => single.clone(),
        _ => Atom::new(AtomKind::Chain(owner.to_vec()), atom.pos),
    };
    let ty = type_atom(&owner_atom).ok()?;
    Some((ty, method.to_string()))
}

fn parse_number(atom: &Atom, parts: &[Atom]) -> ParseResult<NumberLit> {
    let malformed = || ParseError::MalformedNumber {
        text: atom.to_string(),
        pos: atom.pos,
    };
    let (negative, rest) = match parts.split_first() {
        Some((first, rest)) if first.is_sigil('-') => (true, rest),
        _ => (false, parts),
    };
    let digits = |a: &Atom| match &a.kind {
        AtomKind::Number(n) => Some(n.clone()),
        _ => None,
    };
    let (integer, fraction) = match rest {
        [int] => (digits(int).ok_or_else(malformed)?, None),
        [int, dot, frac] if dot.is_sigil('.') => (
            digits(int).ok_or_else(malformed)?,
            Some(digits(frac).ok_or_else(malformed)?),
        ),
        _ => return Err(malformed()),
    };
    Ok(NumberLit {
        negative,
        integer,
        fraction,
        pos: atom.pos,
    })
}

/// Parse any expression atom.
pub fn parse_expr(atom: &Atom) -> ParseResult<Expr> {
    let pos = atom.pos;
    match &atom.kind {
        AtomKind::Symbol(s) if starts_lowercase(s) => Ok(Expr::Var(VarExpr {
            name: s.clone(),
            namespace: None,
            pos,
        })),
        AtomKind::Symbol(_) => Ok(Expr::TypeRef(type_atom(atom)?)),
        AtomKind::Number(_) => Ok(Expr::Number(parse_number(atom, std::slice::from_ref(atom))?)),
        AtomKind::Str(raw) => Ok(Expr::Str(StrLit {
            value: unescape_str(raw),
            pos,
        })),
        AtomKind::Sigil(_) => Err(ParseError::expected("an expression", atom)),
        AtomKind::Chain(items) => {
            let first = &items[0];
            if first.is_sigil('-') || matches!(first.kind, AtomKind::Number(_)) {
                return Ok(Expr::Number(parse_number(atom, items)?));
            }
            if let Some((name, namespace)) = var_name(atom) {
                return Ok(Expr::Var(VarExpr {
                    name,
                    namespace,
                    pos,
                }));
            }
            type_atom(atom)
                .map(Expr::TypeRef)
                .map_err(|_| ParseError::expected("an expression", atom))
        }
        AtomKind::List(Bracket::Square, items) => {
            if items.is_empty() {
                return Err(ParseError::custom("empty indexing form", pos));
            }
            let mut args = items.iter().map(parse_expr).collect::<ParseResult<Vec<_>>>()?;
            if args.len() == 1 {
                args.push(Expr::Var(VarExpr {
                    name: "me".to_string(),
                    namespace: None,
                    pos,
                }));
            }
            Ok(Expr::Index(IndexExpr { args, pos }))
        }
        AtomKind::List(Bracket::Paren, items) => parse_call(items, pos),
        AtomKind::List(_, _) => Err(ParseError::expected("an expression", atom)),
    }
}

fn parse_call(items: &[Atom], pos: Position) -> ParseResult<Expr> {
    let Some(head) = items.first() else {
        return Err(ParseError::custom("empty expression", pos));
    };
    let args = || -> ParseResult<Vec<Expr>> { items[1..].iter().map(parse_expr).collect() };

    if let Some((name, namespace)) = var_name(head) {
        return Ok(Expr::Call(CallExpr {
            name,
            namespace,
            static_type: None,
            args: args()?,
            pos,
        }));
    }
    if let Some((ty, name)) = static_call_head(head) {
        return Ok(Expr::Call(CallExpr {
            name,
            namespace: None,
            static_type: Some(ty),
            args: args()?,
            pos,
        }));
    }
    if let Ok(ty) = type_atom(head) {
        let size_flag = items.get(1).and_then(Atom::as_flag) == Some("size");
        let first_arg = if size_flag { 2 } else { 1 };
        let args = items[first_arg..]
            .iter()
            .map(parse_expr)
            .collect::<ParseResult<Vec<_>>>()?;
        if size_flag && args.is_empty() {
            return Err(ParseError::arity("-size", "at least one dimension", pos));
        }
        return Ok(Expr::TypeCall(TypeCallExpr {
            ty,
            size_flag,
            args,
            pos,
        }));
    }
    Err(ParseError::expected("a function name or a type", head))
}

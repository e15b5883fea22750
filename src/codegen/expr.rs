//! Expression lowering
//!
//! Variables, indexing chains, calls and type calls. Operators are in
//! [`ops`](super::ops).

use super::{escape_ident, Fragment, Generator};
use crate::ast::*;
use crate::codegen::error::{GenError, GenErrorKind, GenResult};
use crate::codegen::literal::{self, lower_number, verbatim_string};
use crate::codegen::ops::Operator;
use crate::codegen::scope::Scope;
use crate::span::{Located, Position};
use crate::typeck::*;

/// Key that reads the length of a string or array
const LENGTH_KEY: &str = "len";

/// A lowered call argument. Number literals stay untyped until the
/// callee is known.
pub(super) enum Arg<'e> {
    Literal(&'e NumberLit),
    Value { code: String, ty: Type },
}

impl<'a> Generator<'a> {
    pub(super) fn expr(&self, scope: &Scope, expr: &Expr, expected: Option<&Type>) -> GenResult<Fragment> {
        match expr {
            Expr::Var(var) => self.var(scope, var),
            Expr::Number(lit) => self.number(lit, expected),
            Expr::Str(s) => Ok(Fragment::new(verbatim_string(&s.value), Type::STR)),
            Expr::Index(index) => self.index(scope, index, false),
            Expr::Call(call) => self.call(scope, call, expected, false),
            Expr::TypeCall(call) => self.type_call(scope, call),
            Expr::TypeRef(atom) => Err(GenError::new(
                GenErrorKind::TypeAsValue {
                    name: atom.to_string(),
                },
                atom.pos,
            )),
        }
    }

    /// A value of whatever type `expr` has
    pub(super) fn any_value(&self, scope: &Scope, expr: &Expr) -> GenResult<(String, Type)> {
        let fragment = self.expr(scope, expr, None)?;
        match fragment.ty {
            Some(ty) => Ok((fragment.code, ty)),
            None => Err(GenError::void_value(expr.pos())),
        }
    }

    /// A value that must be a subtype of `expected`
    pub(super) fn value(&self, scope: &Scope, expr: &Expr, expected: &Type) -> GenResult<String> {
        let fragment = self.expr(scope, expr, Some(expected))?;
        let ty = fragment.ty.ok_or_else(|| GenError::void_value(expr.pos()))?;
        if !self.registry.is_subtype(&ty, expected) {
            return Err(GenError::type_mismatch(
                self.registry.type_name(expected),
                self.registry.type_name(&ty),
                expr.pos(),
            ));
        }
        Ok(fragment.code)
    }

    /// An integer of any width, used as an array index
    fn integer_value(&self, scope: &Scope, expr: &Expr) -> GenResult<String> {
        if let Expr::Number(lit) = expr {
            return Ok(lower_number(lit, Some(Builtin::Int))?.0);
        }
        let (code, ty) = self.any_value(scope, expr)?;
        if !ty.is_integer() {
            return Err(GenError::new(
                GenErrorKind::IndexNotInteger {
                    found: self.registry.type_name(&ty),
                },
                expr.pos(),
            ));
        }
        Ok(code)
    }

    fn number(&self, lit: &NumberLit, expected: Option<&Type>) -> GenResult<Fragment> {
        let target = match expected {
            None => None,
            Some(Type::Builtin(b)) => Some(*b),
            Some(other) => {
                return Err(GenError::new(
                    GenErrorKind::LiteralNotAllowed {
                        ty: self.registry.type_name(other),
                    },
                    lit.pos,
                ))
            }
        };
        let (code, ty) = lower_number(lit, target)?;
        Ok(Fragment::new(code, Type::Builtin(ty)))
    }

    // ============ Variables ============

    pub(super) fn var(&self, scope: &Scope, var: &VarExpr) -> GenResult<Fragment> {
        let unknown = || {
            GenError::new(
                GenErrorKind::UnknownVariable {
                    name: var.name.clone(),
                },
                var.pos,
            )
        };
        if let Some(short) = &var.namespace {
            let foreign = self.import(short, var.pos)?;
            return self
                .registry
                .namespace(foreign)
                .globals
                .get(&var.name)
                .copied()
                .filter(|id| self.registry.global(*id).namespace == foreign)
                .map(|id| self.global(id))
                .ok_or_else(unknown);
        }
        if var.name == "true" || var.name == "false" {
            return Ok(Fragment::new(var.name.clone(), Type::BOOL));
        }
        if let Some(local) = scope.lookup(&var.name) {
            return Ok(Fragment::new(local.code.clone(), local.ty.clone()));
        }
        if var.name == RECEIVER {
            return Err(GenError::new(GenErrorKind::NoReceiver, var.pos));
        }
        self.namespace()
            .globals
            .get(&var.name)
            .map(|id| self.global(*id))
            .ok_or_else(unknown)
    }

    fn global(&self, id: GlobalId) -> Fragment {
        let info = self.registry.global(id);
        let cs_name = &self.registry.namespace(info.namespace).cs_name;
        Fragment::new(
            format!("{cs_name}.{GLOBALS_CLASS}.{}", escape_ident(&info.name)),
            info.ty.clone(),
        )
    }

    fn import(&self, short: &str, pos: Position) -> GenResult<NamespaceId> {
        self.namespace().imports.get(short).copied().ok_or_else(|| {
            GenError::new(
                GenErrorKind::UnknownImport {
                    short: short.to_string(),
                },
                pos,
            )
        })
    }

    // ============ Indexing ============

    /// `[k2 k1 target]` reads `target.k1.k2`. With `for_write` the last key
    /// is checked for assignment instead of reading.
    pub(super) fn index(&self, scope: &Scope, index: &IndexExpr, for_write: bool) -> GenResult<Fragment> {
        let (target, keys) = match index.args.split_last() {
            Some((target, keys)) if !keys.is_empty() => (target, keys),
            _ => {
                return Err(GenError::new(
                    GenErrorKind::WrongArgCount {
                        what: "indexing".to_string(),
                        expected: 2,
                        found: index.args.len(),
                    },
                    index.pos,
                ))
            }
        };

        let (mut code, mut ty, mut is_type) = match target {
            Expr::TypeRef(atom) => {
                let ty = self.resolve_type(atom)?;
                (self.registry.cs_type(&ty), ty, true)
            }
            other => {
                let (code, ty) = self.any_value(scope, other)?;
                (code, ty, false)
            }
        };
        for (i, key) in keys.iter().rev().enumerate() {
            let write = for_write && i + 1 == keys.len();
            let (next_code, next_ty) = self.index_step(scope, &code, &ty, is_type, key, write)?;
            code = next_code;
            ty = next_ty;
            is_type = false;
        }
        Ok(Fragment::new(code, ty))
    }

    fn index_step(
        &self,
        scope: &Scope,
        code: &str,
        ty: &Type,
        is_type: bool,
        key: &Expr,
        write: bool,
    ) -> GenResult<(String, Type)> {
        let pos = key.pos();
        let key_name = match key {
            Expr::Var(var) if var.namespace.is_none() => Some(var.name.as_str()),
            _ => None,
        };
        let not_indexable = || {
            GenError::new(
                GenErrorKind::NotIndexable {
                    ty: self.registry.type_name(ty),
                },
                pos,
            )
        };

        match ty {
            Type::Array(_) | Type::Builtin(Builtin::Str) if !is_type => {
                if key_name == Some(LENGTH_KEY) && scope.lookup(LENGTH_KEY).is_none() {
                    if write {
                        return Err(GenError::new(
                            GenErrorKind::NotAssignable {
                                name: LENGTH_KEY.to_string(),
                            },
                            pos,
                        ));
                    }
                    return Ok((format!("{code}.Length"), Type::INT));
                }
                let Type::Array(elem) = ty else {
                    return Err(not_indexable());
                };
                let index = self.integer_value(scope, key)?;
                Ok((format!("{code}[{index}]"), (**elem).clone()))
            }
            Type::Class(_) | Type::Struct(_) | Type::Interface(_) => {
                let name = key_name.ok_or_else(not_indexable)?;
                let member = self
                    .registry
                    .find_member(ty, name)
                    .ok_or_else(|| GenError::unknown_member(self.registry.type_name(ty), name, pos))?;
                self.check_access(scope, member.access, &member.owner, name, pos)?;
                if member.is_static != is_type {
                    let expected = if member.is_static { "its type" } else { "an instance" };
                    return Err(GenError::new(
                        GenErrorKind::StaticMismatch {
                            name: name.to_string(),
                            expected,
                        },
                        pos,
                    ));
                }
                if write && !member.set {
                    return Err(GenError::new(
                        GenErrorKind::NotAssignable {
                            name: name.to_string(),
                        },
                        pos,
                    ));
                }
                if !write && !member.get {
                    return Err(GenError::new(
                        GenErrorKind::NotReadable {
                            name: name.to_string(),
                        },
                        pos,
                    ));
                }
                Ok((format!("{code}.{}", escape_ident(name)), member.ty.clone()))
            }
            _ => Err(not_indexable()),
        }
    }

    /// Private members are visible inside their declaring type, protected
    /// ones also inside subclasses.
    fn check_access(
        &self,
        scope: &Scope,
        access: AccessLevel,
        owner: &Type,
        name: &str,
        pos: Position,
    ) -> GenResult<()> {
        let visible = match access {
            AccessLevel::Public => true,
            AccessLevel::Private => scope.this_type.as_ref() == Some(owner),
            AccessLevel::Protected => match (scope.this_type.as_ref(), owner) {
                (Some(Type::Class(inner)), Type::Class(declaring)) => {
                    self.registry.class_descends(*inner, *declaring)
                }
                (Some(inner), declaring) => inner == declaring,
                (None, _) => false,
            },
        };
        if visible {
            Ok(())
        } else {
            let label = format!("{}.{name}", self.registry.short_type_name(owner));
            Err(GenError::inaccessible(label, pos))
        }
    }

    // ============ Calls ============

    /// Lower a call. Functions and methods are tried first; a name that
    /// matches none of them falls back to the operator table.
    pub(super) fn call(
        &self,
        scope: &Scope,
        call: &CallExpr,
        expected: Option<&Type>,
        statement: bool,
    ) -> GenResult<Fragment> {
        if let Some(owner) = &call.static_type {
            return self.static_call(scope, owner, call);
        }
        let args = self.args(scope, &call.args)?;
        let candidates = self.candidates(call, args.first())?;
        let matching: Vec<CallableId> = candidates
            .iter()
            .copied()
            .filter(|id| self.accepts(*id, &args))
            .collect();

        if matching.is_empty() {
            if call.namespace.is_none() {
                if let Some(op) = Operator::from_name(&call.name) {
                    if statement {
                        return Err(GenError::new(
                            GenErrorKind::OperatorStatement {
                                op: call.name.clone(),
                            },
                            call.pos,
                        ));
                    }
                    return self.operator(op, args, expected, call.pos);
                }
            }
            let name = call_name(call);
            return Err(if candidates.is_empty() {
                GenError::new(GenErrorKind::UnknownFunction { name }, call.pos)
            } else {
                GenError::no_matching_overload(name, self.describe(&args), call.pos)
            });
        }

        let chosen = self
            .registry
            .closest_matching_signature(&matching)
            .ok_or_else(|| GenError::ambiguous_call(call_name(call), self.describe(&args), call.pos))?;
        let info = self.registry.callable(chosen);
        if let Some(owner) = &info.owner {
            self.check_access(scope, info.access, owner, &info.name, call.pos)?;
        }
        let codes = self.lower_args(args, &info.param_types)?;
        let code = match (info.is_method(), codes.split_first()) {
            (true, Some((receiver, rest))) => {
                format!("{receiver}.{}({})", escape_ident(&info.name), rest.join(", "))
            }
            _ => format!(
                "{}.{FUNCS_CLASS}.{}({})",
                self.registry.namespace(info.namespace).cs_name,
                escape_ident(&info.name),
                codes.join(", ")
            ),
        };
        Ok(Fragment {
            code,
            ty: info.ret.clone(),
        })
    }

    /// `(Type.name args...)`
    fn static_call(&self, scope: &Scope, owner_atom: &TypeAtom, call: &CallExpr) -> GenResult<Fragment> {
        let owner = self.resolve_type(owner_atom)?;
        let name = format!("{}.{}", self.registry.short_type_name(&owner), call.name);
        let args = self.args(scope, &call.args)?;
        let candidates: Vec<CallableId> = self
            .registry
            .methods_named(&owner, &call.name)
            .into_iter()
            .filter(|id| self.registry.callable(*id).static_owner.is_some())
            .collect();
        let matching: Vec<CallableId> = candidates
            .iter()
            .copied()
            .filter(|id| self.accepts(*id, &args))
            .collect();

        // Candidates come most derived type first; only the nearest
        // declaring type counts.
        let Some(&chosen) = matching.first() else {
            return Err(if candidates.is_empty() {
                GenError::new(GenErrorKind::UnknownFunction { name }, call.pos)
            } else {
                GenError::no_matching_overload(name, self.describe(&args), call.pos)
            });
        };
        let info = self.registry.callable(chosen);
        let nearest = matching
            .iter()
            .filter(|id| self.registry.callable(**id).static_owner == info.static_owner)
            .count();
        if nearest > 1 {
            return Err(GenError::ambiguous_call(name, self.describe(&args), call.pos));
        }

        let declaring = info.static_owner.as_ref().unwrap_or(&owner);
        self.check_access(scope, info.access, declaring, &info.name, call.pos)?;
        let codes = self.lower_args(args, &info.param_types)?;
        Ok(Fragment {
            code: format!(
                "{}.{}({})",
                self.registry.cs_type(declaring),
                escape_ident(&info.name),
                codes.join(", ")
            ),
            ty: info.ret.clone(),
        })
    }

    pub(super) fn args<'e>(&self, scope: &Scope, exprs: &'e [Expr]) -> GenResult<Vec<Arg<'e>>> {
        exprs
            .iter()
            .map(|expr| match expr {
                Expr::Number(lit) => Ok(Arg::Literal(lit)),
                other => self
                    .any_value(scope, other)
                    .map(|(code, ty)| Arg::Value { code, ty }),
            })
            .collect()
    }

    /// Every callable a plain call could mean: namespace functions, instance
    /// methods known to the namespace, and methods visible on the type of
    /// the first argument.
    fn candidates(&self, call: &CallExpr, first: Option<&Arg>) -> GenResult<Vec<CallableId>> {
        if let Some(short) = &call.namespace {
            let foreign = self.import(short, call.pos)?;
            return Ok(self
                .registry
                .namespace(foreign)
                .funcs
                .get(&call.name)
                .into_iter()
                .flatten()
                .copied()
                .filter(|id| self.registry.callable(*id).namespace == foreign)
                .collect());
        }

        let ns = self.namespace();
        let mut out: Vec<CallableId> = ns.funcs.get(&call.name).cloned().unwrap_or_default();
        let known = ns.methods.get(&call.name).into_iter().flatten().copied();
        let visible = match first {
            Some(Arg::Value { ty, .. }) => self.registry.methods_named(ty, &call.name),
            _ => Vec::new(),
        };
        for id in known.chain(visible) {
            if self.registry.callable(id).is_method() && !out.contains(&id) {
                out.push(id);
            }
        }
        Ok(out)
    }

    fn accepts(&self, id: CallableId, args: &[Arg]) -> bool {
        let params = &self.registry.callable(id).param_types;
        params.len() == args.len()
            && params.iter().zip(args).all(|(param, arg)| match arg {
                Arg::Literal(lit) => param.builtin().map_or(false, |b| literal::fits(lit, b)),
                Arg::Value { ty, .. } => self.registry.is_subtype(ty, param),
            })
    }

    fn lower_args(&self, args: Vec<Arg>, params: &[Type]) -> GenResult<Vec<String>> {
        args.into_iter()
            .zip(params)
            .map(|(arg, param)| match arg {
                Arg::Literal(lit) => lower_number(lit, param.builtin()).map(|(code, _)| code),
                Arg::Value { code, .. } => Ok(code),
            })
            .collect()
    }

    /// Argument types for error messages
    pub(super) fn describe(&self, args: &[Arg]) -> String {
        args.iter()
            .map(|arg| match arg {
                Arg::Literal(lit) => lit.to_string(),
                Arg::Value { ty, .. } => self.registry.type_name(ty),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    // ============ Type calls ============

    /// Constructors, conversions, array literals and array allocation
    fn type_call(&self, scope: &Scope, call: &TypeCallExpr) -> GenResult<Fragment> {
        let ty = self.resolve_type(&call.ty)?;
        if call.size_flag {
            return self.allocate(scope, &ty, &call.args, call.pos);
        }
        match &ty {
            Type::Builtin(target) => self.conversion(scope, *target, &call.args, call.pos),
            Type::Array(elem) => {
                let items = call
                    .args
                    .iter()
                    .map(|arg| self.value(scope, arg, elem))
                    .collect::<GenResult<Vec<_>>>()?;
                let cs = self.registry.cs_type(&ty);
                let code = if items.is_empty() {
                    format!("new {cs} {{ }}")
                } else {
                    format!("new {cs} {{ {} }}", items.join(", "))
                };
                Ok(Fragment::new(code, ty))
            }
            Type::Class(_) | Type::Struct(_) => self.construct(scope, &ty, &call.args, call.pos),
            Type::Interface(_) => Err(GenError::new(
                GenErrorKind::NotConstructible {
                    ty: self.registry.type_name(&ty),
                },
                call.pos,
            )),
        }
    }

    fn conversion(&self, scope: &Scope, target: Builtin, args: &[Expr], pos: Position) -> GenResult<Fragment> {
        let [arg] = args else {
            return Err(GenError::new(
                GenErrorKind::WrongArgCount {
                    what: target.source_name().to_string(),
                    expected: 1,
                    found: args.len(),
                },
                pos,
            ));
        };
        let ty = Type::Builtin(target);
        if let (true, Expr::Number(lit)) = (target.is_numeric(), arg) {
            let (code, _) = lower_number(lit, Some(target))?;
            return Ok(Fragment::new(code, ty));
        }

        let (code, from) = self.any_value(scope, arg)?;
        let code = match target {
            _ if target.is_numeric() && from.is_numeric() => format!("(({}) {code})", target.cs_name()),
            Builtin::Bool if from.is_numeric() => format!("({code} != 0)"),
            Builtin::Bool if from == Type::BOOL => code,
            Builtin::Str => format!("Convert.ToString({code})"),
            Builtin::Any => format!("((object) {code})"),
            _ => {
                return Err(GenError::new(
                    GenErrorKind::BadCast {
                        from: self.registry.type_name(&from),
                        to: target.source_name().to_string(),
                    },
                    pos,
                ))
            }
        };
        Ok(Fragment::new(code, ty))
    }

    /// `(A<A<T>> -size n m)`: one size per dimension from the outside in,
    /// at least one and at most the nesting depth.
    fn allocate(&self, scope: &Scope, ty: &Type, sizes: &[Expr], pos: Position) -> GenResult<Fragment> {
        let depth = ty.array_depth();
        if depth == 0 || sizes.is_empty() || sizes.len() > depth {
            return Err(GenError::new(
                GenErrorKind::BadArrayAllocation {
                    ty: self.registry.type_name(ty),
                    sizes: sizes.len(),
                },
                pos,
            ));
        }
        let sizes = sizes
            .iter()
            .map(|size| self.value(scope, size, &Type::INT))
            .collect::<GenResult<Vec<_>>>()?;
        Ok(Fragment::new(self.allocation(ty, &sizes), ty.clone()))
    }

    fn allocation(&self, ty: &Type, sizes: &[String]) -> String {
        match (sizes, ty.element()) {
            ([size, rest @ ..], Some(elem)) if !rest.is_empty() => format!(
                "Enumerable.Range(0, {size}).Select(_ => {}).ToArray()",
                self.allocation(elem, rest)
            ),
            _ => {
                let size = sizes.first().map_or("0", String::as_str);
                format!(
                    "new {}[{size}]{}",
                    self.registry.cs_type(ty.base()),
                    "[]".repeat(ty.array_depth().saturating_sub(1))
                )
            }
        }
    }

    fn construct(&self, scope: &Scope, ty: &Type, args: &[Expr], pos: Position) -> GenResult<Fragment> {
        let args = self.args(scope, args)?;
        let constructors = self.registry.body(ty).map(|b| b.constructors.as_slice()).unwrap_or_default();
        let matching: Vec<CallableId> = constructors
            .iter()
            .copied()
            .filter(|id| self.accepts(*id, &args))
            .collect();
        let id = match matching.as_slice() {
            [id] => *id,
            [] => {
                return Err(GenError::new(
                    GenErrorKind::NoMatchingConstructor {
                        ty: self.registry.type_name(ty),
                        args: self.describe(&args),
                    },
                    pos,
                ))
            }
            _ => {
                return Err(GenError::new(
                    GenErrorKind::AmbiguousConstructor {
                        ty: self.registry.type_name(ty),
                        args: self.describe(&args),
                    },
                    pos,
                ))
            }
        };
        let info = self.registry.callable(id);
        self.check_access(scope, info.access, ty, &info.name, pos)?;
        let codes = self.lower_args(args, &info.param_types)?;
        Ok(Fragment::new(
            format!("new {}({})", self.registry.cs_type(ty), codes.join(", ")),
            ty.clone(),
        ))
    }
}

fn call_name(call: &CallExpr) -> String {
    match &call.namespace {
        Some(short) => format!("{}/{short}", call.name),
        None => call.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::tests::{compile_err, compile_ok, has_line};
    use crate::codegen::GenErrorKind;

    #[test]
    fn test_overridden_method_resolves_to_derived_class() {
        let out = compile_ok(
            "ns geo\n\
             (class Shape (m area FF (return 0.0)))\n\
             (class Circle : Shape\n    (f r FF 1.0)\n    (m area FF (return (mul [r] [r]))))\n\
             (func total FF : c Circle (return (area c)))\n",
        );
        assert!(has_line(&out, "return _c.area();"));
        assert!(has_line(&out, "public override double area() {"));
    }

    #[test]
    fn test_flexible_literal_is_ambiguous_between_functions() {
        let source = "ns app\n(func f : x I)\n(func f : x U)\n(func g (f 3))\n";
        assert!(matches!(compile_err(source), GenErrorKind::AmbiguousCall { .. }));
    }

    #[test]
    fn test_literal_argument_takes_parameter_type() {
        let out = compile_ok("ns app\n(func f : x B)\n(func g (f 200))\n");
        assert!(has_line(&out, "App._Funcs.f((byte) 200);"));
        let kind = compile_err("ns app\n(func f : x B)\n(func g (f 300))\n");
        assert!(matches!(kind, GenErrorKind::NoMatchingOverload { .. }));
    }

    #[test]
    fn test_widening_arguments() {
        let out = compile_ok("ns app\n(func f : x FF)\n(func g : n I (f n))\n");
        assert!(has_line(&out, "App._Funcs.f(_n);"));
        let kind = compile_err("ns app\n(func f : x I)\n(func g : n FF (f n))\n");
        assert!(matches!(kind, GenErrorKind::NoMatchingOverload { .. }));
    }

    #[test]
    fn test_unknown_function() {
        let kind = compile_err("ns app\n(func g (frobnicate 1))\n");
        assert!(matches!(kind, GenErrorKind::UnknownFunction { .. }));
    }

    #[test]
    fn test_indexing_chain() {
        let out = compile_ok(
            "ns geo\n\
             (class Node (f next Node) (f items A<I>))\n\
             (func first I : n Node (return [0 items next n]))\n\
             (func size I : n Node (return [len items n]))\n",
        );
        assert!(has_line(&out, "return _n.next.items[0];"));
        assert!(has_line(&out, "return _n.items.Length;"));
    }

    #[test]
    fn test_field_lookup_walks_ancestors() {
        let out = compile_ok(
            "ns geo\n\
             (class Shape (f -prot sides I))\n\
             (class Square : Shape (m count I (return [sides])))\n",
        );
        assert!(has_line(&out, "return this.sides;"));
    }

    #[test]
    fn test_private_member_is_hidden() {
        let source = "ns geo\n(class Shape (f -priv sides I))\n(func f I : s Shape (return [sides s]))\n";
        assert!(matches!(compile_err(source), GenErrorKind::InaccessibleMember { .. }));
    }

    #[test]
    fn test_static_members() {
        let out = compile_ok(
            "ns geo\n\
             (class Counter\n    (f -static total I 0)\n    (m -static bump I : by I (return (add [total Counter] by))))\n\
             (func f I (return (Counter.bump 2)))\n",
        );
        assert!(has_line(&out, "public static int total = 0;"));
        assert!(has_line(&out, "public static int bump(int _by) {"));
        assert!(has_line(&out, "return (Geo.Counter.total + _by);"));
        assert!(has_line(&out, "return Geo.Counter.bump(2);"));

        let kind = compile_err("ns geo\n(class Counter (f total I))\n(func f I (return [total Counter]))\n");
        assert!(matches!(kind, GenErrorKind::StaticMismatch { .. }));
    }

    #[test]
    fn test_receiver_outside_instance_members() {
        let kind = compile_err("ns geo\n(class Shape (f sides I) (m -static f I (return [sides])))\n");
        assert!(matches!(kind, GenErrorKind::NoReceiver));
    }

    #[test]
    fn test_type_calls() {
        let out = compile_ok(
            "ns geo\n\
             (class Point (constructor : x I y I))\n\
             (func f : n II\n\
             \x20   (var p (Point 1 2))\n\
             \x20   (var i (I n))\n\
             \x20   (var s (Str n))\n\
             \x20   (var b (Bool n))\n\
             \x20   (var xs (A<I> 1 2 3))\n\
             \x20   (var grid (A<A<I>> -size 3 4))\n\
             \x20   (var rows (A<A<I>> -size 3)))\n",
        );
        assert!(has_line(&out, "Geo.Point _p = new Geo.Point(1, 2);"));
        assert!(has_line(&out, "int _i = ((int) _n);"));
        assert!(has_line(&out, "string _s = Convert.ToString(_n);"));
        assert!(has_line(&out, "bool _b = (_n != 0);"));
        assert!(has_line(&out, "int[] _xs = new int[] { 1, 2, 3 };"));
        assert!(has_line(
            &out,
            "int[][] _grid = Enumerable.Range(0, 3).Select(_ => new int[4]).ToArray();"
        ));
        assert!(has_line(&out, "int[][] _rows = new int[3][];"));
    }

    #[test]
    fn test_bad_allocations() {
        let kind = compile_err("ns app\n(func f (var xs (A<I> -size 1 2)))\n");
        assert!(matches!(kind, GenErrorKind::BadArrayAllocation { .. }));
        let kind = compile_err("ns app\n(interface Shaped)\n(func f (var s (Shaped)))\n");
        assert!(matches!(kind, GenErrorKind::NotConstructible { .. }));
        let kind = compile_err("ns app\n(class P (constructor : x I))\n(func f (var p (P)))\n");
        assert!(matches!(kind, GenErrorKind::NoMatchingConstructor { .. }));
    }

    #[test]
    fn test_calls_through_interfaces() {
        let out = compile_ok(
            "ns geo\n\
             (interface Shaped (m area FF))\n\
             (func measure FF : s Shaped (return (area s)))\n",
        );
        assert!(has_line(&out, "return _s.area();"));
    }

    #[test]
    fn test_void_call_as_value() {
        let kind = compile_err("ns app\n(func g)\n(func f (var x (g)))\n");
        assert!(matches!(kind, GenErrorKind::VoidValue));
    }
}

//! Statement lowering

use super::Generator;
use crate::ast::*;
use crate::codegen::error::{GenError, GenErrorKind, GenResult};
use crate::codegen::scope::Scope;
use crate::span::Located;
use crate::typeck::{Type, RECEIVER};

impl<'a> Generator<'a> {
    /// Lower `body` in a fresh block scope.
    pub(super) fn block(&mut self, scope: &mut Scope, body: &[Stmt]) -> GenResult<()> {
        scope.push();
        let result = body.iter().try_for_each(|stmt| self.stmt(scope, stmt));
        scope.pop();
        result
    }

    fn stmt(&mut self, scope: &mut Scope, stmt: &Stmt) -> GenResult<()> {
        match stmt {
            Stmt::If(s) => self.if_stmt(scope, s),
            Stmt::For(s) => {
                let condition = self.value(scope, &s.condition, &Type::BOOL)?;
                self.out.open(&format!("while ({condition})"));
                scope.loop_depth += 1;
                let result = self.block(scope, &s.body);
                scope.loop_depth -= 1;
                result?;
                self.out.close();
                Ok(())
            }
            Stmt::Switch(s) => self.switch_stmt(scope, s),
            Stmt::Try(s) => self.try_stmt(scope, s),
            Stmt::Return(s) => self.return_stmt(scope, s),
            Stmt::Throw(s) => {
                let (code, ty) = self.any_value(scope, &s.value)?;
                if !matches!(ty, Type::Class(_)) {
                    return Err(GenError::new(
                        GenErrorKind::NotThrowable {
                            ty: self.registry.type_name(&ty),
                        },
                        s.value.pos(),
                    ));
                }
                self.out.line(&format!("throw {code};"));
                Ok(())
            }
            Stmt::Break(pos) => {
                if scope.loop_depth == 0 && scope.switch_depth == 0 {
                    return Err(GenError::new(
                        outside_jump(scope, "break", GenErrorKind::BreakOutsideLoop),
                        *pos,
                    ));
                }
                self.out.line("break;");
                Ok(())
            }
            Stmt::Continue(pos) => {
                if scope.loop_depth == 0 {
                    return Err(GenError::new(
                        outside_jump(scope, "continue", GenErrorKind::ContinueOutsideLoop),
                        *pos,
                    ));
                }
                self.out.line("continue;");
                Ok(())
            }
            Stmt::Var(s) => self.var_stmt(scope, s),
            Stmt::Assign(s) => self.assign_stmt(scope, s),
            Stmt::Call(call) => {
                let fragment = self.call(scope, call, None, true)?;
                self.out.line(&format!("{};", fragment.code));
                Ok(())
            }
        }
    }

    fn if_stmt(&mut self, scope: &mut Scope, s: &IfStmt) -> GenResult<()> {
        let condition = self.value(scope, &s.condition, &Type::BOOL)?;
        self.out.open(&format!("if ({condition})"));
        self.block(scope, &s.body)?;
        for (condition, body) in &s.elifs {
            let condition = self.value(scope, condition, &Type::BOOL)?;
            self.out.reopen(&format!("}} else if ({condition}) {{"));
            self.block(scope, body)?;
        }
        if let Some(body) = &s.else_body {
            self.out.reopen("} else {");
            self.block(scope, body)?;
        }
        self.out.close();
        Ok(())
    }

    /// Every case gets its own block and a trailing `break` unless it
    /// already ends in a jump.
    fn switch_stmt(&mut self, scope: &mut Scope, s: &SwitchStmt) -> GenResult<()> {
        let (value, ty) = self.any_value(scope, &s.value)?;
        let mut labels = Vec::with_capacity(s.cases.len());
        for case in &s.cases {
            let constant = match &case.value {
                Expr::Number(_) | Expr::Str(_) => true,
                Expr::Var(var) => var.namespace.is_none() && (var.name == "true" || var.name == "false"),
                _ => false,
            };
            if !constant {
                return Err(GenError::new(GenErrorKind::NonConstantCase, case.value.pos()));
            }
            labels.push(self.value(scope, &case.value, &ty)?);
        }

        self.out.open(&format!("switch ({value})"));
        scope.switch_depth += 1;
        let result = self.switch_cases(scope, s, &labels);
        scope.switch_depth -= 1;
        result?;
        self.out.close();
        Ok(())
    }

    fn switch_cases(&mut self, scope: &mut Scope, s: &SwitchStmt, labels: &[String]) -> GenResult<()> {
        let cases = s
            .cases
            .iter()
            .zip(labels)
            .map(|(case, label)| (format!("case {label}:"), &case.body));
        let default = s.default.iter().map(|body| ("default:".to_string(), body));
        for (head, body) in cases.chain(default) {
            self.out.open(&head);
            self.block(scope, body)?;
            if !ends_in_jump(body) {
                self.out.line("break;");
            }
            self.out.close();
        }
        Ok(())
    }

    fn try_stmt(&mut self, scope: &mut Scope, s: &TryStmt) -> GenResult<()> {
        self.out.open("try");
        self.block(scope, &s.body)?;
        let mut caught: Vec<Type> = Vec::with_capacity(s.catches.len());
        for catch in &s.catches {
            let ty = self.resolve_type(&catch.ty)?;
            if !matches!(ty, Type::Class(_)) {
                return Err(GenError::new(
                    GenErrorKind::NotThrowable {
                        ty: self.registry.type_name(&ty),
                    },
                    catch.ty.pos,
                ));
            }
            // C# rejects a clause already covered by an earlier one
            if let Some(earlier) = caught.iter().find(|earlier| self.registry.is_subtype(&ty, earlier)) {
                return Err(GenError::new(
                    GenErrorKind::UnreachableCatch {
                        ty: self.registry.type_name(&ty),
                        earlier: self.registry.type_name(earlier),
                    },
                    catch.ty.pos,
                ));
            }
            caught.push(ty.clone());
            scope.push();
            let result = self.catch_clause(scope, catch, ty);
            scope.pop();
            result?;
        }
        if let Some(body) = &s.finally {
            self.out.reopen("} finally {");
            self.finally_block(scope, body)?;
        }
        self.out.close();
        Ok(())
    }

    /// Loops and switches outside the block do not count inside it, so
    /// only jumps that stay within the block are accepted.
    fn finally_block(&mut self, scope: &mut Scope, body: &[Stmt]) -> GenResult<()> {
        let outer = (scope.loop_depth, scope.switch_depth);
        scope.loop_depth = 0;
        scope.switch_depth = 0;
        scope.finally_depth += 1;
        let result = self.block(scope, body);
        scope.finally_depth -= 1;
        (scope.loop_depth, scope.switch_depth) = outer;
        result
    }

    fn catch_clause(&mut self, scope: &mut Scope, catch: &CatchClause, ty: Type) -> GenResult<()> {
        let cs = self.registry.cs_type(&ty);
        match &catch.name {
            Some(name) => {
                let local = scope.declare(name, ty, catch.ty.pos)?;
                self.out.reopen(&format!("}} catch ({cs} {local}) {{"));
            }
            None => self.out.reopen(&format!("}} catch ({cs}) {{")),
        }
        self.block(scope, &catch.body)
    }

    fn return_stmt(&mut self, scope: &mut Scope, s: &ReturnStmt) -> GenResult<()> {
        if scope.finally_depth > 0 {
            return Err(GenError::new(GenErrorKind::JumpInFinally { jump: "return" }, s.pos));
        }
        match (&s.value, scope.ret.clone()) {
            (None, None) => self.out.line("return;"),
            (Some(value), Some(ret)) => {
                let code = self.value(scope, value, &ret)?;
                self.out.line(&format!("return {code};"));
            }
            (Some(_), None) => {
                return Err(GenError::new(
                    GenErrorKind::ReturnValueInVoid {
                        name: scope.owner_name.clone(),
                    },
                    s.pos,
                ))
            }
            (None, Some(ret)) => {
                return Err(GenError::new(
                    GenErrorKind::MissingReturnValue {
                        name: scope.owner_name.clone(),
                        expected: self.registry.type_name(&ret),
                    },
                    s.pos,
                ))
            }
        }
        Ok(())
    }

    /// The initializer is lowered before the name is declared, so
    /// `(var x x)` never sees itself.
    fn var_stmt(&mut self, scope: &mut Scope, s: &VarStmt) -> GenResult<()> {
        let (ty, init) = match (&s.ty, &s.value) {
            (Some(atom), Some(value)) => {
                let ty = self.resolve_type(atom)?;
                let init = self.value(scope, value, &ty)?;
                (ty, init)
            }
            (Some(atom), None) => (self.resolve_type(atom)?, "default".to_string()),
            (None, Some(value)) => {
                let (init, ty) = self.any_value(scope, value)?;
                (ty, init)
            }
            (None, None) => {
                return Err(GenError::new(
                    GenErrorKind::UntypedVariable {
                        name: s.name.clone(),
                    },
                    s.pos,
                ))
            }
        };
        let cs = self.registry.cs_type(&ty);
        let local = scope.declare(&s.name, ty, s.pos)?;
        self.out.line(&format!("{cs} {local} = {init};"));
        Ok(())
    }

    fn assign_stmt(&mut self, scope: &mut Scope, s: &AssignStmt) -> GenResult<()> {
        let target = match &s.target {
            Expr::Var(var) if var.namespace.is_none() && [RECEIVER, "true", "false"].contains(&var.name.as_str()) => {
                return Err(GenError::new(
                    GenErrorKind::NotAssignable {
                        name: var.name.clone(),
                    },
                    var.pos,
                ))
            }
            Expr::Var(var) => self.var(scope, var)?,
            Expr::Index(index) => self.index(scope, index, true)?,
            other => {
                return Err(GenError::new(
                    GenErrorKind::NotAssignable {
                        name: "expression".to_string(),
                    },
                    other.pos(),
                ))
            }
        };
        let ty = target.ty.ok_or_else(|| GenError::void_value(s.target.pos()))?;
        let value = self.value(scope, &s.value, &ty)?;
        self.out.line(&format!("{} = {value};", target.code));
        Ok(())
    }
}

/// The error for a `break` or `continue` with no enclosing target
fn outside_jump(scope: &Scope, jump: &'static str, otherwise: GenErrorKind) -> GenErrorKind {
    if scope.finally_depth > 0 {
        GenErrorKind::JumpInFinally { jump }
    } else {
        otherwise
    }
}

/// Whether every path through `body` ends in `return` or `throw`
pub(super) fn ends_in_return(body: &[Stmt]) -> bool {
    ends_with(body, false)
}

/// Like [`ends_in_return`], also accepting `break` and `continue`
fn ends_in_jump(body: &[Stmt]) -> bool {
    ends_with(body, true)
}

fn ends_with(body: &[Stmt], jumps: bool) -> bool {
    match body.last() {
        Some(Stmt::Return(_) | Stmt::Throw(_)) => true,
        Some(Stmt::Break(_) | Stmt::Continue(_)) => jumps,
        Some(Stmt::If(s)) => match &s.else_body {
            Some(else_body) => {
                ends_with(&s.body, jumps)
                    && s.elifs.iter().all(|(_, body)| ends_with(body, jumps))
                    && ends_with(else_body, jumps)
            }
            None => false,
        },
        // A `break` inside a case only leaves the switch
        Some(Stmt::Switch(s)) => match &s.default {
            Some(default) => s.cases.iter().all(|c| ends_with(&c.body, false)) && ends_with(default, false),
            None => false,
        },
        // Control never leaves through `finally`
        Some(Stmt::Try(s)) => ends_with(&s.body, jumps) && s.catches.iter().all(|c| ends_with(&c.body, jumps)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::tests::{compile_err, compile_ok, has_line, lines};
    use crate::codegen::GenErrorKind;

    fn func(body: &str) -> String {
        format!("ns app\n(func f I : n I\n{body})\n")
    }

    #[test]
    fn test_if_chain() {
        let out = compile_ok(&func(
            "    (if (lt n 0) (return -1))\n    (elif (eq n 0) (return 0))\n    (else (return 1))\n",
        ));
        let body = lines(&out);
        let start = body.iter().position(|l| *l == "if ((_n < 0)) {").unwrap();
        assert_eq!(
            &body[start..start + 7],
            [
                "if ((_n < 0)) {",
                "return -1;",
                "} else if ((_n == 0)) {",
                "return 0;",
                "} else {",
                "return 1;",
                "}",
            ]
        );
    }

    #[test]
    fn test_loop_with_jumps() {
        let out = compile_ok(&func(
            "    (var i 0)\n    (for (lt i n)\n        (as i (inc i))\n        (if (eq i 3) (continue))\n        (if (gt i 5) (break)))\n    (return n)\n",
        ));
        assert!(has_line(&out, "long _i = 0L;"));
        assert!(has_line(&out, "while ((_i < _n)) {"));
        assert!(has_line(&out, "continue;"));
        assert!(has_line(&out, "break;"));
    }

    #[test]
    fn test_jumps_outside_loops() {
        assert!(matches!(compile_err(&func("    (break)\n    (return n)\n")), GenErrorKind::BreakOutsideLoop));
        let kind = compile_err(&func("    (switch n)\n    (case 1 (continue))\n    (return 0)\n"));
        assert!(matches!(kind, GenErrorKind::ContinueOutsideLoop));
    }

    #[test]
    fn test_switch() {
        let out = compile_ok(&func(
            "    (switch n)\n    (case 1 (return 10))\n    (case 2 (var x 1) (break))\n    (case 3)\n    (default (return 0))\n    (return n)\n",
        ));
        let body = lines(&out);
        let start = body.iter().position(|l| *l == "switch (_n) {").unwrap();
        assert_eq!(
            &body[start..start + 15],
            [
                "switch (_n) {",
                "case 1: {",
                "return 10;",
                "}",
                "case 2: {",
                "long _x = 1L;",
                "break;",
                "}",
                "case 3: {",
                "break;",
                "}",
                "default: {",
                "return 0;",
                "}",
                "}",
            ]
        );
    }

    #[test]
    fn test_switch_counts_as_return_with_default() {
        compile_ok(&func("    (switch n)\n    (case 1 (return 10))\n    (default (return 0))\n"));
        let kind = compile_err(&func("    (switch n)\n    (case 1 (return 10))\n"));
        assert!(matches!(kind, GenErrorKind::MissingReturn { .. }));
    }

    #[test]
    fn test_non_constant_case() {
        let kind = compile_err(&func("    (switch n)\n    (case n (return 1))\n    (return 0)\n"));
        assert!(matches!(kind, GenErrorKind::NonConstantCase));
    }

    #[test]
    fn test_try_catch_finally() {
        let out = compile_ok(
            "ns app\n\
             (class Oops)\n\
             (class Worse : Oops)\n\
             (func f I\n\
             \x20   (try (throw (Worse)))\n\
             \x20   (catch Worse e (return 1))\n\
             \x20   (catch Oops (return 2))\n\
             \x20   (finally (g)))\n\
             (func g)\n",
        );
        assert!(has_line(&out, "try {"));
        assert!(has_line(&out, "throw new App.Worse();"));
        assert!(has_line(&out, "} catch (App.Worse _e) {"));
        assert!(has_line(&out, "} catch (App.Oops) {"));
        assert!(has_line(&out, "} finally {"));
        assert!(has_line(&out, "App._Funcs.g();"));

        let kind = compile_err("ns app\n(func f (throw 1))\n");
        assert!(matches!(kind, GenErrorKind::NotThrowable { .. }));
    }

    #[test]
    fn test_catch_order() {
        let kind = compile_err(
            "ns app\n(class Oops)\n(class Worse : Oops)\n(func f\n    (try (g))\n    (catch Oops (g))\n    (catch Worse (g)))\n(func g)\n",
        );
        assert!(matches!(kind, GenErrorKind::UnreachableCatch { .. }));
        let kind = compile_err("ns app\n(class Oops)\n(func f\n    (try (g))\n    (catch Oops e (g))\n    (catch Oops (g)))\n(func g)\n");
        assert!(matches!(kind, GenErrorKind::UnreachableCatch { .. }));
    }

    #[test]
    fn test_control_cannot_leave_finally() {
        let with_g = |body: &str| format!("{}(func g)\n", func(body));

        let kind = compile_err("ns app\n(func f I\n    (try (g))\n    (finally (return 1)))\n(func g)\n");
        assert!(matches!(kind, GenErrorKind::MissingReturn { .. }));
        let kind = compile_err(&with_g("    (try (g))\n    (finally (return 1))\n    (return n)\n"));
        assert!(matches!(kind, GenErrorKind::JumpInFinally { jump: "return" }));
        let kind = compile_err(&with_g(
            "    (for (lt n 3)\n        (try (g))\n        (finally (break)))\n    (return n)\n",
        ));
        assert!(matches!(kind, GenErrorKind::JumpInFinally { jump: "break" }));
        let kind = compile_err(&with_g(
            "    (for (lt n 3)\n        (try (g))\n        (finally (continue)))\n    (return n)\n",
        ));
        assert!(matches!(kind, GenErrorKind::JumpInFinally { jump: "continue" }));

        let out = compile_ok(&with_g(
            "    (try (g))\n    (finally\n        (for (lt n 3) (break)))\n    (return n)\n",
        ));
        assert!(has_line(&out, "} finally {"));
        assert!(has_line(&out, "break;"));
    }

    #[test]
    fn test_variables() {
        let out = compile_ok(&func("    (var s Str)\n    (var d FF 2)\n    (var t `hi`)\n    (return n)\n"));
        assert!(has_line(&out, "string _s = default;"));
        assert!(has_line(&out, "double _d = 2D;"));
        assert!(has_line(&out, r#"string _t = @"hi";"#));

        let kind = compile_err(&func("    (var n 1)\n    (return n)\n"));
        assert!(matches!(kind, GenErrorKind::DuplicateLocal { .. }));
    }

    #[test]
    fn test_block_scoping() {
        let kind = compile_err(&func("    (if (gt n 0) (var x 1))\n    (return x)\n"));
        assert!(matches!(kind, GenErrorKind::UnknownVariable { .. }));
    }

    #[test]
    fn test_returns() {
        let kind = compile_err("ns app\n(func f (return 1))\n");
        assert!(matches!(kind, GenErrorKind::ReturnValueInVoid { .. }));
        let kind = compile_err(&func("    (return)\n"));
        assert!(matches!(kind, GenErrorKind::MissingReturnValue { .. }));
    }

    #[test]
    fn test_assignment_targets() {
        let out = compile_ok("ns app\n(global total II)\n(func f : xs A<I> (as [0 xs] 4) (as total 9))\n");
        assert!(has_line(&out, "_xs[0] = 4;"));
        assert!(has_line(&out, "App._Globals.total = 9L;"));

        let kind = compile_err("ns app\n(func f : xs A<I> (as [len xs] 4))\n");
        assert!(matches!(kind, GenErrorKind::NotAssignable { .. }));
        let kind = compile_err("ns app\n(func f (as true false))\n");
        assert!(matches!(kind, GenErrorKind::NotAssignable { .. }));
    }
}

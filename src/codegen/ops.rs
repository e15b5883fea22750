//! Built-in operators
//!
//! A call whose name matches no function or method falls back to this
//! table. Arithmetic keeps the joined operand type, comparisons and
//! equality produce `Bool`, and comparison chains expand pairwise:
//! `(lt a b c)` is `a < b && b < c`.

use super::expr::Arg;
use super::{Fragment, Generator};
use crate::codegen::error::{GenError, GenErrorKind, GenResult};
use crate::codegen::literal::{default_type, fits, lower_number};
use crate::span::Position;
use crate::typeck::{Builtin, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Not,
    Lt,
    Gt,
    Lte,
    Gte,
    Or,
    And,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Inc,
    Dec,
    Cat,
}

/// How many operands an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Unary,
    /// One operand negates, more subtract
    UnaryOrChain,
    Chain,
}

impl Operator {
    pub const ALL: [Operator; 21] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Mod,
        Operator::Eq,
        Operator::Neq,
        Operator::Not,
        Operator::Lt,
        Operator::Gt,
        Operator::Lte,
        Operator::Gte,
        Operator::Or,
        Operator::And,
        Operator::BitAnd,
        Operator::BitOr,
        Operator::BitXor,
        Operator::BitNot,
        Operator::Inc,
        Operator::Dec,
        Operator::Cat,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Source spelling
    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
            Operator::Mod => "mod",
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Not => "not",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Gte => "gte",
            Operator::Or => "or",
            Operator::And => "and",
            Operator::BitAnd => "band",
            Operator::BitOr => "bor",
            Operator::BitXor => "bxor",
            Operator::BitNot => "bnot",
            Operator::Inc => "inc",
            Operator::Dec => "dec",
            Operator::Cat => "cat",
        }
    }

    /// C# spelling
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add | Operator::Inc | Operator::Cat => "+",
            Operator::Sub | Operator::Dec => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Not => "!",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitNot => "~",
        }
    }

    fn arity(self) -> Arity {
        match self {
            Operator::Not | Operator::BitNot | Operator::Inc | Operator::Dec => Arity::Unary,
            Operator::Sub => Arity::UnaryOrChain,
            _ => Arity::Chain,
        }
    }

    fn check_arity(self, found: usize, pos: Position) -> GenResult<()> {
        let (ok, expected) = match self.arity() {
            Arity::Unary => (found == 1, "exactly one operand"),
            Arity::UnaryOrChain => (found >= 1, "at least one operand"),
            Arity::Chain => (found >= 2, "at least two operands"),
        };
        if ok {
            Ok(())
        } else {
            Err(GenError::new(
                GenErrorKind::OperatorArity {
                    op: self.name().to_string(),
                    expected,
                    found,
                },
                pos,
            ))
        }
    }
}

/// `(a op b op c)`
fn infix(op: Operator, codes: &[String]) -> String {
    format!("({})", codes.join(&format!(" {} ", op.symbol())))
}

/// `(a op b && b op c)`
fn pairwise(op: Operator, codes: &[String]) -> String {
    let pairs: Vec<String> = codes
        .windows(2)
        .map(|pair| format!("{} {} {}", pair[0], op.symbol(), pair[1]))
        .collect();
    format!("({})", pairs.join(" && "))
}

impl<'a> Generator<'a> {
    pub(super) fn operator(
        &self,
        op: Operator,
        args: Vec<Arg>,
        expected: Option<&Type>,
        pos: Position,
    ) -> GenResult<Fragment> {
        op.check_arity(args.len(), pos)?;
        match op {
            Operator::Add | Operator::Mul | Operator::Div => {
                let (codes, ty) = self.numeric_operands(op, args, expected, false, pos)?;
                Ok(Fragment::new(infix(op, &codes), ty))
            }
            Operator::Sub => {
                let (codes, ty) = self.numeric_operands(op, args, expected, false, pos)?;
                let code = match codes.as_slice() {
                    [single] => format!("(-{single})"),
                    _ => infix(op, &codes),
                };
                Ok(Fragment::new(code, ty))
            }
            Operator::Mod | Operator::BitAnd | Operator::BitOr | Operator::BitXor => {
                let (codes, ty) = self.numeric_operands(op, args, expected, true, pos)?;
                Ok(Fragment::new(infix(op, &codes), ty))
            }
            Operator::BitNot => {
                let (codes, ty) = self.numeric_operands(op, args, expected, true, pos)?;
                Ok(Fragment::new(format!("(~{})", codes[0]), ty))
            }
            Operator::Inc | Operator::Dec => {
                let (codes, ty) = self.numeric_operands(op, args, expected, false, pos)?;
                Ok(Fragment::new(format!("({} {} 1)", codes[0], op.symbol()), ty))
            }
            Operator::Lt | Operator::Gt | Operator::Lte | Operator::Gte => {
                let (codes, _) = self.numeric_operands(op, args, None, false, pos)?;
                Ok(Fragment::new(pairwise(op, &codes), Type::BOOL))
            }
            Operator::Eq | Operator::Neq => {
                let numeric = args.iter().all(|arg| match arg {
                    Arg::Literal(_) => true,
                    Arg::Value { ty, .. } => ty.is_numeric(),
                });
                let codes = if numeric {
                    self.numeric_operands(op, args, None, false, pos)?.0
                } else {
                    self.comparable_operands(op, args, pos)?
                };
                Ok(Fragment::new(pairwise(op, &codes), Type::BOOL))
            }
            Operator::Not => {
                let codes = self.typed_operands(op, args, &Type::BOOL, pos)?;
                Ok(Fragment::new(format!("(!{})", codes[0]), Type::BOOL))
            }
            Operator::And | Operator::Or => {
                let codes = self.typed_operands(op, args, &Type::BOOL, pos)?;
                Ok(Fragment::new(infix(op, &codes), Type::BOOL))
            }
            Operator::Cat => {
                let codes = self.typed_operands(op, args, &Type::STR, pos)?;
                Ok(Fragment::new(infix(op, &codes), Type::STR))
            }
        }
    }

    /// Join the operand types and lower every literal at the joined type.
    /// A literal that does not fit widens the join, so `(add i 0.5)` with
    /// an `I` operand is a `FF` addition.
    fn numeric_operands(
        &self,
        op: Operator,
        args: Vec<Arg>,
        expected: Option<&Type>,
        integer_only: bool,
        pos: Position,
    ) -> GenResult<(Vec<String>, Type)> {
        let bad_operands = |args: &[Arg]| GenError::operator_operands(op.name(), self.describe(args), pos);

        let mut join: Option<Type> = None;
        for arg in &args {
            if let Arg::Value { ty, .. } = arg {
                join = match &join {
                    None if ty.is_numeric() => Some(ty.clone()),
                    None => None,
                    Some(current) => self.registry.numeric_join(current, ty),
                };
                if join.is_none() {
                    return Err(bad_operands(args.as_slice()));
                }
            }
        }

        let mut ty = match join {
            Some(ty) => ty,
            None => match expected.and_then(Type::builtin).filter(|b| b.is_numeric()) {
                Some(b) => Type::Builtin(b),
                None => {
                    let fractional = args
                        .iter()
                        .any(|arg| matches!(arg, Arg::Literal(lit) if lit.fraction.is_some()));
                    if fractional {
                        Type::DOUBLE
                    } else {
                        Type::LONG
                    }
                }
            },
        };
        for arg in &args {
            if let (Arg::Literal(lit), Some(b)) = (arg, ty.builtin()) {
                if !fits(lit, b) {
                    ty = self
                        .registry
                        .numeric_join(&ty, &Type::Builtin(default_type(lit)))
                        .ok_or_else(|| bad_operands(args.as_slice()))?;
                }
            }
        }
        if integer_only && !ty.is_integer() {
            return Err(bad_operands(args.as_slice()));
        }

        let target = ty.builtin();
        let codes = args
            .into_iter()
            .map(|arg| match arg {
                Arg::Literal(lit) => lower_number(lit, target).map(|(code, _)| code),
                Arg::Value { code, .. } => Ok(code),
            })
            .collect::<GenResult<Vec<_>>>()?;

        // C# arithmetic on bytes produces int
        let ty = match ty {
            Type::Builtin(Builtin::Byte | Builtin::SByte) => Type::INT,
            other => other,
        };
        Ok((codes, ty))
    }

    /// Non-numeric equality: adjacent operands must be related by subtyping.
    fn comparable_operands(&self, op: Operator, args: Vec<Arg>, pos: Position) -> GenResult<Vec<String>> {
        let bad_operands = || GenError::operator_operands(op.name(), self.describe(&args), pos);
        let mut types = Vec::with_capacity(args.len());
        for arg in &args {
            match arg {
                Arg::Value { ty, .. } => types.push(ty),
                Arg::Literal(_) => return Err(bad_operands()),
            }
        }
        let related = types
            .windows(2)
            .all(|pair| self.registry.is_subtype(pair[0], pair[1]) || self.registry.is_subtype(pair[1], pair[0]));
        if !related {
            return Err(bad_operands());
        }
        Ok(args
            .into_iter()
            .filter_map(|arg| match arg {
                Arg::Value { code, .. } => Some(code),
                Arg::Literal(_) => None,
            })
            .collect())
    }

    /// Every operand must be a value of exactly `ty`.
    fn typed_operands(&self, op: Operator, args: Vec<Arg>, ty: &Type, pos: Position) -> GenResult<Vec<String>> {
        let all_typed = args
            .iter()
            .all(|arg| matches!(arg, Arg::Value { ty: found, .. } if found == ty));
        if !all_typed {
            return Err(GenError::operator_operands(op.name(), self.describe(&args), pos));
        }
        Ok(args
            .into_iter()
            .filter_map(|arg| match arg {
                Arg::Value { code, .. } => Some(code),
                Arg::Literal(_) => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{compile_err, compile_ok, has_line};

    #[test]
    fn test_operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.name()), Some(op));
        }
        assert_eq!(Operator::from_name("band"), Some(Operator::BitAnd));
        assert_eq!(Operator::from_name("plus"), None);
    }

    #[test]
    fn test_arithmetic_chain() {
        let out = compile_ok("ns app\n(func f I : a I b I (return (add a b 1)))\n");
        assert!(has_line(&out, "return (_a + _b + 1);"));
        let out = compile_ok("ns app\n(func f I : a I (return (sub a)))\n");
        assert!(has_line(&out, "return (-_a);"));
    }

    #[test]
    fn test_operands_widen() {
        let out = compile_ok("ns app\n(func f FF : a I b FF (return (mul a b)))\n");
        assert!(has_line(&out, "return (_a * _b);"));
        let out = compile_ok("ns app\n(func f FF : a I (return (add a 0.5)))\n");
        assert!(has_line(&out, "return (_a + 0.5D);"));
        let kind = compile_err("ns app\n(func f I : a I b FF (return (mul a b)))\n");
        assert!(matches!(kind, GenErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_byte_arithmetic_produces_int() {
        let out = compile_ok("ns app\n(func f I : a B b SB (return (add a b)))\n");
        assert!(has_line(&out, "return (_a + _b);"));
        let kind = compile_err("ns app\n(func f B : a B b B (return (add a b)))\n");
        assert!(matches!(kind, GenErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_literal_operands_take_expected_type() {
        let out = compile_ok("ns app\n(global x II (add 1 2))\n(global y FF (mul 2 1.5))\n");
        assert!(has_line(&out, "public static long x = (1L + 2L);"));
        assert!(has_line(&out, "public static double y = (2D * 1.5D);"));
    }

    #[test]
    fn test_comparison_chain() {
        let out = compile_ok("ns app\n(func f Bool : a I b I (return (lt 0 a b 10)))\n");
        assert!(has_line(&out, "return (0 < _a && _a < _b && _b < 10);"));
        let out = compile_ok("ns app\n(func f Bool : a Str b Str (return (neq a b)))\n");
        assert!(has_line(&out, "return (_a != _b);"));
    }

    #[test]
    fn test_equality_of_related_classes() {
        let out = compile_ok(
            "ns geo\n(class Shape)\n(class Circle : Shape)\n(func f Bool : s Shape c Circle (return (eq s c)))\n",
        );
        assert!(has_line(&out, "return (_s == _c);"));
        let kind = compile_err("ns geo\n(class A)\n(class B)\n(func f Bool : a A b B (return (eq a b)))\n");
        assert!(matches!(kind, GenErrorKind::OperatorOperands { .. }));
        let kind = compile_err("ns geo\n(func f Bool : s Str (return (eq s 1)))\n");
        assert!(matches!(kind, GenErrorKind::OperatorOperands { .. }));
    }

    #[test]
    fn test_integer_only_operators() {
        let out = compile_ok("ns app\n(func f I : a I (return (band (mod a 7) (bnot a))))\n");
        assert!(has_line(&out, "return ((_a % 7) & (~_a));"));
        let kind = compile_err("ns app\n(func f FF : a FF (return (mod a 2)))\n");
        assert!(matches!(kind, GenErrorKind::OperatorOperands { .. }));
    }

    #[test]
    fn test_boolean_and_string_operators() {
        let out = compile_ok("ns app\n(func f Bool : a Bool b Bool (return (and a (not b) a)))\n");
        assert!(has_line(&out, "return (_a && (!_b) && _a);"));
        let out = compile_ok("ns app\n(func f Str : s Str (return (cat s `!`)))\n");
        assert!(has_line(&out, r#"return (_s + @"!");"#));
        let kind = compile_err("ns app\n(func f Str : s Str (return (cat s 1)))\n");
        assert!(matches!(kind, GenErrorKind::OperatorOperands { .. }));
    }

    #[test]
    fn test_arity() {
        let kind = compile_err("ns app\n(func f Bool : a Bool (return (not a a)))\n");
        assert!(matches!(kind, GenErrorKind::OperatorArity { found: 2, .. }));
        let kind = compile_err("ns app\n(func f I : a I (return (add a)))\n");
        assert!(matches!(kind, GenErrorKind::OperatorArity { found: 1, .. }));
    }

    #[test]
    fn test_increment() {
        let out = compile_ok("ns app\n(func f : a I (as a (inc a)))\n");
        assert!(has_line(&out, "_a = (_a + 1);"));
    }

    #[test]
    fn test_operator_as_statement() {
        let kind = compile_err("ns app\n(func f : a I (add a 1))\n");
        assert!(matches!(kind, GenErrorKind::OperatorStatement { .. }));
    }

    #[test]
    fn test_functions_shadow_operators_only_when_they_match() {
        let source = "ns app\n\
                      (func add Str : a Str b Str (return (cat a b)))\n\
                      (func f Str (return (add `x` `y`)))\n\
                      (func g I (return (add 1 2)))\n";
        let out = compile_ok(source);
        assert!(has_line(&out, r#"return App._Funcs.add(@"x", @"y");"#));
        assert!(has_line(&out, "return (1 + 2);"));
    }
}

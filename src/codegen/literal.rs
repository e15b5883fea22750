//! Literal lowering
//!
//! A number literal has no type of its own. It takes the type the context
//! expects, and is rejected when it does not fit that type exactly.

use crate::ast::NumberLit;
use crate::codegen::error::{GenError, GenErrorKind, GenResult};
use crate::typeck::Builtin;

/// Type of a literal when nothing more specific is expected
pub fn default_type(lit: &NumberLit) -> Builtin {
    if lit.fraction.is_some() {
        Builtin::Double
    } else {
        Builtin::Long
    }
}

/// Lower `lit` as a value of `target`, returning the C# text and the
/// literal's type. `None` and `Any` fall back to [`default_type`].
pub fn lower_number(lit: &NumberLit, target: Option<Builtin>) -> GenResult<(String, Builtin)> {
    let ty = match target {
        None | Some(Builtin::Any) => default_type(lit),
        Some(b) => b,
    };
    let code = match ty {
        Builtin::Float | Builtin::Double => float_literal(lit, ty)?,
        Builtin::Int => integer(lit, ty, i32::MIN.into(), i32::MAX.into())?.to_string(),
        Builtin::UInt => format!("{}U", integer(lit, ty, 0, u32::MAX.into())?),
        Builtin::Long => format!("{}L", integer(lit, ty, i64::MIN.into(), i64::MAX.into())?),
        Builtin::Byte => format!("(byte) {}", integer(lit, ty, 0, 255)?),
        Builtin::SByte => format!("(sbyte) {}", integer(lit, ty, -128, 127)?),
        Builtin::Bool | Builtin::Str | Builtin::Any => {
            return Err(GenError::new(
                GenErrorKind::LiteralNotAllowed {
                    ty: ty.source_name().to_string(),
                },
                lit.pos,
            ))
        }
    };
    Ok((code, ty))
}

/// Whether `lit` can be lowered as `ty`
pub fn fits(lit: &NumberLit, ty: Builtin) -> bool {
    lower_number(lit, Some(ty)).is_ok()
}

fn integer(lit: &NumberLit, ty: Builtin, min: i128, max: i128) -> GenResult<i128> {
    if lit.fraction.is_some() {
        return Err(GenError::new(
            GenErrorKind::FractionalLiteral {
                literal: lit.to_string(),
                ty: ty.source_name().to_string(),
            },
            lit.pos,
        ));
    }
    let out_of_range = || GenError::literal_out_of_range(lit.to_string(), ty.source_name(), lit.pos);
    let magnitude: i128 = lit.integer.parse().map_err(|_| out_of_range())?;
    let value = if lit.negative { -magnitude } else { magnitude };
    if value < min || value > max {
        return Err(out_of_range());
    }
    Ok(value)
}

fn float_literal(lit: &NumberLit, ty: Builtin) -> GenResult<String> {
    let text = lit.to_string();
    let (finite, suffix) = match ty {
        Builtin::Float => (text.parse::<f32>().map_or(false, f32::is_finite), 'F'),
        _ => (text.parse::<f64>().map_or(false, f64::is_finite), 'D'),
    };
    if !finite {
        return Err(GenError::literal_out_of_range(text, ty.source_name(), lit.pos));
    }
    Ok(format!("{text}{suffix}"))
}

/// C# verbatim string: `@"..."` with embedded quotes doubled
pub fn verbatim_string(value: &str) -> String {
    format!("@\"{}\"", value.replace('"', "\"\""))
}

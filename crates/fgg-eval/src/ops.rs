//! Primitive operators over literal values.
//!
//! One subsystem serves typed and untyped operands alike. Two untyped
//! operands widen to the larger of their tags; a typed operand forces the
//! other onto its representation first. Fixed-width integer arithmetic
//! wraps.

use fgg_syntax::{BinOp, LitValue, Literal, Prim, PrimTag};

#[derive(Clone, Debug, PartialEq)]
pub enum OpFailure {
    DivisionByZero,
    /// The operator is not defined on the operands' common representation.
    Unsupported(Prim),
}

/// The common representation of two operands.
fn common_prim(l: Prim, r: Prim) -> Prim {
    match (l.untyped, r.untyped) {
        (false, _) => l,
        (true, false) => r,
        (true, true) => {
            if l.tag.rank() >= r.tag.rank() {
                l
            } else {
                r
            }
        }
    }
}

fn coerce(lit: &Literal, prim: Prim) -> Result<Literal, OpFailure> {
    if lit.prim == prim {
        return Ok(lit.clone());
    }
    let mut out = lit.convert(prim.tag).ok_or(OpFailure::Unsupported(prim))?;
    out.prim = prim;
    Ok(out)
}

/// Apply `op` to two literal operands.
pub fn binary(op: BinOp, lhs: &Literal, rhs: &Literal) -> Result<Literal, OpFailure> {
    let prim = common_prim(lhs.prim, rhs.prim);
    let l = coerce(lhs, prim)?;
    let r = coerce(rhs, prim)?;
    let unsupported = || OpFailure::Unsupported(prim);

    if op.is_equality() {
        let eq = l.value == r.value;
        return Ok(Literal::bool(if op == BinOp::Eq { eq } else { !eq }));
    }
    if op.is_logical() {
        return match (&l.value, &r.value) {
            (LitValue::Bool(a), LitValue::Bool(b)) => {
                Ok(Literal::bool(if op == BinOp::And { *a && *b } else { *a || *b }))
            }
            _ => Err(unsupported()),
        };
    }
    if op.is_ordering() {
        let ord = match (&l.value, &r.value) {
            (LitValue::Int(a), LitValue::Int(b)) => a.partial_cmp(b),
            (LitValue::Float(a), LitValue::Float(b)) => a.partial_cmp(b),
            (LitValue::Str(a), LitValue::Str(b)) => a.partial_cmp(b),
            _ => return Err(unsupported()),
        };
        let result = match ord {
            None => false,
            Some(ord) => match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            },
        };
        return Ok(Literal::bool(result));
    }

    let value = match (&l.value, &r.value) {
        (LitValue::Int(a), LitValue::Int(b)) => LitValue::Int(int_arith(op, prim.tag, *a, *b)?),
        (LitValue::Float(a), LitValue::Float(b)) => {
            let x = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                _ => a / b,
            };
            LitValue::Float(if prim.tag == PrimTag::Float32 { x as f32 as f64 } else { x })
        }
        (LitValue::Str(a), LitValue::Str(b)) if op == BinOp::Add => LitValue::Str(format!("{}{}", a, b)),
        _ => return Err(unsupported()),
    };
    Ok(Literal { value, prim })
}

fn int_arith(op: BinOp, tag: PrimTag, a: i64, b: i64) -> Result<i64, OpFailure> {
    if op == BinOp::Div && b == 0 {
        return Err(OpFailure::DivisionByZero);
    }
    if tag == PrimTag::Int32 {
        let (a, b) = (a as i32, b as i32);
        let x = match op {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            _ => a.wrapping_div(b),
        };
        return Ok(x as i64);
    }
    Ok(match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        _ => a.wrapping_div(b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i32_lit(n: i32) -> Literal {
        Literal::typed(PrimTag::Int32, LitValue::Int(n as i64)).unwrap()
    }

    #[test]
    fn int32_addition_wraps() {
        let out = binary(BinOp::Add, &i32_lit(i32::MAX), &i32_lit(1)).unwrap();
        assert_eq!(out, i32_lit(i32::MIN));
        assert_eq!(out.to_string(), "int32(-2147483648)");
    }

    #[test]
    fn int32_min_divided_by_minus_one_wraps() {
        let out = binary(BinOp::Div, &i32_lit(i32::MIN), &i32_lit(-1)).unwrap();
        assert_eq!(out, i32_lit(i32::MIN));
    }

    #[test]
    fn integer_division_by_zero_fails() {
        assert_eq!(binary(BinOp::Div, &i32_lit(1), &i32_lit(0)), Err(OpFailure::DivisionByZero));
    }

    #[test]
    fn untyped_operands_widen() {
        let out = binary(BinOp::Mul, &Literal::int(2), &Literal::float(1.5)).unwrap();
        assert_eq!(out.value, LitValue::Float(3.0));
        assert!(out.prim.untyped);
        assert_eq!(out.prim.tag, PrimTag::Float64);
    }

    #[test]
    fn typed_operand_wins() {
        let out = binary(BinOp::Sub, &Literal::int(5), &i32_lit(7)).unwrap();
        assert_eq!(out, i32_lit(-2));
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(binary(BinOp::Lt, &i32_lit(1), &i32_lit(2)).unwrap(), Literal::bool(true));
        assert_eq!(
            binary(BinOp::Ge, &Literal::string("a"), &Literal::string("b")).unwrap(),
            Literal::bool(false)
        );
        assert_eq!(binary(BinOp::Ne, &i32_lit(3), &Literal::int(3)).unwrap(), Literal::bool(false));
        assert_eq!(
            binary(BinOp::Or, &Literal::bool(false), &Literal::bool(true)).unwrap(),
            Literal::bool(true)
        );
    }

    #[test]
    fn string_concatenation() {
        let out = binary(BinOp::Add, &Literal::string("ab"), &Literal::string("c")).unwrap();
        assert_eq!(out, Literal::string("abc"));
        assert!(matches!(
            binary(BinOp::Mul, &Literal::string("a"), &Literal::string("b")),
            Err(OpFailure::Unsupported(_))
        ));
    }
}

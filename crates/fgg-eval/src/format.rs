//! `fmt.Sprintf` over evaluated arguments.
//!
//! Supported verbs: `%v %d %s %t %f %q %%`. Structs print as `{f1 f2}` under
//! every verb that accepts them. Verb/argument mismatches, missing and extra
//! arguments render in Go's `%!verb(type=value)` style.

use fgg_syntax::{Expr, LitValue, Literal};

/// Render `format` with `args`. Every argument must be a value.
pub fn sprintf(format: &str, args: &[Expr]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut next = 0;
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        match args.get(next) {
            Some(arg) => out.push_str(&format_verb(verb, arg)),
            None => out.push_str(&format!("%!{}(MISSING)", verb)),
        }
        next += 1;
    }
    if next < args.len() {
        let extra: Vec<String> = args[next..]
            .iter()
            .map(|a| format!("{}={}", type_name(a), value(a)))
            .collect();
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }
    out
}

fn format_verb(verb: char, arg: &Expr) -> String {
    let lit = match arg {
        Expr::Lit(lit) => Some(lit),
        _ => None,
    };
    let formatted = match (verb, lit.map(|l| &l.value)) {
        ('v', _) => Some(value(arg)),
        ('d', Some(LitValue::Int(n))) => Some(n.to_string()),
        ('s', Some(LitValue::Str(s))) => Some(s.clone()),
        ('t', Some(LitValue::Bool(b))) => Some(b.to_string()),
        ('f', Some(LitValue::Float(x))) => Some(format!("{:.6}", x)),
        ('q', Some(LitValue::Str(s))) => Some(format!("{:?}", s)),
        ('d' | 's' | 't' | 'f' | 'q', None) => match arg {
            Expr::StructLit { elems, .. } => Some(struct_with(elems, &|e| format_verb(verb, e))),
            _ => None,
        },
        _ => None,
    };
    formatted.unwrap_or_else(|| format!("%!{}({}={})", verb, type_name(arg), value(arg)))
}

/// The `%v` rendering of a value.
fn value(arg: &Expr) -> String {
    match arg {
        Expr::Lit(lit) => lit_value(lit),
        Expr::StructLit { elems, .. } => struct_with(elems, &value),
        other => other.to_string(),
    }
}

fn struct_with(elems: &[Expr], f: &dyn Fn(&Expr) -> String) -> String {
    let parts: Vec<String> = elems.iter().map(f).collect();
    format!("{{{}}}", parts.join(" "))
}

fn lit_value(lit: &Literal) -> String {
    match &lit.value {
        LitValue::Bool(b) => b.to_string(),
        LitValue::Int(n) => n.to_string(),
        LitValue::Float(x) => float_value(*x),
        LitValue::Str(s) => s.clone(),
    }
}

/// Shortest representation, switching to exponent form outside
/// `[1e-4, 1e21)` like Go's `%v`.
fn float_value(x: f64) -> String {
    if !x.is_finite() {
        return if x.is_nan() {
            "NaN".to_string()
        } else if x > 0.0 {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        };
    }
    let abs = x.abs();
    if abs == 0.0 || (1e-4..1e21).contains(&abs) {
        return format!("{}", x);
    }
    let sci = format!("{:e}", x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}

fn type_name(arg: &Expr) -> String {
    match arg {
        Expr::Lit(lit) => lit.prim.default_type().to_string(),
        Expr::StructLit { ty, .. } => ty.to_string(),
        _ => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgg_syntax::build::*;
    use super::sprintf;

    #[test]
    fn struct_values_print_go_style() {
        let v = struct_lit("P", vec![], vec![int32(1), struct_lit("A", vec![], vec![]), string("x")]);
        assert_eq!(sprintf("%v", &[v]), "{1 {} x}");
    }

    #[test]
    fn verbs() {
        let out = sprintf(
            "%d %s %t %q %f 100%%",
            &[int32(7), string("hi"), lit(Literal::bool(true)), string("q"), lit(Literal::float(1.5))],
        );
        assert_eq!(out, "7 hi true \"q\" 1.500000 100%");
    }

    #[test]
    fn bad_verb_missing_and_extra() {
        assert_eq!(sprintf("%d", &[string("x")]), "%!d(string=x)");
        assert_eq!(sprintf("%v and %v", &[int32(1)]), "1 and %!v(MISSING)");
        assert_eq!(sprintf("x", &[int32(1), string("y")]), "x%!(EXTRA int32=1, string=y)");
        assert_eq!(sprintf("50%", &[]), "50%!(NOVERB)");
    }

    #[test]
    fn floats() {
        assert_eq!(float_value(3.0), "3");
        assert_eq!(float_value(0.25), "0.25");
        assert_eq!(float_value(1e21), "1e+21");
        assert_eq!(float_value(1.5e-7), "1.5e-07");
    }
}

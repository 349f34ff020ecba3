//! Ground names for instantiated types and methods.
//!
//! `List(Pair(A, B))` becomes `ListᐸPairᐸAˏBᐳᐳ`: spaces are dropped, and
//! parentheses and commas become letters that look like them, so every
//! ground name is still a valid Go identifier. Source names contain none of
//! `ᐸ`, `ᐳ`, `ˏ` or `ǂ`, so distinct instantiations never share a name.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};

use fgg_syntax::{Named, Sig, Type};

fn escape(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len());
    for c in rendered.chars() {
        match c {
            ' ' => {}
            '(' => out.push('ᐸ'),
            ')' => out.push('ᐳ'),
            ',' => out.push('ˏ'),
            other => out.push(other),
        }
    }
    out
}

/// The ground declaration name of a named type instance.
pub fn mangle_named(n: &Named) -> String {
    if n.args.is_empty() {
        return n.name.clone();
    }
    escape(&n.to_string())
}

/// The ground name of a method instantiated at `targs`.
pub fn mangle_meth(meth: &str, targs: &[Type]) -> String {
    if targs.is_empty() {
        return meth.to_string();
    }
    let args: Vec<String> = targs.iter().map(Type::to_string).collect();
    escape(&format!("{}({})", meth, args.join(", ")))
}

/// The placeholder name standing for `sig` in every ground method table:
/// the method name, `ǂ`, and a hash of the alpha-canonical signature.
/// Value-parameter names do not contribute.
pub fn hash_name(sig: &Sig) -> String {
    let canon = sig.canonical();
    let mut hasher = FxHasher::default();
    canon.meth.hash(&mut hasher);
    for formal in &canon.formals {
        formal.bound.hash(&mut hasher);
    }
    for param in &canon.params {
        param.ty.hash(&mut hasher);
    }
    canon.ret.hash(&mut hasher);
    format!("{}ǂ{:x}", sig.meth, hasher.finish())
}

/// `base`, or `base` with the smallest numeric suffix not in `taken`.
pub fn fresh_name(base: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{}_{}", base, i))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgg_syntax::build::*;
    use fgg_syntax::Spec;

    fn as_sig(spec: Spec) -> Sig {
        match spec {
            Spec::Sig(s) => s,
            Spec::Embed(_) => unreachable!(),
        }
    }

    #[test]
    fn mangles_nested_arguments() {
        let n = fgg_syntax::Named::new("List", vec![named("Pair", vec![named("A", vec![]), named("B", vec![])])]);
        assert_eq!(mangle_named(&n), "ListᐸPairᐸAˏBᐳᐳ");
        assert_eq!(mangle_named(&fgg_syntax::Named::new("A", vec![])), "A");
        assert_eq!(mangle_meth("map", &[named("A", vec![])]), "mapᐸAᐳ");
        assert_eq!(mangle_meth("get", &[]), "get");
    }

    #[test]
    fn hash_ignores_formal_and_parameter_names() {
        let any = named("Any", vec![]);
        let a = as_sig(sig("id", vec![formal("T", any.clone())], vec![param_decl("x", param("T"))], param("T")));
        let b = as_sig(sig("id", vec![formal("U", any.clone())], vec![param_decl("y", param("U"))], param("U")));
        let c = as_sig(sig("id", vec![formal("U", any)], vec![param_decl("y", param("U"))], named("A", vec![])));
        assert_eq!(hash_name(&a), hash_name(&b));
        assert_ne!(hash_name(&a), hash_name(&c));
        assert!(hash_name(&a).starts_with("idǂ"));
    }

    #[test]
    fn ground_names_are_go_identifiers() {
        let is_ident = |s: &str| {
            let mut chars = s.chars();
            chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        };
        let pair = named("Pair", vec![named("A", vec![]), named("List", vec![named("B", vec![])])]);
        let n = fgg_syntax::Named::new("Map", vec![pair.clone(), named("C", vec![])]);
        assert!(is_ident(&mangle_named(&n)), "{}", mangle_named(&n));
        assert!(is_ident(&mangle_meth("zip", &[pair.clone(), pair])));
        let s = as_sig(sig("get", vec![], vec![], named("A", vec![])));
        assert!(is_ident(&hash_name(&s)), "{}", hash_name(&s));
    }

    #[test]
    fn fresh_names_avoid_taken() {
        let taken: FxHashSet<String> = ["Top".to_string(), "Top_1".to_string()].into_iter().collect();
        assert_eq!(fresh_name("Top", &taken), "Top_2");
        assert_eq!(fresh_name("Any", &taken), "Any");
    }
}

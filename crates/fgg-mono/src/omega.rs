//! Ground instantiation discovery.

use fgg_syntax::{Expr, Type};
use fgg_typeck::{DeclTable, Gamma};

use crate::closure::Closure;
use crate::error::MonoError;
use crate::instances::{InstanceSet, MethInst};

/// The ground types and method instantiations reachable from a main
/// expression, in discovery order.
#[derive(Clone, Debug, Default)]
pub struct Omega {
    pub types: InstanceSet<Type>,
    pub meths: InstanceSet<MethInst>,
}

impl Omega {
    pub fn contains_type(&self, ty: &Type) -> bool {
        self.types.contains(ty)
    }

    pub fn contains_meth(&self, inst: &MethInst) -> bool {
        self.meths.contains(inst)
    }
}

/// Close `main` under the ground closure rules.
///
/// Only terminates on programs the nomono check accepts; `max_passes`
/// bounds the loop for callers that skip the check.
pub fn discover(table: &DeclTable, main: &Expr, max_passes: Option<usize>) -> Result<Omega, MonoError> {
    let mut closure = Closure::ground(table);
    closure.seed(&Gamma::new(), main)?;
    let passes = closure.run(max_passes)?;
    tracing::debug!(passes, types = closure.types.len(), meths = closure.meths.len(), "omega discovered");
    Ok(Omega { types: closure.types, meths: closure.meths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgg_syntax::build::*;

    #[test]
    fn discovers_field_and_body_types() {
        let any = named("Any", vec![]);
        let table = DeclTable::new(&[
            type_decl("Any", vec![], iface(vec![])),
            type_decl("A", vec![], structure(vec![])),
            type_decl("Box", vec![formal("a", any.clone())], structure(vec![field("f", param("a"))])),
            type_decl("Pair", vec![formal("a", any.clone())], structure(vec![field("x", param("a"))])),
            method(
                ("b", "Box", vec![formal("a", any.clone())]),
                "pair",
                vec![],
                vec![],
                named("Pair", vec![param("a")]),
                struct_lit("Pair", vec![param("a")], vec![select(var("b"), "f")]),
            ),
        ])
        .unwrap();
        let a = named("A", vec![]);
        let main = call(struct_lit("Box", vec![a.clone()], vec![struct_lit("A", vec![], vec![])]), "pair", vec![], vec![]);

        let omega = discover(&table, &main, None).unwrap();
        assert!(omega.contains_type(&a));
        assert!(omega.contains_type(&named("Box", vec![a.clone()])));
        assert!(omega.contains_type(&named("Pair", vec![a.clone()])));
        assert!(omega.contains_meth(&MethInst::new(named("Box", vec![a]), "pair", vec![])));
        assert_eq!(omega.meths.len(), 1);
    }
}

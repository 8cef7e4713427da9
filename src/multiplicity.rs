//! Default cardinality for attributes that omit it.

use crate::ast::{Attribute, Bound, Multiplicity};

/// Resolve a possibly partial multiplicity.
///
/// A missing multiplicity is `[1,1]`. A missing upper bound defaults to 1,
/// except that a lone `*` means "zero or many".
pub fn resolve(raw: Option<Multiplicity>) -> Multiplicity {
    match raw {
        None => Multiplicity::ONE,
        Some(Multiplicity { lower: Bound::Many, upper: None }) => Multiplicity {
            lower: Bound::Number(0),
            upper: Some(Bound::Many),
        },
        Some(Multiplicity { lower, upper: None }) => Multiplicity {
            lower,
            upper: Some(Bound::Number(1)),
        },
        Some(m) => m,
    }
}

/// Fill in the attribute's multiplicity in place and return it.
pub fn normalize(attr: &mut Attribute) -> Multiplicity {
    let m = resolve(attr.multiplicity);
    attr.multiplicity = Some(m);
    m
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn bound_strategy() -> impl Strategy<Value = Bound> {
        prop_oneof![(0u32..5).prop_map(Bound::Number), Just(Bound::Many)]
    }

    proptest! {
        #[test]
        fn resolved_upper_is_always_set(lower in bound_strategy(), upper in proptest::option::of(bound_strategy())) {
            let m = resolve(Some(Multiplicity { lower, upper }));
            prop_assert!(m.upper.is_some());
        }

        #[test]
        fn explicit_upper_is_preserved(lower in bound_strategy(), upper in bound_strategy()) {
            let m = resolve(Some(Multiplicity { lower, upper: Some(upper) }));
            prop_assert_eq!(m, Multiplicity { lower, upper: Some(upper) });
        }
    }
}

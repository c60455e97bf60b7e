//! Ability pattern matching used during re-delegation and derivation search.
//!
//! Descriptors match a single concrete `can` string; the pattern matching
//! between a delegated ability (which may carry a wildcard) and a claimed
//! one happens here, during re-delegation expansion and derivation search.

use dialog_ucan::Ability;

/// The more specific of two compatible ability patterns, or `None` if they
/// are incompatible.
///
/// `provided` is the ability carried by a proof; `claimed` is the ability a
/// re-delegation filter (or a claim) is asking for.
///
/// Two distinct segment wildcards (`a/*` vs `b/*`) are always incompatible,
/// even when one prefixes the other as a string — equal pattern wins,
/// unequal is never derivable.
#[must_use]
pub fn match_ability(provided: &Ability, claimed: &Ability) -> Option<Ability> {
    match (provided, claimed) {
        (Ability::Any, _) => Some(claimed.clone()),
        (_, Ability::Any) => Some(provided.clone()),
        (Ability::Segment(p), Ability::Segment(q)) => (p == q).then(|| provided.clone()),
        (_, Ability::Segment(prefix)) if narrows(provided, prefix) => Some(provided.clone()),
        (Ability::Segment(prefix), _) if narrows(claimed, prefix) => Some(claimed.clone()),
        _ if provided == claimed => Some(provided.clone()),
        _ => None,
    }
}

/// Whether `ability` is a concrete string inside the `prefix/*` family.
fn narrows(ability: &Ability, prefix: &str) -> bool {
    match ability {
        Ability::Concrete(s) => s.starts_with(prefix) && s[prefix.len()..].starts_with('/'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_yields_the_other_pattern() {
        assert_eq!(
            match_ability(&Ability::Any, &Ability::parse("store/add")),
            Some(Ability::parse("store/add"))
        );
        assert_eq!(
            match_ability(&Ability::parse("store/add"), &Ability::Any),
            Some(Ability::parse("store/add"))
        );
    }

    #[test]
    fn segment_narrows_to_concrete() {
        let provided = Ability::parse("store/*");
        let claimed = Ability::parse("store/add");
        assert_eq!(
            match_ability(&provided, &claimed),
            Some(Ability::parse("store/add"))
        );
        assert_eq!(
            match_ability(&claimed, &provided),
            Some(Ability::parse("store/add"))
        );
    }

    #[test]
    fn unequal_segments_are_incompatible() {
        assert_eq!(
            match_ability(&Ability::parse("store/*"), &Ability::parse("file/*")),
            None
        );
    }

    #[test]
    fn equal_segments_match() {
        let wildcard = Ability::parse("store/*");
        assert_eq!(match_ability(&wildcard, &wildcard), Some(wildcard));
    }

    #[test]
    fn concrete_match_is_commutative() {
        let a = Ability::parse("store/add");
        let b = Ability::parse("store/add");
        let c = Ability::parse("store/remove");
        assert_eq!(match_ability(&a, &b), match_ability(&b, &a));
        assert_eq!(match_ability(&a, &c), match_ability(&c, &a));
        assert_eq!(match_ability(&a, &c), None);
    }

    #[test]
    fn unrelated_prefixes_are_incompatible() {
        // "storefront/add" is not in the "store/*" family even though it
        // shares a string prefix with "store".
        assert_eq!(
            match_ability(&Ability::parse("store/*"), &Ability::parse("storefront/add")),
            None
        );
    }
}

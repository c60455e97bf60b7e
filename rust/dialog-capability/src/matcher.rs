//! Capability combinators: disjunction, conjunction, derivation.
//!
//! A [`Matcher`] is a tagged variant over a single descriptor or a
//! combination of matchers, all producing the same typed value `V`. The
//! proof-chain validator walks this tree to decide which descriptor a raw
//! capability belongs to and, for [`Matcher::Derive`], which selector to
//! search a proof's capabilities with during re-delegation.

use crate::{
    descriptor::Descriptor,
    error::MalformedReason,
};
use dialog_ucan::Capability;
use std::sync::Arc;

/// A capability that parsed successfully against some [`Descriptor`].
#[derive(Clone)]
pub struct Match<V> {
    /// The typed, parsed capability value.
    pub value: V,
    /// The raw wire capability this value was parsed from.
    pub capability: Capability,
    descriptor: Arc<Descriptor<V>>,
}

impl<V> Match<V> {
    /// Run this match's descriptor's `derives(claimed, delegated)` predicate
    /// with `self` as the claimed value and `parent` as the delegated one.
    ///
    /// # Errors
    ///
    /// Returns the descriptor's [`EscalationReason`][crate::error::EscalationReason]
    /// if `self` escalates beyond `parent`.
    pub fn derives_from(&self, parent: &V) -> Result<(), crate::error::EscalationReason> {
        (self.descriptor.derives_fn())(&self.value, parent)
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Match<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("value", &self.value)
            .field("capability", &self.capability)
            .finish()
    }
}

/// The outcome of applying a [`Matcher`] to one raw capability.
pub enum MatchResult<V> {
    /// `can` matched a descriptor and `with`/`nb` parsed successfully.
    Match(Match<V>),
    /// No descriptor in this matcher recognizes `can`.
    Unknown(Capability),
    /// `can` matched but `with` or a caveat failed to parse.
    Malformed(Capability, MalformedReason),
}

/// Informativeness ordering used to pick the more useful of two failed
/// [`MatchResult`]s for the `or` combinator: `Malformed` outranks
/// `Unknown` because it means a descriptor recognized the ability and had
/// something concrete to say about why it rejected the capability.
fn more_informative<V>(left: MatchResult<V>, right: MatchResult<V>) -> MatchResult<V> {
    match (&left, &right) {
        (MatchResult::Match(_), _) => left,
        (_, MatchResult::Match(_)) => right,
        (MatchResult::Malformed(..), _) => left,
        (_, MatchResult::Malformed(..)) => right,
        _ => left,
    }
}

/// Combinators over [`Descriptor`]s: disjunction, conjunction,
/// and derivation, each both a matcher and a selector over a
/// capability list.
pub enum Matcher<V> {
    /// A single concrete descriptor.
    Direct(Arc<Descriptor<V>>),
    /// Match `left`; on non-`Match`, try `right`, keeping the more
    /// informative failure.
    Or(Box<Matcher<V>>, Box<Matcher<V>>),
    /// A group matcher: every child must independently match some
    /// capability in the source list.
    And(Vec<Matcher<V>>),
    /// Matches `to` directly; `from` is the selector used, during
    /// proof-chain search, to find the parent match a claim must derive
    /// from, during re-delegation.
    Derive {
        /// The selector for a direct claim against this matcher.
        to: Box<Matcher<V>>,
        /// The selector used to find the parent capability in a proof.
        from: Box<Matcher<V>>,
    },
}

impl<V: Clone> Matcher<V> {
    /// Build a matcher around a single descriptor.
    #[must_use]
    pub fn direct(descriptor: Descriptor<V>) -> Self {
        Self::Direct(Arc::new(descriptor))
    }

    /// `or(self, other)` — try `self` first, falling back to `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// `derive({from, to})` — `self` is `to`; `from` is the parent selector.
    #[must_use]
    pub fn derive(self, from: Self) -> Self {
        Self::Derive {
            to: Box::new(self),
            from: Box::new(from),
        }
    }

    /// The selector used to search a proof's capabilities for a parent
    /// match, for [`Matcher::Derive`]. Non-`Derive` matchers search with
    /// themselves.
    #[must_use]
    pub fn from_selector(&self) -> &Matcher<V> {
        match self {
            Self::Derive { from, .. } => from,
            other => other,
        }
    }

    /// Apply this matcher to a single raw capability.
    #[must_use]
    pub fn match_one(&self, capability: &Capability) -> MatchResult<V> {
        match self {
            Self::Direct(descriptor) => match descriptor.parse(capability) {
                None => MatchResult::Unknown(capability.clone()),
                Some(Ok(value)) => MatchResult::Match(Match {
                    value,
                    capability: capability.clone(),
                    descriptor: Arc::clone(descriptor),
                }),
                Some(Err(reason)) => MatchResult::Malformed(capability.clone(), reason),
            },
            Self::Or(left, right) => {
                let left_result = left.match_one(capability);
                if matches!(left_result, MatchResult::Match(_)) {
                    return left_result;
                }
                let right_result = right.match_one(capability);
                more_informative(left_result, right_result)
            }
            Self::Derive { to, .. } => to.match_one(capability),
            Self::And(children) => {
                // Degenerate case: whether this single capability alone
                // satisfies every child matcher. The list-level cartesian
                // combination lives in `select_conjunction`.
                let mut last = MatchResult::Unknown(capability.clone());
                for child in children {
                    match child.match_one(capability) {
                        MatchResult::Match(m) => last = MatchResult::Match(m),
                        other => return other,
                    }
                }
                last
            }
        }
    }

    /// All capabilities in `source` that this matcher recognizes and
    /// successfully parses, in source order.
    #[must_use]
    pub fn select(&self, source: &[Capability]) -> Vec<Match<V>> {
        source
            .iter()
            .filter_map(|capability| match self.match_one(capability) {
                MatchResult::Match(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Cartesian-product combinations of per-child matches for an
    /// [`Matcher::And`] group: every returned `Vec<Match<V>>`
    /// assigns one matching capability to each child matcher, in child
    /// order. Non-`And` matchers degenerate to one combination per match.
    #[must_use]
    pub fn select_conjunction(&self, source: &[Capability]) -> Vec<Vec<Match<V>>> {
        let Self::And(children) = self else {
            return self.select(source).into_iter().map(|m| vec![m]).collect();
        };
        children.iter().fold(vec![Vec::new()], |acc, child| {
            let matches = child.select(source);
            acc.into_iter()
                .flat_map(|combo| {
                    matches.iter().map(move |m| {
                        let mut next = combo.clone();
                        next.push(m.clone());
                        next
                    })
                })
                .collect()
        })
    }
}

//! Declarative capability descriptors.
//!
//! A [`Descriptor`] turns an untyped wire [`Capability`] into a typed,
//! validated value by running library-supplied closures: one parsing the
//! `with`-URI, an ordered set parsing each named `nb` caveat, and one
//! deciding whether a claimed value is entailed by a delegated one.

use crate::error::{EscalationReason, MalformedReason};
use dialog_ucan::{Ability, Capability, Resource};
use ipld_core::ipld::Ipld;
use std::collections::BTreeMap;
use std::sync::Arc;

type ParseFn<V> = Arc<dyn Fn(&Capability) -> Result<V, MalformedReason> + Send + Sync>;
type WithParseFn<W> = Arc<dyn Fn(&Resource) -> Result<W, MalformedReason> + Send + Sync>;
type CaveatParseFn<N> = Arc<dyn Fn(&Ipld) -> Result<N, MalformedReason> + Send + Sync>;
type DerivesFn<V> = Arc<dyn Fn(&V, &V) -> Result<(), EscalationReason> + Send + Sync>;

/// A parser for one named `nb` caveat, per §4.E's "ordered map of named
/// caveat parsers". A capability that omits the named key simply has no
/// entry in the parsed `nb` map — caveats are optional unless `build`
/// rejects their absence.
pub struct Caveat<N> {
    name: String,
    parser: CaveatParseFn<N>,
}

impl<N> Caveat<N> {
    /// Declare a parser for the `nb[name]` caveat.
    pub fn new(
        name: impl Into<String>,
        parser: impl Fn(&Ipld) -> Result<N, MalformedReason> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parser: Arc::new(parser),
        }
    }
}

/// Declares how a single concrete ability's capability is parsed and how a
/// claim against it is derived from a delegated one.
///
/// `can` is always concrete: pattern matching against wildcard abilities
/// carried by proofs is the province of [`crate::ability::match_ability`]
/// and the validator, not of a single descriptor.
pub struct Descriptor<V> {
    /// The concrete ability this descriptor recognizes.
    pub can: Ability,
    parse: ParseFn<V>,
    derives: DerivesFn<V>,
}

impl<V> Descriptor<V> {
    /// Build a descriptor with no caveats: `with` parses the capability's
    /// `with`-URI directly into `V`.
    pub fn new(
        can: Ability,
        with: impl Fn(&Resource) -> Result<V, MalformedReason> + Send + Sync + 'static,
        derives: impl Fn(&V, &V) -> Result<(), EscalationReason> + Send + Sync + 'static,
    ) -> Self
    where
        V: 'static,
    {
        Self::with_caveats(can, with, Vec::new(), |with, _nb: BTreeMap<String, Ipld>| with, derives)
    }

    /// Build a descriptor per §4.E: a `with`-URI parser, an ordered set of
    /// named `nb` caveat parsers, and a `build` step combining the parsed
    /// `with` value and the parsed `nb` map into `V`.
    pub fn with_caveats<W, N>(
        can: Ability,
        with: impl Fn(&Resource) -> Result<W, MalformedReason> + Send + Sync + 'static,
        nb_parsers: Vec<Caveat<N>>,
        build: impl Fn(W, BTreeMap<String, N>) -> V + Send + Sync + 'static,
        derives: impl Fn(&V, &V) -> Result<(), EscalationReason> + Send + Sync + 'static,
    ) -> Self
    where
        W: 'static,
        N: 'static,
        V: 'static,
    {
        let with: WithParseFn<W> = Arc::new(with);
        let parse = move |capability: &Capability| -> Result<V, MalformedReason> {
            let parsed_with = with(&capability.with)?;
            let mut parsed_nb = BTreeMap::new();
            for caveat in &nb_parsers {
                if let Some(raw) = capability.nb.get(&caveat.name) {
                    parsed_nb.insert(caveat.name.clone(), (caveat.parser)(raw)?);
                }
            }
            Ok(build(parsed_with, parsed_nb))
        };
        Self {
            can,
            parse: Arc::new(parse),
            derives: Arc::new(derives),
        }
    }

    /// Attempt to parse `capability` against this descriptor.
    ///
    /// Returns `None` if `capability.can` does not equal [`Self::can`] —
    /// the source is `Unknown` to this descriptor, not malformed.
    pub fn parse(&self, capability: &Capability) -> Option<Result<V, MalformedReason>> {
        if capability.can != self.can {
            return None;
        }
        Some((self.parse)(capability))
    }

    pub(crate) fn derives_fn(&self) -> DerivesFn<V> {
        Arc::clone(&self.derives)
    }
}

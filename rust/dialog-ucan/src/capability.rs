//! Capability triples.
//!
//! `Capability` is plain data here; the parsing/matching/derivation rules
//! that turn raw capabilities into typed, validated values live in
//! `dialog-capability` (components E/F), which depends on this crate for
//! the wire type.

use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use url::Url;

/// Additional structured constraints on a capability ("not-before-constraints").
pub type Caveats = BTreeMap<String, Ipld>;

/// An action identifier, with two levels of wildcard.
///
/// Wire form is the plain `can` string: `"store/add"`, `"store/*"`, `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ability {
    /// A fully-qualified `namespace/verb` ability.
    Concrete(String),
    /// A single trailing segment wildcard, e.g. `store/*`. Stores the
    /// namespace prefix without the trailing `/*`.
    Segment(String),
    /// The universal wildcard `*`.
    Any,
}

impl Ability {
    /// Parse a raw `can` string into an [`Ability`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "*" {
            Self::Any
        } else if let Some(prefix) = raw.strip_suffix("/*") {
            Self::Segment(prefix.to_string())
        } else {
            Self::Concrete(raw.to_string())
        }
    }

    /// Render back to the wire-form `can` string.
    #[must_use]
    pub fn as_wire_string(&self) -> String {
        match self {
            Self::Concrete(s) => s.clone(),
            Self::Segment(prefix) => format!("{prefix}/*"),
            Self::Any => "*".to_string(),
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire_string())
    }
}

impl FromStr for Ability {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(raw))
    }
}

impl Serialize for Ability {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire_string())
    }
}

impl<'de> Deserialize<'de> for Ability {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// The resource a capability is `with`: an absolute URI, or the meta-resource
/// `ucan:*` signifying "all proofs the issuer holds".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// An absolute URI naming a concrete resource.
    Uri(Url),
    /// `ucan:*` — re-delegation of whatever the issuer itself holds proof of.
    UcanStar,
}

/// The `with` string did not parse as a URI, and was not `ucan:*`.
#[derive(Debug, thiserror::Error)]
#[error("malformed resource URI: {0}")]
pub struct MalformedResource(#[from] url::ParseError);

impl Resource {
    /// Parse a raw `with` string.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedResource`] if the string is neither `ucan:*` nor a
    /// valid absolute URI.
    pub fn parse(raw: &str) -> Result<Self, MalformedResource> {
        if raw == "ucan:*" {
            Ok(Self::UcanStar)
        } else {
            Ok(Self::Uri(Url::parse(raw)?))
        }
    }

    /// Render back to the wire-form `with` string.
    #[must_use]
    pub fn as_wire_string(&self) -> String {
        match self {
            Self::Uri(url) => url.to_string(),
            Self::UcanStar => "ucan:*".to_string(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire_string())
    }
}

impl Serialize for Resource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire_string())
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// `{ can, with, nb? }` — permission to perform `can` on `with`, subject to `nb`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// The ability being granted.
    pub can: Ability,

    /// The resource the ability applies to.
    pub with: Resource,

    /// Additional structured constraints. Absent on the wire when empty.
    #[serde(default, skip_serializing_if = "Caveats::is_empty")]
    pub nb: Caveats,
}

impl Capability {
    /// Construct a capability with no caveats.
    #[must_use]
    pub fn new(can: Ability, with: Resource) -> Self {
        Self {
            can,
            with,
            nb: Caveats::new(),
        }
    }

    /// Construct a capability with caveats attached.
    #[must_use]
    pub const fn with_caveats(can: Ability, with: Resource, nb: Caveats) -> Self {
        Self { can, with, nb }
    }

    /// Whether this capability's resource is the `ucan:*` re-delegation
    /// meta-resource, used to express re-delegation.
    #[must_use]
    pub const fn is_redelegation(&self) -> bool {
        matches!(self.with, Resource::UcanStar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_round_trips_concrete() {
        assert_eq!(Ability::parse("store/add").as_wire_string(), "store/add");
    }

    #[test]
    fn ability_round_trips_segment_wildcard() {
        let ability = Ability::parse("store/*");
        assert_eq!(ability, Ability::Segment("store".to_string()));
        assert_eq!(ability.as_wire_string(), "store/*");
    }

    #[test]
    fn ability_round_trips_any() {
        assert_eq!(Ability::parse("*"), Ability::Any);
    }

    #[test]
    fn resource_parses_ucan_star() {
        assert_eq!(Resource::parse("ucan:*").unwrap(), Resource::UcanStar);
    }

    #[test]
    fn resource_rejects_malformed_uri() {
        assert!(Resource::parse("not a uri").is_err());
    }

    #[test]
    fn capability_serializes_without_empty_nb() {
        let cap = Capability::new(
            Ability::parse("store/add"),
            Resource::parse("https://example.com/alice").unwrap(),
        );
        let encoded = serde_json::to_value(&cap).unwrap();
        assert!(encoded.get("nb").is_none());
    }
}

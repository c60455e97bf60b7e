//! Spec-id/version tagging for envelope payloads.

/// A payload that identifies itself within a Varsig envelope by a
/// `spec_id`/`version` pair, e.g. `ucan@0.9.1`.
///
/// The envelope uses [`PayloadTag::tag`] as the map key under which the
/// payload is nested (`{"h": ..., "ucan@0.9.1": ...}`), and the same pair
/// forms the archive descriptor key.
pub trait PayloadTag {
    /// Short identifier for this payload kind, e.g. `"ucan"`.
    fn spec_id() -> &'static str;

    /// Version string, e.g. `"0.9.1"`.
    fn version() -> &'static str;

    /// The combined `<spec_id>@<version>` tag used as the envelope's map key.
    fn tag() -> String {
        format!("{}@{}", Self::spec_id(), Self::version())
    }
}

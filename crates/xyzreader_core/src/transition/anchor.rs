//! Anchor naming for shared-element transitions.

use crate::error::RecoveredError;
use crate::model::article::ArticleId;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};

pub const ANCHOR_PREFIX: &str = "transition:";

/// Name of the visual element matched across both screens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnchorName(String);

impl AnchorName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a name produced by [`anchor_name`] back into its article id.
    pub fn parse(value: &str) -> Option<Self> {
        let raw_id = value.strip_prefix(ANCHOR_PREFIX)?;
        raw_id.parse::<i64>().ok().map(|id| anchor_name(ArticleId(id)))
    }

    pub fn article_id(&self) -> Option<ArticleId> {
        self.0
            .strip_prefix(ANCHOR_PREFIX)
            .and_then(|raw_id| raw_id.parse::<i64>().ok())
            .map(ArticleId)
    }
}

impl Display for AnchorName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the anchor name for one article.
pub fn anchor_name(id: ArticleId) -> AnchorName {
    AnchorName(format!("{ANCHOR_PREFIX}{id}"))
}

/// Anchors currently carried by materialized on-screen elements.
pub trait AnchorTargets {
    fn has_anchor(&self, anchor: &AnchorName) -> bool;
}

impl AnchorTargets for HashSet<AnchorName> {
    fn has_anchor(&self, anchor: &AnchorName) -> bool {
        self.contains(anchor)
    }
}

impl AnchorTargets for BTreeSet<AnchorName> {
    fn has_anchor(&self, anchor: &AnchorName) -> bool {
        self.contains(anchor)
    }
}

impl AnchorTargets for [AnchorName] {
    fn has_anchor(&self, anchor: &AnchorName) -> bool {
        self.contains(anchor)
    }
}

/// Keeps `anchor` only when an on-screen element carries it.
pub fn confirm_anchor<T>(anchor: AnchorName, targets: &T) -> Result<AnchorName, RecoveredError>
where
    T: AnchorTargets + ?Sized,
{
    if targets.has_anchor(&anchor) {
        Ok(anchor)
    } else {
        Err(RecoveredError::AnchorNotMaterialized(anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::{anchor_name, confirm_anchor, AnchorName};
    use crate::error::RecoveredError;
    use crate::model::article::ArticleId;
    use std::collections::HashSet;

    #[test]
    fn anchor_name_is_prefixed_id() {
        assert_eq!(anchor_name(ArticleId(42)).as_str(), "transition:42");
        assert_eq!(anchor_name(ArticleId(42)), anchor_name(ArticleId(42)));
        assert_ne!(anchor_name(ArticleId(4)), anchor_name(ArticleId(42)));
    }

    #[test]
    fn parse_accepts_only_generated_names() {
        let parsed = AnchorName::parse("transition:7").unwrap();
        assert_eq!(parsed.article_id(), Some(ArticleId(7)));
        assert!(AnchorName::parse("thumbnail:7").is_none());
        assert!(AnchorName::parse("transition:seven").is_none());
    }

    #[test]
    fn confirm_rejects_unmaterialized_anchor() {
        let targets: HashSet<AnchorName> = [anchor_name(ArticleId(1))].into_iter().collect();
        assert!(confirm_anchor(anchor_name(ArticleId(1)), &targets).is_ok());
        assert_eq!(
            confirm_anchor(anchor_name(ArticleId(2)), &targets),
            Err(RecoveredError::AnchorNotMaterialized(anchor_name(
                ArticleId(2)
            )))
        );
    }
}

//! Canonical entity mapping for raw keyword phrases.
//!
//! Maps a raw string from any connector to the entity a trend is tracked
//! under. Matching is substring containment, not whole-word, and the color
//! vocabulary is checked before the item vocabulary — "beige trenchcoat"
//! maps to the color, not the item.

use serde::{Deserialize, Serialize};

/// Colors tracked as first-class entities.
const COLORS: &[&str] = &[
    "black", "white", "beige", "navy", "olive", "cream", "red", "brown", "gray", "green",
];

/// Apparel items tracked as first-class entities. "trench" precedes
/// "trenchcoat", so the shorter form wins on containment.
const ITEMS: &[&str] = &[
    "dress",
    "blazer",
    "trench",
    "trenchcoat",
    "loafer",
    "loafers",
    "knit",
    "cargo",
    "tote",
    "denim",
    "skirt",
    "sneaker",
];

/// Generic terms that carry no trend information on their own. Keywords
/// normalizing to one of these are rejected and excluded from aggregation.
const STOP_TERMS: &[&str] = &["designer", "brand", "fashion", "style", "outfit"];

/// Semantic category of a mapped entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Hashtag,
    Color,
    Item,
    Topic,
}

impl EntityType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Hashtag => "hashtag",
            EntityType::Color => "color",
            EntityType::Item => "item",
            EntityType::Topic => "topic",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw string resolved to its canonical entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedEntity {
    pub entity: String,
    pub kind: EntityType,
}

/// True when the lowercased, trimmed keyword is a stop term.
#[must_use]
pub fn is_stop_term(keyword: &str) -> bool {
    STOP_TERMS.contains(&keyword)
}

/// The tracked color vocabulary, for whole-word matching in the
/// uploaded-dataset scorer.
#[must_use]
pub fn color_terms() -> &'static [&'static str] {
    COLORS
}

/// The tracked apparel-item vocabulary.
#[must_use]
pub fn item_terms() -> &'static [&'static str] {
    ITEMS
}

/// Map a raw keyword/phrase to its canonical entity, first match wins:
/// hashtag, stop-term rejection, color containment, item containment,
/// topic fallback.
///
/// Returns `None` for stop terms and for strings that normalize to empty.
#[must_use]
pub fn map_entity(raw: &str) -> Option<MappedEntity> {
    let k = raw.trim().to_lowercase();
    if k.is_empty() {
        return None;
    }
    if k.starts_with('#') {
        return Some(MappedEntity {
            entity: k,
            kind: EntityType::Hashtag,
        });
    }
    if is_stop_term(&k) {
        return None;
    }
    for color in COLORS {
        if k.contains(color) {
            return Some(MappedEntity {
                entity: (*color).to_string(),
                kind: EntityType::Color,
            });
        }
    }
    for item in ITEMS {
        if k.contains(item) {
            return Some(MappedEntity {
                entity: (*item).to_string(),
                kind: EntityType::Item,
            });
        }
    }
    Some(MappedEntity {
        entity: k,
        kind: EntityType::Topic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(raw: &str) -> MappedEntity {
        map_entity(raw).expect("expected a mapped entity")
    }

    #[test]
    fn hashtag_keeps_full_lowercased_tag() {
        let m = mapped("#QuietLuxury");
        assert_eq!(m.entity, "#quietluxury");
        assert_eq!(m.kind, EntityType::Hashtag);
    }

    #[test]
    fn stop_terms_are_rejected() {
        for term in ["designer", "Brand", "  fashion  ", "STYLE", "outfit"] {
            assert!(map_entity(term).is_none(), "{term} should be rejected");
        }
    }

    #[test]
    fn color_wins_over_item_when_both_contained() {
        let m = mapped("beige trenchcoat");
        assert_eq!(m.entity, "beige");
        assert_eq!(m.kind, EntityType::Color);
    }

    #[test]
    fn item_matched_by_containment() {
        let m = mapped("vintage loafers sale");
        assert_eq!(m.entity, "loafer");
        assert_eq!(m.kind, EntityType::Item);
    }

    #[test]
    fn unknown_phrase_falls_back_to_topic() {
        let m = mapped("  Quiet Luxury ");
        assert_eq!(m.entity, "quiet luxury");
        assert_eq!(m.kind, EntityType::Topic);
    }

    #[test]
    fn empty_string_maps_to_nothing() {
        assert!(map_entity("").is_none());
        assert!(map_entity("   ").is_none());
    }
}

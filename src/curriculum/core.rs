use crate::error::UnknownTier;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Shown in place of a meaning the catalog does not provide.
pub const PLACEHOLDER_MEANING: &str = "Meaning not available";

/// Identifier of a curriculum tier ("1".."6", "S").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TierId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable identifier of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single character in the curriculum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub glyph: String,
    pub tier: TierId,
    pub meaning: String,
    pub meanings: Vec<String>,
    pub strokes: Option<u32>,
    pub radical: Option<String>,
    pub old_form: Option<String>,
    pub year_added: Option<u32>,
    pub readings_on: Vec<String>,
    pub readings_kun: Vec<String>,
}

impl Item {
    /// Whether the meaning can be used as an answer choice.
    pub fn has_usable_meaning(&self) -> bool {
        !self.meaning.is_empty() && self.meaning != PLACEHOLDER_MEANING
    }
}

/// Static description of a tier, before items are assigned to it.
#[derive(Debug, Clone, Copy)]
pub struct TierDef {
    pub id: &'static str,
    pub label: &'static str,
    pub note: &'static str,
}

/// School-grade ladder of the Joyo list. The last entry is the catch-all tier.
pub const JOYO_TIERS: &[TierDef] = &[
    TierDef {
        id: "1",
        label: "Grade 1",
        note: "Intro basics",
    },
    TierDef {
        id: "2",
        label: "Grade 2",
        note: "Early literacy",
    },
    TierDef {
        id: "3",
        label: "Grade 3",
        note: "Building fluency",
    },
    TierDef {
        id: "4",
        label: "Grade 4",
        note: "Mid-level practice",
    },
    TierDef {
        id: "5",
        label: "Grade 5",
        note: "Upper elementary",
    },
    TierDef {
        id: "6",
        label: "Grade 6",
        note: "Advanced elementary",
    },
    TierDef {
        id: "S",
        label: "Secondary (S)",
        note: "Junior high +",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tier {
    pub id: TierId,
    pub label: String,
    pub note: String,
    /// Position in the tier order, 0 for the first tier.
    pub rank: usize,
    pub item_ids: Vec<ItemId>,
}

/// Library filter over the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierFilter {
    All,
    Tier(TierId),
}

/// Indexed, immutable view of the item catalog.
#[derive(Debug, Clone)]
pub struct Curriculum {
    tiers: Vec<Tier>,
    items: Vec<Item>,
    item_index: HashMap<ItemId, usize>,
    tier_index: HashMap<TierId, usize>,
}

impl Curriculum {
    /// Build the index. Every item must already carry a tier from `defs`.
    pub(crate) fn from_parts(defs: &[TierDef], items: Vec<Item>) -> Self {
        let tier_index: HashMap<TierId, usize> = defs
            .iter()
            .enumerate()
            .map(|(rank, def)| (TierId::from(def.id), rank))
            .collect();

        let mut tiers: Vec<Tier> = defs
            .iter()
            .enumerate()
            .map(|(rank, def)| Tier {
                id: TierId::from(def.id),
                label: def.label.to_string(),
                note: def.note.to_string(),
                rank,
                item_ids: Vec::new(),
            })
            .collect();

        let mut item_index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            item_index.insert(item.id, pos);
            if let Some(&rank) = tier_index.get(&item.tier) {
                tiers[rank].item_ids.push(item.id);
            }
        }

        Self {
            tiers,
            items,
            item_index,
            tier_index,
        }
    }

    /// Tiers in ladder order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier(&self, id: &TierId) -> Result<&Tier, UnknownTier> {
        self.tier_index
            .get(id)
            .map(|&rank| &self.tiers[rank])
            .ok_or_else(|| UnknownTier(id.clone()))
    }

    pub fn contains_tier(&self, id: &TierId) -> bool {
        self.tier_index.contains_key(id)
    }

    pub fn first_tier(&self) -> &Tier {
        &self.tiers[0]
    }

    /// The tier right after `id` in the ladder, if any.
    pub fn next_tier(&self, id: &TierId) -> Option<&Tier> {
        self.tier_index
            .get(id)
            .and_then(|&rank| self.tiers.get(rank + 1))
    }

    pub fn rank(&self, id: &TierId) -> Option<usize> {
        self.tier_index.get(id).copied()
    }

    /// Display label for a tier, with a fallback for ids outside the ladder.
    pub fn tier_label(&self, id: &TierId) -> String {
        match self.tier(id) {
            Ok(tier) => tier.label.clone(),
            Err(_) => format!("Grade {id}"),
        }
    }

    pub fn items_in_tier(&self, id: &TierId) -> Result<Vec<&Item>, UnknownTier> {
        let tier = self.tier(id)?;
        Ok(tier
            .item_ids
            .iter()
            .filter_map(|item_id| self.item(*item_id))
            .collect())
    }

    pub fn all_items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.item_index.get(&id).map(|&pos| &self.items[pos])
    }

    /// Items in `id` whose meaning can be quizzed.
    pub fn usable_items_in(&self, id: &TierId) -> Result<Vec<&Item>, UnknownTier> {
        Ok(self
            .items_in_tier(id)?
            .into_iter()
            .filter(|item| item.has_usable_meaning())
            .collect())
    }

    /// How many items in `id` a quiz can ask, i.e. the most that can be mastered by playing.
    pub fn usable_count(&self, id: &TierId) -> Result<usize, UnknownTier> {
        self.count_in_tier(id, |item_id| {
            self.item(item_id)
                .is_some_and(|item| item.has_usable_meaning())
        })
    }

    /// Quizzable items across the whole catalog.
    pub fn usable_items(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.has_usable_meaning())
            .collect()
    }

    /// Number of items per tier, in ladder order.
    pub fn tier_counts(&self) -> Vec<(TierId, usize)> {
        self.tiers
            .iter()
            .map(|tier| (tier.id.clone(), tier.item_ids.len()))
            .collect()
    }

    pub fn filter(&self, filter: &TierFilter) -> Result<Vec<&Item>, UnknownTier> {
        match filter {
            TierFilter::All => Ok(self.items.iter().collect()),
            TierFilter::Tier(id) => self.items_in_tier(id),
        }
    }

    /// Count of items in `id` that satisfy `pred`, e.g. "is mastered".
    pub fn count_in_tier<F>(&self, id: &TierId, pred: F) -> Result<usize, UnknownTier>
    where
        F: Fn(ItemId) -> bool,
    {
        let tier = self.tier(id)?;
        Ok(tier.item_ids.iter().filter(|item_id| pred(**item_id)).count())
    }

    /// Distinct usable meanings among `items`, keeping first-seen order.
    pub fn distinct_meanings<'a>(items: &[&'a Item]) -> Vec<&'a str> {
        items
            .iter()
            .filter(|item| item.has_usable_meaning())
            .map(|item| item.meaning.as_str())
            .unique()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, glyph: &str, tier: &str, meaning: &str) -> Item {
        Item {
            id: ItemId(id),
            glyph: glyph.to_string(),
            tier: TierId::from(tier),
            meaning: meaning.to_string(),
            meanings: Vec::new(),
            strokes: None,
            radical: None,
            old_form: None,
            year_added: None,
            readings_on: Vec::new(),
            readings_kun: Vec::new(),
        }
    }

    fn small_curriculum() -> Curriculum {
        Curriculum::from_parts(
            JOYO_TIERS,
            vec![
                item(1, "一", "1", "one"),
                item(2, "二", "1", "two"),
                item(3, "引", "2", "pull"),
                item(4, "亜", "S", PLACEHOLDER_MEANING),
            ],
        )
    }

    #[test]
    fn test_tiers_follow_ladder_order() {
        let curriculum = small_curriculum();
        let ids: Vec<&str> = curriculum.tiers().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "S"]);
        assert_eq!(curriculum.first_tier().id.as_str(), "1");
        assert_eq!(curriculum.rank(&"S".into()), Some(6));
    }

    #[test]
    fn test_items_in_tier() {
        let curriculum = small_curriculum();
        let grade1 = curriculum.items_in_tier(&"1".into()).unwrap();
        assert_eq!(grade1.len(), 2);
        assert!(curriculum.items_in_tier(&"3".into()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let curriculum = small_curriculum();
        let err = curriculum.items_in_tier(&"7".into()).unwrap_err();
        assert_eq!(err, UnknownTier("7".into()));
    }

    #[test]
    fn test_next_tier() {
        let curriculum = small_curriculum();
        assert_eq!(curriculum.next_tier(&"1".into()).unwrap().id.as_str(), "2");
        assert!(curriculum.next_tier(&"S".into()).is_none());
    }

    #[test]
    fn test_tier_label_fallback() {
        let curriculum = small_curriculum();
        assert_eq!(curriculum.tier_label(&"S".into()), "Secondary (S)");
        assert_eq!(curriculum.tier_label(&"9".into()), "Grade 9");
    }

    #[test]
    fn test_placeholder_meaning_is_not_usable() {
        let curriculum = small_curriculum();
        assert!(curriculum.usable_items_in(&"S".into()).unwrap().is_empty());
        assert_eq!(curriculum.usable_items().len(), 3);
    }

    #[test]
    fn test_usable_count_skips_placeholders() {
        let curriculum = small_curriculum();
        assert_eq!(curriculum.usable_count(&"1".into()), Ok(2));
        assert_eq!(curriculum.usable_count(&"3".into()), Ok(0));
        assert_eq!(curriculum.usable_count(&"S".into()), Ok(0));
        assert_eq!(curriculum.items_in_tier(&"S".into()).unwrap().len(), 1);
        assert!(curriculum.usable_count(&"X".into()).is_err());
    }

    #[test]
    fn test_tier_counts_and_filter() {
        let curriculum = small_curriculum();
        let counts = curriculum.tier_counts();
        assert_eq!(counts[0], (TierId::from("1"), 2));
        assert_eq!(counts[6], (TierId::from("S"), 1));
        assert_eq!(curriculum.filter(&TierFilter::All).unwrap().len(), 4);
        assert_eq!(
            curriculum
                .filter(&TierFilter::Tier("2".into()))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_distinct_meanings() {
        let a = item(1, "a", "1", "same");
        let b = item(2, "b", "1", "same");
        let c = item(3, "c", "1", "other");
        let meanings = Curriculum::distinct_meanings(&[&a, &b, &c]);
        assert_eq!(meanings, vec!["same", "other"]);
    }
}

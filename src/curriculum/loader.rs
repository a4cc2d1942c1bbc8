use super::core::{Curriculum, Item, ItemId, TierDef, TierId, JOYO_TIERS, PLACEHOLDER_MEANING};
use crate::error::CurriculumError;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/curriculum/data");

const EMBEDDED_CATALOG: &str = "joyo.json";

/// Grades show up both as strings ("1", "S") and as bare numbers.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
enum GradeValue {
    Number(u64),
    Text(String),
}

impl GradeValue {
    fn into_string(self) -> String {
        match self {
            GradeValue::Number(n) => n.to_string(),
            GradeValue::Text(s) => s.trim().to_string(),
        }
    }
}

/// One entry of the catalog feed, as loosely shaped as the source data.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct CatalogRecord {
    id: Option<u32>,
    #[serde(alias = "kanji")]
    glyph: Option<String>,
    #[serde(alias = "grade")]
    tier: Option<GradeValue>,
    meaning: Option<String>,
    #[serde(default)]
    meanings: Vec<String>,
    strokes: Option<u32>,
    radical: Option<String>,
    #[serde(alias = "old")]
    old_form: Option<String>,
    year_added: Option<u32>,
    #[serde(default)]
    readings_on: Vec<String>,
    #[serde(default)]
    readings_kun: Vec<String>,
}

impl Curriculum {
    /// The Joyo sample catalog compiled into the crate.
    pub fn embedded() -> Result<Self, CurriculumError> {
        let file = DATA_DIR.get_file(EMBEDDED_CATALOG).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("embedded catalog {EMBEDDED_CATALOG} missing"),
            )
        })?;
        let contents = file.contents_utf8().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "embedded catalog is not UTF-8",
            )
        })?;
        Self::from_json_str(contents)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CurriculumError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a JSON array of catalog records against the Joyo tier ladder.
    pub fn from_json_str(json: &str) -> Result<Self, CurriculumError> {
        Self::from_json_str_with_tiers(json, JOYO_TIERS)
    }

    pub fn from_json_str_with_tiers(
        json: &str,
        defs: &[TierDef],
    ) -> Result<Self, CurriculumError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
        Self::from_records(records, defs)
    }

    fn from_records(
        records: Vec<CatalogRecord>,
        defs: &[TierDef],
    ) -> Result<Self, CurriculumError> {
        let Some(terminal) = defs.last() else {
            return Err(CurriculumError::Empty);
        };
        let known: HashSet<&str> = defs.iter().map(|d| d.id).collect();

        let mut seen = HashSet::with_capacity(records.len());
        let mut items = Vec::with_capacity(records.len());

        for (idx, record) in records.into_iter().enumerate() {
            let Some(id) = record_id(record.id, idx) else {
                tracing::warn!("skipping catalog record #{idx}: no id and no room for one");
                continue;
            };

            let Some(glyph) = record
                .glyph
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
            else {
                tracing::warn!("skipping catalog record {id}: no glyph");
                continue;
            };
            if !seen.insert(id) {
                return Err(CurriculumError::DuplicateItem(id));
            }

            let tier = match record.tier.map(GradeValue::into_string) {
                Some(t) if known.contains(t.as_str()) => TierId::new(t),
                Some(t) if !t.is_empty() => {
                    tracing::warn!(
                        "item {id} has unknown grade `{t}`, filing under {}",
                        terminal.id
                    );
                    TierId::from(terminal.id)
                }
                _ => TierId::from(terminal.id),
            };

            items.push(Item {
                id,
                glyph,
                tier,
                meaning: normalize_meaning(record.meaning.as_deref(), &record.meanings),
                meanings: record.meanings,
                strokes: record.strokes,
                radical: record.radical,
                old_form: record.old_form,
                year_added: record.year_added,
                readings_on: record.readings_on,
                readings_kun: record.readings_kun,
            });
        }

        if items.is_empty() {
            return Err(CurriculumError::Empty);
        }
        Ok(Curriculum::from_parts(defs, items))
    }
}

/// Explicit id, else the record's 1-based position when it fits in a `u32`.
fn record_id(explicit: Option<u32>, idx: usize) -> Option<ItemId> {
    explicit
        .or_else(|| idx.checked_add(1).and_then(|n| u32::try_from(n).ok()))
        .map(ItemId)
}

/// Blank meanings fall back to the first listed alternative, then the placeholder.
fn normalize_meaning(meaning: Option<&str>, alternatives: &[String]) -> String {
    meaning
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or_else(|| {
            alternatives
                .iter()
                .map(|m| m.trim())
                .find(|m| !m.is_empty())
        })
        .unwrap_or(PLACEHOLDER_MEANING)
        .to_string()
}

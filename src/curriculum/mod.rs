//! The static item catalog, indexed by tier.

pub mod core;
pub mod loader;

pub use core::{
    Curriculum, Item, ItemId, Tier, TierDef, TierFilter, TierId, JOYO_TIERS, PLACEHOLDER_MEANING,
};

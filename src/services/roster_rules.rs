use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dto::asset_dto::AssetType;

/// Upper bound for any single slot count in a layout.
pub const MAX_SLOTS_PER_CATEGORY: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{slot} allows at most {max} slots, got {count}", max = MAX_SLOTS_PER_CATEGORY)]
    TooManySlots { slot: &'static str, count: u32 },
    #[error("roster layout has no slots")]
    Empty,
}

/// Slot capacity for one team. Category slots only take their own category,
/// flex slots take anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterLayout {
    pub manufacturer: u32,
    pub cannabis_strain: u32,
    pub product: u32,
    pub pharmacy: u32,
    pub brand: u32,
    pub flex: u32,
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self {
            manufacturer: 2,
            cannabis_strain: 2,
            product: 2,
            pharmacy: 2,
            brand: 1,
            flex: 1,
        }
    }
}

impl RosterLayout {
    /// Layouts arrive from clients; a draft needs at least one slot and
    /// every count within bounds.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let slots = [
            ("manufacturer", self.manufacturer),
            ("cannabis_strain", self.cannabis_strain),
            ("product", self.product),
            ("pharmacy", self.pharmacy),
            ("brand", self.brand),
            ("flex", self.flex),
        ];
        if let Some((slot, count)) = slots.into_iter().find(|(_, n)| *n > MAX_SLOTS_PER_CATEGORY) {
            return Err(LayoutError::TooManySlots { slot, count });
        }
        if self.slots_per_team() == 0 {
            return Err(LayoutError::Empty);
        }
        Ok(())
    }

    pub fn category_max(&self, asset_type: AssetType) -> u32 {
        match asset_type {
            AssetType::Manufacturer => self.manufacturer,
            AssetType::CannabisStrain => self.cannabis_strain,
            AssetType::Product => self.product,
            AssetType::Pharmacy => self.pharmacy,
            AssetType::Brand => self.brand,
        }
    }

    /// Picks each team makes over the whole draft.
    pub fn slots_per_team(&self) -> i64 {
        let category: i64 = AssetType::ALL.iter().map(|t| i64::from(self.category_max(*t))).sum();
        category + i64::from(self.flex)
    }

    /// Flex slots already consumed by overflow from full categories.
    pub fn flex_used(&self, counts: &SlotCounts) -> u32 {
        AssetType::ALL
            .iter()
            .map(|t| counts.get(*t).saturating_sub(self.category_max(*t)))
            .sum()
    }

    /// Whether a team holding `counts` still has a slot that can take `asset_type`.
    pub fn can_hold(&self, counts: &SlotCounts, asset_type: AssetType) -> bool {
        if i64::from(counts.total()) >= self.slots_per_team() {
            return false;
        }
        counts.get(asset_type) < self.category_max(asset_type) || self.flex_used(counts) < self.flex
    }
}

/// Roster entries a team holds, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotCounts(BTreeMap<AssetType, u32>);

impl SlotCounts {
    pub fn get(&self, asset_type: AssetType) -> u32 {
        self.0.get(&asset_type).copied().unwrap_or(0)
    }

    pub fn add(&mut self, asset_type: AssetType, n: u32) {
        *self.0.entry(asset_type).or_insert(0) += n;
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }
}

impl FromIterator<(AssetType, u32)> for SlotCounts {
    fn from_iter<I: IntoIterator<Item = (AssetType, u32)>>(iter: I) -> Self {
        let mut counts = SlotCounts::default();
        for (t, n) in iter {
            counts.add(t, n);
        }
        counts
    }
}

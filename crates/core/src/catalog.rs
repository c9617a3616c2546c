//! The declarative module catalog.
//!
//! The original screens each re-declared their own key lists; this table is
//! the single place the parent/leaf mapping lives. The aggregator and the
//! overview screens consult it instead of hard-coding keys.

use crate::model::ModuleKey;

/// A module (or submodule) card entry: key plus display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    key: ModuleKey,
    label: &'static str,
}

impl CatalogEntry {
    #[must_use]
    pub fn key(&self) -> &ModuleKey {
        &self.key
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

const TRAINING_MODULES: [(&str, &str); 6] = [
    ("floor", "Floor Cleaning"),
    ("duct", "Duct Cleaning"),
    ("flood", "Flood Restoration"),
    ("truck", "Truck Maintenance"),
    ("safety", "Safety / OSHA"),
    ("equip", "Equipment"),
];

// Ordered leaf keys under the Floor Cleaning parent. The parent card's
// percent is the mean over exactly this list.
const FLOOR_SUBMODULES: [(&str, &str); 10] = [
    ("residential", "Residential"),
    ("commercial", "Commercial"),
    ("rugs", "Area Rugs"),
    ("stairs", "Stairs"),
    ("upholstery", "Upholstery"),
    ("ceramic", "Ceramic Flooring"),
    ("wood", "Wood Flooring"),
    ("stripwax", "Strip & Wax"),
    ("vinyl", "Vinyl"),
    ("additional", "Additional Services"),
];

fn entries(table: &[(&'static str, &'static str)]) -> Vec<CatalogEntry> {
    table
        .iter()
        .map(|&(key, label)| CatalogEntry {
            key: ModuleKey::from_static(key),
            label,
        })
        .collect()
}

/// Top-level cards on the training screen, in display order.
#[must_use]
pub fn training_modules() -> Vec<CatalogEntry> {
    entries(&TRAINING_MODULES)
}

/// Submodule cards under a parent, or `None` for a leaf module.
#[must_use]
pub fn submodules_of(parent: &ModuleKey) -> Option<Vec<CatalogEntry>> {
    match parent.as_str() {
        "floor" => Some(entries(&FLOOR_SUBMODULES)),
        _ => None,
    }
}

/// Ordered leaf keys whose mean is the parent's displayed percent, or `None`
/// when the module tracks its own row directly.
#[must_use]
pub fn leaf_keys(parent: &ModuleKey) -> Option<Vec<ModuleKey>> {
    submodules_of(parent).map(|subs| subs.into_iter().map(|e| e.key).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_has_ten_ordered_leaves() {
        let floor = ModuleKey::from_static("floor");
        let leaves = leaf_keys(&floor).unwrap();
        assert_eq!(leaves.len(), 10);
        assert_eq!(leaves[0].as_str(), "residential");
        assert_eq!(leaves[9].as_str(), "additional");
    }

    #[test]
    fn leaf_modules_have_no_children() {
        for key in ["duct", "flood", "residential", "stripwax"] {
            assert!(submodules_of(&ModuleKey::from_static(key)).is_none());
        }
    }

    #[test]
    fn every_catalog_key_is_valid() {
        // from_static debug-asserts; walking both tables exercises it.
        assert_eq!(training_modules().len(), 6);
        let floor = ModuleKey::from_static("floor");
        assert_eq!(submodules_of(&floor).unwrap().len(), 10);
    }

    #[test]
    fn labels_match_cards() {
        let modules = training_modules();
        assert_eq!(modules[0].label(), "Floor Cleaning");
        assert_eq!(modules[4].label(), "Safety / OSHA");
    }
}

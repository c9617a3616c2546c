//! Read models for the training and submodule screens.

use serde::Serialize;
use training_core::catalog::{self, CatalogEntry};
use training_core::model::{ModuleKey, ModuleStatus, UserId};
use training_core::rollup::mean_percent;

use crate::progress_service::ProgressService;

/// One card on a training grid, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCard {
    pub key: ModuleKey,
    pub label: &'static str,
    pub percent: u8,
    pub status: ModuleStatus,
    pub has_submodules: bool,
}

/// Builds the card grids, rolling parent percents up from their leaves.
#[derive(Clone)]
pub struct OverviewService {
    progress: ProgressService,
}

impl OverviewService {
    #[must_use]
    pub fn new(progress: ProgressService) -> Self {
        Self { progress }
    }

    /// Top-level training screen: six cards in catalog order. A parent
    /// module's percent is the mean over its leaf rows; leaf modules show
    /// their own row directly.
    pub async fn training_cards(&self, user: UserId) -> Vec<ModuleCard> {
        let entries = catalog::training_modules();

        // One fetch for every row the grid needs, parents' leaves included.
        let mut wanted: Vec<ModuleKey> = Vec::new();
        for entry in &entries {
            match catalog::leaf_keys(entry.key()) {
                Some(leaves) => wanted.extend(leaves),
                None => wanted.push(entry.key().clone()),
            }
        }
        let rows = self.progress.get_progress_bulk(user, &wanted).await;

        entries
            .iter()
            .map(|entry| match catalog::leaf_keys(entry.key()) {
                Some(leaves) => {
                    let percents: Vec<u8> =
                        leaves.iter().map(|key| rows[key].percent()).collect();
                    let percent = mean_percent(&percents);
                    let status = if leaves.iter().all(|key| rows[key].is_complete()) {
                        ModuleStatus::Complete
                    } else if percent > 0 {
                        ModuleStatus::InProgress
                    } else {
                        ModuleStatus::NotStarted
                    };
                    card(entry, percent, status, true)
                }
                None => {
                    let row = &rows[entry.key()];
                    card(entry, row.percent(), row.status(), false)
                }
            })
            .collect()
    }

    /// Submodule screen for a parent, or `None` when the module is a leaf.
    pub async fn submodule_cards(
        &self,
        user: UserId,
        parent: &ModuleKey,
    ) -> Option<Vec<ModuleCard>> {
        let entries = catalog::submodules_of(parent)?;
        let keys: Vec<ModuleKey> = entries.iter().map(|e| e.key().clone()).collect();
        let rows = self.progress.get_progress_bulk(user, &keys).await;

        Some(
            entries
                .iter()
                .map(|entry| {
                    let row = &rows[entry.key()];
                    card(entry, row.percent(), row.status(), false)
                })
                .collect(),
        )
    }
}

fn card(entry: &CatalogEntry, percent: u8, status: ModuleStatus, has_submodules: bool) -> ModuleCard {
    ModuleCard {
        key: entry.key().clone(),
        label: entry.label(),
        percent,
        status,
        has_submodules,
    }
}

//! Badge definitions and unlock state.
//!
//! The earned/locked partition is static for now rather than derived from
//! progress rows; only the locked progress bar percent is computed.

use serde::Serialize;

use crate::rollup::ratio_percent;

/// Unlock state of a badge. Locked badges carry a counter pair that renders
/// as a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BadgeState {
    Earned,
    Locked { current: u32, total: u32 },
}

/// One badge card: static definition plus its unlock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    key: &'static str,
    title: &'static str,
    blurb: &'static str,
    icon: &'static str,
    state: BadgeState,
}

impl Badge {
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        self.title
    }

    #[must_use]
    pub fn blurb(&self) -> &'static str {
        self.blurb
    }

    #[must_use]
    pub fn icon(&self) -> &'static str {
        self.icon
    }

    #[must_use]
    pub fn state(&self) -> BadgeState {
        self.state
    }

    #[must_use]
    pub fn is_earned(&self) -> bool {
        matches!(self.state, BadgeState::Earned)
    }

    /// Progress-bar percent for a locked badge; `None` when earned.
    #[must_use]
    pub fn locked_percent(&self) -> Option<u8> {
        match self.state {
            BadgeState::Earned => None,
            BadgeState::Locked { current, total } => Some(ratio_percent(current, total)),
        }
    }
}

const fn earned(key: &'static str, title: &'static str, blurb: &'static str, icon: &'static str) -> Badge {
    Badge {
        key,
        title,
        blurb,
        icon,
        state: BadgeState::Earned,
    }
}

const fn locked(
    key: &'static str,
    title: &'static str,
    blurb: &'static str,
    icon: &'static str,
    current: u32,
    total: u32,
) -> Badge {
    Badge {
        key,
        title,
        blurb,
        icon,
        state: BadgeState::Locked { current, total },
    }
}

/// The badge wall as shipped: two earned, the rest locked at zero.
#[must_use]
pub fn default_badges() -> Vec<Badge> {
    vec![
        earned(
            "first-module",
            "First Steps",
            "Completed your first training module",
            "ribbon-outline",
        ),
        earned(
            "carpet-legend",
            "Carpet Cleaning Legend",
            "Completed all Floor Cleaning submodules",
            "sparkles-outline",
        ),
        locked(
            "training-marathon",
            "Training Marathon",
            "Complete all company training modules",
            "trophy-outline",
            0,
            50,
        ),
        locked(
            "duct-pro",
            "Duct Pro",
            "Finish Duct Cleaning module",
            "leaf-outline",
            0,
            1,
        ),
        locked(
            "flood-responder",
            "Flood Responder",
            "Finish Flood Restoration module",
            "water-outline",
            0,
            1,
        ),
        locked(
            "floor-complete",
            "Floor Finisher",
            "Finish all Floor Cleaning submodules",
            "briefcase-outline",
            0,
            10,
        ),
        locked(
            "safety-star",
            "Safety Star",
            "Pass the Safety / OSHA module",
            "shield-checkmark-outline",
            0,
            1,
        ),
        locked(
            "equipment-ace",
            "Equipment Ace",
            "Complete Equipment module",
            "construct-outline",
            0,
            1,
        ),
    ]
}

//! Progress math shared by the aggregator, the session state machine, and
//! the quiz engine.
//!
//! Content progress caps at [`CONTENT_PERCENT_CAP`]; the remaining 20% is
//! reserved for the quiz. Finishing the last section parks the row at
//! [`READY_FOR_QUIZ_PERCENT`] until the quiz resolves it to
//! [`PASS_PERCENT`] or knocks it back to [`FAILED_QUIZ_PERCENT`].

/// Percent reached by reading every content section (quiz still pending).
pub const CONTENT_PERCENT_CAP: u8 = 80;

/// Percent persisted when the last section is finished and the quiz unlocks.
pub const READY_FOR_QUIZ_PERCENT: u8 = 90;

/// Percent persisted on a passing quiz submission.
pub const PASS_PERCENT: u8 = 100;

/// Fixed percent persisted on a failing quiz submission.
///
/// Not derived from section position; the module is sent back for review.
pub const FAILED_QUIZ_PERCENT: u8 = 50;

/// Clamps a raw stored percent into the displayable 0..=100 range.
///
/// Stored rows come from a remote table the client does not fully control,
/// so every displayed value goes through this.
#[must_use]
pub fn clamp_percent(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// `round(100 * numer / denom)` with half-up rounding; 0 when `denom == 0`.
#[must_use]
pub fn ratio_percent(numer: u32, denom: u32) -> u8 {
    if denom == 0 {
        return 0;
    }
    let numer = u64::from(numer);
    let denom = u64::from(denom);
    let rounded = (100 * numer * 2 + denom) / (2 * denom);
    clamp_percent(i64::try_from(rounded).unwrap_or(i64::MAX))
}

/// Mean of leaf percents, rounded half-up. Empty input yields 0.
///
/// This is the displayed percent for a parent module card; it is recomputed
/// in full from a bulk fetch on every overview request.
#[must_use]
pub fn mean_percent(percents: &[u8]) -> u8 {
    if percents.is_empty() {
        return 0;
    }
    let sum: u32 = percents.iter().map(|&p| u32::from(p)).sum();
    let n = percents.len() as u64;
    let rounded = (u64::from(sum) * 2 + n) / (2 * n);
    clamp_percent(i64::try_from(rounded).unwrap_or(i64::MAX))
}

/// Percent persisted after landing on `section_index` (0-based) out of
/// `total_sections`: `round(((index + 1) / total) * 80)`.
#[must_use]
pub fn content_percent(section_index: usize, total_sections: usize) -> u8 {
    if total_sections == 0 {
        return 0;
    }
    let done = (section_index + 1).min(total_sections) as u64;
    let total = total_sections as u64;
    let cap = u64::from(CONTENT_PERCENT_CAP);
    let rounded = (done * cap * 2 + total) / (2 * total);
    clamp_percent(i64::try_from(rounded).unwrap_or(i64::MAX))
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

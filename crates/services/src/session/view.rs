use training_core::model::{ModuleOutline, Section};

/// Where the reader currently is within a module session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    /// The module landing page with the overview text.
    Overview,
    /// Reading section `index` (zero-based).
    Section(usize),
    /// All sections read; the quiz is unlocked.
    Quiz,
}

/// Render data for one section page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView<'a> {
    pub section: &'a Section,
    pub position: usize,
    pub total: usize,
    pub is_last: bool,
}

impl<'a> SectionView<'a> {
    pub(crate) fn build(outline: &'a ModuleOutline, index: usize) -> Option<Self> {
        let section = outline.section(index)?;
        let total = outline.section_count();
        Some(Self {
            section,
            position: index + 1,
            total,
            is_last: index + 1 == total,
        })
    }

    /// "Section 2 of 5" style label.
    #[must_use]
    pub fn position_label(&self) -> String {
        format!("Section {} of {}", self.position, self.total)
    }
}

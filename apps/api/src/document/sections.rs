use serde::{Deserialize, Serialize};

use super::ResumeContent;

/// The built-in résumé sections, in their default display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    PersonalInfo,
    Education,
    Experience,
    Skills,
    Projects,
    CoverLetters,
    CustomSections,
}

impl SectionKind {
    pub const DEFAULT_ORDER: [SectionKind; 7] = [
        SectionKind::PersonalInfo,
        SectionKind::Education,
        SectionKind::Experience,
        SectionKind::Skills,
        SectionKind::Projects,
        SectionKind::CoverLetters,
        SectionKind::CustomSections,
    ];

    /// The key used in `sections_order` and in URLs.
    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::PersonalInfo => "personal_info",
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Skills => "skills",
            SectionKind::Projects => "projects",
            SectionKind::CoverLetters => "cover_letters",
            SectionKind::CustomSections => "custom_sections",
        }
    }

    pub fn from_key(key: &str) -> Option<SectionKind> {
        Self::DEFAULT_ORDER.into_iter().find(|kind| kind.key() == key)
    }
}

/// One rendered slot: a built-in section or a single custom section by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum SectionSlot {
    Builtin(SectionKind),
    Custom(String),
}

impl ResumeContent {
    /// Resolves `sections_order` into the sequence of slots to render.
    ///
    /// Entries may name a built-in section, a custom section id, or
    /// `custom_sections` for all custom sections not placed elsewhere.
    /// Unknown entries and repeats are skipped; whatever the order leaves out
    /// follows in default order.
    pub fn display_order(&self) -> Vec<SectionSlot> {
        let mut slots = Vec::new();
        let requested = self.sections_order.as_deref().unwrap_or_default();

        for key in requested {
            match SectionKind::from_key(key) {
                Some(SectionKind::CustomSections) => self.push_remaining_custom(&mut slots),
                Some(kind) => push_unique(&mut slots, SectionSlot::Builtin(kind)),
                None => {
                    if self.custom_sections.iter().any(|s| &s.id == key) {
                        push_unique(&mut slots, SectionSlot::Custom(key.clone()));
                    }
                }
            }
        }

        for kind in SectionKind::DEFAULT_ORDER {
            match kind {
                SectionKind::CustomSections => self.push_remaining_custom(&mut slots),
                _ => push_unique(&mut slots, SectionSlot::Builtin(kind)),
            }
        }
        slots
    }

    fn push_remaining_custom(&self, slots: &mut Vec<SectionSlot>) {
        for section in &self.custom_sections {
            push_unique(slots, SectionSlot::Custom(section.id.clone()));
        }
    }
}

fn push_unique(slots: &mut Vec<SectionSlot>, slot: SectionSlot) {
    if !slots.contains(&slot) {
        slots.push(slot);
    }
}

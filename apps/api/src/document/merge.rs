use serde::{Deserialize, Serialize};

use super::{
    CoverLetter, CustomSection, EducationItem, ExperienceItem, PersonalInfo, ProjectItem,
    ResumeContent, SkillItem,
};

/// A partial document. Each `Some` key replaces the same key of the target;
/// lists are replaced wholesale, never merged element by element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPatch {
    #[serde(default)]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub education: Option<Vec<EducationItem>>,
    #[serde(default)]
    pub experience: Option<Vec<ExperienceItem>>,
    #[serde(default)]
    pub skills: Option<Vec<SkillItem>>,
    #[serde(default)]
    pub projects: Option<Vec<ProjectItem>>,
    #[serde(default)]
    pub cover_letters: Option<Vec<CoverLetter>>,
    #[serde(default)]
    pub custom_sections: Option<Vec<CustomSection>>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub sections_order: Option<Vec<String>>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        *self == ContentPatch::default()
    }
}

impl From<ResumeContent> for ContentPatch {
    /// A patch that replaces every known key of the target.
    fn from(content: ResumeContent) -> Self {
        Self {
            personal_info: content.personal_info,
            education: Some(content.education),
            experience: Some(content.experience),
            skills: Some(content.skills),
            projects: Some(content.projects),
            cover_letters: Some(content.cover_letters),
            custom_sections: Some(content.custom_sections),
            template_id: content.template_id,
            sections_order: content.sections_order,
        }
    }
}

impl PersonalInfo {
    /// Field-by-field merge: set fields of `patch` overwrite, unset fields keep.
    pub fn merge(&mut self, patch: PersonalInfo) {
        let PersonalInfo {
            name,
            email,
            phone,
            address,
            linkedin,
            portfolio,
            profile_summary,
        } = patch;
        overwrite(&mut self.name, name);
        overwrite(&mut self.email, email);
        overwrite(&mut self.phone, phone);
        overwrite(&mut self.address, address);
        overwrite(&mut self.linkedin, linkedin);
        overwrite(&mut self.portfolio, portfolio);
        overwrite(&mut self.profile_summary, profile_summary);
    }
}

impl ResumeContent {
    /// Document-level merge. `personal_info` merges one level down; every
    /// other key is replaced.
    pub fn merge(&mut self, patch: ContentPatch) {
        let ContentPatch {
            personal_info,
            education,
            experience,
            skills,
            projects,
            cover_letters,
            custom_sections,
            template_id,
            sections_order,
        } = patch;

        if let Some(info) = personal_info {
            self.personal_info.get_or_insert_with(PersonalInfo::default).merge(info);
        }
        replace(&mut self.education, education);
        replace(&mut self.experience, experience);
        replace(&mut self.skills, skills);
        replace(&mut self.projects, projects);
        replace(&mut self.cover_letters, cover_letters);
        replace(&mut self.custom_sections, custom_sections);
        overwrite(&mut self.template_id, template_id);
        overwrite(&mut self.sections_order, sections_order);
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn replace<T>(slot: &mut Vec<T>, value: Option<Vec<T>>) {
    if let Some(items) = value {
        *slot = items;
    }
}

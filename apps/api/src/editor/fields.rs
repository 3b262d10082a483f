//! Typed single-field edits, one enum per item type. On the wire each is
//! `{"field": "<name>", "value": <new value>}`.

use serde::{Deserialize, Serialize};

use crate::document::{
    parse_technologies, CoverLetter, CustomSection, CustomSectionItem, EducationItem,
    ExperienceItem, PersonalInfo, ProjectItem, SkillItem, SkillLevel,
};

use super::SectionItem;

fn empty() -> Option<String> {
    Some(String::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PersonalInfoField {
    Name(String),
    Email(String),
    Phone(String),
    Address(String),
    Linkedin(String),
    Portfolio(String),
    ProfileSummary(String),
}

impl PersonalInfoField {
    /// A personal info patch with only this field set.
    pub fn into_patch(self) -> PersonalInfo {
        let mut patch = PersonalInfo::default();
        match self {
            PersonalInfoField::Name(v) => patch.name = Some(v),
            PersonalInfoField::Email(v) => patch.email = Some(v),
            PersonalInfoField::Phone(v) => patch.phone = Some(v),
            PersonalInfoField::Address(v) => patch.address = Some(v),
            PersonalInfoField::Linkedin(v) => patch.linkedin = Some(v),
            PersonalInfoField::Portfolio(v) => patch.portfolio = Some(v),
            PersonalInfoField::ProfileSummary(v) => patch.profile_summary = Some(v),
        }
        patch
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum EducationField {
    SchoolName(String),
    Major(String),
    Degree(String),
    StartDate(String),
    EndDate(String),
    Gpa(String),
    Achievements(String),
}

impl SectionItem for EducationItem {
    type Field = EducationField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            school_name: empty(),
            major: empty(),
            degree: empty(),
            start_date: empty(),
            end_date: empty(),
            gpa: empty(),
            achievements: empty(),
        }
    }

    fn apply(&mut self, field: EducationField) {
        match field {
            EducationField::SchoolName(v) => self.school_name = Some(v),
            EducationField::Major(v) => self.major = Some(v),
            EducationField::Degree(v) => self.degree = Some(v),
            EducationField::StartDate(v) => self.start_date = Some(v),
            EducationField::EndDate(v) => self.end_date = Some(v),
            EducationField::Gpa(v) => self.gpa = Some(v),
            EducationField::Achievements(v) => self.achievements = Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ExperienceField {
    CompanyName(String),
    Position(String),
    StartDate(String),
    EndDate(String),
    Responsibilities(String),
    IsCurrent(bool),
}

impl SectionItem for ExperienceItem {
    type Field = ExperienceField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            company_name: empty(),
            position: empty(),
            start_date: empty(),
            end_date: empty(),
            responsibilities: empty(),
            is_current: Some(false),
        }
    }

    fn apply(&mut self, field: ExperienceField) {
        match field {
            ExperienceField::CompanyName(v) => self.company_name = Some(v),
            ExperienceField::Position(v) => self.position = Some(v),
            ExperienceField::StartDate(v) => self.start_date = Some(v),
            ExperienceField::EndDate(v) => self.end_date = Some(v),
            ExperienceField::Responsibilities(v) => self.responsibilities = Some(v),
            ExperienceField::IsCurrent(v) => self.is_current = Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SkillField {
    Name(String),
    Level(SkillLevel),
    Category(String),
}

impl SectionItem for SkillItem {
    type Field = SkillField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            name: empty(),
            level: Some(SkillLevel::Medium),
            category: empty(),
        }
    }

    fn apply(&mut self, field: SkillField) {
        match field {
            SkillField::Name(v) => self.name = Some(v),
            SkillField::Level(v) => self.level = Some(v),
            SkillField::Category(v) => self.category = Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ProjectField {
    ProjectName(String),
    Description(String),
    StartDate(String),
    EndDate(String),
    Role(String),
    TechnologiesUsed(Vec<String>),
    /// Comma-separated input, split into `technologies_used`.
    Technologies(String),
    ProjectLink(String),
    KeyAchievements(String),
}

impl SectionItem for ProjectItem {
    type Field = ProjectField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            project_name: empty(),
            description: empty(),
            start_date: empty(),
            end_date: empty(),
            role: empty(),
            technologies_used: Some(Vec::new()),
            project_link: empty(),
            key_achievements: empty(),
        }
    }

    fn apply(&mut self, field: ProjectField) {
        match field {
            ProjectField::ProjectName(v) => self.project_name = Some(v),
            ProjectField::Description(v) => self.description = Some(v),
            ProjectField::StartDate(v) => self.start_date = Some(v),
            ProjectField::EndDate(v) => self.end_date = Some(v),
            ProjectField::Role(v) => self.role = Some(v),
            ProjectField::TechnologiesUsed(v) => self.technologies_used = Some(v),
            ProjectField::Technologies(v) => self.technologies_used = Some(parse_technologies(&v)),
            ProjectField::ProjectLink(v) => self.project_link = Some(v),
            ProjectField::KeyAchievements(v) => self.key_achievements = Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CoverLetterField {
    Title(String),
    Content(String),
}

impl SectionItem for CoverLetter {
    type Field = CoverLetterField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            title: empty(),
            content: empty(),
        }
    }

    fn apply(&mut self, field: CoverLetterField) {
        match field {
            CoverLetterField::Title(v) => self.title = Some(v),
            CoverLetterField::Content(v) => self.content = Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CustomSectionField {
    SectionTitle(String),
}

impl SectionItem for CustomSection {
    type Field = CustomSectionField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            section_title: String::new(),
            items: Vec::new(),
        }
    }

    fn apply(&mut self, field: CustomSectionField) {
        match field {
            CustomSectionField::SectionTitle(v) => self.section_title = v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CustomItemField {
    ItemTitle(String),
    ItemSubtitle(String),
    ItemStartDate(String),
    ItemEndDate(String),
    ItemDescription(String),
}

impl SectionItem for CustomSectionItem {
    type Field = CustomItemField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            item_title: empty(),
            item_subtitle: empty(),
            item_start_date: empty(),
            item_end_date: empty(),
            item_description: empty(),
        }
    }

    fn apply(&mut self, field: CustomItemField) {
        match field {
            CustomItemField::ItemTitle(v) => self.item_title = Some(v),
            CustomItemField::ItemSubtitle(v) => self.item_subtitle = Some(v),
            CustomItemField::ItemStartDate(v) => self.item_start_date = Some(v),
            CustomItemField::ItemEndDate(v) => self.item_end_date = Some(v),
            CustomItemField::ItemDescription(v) => self.item_description = Some(v),
        }
    }
}

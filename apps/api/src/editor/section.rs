use std::marker::PhantomData;

use crate::document::{
    ContentPatch, CoverLetter, CustomSection, CustomSectionItem, EducationItem, ExperienceItem,
    ProjectItem, ResumeContent, SectionKind, SkillItem,
};
use crate::store::ContentStore;

use super::{
    position, push_blank, remove_item, update_item, CustomItemField, CustomSectionField, ItemKey,
    PersonalInfoField, SectionItem,
};

/// A list-valued section of the document.
pub trait ListSection {
    type Item: SectionItem;

    const KIND: SectionKind;

    fn items(content: &ResumeContent) -> &[Self::Item];

    /// A patch replacing this section's list and nothing else.
    fn patch(items: Vec<Self::Item>) -> ContentPatch;
}

macro_rules! list_section {
    ($name:ident, $item:ty, $kind:expr, $field:ident) => {
        pub struct $name;

        impl ListSection for $name {
            type Item = $item;

            const KIND: SectionKind = $kind;

            fn items(content: &ResumeContent) -> &[$item] {
                &content.$field
            }

            fn patch(items: Vec<$item>) -> ContentPatch {
                ContentPatch {
                    $field: Some(items),
                    ..Default::default()
                }
            }
        }
    };
}

list_section!(Education, EducationItem, SectionKind::Education, education);
list_section!(Experience, ExperienceItem, SectionKind::Experience, experience);
list_section!(Skills, SkillItem, SectionKind::Skills, skills);
list_section!(Projects, ProjectItem, SectionKind::Projects, projects);
list_section!(CoverLetters, CoverLetter, SectionKind::CoverLetters, cover_letters);
list_section!(CustomSections, CustomSection, SectionKind::CustomSections, custom_sections);

/// Add/update/delete over one section of the current document.
///
/// Every method is a no-op returning `None`/`false` when no document is
/// loaded or the key matches nothing.
pub struct SectionEditor<S> {
    store: ContentStore,
    _section: PhantomData<S>,
}

impl<S: ListSection> SectionEditor<S> {
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            _section: PhantomData,
        }
    }

    pub fn items(&self) -> Vec<S::Item> {
        self.store
            .current_content()
            .map(|content| S::items(&content).to_vec())
            .unwrap_or_default()
    }

    fn edit<R>(&self, change: impl FnOnce(&mut Vec<S::Item>) -> Option<R>) -> Option<R> {
        let content = self.store.current_content()?;
        let mut items = S::items(&content).to_vec();
        let result = change(&mut items)?;
        self.store
            .update_current_content(S::patch(items))
            .then_some(result)
    }

    /// Appends a blank item and returns its id.
    pub fn add(&self) -> Option<String> {
        self.edit(|items| Some(push_blank(items)))
    }

    pub fn update(&self, key: impl Into<ItemKey>, field: <S::Item as SectionItem>::Field) -> bool {
        let key = key.into();
        self.edit(|items| update_item(items, &key, field).then_some(()))
            .is_some()
    }

    pub fn delete(&self, key: impl Into<ItemKey>) -> bool {
        let key = key.into();
        self.edit(|items| remove_item(items, &key)).is_some()
    }
}

pub struct PersonalInfoEditor {
    store: ContentStore,
}

impl PersonalInfoEditor {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Sets one personal info field, creating the block if it is missing.
    pub fn set(&self, field: PersonalInfoField) -> bool {
        self.store.update_current_content(ContentPatch {
            personal_info: Some(field.into_patch()),
            ..Default::default()
        })
    }
}

/// Custom sections and the items inside each of them.
pub struct CustomSectionsEditor {
    sections: SectionEditor<CustomSections>,
}

impl CustomSectionsEditor {
    pub fn new(store: ContentStore) -> Self {
        Self {
            sections: SectionEditor::new(store),
        }
    }

    pub fn sections(&self) -> Vec<CustomSection> {
        self.sections.items()
    }

    pub fn add_section(&self, title: &str) -> Option<String> {
        self.sections.edit(|sections| {
            let id = push_blank(sections);
            if let Some(section) = sections.last_mut() {
                section.section_title = title.to_string();
            }
            Some(id)
        })
    }

    pub fn rename_section(&self, section: impl Into<ItemKey>, title: &str) -> bool {
        self.sections.update(
            section,
            CustomSectionField::SectionTitle(title.to_string()),
        )
    }

    pub fn remove_section(&self, section: impl Into<ItemKey>) -> bool {
        self.sections.delete(section)
    }

    fn edit_items<R>(
        &self,
        section: ItemKey,
        change: impl FnOnce(&mut Vec<CustomSectionItem>) -> Option<R>,
    ) -> Option<R> {
        self.sections.edit(|sections| {
            let index = position(sections, &section)?;
            change(&mut sections[index].items)
        })
    }

    pub fn add_item(&self, section: impl Into<ItemKey>) -> Option<String> {
        self.edit_items(section.into(), |items| Some(push_blank(items)))
    }

    pub fn update_item(
        &self,
        section: impl Into<ItemKey>,
        item: impl Into<ItemKey>,
        field: CustomItemField,
    ) -> bool {
        let item = item.into();
        self.edit_items(section.into(), |items| {
            update_item(items, &item, field).then_some(())
        })
        .is_some()
    }

    pub fn delete_item(&self, section: impl Into<ItemKey>, item: impl Into<ItemKey>) -> bool {
        let item = item.into();
        self.edit_items(section.into(), |items| remove_item(items, &item))
            .is_some()
    }
}

//! Editing addressed by section key strings, as they arrive in request paths.
//!
//! A key is a built-in list section (`education`, `skills`, ...), the
//! `custom_sections` list itself, or the id of one custom section, which
//! addresses that section's items. Field values are the tagged JSON the
//! typed field enums accept.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::document::SectionKind;
use crate::store::ContentStore;

use super::{
    CoverLetters, CustomItemField, CustomSections, CustomSectionsEditor, Education, Experience,
    ItemKey, ListSection, PersonalInfoEditor, PersonalInfoField, Projects, SectionEditor,
    SectionItem, Skills,
};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("No resume is loaded")]
    NoDocument,

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid field: {0}")]
    InvalidField(#[from] serde_json::Error),
}

enum Target {
    List(SectionKind),
    PersonalInfo,
    CustomItems(String),
}

fn resolve(store: &ContentStore, section: &str) -> Result<Target, EditError> {
    let Some(content) = store.current_content() else {
        return Err(EditError::NoDocument);
    };
    match SectionKind::from_key(section) {
        Some(SectionKind::PersonalInfo) => Ok(Target::PersonalInfo),
        Some(kind) => Ok(Target::List(kind)),
        None if content.custom_sections.iter().any(|s| s.id == section) => {
            Ok(Target::CustomItems(section.to_string()))
        }
        None => Err(EditError::UnknownSection(section.to_string())),
    }
}

fn describe(key: &ItemKey) -> String {
    match key {
        ItemKey::Id(id) => id.clone(),
        ItemKey::Index(index) => format!("#{index}"),
    }
}

fn add<S: ListSection>(store: &ContentStore) -> Result<String, EditError> {
    let id = SectionEditor::<S>::new(store.clone())
        .add()
        .ok_or(EditError::NoDocument)?;
    debug!("Added item {id} to {}", S::KIND.key());
    Ok(id)
}

fn update<S: ListSection>(store: &ContentStore, key: ItemKey, field: Value) -> Result<(), EditError> {
    let field: <S::Item as SectionItem>::Field = serde_json::from_value(field)?;
    if SectionEditor::<S>::new(store.clone()).update(key.clone(), field) {
        Ok(())
    } else {
        Err(EditError::ItemNotFound(describe(&key)))
    }
}

fn delete<S: ListSection>(store: &ContentStore, key: ItemKey) -> Result<(), EditError> {
    if SectionEditor::<S>::new(store.clone()).delete(key.clone()) {
        debug!("Removed item {} from {}", describe(&key), S::KIND.key());
        Ok(())
    } else {
        Err(EditError::ItemNotFound(describe(&key)))
    }
}

/// Appends a blank item to `section` and returns its id.
pub fn add_item(store: &ContentStore, section: &str) -> Result<String, EditError> {
    match resolve(store, section)? {
        Target::List(SectionKind::Education) => add::<Education>(store),
        Target::List(SectionKind::Experience) => add::<Experience>(store),
        Target::List(SectionKind::Skills) => add::<Skills>(store),
        Target::List(SectionKind::Projects) => add::<Projects>(store),
        Target::List(SectionKind::CoverLetters) => add::<CoverLetters>(store),
        Target::List(SectionKind::CustomSections) => add::<CustomSections>(store),
        Target::CustomItems(id) => CustomSectionsEditor::new(store.clone())
            .add_item(id.as_str())
            .ok_or(EditError::UnknownSection(id)),
        Target::List(SectionKind::PersonalInfo) | Target::PersonalInfo => {
            Err(EditError::UnknownSection(section.to_string()))
        }
    }
}

/// Sets one field of one item. For `personal_info` the key is ignored and
/// the field applies to the personal info block.
pub fn update_item(
    store: &ContentStore,
    section: &str,
    key: ItemKey,
    field: Value,
) -> Result<(), EditError> {
    match resolve(store, section)? {
        Target::List(SectionKind::Education) => update::<Education>(store, key, field),
        Target::List(SectionKind::Experience) => update::<Experience>(store, key, field),
        Target::List(SectionKind::Skills) => update::<Skills>(store, key, field),
        Target::List(SectionKind::Projects) => update::<Projects>(store, key, field),
        Target::List(SectionKind::CoverLetters) => update::<CoverLetters>(store, key, field),
        Target::List(SectionKind::CustomSections) => update::<CustomSections>(store, key, field),
        Target::CustomItems(id) => {
            let field: CustomItemField = serde_json::from_value(field)?;
            if CustomSectionsEditor::new(store.clone()).update_item(id.as_str(), key.clone(), field) {
                Ok(())
            } else {
                Err(EditError::ItemNotFound(describe(&key)))
            }
        }
        Target::List(SectionKind::PersonalInfo) | Target::PersonalInfo => {
            let field: PersonalInfoField = serde_json::from_value(field)?;
            if PersonalInfoEditor::new(store.clone()).set(field) {
                Ok(())
            } else {
                Err(EditError::NoDocument)
            }
        }
    }
}

pub fn delete_item(store: &ContentStore, section: &str, key: ItemKey) -> Result<(), EditError> {
    match resolve(store, section)? {
        Target::List(SectionKind::Education) => delete::<Education>(store, key),
        Target::List(SectionKind::Experience) => delete::<Experience>(store, key),
        Target::List(SectionKind::Skills) => delete::<Skills>(store, key),
        Target::List(SectionKind::Projects) => delete::<Projects>(store, key),
        Target::List(SectionKind::CoverLetters) => delete::<CoverLetters>(store, key),
        Target::List(SectionKind::CustomSections) => delete::<CustomSections>(store, key),
        Target::CustomItems(id) => {
            if CustomSectionsEditor::new(store.clone()).delete_item(id.as_str(), key.clone()) {
                Ok(())
            } else {
                Err(EditError::ItemNotFound(describe(&key)))
            }
        }
        Target::List(SectionKind::PersonalInfo) | Target::PersonalInfo => {
            Err(EditError::UnknownSection(section.to_string()))
        }
    }
}

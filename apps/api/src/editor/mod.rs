//! Section editors: add, edit and delete items of one résumé section.
//!
//! Editors never touch the network. Every edit reads the current document
//! from the `ContentStore`, changes one list and hands the whole list back
//! through `update_current_content`; persistence waits for an explicit save.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod by_key;
pub mod fields;
pub mod section;

pub use by_key::EditError;
pub use fields::{
    CoverLetterField, CustomItemField, CustomSectionField, EducationField, ExperienceField,
    PersonalInfoField, ProjectField, SkillField,
};
pub use section::{
    CoverLetters, CustomSections, CustomSectionsEditor, Education, Experience, ListSection,
    PersonalInfoEditor, Projects, SectionEditor, Skills,
};

/// Addresses one item of a list, by its id or by its current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Index(usize),
    Id(String),
}

impl ItemKey {
    /// Path segments that are plain numbers address a position; anything
    /// else is an item id.
    pub fn from_path(segment: &str) -> ItemKey {
        match segment.parse::<usize>() {
            Ok(index) => ItemKey::Index(index),
            Err(_) => ItemKey::Id(segment.to_string()),
        }
    }
}

impl From<usize> for ItemKey {
    fn from(index: usize) -> Self {
        ItemKey::Index(index)
    }
}

impl From<&str> for ItemKey {
    fn from(id: &str) -> Self {
        ItemKey::Id(id.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(id: String) -> Self {
        ItemKey::Id(id)
    }
}

/// A list entry an editor can create blank and edit one field at a time.
pub trait SectionItem: Clone {
    /// One field with its new value.
    type Field: DeserializeOwned;

    fn id(&self) -> &str;

    /// A new item with `id` and every field empty.
    fn blank(id: String) -> Self;

    fn apply(&mut self, field: Self::Field);
}

fn position<T: SectionItem>(items: &[T], key: &ItemKey) -> Option<usize> {
    match key {
        ItemKey::Id(id) => items.iter().position(|item| item.id() == id),
        ItemKey::Index(index) => (*index < items.len()).then_some(*index),
    }
}

/// Appends a blank item under a fresh id no other item in `items` carries.
pub fn push_blank<T: SectionItem>(items: &mut Vec<T>) -> String {
    let taken: HashSet<&str> = items.iter().map(|item| item.id()).collect();
    let id = loop {
        let candidate = Uuid::new_v4().to_string();
        if !taken.contains(candidate.as_str()) {
            break candidate;
        }
    };
    items.push(T::blank(id.clone()));
    id
}

/// Replaces one field of the addressed item. Returns `false` if no item
/// matches `key`.
pub fn update_item<T: SectionItem>(items: &mut [T], key: &ItemKey, field: T::Field) -> bool {
    match position(items, key) {
        Some(index) => {
            items[index].apply(field);
            true
        }
        None => false,
    }
}

/// Removes the addressed item, keeping the others in order.
pub fn remove_item<T: SectionItem>(items: &mut Vec<T>, key: &ItemKey) -> Option<T> {
    position(items, key).map(|index| items.remove(index))
}

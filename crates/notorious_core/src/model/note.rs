//! Note entity: free-form text content with tags.

use crate::model::builder::{Builder, EntityBuilder};
use crate::model::entity::{DomainResult, Entity, EntityBase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    base: EntityBase,
    #[serde(default)]
    content: String,
}

impl Note {
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the full note body.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

impl Entity for Note {
    const COLLECTION: &'static str = "Note";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

/// Builder for `Note`. Content defaults to an empty body.
#[derive(Debug, Clone, Default)]
pub struct NoteBuilder {
    base: EntityBuilder,
    content: String,
}

impl NoteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl Builder for NoteBuilder {
    type Output = Note;

    fn base_builder(&mut self) -> &mut EntityBuilder {
        &mut self.base
    }

    fn build(self) -> DomainResult<Note> {
        Ok(Note {
            base: self.base.build_base()?,
            content: self.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::NoteBuilder;
    use crate::model::builder::Builder;

    #[test]
    fn set_content_replaces_body() {
        let mut note = NoteBuilder::new().with_content("draft").build().unwrap();
        note.set_content("final");
        assert_eq!(note.content(), "final");
    }

    #[test]
    fn missing_content_deserializes_as_empty() {
        let note = NoteBuilder::new().build().unwrap();
        let mut json = serde_json::to_value(&note).unwrap();
        json.as_object_mut().unwrap().remove("content");

        let decoded: super::Note = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.content(), "");
    }
}

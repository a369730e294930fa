//! Note repository: the generic repository with a content filter.

use crate::model::filter::{Filter, PageFilter};
use crate::model::note::Note;
use crate::repo::entity_repo::EntityRepository;
use crate::repo::policy::RepositoryPolicy;
use crate::store::Predicate;

/// Document field holding the note body.
pub const CONTENT_FIELD: &str = "content";

pub type NoteRepository<S> = EntityRepository<Note, NoteFilter, S, NotePolicy>;

/// Page window plus an optional exact-content match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub page: Filter,
    pub content: Option<String>,
}

impl NoteFilter {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            page: Filter::default(),
            content: Some(content.into()),
        }
    }
}

impl From<Filter> for NoteFilter {
    fn from(page: Filter) -> Self {
        Self {
            page,
            content: None,
        }
    }
}

impl PageFilter for NoteFilter {
    fn skip(&self) -> u64 {
        self.page.skip
    }

    fn take(&self) -> u64 {
        self.page.take
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotePolicy;

impl RepositoryPolicy<NoteFilter> for NotePolicy {
    fn map_filter(&self, filter: &NoteFilter) -> Predicate {
        match filter.content.as_deref() {
            Some(content) => Predicate::eq(CONTENT_FIELD, content),
            None => Predicate::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteFilter, NotePolicy};
    use crate::repo::policy::RepositoryPolicy;
    use crate::store::Predicate;

    #[test]
    fn content_filter_maps_to_equality() {
        let predicate = NotePolicy.map_filter(&NoteFilter::with_content("abc"));
        assert_eq!(predicate, Predicate::eq("content", "abc"));
        assert_eq!(NotePolicy.map_filter(&NoteFilter::default()), Predicate::All);
    }
}

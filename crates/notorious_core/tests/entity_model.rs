use chrono::{Duration, Utc};
use notorious_core::{
    Builder, DomainError, Entity, NoteBuilder, Tag, TagBuilder, UserBuilder,
};
use uuid::Uuid;

fn generate_tag() -> Tag {
    TagBuilder::new(Uuid::new_v4().to_string()).build().unwrap()
}

fn generate_tags(count: usize) -> Vec<Tag> {
    (0..count).map(|_| generate_tag()).collect()
}

fn tag_ids<E: Entity>(entity: &E) -> Vec<Uuid> {
    entity.tags().ids().collect()
}

/// Runs one generic check against every entity builder.
macro_rules! for_each_builder {
    ($check:ident) => {
        $check(NoteBuilder::new);
        $check(UserBuilder::new);
        $check(|| TagBuilder::new("label"));
    };
}

#[test]
fn build_sets_fresh_id() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let first = make().build().unwrap();
        let second = make().build().unwrap();
        assert!(!first.id().is_nil());
        assert_ne!(first.id(), second.id());
    }
    for_each_builder!(check);
}

#[test]
fn with_tags_before_build_sets_exactly_those_tags() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let tags = generate_tags(5);
        let entity = make().with_tags(tags.clone()).build().unwrap();

        let expected: Vec<_> = tags.iter().map(Entity::id).collect();
        assert_eq!(tag_ids(&entity), expected);
        assert_eq!(entity.tags().iter().cloned().collect::<Vec<_>>(), tags);
    }
    for_each_builder!(check);
}

#[test]
fn with_duplicate_tags_fails_build() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let tag = generate_tag();
        let err = make()
            .with_tag(tag.clone())
            .with_tag(tag.clone())
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateTag(tag.id()));
    }
    for_each_builder!(check);
}

#[test]
fn add_tag_adds_tag_to_tags() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let mut entity = make().build().unwrap();
        let tag = generate_tag();

        entity.add_tag(tag.clone()).unwrap();

        assert!(entity.has_tag(tag.id()));
        assert_eq!(entity.tags().get(tag.id()), Some(&tag));
    }
    for_each_builder!(check);
}

#[test]
fn add_tag_twice_fails_and_leaves_tags_unchanged() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let tag = generate_tag();
        let mut entity = make().with_tags(generate_tags(2)).with_tag(tag.clone()).build().unwrap();
        let before = tag_ids(&entity);

        let err = entity.add_tag(tag.clone()).unwrap_err();

        assert_eq!(err, DomainError::DuplicateTag(tag.id()));
        assert_eq!(tag_ids(&entity), before);
    }
    for_each_builder!(check);
}

#[test]
fn remove_tag_removes_tag_from_tags() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let mut entity = make().with_tags(generate_tags(5)).build().unwrap();
        let to_remove = entity.tags().iter().next().cloned().unwrap();

        entity.remove_tag(&to_remove).unwrap();

        assert!(!entity.has_tag(to_remove.id()));
        assert_eq!(entity.tags().len(), 4);
    }
    for_each_builder!(check);
}

#[test]
fn remove_tag_not_present_fails() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let mut entity = make().build().unwrap();
        let tag = generate_tag();

        let err = entity.remove_tag(&tag).unwrap_err();
        assert_eq!(err, DomainError::TagNotFound(tag.id()));
    }
    for_each_builder!(check);
}

#[test]
fn initialise_audit_sets_created_fields() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let user = UserBuilder::new().build().unwrap();
        let date = Utc::now();
        let mut entity = make().build().unwrap();
        assert_eq!(entity.created_by_user(), None);

        assert!(entity.initialise_audit(user.id(), date));

        assert_eq!(entity.created_by_user(), Some(user.id()));
        assert_eq!(entity.created_date(), Some(date));
    }
    for_each_builder!(check);
}

#[test]
fn initialise_audit_twice_keeps_first_values() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let date = Utc::now();
        let mut entity = make().build().unwrap();

        entity.initialise_audit(first, date);
        assert!(!entity.initialise_audit(second, date + Duration::hours(1)));

        assert_eq!(entity.created_by_user(), Some(first));
        assert_eq!(entity.created_date(), Some(date));
    }
    for_each_builder!(check);
}

#[test]
fn with_audit_before_build_sets_created_fields() {
    fn check<B: Builder>(make: impl Fn() -> B) {
        let user = UserBuilder::new().build().unwrap();
        let date = Utc::now();

        let entity = make().with_audit(user.id(), date).build().unwrap();

        assert_eq!(entity.created_by_user(), Some(user.id()));
        assert_eq!(entity.created_date(), Some(date));
        assert_eq!(entity.last_modified_date(), None);
    }
    for_each_builder!(check);
}

#[test]
fn note_document_keeps_tags_audit_and_content() {
    let user = UserBuilder::new().build().unwrap();
    let date = Utc::now();
    let note = NoteBuilder::new()
        .with_content("abc")
        .with_tags(generate_tags(3))
        .with_audit(user.id(), date)
        .build()
        .unwrap();

    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["content"], "abc");
    assert_eq!(json["tags"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["created_by_user"], user.id().to_string());

    let decoded: notorious_core::Note = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, note);
}

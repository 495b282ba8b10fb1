//! Store agnostic resolution logic behind every API operation.
//!
//! Each function receives the [`Store`] explicitly. Nothing in here knows
//! about GraphQL or HTTP; the `api` module is a thin layer on top.

use futures::future::try_join_all;

use crate::{
    model::{Kind, Record},
    prelude::*,
    store::{Field, Filter, Store, StoreResult},
};

mod ops;

pub(crate) use self::ops::*;


/// Looks up `id` in every kind, in `Kind::PRIORITY` order, and returns the
/// first match with its relations loaded. If the same id exists for several
/// kinds, the one with the highest priority wins. `None` means there is no
/// such node; that is not an error.
pub(crate) async fn resolve_node_by_id(store: &dyn Store, id: &str) -> StoreResult<Option<Record>> {
    for kind in Kind::PRIORITY {
        if let Some(record) = store.find_by_id(kind, id, kind.relations()).await? {
            trace!("Resolved node '{id}' as {kind}");
            return Ok(Some(normalize(record)));
        }
    }

    Ok(None)
}

/// The kind of `record`, taken from its tag.
pub(crate) fn resolve_kind_of_record(record: &Record) -> Kind {
    record.kind()
}

/// Fills every absent list relation of `record` (and of the records nested
/// inside it) with an empty list. Absent single relations stay `None`.
/// Idempotent.
pub(crate) fn normalize(record: Record) -> Record {
    record.normalized()
}

/// The kinds `search` looks at, in result order, with the field matched.
const SEARCH_TARGETS: [(Kind, Field); 3] = [
    (Kind::User, Field::Name),
    (Kind::Post, Field::Title),
    (Kind::Comment, Field::Text),
];

/// Returns all users whose name, all posts whose title and all comments whose
/// text contain `text`, in that order. No ranking, no deduplication. Empty
/// `text` matches nothing.
pub(crate) async fn search(store: &dyn Store, text: &str) -> StoreResult<Vec<Record>> {
    if text.is_empty() {
        return Ok(vec![]);
    }

    let lookups = SEARCH_TARGETS.into_iter().map(|(kind, field)| async move {
        store.find_many(kind, &Filter::Contains(field, text.to_owned()), &[]).await
    });
    let hits = try_join_all(lookups).await?;

    let out = hits.into_iter().flatten().map(normalize).collect::<Vec<_>>();
    debug!("Search for {text:?} found {} records", out.len());
    Ok(out)
}


#[cfg(test)]
pub(crate) mod fixtures {
    //! A small connected graph with one record of every kind, shared by the
    //! resolver, API and PostgreSQL tests.

    use juniper::ID;

    use crate::model::{input::*, User};
    use super::*;

    /// Ann writes the post "Trip", Bob comments on and likes it and Ann
    /// messages Bob. Returns every id with its kind, in priority order.
    pub(crate) async fn one_of_each_kind(store: &dyn Store) -> StoreResult<Vec<(Kind, String)>> {
        let id = |s: &str| ID::new(s);
        let ann = create_user(store, CreateUserInput {
            name: "Ann".into(),
            email: "ann@example.org".into(),
        }).await?;
        let bob = create_user(store, CreateUserInput {
            name: "Bob".into(),
            email: "bob@example.org".into(),
        }).await?;
        let post = create_post(store, CreatePostInput {
            title: "Trip".into(),
            content: None,
            status: None,
            author_id: id(&ann.id),
            tag_ids: None,
            category_ids: None,
        }).await?;
        let comment = create_comment(store, CreateCommentInput {
            text: "Nice".into(),
            post_id: id(&post.id),
            author_id: id(&bob.id),
        }).await?;
        let profile = create_profile(store, CreateProfileInput {
            bio: Some("Hiker".into()),
            avatar_url: None,
            user_id: id(&ann.id),
        }).await?;
        let like = like_post(store, &bob.id, &post.id).await?;
        let tag = create_tag(store, CreateTagInput {
            name: "travel".into(),
            post_ids: Some(vec![id(&post.id)]),
        }).await?;
        let category = create_category(store, CreateCategoryInput {
            name: "life".into(),
            post_ids: Some(vec![id(&post.id)]),
        }).await?;
        let message = send_message(store, SendMessageInput {
            content: "Hey".into(),
            sender_id: id(&ann.id),
            receiver_id: id(&bob.id),
        }).await?;
        let notification = create_notification(store, CreateNotificationInput {
            kind: "WELCOME".into(),
            content: "Hi Ann".into(),
            user_id: id(&ann.id),
        }).await?;

        Ok(vec![
            (Kind::User, ann.id),
            (Kind::Post, post.id),
            (Kind::Comment, comment.id),
            (Kind::Profile, profile.id),
            (Kind::Like, like.id),
            (Kind::Tag, tag.id),
            (Kind::Category, category.id),
            (Kind::Message, message.id),
            (Kind::Notification, notification.id),
        ])
    }

    /// Checks that `record` is tagged `kind` and that a relation of the
    /// graph built by `one_of_each_kind` was loaded.
    pub(crate) fn assert_loaded(kind: Kind, record: Record) {
        assert_eq!(resolve_kind_of_record(&record), kind);
        let name = |u: Option<Box<User>>| u.map(|u| u.name);
        match record {
            Record::User(u) => {
                assert_eq!(u.posts.map(|p| p.len()), Some(1));
                assert_eq!(u.profile.and_then(|p| p.bio).as_deref(), Some("Hiker"));
            }
            Record::Post(p) => {
                assert_eq!(name(p.author).as_deref(), Some("Ann"));
                assert_eq!(p.tags.map(|t| t.len()), Some(1));
                assert_eq!(p.categories.map(|c| c.len()), Some(1));
            }
            Record::Comment(c) => assert_eq!(c.post.map(|p| p.title).as_deref(), Some("Trip")),
            Record::Profile(p) => assert_eq!(name(p.user).as_deref(), Some("Ann")),
            Record::Like(l) => assert_eq!(name(l.user).as_deref(), Some("Bob")),
            Record::Tag(t) => assert_eq!(t.posts.map(|p| p.len()), Some(1)),
            Record::Category(c) => assert_eq!(c.posts.map(|p| p.len()), Some(1)),
            Record::Message(m) => assert_eq!(name(m.receiver).as_deref(), Some("Bob")),
            Record::Notification(n) => assert_eq!(name(n.user).as_deref(), Some("Ann")),
        }
    }
}

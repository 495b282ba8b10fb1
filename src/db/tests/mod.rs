//! Tests against a real PostgreSQL database. They need a config file (see
//! `TestDb`) and are thus ignored by default. Run them with
//! `cargo test -- --ignored`.

use crate::{
    model::{
        input::{
            CreatePostInput, CreateTagInput, CreateUserInput, SendMessageInput, UpdateMessageInput,
        },
        Kind,
        PostStatus,
    },
    prelude::*,
    resolver::{self, fixtures},
    store::{Link, StoreError},
};
use super::query;
use self::util::TestDb;

mod util;


async fn add_user(store: &dyn crate::store::Store, name: &str) -> Result<String> {
    let user = resolver::create_user(store, CreateUserInput {
        name: name.into(),
        email: format!("{}@example.org", name.to_lowercase()),
    }).await?;
    Ok(user.id)
}

async fn add_post(store: &dyn crate::store::Store, title: &str, author: &str) -> Result<String> {
    let post = resolver::create_post(store, CreatePostInput {
        title: title.into(),
        content: None,
        status: None,
        author_id: author.to_owned().into(),
        tag_ids: None,
        category_ids: None,
    }).await?;
    Ok(post.id)
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn migrations_create_all_tables() -> Result<()> {
    let db = TestDb::new().await?;
    let conn = db.get().await?;

    let mut tables = query::all_table_names(&**conn).await?;
    tables.sort();
    assert_eq!(tables, [
        "__db_migrations",
        "categories",
        "comments",
        "likes",
        "messages",
        "notifications",
        "post_categories",
        "post_tags",
        "posts",
        "profiles",
        "tags",
        "users",
    ]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn post_loads_author_and_defaults() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();

    let ann = add_user(&*store, "Ann").await?;
    let trip = add_post(&*store, "Trip", &ann).await?;

    let post = resolver::get_post(&*store, &trip).await?.expect("post exists");
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.author.as_deref().map(|u| u.name.as_str()), Some("Ann"));
    assert_eq!(post.tags.as_deref(), Some(&[][..]));

    let user = resolver::get_user(&*store, &ann).await?.expect("user exists");
    let titles = user.posts.unwrap_or_default().into_iter().map(|p| p.title).collect::<Vec<_>>();
    assert_eq!(titles, ["Trip"]);
    assert!(user.profile.is_none());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn node_resolves_every_kind_with_relations() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();

    for (kind, id) in fixtures::one_of_each_kind(&*store).await? {
        let record = resolver::resolve_node_by_id(&*store, &id).await?.expect("node exists");
        fixtures::assert_loaded(kind, record);
    }
    assert_eq!(resolver::resolve_node_by_id(&*store, "no-such-id").await?, None);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn search_matches_substrings_case_sensitively() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();

    let ann = add_user(&*store, "Ann").await?;
    add_user(&*store, "Bob").await?;
    add_post(&*store, "Ann's trip", &ann).await?;
    add_post(&*store, "annual report", &ann).await?;

    let found = resolver::search(&*store, "Ann").await?;
    let kinds = found.iter().map(|r| r.kind()).collect::<Vec<_>>();
    assert_eq!(kinds, [Kind::User, Kind::Post]);
    assert!(resolver::search(&*store, "").await?.is_empty());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn constraint_violations_are_validation_errors() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();

    let ann = add_user(&*store, "Ann").await?;
    let duplicate = resolver::create_user(&*store, CreateUserInput {
        name: "Other Ann".into(),
        email: "ann@example.org".into(),
    }).await;
    assert!(matches!(duplicate, Err(StoreError::Validation(_))));

    let orphan = add_post(&*store, "Orphan", "no-such-user").await;
    let err = orphan.unwrap_err().downcast::<StoreError>()?;
    assert!(matches!(err, StoreError::Validation(_)));

    let trip = add_post(&*store, "Trip", &ann).await?;
    resolver::like_post(&*store, &ann, &trip).await?;
    let again = resolver::like_post(&*store, &ann, &trip).await;
    assert!(matches!(again, Err(StoreError::Validation(_))));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn linking_is_idempotent_and_reports_partial_failures() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();

    let ann = add_user(&*store, "Ann").await?;
    let trip = add_post(&*store, "Trip", &ann).await?;
    let tag = resolver::create_tag(&*store, CreateTagInput {
        name: "travel".into(),
        post_ids: Some(vec![trip.clone().into()]),
    }).await?;
    store.link(Link::PostTag, &trip, &tag.id).await?;

    let tag = resolver::get_tag(&*store, &tag.id).await?.expect("tag exists");
    assert_eq!(tag.posts.map(|p| p.len()), Some(1));

    let partial = resolver::create_tag(&*store, CreateTagInput {
        name: "misc".into(),
        post_ids: Some(vec![trip.clone().into(), "ghost".to_owned().into()]),
    }).await;
    match partial {
        Err(StoreError::PartialFailure { failed, .. }) => assert_eq!(failed, ["ghost"]),
        other => panic!("expected partial failure, got {other:?}"),
    }

    // The tag itself and the working link stay written.
    let tags = resolver::get_tags(&*store).await?;
    let misc = tags.iter().find(|t| t.name == "misc").expect("tag 'misc' was written");
    assert_eq!(misc.posts.as_ref().map(|p| p.len()), Some(1));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn messages_are_listed_per_side_and_can_be_marked_read() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();

    let ann = add_user(&*store, "Ann").await?;
    let bob = add_user(&*store, "Bob").await?;
    let msg = resolver::send_message(&*store, SendMessageInput {
        content: "hi".into(),
        sender_id: ann.clone().into(),
        receiver_id: bob.clone().into(),
    }).await?;
    assert!(!msg.read);

    let updated = resolver::update_message(&*store, &msg.id, UpdateMessageInput {
        content: None,
        read: Some(true),
    }).await?;
    assert!(updated.read);
    assert_eq!(updated.content, "hi");

    assert_eq!(resolver::get_messages_sent(&*store, &ann).await?.len(), 1);
    assert_eq!(resolver::get_messages_received(&*store, &ann).await?.len(), 0);
    let received = resolver::get_messages_received(&*store, &bob).await?;
    assert_eq!(received[0].sender.as_deref().map(|u| u.id.as_str()), Some(ann.as_str()));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn store_counts_its_queries() -> Result<()> {
    let db = TestDb::new().await?;
    let store = db.store();
    assert_eq!(store.num_queries(), 0);

    add_user(&*store, "Ann").await?;
    assert!(store.num_queries() >= 1);

    // A fresh handle starts at zero again.
    assert_eq!(db.store().num_queries(), 0);

    Ok(())
}

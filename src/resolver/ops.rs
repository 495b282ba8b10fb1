//! One function per query and mutation of the API.

use futures::future::join_all;
use juniper::ID;

use crate::{
    model::{
        input::*, Category, Comment, Kind, Like, Message, Notification, Post, Profile, Record,
        Relation, Tag, User,
    },
    prelude::*,
    store::{Changes, Field, Filter, Link, NewRecord, Store, StoreError, StoreResult},
};
use super::normalize;


// ===== Helpers ================================================================================

fn wrong_kind(expected: Kind, got: &Record) -> StoreError {
    StoreError::Backend(anyhow!(
        "store returned {} '{}' where a {expected} was expected",
        got.kind(),
        got.id(),
    ))
}

fn downcast<T>(record: Record, kind: Kind, into: fn(Record) -> Option<T>) -> StoreResult<T> {
    if record.kind() != kind {
        return Err(wrong_kind(kind, &record));
    }
    into(record).ok_or_else(|| StoreError::Backend(anyhow!("accessor does not match {kind}")))
}

/// Loads one record with all relations of its kind.
async fn fetch<T>(
    store: &dyn Store,
    kind: Kind,
    id: &str,
    into: fn(Record) -> Option<T>,
) -> StoreResult<Option<T>> {
    store.find_by_id(kind, id, kind.relations()).await?
        .map(|record| downcast(normalize(record), kind, into))
        .transpose()
}

async fn list<T>(
    store: &dyn Store,
    kind: Kind,
    filter: Filter,
    include: &[Relation],
    into: fn(Record) -> Option<T>,
) -> StoreResult<Vec<T>> {
    store.find_many(kind, &filter, include).await?
        .into_iter()
        .map(|record| downcast(normalize(record), kind, into))
        .collect()
}

/// Reads a record that was just written, so that mutations return it with
/// the same relations as the corresponding query.
async fn reread<T>(
    store: &dyn Store,
    written: Record,
    into: fn(Record) -> Option<T>,
) -> StoreResult<T> {
    let kind = written.kind();
    fetch(store, kind, written.id(), into).await?
        .ok_or_else(|| StoreError::NotFound { kind, id: written.id().to_owned() })
}

fn ids(list: Option<Vec<ID>>) -> Vec<String> {
    list.unwrap_or_default().into_iter().map(|id| id.to_string()).collect()
}

/// One join record to create.
struct LinkRequest {
    link: Link,
    post_id: String,
    target_id: String,
}

/// Which id of a `LinkRequest` the caller supplied and thus gets reported back.
#[derive(Clone, Copy)]
enum Requested {
    Post,
    Target,
}

/// Creates all join records concurrently. Links that fail are collected and
/// reported in a single `PartialFailure`; the ones that worked stay.
async fn link_all(
    store: &dyn Store,
    parent: &Record,
    requests: Vec<LinkRequest>,
    requested: Requested,
) -> StoreResult<()> {
    if requests.is_empty() {
        return Ok(());
    }

    let results = join_all(
        requests.iter().map(|r| store.link(r.link, &r.post_id, &r.target_id)),
    ).await;

    let mut failed = Vec::new();
    for (request, result) in requests.iter().zip(results) {
        if let Err(e) = result {
            let id = match requested {
                Requested::Post => &request.post_id,
                Requested::Target => &request.target_id,
            };
            warn!("Could not link {} '{}' with '{id}': {e}", parent.kind(), parent.id());
            failed.push(id.clone());
        }
    }

    if failed.is_empty() {
        return Ok(());
    }

    Err(StoreError::PartialFailure {
        msg: format!(
            "{} '{}' was saved, but {} of {} links could not be created",
            parent.kind(),
            parent.id(),
            failed.len(),
            requests.len(),
        ),
        failed,
    })
}


// ===== Queries ================================================================================

pub(crate) async fn get_user(store: &dyn Store, id: &str) -> StoreResult<Option<User>> {
    fetch(store, Kind::User, id, Record::into_user).await
}

pub(crate) async fn get_post(store: &dyn Store, id: &str) -> StoreResult<Option<Post>> {
    fetch(store, Kind::Post, id, Record::into_post).await
}

pub(crate) async fn get_category(store: &dyn Store, id: &str) -> StoreResult<Option<Category>> {
    fetch(store, Kind::Category, id, Record::into_category).await
}

pub(crate) async fn get_categories(store: &dyn Store) -> StoreResult<Vec<Category>> {
    list(store, Kind::Category, Filter::All, &[Relation::Posts], Record::into_category).await
}

pub(crate) async fn get_tag(store: &dyn Store, id: &str) -> StoreResult<Option<Tag>> {
    fetch(store, Kind::Tag, id, Record::into_tag).await
}

pub(crate) async fn get_tags(store: &dyn Store) -> StoreResult<Vec<Tag>> {
    list(store, Kind::Tag, Filter::All, &[Relation::Posts], Record::into_tag).await
}

pub(crate) async fn get_messages_sent(store: &dyn Store, user_id: &str) -> StoreResult<Vec<Message>> {
    let filter = Filter::Equals(Field::SenderId, user_id.to_owned());
    list(store, Kind::Message, filter, Kind::Message.relations(), Record::into_message).await
}

pub(crate) async fn get_messages_received(
    store: &dyn Store,
    user_id: &str,
) -> StoreResult<Vec<Message>> {
    let filter = Filter::Equals(Field::ReceiverId, user_id.to_owned());
    list(store, Kind::Message, filter, Kind::Message.relations(), Record::into_message).await
}

pub(crate) async fn get_notifications(
    store: &dyn Store,
    user_id: &str,
) -> StoreResult<Vec<Notification>> {
    let filter = Filter::Equals(Field::UserId, user_id.to_owned());
    list(store, Kind::Notification, filter, &[Relation::User], Record::into_notification).await
}


// ===== Mutations ==============================================================================

pub(crate) async fn create_user(store: &dyn Store, input: CreateUserInput) -> StoreResult<User> {
    let written = store.create(NewRecord::User { name: input.name, email: input.email }).await?;
    info!("Created user '{}'", written.id());
    reread(store, written, Record::into_user).await
}

pub(crate) async fn update_user(
    store: &dyn Store,
    id: &str,
    input: UpdateUserInput,
) -> StoreResult<User> {
    let changes = Changes::User { name: input.name, email: input.email };
    let written = store.update(id, changes).await?;
    reread(store, written, Record::into_user).await
}

pub(crate) async fn create_post(store: &dyn Store, input: CreatePostInput) -> StoreResult<Post> {
    let written = store.create(NewRecord::Post {
        title: input.title,
        content: input.content,
        status: input.status.unwrap_or_default(),
        author_id: input.author_id.to_string(),
    }).await?;
    info!("Created post '{}'", written.id());

    let post_id = written.id().to_owned();
    let tags = ids(input.tag_ids).into_iter().map(|target_id| LinkRequest {
        link: Link::PostTag,
        post_id: post_id.clone(),
        target_id,
    });
    let categories = ids(input.category_ids).into_iter().map(|target_id| LinkRequest {
        link: Link::PostCategory,
        post_id: post_id.clone(),
        target_id,
    });
    link_all(store, &written, tags.chain(categories).collect(), Requested::Target).await?;

    reread(store, written, Record::into_post).await
}

pub(crate) async fn update_post(
    store: &dyn Store,
    id: &str,
    input: UpdatePostInput,
) -> StoreResult<Post> {
    let changes = Changes::Post { title: input.title, content: input.content, status: input.status };
    let written = store.update(id, changes).await?;
    reread(store, written, Record::into_post).await
}

pub(crate) async fn create_comment(
    store: &dyn Store,
    input: CreateCommentInput,
) -> StoreResult<Comment> {
    let written = store.create(NewRecord::Comment {
        text: input.text,
        post_id: input.post_id.to_string(),
        author_id: input.author_id.to_string(),
    }).await?;
    reread(store, written, Record::into_comment).await
}

pub(crate) async fn update_comment(
    store: &dyn Store,
    id: &str,
    input: UpdateCommentInput,
) -> StoreResult<Comment> {
    let written = store.update(id, Changes::Comment { text: input.text }).await?;
    reread(store, written, Record::into_comment).await
}

pub(crate) async fn create_profile(
    store: &dyn Store,
    input: CreateProfileInput,
) -> StoreResult<Profile> {
    let written = store.create(NewRecord::Profile {
        bio: input.bio,
        avatar_url: input.avatar_url,
        user_id: input.user_id.to_string(),
    }).await?;
    reread(store, written, Record::into_profile).await
}

pub(crate) async fn update_profile(
    store: &dyn Store,
    id: &str,
    input: UpdateProfileInput,
) -> StoreResult<Profile> {
    let changes = Changes::Profile { bio: input.bio, avatar_url: input.avatar_url };
    let written = store.update(id, changes).await?;
    reread(store, written, Record::into_profile).await
}

/// Links each post in `post_ids` with `target`, a freshly written tag or category.
async fn link_posts(
    store: &dyn Store,
    link: Link,
    target: &Record,
    post_ids: Option<Vec<ID>>,
) -> StoreResult<()> {
    let requests = ids(post_ids).into_iter()
        .map(|post_id| LinkRequest { link, post_id, target_id: target.id().to_owned() })
        .collect();
    link_all(store, target, requests, Requested::Post).await
}

pub(crate) async fn create_category(
    store: &dyn Store,
    input: CreateCategoryInput,
) -> StoreResult<Category> {
    let written = store.create(NewRecord::Category { name: input.name }).await?;
    link_posts(store, Link::PostCategory, &written, input.post_ids).await?;
    reread(store, written, Record::into_category).await
}

pub(crate) async fn update_category(
    store: &dyn Store,
    id: &str,
    input: UpdateCategoryInput,
) -> StoreResult<Category> {
    let written = store.update(id, Changes::Category { name: input.name }).await?;
    link_posts(store, Link::PostCategory, &written, input.post_ids).await?;
    reread(store, written, Record::into_category).await
}

pub(crate) async fn create_tag(store: &dyn Store, input: CreateTagInput) -> StoreResult<Tag> {
    let written = store.create(NewRecord::Tag { name: input.name }).await?;
    link_posts(store, Link::PostTag, &written, input.post_ids).await?;
    reread(store, written, Record::into_tag).await
}

pub(crate) async fn update_tag(
    store: &dyn Store,
    id: &str,
    input: UpdateTagInput,
) -> StoreResult<Tag> {
    let written = store.update(id, Changes::Tag { name: input.name }).await?;
    link_posts(store, Link::PostTag, &written, input.post_ids).await?;
    reread(store, written, Record::into_tag).await
}

pub(crate) async fn like_post(store: &dyn Store, user_id: &str, post_id: &str) -> StoreResult<Like> {
    let new = NewRecord::Like { user_id: user_id.to_owned(), post_id: post_id.to_owned() };
    let written = store.create(new).await?;
    reread(store, written, Record::into_like).await
}

pub(crate) async fn send_message(store: &dyn Store, input: SendMessageInput) -> StoreResult<Message> {
    let written = store.create(NewRecord::Message {
        content: input.content,
        sender_id: input.sender_id.to_string(),
        receiver_id: input.receiver_id.to_string(),
    }).await?;
    reread(store, written, Record::into_message).await
}

pub(crate) async fn update_message(
    store: &dyn Store,
    id: &str,
    input: UpdateMessageInput,
) -> StoreResult<Message> {
    let changes = Changes::Message { content: input.content, read: input.read };
    let written = store.update(id, changes).await?;
    reread(store, written, Record::into_message).await
}

pub(crate) async fn create_notification(
    store: &dyn Store,
    input: CreateNotificationInput,
) -> StoreResult<Notification> {
    let written = store.create(NewRecord::Notification {
        kind: input.kind,
        content: input.content,
        user_id: input.user_id.to_string(),
    }).await?;
    reread(store, written, Record::into_notification).await
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    async fn user(store: &dyn Store, name: &str) -> User {
        create_user(store, CreateUserInput {
            name: name.into(),
            email: format!("{}@example.org", name.to_lowercase()),
        }).await.unwrap()
    }

    async fn post(store: &dyn Store, title: &str, author: &User) -> Post {
        create_post(store, CreatePostInput {
            title: title.into(),
            content: None,
            status: None,
            author_id: author.id.clone().into(),
            tag_ids: None,
            category_ids: None,
        }).await.unwrap()
    }

    #[tokio::test]
    async fn tag_posts_are_entities_not_join_rows() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;
        let p1 = post(&store, "Ann's trip", &ann).await;

        let created = create_tag(&store, CreateTagInput {
            name: "go".into(),
            post_ids: Some(vec![p1.id.clone().into()]),
        }).await.unwrap();

        let tag = get_tag(&store, &created.id).await.unwrap().unwrap();
        let posts = tag.posts.unwrap();
        assert_eq!(posts.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec![p1.id.as_str()]);
        assert_eq!(posts[0].title, "Ann's trip");

        let p1 = get_post(&store, &p1.id).await.unwrap().unwrap();
        assert_eq!(p1.tags.unwrap()[0].name, "go");
    }

    #[tokio::test]
    async fn failed_links_are_reported_but_kept_partial() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;
        let p1 = post(&store, "first", &ann).await;

        let err = create_category(&store, CreateCategoryInput {
            name: "travel".into(),
            post_ids: Some(vec![p1.id.clone().into(), ID::new("missing-post")]),
        }).await.unwrap_err();

        match err {
            StoreError::PartialFailure { failed, .. } => assert_eq!(failed, vec!["missing-post"]),
            other => panic!("unexpected error: {other:?}"),
        }

        // The category and the valid link were written anyway.
        let categories = get_categories(&store).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "travel");
        assert_eq!(categories[0].posts.as_ref().unwrap()[0].id, p1.id);
    }

    #[tokio::test]
    async fn create_post_links_tags_and_categories() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;
        let go = create_tag(&store, CreateTagInput { name: "go".into(), post_ids: None })
            .await.unwrap();
        let dev = create_category(&store, CreateCategoryInput { name: "dev".into(), post_ids: None })
            .await.unwrap();

        let created = create_post(&store, CreatePostInput {
            title: "Generics".into(),
            content: Some("...".into()),
            status: Some(crate::model::PostStatus::Published),
            author_id: ann.id.clone().into(),
            tag_ids: Some(vec![go.id.clone().into()]),
            category_ids: Some(vec![dev.id.clone().into()]),
        }).await.unwrap();

        assert_eq!(created.author.as_ref().map(|a| a.id.as_str()), Some(ann.id.as_str()));
        assert_eq!(created.tags.unwrap()[0].id, go.id);
        assert_eq!(created.categories.unwrap()[0].id, dev.id);
    }

    #[tokio::test]
    async fn create_post_with_unknown_author_is_rejected() {
        let store = MemoryStore::new();
        let err = create_post(&store, CreatePostInput {
            title: "Orphan".into(),
            content: None,
            status: None,
            author_id: ID::new("nobody"),
            tag_ids: None,
            category_ids: None,
        }).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn updates_keep_absent_fields() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;

        let renamed = update_user(&store, &ann.id, UpdateUserInput {
            name: Some("Annie".into()),
            email: None,
        }).await.unwrap();
        assert_eq!(renamed.name, "Annie");
        assert_eq!(renamed.email, ann.email);

        let err = update_user(&store, "ghost", UpdateUserInput::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: Kind::User, .. }));
    }

    #[tokio::test]
    async fn messages_by_sender_and_receiver() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;
        let bob = user(&store, "Bob").await;

        let hello = send_message(&store, SendMessageInput {
            content: "hello".into(),
            sender_id: ann.id.clone().into(),
            receiver_id: bob.id.clone().into(),
        }).await.unwrap();
        assert!(!hello.read);
        assert_eq!(hello.receiver.as_ref().unwrap().name, "Bob");

        let sent = get_messages_sent(&store, &ann.id).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert!(get_messages_received(&store, &ann.id).await.unwrap().is_empty());
        assert_eq!(get_messages_received(&store, &bob.id).await.unwrap()[0].id, hello.id);
        assert!(get_messages_sent(&store, "nobody").await.unwrap().is_empty());

        let read = update_message(&store, &hello.id, UpdateMessageInput {
            content: None,
            read: Some(true),
        }).await.unwrap();
        assert!(read.read);
        assert_eq!(read.content, "hello");
    }

    #[tokio::test]
    async fn likes_and_notifications() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;
        let bob = user(&store, "Bob").await;
        let p = post(&store, "first", &ann).await;

        let like = like_post(&store, &bob.id, &p.id).await.unwrap();
        assert_eq!(like.post.as_ref().unwrap().id, p.id);
        assert!(matches!(
            like_post(&store, &bob.id, &p.id).await,
            Err(StoreError::Validation(_)),
        ));

        create_notification(&store, CreateNotificationInput {
            kind: "LIKE".into(),
            content: "Bob likes your post".into(),
            user_id: ann.id.clone().into(),
        }).await.unwrap();
        let notifications = get_notifications(&store, &ann.id).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, "LIKE");
        assert_eq!(notifications[0].user.as_ref().unwrap().id, ann.id);

        let p = get_post(&store, &p.id).await.unwrap().unwrap();
        assert_eq!(p.likes.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profile_round_trip() {
        let store = MemoryStore::new();
        let ann = user(&store, "Ann").await;

        let profile = create_profile(&store, CreateProfileInput {
            bio: Some("Hiker".into()),
            avatar_url: None,
            user_id: ann.id.clone().into(),
        }).await.unwrap();
        let profile = update_profile(&store, &profile.id, UpdateProfileInput {
            bio: None,
            avatar_url: Some("https://example.org/ann.png".into()),
        }).await.unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Hiker"));

        let ann = get_user(&store, &ann.id).await.unwrap().unwrap();
        assert_eq!(ann.profile.unwrap().id, profile.id);
    }
}

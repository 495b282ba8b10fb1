//! A store that keeps everything in process memory. Used with
//! `store.backend = "memory"` and throughout the tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    model::{
        Category, Comment, Kind, Like, Message, Notification, Post, Profile, Record, Relation,
        Tag, User,
    },
    prelude::*,
};
use super::{Changes, Filter, Link, NewRecord, Store, StoreError, StoreResult};


#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: RwLock<Tables>,
    num_queries: AtomicU64,
}

/// All rows in insertion order. Rows never have relations loaded.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    profiles: Vec<Profile>,
    likes: Vec<Like>,
    tags: Vec<Tag>,
    categories: Vec<Category>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,

    /// `(post_id, tag_id)`
    post_tags: Vec<(String, String)>,
    /// `(post_id, category_id)`
    post_categories: Vec<(String, String)>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn count_query(&self) {
        self.num_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Inserts a record as is, including its id. Lets tests build states the
    /// public API cannot produce, like one id shared by two kinds.
    #[cfg(test)]
    pub(crate) async fn insert(&self, record: Record) {
        let mut t = self.tables.write().await;
        match record {
            Record::User(x) => t.users.push(x.bare()),
            Record::Post(x) => t.posts.push(x.bare()),
            Record::Comment(x) => t.comments.push(x.bare()),
            Record::Profile(x) => t.profiles.push(x.bare()),
            Record::Like(x) => t.likes.push(x.bare()),
            Record::Tag(x) => t.tags.push(x.bare()),
            Record::Category(x) => t.categories.push(x.bare()),
            Record::Message(x) => t.messages.push(x.bare()),
            Record::Notification(x) => t.notifications.push(x.bare()),
        }
    }
}

fn missing(kind: Kind, id: &str) -> StoreError {
    StoreError::Validation(format!("referenced {kind} '{id}' does not exist"))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Tables {
    fn all(&self, kind: Kind) -> Vec<Record> {
        fn wrap<T: Clone>(rows: &[T], f: fn(T) -> Record) -> Vec<Record> {
            rows.iter().cloned().map(f).collect()
        }

        match kind {
            Kind::User => wrap(&self.users, Record::User),
            Kind::Post => wrap(&self.posts, Record::Post),
            Kind::Comment => wrap(&self.comments, Record::Comment),
            Kind::Profile => wrap(&self.profiles, Record::Profile),
            Kind::Like => wrap(&self.likes, Record::Like),
            Kind::Tag => wrap(&self.tags, Record::Tag),
            Kind::Category => wrap(&self.categories, Record::Category),
            Kind::Message => wrap(&self.messages, Record::Message),
            Kind::Notification => wrap(&self.notifications, Record::Notification),
        }
    }

    fn get(&self, kind: Kind, id: &str) -> Option<Record> {
        macro_rules! find {
            ($table:ident, $variant:ident) => {
                self.$table.iter().find(|x| x.id == id).cloned().map(Record::$variant)
            };
        }

        match kind {
            Kind::User => find!(users, User),
            Kind::Post => find!(posts, Post),
            Kind::Comment => find!(comments, Comment),
            Kind::Profile => find!(profiles, Profile),
            Kind::Like => find!(likes, Like),
            Kind::Tag => find!(tags, Tag),
            Kind::Category => find!(categories, Category),
            Kind::Message => find!(messages, Message),
            Kind::Notification => find!(notifications, Notification),
        }
    }

    fn exists(&self, kind: Kind, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    fn require(&self, kind: Kind, id: &str) -> StoreResult<()> {
        match self.exists(kind, id) {
            true => Ok(()),
            false => Err(missing(kind, id)),
        }
    }

    fn user(&self, id: &str) -> Option<Box<User>> {
        self.users.iter().find(|u| u.id == id).map(|u| Box::new(u.bare()))
    }

    fn post(&self, id: &str) -> Option<Box<Post>> {
        self.posts.iter().find(|p| p.id == id).map(|p| Box::new(p.bare()))
    }

    fn posts_linked(&self, joins: &[(String, String)], target_id: &str) -> Vec<Post> {
        self.posts.iter()
            .filter(|p| joins.iter().any(|(post, target)| *post == p.id && target == target_id))
            .map(Post::bare)
            .collect()
    }

    /// Attaches every relation in `include` that `record`'s kind declares.
    fn load_relations(&self, record: Record, include: &[Relation]) -> Record {
        let kind = record.kind();
        let wants = |r: Relation| kind.declares(r) && include.contains(&r);
        macro_rules! rows {
            ($table:ident where $field:ident == $id:expr) => {
                Some(self.$table.iter().filter(|x| x.$field == *$id).map(|x| x.bare()).collect())
            };
        }

        match record {
            Record::User(mut u) => {
                if wants(Relation::Posts) {
                    u.posts = rows!(posts where author_id == &u.id);
                }
                if wants(Relation::Comments) {
                    u.comments = rows!(comments where author_id == &u.id);
                }
                if wants(Relation::Likes) {
                    u.likes = rows!(likes where user_id == &u.id);
                }
                if wants(Relation::Profile) {
                    u.profile = self.profiles.iter()
                        .find(|p| p.user_id == u.id)
                        .map(|p| Box::new(p.bare()));
                }
                if wants(Relation::MessagesSent) {
                    u.messages_sent = rows!(messages where sender_id == &u.id);
                }
                if wants(Relation::MessagesReceived) {
                    u.messages_received = rows!(messages where receiver_id == &u.id);
                }
                if wants(Relation::Notifications) {
                    u.notifications = rows!(notifications where user_id == &u.id);
                }
                Record::User(u)
            }
            Record::Post(mut p) => {
                if wants(Relation::Author) {
                    p.author = self.user(&p.author_id);
                }
                if wants(Relation::Comments) {
                    p.comments = rows!(comments where post_id == &p.id);
                }
                if wants(Relation::Likes) {
                    p.likes = rows!(likes where post_id == &p.id);
                }
                if wants(Relation::Tags) {
                    let tags = self.tags.iter()
                        .filter(|t| self.post_tags.iter().any(|(post, tag)| *post == p.id && *tag == t.id))
                        .map(Tag::bare)
                        .collect();
                    p.tags = Some(tags);
                }
                if wants(Relation::Categories) {
                    let categories = self.categories.iter()
                        .filter(|c| {
                            self.post_categories.iter().any(|(post, cat)| *post == p.id && *cat == c.id)
                        })
                        .map(Category::bare)
                        .collect();
                    p.categories = Some(categories);
                }
                Record::Post(p)
            }
            Record::Comment(mut c) => {
                if wants(Relation::Author) {
                    c.author = self.user(&c.author_id);
                }
                if wants(Relation::Post) {
                    c.post = self.post(&c.post_id);
                }
                Record::Comment(c)
            }
            Record::Profile(mut p) => {
                if wants(Relation::User) {
                    p.user = self.user(&p.user_id);
                }
                Record::Profile(p)
            }
            Record::Like(mut l) => {
                if wants(Relation::User) {
                    l.user = self.user(&l.user_id);
                }
                if wants(Relation::Post) {
                    l.post = self.post(&l.post_id);
                }
                Record::Like(l)
            }
            Record::Tag(mut t) => {
                if wants(Relation::Posts) {
                    t.posts = Some(self.posts_linked(&self.post_tags, &t.id));
                }
                Record::Tag(t)
            }
            Record::Category(mut c) => {
                if wants(Relation::Posts) {
                    c.posts = Some(self.posts_linked(&self.post_categories, &c.id));
                }
                Record::Category(c)
            }
            Record::Message(mut m) => {
                if wants(Relation::Sender) {
                    m.sender = self.user(&m.sender_id);
                }
                if wants(Relation::Receiver) {
                    m.receiver = self.user(&m.receiver_id);
                }
                Record::Message(m)
            }
            Record::Notification(mut n) => {
                if wants(Relation::User) {
                    n.user = self.user(&n.user_id);
                }
                Record::Notification(n)
            }
        }
    }

    fn insert(&mut self, new: NewRecord) -> StoreResult<Record> {
        let id = new_id();
        let now = Utc::now();

        let record = match new {
            NewRecord::User { name, email } => {
                if self.users.iter().any(|u| u.email == email) {
                    return Err(StoreError::Validation(format!("email '{email}' is already taken")));
                }
                let user = User {
                    id,
                    name,
                    email,
                    created_at: now,
                    posts: None,
                    comments: None,
                    likes: None,
                    profile: None,
                    messages_sent: None,
                    messages_received: None,
                    notifications: None,
                };
                self.users.push(user.clone());
                Record::User(user)
            }
            NewRecord::Post { title, content, status, author_id } => {
                self.require(Kind::User, &author_id)?;
                let post = Post {
                    id,
                    title,
                    content,
                    status,
                    author_id,
                    created_at: now,
                    updated_at: now,
                    author: None,
                    comments: None,
                    likes: None,
                    tags: None,
                    categories: None,
                };
                self.posts.push(post.clone());
                Record::Post(post)
            }
            NewRecord::Comment { text, post_id, author_id } => {
                self.require(Kind::Post, &post_id)?;
                self.require(Kind::User, &author_id)?;
                let comment = Comment {
                    id,
                    text,
                    post_id,
                    author_id,
                    created_at: now,
                    author: None,
                    post: None,
                };
                self.comments.push(comment.clone());
                Record::Comment(comment)
            }
            NewRecord::Profile { bio, avatar_url, user_id } => {
                self.require(Kind::User, &user_id)?;
                if self.profiles.iter().any(|p| p.user_id == user_id) {
                    return Err(StoreError::Validation(
                        format!("User '{user_id}' already has a profile"),
                    ));
                }
                let profile = Profile { id, bio, avatar_url, user_id, user: None };
                self.profiles.push(profile.clone());
                Record::Profile(profile)
            }
            NewRecord::Like { user_id, post_id } => {
                self.require(Kind::User, &user_id)?;
                self.require(Kind::Post, &post_id)?;
                if self.likes.iter().any(|l| l.user_id == user_id && l.post_id == post_id) {
                    return Err(StoreError::Validation(
                        format!("User '{user_id}' already likes Post '{post_id}'"),
                    ));
                }
                let like = Like { id, user_id, post_id, created_at: now, user: None, post: None };
                self.likes.push(like.clone());
                Record::Like(like)
            }
            NewRecord::Tag { name } => {
                if self.tags.iter().any(|t| t.name == name) {
                    return Err(StoreError::Validation(format!("tag '{name}' already exists")));
                }
                let tag = Tag { id, name, posts: None };
                self.tags.push(tag.clone());
                Record::Tag(tag)
            }
            NewRecord::Category { name } => {
                if self.categories.iter().any(|c| c.name == name) {
                    return Err(StoreError::Validation(format!("category '{name}' already exists")));
                }
                let category = Category { id, name, posts: None };
                self.categories.push(category.clone());
                Record::Category(category)
            }
            NewRecord::Message { content, sender_id, receiver_id } => {
                self.require(Kind::User, &sender_id)?;
                self.require(Kind::User, &receiver_id)?;
                let message = Message {
                    id,
                    content,
                    sender_id,
                    receiver_id,
                    read: false,
                    created_at: now,
                    sender: None,
                    receiver: None,
                };
                self.messages.push(message.clone());
                Record::Message(message)
            }
            NewRecord::Notification { kind, content, user_id } => {
                self.require(Kind::User, &user_id)?;
                let notification = Notification {
                    id,
                    kind,
                    content,
                    user_id,
                    read: false,
                    created_at: now,
                    user: None,
                };
                self.notifications.push(notification.clone());
                Record::Notification(notification)
            }
        };

        Ok(record)
    }

    fn apply(&mut self, id: &str, changes: Changes) -> StoreResult<Record> {
        let not_found = || StoreError::NotFound { kind: changes.kind(), id: id.to_owned() };

        macro_rules! row {
            ($table:ident) => {
                self.$table.iter().position(|x| x.id == id).ok_or_else(not_found)?
            };
        }
        macro_rules! set {
            ($target:expr, $value:expr) => {
                if let Some(v) = $value {
                    $target = v;
                }
            };
        }

        let record = match changes.clone() {
            Changes::User { name, email } => {
                let idx = row!(users);
                if let Some(email) = &email {
                    if self.users.iter().any(|u| u.email == *email && u.id != id) {
                        return Err(StoreError::Validation(format!("email '{email}' is already taken")));
                    }
                }
                let user = &mut self.users[idx];
                set!(user.name, name);
                set!(user.email, email);
                Record::User(user.clone())
            }
            Changes::Post { title, content, status } => {
                let idx = row!(posts);
                let post = &mut self.posts[idx];
                set!(post.title, title);
                if content.is_some() {
                    post.content = content;
                }
                set!(post.status, status);
                post.updated_at = Utc::now();
                Record::Post(post.clone())
            }
            Changes::Comment { text } => {
                let idx = row!(comments);
                let comment = &mut self.comments[idx];
                set!(comment.text, text);
                Record::Comment(comment.clone())
            }
            Changes::Profile { bio, avatar_url } => {
                let idx = row!(profiles);
                let profile = &mut self.profiles[idx];
                if bio.is_some() {
                    profile.bio = bio;
                }
                if avatar_url.is_some() {
                    profile.avatar_url = avatar_url;
                }
                Record::Profile(profile.clone())
            }
            Changes::Tag { name } => {
                let idx = row!(tags);
                if let Some(name) = &name {
                    if self.tags.iter().any(|t| t.name == *name && t.id != id) {
                        return Err(StoreError::Validation(format!("tag '{name}' already exists")));
                    }
                }
                let tag = &mut self.tags[idx];
                set!(tag.name, name);
                Record::Tag(tag.clone())
            }
            Changes::Category { name } => {
                let idx = row!(categories);
                if let Some(name) = &name {
                    if self.categories.iter().any(|c| c.name == *name && c.id != id) {
                        return Err(StoreError::Validation(format!("category '{name}' already exists")));
                    }
                }
                let category = &mut self.categories[idx];
                set!(category.name, name);
                Record::Category(category.clone())
            }
            Changes::Message { content, read } => {
                let idx = row!(messages);
                let message = &mut self.messages[idx];
                set!(message.content, content);
                set!(message.read, read);
                Record::Message(message.clone())
            }
        };

        Ok(record)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_by_id(
        &self,
        kind: Kind,
        id: &str,
        include: &[Relation],
    ) -> StoreResult<Option<Record>> {
        self.count_query();
        let tables = self.tables.read().await;
        Ok(tables.get(kind, id).map(|r| tables.load_relations(r, include)))
    }

    async fn find_many(
        &self,
        kind: Kind,
        filter: &Filter,
        include: &[Relation],
    ) -> StoreResult<Vec<Record>> {
        self.count_query();
        if let Filter::Contains(field, _) | Filter::Equals(field, _) = filter {
            if !field.belongs_to(kind) {
                return Err(filter.unsupported(kind));
            }
        }
        let tables = self.tables.read().await;

        let mut out = Vec::new();
        for record in tables.all(kind) {
            let keep = match filter {
                Filter::All => true,
                Filter::Contains(field, text) => field.value_of(&record)
                    .ok_or_else(|| filter.unsupported(kind))?
                    .contains(text.as_str()),
                Filter::Equals(field, value) => field.value_of(&record)
                    .ok_or_else(|| filter.unsupported(kind))?
                    == value.as_str(),
            };
            if keep {
                out.push(tables.load_relations(record, include));
            }
        }

        Ok(out)
    }

    async fn create(&self, new: NewRecord) -> StoreResult<Record> {
        self.count_query();
        let kind = new.kind();
        let record = self.tables.write().await.insert(new)?;
        trace!("Created {kind} '{}' in memory store", record.id());
        Ok(record)
    }

    async fn update(&self, id: &str, changes: Changes) -> StoreResult<Record> {
        self.count_query();
        self.tables.write().await.apply(id, changes)
    }

    async fn link(&self, link: Link, post_id: &str, target_id: &str) -> StoreResult<()> {
        self.count_query();
        let mut tables = self.tables.write().await;
        tables.require(Kind::Post, post_id)?;
        tables.require(link.target(), target_id)?;

        let joins = match link {
            Link::PostTag => &mut tables.post_tags,
            Link::PostCategory => &mut tables.post_categories,
        };
        let pair = (post_id.to_owned(), target_id.to_owned());
        if !joins.contains(&pair) {
            joins.push(pair);
        }

        Ok(())
    }

    fn num_queries(&self) -> u64 {
        self.num_queries.load(Ordering::Relaxed)
    }
}

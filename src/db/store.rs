//! The PostgreSQL implementation of [`Store`].

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use deadpool_postgres::Pool;
use postgres_types::ToSql;
use tokio_postgres::{error::SqlState, Row};

use crate::{
    model::{
        Category, Comment, Kind, Like, Message, Notification, Post, Profile, Record, Relation,
        Tag, User,
    },
    prelude::*,
    store::{Changes, Field, Filter, Link, NewRecord, Store, StoreError, StoreResult},
};
use super::Db;


/// A store handle backed by the connection pool. One is created per API
/// request so that `num_queries` counts the queries of that request only.
pub(crate) struct PgStore {
    pool: Pool,
    num_queries: AtomicU64,
}

type Params<'a> = [&'a (dyn ToSql + Sync)];

impl PgStore {
    pub(crate) fn new(pool: Pool) -> Self {
        Self { pool, num_queries: AtomicU64::new(0) }
    }

    async fn connection(&self) -> StoreResult<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }

    /// Runs `sql` through the statement cache of the connection.
    async fn query(&self, db: &Db, sql: &str, params: &Params<'_>) -> StoreResult<Vec<Row>> {
        trace!("Executing SQL query: \"{}\" with {:?}", sql, params);
        let statement = db.prepare_cached(sql).await?;
        self.num_queries.fetch_add(1, Ordering::Relaxed);
        Ok(db.query(&statement, params).await?)
    }

    async fn query_opt(&self, db: &Db, sql: &str, params: &Params<'_>) -> StoreResult<Option<Row>> {
        Ok(self.query(db, sql, params).await?.into_iter().next())
    }

    /// Loads all records of `kind` matching the SQL condition `cond`, which
    /// may refer to `$1` to `$n`. Results are in creation order and bare.
    async fn select(
        &self,
        db: &Db,
        kind: Kind,
        cond: &str,
        params: &Params<'_>,
    ) -> StoreResult<Vec<Record>> {
        let sql = format!(
            "select {} from {} where {} order by seq",
            columns(kind),
            table(kind),
            cond,
        );
        let rows = self.query(db, &sql, params).await?;
        Ok(rows.iter().map(|row| from_row(kind, row)).collect())
    }

    async fn many<T>(
        &self,
        db: &Db,
        kind: Kind,
        cond: &str,
        id: &str,
        into: fn(Record) -> Option<T>,
    ) -> StoreResult<Option<Vec<T>>> {
        let records = self.select(db, kind, cond, &[&id]).await?;
        Ok(Some(records.into_iter().filter_map(into).collect()))
    }

    async fn one<T>(
        &self,
        db: &Db,
        kind: Kind,
        cond: &str,
        id: &str,
        into: fn(Record) -> Option<T>,
    ) -> StoreResult<Option<Box<T>>> {
        let records = self.select(db, kind, cond, &[&id]).await?;
        Ok(records.into_iter().next().and_then(into).map(Box::new))
    }

    /// Attaches every relation in `include` that `record`'s kind declares.
    /// One query per relation.
    async fn load_relations(
        &self,
        db: &Db,
        record: Record,
        include: &[Relation],
    ) -> StoreResult<Record> {
        let kind = record.kind();
        let wants = |r: Relation| kind.declares(r) && include.contains(&r);
        let record = match record {
            Record::User(mut u) => {
                let id = u.id.clone();
                if wants(Relation::Posts) {
                    u.posts = self.many(db, Kind::Post, "author_id = $1", &id, Record::into_post).await?;
                }
                if wants(Relation::Comments) {
                    u.comments = self.many(db, Kind::Comment, "author_id = $1", &id, Record::into_comment)
                        .await?;
                }
                if wants(Relation::Likes) {
                    u.likes = self.many(db, Kind::Like, "user_id = $1", &id, Record::into_like).await?;
                }
                if wants(Relation::Profile) {
                    u.profile = self.one(db, Kind::Profile, "user_id = $1", &id, Record::into_profile)
                        .await?;
                }
                if wants(Relation::MessagesSent) {
                    u.messages_sent = self
                        .many(db, Kind::Message, "sender_id = $1", &id, Record::into_message)
                        .await?;
                }
                if wants(Relation::MessagesReceived) {
                    u.messages_received = self
                        .many(db, Kind::Message, "receiver_id = $1", &id, Record::into_message)
                        .await?;
                }
                if wants(Relation::Notifications) {
                    u.notifications = self
                        .many(db, Kind::Notification, "user_id = $1", &id, Record::into_notification)
                        .await?;
                }
                Record::User(u)
            }
            Record::Post(mut p) => {
                let id = p.id.clone();
                if wants(Relation::Author) {
                    p.author = self.one(db, Kind::User, "id = $1", &p.author_id, Record::into_user)
                        .await?;
                }
                if wants(Relation::Comments) {
                    p.comments = self.many(db, Kind::Comment, "post_id = $1", &id, Record::into_comment)
                        .await?;
                }
                if wants(Relation::Likes) {
                    p.likes = self.many(db, Kind::Like, "post_id = $1", &id, Record::into_like).await?;
                }
                if wants(Relation::Tags) {
                    let cond = "id in (select tag_id from post_tags where post_id = $1)";
                    p.tags = self.many(db, Kind::Tag, cond, &id, Record::into_tag).await?;
                }
                if wants(Relation::Categories) {
                    let cond = "id in (select category_id from post_categories where post_id = $1)";
                    p.categories = self.many(db, Kind::Category, cond, &id, Record::into_category)
                        .await?;
                }
                Record::Post(p)
            }
            Record::Comment(mut c) => {
                if wants(Relation::Author) {
                    c.author = self.one(db, Kind::User, "id = $1", &c.author_id, Record::into_user)
                        .await?;
                }
                if wants(Relation::Post) {
                    c.post = self.one(db, Kind::Post, "id = $1", &c.post_id, Record::into_post).await?;
                }
                Record::Comment(c)
            }
            Record::Profile(mut p) => {
                if wants(Relation::User) {
                    p.user = self.one(db, Kind::User, "id = $1", &p.user_id, Record::into_user).await?;
                }
                Record::Profile(p)
            }
            Record::Like(mut l) => {
                if wants(Relation::User) {
                    l.user = self.one(db, Kind::User, "id = $1", &l.user_id, Record::into_user).await?;
                }
                if wants(Relation::Post) {
                    l.post = self.one(db, Kind::Post, "id = $1", &l.post_id, Record::into_post).await?;
                }
                Record::Like(l)
            }
            Record::Tag(mut t) => {
                if wants(Relation::Posts) {
                    let cond = "id in (select post_id from post_tags where tag_id = $1)";
                    t.posts = self.many(db, Kind::Post, cond, &t.id, Record::into_post).await?;
                }
                Record::Tag(t)
            }
            Record::Category(mut c) => {
                if wants(Relation::Posts) {
                    let cond = "id in (select post_id from post_categories where category_id = $1)";
                    c.posts = self.many(db, Kind::Post, cond, &c.id, Record::into_post).await?;
                }
                Record::Category(c)
            }
            Record::Message(mut m) => {
                if wants(Relation::Sender) {
                    m.sender = self.one(db, Kind::User, "id = $1", &m.sender_id, Record::into_user)
                        .await?;
                }
                if wants(Relation::Receiver) {
                    m.receiver = self.one(db, Kind::User, "id = $1", &m.receiver_id, Record::into_user)
                        .await?;
                }
                Record::Message(m)
            }
            Record::Notification(mut n) => {
                if wants(Relation::User) {
                    n.user = self.one(db, Kind::User, "id = $1", &n.user_id, Record::into_user).await?;
                }
                Record::Notification(n)
            }
        };

        Ok(record)
    }

    /// Runs an `insert ... returning` or `update ... returning` statement and
    /// converts the returned row.
    async fn write(
        &self,
        db: &Db,
        kind: Kind,
        sql: &str,
        params: &Params<'_>,
    ) -> StoreResult<Option<Record>> {
        let row = self.query_opt(db, sql, params).await.map_err(write_error)?;
        Ok(row.map(|row| from_row(kind, &row)))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_by_id(
        &self,
        kind: Kind,
        id: &str,
        include: &[Relation],
    ) -> StoreResult<Option<Record>> {
        let db = self.connection().await?;
        match self.select(&db, kind, "id = $1", &[&id]).await?.into_iter().next() {
            Some(record) => Ok(Some(self.load_relations(&db, record, include).await?)),
            None => Ok(None),
        }
    }

    async fn find_many(
        &self,
        kind: Kind,
        filter: &Filter,
        include: &[Relation],
    ) -> StoreResult<Vec<Record>> {
        let db = self.connection().await?;
        let records = match filter {
            Filter::All => self.select(&db, kind, "true", &[]).await?,
            Filter::Contains(field, text) => {
                let col = column(*field, kind).ok_or_else(|| filter.unsupported(kind))?;
                let cond = format!("strpos({col}, $1) > 0");
                self.select(&db, kind, &cond, &[text]).await?
            }
            Filter::Equals(field, value) => {
                let col = column(*field, kind).ok_or_else(|| filter.unsupported(kind))?;
                let cond = format!("{col} = $1");
                self.select(&db, kind, &cond, &[value]).await?
            }
        };

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(self.load_relations(&db, record, include).await?);
        }
        Ok(out)
    }

    async fn create(&self, new: NewRecord) -> StoreResult<Record> {
        let db = self.connection().await?;
        let kind = new.kind();
        let id = uuid::Uuid::new_v4().to_string();
        let cols = columns(kind);

        let record = match &new {
            NewRecord::User { name, email } => {
                let sql = format!(
                    "insert into users (id, name, email) values ($1, $2, $3) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, name, email]).await?
            }
            NewRecord::Post { title, content, status, author_id } => {
                let sql = format!(
                    "insert into posts (id, title, content, status, author_id) \
                        values ($1, $2, $3, $4, $5) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, title, content, status, author_id]).await?
            }
            NewRecord::Comment { text, post_id, author_id } => {
                let sql = format!(
                    "insert into comments (id, text, post_id, author_id) \
                        values ($1, $2, $3, $4) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, text, post_id, author_id]).await?
            }
            NewRecord::Profile { bio, avatar_url, user_id } => {
                let sql = format!(
                    "insert into profiles (id, bio, avatar_url, user_id) \
                        values ($1, $2, $3, $4) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, bio, avatar_url, user_id]).await?
            }
            NewRecord::Like { user_id, post_id } => {
                let sql = format!(
                    "insert into likes (id, user_id, post_id) values ($1, $2, $3) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, user_id, post_id]).await?
            }
            NewRecord::Tag { name } => {
                let sql = format!("insert into tags (id, name) values ($1, $2) returning {cols}");
                self.write(&db, kind, &sql, &[&id, name]).await?
            }
            NewRecord::Category { name } => {
                let sql = format!(
                    "insert into categories (id, name) values ($1, $2) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, name]).await?
            }
            NewRecord::Message { content, sender_id, receiver_id } => {
                let sql = format!(
                    "insert into messages (id, content, sender_id, receiver_id) \
                        values ($1, $2, $3, $4) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, content, sender_id, receiver_id]).await?
            }
            NewRecord::Notification { kind: ty, content, user_id } => {
                let sql = format!(
                    "insert into notifications (id, type, content, user_id) \
                        values ($1, $2, $3, $4) returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, ty, content, user_id]).await?
            }
        };

        let record = record.ok_or_else(|| {
            StoreError::Backend(anyhow!("insert into '{}' returned no row", table(kind)))
        })?;
        debug!("Created {kind} '{}'", record.id());
        Ok(record)
    }

    async fn update(&self, id: &str, changes: Changes) -> StoreResult<Record> {
        let db = self.connection().await?;
        let kind = changes.kind();
        let cols = columns(kind);

        let record = match &changes {
            Changes::User { name, email } => {
                let sql = format!(
                    "update users set name = coalesce($2, name), email = coalesce($3, email) \
                        where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, name, email]).await?
            }
            Changes::Post { title, content, status } => {
                let sql = format!(
                    "update posts set \
                        title = coalesce($2, title), \
                        content = coalesce($3, content), \
                        status = coalesce($4, status), \
                        updated_at = now() \
                        where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, title, content, status]).await?
            }
            Changes::Comment { text } => {
                let sql = format!(
                    "update comments set text = coalesce($2, text) where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, text]).await?
            }
            Changes::Profile { bio, avatar_url } => {
                let sql = format!(
                    "update profiles set bio = coalesce($2, bio), \
                        avatar_url = coalesce($3, avatar_url) \
                        where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, bio, avatar_url]).await?
            }
            Changes::Tag { name } => {
                let sql = format!(
                    "update tags set name = coalesce($2, name) where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, name]).await?
            }
            Changes::Category { name } => {
                let sql = format!(
                    "update categories set name = coalesce($2, name) where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, name]).await?
            }
            Changes::Message { content, read } => {
                let sql = format!(
                    "update messages set content = coalesce($2, content), \
                        read = coalesce($3, read) \
                        where id = $1 returning {cols}",
                );
                self.write(&db, kind, &sql, &[&id, content, read]).await?
            }
        };

        record.ok_or_else(|| StoreError::NotFound { kind, id: id.to_owned() })
    }

    async fn link(&self, link: Link, post_id: &str, target_id: &str) -> StoreResult<()> {
        let db = self.connection().await?;
        let sql = match link {
            Link::PostTag => "insert into post_tags (post_id, tag_id) values ($1, $2) \
                on conflict do nothing",
            Link::PostCategory => "insert into post_categories (post_id, category_id) \
                values ($1, $2) on conflict do nothing",
        };
        self.query(&db, sql, &[&post_id, &target_id]).await.map_err(write_error)?;
        Ok(())
    }

    fn num_queries(&self) -> u64 {
        self.num_queries.load(Ordering::Relaxed)
    }
}


fn table(kind: Kind) -> &'static str {
    match kind {
        Kind::User => "users",
        Kind::Post => "posts",
        Kind::Comment => "comments",
        Kind::Profile => "profiles",
        Kind::Like => "likes",
        Kind::Tag => "tags",
        Kind::Category => "categories",
        Kind::Message => "messages",
        Kind::Notification => "notifications",
    }
}

/// The selected columns per kind. `from_row` reads them by position.
fn columns(kind: Kind) -> &'static str {
    match kind {
        Kind::User => "id, name, email, created_at",
        Kind::Post => "id, title, content, status, author_id, created_at, updated_at",
        Kind::Comment => "id, text, post_id, author_id, created_at",
        Kind::Profile => "id, bio, avatar_url, user_id",
        Kind::Like => "id, user_id, post_id, created_at",
        Kind::Tag => "id, name",
        Kind::Category => "id, name",
        Kind::Message => "id, content, sender_id, receiver_id, read, created_at",
        Kind::Notification => "id, type, content, user_id, read, created_at",
    }
}

fn column(field: Field, kind: Kind) -> Option<&'static str> {
    let name = match field {
        Field::Name => "name",
        Field::Title => "title",
        Field::Text => "text",
        Field::SenderId => "sender_id",
        Field::ReceiverId => "receiver_id",
        Field::UserId => "user_id",
    };
    field.belongs_to(kind).then_some(name)
}

fn from_row(kind: Kind, row: &Row) -> Record {
    match kind {
        Kind::User => Record::User(User {
            id: row.get(0),
            name: row.get(1),
            email: row.get(2),
            created_at: row.get(3),
            posts: None,
            comments: None,
            likes: None,
            profile: None,
            messages_sent: None,
            messages_received: None,
            notifications: None,
        }),
        Kind::Post => Record::Post(Post {
            id: row.get(0),
            title: row.get(1),
            content: row.get(2),
            status: row.get(3),
            author_id: row.get(4),
            created_at: row.get(5),
            updated_at: row.get(6),
            author: None,
            comments: None,
            likes: None,
            tags: None,
            categories: None,
        }),
        Kind::Comment => Record::Comment(Comment {
            id: row.get(0),
            text: row.get(1),
            post_id: row.get(2),
            author_id: row.get(3),
            created_at: row.get(4),
            author: None,
            post: None,
        }),
        Kind::Profile => Record::Profile(Profile {
            id: row.get(0),
            bio: row.get(1),
            avatar_url: row.get(2),
            user_id: row.get(3),
            user: None,
        }),
        Kind::Like => Record::Like(Like {
            id: row.get(0),
            user_id: row.get(1),
            post_id: row.get(2),
            created_at: row.get(3),
            user: None,
            post: None,
        }),
        Kind::Tag => Record::Tag(Tag { id: row.get(0), name: row.get(1), posts: None }),
        Kind::Category => Record::Category(Category { id: row.get(0), name: row.get(1), posts: None }),
        Kind::Message => Record::Message(Message {
            id: row.get(0),
            content: row.get(1),
            sender_id: row.get(2),
            receiver_id: row.get(3),
            read: row.get(4),
            created_at: row.get(5),
            sender: None,
            receiver: None,
        }),
        Kind::Notification => Record::Notification(Notification {
            id: row.get(0),
            kind: row.get(1),
            content: row.get(2),
            user_id: row.get(3),
            read: row.get(4),
            created_at: row.get(5),
            user: None,
        }),
    }
}

/// Turns constraint violations into validation errors. Everything else stays
/// a backend error.
fn write_error(err: StoreError) -> StoreError {
    let StoreError::Backend(inner) = &err else {
        return err;
    };
    let Some(db_err) = inner
        .downcast_ref::<tokio_postgres::Error>()
        .and_then(|e| e.as_db_error())
    else {
        return err;
    };

    match violation_message(db_err.code(), db_err.constraint().unwrap_or_default()) {
        Some(msg) => StoreError::Validation(msg),
        None => err,
    }
}

/// The message for a violated foreign key or uniqueness constraint of
/// `01-social.sql`. `None` for any other error code.
fn violation_message(code: &SqlState, constraint: &str) -> Option<String> {
    let msg = match *code {
        SqlState::FOREIGN_KEY_VIOLATION => {
            let referenced = match constraint {
                "comments_post_fk" | "likes_post_fk" => "Post",
                c if c.starts_with("post_tags_post") || c.starts_with("post_categories_post") => {
                    "Post"
                }
                c if c.starts_with("post_tags_tag") => "Tag",
                c if c.starts_with("post_categories_category") => "Category",
                _ => "User",
            };
            format!("referenced {referenced} does not exist")
        }
        SqlState::UNIQUE_VIOLATION => match constraint {
            "users_email_unique" => "email is already taken".to_owned(),
            "profiles_user_unique" => "user already has a profile".to_owned(),
            "likes_user_post_unique" => "user already likes this post".to_owned(),
            "tags_name_unique" => "tag already exists".to_owned(),
            "categories_name_unique" => "category already exists".to_owned(),
            other => format!("uniqueness constraint '{other}' violated"),
        },
        _ => return None,
    };

    Some(msg)
}

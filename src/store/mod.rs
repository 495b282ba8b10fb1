//! The storage collaborator every resolver receives explicitly.
//!
//! A [`Store`] loads and writes kind-tagged [`Record`]s. Relations are only
//! loaded when requested via an include list, and only one level deep.
//! Two backends exist: PostgreSQL (`crate::db::PgStore`) and the in-memory
//! [`memory::MemoryStore`].

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    model::{Kind, PostStatus, Record, Relation},
    prelude::*,
};

pub(crate) mod memory;


pub(crate) type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub(crate) trait Store: Send + Sync {
    /// Loads the record of `kind` with the given id, if it exists. Relations in
    /// `include` that `kind` does not declare are ignored.
    async fn find_by_id(
        &self,
        kind: Kind,
        id: &str,
        include: &[Relation],
    ) -> StoreResult<Option<Record>>;

    /// Loads all records of `kind` matching `filter`, in creation order.
    async fn find_many(
        &self,
        kind: Kind,
        filter: &Filter,
        include: &[Relation],
    ) -> StoreResult<Vec<Record>>;

    /// Writes a new record and returns it without any relations loaded.
    async fn create(&self, new: NewRecord) -> StoreResult<Record>;

    /// Applies `changes` to the record with the given id. Returns
    /// `StoreError::NotFound` if there is no such record.
    async fn update(&self, id: &str, changes: Changes) -> StoreResult<Record>;

    /// Creates the join record between a post and a tag or category. Linking
    /// an already linked pair is not an error.
    async fn link(&self, link: Link, post_id: &str, target_id: &str) -> StoreResult<()>;

    /// Number of backend queries this store instance has issued so far.
    fn num_queries(&self) -> u64 {
        0
    }
}

/// Which records `find_many` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Filter {
    All,
    /// Case sensitive substring match.
    Contains(Field, String),
    Equals(Field, String),
}

/// The fields `Filter` can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Name,
    Title,
    Text,
    SenderId,
    ReceiverId,
    UserId,
}

impl Field {
    /// Whether records of `kind` have this field.
    pub(crate) fn belongs_to(self, kind: Kind) -> bool {
        matches!(
            (self, kind),
            (Field::Name, Kind::User | Kind::Tag | Kind::Category)
                | (Field::Title, Kind::Post)
                | (Field::Text, Kind::Comment)
                | (Field::SenderId | Field::ReceiverId, Kind::Message)
                | (Field::UserId, Kind::Profile | Kind::Like | Kind::Notification),
        )
    }

    /// Returns the value of this field in `record`, or `None` if records of
    /// that kind do not have this field.
    pub(crate) fn value_of(self, record: &Record) -> Option<&str> {
        match (self, record) {
            (Field::Name, Record::User(x)) => Some(&x.name),
            (Field::Name, Record::Tag(x)) => Some(&x.name),
            (Field::Name, Record::Category(x)) => Some(&x.name),
            (Field::Title, Record::Post(x)) => Some(&x.title),
            (Field::Text, Record::Comment(x)) => Some(&x.text),
            (Field::SenderId, Record::Message(x)) => Some(&x.sender_id),
            (Field::ReceiverId, Record::Message(x)) => Some(&x.receiver_id),
            (Field::UserId, Record::Profile(x)) => Some(&x.user_id),
            (Field::UserId, Record::Like(x)) => Some(&x.user_id),
            (Field::UserId, Record::Notification(x)) => Some(&x.user_id),
            _ => None,
        }
    }
}

impl Filter {
    /// Error returned by backends for a field the filtered kind lacks.
    pub(crate) fn unsupported(&self, kind: Kind) -> StoreError {
        StoreError::Backend(anyhow!("filter {self:?} cannot be applied to {kind} records"))
    }
}

/// Data for a new record. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub(crate) enum NewRecord {
    User { name: String, email: String },
    Post { title: String, content: Option<String>, status: PostStatus, author_id: String },
    Comment { text: String, post_id: String, author_id: String },
    Profile { bio: Option<String>, avatar_url: Option<String>, user_id: String },
    Like { user_id: String, post_id: String },
    Tag { name: String },
    Category { name: String },
    Message { content: String, sender_id: String, receiver_id: String },
    Notification { kind: String, content: String, user_id: String },
}

impl NewRecord {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Self::User { .. } => Kind::User,
            Self::Post { .. } => Kind::Post,
            Self::Comment { .. } => Kind::Comment,
            Self::Profile { .. } => Kind::Profile,
            Self::Like { .. } => Kind::Like,
            Self::Tag { .. } => Kind::Tag,
            Self::Category { .. } => Kind::Category,
            Self::Message { .. } => Kind::Message,
            Self::Notification { .. } => Kind::Notification,
        }
    }
}

/// Changes to an existing record. `None` leaves a field untouched.
#[derive(Debug, Clone)]
pub(crate) enum Changes {
    User { name: Option<String>, email: Option<String> },
    Post { title: Option<String>, content: Option<String>, status: Option<PostStatus> },
    Comment { text: Option<String> },
    Profile { bio: Option<String>, avatar_url: Option<String> },
    Tag { name: Option<String> },
    Category { name: Option<String> },
    Message { content: Option<String>, read: Option<bool> },
}

impl Changes {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Self::User { .. } => Kind::User,
            Self::Post { .. } => Kind::Post,
            Self::Comment { .. } => Kind::Comment,
            Self::Profile { .. } => Kind::Profile,
            Self::Tag { .. } => Kind::Tag,
            Self::Category { .. } => Kind::Category,
            Self::Message { .. } => Kind::Message,
        }
    }
}

/// The many-to-many associations of posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    PostTag,
    PostCategory,
}

impl Link {
    /// Kind of the record on the other side of the post.
    pub(crate) fn target(self) -> Kind {
        match self {
            Link::PostTag => Kind::Tag,
            Link::PostCategory => Kind::Category,
        }
    }
}


#[derive(Debug)]
pub(crate) enum StoreError {
    /// A record that had to exist for the operation does not.
    NotFound { kind: Kind, id: String },

    /// The write was rejected: a referenced record is missing or a
    /// uniqueness rule would be broken.
    Validation(String),

    /// Part of a multi-step write failed. Steps that succeeded stay written.
    PartialFailure { msg: String, failed: Vec<String> },

    /// The backend itself failed (connection, SQL error, ...).
    Backend(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} '{id}' does not exist"),
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::PartialFailure { msg, failed } => {
                write!(f, "{msg} (failed: {})", failed.join(", "))
            }
            Self::Backend(e) => write!(f, "storage backend error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(src: tokio_postgres::Error) -> Self {
        Self::Backend(src.into())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(src: deadpool_postgres::PoolError) -> Self {
        Self::Backend(src.into())
    }
}


/// Which storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Backend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, confique::Config)]
pub(crate) struct StoreConfig {
    /// Where data is stored. "postgres" uses the database configured in the
    /// `[db]` section. "memory" keeps everything in the process and loses it
    /// on exit; the `[db]` section is then ignored.
    #[config(default = "postgres")]
    pub(crate) backend: Backend,
}

/// Hands out one store handle per API request.
#[derive(Clone)]
pub(crate) enum StoreProvider {
    Postgres(deadpool_postgres::Pool),
    Memory(Arc<memory::MemoryStore>),
}

impl StoreProvider {
    pub(crate) fn for_request(&self) -> Arc<dyn Store> {
        match self {
            Self::Postgres(pool) => Arc::new(crate::db::PgStore::new(pool.clone())),
            Self::Memory(store) => store.clone(),
        }
    }
}

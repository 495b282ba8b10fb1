//! The domain model: the closed set of entity kinds, their relations and the
//! kind-tagged [`Record`] every storage backend hands out.

use std::fmt;

mod entities;
pub(crate) mod input;
mod record;

#[cfg(test)]
pub(crate) use self::entities::fixtures;

pub(crate) use self::{
    entities::{
        Category, Comment, Like, Message, Notification, Post, PostStatus, Profile, Tag, User,
    },
    record::Record,
};


/// All kinds of entities. The declaration order is the priority order used
/// when resolving an id that is not tied to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Kind {
    User,
    Post,
    Comment,
    Profile,
    Like,
    Tag,
    Category,
    Message,
    Notification,
}

impl Kind {
    /// Every kind, highest priority first.
    pub(crate) const PRIORITY: [Kind; 9] = [
        Kind::User,
        Kind::Post,
        Kind::Comment,
        Kind::Profile,
        Kind::Like,
        Kind::Tag,
        Kind::Category,
        Kind::Message,
        Kind::Notification,
    ];

    /// The relations declared for this kind. This is also the include list
    /// used whenever a single record of this kind is loaded.
    pub(crate) fn relations(self) -> &'static [Relation] {
        use Relation::*;

        match self {
            Kind::User => &[
                Posts, Comments, Likes, Profile, MessagesSent, MessagesReceived, Notifications,
            ],
            Kind::Post => &[Author, Comments, Likes, Tags, Categories],
            Kind::Comment => &[Author, Post],
            Kind::Profile => &[User],
            Kind::Like => &[User, Post],
            Kind::Tag | Kind::Category => &[Posts],
            Kind::Message => &[Sender, Receiver],
            Kind::Notification => &[User],
        }
    }

    pub(crate) fn declares(self, relation: Relation) -> bool {
        self.relations().contains(&relation)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Kind::User => "User",
            Kind::Post => "Post",
            Kind::Comment => "Comment",
            Kind::Profile => "Profile",
            Kind::Like => "Like",
            Kind::Tag => "Tag",
            Kind::Category => "Category",
            Kind::Message => "Message",
            Kind::Notification => "Notification",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named link from one entity to related entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Relation {
    Posts,
    Comments,
    Likes,
    Profile,
    MessagesSent,
    MessagesReceived,
    Notifications,
    Author,
    Tags,
    Categories,
    Post,
    User,
    Sender,
    Receiver,
}

impl Relation {
    /// Whether this relation points to many records (as opposed to at most one).
    pub(crate) fn is_list(self) -> bool {
        matches!(
            self,
            Self::Posts
                | Self::Comments
                | Self::Likes
                | Self::MessagesSent
                | Self::MessagesReceived
                | Self::Notifications
                | Self::Tags
                | Self::Categories,
        )
    }
}

use chrono::{DateTime, Utc};
use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Comment, Like, Message, Notification, Post, Profile, User},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl User {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Posts written by this user.
    fn posts(&self) -> &[Post] {
        self.posts.as_deref().unwrap_or_default()
    }

    /// Comments written by this user.
    fn comments(&self) -> &[Comment] {
        self.comments.as_deref().unwrap_or_default()
    }

    fn likes(&self) -> &[Like] {
        self.likes.as_deref().unwrap_or_default()
    }

    fn profile(&self) -> Option<&Profile> {
        self.profile.as_deref()
    }

    fn messages_sent(&self) -> &[Message] {
        self.messages_sent.as_deref().unwrap_or_default()
    }

    fn messages_received(&self) -> &[Message] {
        self.messages_received.as_deref().unwrap_or_default()
    }

    fn notifications(&self) -> &[Notification] {
        self.notifications.as_deref().unwrap_or_default()
    }
}

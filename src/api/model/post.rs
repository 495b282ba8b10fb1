use chrono::{DateTime, Utc};
use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Category, Comment, Like, Post, PostStatus, Tag, User},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl Post {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn status(&self) -> PostStatus {
        self.status
    }

    fn author_id(&self) -> ID {
        ID::new(&self.author_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn author(&self) -> Option<&User> {
        self.author.as_deref()
    }

    fn comments(&self) -> &[Comment] {
        self.comments.as_deref().unwrap_or_default()
    }

    fn likes(&self) -> &[Like] {
        self.likes.as_deref().unwrap_or_default()
    }

    /// The tags of this post (not the join records linking them).
    fn tags(&self) -> &[Tag] {
        self.tags.as_deref().unwrap_or_default()
    }

    fn categories(&self) -> &[Category] {
        self.categories.as_deref().unwrap_or_default()
    }
}

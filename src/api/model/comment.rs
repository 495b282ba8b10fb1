use chrono::{DateTime, Utc};
use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Comment, Post, User},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl Comment {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn post_id(&self) -> ID {
        ID::new(&self.post_id)
    }

    fn author_id(&self) -> ID {
        ID::new(&self.author_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn author(&self) -> Option<&User> {
        self.author.as_deref()
    }

    fn post(&self) -> Option<&Post> {
        self.post.as_deref()
    }
}

use chrono::{DateTime, Utc};
use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Like, Post, User},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl Like {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn user_id(&self) -> ID {
        ID::new(&self.user_id)
    }

    fn post_id(&self) -> ID {
        ID::new(&self.post_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn user(&self) -> Option<&User> {
        self.user.as_deref()
    }

    fn post(&self) -> Option<&Post> {
        self.post.as_deref()
    }
}

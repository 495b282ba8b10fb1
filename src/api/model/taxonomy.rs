//! Tags and categories: both are named groups of posts.

use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Category, Post, Tag},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl Tag {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn posts(&self) -> &[Post] {
        self.posts.as_deref().unwrap_or_default()
    }
}

#[graphql_object(Context = Context, impl = NodeValue)]
impl Category {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn posts(&self) -> &[Post] {
        self.posts.as_deref().unwrap_or_default()
    }
}

use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Profile, User},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl Profile {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    fn user_id(&self) -> ID {
        ID::new(&self.user_id)
    }

    fn user(&self) -> Option<&User> {
        self.user.as_deref()
    }
}

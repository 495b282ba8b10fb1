use chrono::{DateTime, Utc};
use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Notification, User},
};


#[graphql_object(Context = Context, impl = NodeValue)]
impl Notification {
    fn id(&self) -> ID {
        Node::id(self)
    }

    /// Free-form category of the notification, e.g. `LIKE` or `COMMENT`.
    #[graphql(name = "type")]
    fn kind(&self) -> &str {
        &self.kind
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn user_id(&self) -> ID {
        ID::new(&self.user_id)
    }

    fn read(&self) -> bool {
        self.read
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn user(&self) -> Option<&User> {
        self.user.as_deref()
    }
}

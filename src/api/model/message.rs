use chrono::{DateTime, Utc};
use juniper::{graphql_object, ID};

use crate::{
    api::{Context, Node, NodeValue},
    model::{Message, User},
};


/// A direct message from one user to another.
#[graphql_object(Context = Context, impl = NodeValue)]
impl Message {
    fn id(&self) -> ID {
        Node::id(self)
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn sender_id(&self) -> ID {
        ID::new(&self.sender_id)
    }

    fn receiver_id(&self) -> ID {
        ID::new(&self.receiver_id)
    }

    /// Whether the receiver has read the message.
    fn read(&self) -> bool {
        self.read
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sender(&self) -> Option<&User> {
        self.sender.as_deref()
    }

    fn receiver(&self) -> Option<&User> {
        self.receiver.as_deref()
    }
}

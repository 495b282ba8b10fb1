use juniper::ID;

use crate::{
    api::{Context, err::{ApiResult, internal_server_error}},
    model::{
        Category, Comment, Kind, Like, Message, Notification, Post, Profile, Record, Tag, User,
    },
    resolver,
};


/// A record that can be fetched by its id alone, via `node(id)`.
#[juniper::graphql_interface(
    Context = Context,
    for = [User, Post, Comment, Profile, Like, Tag, Category, Message, Notification],
)]
pub(crate) trait Node {
    fn id(&self) -> ID;
}

/// Wraps `record` in the GraphQL object type named by its kind tag.
pub(crate) fn node_from_record(record: Record) -> ApiResult<NodeValue> {
    let kind = resolver::resolve_kind_of_record(&record);
    let node = match kind {
        Kind::User => record.into_user().map(NodeValue::from),
        Kind::Post => record.into_post().map(NodeValue::from),
        Kind::Comment => record.into_comment().map(NodeValue::from),
        Kind::Profile => record.into_profile().map(NodeValue::from),
        Kind::Like => record.into_like().map(NodeValue::from),
        Kind::Tag => record.into_tag().map(NodeValue::from),
        Kind::Category => record.into_category().map(NodeValue::from),
        Kind::Message => record.into_message().map(NodeValue::from),
        Kind::Notification => record.into_notification().map(NodeValue::from),
    };

    node.ok_or_else(|| internal_server_error!("record does not carry its {} payload", kind))
}

macro_rules! impl_node {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Node for $ty {
                fn id(&self) -> ID {
                    ID::new(&self.id)
                }
            }
        )+
    };
}

impl_node!(User, Post, Comment, Profile, Like, Tag, Category, Message, Notification);

use juniper::{graphql_object, ID};

use crate::{
    model::{Category, Message, Notification, Post, Tag, User},
    resolver,
};
use super::{
    Context,
    NodeValue,
    node_from_record,
    err::ApiResult,
    model::search::SearchResult,
};


/// The root query object.
pub(crate) struct Query;

#[graphql_object(Context = Context)]
impl Query {
    /// Returns the user with the given ID, or `null` if it does not exist.
    async fn get_user(id: ID, context: &Context) -> ApiResult<Option<User>> {
        Ok(resolver::get_user(context.store(), &id).await?)
    }

    async fn get_post(id: ID, context: &Context) -> ApiResult<Option<Post>> {
        Ok(resolver::get_post(context.store(), &id).await?)
    }

    async fn get_category(id: ID, context: &Context) -> ApiResult<Option<Category>> {
        Ok(resolver::get_category(context.store(), &id).await?)
    }

    /// Returns all categories, each with its posts.
    async fn get_categories(context: &Context) -> ApiResult<Vec<Category>> {
        Ok(resolver::get_categories(context.store()).await?)
    }

    async fn get_tag(id: ID, context: &Context) -> ApiResult<Option<Tag>> {
        Ok(resolver::get_tag(context.store(), &id).await?)
    }

    /// Returns all tags, each with its posts.
    async fn get_tags(context: &Context) -> ApiResult<Vec<Tag>> {
        Ok(resolver::get_tags(context.store()).await?)
    }

    /// Messages sent by the given user, oldest first.
    async fn get_messages_sent(user_id: ID, context: &Context) -> ApiResult<Vec<Message>> {
        Ok(resolver::get_messages_sent(context.store(), &user_id).await?)
    }

    /// Messages received by the given user, oldest first.
    async fn get_messages_received(user_id: ID, context: &Context) -> ApiResult<Vec<Message>> {
        Ok(resolver::get_messages_received(context.store(), &user_id).await?)
    }

    async fn get_notifications(user_id: ID, context: &Context) -> ApiResult<Vec<Notification>> {
        Ok(resolver::get_notifications(context.store(), &user_id).await?)
    }

    /// Users by name, then posts by title, then comments by text. Every
    /// record containing `text` (case sensitive) is returned, unranked.
    async fn search(text: String, context: &Context) -> ApiResult<Vec<SearchResult>> {
        resolver::search(context.store(), &text).await?
            .into_iter()
            .map(SearchResult::from_record)
            .collect()
    }

    /// Returns the record with the given ID, whatever its kind. If several
    /// kinds share the ID, users win over posts, posts over comments and so
    /// on. Returns `null` if nothing has this ID.
    async fn node(id: ID, context: &Context) -> ApiResult<Option<NodeValue>> {
        resolver::resolve_node_by_id(context.store(), &id).await?
            .map(node_from_record)
            .transpose()
    }
}

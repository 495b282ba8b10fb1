use juniper::{graphql_object, ID};

use crate::{
    model::{
        input::*, Category, Comment, Like, Message, Notification, Post, Profile, Tag, User,
    },
    resolver,
};
use super::{Context, err::ApiResult};


/// The root mutation object.
///
/// Writes are not wrapped in a transaction. If one step of a mutation fails,
/// the steps before it stay written and a `PARTIAL_FAILURE` error is returned.
pub(crate) struct Mutation;

#[graphql_object(Context = Context)]
impl Mutation {
    async fn create_user(input: CreateUserInput, context: &Context) -> ApiResult<User> {
        Ok(resolver::create_user(context.store(), input).await?)
    }

    async fn update_user(id: ID, input: UpdateUserInput, context: &Context) -> ApiResult<User> {
        Ok(resolver::update_user(context.store(), &id, input).await?)
    }

    /// Creates a post and links it to the given tags and categories.
    async fn create_post(input: CreatePostInput, context: &Context) -> ApiResult<Post> {
        Ok(resolver::create_post(context.store(), input).await?)
    }

    async fn update_post(id: ID, input: UpdatePostInput, context: &Context) -> ApiResult<Post> {
        Ok(resolver::update_post(context.store(), &id, input).await?)
    }

    async fn create_comment(input: CreateCommentInput, context: &Context) -> ApiResult<Comment> {
        Ok(resolver::create_comment(context.store(), input).await?)
    }

    async fn update_comment(
        id: ID,
        input: UpdateCommentInput,
        context: &Context,
    ) -> ApiResult<Comment> {
        Ok(resolver::update_comment(context.store(), &id, input).await?)
    }

    async fn create_profile(input: CreateProfileInput, context: &Context) -> ApiResult<Profile> {
        Ok(resolver::create_profile(context.store(), input).await?)
    }

    async fn update_profile(
        id: ID,
        input: UpdateProfileInput,
        context: &Context,
    ) -> ApiResult<Profile> {
        Ok(resolver::update_profile(context.store(), &id, input).await?)
    }

    async fn create_category(
        input: CreateCategoryInput,
        context: &Context,
    ) -> ApiResult<Category> {
        Ok(resolver::create_category(context.store(), input).await?)
    }

    /// Renames the category and/or adds posts to it.
    async fn update_category(
        id: ID,
        input: UpdateCategoryInput,
        context: &Context,
    ) -> ApiResult<Category> {
        Ok(resolver::update_category(context.store(), &id, input).await?)
    }

    async fn create_tag(input: CreateTagInput, context: &Context) -> ApiResult<Tag> {
        Ok(resolver::create_tag(context.store(), input).await?)
    }

    /// Renames the tag and/or adds posts to it.
    async fn update_tag(id: ID, input: UpdateTagInput, context: &Context) -> ApiResult<Tag> {
        Ok(resolver::update_tag(context.store(), &id, input).await?)
    }

    /// A user can like each post only once.
    async fn like_post(user_id: ID, post_id: ID, context: &Context) -> ApiResult<Like> {
        Ok(resolver::like_post(context.store(), &user_id, &post_id).await?)
    }

    async fn send_message(input: SendMessageInput, context: &Context) -> ApiResult<Message> {
        Ok(resolver::send_message(context.store(), input).await?)
    }

    async fn update_message(
        id: ID,
        input: UpdateMessageInput,
        context: &Context,
    ) -> ApiResult<Message> {
        Ok(resolver::update_message(context.store(), &id, input).await?)
    }

    async fn create_notification(
        input: CreateNotificationInput,
        context: &Context,
    ) -> ApiResult<Notification> {
        Ok(resolver::create_notification(context.store(), input).await?)
    }
}

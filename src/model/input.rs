//! Arguments of the mutations, as accepted by the API.

use juniper::{GraphQLInputObject, ID};

use super::PostStatus;


#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreateUserInput {
    pub(crate) name: String,
    pub(crate) email: String,
}

#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdateUserInput {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreatePostInput {
    pub(crate) title: String,
    pub(crate) content: Option<String>,
    /// Defaults to `DRAFT`.
    pub(crate) status: Option<PostStatus>,
    pub(crate) author_id: ID,
    /// Tags to attach right away.
    pub(crate) tag_ids: Option<Vec<ID>>,
    /// Categories to attach right away.
    pub(crate) category_ids: Option<Vec<ID>>,
}

#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdatePostInput {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) status: Option<PostStatus>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreateCommentInput {
    pub(crate) text: String,
    pub(crate) post_id: ID,
    pub(crate) author_id: ID,
}

#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdateCommentInput {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreateProfileInput {
    pub(crate) bio: Option<String>,
    pub(crate) avatar_url: Option<String>,
    pub(crate) user_id: ID,
}

#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdateProfileInput {
    pub(crate) bio: Option<String>,
    pub(crate) avatar_url: Option<String>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreateTagInput {
    pub(crate) name: String,
    pub(crate) post_ids: Option<Vec<ID>>,
}

/// `postIds` are added to the existing links, never removed.
#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdateTagInput {
    pub(crate) name: Option<String>,
    pub(crate) post_ids: Option<Vec<ID>>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreateCategoryInput {
    pub(crate) name: String,
    pub(crate) post_ids: Option<Vec<ID>>,
}

/// `postIds` are added to the existing links, never removed.
#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdateCategoryInput {
    pub(crate) name: Option<String>,
    pub(crate) post_ids: Option<Vec<ID>>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct SendMessageInput {
    pub(crate) content: String,
    pub(crate) sender_id: ID,
    pub(crate) receiver_id: ID,
}

#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub(crate) struct UpdateMessageInput {
    pub(crate) content: Option<String>,
    pub(crate) read: Option<bool>,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub(crate) struct CreateNotificationInput {
    #[graphql(name = "type")]
    pub(crate) kind: String,
    pub(crate) content: String,
    pub(crate) user_id: ID,
}

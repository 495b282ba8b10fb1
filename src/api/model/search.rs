use juniper::GraphQLUnion;

use crate::{
    api::{Context, err::{ApiResult, internal_server_error}},
    model::{Comment, Kind, Post, Record, User},
    resolver,
};


/// One hit of `search`.
#[derive(GraphQLUnion)]
#[graphql(Context = Context)]
pub(crate) enum SearchResult {
    User(User),
    Post(Post),
    Comment(Comment),
}

impl SearchResult {
    /// Wraps `record` in the union member named by its kind tag. Only users,
    /// posts and comments are searchable.
    pub(crate) fn from_record(record: Record) -> ApiResult<Self> {
        let kind = resolver::resolve_kind_of_record(&record);
        let hit = match kind {
            Kind::User => record.into_user().map(Self::User),
            Kind::Post => record.into_post().map(Self::Post),
            Kind::Comment => record.into_comment().map(Self::Comment),
            _ => None,
        };

        hit.ok_or_else(|| internal_server_error!("search returned a {} record", kind))
    }
}

//! GraphQL object types for all entities.
//!
//! Relation fields only expose what the resolver loaded. Records handed to
//! juniper are always normalized, so unloaded lists show up as `[]`.

pub(crate) mod search;

mod comment;
mod like;
mod message;
mod notification;
mod post;
mod profile;
mod taxonomy;
mod user;

use chrono::{DateTime, Utc};
use juniper::GraphQLEnum;
use postgres_types::{FromSql, ToSql};


/// Publication state of a post. Represents the `post_status` type in the DB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromSql, ToSql, GraphQLEnum)]
#[postgres(name = "post_status")]
pub(crate) enum PostStatus {
    #[default]
    #[postgres(name = "draft")]
    Draft,
    #[postgres(name = "published")]
    Published,
    #[postgres(name = "archived")]
    Archived,
}

// Relation fields below are `None` when the relation was not loaded. Lists
// become `Some(vec![])` through `normalized`, single relations stay `None`.

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) posts: Option<Vec<Post>>,
    pub(crate) comments: Option<Vec<Comment>>,
    pub(crate) likes: Option<Vec<Like>>,
    pub(crate) profile: Option<Box<Profile>>,
    pub(crate) messages_sent: Option<Vec<Message>>,
    pub(crate) messages_received: Option<Vec<Message>>,
    pub(crate) notifications: Option<Vec<Notification>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: Option<String>,
    pub(crate) status: PostStatus,
    pub(crate) author_id: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,

    pub(crate) author: Option<Box<User>>,
    pub(crate) comments: Option<Vec<Comment>>,
    pub(crate) likes: Option<Vec<Like>>,
    pub(crate) tags: Option<Vec<Tag>>,
    pub(crate) categories: Option<Vec<Category>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Comment {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) post_id: String,
    pub(crate) author_id: String,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) author: Option<Box<User>>,
    pub(crate) post: Option<Box<Post>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Profile {
    pub(crate) id: String,
    pub(crate) bio: Option<String>,
    pub(crate) avatar_url: Option<String>,
    pub(crate) user_id: String,

    pub(crate) user: Option<Box<User>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Like {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) post_id: String,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) user: Option<Box<User>>,
    pub(crate) post: Option<Box<Post>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tag {
    pub(crate) id: String,
    pub(crate) name: String,

    pub(crate) posts: Option<Vec<Post>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Category {
    pub(crate) id: String,
    pub(crate) name: String,

    pub(crate) posts: Option<Vec<Post>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Message {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) sender_id: String,
    pub(crate) receiver_id: String,
    pub(crate) read: bool,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) sender: Option<Box<User>>,
    pub(crate) receiver: Option<Box<User>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) kind: String,
    pub(crate) content: String,
    pub(crate) user_id: String,
    pub(crate) read: bool,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) user: Option<Box<User>>,
}


fn fill<T>(list: Option<Vec<T>>, f: fn(T) -> T) -> Option<Vec<T>> {
    Some(list.unwrap_or_default().into_iter().map(f).collect())
}

fn fill_one<T>(one: Option<Box<T>>, f: fn(T) -> T) -> Option<Box<T>> {
    one.map(|b| Box::new(f(*b)))
}

/// Implements `normalized` (fill in every absent list relation, recursively)
/// and `bare` (a copy without any relation loaded) for an entity.
macro_rules! impl_relations {
    ($ty:ident {
        lists: [$($list:ident: $list_ty:ident),* $(,)?],
        singles: [$($single:ident: $single_ty:ident),* $(,)?] $(,)?
    }) => {
        impl $ty {
            pub(crate) fn normalized(self) -> Self {
                Self {
                    $( $list: fill(self.$list, $list_ty::normalized), )*
                    $( $single: fill_one(self.$single, $single_ty::normalized), )*
                    ..self
                }
            }

            pub(crate) fn bare(&self) -> Self {
                Self {
                    $( $list: None, )*
                    $( $single: None, )*
                    ..self.clone()
                }
            }
        }
    };
}

impl_relations!(User {
    lists: [
        posts: Post,
        comments: Comment,
        likes: Like,
        messages_sent: Message,
        messages_received: Message,
        notifications: Notification,
    ],
    singles: [profile: Profile],
});
impl_relations!(Post {
    lists: [comments: Comment, likes: Like, tags: Tag, categories: Category],
    singles: [author: User],
});
impl_relations!(Comment { lists: [], singles: [author: User, post: Post] });
impl_relations!(Profile { lists: [], singles: [user: User] });
impl_relations!(Like { lists: [], singles: [user: User, post: Post] });
impl_relations!(Tag { lists: [posts: Post], singles: [] });
impl_relations!(Category { lists: [posts: Post], singles: [] });
impl_relations!(Message { lists: [], singles: [sender: User, receiver: User] });
impl_relations!(Notification { lists: [], singles: [user: User] });


#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::*;

    pub(crate) fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            email: format!("{}@example.org", name.to_lowercase()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            posts: None,
            comments: None,
            likes: None,
            profile: None,
            messages_sent: None,
            messages_received: None,
            notifications: None,
        }
    }

    pub(crate) fn post(id: &str, title: &str, author_id: &str) -> Post {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
        Post {
            id: id.into(),
            title: title.into(),
            content: None,
            status: PostStatus::Draft,
            author_id: author_id.into(),
            created_at: now,
            updated_at: now,
            author: None,
            comments: None,
            likes: None,
            tags: None,
            categories: None,
        }
    }

    pub(crate) fn tag(id: &str, name: &str) -> Tag {
        Tag { id: id.into(), name: name.into(), posts: None }
    }
}

use super::{
    Category, Comment, Kind, Like, Message, Notification, Post, Profile, Tag, User,
};


/// A record of any kind. The variant is the kind tag: it is fixed when the
/// record is built by a store and never derived from the record's fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Record {
    User(User),
    Post(Post),
    Comment(Comment),
    Profile(Profile),
    Like(Like),
    Tag(Tag),
    Category(Category),
    Message(Message),
    Notification(Notification),
}

/// Dispatches `$body` over every variant of `Record`, binding the entity to `$x`.
macro_rules! each_variant {
    ($record:expr, $x:ident => $body:expr) => {
        match $record {
            Record::User($x) => $body,
            Record::Post($x) => $body,
            Record::Comment($x) => $body,
            Record::Profile($x) => $body,
            Record::Like($x) => $body,
            Record::Tag($x) => $body,
            Record::Category($x) => $body,
            Record::Message($x) => $body,
            Record::Notification($x) => $body,
        }
    };
}

/// Generates `into_*` (consuming) accessors returning `None` for other kinds.
macro_rules! accessors {
    ($($variant:ident => $fn_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name(self) -> Option<$variant> {
                match self {
                    Record::$variant(x) => Some(x),
                    _ => None,
                }
            }
        )*
    };
}

impl Record {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Record::User(_) => Kind::User,
            Record::Post(_) => Kind::Post,
            Record::Comment(_) => Kind::Comment,
            Record::Profile(_) => Kind::Profile,
            Record::Like(_) => Kind::Like,
            Record::Tag(_) => Kind::Tag,
            Record::Category(_) => Kind::Category,
            Record::Message(_) => Kind::Message,
            Record::Notification(_) => Kind::Notification,
        }
    }

    pub(crate) fn id(&self) -> &str {
        each_variant!(self, x => &x.id)
    }

    pub(crate) fn normalized(self) -> Self {
        match self {
            Record::User(x) => Record::User(x.normalized()),
            Record::Post(x) => Record::Post(x.normalized()),
            Record::Comment(x) => Record::Comment(x.normalized()),
            Record::Profile(x) => Record::Profile(x.normalized()),
            Record::Like(x) => Record::Like(x.normalized()),
            Record::Tag(x) => Record::Tag(x.normalized()),
            Record::Category(x) => Record::Category(x.normalized()),
            Record::Message(x) => Record::Message(x.normalized()),
            Record::Notification(x) => Record::Notification(x.normalized()),
        }
    }

    accessors! {
        User => into_user,
        Post => into_post,
        Comment => into_comment,
        Profile => into_profile,
        Like => into_like,
        Tag => into_tag,
        Category => into_category,
        Message => into_message,
        Notification => into_notification,
    }
}

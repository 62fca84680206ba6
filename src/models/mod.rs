// Typed rows for every table the service touches

pub mod content;
pub mod profile;
pub mod social;

pub use content::{
    Category, ContentItem, ContentKind, ContentPatch, ContentStatus, Counter, GalleryQuery,
    NewContent, Predicate,
};
pub use profile::{Profile, ProfileSummary, ProfileUpdate, PublicProfile, UserRecord, UserSummary};
pub use social::{Comment, CommentTarget, CommentWithAuthor, Draft, FollowEdge, LikeState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public profile row. Follower counts are derived from `follows` at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The profile as shown to `viewer_id`. The email address is only kept for its owner.
    pub fn public_view(self, viewer_id: Option<&str>) -> PublicProfile {
        let email = (viewer_id == Some(self.id.as_str())).then_some(self.email);
        PublicProfile {
            id: self.id,
            username: self.username,
            email,
            avatar_url: self.avatar_url,
            bio: self.bio,
            follower_count: self.follower_count,
            following_count: self.following_count,
            created_at: self.created_at,
        }
    }
}

/// Profile page header, safe to show to anyone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicProfile {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Settings-page edit of a profile. `None` leaves a field alone; an empty
/// `avatar_url` or `bio` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// Credential record in `users`, separate from the public profile.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// What the admin listing exposes of a user record.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            created_at: record.created_at,
        }
    }
}

/// Compact profile embedded in joined rows (comment authors, follow edges).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

// ABOUTME: Social platform definitions with OAuth endpoints and quirks
// ABOUTME: Supports Twitter, LinkedIn, Facebook, Instagram, and YouTube

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthError, AuthResult};

/// Supported social platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    LinkedIn,
    Facebook,
    Instagram,
    YouTube,
}

impl Platform {
    /// Get authorization URL for this platform
    pub fn authorize_url(&self) -> &'static str {
        match self {
            Self::Twitter => "https://twitter.com/i/oauth2/authorize",
            Self::LinkedIn => "https://www.linkedin.com/oauth/v2/authorization",
            // Instagram business accounts connect through Facebook Login
            Self::Facebook | Self::Instagram => "https://www.facebook.com/v19.0/dialog/oauth",
            Self::YouTube => "https://accounts.google.com/o/oauth2/v2/auth",
        }
    }

    /// Get token exchange URL for this platform
    pub fn token_url(&self) -> &'static str {
        match self {
            Self::Twitter => "https://api.twitter.com/2/oauth2/token",
            Self::LinkedIn => "https://www.linkedin.com/oauth/v2/accessToken",
            Self::Facebook | Self::Instagram => {
                "https://graph.facebook.com/v19.0/oauth/access_token"
            }
            Self::YouTube => "https://oauth2.googleapis.com/token",
        }
    }

    /// Get profile endpoint for this platform
    pub fn profile_url(&self) -> &'static str {
        match self {
            Self::Twitter => "https://api.twitter.com/2/users/me?user.fields=profile_image_url",
            Self::LinkedIn => "https://api.linkedin.com/v2/userinfo",
            Self::Facebook => "https://graph.facebook.com/v19.0/me?fields=id,name,picture",
            Self::Instagram => "https://graph.facebook.com/v19.0/me?fields=id,name,username",
            Self::YouTube => "https://www.googleapis.com/oauth2/v3/userinfo",
        }
    }

    /// Get revocation endpoint, if the platform has one.
    /// LinkedIn exposes none; disconnect is local-only there.
    pub fn revoke_url(&self) -> Option<&'static str> {
        match self {
            Self::Twitter => Some("https://api.twitter.com/2/oauth2/revoke"),
            Self::LinkedIn => None,
            Self::Facebook | Self::Instagram => {
                Some("https://graph.facebook.com/v19.0/me/permissions")
            }
            Self::YouTube => Some("https://oauth2.googleapis.com/revoke"),
        }
    }

    /// Get default scopes for this platform
    pub fn scopes(&self) -> &[&str] {
        match self {
            Self::Twitter => &["tweet.read", "tweet.write", "users.read", "offline.access"],
            Self::LinkedIn => &["openid", "profile", "email", "w_member_social"],
            Self::Facebook => &[
                "pages_manage_posts",
                "pages_read_engagement",
                "public_profile",
            ],
            Self::Instagram => &[
                "instagram_basic",
                "instagram_content_publish",
                "pages_show_list",
            ],
            Self::YouTube => &[
                "https://www.googleapis.com/auth/youtube.upload",
                "https://www.googleapis.com/auth/userinfo.profile",
            ],
        }
    }

    /// Environment variable holding the client id
    pub fn client_id_env(&self) -> &'static str {
        match self {
            Self::Twitter => "TWITTER_CLIENT_ID",
            Self::LinkedIn => "LINKEDIN_CLIENT_ID",
            Self::Facebook => "FACEBOOK_CLIENT_ID",
            Self::Instagram => "INSTAGRAM_CLIENT_ID",
            Self::YouTube => "YOUTUBE_CLIENT_ID",
        }
    }

    /// Environment variable holding the client secret
    pub fn client_secret_env(&self) -> &'static str {
        match self {
            Self::Twitter => "TWITTER_CLIENT_SECRET",
            Self::LinkedIn => "LINKEDIN_CLIENT_SECRET",
            Self::Facebook => "FACEBOOK_CLIENT_SECRET",
            Self::Instagram => "INSTAGRAM_CLIENT_SECRET",
            Self::YouTube => "YOUTUBE_CLIENT_SECRET",
        }
    }

    /// Twitter requires PKCE on the authorization code flow
    pub fn uses_pkce(&self) -> bool {
        matches!(self, Self::Twitter)
    }

    /// Twitter authenticates token-endpoint calls with HTTP Basic
    pub fn uses_basic_auth(&self) -> bool {
        matches!(self, Self::Twitter)
    }

    /// Facebook and Instagram exchange the short-lived token for a
    /// ~60-day one after the code exchange
    pub fn long_lived_exchange(&self) -> bool {
        matches!(self, Self::Facebook | Self::Instagram)
    }

    /// Google-backed platforms only issue refresh tokens when asked
    /// for offline access explicitly
    pub fn offline_access(&self) -> bool {
        matches!(self, Self::YouTube)
    }

    /// Get all supported platforms
    pub fn all() -> Vec<Self> {
        vec![
            Self::Twitter,
            Self::LinkedIn,
            Self::Facebook,
            Self::Instagram,
            Self::YouTube,
        ]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Twitter => write!(f, "twitter"),
            Self::LinkedIn => write!(f, "linkedin"),
            Self::Facebook => write!(f, "facebook"),
            Self::Instagram => write!(f, "instagram"),
            Self::YouTube => write!(f, "youtube"),
        }
    }
}

impl FromStr for Platform {
    type Err = AuthError;

    fn from_str(s: &str) -> AuthResult<Self> {
        match s.to_lowercase().as_str() {
            "twitter" => Ok(Self::Twitter),
            "linkedin" => Ok(Self::LinkedIn),
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            "youtube" => Ok(Self::YouTube),
            _ => Err(AuthError::Configuration(format!(
                "Unknown platform: {}. Supported: twitter, linkedin, facebook, instagram, youtube",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = AuthError;

    fn try_from(s: String) -> AuthResult<Self> {
        s.parse()
    }
}

impl TryFrom<&str> for Platform {
    type Error = AuthError;

    fn try_from(s: &str) -> AuthResult<Self> {
        s.parse()
    }
}

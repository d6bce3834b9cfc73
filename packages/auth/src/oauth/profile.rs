// ABOUTME: Canonical profile shape and per-platform normalization mappers
// ABOUTME: Pure functions from provider-specific JSON to the canonical profile

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::oauth::platform::Platform;

/// Normalized profile snapshot stored alongside the credential, used for
/// UI display without re-querying the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl CanonicalProfile {
    /// Placeholder used when the profile fetch fails; the connection is
    /// still usable for publishing even if we cannot label it.
    pub fn unknown() -> Self {
        Self {
            id: "unknown".to_string(),
            name: "Unknown User".to_string(),
            username: None,
            profile_picture_url: None,
        }
    }
}

/// Map a raw provider profile response into the canonical shape.
/// Returns None when the response is missing required fields.
pub fn normalize(platform: Platform, raw: &Value) -> Option<CanonicalProfile> {
    match platform {
        Platform::Twitter => {
            // GET /2/users/me wraps the user object in "data"
            let data = raw.get("data")?;
            Some(CanonicalProfile {
                id: string_field(data, "id")?,
                name: string_field(data, "name").unwrap_or_else(|| "Unknown User".to_string()),
                username: string_field(data, "username"),
                profile_picture_url: string_field(data, "profile_image_url"),
            })
        }
        Platform::LinkedIn => {
            // OIDC userinfo: sub/name/email/picture
            Some(CanonicalProfile {
                id: string_field(raw, "sub")?,
                name: string_field(raw, "name").unwrap_or_else(|| "Unknown User".to_string()),
                username: string_field(raw, "email"),
                profile_picture_url: string_field(raw, "picture"),
            })
        }
        Platform::Facebook => Some(CanonicalProfile {
            id: string_field(raw, "id")?,
            name: string_field(raw, "name").unwrap_or_else(|| "Unknown User".to_string()),
            username: None,
            // Graph API nests the picture URL
            profile_picture_url: raw
                .pointer("/picture/data/url")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        Platform::Instagram => {
            let username = string_field(raw, "username");
            Some(CanonicalProfile {
                id: string_field(raw, "id")?,
                name: string_field(raw, "name")
                    .or_else(|| username.clone())
                    .unwrap_or_else(|| "Unknown User".to_string()),
                username,
                profile_picture_url: string_field(raw, "profile_picture_url"),
            })
        }
        Platform::YouTube => {
            // Google userinfo: sub/name/email/picture
            Some(CanonicalProfile {
                id: string_field(raw, "sub").or_else(|| string_field(raw, "id"))?,
                name: string_field(raw, "name").unwrap_or_else(|| "Unknown User".to_string()),
                username: string_field(raw, "email"),
                profile_picture_url: string_field(raw, "picture"),
            })
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_twitter() {
        let raw = json!({
            "data": {
                "id": "2244994945",
                "name": "Dev Account",
                "username": "devacct",
                "profile_image_url": "https://pbs.twimg.com/profile_images/x.png"
            }
        });

        let profile = normalize(Platform::Twitter, &raw).unwrap();
        assert_eq!(profile.id, "2244994945");
        assert_eq!(profile.name, "Dev Account");
        assert_eq!(profile.username.as_deref(), Some("devacct"));
        assert!(profile.profile_picture_url.is_some());
    }

    #[test]
    fn test_normalize_linkedin_userinfo() {
        let raw = json!({
            "sub": "u1",
            "name": "Jane",
            "email": "jane@example.com",
            "picture": "https://media.licdn.com/p.jpg"
        });

        let profile = normalize(Platform::LinkedIn, &raw).unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.name, "Jane");
        assert_eq!(profile.username.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn test_normalize_facebook_nested_picture() {
        let raw = json!({
            "id": "10158",
            "name": "Page Owner",
            "picture": { "data": { "url": "https://graph.facebook.com/pic.jpg" } }
        });

        let profile = normalize(Platform::Facebook, &raw).unwrap();
        assert_eq!(profile.id, "10158");
        assert_eq!(
            profile.profile_picture_url.as_deref(),
            Some("https://graph.facebook.com/pic.jpg")
        );
    }

    #[test]
    fn test_normalize_instagram_falls_back_to_username() {
        let raw = json!({ "id": "ig1", "username": "snaps" });

        let profile = normalize(Platform::Instagram, &raw).unwrap();
        assert_eq!(profile.name, "snaps");
        assert_eq!(profile.username.as_deref(), Some("snaps"));
    }

    #[test]
    fn test_normalize_missing_id_fails() {
        let raw = json!({ "name": "No Id" });
        assert!(normalize(Platform::LinkedIn, &raw).is_none());
        assert!(normalize(Platform::Facebook, &raw).is_none());
        assert!(normalize(Platform::Twitter, &raw).is_none());
    }

    #[test]
    fn test_unknown_placeholder() {
        let profile = CanonicalProfile::unknown();
        assert_eq!(profile.id, "unknown");
        assert_eq!(profile.name, "Unknown User");
        assert!(profile.username.is_none());
    }
}

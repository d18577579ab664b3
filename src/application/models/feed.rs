use crate::application::models::profile::{ImageRef, InteractionData, Profile, ProfileInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Serialize, Clone)]
pub struct RecsRequest {
    #[serde(rename = "playerId")]
    pub player_id: String,

    #[serde(rename = "activeToday")]
    pub active_today: bool,

    #[serde(rename = "newHere")]
    pub new_here: bool,
}

impl fmt::Display for RecsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}

/// Subjects stay as raw values so one malformed entry does not sink the
/// whole page; each is parsed into a [`FeedSubject`] individually.
#[derive(Debug, Deserialize, Clone)]
pub struct Feed {
    #[serde(default)]
    pub subjects: Vec<Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecsResponse {
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedSubject {
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    #[serde(rename = "ratingToken")]
    pub rating_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublicUser {
    #[serde(rename = "identityId")]
    pub identity_id: String,

    #[serde(default)]
    pub profile: PublicProfile,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PublicProfile {
    #[serde(rename = "firstName", default)]
    pub first_name: String,

    pub age: Option<u8>,

    #[serde(default)]
    pub educations: Vec<String>,

    /// Either a plain string or an object with a `name` field, depending
    /// on the account's privacy settings.
    pub location: Option<Value>,

    #[serde(default)]
    pub photos: Vec<PublicPhoto>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublicPhoto {
    #[serde(rename = "cdnId")]
    pub cdn_id: Option<String>,

    pub url: Option<String>,
}

impl PublicProfile {
    pub fn location_name(&self) -> Option<String> {
        match self.location.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}

/// Joins a feed subject with its public profile page. Photos without a
/// cdn id or url cannot be fetched and are dropped here.
pub fn build_profile(subject: &FeedSubject, user: &PublicUser) -> Profile {
    let images = user
        .profile
        .photos
        .iter()
        .filter_map(|photo| {
            let content_id = photo.cdn_id.clone()?;
            let url = photo.url.clone()?;
            Some(ImageRef { content_id, url })
        })
        .collect();

    Profile {
        profile_id: subject.subject_id.clone(),
        interaction: InteractionData {
            subject_id: subject.subject_id.clone(),
            rating_token: subject.rating_token.clone(),
        },
        info: ProfileInfo {
            first_name: user.profile.first_name.clone(),
            age: user.profile.age,
            educations: user.profile.educations.clone(),
            location: user.profile.location_name(),
        },
        images,
    }
}

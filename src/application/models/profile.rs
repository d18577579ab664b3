use serde::{Deserialize, Serialize};
use std::fmt;

/// Rating handle attached to a recommendation. The token is opaque and
/// only valid for the feed batch it arrived in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InteractionData {
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    #[serde(rename = "ratingToken")]
    pub rating_token: String,
}

/// The public fields worth keeping from a profile page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ProfileInfo {
    #[serde(rename = "firstName")]
    pub first_name: String,

    pub age: Option<u8>,

    #[serde(default)]
    pub educations: Vec<String>,

    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageRef {
    #[serde(rename = "contentId")]
    pub content_id: String,

    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    #[serde(rename = "profileId")]
    pub profile_id: String,

    pub interaction: InteractionData,

    pub info: ProfileInfo,

    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl Profile {
    /// Adds any images not already present, matching on content id. Keeps
    /// the existing order so downloaded files stay stable across runs.
    pub fn augment_images(&mut self, incoming: &[ImageRef]) {
        for image in incoming {
            if !self.images.iter().any(|i| i.content_id == image.content_id) {
                self.images.push(image.clone());
            }
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}

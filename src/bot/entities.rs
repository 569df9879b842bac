//! Plain data carried between the bot's conversation handlers and the REST
//! API. None of these types validate anything; the API does that.

use serde::{Deserialize, Serialize};

/// Telegram's descriptor for one resolution of an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// A photo reference. `bytes` and `photo_size` only live inside the bot
/// process and are never sent to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub file_id: String,
    #[serde(skip)]
    pub bytes: Option<Vec<u8>>,
    #[serde(skip)]
    pub photo_size: Option<PhotoSize>,
}

impl Image {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            ..Self::default()
        }
    }

    pub fn from_photo_size(photo_size: PhotoSize) -> Self {
        Self {
            file_id: photo_size.file_id.clone(),
            bytes: None,
            photo_size: Some(photo_size),
        }
    }
}

fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: i64,
    pub name: String,
    pub sex: String,
    pub age: u32,
    pub location: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl UserProfile {
    pub fn new(
        user: i64,
        name: impl Into<String>,
        sex: impl Into<String>,
        age: u32,
        location: impl Into<String>,
    ) -> Self {
        Self {
            user,
            name: name.into(),
            sex: sex.into(),
            age,
            location: location.into(),
            about: None,
            is_visible: true,
            images: Vec::new(),
        }
    }
}

/// A listing as the bot sees it. Unset fields are left out of request
/// bodies so the same struct serves creates and partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coliving {
    #[serde(default, skip_serializing)]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

/// A registered bot user as returned by the users endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub residence: Option<i64>,
}

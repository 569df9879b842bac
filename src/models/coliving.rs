use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Room,
    Bed,
    Apartment,
}

impl RoomType {
    pub const ALL: [RoomType; 3] = [RoomType::Room, RoomType::Bed, RoomType::Apartment];
    pub const NAMES: [&'static str; 3] = ["room", "bed", "apartment"];

    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Room => "room",
            RoomType::Bed => "bed",
            RoomType::Apartment => "apartment",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room type: {0}")]
pub struct UnknownRoomType(pub String);

impl FromStr for RoomType {
    type Err = UnknownRoomType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownRoomType(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ColivingImage {
    pub id: i64,
    pub file_id: String,
}

/// Wire representation: `host` is the host's telegram id and `location` the
/// location name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Coliving {
    pub id: i64,
    pub host: i64,
    pub location: String,
    pub price: i64,
    pub room_type: RoomType,
    pub about: Option<String>,
    pub is_visible: bool,
    pub images: Vec<ColivingImage>,
}

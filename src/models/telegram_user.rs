use serde::{Deserialize, Serialize};

/// Response shape for a user; `residence` is the id of the coliving the user
/// lives in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TelegramUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub residence: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTelegramUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

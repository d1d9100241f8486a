use serde::{Deserialize, Serialize};

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub welcome_text: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub user_id: i64,
    #[serde(default)]
    pub ban_reason: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
    /// The offending message that got the user reported.
    pub message: String,
}

/// Returned after creating a user: the user plus its first message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub ban_reason: Option<String>,
    pub additional_info: Option<String>,
    pub message: MessageResponse,
    pub utc_created_at: f64,
    pub utc_created_at_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessagesResponse {
    pub user_id: i64,
    pub ban_reason: Option<String>,
    pub additional_info: Option<String>,
    pub messages: Vec<MessageResponse>,
    pub utc_created_at: f64,
    pub utc_created_at_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFound {
    pub found: bool,
    pub user: Option<UserMessagesResponse>,
}

impl UserFound {
    pub fn missing() -> Self {
        Self { found: false, user: None }
    }
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFound {
    pub found: bool,
}

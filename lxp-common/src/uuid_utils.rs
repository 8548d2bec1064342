//! UUID utilities

use uuid::Uuid;

/// Length of generated participant tokens
pub const PARTICIPANT_TOKEN_LEN: usize = 8;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Generate a short opaque participant token (first 8 hex digits of a UUIDv4)
pub fn participant_token() -> String {
    generate().simple().to_string()[..PARTICIPANT_TOKEN_LEN].to_string()
}

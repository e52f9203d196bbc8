use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request replacing one line of a ping message.
///
/// The target index and line number arrive as path parameters and are
/// bounds-checked in the service against the current message list.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetMotdRequest {
    /// New text for the addressed line, stored with its markup untouched.
    #[validate(length(min = 1, message = "motd text must not be empty"))]
    pub text: String,
}

/// One stored ping message with its rendered lines.
#[derive(Debug, Serialize, ToSchema)]
pub struct MotdEntry {
    /// 1-based index as used by the edit route.
    pub index: usize,
    /// Stored template, untranslated.
    pub template: String,
    /// Rendered lines as a probing client would see them.
    pub lines: Vec<String>,
}

/// Listing of all configured ping messages.
#[derive(Debug, Serialize, ToSchema)]
pub struct MotdListResponse {
    pub entries: Vec<MotdEntry>,
}

/// Confirmation returned after a successful edit.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetMotdResponse {
    /// Index of the edited (or appended) message.
    pub index: usize,
    /// Line that was replaced.
    pub line: usize,
    /// The full stored template after the edit.
    pub template: String,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::validation::validate_display_name;

/// Request adding an identity to the whitelist.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddWhitelistRequest {
    /// Identity exempted from maintenance gating.
    pub id: Uuid,
    /// Display name, informational only.
    #[validate(custom(function = validate_display_name))]
    pub name: String,
}

/// One user-facing whitelist row.
#[derive(Debug, Serialize, ToSchema)]
pub struct WhitelistEntryDto {
    pub id: Uuid,
    pub name: String,
}

/// Listing of whitelisted identities, placeholder excluded.
#[derive(Debug, Serialize, ToSchema)]
pub struct WhitelistResponse {
    /// Real entries; empty when only the placeholder row exists.
    pub entries: Vec<WhitelistEntryDto>,
    /// True when no real entries exist yet.
    pub empty: bool,
}

/// Result of an add request.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddWhitelistResponse {
    /// Whether the identity was newly added. `false` means the entry
    /// existed and only its display name was updated.
    pub added: bool,
}

/// Result of a removal request.
#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveWhitelistResponse {
    /// Whether an entry was removed; `false` reports "nothing to remove".
    pub removed: bool,
    /// Identity that was removed, when the request came in by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

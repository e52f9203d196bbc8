use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved placeholder identity shipped with a fresh whitelist document. It
/// exists so operators see the expected layout, and it is hidden from
/// listings and from the populated check.
pub const PLACEHOLDER_IDENTITY: Uuid = Uuid::from_u128(0xa8179ff3_c201_4a75_bdaa_9d14aca6f83f);

/// Persisted whitelist layout: identity to display name, insertion-ordered.
pub type WhitelistEntries = IndexMap<Uuid, String>;

/// Whitelist document created on first start.
pub fn default_whitelist() -> WhitelistEntries {
    let mut entries = WhitelistEntries::new();
    entries.insert(PLACEHOLDER_IDENTITY, "SomePlayer".to_owned());
    entries
}

/// Persisted settings document. Field names mirror the on-disk keys so the
/// stored form stays readable and portable; color markup is translated at
/// read time, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsEntity {
    #[serde(rename = "enable-maintenance-mode", default)]
    pub maintenance: bool,
    /// Pre-2.x single-message key, rewritten into `pingmessages` by the
    /// migration pass and dropped from the document on the next save.
    #[serde(
        rename = "pingmessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_ping_message: Option<String>,
    #[serde(rename = "pingmessages", default = "default_ping_messages")]
    pub ping_messages: Vec<String>,
    #[serde(
        rename = "timer-broadcasts-for-minutes",
        default = "default_broadcast_minutes"
    )]
    pub broadcast_minutes: Vec<u64>,
    #[serde(
        rename = "starttimer-broadcast-message",
        default = "default_starttimer_broadcast"
    )]
    pub starttimer_broadcast_message: String,
    #[serde(
        rename = "endtimer-broadcast-message",
        default = "default_endtimer_broadcast"
    )]
    pub endtimer_broadcast_message: String,
    #[serde(rename = "kickmessage", default = "default_kick_message")]
    pub kick_message: String,
    #[serde(rename = "join-notification", default = "default_join_notification")]
    pub join_notification: String,
    #[serde(rename = "no-permission", default = "default_no_permission")]
    pub no_permission: String,
    #[serde(
        rename = "maintenance-activated",
        default = "default_maintenance_activated"
    )]
    pub maintenance_activated: String,
    #[serde(
        rename = "maintenance-deactivated",
        default = "default_maintenance_deactivated"
    )]
    pub maintenance_deactivated: String,
    #[serde(rename = "playercountmessage", default = "default_player_count")]
    pub player_count_message: String,
    #[serde(
        rename = "playercounthovermessage",
        default = "default_player_count_hover"
    )]
    pub player_count_hover_message: String,
    #[serde(rename = "send-join-notification", default = "default_true")]
    pub send_join_notification: bool,
    #[serde(rename = "custom-maintenance-icon", default)]
    pub custom_maintenance_icon: bool,
}

impl Default for SettingsEntity {
    fn default() -> Self {
        Self {
            maintenance: false,
            legacy_ping_message: None,
            ping_messages: default_ping_messages(),
            broadcast_minutes: default_broadcast_minutes(),
            starttimer_broadcast_message: default_starttimer_broadcast(),
            endtimer_broadcast_message: default_endtimer_broadcast(),
            kick_message: default_kick_message(),
            join_notification: default_join_notification(),
            no_permission: default_no_permission(),
            maintenance_activated: default_maintenance_activated(),
            maintenance_deactivated: default_maintenance_deactivated(),
            player_count_message: default_player_count(),
            player_count_hover_message: default_player_count_hover(),
            send_join_notification: true,
            custom_maintenance_icon: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ping_messages() -> Vec<String> {
    vec!["&cThe server is currently under maintenance!%NEWLINE%&cCheck back soon!".to_owned()]
}

fn default_broadcast_minutes() -> Vec<u64> {
    vec![1, 2, 3, 4, 5, 10, 15, 20, 30, 60]
}

fn default_starttimer_broadcast() -> String {
    "&6Maintenance mode will be enabled in &c%TIME% &6minutes!".to_owned()
}

fn default_endtimer_broadcast() -> String {
    "&6Maintenance mode will be disabled in &c%TIME% &6minutes!".to_owned()
}

fn default_kick_message() -> String {
    "&cThe server is currently under maintenance!%NEWLINE%&cTry again later!".to_owned()
}

fn default_join_notification() -> String {
    "&6Maintenance mode is currently enabled on this server!".to_owned()
}

fn default_no_permission() -> String {
    "&cYou do not have the permission to execute this command.".to_owned()
}

fn default_maintenance_activated() -> String {
    "&6Maintenance mode has been enabled!".to_owned()
}

fn default_maintenance_deactivated() -> String {
    "&aMaintenance mode has been disabled!".to_owned()
}

fn default_player_count() -> String {
    "&6Maintenance".to_owned()
}

fn default_player_count_hover() -> String {
    "&8[&eMaintenance&8]".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let entity: SettingsEntity = serde_json::from_str("{}").unwrap();
        assert!(!entity.maintenance);
        assert_eq!(entity.ping_messages.len(), 1);
        assert!(entity.broadcast_minutes.contains(&5));
        assert!(entity.legacy_ping_message.is_none());
    }

    #[test]
    fn legacy_key_round_trips_only_while_present() {
        let entity: SettingsEntity =
            serde_json::from_str(r#"{"pingmessage": "hello"}"#).unwrap();
        assert_eq!(entity.legacy_ping_message.as_deref(), Some("hello"));

        let mut migrated = entity;
        migrated.legacy_ping_message = None;
        let serialized = serde_json::to_string(&migrated).unwrap();
        assert!(!serialized.contains("\"pingmessage\""));
        assert!(serialized.contains("\"pingmessages\""));
    }

    #[test]
    fn placeholder_identity_matches_reserved_string() {
        assert_eq!(
            PLACEHOLDER_IDENTITY.to_string(),
            "a8179ff3-c201-4a75-bdaa-9d14aca6f83f"
        );
    }
}

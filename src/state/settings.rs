use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::dao::{config_store::ConfigStore, models::SettingsEntity, storage::StorageError};
use crate::state::text::{self, TIME_TOKEN};

/// Failure reading or writing the settings document. Fatal at startup; at
/// save/reload time it is reported to the caller and the in-memory values
/// stay untouched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("loading settings document")]
    Load(#[source] StorageError),
    #[error("saving settings document")]
    Save(#[source] StorageError),
}

/// Which direction a scheduled countdown moves the service in; selects the
/// warning template used for its broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Counting down towards activation ("starttimer").
    Start,
    /// Maintenance already active, counting down towards deactivation
    /// ("endtimer").
    End,
}

/// In-memory mirror of the persisted settings document.
///
/// Mutations go through [`Settings::commit`] only after the matching
/// persistence write succeeded, so a failed save never corrupts the mirror.
#[derive(Debug, Clone)]
pub struct Settings {
    entity: SettingsEntity,
    broadcast_intervals: BTreeSet<u64>,
}

impl Settings {
    /// Fetch, migrate, and parse the settings document. Called once at
    /// startup (where a failure is fatal) and again on explicit reload.
    pub async fn load(store: &Arc<dyn ConfigStore>) -> Result<Self, ConfigError> {
        let mut entity = store.load_settings().await.map_err(ConfigError::Load)?;

        if migrate_entity(&mut entity) {
            info!("migrated legacy `pingmessage` key into `pingmessages`");
            store
                .save_settings(entity)
                .await
                .map_err(ConfigError::Save)?;
            // Re-parse what was actually persisted rather than trusting the
            // in-memory rewrite.
            entity = store.load_settings().await.map_err(ConfigError::Load)?;
        }

        Ok(Self::from_entity(entity))
    }

    /// Build directly from a parsed document.
    pub fn from_entity(entity: SettingsEntity) -> Self {
        let broadcast_intervals = entity
            .broadcast_minutes
            .iter()
            .copied()
            .filter(|minutes| {
                if *minutes == 0 {
                    warn!("ignoring zero entry in timer-broadcasts-for-minutes");
                    false
                } else {
                    true
                }
            })
            .collect();
        Self {
            entity,
            broadcast_intervals,
        }
    }

    /// Current gating state.
    pub fn is_maintenance(&self) -> bool {
        self.entity.maintenance
    }

    /// Whether admitted sessions get a notice while maintenance is active.
    pub fn send_join_notification(&self) -> bool {
        self.entity.send_join_notification
    }

    /// Whether the custom service icon should be loaded and served.
    pub fn has_custom_icon(&self) -> bool {
        self.entity.custom_maintenance_icon
    }

    /// Stored ping message templates, untranslated.
    pub fn ping_messages(&self) -> &[String] {
        &self.entity.ping_messages
    }

    /// Remaining-minute marks that trigger a countdown warning.
    pub fn broadcast_intervals(&self) -> &BTreeSet<u64> {
        &self.broadcast_intervals
    }

    /// Kick text shown to evicted and refused sessions, fully rendered.
    pub fn kick_message(&self) -> String {
        text::render(&self.entity.kick_message)
    }

    /// Broadcast sent when maintenance turns on.
    pub fn activation_message(&self) -> String {
        text::colorize(&self.entity.maintenance_activated)
    }

    /// Broadcast sent when maintenance turns off.
    pub fn deactivation_message(&self) -> String {
        text::colorize(&self.entity.maintenance_deactivated)
    }

    /// Notice shown to a session admitted while maintenance is active.
    pub fn join_notification(&self) -> String {
        text::colorize(&self.entity.join_notification)
    }

    /// Reply for callers lacking the required capability.
    pub fn no_permission_message(&self) -> String {
        text::colorize(&self.entity.no_permission)
    }

    /// Player-count text shown in discovery replies during maintenance.
    pub fn player_count_message(&self) -> String {
        text::colorize(&self.entity.player_count_message)
    }

    /// Hover text accompanying the player-count slot.
    pub fn player_count_hover_message(&self) -> String {
        text::colorize(&self.entity.player_count_hover_message)
    }

    /// Countdown warning with the remaining minutes substituted in.
    pub fn timer_warning(&self, kind: TimerKind, remaining_minutes: u64) -> String {
        let template = match kind {
            TimerKind::Start => &self.entity.starttimer_broadcast_message,
            TimerKind::End => &self.entity.endtimer_broadcast_message,
        };
        text::colorize(&template.replace(TIME_TOKEN, &remaining_minutes.to_string()))
    }

    /// Pick one ping message uniformly, fully rendered. An empty list is
    /// legal and yields the empty string.
    pub fn random_ping_message(&self, rng: &mut impl Rng) -> String {
        match self.entity.ping_messages.as_slice() {
            [] => String::new(),
            [only] => text::render(only),
            many => text::render(&many[rng.random_range(0..many.len())]),
        }
    }

    /// Clone of the persisted form, used to stage a mutation before saving.
    pub fn entity(&self) -> SettingsEntity {
        self.entity.clone()
    }

    /// Replace the mirror with a document that was successfully persisted.
    pub fn commit(&mut self, entity: SettingsEntity) {
        *self = Self::from_entity(entity);
    }
}

/// Rewrite the legacy single-message key into the list-shaped one. Returns
/// whether the document changed; running on an already-migrated document is
/// a no-op.
pub fn migrate_entity(entity: &mut SettingsEntity) -> bool {
    match entity.legacy_ping_message.take() {
        Some(message) => {
            entity.ping_messages = vec![message];
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(entity: SettingsEntity) -> Settings {
        Settings::from_entity(entity)
    }

    #[test]
    fn migration_moves_legacy_key_once() {
        let mut entity = SettingsEntity {
            legacy_ping_message: Some("hello".into()),
            ..SettingsEntity::default()
        };

        assert!(migrate_entity(&mut entity));
        assert_eq!(entity.ping_messages, vec!["hello"]);
        assert!(entity.legacy_ping_message.is_none());

        assert!(!migrate_entity(&mut entity));
        assert_eq!(entity.ping_messages, vec!["hello"]);
    }

    #[test]
    fn zero_broadcast_marks_are_dropped() {
        let entity = SettingsEntity {
            broadcast_minutes: vec![0, 1, 5],
            ..SettingsEntity::default()
        };
        let settings = settings_with(entity);
        assert_eq!(
            settings.broadcast_intervals().iter().copied().collect::<Vec<_>>(),
            vec![1, 5]
        );
    }

    #[test]
    fn timer_warning_substitutes_remaining_minutes() {
        let settings = settings_with(SettingsEntity::default());
        let warning = settings.timer_warning(TimerKind::End, 5);
        assert!(warning.contains('5'));
        assert!(!warning.contains(TIME_TOKEN));
        assert!(warning.contains('\u{00a7}'));
    }

    #[tokio::test]
    async fn load_migrates_a_legacy_document_on_disk() {
        use std::sync::Arc;

        use crate::dao::config_store::file::FileConfigStore;

        let dir = std::env::temp_dir().join(format!("maintenance-back-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(
            dir.join("settings.json"),
            br#"{"pingmessage": "legacy hello"}"#,
        )
        .await
        .unwrap();

        let store: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::open(&dir).await.unwrap());
        let settings = Settings::load(&store).await.unwrap();
        assert_eq!(settings.ping_messages().to_vec(), vec!["legacy hello"]);

        let raw = tokio::fs::read_to_string(dir.join("settings.json"))
            .await
            .unwrap();
        assert!(!raw.contains("\"pingmessage\""));
        assert!(raw.contains("\"pingmessages\""));

        // Running the migration again is a no-op.
        let again = Settings::load(&store).await.unwrap();
        assert_eq!(again.ping_messages().to_vec(), vec!["legacy hello"]);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[test]
    fn random_ping_message_handles_empty_and_single() {
        let mut rng = rand::rng();

        let empty = settings_with(SettingsEntity {
            ping_messages: vec![],
            ..SettingsEntity::default()
        });
        assert_eq!(empty.random_ping_message(&mut rng), "");

        let single = settings_with(SettingsEntity {
            ping_messages: vec!["&aup%NEWLINE%down".into()],
            ..SettingsEntity::default()
        });
        assert_eq!(single.random_ping_message(&mut rng), "\u{00a7}aup\ndown");
    }
}

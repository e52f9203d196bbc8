use tracing::info;

use crate::{
    dto::{
        discovery::DiscoveryResponse,
        motd::{MotdEntry, MotdListResponse, SetMotdResponse},
    },
    error::ServiceError,
    state::{SharedState, text},
};

/// Lines a ping message may carry; the edit route addresses them as 1 or 2.
const MOTD_LINES: usize = 2;

/// All configured ping messages with their rendered lines.
pub async fn list(state: &SharedState) -> MotdListResponse {
    let settings = state.settings().read().await;
    let entries = settings
        .ping_messages()
        .iter()
        .enumerate()
        .map(|(i, template)| MotdEntry {
            index: i + 1,
            template: template.clone(),
            lines: text::render(template)
                .split('\n')
                .map(str::to_owned)
                .collect(),
        })
        .collect();
    MotdListResponse { entries }
}

/// Replace one line of the addressed ping message. `index` may be one past
/// the end to append a new message; `line` is 1 or 2.
pub async fn set_line(
    state: &SharedState,
    index: usize,
    line: usize,
    new_text: String,
) -> Result<SetMotdResponse, ServiceError> {
    let _gate = state.mutation_gate().lock().await;

    if !(1..=MOTD_LINES).contains(&line) {
        return Err(ServiceError::InvalidInput(format!(
            "line must be 1 or {MOTD_LINES}"
        )));
    }

    let mut staged = state.settings().read().await.entity();
    let count = staged.ping_messages.len();
    if index < 1 || index > count + 1 {
        return Err(ServiceError::InvalidInput(format!(
            "there are {count} ping messages, so the index must be between 1 and {}",
            count + 1
        )));
    }

    let old = if index <= count {
        staged.ping_messages[index - 1].clone()
    } else {
        String::new()
    };
    let template = splice_line(&old, line, &new_text);

    if index <= count {
        staged.ping_messages[index - 1] = template.clone();
    } else {
        staged.ping_messages.push(template.clone());
    }

    state.store().save_settings(staged.clone()).await?;
    state.settings().write().await.commit(staged);

    info!(index, line, "ping message updated");
    Ok(SetMotdResponse {
        index,
        line,
        template,
    })
}

/// Payload for a server-list discovery probe: a randomly chosen ping
/// message plus the player-count texts while maintenance is active.
pub async fn discovery(state: &SharedState) -> DiscoveryResponse {
    let settings = state.settings().read().await;
    let maintenance = settings.is_maintenance();
    let motd = settings.random_ping_message(&mut rand::rng());

    let (player_count_text, player_count_hover) = if maintenance {
        (
            Some(settings.player_count_message()),
            Some(settings.player_count_hover_message()),
        )
    } else {
        (None, None)
    };
    let custom_icon = settings.has_custom_icon() && state.icon().read().await.is_some();

    DiscoveryResponse {
        maintenance,
        motd,
        player_count_text,
        player_count_hover,
        online_sessions: state.sessions().len(),
        custom_icon,
    }
}

/// Replace one of the two lines around the line-break marker, preserving
/// the other line when the marker is present.
fn splice_line(old: &str, line: usize, new_text: &str) -> String {
    match (line, old.split_once(text::NEWLINE_TOKEN)) {
        (1, Some((_, second))) => format!("{new_text}{}{second}", text::NEWLINE_TOKEN),
        (1, None) => new_text.to_owned(),
        (_, Some((first, _))) => format!("{first}{}{new_text}", text::NEWLINE_TOKEN),
        (_, None) => format!("{old}{}{new_text}", text::NEWLINE_TOKEN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{maintenance_service, test_support::test_state};

    #[tokio::test]
    async fn set_line_checks_index_and_line_bounds() {
        let state = test_state().await;
        assert_eq!(list(&state).await.entries.len(), 1);

        for (index, line) in [(0, 1), (3, 1), (1, 0), (1, 3)] {
            let err = set_line(&state, index, line, "text".into())
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn edits_persist_and_one_past_the_end_appends() {
        let state = test_state().await;

        let response = set_line(&state, 2, 1, "&bAppended".into()).await.unwrap();
        assert_eq!(response.template, "&bAppended");
        assert_eq!(list(&state).await.entries.len(), 2);

        let response = set_line(&state, 2, 2, "&bSecond line".into()).await.unwrap();
        assert_eq!(response.template, "&bAppended%NEWLINE%&bSecond line");

        let persisted = state.store().load_settings().await.unwrap();
        assert_eq!(
            persisted.ping_messages[1],
            "&bAppended%NEWLINE%&bSecond line"
        );
    }

    #[tokio::test]
    async fn discovery_shows_player_count_texts_only_during_maintenance() {
        let state = test_state().await;

        let payload = discovery(&state).await;
        assert!(!payload.maintenance);
        assert!(payload.player_count_text.is_none());
        assert!(!payload.motd.is_empty());

        maintenance_service::set_maintenance(&state, true).await.unwrap();
        let payload = discovery(&state).await;
        assert!(payload.maintenance);
        assert!(payload.player_count_text.is_some());
        assert!(payload.player_count_hover.is_some());
    }

    #[test]
    fn first_line_replacement_keeps_second_line() {
        assert_eq!(
            splice_line("one%NEWLINE%two", 1, "new"),
            "new%NEWLINE%two"
        );
        assert_eq!(splice_line("only", 1, "new"), "new");
    }

    #[test]
    fn second_line_replacement_keeps_first_line() {
        assert_eq!(
            splice_line("one%NEWLINE%two", 2, "new"),
            "one%NEWLINE%new"
        );
        assert_eq!(splice_line("only", 2, "new"), "only%NEWLINE%new");
    }

    #[test]
    fn empty_template_grows_as_expected() {
        assert_eq!(splice_line("", 1, "new"), "new");
        assert_eq!(splice_line("", 2, "new"), "%NEWLINE%new");
    }
}

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::whitelist::{
        AddWhitelistResponse, RemoveWhitelistResponse, WhitelistEntryDto, WhitelistResponse,
    },
    error::ServiceError,
    state::SharedState,
};

use super::sse_events;

/// Insert or overwrite a whitelist entry. Persists before the in-memory
/// mirror is touched; the flag reports whether the identity was new.
pub async fn add(
    state: &SharedState,
    id: Uuid,
    name: String,
) -> Result<AddWhitelistResponse, ServiceError> {
    let _gate = state.mutation_gate().lock().await;

    let (staged, newly_added) = state.whitelist().read().await.staged_add(id, name.clone());
    state.store().save_whitelist(staged.clone()).await?;
    state.whitelist().write().await.commit(staged);

    info!(%id, name, newly_added, "whitelisted identity");
    sse_events::broadcast_whitelist_changed(state, id, &name, true);
    Ok(AddWhitelistResponse { added: newly_added })
}

/// Remove an entry by identity; the authoritative removal path. A miss is
/// a boolean result, not an error.
pub async fn remove_by_id(
    state: &SharedState,
    id: Uuid,
) -> Result<RemoveWhitelistResponse, ServiceError> {
    let _gate = state.mutation_gate().lock().await;
    remove_locked(state, id).await
}

/// Best-effort removal by display name, kept for backward compatibility.
/// The name is resolved to candidate identities through a non-authoritative
/// lookup; the first match in insertion order is removed.
pub async fn remove_by_name(
    state: &SharedState,
    name: &str,
) -> Result<RemoveWhitelistResponse, ServiceError> {
    let _gate = state.mutation_gate().lock().await;

    let candidates = state.whitelist().read().await.resolve_name(name);
    let Some(&id) = candidates.first() else {
        return Ok(RemoveWhitelistResponse {
            removed: false,
            id: None,
        });
    };
    if candidates.len() > 1 {
        warn!(
            name,
            candidates = candidates.len(),
            "removing by ambiguous display name; first match wins"
        );
    }

    remove_locked(state, id).await
}

/// User-facing listing, placeholder row hidden.
pub async fn list(state: &SharedState) -> WhitelistResponse {
    let whitelist = state.whitelist().read().await;
    let entries: Vec<WhitelistEntryDto> = whitelist
        .list()
        .into_iter()
        .map(|(id, name)| WhitelistEntryDto { id, name })
        .collect();
    let empty = whitelist.is_effectively_empty();
    WhitelistResponse { entries, empty }
}

async fn remove_locked(
    state: &SharedState,
    id: Uuid,
) -> Result<RemoveWhitelistResponse, ServiceError> {
    let (staged, name) = {
        let whitelist = state.whitelist().read().await;
        let name = whitelist
            .entries()
            .get(&id)
            .cloned()
            .unwrap_or_default();
        (whitelist.staged_remove(id), name)
    };

    let Some(staged) = staged else {
        return Ok(RemoveWhitelistResponse {
            removed: false,
            id: None,
        });
    };

    state.store().save_whitelist(staged.clone()).await?;
    state.whitelist().write().await.commit(staged);

    info!(%id, name, "removed identity from whitelist");
    sse_events::broadcast_whitelist_changed(state, id, &name, false);
    Ok(RemoveWhitelistResponse {
        removed: true,
        id: Some(id),
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::services::test_support::test_state;

    #[tokio::test]
    async fn add_and_remove_round_trip_persists() {
        let state = test_state().await;
        let id = Uuid::new_v4();

        let response = add(&state, id, "Steve".into()).await.unwrap();
        assert!(response.added);
        assert!(
            state
                .store()
                .load_whitelist()
                .await
                .unwrap()
                .contains_key(&id)
        );

        let response = add(&state, id, "Alex".into()).await.unwrap();
        assert!(!response.added);
        let listing = list(&state).await;
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "Alex");

        let removed = remove_by_id(&state, id).await.unwrap();
        assert!(removed.removed);
        assert!(
            !state
                .store()
                .load_whitelist()
                .await
                .unwrap()
                .contains_key(&id)
        );
        assert!(list(&state).await.empty);
    }

    #[tokio::test]
    async fn removal_miss_is_reported_not_an_error() {
        let state = test_state().await;

        let response = remove_by_id(&state, Uuid::new_v4()).await.unwrap();
        assert!(!response.removed);
        assert!(response.id.is_none());

        let response = remove_by_name(&state, "Ghost").await.unwrap();
        assert!(!response.removed);
    }

    #[tokio::test]
    async fn removal_by_name_takes_the_first_match() {
        let state = test_state().await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        add(&state, first, "Twin".into()).await.unwrap();
        add(&state, second, "Twin".into()).await.unwrap();

        let response = remove_by_name(&state, "Twin").await.unwrap();
        assert!(response.removed);
        assert_eq!(response.id, Some(first));

        let listing = list(&state).await;
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].id, second);
    }
}

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the maintenance backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::discovery::discovery,
        crate::routes::discovery::icon,
        crate::routes::sse::events_stream,
        crate::routes::sse::admin_stream,
        crate::routes::session::session_handler,
        crate::routes::maintenance::get_status,
        crate::routes::maintenance::enable,
        crate::routes::maintenance::disable,
        crate::routes::maintenance::reload,
        crate::routes::timer::get_timer,
        crate::routes::timer::start_timer,
        crate::routes::timer::end_timer,
        crate::routes::timer::cancel_timer,
        crate::routes::whitelist::list_whitelist,
        crate::routes::whitelist::add_entry,
        crate::routes::whitelist::remove_entry,
        crate::routes::whitelist::remove_entry_by_name,
        crate::routes::motd::list_motds,
        crate::routes::motd::set_motd_line,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::discovery::DiscoveryResponse,
            crate::dto::maintenance::MaintenanceStatus,
            crate::dto::maintenance::ReloadResponse,
            crate::dto::timer::StartTimerRequest,
            crate::dto::timer::TimerStatus,
            crate::dto::timer::CancelTimerResponse,
            crate::dto::whitelist::AddWhitelistRequest,
            crate::dto::whitelist::WhitelistEntryDto,
            crate::dto::whitelist::WhitelistResponse,
            crate::dto::whitelist::AddWhitelistResponse,
            crate::dto::whitelist::RemoveWhitelistResponse,
            crate::dto::motd::SetMotdRequest,
            crate::dto::motd::MotdEntry,
            crate::dto::motd::MotdListResponse,
            crate::dto::motd::SetMotdResponse,
            crate::dto::sse::Handshake,
            crate::dto::ws::SessionInboundMessage,
            crate::dto::ws::SessionAck,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "discovery", description = "Server-list probe payloads"),
        (name = "sse", description = "Server-sent event streams"),
        (name = "sessions", description = "WebSocket operations for game sessions"),
        (name = "maintenance", description = "Maintenance state operations"),
        (name = "timer", description = "Scheduled state transitions"),
        (name = "whitelist", description = "Maintenance whitelist management"),
        (name = "motd", description = "Ping message management"),
    )
)]
pub struct ApiDoc;

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod discovery;
pub mod health;
pub mod maintenance;
pub mod motd;
pub mod sse;
pub mod timer;
pub mod validation;
pub mod whitelist;
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

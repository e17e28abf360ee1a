//! Test fixtures and data generators

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

use synapse_core::UserIdentity;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A unique team id per test, so parallel tests never share a room
pub fn unique_team_id() -> String {
    format!("team-{}", unique_suffix())
}

/// Identity for a named test user
pub fn user(name: &str) -> UserIdentity {
    UserIdentity::new(
        format!("uid-{name}"),
        format!("{name}@example.com"),
        Some(name.to_string()),
    )
}

/// A team document whose admin is `admin` and whose member list is `members`
pub fn team_doc(team_id: &str, admin: &UserIdentity, members: &[&UserIdentity]) -> Value {
    json!({
        "team_id": team_id,
        "name": format!("Team {team_id}"),
        "admin_id": admin.user_id,
        "members": members
            .iter()
            .map(|m| json!({ "user_id": m.user_id, "email": m.email }))
            .collect::<Vec<_>>(),
        "created_at": chrono::Utc::now(),
    })
}

//! Shared User-Agent string for page requests.

/// Project URL included in the User-Agent.
const PROJECT_UA_URL: &str = "https://github.com/workshop-dl/workshop-dl";

/// Default User-Agent for Workshop page requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("workshop-dl/{version} (+{PROJECT_UA_URL})")
}

//! Per-session mutable state threaded through the parser.

use super::login::LoginScript;
use super::negotiation::Negotiation;
use crate::store::Settings;

/// Everything the parser remembers between lines of one game session.
///
/// Owned by the caller and lent to the parser; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub settings: Settings,
    pub negotiation: Negotiation,
    pub login: LoginScript,
    /// Whether haggle suggestions should be sent automatically
    pub auto_haggle: bool,
    /// Course plot text collected so far, while a multi-line plot is open
    pub(crate) pending_route: Option<String>,
}

impl SessionContext {
    /// Start a session from persisted settings. A stored `auto_haggle`
    /// value wins over `default_auto_haggle`.
    pub fn new(settings: Settings, default_auto_haggle: bool) -> Self {
        let auto_haggle = settings.auto_haggle().unwrap_or(default_auto_haggle);
        Self {
            settings,
            auto_haggle,
            ..Default::default()
        }
    }

    pub fn with_login(mut self, login: LoginScript) -> Self {
        self.login = login;
        self
    }

    /// True while a course plot spans lines not yet seen.
    pub fn route_pending(&self) -> bool {
        self.pending_route.is_some()
    }
}

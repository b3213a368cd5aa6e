//! Presence participant model.

use serde::{Deserialize, Serialize};

/// One presence participant as announced over the presence channel.
///
/// Identity is keyed by `name`: two messages carrying the same name refer to
/// the same participant, and the later message fully replaces the earlier
/// one's attributes (last-write-wins, no field merge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique roster key within a session. Must be non-empty.
    pub name: String,
    /// Optional display label (for example a team role).
    pub role: Option<String>,
    /// Optional display reference for an avatar image.
    pub avatar: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            avatar: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

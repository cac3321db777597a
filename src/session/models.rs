use serde::{Deserialize, Serialize};

use crate::auth::AuthProvider;

/// Portal roles, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    School,
    Admin,
}

impl Role {
    pub fn ordinal(self) -> u8 {
        match self {
            Role::Parent => 1,
            Role::School => 2,
            Role::Admin => 3,
        }
    }

    /// One-directional ordinal check. This is a coarse stand-in for real
    /// permissions: an admin passes every gate, a parent only parent gates.
    pub fn satisfies(self, required: Role) -> bool {
        self.ordinal() >= required.ordinal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub linked_providers: Vec<AuthProvider>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            name: None,
            phone: None,
            email: None,
            linked_providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshing,
    Expired,
}

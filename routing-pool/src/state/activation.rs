//! Activation levels for pool entries and for the pool as a whole.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationState {
    /// In the pool, not attached to the parent.
    #[default]
    Inactive,
    /// Attached and running.
    Active,
    /// Logically active, but detached while the pool sleeps.
    Sleeping,
}

impl ActivationState {
    pub fn sleep(self) -> Self {
        match self {
            Self::Active => Self::Sleeping,
            other => other,
        }
    }

    pub fn wake_up(self) -> Self {
        match self {
            Self::Sleeping => Self::Active,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
            Self::Sleeping => "SLEEPING",
        }
    }
}

impl std::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

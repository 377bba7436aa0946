use std::fmt::Debug;

use thiserror::Error;

/// A command or lookup referenced a key that is neither a default element of
/// the current batch nor present in the pool.
#[derive(Debug, Clone, Error)]
#[error("key {key} not found in pool (known keys: {known})")]
pub struct KeyNotFoundError {
    pub key: String,
    pub known: String,
}

impl KeyNotFoundError {
    pub fn new<'a, C, I>(key: &C, known: I) -> Self
    where
        C: Debug + 'a,
        I: IntoIterator<Item = &'a C>,
    {
        let known: Vec<String> = known.into_iter().map(|k| format!("{:?}", k)).collect();
        Self {
            key: format!("{:?}", key),
            known: format!("[{}]", known.join(", ")),
        }
    }
}

/// Building the action for one command failed; the whole batch was discarded.
#[derive(Debug, Clone, Error)]
#[error("could not execute command #{index}: {command}")]
pub struct CommandExecutionError {
    pub index: usize,
    pub command: String,
    #[source]
    pub source: KeyNotFoundError,
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("configuration feature is closed")]
    Closed,
    #[error(transparent)]
    Command(#[from] CommandExecutionError),
}

pub type Result<T> = std::result::Result<T, FeatureError>;

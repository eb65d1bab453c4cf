//! Store configuration.

use crate::durability::Durability;

/// Configuration for opening a shared store.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Durability mode for commits.
    pub durability: Durability,

    /// Whether opening fails if the data file does not already exist.
    ///
    /// Ignored under [`Durability::MemOnly`], which has no file semantics.
    pub file_must_exist: bool,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the durability mode.
    #[must_use]
    pub const fn durability(mut self, value: Durability) -> Self {
        self.durability = value;
        self
    }

    /// Sets whether the data file must already exist.
    #[must_use]
    pub const fn file_must_exist(mut self, value: bool) -> Self {
        self.file_must_exist = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.durability, Durability::Full);
        assert!(!config.file_must_exist);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .durability(Durability::Async)
            .file_must_exist(true);

        assert_eq!(config.durability, Durability::Async);
        assert!(config.file_must_exist);
    }
}

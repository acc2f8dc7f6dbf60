//! Configuration system
//!
//! [`CollisionConfig`] holds the collision-detection settings consumed by
//! [`crate::collision::CollisionDomain`]. Any config type implementing
//! [`Config`] can be loaded from and saved to TOML or RON files.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// # Collision Detection Configuration
///
/// Settings for the narrow phase, contact caching and continuous collision
/// detection. Unknown fields fall back to their defaults when loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Distance within which a new contact is considered the same as a cached one
    pub contact_position_tolerance: f32,
    /// Whether the narrow phase may run on the worker pool
    pub enable_multithreading: bool,
    /// Worker thread count (`None` = available parallelism)
    pub worker_threads: Option<usize>,
    /// Bisection steps used by the time-of-impact search
    pub toi_iterations: u32,
    /// Time-of-impact results are accurate to this fraction of the step
    pub toi_tolerance: f32,
}

impl CollisionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            contact_position_tolerance: 0.01,
            enable_multithreading: true,
            worker_threads: None,
            toi_iterations: 16,
            toi_tolerance: 1e-4,
        }
    }

    /// Set the contact merge tolerance
    pub fn with_contact_position_tolerance(mut self, tolerance: f32) -> Self {
        self.contact_position_tolerance = tolerance;
        self
    }

    /// Enable or disable the multithreaded narrow phase
    pub fn with_multithreading(mut self, enabled: bool) -> Self {
        self.enable_multithreading = enabled;
        self
    }

    /// Set a fixed worker thread count
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the time-of-impact bisection parameters
    pub fn with_toi(mut self, iterations: u32, tolerance: f32) -> Self {
        self.toi_iterations = iterations;
        self.toi_tolerance = tolerance;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.contact_position_tolerance.is_finite() || self.contact_position_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "contact_position_tolerance",
                reason: format!("must be finite and >= 0, got {}", self.contact_position_tolerance),
            });
        }

        if self.worker_threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "worker_threads",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.toi_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "toi_iterations",
                reason: "must be at least 1".to_string(),
            });
        }

        if !(self.toi_tolerance > 0.0 && self.toi_tolerance < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "toi_tolerance",
                reason: format!("must be in (0, 1), got {}", self.toi_tolerance),
            });
        }

        Ok(())
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for CollisionConfig {}

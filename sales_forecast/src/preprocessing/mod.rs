//! Data preparation ahead of training: cleaning, feature construction and scaling

pub mod cleaner;
pub mod features;
pub mod scaler;

pub use cleaner::{DataCleaner, MissingValueStrategy, DEFAULT_IQR_MULTIPLIER};
pub use features::FeatureEngineer;
pub use scaler::{Scaler, ScalingMethod};

pub mod config;
pub mod error;
pub mod types;

pub use config::{AudienceConfig, MissPolicy};
pub use error::{AudienceError, AudienceResult};
pub use types::{Member, Profile, ProfileEvent};

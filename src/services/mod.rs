pub mod catalog;
pub mod progress;
pub mod providers;
pub mod recommendations;
pub mod watch_state;

pub use providers::{PlaylistSource, RecommendationEngine};
pub use recommendations::PendingRecommendations;

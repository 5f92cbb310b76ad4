pub mod cache;
pub mod orchestrator;
pub mod service;

pub use cache::{CacheKey, ResultCache};
pub use orchestrator::{
    BurnDiscovery, DiscoveryPath, FallbackOrchestrator, OrchestratorConfig, PathState,
};
pub use service::{LeaderboardOptions, LeaderboardService, ServiceSettings};

pub use leaderboard_core::{LeaderboardError, LeaderboardResponse, Result};

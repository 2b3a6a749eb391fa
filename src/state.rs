use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::marketing::SinkRegistry;
use crate::rate_limit::PinRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub marketing: SinkRegistry,
    pub pin_limiter: PinRateLimiter,
}

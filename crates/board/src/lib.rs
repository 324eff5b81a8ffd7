//! Terminal session board: fetch, filter, and render sessions and quotas.

pub mod config;
pub mod render;

use sportsync_client::{ApiError, SportsApi};
use sportsync_core::clock::SystemClock;
use sportsync_core::filter::sort_by_start;
use sportsync_core::quota::QuotaEvaluator;
use sportsync_core::timing::TimingResolver;

use crate::config::BoardConfig;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Fetch sessions and quotas, then render the board for `config.filter`.
pub async fn run(config: &BoardConfig) -> Result<String, BoardError> {
    let api = SportsApi::new(config.client.clone())?.with_limit_mode(config.limit_mode);

    let mut sessions = api.list_sessions().await?;
    let quotas = api.get_quotas().await?;

    let resolver = TimingResolver::new(SystemClock).with_offset(config.utc_offset);
    sort_by_start(&mut sessions, &resolver);

    let evaluator = QuotaEvaluator::new(config.limit_mode);
    Ok(render::render_board(
        &sessions,
        &quotas,
        config.filter,
        &resolver,
        &evaluator,
    ))
}

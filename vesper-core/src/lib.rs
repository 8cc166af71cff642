pub mod gateway;

use std::sync::Arc;

use vesper_database::Database;
use vesper_notify::config::DelayBounds;
use vesper_notify::engine::TransitionEngine;

use gateway::GatewayNotifier;

pub type Error = anyhow::Error;

#[derive(Clone, Debug)]
pub struct Data {
    pub db: Database,
    pub notifier: Arc<TransitionEngine<GatewayNotifier>>,
    pub bounds: DelayBounds,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;

use std::sync::Arc;

use anyhow::Error;

use super::{
    auth::{Authenticator, SupabaseAuth},
    config::Config,
    database::{RedisStore, init_redis},
    judge::{Judge, OpenAiJudge},
    store::Store,
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub judge: Arc<dyn Judge>,
    pub auth: Arc<dyn Authenticator>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, Error> {
        let config = Config::load();

        let redis_connection = init_redis(&config.redis_url).await?;
        let judge = OpenAiJudge::from_config(&config)?;
        let auth = SupabaseAuth::from_config(&config)?;

        Ok(Self::with_parts(
            config,
            Arc::new(RedisStore::new(redis_connection)),
            Arc::new(judge),
            Arc::new(auth),
        ))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        judge: Arc<dyn Judge>,
        auth: Arc<dyn Authenticator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            judge,
            auth,
        })
    }
}

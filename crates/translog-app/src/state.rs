use std::sync::Arc;

use axum::extract::FromRef;
use translog_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, pool }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

impl FromRef<AppState> for () {
    fn from_ref(_state: &AppState) -> Self {}
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

pub struct AppConfig {
    pub default_page_size: u32,
}

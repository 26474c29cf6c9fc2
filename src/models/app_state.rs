use std::sync::atomic::AtomicUsize;

use crate::clients::analysis::AnalysisClient;
use crate::config::Config;

/// Application state shared between connections
pub struct AppState {
    pub config: Config,
    pub analysis: AnalysisClient,
    pub active_sessions: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config, analysis: AnalysisClient) -> Self {
        AppState {
            config,
            analysis,
            active_sessions: AtomicUsize::new(0),
        }
    }
}

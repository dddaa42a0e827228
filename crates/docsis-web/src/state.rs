use std::sync::Arc;

use docsis_core::config::Settings;
use docsis_core::ports::Store;
use docsis_engine::{DiscoveryCoordinator, RuleEvaluator};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub settings: Settings,
    pub discovery: Arc<DiscoveryCoordinator>,
    pub rule_evaluator: Arc<RuleEvaluator>,
}

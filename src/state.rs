use std::sync::Arc;

use crate::application::Pipeline;
use crate::application::services::{AdminService, AuthService};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub admin: Arc<AdminService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, auth_service: Arc<AuthService>) -> Self {
        let admin = Arc::new(pipeline.admin());
        Self {
            pipeline,
            admin,
            auth_service,
        }
    }
}

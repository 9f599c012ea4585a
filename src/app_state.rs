use std::sync::Arc;

use upload_core::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    /// Expected value of the shared service-credential header (spec §4.1).
    pub service_credential: String,
}

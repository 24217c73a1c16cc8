use talentdesk_application::JobCatalogService;

use crate::session_registry::SessionRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub job_catalog_service: JobCatalogService,
    pub frontend_url: String,
}

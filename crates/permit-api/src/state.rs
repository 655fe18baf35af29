//! Shared application state.

use std::sync::Arc;

use permit_pack::PackLoader;
use permit_portal::DriverRegistry;
use permit_state::Storage;

use crate::auth::{MagicLinkStore, MailSender};
use crate::jobs::JobQueue;
use crate::metrics::ApiMetrics;

/// Everything handlers need, cloned per request.
///
/// All stateful collaborators are injected here at construction —
/// nothing in the crate holds module-level state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub loader: Arc<PackLoader>,
    pub drivers: Arc<DriverRegistry>,
    pub magic_links: Arc<MagicLinkStore>,
    pub mailer: Arc<dyn MailSender>,
    pub jobs: JobQueue,
    pub metrics: ApiMetrics,
}

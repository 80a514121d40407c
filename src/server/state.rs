use std::sync::Arc;

use crate::CoachService;

/// Shared per-process state; cloned into every request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<CoachService>,
    /// Size cap for each uploaded audio file.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: CoachService, max_upload_bytes: usize) -> Self {
        Self {
            service: Arc::new(service),
            max_upload_bytes,
        }
    }
}

use std::sync::Arc;

use tradewh_infra::{QueryExecutor, QueryTimeouts, ReportService};

/// Shared handler state.
pub struct AppServices {
    pub reports: ReportService,
}

impl AppServices {
    pub fn new(executor: Arc<dyn QueryExecutor>, timeouts: QueryTimeouts) -> Self {
        Self {
            reports: ReportService::new(executor, timeouts),
        }
    }
}

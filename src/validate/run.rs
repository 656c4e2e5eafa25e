//! Per-run context handed to every component.

use tracing::{info_span, Span};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::runtime::Runtime;

/// One validation run: its id, configuration, execution capability and the
/// span every component logs under.
pub struct ValidationRun<'a> {
    id: Uuid,
    config: &'a HarnessConfig,
    runtime: &'a dyn Runtime,
    span: Span,
}

impl<'a> ValidationRun<'a> {
    pub fn new(config: &'a HarnessConfig, runtime: &'a dyn Runtime, snippet: &str) -> Self {
        let id = Uuid::new_v4();
        let span = info_span!(
            "validation",
            run_id = %id,
            snippet = %snippet,
            runtime = runtime.name()
        );
        Self {
            id,
            config,
            runtime,
            span,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &HarnessConfig {
        self.config
    }

    pub fn runtime(&self) -> &dyn Runtime {
        self.runtime
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

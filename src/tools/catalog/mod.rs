//! The two data-source capabilities and the default registry wiring.

pub mod advisories;
pub mod bugs;

use std::sync::Arc;

pub use advisories::{AdvisoryQuery, SecurityAdvisoriesTool};
pub use bugs::{BugQuery, BugsByKeywordTool};

use super::registry::ToolRegistry;
use super::spec::ToolSpec;
use crate::api::ApiClient;

/// Specs of every catalog tool, in registration order.
pub fn specs() -> Vec<ToolSpec> {
    vec![advisories::spec(), bugs::spec()]
}

/// Registry with both capabilities, advisories first.
pub fn default_registry(client: Arc<ApiClient>, advisory_page_size: u32) -> ToolRegistry {
    ToolRegistry::builder()
        .register(Arc::new(
            SecurityAdvisoriesTool::new(client.clone()).with_page_size(advisory_page_size),
        ))
        .register(Arc::new(BugsByKeywordTool::new(client)))
        .build()
}

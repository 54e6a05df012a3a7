//! `get_security_advisories`: advisories published within a date range.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::ApiClient;
use crate::error::BugwatchError;
use crate::tools::spec::{ToolName, ToolSpec};
use crate::tools::tool::{ToolInput, TypedTool};

pub const MAX_PAGE_INDEX: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 5;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Arguments of a date-ranged advisory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdvisoryQuery {
    pub start_date: String,
    pub end_date: String,
    pub page_index: u32,
}

impl AdvisoryQuery {
    /// Parsed and checked `(start, end)` dates plus page bounds.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), BugwatchError> {
        let start = parse_date("start_date", &self.start_date)?;
        let end = parse_date("end_date", &self.end_date)?;
        if start > end {
            return Err(BugwatchError::InvalidArgument(format!(
                "`start_date` ({start}) must not be after `end_date` ({end})"
            )));
        }
        if !(1..=MAX_PAGE_INDEX).contains(&self.page_index) {
            return Err(BugwatchError::InvalidArgument(format!(
                "`page_index` must be an integer between 1 and {MAX_PAGE_INDEX}"
            )));
        }
        Ok((start, end))
    }
}

impl ToolInput for AdvisoryQuery {
    fn validate(&self) -> Result<(), BugwatchError> {
        self.date_range().map(|_| ())
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, BugwatchError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        BugwatchError::InvalidArgument(format!(
            "`{field}` must be a date in the format YYYY-MM-DD, got '{value}'"
        ))
    })
}

/// Declared schema for the advisory lookup.
pub fn spec() -> ToolSpec {
    ToolSpec::builder(
        ToolName::SecurityAdvisories,
        "Fetch security advisories published within a specified date range.",
    )
    .string(
        "start_date",
        "Start date in the format YYYY-MM-DD (e.g., '2024-05-12').",
        None,
        true,
    )
    .string(
        "end_date",
        "End date in the format YYYY-MM-DD (e.g., '2024-05-12').",
        None,
        true,
    )
    .integer(
        "page_index",
        "The current page index. Must be between 1 and 100.",
        Some(1),
        Some(MAX_PAGE_INDEX as i64),
        true,
    )
    .build()
}

/// Looks up security advisories by last-published date.
#[derive(Debug)]
pub struct SecurityAdvisoriesTool {
    client: Arc<ApiClient>,
    page_size: u32,
    spec: ToolSpec,
}

impl SecurityAdvisoriesTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
            spec: spec(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn lookup(&self, query: &AdvisoryQuery) -> Result<String, BugwatchError> {
        let (start, end) = query.date_range()?;
        let url = self
            .client
            .endpoint(&["security", "advisories", "v2", "all", "lastpublished"])?;
        let params = [
            ("startDate", start.format(DATE_FORMAT).to_string()),
            ("endDate", end.format(DATE_FORMAT).to_string()),
            ("pageIndex", query.page_index.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        self.client
            .get_text(url, &params)
            .await
            .map_err(describe_fault)
    }
}

fn describe_fault(err: BugwatchError) -> BugwatchError {
    let message = match &err {
        BugwatchError::Api { status, message } => format!(
            "HTTP error occurred while fetching security advisories: {status} - {message}"
        ),
        other => format!("An error occurred while fetching security advisories: {other}"),
    };
    BugwatchError::tool(ToolName::SecurityAdvisories.as_str(), message)
}

#[async_trait]
impl TypedTool for SecurityAdvisoriesTool {
    type Input = AdvisoryQuery;

    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, input: AdvisoryQuery) -> Result<String, BugwatchError> {
        self.lookup(&input).await
    }
}

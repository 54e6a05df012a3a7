//! `get_bugs_by_keyword`: defect search by keyword.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::ApiClient;
use crate::error::BugwatchError;
use crate::tools::spec::{ToolName, ToolSpec};
use crate::tools::tool::{ToolInput, TypedTool};

pub const KEYWORD_MAX_CHARS: usize = 50;

/// Arguments of a keyword defect lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BugQuery {
    pub keyword: String,
    #[serde(default = "first_page")]
    pub page_index: u32,
}

fn first_page() -> u32 {
    1
}

impl ToolInput for BugQuery {
    fn validate(&self) -> Result<(), BugwatchError> {
        if self.keyword.trim().is_empty() {
            return Err(BugwatchError::InvalidArgument(
                "`keyword` must not be empty".to_string(),
            ));
        }
        if self.keyword.chars().count() > KEYWORD_MAX_CHARS {
            return Err(BugwatchError::InvalidArgument(format!(
                "`keyword` must be a string with a maximum length of {KEYWORD_MAX_CHARS} characters"
            )));
        }
        if self.page_index < 1 {
            return Err(BugwatchError::InvalidArgument(
                "`page_index` must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Declared schema for the keyword defect lookup.
pub fn spec() -> ToolSpec {
    ToolSpec::builder(
        ToolName::BugsByKeyword,
        "Fetches bugs based on a keyword from the Cisco API.",
    )
    .string(
        "keyword",
        "Keyword(s) to return details on associated bugs. Maximum length of 50 characters.",
        Some(KEYWORD_MAX_CHARS),
        true,
    )
    .integer(
        "page_index",
        "Index number of the page to return. Defaults to 1.",
        Some(1),
        None,
        false,
    )
    .build()
}

/// Looks up defect records matching a keyword.
#[derive(Debug)]
pub struct BugsByKeywordTool {
    client: Arc<ApiClient>,
    spec: ToolSpec,
}

impl BugsByKeywordTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            spec: spec(),
        }
    }

    pub async fn lookup(&self, query: &BugQuery) -> Result<String, BugwatchError> {
        query.validate()?;
        let url = self
            .client
            .endpoint(&["bug", "v3.0", "bugs", "keyword", query.keyword.as_str()])?;
        self.client
            .get_text(url, &[("page_index", query.page_index.to_string())])
            .await
            .map_err(describe_fault)
    }
}

fn describe_fault(err: BugwatchError) -> BugwatchError {
    let message = match &err {
        BugwatchError::Api { status, message } => format!(
            "HTTP error occurred while fetching defect details: {status} - {message}"
        ),
        other => format!("An error occurred while fetching defect details: {other}"),
    };
    BugwatchError::tool(ToolName::BugsByKeyword.as_str(), message)
}

#[async_trait]
impl TypedTool for BugsByKeywordTool {
    type Input = BugQuery;

    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, input: BugQuery) -> Result<String, BugwatchError> {
        self.lookup(&input).await
    }
}

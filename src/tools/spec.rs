//! Tool identifiers and declared call schemas.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Closed set of tools the agent can advertise to the model.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum ToolName {
    #[serde(rename = "get_security_advisories")]
    #[strum(serialize = "get_security_advisories")]
    SecurityAdvisories,
    #[serde(rename = "get_bugs_by_keyword")]
    #[strum(serialize = "get_bugs_by_keyword")]
    BugsByKeyword,
}

impl ToolName {
    /// Wire name used in the model API.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Type and constraints of one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    String { max_length: Option<usize> },
    Integer { minimum: Option<i64>, maximum: Option<i64> },
    Boolean,
}

impl ParameterKind {
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub kind: ParameterKind,
    pub required: bool,
}

/// Static descriptor of a tool: name, description and parameter schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSpec {
    /// Start building a spec.
    pub fn builder(name: ToolName, description: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder {
            name,
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON Schema for the parameters, as advertised to the model.
    pub fn schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut prop = serde_json::json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            match param.kind {
                ParameterKind::String {
                    max_length: Some(max),
                } => {
                    prop["maxLength"] = max.into();
                }
                ParameterKind::Integer { minimum, maximum } => {
                    if let Some(min) = minimum {
                        prop["minimum"] = min.into();
                    }
                    if let Some(max) = maximum {
                        prop["maximum"] = max.into();
                    }
                }
                _ => {}
            }
            properties.insert(param.name.clone(), prop);
            if param.required {
                required.push(param.name.clone());
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Full descriptor: name, description and parameter schema.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name.as_str(),
            "description": self.description,
            "parameters": self.schema(),
        })
    }
}

/// Builder for [`ToolSpec`].
pub struct ToolSpecBuilder {
    name: ToolName,
    description: String,
    parameters: Vec<ParameterSpec>,
}

impl ToolSpecBuilder {
    fn push(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: ParameterKind,
        required: bool,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            description: description.into(),
            kind,
            required,
        });
        self
    }

    /// Add a string parameter with an optional length ceiling (in characters).
    pub fn string(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        max_length: Option<usize>,
        required: bool,
    ) -> Self {
        self.push(name, description, ParameterKind::String { max_length }, required)
    }

    /// Add an integer parameter with optional inclusive bounds.
    pub fn integer(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        minimum: Option<i64>,
        maximum: Option<i64>,
        required: bool,
    ) -> Self {
        self.push(
            name,
            description,
            ParameterKind::Integer { minimum, maximum },
            required,
        )
    }

    pub fn boolean(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.push(name, description, ParameterKind::Boolean, required)
    }

    pub fn build(self) -> ToolSpec {
        ToolSpec {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
        }
    }
}

//! Tool registry
//!
//! A fixed set of deterministic tools the model may call. Each tool pairs a
//! name, a typed argument record and a pure `args -> text` function.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tooluse_provider::{object_schema, Tool};

pub mod calc;
pub mod faq;
pub mod time;

/// Faults raised while invoking a tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// Arguments for `get_time`
#[derive(Debug, Clone, Deserialize)]
pub struct GetTimeArgs {
    pub location: String,
}

/// Arguments for `calc`
#[derive(Debug, Clone, Deserialize)]
pub struct CalcArgs {
    pub expression: String,
}

/// Arguments for `lookup_faq`
#[derive(Debug, Clone, Deserialize)]
pub struct LookupFaqArgs {
    pub query: String,
}

/// Every tool the agent knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetTime,
    Calc,
    LookupFaq,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::GetTime, ToolKind::Calc, ToolKind::LookupFaq];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::GetTime => time::TOOL_NAME,
            ToolKind::Calc => "calc",
            ToolKind::LookupFaq => "lookup_faq",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::GetTime => {
                "Get the current time for a specific location. Use this when the user asks \
                 about the current time in a city."
            }
            ToolKind::Calc => {
                "Calculate a mathematical expression. Handles percentage phrasing \
                 (e.g. '18% of 24500') and standard arithmetic (e.g. '2 + 2 * 3')."
            }
            ToolKind::LookupFaq => {
                "Look up an answer in the FAQ knowledge base. Returns JSON with 'answer' and \
                 'source_title'; unknown topics return a fallback listing available topics."
            }
        }
    }

    /// JSON schema of the argument record
    pub fn parameters(&self) -> Value {
        let (name, description) = match self {
            ToolKind::GetTime => (
                "location",
                "The city name (e.g. 'Cape Town', 'New York', 'Bangkok', 'London', 'Tokyo', 'UTC')",
            ),
            ToolKind::Calc => (
                "expression",
                "A mathematical expression. Supports + - * / ( ), and percentages like '18% of 24500'",
            ),
            ToolKind::LookupFaq => (
                "query",
                "The question or search query. Topics include refund policy, shipping, \
                 business hours, payment methods, warranty",
            ),
        };
        object_schema(vec![(name.to_string(), description.to_string(), true)])
    }

    pub fn definition(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.parameters())
    }

    /// Decode the arguments and run the tool
    ///
    /// Domain problems (unknown city, division by zero, ...) come back as
    /// `Ok` text. `Err` is reserved for arguments that do not fit the schema.
    pub fn invoke(&self, args: Value) -> Result<String> {
        match self {
            ToolKind::GetTime => {
                let args: GetTimeArgs = serde_json::from_value(args)?;
                Ok(time::get_time(&args.location))
            }
            ToolKind::Calc => {
                let args: CalcArgs = serde_json::from_value(args)?;
                Ok(calc::calculate(&args.expression))
            }
            ToolKind::LookupFaq => {
                let args: LookupFaqArgs = serde_json::from_value(args)?;
                faq::lookup_faq(&args.query).map_err(|e| ToolError::Internal(e.to_string()))
            }
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static table of available tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Registry holding every tool
    pub fn new() -> Self {
        Self::with_tools(&ToolKind::ALL)
    }

    /// Registry restricted to the given tools
    pub fn with_tools(kinds: &[ToolKind]) -> Self {
        let mut tools: Vec<ToolKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !tools.contains(kind) {
                tools.push(*kind);
            }
        }
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<ToolKind> {
        self.tools.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn kinds(&self) -> &[ToolKind] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|kind| kind.name()).collect()
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(|kind| kind.definition()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

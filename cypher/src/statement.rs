//! Parameterized statements.
//!
//! A statement serializes directly into one entry of the transactional
//! endpoint's `statements` array.

use serde::Serialize;
use strand_core::{Properties, Value};

/// Result content a statement asks the server for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultContent {
    Row,
    Graph,
}

/// A statement with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    #[serde(rename = "statement")]
    pub text: String,
    pub parameters: Properties,
    #[serde(rename = "resultDataContents")]
    pub result_contents: Vec<ResultContent>,
    #[serde(rename = "includeStats")]
    pub include_stats: bool,
}

impl Statement {
    /// Create a statement returning rows.
    pub fn new(text: impl Into<String>, parameters: Properties) -> Self {
        Self {
            text: text.into(),
            parameters,
            result_contents: vec![ResultContent::Row],
            include_stats: false,
        }
    }

    /// Create a statement returning graph fragments.
    pub fn graph(text: impl Into<String>, parameters: Properties) -> Self {
        Self {
            result_contents: vec![ResultContent::Graph],
            ..Self::new(text, parameters)
        }
    }

    /// Create a statement returning both graph fragments and rows.
    pub fn graph_row(text: impl Into<String>, parameters: Properties) -> Self {
        Self {
            result_contents: vec![ResultContent::Graph, ResultContent::Row],
            ..Self::new(text, parameters)
        }
    }

    /// Ask the server for update counters.
    pub fn with_stats(mut self) -> Self {
        self.include_stats = true;
        self
    }

    /// Add a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn returns_graph(&self) -> bool {
        self.result_contents.contains(&ResultContent::Graph)
    }
}

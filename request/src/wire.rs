//! Wire body of the transactional endpoint.

use serde::{Deserialize, Serialize};
use strand_core::{GraphModel, QueryStatistics, Value};
use strand_cypher::Statement;

/// `{"statements": [...]}`
#[derive(Debug, Serialize)]
pub struct StatementsBody<'a> {
    pub statements: &'a [Statement],
}

/// A decoded response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub errors: Vec<ServerError>,
    /// Commit URL of an open transaction.
    #[serde(default)]
    pub commit: Option<String>,
}

/// The result of one statement of a batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<ResultData>,
    #[serde(default)]
    pub stats: Option<QueryStatistics>,
}

impl StatementResult {
    /// Value of a column in the first row.
    pub fn first_row_value(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.data.first()?.row.as_ref()?.get(index)
    }
}

/// One row of a statement result, in whichever contents were requested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub row: Option<Vec<Value>>,
    #[serde(default)]
    pub graph: Option<GraphModel>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerError {
    pub code: String,
    pub message: String,
}

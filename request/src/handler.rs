//! Request handler: statements in, decoded responses out.

use crate::{
    RequestError, RequestResult, Response, ResponseBody, StatementResult, StatementsBody,
    Transport,
};
use strand_core::{GraphModel, GraphRowModel, QueryStatistics, RowModel};
use strand_cypher::Statement;
use tracing::debug;

/// A decoded exchange with the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerResponse {
    /// The `Location` header, if any.
    pub location: Option<String>,
    pub body: ResponseBody,
}

/// Posts statement batches through a transport.
pub struct RequestHandler<'t, T: Transport> {
    transport: &'t mut T,
}

impl<'t, T: Transport> RequestHandler<'t, T> {
    /// Create a new handler over a transport.
    pub fn new(transport: &'t mut T) -> Self {
        Self { transport }
    }

    // ==================== Raw exchange ====================

    /// Post a batch of statements. A non-empty `errors` array fails the call.
    pub fn send(&mut self, url: &str, statements: &[Statement]) -> RequestResult<ServerResponse> {
        let body = serde_json::to_string(&StatementsBody { statements })?;
        debug!(url, statements = statements.len(), "posting statements");
        let reply = self.transport.post(url, &body)?;
        let decoded: ResponseBody = if reply.body.trim().is_empty() {
            ResponseBody::default()
        } else {
            serde_json::from_str(&reply.body)?
        };
        if let Some(error) = decoded.errors.first() {
            debug!(url, code = %error.code, "server reported an error");
            return Err(RequestError::server(error.code.clone(), error.message.clone()));
        }
        Ok(ServerResponse {
            location: reply.location,
            body: decoded,
        })
    }

    /// Issue a DELETE, failing on server errors in the reply body.
    pub fn delete(&mut self, url: &str) -> RequestResult<()> {
        debug!(url, "deleting");
        let reply = self.transport.delete(url)?;
        if reply.body.trim().is_empty() {
            return Ok(());
        }
        let decoded: ResponseBody = serde_json::from_str(&reply.body)?;
        match decoded.errors.first() {
            Some(error) => Err(RequestError::server(error.code.clone(), error.message.clone())),
            None => Ok(()),
        }
    }

    // ==================== Cursors ====================

    /// Execute a batch and hand out each statement's result.
    pub fn batch(&mut self, url: &str, statements: &[Statement]) -> RequestResult<Response<StatementResult>> {
        let response = self.send(url, statements)?;
        let mut totals: Option<QueryStatistics> = None;
        for result in &response.body.results {
            if let Some(stats) = &result.stats {
                totals.get_or_insert_with(QueryStatistics::default).merge(stats);
            }
        }
        Ok(Response::new("batch", Vec::new(), response.body.results, totals))
    }

    /// Execute a graph statement. Each result row yields its graph fragment.
    pub fn graph(&mut self, url: &str, statement: &Statement) -> RequestResult<Response<GraphModel>> {
        let result = self.single(url, statement)?;
        let graphs = result
            .data
            .into_iter()
            .map(|data| data.graph.ok_or_else(|| RequestError::shape("missing graph contents")))
            .collect::<RequestResult<Vec<_>>>()?;
        Ok(Response::new("graph", result.columns, graphs, result.stats))
    }

    /// Execute a row statement.
    pub fn rows(&mut self, url: &str, statement: &Statement) -> RequestResult<Response<RowModel>> {
        let result = self.single(url, statement)?;
        let rows = result
            .data
            .into_iter()
            .map(|data| {
                data.row
                    .map(RowModel::new)
                    .ok_or_else(|| RequestError::shape("missing row contents"))
            })
            .collect::<RequestResult<Vec<_>>>()?;
        Ok(Response::new("row", result.columns, rows, result.stats))
    }

    /// Execute a statement asking for both graph and row contents.
    pub fn graph_rows(
        &mut self,
        url: &str,
        statement: &Statement,
    ) -> RequestResult<Response<GraphRowModel>> {
        let result = self.single(url, statement)?;
        let rows = result
            .data
            .into_iter()
            .map(|data| match (data.graph, data.row) {
                (Some(graph), Some(row)) => Ok(GraphRowModel { graph, row }),
                _ => Err(RequestError::shape("missing graph or row contents")),
            })
            .collect::<RequestResult<Vec<_>>>()?;
        Ok(Response::new("graph-row", result.columns, rows, result.stats))
    }

    /// Execute a statement for its update counters only.
    pub fn statistics(&mut self, url: &str, statement: &Statement) -> RequestResult<Response<QueryStatistics>> {
        let result = self.single(url, statement)?;
        let stats = result.stats.clone().unwrap_or_default();
        Ok(Response::new("stats", result.columns, vec![stats], result.stats))
    }

    fn single(&mut self, url: &str, statement: &Statement) -> RequestResult<StatementResult> {
        let response = self.send(url, std::slice::from_ref(statement))?;
        Ok(response.body.results.into_iter().next().unwrap_or_default())
    }
}

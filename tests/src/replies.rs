//! Response bodies of the transactional endpoint.

use serde_json::{json, Value as Json};

/// A successful reply with no results.
pub fn empty() -> String {
    json!({"results": [], "errors": []}).to_string()
}

/// A server error.
pub fn error(code: &str, message: &str) -> String {
    json!({"results": [], "errors": [{"code": code, "message": message}]}).to_string()
}

/// A node of a graph result. Ids travel as strings, as the server sends them.
pub fn node(id: i64, label: &str, properties: Json) -> Json {
    json!({"id": id.to_string(), "labels": [label], "properties": properties})
}

/// A relationship of a graph result.
pub fn relationship(id: i64, rel_type: &str, start: i64, end: i64, properties: Json) -> Json {
    json!({
        "id": id.to_string(),
        "type": rel_type,
        "startNode": start.to_string(),
        "endNode": end.to_string(),
        "properties": properties
    })
}

/// A graph result of one row.
pub fn graph(nodes: Vec<Json>, relationships: Vec<Json>) -> String {
    json!({
        "results": [{
            "columns": ["p"],
            "data": [{"graph": {"nodes": nodes, "relationships": relationships}}]
        }],
        "errors": []
    })
    .to_string()
}

/// A graph-row result: each entry is a graph fragment and the id of its root.
pub fn graph_rows(rows: Vec<(Vec<Json>, Vec<Json>, i64)>) -> String {
    let data: Vec<Json> = rows
        .into_iter()
        .map(|(nodes, relationships, root)| {
            json!({
                "graph": {"nodes": nodes, "relationships": relationships},
                "row": [Json::Null, root]
            })
        })
        .collect();
    json!({"results": [{"columns": ["p", "ID(n)"], "data": data}], "errors": []}).to_string()
}

/// A row result.
pub fn rows(columns: &[&str], rows: Vec<Vec<Json>>) -> String {
    let data: Vec<Json> = rows.into_iter().map(|row| json!({ "row": row })).collect();
    json!({"results": [{"columns": columns, "data": data}], "errors": []}).to_string()
}

/// The reply to a create statement: one row with an id per alias.
pub fn created(ids: &[(&str, i64)]) -> String {
    let columns: Vec<&str> = ids.iter().map(|(alias, _)| *alias).collect();
    let row: Vec<i64> = ids.iter().map(|(_, id)| *id).collect();
    json!({
        "results": [{"columns": columns, "data": [{"row": row}]}],
        "errors": []
    })
    .to_string()
}

/// A statistics-only result.
pub fn stats(stats: Json) -> String {
    json!({"results": [{"columns": [], "data": [], "stats": stats}], "errors": []}).to_string()
}

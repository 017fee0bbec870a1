//! Guards for ad-hoc statements.
//!
//! These catch caller mistakes. They are not a security boundary: a write
//! hidden in a procedure call passes the read-only check.

use crate::{CypherError, CypherResult};
use regex_lite::Regex;

const WRITE_KEYWORDS: &str = r"\b(CREATE|MERGE|SET|DELETE|REMOVE)\b";
const RETURN_CLAUSE: &str = r"\bRETURN\b";

/// Reject empty or blank statement text.
pub fn check_not_empty(cypher: &str) -> CypherResult<()> {
    if cypher.trim().is_empty() {
        return Err(CypherError::EmptyStatement);
    }
    Ok(())
}

/// Reject statements containing a write clause as a whole word, in any case.
pub fn check_read_only(cypher: &str) -> CypherResult<()> {
    let re = Regex::new(WRITE_KEYWORDS).map_err(|e| CypherError::pattern(e.to_string()))?;
    match re.find(&cypher.to_uppercase()) {
        Some(found) => Err(CypherError::read_only_violation(found.as_str())),
        None => Ok(()),
    }
}

/// Reject statements containing a RETURN clause.
pub fn check_nothing_returned(cypher: &str) -> CypherResult<()> {
    let re = Regex::new(RETURN_CLAUSE).map_err(|e| CypherError::pattern(e.to_string()))?;
    if re.is_match(&cypher.to_uppercase()) {
        return Err(CypherError::ReturnNotAllowed);
    }
    Ok(())
}

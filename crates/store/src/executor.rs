//! The query-execution seam between [`SessionStore`](crate::SessionStore)
//! and a relational backend.

use async_trait::async_trait;

use crate::error::StorageError;

/// Schema of the single table every backend must provide.
pub const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS session (
        session_id TEXT NOT NULL,
        id TEXT NOT NULL,
        data TEXT NOT NULL,
        PRIMARY KEY (session_id, id)
    )
";

/// The statement shapes the store issues.  Ids are already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Upsert {
        session_id: String,
        id: String,
        data: String,
    },
    Select {
        session_id: String,
        id: String,
    },
    Delete {
        session_id: String,
        id: String,
    },
    DeleteSession {
        session_id: String,
    },
}

impl Statement {
    /// Parameterized SQL for this statement (`?1`, `?2`, … bind in
    /// [`params`](Self::params) order).
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => {
                "INSERT INTO session (session_id, id, data) VALUES (?1, ?2, ?3)
                 ON CONFLICT (session_id, id) DO UPDATE SET data = excluded.data"
            }
            Self::Select { .. } => {
                "SELECT data FROM session WHERE session_id = ?1 AND id = ?2 LIMIT 1"
            }
            Self::Delete { .. } => "DELETE FROM session WHERE session_id = ?1 AND id = ?2",
            Self::DeleteSession { .. } => "DELETE FROM session WHERE session_id = ?1",
        }
    }

    pub fn params(&self) -> Vec<&str> {
        match self {
            Self::Upsert {
                session_id,
                id,
                data,
            } => vec![session_id.as_str(), id.as_str(), data.as_str()],
            Self::Select { session_id, id } | Self::Delete { session_id, id } => {
                vec![session_id.as_str(), id.as_str()]
            }
            Self::DeleteSession { session_id } => vec![session_id.as_str()],
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::Upsert { session_id, .. }
            | Self::Select { session_id, .. }
            | Self::Delete { session_id, .. }
            | Self::DeleteSession { session_id } => session_id,
        }
    }

    /// Whether the statement only reads.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Select { .. })
    }
}

/// One selected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    pub rows: Vec<Row>,
    /// Rows returned or affected, when the backend reports it.
    pub row_count: Option<u64>,
}

/// Runs store statements against a durable backend.
#[async_trait]
pub trait QueryExecutor: Send + Sync + 'static {
    async fn execute(&self, statement: Statement) -> Result<ExecuteResult, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_placeholder_order() {
        let stmt = Statement::Upsert {
            session_id: "s1".into(),
            id: "creds".into(),
            data: "{}".into(),
        };
        assert_eq!(stmt.params(), vec!["s1", "creds", "{}"]);
        assert!(stmt.sql().contains("ON CONFLICT (session_id, id)"));
        assert!(!stmt.is_query());
    }

    #[test]
    fn delete_session_binds_only_session_id() {
        let stmt = Statement::DeleteSession {
            session_id: "s1".into(),
        };
        assert_eq!(stmt.params(), vec!["s1"]);
        assert_eq!(stmt.session_id(), "s1");
    }
}

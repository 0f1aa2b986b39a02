use griddle_core::driver::{
    ExecuteResult, InterruptHandle, NativeConnection, SchemaInfo, SqlStatement, TableInfo,
};
use griddle_core::{Backend, DatabaseConfig, Error, Result};

use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Opening,
    Open,
    Executing,
    /// The last execution was cancelled.
    Interrupted,
    /// A disconnection was detected mid-operation.
    Lost,
}

/// A logical connection over a backend's native handle.
///
/// Owns the open/validate/execute lifecycle; the native seam underneath is
/// the four operations a backend implements. A closed or lost handle is
/// reopened on the next use.
pub struct Connection {
    backend: Arc<dyn Backend>,
    config: DatabaseConfig,
    native: Option<Box<dyn NativeConnection>>,
    state: ConnectionState,
}

impl Connection {
    pub fn new(backend: Arc<dyn Backend>, config: DatabaseConfig) -> Self {
        Self {
            backend,
            config,
            native: None,
            state: ConnectionState::Closed,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Open | ConnectionState::Executing | ConnectionState::Interrupted
        ) && self.native.is_some()
    }

    /// Establishes the native handle if there is no usable one.
    pub fn open(&mut self) -> Result<()> {
        if let Some(native) = &self.native {
            if !native.closed() {
                return Ok(());
            }
            self.native = None;
            self.state = ConnectionState::Lost;
        }

        self.state = ConnectionState::Opening;
        match self.backend.open(&self.config) {
            Ok(native) => {
                self.native = Some(native);
                self.state = ConnectionState::Open;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Closed;
                Err(err)
            }
        }
    }

    /// Executes a batch, tracking state transitions and classifying a lost
    /// handle.
    pub fn execute(&mut self, batch: &[SqlStatement], returning: bool) -> Result<ExecuteResult> {
        self.open()?;
        let native = self.native.as_mut().expect("connection was just opened");

        for stmt in batch {
            debug!(sql = %stmt.sql, params = stmt.params.len(), "execute");
        }

        self.state = ConnectionState::Executing;
        let result = native.execute(batch, returning);
        self.state = match &result {
            Err(err) if err.is_interruption() => ConnectionState::Interrupted,
            Err(err) if err.is_connection_lost() => {
                self.native = None;
                ConnectionState::Lost
            }
            _ => ConnectionState::Open,
        };
        result
    }

    /// A handle for cancelling the in-flight statement from another thread.
    pub fn interrupt_handle(&self) -> Result<Box<dyn InterruptHandle>> {
        match &self.native {
            Some(native) => Ok(native.interrupt_handle()),
            None => Err(Error::connection_lost()),
        }
    }

    pub fn close(&mut self) {
        self.native = None;
        self.state = ConnectionState::Closed;
    }

    /// Introspects the live database, folding `_i18n` side tables into
    /// their parent's field and index lists.
    pub fn schema_info(&mut self) -> Result<SchemaInfo> {
        self.open()?;
        let native = self.native.as_mut().expect("connection was just opened");
        Ok(fold_i18n(native.schema_info()?))
    }
}

fn fold_i18n(raw: SchemaInfo) -> SchemaInfo {
    let mut out = SchemaInfo::new();
    for (table, info) in &raw {
        if table.ends_with("_i18n") {
            continue;
        }
        let mut folded = TableInfo {
            fields: info.fields.clone(),
            indexes: info.indexes.clone(),
        };
        if let Some(i18n) = raw.get(&format!("{table}_i18n")) {
            folded.fields.extend(i18n.fields.iter().cloned());
            folded.indexes.extend(i18n.indexes.iter().cloned());
        }
        out.insert(table.clone(), folded);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i18n_tables_fold_into_parent() {
        let mut raw = SchemaInfo::new();
        raw.insert(
            "pages".into(),
            TableInfo {
                fields: vec!["id".into(), "slug".into()],
                indexes: vec!["pages_pkey".into()],
            },
        );
        raw.insert(
            "pages_i18n".into(),
            TableInfo {
                fields: vec!["locale".into(), "pages_id".into(), "title".into()],
                indexes: vec!["pages_i18n_pkey".into()],
            },
        );

        let folded = fold_i18n(raw);
        assert_eq!(folded.len(), 1);
        let pages = &folded["pages"];
        assert!(pages.fields.contains(&"title".to_string()));
        assert!(pages.indexes.contains(&"pages_i18n_pkey".to_string()));
    }
}

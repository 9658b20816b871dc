use std::sync::Arc;

use datastore_api::{Adapter, Connection};

/// Scoped adapter substitution on a connection.
///
/// Holds the connection exclusively while installed; the original adapter is
/// put back on drop, whichever way the scope is left (return, `?`, panic, or
/// the enclosing future being dropped).
pub struct AdapterGuard<'c> {
    conn: &'c mut Connection,
    original: Option<Arc<dyn Adapter>>,
}

impl<'c> AdapterGuard<'c> {
    pub fn install(
        conn: &'c mut Connection,
        wrap: impl FnOnce(Arc<dyn Adapter>) -> Arc<dyn Adapter>,
    ) -> Self {
        let original = Arc::clone(conn.adapter());
        let substitute = wrap(Arc::clone(&original));
        conn.replace_adapter(substitute);
        tracing::debug!(api_version = %conn.api_version(), "adapter substituted");
        Self {
            conn,
            original: Some(original),
        }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

impl Drop for AdapterGuard<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            self.conn.replace_adapter(original);
            tracing::debug!("adapter restored");
        }
    }
}

//! # Query Bridge
//!
//! Read-only capability handed to the VM so contract code can inspect chain
//! state synchronously. It borrows the block immutably and only holds
//! `&dyn QueryPlugins`, so a query can never mutate state.

use crate::domain::entities::{BlockInfo, QueryRequest};
use crate::domain::value_objects::Binary;
use crate::errors::QueryError;
use crate::ports::outbound::{Querier, QueryPlugins};
use tracing::trace;

/// Query bridge bound to one block.
pub struct QueryHandler<'a> {
    block: &'a BlockInfo,
    plugins: &'a dyn QueryPlugins,
}

impl<'a> QueryHandler<'a> {
    /// Creates a bridge answering against `block`.
    #[must_use]
    pub fn new(block: &'a BlockInfo, plugins: &'a dyn QueryPlugins) -> Self {
        Self { block, plugins }
    }
}

impl Querier for QueryHandler<'_> {
    fn query(&self, request: &QueryRequest) -> Result<Binary, QueryError> {
        trace!(?request, height = self.block.height, "contract query");
        match request {
            QueryRequest::Block => serde_json::to_vec(self.block)
                .map(Binary)
                .map_err(|e| QueryError::Failed(e.to_string())),
            other => self.plugins.handle(self.block, other),
        }
    }
}

/// Plugins that answer nothing. Block queries still work through the bridge.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoQueryPlugins;

impl QueryPlugins for NoQueryPlugins {
    fn handle(&self, _block: &BlockInfo, request: &QueryRequest) -> Result<Binary, QueryError> {
        Err(QueryError::Unsupported(format!("{request:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_query_answered_by_bridge() {
        let block = BlockInfo {
            height: 12,
            time: 99,
            chain_id: "test-1".into(),
        };
        let bridge = QueryHandler::new(&block, &NoQueryPlugins);

        let raw = bridge.query(&QueryRequest::Block).unwrap();
        let decoded: BlockInfo = serde_json::from_slice(raw.as_slice()).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_other_queries_go_to_plugins() {
        let block = BlockInfo::default();
        let bridge = QueryHandler::new(&block, &NoQueryPlugins);

        let err = bridge
            .query(&QueryRequest::Custom(serde_json::json!({"price": "atom"})))
            .unwrap_err();
        assert!(matches!(err, QueryError::Unsupported(_)));
    }
}

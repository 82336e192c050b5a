//! Per-user properties merged onto a loaded tree
//!
//! The merge is an inner join on node identity over the root's descendants.
//! Matching nodes take `connected` and `favorite` from the record;
//! containers also take `expanded`. Everything else is left alone, so
//! applying the same records twice changes nothing.

use std::collections::HashMap;

use conntree_model::{ConnectionTree, ConstantId};
use conntree_persist::{DataProvider, Deserializer, LocalConnectionProperties, PersistError};

/// Apply `records` to `tree`, returning the number of nodes matched
pub fn apply_local_connection_properties(
    tree: &mut ConnectionTree,
    records: &[LocalConnectionProperties],
) -> usize {
    if records.is_empty() {
        return 0;
    }
    let by_id: HashMap<&ConstantId, &LocalConnectionProperties> =
        records.iter().map(|r| (&r.connection_id, r)).collect();

    let root = tree.root_id().clone();
    let mut matched = 0;
    for id in tree.descendants(&root) {
        let (Some(record), Some(node)) = (by_id.get(&id), tree.get_mut(&id)) else {
            continue;
        };
        node.please_connect = record.connected;
        node.favorite = record.favorite;
        if node.is_container() {
            node.set_expanded(record.expanded);
        }
        matched += 1;
    }
    matched
}

/// Loads local properties and merges them onto trees
#[derive(Debug, Clone)]
pub struct LocalOverlayMerger<P, D> {
    provider: P,
    deserializer: D,
}

impl<P, D> LocalOverlayMerger<P, D>
where
    P: DataProvider<String>,
    D: Deserializer<String, Vec<LocalConnectionProperties>>,
{
    /// Create merger reading through `provider` and `deserializer`
    #[inline]
    #[must_use]
    pub fn new(provider: P, deserializer: D) -> Self {
        Self {
            provider,
            deserializer,
        }
    }

    /// Load the current records
    ///
    /// # Errors
    /// [`PersistError`] if the source cannot be read or decoded
    pub fn records(&self) -> Result<Vec<LocalConnectionProperties>, PersistError> {
        self.deserializer.deserialize(self.provider.load()?)
    }

    /// Load records and apply them to `tree`
    ///
    /// # Errors
    /// [`PersistError`] if the source cannot be read or decoded; `tree` is
    /// untouched in that case
    pub fn apply(&self, tree: &mut ConnectionTree) -> Result<usize, PersistError> {
        let records = self.records()?;
        let matched = apply_local_connection_properties(tree, &records);
        tracing::debug!(records = records.len(), matched, "applied local connection properties");
        Ok(matched)
    }
}

//! In-memory keyed tables used as the bookshop's storage backend.
//!
//! Rows are handed out as clones: callers get snapshots, never references
//! into the table, and write back through [`MemoryTable::replace`].

use std::collections::BTreeMap;

use tokio::sync::RwLock;

/// Key type for every table row.
pub type RowId = i64;

struct Inner<T> {
    rows: BTreeMap<RowId, T>,
    next_id: RowId,
}

/// Ordered table with ids assigned on insert, starting at 1.
///
/// Reads run concurrently, writes are serialized by the lock. Iteration order
/// is ascending id, which is also insertion order.
pub struct MemoryTable<T> {
    name: &'static str,
    inner: RwLock<Inner<T>>,
}

impl<T: Clone> MemoryTable<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Snapshot of every row in id order.
    pub async fn all(&self) -> Vec<T> {
        self.inner.read().await.rows.values().cloned().collect()
    }

    pub async fn get(&self, id: RowId) -> Option<T> {
        self.inner.read().await.rows.get(&id).cloned()
    }

    /// Allocate the next id, build the row from it and store it.
    pub async fn insert_with<F>(&self, build: F) -> T
    where
        F: FnOnce(RowId) -> T,
    {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let row = build(id);
        inner.rows.insert(id, row.clone());
        tracing::debug!(target: "bookshop-db", table = self.name, id, "row inserted");
        row
    }

    /// Overwrite an existing row. Returns `false` when `id` is unknown.
    pub async fn replace(&self, id: RowId, row: T) -> bool {
        let mut inner = self.inner.write().await;
        match inner.rows.get_mut(&id) {
            Some(slot) => {
                *slot = row;
                tracing::debug!(target: "bookshop-db", table = self.name, id, "row replaced");
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: RowId) -> Option<T> {
        let removed = self.inner.write().await.rows.remove(&id);
        if removed.is_some() {
            tracing::debug!(target: "bookshop-db", table = self.name, id, "row removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: RowId,
        label: String,
    }

    fn row(label: &str) -> impl FnOnce(RowId) -> Row + '_ {
        move |id| Row {
            id,
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_from_one() {
        let table = MemoryTable::new("rows");
        assert_eq!(table.insert_with(row("a")).await.id, 1);
        assert_eq!(table.insert_with(row("b")).await.id, 2);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_removal() {
        let table = MemoryTable::new("rows");
        let first = table.insert_with(row("a")).await;
        assert!(table.remove(first.id).await.is_some());
        assert_eq!(table.insert_with(row("b")).await.id, 2);
    }

    #[tokio::test]
    async fn all_preserves_insertion_order() {
        let table = MemoryTable::new("rows");
        for label in ["c", "a", "b"] {
            table.insert_with(row(label)).await;
        }
        let labels: Vec<_> = table.all().await.into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn snapshots_do_not_alias_stored_rows() {
        let table = MemoryTable::new("rows");
        let stored = table.insert_with(row("a")).await;

        let mut snapshot = table.get(stored.id).await.unwrap();
        snapshot.label = "changed".to_string();

        assert_eq!(table.get(stored.id).await.unwrap().label, "a");
    }

    #[tokio::test]
    async fn replace_and_remove_unknown_ids() {
        let table: MemoryTable<Row> = MemoryTable::new("rows");
        assert!(!table.replace(7, Row { id: 7, label: "x".into() }).await);
        assert!(table.remove(7).await.is_none());
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn replace_overwrites_existing_row() {
        let table = MemoryTable::new("rows");
        let stored = table.insert_with(row("a")).await;
        let updated = Row {
            id: stored.id,
            label: "b".to_string(),
        };
        assert!(table.replace(stored.id, updated.clone()).await);
        assert_eq!(table.get(stored.id).await, Some(updated));
    }
}

use async_trait::async_trait;
use filter_core::{ColumnRef, Condition, ViewId};
use indexmap::IndexMap;
use log::{debug, trace};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("view {0:?} does not exist")]
    ViewNotFound(ViewId),
    #[error("view data service unavailable: {0}")]
    Unavailable(String),
}

/// Stores and returns the complete filters of a view. Transport is up to the implementation.
#[async_trait]
pub trait ViewDataService: Send + Sync {
    async fn load_filters(&self, view_id: ViewId) -> Result<Vec<Condition>, ServiceError>;
    async fn save_filters(
        &self,
        view_id: ViewId,
        filters: Vec<Condition>,
    ) -> Result<(), ServiceError>;
}

/// Column as the editor needs to show it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub display_name: String,
    pub parent_column_id: u32,
    pub join_id: Option<u32>,
}

impl ColumnInfo {
    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef {
            parent_column_id: self.parent_column_id,
            join_id: self.join_id,
        }
    }
}

pub trait ColumnCatalog {
    fn column_info(&self, column: ColumnRef) -> Option<&ColumnInfo>;
    /// All columns a filter can reference, in display order.
    fn columns(&self) -> impl Iterator<Item = ColumnRef> + '_;
}

/// In-memory view store that remembers every save, in order.
#[derive(Default)]
pub struct MemoryViewService {
    views: Mutex<HashMap<ViewId, Vec<Condition>>>,
    saves: Mutex<Vec<(ViewId, Vec<Condition>)>>,
    unavailable: Mutex<Option<String>>,
}

impl MemoryViewService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(self, view_id: ViewId, filters: Vec<Condition>) -> Self {
        self.views.lock().insert(view_id, filters);
        self
    }

    /// Make every following call fail with [`ServiceError::Unavailable`], `None` to recover.
    pub fn set_unavailable(&self, reason: Option<String>) {
        *self.unavailable.lock() = reason;
    }

    pub fn saves(&self) -> Vec<(ViewId, Vec<Condition>)> {
        self.saves.lock().clone()
    }

    pub fn filters(&self, view_id: ViewId) -> Option<Vec<Condition>> {
        self.views.lock().get(&view_id).cloned()
    }

    fn check_available(&self) -> Result<(), ServiceError> {
        match self.unavailable.lock().as_ref() {
            Some(reason) => Err(ServiceError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ViewDataService for MemoryViewService {
    async fn load_filters(&self, view_id: ViewId) -> Result<Vec<Condition>, ServiceError> {
        self.check_available()?;
        self.views
            .lock()
            .get(&view_id)
            .cloned()
            .ok_or(ServiceError::ViewNotFound(view_id))
    }

    async fn save_filters(
        &self,
        view_id: ViewId,
        filters: Vec<Condition>,
    ) -> Result<(), ServiceError> {
        self.check_available()?;
        let mut views = self.views.lock();
        let Some(current) = views.get_mut(&view_id) else {
            return Err(ServiceError::ViewNotFound(view_id));
        };
        debug!("MemoryViewService: {view_id:?} now has {} filters", filters.len());
        *current = filters.clone();
        self.saves.lock().push((view_id, filters));
        Ok(())
    }
}

#[derive(Default, Clone, Debug)]
pub struct MemoryCatalog {
    columns: IndexMap<ColumnRef, ColumnInfo>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: ColumnRef, display_name: impl Into<String>) {
        let info = ColumnInfo {
            display_name: display_name.into(),
            parent_column_id: column.parent_column_id,
            join_id: column.join_id,
        };
        if let Some(previous) = self.columns.insert(column, info) {
            trace!("MemoryCatalog: replaced column {}", previous.display_name);
        }
    }

    pub fn with_column(mut self, column: ColumnRef, display_name: &str) -> Self {
        self.insert(column, display_name);
        self
    }
}

impl ColumnCatalog for MemoryCatalog {
    fn column_info(&self, column: ColumnRef) -> Option<&ColumnInfo> {
        self.columns.get(&column)
    }

    fn columns(&self) -> impl Iterator<Item = ColumnRef> + '_ {
        self.columns.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_core::condition::infix;
    use filter_core::Operator;
    use futures::executor::block_on;

    #[test]
    fn save_requires_existing_view() {
        let service = MemoryViewService::new().with_view(ViewId(1), vec![]);
        let filters = vec![infix(ColumnRef::new(3), Operator::Eq, "x")];
        assert_eq!(
            block_on(service.save_filters(ViewId(2), filters.clone())),
            Err(ServiceError::ViewNotFound(ViewId(2)))
        );
        block_on(service.save_filters(ViewId(1), filters.clone())).unwrap();
        assert_eq!(block_on(service.load_filters(ViewId(1))), Ok(filters));
        assert_eq!(service.saves().len(), 1);
    }

    #[test]
    fn catalog_keeps_insertion_order() {
        let catalog = MemoryCatalog::new()
            .with_column(ColumnRef::new(9), "Name")
            .with_column(ColumnRef::joined(2, 1), "Institute")
            .with_column(ColumnRef::new(4), "Age");
        let order: Vec<_> = catalog.columns().map(|c| c.parent_column_id).collect();
        assert_eq!(order, [9, 2, 4]);
        let info = catalog.column_info(ColumnRef::joined(2, 1)).unwrap();
        assert_eq!(info.display_name, "Institute");
        assert_eq!(info.column_ref(), ColumnRef::joined(2, 1));
        assert!(catalog.column_info(ColumnRef::new(2)).is_none());
    }
}

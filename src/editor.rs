use crate::config::FilterEditorConfig;
use crate::describe::{describe, DescribeError, ValueCodec};
use crate::filter_list::{FilterEvent, FilterKey, FilterListState, KeyedFilter};
use crate::scheduler::{Clock, DebouncedScheduler, SchedulerPhase, UpdateHandle};
use crate::service::{ColumnCatalog, ServiceError, ViewDataService};
use filter_core::edit::{filters_equal, has_only_leaf_children};
use filter_core::{Condition, MalformedPatternError, PartialCondition, PartialSimpleFilter, ViewId};
use futures::task::Spawn;
use futures::FutureExt;
use log::{debug, trace};
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

pub type SaveHandle = UpdateHandle<(), ServiceError>;

/// Filter editor of one view: rows being edited, plus throttled persistence of their complete
/// form.
///
/// Every edit goes through [`FilterEditor::dispatch`]. When the complete filter set changes, a
/// save is requested from the scheduler; the save always writes the newest complete set, even
/// when it was requested by an earlier edit.
pub struct FilterEditor<C, S> {
    view_id: ViewId,
    pub(crate) config: FilterEditorConfig,
    list: FilterListState,
    last_observed: Vec<Condition>,
    latest: Arc<Mutex<Vec<Condition>>>,
    scheduler: DebouncedScheduler<(), ServiceError, C, S>,
}

impl<C: Clock, S: Spawn> FilterEditor<C, S> {
    /// Load the view's filters and start editing them.
    pub async fn open(
        view_id: ViewId,
        service: Arc<dyn ViewDataService>,
        config: FilterEditorConfig,
        clock: C,
        spawner: S,
    ) -> Result<Self, ServiceError> {
        let persisted = service.load_filters(view_id).await?;
        debug!(
            "FilterEditor: opened {view_id:?} with {} persisted filters",
            persisted.len()
        );
        Ok(Self::with_filters(
            view_id, persisted, service, config, clock, spawner,
        ))
    }

    pub fn with_filters(
        view_id: ViewId,
        persisted: Vec<Condition>,
        service: Arc<dyn ViewDataService>,
        config: FilterEditorConfig,
        clock: C,
        spawner: S,
    ) -> Self {
        let list = FilterListState::initialize(&persisted, &config);
        let latest = Arc::new(Mutex::new(persisted.clone()));
        let save = {
            let latest = latest.clone();
            Arc::new(move || {
                let filters = latest.lock().clone();
                let service = service.clone();
                trace!("FilterEditor: saving {} filters of {view_id:?}", filters.len());
                async move { service.save_filters(view_id, filters).await }.boxed()
            })
        };
        FilterEditor {
            view_id,
            config,
            list,
            last_observed: persisted,
            latest,
            scheduler: DebouncedScheduler::new(config.cooldown(), clock, spawner, save),
        }
    }

    /// Apply one edit. Returns the save handle if the complete filter set changed.
    pub fn dispatch(&mut self, event: FilterEvent) -> Option<SaveHandle> {
        self.list = std::mem::take(&mut self.list).apply(event);
        let complete = self.list.extract_complete();
        if filters_equal(&complete, &self.last_observed) {
            return None;
        }
        debug!(
            "FilterEditor: {:?} now has {} complete filters",
            self.view_id,
            complete.len()
        );
        *self.latest.lock() = complete.clone();
        self.last_observed = complete;
        Some(self.scheduler.update())
    }

    pub fn add(&mut self) -> Option<SaveHandle> {
        self.dispatch(FilterEvent::Add)
    }

    pub fn remove(&mut self, key: FilterKey) -> Option<SaveHandle> {
        self.dispatch(FilterEvent::Remove(key))
    }

    pub fn replace(&mut self, key: FilterKey, condition: PartialCondition) -> Option<SaveHandle> {
        self.dispatch(FilterEvent::Replace(key, condition))
    }

    pub fn promote(&mut self, key: FilterKey) -> Option<SaveHandle> {
        self.dispatch(FilterEvent::Promote(key))
    }

    pub fn demote(&mut self, key: FilterKey) -> Option<SaveHandle> {
        self.dispatch(FilterEvent::Demote(key))
    }

    /// Edit the leaf of a simple row. Compound rows and unknown keys are left alone.
    pub fn edit_leaf(
        &mut self,
        key: FilterKey,
        edit: impl FnOnce(PartialSimpleFilter) -> PartialSimpleFilter,
    ) -> Option<SaveHandle> {
        let leaf = self.list.get(key)?.as_leaf()?.clone();
        self.replace(key, Condition::Infix(edit(leaf)))
    }

    /// Value of a simple row as the user typed it.
    pub fn user_value(&self, key: FilterKey) -> Result<Option<String>, MalformedPatternError> {
        match self.list.get(key).and_then(Condition::as_leaf) {
            Some(leaf) => leaf.user_value(),
            None => Ok(None),
        }
    }

    /// Whether the row can be collapsed one level.
    pub fn can_demote(&self, key: FilterKey) -> bool {
        self.list.get(key).is_some_and(has_only_leaf_children)
    }

    /// Drive the save timer, see [`DebouncedScheduler::poll`].
    pub fn poll(&mut self) {
        self.scheduler.poll();
    }

    /// Withdraw a save that has not started yet.
    pub fn cancel_pending(&mut self, cause: Option<Box<dyn Error + Send + Sync>>) -> bool {
        self.scheduler.cancel_update(cause)
    }

    pub fn save_phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn filters(&self) -> &[KeyedFilter] {
        self.list.filters()
    }

    pub fn complete_filters(&self) -> Vec<Condition> {
        self.list.extract_complete()
    }

    pub fn describe(
        &self,
        catalog: &impl ColumnCatalog,
        codec: &impl ValueCodec,
    ) -> Result<String, DescribeError> {
        describe(&self.list.extract_complete(), catalog, codec)
    }
}

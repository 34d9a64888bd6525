//! In-process simulated platform.
//!
//! Provides [`SimulatedPlatform`], a [`Platform`] that keeps everything in
//! memory and reproduces the platform's job model: completions are queued
//! and only fire while [`Platform::run_callbacks`] is pumped, and an update
//! job walks through a scripted sequence of progress states before becoming
//! [`UpdateStatus::Invalid`] again.
//!
//! Every call is recorded so tests can assert on exactly what reached the
//! platform.
//!
//! # Example
//!
//! ```
//! use ugc_platform::{AppId, ItemId, Platform, SimulatedPlatform, PlatformCall};
//!
//! let platform = SimulatedPlatform::new().with_issued_item_id(ItemId(42));
//! platform.init(AppId(480)).unwrap();
//! let handle = platform.start_item_update(AppId(480), ItemId(7));
//! platform.set_item_title(handle, "Hello").unwrap();
//! platform.shutdown();
//!
//! assert!(platform.calls().contains(&PlatformCall::SetTitle("Hello".to_owned())));
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::completion::{Completer, Completion, completion_channel};
use crate::platform::{Platform, PlatformError};
use crate::result::{CallResult, ResultCode};
use crate::types::{
    AppId, ItemId, UpdateHandle, UpdateProgress, UpdateStatus, Visibility, WorkshopFileType,
};

/// Total bytes reported for a simulated upload.
const SIMULATED_UPLOAD_BYTES: u64 = 1_048_576;

/// A call that reached the simulated platform.
///
/// Pumps and progress queries are counted separately instead of recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformCall {
    Init(AppId),
    Shutdown,
    CreateItem(AppId),
    StartItemUpdate(AppId, ItemId),
    SetDescription(String),
    SetPreview(PathBuf),
    SetContent(PathBuf),
    SetTitle(String),
    SetVisibility(Visibility),
    SetTags(Vec<String>),
    SetLanguage(String),
    Submit(String),
    QueryAppDependencies(ItemId),
    AddAppDependency(ItemId, AppId),
    RemoveAppDependency(ItemId, AppId),
    QueryItemDependencies(ItemId),
    AddItemDependency(ItemId, ItemId),
    RemoveItemDependency(ItemId, ItemId),
}

impl PlatformCall {
    /// Name used to configure rejections with [`SimulatedPlatform::with_rejected_call`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Shutdown => "shutdown",
            Self::CreateItem(_) => "create_item",
            Self::StartItemUpdate(..) => "start_item_update",
            Self::SetDescription(_) => "set_item_description",
            Self::SetPreview(_) => "set_item_preview",
            Self::SetContent(_) => "set_item_content",
            Self::SetTitle(_) => "set_item_title",
            Self::SetVisibility(_) => "set_item_visibility",
            Self::SetTags(_) => "set_item_tags",
            Self::SetLanguage(_) => "set_item_update_language",
            Self::Submit(_) => "submit_item_update",
            Self::QueryAppDependencies(_) => "app_dependencies",
            Self::AddAppDependency(..) => "add_app_dependency",
            Self::RemoveAppDependency(..) => "remove_app_dependency",
            Self::QueryItemDependencies(_) => "item_dependencies",
            Self::AddItemDependency(..) => "add_item_dependency",
            Self::RemoveItemDependency(..) => "remove_item_dependency",
        }
    }
}

/// Completion waiting for its pump.
struct Scheduled {
    due: u64,
    fire: Box<dyn FnOnce() + Send>,
}

/// Update job currently walking through its progress script.
struct ActiveJob {
    handle: UpdateHandle,
    step: usize,
}

/// Handle opened by `start_item_update` and not yet submitted.
struct OpenHandle {
    handle: UpdateHandle,
    item_id: ItemId,
}

#[derive(Default)]
struct State {
    session: Option<AppId>,
    sessions_opened: u32,
    sessions_closed: u32,
    pumps: u64,
    progress_queries: u64,
    next_handle: u64,
    open_handles: Vec<OpenHandle>,
    active_job: Option<ActiveJob>,
    scheduled: Vec<Scheduled>,
    calls: Vec<PlatformCall>,
    app_dependencies: BTreeSet<AppId>,
    item_dependencies: BTreeSet<ItemId>,
}

/// Simulated platform for tests and dry runs.
///
/// Configure with the builder methods; defaults succeed on every call,
/// resolve completions on the next pump, and run a five-state upload.
pub struct SimulatedPlatform {
    state: Mutex<State>,
    issued_item_id: ItemId,
    completion_pumps: u64,
    submit_pumps: Option<u64>,
    create_result: ResultCode,
    create_needs_agreement: bool,
    submit_result: ResultCode,
    submit_needs_agreement: bool,
    progress: Vec<UpdateStatus>,
    rejected_calls: Vec<&'static str>,
    fail_init: bool,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_handle: 1,
                ..State::default()
            }),
            issued_item_id: ItemId(1000),
            completion_pumps: 1,
            submit_pumps: None,
            create_result: ResultCode::OK,
            create_needs_agreement: false,
            submit_result: ResultCode::OK,
            submit_needs_agreement: false,
            progress: vec![
                UpdateStatus::PreparingConfig,
                UpdateStatus::PreparingContent,
                UpdateStatus::UploadingContent,
                UpdateStatus::UploadingPreviewFile,
                UpdateStatus::CommittingChanges,
            ],
            rejected_calls: Vec::new(),
            fail_init: false,
        }
    }
}

impl SimulatedPlatform {
    /// Create a simulated platform with default behaviour.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier issued to items created through [`Platform::create_item`].
    #[must_use]
    pub fn with_issued_item_id(mut self, item_id: ItemId) -> Self {
        self.issued_item_id = item_id;
        self
    }

    /// Number of pumps before a completion fires. `u64::MAX` never fires.
    ///
    /// Applies to creation and dependency jobs; submissions follow the
    /// progress script unless [`with_submit_pumps`](Self::with_submit_pumps) is set.
    #[must_use]
    pub fn with_completion_pumps(mut self, pumps: u64) -> Self {
        self.completion_pumps = pumps;
        self
    }

    /// Number of pumps before the submit completion fires, independent of progress.
    #[must_use]
    pub fn with_submit_pumps(mut self, pumps: u64) -> Self {
        self.submit_pumps = Some(pumps);
        self
    }

    /// Result code and agreement flag delivered for item creation.
    #[must_use]
    pub fn with_create_result(mut self, result: ResultCode, needs_user_agreement: bool) -> Self {
        self.create_result = result;
        self.create_needs_agreement = needs_user_agreement;
        self
    }

    /// Result code and agreement flag delivered for the update submission.
    #[must_use]
    pub fn with_submit_result(mut self, result: ResultCode, needs_user_agreement: bool) -> Self {
        self.submit_result = result;
        self.submit_needs_agreement = needs_user_agreement;
        self
    }

    /// Progress states an update job reports, one per pump, before going `Invalid`.
    #[must_use]
    pub fn with_progress(mut self, progress: Vec<UpdateStatus>) -> Self {
        self.progress = progress;
        self
    }

    /// Make the named call fail. See [`PlatformCall::name`].
    #[must_use]
    pub fn with_rejected_call(mut self, call: &'static str) -> Self {
        self.rejected_calls.push(call);
        self
    }

    /// Make session initialization fail.
    #[must_use]
    pub fn with_init_failure(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Applications the item already depends on.
    #[must_use]
    pub fn with_app_dependencies(self, apps: impl IntoIterator<Item = AppId>) -> Self {
        self.state().app_dependencies.extend(apps);
        self
    }

    /// Items the item already depends on.
    #[must_use]
    pub fn with_item_dependencies(self, items: impl IntoIterator<Item = ItemId>) -> Self {
        self.state().item_dependencies.extend(items);
        self
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    /// Number of progress queries received.
    #[must_use]
    pub fn progress_queries(&self) -> u64 {
        self.state().progress_queries
    }

    #[must_use]
    pub fn sessions_opened(&self) -> u32 {
        self.state().sessions_opened
    }

    #[must_use]
    pub fn sessions_closed(&self) -> u32 {
        self.state().sessions_closed
    }

    #[must_use]
    pub fn is_session_open(&self) -> bool {
        self.state().session.is_some()
    }

    /// Current application dependencies.
    #[must_use]
    pub fn current_app_dependencies(&self) -> Vec<AppId> {
        self.state().app_dependencies.iter().copied().collect()
    }

    /// Current item dependencies.
    #[must_use]
    pub fn current_item_dependencies(&self) -> Vec<ItemId> {
        self.state().item_dependencies.iter().copied().collect()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and report whether it is configured to be rejected.
    fn record(&self, state: &mut State, call: PlatformCall) -> bool {
        let name = call.name();
        tracing::debug!(call = name, "Simulated platform call");
        state.calls.push(call);
        self.rejected_calls.contains(&name)
    }

    /// Record a handle-scoped setter call and check session and handle.
    fn setter(&self, handle: UpdateHandle, call: PlatformCall) -> Result<(), PlatformError> {
        let mut state = self.state();
        let name = call.name();
        let rejected = self.record(&mut state, call);
        if state.session.is_none() {
            return Err(PlatformError::NoSession);
        }
        if !state.open_handles.iter().any(|open| open.handle == handle) {
            return Err(PlatformError::InvalidHandle);
        }
        if rejected {
            return Err(PlatformError::Rejected { call: name });
        }
        Ok(())
    }

    /// Queue a completion to fire `delay` pumps from now.
    fn schedule<T: Send + 'static>(
        state: &mut State,
        delay: u64,
        completer: Completer<T>,
        result: CallResult<T>,
    ) {
        if delay == u64::MAX {
            // Keep the completer alive so the job stays pending.
            state.scheduled.push(Scheduled {
                due: u64::MAX,
                fire: Box::new(move || drop(completer)),
            });
            return;
        }
        state.scheduled.push(Scheduled {
            due: state.pumps.saturating_add(delay),
            fire: Box::new(move || completer.complete(result)),
        });
    }

    /// Start an asynchronous call that resolves with `value`, or fails if rejected.
    fn start_job<T: Clone + Send + 'static>(&self, call: PlatformCall, value: T) -> Completion<T> {
        self.start_job_with(call, value, |_| {})
    }

    /// Like [`start_job`](Self::start_job), running `on_accept` on the state
    /// only when the call is accepted.
    fn start_job_with<T: Clone + Send + 'static>(
        &self,
        call: PlatformCall,
        value: T,
        on_accept: impl FnOnce(&mut State),
    ) -> Completion<T> {
        let (completer, completion) = completion_channel();
        let mut state = self.state();
        let rejected = self.record(&mut state, call);
        let result = if state.session.is_none() {
            CallResult::failed(ResultCode::NOT_LOGGED_ON, value)
        } else if rejected {
            CallResult::failed(ResultCode::FAIL, value)
        } else {
            on_accept(&mut state);
            CallResult::ok(value)
        };
        Self::schedule(&mut state, self.completion_pumps, completer, result);
        completion
    }
}

impl Platform for SimulatedPlatform {
    fn init(&self, app_id: AppId) -> Result<(), PlatformError> {
        let mut state = self.state();
        let rejected = self.record(&mut state, PlatformCall::Init(app_id));
        if self.fail_init || rejected {
            return Err(PlatformError::SessionUnavailable { app_id });
        }
        state.session = Some(app_id);
        state.sessions_opened += 1;
        Ok(())
    }

    fn shutdown(&self) {
        let mut state = self.state();
        self.record(&mut state, PlatformCall::Shutdown);
        if state.session.take().is_some() {
            state.sessions_closed += 1;
        }
        state.open_handles.clear();
        state.active_job = None;
    }

    fn run_callbacks(&self) {
        let due = {
            let mut state = self.state();
            state.pumps += 1;
            let pumps = state.pumps;
            if let Some(job) = state.active_job.as_mut() {
                job.step += 1;
            }
            let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.scheduled)
                .into_iter()
                .partition(|scheduled| scheduled.due <= pumps);
            state.scheduled = waiting;
            due
        };

        // Fire outside the lock: completions may be observed from another thread.
        for scheduled in due {
            (scheduled.fire)();
        }
    }

    fn create_item(&self, app_id: AppId, _file_type: WorkshopFileType) -> Completion<ItemId> {
        let (completer, completion) = completion_channel();
        let mut state = self.state();
        let rejected = self.record(&mut state, PlatformCall::CreateItem(app_id));
        let result = if state.session.is_none() {
            CallResult::failed(ResultCode::NOT_LOGGED_ON, ItemId::UNASSIGNED)
        } else if rejected {
            CallResult::failed(ResultCode::FAIL, ItemId::UNASSIGNED)
        } else {
            CallResult {
                result: self.create_result,
                needs_user_agreement: self.create_needs_agreement,
                value: self.issued_item_id,
            }
        };
        Self::schedule(&mut state, self.completion_pumps, completer, result);
        completion
    }

    fn start_item_update(&self, app_id: AppId, item_id: ItemId) -> UpdateHandle {
        let mut state = self.state();
        let rejected = self.record(&mut state, PlatformCall::StartItemUpdate(app_id, item_id));
        if rejected || state.session.is_none() || !item_id.is_set() {
            return UpdateHandle::INVALID;
        }
        let handle = UpdateHandle(state.next_handle);
        state.next_handle += 1;
        state.open_handles.push(OpenHandle { handle, item_id });
        handle
    }

    fn set_item_description(
        &self,
        handle: UpdateHandle,
        description: &str,
    ) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetDescription(description.to_owned()))
    }

    fn set_item_preview(&self, handle: UpdateHandle, path: &Path) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetPreview(path.to_path_buf()))
    }

    fn set_item_content(&self, handle: UpdateHandle, path: &Path) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetContent(path.to_path_buf()))
    }

    fn set_item_title(&self, handle: UpdateHandle, title: &str) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetTitle(title.to_owned()))
    }

    fn set_item_visibility(
        &self,
        handle: UpdateHandle,
        visibility: Visibility,
    ) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetVisibility(visibility))
    }

    fn set_item_tags(&self, handle: UpdateHandle, tags: &[String]) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetTags(tags.to_vec()))
    }

    fn set_item_update_language(
        &self,
        handle: UpdateHandle,
        language: &str,
    ) -> Result<(), PlatformError> {
        self.setter(handle, PlatformCall::SetLanguage(language.to_owned()))
    }

    fn submit_item_update(&self, handle: UpdateHandle, change_note: &str) -> Completion<ItemId> {
        let (completer, completion) = completion_channel();
        let mut state = self.state();
        let rejected = self.record(&mut state, PlatformCall::Submit(change_note.to_owned()));

        let position = state
            .open_handles
            .iter()
            .position(|open| open.handle == handle);
        let Some(position) = position.filter(|_| !rejected && state.session.is_some()) else {
            let code = if state.session.is_none() {
                ResultCode::NOT_LOGGED_ON
            } else {
                ResultCode::FAIL
            };
            Self::schedule(
                &mut state,
                self.completion_pumps,
                completer,
                CallResult::failed(code, ItemId::UNASSIGNED),
            );
            return completion;
        };

        // A handle is consumed by its submission.
        let item_id = state.open_handles.remove(position).item_id;
        state.active_job = Some(ActiveJob { handle, step: 0 });

        let delay = self.submit_pumps.unwrap_or(self.progress.len() as u64);
        let result = CallResult {
            result: self.submit_result,
            needs_user_agreement: self.submit_needs_agreement,
            value: item_id,
        };
        Self::schedule(&mut state, delay, completer, result);
        completion
    }

    fn item_update_progress(&self, handle: UpdateHandle) -> UpdateProgress {
        let mut state = self.state();
        state.progress_queries += 1;
        let Some(job) = state.active_job.as_ref().filter(|job| job.handle == handle) else {
            return UpdateProgress::default();
        };
        match self.progress.get(job.step) {
            Some(status) => {
                let total = self.progress.len() as u64;
                UpdateProgress {
                    status: *status,
                    bytes_processed: SIMULATED_UPLOAD_BYTES * job.step as u64 / total,
                    bytes_total: SIMULATED_UPLOAD_BYTES,
                }
            }
            None => UpdateProgress::default(),
        }
    }

    fn app_dependencies(&self, item_id: ItemId) -> Completion<Vec<AppId>> {
        let current = self.current_app_dependencies();
        self.start_job(PlatformCall::QueryAppDependencies(item_id), current)
    }

    fn add_app_dependency(&self, item_id: ItemId, app_id: AppId) -> Completion<()> {
        self.start_job_with(PlatformCall::AddAppDependency(item_id, app_id), (), |state| {
            state.app_dependencies.insert(app_id);
        })
    }

    fn remove_app_dependency(&self, item_id: ItemId, app_id: AppId) -> Completion<()> {
        self.start_job_with(PlatformCall::RemoveAppDependency(item_id, app_id), (), |state| {
            state.app_dependencies.remove(&app_id);
        })
    }

    fn item_dependencies(&self, item_id: ItemId) -> Completion<Vec<ItemId>> {
        let current = self.current_item_dependencies();
        self.start_job(PlatformCall::QueryItemDependencies(item_id), current)
    }

    fn add_item_dependency(&self, item_id: ItemId, child: ItemId) -> Completion<()> {
        self.start_job_with(PlatformCall::AddItemDependency(item_id, child), (), |state| {
            state.item_dependencies.insert(child);
        })
    }

    fn remove_item_dependency(&self, item_id: ItemId, child: ItemId) -> Completion<()> {
        self.start_job_with(PlatformCall::RemoveItemDependency(item_id, child), (), |state| {
            state.item_dependencies.remove(&child);
        })
    }
}

//! Item update orchestrator.

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use ugc_platform::{
    AppId, Completion, ItemId, JobOutcome, Platform, PlatformError, UpdateHandle, UpdateProgress,
    UpdateStatus, WorkshopFileType,
};

use crate::error::{Field, Job, PublishError, Rejection};
use crate::poll::{Backoff, Poller, WaitError};
use crate::request::{DependencyChanges, ItemIdentity, UpdateRequest};
use crate::session::Session;
use crate::validate::{self, Validated};

/// Polling policies for a publish run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishConfig {
    /// Wait on item creation and dependency jobs.
    pub creation: Poller,
    /// Wait on the submitted update until its status is terminal.
    pub update: Poller,
    /// How long to keep pumping for the submit result once the update is terminal.
    pub outcome_grace: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            creation: Poller::fixed(Duration::from_millis(100), Duration::from_secs(120)),
            update: Poller::fixed(Duration::from_millis(100), Duration::from_secs(3600)),
            outcome_grace: Duration::from_secs(5),
        }
    }
}

/// Stage of a publish run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    SessionOpen,
    CreatingItem,
    HandleOpen,
    FieldsApplied,
    Submitted,
    Polling,
    Terminal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::SessionOpen => "session open",
            Self::CreatingItem => "creating item",
            Self::HandleOpen => "handle open",
            Self::FieldsApplied => "fields applied",
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Result of a publish run that reached the terminal status.
///
/// Fields rejected or refused along the way are only reported in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Item that was updated.
    pub item_id: ItemId,
    /// Whether the item was created by this run.
    pub created: bool,
    /// Result of the submission. Still `Pending` if it did not arrive in time.
    pub submit: JobOutcome<ItemId>,
    /// Last status seen before the job went terminal.
    pub last_status: Option<UpdateStatus>,
    /// Non-terminal statuses in the order they were first seen.
    pub observed: Vec<UpdateStatus>,
}

/// Drives one item update from session open to terminal status.
///
/// The workflow:
/// 1. Open the platform session
/// 2. Create the item, if requested, and wait for its identifier
/// 3. Open an update handle
/// 4. Validate and apply each requested field
/// 5. Submit the update with the patch note
/// 6. Poll progress until the job is terminal
///
/// The session is closed on every exit path.
pub struct ItemOrchestrator<'a> {
    platform: &'a dyn Platform,
    config: PublishConfig,
    cancel: CancellationToken,
}

impl<'a> ItemOrchestrator<'a> {
    #[must_use]
    pub fn new(platform: &'a dyn Platform, config: PublishConfig) -> Self {
        Self {
            platform,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort waits once `cancel` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Publish `request` to the item named by `identity`.
    ///
    /// Field rejections and failed setter calls are logged and skipped. The
    /// run returns once the update job is terminal, whatever the submission
    /// result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the app id is zero (before any platform call)
    /// - the session cannot be opened
    /// - no workshop id is given for an existing item
    /// - item creation does not succeed
    /// - the platform refuses to open an update handle
    /// - a creation or update wait times out
    /// - any wait is cancelled
    pub fn run(
        &self,
        identity: ItemIdentity,
        request: &UpdateRequest,
    ) -> Result<UpdateOutcome, PublishError> {
        Self::enter(Stage::Uninitialized);
        if !identity.app_id.is_set() {
            return Err(PublishError::MissingAppId);
        }

        let session = Session::open(self.platform, identity.app_id)?;
        Self::enter(Stage::SessionOpen);

        let (item_id, created) = if identity.is_new {
            if identity.item_id.is_set() {
                tracing::warn!(
                    workshop_id = %identity.item_id,
                    "Workshop id ignored, a new item is created instead"
                );
            }
            Self::enter(Stage::CreatingItem);
            (self.create_item(session.app_id())?, true)
        } else if identity.item_id.is_set() {
            (identity.item_id, false)
        } else {
            return Err(PublishError::MissingItemId);
        };

        let handle = self.platform.start_item_update(session.app_id(), item_id);
        if !handle.is_valid() {
            return Err(PlatformError::InvalidHandle.into());
        }
        Self::enter(Stage::HandleOpen);

        self.apply_fields(handle, item_id, request)?;
        Self::enter(Stage::FieldsApplied);

        let patch_note = match validate::patch_note(request.patch_note.as_deref()) {
            Ok(Validated::Apply(note)) => note,
            Ok(Validated::Unchanged) => String::new(),
            Err(rejection) => {
                tracing::error!("{rejection}, submitting an empty patch note");
                String::new()
            }
        };

        let submit = self.platform.submit_item_update(handle, &patch_note);
        Self::enter(Stage::Submitted);

        let outcome = self.wait_for_update(handle, submit, item_id, created)?;
        Self::enter(Stage::Terminal);

        drop(session);
        Ok(outcome)
    }

    fn enter(stage: Stage) {
        tracing::debug!(%stage, "Entering stage");
    }

    /// Wait for `completion` to resolve, pumping callbacks.
    fn await_job<T: Clone + PartialEq>(
        &self,
        job: Job,
        completion: &mut Completion<T>,
    ) -> Result<JobOutcome<T>, PublishError> {
        self.config
            .creation
            .wait(
                &self.cancel,
                || self.platform.run_callbacks(),
                || completion.outcome(),
                |outcome| !outcome.is_pending(),
                |_| {},
            )
            .map_err(|source| PublishError::Wait { job, source })
    }

    fn create_item(&self, app_id: AppId) -> Result<ItemId, PublishError> {
        tracing::info!(%app_id, "Creating new workshop item");
        let mut completion = self.platform.create_item(app_id, WorkshopFileType::Community);

        match self.await_job(Job::Creation, &mut completion)? {
            JobOutcome::Success(item_id) if item_id.is_set() => {
                tracing::info!(%item_id, "Item created");
                Ok(item_id)
            }
            outcome => {
                tracing::error!("Item creation {outcome}");
                Err(PublishError::CreateItem { outcome })
            }
        }
    }

    fn apply_fields(
        &self,
        handle: UpdateHandle,
        item_id: ItemId,
        request: &UpdateRequest,
    ) -> Result<(), PublishError> {
        let platform = self.platform;

        apply(
            Field::Description,
            validate::description(request.description.as_deref()),
            |text| platform.set_item_description(handle, &text),
        );
        apply(
            Field::Preview,
            validate::preview(request.preview.as_deref()),
            |path| platform.set_item_preview(handle, &path),
        );
        apply(
            Field::Content,
            validate::content(request.content.as_deref()),
            |path| platform.set_item_content(handle, &path),
        );
        apply(
            Field::Title,
            validate::title(request.title.as_deref()),
            |title| platform.set_item_title(handle, &title),
        );
        apply(
            Field::Visibility,
            validate::visibility(request.visibility),
            |visibility| platform.set_item_visibility(handle, visibility),
        );
        apply(
            Field::Tags,
            Ok(validate::tags(request.tags.as_deref())),
            |tags| platform.set_item_tags(handle, &tags),
        );
        apply(
            Field::Language,
            validate::language(request.language.as_deref()),
            |language| platform.set_item_update_language(handle, &language),
        );

        self.apply_dependencies(
            Field::AppDependencies,
            item_id,
            &request.app_dependencies,
            |item| platform.app_dependencies(item),
            |item, app| platform.add_app_dependency(item, app),
            |item, app| platform.remove_app_dependency(item, app),
        )?;
        self.apply_dependencies(
            Field::ItemDependencies,
            item_id,
            &request.item_dependencies,
            |item| platform.item_dependencies(item),
            |item, child| platform.add_item_dependency(item, child),
            |item, child| platform.remove_item_dependency(item, child),
        )
    }

    /// Bring the item's dependencies in line with `changes`.
    ///
    /// Failed or timed out queries and mutations are logged and skip the rest
    /// of the field. Only cancellation is fatal.
    fn apply_dependencies<T, Q, A, R>(
        &self,
        field: Field,
        item_id: ItemId,
        changes: &DependencyChanges<T>,
        query: Q,
        add: A,
        remove: R,
    ) -> Result<(), PublishError>
    where
        T: Copy + Ord + fmt::Display,
        Q: Fn(ItemId) -> Completion<Vec<T>>,
        A: Fn(ItemId, T) -> Completion<()>,
        R: Fn(ItemId, T) -> Completion<()>,
    {
        if changes.is_empty() {
            return Ok(());
        }

        let current = match self.await_dependency_job(field, &mut query(item_id))? {
            Some(JobOutcome::Success(current)) => current,
            Some(outcome) => {
                tracing::error!(%field, "Failed to query current {field}: {outcome}");
                return Ok(());
            }
            None => return Ok(()),
        };

        let plan = match validate::dependencies(field, &current, changes) {
            Ok(Validated::Apply(plan)) => plan,
            Ok(Validated::Unchanged) => {
                tracing::debug!(%field, "Field unchanged");
                return Ok(());
            }
            Err(rejection) => {
                tracing::error!("{rejection}");
                return Ok(());
            }
        };

        let mut pending = Vec::with_capacity(plan.add.len() + plan.remove.len());
        pending.extend(plan.add.iter().map(|id| ("add", *id, add(item_id, *id))));
        pending.extend(
            plan.remove
                .iter()
                .map(|id| ("remove", *id, remove(item_id, *id))),
        );

        for (action, id, mut completion) in pending {
            match self.await_dependency_job(field, &mut completion)? {
                Some(JobOutcome::Success(())) => {
                    tracing::info!(%field, %id, "Dependency {action}ed");
                }
                Some(outcome) => {
                    tracing::error!(%field, %id, "Failed to {action} dependency: {outcome}");
                }
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Wait on a dependency job. A timeout is logged and yields `None`.
    fn await_dependency_job<T: Clone + PartialEq>(
        &self,
        field: Field,
        completion: &mut Completion<T>,
    ) -> Result<Option<JobOutcome<T>>, PublishError> {
        match self.await_job(Job::Dependencies, completion) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(PublishError::Wait {
                source: source @ WaitError::TimedOut { .. },
                ..
            }) => {
                tracing::error!(
                    %field,
                    error = %source,
                    "Dependency job did not finish, skipping {field}"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn wait_for_update(
        &self,
        handle: UpdateHandle,
        mut submit: Completion<ItemId>,
        item_id: ItemId,
        created: bool,
    ) -> Result<UpdateOutcome, PublishError> {
        Self::enter(Stage::Polling);
        let mut observed = Vec::new();
        let latest = Cell::new(UpdateProgress::default());

        self.config
            .update
            .wait(
                &self.cancel,
                || {
                    self.platform.run_callbacks();
                    drain_submit(&mut submit);
                },
                || {
                    let progress = self.platform.item_update_progress(handle);
                    latest.set(progress);
                    progress.status
                },
                |status| status.is_terminal(),
                |status| {
                    if !status.is_terminal() {
                        let progress = latest.get();
                        tracing::info!(
                            %status,
                            bytes_processed = progress.bytes_processed,
                            bytes_total = progress.bytes_total,
                            "Update status: {}",
                            status.description()
                        );
                        observed.push(*status);
                    }
                },
            )
            .map_err(|source| PublishError::Wait {
                job: Job::Update,
                source,
            })?;

        if !submit.is_resolved() {
            self.await_submit_grace(&mut submit);
        }

        Ok(UpdateOutcome {
            item_id,
            created,
            submit: submit.outcome(),
            last_status: observed.last().copied(),
            observed,
        })
    }

    /// Keep pumping for a submit result that has not arrived yet.
    fn await_submit_grace(&self, submit: &mut Completion<ItemId>) {
        let grace = Poller {
            interval: self.config.update.interval,
            backoff: Backoff::Fixed,
            timeout: self.config.outcome_grace,
        };
        let result = grace.wait(
            &self.cancel,
            || self.platform.run_callbacks(),
            || drain_submit(submit),
            |outcome| !outcome.is_pending(),
            |_| {},
        );
        if let Err(err) = result {
            tracing::warn!(
                error = %err,
                "Submit result not received, the update may still succeed"
            );
        }
    }
}

/// Log and apply one validated field. Failures never stop the batch.
fn apply<T>(
    field: Field,
    validated: Result<Validated<T>, Rejection>,
    set: impl FnOnce(T) -> Result<(), PlatformError>,
) {
    match validated {
        Ok(Validated::Unchanged) => tracing::debug!(%field, "Field unchanged"),
        Ok(Validated::Apply(value)) => match set(value) {
            Ok(()) => tracing::info!(%field, "Field set"),
            Err(err) => {
                tracing::error!(%field, error = %err, "Failed to set item {field}");
                if field == Field::Preview {
                    tracing::warn!("Suggested preview formats include JPG, PNG and GIF");
                }
            }
        },
        Err(rejection) => tracing::error!("{rejection}"),
    }
}

/// Poll the submit completion, logging its result the first time it resolves.
fn drain_submit(submit: &mut Completion<ItemId>) -> JobOutcome<ItemId> {
    let was_resolved = submit.is_resolved();
    let outcome = submit.outcome();
    if !was_resolved {
        match &outcome {
            JobOutcome::Pending => {}
            JobOutcome::Success(item_id) => {
                tracing::info!(%item_id, "Item update submitted successfully");
            }
            JobOutcome::NeedsUserAgreement => tracing::error!(
                "User needs to accept the workshop legal agreement before submitting the item update"
            ),
            JobOutcome::Failure { code } => {
                tracing::error!(code = code.0, "Failed to submit item update ({code})");
            }
        }
    }
    outcome
}

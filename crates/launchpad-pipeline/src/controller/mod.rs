//! Per-session recalibration.
//!
//! Every input change bumps a generation token and restarts the debounce
//! timer. When the timer fires, angles are generated and the first one is
//! drafted. Results are applied only if the generation they were started
//! under is still current, so a slow run can never overwrite a newer one.
//! Drafts additionally carry a draft token so a manual angle selection
//! supersedes an automatic draft still in flight, and vice versa.
//!
//! Superseded runs are not aborted; their results are dropped on arrival.

mod state;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use launchpad_core::{
    AutopostReceipt, Channel, SimulationOutput, ViralAngle, WorkflowStep, WorkflowTemplate,
};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinError};

use crate::autopost::AutopostPayload;
use crate::error::PipelineError;
use crate::Pipeline;

pub use state::{InputPatch, Notice, NoticeLevel, Phase, SessionSnapshot, MAX_NOTICES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraftTrigger {
    Automatic,
    Manual,
}

pub struct RecalibrationController {
    pipeline: Arc<Pipeline>,
    baseline_steps: Vec<WorkflowStep>,
    debounce: Duration,
    state: watch::Sender<SessionSnapshot>,
    timer: Mutex<Option<AbortHandle>>,
}

impl RecalibrationController {
    /// Creates an idle session over `baseline`. Nothing runs until an input
    /// changes or [`refresh`](Self::refresh) is called.
    #[must_use]
    pub fn new(baseline: WorkflowTemplate, pipeline: Arc<Pipeline>, debounce: Duration) -> Arc<Self> {
        let baseline_steps = baseline.steps.clone();
        let (state, _rx) = watch::channel(SessionSnapshot::new(baseline));
        Arc::new(Self {
            pipeline,
            baseline_steps,
            debounce,
            state,
            timer: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Applies `patch` and schedules a debounced recalibration.
    ///
    /// Returns `false`, scheduling nothing, when the patch changes no input.
    pub fn update_inputs(self: &Arc<Self>, patch: InputPatch) -> bool {
        match self.advance(Some(patch)) {
            Some(generation) => {
                self.schedule(generation);
                true
            }
            None => false,
        }
    }

    pub fn toggle_channel(self: &Arc<Self>, channel: Channel) {
        let mut channels = self.state.borrow().template.target_channels.clone();
        channels.toggle(channel);
        self.update_inputs(InputPatch {
            target_channels: Some(channels),
            ..InputPatch::default()
        });
    }

    /// Recalibrates now, superseding any pending or in-flight run, and
    /// waits for it to finish.
    pub async fn refresh(self: &Arc<Self>) {
        self.replace_timer(None);
        let Some(generation) = self.advance(None) else {
            return;
        };
        let run = tokio::spawn(Arc::clone(self).run(generation));
        if let Err(e) = run.await {
            tracing::error!(generation, error = %e, "recalibration task failed");
        }
    }

    /// Selects the angle whose hook is `hook` and drafts for it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] if no displayed angle has that
    /// hook.
    pub async fn select_angle(self: &Arc<Self>, hook: &str) -> Result<(), PipelineError> {
        let mut chosen = None;
        self.state.send_if_modified(|s| {
            let Some(angle) = s.angles.iter().find(|a| a.hook == hook).cloned() else {
                return false;
            };
            s.selected_angle = Some(angle.clone());
            chosen = Some((s.generation, angle));
            true
        });
        let Some((generation, angle)) = chosen else {
            return Err(self.reject(PipelineError::validation(format!(
                "Unknown viral angle: {hook}"
            ))));
        };

        tracing::debug!(generation, hook, "manual angle selection");
        let this = Arc::clone(self);
        let task =
            tokio::spawn(async move { this.draft(generation, angle, DraftTrigger::Manual).await });
        if let Err(e) = task.await {
            tracing::error!(generation, error = %e, "manual draft task failed");
        }
        Ok(())
    }

    /// Simulates the current steps for the current inputs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] without running anything when
    /// no angle is selected or the steps or channels are empty, and
    /// [`PipelineError::StageFailed`] if the simulation task dies.
    pub async fn simulate(&self) -> Result<SimulationOutput, PipelineError> {
        let template = {
            let s = self.state.borrow();
            s.selected_angle.as_ref().map(|_| s.template.clone())
        };
        let Some(template) = template else {
            return Err(self.reject(PipelineError::validation(
                "Select a viral angle before running a simulation.",
            )));
        };

        let pipeline = Arc::clone(&self.pipeline);
        let stage =
            tokio::spawn(async move { pipeline.simulator.simulate(&template, &template.steps).await });
        let generated = match stage.await {
            Ok(Ok(generated)) => generated,
            Ok(Err(e)) => return Err(self.reject(e)),
            Err(e) => {
                return Err(self.stage_aborted("simulation", "Simulation failed. Try again.", &e));
            }
        };

        let failure = generated.failure();
        let output = generated.value;
        self.state.send_modify(|s| {
            s.simulation = Some(output.clone());
            if failure.is_some() {
                s.push_notice(
                    NoticeLevel::Warning,
                    "Simulation backend unavailable. Showing a fallback projection.",
                );
            }
            s.push_notice(NoticeLevel::Success, "Simulation ready.");
        });
        Ok(output)
    }

    /// Queues the current workflow for posting.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] when no angle is selected.
    pub fn autopost(&self) -> Result<AutopostReceipt, PipelineError> {
        let current = {
            let s = self.state.borrow();
            s.selected_angle
                .clone()
                .map(|angle| (s.template.clone(), angle))
        };
        let Some((template, angle)) = current else {
            return Err(self.reject(PipelineError::validation(
                "Select a viral angle before triggering autopost.",
            )));
        };

        let receipt = self.pipeline.dispatcher.dispatch(&AutopostPayload {
            template: &template,
            steps: &template.steps,
            angle: &angle,
        });
        self.state.send_modify(|s| {
            s.push_notice(
                NoticeLevel::Success,
                format!(
                    "Autopost queue primed. {} channels scheduled.",
                    receipt.queue_count
                ),
            );
            s.last_receipt = Some(receipt.clone());
        });
        Ok(receipt)
    }

    /// Cancels a pending debounce. Runs already in flight finish on their own.
    pub fn shutdown(&self) {
        self.replace_timer(None);
    }

    /// Bumps the generation, applying `patch` first when given. Returns the
    /// new generation, or `None` if the patch changed nothing.
    fn advance(&self, patch: Option<InputPatch>) -> Option<u64> {
        let mut generation = None;
        self.state.send_if_modified(|s| {
            if let Some(patch) = patch {
                if !s.apply_patch(patch) {
                    return false;
                }
            }
            s.generation += 1;
            s.enter(Phase::PendingDebounce);
            generation = Some(s.generation);
            true
        });
        generation
    }

    fn schedule(self: &Arc<Self>, generation: u64) {
        let this = Arc::clone(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(this.debounce).await;
            if this.is_current(generation) {
                tokio::spawn(this.run(generation));
            }
        });
        self.replace_timer(Some(timer.abort_handle()));
    }

    fn replace_timer(&self, next: Option<AbortHandle>) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *timer, next) {
            previous.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.borrow().generation == generation
    }

    async fn run(self: Arc<Self>, generation: u64) {
        let mut inputs = None;
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.enter(Phase::GeneratingAngles);
            inputs = Some(s.template.clone());
            true
        });
        let Some(inputs) = inputs else {
            tracing::debug!(generation, "recalibration superseded before it started");
            return;
        };

        tracing::debug!(generation, "generating viral angles");
        let pipeline = Arc::clone(&self.pipeline);
        let stage = tokio::spawn(async move {
            pipeline
                .angles
                .generate(
                    &inputs.persona,
                    &inputs.hook,
                    inputs.content_format,
                    &inputs.target_channels,
                )
                .await
        });
        let generated = match stage.await {
            Ok(generated) => generated,
            Err(e) => {
                self.stage_failed(generation, None, "Failed generating viral angles.", &e);
                return;
            }
        };

        let failure = generated.failure();
        let angles = generated.value;
        let selected = angles.first().cloned();
        let applied = self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.angles = angles;
            s.selected_angle.clone_from(&selected);
            if failure.is_some() {
                s.push_notice(
                    NoticeLevel::Warning,
                    "Failed generating viral angles. Fallback options applied.",
                );
            }
            if selected.is_none() {
                s.settle(true);
            }
            true
        });
        if !applied {
            tracing::debug!(generation, "discarding stale viral angles");
            return;
        }

        if let Some(angle) = selected {
            self.draft(generation, angle, DraftTrigger::Automatic).await;
        }
    }

    async fn draft(&self, generation: u64, angle: ViralAngle, trigger: DraftTrigger) {
        let mut started = None;
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.draft_token += 1;
            match trigger {
                DraftTrigger::Automatic => s.enter(Phase::DraftingSteps),
                DraftTrigger::Manual => {
                    // A manual draft supersedes the automatic one in flight.
                    if s.run_phase == Some(Phase::DraftingSteps) {
                        s.run_phase = None;
                    }
                    s.phase = Phase::DraftingSteps;
                }
            }
            let mut template = s.template.clone();
            template.steps.clone_from(&self.baseline_steps);
            started = Some((s.draft_token, template));
            true
        });
        let Some((token, template)) = started else {
            tracing::debug!(generation, "draft superseded before it started");
            return;
        };

        tracing::debug!(generation, token, ?trigger, hook = %angle.hook, "drafting workflow steps");
        let pipeline = Arc::clone(&self.pipeline);
        let stage = tokio::spawn(async move { pipeline.drafter.draft(&template, &angle).await });
        let generated = match stage.await {
            Ok(generated) => generated,
            Err(e) => {
                self.stage_failed(
                    generation,
                    Some((token, trigger)),
                    "Failed drafting workflow steps.",
                    &e,
                );
                return;
            }
        };

        let failure = generated.failure();
        let steps = generated.value;
        let applied = self.state.send_if_modified(|s| {
            if s.generation != generation || s.draft_token != token {
                return false;
            }
            s.template.steps = steps;
            s.settle(trigger == DraftTrigger::Automatic);
            match (failure, trigger) {
                (Some(_), _) => s.push_notice(
                    NoticeLevel::Warning,
                    "Unable to redraft workflow. Baseline steps kept.",
                ),
                (None, DraftTrigger::Manual) => s.push_notice(
                    NoticeLevel::Success,
                    "Workflow recalibrated for this viral angle.",
                ),
                (None, DraftTrigger::Automatic) => {}
            }
            true
        });
        if !applied {
            tracing::debug!(generation, token, "discarding stale draft");
        }
    }

    /// Records a dead stage task if its run is still current.
    fn stage_failed(
        &self,
        generation: u64,
        draft: Option<(u64, DraftTrigger)>,
        message: &str,
        error: &JoinError,
    ) {
        tracing::error!(generation, error = %error, "{message}");
        self.state.send_if_modified(|s| {
            let current =
                s.generation == generation && draft.map_or(true, |(t, _)| t == s.draft_token);
            if !current {
                return false;
            }
            s.settle(draft.map_or(true, |(_, trigger)| trigger == DraftTrigger::Automatic));
            s.push_notice(NoticeLevel::Error, message);
            true
        });
    }

    fn stage_aborted(&self, stage: &'static str, message: &str, error: &JoinError) -> PipelineError {
        tracing::error!(stage, error = %error, "{message}");
        self.state
            .send_modify(|s| s.push_notice(NoticeLevel::Error, message));
        PipelineError::StageFailed {
            stage,
            reason: error.to_string(),
        }
    }

    fn reject(&self, error: PipelineError) -> PipelineError {
        tracing::warn!(error = %error, "request rejected");
        let message = match &error {
            PipelineError::Validation(message) => message.clone(),
            PipelineError::StageFailed { .. } => error.to_string(),
        };
        self.state
            .send_modify(|s| s.push_notice(NoticeLevel::Error, message));
        error
    }
}

impl Drop for RecalibrationController {
    fn drop(&mut self) {
        self.replace_timer(None);
    }
}

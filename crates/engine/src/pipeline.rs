// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect pipeline
//!
//! Drives one job through fetch, optional transform, verify and publish.
//! Each stage awaits its single tool run; the first failure ends the job.
//! Partial artifacts of failed jobs stay on disk until the sweeper takes them.

use crate::registry::{JobRegistry, Registration};
use crate::store::ArtifactStore;
use crate::tools::{ExpectedOutput, SeparationLayout, ToolLayout, ToolPlan};
use fx_adapters::{CancellationToken, MarkerKind, ToolAdapter, ToolError};
use fx_core::{
    Clock, Config, Effect, ErrorKind, IdGen, Job, JobError, JobId, JobReport, JobState, Source,
    SourceSpec, Stage,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::Instrument;
use url::Url;

/// Fresh ids drawn before giving up on a submission
const MAX_ID_ATTEMPTS: usize = 8;

/// Outcome of a submission
///
/// Holds the job's registration: the sweeper leaves the job's artifacts
/// alone until the ticket is dropped, so drop it only after the report
/// has reached the caller.
#[derive(Debug)]
pub struct Ticket {
    report: JobReport,
    job: Option<Job>,
    registration: Option<Registration>,
}

impl Ticket {
    fn rejected(report: JobReport) -> Self {
        Self {
            report,
            job: None,
            registration: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.report.id
    }

    pub fn report(&self) -> &JobReport {
        &self.report
    }

    /// The job, unless the submission was rejected before one existed
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// Take the report and release the registration
    pub fn into_report(self) -> JobReport {
        self.report
    }
}

/// Sequences tool runs for submitted jobs
pub struct EffectPipeline<T, C, G> {
    store: ArtifactStore,
    upload_root: PathBuf,
    public_prefix: String,
    layout: ToolLayout,
    registry: JobRegistry,
    tools: T,
    clock: C,
    ids: G,
}

impl<T, C, G> EffectPipeline<T, C, G>
where
    T: ToolAdapter,
    C: Clock,
    G: IdGen,
{
    pub fn new(config: &Config, registry: JobRegistry, tools: T, clock: C, ids: G) -> Self {
        Self {
            store: ArtifactStore::new(&config.storage.artifact_root),
            upload_root: std::path::absolute(&config.storage.upload_root)
                .unwrap_or_else(|_| config.storage.upload_root.clone()),
            public_prefix: config.storage.public_prefix.clone(),
            layout: ToolLayout::new(config),
            registry,
            tools,
            clock,
            ids,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Run a job to completion
    pub async fn submit(&self, spec: &SourceSpec, effect: &str) -> Ticket {
        self.submit_with_cancel(spec, effect, CancellationToken::new())
            .await
    }

    /// Run a job to completion, stopping its current tool if `cancel` fires
    pub async fn submit_with_cancel(
        &self,
        spec: &SourceSpec,
        effect: &str,
        cancel: CancellationToken,
    ) -> Ticket {
        let effect = Effect::parse(effect);

        // Nothing is registered or written for a malformed request
        let source = match Source::from_spec(spec) {
            Ok(source) => source,
            Err(error) => {
                let id = self.ids.next();
                tracing::warn!(job_id = %id, error = %error, "submission rejected");
                return Ticket::rejected(JobReport::rejected(id, effect, error, self.clock.now()));
            }
        };

        let (id, registration) = match self.claim_id() {
            Ok(claimed) => claimed,
            Err(error) => {
                let id = self.ids.next();
                return Ticket::rejected(JobReport::rejected(id, effect, error, self.clock.now()));
            }
        };

        let mut job = Job::new(id, source, effect, &self.clock);
        let span = tracing::info_span!(
            "job",
            job_id = %job.id,
            effect = effect.as_str(),
            source = job.source.kind(),
        );
        async {
            tracing::info!("submitted");
            if let Err(error) = self.drive(&mut job, &cancel).await {
                if let Err(e) = job.fail(error, &self.clock) {
                    tracing::error!(error = %e, "could not record failure");
                }
            }
        }
        .instrument(span)
        .await;

        Ticket {
            report: JobReport::from_job(&job, &self.public_prefix),
            job: Some(job),
            registration: Some(registration),
        }
    }

    /// Register a fresh id that has nothing on disk
    ///
    /// Registering first means the sweeper cannot be mid-purge on the id
    /// when the disk check runs.
    fn claim_id(&self) -> Result<(JobId, Registration), JobError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next();
            match self.registry.register(&id) {
                Ok(registration) if self.has_artifacts(&id) => {
                    tracing::warn!(job_id = %id, "id still has artifacts on disk, drawing another");
                    drop(registration);
                }
                Ok(registration) => return Ok((id, registration)),
                Err(e) => tracing::warn!(error = %e, "id unavailable, drawing another"),
            }
        }
        tracing::error!(attempts = MAX_ID_ATTEMPTS, "no usable job id");
        Err(JobError::internal("could not allocate a job id"))
    }

    fn has_artifacts(&self, id: &JobId) -> bool {
        self.store.working_dir(id).exists()
            || SeparationLayout::all_model_dirs().iter().any(|model| {
                self.store
                    .resolve_shared(model, id.as_str())
                    .map(|p| p.exists())
                    .unwrap_or(false)
            })
    }

    async fn drive(&self, job: &mut Job, cancel: &CancellationToken) -> Result<(), JobError> {
        let source = job.source.clone();
        let upload = match &source {
            Source::Upload(path) => Some(self.check_upload(path)?),
            Source::Remote(_) => None,
        };

        self.advance(job, JobState::Fetching)?;
        let workdir = self
            .store
            .reserve(&job.id)
            .map_err(|e| JobError::from(e).at(Stage::Fetch))?;
        job.working_dir = Some(workdir.clone());

        let primary = match (&source, upload) {
            (_, Some(upload)) => self.import(&job.id, &upload)?,
            (Source::Remote(url), None) => self.fetch(&job.id, url, &workdir, cancel).await?,
            (Source::Upload(_), None) => {
                return Err(JobError::internal("upload was not checked").at(Stage::Fetch))
            }
        };
        self.advance(job, JobState::Fetched)?;

        let plan = match job.effect {
            Effect::None => None,
            Effect::TimeStretchReverb => Some(self.layout.transcode(&job.id, &primary, &workdir)),
            Effect::VocalIsolate => {
                let model_dir = self
                    .store
                    .reserve_shared(self.layout.separation().model_dir())
                    .map_err(|e| JobError::from(e).at(Stage::Transform))?;
                Some(self.layout.separate(&job.id, &primary, &workdir, &model_dir))
            }
        };

        let outputs = match plan {
            None => vec![ExpectedOutput {
                name: "primary",
                path: primary,
            }],
            Some(plan) => {
                self.advance(job, JobState::Transforming)?;
                self.run_tool(Stage::Transform, &plan, cancel).await?;
                plan.outputs
            }
        };

        self.advance(job, JobState::Verifying)?;
        self.verify(Stage::Verify, &outputs)?;

        let mut published = BTreeMap::new();
        for output in outputs {
            let rel = self
                .store
                .relative(&output.path)
                .map_err(|e| JobError::from(e).at(Stage::Publish))?;
            published.insert(output.name.to_string(), rel);
        }
        job.publish(published, &self.clock)
            .map_err(|e| JobError::internal(e.to_string()).at(Stage::Publish))
    }

    async fn fetch(
        &self,
        id: &JobId,
        url: &Url,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, JobError> {
        let cookies = self.layout.cookies();
        if cookies.is_none() {
            if let Some(path) = self.layout.configured_cookies() {
                tracing::warn!(path = %path.display(), "cookies file missing, fetching without it");
            }
        }

        let plan = self.layout.fetch(id, url, workdir, cookies);
        self.run_tool(Stage::Fetch, &plan, cancel).await?;
        // Exit status 0 is not proof the file is there
        self.verify(Stage::Fetch, &plan.outputs)?;
        first_path(plan.outputs)
    }

    fn import(&self, id: &JobId, upload: &Path) -> Result<PathBuf, JobError> {
        let ext = upload
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .filter(|e| plain_extension(e))
            .unwrap_or_else(|| self.layout.audio_format().to_string());
        let primary = match self.store.import(id, upload, &format!("{}.{}", id, ext)) {
            Ok(primary) => primary,
            // Swept between the upload check and the copy
            Err(e) if !upload.is_file() => {
                tracing::warn!(
                    path = %upload.display(),
                    error = %e,
                    "upload vanished before import"
                );
                return Err(
                    JobError::validation("uploaded file is missing or not acceptable")
                        .at(Stage::Fetch),
                );
            }
            Err(e) => return Err(JobError::from(e).at(Stage::Fetch)),
        };
        let outputs = [ExpectedOutput {
            name: "primary",
            path: primary.clone(),
        }];
        self.verify(Stage::Fetch, &outputs)?;
        Ok(primary)
    }

    /// An upload must be a non-empty regular file inside the upload root
    fn check_upload(&self, path: &Path) -> Result<PathBuf, JobError> {
        let rejected = |reason: &str| {
            tracing::warn!(path = %path.display(), reason, "upload rejected");
            JobError::validation("uploaded file is missing or not acceptable")
        };

        let root = self
            .upload_root
            .canonicalize()
            .map_err(|_| rejected("upload root unavailable"))?;
        let candidate = if path.is_relative() {
            self.upload_root.join(path)
        } else {
            path.to_path_buf()
        };
        let file = candidate
            .canonicalize()
            .map_err(|_| rejected("not found"))?;
        if !file.starts_with(&root) || file == root {
            return Err(rejected("outside upload root"));
        }
        match std::fs::metadata(&file) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(file),
            Ok(_) => Err(rejected("empty or not a regular file")),
            Err(_) => Err(rejected("unreadable")),
        }
    }

    async fn run_tool(
        &self,
        stage: Stage,
        plan: &ToolPlan,
        cancel: &CancellationToken,
    ) -> Result<(), JobError> {
        self.tools
            .run(&plan.invocation, cancel)
            .await
            .map(|_| ())
            .map_err(|e| tool_failure(stage, &e))
    }

    fn verify(&self, stage: Stage, outputs: &[ExpectedOutput]) -> Result<(), JobError> {
        for output in outputs {
            if !self.store.size_non_zero(&output.path) {
                tracing::warn!(
                    output = output.name,
                    path = %output.path.display(),
                    exists = self.store.exists(&output.path),
                    "expected output missing or empty"
                );
                return Err(JobError::verification(
                    stage,
                    format!("{} output is missing or empty", output.name),
                ));
            }
        }
        Ok(())
    }

    fn advance(&self, job: &mut Job, next: JobState) -> Result<(), JobError> {
        job.advance(next, &self.clock)
            .map_err(|e| JobError::internal(e.to_string()))
    }
}

fn first_path(outputs: Vec<ExpectedOutput>) -> Result<PathBuf, JobError> {
    outputs
        .into_iter()
        .next()
        .map(|o| o.path)
        .ok_or_else(|| JobError::internal("tool layout declared no output"))
}

/// Map a tool failure to the caller-facing taxonomy
///
/// Details stay generic; program paths, argv and output tails are only logged.
fn tool_failure(stage: Stage, err: &ToolError) -> JobError {
    let (kind, detail) = match err {
        ToolError::NonZeroExit {
            marker: Some(MarkerKind::AuthRequired),
            ..
        } if stage == Stage::Fetch => (
            ErrorKind::FetchAuthRequired,
            "source requires sign-in; cookies missing or expired".to_string(),
        ),
        ToolError::NonZeroExit { code, .. } => {
            let kind = match stage {
                Stage::Fetch => ErrorKind::Fetch,
                Stage::Transform => ErrorKind::Transform,
                _ => ErrorKind::ToolNonZeroExit,
            };
            let status = match code {
                Some(code) => format!("exit code {}", code),
                None => "killed by a signal".to_string(),
            };
            (kind, format!("{} tool failed ({})", stage, status))
        }
        ToolError::Timeout { timeout, .. } => (
            ErrorKind::ToolTimeout,
            format!("{} tool timed out after {}s", stage, timeout.as_secs()),
        ),
        ToolError::SpawnFailure { .. } => (
            ErrorKind::ToolSpawnFailure,
            format!("{} tool could not be started", stage),
        ),
        ToolError::Cancelled { .. } => {
            (ErrorKind::ToolCancelled, format!("{} was cancelled", stage))
        }
    };
    tracing::warn!(stage = %stage, error = %err, kind = %kind, "stage failed");
    JobError::new(kind, detail).at(stage)
}

fn plain_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 8 && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

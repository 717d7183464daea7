//! Runs one translation: extract, translate, reconcile, materialize.
//!
//! A run only fails for precondition violations, all of which are detected
//! before the first provider call. Anything that goes wrong later is
//! contained to a language or a unit and reported in the summary.

use crate::config::Config;
use crate::document::{DesignDocument, FontLoader, SourceFrame};
use crate::error::PreconditionError;
use crate::gateway::{TranslationGateway, TranslationProvider};
use crate::i18n::LanguageCode;
use crate::materialize::{FrameMaterializer, MaterializeReport, DEFAULT_FRAME_SPACING};
use crate::model::{ProviderResult, ReconciledLanguageResult, TranslationBatch};
use crate::reconcile::reconcile;
use crate::status::StatusSink;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Translating,
    Reconciling,
    Materializing,
    Done,
    Failed,
}

impl RunState {
    /// Strictly sequential; any active state may fail.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Extracting)
                | (Extracting, Translating)
                | (Translating, Reconciling)
                | (Reconciling, Materializing)
                | (Materializing, Done)
                | (Idle | Extracting, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target_languages: Vec<LanguageCode>,
    pub frame_spacing: f64,
}

impl RunOptions {
    pub fn new(target_languages: Vec<LanguageCode>) -> Self {
        Self {
            target_languages,
            frame_spacing: DEFAULT_FRAME_SPACING,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            target_languages: config.target_languages.clone(),
            frame_spacing: config.frame_spacing,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(LanguageCode::defaults())
    }
}

/// Everything a run produces, owned by the run and dropped with it.
#[derive(Debug)]
pub struct RunContext {
    state: RunState,
    transitions: Vec<RunState>,
    source: Option<SourceFrame>,
    batch: Option<TranslationBatch>,
    raw: Option<ProviderResult>,
    reconciled: Vec<ReconciledLanguageResult>,
    started_at: DateTime<Utc>,
}

impl RunContext {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
            transitions: vec![RunState::Idle],
            source: None,
            batch: None,
            raw: None,
            reconciled: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        info!("Run state: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames_created: usize,
    pub report: MaterializeReport,
    pub transitions: Vec<RunState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run failed while {failed_in:?}: {error}")]
pub struct RunFailure {
    pub failed_in: RunState,
    pub error: PreconditionError,
    pub transitions: Vec<RunState>,
}

pub struct Orchestrator<P> {
    gateway: TranslationGateway<P>,
    options: RunOptions,
}

impl<P: TranslationProvider> Orchestrator<P> {
    pub fn new(gateway: TranslationGateway<P>, options: RunOptions) -> Self {
        Self { gateway, options }
    }

    pub fn gateway(&self) -> &TranslationGateway<P> {
        &self.gateway
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run the pipeline against the document's current selection.
    pub async fn run<D, F>(
        &self,
        document: &mut D,
        fonts: &F,
        status: &dyn StatusSink,
    ) -> Result<RunSummary, RunFailure>
    where
        D: DesignDocument + ?Sized,
        F: FontLoader + ?Sized,
    {
        let mut ctx = RunContext::new();

        ctx.advance(RunState::Extracting);
        if let Err(e) = self.check_preconditions(&mut ctx, &*document, status) {
            return Err(self.fail(ctx, e, status));
        }

        ctx.advance(RunState::Translating);
        let batch = TranslationBatch::new(
            ctx.source.as_ref().map(|s| s.units.clone()).unwrap_or_default(),
            self.options.target_languages.clone(),
        );
        let raw = self
            .gateway
            .translate(&batch.source_texts(), batch.target_languages(), status)
            .await;
        ctx.batch = Some(batch);
        ctx.raw = Some(raw);

        ctx.advance(RunState::Reconciling);
        if let (Some(batch), Some(raw)) = (&ctx.batch, &ctx.raw) {
            ctx.reconciled = reconcile(batch, raw);
        }

        ctx.advance(RunState::Materializing);
        let report = match &ctx.source {
            Some(source) => {
                FrameMaterializer::new(document, fonts, status)
                    .with_frame_spacing(self.options.frame_spacing)
                    .materialize(source, &ctx.reconciled)
                    .await
            }
            None => MaterializeReport::default(),
        };

        ctx.advance(RunState::Done);
        if report.created > 0 {
            status.info(&format!(
                "Translation complete! {} frames created.",
                report.created
            ));
        } else {
            status.error("Translation finished, but no valid frames created. Check logs/API key.");
        }

        Ok(RunSummary {
            frames_created: report.created,
            report,
            transitions: ctx.transitions,
            started_at: ctx.started_at,
            finished_at: Utc::now(),
        })
    }

    fn check_preconditions<D>(
        &self,
        ctx: &mut RunContext,
        document: &D,
        status: &dyn StatusSink,
    ) -> Result<(), PreconditionError>
    where
        D: DesignDocument + ?Sized,
    {
        if self.options.target_languages.is_empty() {
            return Err(PreconditionError::NoTargetLanguages);
        }
        self.gateway.provider().ready()?;

        let source = document.extract(&document.selection())?;
        status.info(&format!("Selected frame: {}", source.name));
        status.info(&format!(
            "Found {} text items. Translating...",
            source.units.len()
        ));
        ctx.source = Some(source);
        Ok(())
    }

    fn fail(&self, mut ctx: RunContext, error: PreconditionError, status: &dyn StatusSink) -> RunFailure {
        let failed_in = ctx.state;
        error!("Run aborted: {}", error);
        status.error(&error.to_string());
        ctx.advance(RunState::Failed);
        RunFailure {
            failed_in,
            error,
            transitions: ctx.transitions,
        }
    }
}

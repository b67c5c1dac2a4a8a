//! End-to-end run: sync, organize, report, publish.
//!
//! Every step is gated on the one before it. A failed step is logged,
//! reported through the [`Notifier`] and ends the run; nothing here returns
//! `Err`, so a scheduler invoking the pipeline always gets a
//! [`PipelineReport`] back.

use crate::config::Config;
use crate::domain::LOCK_FILE_NAME;
use crate::error::{FigsyncError, Result, StepOutcome};
use crate::lock::RunLock;
use crate::notify::{notifier_from_config, Notification, Notifier};
use crate::organize::{OrganizeSummary, Organizer};
use crate::publish::{PublishOutcome, SitePublisher};
use crate::report::{collect_report, write_report, HtmlReportRenderer, ReportRenderer};
use crate::store::MetadataStore;
use crate::sync::{sync_figures, FigureSource, RsyncSource, SyncReport};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Lock,
    Sync,
    Organize,
    Report,
    Publish,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lock => "lock",
            Self::Sync => "sync",
            Self::Organize => "organize",
            Self::Report => "report",
            Self::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub days: u32,
    pub date: NaiveDate,
    /// Publish to the site repository when one is configured.
    pub publish: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub success: bool,
    pub failed_step: Option<PipelineStep>,
    pub sync: Option<SyncReport>,
    pub organize: Option<OrganizeSummary>,
    pub report_path: Option<PathBuf>,
    pub publish: Option<PublishOutcome>,
    pub elapsed: Duration,
}

impl PipelineReport {
    fn new() -> Self {
        Self {
            success: false,
            failed_step: None,
            sync: None,
            organize: None,
            report_path: None,
            publish: None,
            elapsed: Duration::ZERO,
        }
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
    source: Option<Box<dyn FigureSource + 'a>>,
    renderer: Box<dyn ReportRenderer + 'a>,
    notifier: Box<dyn Notifier + 'a>,
    now: Option<NaiveDateTime>,
}

impl<'a> Pipeline<'a> {
    /// Build from configuration. Without a `[remote]` section the sync step
    /// is skipped and the staging root is used as-is.
    pub fn from_config(config: &'a Config) -> Self {
        let source: Option<Box<dyn FigureSource + 'a>> =
            match RsyncSource::from_config(&config.remote, config.primary_image_extension()) {
                Ok(source) => Some(Box::new(source)),
                Err(FigsyncError::NoRemote) => None,
                Err(err) => {
                    tracing::warn!("Ignoring remote configuration: {err}");
                    None
                }
            };
        Self {
            config,
            source,
            renderer: Box::new(HtmlReportRenderer),
            notifier: notifier_from_config(&config.notify),
            now: None,
        }
    }

    pub fn with_source(mut self, source: Box<dyn FigureSource + 'a>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ReportRenderer + 'a>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier + 'a>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn run(&self, options: &RunOptions) -> PipelineReport {
        let start = Instant::now();
        tracing::info!("Starting figure pipeline for {}", options.date);

        let mut report = self.run_steps(options);
        report.elapsed = start.elapsed();

        let secs = report.elapsed.as_secs_f64();
        if report.success {
            tracing::info!("Pipeline completed successfully in {:.2} seconds", secs);
            if let Some(path) = &report.report_path {
                tracing::info!("Report available at: {}", path.display());
            }
        } else {
            tracing::error!("Pipeline completed with errors in {:.2} seconds", secs);
        }
        report
    }

    fn run_steps(&self, options: &RunOptions) -> PipelineReport {
        let mut report = PipelineReport::new();

        let lock_path = self.config.staging_root.join(LOCK_FILE_NAME);
        let _lock = match self.step(PipelineStep::Lock, RunLock::acquire(&lock_path)) {
            Some(lock) => lock,
            None => return self.fail(report, PipelineStep::Lock),
        };

        tracing::info!("=== Step 1: Syncing and organizing figures ===");
        match &self.source {
            Some(source) => {
                match self.step(PipelineStep::Sync, sync_figures(source.as_ref(), self.config)) {
                    Some(sync) => report.sync = Some(sync),
                    None => return self.fail(report, PipelineStep::Sync),
                }
            }
            None => tracing::warn!("No remote configured, organizing the staging root as-is"),
        }

        let organized = Organizer::from_config(self.config)
            .map(|organizer| match self.now {
                Some(now) => organizer.with_now(now),
                None => organizer,
            })
            .and_then(|organizer| organizer.try_organize(options.days));
        match self.step(PipelineStep::Organize, organized) {
            Some(summary) => report.organize = Some(summary),
            None => return self.fail(report, PipelineStep::Organize),
        }

        tracing::info!("=== Step 2: Generating report ===");
        let report_path = match self.step(PipelineStep::Report, self.generate_report(options.date)) {
            Some(path) => path,
            None => return self.fail(report, PipelineStep::Report),
        };
        report.report_path = Some(report_path.clone());

        if !options.publish {
            self.notifier.notify(&Notification::success(
                format!("MNE Report Generated - {}", options.date),
                format!("Report written to {}", report_path.display()),
            ));
            report.success = true;
            return report;
        }
        if self.config.site.repo_path.is_none() {
            tracing::info!("No site repository configured, skipping publish");
            report.success = true;
            return report;
        }

        tracing::info!("=== Step 3: Updating website ===");
        let published = SitePublisher::from_config(&self.config.site).and_then(|publisher| {
            let index = MetadataStore::new(self.config.metadata_path()).load();
            publisher.publish(&report_path, options.date, &index)
        });
        match self.step(PipelineStep::Publish, published) {
            Some(outcome) => {
                self.notifier.notify(&Notification::success(
                    format!("MNE Report Updated - {}", options.date),
                    format!(
                        "Successfully generated and published MNE report for {}.\n\nReport is available at: {}",
                        options.date, outcome.site_link
                    ),
                ));
                report.publish = Some(outcome);
                report.success = true;
                report
            }
            None => self.fail(report, PipelineStep::Publish),
        }
    }

    fn generate_report(&self, date: NaiveDate) -> Result<PathBuf> {
        let config = self.config;
        let index = MetadataStore::new(config.metadata_path()).load();
        let images = config.image_matcher()?;
        let report =
            collect_report(&config.staging_root, &images, &index, &config.report.title, date)?;
        tracing::info!("Collected {} figures for the report", report.total_figures);
        write_report(self.renderer.as_ref(), &report, &config.report.output_dir, &config.report.file_prefix)
    }

    /// Log a failed step result and keep its error for the notification.
    fn step<T>(&self, step: PipelineStep, result: Result<T>) -> Option<T> {
        match StepOutcome::from_result(&step.to_string(), result) {
            StepOutcome::Ok(value) => Some(value),
            StepOutcome::RecoverableFailure(err) => {
                self.notifier.notify(&failure_notification(step, &err));
                None
            }
        }
    }

    fn fail(&self, mut report: PipelineReport, step: PipelineStep) -> PipelineReport {
        tracing::error!("{} step failed, aborting pipeline", step);
        report.success = false;
        report.failed_step = Some(step);
        report
    }
}

fn failure_notification(step: PipelineStep, err: &FigsyncError) -> Notification {
    let (subject, stage) = match step {
        PipelineStep::Lock => ("MNE Pipeline Already Running", "lock"),
        PipelineStep::Sync => ("MNE Pipeline Failed at Sync Step", "figure sync"),
        PipelineStep::Organize => ("MNE Pipeline Failed at Organization Step", "figure organization"),
        PipelineStep::Report => ("MNE Pipeline Failed at Report Step", "report generation"),
        PipelineStep::Publish => ("Website Update Failed", "website update"),
    };
    Notification::failure(
        subject,
        format!(
            "The pipeline failed during the {} step: {}\n\nPlease check the logs for details.",
            stage, err
        ),
    )
}

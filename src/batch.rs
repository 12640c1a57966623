//! Batch driver: enumerate → pair → convert.
//!
//! ## Run Flow
//!
//! ```text
//! validate dirs ─► enumerate inputs + templates ─► plan pairs ─► convert (rayon) ─► summary
//!                                                  (coordinator)   (workers)
//! ```
//!
//! Planning, including every template probe and every pool mutation, happens
//! on the calling thread. Only the finished pair list fans out to the worker
//! pool, and each worker touches nothing but its own pair.
//!
//! ## Failure Policy
//!
//! Missing or non-directory input/template roots abort the run before any
//! work. Everything after that is per item: a template that fails to probe is
//! dropped, a pair that fails to convert is counted as failed, and the batch
//! carries on.
//!
//! ## Progress
//!
//! Callers pass an optional [`Sender<BatchEvent>`]; the CLI drains it on a
//! printer thread through the [`output`](crate::output) formatters.

use crate::config::{self, SwapConfig};
use crate::convert::convert_pair;
use crate::enumerate::{self, EnumerateError, FileOrder};
use crate::imaging::{BackendError, ImageBackend, ResizeFilter};
use crate::matcher::{Rejection, TemplatePool};
use crate::pairing::{self, Confirm, PairingError, PairingMode, PathRoots, Plan, Selection};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Output directory {0} is also the input or template directory")]
    OutputIsSource(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Enumeration failed: {0}")]
    Enumerate(#[from] EnumerateError),
    #[error(transparent)]
    Pairing(#[from] PairingError),
    #[error("Could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything one run needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mode: PairingMode,
    pub selection: Selection,
    pub allow_duplicates: bool,
    pub seed: Option<u64>,
    pub order: FileOrder,
    pub input_extensions: Vec<String>,
    pub template_extensions: Vec<String>,
    pub filter: ResizeFilter,
    pub threads: usize,
}

impl BatchOptions {
    pub fn from_config(
        config: &SwapConfig,
        input_dir: PathBuf,
        template_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            input_dir,
            template_dir,
            output_dir,
            mode: config.pairing.mode,
            selection: config.pairing.selection,
            allow_duplicates: config.pairing.allow_duplicates,
            seed: config.pairing.seed,
            order: config.files.order,
            input_extensions: config.files.input_extensions.clone(),
            template_extensions: config.files.template_extensions.clone(),
            filter: config.backend.filter,
            threads: config::effective_threads(&config.processing),
        }
    }
}

/// Progress notifications emitted during a run.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        inputs: usize,
        templates: usize,
        mode: PairingMode,
    },
    TemplateRejected(Rejection),
    Planned {
        pairs: usize,
        unprocessed: usize,
    },
    Converted {
        index: usize,
        total: usize,
        input: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
    },
    Failed {
        index: usize,
        total: usize,
        input: PathBuf,
        output: PathBuf,
        reason: String,
    },
}

/// A pair whose conversion failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedPair {
    pub input: PathBuf,
    pub output: PathBuf,
    pub reason: String,
}

/// Counts for a finished run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub inputs: usize,
    pub templates: usize,
    pub pairs: usize,
    pub converted: usize,
    pub failed: usize,
    pub rejected_templates: usize,
    pub unprocessed_inputs: usize,
    pub seed: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedPair>,
}

/// A plan together with the counts it was built from.
#[derive(Debug)]
pub struct PlannedRun {
    pub plan: Plan,
    pub inputs: usize,
    pub templates: usize,
    pub roots: PathRoots,
    pub seed: u64,
}

pub struct BatchDriver {
    options: BatchOptions,
}

fn send(events: Option<&Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is printing progress.
        let _ = tx.send(event);
    }
}

fn require_dir(path: &Path) -> Result<PathBuf, BatchError> {
    if !path.is_dir() {
        return Err(BatchError::NotADirectory(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

/// Absolute form of a path that may not exist yet.
fn resolve_output(path: &Path) -> Result<PathBuf, BatchError> {
    if path.exists() {
        Ok(path.canonicalize()?)
    } else {
        Ok(std::path::absolute(path)?)
    }
}

impl BatchDriver {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    /// Validate directories, enumerate both trees and pair them up.
    /// Nothing is written.
    pub fn plan(
        &self,
        backend: &impl ImageBackend,
        confirm: &mut dyn Confirm,
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<PlannedRun, BatchError> {
        let opts = &self.options;
        let input_dir = require_dir(&opts.input_dir)?;
        let template_dir = require_dir(&opts.template_dir)?;
        let output_dir = resolve_output(&opts.output_dir)?;
        if output_dir == input_dir || output_dir == template_dir {
            return Err(BatchError::OutputIsSource(output_dir));
        }

        let inputs = enumerate::enumerate(
            &input_dir,
            &opts.input_extensions,
            opts.order,
            Some(&output_dir),
        )?;
        let templates = enumerate::enumerate(
            &template_dir,
            &opts.template_extensions,
            opts.order,
            Some(&output_dir),
        )?;
        let (input_count, template_count) = (inputs.len(), templates.len());

        tracing::info!(
            "found {} inputs under {} and {} templates under {}",
            input_count,
            input_dir.display(),
            template_count,
            template_dir.display()
        );
        send(
            events,
            BatchEvent::Started {
                inputs: input_count,
                templates: template_count,
                mode: opts.mode,
            },
        );

        let allow_duplicates = if opts.mode == PairingMode::Cycle && opts.allow_duplicates {
            tracing::warn!("cycle mode consumes every template once; ignoring duplicates");
            false
        } else {
            opts.allow_duplicates
        };
        let seed = opts.seed.unwrap_or_else(rand::random);
        tracing::info!(
            "pairing mode {}, {:?} selection, duplicates {}, seed {}",
            opts.mode,
            opts.selection,
            if allow_duplicates { "allowed" } else { "off" },
            seed
        );

        let mut pool = TemplatePool::new(templates, opts.selection, allow_duplicates, seed);
        let roots = PathRoots {
            templates: template_dir,
            output: output_dir,
        };
        let plan = pairing::plan(&inputs, &mut pool, opts.mode, &roots, backend, confirm)?;

        for rejection in &plan.rejected {
            send(events, BatchEvent::TemplateRejected(rejection.clone()));
        }
        for input in &plan.unprocessed {
            tracing::info!("no template left for {}", input.display());
        }
        send(
            events,
            BatchEvent::Planned {
                pairs: plan.pairs.len(),
                unprocessed: plan.unprocessed.len(),
            },
        );

        Ok(PlannedRun {
            plan,
            inputs: input_count,
            templates: template_count,
            roots,
            seed,
        })
    }

    /// Plan the run, then convert every pair on the worker pool.
    pub fn run(
        &self,
        backend: &impl ImageBackend,
        confirm: &mut dyn Confirm,
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<BatchSummary, BatchError> {
        let planned = self.plan(backend, confirm, events)?;
        std::fs::create_dir_all(&planned.roots.output)?;
        self.execute(backend, planned, events)
    }

    fn execute(
        &self,
        backend: &impl ImageBackend,
        planned: PlannedRun,
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<BatchSummary, BatchError> {
        let pairs = &planned.plan.pairs;
        let total = pairs.len();
        let filter = self.options.filter;

        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .build()?;
        tracing::info!("converting {} pairs on {} workers", total, self.options.threads);

        let outcomes: Vec<Result<(), BackendError>> = workers.install(|| {
            pairs
                .par_iter()
                .map(|pair| {
                    let result = convert_pair(backend, pair, filter);
                    let event = match &result {
                        Ok(()) => BatchEvent::Converted {
                            index: pair.index,
                            total,
                            input: pair.input.clone(),
                            output: pair.output.clone(),
                            width: pair.template.width,
                            height: pair.template.height,
                        },
                        Err(e) => BatchEvent::Failed {
                            index: pair.index,
                            total,
                            input: pair.input.clone(),
                            output: pair.output.clone(),
                            reason: e.to_string(),
                        },
                    };
                    send(events, event);
                    result
                })
                .collect()
        });

        let mut summary = BatchSummary {
            inputs: planned.inputs,
            templates: planned.templates,
            pairs: total,
            rejected_templates: planned.plan.rejected.len(),
            unprocessed_inputs: planned.plan.unprocessed.len(),
            seed: planned.seed,
            ..Default::default()
        };

        for (pair, outcome) in pairs.iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    summary.converted += 1;
                    tracing::info!(
                        "converted {} -> {} ({}x{})",
                        pair.input.display(),
                        pair.output.display(),
                        pair.template.width,
                        pair.template.height
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        "failed {} -> {}: {}",
                        pair.input.display(),
                        pair.output.display(),
                        e
                    );
                    summary.failures.push(FailedPair {
                        input: pair.input.clone(),
                        output: pair.output.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "done: {} converted, {} failed, {} inputs unprocessed",
            summary.converted,
            summary.failed,
            summary.unprocessed_inputs
        );
        Ok(summary)
    }
}

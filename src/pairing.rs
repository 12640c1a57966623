//! Pairing policy: which input lands on which template.
//!
//! The planner walks the input list, asks the [`TemplatePool`] for a template
//! per input, and turns each match into a [`Pair`] with its destination path.
//! It runs entirely on the coordinating thread; the pool is never touched once
//! conversions start.
//!
//! ## Modes
//!
//! | Mode | Inputs | Templates | Stops when |
//! |---|---|---|---|
//! | `exhaust` | once each | removed on use unless duplicates allowed | inputs done or pool empty |
//! | `cycle` | round-robin, reused | always removed on use | pool empty |
//! | `replenish` | once each | refilled when the pool empties | inputs done |
//! | `confirm` | once each | asks before looping when inputs outnumber templates | inputs done, or declined |
//!
//! ## Destination paths
//!
//! A pair's output mirrors the template's path relative to the template root,
//! under the output root. When a template is used more than once in a run,
//! later uses get `-1`, `-2`, ... appended to the file stem so no output
//! overwrites another.

use crate::imaging::ImageBackend;
use crate::matcher::{Rejection, TemplateDescriptor, TemplatePool};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PairingError {
    #[error("Looping templates was declined ({inputs} inputs, {templates} templates)")]
    Declined { inputs: usize, templates: usize },
}

/// How inputs and templates are matched. See the [module docs](self).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PairingMode {
    #[default]
    Exhaust,
    Cycle,
    Replenish,
    Confirm,
}

/// How the next template is picked from the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Uniformly at random among remaining templates.
    #[default]
    Random,
    /// In enumeration order (round-robin when duplicates are allowed).
    Sequential,
}

impl std::fmt::Display for PairingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Exhaust => "exhaust",
            Self::Cycle => "cycle",
            Self::Replenish => "replenish",
            Self::Confirm => "confirm",
        };
        f.write_str(name)
    }
}

/// Yes/no question put to the operator in `confirm` mode.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Fixed answer, for `--yes` and non-interactive runs.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}

/// One unit of conversion work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    /// Position in the plan, 1-based.
    pub index: usize,
    pub input: PathBuf,
    pub template: TemplateDescriptor,
    pub output: PathBuf,
}

/// Result of pairing inputs against the template pool.
#[derive(Debug, Default, Serialize)]
pub struct Plan {
    pub pairs: Vec<Pair>,
    /// Inputs that never received a template.
    pub unprocessed: Vec<PathBuf>,
    pub rejected: Vec<Rejection>,
}

/// Root directories used to derive destination paths.
#[derive(Debug, Clone)]
pub struct PathRoots {
    pub templates: PathBuf,
    pub output: PathBuf,
}

/// Hands out destination paths, unique across the whole plan.
///
/// Every template's plain destination is reserved up front, so a suffixed
/// reuse (`wall-1.dds`) never lands on another template's own output.
struct DestinationNamer<'a> {
    roots: &'a PathRoots,
    issued: HashSet<PathBuf>,
    next_suffix: HashMap<PathBuf, usize>,
}

impl<'a> DestinationNamer<'a> {
    fn new(roots: &'a PathRoots, templates: &[PathBuf]) -> Self {
        let issued = templates.iter().map(|t| base_destination(roots, t)).collect();
        Self {
            roots,
            issued,
            next_suffix: HashMap::new(),
        }
    }

    fn destination(&mut self, template: &Path) -> PathBuf {
        let base = base_destination(self.roots, template);
        let Some(mut n) = self.next_suffix.get(template).copied() else {
            self.next_suffix.insert(template.to_path_buf(), 1);
            self.issued.insert(base.clone());
            return base;
        };
        let mut candidate = with_stem_suffix(&base, n);
        while self.issued.contains(&candidate) {
            n += 1;
            candidate = with_stem_suffix(&base, n);
        }
        self.next_suffix.insert(template.to_path_buf(), n + 1);
        self.issued.insert(candidate.clone());
        candidate
    }
}

/// `output_root / template.strip_prefix(template_root)`.
fn base_destination(roots: &PathRoots, template: &Path) -> PathBuf {
    let relative = template
        .strip_prefix(&roots.templates)
        .unwrap_or_else(|_| Path::new(template.file_name().unwrap_or_default()));
    roots.output.join(relative)
}

/// `dir/wall.dds` + 2 → `dir/wall-2.dds`.
fn with_stem_suffix(path: &Path, n: usize) -> PathBuf {
    let mut name: OsString = path.file_stem().unwrap_or_default().to_owned();
    name.push(format!("-{n}"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Pair `inputs` with templates drawn from `pool` according to `mode`.
pub fn plan(
    inputs: &[PathBuf],
    pool: &mut TemplatePool,
    mode: PairingMode,
    roots: &PathRoots,
    backend: &impl ImageBackend,
    confirm: &mut dyn Confirm,
) -> Result<Plan, PairingError> {
    let mut builder = PlanBuilder {
        namer: DestinationNamer::new(roots, pool.templates()),
        pairs: Vec::new(),
    };

    let unprocessed = match mode {
        PairingMode::Exhaust => builder.once_each(inputs, pool, backend, false),
        PairingMode::Replenish => builder.once_each(inputs, pool, backend, true),
        PairingMode::Cycle => {
            builder.cycle(inputs, pool, backend);
            Vec::new()
        }
        PairingMode::Confirm => {
            // Only templates that probe count as available.
            let available = if pool.allows_duplicates() {
                pool.len()
            } else {
                pool.probe_remaining(backend)
            };
            let needs_loop = !pool.allows_duplicates() && inputs.len() > available;
            if needs_loop {
                let question = format!(
                    "You have more input images ({}) than templates ({}). Loop templates?",
                    inputs.len(),
                    available
                );
                if !confirm.confirm(&question) {
                    return Err(PairingError::Declined {
                        inputs: inputs.len(),
                        templates: available,
                    });
                }
            }
            builder.once_each(inputs, pool, backend, needs_loop)
        }
    };

    Ok(Plan {
        pairs: builder.pairs,
        unprocessed,
        rejected: pool.rejections().to_vec(),
    })
}

struct PlanBuilder<'a> {
    namer: DestinationNamer<'a>,
    pairs: Vec<Pair>,
}

impl PlanBuilder<'_> {
    fn push(&mut self, input: &Path, template: TemplateDescriptor) {
        let output = self.namer.destination(&template.path);
        self.pairs.push(Pair {
            index: self.pairs.len() + 1,
            input: input.to_path_buf(),
            template,
            output,
        });
    }

    /// Use each input at most once. Returns the inputs left without a template.
    fn once_each(
        &mut self,
        inputs: &[PathBuf],
        pool: &mut TemplatePool,
        backend: &impl ImageBackend,
        replenish: bool,
    ) -> Vec<PathBuf> {
        for (i, input) in inputs.iter().enumerate() {
            let template = match pool.match_template(backend) {
                Some(t) => Some(t),
                None if replenish && pool.replenish() => pool.match_template(backend),
                None => None,
            };
            match template {
                Some(t) => self.push(input, t),
                None => {
                    tracing::info!(
                        "template pool exhausted, {} inputs left unprocessed",
                        inputs.len() - i
                    );
                    return inputs[i..].to_vec();
                }
            }
        }
        Vec::new()
    }

    /// Reuse inputs round-robin until every template has been consumed.
    ///
    /// A pool that keeps matched templates never runs dry, so it is capped at
    /// one pair per template slot.
    fn cycle(&mut self, inputs: &[PathBuf], pool: &mut TemplatePool, backend: &impl ImageBackend) {
        if inputs.is_empty() {
            return;
        }
        let limit = if pool.allows_duplicates() {
            pool.len()
        } else {
            usize::MAX
        };
        for input in inputs.iter().cycle().take(limit) {
            match pool.match_template(backend) {
                Some(t) => self.push(input, t),
                None => break,
            }
        }
    }
}

//! Template selection and probing.
//!
//! A [`TemplatePool`] holds the candidate templates for one run. Each call to
//! [`TemplatePool::match_template`] picks a candidate, probes its dimensions
//! through the backend and hands back a [`TemplateDescriptor`]. Candidates
//! that fail to probe are dropped for the rest of the run, replenishment
//! included.
//!
//! The pool is only ever mutated by the planner on the coordinating thread,
//! before any conversion is dispatched.

use crate::imaging::{Dimensions, ImageBackend};
use crate::pairing::Selection;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A probed template: where it lives and the size outputs must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateDescriptor {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// A template dropped from the pool because it could not be probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub path: PathBuf,
    pub reason: String,
}

/// The shrinking set of candidate templates for a run.
pub struct TemplatePool {
    all: Vec<PathBuf>,
    remaining: Vec<PathBuf>,
    rejected: HashSet<PathBuf>,
    rejections: Vec<Rejection>,
    /// Probe results for this run only.
    probed: HashMap<PathBuf, Dimensions>,
    selection: Selection,
    allow_duplicates: bool,
    cursor: usize,
    rng: Pcg32,
}

impl TemplatePool {
    pub fn new(
        templates: Vec<PathBuf>,
        selection: Selection,
        allow_duplicates: bool,
        seed: u64,
    ) -> Self {
        Self {
            remaining: templates.clone(),
            all: templates,
            rejected: HashSet::new(),
            rejections: Vec::new(),
            probed: HashMap::new(),
            selection,
            allow_duplicates,
            cursor: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Templates still available for matching.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Every template the pool started with, valid or not.
    pub fn templates(&self) -> &[PathBuf] {
        &self.all
    }

    pub fn allows_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    /// Every template rejected so far, in rejection order.
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    fn pick_index(&mut self) -> usize {
        match self.selection {
            Selection::Random => self.rng.gen_range(0..self.remaining.len()),
            Selection::Sequential if self.allow_duplicates => self.cursor % self.remaining.len(),
            Selection::Sequential => 0,
        }
    }

    /// Drop the candidate at `index`. Random selection does not care about
    /// order so it uses the O(1) swap; sequential keeps the pool ordered.
    fn take(&mut self, index: usize) -> PathBuf {
        match self.selection {
            Selection::Random => self.remaining.swap_remove(index),
            Selection::Sequential => self.remaining.remove(index),
        }
    }

    fn probe(
        &mut self,
        backend: &impl ImageBackend,
        path: &Path,
    ) -> Result<Dimensions, String> {
        if let Some(dims) = self.probed.get(path) {
            return Ok(*dims);
        }
        let dims = backend.probe(path).map_err(|e| e.to_string())?;
        if dims.width == 0 || dims.height == 0 {
            return Err(format!("zero-sized image ({dims})"));
        }
        self.probed.insert(path.to_path_buf(), dims);
        Ok(dims)
    }

    /// Pick and probe the next template.
    ///
    /// Returns `None` once the pool holds no probe-able candidate.
    pub fn match_template(&mut self, backend: &impl ImageBackend) -> Option<TemplateDescriptor> {
        while !self.remaining.is_empty() {
            let index = self.pick_index();
            let path = self.remaining[index].clone();

            match self.probe(backend, &path) {
                Ok(dims) => {
                    if self.allow_duplicates {
                        self.cursor = index + 1;
                    } else {
                        self.take(index);
                    }
                    tracing::debug!("matched template {} ({dims})", path.display());
                    return Some(TemplateDescriptor {
                        path,
                        width: dims.width,
                        height: dims.height,
                    });
                }
                Err(reason) => {
                    self.take(index);
                    if self.allow_duplicates {
                        // The removed slot is now held by the next candidate.
                        self.cursor = index;
                    }
                    self.reject(path, reason);
                }
            }
        }
        None
    }

    fn reject(&mut self, path: PathBuf, reason: String) {
        tracing::warn!("discarding template {}: {reason}", path.display());
        self.rejected.insert(path.clone());
        self.rejections.push(Rejection { path, reason });
    }

    /// Probe every remaining candidate now, dropping the ones that fail.
    /// Returns how many usable templates are left. Order is preserved.
    pub fn probe_remaining(&mut self, backend: &impl ImageBackend) -> usize {
        let candidates = std::mem::take(&mut self.remaining);
        for path in candidates {
            match self.probe(backend, &path) {
                Ok(_) => self.remaining.push(path),
                Err(reason) => self.reject(path, reason),
            }
        }
        self.remaining.len()
    }

    /// Refill the pool from the full template set, minus rejected templates.
    ///
    /// Returns whether anything is available afterwards.
    pub fn replenish(&mut self) -> bool {
        self.remaining = self
            .all
            .iter()
            .filter(|p| !self.rejected.contains(*p))
            .cloned()
            .collect();
        self.cursor = 0;
        tracing::debug!("replenished template pool with {} templates", self.remaining.len());
        !self.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/templates/{n}"))).collect()
    }

    fn name(t: &TemplateDescriptor) -> String {
        t.path.file_name().unwrap().to_string_lossy().to_string()
    }

    #[test]
    fn sequential_without_duplicates_drains_in_order() {
        let backend = MockBackend::with_dimensions(&[("a.dds", 64, 64), ("b.dds", 128, 128)]);
        let mut pool = TemplatePool::new(paths(&["a.dds", "b.dds"]), Selection::Sequential, false, 0);

        let first = pool.match_template(&backend).unwrap();
        let second = pool.match_template(&backend).unwrap();
        assert_eq!(name(&first), "a.dds");
        assert_eq!((first.width, first.height), (64, 64));
        assert_eq!(name(&second), "b.dds");
        assert!(pool.match_template(&backend).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn sequential_with_duplicates_round_robins() {
        let backend = MockBackend::with_dimensions(&[("a.dds", 8, 8), ("b.dds", 16, 16)]);
        let mut pool = TemplatePool::new(paths(&["a.dds", "b.dds"]), Selection::Sequential, true, 0);

        let picked: Vec<String> = (0..5)
            .map(|_| name(&pool.match_template(&backend).unwrap()))
            .collect();
        assert_eq!(picked, vec!["a.dds", "b.dds", "a.dds", "b.dds", "a.dds"]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn duplicates_probe_each_template_once() {
        let backend = MockBackend::with_dimensions(&[("a.dds", 8, 8)]);
        let mut pool = TemplatePool::new(paths(&["a.dds"]), Selection::Random, true, 3);

        for _ in 0..4 {
            assert!(pool.match_template(&backend).is_some());
        }
        assert_eq!(backend.probe_count("a.dds"), 1);
    }

    #[test]
    fn random_without_duplicates_uses_each_template_once() {
        let names = ["a.dds", "b.dds", "c.dds", "d.dds"];
        let backend = MockBackend::with_dimensions(
            &names.iter().map(|n| (*n, 32u32, 32u32)).collect::<Vec<_>>(),
        );
        let mut pool = TemplatePool::new(paths(&names), Selection::Random, false, 42);

        let mut seen = HashSet::new();
        while let Some(t) = pool.match_template(&backend) {
            assert!(seen.insert(name(&t)), "template matched twice");
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn same_seed_same_picks() {
        let names = ["a.dds", "b.dds", "c.dds", "d.dds", "e.dds"];
        let backend = MockBackend::with_dimensions(
            &names.iter().map(|n| (*n, 32u32, 32u32)).collect::<Vec<_>>(),
        );
        let run = |seed| {
            let mut pool = TemplatePool::new(paths(&names), Selection::Random, false, seed);
            std::iter::from_fn(|| pool.match_template(&backend).map(|t| name(&t)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn unreadable_template_is_skipped_and_recorded() {
        let backend = MockBackend::with_dimensions(&[("good.dds", 64, 64)]);
        let mut pool = TemplatePool::new(
            paths(&["broken.dds", "good.dds"]),
            Selection::Sequential,
            false,
            0,
        );

        let t = pool.match_template(&backend).unwrap();
        assert_eq!(name(&t), "good.dds");
        assert_eq!(pool.rejections().len(), 1);
        assert!(pool.rejections()[0].path.ends_with("broken.dds"));
        assert!(pool.match_template(&backend).is_none());
    }

    #[test]
    fn rejected_template_never_returned_with_duplicates() {
        let backend = MockBackend::with_dimensions(&[("good.dds", 64, 64)]);
        let mut pool = TemplatePool::new(
            paths(&["broken.dds", "good.dds"]),
            Selection::Random,
            true,
            5,
        );

        for _ in 0..10 {
            assert_eq!(name(&pool.match_template(&backend).unwrap()), "good.dds");
        }
        assert_eq!(backend.probe_count("broken.dds"), 1);
    }

    #[test]
    fn sequential_duplicates_continue_after_rejection() {
        let backend = MockBackend::with_dimensions(&[("a.dds", 8, 8), ("c.dds", 8, 8)]);
        let mut pool = TemplatePool::new(
            paths(&["a.dds", "b.dds", "c.dds"]),
            Selection::Sequential,
            true,
            0,
        );

        let picked: Vec<String> = (0..4)
            .map(|_| name(&pool.match_template(&backend).unwrap()))
            .collect();
        assert_eq!(picked, vec!["a.dds", "c.dds", "a.dds", "c.dds"]);
    }

    #[test]
    fn all_broken_returns_none() {
        let backend = MockBackend::new();
        let mut pool = TemplatePool::new(paths(&["x.dds", "y.dds"]), Selection::Random, false, 1);
        assert!(pool.match_template(&backend).is_none());
        assert_eq!(pool.rejections().len(), 2);
    }

    #[test]
    fn empty_pool_returns_none() {
        let backend = MockBackend::new();
        let mut pool = TemplatePool::new(Vec::new(), Selection::Random, false, 1);
        assert!(pool.match_template(&backend).is_none());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn zero_sized_template_is_rejected() {
        let backend = MockBackend::with_dimensions(&[("flat.dds", 0, 16)]);
        let mut pool = TemplatePool::new(paths(&["flat.dds"]), Selection::Random, false, 1);
        assert!(pool.match_template(&backend).is_none());
        assert_eq!(pool.rejections().len(), 1);
    }

    #[test]
    fn replenish_skips_rejected_templates() {
        let backend = MockBackend::with_dimensions(&[("a.dds", 8, 8), ("b.dds", 8, 8)]);
        let mut pool = TemplatePool::new(
            paths(&["a.dds", "broken.dds", "b.dds"]),
            Selection::Sequential,
            false,
            0,
        );
        while pool.match_template(&backend).is_some() {}
        assert!(pool.is_empty());

        assert!(pool.replenish());
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.templates().len(), 3);
        assert_eq!(backend.probe_count("broken.dds"), 1);
    }

    #[test]
    fn unreadable_remaining_templates_are_dropped_in_order() {
        let backend = MockBackend::with_dimensions(&[("a.dds", 8, 8), ("c.dds", 8, 8)]);
        let mut pool = TemplatePool::new(
            paths(&["a.dds", "broken.dds", "c.dds"]),
            Selection::Sequential,
            false,
            0,
        );

        assert_eq!(pool.probe_remaining(&backend), 2);
        assert_eq!(pool.rejections().len(), 1);

        let first = pool.match_template(&backend).unwrap();
        let second = pool.match_template(&backend).unwrap();
        assert_eq!((name(&first), name(&second)), ("a.dds".into(), "c.dds".into()));
        // Later matches reuse the memoised probe.
        assert_eq!(backend.probe_count("a.dds"), 1);
    }

    #[test]
    fn replenish_with_only_rejected_is_empty() {
        let backend = MockBackend::new();
        let mut pool = TemplatePool::new(paths(&["x.dds"]), Selection::Random, false, 0);
        assert!(pool.match_template(&backend).is_none());
        assert!(!pool.replenish());
    }
}

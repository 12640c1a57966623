//! CLI output formatting.
//!
//! Each displayable thing has a `format_*` function returning `Vec<String>`
//! (pure, testable) and, where the binary needs it, a `print_*` wrapper that
//! writes to stdout.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! Pairing 3 inputs with 2 templates (mode: exhaust)
//! Skipped template broken.dds
//!     Reason: Could not read dimensions of ...
//! 2 pairs planned, 1 input left over
//! 001/002 dawn.jpg → small.dds (64x64)
//!     Output: out/textures/small.dds
//! 002/002 dusk.jpg ✗ failed
//!     Error: Processing failed: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Processed 2 of 3 input files (1 converted, 1 failed)
//!     Unprocessed inputs: 1
//!     Rejected templates: 0 of 2
//!     Seed: 1234
//! ```
//!
//! Entities lead with their file name; full paths go on indented context
//! lines.

use crate::batch::{BatchEvent, BatchSummary};
use crate::pairing::PathRoots;
use crate::pairing::Plan;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `path` relative to `root` when it lives under it.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// `001/012`, padded to the width of the total.
fn progress(index: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{index:0>width$}/{total:0>width$}")
}

pub fn format_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started {
            inputs,
            templates,
            mode,
        } => vec![format!(
            "Pairing {} with {} (mode: {})",
            plural(*inputs, "input", "inputs"),
            plural(*templates, "template", "templates"),
            mode
        )],
        BatchEvent::TemplateRejected(rejection) => vec![
            format!("Skipped template {}", file_name(&rejection.path)),
            format!("{}Reason: {}", indent(1), rejection.reason),
        ],
        BatchEvent::Planned { pairs, unprocessed } => {
            let head = format!("{} planned", plural(*pairs, "pair", "pairs"));
            if *unprocessed == 0 {
                vec![head]
            } else {
                vec![format!(
                    "{head}, {} left over",
                    plural(*unprocessed, "input", "inputs")
                )]
            }
        }
        BatchEvent::Converted {
            index,
            total,
            input,
            output,
            width,
            height,
        } => vec![
            format!(
                "{} {} → {} ({}x{})",
                progress(*index, *total),
                file_name(input),
                file_name(output),
                width,
                height
            ),
            format!("{}Output: {}", indent(1), output.display()),
        ],
        BatchEvent::Failed {
            index,
            total,
            input,
            reason,
            ..
        } => vec![
            format!(
                "{} {} ✗ failed",
                progress(*index, *total),
                file_name(input)
            ),
            format!("{}Error: {}", indent(1), reason),
        ],
    }
}

pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    vec![
        format!(
            "Processed {} of {} input files ({} converted, {} failed)",
            summary.inputs.saturating_sub(summary.unprocessed_inputs),
            summary.inputs,
            summary.converted,
            summary.failed
        ),
        format!(
            "{}Unprocessed inputs: {}",
            indent(1),
            summary.unprocessed_inputs
        ),
        format!(
            "{}Rejected templates: {} of {}",
            indent(1),
            summary.rejected_templates,
            summary.templates
        ),
        format!("{}Seed: {}", indent(1), summary.seed),
    ]
}

/// Format a dry-run plan: one entry per pair, then leftovers.
pub fn format_plan(plan: &Plan, roots: &PathRoots) -> Vec<String> {
    let mut lines = Vec::new();
    let total = plan.pairs.len();

    lines.push("Pairs".to_string());
    for pair in &plan.pairs {
        lines.push(format!(
            "{} {} → {} ({}x{})",
            progress(pair.index, total),
            file_name(&pair.input),
            relative(&pair.template.path, &roots.templates),
            pair.template.width,
            pair.template.height
        ));
        lines.push(format!(
            "{}Output: {}",
            indent(1),
            relative(&pair.output, &roots.output)
        ));
    }

    if !plan.unprocessed.is_empty() {
        lines.push(String::new());
        lines.push("Unprocessed inputs".to_string());
        for input in &plan.unprocessed {
            lines.push(format!("{}{}", indent(1), input.display()));
        }
    }

    if !plan.rejected.is_empty() {
        lines.push(String::new());
        lines.push("Rejected templates".to_string());
        for rejection in &plan.rejected {
            lines.push(format!(
                "{}{}",
                indent(1),
                relative(&rejection.path, &roots.templates)
            ));
            lines.push(format!("{}Reason: {}", indent(2), rejection.reason));
        }
    }

    lines
}

pub fn print_event(event: &BatchEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

pub fn print_plan(plan: &Plan, roots: &PathRoots) {
    for line in format_plan(plan, roots) {
        println!("{}", line);
    }
}

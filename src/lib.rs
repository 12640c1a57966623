//! # imgswap
//!
//! Batch image swapper. Given a folder of *input* images and a folder of
//! *template* images, each input is paired with a template, stretched to the
//! template's exact pixel dimensions, and written to an output tree that
//! mirrors the template tree. The typical use is replacing every texture of a
//! game or app with arbitrary pictures while keeping each file's size, name
//! and format.
//!
//! # Architecture: Plan, Then Convert
//!
//! ```text
//! 1. Enumerate   input/ + templates/  →  two ordered file lists
//! 2. Plan        lists + pool         →  pairs (input, template, destination)
//! 3. Convert     pairs                →  output/ (rayon worker pool)
//! ```
//!
//! Planning is sequential and owns all mutable state: the template pool, the
//! random generator and the destination naming. Conversion only sees finished
//! pairs, so workers share nothing but the backend. A dry run (`imgswap plan`)
//! is simply steps 1 and 2.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`enumerate`] | Recursive, extension-filtered file listing with a stable order |
//! | [`matcher`] | Template pool: selection, dimension probing, rejection, replenish |
//! | [`pairing`] | Pairing modes (exhaust, cycle, replenish, confirm) and destination naming |
//! | [`convert`] | One backend call per pair; creates destination directories |
//! | [`batch`] | Run driver: validation, enumeration, planning, parallel conversion, summary |
//! | [`imaging`] | [`ImageBackend`](imaging::ImageBackend) trait with `image` crate and ImageMagick backends |
//! | [`config`] | `imgswap.toml` loading, merging over defaults, validation |
//! | [`logging`] | Per-run `tracing` dispatcher writing the run log |
//! | [`output`] | CLI output formatting for progress, plans and summaries |
//! | [`prompt`] | Interactive yes/no confirmation |
//!
//! # Design Decisions
//!
//! ## Aspect Ratio Is Ignored
//!
//! Templates are stand-ins for files whose consumers expect exact sizes. An
//! input is always stretched to the template's width and height; cropping or
//! letterboxing would change what the consumer sees in ways the operator did
//! not pick.
//!
//! ## Two Backends
//!
//! The `image` crate handles the common formats with no system dependencies.
//! Some template formats (DDS in particular) can be read but not written by
//! it, so the ImageMagick backend exists for those trees. Both sit behind the
//! same trait, which also lets tests substitute a recording mock.
//!
//! ## Pairing Is Configuration
//!
//! Whether inputs cycle, templates are reused, or the pool refills is a named
//! [`PairingMode`](pairing::PairingMode) rather than a combination of
//! booleans, so every run's behaviour is visible in its log.
//!
//! ## Reproducible Randomness
//!
//! Random selection uses a seeded PCG generator. The seed is always logged
//! and reported, so any run can be replayed with `--seed`.

pub mod batch;
pub mod config;
pub mod convert;
pub mod enumerate;
pub mod imaging;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod pairing;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

//! Thin record handlers for FASTA, FASTQ, SAM, and BED.
//!
//! These share the same read-a-line/split-on-delimiter skeleton as the
//! variant format handlers in `bio-vcf`, but carry no header-driven
//! dynamic typing of their own (spec §1: "no unique design complexity
//! beyond line parsing"). `bio-io` dispatches to whichever of these
//! matches the detected input.

pub mod bed;
pub mod error;
pub mod fasta;
pub mod fastq;
pub mod sam;

pub use error::{Error, Result};

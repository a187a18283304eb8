//! Component definitions for the exam room.
//!
//! Most state lives in the `ocular-logic` state machines, which are attached
//! to entities as-is. The types here are markers, links between entities and
//! per-step records that systems fill in for the host to read.

mod eyeball;
mod props;

pub use eyeball::*;
pub use props::*;

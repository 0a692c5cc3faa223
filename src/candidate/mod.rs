//! Candidate collection for scan results.

pub(crate) mod topk;

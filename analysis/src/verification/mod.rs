//! @ai:module:intent Per-task verification of KLEE runs
//! @ai:module:layer application
//! @ai:module:public_api VerificationTask, VerificationResult, UnknownReason, Verdict, classify, classify_all, summarize_across_tasks
//! @ai:module:stateless true

pub mod classifier;
pub mod task;

pub use classifier::{
    classify, classify_all, summarize_across_tasks, Verdict, UnknownReason,
    VerificationResult,
};
pub use task::VerificationTask;

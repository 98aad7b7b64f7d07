#[path = "support/harness.rs"]
mod harness;

#[path = "pipeline/correlation.rs"]
mod correlation;
#[path = "pipeline/retry.rs"]
mod retry;
#[path = "pipeline/rewrite.rs"]
mod rewrite;
#[path = "pipeline/validate.rs"]
mod validate;

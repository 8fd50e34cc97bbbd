//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taxotree_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use taxotree_core::Step;

fn main() {
    println!("taxotree_core version={}", taxotree_core::core_version());
    let steps: Vec<&str> = Step::ALL.iter().map(|step| step.as_str()).collect();
    println!("taxotree_core steps={}", steps.join(","));
}

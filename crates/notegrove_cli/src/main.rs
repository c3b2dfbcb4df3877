//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `notegrove_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("notegrove_core ping={}", notegrove_core::ping());
    println!("notegrove_core version={}", notegrove_core::core_version());
}

//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `laneboard_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("laneboard_core ping={}", laneboard_core::ping());
    println!("laneboard_core version={}", laneboard_core::core_version());
}

//! Thin binary wrapper: runs the text ring demo.
//!
//! The demo state lives in `demos/text_ring_state.rs` and is shared with the
//! `text_ring` example target.
//!
//! Run:
//! - `cargo run`
//! - `RINGTEXT_TEXT="HELLO WORLD" RUST_LOG=info cargo run`

use anyhow::Context as _;

fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let config = ringtext::config::ConfigLoader::load().context("failed to load configuration")?;
    let state_config = config.clone();

    ringtext::run_app(&config, move |window| async move {
        text_ring_state::State::new(window, state_config).await
    })
}

// Shared state-only demo implementation. This file must not define `fn main()`.
#[path = "../demos/text_ring_state.rs"]
mod text_ring_state;

//! Example binary: text ring around a globe.
//!
//! Run:
//! - `cargo run --example text_ring`
//!
//! Keys: Up/Down radius, `+`/`-` size, `]`/`[` spacing, `.`/`,` speed, Enter rebuild.
//! Material: `1`/`2` shininess, `3`/`4` ambient, `5`/`6` key light, `7`/`8` exposure.

use anyhow::Context as _;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config =
        ringtext::config::ConfigLoader::load().context("failed to load configuration")?;
    config.window.title = format!("{} (example)", config.window.title);
    let state_config = config.clone();

    ringtext::run_app(&config, move |window| async move {
        text_ring_state::State::new(window, state_config).await
    })
}

#[path = "text_ring_state.rs"]
mod text_ring_state;

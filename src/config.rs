//! Layered configuration for the ring demo.
//!
//! Precedence (lowest to highest):
//! 1. `RingConfig::default()`
//! 2. a TOML file: `$RINGTEXT_CONFIG` if set, else `./ringtext.toml` if it exists
//! 3. `RINGTEXT_*` environment overrides
//!
//! The `[ring]` section is validated with the same rules `ring::build` applies, so a
//! bad config fails at startup instead of on the first rebuild.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::font::{FontQuery, resolve::default_ring_query, tessellate::TessellateOptions};
use crate::ring::{LayoutParams, Timestep};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RINGTEXT_CONFIG";

/// Config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "ringtext.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub window: WindowConfig,
    pub ring: RingSection,
    pub font: FontConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "ringtext: text around earth".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

/// Initial layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSection {
    pub text: String,
    pub radius: f32,
    pub size: f32,
    pub depth: f32,
    pub spacing: f32,
    /// Radians per frame.
    pub speed: f32,
}

impl Default for RingSection {
    fn default() -> Self {
        let p = LayoutParams::default();
        Self {
            text: p.text,
            radius: p.radius,
            size: p.size,
            depth: p.depth,
            spacing: p.spacing,
            speed: p.speed,
        }
    }
}

impl RingSection {
    pub fn to_params(&self) -> LayoutParams {
        LayoutParams {
            text: self.text.clone(),
            radius: self.radius,
            size: self.size,
            depth: self.depth,
            spacing: self.spacing,
            speed: self.speed,
        }
    }
}

/// Face selection and outline tessellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub families: Vec<String>,
    pub weight: u16,
    pub italic: bool,
    /// Curve flattening tolerance in world units.
    pub tolerance: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        let q = default_ring_query();
        Self {
            families: q.families,
            weight: q.weight,
            italic: q.italic,
            tolerance: TessellateOptions::default().tolerance,
        }
    }
}

impl FontConfig {
    pub fn to_query(&self) -> FontQuery {
        FontQuery {
            families: self.families.clone(),
            weight: self.weight,
            italic: self.italic,
        }
    }

    pub fn tessellate_options(&self) -> TessellateOptions {
        TessellateOptions {
            tolerance: self.tolerance,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub show_globe: bool,
    pub show_axes: bool,
    /// Globe color as `0xRRGGBB`.
    pub globe_color: u32,
    pub timestep: Timestep,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            show_globe: true,
            show_axes: true,
            globe_color: 0x2266aa,
            timestep: Timestep::Fixed,
        }
    }
}

impl RingConfig {
    /// Reject values the ring engine would refuse.
    pub fn validate(&self) -> Result<()> {
        self.ring
            .to_params()
            .validate()
            .context("invalid [ring] section")?;
        if !(self.font.tolerance.is_finite() && self.font.tolerance > 0.0) {
            bail!(
                "invalid [font] section: tolerance must be > 0 (got {})",
                self.font.tolerance
            );
        }
        Ok(())
    }
}

/// Configuration loader with file and environment sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the process environment and current directory.
    pub fn load() -> Result<RingConfig> {
        let cwd = env::current_dir().ok();
        Self::load_with(|key| env::var(key).ok(), cwd.as_deref())
    }

    /// Load using `lookup` for environment variables and `cwd` for the default file.
    pub fn load_with<F>(lookup: F, cwd: Option<&Path>) -> Result<RingConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match Self::find_config_file(&lookup, cwd)? {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::load_from_file(&path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                RingConfig::default()
            }
        };
        Self::apply_env_with(&mut config, &lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn find_config_file<F>(lookup: &F, cwd: Option<&Path>) -> Result<Option<PathBuf>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(explicit) = lookup(CONFIG_ENV).filter(|s| !s.trim().is_empty()) {
            let path = PathBuf::from(explicit);
            if !path.is_file() {
                bail!("{CONFIG_ENV} points to a missing file: {}", path.display());
            }
            return Ok(Some(path));
        }

        Ok(cwd
            .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
            .filter(|p| p.is_file()))
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<RingConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Apply `RINGTEXT_*` overrides read through `lookup`.
    pub fn apply_env_with<F>(config: &mut RingConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(text) = lookup("RINGTEXT_TEXT") {
            config.ring.text = text;
        }
        if let Some(title) = lookup("RINGTEXT_TITLE") {
            config.window.title = title;
        }

        let numeric: [(&str, &mut f32); 5] = [
            ("RINGTEXT_RADIUS", &mut config.ring.radius),
            ("RINGTEXT_SIZE", &mut config.ring.size),
            ("RINGTEXT_DEPTH", &mut config.ring.depth),
            ("RINGTEXT_SPEED", &mut config.ring.speed),
            ("RINGTEXT_SPACING", &mut config.ring.spacing),
        ];
        for (key, slot) in numeric {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{key}: expected a number, got {raw:?}"))?;
            }
        }

        if let Some(raw) = lookup("RINGTEXT_TIMESTEP") {
            config.scene.timestep = parse_timestep(&raw)
                .with_context(|| format!("RINGTEXT_TIMESTEP: expected fixed|variable, got {raw:?}"))?;
        }

        Ok(())
    }
}

fn parse_timestep(raw: &str) -> Option<Timestep> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "fixed" => Some(Timestep::Fixed),
        "variable" | "dt" => Some(Timestep::Variable),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = RingConfig::default();
        assert_eq!(config.ring.radius, 70.0);
        assert_eq!(config.ring.size, 6.0);
        assert_eq!(config.ring.speed, 0.01);
        assert_eq!(config.scene.timestep, Timestep::Fixed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: RingConfig = toml::from_str(
            r#"
            [ring]
            radius = 90.0

            [scene]
            timestep = "variable"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.ring.radius, 90.0);
        assert_eq!(parsed.ring.size, 6.0);
        assert_eq!(parsed.scene.timestep, Timestep::Variable);
        assert!(parsed.scene.show_globe);
    }

    #[test]
    fn test_cwd_file_then_env_override() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[ring]\ntext = \"FROM FILE\"\nradius = 80.0\n",
        )
        .unwrap();

        let config =
            ConfigLoader::load_with(env_of(&[("RINGTEXT_RADIUS", "100")]), Some(dir.path()))
                .unwrap();
        assert_eq!(config.ring.text, "FROM FILE");
        assert_eq!(config.ring.radius, 100.0);
    }

    #[test]
    fn test_explicit_config_env_wins_over_cwd() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[ring]\nsize = 3.0\n").unwrap();
        let other = dir.path().join("other.toml");
        fs::write(&other, "[ring]\nsize = 9.0\n").unwrap();

        let other_str = other.to_string_lossy().to_string();
        let config =
            ConfigLoader::load_with(env_of(&[(CONFIG_ENV, &other_str)]), Some(dir.path()))
                .unwrap();
        assert_eq!(config.ring.size, 9.0);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml").to_string_lossy().to_string();
        let err = ConfigLoader::load_with(env_of(&[(CONFIG_ENV, &missing)]), None).unwrap_err();
        assert!(err.to_string().contains(CONFIG_ENV));
    }

    #[test]
    fn test_invalid_ring_values_rejected() {
        let err =
            ConfigLoader::load_with(env_of(&[("RINGTEXT_RADIUS", "0")]), None).unwrap_err();
        assert!(format!("{err:#}").contains("radius"));

        let err =
            ConfigLoader::load_with(env_of(&[("RINGTEXT_SIZE", "big")]), None).unwrap_err();
        assert!(format!("{err:#}").contains("RINGTEXT_SIZE"));
    }

    #[test]
    fn test_timestep_override() {
        let mut config = RingConfig::default();
        ConfigLoader::apply_env_with(&mut config, env_of(&[("RINGTEXT_TIMESTEP", "Variable")]))
            .unwrap();
        assert_eq!(config.scene.timestep, Timestep::Variable);
        assert!(
            ConfigLoader::apply_env_with(&mut config, env_of(&[("RINGTEXT_TIMESTEP", "sometimes")]))
                .is_err()
        );
    }
}

//! Survey configuration: overlay style, service endpoints and pacing

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ShapeColor {
    pub const RED: ShapeColor = ShapeColor {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    pub const YELLOW: ShapeColor = ShapeColor {
        r: 1.0,
        g: 0.9,
        b: 0.0,
    };
    pub const BLACK: ShapeColor = ShapeColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Colors used for the boundary outline and the no-boundary marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub boundary_color: ShapeColor,
    pub marker_color: ShapeColor,
    pub marker_outline_color: ShapeColor,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            // The classifier prompt refers to a red boundary line
            boundary_color: ShapeColor::RED,
            marker_color: ShapeColor::YELLOW,
            marker_outline_color: ShapeColor::BLACK,
        }
    }
}

/// Encoding for annotated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 90 }
    }
}

impl OutputFormat {
    /// File extension for saved images
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Tile geometry and overlay settings for one render
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Web map zoom level of fetched tiles
    pub zoom: u8,
    /// Edge length of the square tile in pixels
    pub image_size_px: u32,
    pub style: OverlayStyle,
    pub format: OutputFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            zoom: 20,
            image_size_px: 640,
            style: OverlayStyle::default(),
            format: OutputFormat::default(),
        }
    }
}

/// Service endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub cadastre_url: String,
    pub static_map_url: String,
    pub openai_url: String,
    pub openai_model: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            cadastre_url:
                "https://maps.six.nsw.gov.au/arcgis/rest/services/public/NSW_Cadastre/MapServer"
                    .to_string(),
            static_map_url: "https://maps.googleapis.com/maps/api/staticmap".to_string(),
            openai_url: "https://api.openai.com/v1/chat/completions".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Pause between addresses to stay under API rate limits
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Where annotated images and results are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("garden_analysis")
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            endpoints: Endpoints::default(),
            request_delay_ms: default_request_delay_ms(),
            output_dir: default_output_dir(),
        }
    }
}

impl SurveyConfig {
    /// Application directory name under the platform config dir
    pub const APP_DIR: &'static str = "garden-survey";

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join("config.json"))
    }

    /// Load configuration from `path` (or the default location), or return
    /// defaults if unavailable
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::read(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {err:#}");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// API credentials read from the environment
#[derive(Clone)]
pub struct ApiKeys {
    pub google_maps: String,
    pub openai: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys").finish_non_exhaustive()
    }
}

impl ApiKeys {
    pub const GOOGLE_MAPS_VAR: &'static str = "GOOGLE_MAPS_API_KEY";
    pub const OPENAI_VAR: &'static str = "OPENAI_API_KEY";

    /// Read keys from the environment, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {err}");
        }
        Ok(Self {
            google_maps: required_var(Self::GOOGLE_MAPS_VAR)?,
            openai: required_var(Self::OPENAI_VAR)?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    let value = std::env::var(name).with_context(|| format!("{name} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() || value.starts_with("your_") {
        anyhow::bail!("{name} is empty or still a placeholder");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_color_to_rgba() {
        assert_eq!(ShapeColor::RED.to_rgba_u8(), [255, 0, 0, 255]);
        assert_eq!(ShapeColor::BLACK.to_rgba_u8(), [0, 0, 0, 255]);
        let over = ShapeColor {
            r: 1.5,
            g: -0.2,
            b: 0.5,
        };
        assert_eq!(over.to_rgba_u8()[..2], [255, 0]);
    }

    #[test]
    fn test_default_style_colors_differ() {
        let style = OverlayStyle::default();
        assert_ne!(style.boundary_color, style.marker_color);
        assert_ne!(style.marker_color, style.marker_outline_color);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SurveyConfig =
            serde_json::from_str(r#"{ "request_delay_ms": 500 }"#).unwrap();
        assert_eq!(config.request_delay_ms, 500);
        assert_eq!(config.render, RenderOptions::default());
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn test_partial_render_section_keeps_other_fields() {
        let config: SurveyConfig = serde_json::from_str(
            r#"{ "render": { "zoom": 19 }, "endpoints": { "openai_model": "gpt-4o" } }"#,
        )
        .unwrap();
        assert_eq!(config.render.zoom, 19);
        assert_eq!(config.render.image_size_px, 640);
        assert_eq!(config.render.format, OutputFormat::default());
        assert_eq!(config.endpoints.openai_model, "gpt-4o");
        assert_eq!(
            config.endpoints.cadastre_url,
            Endpoints::default().cadastre_url
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = SurveyConfig::default();
        config.render.zoom = 19;
        config.render.format = OutputFormat::Png;
        config.save(&path).unwrap();

        assert_eq!(SurveyConfig::load(Some(&path)), config);
    }

    #[test]
    fn test_load_invalid_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(SurveyConfig::load(Some(&path)), SurveyConfig::default());
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(json, r#"{"kind":"jpeg","quality":80}"#);
        let png: OutputFormat = serde_json::from_str(r#"{"kind":"png"}"#).unwrap();
        assert_eq!(png, OutputFormat::Png);
    }
}

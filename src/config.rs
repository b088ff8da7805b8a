// Configuration for paperlens
use crate::types::{PaperError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_LAYOUT_INPUT: u32 = 640;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_DPI: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resources_root: PathBuf,
    pub layout: LayoutConfig,
    pub raster: RasterConfig,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub model_path: PathBuf,
    pub input_size: u32,
    pub score_threshold: f32,
    pub iou_threshold: f32,
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub pdftoppm_binary: String,
    pub dpi: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract_binary: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources_root: PathBuf::from("./resources"),
            layout: LayoutConfig::default(),
            raster: RasterConfig::default(),
            ocr: OcrConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/publaynet_layout.onnx"),
            input_size: DEFAULT_LAYOUT_INPUT,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            intra_threads: 4,
        }
    }
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pdftoppm_binary: "pdftoppm".to_string(),
            dpi: DEFAULT_DPI,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_retries: 2,
            retry_base_delay_ms: 500,
        }
    }
}

impl Config {
    /// Explicit file, else `<config_dir>/paperlens/config.toml`, else defaults.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let mut config = match candidate {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PaperError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| PaperError::Config(e.to_string()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PAPERLENS_RESOURCES") {
            self.resources_root = v.into();
        }
        if let Some(v) = lookup("PAPERLENS_LAYOUT_MODEL") {
            self.layout.model_path = v.into();
        }
        if let Some(v) = lookup("PAPERLENS_LLM_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("PAPERLENS_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.layout.score_threshold) {
            return Err(PaperError::Config(format!(
                "layout.score_threshold must be within [0, 1], got {}",
                self.layout.score_threshold
            )));
        }
        if self.layout.input_size == 0 || self.layout.input_size % 32 != 0 {
            return Err(PaperError::Config(format!(
                "layout.input_size must be a positive multiple of 32, got {}",
                self.layout.input_size
            )));
        }
        if self.raster.dpi == 0 {
            return Err(PaperError::Config("raster.dpi must be positive".to_string()));
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperlens").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            resources_root = "/srv/papers"

            [layout]
            score_threshold = 0.7

            [llm]
            max_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.resources_root, PathBuf::from("/srv/papers"));
        assert_eq!(config.layout.score_threshold, 0.7);
        assert_eq!(config.layout.input_size, DEFAULT_LAYOUT_INPUT);
        assert_eq!(config.llm.max_retries, 5);
        assert_eq!(config.ocr.language, "eng");
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("PAPERLENS_RESOURCES", "/tmp/res"),
            ("OPENAI_API_KEY", "sk-test"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.resources_root, PathBuf::from("/tmp/res"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.model, LlmConfig::default().model);
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("secret".to_string());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let mut config = Config::default();
        config.layout.score_threshold = 1.5;
        assert!(matches!(config.validate(), Err(PaperError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(Config::from_toml("layout = 3"), Err(PaperError::Config(_))));
    }
}

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compliance::{AggregationMode, DEFAULT_KEYPOINT_CONFIDENCE};
use crate::debounce::DEFAULT_COOLDOWN;
use crate::ppe::{DemoOverrides, LabelVocabulary, PpeCategory};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_SNAPSHOT_DIR: &str = "violations";
/// Perception runs on every third frame.
const DEFAULT_INFERENCE_STRIDE: u32 = 3;
const DEFAULT_DETECTION_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    required_ppe: Option<Vec<String>>,
    cooldown_secs: Option<f64>,
    aggregation: Option<String>,
    inference: Option<InferenceConfigFile>,
    output: Option<OutputConfigFile>,
    labels: Option<BTreeMap<String, Vec<String>>>,
    overrides: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Deserialize, Default)]
struct InferenceConfigFile {
    stride: Option<u32>,
    keypoint_confidence: Option<f32>,
    detection_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    log_dir: Option<PathBuf>,
    snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub required_ppe: Vec<PpeCategory>,
    pub cooldown: Duration,
    pub aggregation: AggregationMode,
    pub inference: InferenceSettings,
    pub output: OutputSettings,
    pub vocabulary: LabelVocabulary,
    pub overrides: DemoOverrides,
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    /// Run perception on every `stride`-th frame; frames in between reuse it.
    pub stride: u32,
    /// Landmarks must score strictly above this to anchor a region.
    pub keypoint_confidence: f32,
    /// Detections below this are dropped before matching.
    pub detection_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub log_dir: PathBuf,
    pub snapshot_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            required_ppe: PpeCategory::ALL.to_vec(),
            cooldown: DEFAULT_COOLDOWN,
            aggregation: AggregationMode::default(),
            inference: InferenceSettings {
                stride: DEFAULT_INFERENCE_STRIDE,
                keypoint_confidence: DEFAULT_KEYPOINT_CONFIDENCE,
                detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            },
            output: OutputSettings {
                log_dir: PathBuf::from(DEFAULT_LOG_DIR),
                snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            },
            vocabulary: LabelVocabulary::default(),
            overrides: DemoOverrides::new(),
        }
    }
}

impl MonitorConfig {
    /// Loads from the file named by `PPE_CONFIG` (if any), then applies
    /// environment overrides and validates.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PPE_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => MonitorConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let required_ppe = match file.required_ppe {
            Some(items) => parse_categories(items.iter().map(String::as_str))?,
            None => defaults.required_ppe,
        };
        let cooldown = match file.cooldown_secs {
            Some(secs) => cooldown_from_secs(secs)?,
            None => defaults.cooldown,
        };
        let aggregation = match file.aggregation {
            Some(mode) => mode.parse()?,
            None => defaults.aggregation,
        };
        let inference = InferenceSettings {
            stride: file
                .inference
                .as_ref()
                .and_then(|inf| inf.stride)
                .unwrap_or(defaults.inference.stride),
            keypoint_confidence: file
                .inference
                .as_ref()
                .and_then(|inf| inf.keypoint_confidence)
                .unwrap_or(defaults.inference.keypoint_confidence),
            detection_confidence: file
                .inference
                .as_ref()
                .and_then(|inf| inf.detection_confidence)
                .unwrap_or(defaults.inference.detection_confidence),
        };
        let output = OutputSettings {
            log_dir: file
                .output
                .as_ref()
                .and_then(|out| out.log_dir.clone())
                .unwrap_or(defaults.output.log_dir),
            snapshot_dir: file
                .output
                .and_then(|out| out.snapshot_dir)
                .unwrap_or(defaults.output.snapshot_dir),
        };
        let mut vocabulary = defaults.vocabulary;
        for (name, keywords) in file.labels.unwrap_or_default() {
            vocabulary.extend(name.parse()?, keywords);
        }
        let mut overrides = defaults.overrides;
        for (name, forced) in file.overrides.unwrap_or_default() {
            overrides.set(name.parse()?, forced);
        }
        Ok(Self {
            required_ppe,
            cooldown,
            aggregation,
            inference,
            output,
            vocabulary,
            overrides,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(required) = std::env::var("PPE_REQUIRED") {
            if !required.trim().is_empty() {
                self.required_ppe = parse_categories(split_csv(&required).iter().map(String::as_str))?;
            }
        }
        if let Ok(cooldown) = std::env::var("PPE_COOLDOWN_SECS") {
            let secs: f64 = cooldown
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_COOLDOWN_SECS must be a number of seconds"))?;
            self.cooldown = cooldown_from_secs(secs)?;
        }
        if let Ok(stride) = std::env::var("PPE_INFERENCE_STRIDE") {
            self.inference.stride = stride
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_INFERENCE_STRIDE must be a positive integer"))?;
        }
        if let Ok(dir) = std::env::var("PPE_LOG_DIR") {
            if !dir.trim().is_empty() {
                self.output.log_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = std::env::var("PPE_SNAPSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.output.snapshot_dir = PathBuf::from(dir);
            }
        }
        if let Ok(mode) = std::env::var("PPE_AGGREGATION") {
            if !mode.trim().is_empty() {
                self.aggregation = mode.parse()?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.required_ppe.is_empty() {
            return Err(anyhow!("required_ppe must list at least one category"));
        }
        let unique: BTreeSet<_> = self.required_ppe.iter().collect();
        if unique.len() != self.required_ppe.len() {
            return Err(anyhow!("required_ppe contains duplicate categories"));
        }
        if self.inference.stride == 0 {
            return Err(anyhow!("inference stride must be at least 1"));
        }
        for (name, value) in [
            ("keypoint_confidence", self.inference.keypoint_confidence),
            ("detection_confidence", self.inference.detection_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within 0..=1, got {}", name, value));
            }
        }
        self.vocabulary.validate()
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn cooldown_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(anyhow!("cooldown must be a non-negative number of seconds"));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn parse_categories<'a>(items: impl Iterator<Item = &'a str>) -> Result<Vec<PpeCategory>> {
    items.map(str::parse).collect()
}

pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

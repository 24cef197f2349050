use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;

const DEFAULT_TARGET_FPS: f64 = 30.0;
const DEFAULT_MIN_AREA: f64 = 800.0;
const DEFAULT_ROI_EXPAND: u32 = 25;
const DEFAULT_DIFF_THRESHOLD: f32 = 25.0;
const DEFAULT_BLOCK_SIZE: u32 = 16;
const DEFAULT_INACTIVITY_TIMEOUT: f64 = 2.0;
const DEFAULT_MIN_EVENT_DURATION: f64 = 0.5;
const DEFAULT_DETECT_STRIDE: u64 = 5;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_ROI_PADDING: u32 = 10;
const DEFAULT_CLIPS_DIR: &str = "outputs/events";
const DEFAULT_METADATA_PATH: &str = "outputs/metadata/events.json";

#[derive(Debug, Deserialize, Default)]
struct ClipwatchConfigFile {
    input: Option<InputConfigFile>,
    motion: Option<MotionConfigFile>,
    events: Option<EventsConfigFile>,
    detect: Option<DetectConfigFile>,
    output: Option<OutputConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct InputConfigFile {
    path: Option<String>,
    target_fps: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct MotionConfigFile {
    min_area: Option<f64>,
    roi_expand: Option<u32>,
    diff_threshold: Option<f32>,
    block_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct EventsConfigFile {
    inactivity_timeout: Option<f64>,
    min_event_duration: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectConfigFile {
    enabled: Option<bool>,
    backend: Option<String>,
    stride: Option<u64>,
    confidence_threshold: Option<f32>,
    roi_padding: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    clips_dir: Option<PathBuf>,
    metadata_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ClipwatchConfig {
    pub input: InputSettings,
    pub motion: MotionSettings,
    pub events: EventSettings,
    pub detect: DetectSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone)]
pub struct InputSettings {
    pub path: String,
    pub target_fps: f64,
}

#[derive(Debug, Clone)]
pub struct MotionSettings {
    pub min_area: f64,
    pub roi_expand: u32,
    pub diff_threshold: f32,
    pub block_size: u32,
}

#[derive(Debug, Clone)]
pub struct EventSettings {
    pub inactivity_timeout: f64,
    pub min_event_duration: f64,
}

#[derive(Debug, Clone)]
pub struct DetectSettings {
    pub enabled: bool,
    /// Backend name; empty selects the registry default.
    pub backend: String,
    pub stride: u64,
    pub confidence_threshold: f32,
    pub roi_padding: u32,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub clips_dir: PathBuf,
    pub metadata_path: PathBuf,
}

impl ClipwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CLIPWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ClipwatchConfigFile) -> Self {
        let input = InputSettings {
            path: file
                .input
                .as_ref()
                .and_then(|input| input.path.clone())
                .unwrap_or_default(),
            target_fps: file
                .input
                .and_then(|input| input.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let motion = MotionSettings {
            min_area: file
                .motion
                .as_ref()
                .and_then(|motion| motion.min_area)
                .unwrap_or(DEFAULT_MIN_AREA),
            roi_expand: file
                .motion
                .as_ref()
                .and_then(|motion| motion.roi_expand)
                .unwrap_or(DEFAULT_ROI_EXPAND),
            diff_threshold: file
                .motion
                .as_ref()
                .and_then(|motion| motion.diff_threshold)
                .unwrap_or(DEFAULT_DIFF_THRESHOLD),
            block_size: file
                .motion
                .and_then(|motion| motion.block_size)
                .unwrap_or(DEFAULT_BLOCK_SIZE),
        };
        let events = EventSettings {
            inactivity_timeout: file
                .events
                .as_ref()
                .and_then(|events| events.inactivity_timeout)
                .unwrap_or(DEFAULT_INACTIVITY_TIMEOUT),
            min_event_duration: file
                .events
                .and_then(|events| events.min_event_duration)
                .unwrap_or(DEFAULT_MIN_EVENT_DURATION),
        };
        let detect = DetectSettings {
            enabled: file
                .detect
                .as_ref()
                .and_then(|detect| detect.enabled)
                .unwrap_or(false),
            backend: file
                .detect
                .as_ref()
                .and_then(|detect| detect.backend.clone())
                .unwrap_or_default(),
            stride: file
                .detect
                .as_ref()
                .and_then(|detect| detect.stride)
                .unwrap_or(DEFAULT_DETECT_STRIDE),
            confidence_threshold: file
                .detect
                .as_ref()
                .and_then(|detect| detect.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            roi_padding: file
                .detect
                .and_then(|detect| detect.roi_padding)
                .unwrap_or(DEFAULT_ROI_PADDING),
        };
        let output = OutputSettings {
            clips_dir: file
                .output
                .as_ref()
                .and_then(|output| output.clips_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIPS_DIR)),
            metadata_path: file
                .output
                .and_then(|output| output.metadata_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_PATH)),
        };
        Self {
            input,
            motion,
            events,
            detect,
            output,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("CLIPWATCH_INPUT") {
            if !path.trim().is_empty() {
                self.input.path = path;
            }
        }
        if let Ok(fps) = std::env::var("CLIPWATCH_TARGET_FPS") {
            self.input.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("CLIPWATCH_TARGET_FPS must be a number"))?;
        }
        if let Ok(enabled) = std::env::var("CLIPWATCH_DETECT") {
            self.detect.enabled = match enabled.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => return Err(anyhow!("CLIPWATCH_DETECT must be a boolean, got '{other}'")),
            };
        }
        if let Ok(stride) = std::env::var("CLIPWATCH_DETECT_STRIDE") {
            self.detect.stride = stride
                .parse()
                .map_err(|_| anyhow!("CLIPWATCH_DETECT_STRIDE must be an integer"))?;
        }
        if let Ok(dir) = std::env::var("CLIPWATCH_CLIPS_DIR") {
            if !dir.trim().is_empty() {
                self.output.clips_dir = PathBuf::from(dir);
            }
        }
        if let Ok(path) = std::env::var("CLIPWATCH_METADATA_PATH") {
            if !path.trim().is_empty() {
                self.output.metadata_path = PathBuf::from(path);
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.input.target_fps <= 0.0 {
            return Err(anyhow!("input.target_fps must be greater than zero"));
        }
        if self.motion.min_area < 0.0 {
            return Err(anyhow!("motion.min_area must not be negative"));
        }
        if self.motion.block_size == 0 {
            return Err(anyhow!("motion.block_size must be at least 1"));
        }
        if self.events.inactivity_timeout <= 0.0 {
            return Err(anyhow!("events.inactivity_timeout must be greater than zero"));
        }
        if self.events.min_event_duration < 0.0 {
            return Err(anyhow!("events.min_event_duration must not be negative"));
        }
        if self.detect.stride == 0 {
            return Err(anyhow!("detect.stride must be at least 1"));
        }
        if self.output.clips_dir.as_os_str().is_empty() {
            return Err(anyhow!("output.clips_dir must not be empty"));
        }
        if self.output.metadata_path.as_os_str().is_empty() {
            return Err(anyhow!("output.metadata_path must not be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ClipwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

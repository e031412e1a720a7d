use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub piano_roll: PianoRollConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: u32,
    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct PianoRollConfig {
    #[serde(default)]
    pub zoom: i32,
    #[serde(default)]
    pub thin_notes: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverlayConfig {
    pub font: Option<PathBuf>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            audio_bitrate: default_audio_bitrate(),
            video_bitrate: default_video_bitrate(),
        }
    }
}

fn default_executable() -> PathBuf { PathBuf::from("ffmpeg") }
fn default_audio_bitrate() -> u32 { 128 }
fn default_video_bitrate() -> u32 { 10 }

/// Explicit path, then `./chipreel.toml`, then the user config locations.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("chipreel.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("chipreel").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("chipreel").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Invalid config {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [encoder]
            video_bitrate = 20

            [piano_roll]
            thin_notes = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.encoder.video_bitrate, 20);
        assert_eq!(cfg.encoder.audio_bitrate, 128);
        assert_eq!(cfg.encoder.executable, PathBuf::from("ffmpeg"));
        assert!(cfg.piano_roll.thin_notes);
        assert_eq!(cfg.piano_roll.zoom, 0);
        assert!(cfg.overlay.font.is_none());
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[overlay]\nfont = \"a.ttf\"\n").unwrap();

        assert_eq!(find_config(Some(&path)), Some(path.clone()));
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.overlay.font, Some(PathBuf::from("a.ttf")));
    }

    #[test]
    fn unreadable_config_is_none() {
        assert!(load_config(Path::new("/nonexistent/chipreel.toml")).is_none());
    }
}

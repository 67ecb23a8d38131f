//! Configuration and data directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Rendering resolution for page images, in DPI.
pub const DEFAULT_RENDER_DPI: u32 = 150;

/// Settings resolved from the config file, environment and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the data tree (pdfs/, images/, zips/ and the database).
    pub data_dir: PathBuf,

    /// Resolution used when rasterizing PDF pages.
    #[serde(default = "default_dpi")]
    pub render_dpi: u32,
}

fn default_dpi() -> u32 {
    DEFAULT_RENDER_DPI
}

impl Settings {
    /// Build settings for a data directory, merging an optional
    /// `vsarchiv.toml` found inside it.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let config_path = data_dir.join("vsarchiv.toml");
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            let mut settings: Settings = toml::from_str(&raw)?;
            // The directory the config lives in always wins over the
            // value stored inside the file.
            settings.data_dir = data_dir.to_path_buf();
            Ok(settings)
        } else {
            Ok(Self {
                data_dir: data_dir.to_path_buf(),
                render_dpi: DEFAULT_RENDER_DPI,
            })
        }
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.data_dir.join("pdfs")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn zip_dir(&self) -> PathBuf {
        self.data_dir.join("zips")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("vsarchiv.db")
    }

    /// Create the data directory tree if it does not exist yet.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.pdf_dir())?;
        fs::create_dir_all(self.images_dir())?;
        fs::create_dir_all(self.zip_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.data_dir, dir.path());
        assert_eq!(settings.render_dpi, DEFAULT_RENDER_DPI);
    }

    #[test]
    fn test_load_merges_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vsarchiv.toml"),
            "data_dir = \"/somewhere/else\"\nrender_dpi = 200\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.render_dpi, 200);
        // data_dir from the file is ignored in favor of the actual location
        assert_eq!(settings.data_dir, dir.path());
    }
}

use crate::error::{DetectionHistoryError, Result};
use chrono::format::{Item, StrftimeItems};
use detection_history_common::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 履歴ファイルの保存先（未指定ならデータディレクトリ）
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
    /// `DetectionRecord.date` のchronoフォーマット
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.into(),
            date_format: "%Y/%m/%d %H:%M:%S".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// chronoが解釈できない日時フォーマットを弾く
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(DetectionHistoryError::Config(format!(
                "日時フォーマットが不正です: {}",
                self.date_format
            )));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| DetectionHistoryError::Config("設定ディレクトリが見つかりません".into()))?;
        Ok(dir.join("detection-history").join("config.json"))
    }

    /// 実際に使う保存先ディレクトリ
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        let base = dirs::data_dir()
            .ok_or_else(|| DetectionHistoryError::Config("データディレクトリが見つかりません".into()))?;
        Ok(base.join("detection-history"))
    }
}

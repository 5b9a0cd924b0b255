//! サーバー設定ストア（JSON永続化）
//!
//! サーバー（ギルド）ごとに価格表チャンネル・注文パネルチャンネル・
//! 請求書Webhook URLを保持する。保存は毎回ファイル全体を書き直す
//! 方式で、同時書き込みは後勝ちになる（管理者の/setupは低頻度なので
//! 許容している）。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// 設定ファイル名
pub const SETTINGS_FILE: &str = "server_settings.json";

/// サーバー設定ストアのエラー型
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// 1サーバー分の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    /// 価格表を投稿するチャンネルID
    pub menu_channel: u64,
    /// 注文パネルを投稿するチャンネルID
    pub job_channel: u64,
    /// 請求書を転送するWebhook URL
    pub webhook: String,
}

/// サーバー設定ストア
///
/// ファイル上の形式は「ギルドID文字列 → 設定」のフラットなオブジェクト。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerSettingsStore {
    guilds: HashMap<String, GuildSettings>,
}

impl ServerSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルパスを生成
    fn get_file_path(base_dir: &str) -> PathBuf {
        Path::new(base_dir).join(SETTINGS_FILE)
    }

    /// JSONファイルから読み込み
    ///
    /// ファイルが存在しない場合は空のストアを返す。
    pub async fn load(base_dir: &str) -> Result<Self, SettingsError> {
        let path = Self::get_file_path(base_dir);
        debug!("Loading server settings from {:?}", path);

        if !path.exists() {
            info!("Settings file not found, creating new store");
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| SettingsError::StorageError(format!("Failed to read file: {}", e)))?;

        let store: Self = serde_json::from_str(&content)
            .map_err(|e| SettingsError::StorageError(format!("Failed to parse JSON: {}", e)))?;

        info!("Loaded settings for {} servers", store.len());
        Ok(store)
    }

    /// JSONファイルに保存（ファイル全体を書き直す）
    pub async fn save(&self, base_dir: &str) -> Result<(), SettingsError> {
        let path = Self::get_file_path(base_dir);
        debug!("Saving server settings to {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    SettingsError::StorageError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::StorageError(format!("Failed to serialize: {}", e)))?;

        fs::write(&path, content)
            .await
            .map_err(|e| SettingsError::StorageError(format!("Failed to write file: {}", e)))?;

        info!("Saved settings for {} servers", self.len());
        Ok(())
    }

    /// サーバーの設定を取得
    pub fn get(&self, guild_id: u64) -> Option<&GuildSettings> {
        self.guilds.get(&guild_id.to_string())
    }

    /// サーバーの設定を上書き保存（既存レコードは丸ごと置き換え）
    pub fn set(&mut self, guild_id: u64, settings: GuildSettings) {
        self.guilds.insert(guild_id.to_string(), settings);
    }

    /// 設定済みサーバー数
    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    /// ストアが空かどうか
    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(menu: u64) -> GuildSettings {
        GuildSettings {
            menu_channel: menu,
            job_channel: menu + 1,
            webhook: format!("https://discord.com/api/webhooks/{}/token", menu),
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut store = ServerSettingsStore::new();
        store.set(111, sample(10));

        assert_eq!(store.get(111), Some(&sample(10)));
        assert!(store.get(222).is_none());
    }

    #[test]
    fn test_overwrite_leaves_other_guilds_untouched() {
        let mut store = ServerSettingsStore::new();
        store.set(111, sample(10));
        store.set(222, sample(20));

        // 同じサーバーの再設定はレコード丸ごと置き換え
        store.set(111, sample(99));

        assert_eq!(store.get(111), Some(&sample(99)));
        assert_eq!(store.get(222), Some(&sample(20)));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = ServerSettingsStore::load(dir.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let base_dir = dir.path().to_str().unwrap();

        let mut store = ServerSettingsStore::new();
        store.set(111, sample(10));
        store.set(222, sample(20));
        store.save(base_dir).await.unwrap();

        let loaded = ServerSettingsStore::load(base_dir).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(111), Some(&sample(10)));
        assert_eq!(loaded.get(222), Some(&sample(20)));
    }

    #[tokio::test]
    async fn test_file_format_is_flat_object() {
        let dir = tempdir().unwrap();
        let base_dir = dir.path().to_str().unwrap();

        let mut store = ServerSettingsStore::new();
        store.set(111, sample(10));
        store.save(base_dir).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        // ギルドIDの文字列キーが最上位に来るフラットな形式
        assert!(value.get("111").is_some());
        assert_eq!(
            value["111"]["menu_channel"],
            serde_json::Value::from(10u64)
        );
    }
}

//! 料金カタログストア（JSON読み込み）
//!
//! `prices.json` を読み込んで商品ごとの価格と販売可否を保持する。
//! 値が非負整数でないエントリは「在庫なし・価格0」に降格する。
//! 書き込みAPIはなく、カタログの変更はファイル編集＋再読み込みで行う。

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// カタログファイル名
pub const PRICES_FILE: &str = "prices.json";

/// 価格表に別枠で表示するカテゴリ
pub const UPGRADES_CATEGORY: &str = "Upgrades";

/// カテゴリ定義（表示順もここで固定）
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Repair Jobs",
        &[
            "Full Repair",
            "HG Full Repair",
            "Repair Kit",
            "Advanced Repair Kit",
        ],
    ),
    ("Lockpick Tools", &["LockPick", "Advanced Lockpick"]),
    ("Performance Parts", &["Racing Harness", "NOS"]),
    ("Communication", &["Long Range Radio"]),
    ("Cosmetics", &["Fantastic Wax"]),
    (
        "Upgrades",
        &[
            "Engine 1",
            "Engine 2",
            "Engine 3",
            "Suspension 1",
            "Suspension 2",
            "Suspension 3",
            "Transmission 1",
            "Transmission 2",
            "Transmission 3",
            "Brakes 1",
            "Brakes 2",
            "Brakes 3",
            "Turbo",
            "Upgrade Package",
        ],
    ),
];

/// 注文パネルのカテゴリ選択に出すカテゴリと絵文字
pub const PANEL_CATEGORIES: &[(&str, char)] = &[
    ("Repair Jobs", '🔧'),
    ("Lockpick Tools", '🛠'),
    ("Upgrades", '🚗'),
    ("Performance Parts", '🏁'),
];

/// カタログストアのエラー型
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// カタログの1商品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    /// 単価。販売不可の場合は0
    pub unit_price: u64,
    /// 価格値が非負整数だった場合のみtrue
    pub available: bool,
}

/// 料金カタログ（読み込み後は不変のスナップショット）
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, CatalogItem>,
}

impl Catalog {
    /// 生のJSON値からカタログを構築
    ///
    /// 非負整数の値は「販売可・その価格」、それ以外の値は
    /// 「販売不可・価格0」として取り込む。オブジェクト以外が
    /// 渡された場合は空のカタログになる。
    pub fn from_value(value: &Value) -> Self {
        let mut items = HashMap::new();

        if let Some(object) = value.as_object() {
            for (name, raw) in object {
                let item = match raw.as_u64() {
                    Some(price) => CatalogItem {
                        name: name.clone(),
                        unit_price: price,
                        available: true,
                    },
                    None => CatalogItem {
                        name: name.clone(),
                        unit_price: 0,
                        available: false,
                    },
                };
                items.insert(name.clone(), item);
            }
        }

        Self { items }
    }

    /// ファイルパスを生成
    fn get_file_path(base_dir: &str) -> PathBuf {
        Path::new(base_dir).join(PRICES_FILE)
    }

    /// JSONファイルから読み込み
    ///
    /// ファイルが存在しない場合は空のカタログを返す（エラーにはしない）。
    pub async fn load(base_dir: &str) -> Result<Self, CatalogError> {
        let path = Self::get_file_path(base_dir);
        debug!("Loading catalog from {:?}", path);

        if !path.exists() {
            info!("Catalog file not found, starting with an empty catalog");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| CatalogError::StorageError(format!("Failed to read file: {}", e)))?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| CatalogError::StorageError(format!("Failed to parse JSON: {}", e)))?;

        let catalog = Self::from_value(&value);
        info!("Loaded catalog with {} items", catalog.len());
        Ok(catalog)
    }

    /// 商品が販売可能かどうか
    pub fn is_available(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|item| item.available)
    }

    /// 商品の単価を取得（カタログにない商品はNone）
    pub fn price_of(&self, name: &str) -> Option<u64> {
        self.items.get(name).map(|item| item.unit_price)
    }

    /// 商品を取得
    pub fn get(&self, name: &str) -> Option<&CatalogItem> {
        self.items.get(name)
    }

    /// カテゴリ内の商品をカテゴリ定義順で取得
    ///
    /// カタログファイルに載っていない商品は「販売不可・価格0」として返す。
    pub fn items_in_category(&self, category: &str) -> Vec<CatalogItem> {
        let Some(names) = category_items(category) else {
            return Vec::new();
        };

        names
            .iter()
            .map(|name| {
                self.items.get(*name).cloned().unwrap_or(CatalogItem {
                    name: (*name).to_string(),
                    unit_price: 0,
                    available: false,
                })
            })
            .collect()
    }

    /// カテゴリ内の販売可能な商品のみ取得
    pub fn available_items_in_category(&self, category: &str) -> Vec<CatalogItem> {
        self.items_in_category(category)
            .into_iter()
            .filter(|item| item.available)
            .collect()
    }

    /// カタログの商品数
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// カタログが空かどうか
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 全カテゴリ名を定義順で取得
pub fn category_names() -> Vec<&'static str> {
    CATEGORIES.iter().map(|(name, _)| *name).collect()
}

/// カテゴリの商品名リストを取得
pub fn category_items(category: &str) -> Option<&'static [&'static str]> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, items)| *items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_from_value_availability() {
        let catalog = Catalog::from_value(&json!({
            "Full Repair": 500,
            "NOS": 300,
            "LockPick": "soon",
            "Repair Kit": -5,
            "Fantastic Wax": null,
            "Turbo": 0,
        }));

        assert!(catalog.is_available("Full Repair"));
        assert_eq!(catalog.price_of("Full Repair"), Some(500));

        // 非整数・負数・nullはすべて「販売不可・価格0」
        assert!(!catalog.is_available("LockPick"));
        assert_eq!(catalog.price_of("LockPick"), Some(0));
        assert!(!catalog.is_available("Repair Kit"));
        assert_eq!(catalog.price_of("Repair Kit"), Some(0));
        assert!(!catalog.is_available("Fantastic Wax"));

        // 0は非負整数なので販売可能
        assert!(catalog.is_available("Turbo"));
        assert_eq!(catalog.price_of("Turbo"), Some(0));
    }

    #[test]
    fn test_unknown_item() {
        let catalog = Catalog::from_value(&json!({"NOS": 300}));
        assert!(!catalog.is_available("Long Range Radio"));
        assert_eq!(catalog.price_of("Long Range Radio"), None);
    }

    #[test]
    fn test_from_value_non_object() {
        let catalog = Catalog::from_value(&json!([1, 2, 3]));
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::load(dir.path().to_str().unwrap()).await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PRICES_FILE);
        std::fs::write(&path, r#"{"Full Repair": 500, "NOS": "n/a"}"#).unwrap();

        let catalog = Catalog::load(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.is_available("Full Repair"));
        assert!(!catalog.is_available("NOS"));
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PRICES_FILE);
        std::fs::write(&path, "not json").unwrap();

        let result = Catalog::load(dir.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(CatalogError::StorageError(_))));
    }

    #[test]
    fn test_items_in_category_order() {
        let catalog = Catalog::from_value(&json!({
            "Repair Kit": 100,
            "Full Repair": 500,
        }));

        let items = catalog.items_in_category("Repair Jobs");
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        // カテゴリ定義順。ファイルにない商品は販売不可として現れる
        assert_eq!(
            names,
            vec![
                "Full Repair",
                "HG Full Repair",
                "Repair Kit",
                "Advanced Repair Kit"
            ]
        );
        assert!(!items[1].available);
    }

    #[test]
    fn test_available_items_in_category() {
        let catalog = Catalog::from_value(&json!({
            "LockPick": 250,
            "Advanced Lockpick": "out",
        }));

        let items = catalog.available_items_in_category("Lockpick Tools");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "LockPick");
    }

    #[test]
    fn test_unknown_category() {
        let catalog = Catalog::from_value(&json!({"NOS": 300}));
        assert!(catalog.items_in_category("Paint Jobs").is_empty());
        assert!(category_items("Paint Jobs").is_none());
    }

    #[test]
    fn test_category_table() {
        let names = category_names();
        assert!(names.contains(&"Repair Jobs"));
        assert!(names.contains(&UPGRADES_CATEGORY));
        assert_eq!(category_items("Communication"), Some(&["Long Range Radio"][..]));
    }
}

//! 注文セッション管理
//!
//! 注文ウィザード1回分の状態（選択中の商品と数量）をフローIDで
//! 管理する。セッションはチェックアウト完了で削除され、放置された
//! ものは一定時間後にスイープされる。

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// 放置された注文フローの有効期限
pub const FLOW_TIMEOUT: Duration = Duration::from_secs(180);

/// 商品の複数選択メニューに出せる上限（プラットフォーム制限）
pub const MAX_SELECTED_ITEMS: usize = 25;

/// 数量編集モーダルに出せる入力欄の上限（プラットフォーム制限）
pub const MAX_QUANTITY_EDIT_ITEMS: usize = 5;

/// フローを先に進められない理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRejection {
    /// カートが空のままチェックアウトしようとした
    EmptyCart,
    /// 何も選択せずに数量編集を開こうとした
    NothingSelected,
    /// 数量編集の上限（5件）を超えて選択している
    TooManySelected,
}

/// 注文セッション（1フロー分）
#[derive(Debug, Clone)]
pub struct OrderSession {
    pub id: Uuid,
    pub guild_id: u64,
    pub user_id: u64,
    pub category: String,
    /// 商品名 → 数量（常に1以上）
    ///
    /// 選択を外しても数量は消さない。再選択時に前回の数量が
    /// 復元されるのは意図した挙動。
    quantities: BTreeMap<String, u32>,
    /// メニューで現在選択されている商品
    selected: Vec<String>,
    pub created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl OrderSession {
    pub fn new(guild_id: u64, user_id: u64, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            guild_id,
            user_id,
            category: category.into(),
            quantities: BTreeMap::new(),
            selected: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// 最終活動時刻を更新
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// タイムアウトしたかどうか
    pub fn is_expired(&self, timeout: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.last_active)
            .to_std()
            .unwrap_or(Duration::ZERO);
        elapsed > timeout
    }

    /// メニューの選択状態を反映
    ///
    /// 新しく選択された商品は数量1で登録する。既に数量が入っている
    /// 商品はそのまま維持する。
    pub fn select_items(&mut self, items: Vec<String>) {
        for item in &items {
            self.quantities.entry(item.clone()).or_insert(1);
        }
        self.selected = items;
    }

    /// 現在選択されている商品
    pub fn selected_items(&self) -> &[String] {
        &self.selected
    }

    /// 数量編集の入力を1件適用
    ///
    /// 整数として解釈できない入力は無視して前の値を残す。
    /// 1未満は1に切り上げる。
    pub fn apply_quantity_input(&mut self, item: &str, raw: &str) {
        if let Ok(quantity) = raw.trim().parse::<i64>() {
            let clamped = quantity.max(1) as u32;
            self.quantities.insert(item.to_string(), clamped);
        }
    }

    /// 商品の数量を取得
    pub fn quantity(&self, item: &str) -> Option<u32> {
        self.quantities.get(item).copied()
    }

    /// 全数量（商品名順）
    pub fn quantities(&self) -> &BTreeMap<String, u32> {
        &self.quantities
    }

    /// カートが空かどうか
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// 数量編集に進めるか確認（選択数1〜5のときのみ可）
    pub fn check_quantity_edit(&self) -> Result<(), FlowRejection> {
        match self.selected.len() {
            0 => Err(FlowRejection::NothingSelected),
            n if n > MAX_QUANTITY_EDIT_ITEMS => Err(FlowRejection::TooManySelected),
            _ => Ok(()),
        }
    }

    /// チェックアウトに進めるか確認
    pub fn check_checkout(&self) -> Result<(), FlowRejection> {
        if self.quantities.is_empty() {
            Err(FlowRejection::EmptyCart)
        } else {
            Ok(())
        }
    }
}

/// 注文セッションマネージャー
#[derive(Debug)]
pub struct OrderSessionManager {
    sessions: HashMap<Uuid, OrderSession>,
    timeout: Duration,
}

impl OrderSessionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            timeout,
        }
    }

    /// 新しいフローを開始してIDを返す
    pub fn create(&mut self, guild_id: u64, user_id: u64, category: &str) -> Uuid {
        let session = OrderSession::new(guild_id, user_id, category);
        let id = session.id;
        info!(
            "Starting order flow {} for user {} (category {:?})",
            id, user_id, category
        );
        self.sessions.insert(id, session);
        id
    }

    /// フローを可変参照で取得（期限切れは取得と同時に削除）
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut OrderSession> {
        let expired = self
            .sessions
            .get(id)
            .is_some_and(|s| s.is_expired(self.timeout));
        if expired {
            self.sessions.remove(id);
            debug!("Order flow {} had expired on access", id);
            return None;
        }
        self.sessions.get_mut(id)
    }

    /// フローを取り出して削除（チェックアウト完了時）
    pub fn take(&mut self, id: &Uuid) -> Option<OrderSession> {
        let session = self.sessions.remove(id)?;
        if session.is_expired(self.timeout) {
            debug!("Order flow {} had expired on checkout", id);
            return None;
        }
        Some(session)
    }

    /// 期限切れフローを削除
    pub fn cleanup_expired(&mut self) -> usize {
        let timeout = self.timeout;
        let expired_ids: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_expired(timeout))
            .map(|(id, _)| *id)
            .collect();

        let count = expired_ids.len();
        for id in expired_ids {
            self.sessions.remove(&id);
            debug!("Removed expired order flow {}", id);
        }

        if count > 0 {
            info!("Cleaned up {} expired order flows", count);
        }
        count
    }

    /// アクティブなフロー数
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// フローが1つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for OrderSessionManager {
    fn default() -> Self {
        Self::new(FLOW_TIMEOUT)
    }
}

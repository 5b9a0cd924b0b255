//! イベントハンドラー
//!
//! 共有状態（カタログ・サーバー設定・注文セッション）をスナップショット
//! として各インタラクションに渡す。グローバル変数は持たない。

use crate::catalog::Catalog;
use crate::commands;
use crate::interactions;
use crate::order::OrderSessionManager;
use crate::server_settings::ServerSettingsStore;
use serenity::model::application::{CommandInteraction, Interaction};
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

pub struct Handler {
    /// 料金カタログ（/admin reloadで入れ替わる）
    pub catalog: Arc<RwLock<Catalog>>,
    /// サーバーごとの設定
    pub settings: Arc<RwLock<ServerSettingsStore>>,
    /// 進行中の注文フロー
    pub orders: Arc<Mutex<OrderSessionManager>>,
    /// 永続化ファイルのベースディレクトリ
    pub data_dir: String,
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        // Slash Commandsを登録
        commands::register_global_commands(&ctx).await;
        info!("Slash commands registered");
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                self.handle_slash_command(&ctx, &command).await;
            }
            Interaction::Component(component) => {
                interactions::handle_component(&ctx, &component, self).await;
            }
            Interaction::Modal(modal) => {
                interactions::handle_modal(&ctx, &modal, self).await;
            }
            _ => {}
        }
    }
}

impl Handler {
    /// Slash Commandを処理
    async fn handle_slash_command(&self, ctx: &Context, command: &CommandInteraction) {
        match command.data.name.as_str() {
            "admin" => commands::admin::run(ctx, command, self).await,
            "setup" => commands::setup::run(ctx, command, self).await,
            _ => commands::respond_ephemeral(ctx, command, "Unknown command.").await,
        }
    }
}

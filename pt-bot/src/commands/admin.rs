//! /admin - 管理者Slash Command

use crate::catalog::Catalog;
use crate::handler::Handler;
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::{CommandInteraction, CommandOptionType};
use serenity::model::Permissions;
use serenity::prelude::*;
use tracing::{error, info};

/// /admin コマンドの定義
pub fn register() -> CreateCommand {
    CreateCommand::new("admin")
        .description("Bot administration")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "status",
            "Show bot status",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "reload",
            "Reload the price catalog from disk",
        ))
}

/// /admin コマンドの実行
pub async fn run(ctx: &Context, command: &CommandInteraction, handler: &Handler) {
    if !super::is_admin(command) {
        super::respond_ephemeral(
            ctx,
            command,
            "This command requires the Administrator permission.",
        )
        .await;
        return;
    }

    let Some(subcommand) = command.data.options.first() else {
        super::respond_ephemeral(ctx, command, "Missing subcommand.").await;
        return;
    };

    let response = match subcommand.name.as_str() {
        "status" => handle_status(handler).await,
        "reload" => handle_reload(handler).await,
        _ => "Unknown subcommand.".to_string(),
    };

    super::respond_ephemeral(ctx, command, &response).await;
}

/// /admin status の処理
async fn handle_status(handler: &Handler) -> String {
    let catalog_items = handler.catalog.read().await.len();
    let active_flows = handler.orders.lock().await.len();
    let configured_servers = handler.settings.read().await.len();

    format!(
        "**Status**\n\
        - Catalog items: {}\n\
        - Active order flows: {}\n\
        - Configured servers: {}",
        catalog_items, active_flows, configured_servers
    )
}

/// /admin reload の処理
///
/// prices.jsonを読み直してカタログスナップショットを入れ替える。
/// 以降のインタラクションは新しい価格を参照する。
async fn handle_reload(handler: &Handler) -> String {
    match Catalog::load(&handler.data_dir).await {
        Ok(catalog) => {
            let count = catalog.len();
            *handler.catalog.write().await = catalog;
            info!("Catalog reloaded ({} items)", count);
            format!("Catalog reloaded ({} items).", count)
        }
        Err(e) => {
            error!("Failed to reload catalog: {}", e);
            format!("Catalog reload failed: {}", e)
        }
    }
}

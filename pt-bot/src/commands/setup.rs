//! /setup - 価格表と注文パネルの設置コマンド
//!
//! サーバー設定（チャンネルとWebhook URL）を保存してから、価格表
//! チャンネルに料金一覧を、注文チャンネルにダッシュボードパネルを
//! 投稿する。Webhook URLの到達性はここでは検証しない。配送に失敗
//! した場合は通知時にログへ出るだけになる。

use crate::handler::Handler;
use crate::server_settings::GuildSettings;
use crate::ui;
use serenity::builder::{CreateCommand, CreateCommandOption, CreateMessage};
use serenity::model::application::{CommandInteraction, CommandOptionType};
use serenity::model::id::ChannelId;
use serenity::model::Permissions;
use serenity::prelude::*;
use tracing::{error, info};

/// /setup コマンドの定義
pub fn register() -> CreateCommand {
    CreateCommand::new("setup")
        .description("Deploy the price menu and order panel")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Channel,
                "menu_channel",
                "Where to post prices",
            )
            .required(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Channel,
                "job_channel",
                "Where to post the order dashboard",
            )
            .required(true),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "webhook", "Log Webhook URL")
                .required(true),
        )
}

/// /setup コマンドの実行
pub async fn run(ctx: &Context, command: &CommandInteraction, handler: &Handler) {
    let Some(guild_id) = command.guild_id else {
        super::respond_ephemeral(ctx, command, "This command can only be used in a server.").await;
        return;
    };

    if !super::is_admin(command) {
        super::respond_ephemeral(
            ctx,
            command,
            "This command requires the Administrator permission.",
        )
        .await;
        return;
    }

    let mut menu_channel: Option<ChannelId> = None;
    let mut job_channel: Option<ChannelId> = None;
    let mut webhook: Option<String> = None;

    for option in &command.data.options {
        match option.name.as_str() {
            "menu_channel" => menu_channel = option.value.as_channel_id(),
            "job_channel" => job_channel = option.value.as_channel_id(),
            "webhook" => webhook = option.value.as_str().map(str::to_string),
            _ => {}
        }
    }

    let (Some(menu_channel), Some(job_channel), Some(webhook)) =
        (menu_channel, job_channel, webhook)
    else {
        super::respond_ephemeral(ctx, command, "Missing required options.").await;
        return;
    };

    // サーバー設定を丸ごと上書き保存（他サーバーのレコードは触らない）
    {
        let mut store = handler.settings.write().await;
        store.set(
            guild_id.get(),
            GuildSettings {
                menu_channel: menu_channel.get(),
                job_channel: job_channel.get(),
                webhook,
            },
        );
        if let Err(e) = store.save(&handler.data_dir).await {
            error!("Failed to save server settings: {}", e);
            super::respond_ephemeral(ctx, command, "Failed to save settings.").await;
            return;
        }
    }

    info!("Setup saved for guild {}", guild_id);
    super::respond_ephemeral(ctx, command, "✅ Setup saved! Deploying panels...").await;

    // 価格表を設置
    let price_list = {
        let catalog = handler.catalog.read().await;
        ui::price_list_embed(&catalog)
    };
    if let Err(e) = menu_channel
        .send_message(&ctx.http, CreateMessage::new().embed(price_list))
        .await
    {
        error!("Failed to post the price list: {}", e);
    }

    // 注文パネルを設置
    if let Err(e) = job_channel
        .send_message(&ctx.http, ui::dashboard_message())
        .await
    {
        error!("Failed to post the order dashboard: {}", e);
    }
}

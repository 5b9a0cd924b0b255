//! Slash Commands module
//!
//! Discord Slash Commands (/) の実装を提供します。

pub mod admin;
pub mod setup;

use serenity::builder::{
    CreateCommand, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use serenity::model::application::{Command, CommandInteraction};
use serenity::prelude::*;
use tracing::error;

/// 全てのSlash Commandsを登録
pub fn register_commands() -> Vec<CreateCommand> {
    vec![admin::register(), setup::register()]
}

/// グローバルコマンドとして登録（Discord Developer Portalで設定）
pub async fn register_global_commands(ctx: &Context) {
    let commands = register_commands();

    match Command::set_global_commands(&ctx.http, commands).await {
        Ok(_) => {
            tracing::info!("Successfully registered global slash commands");
        }
        Err(e) => {
            tracing::error!("Failed to register global slash commands: {}", e);
        }
    }
}

/// 実行者が管理者権限を持っているか
///
/// コマンド定義側でもdefault_member_permissionsで制限しているが、
/// 実行時にも確認する。
pub(crate) fn is_admin(command: &CommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.administrator())
}

/// エフェメラルなテキスト応答を返す
pub(crate) async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(e) = command.create_response(&ctx.http, response).await {
        error!("Failed to respond to slash command: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_commands() {
        // 各コマンドのregister()がCreateCommandを返すことを確認
        assert_eq!(register_commands().len(), 2);
    }
}

//! 請求書Webhook通知
//!
//! チェックアウト完了時の請求書を設定済みWebhookへ転送する。
//! 配送はベストエフォートで、失敗しても注文フロー自体には影響させない
//! （呼び出し側がログに残して握りつぶす）。

use serenity::builder::{CreateEmbed, ExecuteWebhook};
use serenity::http::Http;
use serenity::model::webhook::Webhook;
use thiserror::Error;
use tracing::debug;

/// Webhook投稿時の表示名
pub const WEBHOOK_USERNAME: &str = "Paleto Bot Logs";

/// 通知エラー
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook error: {0}")]
    Discord(#[from] serenity::Error),
}

/// 請求書埋め込みをWebhookへ送信
pub async fn send_invoice(http: &Http, url: &str, embed: CreateEmbed) -> Result<(), NotifyError> {
    let webhook = Webhook::from_url(http, url).await?;
    webhook
        .execute(
            http,
            false,
            ExecuteWebhook::new().username(WEBHOOK_USERNAME).embed(embed),
        )
        .await?;

    debug!("Invoice forwarded to webhook");
    Ok(())
}

use pt_bot::catalog::Catalog;
use pt_bot::handler::Handler;
use pt_bot::order::{OrderSessionManager, FLOW_TIMEOUT};
use pt_bot::server_settings::ServerSettingsStore;
use serenity::prelude::*;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // .envがあれば読み込む
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // 環境変数を取得
    let discord_token = match env::var("DISCORD_TOKEN") {
        Ok(token) => {
            info!("Discord token loaded");
            token
        }
        Err(e) => {
            error!("DISCORD_TOKEN not set: {}", e);
            return;
        }
    };

    // 永続化ファイルのベースディレクトリ（デフォルト: data）
    let data_dir = env::var("PT_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    debug!("Data directory: {}", data_dir);

    // カタログを読み込み
    let catalog = match Catalog::load(&data_dir).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load catalog: {}, starting with an empty catalog", e);
            Catalog::default()
        }
    };
    info!("Catalog ready ({} items)", catalog.len());

    // サーバー設定を読み込み
    let settings = match ServerSettingsStore::load(&data_dir).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to load server settings: {}, creating new store", e);
            ServerSettingsStore::new()
        }
    };

    let catalog = Arc::new(RwLock::new(catalog));
    let settings = Arc::new(RwLock::new(settings));
    let orders = Arc::new(Mutex::new(OrderSessionManager::new(FLOW_TIMEOUT)));

    // 放置された注文フローを定期的にスイープ
    let sweep_orders = orders.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweep_orders.lock().await.cleanup_expired();
        }
    });

    // インテントを設定（インタラクションはGUILDSで受信できる）
    let intents = GatewayIntents::GUILDS;

    let handler = Handler {
        catalog,
        settings,
        orders,
        data_dir,
    };

    info!("Creating client...");

    // クライアントを作成
    let mut client = match Client::builder(&discord_token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => {
            info!("Client created");
            client
        }
        Err(why) => {
            error!("Error creating client: {:?}", why);
            return;
        }
    };

    info!("Starting bot...");

    // 起動
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}

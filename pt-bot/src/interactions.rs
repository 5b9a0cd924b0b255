//! コンポーネント・モーダルインタラクション処理
//!
//! 注文ウィザードの状態遷移を実装する:
//! カテゴリ選択 → 商品選択 → (数量編集) → クライアント種別選択 → 受領書。
//!
//! ダッシュボードのカテゴリ選択は固定custom_id、以降のコンポーネントは
//! custom_idに埋め込まれたフローIDでセッションを引く。期限切れ・不明な
//! フローIDはエフェメラルな案内だけ返して状態は変更しない。

use crate::handler::Handler;
use crate::notifier;
use crate::order::FlowRejection;
use crate::pricing::{compute_invoice, ClientType};
use crate::ui::{self, OrderAction};
use serenity::builder::{CreateInteractionResponse, CreateInteractionResponseMessage};
use serenity::model::application::{
    ActionRowComponent, ComponentInteraction, ComponentInteractionDataKind, ModalInteraction,
};
use serenity::prelude::*;
use tracing::{error, info};
use uuid::Uuid;

const EXPIRED_FLOW_MESSAGE: &str =
    "⚠️ This order has expired. Please start a new one from the dashboard.";

/// コンポーネント操作のディスパッチ
pub async fn handle_component(ctx: &Context, component: &ComponentInteraction, handler: &Handler) {
    let custom_id = component.data.custom_id.as_str();

    if custom_id == ui::CATEGORY_SELECT_ID {
        handle_category_select(ctx, component, handler).await;
        return;
    }

    match ui::parse_custom_id(custom_id) {
        Some(OrderAction::SelectItems(flow_id)) => {
            handle_items_select(ctx, component, handler, flow_id).await;
        }
        Some(OrderAction::EditQuantities(flow_id)) => {
            handle_edit_quantities(ctx, component, handler, flow_id).await;
        }
        Some(OrderAction::Checkout(flow_id)) => {
            handle_checkout(ctx, component, handler, flow_id).await;
        }
        Some(OrderAction::SelectClient(flow_id)) => {
            handle_client_select(ctx, component, handler, flow_id).await;
        }
        // モーダル送信はhandle_modal側で処理する
        Some(OrderAction::SubmitQuantities(_)) | None => {}
    }
}

/// モーダル送信のディスパッチ
pub async fn handle_modal(ctx: &Context, modal: &ModalInteraction, handler: &Handler) {
    let Some(OrderAction::SubmitQuantities(flow_id)) =
        ui::parse_custom_id(modal.data.custom_id.as_str())
    else {
        return;
    };

    {
        let mut orders = handler.orders.lock().await;
        let Some(session) = orders.get_mut(&flow_id) else {
            drop(orders);
            respond_modal_text(ctx, modal, EXPIRED_FLOW_MESSAGE).await;
            return;
        };
        if session.user_id != modal.user.id.get() {
            return;
        }

        for row in &modal.data.components {
            for component in &row.components {
                if let ActionRowComponent::InputText(input) = component {
                    if let Some(value) = &input.value {
                        session.apply_quantity_input(&input.custom_id, value);
                    }
                }
            }
        }
        session.touch();
    }

    respond_modal_text(
        ctx,
        modal,
        "✅ Quantities updated! Click **Checkout** to finish.",
    )
    .await;
}

/// カテゴリ選択 → 商品選択パネルを開く
async fn handle_category_select(
    ctx: &Context,
    component: &ComponentInteraction,
    handler: &Handler,
) {
    let Some(category) = selected_values(component).into_iter().next() else {
        return;
    };
    let Some(guild_id) = component.guild_id else {
        respond_component_text(ctx, component, "This panel can only be used in a server.").await;
        return;
    };

    let items = {
        let catalog = handler.catalog.read().await;
        catalog.available_items_in_category(&category)
    };

    if items.is_empty() {
        respond_component_text(
            ctx,
            component,
            "⚠️ No services are currently available in this category.",
        )
        .await;
        return;
    }

    let flow_id = {
        let mut orders = handler.orders.lock().await;
        orders.create(guild_id.get(), component.user.id.get(), &category)
    };

    let response = CreateInteractionResponseMessage::new()
        .content(format!("**{}** - Select items:", category))
        .components(ui::order_panel_components(flow_id, &items))
        .ephemeral(true);
    respond_component(ctx, component, response).await;
}

/// 商品の複数選択を反映
async fn handle_items_select(
    ctx: &Context,
    component: &ComponentInteraction,
    handler: &Handler,
    flow_id: Uuid,
) {
    let mut values = selected_values(component);

    // 選択時点で販売可能な商品だけをセッションに入れる
    {
        let catalog = handler.catalog.read().await;
        values.retain(|name| catalog.is_available(name));
    }

    {
        let mut orders = handler.orders.lock().await;
        let Some(session) = orders.get_mut(&flow_id) else {
            drop(orders);
            respond_component_text(ctx, component, EXPIRED_FLOW_MESSAGE).await;
            return;
        };
        if session.user_id != component.user.id.get() {
            return;
        }
        session.select_items(values);
        session.touch();
    }

    acknowledge(ctx, component).await;
}

/// 数量編集モーダルを開く
async fn handle_edit_quantities(
    ctx: &Context,
    component: &ComponentInteraction,
    handler: &Handler,
    flow_id: Uuid,
) {
    let modal = {
        let mut orders = handler.orders.lock().await;
        let Some(session) = orders.get_mut(&flow_id) else {
            drop(orders);
            respond_component_text(ctx, component, EXPIRED_FLOW_MESSAGE).await;
            return;
        };
        if session.user_id != component.user.id.get() {
            return;
        }

        match session.check_quantity_edit() {
            Err(FlowRejection::NothingSelected) => {
                drop(orders);
                respond_component_text(ctx, component, "⚠️ Select at least one job first!").await;
                return;
            }
            Err(_) => {
                drop(orders);
                respond_component_text(
                    ctx,
                    component,
                    "⚠️ You can only edit 5 items at a time due to Discord limits.",
                )
                .await;
                return;
            }
            Ok(()) => {}
        }

        session.touch();
        ui::quantity_modal(flow_id, session)
    };

    if let Err(e) = component
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await
    {
        error!("Failed to open the quantity modal: {}", e);
    }
}

/// チェックアウト → クライアント種別選択へ
async fn handle_checkout(
    ctx: &Context,
    component: &ComponentInteraction,
    handler: &Handler,
    flow_id: Uuid,
) {
    {
        let mut orders = handler.orders.lock().await;
        let Some(session) = orders.get_mut(&flow_id) else {
            drop(orders);
            respond_component_text(ctx, component, EXPIRED_FLOW_MESSAGE).await;
            return;
        };
        if session.user_id != component.user.id.get() {
            return;
        }
        if session.check_checkout().is_err() {
            drop(orders);
            respond_component_text(ctx, component, "⚠️ Cart is empty.").await;
            return;
        }
        session.touch();
    }

    let response = CreateInteractionResponseMessage::new()
        .content("Select Client Type:")
        .components(ui::client_type_components(flow_id))
        .ephemeral(true);
    respond_component(ctx, component, response).await;
}

/// クライアント種別選択 → 請求書計算・受領書・Webhook通知
async fn handle_client_select(
    ctx: &Context,
    component: &ComponentInteraction,
    handler: &Handler,
    flow_id: Uuid,
) {
    let Some(client_type) = selected_values(component)
        .first()
        .and_then(|value| ClientType::from_value(value))
    else {
        return;
    };

    // フローはここで終端。セッションを取り出して削除する
    let session = {
        let mut orders = handler.orders.lock().await;
        let owner_ok = orders
            .get_mut(&flow_id)
            .map(|s| s.user_id == component.user.id.get());
        match owner_ok {
            Some(true) => orders.take(&flow_id),
            Some(false) => return,
            None => None,
        }
    };
    let Some(session) = session else {
        respond_component_text(ctx, component, EXPIRED_FLOW_MESSAGE).await;
        return;
    };

    if session.is_empty() {
        respond_component_text(ctx, component, "⚠️ Cart is empty.").await;
        return;
    }

    let invoice = {
        let catalog = handler.catalog.read().await;
        compute_invoice(&catalog, session.quantities(), client_type)
    };

    let response = CreateInteractionResponseMessage::new()
        .embed(ui::receipt_embed(&invoice))
        .ephemeral(true);
    respond_component(ctx, component, response).await;

    info!(
        "Order completed for user {} in guild {}: total ${} ({})",
        session.user_id, session.guild_id, invoice.total, client_type
    );

    // Webhook通知はベストエフォート。失敗しても受領書には影響しない
    let webhook_url = {
        let settings = handler.settings.read().await;
        settings.get(session.guild_id).map(|s| s.webhook.clone())
    };
    if let Some(url) = webhook_url.filter(|url| !url.is_empty()) {
        let embed = ui::invoice_embed(
            component.user.display_name(),
            &component.user.face(),
            &invoice,
        );
        if let Err(e) = notifier::send_invoice(&ctx.http, &url, embed).await {
            error!("Webhook delivery failed: {}", e);
        }
    }
}

/// 選択メニューで選ばれた値を取り出す
fn selected_values(component: &ComponentInteraction) -> Vec<String> {
    match &component.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.clone(),
        _ => Vec::new(),
    }
}

async fn respond_component(
    ctx: &Context,
    component: &ComponentInteraction,
    message: CreateInteractionResponseMessage,
) {
    if let Err(e) = component
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        error!("Failed to respond to component interaction: {}", e);
    }
}

async fn respond_component_text(ctx: &Context, component: &ComponentInteraction, content: &str) {
    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true);
    respond_component(ctx, component, message).await;
}

async fn acknowledge(ctx: &Context, component: &ComponentInteraction) {
    if let Err(e) = component
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await
    {
        error!("Failed to acknowledge component interaction: {}", e);
    }
}

async fn respond_modal_text(ctx: &Context, modal: &ModalInteraction, content: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(e) = modal.create_response(&ctx.http, response).await {
        error!("Failed to respond to modal submission: {}", e);
    }
}

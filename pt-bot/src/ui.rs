//! インタラクティブUIビルダー
//!
//! カタログスナップショットと注文セッションから、選択メニュー・
//! ボタン・モーダル・埋め込みの宣言的な定義を組み立てる。serenity
//! への依存はこの層とハンドラーに閉じ込める。
//!
//! コンポーネントのcustom_idにはフローIDを埋め込む。ダッシュボードの
//! カテゴリ選択だけは固定IDなので、プロセス再起動後も設置済みパネルが
//! そのまま機能する。

use crate::catalog::{Catalog, CatalogItem, PANEL_CATEGORIES, UPGRADES_CATEGORY};
use crate::order::{OrderSession, MAX_SELECTED_ITEMS};
use crate::pricing::{format_money, ClientType, Invoice};
use serenity::builder::{
    CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor, CreateInputText, CreateMessage,
    CreateModal, CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption,
};
use serenity::model::application::{ButtonStyle, InputTextStyle};
use serenity::model::timestamp::Timestamp;
use uuid::Uuid;

/// ダッシュボードのカテゴリ選択の固定custom_id
pub const CATEGORY_SELECT_ID: &str = "order:category";

/// ダッシュボードメッセージ本文
pub const DASHBOARD_CONTENT: &str =
    "👋 **Mechanic Dashboard**\nSelect a category below to start an order:";

const PRICE_LIST_COLOR: u32 = 0x00aaff;
const RECEIPT_COLOR: u32 = 0x27ae60;
const INVOICE_COLOR: u32 = 0x00b894;

/// フロー付きコンポーネントの操作種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// 商品の複数選択メニュー
    SelectItems(Uuid),
    /// 数量編集ボタン
    EditQuantities(Uuid),
    /// チェックアウトボタン
    Checkout(Uuid),
    /// クライアント種別の選択メニュー
    SelectClient(Uuid),
    /// 数量編集モーダルの送信
    SubmitQuantities(Uuid),
}

fn items_select_id(flow_id: Uuid) -> String {
    format!("order:items:{}", flow_id)
}

fn edit_quantities_id(flow_id: Uuid) -> String {
    format!("order:edit:{}", flow_id)
}

fn checkout_id(flow_id: Uuid) -> String {
    format!("order:checkout:{}", flow_id)
}

fn client_select_id(flow_id: Uuid) -> String {
    format!("order:client:{}", flow_id)
}

fn quantity_modal_id(flow_id: Uuid) -> String {
    format!("order:qty:{}", flow_id)
}

/// custom_idをフロー操作として解釈
pub fn parse_custom_id(custom_id: &str) -> Option<OrderAction> {
    let parse = |rest: &str| Uuid::parse_str(rest).ok();

    if let Some(rest) = custom_id.strip_prefix("order:items:") {
        return parse(rest).map(OrderAction::SelectItems);
    }
    if let Some(rest) = custom_id.strip_prefix("order:edit:") {
        return parse(rest).map(OrderAction::EditQuantities);
    }
    if let Some(rest) = custom_id.strip_prefix("order:checkout:") {
        return parse(rest).map(OrderAction::Checkout);
    }
    if let Some(rest) = custom_id.strip_prefix("order:client:") {
        return parse(rest).map(OrderAction::SelectClient);
    }
    if let Some(rest) = custom_id.strip_prefix("order:qty:") {
        return parse(rest).map(OrderAction::SubmitQuantities);
    }
    None
}

/// ダッシュボードのコンポーネント（カテゴリ選択）
pub fn dashboard_components() -> Vec<CreateActionRow> {
    let options = PANEL_CATEGORIES
        .iter()
        .map(|(name, emoji)| CreateSelectMenuOption::new(*name, *name).emoji(*emoji))
        .collect();

    let menu = CreateSelectMenu::new(CATEGORY_SELECT_ID, CreateSelectMenuKind::String { options })
        .placeholder("Select a Category");

    vec![CreateActionRow::SelectMenu(menu)]
}

/// ダッシュボードメッセージ全体
pub fn dashboard_message() -> CreateMessage {
    CreateMessage::new()
        .content(DASHBOARD_CONTENT)
        .components(dashboard_components())
}

/// 商品選択パネル（複数選択メニュー＋操作ボタン）
pub fn order_panel_components(flow_id: Uuid, items: &[CatalogItem]) -> Vec<CreateActionRow> {
    let options = items
        .iter()
        .take(MAX_SELECTED_ITEMS)
        .map(|item| CreateSelectMenuOption::new(item.name.clone(), item.name.clone()))
        .collect::<Vec<_>>();

    let max_values = options.len().min(MAX_SELECTED_ITEMS) as u8;
    let menu = CreateSelectMenu::new(
        items_select_id(flow_id),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Select Services (Multi-select)")
    .min_values(1)
    .max_values(max_values);

    let buttons = vec![
        CreateButton::new(edit_quantities_id(flow_id))
            .label("Edit Quantities")
            .style(ButtonStyle::Primary),
        CreateButton::new(checkout_id(flow_id))
            .label("Checkout")
            .style(ButtonStyle::Success),
    ];

    vec![
        CreateActionRow::SelectMenu(menu),
        CreateActionRow::Buttons(buttons),
    ]
}

/// 数量編集モーダル
///
/// 選択中の商品1つにつき1つの入力欄を出す。呼び出し側で選択数が
/// 1〜5件であることを確認しておくこと。
pub fn quantity_modal(flow_id: Uuid, session: &OrderSession) -> CreateModal {
    let rows = session
        .selected_items()
        .iter()
        .map(|item| {
            let current = session.quantity(item).unwrap_or(1);
            let input = CreateInputText::new(InputTextStyle::Short, item.clone(), item.clone())
                .value(current.to_string())
                .min_length(1)
                .max_length(2)
                .required(true);
            CreateActionRow::InputText(input)
        })
        .collect();

    CreateModal::new(quantity_modal_id(flow_id), "Edit Quantities").components(rows)
}

/// クライアント種別の選択メニュー
pub fn client_type_components(flow_id: Uuid) -> Vec<CreateActionRow> {
    let options = ClientType::ALL
        .iter()
        .map(|ct| CreateSelectMenuOption::new(ct.label(), ct.as_str()))
        .collect();

    let menu = CreateSelectMenu::new(
        client_select_id(flow_id),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Select Client Type");

    vec![CreateActionRow::SelectMenu(menu)]
}

/// 価格表の1行（販売可否で書式が変わる）
pub(crate) fn price_line(item: &CatalogItem) -> String {
    if item.available {
        format!("• **{}** — ${}", item.name, format_money(item.unit_price))
    } else {
        format!("• ~~{}~~ — **N/A**", item.name)
    }
}

/// 価格表の埋め込み
///
/// Upgradesカテゴリだけは別枠で、販売可能な商品のみを載せる。
pub fn price_list_embed(catalog: &Catalog) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("💰 Paleto Tuners Price List")
        .description("Welcome! Below are our current service rates.\n❌ = Out of Stock / Unavailable")
        .color(PRICE_LIST_COLOR);

    for category in crate::catalog::category_names() {
        if category == UPGRADES_CATEGORY {
            continue;
        }
        let lines: Vec<String> = catalog
            .items_in_category(category)
            .iter()
            .map(price_line)
            .collect();
        embed = embed.field(category, lines.join("\n"), false);
    }

    let upgrade_lines: Vec<String> = catalog
        .available_items_in_category(UPGRADES_CATEGORY)
        .iter()
        .map(price_line)
        .collect();
    let upgrades_value = if upgrade_lines.is_empty() {
        "None".to_string()
    } else {
        upgrade_lines.join("\n")
    };
    embed.field("🚗 Upgrades", upgrades_value, false)
}

/// 請求書の明細行（受領書とWebhook通知で共用）
pub(crate) fn receipt_lines(invoice: &Invoice) -> Vec<String> {
    invoice
        .lines
        .iter()
        .map(|line| format!("• {}", line.format()))
        .collect()
}

/// 注文者向けの受領書埋め込み
pub fn receipt_embed(invoice: &Invoice) -> CreateEmbed {
    CreateEmbed::new()
        .title("✅ Job Submitted")
        .color(RECEIPT_COLOR)
        .field("🛠️ Services", receipt_lines(invoice).join("\n"), false)
        .field(
            "💵 Total",
            format!(
                "${} ({})",
                format_money(invoice.total),
                invoice.client_type.as_str().to_uppercase()
            ),
            false,
        )
}

/// Webhookに転送する請求書埋め込み
pub fn invoice_embed(user_name: &str, user_avatar_url: &str, invoice: &Invoice) -> CreateEmbed {
    CreateEmbed::new()
        .title("📋 New Invoice")
        .color(INVOICE_COLOR)
        .timestamp(Timestamp::now())
        .author(CreateEmbedAuthor::new(user_name).icon_url(user_avatar_url))
        .description(receipt_lines(invoice).join("\n"))
        .field(
            "Client",
            invoice.client_type.as_str().to_uppercase(),
            true,
        )
        .field("Total", format!("${}", format_money(invoice.total)), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::compute_invoice;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_custom_id_roundtrip() {
        let flow_id = Uuid::new_v4();

        assert_eq!(
            parse_custom_id(&items_select_id(flow_id)),
            Some(OrderAction::SelectItems(flow_id))
        );
        assert_eq!(
            parse_custom_id(&edit_quantities_id(flow_id)),
            Some(OrderAction::EditQuantities(flow_id))
        );
        assert_eq!(
            parse_custom_id(&checkout_id(flow_id)),
            Some(OrderAction::Checkout(flow_id))
        );
        assert_eq!(
            parse_custom_id(&client_select_id(flow_id)),
            Some(OrderAction::SelectClient(flow_id))
        );
        assert_eq!(
            parse_custom_id(&quantity_modal_id(flow_id)),
            Some(OrderAction::SubmitQuantities(flow_id))
        );
    }

    #[test]
    fn test_parse_custom_id_rejects_garbage() {
        assert_eq!(parse_custom_id(CATEGORY_SELECT_ID), None);
        assert_eq!(parse_custom_id("order:items:not-a-uuid"), None);
        assert_eq!(parse_custom_id("somethingelse"), None);
        assert_eq!(parse_custom_id(""), None);
    }

    #[test]
    fn test_price_line_formats() {
        let available = CatalogItem {
            name: "Full Repair".to_string(),
            unit_price: 1500,
            available: true,
        };
        let unavailable = CatalogItem {
            name: "NOS".to_string(),
            unit_price: 0,
            available: false,
        };

        assert_eq!(price_line(&available), "• **Full Repair** — $1,500");
        assert_eq!(price_line(&unavailable), "• ~~NOS~~ — **N/A**");
    }

    #[test]
    fn test_receipt_lines() {
        let catalog = Catalog::from_value(&json!({"Full Repair": 500, "NOS": 300}));
        let quantities: BTreeMap<String, u32> =
            [("Full Repair".to_string(), 2), ("NOS".to_string(), 1)]
                .into_iter()
                .collect();
        let invoice = compute_invoice(&catalog, &quantities, ClientType::Normal);

        assert_eq!(
            receipt_lines(&invoice),
            vec!["• Full Repair x2 = $1,000", "• NOS x1 = $300"]
        );
    }
}

//! 料金計算（純粋関数）
//!
//! 注文セッションとクライアント種別から明細と合計を計算する。
//! 単価は計算時点のカタログスナップショットから読む。選択からチェック
//! アウトまでの間にカタログが再読み込みされた場合は新しい価格で計算される。

use crate::catalog::Catalog;
use std::collections::BTreeMap;
use tracing::warn;

/// クライアント種別（割引区分）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Normal,
    Lspd,
    Ems,
}

impl ClientType {
    /// 全種別（UI表示順）
    pub const ALL: [ClientType; 3] = [ClientType::Normal, ClientType::Lspd, ClientType::Ems];

    /// 識別子から変換
    pub fn from_value(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(ClientType::Normal),
            "lspd" => Some(ClientType::Lspd),
            "ems" => Some(ClientType::Ems),
            _ => None,
        }
    }

    /// 識別子を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Normal => "normal",
            ClientType::Lspd => "lspd",
            ClientType::Ems => "ems",
        }
    }

    /// 選択メニューに表示するラベル
    pub fn label(&self) -> &'static str {
        match self {
            ClientType::Normal => "Normal Customer",
            ClientType::Lspd => "LSPD (50% Off)",
            ClientType::Ems => "EMS (50% Off)",
        }
    }

    /// 割引係数
    pub fn multiplier(&self) -> f64 {
        match self {
            ClientType::Normal => 1.0,
            ClientType::Lspd | ClientType::Ems => 0.5,
        }
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 請求書の1明細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub item: String,
    pub quantity: u32,
    /// 単価×数量
    pub amount: u64,
}

impl InvoiceLine {
    /// 明細1行の表示文字列
    pub fn format(&self) -> String {
        format!(
            "{} x{} = ${}",
            self.item,
            self.quantity,
            format_money(self.amount)
        )
    }
}

/// 請求書（チェックアウト時に一度だけ計算される）
#[derive(Debug, Clone)]
pub struct Invoice {
    pub lines: Vec<InvoiceLine>,
    /// 割引前の合計
    pub subtotal: u64,
    /// 割引後の合計（0方向への切り捨て）
    pub total: u64,
    pub client_type: ClientType,
}

/// 注文内容とクライアント種別から請求書を計算
pub fn compute_invoice(
    catalog: &Catalog,
    quantities: &BTreeMap<String, u32>,
    client_type: ClientType,
) -> Invoice {
    let mut lines = Vec::with_capacity(quantities.len());
    let mut subtotal: u64 = 0;

    for (item, &quantity) in quantities {
        let unit_price = match catalog.price_of(item) {
            Some(price) => price,
            None => {
                warn!("Item {:?} is no longer in the catalog, billing at 0", item);
                0
            }
        };
        let amount = unit_price * u64::from(quantity);
        subtotal += amount;
        lines.push(InvoiceLine {
            item: item.clone(),
            quantity,
            amount,
        });
    }

    let total = (subtotal as f64 * client_type.multiplier()).floor() as u64;

    Invoice {
        lines,
        subtotal,
        total,
        client_type,
    }
}

/// 金額を3桁区切りで整形（1300 → "1,300"）
pub fn format_money(amount: u64) -> String {
    let digits = amount.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_catalog() -> Catalog {
        Catalog::from_value(&json!({
            "Full Repair": 500,
            "NOS": 300,
            "LockPick": 251,
        }))
    }

    fn session(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs
            .iter()
            .map(|(name, qty)| (name.to_string(), *qty))
            .collect()
    }

    #[test]
    fn test_client_type_roundtrip() {
        for ct in ClientType::ALL {
            assert_eq!(ClientType::from_value(ct.as_str()), Some(ct));
        }
        assert_eq!(ClientType::from_value("vip"), None);
    }

    #[test]
    fn test_worked_example_normal() {
        let catalog = sample_catalog();
        let quantities = session(&[("Full Repair", 2), ("NOS", 1)]);

        let invoice = compute_invoice(&catalog, &quantities, ClientType::Normal);
        let lines: Vec<String> = invoice.lines.iter().map(InvoiceLine::format).collect();

        assert_eq!(lines, vec!["Full Repair x2 = $1,000", "NOS x1 = $300"]);
        assert_eq!(invoice.subtotal, 1300);
        assert_eq!(invoice.total, 1300);
    }

    #[test]
    fn test_worked_example_lspd() {
        let catalog = sample_catalog();
        let quantities = session(&[("Full Repair", 2), ("NOS", 1)]);

        let invoice = compute_invoice(&catalog, &quantities, ClientType::Lspd);
        assert_eq!(invoice.total, 650);
    }

    #[test]
    fn test_half_discount_floors_odd_subtotal() {
        let catalog = sample_catalog();
        let quantities = session(&[("LockPick", 1)]);

        let normal = compute_invoice(&catalog, &quantities, ClientType::Normal);
        let lspd = compute_invoice(&catalog, &quantities, ClientType::Lspd);
        let ems = compute_invoice(&catalog, &quantities, ClientType::Ems);

        assert_eq!(normal.total, 251);
        // floor(251 * 0.5) = 125
        assert_eq!(lspd.total, 125);
        assert_eq!(ems.total, 125);
    }

    #[test]
    fn test_discount_property() {
        let catalog = sample_catalog();
        for quantities in [
            session(&[("Full Repair", 1)]),
            session(&[("Full Repair", 3), ("NOS", 2), ("LockPick", 1)]),
            session(&[("LockPick", 7)]),
        ] {
            let normal = compute_invoice(&catalog, &quantities, ClientType::Normal).total;
            let lspd = compute_invoice(&catalog, &quantities, ClientType::Lspd).total;
            let ems = compute_invoice(&catalog, &quantities, ClientType::Ems).total;
            assert_eq!(lspd, (normal as f64 * 0.5).floor() as u64);
            assert_eq!(ems, lspd);
        }
    }

    #[test]
    fn test_unknown_item_bills_at_zero() {
        let catalog = sample_catalog();
        let quantities = session(&[("Ghost Part", 4), ("NOS", 1)]);

        let invoice = compute_invoice(&catalog, &quantities, ClientType::Normal);
        assert_eq!(invoice.total, 300);
        assert_eq!(invoice.lines[0].item, "Ghost Part");
        assert_eq!(invoice.lines[0].amount, 0);
    }

    #[test]
    fn test_empty_session_is_empty_invoice() {
        let catalog = sample_catalog();
        let invoice = compute_invoice(&catalog, &BTreeMap::new(), ClientType::Normal);
        assert!(invoice.lines.is_empty());
        assert_eq!(invoice.total, 0);
    }

    #[test]
    fn test_lines_are_ordered_deterministically() {
        let catalog = sample_catalog();
        let quantities = session(&[("NOS", 1), ("Full Repair", 1), ("LockPick", 1)]);

        let invoice = compute_invoice(&catalog, &quantities, ClientType::Normal);
        let names: Vec<&str> = invoice.lines.iter().map(|l| l.item.as_str()).collect();
        assert_eq!(names, vec!["Full Repair", "LockPick", "NOS"]);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "0");
        assert_eq!(format_money(999), "999");
        assert_eq!(format_money(1000), "1,000");
        assert_eq!(format_money(1300), "1,300");
        assert_eq!(format_money(1234567), "1,234,567");
    }
}

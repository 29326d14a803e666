// YNABトランザクションのドメインモデル
//
// Monzo通知からYNAB APIの `POST /budgets/{budget_id}/transactions`
// リクエストボディへの変換規則を定義する。

use serde::Serialize;
use serde_json::Number;
use thiserror::Error;

use super::InboundNotification;

/// Monzoの最小単位からYNABのミリ単位への換算倍率
pub const AMOUNT_MULTIPLIER: i64 = 10;

/// YNABに送信する消込状態（常に固定値）
pub const CLEARED_STATE: &str = "cleared";

/// 変換エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// 支払先ラベルの候補がすべて空
    #[error("No payee data found")]
    NoPayee,

    /// 換算後の金額が表現できない（i64のオーバーフロー等）
    #[error("金額が範囲外です: {0}")]
    AmountOutOfRange(String),
}

/// YNAB APIのトランザクション
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundTransaction {
    /// 送信先のYNAB口座ID
    pub account_id: String,
    /// 日付（Monzoの`created`をそのまま使う）
    pub date: String,
    /// 金額（ミリ単位）
    pub amount: Number,
    /// 支払先名
    pub payee_name: String,
    /// 消込状態
    pub cleared: String,
    /// インポートID（YNAB側の重複排除キー）
    pub import_id: String,
}

/// YNAB APIが要求するラッパー（`{"transaction": {...}}`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionEnvelope {
    pub transaction: OutboundTransaction,
}

impl TransactionEnvelope {
    pub fn new(transaction: OutboundTransaction) -> Self {
        Self { transaction }
    }
}

/// 最小単位の金額をYNABのミリ単位に換算
///
/// 整数は厳密に計算し、オーバーフロー時はNone。
/// 小数は換算後に端数がなければ整数として返す。
pub fn scale_amount(minor_units: &Number) -> Option<Number> {
    if minor_units.is_i64() || minor_units.is_u64() {
        let value = minor_units.as_i64()?;
        return value.checked_mul(AMOUNT_MULTIPLIER).map(Number::from);
    }

    let scaled = minor_units.as_f64()? * AMOUNT_MULTIPLIER as f64;
    if scaled.fract() == 0.0 && scaled.abs() < i64::MAX as f64 {
        return Some(Number::from(scaled as i64));
    }
    Number::from_f64(scaled)
}

/// Monzo通知をYNABトランザクションに変換
///
/// # 引数
/// * `notification` - 受信したMonzo通知
/// * `target_account_id` - 送信先のYNAB口座ID
///
/// # 戻り値
/// * `Ok(OutboundTransaction)` - 変換結果
/// * `Err(MappingError::NoPayee)` - 支払先ラベルを解決できない
/// * `Err(MappingError::AmountOutOfRange)` - 金額換算でオーバーフロー
pub fn map_transaction(
    notification: &InboundNotification,
    target_account_id: &str,
) -> Result<OutboundTransaction, MappingError> {
    let payee = notification.resolve_payee().ok_or(MappingError::NoPayee)?;

    let amount = scale_amount(&notification.data.amount)
        .ok_or_else(|| MappingError::AmountOutOfRange(notification.data.amount.to_string()))?;

    Ok(OutboundTransaction {
        account_id: target_account_id.to_string(),
        date: notification.data.created.clone(),
        amount,
        payee_name: payee.to_string(),
        cleared: CLEARED_STATE.to_string(),
        import_id: notification.data.id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(amount: impl Into<serde_json::Value>, id: &str, description: &str) -> InboundNotification {
        let amount = amount.into();
        serde_json::from_value(json!({
            "type": "transaction.created",
            "data": {
                "account_id": "acc_123",
                "amount": amount,
                "created": "2020-01-01T00:00:00Z",
                "description": description,
                "id": id
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_scale_amount() {
        assert_eq!(scale_amount(&Number::from(250)), Some(Number::from(2500)));
        assert_eq!(scale_amount(&Number::from(-150)), Some(Number::from(-1500)));
        assert_eq!(scale_amount(&Number::from(0)), Some(Number::from(0)));
    }

    #[test]
    fn test_scale_amount_overflow() {
        assert_eq!(scale_amount(&Number::from(i64::MAX)), None);
        assert_eq!(scale_amount(&Number::from(i64::MIN)), None);
        assert_eq!(scale_amount(&Number::from(u64::MAX)), None);
    }

    #[test]
    fn test_scale_amount_float() {
        let float = |v: f64| Number::from_f64(v).unwrap();

        assert_eq!(scale_amount(&float(150.0)), Some(Number::from(1500)));
        assert_eq!(scale_amount(&float(1.5)), Some(Number::from(15)));
        assert_eq!(scale_amount(&float(-2.5)), Some(Number::from(-25)));
        assert_eq!(scale_amount(&float(0.25)), Some(float(2.5)));
    }

    #[test]
    fn test_scale_amount_float_serializes_as_integer() {
        let scaled = scale_amount(&Number::from_f64(150.0).unwrap()).unwrap();
        assert_eq!(serde_json::to_string(&scaled).unwrap(), "1500");
    }

    #[test]
    fn test_amount_multiplier() {
        assert_eq!(AMOUNT_MULTIPLIER, 10);
    }

    #[test]
    fn test_map_transaction_copies_fields() {
        let source = notification(150, "tx_1", "Coffee Shop");

        let transaction = map_transaction(&source, "ynab_acc").unwrap();

        assert_eq!(
            transaction,
            OutboundTransaction {
                account_id: "ynab_acc".to_string(),
                date: "2020-01-01T00:00:00Z".to_string(),
                amount: Number::from(1500),
                payee_name: "Coffee Shop".to_string(),
                cleared: "cleared".to_string(),
                import_id: "tx_1".to_string(),
            }
        );
    }

    #[test]
    fn test_map_transaction_keeps_import_id_verbatim() {
        for id in ["tx_00009ZZhT5ATsvbVHUUAmP", "", "with spaces / and 日本語"] {
            let source = notification(1, id, "label");
            let transaction = map_transaction(&source, "ynab_acc").unwrap();
            assert_eq!(transaction.import_id, id);
        }
    }

    #[test]
    fn test_map_transaction_no_payee() {
        let source = notification(1, "tx_1", "");
        assert_eq!(map_transaction(&source, "ynab_acc"), Err(MappingError::NoPayee));
    }

    #[test]
    fn test_map_transaction_amount_out_of_range() {
        let source = notification(i64::MAX, "tx_1", "label");
        assert_eq!(
            map_transaction(&source, "ynab_acc"),
            Err(MappingError::AmountOutOfRange(i64::MAX.to_string()))
        );
    }

    #[test]
    fn test_envelope_serialization() {
        let source = notification(250, "tx_9", "groceries");
        let envelope = TransactionEnvelope::new(map_transaction(&source, "ynab_acc").unwrap());

        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "transaction": {
                    "account_id": "ynab_acc",
                    "date": "2020-01-01T00:00:00Z",
                    "amount": 2500,
                    "payee_name": "groceries",
                    "cleared": "cleared",
                    "import_id": "tx_9"
                }
            })
        );
    }

    #[test]
    fn test_mapping_error_display() {
        assert_eq!(MappingError::NoPayee.to_string(), "No payee data found");
        assert!(MappingError::AmountOutOfRange("5".to_string()).to_string().contains("5"));
    }
}

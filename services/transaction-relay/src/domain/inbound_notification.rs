/// Monzo Webhook通知のドメインモデル
///
/// `transaction.created` 等のWebhookボディをデシリアライズし、
/// 支払先ラベルの解決規則を提供する。
use serde::{Deserialize, Deserializer};
use serde_json::Number;

/// Monzoから受信したWebhook通知
///
/// JSON形式: `{"type": "transaction.created", "data": {...}}`
/// 未知のフィールドは無視し、欠落・`null`のフィールドはゼロ値として扱う。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InboundNotification {
    /// イベント種別（ログ出力のみに使用し、分岐には使わない）
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,

    /// トランザクション本体
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: TransactionData,
}

/// 通知に含まれるトランザクション情報
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionData {
    /// トランザクションが属するMonzo口座ID
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_id: String,

    /// 金額（通貨の最小単位、支出は負数）
    ///
    /// 整数・小数のどちらも受け付ける。
    #[serde(default = "zero_amount", deserialize_with = "null_as_zero")]
    pub amount: Number,

    /// 作成日時（ISO-8601文字列、再解析しない）
    #[serde(default, deserialize_with = "null_as_default")]
    pub created: String,

    /// 明細の説明文（支払先ラベルの最終フォールバック）
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// 取引相手（送金時のみ）
    #[serde(default)]
    pub counterparty: Option<PartyField>,

    /// Monzo側で一意なトランザクションID
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// 加盟店（カード決済時のみ）
    #[serde(default)]
    pub merchant: Option<PartyField>,
}

impl Default for TransactionData {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            amount: zero_amount(),
            created: String::new(),
            description: String::new(),
            counterparty: None,
            id: String::new(),
            merchant: None,
        }
    }
}

fn zero_amount() -> Number {
    Number::from(0)
}

/// `null`をゼロ値として読み込む
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<Number, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Number>::deserialize(deserializer)?.unwrap_or_else(zero_amount))
}

/// 加盟店・取引相手フィールド
///
/// Monzoは展開済みオブジェクトと、IDのみの文字列の両方を送ってくる。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PartyField {
    /// 展開済みオブジェクト（`{"name": "Tesco", ...}`）
    Expanded(NamedParty),
    /// 未展開のID文字列（名前を持たない）
    Reference(String),
}

/// 名前を持つ当事者
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NamedParty {
    #[serde(default)]
    pub name: Option<String>,
}

impl PartyField {
    /// 名前を取得（未展開の場合はNone）
    pub fn name(&self) -> Option<&str> {
        match self {
            PartyField::Expanded(party) => party.name.as_deref(),
            PartyField::Reference(_) => None,
        }
    }
}

impl InboundNotification {
    /// JSON文字列から通知をパース
    ///
    /// ボディ全体が`null`の場合もゼロ値の通知として扱う。
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        Ok(serde_json::from_str::<Option<Self>>(body)?.unwrap_or_default())
    }

    /// 加盟店名を取得
    pub fn merchant_name(&self) -> Option<&str> {
        self.data.merchant.as_ref().and_then(PartyField::name)
    }

    /// 取引相手名を取得
    pub fn counterparty_name(&self) -> Option<&str> {
        self.data.counterparty.as_ref().and_then(PartyField::name)
    }

    /// 支払先ラベルを解決
    ///
    /// 加盟店名 → 取引相手名 → 説明文 の順で、最初の空でない値を返す。
    /// すべて空の場合はNone。
    pub fn resolve_payee(&self) -> Option<&str> {
        [
            self.merchant_name(),
            self.counterparty_name(),
            Some(self.data.description.as_str()),
        ]
        .into_iter()
        .flatten()
        .find(|label| !label.is_empty())
    }
}

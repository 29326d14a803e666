/// トランザクション転送ハンドラー
///
/// Monzo Webhookの受信ボディを検証・変換し、YNAB APIに一度だけ送信する。
/// 失敗はすべてエラー追跡に報告したうえで500として返し、プロセスは継続する。
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{map_transaction, InboundNotification, MappingError, TransactionEnvelope};
use crate::infrastructure::{ErrorReporter, RelayConfig, ReportContext, SendError, TransactionSender};

/// 口座ID不一致時のレスポンスボディ（互換性のため文言固定）
pub const INVALID_ACCOUNT_BODY: &str = "Invalid Monzo account ID";

/// 支払先が解決できない時のレスポンスボディ
pub const NO_PAYEE_BODY: &str = "No payee data found";

/// 転送処理のエラー型
#[derive(Debug, Error)]
pub enum RelayError {
    /// 受信ボディがJSONとして不正、またはフィールドの型が合わない
    #[error("Webhookボディの解析に失敗: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// 設定と異なるMonzo口座からの通知
    #[error("Invalid Monzo account ID")]
    AccountMismatch {
        /// 通知に含まれていた口座ID
        received: String,
    },

    /// 加盟店名・取引相手名・説明文がすべて空
    #[error("No payee data found")]
    NoPayee,

    /// 金額換算でオーバーフロー
    #[error("金額が範囲外です: {0}")]
    AmountOutOfRange(String),

    /// YNABリクエストボディのシリアライズに失敗
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// YNABへの送信に失敗（タイムアウト含む）
    #[error("YNABへの送信に失敗: {0}")]
    Send(#[from] SendError),
}

impl From<MappingError> for RelayError {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::NoPayee => RelayError::NoPayee,
            MappingError::AmountOutOfRange(amount) => RelayError::AmountOutOfRange(amount),
        }
    }
}

impl RelayError {
    /// 呼び出し元に返すHTTPステータス（すべて500）
    pub fn status_code(&self) -> u16 {
        500
    }

    /// 呼び出し元に返すボディ
    ///
    /// 口座不一致と支払先なしのみ固定文言、それ以外は空。
    pub fn response_body(&self) -> &'static str {
        match self {
            RelayError::AccountMismatch { .. } => INVALID_ACCOUNT_BODY,
            RelayError::NoPayee => NO_PAYEE_BODY,
            _ => "",
        }
    }
}

/// 呼び出し元へのレスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status_code: u16,
    pub body: String,
}

impl RelayResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }
}

impl From<&RelayError> for RelayResponse {
    fn from(err: &RelayError) -> Self {
        Self {
            status_code: err.status_code(),
            body: err.response_body().to_string(),
        }
    }
}

/// Monzo→YNAB転送ハンドラー
///
/// 設定・送信クライアント・エラー報告を起動時に一度だけ受け取り、
/// リクエスト間で読み取り専用に共有する。
pub struct TransactionRelay<S, R>
where
    S: TransactionSender,
    R: ErrorReporter,
{
    config: RelayConfig,
    sender: S,
    reporter: R,
}

impl<S, R> TransactionRelay<S, R>
where
    S: TransactionSender,
    R: ErrorReporter,
{
    /// 新しいTransactionRelayを作成
    pub fn new(config: RelayConfig, sender: S, reporter: R) -> Self {
        Self {
            config,
            sender,
            reporter,
        }
    }

    /// Webhookボディを処理
    ///
    /// # 処理フロー
    /// 1. ボディをMonzo通知としてパース
    /// 2. 口座IDを設定と照合
    /// 3. 支払先を解決してYNABトランザクションに変換
    /// 4. JSONにシリアライズしてYNABにPOST（再試行なし）
    /// 5. ダウンストリームのステータス行とボディを200で返す
    ///
    /// # 引数
    /// * `body` - 受信した生のリクエストボディ
    /// * `request_id` - Lambdaリクエスト ID（報告コンテキスト用）
    ///
    /// # 戻り値
    /// * `Ok(RelayResponse)` - 送信完了（ダウンストリームのステータスは問わない）
    /// * `Err(RelayError)` - いずれかの段階で失敗（報告済み）
    pub async fn handle(&self, body: &str, request_id: Option<&str>) -> Result<RelayResponse, RelayError> {
        debug!(body = body, "リクエストボディ");

        match self.relay(body).await {
            Ok(response) => Ok(response),
            Err(err) => {
                let mut context = ReportContext::new();
                context.insert("request".to_string(), body.to_string());
                if let Some(request_id) = request_id {
                    context.insert("request_id".to_string(), request_id.to_string());
                }
                self.reporter.report(&err, &context);
                Err(err)
            }
        }
    }

    async fn relay(&self, body: &str) -> Result<RelayResponse, RelayError> {
        let notification = InboundNotification::parse(body).map_err(RelayError::MalformedBody)?;

        info!(
            event_type = %notification.event_type,
            transaction_id = %notification.data.id,
            account_id = %notification.data.account_id,
            "Monzo通知を受信"
        );

        if notification.data.account_id != self.config.monzo_account_id() {
            warn!(
                received = %notification.data.account_id,
                expected = %self.config.monzo_account_id(),
                "Monzo口座IDが一致しない"
            );
            return Err(RelayError::AccountMismatch {
                received: notification.data.account_id,
            });
        }

        let transaction = map_transaction(&notification, self.config.ynab_account_id())?;

        info!(
            amount = %transaction.amount,
            payee = %transaction.payee_name,
            import_id = %transaction.import_id,
            "YNABトランザクションを構築"
        );

        let payload = serde_json::to_string(&TransactionEnvelope::new(transaction))
            .map_err(RelayError::Serialization)?;

        let downstream = self.sender.send(payload).await?;

        let post = format!("POST status: {} - {}", downstream.status_line, downstream.body);
        info!(response = %post, "YNAB送信完了");

        Ok(RelayResponse::ok(post))
    }
}

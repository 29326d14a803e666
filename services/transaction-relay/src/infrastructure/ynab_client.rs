// YnabClient - YNAB API用HTTPクライアント
//
// 変換済みトランザクションを `POST /budgets/{budget_id}/transactions` に送信する。
// 再試行は行わず、失敗はそのまま呼び出し元に返す。

use super::config::RelayConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// リクエストタイムアウト（秒）
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// 送信エラー
///
/// # エラー種別
/// - `ClientBuild`: HTTPクライアントの構築失敗
/// - `Timeout`: タイムアウト
/// - `NetworkError`: その他のトランスポートエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// HTTPクライアント構築エラー
    #[error("HTTPクライアントの構築に失敗: {0}")]
    ClientBuild(String),

    /// タイムアウト
    #[error("タイムアウト: {0}")]
    Timeout(String),

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    NetworkError(String),
}

/// ダウンストリームからのレスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamResponse {
    /// ステータス行（例: "201 Created"）
    pub status_line: String,
    /// レスポンスボディ全文
    pub body: String,
}

/// トランザクション送信用トレイト
///
/// 実際のYNAB APIクライアントとテスト用モックを差し替えられるようにする。
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// シリアライズ済みのJSONボディを送信
    ///
    /// # 戻り値
    /// * `Ok(DownstreamResponse)` - レスポンスを受信した（ステータスに関わらず）
    /// * `Err(SendError)` - トランスポート層の失敗
    async fn send(&self, payload: String) -> Result<DownstreamResponse, SendError>;
}

/// YNAB APIクライアント
#[derive(Clone)]
pub struct YnabClient {
    client: Client,
    /// 予算IDを埋め込み済みの送信先URL
    url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for YnabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YnabClient")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl YnabClient {
    /// 設定からYnabClientを作成（タイムアウト5秒）
    pub fn new(config: &RelayConfig) -> Result<Self, SendError> {
        Self::with_timeout(config, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// タイムアウトを指定してYnabClientを作成
    pub fn with_timeout(config: &RelayConfig, timeout: Duration) -> Result<Self, SendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            url: config.transactions_url(),
            api_key: config.ynab_api_key().to_string(),
            timeout,
        })
    }

    /// 送信先URLを取得
    pub fn url(&self) -> &str {
        &self.url
    }

    /// リクエストタイムアウトを取得
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl TransactionSender for YnabClient {
    #[instrument(skip(self, payload), fields(url = %self.url))]
    async fn send(&self, payload: String) -> Result<DownstreamResponse, SendError> {
        debug!("YNABにトランザクションを送信");

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "YNABへのリクエスト失敗");
                if e.is_timeout() {
                    SendError::Timeout(e.to_string())
                } else {
                    SendError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        // ボディ読み取りの失敗は空ボディとして扱う
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "YNABレスポンスボディの読み取りに失敗");
                String::new()
            }
        };

        info!(status = %status, "YNABからレスポンスを受信");

        Ok(DownstreamResponse {
            status_line: status.to_string(),
            body,
        })
    }
}

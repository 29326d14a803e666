// Webhook転送設定
//
// Monzo口座とYNAB APIの接続設定を環境変数から読み込む。
// 起動時に一度だけ構築し、ハンドラーに注入する。

use thiserror::Error;
use tracing::info;
use url::Url;

/// 受信を許可するMonzo口座IDの環境変数名
pub const MONZO_ACCOUNT_ID_ENV: &str = "MONZO_ACCOUNT_ID";

/// 送信先YNAB口座IDの環境変数名
pub const YNAB_ACCOUNT_ID_ENV: &str = "YNAB_ACCOUNT_ID";

/// YNAB APIキーの環境変数名
pub const YNAB_API_KEY_ENV: &str = "YNAB_API_KEY";

/// YNAB APIのURLテンプレートの環境変数名
pub const YNAB_BASE_URL_ENV: &str = "YNAB_BASE_URL";

/// 送信先YNAB予算IDの環境変数名
pub const YNAB_BUDGET_ID_ENV: &str = "YNAB_BUDGET_ID";

/// URLテンプレート内の予算IDプレースホルダー
pub const BUDGET_ID_PLACEHOLDER: &str = "%s";

/// 設定エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayConfigError {
    /// 必須の環境変数が未設定または空
    #[error("必須の環境変数が設定されていません: {0}")]
    MissingEnvVar(String),

    /// 環境変数の値が不正
    #[error("環境変数の値が不正です: {name} ({reason})")]
    InvalidEnvVar {
        /// 環境変数名
        name: String,
        /// 不正の理由
        reason: String,
    },
}

/// Webhook転送設定
///
/// # フィールド
/// - `monzo_account_id`: 受信を許可するMonzo口座ID
/// - `ynab_account_id`: 送信先のYNAB口座ID
/// - `ynab_api_key`: YNAB APIキー（Authorizationヘッダーに使用）
/// - `ynab_base_url`: 送信先URLテンプレート (例: "https://api.youneedabudget.com/v1/budgets/%s/transactions")
/// - `ynab_budget_id`: 送信先のYNAB予算ID
#[derive(Clone)]
pub struct RelayConfig {
    monzo_account_id: String,
    ynab_account_id: String,
    ynab_api_key: String,
    ynab_base_url: String,
    ynab_budget_id: String,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("monzo_account_id", &self.monzo_account_id)
            .field("ynab_account_id", &self.ynab_account_id)
            .field("ynab_base_url", &self.ynab_base_url)
            .field("ynab_budget_id", &self.ynab_budget_id)
            .finish_non_exhaustive()
    }
}

impl RelayConfig {
    /// 新しい設定を作成
    pub fn new(
        monzo_account_id: impl Into<String>,
        ynab_account_id: impl Into<String>,
        ynab_api_key: impl Into<String>,
        ynab_base_url: impl Into<String>,
        ynab_budget_id: impl Into<String>,
    ) -> Self {
        Self {
            monzo_account_id: monzo_account_id.into(),
            ynab_account_id: ynab_account_id.into(),
            ynab_api_key: ynab_api_key.into(),
            ynab_base_url: ynab_base_url.into(),
            ynab_budget_id: ynab_budget_id.into(),
        }
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数（すべて必須、空文字列は未設定扱い）
    /// - `MONZO_ACCOUNT_ID`
    /// - `YNAB_ACCOUNT_ID`
    /// - `YNAB_API_KEY`
    /// - `YNAB_BASE_URL`: `%s` を1つ含むURLテンプレート
    /// - `YNAB_BUDGET_ID`
    ///
    /// # 戻り値
    /// - `Ok(RelayConfig)`: 設定が正常に読み込まれた
    /// - `Err(RelayConfigError)`: 未設定または不正な値がある
    pub fn from_env() -> Result<Self, RelayConfigError> {
        let config = Self {
            monzo_account_id: required_env(MONZO_ACCOUNT_ID_ENV)?,
            ynab_account_id: required_env(YNAB_ACCOUNT_ID_ENV)?,
            ynab_api_key: required_env(YNAB_API_KEY_ENV)?,
            ynab_base_url: required_env(YNAB_BASE_URL_ENV)?,
            ynab_budget_id: required_env(YNAB_BUDGET_ID_ENV)?,
        };

        config.validate()?;

        info!(
            monzo_account_id = %config.monzo_account_id,
            ynab_account_id = %config.ynab_account_id,
            ynab_budget_id = %config.ynab_budget_id,
            ynab_base_url = %config.ynab_base_url,
            ynab_api_key_set = true,
            "環境変数から設定を読み込み"
        );

        Ok(config)
    }

    /// URLテンプレートを検証
    ///
    /// プレースホルダーを含み、予算IDを埋め込んだ結果が有効なURLであること。
    pub fn validate(&self) -> Result<(), RelayConfigError> {
        if !self.ynab_base_url.contains(BUDGET_ID_PLACEHOLDER) {
            return Err(RelayConfigError::InvalidEnvVar {
                name: YNAB_BASE_URL_ENV.to_string(),
                reason: format!("プレースホルダー{}が含まれていません", BUDGET_ID_PLACEHOLDER),
            });
        }

        Url::parse(&self.transactions_url()).map_err(|e| RelayConfigError::InvalidEnvVar {
            name: YNAB_BASE_URL_ENV.to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Monzo口座IDを取得
    pub fn monzo_account_id(&self) -> &str {
        &self.monzo_account_id
    }

    /// YNAB口座IDを取得
    pub fn ynab_account_id(&self) -> &str {
        &self.ynab_account_id
    }

    /// YNAB APIキーを取得
    pub fn ynab_api_key(&self) -> &str {
        &self.ynab_api_key
    }

    /// トランザクション登録URLを構築
    ///
    /// テンプレート中の最初の`%s`を予算IDで置き換える。
    pub fn transactions_url(&self) -> String {
        self.ynab_base_url
            .replacen(BUDGET_ID_PLACEHOLDER, &self.ynab_budget_id, 1)
    }
}

/// 必須の環境変数を読み込む（未設定・空はエラー）
fn required_env(name: &str) -> Result<String, RelayConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(RelayConfigError::MissingEnvVar(name.to_string())),
    }
}

// アプリケーション層モジュール
pub mod transaction_relay;

// 再エクスポート
pub use transaction_relay::{RelayError, RelayResponse, TransactionRelay};

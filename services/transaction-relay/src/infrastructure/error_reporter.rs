/// エラー追跡への報告
///
/// 失敗した分岐ごとにエラーとコンテキスト（受信ボディ等）を報告する。
use std::collections::BTreeMap;
use std::error::Error;

use tracing::error;

/// 報告に添付するコンテキスト（例: `"request"` → 受信ボディ）
pub type ReportContext = BTreeMap<String, String>;

/// エラー報告用トレイト
///
/// 外部のエラー追跡サービスを抽象化し、テストでは記録用の実装に差し替える。
/// 失敗1件につき1回呼ばれるため、同期的な報告で構わない。
pub trait ErrorReporter: Send + Sync {
    /// エラーを報告
    ///
    /// # 引数
    /// * `error` - 報告するエラー
    /// * `context` - 付随情報
    fn report(&self, error: &(dyn Error + 'static), context: &ReportContext);
}

/// tracingのerrorレベルログとして報告する実装
///
/// CloudWatch Logs上のエラーログがそのまま追跡対象になる。
#[derive(Debug, Clone, Default)]
pub struct TracingErrorReporter;

impl TracingErrorReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, err: &(dyn Error + 'static), context: &ReportContext) {
        // エラーチェーンを連結して原因まで残す
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        error!(
            error = %err,
            causes = ?causes,
            context = ?context,
            "エラーを報告"
        );
    }
}

/// Monzo Webhook受信HTTP Lambdaエントリポイント
///
/// API Gateway / Lambda Function URL経由でMonzoの通知を受け取り、
/// YNABにトランザクションとして転送する。
///
/// 設定が不完全な場合はエラーを報告してコールドスタート時に終了する。
use lambda_http::{run, service_fn, Body, Request, RequestExt, Response};
use lambda_runtime::Error;
use transaction_relay::application::{RelayResponse, TransactionRelay};
use transaction_relay::infrastructure::{
    init_logging, ErrorReporter, RelayConfig, ReportContext, TracingErrorReporter, YnabClient,
};
use tracing::{error, info, info_span, Instrument};

type Relay = TransactionRelay<YnabClient, TracingErrorReporter>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let reporter = TracingErrorReporter::new();

    // 環境変数の検証（失敗時は起動しない）
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            reporter.report(&err, &ReportContext::new());
            error!(error = %err, "環境変数の読み込みに失敗");
            return Err(err.into());
        }
    };

    let client = match YnabClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            reporter.report(&err, &ReportContext::new());
            error!(error = %err, "YnabClientの初期化に失敗");
            return Err(err.into());
        }
    };

    info!(
        url = %client.url(),
        timeout_ms = client.timeout().as_millis() as u64,
        "Webhook Lambda関数を初期化"
    );

    let relay = TransactionRelay::new(config, client, reporter);

    let relay = &relay;
    run(service_fn(move |request: Request| async move { handler(relay, request).await })).await
}

/// HTTPリクエストハンドラー
///
/// 処理結果を`RelayResponse`に変換して返す。リクエスト単位の失敗は
/// 500レスポンスとして返し、Lambda自体はエラーにしない。
async fn handler(relay: &Relay, request: Request) -> Result<Response<Body>, Error> {
    let request_id = request
        .lambda_context_ref()
        .map(|ctx| ctx.request_id.clone());

    let span = info_span!(
        "webhook",
        request_id = request_id.as_deref().unwrap_or("unknown")
    );

    async move {
        info!("Lambdaリクエスト受信");

        // UTF-8でないバイト列は置換文字に変わり、JSON解析エラーとして扱われる
        let body = match request.body() {
            Body::Text(text) => text.clone(),
            Body::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            _ => String::new(),
        };

        let response = match relay.handle(&body, request_id.as_deref()).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Webhook処理エラー");
                RelayResponse::from(&err)
            }
        };

        info!(status = response.status_code, "レスポンス送信");

        let response = Response::builder()
            .status(response.status_code)
            .body(Body::Text(response.body))?;

        Ok::<_, Error>(response)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as DownstreamStatus;
    use axum::routing::post;
    use axum::Router;
    use lambda_http::http::Request as HttpRequest;

    const VALID_BODY: &str = r#"{"type":"transaction.created","data":{"account_id":"acc_123","amount":150,"created":"2020-01-01T00:00:00Z","description":"Coffee Shop","id":"tx_1"}}"#;

    /// "ok"を返すダウンストリームを起動してRelayを作成
    async fn create_test_relay() -> Relay {
        init_logging();

        let app = Router::new().route(
            "/v1/budgets/{budget_id}/transactions",
            post(|| async { (DownstreamStatus::OK, "ok") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = RelayConfig::new(
            "acc_123",
            "ynab-account",
            "test-key",
            format!("http://{}/v1/budgets/%s/transactions", addr),
            "budget-1",
        );
        let client = YnabClient::new(&config).unwrap();
        TransactionRelay::new(config, client, TracingErrorReporter::new())
    }

    fn post_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header("Content-Type", "application/json")
            .body(Body::Text(body.to_string()))
            .unwrap()
    }

    fn body_text(response: &Response<Body>) -> String {
        match response.body() {
            Body::Text(text) => text.clone(),
            Body::Binary(bytes) => String::from_utf8(bytes.clone()).unwrap(),
            Body::Empty => String::new(),
            _ => panic!("予期しないBody型"),
        }
    }

    #[tokio::test]
    async fn test_handler_returns_200_with_downstream_status() {
        let relay = create_test_relay().await;

        let response = handler(&relay, post_request(VALID_BODY)).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_text(&response), "POST status: 200 OK - ok");
    }

    #[tokio::test]
    async fn test_handler_returns_500_for_other_account() {
        let relay = create_test_relay().await;
        let body = VALID_BODY.replace("acc_123", "acc_999");

        let response = handler(&relay, post_request(&body)).await.unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(body_text(&response), "Invalid Monzo account ID");
    }

    #[tokio::test]
    async fn test_handler_returns_500_for_missing_payee() {
        let relay = create_test_relay().await;
        let body = VALID_BODY.replace("Coffee Shop", "");

        let response = handler(&relay, post_request(&body)).await.unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(body_text(&response), "No payee data found");
    }

    #[tokio::test]
    async fn test_handler_survives_malformed_body() {
        let relay = create_test_relay().await;

        let response = handler(&relay, post_request("garbage")).await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(body_text(&response), "");

        // 同じインスタンスで次のリクエストを処理できる
        let response = handler(&relay, post_request(VALID_BODY)).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_handler_empty_body_is_500() {
        let relay = create_test_relay().await;
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .body(Body::Empty)
            .unwrap();

        let response = handler(&relay, request).await.unwrap();

        assert_eq!(response.status(), 500);
    }
}

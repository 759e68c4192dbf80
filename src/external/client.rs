use std::sync::LazyLock;
use std::time::Duration;

/// User-Agent sent with every outbound request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Global HTTP client instance
///
/// Initialized lazily on first access and shared by the Pushbullet client,
/// the webcam snapshot fetcher and the plugin API transport.
///
/// # Features
/// - **Connection pooling**: Reuses TCP connections to the same host
/// - **Compression**: gzip, deflate, brotli and zstd
/// - **HTTP/2**: Adaptive window sizing and keep-alive
/// - **Timeouts**: 30s request timeout, 10s connect timeout; callers may
///   override the request timeout per request
/// - **TLS**: Rustls, no OpenSSL dependency
///
/// # Example
/// ```ignore
/// use crate::external::client::HTTP_CLIENT;
///
/// async fn fetch_snapshot(url: &str) -> Result<bytes::Bytes, reqwest::Error> {
///     HTTP_CLIENT.get(url).send().await?.error_for_status()?.bytes().await
/// }
/// ```
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        // Enable compression (gzip, deflate, brotli, zstd)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build tuned HTTP client, using defaults");
            reqwest::Client::new()
        })
});

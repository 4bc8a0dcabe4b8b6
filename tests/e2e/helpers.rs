use keymirror::blacklist::BlacklistSet;
use keymirror::config::types::AppConfig;
use keymirror::context::AppContext;
use keymirror::server;

use russh::client::KeyboardInteractiveAuthResponse;
use russh::keys::{HashAlg, PrivateKey, PrivateKeyWithHashAlg};
use russh::ChannelMsg;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Holds references to a running keymirror server
pub struct TestServer {
    pub port: u16,
    pub ctx: Arc<AppContext>,
    pub shutdown: CancellationToken,
    pub _task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Minimal russh client handler for testing
pub struct TestClientHandler;

impl russh::client::Handler for TestClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

pub fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/keys")
        .join(name)
}

pub fn load_fixture_key(name: &str) -> PrivateKey {
    let text = std::fs::read_to_string(fixture_path(name)).unwrap();
    russh::keys::decode_secret_key(&text, None).unwrap()
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.listen = "127.0.0.1:0".to_string();
    config
}

/// Start a server on an OS-assigned port with an ephemeral host key.
pub async fn start_server(config: AppConfig, blacklist: BlacklistSet) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let host_key =
        PrivateKey::random(&mut rand::rngs::OsRng, russh::keys::Algorithm::Ed25519).unwrap();
    let ssh_config = Arc::new(server::build_ssh_config(&config, host_key));
    let ctx = Arc::new(AppContext::new(config, blacklist));
    let shutdown = CancellationToken::new();

    let task = {
        let ctx = ctx.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = server::serve(listener, ssh_config, ctx, shutdown).await;
        })
    };

    TestServer {
        port,
        ctx,
        shutdown,
        _task: task,
    }
}

pub async fn connect(port: u16) -> russh::client::Handle<TestClientHandler> {
    let client_config = Arc::new(russh::client::Config::default());
    russh::client::connect(
        client_config,
        format!("127.0.0.1:{}", port),
        TestClientHandler,
    )
    .await
    .unwrap()
}

/// Offer a key; the server must always refuse it.
pub async fn offer_key(handle: &mut russh::client::Handle<TestClientHandler>, key: PrivateKey) {
    let hash = if key.algorithm().is_rsa() {
        Some(HashAlg::Sha256)
    } else {
        None
    };
    let result = handle
        .authenticate_publickey("tester", PrivateKeyWithHashAlg::new(Arc::new(key), hash))
        .await
        .unwrap();
    assert!(!result.success(), "public key auth must never succeed");
}

pub async fn keyboard_interactive(handle: &mut russh::client::Handle<TestClientHandler>) {
    let response = handle
        .authenticate_keyboard_interactive_start("tester", None)
        .await
        .unwrap();
    assert!(
        matches!(response, KeyboardInteractiveAuthResponse::Success),
        "keyboard-interactive must be accepted"
    );
}

/// Collect channel data until the server closes the channel.
pub async fn read_until_close(
    channel: &mut russh::Channel<russh::client::Msg>,
    limit: Duration,
) -> String {
    let mut out = Vec::new();
    let deadline = Instant::now() + limit;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, channel.wait()).await {
            Ok(Some(ChannelMsg::Data { data })) => out.extend_from_slice(&data),
            Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) | Ok(None) => break,
            Ok(Some(_)) => {}
            Err(_) => panic!("timed out waiting for the key report"),
        }
    }
    String::from_utf8(out).unwrap()
}

/// Wait until the registry holds no sessions, or fail after `limit`.
pub async fn wait_for_empty_registry(ctx: &AppContext, limit: Duration) {
    let deadline = Instant::now() + limit;
    while !ctx.registry.is_empty() {
        assert!(
            Instant::now() < deadline,
            "registry still has {} session(s)",
            ctx.registry.len()
        );
        sleep(Duration::from_millis(20)).await;
    }
}

//! Server-wide lifecycle across both engines: shared connection registry,
//! shutdown broadcast and coordinated teardown.

use serde_json::json;
use serverguard_core::desktop::{FrameCapturer, InputInjector, MouseButton};
use serverguard_core::transport::memory;
use serverguard_core::{
    ConnectionRegistry, Error, Result, ScreenConfig, ScreenEngine, SessionRegistry, ShellSpec,
    ShutdownController, TerminalConfig, TerminalEngine, WorkerPool,
};
use std::sync::Arc;
use std::time::Duration;

struct StaticDesktop;

impl FrameCapturer for StaticDesktop {
    fn capture_frame(&self, _quality: u8, _scale: f32) -> Result<Vec<u8>> {
        Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
    }

    fn screen_size(&self) -> Result<(u32, u32)> {
        Ok((800, 600))
    }
}

impl InputInjector for StaticDesktop {
    fn move_to(&self, _x: i32, _y: i32) -> Result<()> {
        Ok(())
    }
    fn click(&self, _x: i32, _y: i32, _button: MouseButton, _clicks: u32) -> Result<()> {
        Ok(())
    }
    fn drag(&self, _from: Option<(i32, i32)>, _to: (i32, i32), _button: MouseButton) -> Result<()> {
        Ok(())
    }
    fn scroll(&self, _x: i32, _y: i32, _amount: i32) -> Result<()> {
        Ok(())
    }
    fn key_press(&self, _key: &str) -> Result<()> {
        Ok(())
    }
    fn key_down(&self, _key: &str) -> Result<()> {
        Ok(())
    }
    fn key_up(&self, _key: &str) -> Result<()> {
        Ok(())
    }
    fn type_text(&self, _text: &str) -> Result<()> {
        Err(Error::Unsupported("typing".into()))
    }
    fn hotkey(&self, _keys: &[String]) -> Result<()> {
        Ok(())
    }
}

struct Server {
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    shutdown: Arc<ShutdownController>,
    terminal: Arc<TerminalEngine>,
    screen: Arc<ScreenEngine>,
}

fn server(start: &std::path::Path) -> Server {
    let sessions = Arc::new(SessionRegistry::new());
    let connections = Arc::new(ConnectionRegistry::new());
    let shutdown = ShutdownController::with_drain_timeout(Duration::from_secs(5));
    let terminal = TerminalEngine::new(sessions.clone(), connections.clone(), &TerminalConfig::default())
        .with_shell(ShellSpec::new("sh"))
        .with_start_directory(start)
        .with_shutdown(shutdown.token());
    let desktop = Arc::new(StaticDesktop);
    let screen = ScreenEngine::new(
        sessions.clone(),
        connections.clone(),
        Arc::new(WorkerPool::new(2)),
        desktop.clone(),
        desktop,
        &ScreenConfig::default(),
    )
    .with_shutdown(shutdown.token());

    Server {
        sessions,
        connections,
        shutdown,
        terminal: Arc::new(terminal),
        screen: Arc::new(screen),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_broadcast_then_shutdown_tears_everything_down() {
    let dir = tempfile::tempdir().unwrap();
    let srv = server(dir.path());

    let (sink, stream, mut term_client) = memory::channel();
    let engine = srv.terminal.clone();
    let guard = srv.shutdown.register_session();
    let term_task = tokio::spawn(async move {
        let _guard = guard;
        engine.run("t1", sink, stream).await;
    });
    term_client.recv_json().await.unwrap();

    let (sink, stream, mut screen_client) = memory::channel();
    let engine = srv.screen.clone();
    let guard = srv.shutdown.register_session();
    let screen_task = tokio::spawn(async move {
        let _guard = guard;
        engine.run_stream("s1", sink, stream).await;
    });
    screen_client.recv_type("frame").await.unwrap();

    assert_eq!(srv.connections.count().await, 2);
    assert_eq!(srv.shutdown.active_sessions(), 2);

    let notice = json!({"type": "system", "message": "Server shutting down"});
    assert_eq!(srv.connections.broadcast(&notice).await.unwrap(), 2);
    assert_eq!(term_client.recv_type("system").await.unwrap(), notice);
    assert_eq!(screen_client.recv_type("system").await.unwrap(), notice);

    srv.shutdown.shutdown().await;
    tokio::time::timeout(Duration::from_secs(5), term_task)
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), screen_task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(srv.shutdown.active_sessions(), 0);
    assert_eq!(srv.sessions.terminal_count().await, 0);
    assert_eq!(srv.sessions.screen_count().await, 0);
    assert_eq!(srv.connections.count().await, 0);
}

#[tokio::test]
async fn test_broadcast_drops_dead_connections() {
    let dir = tempfile::tempdir().unwrap();
    let srv = server(dir.path());

    let (sink, stream, mut client) = memory::channel();
    let engine = srv.screen.clone();
    tokio::spawn(async move { engine.run_control("c1", sink, stream).await });

    // control channels register as connections without creating a session
    client.send_json(&json!({"type": "ping"})).unwrap();
    client.recv_type("pong").await.unwrap();
    assert_eq!(srv.connections.count().await, 1);

    client.drop_receiver();
    let delivered = srv
        .connections
        .broadcast(&json!({"type": "system", "message": "bye"}))
        .await
        .unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(srv.connections.count().await, 0);
}

#[tokio::test]
async fn test_control_reports_backend_refusal() {
    let dir = tempfile::tempdir().unwrap();
    let srv = server(dir.path());

    let (sink, stream, mut client) = memory::channel();
    let engine = srv.screen.clone();
    tokio::spawn(async move { engine.run_control("c1", sink, stream).await });

    client
        .send_json(&json!({"type": "control", "data": {"type": "key_type", "text": "hi"}}))
        .unwrap();
    let reply = client.recv_type("control_response").await.unwrap();
    assert_eq!(reply["success"], false);

    client
        .send_json(&json!({"type": "control", "data": {"type": "mouse_move", "x": 1, "y": 2}}))
        .unwrap();
    let reply = client.recv_type("control_response").await.unwrap();
    assert_eq!(reply["success"], true);
}

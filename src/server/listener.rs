//! Sentinel server
//!
//! Starts the sampler thread and the broadcaster task, serves WebSocket
//! subscribers and tears everything down on shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::game::StatePoller;
use crate::mailbox::Mailbox;
use crate::registry::{command_channel, SubscriberRegistry};
use crate::server::config::ServerConfig;
use crate::server::connection::{router, ConnectionState};
use crate::shutdown::Shutdown;
use crate::vision::Sampler;

/// Minimap sentinel server
pub struct SentinelServer<P: StatePoller> {
    config: ServerConfig,
    sampler: Sampler,
    poller: P,
    mailbox: Arc<Mailbox>,
}

impl<P: StatePoller> SentinelServer<P> {
    /// Create a server
    ///
    /// `mailbox` must be the one the sampler publishes to.
    pub fn new(config: ServerConfig, sampler: Sampler, poller: P, mailbox: Arc<Mailbox>) -> Self {
        Self {
            config,
            sampler,
            poller,
            mailbox,
        }
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Bind the configured address and run until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Run on an already bound listener until `shutdown` resolves
    ///
    /// Once shutdown is requested the sampler finishes its current
    /// iteration, the broadcaster closes every subscriber and the listener
    /// stops accepting. Dropping the returned future has the same effect on
    /// the sampler and the broadcaster.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "WebSocket server listening");

        let stop = Shutdown::new();
        let sampler = self.sampler.spawn(stop.signal())?;

        let (commands, command_rx) = command_channel();
        let broadcaster = Broadcaster::new(
            self.poller,
            self.mailbox,
            SubscriberRegistry::new(self.config.send_timeout),
            command_rx,
            self.config.tick_interval,
        );
        let broadcast_task = tokio::spawn(broadcaster.run(stop.signal()));

        let state = ConnectionState::new(commands, self.config.max_connections, stop.signal());
        let app = router(state);

        // owned by this future: dropping `serve` drops every `Shutdown`
        // handle, which stops the sampler and broadcaster as well
        let trigger = stop.clone();
        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            trigger.trigger();
        })
        .await;

        // serve may also end on its own error
        stop.trigger();

        match broadcast_task.await {
            Ok(stats) => tracing::info!(
                ticks = stats.ticks,
                alerts = stats.alerts,
                heartbeats = stats.heartbeats,
                dropped_subscribers = stats.dropped_subscribers,
                "Broadcaster stopped"
            ),
            Err(e) => tracing::error!(error = %e, "Broadcaster task failed"),
        }

        match tokio::task::spawn_blocking(move || sampler.join()).await {
            Ok(Ok(stats)) => tracing::info!(
                iterations = stats.iterations,
                detections = stats.detections,
                failed_frames = stats.failed_frames,
                effective_fps = stats.effective_fps(),
                "Sampler stopped"
            ),
            _ => tracing::error!("Sampler thread panicked"),
        }

        served?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::broadcast::Event;
    use crate::vision::{
        BoundingBox, CaptureRegion, Candidate, Classifier, ClassifierMode, Frame, Model,
        SamplerConfig, SyntheticSource, ZoneTable,
    };

    const OP_TEXT: u8 = 0x1;
    const OP_CLOSE: u8 = 0x8;

    struct FixedPoller(Option<f64>);

    impl StatePoller for FixedPoller {
        async fn poll(&self) -> Option<f64> {
            self.0
        }
    }

    /// Emits a single candidate once the gate opens
    struct Gated {
        open: Arc<AtomicBool>,
        fired: bool,
    }

    impl Model for Gated {
        fn infer(&mut self, _frame: &Frame) -> Result<Vec<Candidate>> {
            if self.fired || !self.open.load(Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.fired = true;
            Ok(vec![Candidate::new(
                "Ahri",
                0.9,
                BoundingBox::new(4, 4, 12, 12),
            )])
        }
    }

    /// Records when the sampler thread releases its model
    struct DropFlag(Arc<AtomicBool>);

    impl Model for DropFlag {
        fn infer(&mut self, _frame: &Frame) -> Result<Vec<Candidate>> {
            Ok(Vec::new())
        }
    }

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    struct Running {
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<()>>,
    }

    async fn start(config: ServerConfig, gate: Arc<AtomicBool>) -> Running {
        let region = CaptureRegion::new(0, 0, 64, 64).unwrap();
        let mailbox = Arc::new(Mailbox::new());
        let sampler = Sampler::new(
            SamplerConfig::new(region).fps(50).mode(ClassifierMode::Model),
            Box::new(SyntheticSource::new()),
            Classifier::Model(Box::new(Gated {
                open: gate,
                fired: false,
            })),
            Arc::new(ZoneTable::default()),
            Arc::clone(&mailbox),
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = SentinelServer::new(config, sampler, FixedPoller(Some(42.0)), mailbox);

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));

        Running {
            addr,
            shutdown: tx,
            task,
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig::default().tick_interval(Duration::from_millis(20))
    }

    /// Send an upgrade request and return the response head
    async fn handshake(addr: SocketAddr) -> (TcpStream, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET / HTTP/1.1\r\n\
             Host: {addr}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
             Sec-WebSocket-Version: 13\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        // byte at a time so no frame data is consumed
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            stream.read_exact(&mut byte).await.unwrap();
            head.push(byte[0]);
        }
        (stream, String::from_utf8(head).unwrap())
    }

    async fn connect(addr: SocketAddr) -> TcpStream {
        let (stream, head) = handshake(addr).await;
        assert!(head.starts_with("HTTP/1.1 101"), "unexpected response: {head}");
        stream
    }

    /// Read one unmasked server frame
    async fn read_frame(stream: &mut TcpStream) -> (u8, Vec<u8>) {
        let mut header = [0u8; 2];
        stream.read_exact(&mut header).await.unwrap();
        let opcode = header[0] & 0x0f;
        let len = match header[1] & 0x7f {
            126 => {
                let mut ext = [0u8; 2];
                stream.read_exact(&mut ext).await.unwrap();
                u16::from_be_bytes(ext) as usize
            }
            127 => {
                let mut ext = [0u8; 8];
                stream.read_exact(&mut ext).await.unwrap();
                u64::from_be_bytes(ext) as usize
            }
            n => n as usize,
        };
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.unwrap();
        (opcode, payload)
    }

    async fn next_event(stream: &mut TcpStream) -> Event {
        let (opcode, payload) = tokio::time::timeout(Duration::from_secs(5), read_frame(stream))
            .await
            .expect("no frame within timeout");
        assert_eq!(opcode, OP_TEXT);
        serde_json::from_slice(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_subscriber_receives_heartbeat_then_alert() {
        let gate = Arc::new(AtomicBool::new(false));
        let running = start(test_config(), Arc::clone(&gate)).await;
        let mut ws = connect(running.addr).await;

        let first = next_event(&mut ws).await;
        assert_eq!(
            first,
            Event::Heartbeat {
                game_time: Some(42.0),
                in_game: true
            }
        );

        gate.store(true, Ordering::SeqCst);
        let mut alert = None;
        for _ in 0..100 {
            let event = next_event(&mut ws).await;
            if event.is_alert() {
                alert = Some(event);
                break;
            }
        }

        match alert.expect("alert never arrived") {
            Event::Alert {
                label,
                confidence,
                game_time,
                ..
            } => {
                assert_eq!(label, "Ahri");
                assert!((confidence - 0.9).abs() < f32::EPSILON);
                assert_eq!(game_time, Some(42.0));
            }
            other => panic!("expected alert, got {other:?}"),
        }

        running.shutdown.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), running.task)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscribers() {
        let running = start(test_config(), Arc::new(AtomicBool::new(false))).await;
        let mut ws = connect(running.addr).await;
        next_event(&mut ws).await;

        running.shutdown.send(()).unwrap();

        let mut saw_close = false;
        for _ in 0..100 {
            let (opcode, _) = tokio::time::timeout(Duration::from_secs(5), read_frame(&mut ws))
                .await
                .expect("no frame within timeout");
            if opcode == OP_CLOSE {
                saw_close = true;
                break;
            }
        }
        assert!(saw_close);

        let result = tokio::time::timeout(Duration::from_secs(5), running.task)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let running = start(
            test_config().max_connections(1),
            Arc::new(AtomicBool::new(false)),
        )
        .await;

        let mut first = connect(running.addr).await;
        next_event(&mut first).await;

        let (_second, head) = handshake(running.addr).await;
        assert!(head.starts_with("HTTP/1.1 503"), "unexpected response: {head}");

        // the first subscriber is unaffected
        next_event(&mut first).await;

        running.shutdown.send(()).unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(5), running.task).await;
    }

    #[tokio::test]
    async fn test_plain_http_rejected() {
        let running = start(test_config(), Arc::new(AtomicBool::new(false))).await;

        let mut stream = TcpStream::connect(running.addr).await.unwrap();
        let request = format!(
            "GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            running.addr
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8_lossy(&response);
        assert!(!response.starts_with("HTTP/1.1 101"));
        assert!(response.starts_with("HTTP/1.1 4"), "unexpected response: {response}");

        running.shutdown.send(()).unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(5), running.task).await;
    }

    #[tokio::test]
    async fn test_bind_failure_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let region = CaptureRegion::new(0, 0, 8, 8).unwrap();
        let mailbox = Arc::new(Mailbox::new());
        let sampler = Sampler::new(
            SamplerConfig::new(region).mode(ClassifierMode::Model),
            Box::new(SyntheticSource::new()),
            Classifier::Model(Box::new(Gated {
                open: Arc::new(AtomicBool::new(false)),
                fired: false,
            })),
            Arc::new(ZoneTable::default()),
            Arc::clone(&mailbox),
        )
        .unwrap();
        let server =
            SentinelServer::new(ServerConfig::with_addr(addr), sampler, FixedPoller(None), mailbox);

        let result = server.run_until(std::future::pending()).await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[tokio::test]
    async fn test_dropping_serve_stops_sampler() {
        let released = Arc::new(AtomicBool::new(false));
        let region = CaptureRegion::new(0, 0, 16, 16).unwrap();
        let mailbox = Arc::new(Mailbox::new());
        let sampler = Sampler::new(
            SamplerConfig::new(region).fps(50).mode(ClassifierMode::Model),
            Box::new(SyntheticSource::new()),
            Classifier::Model(Box::new(DropFlag(Arc::clone(&released)))),
            Arc::new(ZoneTable::default()),
            Arc::clone(&mailbox),
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = SentinelServer::new(test_config(), sampler, FixedPoller(None), mailbox);
        let task = tokio::spawn(server.serve(listener, std::future::pending()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!released.load(Ordering::SeqCst));

        task.abort();
        let _ = task.await;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !released.load(Ordering::SeqCst) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(released.load(Ordering::SeqCst));
    }
}

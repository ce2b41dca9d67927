use crate::error::{AppError, Result};
use crate::state::Config;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::{transition, Command, Event, Phase};
use super::handler::FrameHandler;
use super::types::{CableCommand, NOTIFICATIONS_CHANNEL};

/// One open cable connection, reduced to text in and text out.
///
/// `inbound` yields `None` once the connection is gone for any reason.
/// Dropping the socket closes it.
pub struct CableSocket {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl CableSocket {
    pub fn new(
        outbound: mpsc::UnboundedSender<String>,
        inbound: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self { outbound, inbound }
    }

    pub fn send(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }
}

#[async_trait]
pub trait CableConnector: Send + Sync + 'static {
    async fn connect(&self, url: Url) -> Result<CableSocket>;
}

/// Connects over a real WebSocket.
pub struct TungsteniteConnector;

#[async_trait]
impl CableConnector for TungsteniteConnector {
    async fn connect(&self, url: Url) -> Result<CableSocket> {
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut sender, mut receiver) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = out_rx.recv() => match outgoing {
                        Some(text) => {
                            if sender.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            let _ = sender.close().await;
                            break;
                        }
                    },
                    incoming = receiver.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if in_tx.send(text.as_str().to_owned()).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!("WebSocket read error: {}", e);
                            break;
                        }
                    },
                }
            }
        });

        Ok(CableSocket::new(out_tx, in_rx))
    }
}

/// Keeps the notification feed live over the cable connection.
pub struct LiveClient<C: CableConnector> {
    config: Arc<Config>,
    connector: Arc<C>,
    handler: FrameHandler,
}

impl<C: CableConnector> LiveClient<C> {
    pub fn new(config: Arc<Config>, connector: C, handler: FrameHandler) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
            handler,
        }
    }

    /// Starts the client. It connects whenever `credentials` holds a token
    /// and stops when the returned handle is shut down or dropped.
    pub fn spawn(self, credentials: watch::Receiver<Option<String>>) -> LiveClientHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let driver = Driver {
            config: self.config,
            connector: self.connector,
            handler: self.handler,
            credentials,
            phase: Phase::Idle,
            token: None,
            connection_id: None,
            pending: None,
            socket: None,
            retry: None,
        };

        LiveClientHandle {
            shutdown: Some(shutdown_tx),
            task: tokio::spawn(driver.run(shutdown_rx)),
        }
    }
}

pub struct LiveClientHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl LiveClientHandle {
    /// Tears the connection down and waits for the client task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for LiveClientHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Wake {
    Shutdown,
    CredentialChanged(bool),
    Connected(Result<CableSocket>),
    Frame(Option<String>),
    RetryElapsed,
}

struct Driver<C: CableConnector> {
    config: Arc<Config>,
    connector: Arc<C>,
    handler: FrameHandler,
    credentials: watch::Receiver<Option<String>>,
    phase: Phase,
    token: Option<String>,
    connection_id: Option<Uuid>,
    pending: Option<BoxFuture<'static, Result<CableSocket>>>,
    socket: Option<CableSocket>,
    retry: Option<Pin<Box<Sleep>>>,
}

impl<C: CableConnector> Driver<C> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        if let Some(event) = self.observe_credential() {
            self.dispatch(event);
        }

        loop {
            let wake = tokio::select! {
                biased;
                _ = &mut shutdown => Wake::Shutdown,
                changed = self.credentials.changed() => Wake::CredentialChanged(changed.is_ok()),
                result = next_connect(&mut self.pending) => Wake::Connected(result),
                frame = next_frame(&mut self.socket) => Wake::Frame(frame),
                _ = next_retry(&mut self.retry) => Wake::RetryElapsed,
            };

            let event = match wake {
                Wake::Shutdown | Wake::CredentialChanged(false) => Event::Teardown,
                Wake::CredentialChanged(true) => match self.observe_credential() {
                    Some(event) => event,
                    None => continue,
                },
                Wake::Connected(result) => {
                    self.pending = None;
                    match result {
                        Ok(socket) => {
                            self.socket = Some(socket);
                            Event::Opened
                        }
                        Err(e) => {
                            warn!("Notification cable connect failed: {}", e);
                            Event::Lost
                        }
                    }
                }
                Wake::Frame(Some(text)) => {
                    self.handler.handle_text(&text);
                    continue;
                }
                Wake::Frame(None) => {
                    warn!("Notification cable {:?} disconnected", self.connection_id);
                    Event::Lost
                }
                Wake::RetryElapsed => {
                    self.retry = None;
                    self.token = self.credentials.borrow_and_update().clone();
                    Event::RetryElapsed {
                        credential_present: self.token.is_some(),
                    }
                }
            };

            self.dispatch(event);

            if event == Event::Teardown {
                info!("Notification cable client stopped");
                break;
            }
        }
    }

    /// Compares the latest credential with the one last acted on.
    fn observe_credential(&mut self) -> Option<Event> {
        let latest = self.credentials.borrow_and_update().clone();
        if latest == self.token {
            return None;
        }

        self.token = latest;
        Some(match self.token {
            Some(_) => Event::CredentialSet,
            None => Event::CredentialCleared,
        })
    }

    fn dispatch(&mut self, event: Event) {
        let step = transition(self.phase, event);
        if step.next != self.phase {
            debug!("Notification cable {:?} -> {:?} on {:?}", self.phase, step.next, event);
        }
        self.phase = step.next;

        for command in step.commands {
            self.perform(command);
        }
    }

    fn perform(&mut self, command: Command) {
        match command {
            Command::Connect => self.start_connect(),
            Command::SendSubscribe => self.send_subscribe(),
            Command::ScheduleRetry => {
                self.retry = Some(Box::pin(sleep(self.config.reconnect_delay())));
            }
            Command::Release => {
                self.retry = None;
                self.pending = None;
                if self.socket.take().is_some() {
                    debug!("Closed notification cable {:?}", self.connection_id);
                }
            }
        }
    }

    fn start_connect(&mut self) {
        let token = self.credentials.borrow_and_update().clone();
        self.token = token.clone();

        let Some(token) = token else {
            self.phase = Phase::Idle;
            return;
        };

        let connection_id = Uuid::new_v4();
        self.connection_id = Some(connection_id);
        info!("Opening notification cable {}", connection_id);

        let url = self.config.cable_url(&token);
        let connector = self.connector.clone();
        let attempt: BoxFuture<'static, Result<CableSocket>> = Box::pin(async move {
            match url {
                Ok(url) => connector.connect(url).await,
                Err(e) => Err(e),
            }
        });
        self.pending = Some(attempt);
    }

    fn send_subscribe(&mut self) {
        let Some(socket) = &self.socket else {
            return;
        };

        let command = match CableCommand::subscribe(NOTIFICATIONS_CHANNEL)
            .and_then(|command| serde_json::to_string(&command))
        {
            Ok(command) => command,
            Err(e) => {
                warn!("Could not encode subscribe command: {}", AppError::from(e));
                return;
            }
        };

        if socket.send(command) {
            info!("Subscribed {:?} to {}", self.connection_id, NOTIFICATIONS_CHANNEL);
        }
    }
}

async fn next_connect(
    attempt: &mut Option<BoxFuture<'static, Result<CableSocket>>>,
) -> Result<CableSocket> {
    match attempt {
        Some(future) => future.await,
        None => pending_forever().await,
    }
}

async fn next_frame(socket: &mut Option<CableSocket>) -> Option<String> {
    match socket {
        Some(socket) => socket.inbound.recv().await,
        None => pending_forever().await,
    }
}

async fn next_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(timer) => timer.as_mut().await,
        None => pending_forever().await,
    }
}

async fn pending_forever<T>() -> T {
    pending().await
}

//! Per-connection SOCKS5 session
//!
//! A [`Session`] owns one client connection and walks it through
//!
//! ```text
//! Init --> Connecting --> Proxying --> Terminating
//!   |          |                          ^
//!   +----------+--------------------------+
//! ```
//!
//! Every failure leads straight to Terminating, after a best-effort reply
//! shaped for the step that failed.

use super::codec::{
    decode_connect_request, decode_method_selection, encode_connect_reply,
    encode_method_selection_response, ConnectReply, ConnectRequest,
};
use super::consts::{CONNECT_REQUEST_READ_SIZE, METHOD_SELECTION_READ_SIZE};
use super::dial;
use super::relay::{relay, RelayOutcome, RelaySettings};
use super::types::{AuthMethod, SocksCommand, TargetAddr};
use crate::config::Config;
use crate::error::{ReplyCode, SessionError};
use crate::helper::{
    duration_from_secs, read_until_deadline, shutdown_quietly, write_all_until_deadline,
};
use crate::logging::Logger;
use crate::net::SocketOpts;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upper bound on the shutdown of each socket during teardown
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Step of the session state machine. Ordered; a session only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestState {
    /// Waiting for the method selection message
    Init,
    /// Waiting for the connect request, then dialing
    Connecting,
    /// Relaying bytes
    Proxying,
    /// Closing sockets and releasing the admission slot
    Terminating,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Init => write!(f, "init"),
            RequestState::Connecting => write!(f, "connecting"),
            RequestState::Proxying => write!(f, "proxying"),
            RequestState::Terminating => write!(f, "terminating"),
        }
    }
}

/// Timeouts and socket options shared by every session of a listener
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Budget for all handshake reads, counted from accept
    pub handshake_read_timeout: Duration,
    /// Budget for all handshake writes, counted from accept
    pub handshake_write_timeout: Duration,
    /// Resolve + connect limit for the outbound dial
    pub connect_timeout: Duration,
    /// Copy loop settings
    pub relay: RelaySettings,
    /// Options applied to the outbound socket
    pub socket_opts: SocketOpts,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        let handshake = &config.server.handshake;
        SessionSettings {
            handshake_read_timeout: duration_from_secs(handshake.read_timeout),
            handshake_write_timeout: duration_from_secs(handshake.write_timeout),
            connect_timeout: duration_from_secs(handshake.connect_timeout),
            relay: RelaySettings::from(&config.relay),
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
        }
    }
}

/// Absolute deadlines covering the whole handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeDeadlines {
    /// Every handshake read must finish before this instant
    pub read: Instant,
    /// Every handshake write must finish before this instant
    pub write: Instant,
}

impl HandshakeDeadlines {
    /// Deadlines counted from now
    pub fn starting_now(settings: &SessionSettings) -> Self {
        let now = Instant::now();
        HandshakeDeadlines {
            read: now + settings.handshake_read_timeout,
            write: now + settings.handshake_write_timeout,
        }
    }
}

/// Collaborators handed to each session by the listener
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Shared timeouts and socket options
    pub settings: Arc<SessionSettings>,
    /// Log sink
    pub logger: Arc<dyn Logger>,
    /// Cancelled when the listener shuts down
    pub shutdown: CancellationToken,
}

impl SessionContext {
    /// Create a context with a fresh shutdown token
    pub fn new(settings: Arc<SessionSettings>, logger: Arc<dyn Logger>) -> Self {
        SessionContext {
            settings,
            logger,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use `shutdown` as the listener-wide cancellation token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// What happened to a finished session
#[derive(Debug)]
pub struct SessionReport {
    /// Session identifier
    pub id: u64,
    /// Last state reached before Terminating
    pub furthest_state: RequestState,
    /// Destination requested by the client, once decoded
    pub target: Option<TargetAddr>,
    /// Relay result, when the session reached Proxying
    pub relay: Option<RelayOutcome>,
    /// Error that ended the session early
    pub error: Option<SessionError>,
}

impl SessionReport {
    /// Whether bytes were relayed
    pub fn proxied(&self) -> bool {
        self.relay.is_some()
    }
}

/// A single client connection and its state
pub struct Session<S> {
    id: u64,
    state: RequestState,
    furthest_state: RequestState,
    client: S,
    outbound: Option<TcpStream>,
    target: Option<TargetAddr>,
    deadlines: HandshakeDeadlines,
    ctx: SessionContext,
    permit: Option<OwnedSemaphorePermit>,
    relay_outcome: Option<RelayOutcome>,
    error: Option<SessionError>,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("target", &self.target)
            .field("has_outbound", &self.outbound.is_some())
            .finish()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a session in `Init` with deadlines counted from now
    pub fn new(id: u64, client: S, ctx: SessionContext) -> Self {
        let deadlines = HandshakeDeadlines::starting_now(&ctx.settings);
        Session {
            id,
            state: RequestState::Init,
            furthest_state: RequestState::Init,
            client,
            outbound: None,
            target: None,
            deadlines,
            ctx,
            permit: None,
            relay_outcome: None,
            error: None,
        }
    }

    /// Use deadlines stamped elsewhere, typically at accept time
    pub fn with_deadlines(mut self, deadlines: HandshakeDeadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Hold an admission slot until the session terminates
    pub fn with_permit(mut self, permit: OwnedSemaphorePermit) -> Self {
        self.permit = Some(permit);
        self
    }

    /// Session identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current state
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Drive the session to completion
    pub async fn run(mut self) -> SessionReport {
        loop {
            let step = match self.state {
                RequestState::Init => self.negotiate().await,
                RequestState::Connecting => self.connect().await,
                RequestState::Proxying => self.proxy().await,
                RequestState::Terminating => {
                    self.terminate().await;
                    break;
                }
            };

            let next = match step {
                Ok(next) => next,
                Err(err) => {
                    self.log_failure(&err);
                    self.error = Some(err);
                    RequestState::Terminating
                }
            };
            self.advance(next);
        }

        SessionReport {
            id: self.id,
            furthest_state: self.furthest_state,
            target: self.target.take(),
            relay: self.relay_outcome.take(),
            error: self.error.take(),
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(next > self.state, "{} -> {}", self.state, next);
        self.ctx.logger.debug(&format!(
            "session {}: {} -> {}",
            self.id, self.state, next
        ));
        self.furthest_state = self.state;
        self.state = next;
    }

    async fn negotiate(&mut self) -> Result<RequestState, SessionError> {
        let mut buf = [0u8; METHOD_SELECTION_READ_SIZE];
        let decoded = match self.read_client(&mut buf).await {
            Ok(n) => decode_method_selection(&buf[..n]).map_err(SessionError::from),
            Err(e) => Err(SessionError::from(e)),
        };

        let request = match decoded {
            Ok(request) => request,
            Err(err) => {
                let reject = encode_method_selection_response(AuthMethod::NoAcceptable);
                if let Err(e) = self.write_client(&reject).await {
                    self.ctx.logger.debug(&format!(
                        "session {}: failed to send method rejection: {}",
                        self.id, e
                    ));
                }
                return Err(err);
            }
        };

        self.ctx.logger.debug(&format!(
            "session {}: client offered {:?}, selecting no authentication",
            self.id, request.methods
        ));
        self.write_client(&encode_method_selection_response(AuthMethod::NoAuth))
            .await?;

        Ok(RequestState::Connecting)
    }

    async fn connect(&mut self) -> Result<RequestState, SessionError> {
        let mut buf = [0u8; CONNECT_REQUEST_READ_SIZE];
        let decoded = match self.read_client(&mut buf).await {
            Ok(n) => decode_connect_request(&buf[..n]).map_err(SessionError::from),
            Err(e) => Err(SessionError::from(e)),
        };

        let request = match decoded.and_then(|req| Ok((req.target()?, req))) {
            Ok((target, request)) => {
                self.target = Some(target);
                request
            }
            Err(err) => {
                self.reply_best_effort(&ConnectReply::failure(err.reply_code()))
                    .await;
                return Err(err);
            }
        };

        if request.command != SocksCommand::Connect {
            let err = SessionError::CommandNotSupported(request.command.to_byte());
            self.reply_best_effort(&ConnectReply::mirror(err.reply_code(), &request.dest))
                .await;
            return Err(err);
        }

        let outbound = self.dial(&request).await?;
        self.send_reply(&ConnectReply::mirror(ReplyCode::Succeeded, &request.dest))
            .await?;
        self.outbound = Some(outbound);

        Ok(RequestState::Proxying)
    }

    async fn dial(&mut self, request: &ConnectRequest) -> Result<TcpStream, SessionError> {
        let target = match &self.target {
            Some(target) => target.clone(),
            None => request.target()?,
        };

        self.ctx
            .logger
            .debug(&format!("session {}: dialing {}", self.id, target));

        let dialed = tokio::select! {
            biased;
            _ = self.ctx.shutdown.cancelled() => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "listener shutting down",
            )),
            res = dial::connect(&target, self.ctx.settings.connect_timeout) => res,
        };

        match dialed {
            Ok(stream) => {
                if let Err(e) = self.ctx.settings.socket_opts.apply(&stream) {
                    self.ctx.logger.debug(&format!(
                        "session {}: failed to apply socket options: {}",
                        self.id, e
                    ));
                }
                self.ctx
                    .logger
                    .info(&format!("session {}: connected to {}", self.id, target));
                Ok(stream)
            }
            Err(source) => {
                let err = SessionError::Dial {
                    target: target.to_string(),
                    source,
                };
                self.reply_best_effort(&ConnectReply::mirror(err.reply_code(), &request.dest))
                    .await;
                Err(err)
            }
        }
    }

    async fn proxy(&mut self) -> Result<RequestState, SessionError> {
        let Some(outbound) = self.outbound.as_mut() else {
            return Err(SessionError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "no outbound connection",
            )));
        };

        let outcome = relay(
            &mut self.client,
            outbound,
            &self.ctx.settings.relay,
            self.ctx.shutdown.child_token(),
        )
        .await;

        self.ctx.logger.info(&format!(
            "session {}: relay finished ({} bytes client->target, {} bytes target->client, {})",
            self.id,
            outcome.client_to_target.bytes,
            outcome.target_to_client.bytes,
            match outcome.first_finished {
                Some(direction) => format!("{} {}", direction, outcome.termination_reason()),
                None => "cancelled".to_string(),
            }
        ));
        self.relay_outcome = Some(outcome);

        Ok(RequestState::Terminating)
    }

    async fn terminate(&mut self) {
        if let Some(mut outbound) = self.outbound.take() {
            shutdown_quietly(&mut outbound, TEARDOWN_TIMEOUT).await;
        }
        shutdown_quietly(&mut self.client, TEARDOWN_TIMEOUT).await;

        if self.permit.take().is_some() {
            self.ctx
                .logger
                .debug(&format!("session {}: released admission slot", self.id));
        }
    }

    async fn read_client(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_until_deadline(
            &mut self.client,
            buf,
            self.deadlines.read,
            &self.ctx.shutdown,
        )
        .await
    }

    async fn write_client(&mut self, buf: &[u8]) -> io::Result<()> {
        write_all_until_deadline(&mut self.client, buf, self.deadlines.write).await
    }

    async fn send_reply(&mut self, reply: &ConnectReply) -> Result<(), SessionError> {
        let bytes = encode_connect_reply(reply)?;
        self.write_client(&bytes).await?;
        Ok(())
    }

    async fn reply_best_effort(&mut self, reply: &ConnectReply) {
        if let Err(e) = self.send_reply(reply).await {
            self.ctx.logger.debug(&format!(
                "session {}: failed to send {:?} reply: {}",
                self.id, reply.status, e
            ));
        }
    }

    fn log_failure(&self, err: &SessionError) {
        let message = format!("session {}: {} failed: {}", self.id, self.state, err);
        match err {
            SessionError::Dial { .. } => self.ctx.logger.error(&message),
            _ => self.ctx.logger.info(&message),
        }
    }
}

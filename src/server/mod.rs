//! Admission-controlled SOCKS5 listener
//!
//! Two long-lived tasks cooperate:
//!
//! - the accept loop takes connections off the listening socket, applies
//!   socket options, stamps handshake deadlines and queues a [`Session`]
//! - the dispatcher waits for a free admission slot and spawns each queued
//!   session with its slot
//!
//! so a slow or waiting client never blocks `accept`.

mod admission;

pub use admission::Admission;

use crate::config::Config;
use crate::error::SockrelayError;
use crate::helper::duration_from_secs;
use crate::logging::Logger;
use crate::net::SocketOpts;
use crate::socks::{HandshakeDeadlines, Session, SessionContext, SessionSettings};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A bound SOCKS5 listener
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    logger: Arc<dyn Logger>,
    admission: Admission,
    settings: Arc<SessionSettings>,
    socket_opts: SocketOpts,
    dispatch_backlog: usize,
    shutdown_grace: Duration,
}

impl Server {
    /// Validate `config` and bind `listen_addr:port`
    pub async fn bind(config: Config, logger: Arc<dyn Logger>) -> Result<Self, SockrelayError> {
        config.validate().map_err(SockrelayError::Config)?;
        let listener = TcpListener::bind(config.server.bind_addr()).await?;
        Self::with_listener(listener, config, logger)
    }

    /// Serve on an already bound listener; the configured address is ignored
    pub fn with_listener(
        listener: TcpListener,
        config: Config,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, SockrelayError> {
        config.validate().map_err(SockrelayError::Config)?;

        Ok(Server {
            listener,
            logger,
            admission: Admission::new(config.server.max_sessions),
            settings: Arc::new(SessionSettings::from(&config)),
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            dispatch_backlog: config.server.dispatch_backlog,
            shutdown_grace: duration_from_secs(config.server.shutdown_grace),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle on the session slots, for observing occupancy
    pub fn admission(&self) -> Admission {
        self.admission.clone()
    }

    /// Accept and serve connections until `shutdown_rx` fires.
    ///
    /// On shutdown the listening socket is closed, running sessions are
    /// cancelled and given `shutdown_grace` to finish. An unexpected accept
    /// error is logged and returned.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<(), SockrelayError> {
        let local_addr = self.local_addr()?;
        self.logger.info(&format!(
            "SOCKS5 server listening on {} ({} session slots)",
            local_addr,
            self.admission.capacity()
        ));

        let sessions = CancellationToken::new();
        let tracker = TaskTracker::new();
        let (tx, rx) = mpsc::channel(self.dispatch_backlog);

        let dispatcher = tokio::spawn(dispatch(
            rx,
            self.admission.clone(),
            tracker.clone(),
            sessions.clone(),
            self.logger.clone(),
        ));

        let ctx = SessionContext::new(self.settings.clone(), self.logger.clone())
            .with_shutdown(sessions.clone());
        let result = self.accept_loop(&mut shutdown_rx, tx, ctx).await;

        let Server {
            listener,
            logger,
            shutdown_grace,
            ..
        } = self;
        drop(listener);

        sessions.cancel();
        if let Err(e) = dispatcher.await {
            logger.error(&format!("dispatcher task failed: {}", e));
        }

        tracker.close();
        if tokio::time::timeout(shutdown_grace, tracker.wait())
            .await
            .is_err()
        {
            logger.error(&format!(
                "{} sessions still running after {:?} grace period",
                tracker.len(),
                shutdown_grace
            ));
        }

        logger.info("SOCKS5 server stopped");
        result
    }

    async fn accept_loop(
        &self,
        shutdown_rx: &mut broadcast::Receiver<bool>,
        tx: mpsc::Sender<Session<TcpStream>>,
        ctx: SessionContext,
    ) -> Result<(), SockrelayError> {
        let mut next_id: u64 = 0;

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received, no longer accepting");
                    return Ok(());
                }
                res = self.listener.accept() => res,
            };

            let (stream, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    self.logger.error(&format!("Accept failed: {}", e));
                    return Err(e.into());
                }
            };

            next_id += 1;
            if let Err(e) = self.socket_opts.apply(&stream) {
                self.logger.debug(&format!(
                    "session {}: failed to apply socket options: {}",
                    next_id, e
                ));
            }

            let session = Session::new(next_id, stream, ctx.clone())
                .with_deadlines(HandshakeDeadlines::starting_now(&self.settings));
            self.logger
                .info(&format!("session {}: accepted connection from {}", next_id, peer));

            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received, no longer accepting");
                    return Ok(());
                }
                sent = tx.send(session) => {
                    if sent.is_err() {
                        self.logger.error("Dispatcher stopped, no longer accepting");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Pair each queued session with an admission slot and spawn it
async fn dispatch(
    mut rx: mpsc::Receiver<Session<TcpStream>>,
    admission: Admission,
    tracker: TaskTracker,
    cancel: CancellationToken,
    logger: Arc<dyn Logger>,
) {
    loop {
        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(session) => session,
                None => break,
            },
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = admission.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        logger.debug(&format!(
            "session {}: admitted ({}/{} slots in use)",
            session.id(),
            admission.in_use(),
            admission.capacity()
        ));
        tracker.spawn(session.with_permit(permit).run());
    }

    let mut dropped = 0usize;
    rx.close();
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        logger.info(&format!("Dropped {} queued connections on shutdown", dropped));
    }
}

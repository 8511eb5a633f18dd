use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use russh::server::{Auth, Msg, Server, Session as ServerSession};
use russh::{Channel, ChannelId, MethodSet, Pty, SshId};

use crate::configuration::types::SshSection;
use crate::error_handling::types::NetworkError;
use crate::logging::context::SessionContext;
use crate::session::engine::SessionEngine;
use crate::session::types::{Session, TerminationCause};

/// The SSH-facing listener.
///
/// One `ClientHandler` is created per accepted connection; the handler is
/// the single capability through which that connection reaches the session
/// engine. Password authentication is the only method advertised, matching
/// the impersonated host.
pub struct SshListener {
    engine: Arc<SessionEngine>,
    bind_address: String,
    port: u16,
    host_key: PathBuf,
    server_version: String,
}

impl SshListener {
    pub fn new(engine: Arc<SessionEngine>, ssh: &SshSection) -> Self {
        Self {
            engine,
            bind_address: ssh.bind_address.clone(),
            port: ssh.port,
            host_key: ssh.host_key.clone(),
            server_version: ssh.server_version.clone(),
        }
    }

    /// Loads the host key and serves connections until the process ends.
    ///
    /// # Errors
    ///
    /// An unreadable host key or a failed bind is returned to the caller;
    /// both are configuration-time conditions and fatal to the process.
    pub async fn run(mut self) -> Result<(), NetworkError> {
        let key = russh_keys::load_secret_key(&self.host_key, None)
            .map_err(|e| NetworkError::KeyError(e.to_string()))?;

        let config = russh::server::Config {
            server_id: SshId::Standard(self.server_version.clone()),
            methods: MethodSet::PASSWORD,
            auth_rejection_time: Duration::from_secs(1),
            auth_rejection_time_initial: Some(Duration::ZERO),
            keys: vec![key],
            ..Default::default()
        };

        let address = (self.bind_address.clone(), self.port);
        info!(
            "SSH honeypot listening on {}:{}",
            self.bind_address, self.port
        );

        self.run_on_address(Arc::new(config), address)
            .await
            .map_err(NetworkError::BindError)
    }
}

impl Server for SshListener {
    type Handler = ClientHandler;

    fn new_client(&mut self, peer_addr: Option<SocketAddr>) -> ClientHandler {
        let peer =
            peer_addr.unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 0)));
        let (session, ctx) = self
            .engine
            .open_session(peer, &self.bind_address, self.port);

        ClientHandler {
            engine: Arc::clone(&self.engine),
            session: Some(session),
            ctx,
            channel: None,
        }
    }
}

/// Per-connection SSH event handler.
///
/// Owns the [`Session`] until a shell or exec request hands it (and the
/// channel's byte stream) to a spawned engine task. A connection that dies
/// before that point is finalized from `Drop`, so every admitted connection
/// produces exactly one terminal summary.
pub struct ClientHandler {
    engine: Arc<SessionEngine>,
    session: Option<Session>,
    ctx: SessionContext,
    channel: Option<Channel<Msg>>,
}

impl ClientHandler {
    fn take_channel(&mut self, id: ChannelId) -> Option<Channel<Msg>> {
        if self.channel.as_ref().map(|c| c.id()) == Some(id) {
            self.channel.take()
        } else {
            None
        }
    }
}

#[async_trait]
impl russh::server::Handler for ClientHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        let accepted = match self.session.as_mut() {
            Some(session) => self.engine.authenticate(session, &self.ctx, user, password),
            None => false,
        };

        if accepted {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::Reject {
                proceed_with_methods: None,
            })
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut ServerSession,
    ) -> Result<bool, Self::Error> {
        // The impersonated host offers a single session channel.
        if self.channel.is_some() || self.session.is_none() {
            return Ok(false);
        }
        self.channel = Some(channel);
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut ServerSession,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut ServerSession,
    ) -> Result<(), Self::Error> {
        if let Some(ssh_channel) = self.take_channel(channel) {
            if let Some(attacker_session) = self.session.take() {
                session.channel_success(channel);

                let engine = Arc::clone(&self.engine);
                let ctx = self.ctx.clone();
                tokio::spawn(async move {
                    engine
                        .run_interactive(attacker_session, ctx, ssh_channel.into_stream())
                        .await;
                });
                return Ok(());
            }
        }
        session.channel_failure(channel);
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut ServerSession,
    ) -> Result<(), Self::Error> {
        if let Some(ssh_channel) = self.take_channel(channel) {
            if let Some(attacker_session) = self.session.take() {
                session.channel_success(channel);

                let command = String::from_utf8_lossy(data).into_owned();
                let engine = Arc::clone(&self.engine);
                let ctx = self.ctx.clone();
                tokio::spawn(async move {
                    engine
                        .run_exec(attacker_session, ctx, ssh_channel.into_stream(), &command)
                        .await;
                });
                return Ok(());
            }
        }
        session.channel_failure(channel);
        Ok(())
    }
}

impl Drop for ClientHandler {
    fn drop(&mut self) {
        // A connection torn down before any shell or exec started still
        // gets its terminal accounting.
        if let Some(mut session) = self.session.take() {
            self.engine
                .finalize(&mut session, &self.ctx, TerminationCause::ConnectionLost);
        }
    }
}

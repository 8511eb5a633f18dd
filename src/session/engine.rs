use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::auth::AuthPolicy;
use crate::classification::dispatcher::CommandTriage;
use crate::enrichment::geo::GeoLocator;
use crate::generation::dispatch::ResponseDispatch;
use crate::logging::context::SessionContext;
use crate::logging::event_log::EventLog;
use crate::risk;
use crate::session::types::{Session, TerminationCause};
use crate::session::SessionStatus;

/// Per-connection orchestration across the whole session lifecycle.
///
/// One engine instance is shared by every connection; each entry point
/// operates on a [`Session`] owned exclusively by that connection's task.
/// The engine is generic over the byte stream, so the same code path runs
/// over an SSH channel in production and an in-memory duplex in tests.
///
/// Every way a session can end (end-of-stream, a reset connection, the
/// idle bound, an internal fault) converges on [`Self::finalize`], which
/// emits the terminal summary exactly once.
pub struct SessionEngine {
    event_log: Arc<EventLog>,
    locator: Arc<dyn GeoLocator>,
    triage: Arc<CommandTriage>,
    dispatch: Arc<ResponseDispatch>,
    auth: Arc<AuthPolicy>,
    idle_timeout: Duration,
}

enum ReadEvent {
    Line(String),
    Eof,
    Idle,
    Broken,
}

impl SessionEngine {
    pub fn new(
        event_log: Arc<EventLog>,
        locator: Arc<dyn GeoLocator>,
        triage: Arc<CommandTriage>,
        dispatch: Arc<ResponseDispatch>,
        auth: Arc<AuthPolicy>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            event_log,
            locator,
            triage,
            dispatch,
            auth,
            idle_timeout,
        }
    }

    /// Admits one connection: creates the session, binds its logging
    /// context, attempts location enrichment and emits the connection
    /// record. Enrichment failure is not an error; it renders as "Unknown".
    pub fn open_session(
        &self,
        peer: SocketAddr,
        dst_ip: &str,
        dst_port: u16,
    ) -> (Session, SessionContext) {
        let session = Session::new(peer, dst_ip, dst_port);
        let ctx = SessionContext::for_connection(
            Arc::clone(&self.event_log),
            session.task_name(),
            peer,
            dst_ip,
            dst_port,
        );

        let location = self
            .locator
            .locate(peer.ip())
            .map(|l| l.to_string())
            .unwrap_or_else(|| String::from("Unknown"));
        ctx.info_fields("SSH connection received", json!({"location": location}));

        (session, ctx)
    }

    /// Evaluates the authentication policy and records the username on
    /// success. The policy logs every decision itself.
    pub fn authenticate(
        &self,
        session: &mut Session,
        ctx: &SessionContext,
        username: &str,
        password: &str,
    ) -> bool {
        session.status = SessionStatus::Authenticating;
        let accepted = self.auth.authenticate(ctx, username, password);
        if accepted {
            session.username = Some(username.to_string());
        }
        accepted
    }

    /// Interactive submode: welcome banner, then one command per line until
    /// the stream ends, the idle bound expires, or the peer says goodbye.
    pub async fn run_interactive<S>(&self, mut session: Session, ctx: SessionContext, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        session.status = SessionStatus::Active;
        ctx.info_fields("Session Start", json!({"interactive": true}));

        let (mut reader, mut writer) = tokio::io::split(stream);
        let cause = self
            .interactive_loop(&mut session, &ctx, &mut reader, &mut writer)
            .await;
        let _ = writer.shutdown().await;

        self.finalize(&mut session, &ctx, cause);
    }

    /// Non-interactive submode: the single command supplied at connection
    /// open is classified, answered once, and the session ends.
    pub async fn run_exec<S>(
        &self,
        mut session: Session,
        ctx: SessionContext,
        mut stream: S,
        command: &str,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        session.status = SessionStatus::Active;
        ctx.info_fields("Session Start", json!({"interactive": false}));

        let command = command.trim();
        let cause = if command.is_empty() {
            TerminationCause::Graceful
        } else {
            ctx.info_fields(
                "User input",
                json!({
                    "details": BASE64.encode(command.as_bytes()),
                    "interactive": false,
                }),
            );

            self.triage
                .classify_command(&ctx, &mut session.command_log, command)
                .await;

            let reply = self.dispatch.respond(&ctx, session.id, command).await;
            let wrote = async {
                stream.write_all(reply.as_bytes()).await?;
                stream.write_all(b"\n").await
            }
            .await;
            match wrote {
                Ok(()) => TerminationCause::Graceful,
                Err(_) => TerminationCause::ConnectionLost,
            }
        };
        let _ = stream.shutdown().await;

        self.finalize(&mut session, &ctx, cause);
    }

    /// The single convergence point for every exit path.
    ///
    /// Computes and logs the final risk summary, releases the session's
    /// conversation history, and closes the session. Idempotent: a session
    /// already closed is left untouched, so no path can double-report.
    pub fn finalize(&self, session: &mut Session, ctx: &SessionContext, cause: TerminationCause) {
        if session.status == SessionStatus::Closed {
            return;
        }
        session.status = SessionStatus::Closing;

        if let TerminationCause::Fault(reason) = &cause {
            ctx.error_fields("Unhandled session failure", json!({"error": reason}));
        }

        let summary = risk::summarize(&session.command_log);
        ctx.info_fields(
            "Session Summary",
            json!({
                "summary": summary.render(),
                "termination": cause.as_str(),
            }),
        );

        self.dispatch.forget(session.id);
        session.status = SessionStatus::Closed;
    }

    async fn interactive_loop<R, W>(
        &self,
        session: &mut Session,
        ctx: &SessionContext,
        reader: &mut R,
        writer: &mut W,
    ) -> TerminationCause
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let banner = self.dispatch.welcome(ctx, session.id).await;
        if writer.write_all(banner.as_bytes()).await.is_err()
            || writer.write_all(b"\n> ").await.is_err()
        {
            return TerminationCause::ConnectionLost;
        }

        let mut lines = LineReader::new();
        loop {
            let line = match self.next_event(reader, &mut lines).await {
                ReadEvent::Line(line) => line,
                ReadEvent::Eof => return TerminationCause::Graceful,
                ReadEvent::Idle => return TerminationCause::IdleTimeout,
                ReadEvent::Broken => return TerminationCause::ConnectionLost,
            };

            let command = line.trim().to_string();
            if command.is_empty() {
                if writer.write_all(b"> ").await.is_err() {
                    return TerminationCause::ConnectionLost;
                }
                continue;
            }

            ctx.info_fields(
                "User input",
                json!({
                    "details": BASE64.encode(command.as_bytes()),
                    "interactive": true,
                }),
            );

            self.triage
                .classify_command(ctx, &mut session.command_log, &command)
                .await;

            let summary = risk::summarize(&session.command_log);
            ctx.info_fields("Session Summary", json!({"summary": summary.render()}));

            let reply = self.dispatch.respond(ctx, session.id, &command).await;
            if writer.write_all(reply.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
            {
                return TerminationCause::ConnectionLost;
            }

            if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
                let _ = writer.write_all(b"Goodbye!\n").await;
                return TerminationCause::Graceful;
            }

            if writer.write_all(b"> ").await.is_err() {
                return TerminationCause::ConnectionLost;
            }
        }
    }

    async fn next_event<R>(&self, reader: &mut R, lines: &mut LineReader) -> ReadEvent
    where
        R: AsyncRead + Unpin,
    {
        let result = if self.idle_timeout.is_zero() {
            lines.next_line(reader).await
        } else {
            match tokio::time::timeout(self.idle_timeout, lines.next_line(reader)).await {
                Ok(result) => result,
                Err(_) => return ReadEvent::Idle,
            }
        };

        match result {
            Ok(Some(line)) => ReadEvent::Line(line),
            Ok(None) => ReadEvent::Eof,
            Err(_) => ReadEvent::Broken,
        }
    }
}

/// Accumulating line reader tolerant of CR, LF and CRLF terminators.
///
/// SSH clients in pipe mode send LF-terminated lines; clients that asked
/// for a PTY send CR. A partial line pending at end-of-stream is returned
/// as a final line, matching what the remote party actually typed before
/// the cut.
struct LineReader {
    pending: Vec<u8>,
}

impl LineReader {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    async fn next_line<R>(&mut self, reader: &mut R) -> std::io::Result<Option<String>>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(pos) = self
                .pending
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r')
            {
                let terminator = self.pending[pos];
                let line = self.pending[..pos].to_vec();
                let mut consumed = pos + 1;
                if terminator == b'\r' && self.pending.get(pos + 1) == Some(&b'\n') {
                    consumed += 1;
                }
                self.pending.drain(..consumed);
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            let mut chunk = [0u8; 1024];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.pending);
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}

//! UCI analysis engine client.
//!
//! An [`EngineClient`] is a cloneable handle to one background worker task.
//! The worker owns the engine's stdin and stdout and runs at most one search
//! at a time. Each request carries its own reply channel; a request that
//! arrives while a search is running stops that search, and the displaced
//! caller gets [`EngineError::Superseded`].

use std::future::Future;
use std::time::Duration;

use chess_core::{Board, Color};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, trace, warn};
use uci::{EngineInfo, EngineMessage, GoOptions, GuiCommand};

use crate::evaluation::Evaluation;

/// Maximum number of queued requests before senders wait.
const REQUEST_QUEUE_DEPTH: usize = 16;

/// Errors that can occur when working with the analysis engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No configured engine source produced a working engine.
    #[error("no engine available (tried: {})", tried.join(", "))]
    Unavailable { tried: Vec<String> },
    /// The UCI handshake failed or took too long.
    #[error("engine handshake failed: {0}")]
    Handshake(String),
    /// A search produced no terminal answer in time.
    #[error("engine search timed out after {0:?}")]
    Timeout(Duration),
    /// A newer request stopped this search.
    #[error("search superseded by a newer request")]
    Superseded,
    /// The engine went away or stopped responding.
    #[error("engine connection closed")]
    Closed,
    /// The engine broke the protocol in a way that cannot be skipped.
    #[error("engine protocol error: {0}")]
    Protocol(String),
    /// The position handed to the engine is not a legal FEN.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    /// Failed to talk to the engine process.
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One evaluation of a position.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSample {
    /// Position that was searched.
    pub fen: String,
    /// Folded score from white's point of view.
    pub score: i32,
    /// Score as the engine reported it, relative to the side to move.
    pub evaluation: Evaluation,
    /// First move of the most recent principal variation, in long notation.
    pub best_move: Option<String>,
    /// Depth of the line the score came from.
    pub depth: u32,
    /// The principal variation (sequence of best moves).
    pub pv: Vec<String>,
}

/// Timeouts and UCI options for one engine connection.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Time limit for `uci` through `readyok`.
    pub handshake_timeout: Duration,
    /// Time limit for one search, first command to terminal `bestmove`.
    pub search_timeout: Duration,
    /// How long a stopped search may take to print `bestmove`.
    pub stop_grace: Duration,
    /// Sent as `setoption name <k> value <v>` during the handshake.
    pub uci_options: Vec<(String, String)>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(8),
            search_timeout: Duration::from_secs(60),
            stop_grace: Duration::from_secs(2),
            uci_options: vec![
                ("Hash".to_string(), "32".to_string()),
                ("Threads".to_string(), "1".to_string()),
            ],
        }
    }
}

/// Byte streams of a running engine, plus the process when there is one.
pub struct EngineTransport {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// Killed when the worker exits.
    pub child: Option<Child>,
    /// Where the engine came from, for logs.
    pub source: String,
}

impl EngineTransport {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        source: impl Into<String>,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
            source: source.into(),
        }
    }
}

/// Anything that can score a position. The batch analyzer only needs this.
pub trait PositionEvaluator {
    fn evaluate(
        &self,
        fen: &str,
        depth: u32,
    ) -> impl Future<Output = Result<AnalysisSample, EngineError>> + Send;
}

struct SearchRequest {
    fen: String,
    side_to_move: Color,
    depth: u32,
    updates: Option<mpsc::UnboundedSender<AnalysisSample>>,
    reply: oneshot::Sender<Result<AnalysisSample, EngineError>>,
}

enum Command {
    Search(SearchRequest),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a connected engine.
#[derive(Clone, Debug)]
pub struct EngineClient {
    requests: mpsc::Sender<Command>,
    name: String,
    source: String,
}

impl EngineClient {
    /// Performs the UCI handshake on `transport` and starts the worker.
    ///
    /// Handshake: `uci` until `uciok`, one `setoption` per configured
    /// option, `ucinewgame`, `isready` until `readyok`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Handshake`] if the engine misbehaves or misses
    /// `handshake_timeout`, [`EngineError::Io`] on write failures.
    pub async fn connect(
        transport: EngineTransport,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let EngineTransport {
            reader,
            writer,
            child,
            source,
        } = transport;

        let mut conn = Connection {
            lines: LineReader::new(reader),
            writer,
        };

        let name = match timeout(options.handshake_timeout, conn.handshake(&options)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(EngineError::Handshake(format!(
                    "no readyok within {:?}",
                    options.handshake_timeout
                )))
            }
        };
        info!(engine = %name, source = %source, "engine ready");

        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        let worker = Worker {
            conn,
            requests: rx,
            child,
            options,
        };
        tokio::spawn(worker.run());

        Ok(Self {
            requests: tx,
            name,
            source,
        })
    }

    /// Engine name from `id name`, or "Unknown Engine".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source the engine was started from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Searches `fen` to `depth` and returns the final sample.
    ///
    /// Resolves as soon as a scored line reaches `depth`, or on `bestmove`.
    pub async fn evaluate(&self, fen: &str, depth: u32) -> Result<AnalysisSample, EngineError> {
        let rx = self.submit(fen, depth, None).await?;
        rx.await.map_err(|_| EngineError::Closed)?
    }

    /// Like [`Self::evaluate`], calling `on_sample` for every scored depth update.
    pub async fn stream<F>(
        &self,
        fen: &str,
        depth: u32,
        mut on_sample: F,
    ) -> Result<AnalysisSample, EngineError>
    where
        F: FnMut(&AnalysisSample),
    {
        let (updates_tx, mut updates) = mpsc::unbounded_channel();
        let mut result = self.submit(fen, depth, Some(updates_tx)).await?;

        loop {
            tokio::select! {
                biased;
                Some(sample) = updates.recv() => on_sample(&sample),
                outcome = &mut result => {
                    while let Ok(sample) = updates.try_recv() {
                        on_sample(&sample);
                    }
                    return outcome.map_err(|_| EngineError::Closed)?;
                }
            }
        }
    }

    /// Sends `quit` and waits for the worker to finish.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.requests.send(Command::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    async fn submit(
        &self,
        fen: &str,
        depth: u32,
        updates: Option<mpsc::UnboundedSender<AnalysisSample>>,
    ) -> Result<oneshot::Receiver<Result<AnalysisSample, EngineError>>, EngineError> {
        let board = Board::from_fen(fen).map_err(|e| EngineError::InvalidPosition(e.to_string()))?;
        let (reply, rx) = oneshot::channel();
        let request = SearchRequest {
            fen: board.fen(),
            side_to_move: board.side_to_move(),
            depth: depth.max(1),
            updates,
            reply,
        };
        self.requests
            .send(Command::Search(request))
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok(rx)
    }
}

impl PositionEvaluator for EngineClient {
    fn evaluate(
        &self,
        fen: &str,
        depth: u32,
    ) -> impl Future<Output = Result<AnalysisSample, EngineError>> + Send {
        EngineClient::evaluate(self, fen, depth)
    }
}

/// Engine output split into lines.
///
/// Bytes that are not UTF-8 are replaced rather than treated as an error.
/// A partly read line stays in `buf` when a `select!` drops the read, so
/// the next call picks up where it left off.
struct LineReader {
    inner: BufReader<Box<dyn AsyncRead + Send + Unpin>>,
    buf: Vec<u8>,
}

impl LineReader {
    fn new(reader: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.inner.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        self.buf.clear();
        Ok(Some(line))
    }
}

struct Connection {
    lines: LineReader,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl Connection {
    async fn send(&mut self, cmd: &GuiCommand) -> Result<(), EngineError> {
        let line = cmd.to_uci();
        debug!(cmd = %line, "engine <");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn next_message(&mut self) -> Result<EngineMessage, EngineError> {
        match self.lines.next_line().await? {
            Some(line) => {
                trace!(line = %line, "engine >");
                Ok(EngineMessage::parse(&line))
            }
            None => Err(EngineError::Closed),
        }
    }

    async fn handshake(&mut self, options: &EngineOptions) -> Result<String, EngineError> {
        self.send(&GuiCommand::Uci).await?;
        let mut name = None;
        loop {
            match self.next_message().await {
                Ok(EngineMessage::Id { name: Some(n), .. }) => name = Some(n),
                Ok(EngineMessage::UciOk) => break,
                Ok(_) => {}
                Err(EngineError::Closed) => {
                    return Err(EngineError::Handshake("engine exited before uciok".to_string()))
                }
                Err(e) => return Err(e),
            }
        }

        for (option, value) in &options.uci_options {
            self.send(&GuiCommand::SetOption {
                name: option.clone(),
                value: Some(value.clone()),
            })
            .await?;
        }
        self.send(&GuiCommand::UciNewGame).await?;
        self.send(&GuiCommand::IsReady).await?;
        loop {
            match self.next_message().await {
                Ok(EngineMessage::ReadyOk) => break,
                Ok(_) => {}
                Err(EngineError::Closed) => {
                    return Err(EngineError::Handshake("engine exited before readyok".to_string()))
                }
                Err(e) => return Err(e),
            }
        }

        Ok(name.unwrap_or_else(|| "Unknown Engine".to_string()))
    }
}

/// Progress of the search currently running.
struct SearchState {
    fen: String,
    side_to_move: Color,
    evaluation: Option<Evaluation>,
    best_move: Option<String>,
    depth: u32,
    pv: Vec<String>,
}

impl SearchState {
    fn new(fen: &str, side_to_move: Color) -> Self {
        Self {
            fen: fen.to_string(),
            side_to_move,
            evaluation: None,
            best_move: None,
            depth: 0,
            pv: Vec::new(),
        }
    }

    /// Folds an info line in. Returns false when the line carries no exact score.
    fn apply(&mut self, info: &EngineInfo) -> bool {
        if info.multipv.is_some_and(|n| n != 1) {
            return false;
        }
        let Some(score) = info.exact_score() else {
            return false;
        };

        self.evaluation = Some(score.into());
        if let Some(depth) = info.depth {
            self.depth = depth;
        }
        if let Some(first) = info.pv.first() {
            if is_real_move(first) {
                self.best_move = Some(first.clone());
                self.pv = info.pv.clone();
            }
        }
        true
    }

    /// A terminal `bestmove (none)` keeps whatever move the PV gave.
    fn finish(&mut self, best_move: Option<String>) {
        if let Some(mv) = best_move {
            self.best_move = Some(mv);
        }
    }

    fn sample(&self) -> Option<AnalysisSample> {
        let evaluation = self.evaluation?;
        Some(AnalysisSample {
            fen: self.fen.clone(),
            score: evaluation.white_centipawns(self.side_to_move),
            evaluation,
            best_move: self.best_move.clone(),
            depth: self.depth,
            pv: self.pv.clone(),
        })
    }
}

fn is_real_move(mv: &str) -> bool {
    !matches!(mv, "(none)" | "none" | "0000")
}

/// What the worker does once a search is over.
enum After {
    Idle,
    Next(SearchRequest),
    Shutdown(Option<oneshot::Sender<()>>),
}

enum Event {
    Line(Result<Option<String>, std::io::Error>),
    Request(Option<Command>),
    Deadline,
}

struct Worker {
    conn: Connection,
    requests: mpsc::Receiver<Command>,
    child: Option<Child>,
    options: EngineOptions,
}

impl Worker {
    async fn run(mut self) {
        let mut pending: Option<SearchRequest> = None;

        loop {
            let request = match pending.take() {
                Some(request) => request,
                None => match self.requests.recv().await {
                    Some(Command::Search(request)) => request,
                    Some(Command::Shutdown(ack)) => {
                        self.quit(Some(ack)).await;
                        return;
                    }
                    None => {
                        self.quit(None).await;
                        return;
                    }
                },
            };

            match self.search(request).await {
                Ok(After::Idle) => {}
                Ok(After::Next(next)) => pending = Some(next),
                Ok(After::Shutdown(ack)) => {
                    self.quit(ack).await;
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "engine lost, failing further requests");
                    self.drain_closed().await;
                    return;
                }
            }
        }
    }

    /// Runs one search to its terminal `bestmove`.
    ///
    /// The active request is answered early when the target depth is
    /// reached; the engine's remaining output is still consumed here so the
    /// next search starts clean. An `Err` means the engine is unusable.
    async fn search(&mut self, request: SearchRequest) -> Result<After, EngineError> {
        if request.reply.is_closed() {
            return Ok(After::Idle);
        }

        let mut state = SearchState::new(&request.fen, request.side_to_move);
        let target_depth = request.depth;

        if let Err(e) = self.start_search(&request).await {
            let _ = request.reply.send(Err(EngineError::Closed));
            return Err(e);
        }

        let mut active = Some(request);
        let mut next: Option<SearchRequest> = None;
        let mut shutdown: Option<Option<oneshot::Sender<()>>> = None;
        let mut stopping = false;
        let mut deadline = Instant::now() + self.options.search_timeout;

        loop {
            let accepting = shutdown.is_none();
            let event = tokio::select! {
                line = self.conn.lines.next_line() => Event::Line(line),
                cmd = self.requests.recv(), if accepting => Event::Request(cmd),
                _ = sleep_until(deadline) => Event::Deadline,
            };

            match event {
                Event::Line(Ok(Some(line))) => match EngineMessage::parse(&line) {
                    EngineMessage::Info(info) => {
                        if !state.apply(&info) {
                            continue;
                        }
                        let Some(sample) = state.sample() else {
                            continue;
                        };
                        if let Some(req) = &active {
                            if let Some(updates) = &req.updates {
                                let _ = updates.send(sample.clone());
                            }
                        }
                        if sample.depth >= target_depth {
                            if let Some(req) = active.take() {
                                let _ = req.reply.send(Ok(sample));
                            }
                        }
                    }
                    EngineMessage::BestMove { mv, .. } => {
                        state.finish(mv);
                        if let Some(req) = active.take() {
                            let result = state.sample().ok_or_else(|| {
                                EngineError::Protocol("search ended without a score".to_string())
                            });
                            let _ = req.reply.send(result);
                        }
                        return Ok(match (shutdown, next) {
                            (Some(ack), next) => {
                                if let Some(next) = next {
                                    let _ = next.reply.send(Err(EngineError::Closed));
                                }
                                After::Shutdown(ack)
                            }
                            (None, Some(next)) => After::Next(next),
                            (None, None) => After::Idle,
                        });
                    }
                    other => trace!(line = ?other, "ignoring engine line"),
                },
                Event::Line(Ok(None)) => {
                    fail(active, next, EngineError::Closed);
                    return Err(EngineError::Closed);
                }
                Event::Line(Err(e)) => {
                    fail(active, next, EngineError::Closed);
                    return Err(EngineError::Io(e));
                }
                Event::Request(Some(Command::Search(newer))) => {
                    if let Some(req) = active.take() {
                        debug!(fen = %req.fen, "search superseded");
                        let _ = req.reply.send(Err(EngineError::Superseded));
                    }
                    if let Some(older) = next.replace(newer) {
                        let _ = older.reply.send(Err(EngineError::Superseded));
                    }
                    self.begin_stop(&mut stopping, &mut deadline, &mut active, &mut next)
                        .await?;
                }
                Event::Request(Some(Command::Shutdown(ack))) => {
                    shutdown = Some(Some(ack));
                    if let Some(req) = active.take() {
                        let _ = req.reply.send(Err(EngineError::Closed));
                    }
                    self.begin_stop(&mut stopping, &mut deadline, &mut active, &mut next)
                        .await?;
                }
                Event::Request(None) => {
                    shutdown = Some(None);
                    self.begin_stop(&mut stopping, &mut deadline, &mut active, &mut next)
                        .await?;
                }
                Event::Deadline if !stopping => {
                    warn!(
                        fen = %state.fen,
                        timeout = ?self.options.search_timeout,
                        "search timed out, stopping engine"
                    );
                    if let Some(req) = active.take() {
                        let _ = req
                            .reply
                            .send(Err(EngineError::Timeout(self.options.search_timeout)));
                    }
                    self.begin_stop(&mut stopping, &mut deadline, &mut active, &mut next)
                        .await?;
                }
                Event::Deadline => {
                    warn!(grace = ?self.options.stop_grace, "engine ignored stop");
                    fail(active, next, EngineError::Closed);
                    return Err(EngineError::Closed);
                }
            }
        }
    }

    async fn start_search(&mut self, request: &SearchRequest) -> Result<(), EngineError> {
        debug!(fen = %request.fen, depth = request.depth, "starting search");
        self.conn
            .send(&GuiCommand::position_fen(request.fen.clone()))
            .await?;
        self.conn
            .send(&GuiCommand::Go(GoOptions::depth(request.depth)))
            .await
    }

    /// Sends `stop` once and shortens the deadline to the stop grace period.
    async fn begin_stop(
        &mut self,
        stopping: &mut bool,
        deadline: &mut Instant,
        active: &mut Option<SearchRequest>,
        next: &mut Option<SearchRequest>,
    ) -> Result<(), EngineError> {
        if *stopping {
            return Ok(());
        }
        *stopping = true;
        *deadline = Instant::now() + self.options.stop_grace;
        if let Err(e) = self.conn.send(&GuiCommand::Stop).await {
            fail(active.take(), next.take(), EngineError::Closed);
            return Err(e);
        }
        Ok(())
    }

    async fn quit(&mut self, ack: Option<oneshot::Sender<()>>) {
        let _ = self.conn.send(&GuiCommand::Quit).await;
        if let Some(child) = self.child.as_mut() {
            if timeout(self.options.stop_grace, child.wait()).await.is_err() {
                let _ = child.start_kill();
            }
        }
        debug!("engine worker stopped");
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    /// After a fatal error: answer every later request with `Closed`.
    async fn drain_closed(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
        while let Some(cmd) = self.requests.recv().await {
            match cmd {
                Command::Search(req) => {
                    let _ = req.reply.send(Err(EngineError::Closed));
                }
                Command::Shutdown(ack) => {
                    let _ = ack.send(());
                    return;
                }
            }
        }
    }
}

fn fail(active: Option<SearchRequest>, next: Option<SearchRequest>, err: EngineError) {
    if let Some(req) = active {
        let _ = req.reply.send(Err(err));
    }
    if let Some(req) = next {
        let _ = req.reply.send(Err(EngineError::Closed));
    }
}

//! Scripted in-process UCI engine for client tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess_analysis::{EngineClient, EngineOptions, EngineTransport};
use chess_core::STARTPOS;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uci::{EngineMessage, GuiCommand, InfoBuilder};

/// What the fake does with one `go`.
pub enum Reply {
    /// Print these lines straight away.
    Lines(Vec<String>),
    /// Print nothing until `stop`, then `bestmove`.
    Hang,
    /// Print nothing, ignore `stop` too.
    Deaf,
    /// Print these byte lines, which need not be UTF-8.
    Raw(Vec<Vec<u8>>),
}

pub fn info_cp(depth: u32, cp: i32, pv: &[&str]) -> String {
    EngineMessage::Info(InfoBuilder::new().depth(depth).score_cp(cp).pv(pv.iter().copied()).build())
        .to_uci()
}

pub fn info_mate(depth: u32, moves: i32, pv: &[&str]) -> String {
    EngineMessage::Info(
        InfoBuilder::new()
            .depth(depth)
            .score_mate(moves)
            .pv(pv.iter().copied())
            .build(),
    )
    .to_uci()
}

pub fn bestmove(mv: Option<&str>) -> String {
    EngineMessage::BestMove {
        mv: mv.map(str::to_string),
        ponder: None,
    }
    .to_uci()
}

/// Lines received by the fake, in order.
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<String>>>);

impl Received {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    /// Polls until `prefix` has been received `n` times.
    pub async fn wait_for(&self, prefix: &str, n: usize) {
        while self.count(prefix) < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

/// Starts a fake engine answering each `go` with `script(fen, depth)`.
pub fn fake_engine<F>(mut script: F) -> (EngineTransport, Received)
where
    F: FnMut(&str, u32) -> Reply + Send + 'static,
{
    let (client, server) = tokio::io::duplex(64 * 1024);
    let received = Received::default();
    let log = received.clone();

    tokio::spawn(async move {
        let (reader, mut writer) = tokio::io::split(server);
        let mut lines = BufReader::new(reader).lines();
        let mut fen = STARTPOS.to_string();
        let mut hanging = false;
        let mut raw: Vec<Vec<u8>> = Vec::new();

        while let Ok(Some(line)) = lines.next_line().await {
            log.0.lock().unwrap().push(line.clone());
            let out: Vec<String> = match GuiCommand::parse(&line) {
                Ok(GuiCommand::Uci) => vec![
                    "id name Fakefish 1".to_string(),
                    "id author Tests".to_string(),
                    "option name Hash type spin default 16 min 1 max 1024".to_string(),
                    "uciok".to_string(),
                ],
                Ok(GuiCommand::IsReady) => vec!["readyok".to_string()],
                Ok(GuiCommand::Position { fen: Some(f), .. }) => {
                    fen = f;
                    Vec::new()
                }
                Ok(GuiCommand::Go(opts)) => match script(&fen, opts.depth.unwrap_or(1)) {
                    Reply::Lines(lines) => lines,
                    Reply::Hang => {
                        hanging = true;
                        Vec::new()
                    }
                    Reply::Deaf => Vec::new(),
                    Reply::Raw(lines) => {
                        raw = lines;
                        Vec::new()
                    }
                },
                Ok(GuiCommand::Stop) if hanging => {
                    hanging = false;
                    vec![bestmove(Some("e2e4"))]
                }
                Ok(GuiCommand::Quit) => break,
                _ => Vec::new(),
            };
            let bytes = out
                .into_iter()
                .map(String::into_bytes)
                .chain(raw.drain(..));
            for mut l in bytes {
                l.push(b'\n');
                if writer.write_all(&l).await.is_err() {
                    return;
                }
            }
        }
    });

    let (reader, writer) = tokio::io::split(client);
    (EngineTransport::new(reader, writer, "fake"), received)
}

pub fn fast_options() -> EngineOptions {
    EngineOptions {
        handshake_timeout: Duration::from_secs(2),
        search_timeout: Duration::from_secs(5),
        stop_grace: Duration::from_millis(500),
        ..EngineOptions::default()
    }
}

pub async fn connect<F>(script: F) -> (EngineClient, Received)
where
    F: FnMut(&str, u32) -> Reply + Send + 'static,
{
    let (transport, received) = fake_engine(script);
    let client = EngineClient::connect(transport, fast_options())
        .await
        .expect("handshake with fake engine");
    (client, received)
}

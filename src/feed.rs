/// Host feed parser: one JSON object per line, written by the in-game plugin.
///
/// Record shapes (`type` tag):
///   {"type":"session_start","at_ms":0}
///   {"type":"sample","at_ms":1000,"vessel":{...}|null}
///   {"type":"event","at_ms":1200,"event":{"kind":"launch"}}
///   {"type":"session_end","at_ms":9000}
///
/// Lines that are blank or do not parse are skipped; a corrupt line never
/// stops the pipeline.
use crate::{events::FlightEvent, telemetry::VesselReading};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedRecord {
    SessionStart { at_ms: u64 },
    SessionEnd   { at_ms: u64 },
    /// `vessel: null`: nothing under control.
    Sample {
        at_ms:  u64,
        #[serde(default)]
        vessel: Option<VesselReading>,
    },
    Event {
        at_ms: u64,
        event: FlightEvent,
    },
}

impl FeedRecord {
    pub fn at_ms(&self) -> u64 {
        match self {
            Self::SessionStart { at_ms }
            | Self::SessionEnd { at_ms }
            | Self::Sample { at_ms, .. }
            | Self::Event { at_ms, .. } => *at_ms,
        }
    }
}

pub fn parse_line(line: &str) -> Option<FeedRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!("Skipping unparseable feed line ({}): {}", e, line);
            None
        }
    }
}

pub async fn run(mut rx: Receiver<String>, tx: Sender<FeedRecord>) -> Result<()> {
    while let Some(line) = rx.recv().await {
        if let Some(record) = parse_line(&line) {
            if tx.send(record).await.is_err() {
                break;
            }
        }
    }
    Ok(())
}

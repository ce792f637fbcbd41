//! Test and helper mocks for turbidostat_core

use std::collections::VecDeque;
use std::io;

use turbidostat_traits::{BoxError, Link};

use crate::codec::encode_reading;
use crate::logger::RecordSink;
use crate::types::{LogRecord, RawReading};

/// Scripted board reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Bytes delivered before the timeout (may be short).
    Bytes(Vec<u8>),
    /// Transport failure on read.
    Error(String),
}

impl Reply {
    pub fn reading(tx: u32, rx: u32) -> Self {
        Reply::Bytes(encode_reading(RawReading::new(tx, rx)).to_vec())
    }
}

/// Link that records what was written and plays back scripted replies.
/// An exhausted script behaves like a silent board.
#[derive(Debug, Default)]
pub struct MockLink {
    pub writes: Vec<Vec<u8>>,
    pub valve_events: Vec<bool>,
    replies: VecDeque<Reply>,
    repeat: Option<Reply>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply.
    pub fn reply(mut self, r: Reply) -> Self {
        self.replies.push_back(r);
        self
    }

    /// Reply with `r` whenever the queue is empty.
    pub fn always(mut self, r: Reply) -> Self {
        self.repeat = Some(r);
        self
    }

    /// Command bytes written, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.writes.iter().flatten().copied().collect()
    }
}

impl Link for MockLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
        match self.replies.pop_front().or_else(|| self.repeat.clone()) {
            Some(Reply::Bytes(b)) => {
                let n = b.len().min(buf.len());
                buf[..n].copy_from_slice(&b[..n]);
                Ok(n)
            }
            Some(Reply::Error(msg)) => Err(msg.into()),
            None => Ok(0),
        }
    }

    fn set_valve(&mut self, open: bool) -> Result<(), BoxError> {
        self.valve_events.push(open);
        Ok(())
    }
}

/// Keeps emitted records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<LogRecord>,
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        self.records.push(*record);
        Ok(())
    }
}

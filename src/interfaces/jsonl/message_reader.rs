use crate::application::ingest::InboundMessage;
use crate::error::{PaymentError, Result};
use std::io::{BufRead, BufReader, Read};

/// Reads inbound messages from a JSON-lines source, one message body per line.
///
/// Message ids are derived from the 1-based line number. Blank lines are
/// skipped; bodies are not parsed here so that malformed ones still reach
/// the handler and get reported.
pub struct MessageReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> MessageReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads messages.
    pub fn messages(self) -> impl Iterator<Item = Result<InboundMessage>> {
        self.reader
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Ok(body) if body.trim().is_empty() => None,
                Ok(body) => Some(Ok(InboundMessage {
                    id: format!("line-{}", index + 1),
                    body,
                })),
                Err(e) => Some(Err(PaymentError::from(e))),
            })
    }
}

//! Scenario tests for the pipe state machine.
//!
//! The `MockTransport` below is the reference implementation of the
//! [`Transport`] contract: scripted response bytes on the receive side, a
//! shared recorder capturing everything the engine does on the other.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::options::{RequestOptions, StreamMode};
use crate::transport::{Target, Transport, TransportError};
use crate::Pipe;

mod drive;

/// Observable side of a [`MockTransport`], shared with the test.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub sent: Vec<u8>,
    pub connects: u64,
    pub closes: u32,
    pub releases: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EndBehavior {
    /// Running out of scripted bytes means the peer closed.
    Close,
    /// Running out of scripted bytes means the read timed out.
    Timeout,
}

pub(crate) struct MockTransport {
    input: Vec<u8>,
    pos: usize,
    end: EndBehavior,
    /// Report every receive as a close-with-partial, the way a transport
    /// that learns about EOF together with the final bytes would.
    eager_close: bool,
    rec: Rc<RefCell<Recorder>>,
}

impl MockTransport {
    pub fn new(input: &[u8]) -> (MockTransport, Rc<RefCell<Recorder>>) {
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let t = MockTransport {
            input: input.to_vec(),
            pos: 0,
            end: EndBehavior::Close,
            eager_close: false,
            rec: Rc::clone(&rec),
        };
        (t, rec)
    }

    pub fn timing_out(mut self) -> Self {
        self.end = EndBehavior::Timeout;
        self
    }

    pub fn eager_close(mut self) -> Self {
        self.eager_close = true;
        self
    }

    fn out_of_data(&self, partial: Vec<u8>) -> TransportError {
        match self.end {
            EndBehavior::Close => TransportError::Closed { partial },
            EndBehavior::Timeout => TransportError::TimedOut,
        }
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _target: &Target, _timeout: Option<Duration>) -> Result<(), TransportError> {
        self.rec.borrow_mut().connects += 1;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.rec.borrow_mut().sent.extend_from_slice(data);
        Ok(data.len())
    }

    fn receive(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        let avail = self.input.len() - self.pos;
        let take = avail.min(max);
        let out = self.input[self.pos..self.pos + take].to_vec();
        self.pos += take;

        if self.eager_close {
            return Err(TransportError::Closed { partial: out });
        }
        if take < max {
            return Err(self.out_of_data(out));
        }
        Ok(out)
    }

    fn receive_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let rest = &self.input[self.pos..];
        match rest.windows(2).position(|w| w == b"\r\n") {
            Some(i) => {
                let line = rest[..i].to_vec();
                self.pos += i + 2;
                Ok(line)
            }
            None => {
                let partial = rest.to_vec();
                self.pos = self.input.len();
                Err(self.out_of_data(partial))
            }
        }
    }

    fn set_timeout(&mut self, _timeout: Option<Duration>) {}

    fn close(&mut self) -> Result<(), TransportError> {
        self.rec.borrow_mut().closes += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), TransportError> {
        self.rec.borrow_mut().releases += 1;
        Ok(())
    }

    fn reused_count(&self) -> u64 {
        self.rec.borrow().connects.saturating_sub(1)
    }
}

/// A pipe positioned at `Begin` over the canned response, having sent a
/// plain GET.
pub(crate) fn begin_pipe(response: &[u8]) -> (Pipe, Rc<RefCell<Recorder>>) {
    begin_pipe_with(response, RequestOptions::new())
}

/// Same, with caller-controlled request options.
pub(crate) fn begin_pipe_with(
    response: &[u8],
    opts: RequestOptions,
) -> (Pipe, Rc<RefCell<Recorder>>) {
    let (t, rec) = MockTransport::new(response);
    let mut pipe = Pipe::new(Box::new(t));
    let result = pipe
        .request(
            &Target::new("example.test"),
            opts.stream(StreamMode::PassThrough),
        )
        .unwrap();
    assert!(result.is_none());
    (pipe, rec)
}

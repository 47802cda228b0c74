#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;

use httpipe::{Event, Pipe, RequestOptions, StreamMode, Target, Transport, TransportError};

// The fuzz input plays the server: whatever bytes arrive are the response.
struct Scripted {
    input: Vec<u8>,
    pos: usize,
}

impl Transport for Scripted {
    fn connect(&mut self, _: &Target, _: Option<Duration>) -> Result<(), TransportError> {
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        Ok(data.len())
    }

    fn receive(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        let avail = self.input.len() - self.pos;
        let take = avail.min(max);
        let out = self.input[self.pos..self.pos + take].to_vec();
        self.pos += take;
        if take < max {
            return Err(TransportError::Closed { partial: out });
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
                Err(TransportError::Closed { partial })
            }
        }
    }

    fn set_timeout(&mut self, _: Option<Duration>) {}

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn release(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn reused_count(&self) -> u64 {
        0
    }
}

fuzz_target!(|data: &[u8]| {
    let transport = Scripted {
        input: data.to_vec(),
        pos: 0,
    };
    let mut pipe = Pipe::new(Box::new(transport));

    if pipe
        .request(
            &Target::new("fuzz.test"),
            RequestOptions::new().stream(StreamMode::PassThrough),
        )
        .is_err()
    {
        return;
    }

    // The machine must terminate (eof or error) without panicking,
    // whatever the "server" sends.
    for _ in 0..10_000 {
        match pipe.read() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
});

//! Line-oriented reading of the client stream

use std::io::{self, BufRead};

/// Reads CRLF- or LF-terminated lines from a client
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Read one line without its terminator.
    ///
    /// Returns `UnexpectedEof` once the peer has closed the stream. Invalid
    /// UTF-8 is replaced rather than rejected.
    pub fn read_line(&mut self) -> io::Result<String> {
        self.buffer.clear();

        if self.inner.read_until(b'\n', &mut self.buffer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            ));
        }

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }

        Ok(String::from_utf8_lossy(&self.buffer).into_owned())
    }

    /// Read a dot-terminated block.
    ///
    /// The terminating `.` line is consumed but not returned. A leading dot
    /// is removed from every other line that starts with one.
    pub fn read_dot_lines(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();

        loop {
            let line = self.read_line()?;
            if line == "." {
                return Ok(lines);
            }

            match line.strip_prefix('.') {
                Some(unstuffed) => lines.push(unstuffed.to_string()),
                None => lines.push(line),
            }
        }
    }
}

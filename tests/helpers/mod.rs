#![allow(dead_code)]

use std::io;

/// An in-memory writer that fails once it has accepted `limit` writes.
pub struct Writer {
    buf: Vec<u8>,
    writes: usize,
    limit: Option<usize>,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            writes: 0,
            limit: None,
        }
    }

    pub fn with_max(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    #[track_caller]
    pub fn into_string(self) -> String {
        String::from_utf8(self.buf).unwrap()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.limit.map_or(false, |limit| self.writes >= limit) {
            return Err(io::Error::from(io::ErrorKind::AddrInUse));
        }
        self.writes += 1;
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

//! An in-memory, unidirectional, ordered byte stream between two threads.
//!
//! This is the transport the tests and the dispatcher demo run the exchange over. Any other
//! reliable ordered byte stream, such as an OS pipe or a TCP socket, works the same way.
use std::io::{self, Read, Write};
use std::sync::mpsc;

/// Create a connected writer and reader.
///
/// The reader sees end of stream once the writer has been dropped and everything it wrote has
/// been read. Writing after the reader was dropped fails with `BrokenPipe`.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel();
    (PipeWriter { tx }, PipeReader { rx, buf: Vec::new(), pos: 0 })
}

pub struct PipeWriter {
    tx: mpsc::Sender<Vec<u8>>,
}

pub struct PipeReader {
    rx: mpsc::Receiver<Vec<u8>>,
    buf: Vec<u8>,
    pos: usize,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx.send(buf.to_vec()).map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos == self.buf.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.buf = chunk;
                    self.pos = 0;
                }
                // Disconnected, end of stream.
                Err(_) => return Ok(0),
            }
        }
        let n = out.len().min(self.buf.len() - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn bytes_arrive_in_order_across_writes() {
        let (mut w, mut r) = pipe();
        let t = thread::spawn(move || {
            w.write_all(b"hello ").unwrap();
            w.write_all(b"").unwrap();
            w.write_all(b"world").unwrap();
        });
        let mut got = String::new();
        r.read_to_string(&mut got).unwrap();
        t.join().unwrap();
        assert_eq!(got, "hello world");
    }

    #[test]
    fn read_exact_spans_chunks() {
        let (mut w, mut r) = pipe();
        w.write_all(&[1, 2]).unwrap();
        w.write_all(&[3, 4, 5]).unwrap();
        let mut four = [0u8; 4];
        r.read_exact(&mut four).unwrap();
        assert_eq!(four, [1, 2, 3, 4]);
        drop(w);
        let mut rest = [0u8; 2];
        assert_eq!(r.read_exact(&mut rest).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn writing_to_a_dropped_reader_fails() {
        let (mut w, r) = pipe();
        drop(r);
        assert_eq!(w.write(b"x").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }
}

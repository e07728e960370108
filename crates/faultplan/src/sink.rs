use std::fmt::Display;
use std::io::{self, Write};

/// Destination of injection list lines.
pub trait RecordSink<T> {
    fn accept(&mut self, record: T) -> io::Result<()>;

    /// Push buffered lines to their destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every record in memory.
impl<T> RecordSink<T> for Vec<T> {
    fn accept(&mut self, record: T) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Writes every record on its own newline-terminated line.
#[derive(Debug)]
pub struct LineSink<W: Write> {
    writer: io::BufWriter<W>,
    lines: usize,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: io::BufWriter::new(writer),
            lines: 0,
        }
    }

    /// Number of lines accepted so far.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and extract the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

impl<W, T> RecordSink<T> for LineSink<W>
where
    W: Write,
    T: Display,
{
    fn accept(&mut self, record: T) -> io::Result<()> {
        writeln!(self.writer, "{record}")?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        LineSink::flush(self)
    }
}

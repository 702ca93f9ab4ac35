use std::io::{self, Read};

/// Name under which the archive is offered for download.
pub const ARCHIVE_FILENAME: &str = "profile.zip";

/// Single-use byte source for the compressed diagnostic archive.
///
/// The stream has exactly one owner at any time: it is created by the
/// gateway's stop call, handed to the orchestrator's caller, and finally to
/// the deliverer. Whoever owns it last must close it; `Drop` closes as a
/// backstop so no exit path leaks the underlying source. Reading after
/// close is a programming error and panics.
pub struct ArchiveStream {
    source: Option<Box<dyn Read + Send>>,
}

impl ArchiveStream {
    pub fn from_reader(source: impl Read + Send + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
        }
    }

    /// Releases the underlying source. Safe to call more than once, but the
    /// lifecycle contract is that it fires exactly once per stream.
    pub fn close(&mut self) {
        if let Some(source) = self.source.take() {
            drop(source);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }
}

impl Read for ArchiveStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.source.as_mut() {
            Some(source) => source.read(buf),
            None => panic!("archive stream read after close"),
        }
    }
}

impl Drop for ArchiveStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("closed", &self.is_closed())
            .finish()
    }
}

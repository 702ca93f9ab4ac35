use crate::archive::{ArchiveStream, ARCHIVE_FILENAME};
use log::error;
use std::io::{Read, Write};

const COPY_CHUNK_BYTES: usize = 8 * 1024;

/// Streams the profiling archive to the sink as a file download.
///
/// The archive length is unknown up front, so the response carries no
/// `Content-Length`; `Connection: close` delimits the body. Once the head
/// is committed no structured error can reach the client any more, so
/// read/write failures mid-copy are logged and swallowed. The stream is
/// closed exactly once on every exit path, including a failed header
/// write and a peer disconnect mid-copy.
pub fn deliver_archive(mut stream: ArchiveStream, sink: &mut (impl Write + ?Sized)) {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Disposition: attachment; filename={ARCHIVE_FILENAME}\r\nConnection: close\r\n\r\n"
    );
    if let Err(err) = sink.write_all(head.as_bytes()) {
        error!("event=profiling_download_failed stage=head error={err}");
        stream.close();
        return;
    }
    let mut chunk = [0u8; COPY_CHUNK_BYTES];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                if let Err(err) = sink.write_all(&chunk[..read]) {
                    error!("event=profiling_download_failed stage=copy error={err}");
                    break;
                }
            }
            Err(err) => {
                error!("event=profiling_download_failed stage=archive_read error={err}");
                break;
            }
        }
    }
    if let Err(err) = sink.flush() {
        error!("event=profiling_download_failed stage=flush error={err}");
    }
    stream.close();
}

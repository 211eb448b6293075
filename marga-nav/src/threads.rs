//! Transport threads for the streaming protocol.
//!
//! - Reader thread: blocking line reads from the input, pushed into a
//!   bounded channel
//! - Main thread: [`run_session`] pops one line at a time and hands it to
//!   the session, so a `compute_path` queues behind the one in flight

use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use marga_map::CancelToken;

use crate::error::Result;
use crate::session::Session;

/// Lines buffered between the reader and the session
pub const LINE_QUEUE_CAPACITY: usize = 64;

/// How often the session loop checks for shutdown while idle
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawn the `reader` thread.
///
/// The channel closes at end of input or on a read error. Invalid UTF-8 is
/// replaced rather than dropped so the session still reports the line.
pub fn spawn_reader<R>(mut input: R, capacity: usize) -> Result<(Receiver<String>, JoinHandle<()>)>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = bounded::<String>(capacity);

    let handle = thread::Builder::new()
        .name("reader".into())
        .spawn(move || {
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match input.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf).into_owned();
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Input read error: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Reader thread finished");
        })?;

    Ok((rx, handle))
}

/// Feed lines to the session until input ends or shutdown is requested.
///
/// Returns the number of lines handled.
pub fn run_session(session: &mut Session, lines: &Receiver<String>, shutdown: &CancelToken) -> usize {
    let mut handled = 0;

    loop {
        if shutdown.is_cancelled() {
            tracing::info!("Shutdown requested, stopping session loop");
            break;
        }

        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                session.handle_line(&line);
                handled += 1;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    handled
}

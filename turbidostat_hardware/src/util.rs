use std::io;
use std::time::{Duration, Instant};

/// Fill `buf` from `read_some`, tolerating partial reads and timeouts from the
/// underlying port, until the buffer is full or `timeout` has elapsed.
///
/// Returns the number of bytes read; a short count means the deadline passed.
/// `TimedOut`, `WouldBlock` and `Interrupted` are retried until the deadline;
/// other I/O errors are returned as-is. Empty polls sleep `poll_interval`.
pub fn read_full_with_timeout(
    mut read_some: impl FnMut(&mut [u8]) -> io::Result<usize>,
    buf: &mut [u8],
    timeout: Duration,
    poll_interval: Duration,
) -> io::Result<usize> {
    let deadline = Instant::now() + timeout;
    let mut filled = 0;
    while filled < buf.len() {
        let idle = match read_some(&mut buf[filled..]) {
            Ok(0) => true,
            Ok(n) => {
                filled += n;
                false
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                true
            }
            Err(e) => return Err(e),
        };
        if filled == buf.len() || Instant::now() >= deadline {
            break;
        }
        if idle {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(filled)
}

use std::io::{self, Read};
use std::time::{Duration, Instant};

/// Fails a transfer whose average speed over a window drops below a floor.
///
/// The speed is checked whenever a read completes, so a connection that stops
/// delivering data entirely is left to the client's overall timeout.
pub struct LowSpeedReader<R> {
    inner: R,
    /// Bytes per second; zero disables the check.
    limit: u64,
    window: Duration,
    window_start: Instant,
    window_bytes: u64,
}
impl<R: Read> LowSpeedReader<R> {
    pub fn new(inner: R, limit: u64, window: Duration) -> Self {
        Self { inner, limit, window, window_start: Instant::now(), window_bytes: 0 }
    }

    fn enabled(&self) -> bool {
        self.limit > 0 && !self.window.is_zero()
    }
}

impl<R: Read> Read for LowSpeedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if !self.enabled() || read == 0 {
            return Ok(read);
        }
        self.window_bytes += read as u64;
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            let rate = self.window_bytes as f64 / elapsed.as_secs_f64();
            if rate < self.limit as f64 {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("transfer speed {rate:.0} B/s below {} B/s for {:?}", self.limit, self.window),
                ));
            }
            self.window_start = Instant::now();
            self.window_bytes = 0;
        }
        Ok(read)
    }
}

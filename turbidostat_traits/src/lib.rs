pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// Error type used at trait boundaries; mapped to typed errors by callers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Byte-level connection to the chamber board.
///
/// Implementations own the serial port (or a simulation of it). Reads are
/// bounded by the connection's own timeout.
pub trait Link {
    /// Write all bytes to the board.
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError>;

    /// Fill as much of `buf` as arrives before the read timeout expires and
    /// return the number of bytes read. A short count is not an error.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BoxError>;

    /// Drive the auxiliary valve line. `open == true` opens the valve
    /// (the line is low-active on the board).
    fn set_valve(&mut self, open: bool) -> Result<(), BoxError>;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
        (**self).read(buf)
    }

    fn set_valve(&mut self, open: bool) -> Result<(), BoxError> {
        (**self).set_valve(open)
    }
}

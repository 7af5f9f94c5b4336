//! IO handling for the LMC.
//!
//! The interface for IO devices is defined with the [`IODevice`] trait.
//! This is exposed to the simulator with the [`SimIO`] enum.
//!
//! `INP` reads one value from the device, and `OUT` writes the accumulator to the device.
//!
//! Besides those two key items, this module also includes:
//! - [`EmptyIO`]: An `IODevice` holding the implementation for a lack of IO support.
//! - [`BufferedIO`]: An `IODevice` holding a buffered implementation for IO.
//! - [`BiChannelIO`]: An `IODevice` holding a threaded/channel implementation for IO.
//! - [`CustomIO`]: An `IODevice` that can be used to wrap around custom IO implementations.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::thread::JoinHandle;

use crossbeam_channel as cbc;

/// An IO device that can be read/written to.
pub trait IODevice {
    /// Reads the next input value.
    ///
    /// If successful, this returns the value read.
    /// If there is no more input, this returns `None`.
    ///
    /// Input values are not range-checked here. The simulator wraps them into a word.
    fn read_input(&self) -> Option<i32>;

    /// Writes an output value.
    ///
    /// This returns whether the write was successful or not.
    fn write_output(&self, value: u16) -> bool;

    /// Tries to close this IO device.
    fn close(self);
}
impl dyn IODevice {} // assert IODevice is dyn safe

/// No IO. There is never any input, and all writes are unsuccessful.
pub struct EmptyIO;
impl IODevice for EmptyIO {
    fn read_input(&self) -> Option<i32> {
        None
    }

    fn write_output(&self, _value: u16) -> bool {
        false
    }

    fn close(self) {}
}

/// IO that reads from an input buffer and writes to an output buffer.
///
/// The buffers can be accessed in code via [`BufferedIO::get_input`] and [`BufferedIO::get_output`].
///
/// Note that if a input/output lock guard is acquired from one of the locks of this IO,
/// the simulator blocks on the next `INP`/`OUT` until that guard is dropped.
/// Thus, a lock guard should never be held across a simulator run.
#[derive(Clone)]
pub struct BufferedIO {
    input: Arc<RwLock<VecDeque<i32>>>,
    output: Arc<RwLock<Vec<u16>>>
}
impl BufferedIO {
    /// Creates a new BufferedIO.
    pub fn new() -> Self {
        Self { input: Default::default(), output: Default::default() }
    }
    /// Creates a new BufferedIO from already defined buffers.
    pub fn with_bufs(input: Arc<RwLock<VecDeque<i32>>>, output: Arc<RwLock<Vec<u16>>>) -> Self {
        Self { input, output }
    }
    /// Creates a new BufferedIO with the given values queued as input.
    pub fn with_input(input: impl IntoIterator<Item=i32>) -> Self {
        Self::with_bufs(
            Arc::new(RwLock::new(input.into_iter().collect())),
            Default::default()
        )
    }

    fn lock_input(&self) -> RwLockWriteGuard<'_, VecDeque<i32>> {
        self.input.write().unwrap_or_else(|e| e.into_inner())
    }
    fn lock_output(&self) -> RwLockWriteGuard<'_, Vec<u16>> {
        self.output.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Gets a reference to the input buffer.
    pub fn get_input(&self) -> &Arc<RwLock<VecDeque<i32>>> {
        &self.input
    }
    /// Gets a reference to the output buffer.
    pub fn get_output(&self) -> &Arc<RwLock<Vec<u16>>> {
        &self.output
    }
}
impl Default for BufferedIO {
    fn default() -> Self {
        Self::new()
    }
}
impl IODevice for BufferedIO {
    fn read_input(&self) -> Option<i32> {
        self.lock_input().pop_front()
    }

    fn write_output(&self, value: u16) -> bool {
        self.lock_output().push(value);
        true
    }

    fn close(self) {}
}

/// A helper struct for [`BiChannelIO::new`],
/// indicating the channel is closed and no more reads/writes will come from it.
#[derive(Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Stop;

/// An IO that reads from one channel and writes to another.
///
/// `INP` blocks until the reader channel produces a value.
/// Once the reader stops, `INP` has no more input.
///
/// `OUT` sends the value to the writer channel,
/// which is consumed by the writer on another thread.
pub struct BiChannelIO {
    read_data:    cbc::Receiver<i32>,
    #[allow(unused)]
    read_handler: JoinHandle<()>,

    write_data:    cbc::Sender<u16>,
    write_handler: JoinHandle<()>
}
impl BiChannelIO {
    /// Creates a new bi-channel IO device with the given reader and writer.
    ///
    /// This calls the reader function every time the IO input needs a value.
    /// The reader function should block until a value is ready, or return Stop
    /// if there are no more values to read.
    ///
    /// This calls the writer function every time a value needs to be written to the
    /// IO output.
    ///
    /// This uses threads to read and write from input and output. As such,
    /// the reader may be polled for the next value before the simulator requests it.
    pub fn new(
        mut reader: impl FnMut() -> Result<i32, Stop> + Send + 'static,
        mut writer: impl FnMut(u16) -> Result<(), Stop> + Send + 'static
    ) -> Self {
        let (read_tx, read_rx) = cbc::bounded(1);
        let (write_tx, write_rx) = cbc::bounded(1);

        // Reader thread:
        let read_handler = std::thread::spawn(move || loop {
            let Ok(value) = reader() else { return };
            let Ok(()) = read_tx.send(value) else { return };
        });

        // Writer thread:
        let write_handler = std::thread::spawn(move || {
            for value in write_rx {
                let Ok(()) = writer(value) else { return };
            }
        });

        Self {
            read_data: read_rx,
            read_handler,
            write_data: write_tx,
            write_handler
        }
    }

    /// Creates a bi-channel IO device with stdin being the read data and stdout being the write data.
    ///
    /// Each line of stdin is parsed as one input value. Lines that are not integers are skipped
    /// (with a warning). Each output value is written to stdout on its own line.
    pub fn stdio() -> Self {
        use std::io::{self, BufRead, Write};

        Self::new(
            || {
                let mut line = String::new();
                loop {
                    line.clear();
                    match io::stdin().lock().read_line(&mut line) {
                        Ok(0) | Err(_) => return Err(Stop),
                        Ok(_) => match line.trim().parse::<i32>() {
                            Ok(value) => return Ok(value),
                            Err(e) => tracing::warn!(input = line.trim(), "skipping non-numeric input: {e}"),
                        }
                    }
                }
            },
            |value| {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{value}")
                    .and_then(|_| stdout.flush())
                    .map_err(|_| Stop)
            }
        )
    }
}

impl IODevice for BiChannelIO {
    fn read_input(&self) -> Option<i32> {
        // this errors if the reader stopped (or panicked),
        // which just means there is no more data
        self.read_data.recv().ok()
    }

    fn write_output(&self, value: u16) -> bool {
        self.write_data.send(value).is_ok()
    }

    fn close(self) {
        let Self {
            read_data,
            read_handler: _,
            write_data,
            write_handler
        } = self;

        // Drop the channels.
        std::mem::drop(read_data);
        std::mem::drop(write_data);

        // Wait for the write handler to finish writing everything it received.
        // The read handler is not joined, as it can hang on reading.
        let _ = write_handler.join();
    }
}

// `Box<dyn IODevice>` does not implement IODevice, since `close`
// cannot be called on an unsized `dyn IODevice`.
//
// So, the device is put in an Option
// and closed by taking it out of the Option,
// making close only require &mut Self instead of Self.
trait IODeviceMutClosable {
    fn read_input(&self) -> Option<i32>;
    fn write_output(&self, value: u16) -> bool;

    /// Closes but doesn't consume the object.
    ///
    /// The object acts like [`EmptyIO`] after this point.
    fn take_close(&mut self);
}
impl<D: IODevice> IODeviceMutClosable for Option<D> {
    fn read_input(&self) -> Option<i32> {
        self.as_ref()?.read_input()
    }
    fn write_output(&self, value: u16) -> bool {
        self.as_ref().is_some_and(|d| d.write_output(value))
    }
    fn take_close(&mut self) {
        if let Some(d) = self.take() {
            d.close();
        }
    }
}

/// An opaque box that holds custom defined IO.
///
/// This can be used to use a different implementation of IO
/// than the ones implemented in this module.
pub struct CustomIO(Box<dyn IODeviceMutClosable + Send + Sync>);
impl CustomIO {
    /// Creates a new custom IO.
    pub fn new(device: impl IODevice + Send + Sync + 'static) -> Self {
        CustomIO(Box::new(Some(device)))
    }
}
impl IODevice for CustomIO {
    fn read_input(&self) -> Option<i32> {
        self.0.read_input()
    }

    fn write_output(&self, value: u16) -> bool {
        self.0.write_output(value)
    }

    fn close(mut self) {
        self.0.take_close();
    }
}

/// All the variants of IO accepted by the Simulator.
#[derive(Default)]
pub enum SimIO {
    /// No IO. This corresponds to the implementation of [`EmptyIO`].
    #[default]
    Empty,
    /// A buffered implementation. See [`BufferedIO`].
    Buffered(BufferedIO),
    /// A bi-channel IO implementation. See [`BiChannelIO`].
    BiChannel(BiChannelIO),
    /// A custom IO implementation. See [`CustomIO`].
    Custom(CustomIO)
}
impl std::fmt::Debug for SimIO {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimIO")
            .finish_non_exhaustive()
    }
}
impl From<EmptyIO> for SimIO {
    fn from(_value: EmptyIO) -> Self {
        SimIO::Empty
    }
}
impl From<BufferedIO> for SimIO {
    fn from(value: BufferedIO) -> Self {
        SimIO::Buffered(value)
    }
}
impl From<BiChannelIO> for SimIO {
    fn from(value: BiChannelIO) -> Self {
        SimIO::BiChannel(value)
    }
}
impl From<CustomIO> for SimIO {
    fn from(value: CustomIO) -> Self {
        SimIO::Custom(value)
    }
}
impl IODevice for SimIO {
    fn read_input(&self) -> Option<i32> {
        match self {
            SimIO::Empty => EmptyIO.read_input(),
            SimIO::Buffered(io) => io.read_input(),
            SimIO::BiChannel(io) => io.read_input(),
            SimIO::Custom(io) => io.read_input(),
        }
    }

    fn write_output(&self, value: u16) -> bool {
        match self {
            SimIO::Empty => EmptyIO.write_output(value),
            SimIO::Buffered(io) => io.write_output(value),
            SimIO::BiChannel(io) => io.write_output(value),
            SimIO::Custom(io) => io.write_output(value)
        }
    }

    fn close(self) {
        match self {
            SimIO::Empty => EmptyIO.close(),
            SimIO::Buffered(io) => io.close(),
            SimIO::BiChannel(io) => io.close(),
            SimIO::Custom(io) => io.close()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{BiChannelIO, BufferedIO, CustomIO, EmptyIO, IODevice, SimIO, Stop};

    #[test]
    fn test_buffered() {
        let io = BufferedIO::with_input([3, -4]);
        assert_eq!(io.read_input(), Some(3));
        assert_eq!(io.read_input(), Some(-4));
        assert_eq!(io.read_input(), None);

        io.get_input().write().unwrap().push_back(5);
        assert_eq!(io.read_input(), Some(5));

        assert!(io.write_output(12));
        assert!(io.write_output(999));
        assert_eq!(&*io.get_output().read().unwrap(), &[12, 999]);
    }

    #[test]
    fn test_empty() {
        let io = SimIO::from(EmptyIO);
        assert_eq!(io.read_input(), None);
        assert!(!io.write_output(1));
    }

    #[test]
    fn test_bichannel() {
        let mut inputs = vec![1, 2, 3].into_iter();
        let written = Arc::new(Mutex::new(vec![]));
        let w = Arc::clone(&written);

        let io = BiChannelIO::new(
            move || inputs.next().ok_or(Stop),
            move |value| {
                w.lock().unwrap().push(value);
                Ok(())
            }
        );

        assert_eq!(io.read_input(), Some(1));
        assert_eq!(io.read_input(), Some(2));
        assert_eq!(io.read_input(), Some(3));
        // reader stopped
        assert_eq!(io.read_input(), None);

        assert!(io.write_output(7));
        assert!(io.write_output(8));
        // closing waits for the writer to drain
        io.close();
        assert_eq!(&*written.lock().unwrap(), &[7, 8]);
    }

    #[test]
    fn test_custom() {
        struct Constant(i32);
        impl IODevice for Constant {
            fn read_input(&self) -> Option<i32> {
                Some(self.0)
            }
            fn write_output(&self, _value: u16) -> bool {
                true
            }
            fn close(self) {}
        }

        let io = SimIO::from(CustomIO::new(Constant(42)));
        assert_eq!(io.read_input(), Some(42));
        assert_eq!(io.read_input(), Some(42));
        assert!(io.write_output(0));
        io.close();
    }
}

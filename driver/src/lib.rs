pub mod font;
pub mod i2c;
pub mod ssd1306;

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum OledError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("coordinates outside the display resolution")]
    OutOfRange,
    #[error("text does not fit the display geometry")]
    OutOfBounds,
    #[error("cannot allocate display buffer")]
    AllocationFailure,
    #[error("display does not respond on the bus")]
    DeviceUnreachable,
    #[error("bus transfer failed: {0}")]
    Transport(String),
    #[error("initialization step `{step}` failed: {source}")]
    InitStep {
        step: &'static str,
        #[source]
        source: Box<OledError>,
    },
}

pub type OledResult<T> = Result<T, OledError>;

/// Byte-oriented link to the display controller.
///
/// The device address and any register-select framing belong to the
/// implementation; the driver core only distinguishes command bytes from
/// bulk data transfers.
pub trait Transport {
    /// Sends one byte to the controller's command register.
    fn send_command(&mut self, byte: u8) -> OledResult<()>;

    /// Sends a raw buffer to the controller.
    ///
    /// Returns the number of bytes the bus accepted, which may be fewer
    /// than requested.
    fn send_bytes(&mut self, buffer: &[u8]) -> OledResult<usize>;
}

/// Caller-facing surface of an attached display, consumed by whatever
/// device-file layer sits on top of the driver.
pub trait TextDisplay {
    /// Checks the display is reachable.
    fn open(&self) -> OledResult<()>;

    /// Replaces the display content with `text`.
    ///
    /// The text is cut into grid lines, rendered and flushed as a single
    /// unit of work; concurrent writers never see each other's lines
    /// mixed. Returns the number of characters that fit on the display.
    fn write_text(&self, text: &[u8]) -> OledResult<usize>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use crate::{OledError, OledResult, Transport};

    #[derive(Debug, Default)]
    pub struct MockState {
        pub commands: Vec<u8>,
        pub transfers: Vec<Vec<u8>>,
        pub fail_on_command: Option<u8>,
        pub fail_transfers: bool,
        pub short_by: usize,
    }

    /// Records everything the driver puts on the bus. The shared state
    /// stays inspectable after the transport has been boxed away into a
    /// controller.
    #[derive(Debug, Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        pub fn new() -> (Self, Arc<Mutex<MockState>>) {
            let state = Arc::new(Mutex::new(MockState::default()));
            (
                MockTransport {
                    state: state.clone(),
                },
                state,
            )
        }
    }

    impl Transport for MockTransport {
        fn send_command(&mut self, byte: u8) -> OledResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_on_command == Some(byte) {
                return Err(OledError::Transport("nack".to_string()));
            }
            state.commands.push(byte);
            Ok(())
        }

        fn send_bytes(&mut self, buffer: &[u8]) -> OledResult<usize> {
            let mut state = self.state.lock().unwrap();
            if state.fail_transfers {
                return Err(OledError::Transport("nack".to_string()));
            }
            state.transfers.push(buffer.to_vec());
            Ok(buffer.len() - state.short_by)
        }
    }
}

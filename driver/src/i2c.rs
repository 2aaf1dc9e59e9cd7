//! [Transport] over a two-wire bus through `embedded-hal`.

use embedded_hal::i2c::I2c;
use log::trace;

use crate::{OledError, OledResult, Transport};

/// Bus address most SSD1306 modules strap to.
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Control byte announcing a write to the command register.
const CONTROL_COMMAND: u8 = 0x00;

/// Transport over any `embedded-hal` I²C bus.
///
/// Commands are framed with a control byte selecting the command
/// register. Data buffers go out verbatim: the framebuffer's header byte
/// is what frames them as display data on the wire.
#[derive(Debug)]
pub struct I2cTransport<I> {
    bus: I,
    address: u8,
}

impl<I> I2cTransport<I> {
    pub fn new(bus: I, address: u8) -> Self {
        I2cTransport { bus, address }
    }

    /// Uses the usual module address, [DEFAULT_ADDRESS].
    pub fn with_default_address(bus: I) -> Self {
        I2cTransport::new(bus, DEFAULT_ADDRESS)
    }
}

impl<I: I2c> Transport for I2cTransport<I> {
    fn send_command(&mut self, byte: u8) -> OledResult<()> {
        trace!("Send command 0x{byte:02X}");
        self.bus
            .write(self.address, &[CONTROL_COMMAND, byte])
            .map_err(|err| OledError::Transport(format!("{err:?}")))
    }

    fn send_bytes(&mut self, buffer: &[u8]) -> OledResult<usize> {
        trace!("Send {} bytes of display data", buffer.len());
        self.bus
            .write(self.address, buffer)
            .map_err(|err| OledError::Transport(format!("{err:?}")))?;
        Ok(buffer.len())
    }
}

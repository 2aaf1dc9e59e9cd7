use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::font::GlyphSource;
use crate::{OledError, OledResult, TextDisplay, Transport};

use super::device::Ssd1306;

/// Shared handle to one attached display.
///
/// Clones refer to the same controller. All hardware access goes through
/// an internal lock, so a text update is never interleaved with another
/// caller's.
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    controller: Arc<Mutex<Ssd1306>>,
}

impl DisplayHandle {
    fn lock(&self) -> MutexGuard<'_, Ssd1306> {
        // A poisoned lock still guards a consistent controller: every
        // write repaints the frame from scratch.
        self.controller
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }

    /// Runs `f` with exclusive access to the controller.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut Ssd1306) -> R) -> R {
        f(&mut self.lock())
    }
}

impl TextDisplay for DisplayHandle {
    fn open(&self) -> OledResult<()> {
        self.lock().probe()
    }

    fn write_text(&self, text: &[u8]) -> OledResult<usize> {
        self.lock().write_text(text)
    }
}

/// Owner of every attached display.
///
/// The registry is passed explicitly to the attach and detach entry
/// points; there is no process-wide device list.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<DisplayHandle>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        DeviceRegistry::default()
    }

    /// Attaches a display: builds the controller and brings the
    /// hardware up. When any part of that fails nothing stays
    /// registered.
    pub fn attach(
        &mut self,
        transport: Box<dyn Transport + Send>,
        width: usize,
        height: usize,
        glyphs: Box<dyn GlyphSource + Send>,
    ) -> OledResult<DisplayHandle> {
        let mut controller = Ssd1306::new(transport, width, height, glyphs)?;
        controller.init_hw()?;

        let handle = DisplayHandle {
            controller: Arc::new(Mutex::new(controller)),
        };
        self.devices.push(handle.clone());
        info!("Display attached ({width}x{height})");

        Ok(handle)
    }

    /// Detaches a display: powers the panel off and unregisters it. The
    /// buffers are released once the last outstanding handle drops.
    ///
    /// # Errors
    /// - `OledError::InvalidArgument` when the handle does not belong to
    ///   this registry.
    pub fn detach(&mut self, handle: &DisplayHandle) -> OledResult<()> {
        let index = self
            .devices
            .iter()
            .position(|other| Arc::ptr_eq(&other.controller, &handle.controller))
            .ok_or(OledError::InvalidArgument)?;
        self.devices.swap_remove(index);

        if let Err(err) = handle.lock().power_off() {
            warn!("Display detached without reaching standby: {err}");
        }
        info!("Display detached");

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Font8x8;
    use crate::test_support::MockTransport;

    #[test]
    fn attach_initializes_and_registers_the_display() {
        let mut registry = DeviceRegistry::new();
        let (transport, state) = MockTransport::new();

        let handle = registry
            .attach(Box::new(transport), 128, 64, Box::new(Font8x8))
            .unwrap();

        assert_eq!(registry.len(), 1);
        // The bring-up ran: last command is display-on.
        assert_eq!(*state.lock().unwrap().commands.last().unwrap(), 0xAF);

        handle.open().unwrap();
    }

    #[test]
    fn failed_attach_registers_nothing() {
        let mut registry = DeviceRegistry::new();
        let (transport, state) = MockTransport::new();
        state.lock().unwrap().fail_on_command = Some(0xE3);

        let result = registry.attach(Box::new(transport), 128, 64, Box::new(Font8x8));
        assert_eq!(result.unwrap_err(), OledError::DeviceUnreachable);
        assert!(registry.is_empty());
    }

    #[test]
    fn detach_powers_the_panel_off() {
        let mut registry = DeviceRegistry::new();
        let (transport, state) = MockTransport::new();
        let handle = registry
            .attach(Box::new(transport), 128, 64, Box::new(Font8x8))
            .unwrap();

        registry.detach(&handle).unwrap();
        assert!(registry.is_empty());

        let commands = state.lock().unwrap().commands.clone();
        // Display off, then charge pump disabled.
        assert_eq!(commands[commands.len() - 3..], [0xAE, 0x8D, 0x10]);
    }

    #[test]
    fn detaching_a_foreign_handle_is_rejected() {
        let mut registry = DeviceRegistry::new();
        let mut other = DeviceRegistry::new();

        let (transport, _state) = MockTransport::new();
        let handle = other
            .attach(Box::new(transport), 128, 64, Box::new(Font8x8))
            .unwrap();

        assert_eq!(registry.detach(&handle), Err(OledError::InvalidArgument));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn write_text_goes_through_the_shared_handle() {
        let mut registry = DeviceRegistry::new();
        let (transport, state) = MockTransport::new();
        let handle = registry
            .attach(Box::new(transport), 128, 64, Box::new(Font8x8))
            .unwrap();

        assert_eq!(handle.write_text(b"Hello\nworld").unwrap(), 10);
        assert_eq!(state.lock().unwrap().transfers.len(), 1);

        let cols = handle.with_controller(|device| device.grid().max_cols());
        assert_eq!(cols, 14);
    }
}

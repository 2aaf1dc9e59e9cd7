use std::fmt;

use log::{debug, info, warn};

use crate::font::GlyphSource;
use crate::{OledError, OledResult, Transport};

use super::cmd::{AddressMode, Command, INIT_SEQUENCE};
use super::cmode::CharacterGrid;
use super::framebuffer::Framebuffer;
use super::text;

/// Driver state for one attached panel.
///
/// The controller exclusively owns the bus transport, the pixel
/// framebuffer and the character grid of its device. It is usually
/// created through [super::DeviceRegistry::attach], which also runs the
/// hardware bring-up before handing the device out.
pub struct Ssd1306 {
    transport: Box<dyn Transport + Send>,
    glyphs: Box<dyn GlyphSource + Send>,
    framebuffer: Framebuffer,
    grid: CharacterGrid,
}

impl Ssd1306 {
    /// Builds the controller state without touching the hardware.
    ///
    /// # Errors
    /// - `OledError::InvalidArgument` when the resolution or the glyph
    ///   geometry is unusable (zero, wider than a row byte, or larger
    ///   than the display).
    /// - `OledError::AllocationFailure` when a buffer cannot be
    ///   reserved; no partially-built state is kept.
    pub fn new(
        transport: Box<dyn Transport + Send>,
        width: usize,
        height: usize,
        glyphs: Box<dyn GlyphSource + Send>,
    ) -> OledResult<Self> {
        // Glyph rows are single bytes, so anything wider than 8 cannot
        // be rasterized.
        if glyphs.glyph_width() > 8 {
            return Err(OledError::InvalidArgument);
        }

        let framebuffer = Framebuffer::new(width, height)?;
        let grid = CharacterGrid::new(
            glyphs.glyph_width(),
            glyphs.glyph_height(),
            width,
            height,
        )?;

        Ok(Ssd1306 {
            transport,
            glyphs,
            framebuffer,
            grid,
        })
    }

    pub fn width(&self) -> usize {
        self.framebuffer.width()
    }

    pub fn height(&self) -> usize {
        self.framebuffer.height()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn grid(&self) -> &CharacterGrid {
        &self.grid
    }

    fn send(&mut self, command: Command) -> OledResult<()> {
        for &byte in command.encode().as_slice() {
            self.transport.send_command(byte)?;
        }
        Ok(())
    }

    /// Checks the controller answers on the bus.
    pub fn probe(&mut self) -> OledResult<()> {
        if let Err(err) = self.send(Command::Nop) {
            debug!("Cannot connect to the display: {err}");
            return Err(OledError::DeviceUnreachable);
        }
        Ok(())
    }

    /// Runs the power-on sequence.
    ///
    /// Probes the controller first, then walks [INIT_SEQUENCE] in order,
    /// aborting at the first stage that fails. A stage with several
    /// bytes fails as a whole if any byte does.
    ///
    /// # Errors
    /// - `OledError::DeviceUnreachable` when the probe gets no answer;
    ///   nothing else is attempted.
    /// - `OledError::InitStep` naming the failed stage otherwise.
    pub fn init_hw(&mut self) -> OledResult<()> {
        self.probe()?;

        for step in INIT_SEQUENCE {
            debug!("Init step: {}", step.name);
            for &command in step.commands {
                self.send(command).map_err(|err| OledError::InitStep {
                    step: step.name,
                    source: Box::new(err),
                })?;
            }
        }

        info!("Display initialization done");
        Ok(())
    }

    /// Transfers the framebuffer to the panel.
    ///
    /// Programs the addressing window to cover the whole display,
    /// restores the header byte if something overwrote it, then sends
    /// the buffer in one transfer. Returns the number of bytes the bus
    /// accepted; a short transfer is logged rather than treated as an
    /// error, since the content stays buffered for the next flush.
    pub fn flush(&mut self) -> OledResult<usize> {
        self.send(Command::SetMemoryAddressMode(AddressMode::Horizontal))?;
        self.send(Command::SetColumnRange(
            0,
            (self.framebuffer.width() - 1) as u8,
        ))?;
        self.send(Command::SetPageRange(
            0,
            (self.framebuffer.pages() - 1) as u8,
        ))?;

        if !self.framebuffer.restore_header() {
            warn!("Display buffer header was contaminated");
        }

        let requested = self.framebuffer.bytes().len();
        let sent = self.transport.send_bytes(self.framebuffer.bytes())?;
        if sent != requested {
            warn!("Display refreshed incompletely: {sent} of {requested} bytes");
        }

        Ok(sent)
    }

    /// Switches the panel between standby and on.
    pub fn enable_display(&mut self, enable: bool) -> OledResult<()> {
        self.send(if enable {
            Command::DisplayOn
        } else {
            Command::DisplayOff
        })
    }

    /// Toggles the internal charge pump. The panel cannot reach a usable
    /// brightness without it.
    pub fn enable_charge_pump(&mut self, enable: bool) -> OledResult<()> {
        self.send(Command::ChargePump(enable))
    }

    /// Sets the panel contrast, 0 (dim) to 255.
    pub fn set_contrast(&mut self, level: u8) -> OledResult<()> {
        self.send(Command::SetContrast(level))
    }

    /// Swaps lit and unlit pixels on the panel without touching the
    /// buffer.
    pub fn set_invert(&mut self, invert: bool) -> OledResult<()> {
        self.send(if invert {
            Command::InvertDisplay
        } else {
            Command::NormalDisplay
        })
    }

    /// Lights one pixel in the back buffer.
    pub fn draw_pixel(&mut self, x: usize, y: usize) -> OledResult<()> {
        self.framebuffer.draw_pixel(x, y)
    }

    /// Clears the back buffer and the text grid. The panel keeps its old
    /// content until the next flush.
    pub fn clear(&mut self) {
        self.framebuffer.reset();
        self.grid.clear();
    }

    /// Draws a single character into the back buffer; see
    /// [text::draw_char] for the clipping rules.
    pub fn print_char(&mut self, x: usize, y: usize, c: u8) -> OledResult<()> {
        text::draw_char(&mut self.framebuffer, self.glyphs.as_ref(), x, y, c)
    }

    /// Renders a string into the back buffer; the whole string has to
    /// fit between `x` and the display edge.
    pub fn print_str(&mut self, x: usize, y: usize, s: &[u8]) -> OledResult<()> {
        text::draw_str(&mut self.framebuffer, self.glyphs.as_ref(), x, y, s)
    }

    /// Cuts `input` into grid lines and repaints the whole panel.
    ///
    /// Returns the number of characters that fit on the display. The
    /// framebuffer keeps its rendered content even when the final
    /// transfer fails, so the next successful flush shows the latest
    /// text.
    pub fn write_text(&mut self, input: &[u8]) -> OledResult<usize> {
        let written = self.grid.segment(input);

        self.framebuffer.reset();
        let glyph_h = self.glyphs.glyph_height();
        for (index, line) in self.grid.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            text::draw_str(
                &mut self.framebuffer,
                self.glyphs.as_ref(),
                0,
                index * glyph_h,
                line,
            )?;
        }

        self.flush()?;
        Ok(written)
    }

    /// Puts the panel into standby: display off, charge pump disabled.
    pub fn power_off(&mut self) -> OledResult<()> {
        self.enable_display(false)?;
        self.enable_charge_pump(false)
    }
}

impl fmt::Debug for Ssd1306 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ssd1306")
            .field("width", &self.framebuffer.width())
            .field("height", &self.framebuffer.height())
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

//! SSD1306 command set.
//!
//! Every controller command is a [Command] variant carrying its required
//! argument bytes, so a bring-up or refresh sequence can be written as an
//! ordered list of typed steps instead of raw byte pairs with implicit
//! ordering rules.

/// Value of the set-display-start-line command. It doubles as the header
/// byte the wire protocol expects in front of every framebuffer
/// transfer.
pub const DISPLAY_START_LINE: u8 = 0x40;

/// Memory addressing modes accepted by [Command::SetMemoryAddressMode].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddressMode {
    /// The column pointer advances first and wraps to the next page.
    Horizontal,
    /// The page pointer advances first and wraps to the next column.
    Vertical,
    /// Single-page addressing via the page-start/column-start commands.
    Page,
}

impl AddressMode {
    fn to_byte(self) -> u8 {
        match self {
            AddressMode::Horizontal => 0b00,
            AddressMode::Vertical => 0b01,
            AddressMode::Page => 0b10,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    /// Contrast in 256 steps, reset value 0x7F.
    SetContrast(u8),
    /// RAM content drives the panel output.
    ResumeToRam,
    /// Every pixel lit regardless of RAM, as a lamp test.
    AllPixelsOn,
    /// A lit RAM bit means a lit pixel.
    NormalDisplay,
    /// A lit RAM bit means a dark pixel.
    InvertDisplay,
    DisplayOn,
    DisplayOff,
    /// Lower nibble of the column start address (page addressing mode).
    SetLowerColumnStart(u8),
    /// Higher nibble of the column start address (page addressing mode).
    SetHigherColumnStart(u8),
    SetMemoryAddressMode(AddressMode),
    /// Column window as an inclusive start/end pair.
    SetColumnRange(u8, u8),
    /// Page window as an inclusive start/end pair.
    SetPageRange(u8, u8),
    /// Page start address 0..=7 (page addressing mode).
    SetPageStart(u8),
    /// Display starts at RAM line 0; see [DISPLAY_START_LINE].
    SetStartLine,
    /// Maps segment 0 to the last column, mirroring horizontally.
    SegmentRemap,
    /// Panel row count minus one.
    SetMultiplexRatio(u8),
    /// COM output scanned from COM0 upwards.
    ComScanIncrement,
    /// COM output scanned towards COM0, mirroring vertically.
    ComScanDecrement,
    /// Vertical shift of the output, in COM lines.
    SetDisplayOffset(u8),
    /// COM pins hardware configuration byte.
    SetComPins(u8),
    /// Internal charge pump on or off.
    ChargePump(bool),
    /// Oscillator frequency and display clock divide ratio.
    SetClockDivider(u8),
    /// Pre-charge period in clock cycles per phase.
    SetPrechargePeriod(u8),
    /// VCOMH deselect level.
    SetVcomhDeselectLevel(u8),
    /// No operation; answers on the bus like any other command.
    Nop,
}

/// Encoded form of one command: an opcode and up to two argument bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CommandBytes {
    bytes: [u8; 3],
    len: usize,
}

impl CommandBytes {
    fn one(opcode: u8) -> Self {
        CommandBytes {
            bytes: [opcode, 0, 0],
            len: 1,
        }
    }

    fn two(opcode: u8, arg: u8) -> Self {
        CommandBytes {
            bytes: [opcode, arg, 0],
            len: 2,
        }
    }

    fn three(opcode: u8, first: u8, second: u8) -> Self {
        CommandBytes {
            bytes: [opcode, first, second],
            len: 3,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Command {
    /// Opcode and argument bytes in wire order.
    pub fn encode(self) -> CommandBytes {
        match self {
            Command::SetContrast(level) => CommandBytes::two(0x81, level),
            Command::ResumeToRam => CommandBytes::one(0xA4),
            Command::AllPixelsOn => CommandBytes::one(0xA5),
            Command::NormalDisplay => CommandBytes::one(0xA6),
            Command::InvertDisplay => CommandBytes::one(0xA7),
            Command::DisplayOn => CommandBytes::one(0xAF),
            Command::DisplayOff => CommandBytes::one(0xAE),
            Command::SetLowerColumnStart(nibble) => CommandBytes::one(nibble & 0x0F),
            Command::SetHigherColumnStart(nibble) => CommandBytes::one(0x10 | (nibble & 0x0F)),
            Command::SetMemoryAddressMode(mode) => CommandBytes::two(0x20, mode.to_byte()),
            Command::SetColumnRange(start, end) => CommandBytes::three(0x21, start, end),
            Command::SetPageRange(start, end) => CommandBytes::three(0x22, start, end),
            Command::SetPageStart(page) => CommandBytes::one(0xB0 | (page & 0x07)),
            Command::SetStartLine => CommandBytes::one(DISPLAY_START_LINE),
            Command::SegmentRemap => CommandBytes::one(0xA0),
            Command::SetMultiplexRatio(ratio) => CommandBytes::two(0xA8, ratio),
            Command::ComScanIncrement => CommandBytes::one(0xC0),
            Command::ComScanDecrement => CommandBytes::one(0xC8),
            Command::SetDisplayOffset(offset) => CommandBytes::two(0xD3, offset),
            Command::SetComPins(config) => CommandBytes::two(0xDA, config),
            Command::ChargePump(enable) => {
                CommandBytes::two(0x8D, if enable { 0x14 } else { 0x10 })
            }
            Command::SetClockDivider(value) => CommandBytes::two(0xD5, value),
            Command::SetPrechargePeriod(value) => CommandBytes::two(0xD9, value),
            Command::SetVcomhDeselectLevel(level) => CommandBytes::two(0xDB, level),
            Command::Nop => CommandBytes::one(0xE3),
        }
    }
}

/// One named stage of the power-on bring-up.
#[derive(Debug, Copy, Clone)]
pub struct InitStep {
    pub name: &'static str,
    pub commands: &'static [Command],
}

/// Configuration stages run after the reachability probe, in the order
/// the panel requires. Orientation (segment remap, scan direction) must
/// be set before the COM pins configuration, and the charge pump must be
/// running before the display is switched on or the panel never reaches
/// a usable brightness.
pub const INIT_SEQUENCE: &[InitStep] = &[
    InitStep {
        name: "display off",
        commands: &[Command::DisplayOff],
    },
    InitStep {
        name: "multiplex ratio",
        commands: &[Command::SetMultiplexRatio(0x3F)],
    },
    InitStep {
        name: "display offset",
        commands: &[Command::SetDisplayOffset(0)],
    },
    InitStep {
        name: "display start line",
        commands: &[Command::SetStartLine],
    },
    InitStep {
        name: "segment re-map",
        commands: &[Command::SegmentRemap],
    },
    InitStep {
        name: "scan direction",
        commands: &[Command::ComScanIncrement],
    },
    InitStep {
        name: "COM pins configuration",
        commands: &[Command::SetComPins(0x02)],
    },
    InitStep {
        name: "contrast control",
        commands: &[Command::SetContrast(0xFF)],
    },
    InitStep {
        name: "resume to RAM content",
        commands: &[Command::ResumeToRam],
    },
    InitStep {
        name: "display clock divider",
        commands: &[Command::SetClockDivider(0x80)],
    },
    InitStep {
        name: "charge pump",
        commands: &[Command::ChargePump(true)],
    },
    InitStep {
        name: "display on",
        commands: &[Command::DisplayOn],
    },
];

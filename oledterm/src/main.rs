mod config;

use std::collections::VecDeque;
use std::env::var;
use std::io::BufRead;

use dotenv::dotenv;
use linux_embedded_hal::I2cdev;
use log::{debug, info};
use oledterm_driver::TextDisplay;
use oledterm_driver::font::Font8x8;
use oledterm_driver::i2c::{DEFAULT_ADDRESS, I2cTransport};
use oledterm_driver::ssd1306::DeviceRegistry;

use crate::config::Config;

const DISPLAY_WIDTH: usize = 128;
const DISPLAY_HEIGHT: usize = 64;

fn parse_address(text: &str) -> eyre::Result<u8> {
    let text = text.trim();
    let address = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16)?,
        None => text.parse()?,
    };
    Ok(address)
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("oledterm starting...");

    let bus_path = var("OLEDTERM_I2C_BUS")?;
    let address = match var("OLEDTERM_I2C_ADDRESS") {
        Ok(text) => parse_address(&text)?,
        Err(_) => DEFAULT_ADDRESS,
    };

    info!("Display @ {} (address 0x{:02X})", bus_path, address);

    debug!("Opening the I2C bus...");
    let bus = I2cdev::new(&bus_path)?;
    let transport = I2cTransport::new(bus, address);

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    debug!("Attaching the display...");
    let mut registry = DeviceRegistry::new();
    let display = registry.attach(
        Box::new(transport),
        DISPLAY_WIDTH,
        DISPLAY_HEIGHT,
        Box::new(Font8x8),
    )?;

    display.with_controller(|device| {
        device.set_contrast(config.contrast)?;
        device.set_invert(config.invert)
    })?;

    let max_lines = display.with_controller(|device| device.grid().max_lines());
    debug!("{:?} attached.", display);

    const GREETING: &str = concat!("oledterm\nv.", env!("CARGO_PKG_VERSION"));
    display.write_text(GREETING.as_bytes())?;

    info!("oledterm initialized.");

    let arg_text: Vec<String> = std::env::args().skip(1).collect();
    if !arg_text.is_empty() {
        let written = display.write_text(arg_text.join(" ").as_bytes())?;
        info!("{} characters shown.", written);
        // Leave the panel on so the text stays visible.
        return Ok(());
    }

    info!("Reading lines from stdin...");

    let mut scrollback: VecDeque<String> = VecDeque::with_capacity(max_lines);
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if scrollback.len() == max_lines {
            scrollback.pop_front();
        }
        scrollback.push_back(line);

        let text = scrollback
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let written = display.write_text(text.as_bytes())?;
        debug!("{} of {} characters shown.", written, text.len());
    }

    registry.detach(&display)?;
    info!("oledterm done.");

    Ok(())
}

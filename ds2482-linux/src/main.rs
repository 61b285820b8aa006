use clap::Parser;
use ds2482::{DeviceConfiguration, Ds2482Builder};
use embedded_onewire::{OneWireSearch, OneWireSearchKind, ScanEntry};

/// List the ROM codes of the devices behind a DS2482 bridge
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// State of the AD0/AD1 address pins
    #[arg(short, long, default_value_t = 0)]
    board_select: u8,
    /// Maximum number of busy polls per 1-Wire transaction
    #[arg(short, long, default_value_t = ds2482::DEFAULT_RETRIES)]
    retries: u16,
    /// Enable the active pullup
    #[arg(long)]
    active_pullup: bool,
    /// Only list devices in alarm state
    #[arg(long)]
    alarmed: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let i2c = linux_embedded_hal::I2cdev::new(&args.path)?;
    let mut bridge = Ds2482Builder::default()
        .with_board_select(args.board_select)
        .with_retries(args.retries)
        .with_config(DeviceConfiguration::new().with_active_pullup(args.active_pullup))
        .build(i2c, linux_embedded_hal::Delay)?;
    log::info!("DS2482 ready at {:#04x}", bridge.i2c_address());
    let kind = if args.alarmed {
        OneWireSearchKind::Alarmed
    } else {
        OneWireSearchKind::Normal
    };
    let found = OneWireSearch::new(&mut bridge, kind).scan::<64>()?;
    log::info!("Found {} devices", found.len());
    for entry in &found {
        match entry {
            ScanEntry::Valid(rom) => println!("{rom}"),
            ScanEntry::ChecksumMismatch(rom) => println!("{rom} (bad CRC)"),
        }
    }
    if let Some(warning) = bridge.take_warning() {
        log::warn!("last bridge warning: {warning}");
    }
    Ok(())
}

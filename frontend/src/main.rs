use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use s100_system::{System, SystemConfig};

#[derive(Parser)]
#[command(
    name = "s100",
    about = "Intel 8080 emulator on an S-100 style card bus",
    arg_required_else_help = false
)]
struct Args {
    /// Hardware description file; without it the machine is a single
    /// 64KB RAM card.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable the pseudo-BDOS shim regardless of the configuration.
    #[arg(long)]
    pseudo_bdos: bool,

    /// Redirect pseudo-BDOS print output to a file.
    #[arg(long, value_name = "FILE")]
    bdos_output: Option<PathBuf>,

    /// Program images as `<rom-file> <load-address>` pairs. The address
    /// takes C-style base prefixes (0x.., 0.., decimal); the first pair
    /// also installs the reset vector.
    #[arg(value_name = "ROM/ADDR")]
    images: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("s100: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.images.len() % 2 != 0 {
        bail!("program images must come as <rom-file> <load-address> pairs");
    }

    let mut system = match &args.config {
        Some(path) => {
            let config = SystemConfig::from_path(path)
                .with_context(|| format!("loading hardware description {}", path.display()))?;
            System::from_config(config)
        }
        None => System::with_default_hardware()?,
    };

    if args.pseudo_bdos {
        system.cpu_mut().set_pseudo_bdos(true);
    }
    if let Some(path) = &args.bdos_output {
        system
            .cpu_mut()
            .redirect_bdos_print_to_file(path)
            .with_context(|| format!("opening print sink {}", path.display()))?;
    }

    for (index, pair) in args.images.chunks(2).enumerate() {
        let path = PathBuf::from(&pair[0]);
        let offset = parse_address(&pair[1])
            .with_context(|| format!("bad load address '{}'", pair[1]))?;

        let image = std::fs::read(&path)
            .with_context(|| format!("reading program image {}", path.display()))?;
        if image.is_empty() {
            bail!("program image {} is empty", path.display());
        }

        system.load_image(&image, offset, index == 0)?;
        info!(
            "loaded {} ({} bytes) at {offset:#06x}",
            path.display(),
            image.len()
        );
    }

    info!("bus map:\n{}", system.bus().slot_map());

    system.run_to_halt()?;
    Ok(())
}

/// Parse an address with C-style base prefixes: `0x` hex, a leading
/// zero octal, plain decimal otherwise.
fn parse_address(text: &str) -> Result<usize> {
    let text = text.trim();
    let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16)?
    } else if text.len() > 1 && text.starts_with('0') {
        usize::from_str_radix(&text[1..], 8)?
    } else {
        text.parse()?
    };
    Ok(value)
}

//! ASUS Aura CLI tool
//!
//! Drives motherboard, GPU, keyboard and mouse lighting through the vendor's Aura SDK.

use std::error::Error;
use std::fmt::Debug;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::builder::EnumValueParser;
use clap::{
    crate_description, crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches,
    Command, ValueEnum,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use aurasdk::{AuraSdk, ColorBuffer, Controller, DiscoveryConfig, Family, Mode, Rgb, SdkConfig};

/// Colors used to tell the available controllers apart.
const TESTCOLORS: [Rgb; 6] = [
    Rgb { r: 0xff, g: 0x00, b: 0x00 },
    Rgb { r: 0x00, g: 0xff, b: 0x00 },
    Rgb { r: 0x00, g: 0x00, b: 0xff },
    Rgb { r: 0xff, g: 0x00, b: 0xff },
    Rgb { r: 0xff, g: 0xff, b: 0x00 },
    Rgb { r: 0xff, g: 0xff, b: 0xff },
];

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let matches = command().get_matches();

    // Abort unless the user agrees to overwrite their lighting.
    if matches.subcommand_matches("zonetest").is_some() && !confirm_zonetest() {
        println!("Bailing out.");
        return;
    }

    let mut sdk = AuraSdk::with_config(sdk_config(&matches));
    if let Err(err) = sdk.load() {
        eprintln!("\x1b[31mError:\x1b[0m {err}");
        process::exit(1);
    }

    let result = match matches.subcommand() {
        Some(("mode", matches)) => set_mode(&sdk, matches),
        Some(("color", matches)) => set_color(&sdk, matches),
        Some(("zonetest", _)) => zonetest(&sdk),
        _ => list(&sdk),
    };

    sdk.unload();

    if let Err(err) = result {
        eprintln!("\x1b[31mError:\x1b[0m {err}");
        process::exit(1);
    }
}

/// Build the SDK configuration from global CLI options.
fn sdk_config(matches: &ArgMatches) -> SdkConfig {
    let mut config = SdkConfig::default();

    if let Some(path) = matches.get_one::<PathBuf>("library") {
        config = config.with_library_path(path);
    }

    let mut discovery = DiscoveryConfig::default();
    for family in matches.get_many::<Family>("disable").into_iter().flatten() {
        discovery.set_enabled(*family, false);
    }

    config.with_discovery(discovery)
}

/// Print all discovered controllers.
fn list(sdk: &AuraSdk) -> Result<(), Box<dyn Error>> {
    let controllers = sdk.controllers();
    if controllers.is_empty() {
        println!("No Aura controllers found.");
        return Ok(());
    }

    println!("Available Aura controllers:\n");

    for controller in controllers {
        match sdk.led_count(controller) {
            Ok(count) => println!("  {controller}: {count} LEDs"),
            Err(err) => println!("  {controller}: \x1b[31m{err}\x1b[0m"),
        }
    }

    Ok(())
}

/// Change the lighting mode of one controller.
fn set_mode(sdk: &AuraSdk, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let controller = required_controller(matches);
    let mode = *matches.get_one::<Mode>("mode").ok_or("missing lighting mode")?;

    sdk.set_mode(controller, mode)?;

    println!("\x1b[32mSuccessfully set {controller} to mode {mode}.\x1b[0m");

    Ok(())
}

/// Fill all LEDs of one controller with a static color.
fn set_color(sdk: &AuraSdk, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let controller = required_controller(matches);
    let color = required_color(matches);

    apply_color(sdk, controller, color)?;

    println!("\x1b[32mSuccessfully applied {color} to {controller}.\x1b[0m");

    Ok(())
}

/// Mark all controllers in a unique color.
fn zonetest(sdk: &AuraSdk) -> Result<(), Box<dyn Error>> {
    println!("\nTesting available Aura controllers...\n");

    for (i, controller) in sdk.controllers().into_iter().enumerate() {
        let color = TESTCOLORS[i % TESTCOLORS.len()];

        println!("Color for {controller}: {color}");

        if let Err(err) = apply_color(sdk, controller, color) {
            eprintln!("Skipping controller: {err}");
        }
    }

    Ok(())
}

/// Switch a controller to software mode and set all its LEDs to `color`.
fn apply_color(sdk: &AuraSdk, controller: Controller, color: Rgb) -> Result<(), Box<dyn Error>> {
    let led_count = sdk.led_count(controller)?;

    sdk.set_mode(controller, Mode::SOFTWARE)?;
    sdk.set_color(controller, &ColorBuffer::filled(led_count as usize, color))?;

    Ok(())
}

fn confirm_zonetest() -> bool {
    println!("Are you sure you want to test the available Aura controllers?");
    println!("\x1b[31mThis will override your current lighting\x1b[0m.");
    print!(" [y/N] > ");
    let _ = io::stdout().flush();

    stdin_nextline().to_lowercase() == "y"
}

/// Get clap CLI parameters.
fn command() -> Command {
    let device = Arg::new("device")
        .help("Controller family")
        .long("device")
        .short('d')
        .ignore_case(true)
        .value_parser(EnumValueParser::<Family>::new());
    let index = Arg::new("index")
        .help("Controller index for motherboards and GPUs")
        .long("index")
        .short('i')
        .default_value("0")
        .value_parser(value_parser!(usize));

    Command::new(crate_name!())
        .version(crate_version!())
        .author("Christian Duerr <contact@christianduerr.com>")
        .about(crate_description!())
        .arg(
            Arg::new("library")
                .help("Path of the Aura SDK library")
                .long("library")
                .short('l')
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("disable")
                .help("Skip discovery of a controller family")
                .long("disable")
                .global(true)
                .ignore_case(true)
                .action(ArgAction::Append)
                .value_parser(EnumValueParser::<Family>::new()),
        )
        .subcommand(Command::new("list").about("List available controllers"))
        .subcommand(
            Command::new("mode")
                .about("Set the lighting mode of a controller")
                .arg(device.clone())
                .arg(index.clone())
                .arg(
                    Arg::new("mode")
                        .help("Lighting mode [firmware, software or a raw SDK mode]")
                        .required(true)
                        .value_parser(Mode::from_str),
                ),
        )
        .subcommand(
            Command::new("color")
                .about("Set a static color for all LEDs of a controller")
                .arg(device)
                .arg(index)
                .arg(
                    Arg::new("color").help("LED color in RGB [0xRRGGBB]").long("color").short('c'),
                ),
        )
        .subcommand(Command::new("zonetest").about("Test available controllers"))
}

/// Read the addressed controller from CLI or prompt for STDIN if not present.
fn required_controller(matches: &ArgMatches) -> Controller {
    let family = *required_enum::<Family>(matches, "device");
    let index = matches.get_one::<usize>("index").copied().unwrap_or_default();
    Controller::new(family, index)
}

/// Read the color option from CLI or prompt for STDIN if not present.
fn required_color<T: FromStr>(matches: &ArgMatches) -> T {
    match matches.get_one::<String>("color").map(|value| T::from_str(value)) {
        Some(Ok(value)) => return value,
        Some(Err(_)) => eprintln!("\x1b[31mInvalid CLI color parameter.\x1b[0m\n"),
        _ => (),
    }

    loop {
        // Query the user for the option.
        print!("Please select a color (format: 0xRRGGBB):\n > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match T::from_str(&input) {
            Ok(value) => {
                println!();
                break value;
            },
            Err(_) => eprintln!(
                "\x1b[31mColor '{}' does not match format 0xRRGGBB, please try again.\x1b[0m\n",
                input
            ),
        }
    }
}

/// Read an enum option from CLI or prompt for STDIN if not present.
fn required_enum<'a, T>(matches: &'a ArgMatches, name: &str) -> &'a T
where
    T: ValueEnum + Debug + Copy + Sync + Send + 'static,
{
    if let Some(value) = matches.get_one::<T>(name) {
        return value;
    }

    loop {
        // Offer all available variants.
        println!("[{}] Please select a number:", name);
        let variants = T::value_variants();
        for (i, variant) in variants.iter().enumerate() {
            println!("  [{}] {:?}", i, variant);
        }
        print!(" > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match usize::from_str(&input).ok().and_then(|index| variants.get(index)) {
            Some(variant) => {
                println!();
                return variant;
            },
            // Query again if the variant is not valid.
            _ => println!("\x1b[31mVariant '{}' does not exist, please try again.\x1b[0m\n", input),
        }
    }
}

/// Read next line from STDIN.
#[inline]
fn stdin_nextline() -> String {
    let mut input = String::new();

    let _ = io::stdin().read_line(&mut input);
    input = input.trim().to_string();

    input
}

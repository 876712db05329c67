/* gpconfigctl CLI: clap-driven front-end for a controller's web-configuration API, reading and
 * updating display, gamepad, LED, add-on, pin-mapping and splash settings. */
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gpconfig::{
    AddonsOptions, Button, ButtonGroup, ClientConfig, DisplayOptions, DisplayTarget, FormValue,
    GamepadOptions, LedOptions, WebApiClient,
};

/// gpconfigctl — configure a gamepad controller through its web configurator.
#[derive(Parser)]
#[command(name = "gpconfigctl", version, about)]
struct Cli {
    /// Base URL of the controller (overrides --config).
    #[arg(long, env = "GPCONFIG_BASE_URL", global = true)]
    base_url: Option<String>,

    /// INI file with a [client] section.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log requests and device replies.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the firmware version.
    Firmware,

    /// Show flash and heap usage.
    Memory,

    /// Reboot the controller.
    Reboot,

    /// Restore factory settings.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },

    /// Display commands.
    #[command(subcommand)]
    Display(DisplayCmd),

    /// Gamepad behaviour options.
    #[command(subcommand)]
    Gamepad(OptionsCmd),

    /// LED commands.
    #[command(subcommand)]
    Led(LedCmd),

    /// Add-on options.
    #[command(subcommand)]
    Addons(OptionsCmd),

    /// Pin mapping commands.
    #[command(subcommand)]
    Pins(PinsCmd),

    /// Splash image commands.
    #[command(subcommand)]
    Splash(SplashCmd),

    /// Show the merged display button layouts.
    Layouts,
}

#[derive(Subcommand)]
enum DisplayCmd {
    /// Show display options.
    Get,
    /// Change one display option and save it.
    Set {
        /// Field: i2c-address, splash-duration (s), saver-timeout (min),
        /// button-layout, button-layout-right, splash-mode, splash-choice,
        /// or any raw camelCase key.
        field: String,
        /// New value.
        value: String,
    },
    /// Change one display option and show it without saving.
    Preview {
        /// Field name, as for `set`.
        field: String,
        /// New value.
        value: String,
    },
}

#[derive(Subcommand)]
enum OptionsCmd {
    /// Print the options as JSON.
    Get,
    /// Replace the options with the contents of a JSON file.
    Set {
        /// Path to a JSON object.
        json_file: PathBuf,
    },
}

#[derive(Subcommand)]
enum LedCmd {
    /// Print the LED options as JSON.
    Get,
    /// Replace the LED options with the contents of a JSON file.
    Set {
        /// Path to a JSON object.
        json_file: PathBuf,
    },
    /// Print the LED button layouts.
    Layouts,
}

#[derive(Subcommand)]
enum PinsCmd {
    /// List the pin assigned to every button.
    Get,
    /// Assign a GPIO pin to a button.
    Set {
        /// Button name (Up, Down, B1, L3, A2, ...).
        button: String,
        /// GPIO pin number.
        pin: u8,
    },
    /// Unassign a button.
    Clear {
        /// Button name.
        button: String,
    },
}

#[derive(Subcommand)]
enum SplashCmd {
    /// Print the stored splash image (base64).
    Get,
    /// Upload a raw splash bitmap.
    Set {
        /// Path to the bitmap file.
        image_file: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    let base_url = config.base_url.clone();
    debug!("Using controller at {}", base_url);
    let client = WebApiClient::new(config)
        .with_context(|| format!("Failed to set up a client for {}", base_url))?;

    match cli.command {
        Commands::Firmware => cmd_firmware(&client).await,
        Commands::Memory => cmd_memory(&client).await,
        Commands::Reboot => cmd_reboot(&client).await,
        Commands::Reset { yes } => cmd_reset(&client, yes).await,
        Commands::Display(sub) => match sub {
            DisplayCmd::Get => cmd_display_get(&client).await,
            DisplayCmd::Set { field, value } => {
                cmd_display_set(&client, &field, &value, DisplayTarget::Save).await
            }
            DisplayCmd::Preview { field, value } => {
                cmd_display_set(&client, &field, &value, DisplayTarget::Preview).await
            }
        },
        Commands::Gamepad(sub) => match sub {
            OptionsCmd::Get => {
                let options = client
                    .get_gamepad_options()
                    .await
                    .context("Cannot read gamepad options")?;
                print_json(&options)
            }
            OptionsCmd::Set { json_file } => {
                let options = GamepadOptions(read_json_object(&json_file)?);
                client
                    .set_gamepad_options(&options)
                    .await
                    .context("Controller did not accept the gamepad options")?;
                println!("Gamepad options saved.");
                Ok(())
            }
        },
        Commands::Led(sub) => match sub {
            LedCmd::Get => {
                let options = client
                    .get_led_options()
                    .await
                    .context("Cannot read LED options")?;
                print_json(&options)
            }
            LedCmd::Set { json_file } => {
                let options = LedOptions(read_json_object(&json_file)?);
                client
                    .set_led_options(&options)
                    .await
                    .context("Controller did not accept the LED options")?;
                println!("LED options saved.");
                Ok(())
            }
            LedCmd::Layouts => {
                let layouts = client
                    .get_led_button_layouts()
                    .await
                    .context("Cannot read LED button layouts")?;
                print_json(&layouts)
            }
        },
        Commands::Addons(sub) => match sub {
            OptionsCmd::Get => {
                let options = client
                    .get_addons_options()
                    .await
                    .context("Cannot read add-on options")?;
                print_json(&options)
            }
            OptionsCmd::Set { json_file } => {
                let options = AddonsOptions(read_json_object(&json_file)?);
                client
                    .set_addons_options(&options)
                    .await
                    .context("Controller did not accept the add-on options")?;
                println!("Add-on options saved.");
                Ok(())
            }
        },
        Commands::Pins(sub) => match sub {
            PinsCmd::Get => cmd_pins_get(&client).await,
            PinsCmd::Set { button, pin } => cmd_pins_set(&client, &button, Some(pin)).await,
            PinsCmd::Clear { button } => cmd_pins_set(&client, &button, None).await,
        },
        Commands::Splash(sub) => match sub {
            SplashCmd::Get => cmd_splash_get(&client).await,
            SplashCmd::Set { image_file } => cmd_splash_set(&client, &image_file).await,
        },
        Commands::Layouts => {
            let layouts = client
                .get_display_button_layouts()
                .await
                .context("Cannot read display button layouts")?;
            print_json(&layouts)
        }
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Precedence: --base-url / GPCONFIG_BASE_URL, then --config, then the
/// production address.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Cannot use configuration file {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_firmware(client: &WebApiClient) -> Result<()> {
    let fw = client
        .get_firmware_version()
        .await
        .context("Cannot read firmware version")?;
    println!("Firmware: {}", fw.version.as_deref().unwrap_or("unknown"));
    Ok(())
}

async fn cmd_memory(client: &WebApiClient) -> Result<()> {
    let report = client
        .get_memory_report()
        .await
        .context("Cannot read memory report")?;
    println!("Flash: {}", usage(report.used_flash, report.total_flash));
    println!("Heap:  {}", usage(report.used_heap, report.total_heap));
    if let Some(static_allocs) = report.static_allocs {
        println!("Static allocations: {} bytes", static_allocs);
    }
    Ok(())
}

async fn cmd_reboot(client: &WebApiClient) -> Result<()> {
    client.reboot().await.context("Reboot request failed")?;
    println!("Controller is rebooting.");
    Ok(())
}

async fn cmd_reset(client: &WebApiClient, yes: bool) -> Result<()> {
    anyhow::ensure!(yes, "Refusing to reset all settings without --yes");
    client
        .reset_settings()
        .await
        .context("Reset request failed")?;
    println!("Settings restored to defaults.");
    Ok(())
}

async fn cmd_display_get(client: &WebApiClient) -> Result<()> {
    let opts = client
        .get_display_options()
        .await
        .context("Cannot read display options")?;
    println!("I2C address:         {}", opts.i2c_address);
    println!("Button layout:       {}", opts.button_layout);
    println!("Button layout right: {}", opts.button_layout_right);
    println!("Splash mode:         {}", opts.splash_mode);
    println!("Splash choice:       {}", opts.splash_choice);
    println!("Splash duration:     {} s", opts.splash_duration);
    println!("Saver timeout:       {} min", opts.display_saver_timeout);
    for (key, value) in &opts.extra {
        println!("  {}: {}", key, value);
    }
    Ok(())
}

async fn cmd_display_set(
    client: &WebApiClient,
    field: &str,
    value: &str,
    target: DisplayTarget,
) -> Result<()> {
    let mut opts = client
        .get_display_options()
        .await
        .context("Cannot read current display options")?;
    apply_display_field(&mut opts, field, value)?;
    client
        .set_display_options(&opts, target)
        .await
        .context("Controller did not accept the display options")?;
    match target {
        DisplayTarget::Save => println!("Display {} set to {}.", field, value),
        DisplayTarget::Preview => println!("Previewing display {} = {}.", field, value),
    }
    Ok(())
}

async fn cmd_pins_get(client: &WebApiClient) -> Result<()> {
    let mappings = client
        .get_pin_mappings()
        .await
        .context("Cannot read pin mappings")?;
    let mut group = None;
    for (button, mapping) in mappings.iter() {
        if group != Some(button.group()) {
            group = Some(button.group());
            println!("{}:", group_name(button.group()));
        }
        let pin = if mapping.is_assigned() {
            format!("GPIO {}", mapping.pin)
        } else {
            "unassigned".to_string()
        };
        match &mapping.error {
            Some(err) => println!("  {:<6} {:<11} ({})", button, pin, err),
            None => println!("  {:<6} {}", button, pin),
        }
    }
    Ok(())
}

async fn cmd_pins_set(client: &WebApiClient, button: &str, pin: Option<u8>) -> Result<()> {
    let button: Button = button.parse().map_err(anyhow::Error::msg)?;
    let mut mappings = client
        .get_pin_mappings()
        .await
        .context("Cannot read current pin mappings")?;
    let pin = pin.map(i32::from).unwrap_or(gpconfig::UNASSIGNED_PIN);
    mappings.set_pin(button, pin);
    client
        .set_pin_mappings(&mappings)
        .await
        .context("Controller did not accept the pin mappings")?;
    if pin == gpconfig::UNASSIGNED_PIN {
        println!("Button {} unassigned.", button);
    } else {
        println!("Button {} mapped to GPIO {}.", button, pin);
    }
    Ok(())
}

async fn cmd_splash_get(client: &WebApiClient) -> Result<()> {
    let image = client
        .get_splash_image()
        .await
        .context("Cannot read splash image")?;
    println!("{}", image.splash_image);
    Ok(())
}

async fn cmd_splash_set(client: &WebApiClient, image_file: &Path) -> Result<()> {
    let bytes = std::fs::read(image_file)
        .with_context(|| format!("Cannot read file '{}'", image_file.display()))?;
    client
        .set_splash_image(&bytes)
        .await
        .context("Controller did not accept the splash image")?;
    println!("Splash image uploaded ({} bytes).", bytes.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn group_name(group: ButtonGroup) -> &'static str {
    match group {
        ButtonGroup::Directional => "Directional",
        ButtonGroup::Face => "Face",
        ButtonGroup::Shoulder => "Shoulder",
        ButtonGroup::System => "System",
        ButtonGroup::Stick => "Stick",
        ButtonGroup::Auxiliary => "Auxiliary",
    }
}

fn usage(used: Option<u64>, total: Option<u64>) -> String {
    match (used, total) {
        (Some(used), Some(total)) if total > 0 => format!(
            "{} / {} bytes ({:.1}%)",
            used,
            total,
            used as f64 * 100.0 / total as f64
        ),
        (Some(used), _) => format!("{} bytes used", used),
        _ => "unknown".to_string(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read file '{}'", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not valid JSON", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("'{}' must contain a JSON object", path.display()),
    }
}

/// Apply a `field=value` edit to display options.
///
/// Unknown field names are treated as raw camelCase keys; their value is
/// parsed as JSON when possible and kept as a string otherwise.
fn apply_display_field(opts: &mut DisplayOptions, field: &str, value: &str) -> Result<()> {
    let form = FormValue::from(value);
    match field.to_lowercase().as_str() {
        "i2c-address" | "i2caddress" => opts.i2c_address = form,
        "button-layout" | "buttonlayout" => opts.button_layout = form,
        "button-layout-right" | "buttonlayoutright" => opts.button_layout_right = form,
        "splash-mode" | "splashmode" => opts.splash_mode = form,
        "splash-choice" | "splashchoice" => opts.splash_choice = form,
        "splash-duration" | "splashduration" => opts.splash_duration = form,
        "saver-timeout" | "displaysavertimeout" => opts.display_saver_timeout = form,
        _ => {
            anyhow::ensure!(!field.is_empty(), "Field name must not be empty");
            let raw = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
            opts.extra.insert(field.to_string(), raw);
        }
    }
    Ok(())
}

// src/main.rs - castify CLI entrypoint
// `castify <LOADER> <ELF> <OUTPUT>` builds an image; `castify inspect <IMAGE>` reads one back.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use castify::ancast::{self, logging, CastError, Config, ImageReport, Overrides, Result};

#[derive(Parser)]
#[command(
    name = "castify",
    version,
    about = "castify - ancast boot image builder",
    long_about = "castify combines a stage-1 loader image and an ELF payload into an ancast container: \
                  the body is padded to 4 KiB, AES-128-CBC sealed unless --no-crypto is given, \
                  and its SHA-1 hash is stamped into the 512-byte header.",
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Loader image (16-byte big-endian descriptor + header + loader)
    #[arg(required = true)]
    loader: Option<PathBuf>,

    /// ELF payload replacing any ELF embedded in the loader image
    #[arg(required = true)]
    elf: Option<PathBuf>,

    /// Where to write the ancast image
    #[arg(required = true)]
    output: Option<PathBuf>,

    /// Leave the body unencrypted and set the plaintext flag
    #[arg(long)]
    no_crypto: bool,

    #[command(flatten)]
    keys: KeyArgs,

    /// Debug-level diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct KeyArgs {
    /// TOML config with [cipher] key/iv and no_crypto
    #[arg(long, global = true, env = "CASTIFY_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// AES-128 key as 32 hex digits
    #[arg(long, global = true, value_name = "HEX")]
    key: Option<String>,

    /// AES-128 IV as 32 hex digits
    #[arg(long, global = true, value_name = "HEX")]
    iv: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an existing image's header and body hash
    Inspect {
        image: PathBuf,

        /// Decrypt the body start to show its loader descriptor
        #[arg(long)]
        decrypt: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        println!("ERROR: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        config_path: cli.keys.config.clone(),
        key: cli.keys.key.clone(),
        iv: cli.keys.iv.clone(),
        no_crypto: cli.no_crypto,
    };
    let cfg = Config::resolve(&overrides)?;

    match cli.command {
        Some(Commands::Inspect { image, decrypt, json }) => {
            if decrypt && cfg.keys.is_placeholder() {
                warn!("no ancast key configured, decrypting with the all-zero placeholder key.");
            }
            let keys = decrypt.then_some(&cfg.keys);
            let report = ancast::inspect_file(&image, keys)?;
            print_report(&report, json)?;
            report.check_hash()
        }
        None => {
            let (Some(loader), Some(elf), Some(output)) = (cli.loader, cli.elf, cli.output) else {
                return Err(CastError::Config("LOADER, ELF and OUTPUT are all required".into()));
            };
            let written = ancast::build_files(&loader, &elf, &output, &cfg)?;
            info!("Wrote 0x{:X} bytes to {}.", written, output.display());
            Ok(())
        }
    }
}

fn print_report(r: &ImageReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(r).map_err(|e| CastError::Config(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("[ancast] signature type: 0x{:02X} (header 0x{:X} bytes)", r.sig_type, r.header_size);
    println!("[ancast] target: {} (device 0x{:02X}, type 0x{:02X})", r.target, r.device, r.body_type);
    println!("[ancast] flags: 0x{:04X}{}", r.flags, if r.plaintext { " (plaintext)" } else { "" });
    println!("[ancast] version: 0x{:X}", r.version);
    println!("[ancast] body size: 0x{:X} bytes", r.body_size);
    println!("[ancast] body hash:  {}", r.expected_hash);
    println!("[ancast] calculated: {} ({})", r.calculated_hash, if r.hash_ok { "OK" } else { "MISMATCH" });
    match &r.descriptor {
        Some(d) => println!(
            "[ancast] descriptor: header 0x{:X}, loader 0x{:X}, elf 0x{:X}, arg 0x{:X}",
            d.header_len, d.loader_len, d.elf_len, d.arg
        ),
        None => println!("[ancast] descriptor: unavailable (encrypted body, use --decrypt)"),
    }
    Ok(())
}

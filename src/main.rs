// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "tryon")]
#[command(about = "Virtual makeup try-on preview")]
#[command(version = tryon::constants::app_info::version())]
struct Cli {
    /// Config file (default: <config dir>/tryon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Product page parameters that lock one region
#[derive(clap::Args, Debug, Clone)]
pub struct ProductArgs {
    /// Catalog product id
    #[arg(long, requires_all = ["product_color", "category"])]
    pub product_id: Option<String>,

    /// Locked product color (#RRGGBB)
    #[arg(long)]
    pub product_color: Option<String>,

    /// Product category label (e.g. "Lipstick", "Blush")
    #[arg(long)]
    pub category: Option<String>,
}

/// Makeup parameter overrides
#[derive(clap::Args, Debug, Clone)]
pub struct MakeupArgs {
    /// Lips color (#RRGGBB)
    #[arg(long)]
    pub lips_color: Option<String>,

    /// Lips intensity (0-100)
    #[arg(long)]
    pub lips_intensity: Option<u8>,

    /// Cheeks color (#RRGGBB)
    #[arg(long)]
    pub cheeks_color: Option<String>,

    /// Cheeks intensity (0-100)
    #[arg(long)]
    pub cheeks_intensity: Option<u8>,

    /// Regions to apply: lips, cheeks or both
    #[arg(long)]
    pub makeup_type: Option<String>,

    #[command(flatten)]
    pub product: ProductArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Render makeup onto a face image
    Render {
        /// Face image to upload
        #[arg(short, long)]
        image: PathBuf,

        #[command(flatten)]
        makeup: MakeupArgs,

        /// Output file path (default: ~/Pictures/TryOn/TRYON_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Snapshot a file-backed camera and render it
    Camera {
        /// Image served by the virtual camera
        #[arg(short, long)]
        source: PathBuf,

        #[command(flatten)]
        makeup: MakeupArgs,

        /// Output file path (default: ~/Pictures/TryOn/TRYON_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a product to the cart in its locked color
    Cart {
        #[command(flatten)]
        product: ProductArgs,

        /// Bearer token of the signed-in user
        #[arg(long, env = "TRYON_TOKEN")]
        token: Option<String>,
    },

    /// Print the effective configuration
    Config {
        /// Print the config file location instead
        #[arg(long)]
        path: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=tryon=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            image,
            makeup,
            output,
        } => cli::render_image(&config, &image, &makeup, output),
        Commands::Camera {
            source,
            makeup,
            output,
        } => cli::render_camera(&config, &source, &makeup, output),
        Commands::Cart { product, token } => cli::add_to_cart(&config, &product, token),
        Commands::Config { path } => cli::print_config(&config, cli.config.as_deref(), path),
    }
}

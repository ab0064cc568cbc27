// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! Each command drives a real [`Session`] against the configured render
//! service, the same way the interactive screen would.

use crate::{MakeupArgs, ProductArgs};
use chrono::Local;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tryon::backends::camera::FileSourceBackend;
use tryon::backends::commerce::{HttpCartClient, StaticAuth};
use tryon::backends::render::HttpRenderService;
use tryon::cart::{CartHandoff, Severity};
use tryon::config::Config;
use tryon::session::{
    BoundProduct, InputMode, MakeupType, ProductBinding, Region, Rgb, Session, SessionStatus,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Default folder name for rendered previews
const DEFAULT_SAVE_FOLDER: &str = "TryOn";

pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(config)
}

pub fn print_config(config: &Config, explicit: Option<&Path>, path_only: bool) -> CliResult {
    if path_only {
        match explicit.map(Path::to_path_buf).or_else(Config::default_path) {
            Some(path) => println!("{}", path.display()),
            None => println!("No config directory available"),
        }
        return Ok(());
    }

    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Upload an image and render it with the given parameters
pub fn render_image(
    config: &Config,
    image: &Path,
    makeup: &MakeupArgs,
    output: Option<PathBuf>,
) -> CliResult {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut session = new_session(config, image);
        apply_makeup(&mut session, makeup)?;

        println!("Uploading {}...", image.display());
        session.load_file(image).await?;

        finish(&mut session, output).await
    })
}

/// Open the file-backed camera, snapshot it and render the snapshot
pub fn render_camera(
    config: &Config,
    source: &Path,
    makeup: &MakeupArgs,
    output: Option<PathBuf>,
) -> CliResult {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut session = new_session(config, source);
        apply_makeup(&mut session, makeup)?;

        println!("Opening camera...");
        session.set_input_mode(InputMode::Camera);
        session.settle().await;
        if !session.is_camera_open() {
            return Err(session
                .message()
                .unwrap_or("Camera did not open")
                .to_string()
                .into());
        }

        println!("Capturing...");
        session.capture_from_camera().await?;

        finish(&mut session, output).await
    })
}

/// Hand a product to the cart in its locked color
pub fn add_to_cart(config: &Config, product: &ProductArgs, token: Option<String>) -> CliResult {
    let bound = match binding(product) {
        Some(binding) => Some(BoundProduct::resolve(&binding, &config.category_rules)?),
        None => None,
    };

    let auth = Arc::new(match token {
        Some(token) => StaticAuth::signed_in(token),
        None => StaticAuth::anonymous(),
    });
    let client = Arc::new(HttpCartClient::new(&config.cart_service_url, auth.clone()));
    let handoff = CartHandoff::new(client, auth);

    let rt = tokio::runtime::Runtime::new()?;
    let notification = rt.block_on(handoff.add_bound_product_to_cart(bound.as_ref()));

    println!("{}", notification.message);
    match notification.severity {
        Severity::Success => Ok(()),
        _ => Err(notification.message.into()),
    }
}

fn new_session(config: &Config, camera_source: &Path) -> Session {
    Session::new(
        config,
        Arc::new(HttpRenderService::new(&config.render_service_url)),
        Arc::new(FileSourceBackend::new(camera_source)),
    )
}

fn binding(product: &ProductArgs) -> Option<ProductBinding> {
    Some(ProductBinding {
        product_id: product.product_id.clone()?,
        locked_color: product.product_color.clone()?,
        category: product.category.clone()?,
    })
}

/// Apply overrides before any image is loaded so only one render is issued
fn apply_makeup(session: &mut Session, makeup: &MakeupArgs) -> CliResult {
    if let Some(binding) = binding(&makeup.product) {
        session.bind_product(&binding)?;
    }

    if let Some(makeup_type) = makeup.makeup_type.as_deref() {
        session.set_makeup_type(makeup_type.parse::<MakeupType>()?);
    }

    let overrides = [
        (Region::Lips, &makeup.lips_color, makeup.lips_intensity),
        (Region::Cheeks, &makeup.cheeks_color, makeup.cheeks_intensity),
    ];
    for (region, color, intensity) in overrides {
        if let Some(color) = color {
            session.set_region_color(region, color.parse::<Rgb>()?);
        }
        if let Some(intensity) = intensity {
            session.set_region_intensity(region, intensity);
        }
    }

    Ok(())
}

async fn finish(session: &mut Session, output: Option<PathBuf>) -> CliResult {
    println!("Rendering...");
    session.settle().await;

    if session.status() == SessionStatus::Error {
        return Err(session
            .message()
            .unwrap_or("Render failed")
            .to_string()
            .into());
    }

    let result = session.latest_result().ok_or("No render result")?;
    let output_path = output.unwrap_or_else(default_output_path);
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    DynamicImage::ImageRgba8(result.pixels().clone())
        .to_rgb8()
        .save(&output_path)?;

    println!(
        "Preview saved: {} ({}x{})",
        output_path.display(),
        result.width(),
        result.height()
    );
    Ok(())
}

fn default_output_path() -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
        .join(format!("TRYON_{}.jpg", timestamp))
}

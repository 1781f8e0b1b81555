use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use dialsnap::capture::camera::StillCamera;
use dialsnap::capture::ocr::TesseractEngine;
use dialsnap::config::{DialMode, DialSnapConfig};
use dialsnap::dial::{Dialer, LogDialer, SystemDialer};
use dialsnap::domain::Rect;
use dialsnap::session::{Controller, UiState};
use dialsnap::{fl, localize, server};

#[derive(Parser)]
#[command(name = "dialsnap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the capture page assets
    Serve {
        /// Port to listen on (config: server_port)
        #[arg(long)]
        port: Option<u16>,
        /// Directory to serve (config: asset_dir)
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Capture, crop, recognize and dial a number from a photo on disk
    Scan {
        /// Photo to use as the camera frame
        image: PathBuf,
        /// Crop region as X,Y,WIDTH,HEIGHT in pixels (default: centered 80%)
        #[arg(long, value_parser = parse_crop)]
        crop: Option<Rect>,
        /// Print the dial URI instead of opening it
        #[arg(long)]
        dry_run: bool,
        /// Offer a dial link instead of dialing automatically
        #[arg(long)]
        link: bool,
    },
}

fn parse_crop(value: &str) -> Result<Rect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop {:?}: {}", value, e))?;
    match parts.as_slice() {
        [x, y, w, h] if *w > 0 && *h > 0 => Ok(Rect::from_xywh(*x as i32, *y as i32, *w, *h)),
        _ => Err(format!("crop must be X,Y,WIDTH,HEIGHT with a non-zero size, got {:?}", value)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    localize::localize();

    let cli = Cli::parse();
    let mut config = DialSnapConfig::load();

    match cli.command {
        Command::Serve { port, assets } => {
            let port = port.unwrap_or(config.server_port);
            let assets = assets.unwrap_or(config.asset_dir);
            println!(
                "{}",
                fl!(
                    "server-listening",
                    dir = assets.display().to_string(),
                    addr = format!("0.0.0.0:{}", port)
                )
            );
            server::serve(assets, port).await
        }
        Command::Scan {
            image,
            crop,
            dry_run,
            link,
        } => {
            if link {
                config.dial_mode = DialMode::Link;
            }
            let dialer: Box<dyn Dialer> = if dry_run {
                Box::new(LogDialer)
            } else {
                Box::new(SystemDialer::new(config.dial_opener.clone()))
            };
            scan(config, image, crop, dialer).await
        }
    }
}

async fn scan(
    config: DialSnapConfig,
    image: PathBuf,
    crop: Option<Rect>,
    dialer: Box<dyn Dialer>,
) -> Result<()> {
    let mut controller = Controller::new(config, StillCamera::new(image), TesseractEngine, dialer);

    controller.start_camera().await;
    if !controller.has_camera_session() {
        bail!("{}", controller.ui().status);
    }

    controller.capture_frame();
    let Some(session) = controller.crop_session_mut() else {
        bail!("{}", controller.ui().status);
    };
    if let Some(rect) = crop {
        if !session.set_selection(rect) {
            bail!("Crop region {:?} lies outside the captured image", rect);
        }
    }

    controller.process_cropped_image().await;
    print_outcome(controller.ui());
    Ok(())
}

fn print_outcome(ui: &UiState) {
    println!("{}", ui.status);
    if let Some(text) = &ui.extracted_text {
        println!("{}", fl!("result-raw-text", text = text.trim()));
    }
    if let Some(number) = &ui.extracted_number {
        println!("{}", number.text());
    }
    if let Some(href) = &ui.dial_href {
        println!("{} <{}>", fl!("result-dial-link", number = href.number()), href);
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tidemark::watermark::config::{
    parse_font_scale, WatermarkAnchor, WatermarkConfig, DEFAULT_COLOR, DEFAULT_FONT_SCALE,
    DEFAULT_OPACITY, DEFAULT_ROTATION, DEFAULT_TEXT,
};
use tidemark::watermark::{parse_hex_color, WatermarkError};

/// Tidemark - text watermarking for raster images
#[derive(Parser, Debug)]
#[command(name = "tidemark")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark a single image file
    Apply {
        /// Input image path
        input: PathBuf,

        /// Output image path (.jpg/.jpeg flattens alpha, anything else is PNG)
        output: PathBuf,

        /// Watermark text
        #[arg(long, default_value = DEFAULT_TEXT)]
        text: String,

        /// Anchor: center, top-left, top-right, bottom-left, bottom-right
        #[arg(long, default_value = "center")]
        position: WatermarkAnchor,

        /// Opacity, 0-255
        #[arg(long, default_value_t = DEFAULT_OPACITY)]
        opacity: u8,

        /// Font scale divisor: font pixel size = image width / size
        #[arg(long, default_value_t = DEFAULT_FONT_SCALE, value_parser = parse_font_scale)]
        size: u32,

        /// Rotation in degrees, counterclockwise (center anchor only)
        #[arg(long, default_value_t = DEFAULT_ROTATION, allow_negative_numbers = true)]
        rotation: i32,

        /// Text color as #RGB or #RRGGBB hex
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
    },
    /// Run the watermarking HTTP server
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "0.0.0.0")]
        address: String,

        /// Port to bind
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging subsystem
    tidemark::logging::init_subscriber().expect("Failed to initialize logging subsystem");

    let args = Args::parse();

    match args.command {
        Command::Apply {
            input,
            output,
            text,
            position,
            opacity,
            size,
            rotation,
            color,
        } => {
            let color = parse_hex_color(&color).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1);
            });

            let config = WatermarkConfig {
                text,
                color,
                opacity,
                font_scale: size,
                rotation_degrees: rotation,
                anchor: position,
            };

            match tidemark::batch::run(&input, &output, &config) {
                Ok(()) => println!("Watermarked image written to {}", output.display()),
                Err(WatermarkError::FileNotFound(path)) => {
                    eprintln!("File '{}' not found", path.display());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { address, port } => {
            if let Err(e) = tidemark::server::serve(&address, port).await {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use rust_jfif_parser::{
    color::rgb_to_ycbcr,
    image::{ImageDecoder, ImageEncoder},
    jpeg::JFIFDecoder,
    ppm::{PPMDecoder, PPMEncoder},
};

mod render;

/// Inspects the marker segments of JFIF files and converts PPM images to YCbCr.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every segment of a JFIF file
    Segments {
        /// The JFIF file to read
        #[arg(default_value = "sample1.jfif")]
        file: PathBuf,
        /// Also dump the scan data words
        #[arg(long)]
        payload: bool,
    },
    /// Convert an RGB PPM image to (Y, Cb, Cr) samples
    Ycbcr {
        /// P3 or P6 input image
        input: PathBuf,
        /// Write the converted samples as a P6 file instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Segments { file, payload } => {
            let buffer = fs::read(&file)?;
            info!("Read {} bytes from {}", buffer.len(), file.display());

            let document = JFIFDecoder::new(buffer.as_slice()).decode()?;
            print!("{}", render::document(&document, payload));
        }
        Command::Ycbcr { input, output } => {
            let buffer = fs::read(&input)?;
            let rgb = PPMDecoder::new(buffer.as_slice()).decode()?;
            let ycbcr = rgb_to_ycbcr(&rgb);

            match output {
                Some(path) => {
                    PPMEncoder::new(&ycbcr).encode_to_file(&path)?;
                    info!(
                        "Wrote {}x{} YCbCr samples to {}",
                        ycbcr.columns,
                        ycbcr.rows,
                        path.display()
                    );
                }
                None => {
                    println!("{}x{} pixels, (Y, Cb, Cr)", ycbcr.columns, ycbcr.rows);
                    for (row, pixels) in ycbcr.iter_rows().enumerate() {
                        let rendered: Vec<String> = pixels
                            .iter()
                            .map(|[y, cb, cr]| format!("({} {} {})", y, cb, cr))
                            .collect();
                        println!("{:>4}: {}", row, rendered.join(" "));
                    }
                }
            }
        }
    }

    Ok(())
}

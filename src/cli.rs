use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::models::{AspectRatio, ImageSize};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Forge character images from reference images and a prompt with Gemini",
    long_about = None
)]
pub struct Cli {
    /// Gemini image model to use
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL of the Gemini models endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Directory holding the stored key and generated images
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session (default)
    Interactive,
    /// Generate one image and exit
    Generate(GenerateArgs),
    /// Select and store an API key
    Key,
    /// Show recent generations
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Text prompt describing the character
    #[arg(short, long)]
    pub prompt: String,

    /// Reference image, repeatable; order is preserved
    #[arg(short, long = "reference")]
    pub references: Vec<PathBuf>,

    /// One of 1:1, 3:4, 4:3, 16:9, 9:16
    #[arg(short, long, default_value_t = AspectRatio::default())]
    pub aspect_ratio: AspectRatio,

    /// One of 1K, 2K
    #[arg(short = 's', long, default_value_t = ImageSize::default())]
    pub image_size: ImageSize,

    /// Output directory (defaults to <data dir>/output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

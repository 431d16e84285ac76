use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sci_pic::ega;

mod commands;
mod viewer;

use commands::ConvertOptions;

#[derive(Parser)]
#[command(name = "scipic")]
#[command(about = "Convert raster images to and from Sierra SCI0 picture resources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a picture resource and display it
    Show {
        /// Path to the .pic resource
        file: PathBuf,
    },
    /// Vectorize an image into a picture resource
    Convert {
        /// Input image (PNG, JPEG, ...)
        input: PathBuf,

        /// Output .pic path; omit to convert without saving
        output: Option<PathBuf>,

        /// Open a viewer comparing converted and original (Space toggles)
        #[arg(long)]
        show: bool,

        /// Skip the post-encode round-trip verification
        #[arg(long)]
        no_verify: bool,

        /// Warn instead of failing when the input is not 320x190
        #[arg(long)]
        no_dim_check: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scipic=info,sci_pic=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match Cli::parse().command {
        Commands::Show { file } => {
            let frame = commands::show(&file)?;
            viewer::show(
                &file.display().to_string(),
                vec![viewer::Frame {
                    label: "decoded",
                    rgba: ega::to_rgba(&frame),
                }],
            )
        }
        Commands::Convert {
            input,
            output,
            show,
            no_verify,
            no_dim_check,
        } => {
            let options = ConvertOptions {
                verify: !no_verify,
                allow_dimension_mismatch: no_dim_check,
            };
            let conversion = commands::convert(&input, output.as_deref(), options)?;

            if show {
                let decoded = sci_pic::PicInterpreter::new(&conversion.bytes).run()?;
                viewer::show(
                    &input.display().to_string(),
                    vec![
                        viewer::Frame {
                            label: "converted",
                            rgba: ega::to_rgba(&decoded),
                        },
                        viewer::Frame {
                            label: "original",
                            rgba: ega::to_rgba(&conversion.ega),
                        },
                    ],
                )?;
            }
            Ok(())
        }
    }
}

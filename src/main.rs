//! Command-line front end: bake a scene or decode an image and report what
//! came out.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mesh_bake::{load_image, load_model, Attribute, ImageSettings, ModelSettings};

#[derive(Parser)]
#[command(name = "mesh-bake", about = "Bake 3D scenes into flat GPU-ready buffers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake a glTF scene into vertex and index buffers
    Model {
        /// Scene file (.gltf or .glb)
        input: PathBuf,

        /// Emit one stream per attribute instead of a single interleaved stream
        #[arg(long)]
        planar: bool,

        /// Influence slots per vertex
        #[arg(long, default_value_t = 4)]
        max_bones: usize,

        /// Attributes to emit even when the source lacks them
        /// (position, normal, texcoord, tangent-bitangent, bone-indices, bone-weights)
        #[arg(long, value_delimiter = ',')]
        force: Vec<Attribute>,

        /// Merge meshes sharing attribute set and material into one bucket
        #[arg(long)]
        merge: bool,
    },

    /// Decode an image file and report its dimensions
    Image {
        /// Image file (.png or .jpg)
        input: PathBuf,

        /// Keep the source row order instead of flipping for GL samplers
        #[arg(long)]
        no_flip: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Model {
            input,
            planar,
            max_bones,
            force,
            merge,
        } => {
            let settings = ModelSettings {
                interleave_attributes: !planar,
                max_influential_bones: max_bones,
                force_attributes: force.into_iter().collect(),
                merge_meshes: merge,
            };
            let model = load_model(&input, &settings)
                .with_context(|| format!("baking {}", input.display()))?;

            for (i, mesh) in model.meshes.iter().enumerate() {
                tracing::info!(
                    "mesh {}: {} vertices, {} indices, {} float stream(s), material {}",
                    i,
                    mesh.vertex_count,
                    mesh.indices.len(),
                    mesh.streams.len(),
                    mesh.material_id
                );
            }
            tracing::info!("{} bone(s) in the model table", model.bones.len());
        }

        Commands::Image { input, no_flip } => {
            let settings = ImageSettings {
                flip_vertically: !no_flip,
            };
            let image = load_image(&input, &settings)
                .with_context(|| format!("decoding {}", input.display()))?;

            tracing::info!(
                "{}: {}x{}, {} channel(s), {} bytes",
                input.display(),
                image.width,
                image.height,
                image.color_channels,
                image.pixel_data.len()
            );
        }
    }

    Ok(())
}

//! Command-line front end: inspect a slide's overlays or convert detections.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result, bail};
    use clap::{Args, Parser, Subcommand};

    use pathoverlay::constants::DEFAULT_SCENE_SCALE;
    use pathoverlay::format::AnnotationFormat;
    use pathoverlay::image_provider::FileImage;
    use pathoverlay::{
        FileImageProvider, FormatRegistry, HeadlessSurface, ImageDimensions, LogLevel,
        OverlayConfig, RepositoryError, VisualizationExtension,
    };

    #[derive(Parser, Debug)]
    #[command(
        name = "pathoverlay",
        version,
        about = "Likelihood-map and detection overlays for whole-slide images"
    )]
    struct Cli {
        /// Configuration file (default: user config directory)
        #[arg(long, global = true)]
        config: Option<PathBuf>,
        /// Override the configured log level
        #[arg(long, global = true, value_parser = parse_log_level)]
        log_level: Option<LogLevel>,
        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Subcommand, Debug)]
    enum Commands {
        /// Discover a slide's companions and report the resulting overlays
        Inspect(InspectArgs),
        /// Convert a detections file between annotation formats
        Convert(ConvertArgs),
    }

    #[derive(Args, Debug)]
    struct InspectArgs {
        /// Base slide image
        base_image: PathBuf,
        /// Base dimensions as WIDTHxHEIGHT when the slide cannot be decoded
        #[arg(long)]
        base_size: Option<ImageDimensions>,
        /// Show the likelihood map
        #[arg(long)]
        raster: bool,
        /// Show the detections
        #[arg(long)]
        polygons: bool,
        /// Likelihood-map opacity in [0, 1]
        #[arg(long)]
        opacity: Option<f64>,
        /// Viewer scene scale used to project detections
        #[arg(long, default_value_t = DEFAULT_SCENE_SCALE)]
        scene_scale: f32,
    }

    #[derive(Args, Debug)]
    struct ConvertArgs {
        /// Source annotation file
        input: PathBuf,
        /// Destination annotation file
        output: PathBuf,
        /// Source format id (default: from the input extension)
        #[arg(long)]
        from: Option<String>,
        /// Destination format id (default: from the output extension)
        #[arg(long)]
        to: Option<String>,
    }

    fn parse_log_level(s: &str) -> Result<LogLevel, String> {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .map_err(|_| format!("unknown log level '{}'", s))
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let config = match &cli.config {
            Some(path) => OverlayConfig::load(path)
                .with_context(|| format!("loading configuration {:?}", path))?,
            None => OverlayConfig::load_from_default_path(),
        };

        let level = cli.log_level.unwrap_or(config.log_level);
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .parse_default_env()
            .init();

        match cli.command {
            Commands::Inspect(args) => inspect(config, args),
            Commands::Convert(args) => convert(&args),
        }
    }

    fn inspect(config: OverlayConfig, args: InspectArgs) -> Result<()> {
        let surface = HeadlessSurface::<FileImage>::new(args.scene_scale);
        let mut extension = VisualizationExtension::new(config, FileImageProvider, surface);

        match args.base_size {
            Some(size) => extension.on_image_loaded_with_dimensions(&args.base_image, size),
            None => extension.on_new_image_loaded(&args.base_image),
        }
        if !extension.is_enabled() {
            bail!(
                "could not read {:?}; pass --base-size WIDTHxHEIGHT",
                args.base_image
            );
        }

        if let Some(opacity) = args.opacity {
            extension.on_opacity_changed(opacity);
        }
        extension.on_raster_toggled(args.raster);
        extension.on_polygons_toggled(args.polygons);

        let coordinator = extension.coordinator();
        if let Some(base) = coordinator.base_dimensions() {
            println!("base image:      {}", base);
        }
        match extension.registration() {
            Some(reg) => match reg.scale {
                Some(scale) => println!("likelihood map:  {} (factor {})", reg.derived, scale),
                None => println!("likelihood map:  {} (not registered)", reg.derived),
            },
            None => println!("likelihood map:  none"),
        }
        let annotations = extension.annotations();
        println!(
            "detections:      {} ({} points, {} groups)",
            annotations.len(),
            annotations.total_points(),
            annotations.groups().len()
        );

        let surface = coordinator.surface();
        println!(
            "raster attached: {} (opacity {})",
            coordinator.is_raster_attached(),
            surface.opacity()
        );
        println!("outlines:        {}", surface.polygon_count());
        Ok(())
    }

    fn resolve_format<'a>(
        registry: &'a FormatRegistry,
        id: Option<&str>,
        path: &Path,
    ) -> Result<&'a dyn AnnotationFormat> {
        match id {
            Some(id) => registry.get(id).with_context(|| {
                format!("unknown format '{}' (known: {})", id, registry.ids().join(", "))
            }),
            None => registry.for_path(path).ok_or_else(|| {
                RepositoryError::UnknownFormat {
                    path: path.to_path_buf(),
                }
                .into()
            }),
        }
    }

    fn convert(args: &ConvertArgs) -> Result<()> {
        let registry = FormatRegistry::new();
        let from = resolve_format(&registry, args.from.as_deref(), &args.input)?;
        let to = resolve_format(&registry, args.to.as_deref(), &args.output)?;

        let list = from
            .load(&args.input)
            .with_context(|| format!("reading {:?} as {}", args.input, from.display_name()))?;
        to.save(&args.output, &list)
            .with_context(|| format!("writing {:?} as {}", args.output, to.display_name()))?;

        println!(
            "converted {} annotations from {} to {}",
            list.len(),
            from.id(),
            to.id()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}

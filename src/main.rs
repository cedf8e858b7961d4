use clap::{Parser, Subcommand};
use iiif_serve::config::{self, ConfigOverrides, ServerConfig};
use iiif_serve::imaging::RustBackend;
use iiif_serve::info::RoutePrefix;
use iiif_serve::resolver::FsResolver;
use iiif_serve::service::{ImageRequest, ImageService};
use iiif_serve::{output, server};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "iiif-serve")]
#[command(about = "IIIF Image API 2.1 server")]
#[command(long_about = "\
IIIF Image API 2.1 server

Images are found by bare filename anywhere below the search roots and served
with region, size, rotation and quality/format applied:

  GET /iiif/2/{filename}/info.json
  GET /iiif/2/{filename}/{region}/{size}/{rotation}/{quality}.{format}

The same routes are also mounted without the /iiif/2 prefix.

Region:    full | square | x,y,w,h | pct:x,y,w,h
Size:      full | max | w, | ,h | pct:n | !w,h
Rotation:  n | !n        (mirrored; multiples of 90 are rendered)
Quality:   default
Format:    jpg

Configuration is read from iiif.toml in the working directory (or --config)
and may be overridden by FILE_LOCATIONS, SITE_URI and the flags below.
Run 'iiif-serve gen-config' to generate a documented iiif.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./iiif.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Image search roots, in priority order (space-separated in FILE_LOCATIONS)
    #[arg(
        long = "root",
        env = "FILE_LOCATIONS",
        value_delimiter = ' ',
        num_args = 1..,
        global = true
    )]
    roots: Option<Vec<PathBuf>>,

    /// Base URI used for image identifiers; must end with '/'
    #[arg(long, env = "SITE_URI", global = true)]
    base_uri: Option<String>,

    /// Address to listen on
    #[arg(long, global = true)]
    bind: Option<SocketAddr>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Print the info.json for an image
    Info {
        filename: String,
    },
    /// Render one image request to a file
    Render {
        filename: String,
        region: String,
        size: String,
        rotation: String,
        /// e.g. default.jpg
        quality_format: String,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate config and report what each search root holds
    Check,
    /// Print a stock iiif.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            search_roots: self.roots.clone().filter(|r| !r.is_empty()),
            base_uri: self.base_uri.clone(),
            bind: self.bind,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("iiif_serve=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = cli.overrides();
    let load = || config::load_config(cli.config.as_deref(), &overrides);

    match cli.command {
        Command::Serve => {
            let config = load()?;
            tokio::runtime::Runtime::new()?.block_on(server::serve(config))?;
        }
        Command::Info { filename } => {
            let service = local_service(load()?);
            let info = service.info(&filename, RoutePrefix::Iiif2)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Render {
            filename,
            region,
            size,
            rotation,
            quality_format,
            output: out_path,
        } => {
            let service = local_service(load()?);
            let req = ImageRequest::new(&filename, region, size, rotation, quality_format);
            let image = service.image(&req, RoutePrefix::Iiif2)?;
            std::fs::write(&out_path, &image.bytes)?;
            output::print_render_output(&filename, &out_path, &image);
        }
        Command::Check => {
            let config = load()?;
            let counts = FsResolver::from_config(&config).count_images();
            output::print_check_output(&config, &counts);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn local_service(config: ServerConfig) -> ImageService<FsResolver, RustBackend> {
    let resolver = FsResolver::from_config(&config);
    ImageService::new(config, resolver, RustBackend::new())
}

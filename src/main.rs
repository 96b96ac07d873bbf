use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

use presage_scraper::{
    archive_extractor::ArchiveExtractor,
    config::ExtractConfig,
    containers::{PresageArchive, ResourceArchive},
    formats::{clu::Clu, xpk::XpkReader},
    resources::ResourceLoader,
    titles::detect_title,
    Error, Result,
};

#[derive(Debug, Parser)]
#[command(name = "presage_scraper", version, about = "Extract resources from Presage PRX and PRD/PRS archives")]
struct Cli {
    /// More output per occurrence (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ArchiveArgs {
    /// A .PRX, or the .PRD header of a pair
    archive: PathBuf,
    /// The .PRS data file, when it is not next to the .PRD
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Identify the title installed in a directory
    Detect { dir: PathBuf },
    /// List archive members in on-disk order
    List {
        #[command(flatten)]
        archive: ArchiveArgs,
        #[arg(long)]
        json: bool,
    },
    /// Dump every member and render XPK images to PNG
    Extract {
        #[command(flatten)]
        archive: ArchiveArgs,
        #[arg(short, long)]
        output: PathBuf,
        /// JSON extraction settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// CLU member to render with
        #[arg(long)]
        palette: Option<String>,
        #[arg(long)]
        no_images: bool,
        #[arg(long)]
        no_optimise: bool,
        #[arg(long)]
        progress: Option<PathBuf>,
    },
    /// Print the colours of a CLU member
    Palette {
        #[command(flatten)]
        archive: ArchiveArgs,
        member: String,
    },
    /// Render one XPK member to a PNG
    Render {
        #[command(flatten)]
        archive: ArchiveArgs,
        member: String,
        #[arg(long)]
        palette: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Render a single tile instead of the whole image
        #[arg(long)]
        tile: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG, when set, overrides the -v level
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Detect { dir } => match detect_title(&dir)? {
            Some(title) => println!("{} ({})", title.name, title.id),
            None => println!("No known Presage title in {}", dir.display()),
        },
        Commands::List { archive, json } => {
            let archive = open_archive(&archive)?;
            list(&archive, json)?;
        }
        Commands::Extract {
            archive: archive_args,
            output,
            config,
            palette,
            no_images,
            no_optimise,
            progress,
        } => {
            let mut config = match config {
                Some(path) => ExtractConfig::from_file(&path)?,
                None => ExtractConfig::default(),
            };
            if palette.is_some() {
                config.palette = palette;
            }
            if no_images {
                config.render_images = false;
            }
            if no_optimise {
                config.optimise_png = false;
            }
            if progress.is_some() {
                config.progress_file = progress;
            }

            let mut archive = open_archive(&archive_args)?;
            let label = archive_label(&archive_args.archive);
            let manifest = ArchiveExtractor::new(config).extract(&mut archive, &label, &output)?;
            println!(
                "Extracted {} members to {} ({} failed)",
                manifest.members.len(),
                output.join(&label).display(),
                manifest.failed()
            );
        }
        Commands::Palette { archive, member } => {
            let mut archive = open_archive(&archive)?;
            let clu = Clu::from_bytes(&require_member(&mut archive, &member)?)?;
            clu.dump();
            for (i, c) in clu.colours().iter().enumerate() {
                println!("{:3}: #{:02X}{:02X}{:02X}", i, c.r, c.g, c.b);
            }
        }
        Commands::Render {
            archive,
            member,
            palette,
            output,
            tile,
        } => {
            let mut archive = open_archive(&archive)?;
            let clu = Clu::from_bytes(&require_member(&mut archive, &palette)?)?;
            let mut reader = XpkReader::new(std::io::Cursor::new(require_member(&mut archive, &member)?))?;

            let canvas = match tile {
                Some(index) => reader.decode_entry(index)?,
                None if reader.xpk().is_tiled_mode_ok() => reader.decode_tiled_mode()?,
                None => {
                    info!("{} is not a full screen, rendering tile 0", member);
                    reader.decode_entry(0)?
                }
            };
            canvas.to_rgba_image(&clu).save(&output)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

/// Open a PRX or a PRD/PRS pair. Without `--data` a .PRD finds its .PRS
/// next to it.
fn open_archive(args: &ArchiveArgs) -> Result<PresageArchive<BufReader<File>>> {
    if let Some(data) = &args.data {
        let mut archive = PresageArchive::open_pair(&args.archive, data)?;
        archive.read()?;
        return Ok(archive);
    }

    let dir = args
        .archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = args
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    ResourceLoader::new(dir).open_archive(&name, None)
}

fn require_member(archive: &mut PresageArchive<BufReader<File>>, name: &str) -> Result<Vec<u8>> {
    archive.read_member(name)?.ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No member named {}", name),
        ))
    })
}

fn list(archive: &PresageArchive<BufReader<File>>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(archive.list_members())?);
        return Ok(());
    }

    println!("{} archive, {} members", archive.kind(), archive.entry_count());
    println!("+------+----------------------+--------+------------+------------+");
    println!("|   id | name                 |    rid |     offset |       size |");
    println!("+------+----------------------+--------+------------+------------+");
    for m in archive.list_members() {
        println!(
            "| {:4} | {:20} | {:6} | {:10} | {:10} |",
            m.internal_id,
            m.file_name(),
            m.resource_id,
            archive.absolute_offset(m),
            m.size
        );
    }
    println!("+------+----------------------+--------+------------+------------+");
    Ok(())
}

fn archive_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string())
}

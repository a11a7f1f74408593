use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aperture", version)]
struct Cli {
    /// Increase log verbosity (-v warn, -vv info, -vvv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one data snapshot to SVG and/or a surface op log.
    Render(RenderArgs),
    /// Check a chart config without rendering.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Chart config JSON.
    #[arg(long)]
    chart: PathBuf,

    /// Data JSON: an array shared by all layers, or an object of arrays keyed by data set.
    #[arg(long)]
    data: PathBuf,

    /// Output SVG path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output path for the JSON log of surface operations.
    #[arg(long)]
    ops: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Chart config JSON.
    #[arg(long)]
    chart: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn read_chart(path: &Path) -> anyhow::Result<aperture::ChartDef> {
    let def = aperture::ChartDef::from_path(path)
        .with_context(|| format!("load chart '{}'", path.display()))?;
    Ok(def)
}

fn read_data_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let f = File::open(path).with_context(|| format!("open data '{}'", path.display()))?;
    let r = BufReader::new(f);
    let data = serde_json::from_reader(r).with_context(|| "parse data JSON")?;
    Ok(data)
}

fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    if args.out.is_none() && args.ops.is_none() {
        anyhow::bail!("nothing to write: pass --out and/or --ops");
    }

    let def = read_chart(&args.chart)?;
    let data = read_data_json(&args.data)?;
    let (width, height) = (def.width, def.height);

    if let Some(out) = &args.out {
        let mut chart = aperture::Chart::new(def.clone())?;
        let mut surface = aperture::RetainedSurface::new();
        let stats = chart.render(&data, &mut surface)?;
        surface.complete_transitions();
        write_output(out, &surface.to_svg(width, height))?;
        for s in &stats {
            eprintln!(
                "layer {}: {} created, {} skipped, {} culled",
                s.id, s.stats.created, s.stats.skipped, s.stats.culled
            );
        }
        eprintln!("wrote {}", out.display());
    }

    if let Some(ops) = &args.ops {
        let mut chart = aperture::Chart::new(def)?;
        let mut surface = aperture::RecordingSurface::new();
        chart.render(&data, &mut surface)?;
        surface.complete_transitions();
        write_output(ops, &surface.ops_json()?)?;
        eprintln!("wrote {} ({} ops)", ops.display(), surface.ops().len());
    }

    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let def = read_chart(&args.chart)?;
    let ranges = def.ranges.len();
    let layers = def.layers.len();
    aperture::Chart::new(def).context("build chart")?;
    println!("ok: {layers} layer(s), {ranges} range(s)");
    Ok(())
}

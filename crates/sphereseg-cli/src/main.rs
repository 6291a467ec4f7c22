//! sphereseg CLI - clip meshes against spherical wedges
//!
//! ```text
//! # Curves where a mesh crosses a 70 x 40 degree wedge, as JSON
//! sphereseg clip part.obj --radius 100 --azimuth -30,40 --elevation -20,20
//!
//! # Same, from a job file, written as OBJ polylines
//! sphereseg clip part.obj --job wedge.toml -o curves.obj
//!
//! # Geometry of the wedge itself
//! sphereseg outline --job wedge.toml -o wedge.obj
//!
//! # Debug output
//! RUST_LOG=sphereseg=debug sphereseg clip part.obj --job wedge.toml
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sphereseg::{IntersectSettings, Parts, SphereSegment};
use sphereseg_math::Transform;
use sphereseg_mesh::obj;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod job;

use job::{JobFile, SettingsArgs, WedgeArgs};

#[derive(Parser)]
#[command(name = "sphereseg")]
#[command(version, about = "Clip triangle meshes against spherical wedges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace the curves where a mesh crosses the wedge boundary
    Clip {
        /// Input mesh (.obj)
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (default: from the output extension, else JSON)
        #[arg(long)]
        format: Option<CurveFormat>,
        /// TOML job file with wedge, settings and transform
        #[arg(long)]
        job: Option<PathBuf>,
        /// Report unjoined curves grouped by wedge surface (JSON only)
        #[arg(long)]
        per_surface: bool,
        #[command(flatten)]
        wedge: WedgeArgs,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Write the wedge geometry as OBJ
    Outline {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// TOML job file
        #[arg(long)]
        job: Option<PathBuf>,
        /// Parts to emit, comma separated (surface, edge, sides, spokes)
        #[arg(long, value_delimiter = ',')]
        parts: Option<Vec<String>>,
        #[command(flatten)]
        wedge: WedgeArgs,
    },
    /// Describe a wedge
    Info {
        /// TOML job file
        #[arg(long)]
        job: Option<PathBuf>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        wedge: WedgeArgs,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CurveFormat {
    Json,
    Obj,
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "sphereseg=info,sphereseg_mesh=info",
            2 => "sphereseg=debug,sphereseg_mesh=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Clip {
            input,
            output,
            format,
            job,
            per_surface,
            wedge,
            settings,
        } => {
            let job = JobFile::load_optional(job.as_deref())?;
            clip(ClipJob {
                input: &input,
                output: output.as_deref(),
                format,
                per_surface,
                transform: job.transform()?,
                settings: settings.apply(job.settings)?,
                wedge: wedge.or(job.wedge).build()?,
            })?;
        }
        Commands::Outline {
            output,
            job,
            parts,
            wedge,
        } => {
            let job = JobFile::load_optional(job.as_deref())?;
            let wedge = wedge.or(job.wedge).build()?;
            let parts = parts.as_deref().map_or(Ok(Parts::ALL), parse_parts)?;
            outline(&wedge, parts, output.as_deref())?;
        }
        Commands::Info { job, json, wedge } => {
            let job = JobFile::load_optional(job.as_deref())?;
            let wedge = wedge.or(job.wedge).build()?;
            show_info(&wedge, json)?;
        }
    }

    Ok(())
}

struct ClipJob<'a> {
    input: &'a Path,
    output: Option<&'a Path>,
    format: Option<CurveFormat>,
    per_surface: bool,
    transform: Transform,
    settings: IntersectSettings,
    wedge: SphereSegment,
}

fn clip(job: ClipJob<'_>) -> Result<()> {
    let file = File::open(job.input)
        .with_context(|| format!("failed to open {}", job.input.display()))?;
    let mesh = obj::read_obj(BufReader::new(file))
        .with_context(|| format!("failed to read {}", job.input.display()))?;
    info!(
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "loaded mesh"
    );

    let format = job.format.unwrap_or_else(|| {
        match job
            .output
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("obj") => CurveFormat::Obj,
            _ => CurveFormat::Json,
        }
    });
    if job.per_surface && format != CurveFormat::Json {
        bail!("--per-surface output is only available as JSON");
    }

    let mut out = open_output(job.output)?;
    if job.per_surface {
        let curves = job
            .wedge
            .compute_intersection_lines(&mesh, &job.transform, &job.settings)?;
        info!(
            curves = curves.iter().map(|c| c.lines.len()).sum::<usize>(),
            "traced surfaces"
        );
        serde_json::to_writer_pretty(&mut out, &curves)?;
        writeln!(out)?;
    } else {
        let lines = job
            .wedge
            .compute_intersection(&mesh, &job.transform, &job.settings)?;
        info!(
            lines = lines.len(),
            closed = lines.iter().filter(|l| l.is_closed()).count(),
            "clipped mesh"
        );
        match format {
            CurveFormat::Json => {
                serde_json::to_writer_pretty(&mut out, &lines)?;
                writeln!(out)?;
            }
            CurveFormat::Obj => {
                writeln!(out, "# sphereseg curves")?;
                obj::write_polylines(&mut out, &lines, 0)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn outline(wedge: &SphereSegment, parts: Parts, output: Option<&Path>) -> Result<()> {
    let geometry = wedge.outline(parts);
    let mesh = geometry.merged_mesh();
    info!(
        triangles = mesh.num_triangles(),
        lines = geometry.lines.len(),
        "generated outline"
    );

    let mut out = open_output(output)?;
    writeln!(out, "# sphereseg outline")?;
    obj::write_mesh(&mut out, &mesh, 0)?;
    obj::write_polylines(&mut out, &geometry.lines, mesh.num_vertices())?;
    out.flush()?;
    Ok(())
}

fn show_info(wedge: &SphereSegment, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(wedge)?);
        return Ok(());
    }

    let c = wedge.centre();
    let (az_min, az_max, elev_min, elev_max) = wedge.area();
    let (dir, _, _) = wedge.area_direction();
    println!("Centre:    ({}, {}, {})", c.x, c.y, c.z);
    println!("Radius:    {}", wedge.radius());
    println!(
        "Azimuth:   {:.3} .. {:.3} deg",
        az_min.to_degrees(),
        az_max.to_degrees()
    );
    println!(
        "Elevation: {:.3} .. {:.3} deg",
        elev_min.to_degrees(),
        elev_max.to_degrees()
    );
    println!("Direction: ({:.4}, {:.4}, {:.4})", dir.x, dir.y, dir.z);

    let surfaces: Vec<&str> = [
        (true, "radius"),
        (wedge.has_azimuth_bounds(), "azimuth-min"),
        (wedge.has_azimuth_bounds(), "azimuth-max"),
        (wedge.has_lower_bound(), "elevation-min"),
        (wedge.has_upper_bound(), "elevation-max"),
    ]
    .into_iter()
    .filter_map(|(present, name)| present.then_some(name))
    .collect();
    println!("Surfaces:  {}", surfaces.join(", "));
    if wedge.is_azimuth_reflex() {
        println!("           azimuth span exceeds 180 deg");
    }

    let bbox = wedge.bounding_box();
    println!(
        "Bounds:    ({:.4}, {:.4}, {:.4}) .. ({:.4}, {:.4}, {:.4})",
        bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
    );
    Ok(())
}

fn parse_parts(names: &[String]) -> Result<Parts> {
    names.iter().try_fold(Parts::NONE, |acc, name| {
        let part = match name.trim() {
            "surface" => Parts::SURFACE,
            "edge" => Parts::EDGE_LINE,
            "sides" => Parts::SIDES,
            "spokes" => Parts::SPOKES,
            "all" => Parts::ALL,
            other => bail!("unknown outline part {other:?}"),
        };
        Ok(acc | part)
    })
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("failed to create {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

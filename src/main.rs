use std::path::PathBuf;

use bbkin::hardware::math::{DEFAULT_STEPS_PER_REV, DEFAULT_WHEEL_DIAMETER, steps_per_mm};
use bbkin::{CableMode, MachineGeometry, Point2D, Solver, demo};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Prints the cable lengths a drawing machine needs for a list of points.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// two-cable, three-cable-improved or three-cable-zero-g
    #[arg(short, long, default_value = "two-cable")]
    mode: CableMode,

    /// JSON machine geometry, the reference rig is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// A target position as `x,y`, may be repeated
    #[arg(short, long = "point", value_parser = parse_point)]
    points: Vec<Point2D>,

    /// Reject positions outside the envelope instead of printing raw lengths
    #[arg(long)]
    validate: bool,

    /// Also print the motor steps between consecutive points
    #[arg(long)]
    steps: bool,
}

fn parse_point(s: &str) -> Result<Point2D, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected `x,y`, got `{}`", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x `{}`: {}", x, e))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y `{}`: {}", y, e))?;

    Ok(Point2D::new(x, y))
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = match &args.config {
        Some(path) => MachineGeometry::load(path)?,
        None => MachineGeometry::default(),
    };
    let solver = Solver::new(geometry);

    let points = if args.points.is_empty() { demo::sample_points() } else { args.points };

    if args.validate {
        for point in &points {
            solver.try_transform(args.mode, *point)?;
        }
    }

    let mut stdout = std::io::stdout().lock();
    let lengths = demo::run(&mut stdout, &solver, args.mode, &points)?;

    if args.steps {
        let spm = steps_per_mm(DEFAULT_STEPS_PER_REV, DEFAULT_WHEEL_DIAMETER);
        for pair in lengths.windows(2) {
            println!("steps {:?}", pair[0].step_deltas(&pair[1], spm));
        }
    }

    Ok(())
}

fn main() {
    // Setup logging, info unless RUST_LOG says otherwise (RUST_LOG=debug for per-point output)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

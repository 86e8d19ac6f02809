//! mkwheel - package built Python extension modules into a binary wheel.
//!
//! Takes a version string and the artifact files produced by an earlier
//! compilation step, and writes `<dist-dir>/<package>-<version>-<tag>.whl`.
//! Any failure leaves no archive file behind.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mkwheel_core::{BuildConfig, InterpreterEnv, WheelBuilder};

#[derive(Parser, Debug)]
#[command(author, version, about = "Package built extension modules into a binary wheel", long_about = None)]
struct Args {
    /// Version of the release being packaged
    #[arg(id = "release-version", value_name = "VERSION")]
    version: String,

    /// Built artifact files, each under the source root
    #[arg(required = true)]
    artifacts: Vec<PathBuf>,

    /// Distribution name used in the archive filename and metadata records
    #[arg(long, default_value = "coho")]
    package: String,

    /// Prefix every artifact path must carry
    #[arg(long, default_value = "py")]
    source_root: PathBuf,

    /// Directory the finished archive is written into
    #[arg(long, default_value = "py/dist")]
    dist_dir: PathBuf,

    /// License identifier for the METADATA record
    #[arg(long, default_value = "ISC")]
    license: String,

    /// Interpreter probed for the compatibility tag
    #[arg(long, default_value = "python3")]
    python: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let env = InterpreterEnv::probe(&args.python)
        .with_context(|| format!("failed to probe interpreter '{}'", args.python))?;

    let config = BuildConfig {
        package: args.package,
        source_root: args.source_root,
        dist_dir: args.dist_dir,
        license: args.license,
    };

    let path = WheelBuilder::new(config, env)
        .build(&args.version, &args.artifacts)
        .context("wheel build failed")?;

    println!("{}", path.display());
    Ok(())
}

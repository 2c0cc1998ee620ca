use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use ormshift::render::render_schema;

/// Compile legacy XML mapping descriptors into a target ORM schema.
#[derive(Parser)]
#[command(name = "ormshift", version, about)]
struct Cli {
    /// Directory containing mapping descriptor files (*.xml)
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let descriptors = match read_descriptors(&cli.input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };
    if descriptors.is_empty() {
        eprintln!("No descriptor files found in {}", cli.input.display());
        process::exit(1);
    }

    let (schema, diags) = match ormshift::build_schema(&descriptors) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    // Individual diagnostics are logged where they arise
    if !diags.is_empty() {
        tracing::warn!("{} warning(s) during generation", diags.len());
    }

    let rendered = render_schema(&schema);
    match cli.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", rendered),
    }
}

/// Collect `*.xml` descriptor sources, sorted by file name for deterministic
/// runs.
fn read_descriptors(dir: &PathBuf) -> std::io::Result<Vec<(String, String)>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
        .collect();
    paths.sort();

    let mut descriptors = Vec::new();
    for path in paths {
        let origin = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let source = fs::read_to_string(&path)?;
        descriptors.push((origin, source));
    }
    Ok(descriptors)
}

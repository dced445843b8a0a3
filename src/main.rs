use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jsonschema2ddl::sql::{self, Dialect};
use jsonschema2ddl::{compile_str, CompileError};
use log::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emit {
    /// DDL statements
    Sql,
    /// Resolved tables as JSON
    Tables,
}

/// Compile a JSON Schema document into SQL tables.
#[derive(Parser, Debug)]
#[command(name = "jsonschema2ddl", version)]
struct Args {
    /// Input schema document (.json)
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target dialect: pg, postgres, postgresql, mysql
    #[arg(short, long, default_value = "pg")]
    dialect: String,

    /// What to emit
    #[arg(short, long, value_enum, default_value_t = Emit::Sql)]
    emit: Emit,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dialect = Dialect::from_str(&args.dialect)
        .with_context(|| format!("invalid dialect: {}", args.dialect))?;

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let tables = match compile_str(&source) {
        Ok(tables) => tables,
        Err(CompileError::Invalid(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic);
            }
            process::exit(1);
        }
        Err(e) => return Err(e).context(format!("failed to parse {}", args.input.display())),
    };
    info!("compiled {} table(s) from {}", tables.len(), args.input.display());

    let output = match args.emit {
        Emit::Sql => {
            let mut out = sql::generate(&tables, dialect).join("\n");
            out.push('\n');
            out
        }
        Emit::Tables => serde_json::to_string_pretty(&tables)?,
    };

    match args.output {
        Some(path) => fs::write(&path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", output),
    }
    Ok(())
}

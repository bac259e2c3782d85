use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flowc")]
#[command(about = "FlowScript compiler - lowers pipeline scripts to typed IR")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file and write the IR listing next to it.
    Compile {
        input: PathBuf,

        /// Write the listing here instead of next to the source.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dump the module as JSON instead of the text listing.
        #[arg(long)]
        json: bool,

        /// Leave out the `;` comments in the listing.
        #[arg(long)]
        plain: bool,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse and generate without writing anything; report diagnostics.
    Check {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the structure of the generated module.
    Dump {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            json,
            plain,
            verbose,
        } => cmd_compile(input, output, json, plain, verbose),
        Commands::Check { input, verbose } => cmd_check(input, verbose),
        Commands::Dump { input, verbose } => cmd_dump(input, verbose),
    }
}

fn load_program(input: &PathBuf) -> Result<flowc_parser::ast::Program> {
    let source = std::fs::read_to_string(input)?;
    flowc_parser::parse(&source).map_err(|e| anyhow::anyhow!("Parse error:\n{}", e))
}

fn cmd_compile(
    input: PathBuf,
    output: Option<PathBuf>,
    json: bool,
    plain: bool,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use flowc_emit::{EmitConfig, FlowIrEmitter};
    use flowc_transform::generate_program;
    use std::time::Instant;

    if verbose {
        println!("{}", "FlowScript Compiler".bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!(" Input: {}", input.display());
        println!();
    }

    let start = Instant::now();
    let program = load_program(&input)?;

    if verbose {
        println!(" Generating IR...");
    }
    let generated = generate_program(&program);

    for warning in generated.warnings() {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    let mut failed = false;
    for error in generated.errors() {
        println!("{} {}", "error:".bright_red().bold(), error);
        failed = true;
    }
    if failed {
        return Err(anyhow::anyhow!("Compilation failed"));
    }

    let listing = if json {
        flowc_core::ir_persist::module_to_json(&generated.module)?
    } else {
        let config = EmitConfig {
            emit_comments: !plain,
            ..EmitConfig::default()
        };
        FlowIrEmitter::with_config(config).emit_to_string(&generated.module)?
    };

    let written = match output {
        Some(path) => {
            std::fs::write(&path, &listing)?;
            path
        }
        None => flowc_emit::write_next_to_source(&input, &listing)?,
    };

    if verbose {
        let elapsed = start.elapsed();
        println!(
            "\n {} Compiled in {:.3}s",
            "SUCCESS:".bright_green().bold(),
            elapsed.as_secs_f64()
        );
    }
    println!("Wrote {}", written.display());

    Ok(())
}

fn cmd_check(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;
    use flowc_transform::generate_program;

    let program = load_program(&input)?;
    let generated = generate_program(&program);

    for warning in generated.warnings() {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    let errors: Vec<_> = generated.errors().collect();
    if errors.is_empty() {
        println!("{}", "OK".bright_green().bold());
        if verbose {
            println!(
                "  {} function(s), {} diagnostic(s)",
                generated.module.functions.len(),
                generated.diagnostics.len()
            );
        }
        Ok(())
    } else {
        for error in &errors {
            println!("{} {}", "error:".bright_red().bold(), error);
        }
        Err(anyhow::anyhow!("{} error(s)", errors.len()))
    }
}

fn cmd_dump(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;
    use flowc_transform::generate;

    let program = load_program(&input)?;
    let module = generate(&program)?;

    println!(
        "{}",
        format!("Module: {}", module.name).bright_green().bold()
    );
    println!("Functions: {}", module.functions.len());
    println!("Declarations: {}", module.declarations.len());
    println!("Globals: {}", module.globals.len());
    println!("Strings: {}", module.strings.len());

    if verbose {
        for function in module.functions.values() {
            println!(
                "\n  {}",
                format!("Function: {}", function.name()).bright_yellow()
            );
            println!("     Parameters: {}", function.signature.params.len());
            println!("     Blocks: {}", function.body.blocks.len());

            for (block_id, block) in &function.body.blocks {
                println!(
                    "       {}: {} instructions",
                    block_id,
                    block.instructions.len()
                );
            }
        }
    }

    Ok(())
}

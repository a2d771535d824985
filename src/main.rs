use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use evaluator::compiler::{self, CompilationError, tokens_to_string};
use evaluator::config::{Config, ConfigLoader, LogMode};
use evaluator::logger::{self, Severity};
use evaluator::{Cpu, Evaluator, Voice, log_fatal, log_info, log_println, log_warn};
use std::path::PathBuf;
use std::process::exit;
use thread_priority::{ThreadBuilder, ThreadPriority};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Compile and run per-sample audio formulas.",
    long_about = "Compiles formulas such as `output = sin(input * 2)` into register machine\n\
    programs, prints them, and runs them over test signals the way a synthesis\n\
    node would, one block at a time."
)]
struct Cli {
    /// Configuration file (default: <config dir>/evaluator/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to the rotating log file
    #[arg(long)]
    log_file: bool,

    /// Show debug messages
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tokens of a formula
    Tokens {
        /// Formula source, the configured one if omitted
        source: Option<String>,
    },
    /// Print the compiled program of a formula
    Compile {
        source: Option<String>,

        /// Print a JSON summary instead of the listing
        #[arg(long)]
        json: bool,
    },
    /// Run a formula over explicit input samples
    Run {
        source: Option<String>,

        /// Comma separated input samples (default: one block of zeros)
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        input: Vec<f32>,

        /// How many times the input block is processed
        #[arg(short, long, default_value_t = 1)]
        blocks: usize,
    },
    /// Render a sine test signal through the formula on a render thread
    Render {
        source: Option<String>,

        #[arg(long, default_value_t = 1.0)]
        seconds: f32,

        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::with_path(path).load_or_create(),
        None => {
            let loader = ConfigLoader::new()?;
            if loader.config_path().exists() {
                loader.load()
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn setup_logger(cli: &Cli, config: &Config) {
    logger::init_standalone();
    let logger = logger::get_logger();
    if cli.verbose {
        logger.set_level(Severity::Debug);
    }
    match (cli.log_file, config.log.mode) {
        (true, _) | (false, LogMode::Dual) => logger.set_dual_mode(),
        (false, LogMode::File) => logger.set_file_mode(),
        (false, LogMode::Standalone) => {}
    }
}

/// Prints the error, with a caret under the faulty characters when the
/// tokenizer is the one complaining.
fn report_error(source: &str, err: &CompilationError) {
    eprintln!("error: {}", err);
    if err.is_lexical() {
        eprintln!("  {}", source);
        let width = err.to.saturating_sub(err.from).max(1);
        eprintln!("  {}{}", " ".repeat(err.from), "^".repeat(width));
    } else {
        eprintln!("  at tokens {}..{}", err.from, err.to);
    }
}

fn print_tokens(source: &str) -> Result<()> {
    let mut symbols = compiler::seeded_symbols();
    let chars: Vec<char> = source.chars().collect();
    match compiler::tokenize(&mut symbols, &chars) {
        Ok(tokens) => {
            println!("{}", tokens_to_string(&tokens, &symbols));
            Ok(())
        }
        Err(err) => {
            report_error(source, &err);
            bail!("tokenization failed")
        }
    }
}

fn print_program(source: &str, json: bool) -> Result<()> {
    let compilation = compiler::compile_source(source);
    if json {
        let summary = match &compilation {
            Ok(c) => serde_json::json!({
                "status": "ok",
                "instructions": c.program.len(),
                "registers": c.program.register_count(),
            }),
            Err(err) => serde_json::json!({
                "status": "error",
                "message": err.to_string(),
                "error": err,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let compilation = match compilation {
        Ok(c) => c,
        Err(err) => {
            report_error(source, &err);
            bail!("compilation failed");
        }
    };
    print!("{}", compilation.program.dump(&compilation.symbols));
    println!(
        "; {} registers, last statement in {}",
        compilation.program.register_count(),
        compilation.symbols.name(compilation.result)
    );
    Ok(())
}

fn run_blocks(source: &str, input: Vec<f32>, blocks: usize, config: &Config) -> Result<()> {
    let compilation = match compiler::compile_source(source) {
        Ok(c) => c,
        Err(err) => {
            report_error(source, &err);
            bail!("compilation failed");
        }
    };
    let input = if input.is_empty() {
        vec![0.0; config.render.block_size]
    } else {
        input
    };

    let program = &compilation.program;
    let mut cpu = Cpu::new();
    cpu.set_program(program.instructions().to_vec());
    let mut output = vec![0.0f32; input.len()];
    for block in 0..blocks {
        cpu.execute_1_1_block(
            program.input_register(),
            program.output_register(),
            &input,
            &mut output,
        );
        let samples: Vec<String> = output.iter().map(|s| s.to_string()).collect();
        println!("block {}: {}", block, samples.join(", "));
    }
    print!("{}", cpu.dump_registers(&compilation.symbols));
    Ok(())
}

#[derive(Debug, Default)]
struct RenderStats {
    blocks: usize,
    samples: usize,
    peak: f32,
    sum_squares: f64,
}

/// Render loop: everything is allocated before the first block.
fn render_voices(
    mut voices: Vec<Voice>,
    total_samples: usize,
    block_size: usize,
    phase_increment: f32,
) -> RenderStats {
    let mut stats = RenderStats::default();
    let mut input = vec![0.0f32; block_size];
    let mut voice_output = vec![0.0f32; block_size];
    let mut mix = vec![0.0f32; block_size];
    let mut phase = 0.0f32;

    while stats.samples < total_samples {
        let len = block_size.min(total_samples - stats.samples);
        for sample in input[..len].iter_mut() {
            *sample = (phase * std::f32::consts::TAU).sin();
            phase = (phase + phase_increment).fract();
        }
        mix[..len].fill(0.0);
        for voice in voices.iter_mut() {
            voice.process_block(&input[..len], &mut voice_output[..len]);
            for (m, v) in mix[..len].iter_mut().zip(&voice_output[..len]) {
                *m += *v;
            }
        }
        for sample in &mix[..len] {
            stats.peak = stats.peak.max(sample.abs());
            stats.sum_squares += (*sample as f64) * (*sample as f64);
        }
        stats.samples += len;
        stats.blocks += 1;
    }
    stats
}

fn render(source: &str, seconds: f32, frequency: f32, config: &Config) -> Result<()> {
    let mut evaluator = Evaluator::new();
    if let Err(err) = evaluator.set_source(source) {
        report_error(source, &err);
        bail!("compilation failed");
    }

    let render_config = config.render.clone();
    let voices: Vec<Voice> = (0..render_config.voices)
        .map(|_| evaluator.create_voice())
        .collect();
    let total_samples = (seconds.max(0.0) * render_config.sample_rate as f32) as usize;
    let phase_increment = frequency / render_config.sample_rate as f32;

    let mut builder = ThreadBuilder::default().name("evaluator-render");
    if render_config.realtime_priority {
        builder = builder.priority(ThreadPriority::Max);
    }
    let handle = builder
        .spawn(move |priority| {
            if let Err(e) = priority {
                log_warn!("[!] Render thread: failed to set priority: {:?}", e);
            }
            render_voices(voices, total_samples, render_config.block_size, phase_increment)
        })
        .context("Unable to start render thread")?;

    let stats = match handle.join() {
        Ok(stats) => stats,
        Err(_) => bail!("render thread panicked"),
    };
    let rms = if stats.samples > 0 {
        (stats.sum_squares / stats.samples as f64).sqrt()
    } else {
        0.0
    };
    log_println!(
        "[+] Rendered {} samples in {} blocks ({} voice(s)): peak {:.4}, rms {:.4}",
        stats.samples,
        stats.blocks,
        config.render.voices,
        stats.peak,
        rms
    );
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    setup_logger(&cli, &config);
    log_info!("Evaluator {}", env!("CARGO_PKG_VERSION"));

    let source_or_default =
        |source: Option<String>| source.unwrap_or_else(|| config.formula.source.clone());

    match cli.command {
        Command::Tokens { source } => print_tokens(&source_or_default(source)),
        Command::Compile { source, json } => print_program(&source_or_default(source), json),
        Command::Run { source, input, blocks } => {
            run_blocks(&source_or_default(source), input, blocks, &config)
        }
        Command::Render { source, seconds, frequency } => {
            render(&source_or_default(source), seconds, frequency, &config)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log_fatal!("{:#}", e);
        exit(1);
    }
}

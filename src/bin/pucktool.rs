use clap::{Parser, Subcommand};
use puck_barcode::config::ScanConfig;
use puck_barcode::decoder::{correct, interpret};
use puck_barcode::detector::{GeometryTemplate, BUILTIN_TEMPLATES};
use puck_barcode::models::SymbolSize;
use puck_barcode::pipeline::Pipeline;
use puck_barcode::testing::PuckScene;
use puck_barcode::tools::{frame_stats, load_frame, DirectorySource};
use puck_barcode::scan_frame;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pucktool", version, about = "Puck barcode CLI tools")]
struct Cli {
    /// JSON scan configuration; PUCK_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interpret data codewords, optionally error-correcting a full symbol first
    DecodeCodewords {
        /// Symbol size as ROWSxCOLS; the codewords then include the redundancy
        #[arg(long)]
        size: Option<String>,
        codewords: Vec<u8>,
    },
    /// Scan one image and print the plate as JSON
    ScanImage {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        template: Option<String>,
    },
    /// Stream a directory of frames through the pipeline
    ScanDir {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        template: Option<String>,
    },
    /// Write a synthetic puck image
    Render {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "unipuck")]
        template: String,
        #[arg(long, default_value_t = 3)]
        module_px: usize,
        /// Slot text prefix; slot i reads "{prefix}{i:02}"
        #[arg(long, default_value = "S")]
        prefix: String,
        #[arg(long)]
        holder: Option<String>,
        /// Slots left without a pin
        #[arg(long)]
        empty: Vec<usize>,
        /// Slots covered by a smudge
        #[arg(long)]
        occlude: Vec<usize>,
    },
    /// List the built-in geometry templates
    Templates,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("PUCK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let ok = match cli.command {
        Command::DecodeCodewords { size, codewords } => decode_codewords_cmd(size.as_deref(), &codewords),
        Command::ScanImage { image, template } => scan_image_cmd(&image, with_template(config, template)),
        Command::ScanDir { root, template } => scan_dir_cmd(&root, with_template(config, template)),
        Command::Render {
            out,
            template,
            module_px,
            prefix,
            holder,
            empty,
            occlude,
        } => render_cmd(&out, &template, module_px, &prefix, holder.as_deref(), &empty, &occlude),
        Command::Templates => templates_cmd(),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => ScanConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn with_template(mut config: ScanConfig, template: Option<String>) -> ScanConfig {
    if let Some(template) = template {
        config.template = template;
    }
    config
}

fn parse_size(size: &str) -> Option<SymbolSize> {
    let (rows, cols) = size.split_once(['x', 'X'])?;
    SymbolSize::from_symbol(rows.trim().parse().ok()?, cols.trim().parse().ok()?)
}

fn decode_codewords_cmd(size: Option<&str>, codewords: &[u8]) -> bool {
    let data = match size {
        Some(size) => {
            let Some(size) = parse_size(size) else {
                eprintln!("Unknown symbol size: {}", size);
                return false;
            };
            match correct(codewords, size) {
                Ok(corrected) => {
                    println!("Corrected errors: {}", corrected.corrected_errors);
                    corrected.data
                }
                Err(err) => {
                    eprintln!("Error correction failed: {}", err);
                    return false;
                }
            }
        }
        None => codewords.to_vec(),
    };

    match interpret(&data) {
        Ok(text) => {
            println!("{}", text);
            true
        }
        Err(err) => {
            eprintln!("Interpretation failed: {}", err);
            false
        }
    }
}

fn scan_image_cmd(image: &Path, config: ScanConfig) -> bool {
    let frame = match load_frame(image) {
        Ok(frame) => frame,
        Err(err) => {
            eprintln!("Failed to load image {}: {}", image.display(), err);
            return false;
        }
    };
    let stats = frame_stats(&frame);
    eprintln!(
        "Image: {} ({}x{}) range {}-{}, average {}",
        image.display(),
        frame.width(),
        frame.height(),
        stats.min,
        stats.max,
        stats.avg
    );

    let start = Instant::now();
    let plate = match scan_frame(&frame, &config) {
        Ok(plate) => plate,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            return false;
        }
    };
    eprintln!("Scanned in {:.2?}", start.elapsed());

    let Some(plate) = plate else {
        eprintln!("No puck found");
        return false;
    };
    match serde_json::to_string_pretty(&plate) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(err) => {
            eprintln!("Failed to serialize plate: {}", err);
            false
        }
    }
}

fn scan_dir_cmd(root: &Path, config: ScanConfig) -> bool {
    let source = match DirectorySource::open(root) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", err);
            return false;
        }
    };
    let handle = match Pipeline::new(source, config).spawn() {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("Failed to start pipeline: {}", err);
            return false;
        }
    };

    for result in handle.results().iter() {
        let plate = &result.plate;
        println!(
            "frame {:>5}  plate {:>3}  {}/{} valid  holder={}",
            result.frame_number,
            plate.id(),
            plate.num_valid_barcodes(),
            plate.num_slots(),
            plate.holder().state.text().unwrap_or("-")
        );
        for (i, barcode) in plate.barcodes().iter().enumerate() {
            println!("  [{:>2}] {}", i, barcode.unwrap_or("-"));
        }
    }

    match handle.join() {
        Ok(stats) => {
            println!(
                "Frames: read={} queued={} dropped={} processed={} aligned={} results={}",
                stats.capture.frames_read,
                stats.capture.frames_queued,
                stats.capture.dropped_full + stats.capture.dropped_rate,
                stats.decode.frames_processed,
                stats.decode.frames_aligned,
                stats.decode.results_emitted
            );
            true
        }
        Err(err) => {
            eprintln!("Pipeline failed: {}", err);
            false
        }
    }
}

fn render_cmd(
    out: &Path,
    template: &str,
    module_px: usize,
    prefix: &str,
    holder: Option<&str>,
    empty: &[usize],
    occlude: &[usize],
) -> bool {
    let template = match GeometryTemplate::resolve(template) {
        Ok(template) => template,
        Err(err) => {
            eprintln!("{}", err);
            return false;
        }
    };

    let mut scene = PuckScene::new(template, module_px).with_all_slots(prefix);
    if let Some(holder) = holder {
        scene = scene.with_holder(holder);
    }
    for &index in empty {
        scene = scene.without_slot(index);
    }
    for &index in occlude {
        scene = scene.occlude_slot(index);
    }

    let frame = match scene.try_render() {
        Ok(frame) => frame,
        Err(err) => {
            eprintln!("Cannot render scene: {}", err);
            return false;
        }
    };
    match frame.image().save(out) {
        Ok(()) => {
            println!("Wrote {} ({}x{})", out.display(), frame.width(), frame.height());
            true
        }
        Err(err) => {
            eprintln!("Failed to write {}: {}", out.display(), err);
            false
        }
    }
}

fn templates_cmd() -> bool {
    for name in BUILTIN_TEMPLATES {
        let Ok(template) = GeometryTemplate::builtin(name) else {
            continue;
        };
        println!(
            "{}: {} slots, {}x{} symbols, holder barcode {}",
            template.name,
            template.slot_count(),
            template.symbol.rows(),
            template.symbol.cols(),
            if template.holder.is_some() { "yes" } else { "no" }
        );
        if let Ok(json) = serde_json::to_string(&template) {
            println!("  {}", json);
        }
    }
    true
}

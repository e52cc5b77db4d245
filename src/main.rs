//! resume – command-line front end for resume-forge.
//!
//! Usage:
//!   resume templates
//!   resume preview  [output.html] [--store DIR] [--template N]
//!   resume export   [output_dir]  [--store DIR] [--template N] [--dump-layout FILE]
//!   resume generate <prompt...>   [--store DIR]
//!
//! The resume is read from `<DIR>/resumeData.json` (default: current
//! directory). `generate` writes the merged result back to the same file.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::{env, fs, process};

use anyhow::{bail, Context};
use async_trait::async_trait;

use resume_forge::ai::{generate_into, OpenRouterBackend, EMPTY_PROMPT_NOTICE};
use resume_forge::catalog::TEMPLATES;
use resume_forge::pipeline::{capture_layout, prepare_clone};
use resume_forge::storage::{self, FileStore};
use resume_forge::templates::page_html;
use resume_forge::{
    AiConfig, EditingSession, ExportConfig, ExportError, ExportHost, ExportOrchestrator, ExportOutcome,
    Exporter, ResumeDocument,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

struct Options {
    positional: Vec<String>,
    store: PathBuf,
    template: Option<u32>,
    dump_layout: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> anyhow::Result<Options> {
    let mut opts = Options {
        positional: Vec::new(),
        store: PathBuf::from("."),
        template: None,
        dump_layout: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--store" | "-s" => {
                opts.store = PathBuf::from(iter.next().context("--store needs a directory")?);
            }
            "--template" | "-t" => {
                let v = iter.next().context("--template needs a number")?;
                opts.template = Some(v.parse::<u32>().with_context(|| format!("bad template id {v:?}"))?);
            }
            "--dump-layout" => {
                opts.dump_layout = Some(PathBuf::from(iter.next().context("--dump-layout needs a path")?));
            }
            other if other.starts_with('-') => bail!("unknown flag: {other}"),
            value => opts.positional.push(value.to_string()),
        }
    }
    Ok(opts)
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let prog = args.first().map(String::as_str).unwrap_or("resume");
    let Some(command) = args.get(1) else {
        print_usage(prog);
        process::exit(1);
    };
    if matches!(command.as_str(), "--help" | "-h" | "help") {
        print_usage(prog);
        return Ok(());
    }
    let opts = parse_options(&args[2..])?;

    match command.as_str() {
        "templates" => {
            for t in TEMPLATES {
                let photo = if t.supports_photo { ", photo" } else { "" };
                println!("{:>2}  {:<12} {:<8} {}{photo}", t.id, t.name, t.accent_color, t.tagline);
            }
            Ok(())
        }
        "preview" => preview(&opts),
        "export" => export(&opts).await,
        "generate" => generate(&opts).await,
        other => {
            print_usage(prog);
            bail!("unknown command: {other}")
        }
    }
}

fn load_session(opts: &Options) -> anyhow::Result<EditingSession> {
    let store = FileStore::new(&opts.store);
    let mut doc = ResumeDocument::default();
    let found = storage::load_into(&store, &mut doc)
        .with_context(|| format!("reading saved resume in {}", opts.store.display()))?;
    if !found {
        log::info!("no saved resume in {}, starting blank", opts.store.display());
    }
    let mut session = EditingSession::from_document(doc);
    if let Some(id) = opts.template {
        session.select_template(id);
    }
    Ok(session)
}

fn preview(opts: &Options) -> anyhow::Result<()> {
    let session = load_session(opts)?;
    let output = opts
        .positional
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("resume-preview.html"));
    let title = session.document().full_name().to_string();
    write_file(&output, page_html(&session.render_page(), &title).as_bytes())?;
    eprintln!("Wrote '{}'", output.display());
    Ok(())
}

async fn export(opts: &Options) -> anyhow::Result<()> {
    let session = load_session(opts)?;
    let out_dir = opts.positional.first().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let exporter = Exporter::new(ExportConfig::from_env());

    if let Some(path) = &opts.dump_layout {
        let config = exporter.config();
        let page = session.render_page();
        let target = page
            .find_by_id(&config.print_target_id)
            .context("rendered page has no print target")?;
        let layout = capture_layout(&prepare_clone(target, config), config, exporter.fonts())?;
        write_file(path, layout.to_json()?.as_bytes())?;
        eprintln!("Wrote capture layout to '{}'", path.display());
    }

    let host = CliHost {
        out_dir,
        preview_html: page_html(&session.render_page(), session.document().full_name()),
    };
    let orchestrator = ExportOrchestrator::new(exporter);
    match orchestrator.on_download_requested(&session, &host).await {
        ExportOutcome::Saved(report) => {
            let pages = report.page_count;
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                host.out_dir.join(&report.filename).display(),
                report.bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
            Ok(())
        }
        ExportOutcome::NeedsContent => bail!("nothing to export"),
        ExportOutcome::AlreadyRunning => bail!("an export is already running"),
        ExportOutcome::FellBackToPrint | ExportOutcome::Declined => bail!("export failed"),
    }
}

async fn generate(opts: &Options) -> anyhow::Result<()> {
    let prompt = opts.positional.join(" ");
    if prompt.trim().is_empty() {
        bail!("{EMPTY_PROMPT_NOTICE}");
    }
    let config = AiConfig::from_env()?;
    let backends = OpenRouterBackend::chain(&config)?;

    let mut session = load_session(opts)?;
    if generate_into(session.document_mut(), &backends, &prompt, config.timeout).await {
        let store = FileStore::new(&opts.store);
        storage::save(&store, session.document())?;
        eprintln!("Updated resume in '{}'", store.dir().display());
    } else {
        // Generation failures are only logged; run with RUST_LOG=error to see them.
        eprintln!("No changes made.");
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("writing '{}'", path.display()))
}

/// Terminal stand-in for the browser page: saves into a directory, asks
/// yes/no on stdin and "prints" by writing an HTML page to open and print.
struct CliHost {
    out_dir: PathBuf,
    preview_html: String,
}

#[async_trait]
impl ExportHost for CliHost {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let path = self.out_dir.join(filename);
        write_file(&path, bytes).map_err(|e| ExportError::Save(format!("{e:#}")))
    }

    fn set_busy(&self, busy: bool) {
        log::debug!("download control {}", if busy { "busy" } else { "ready" });
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn confirm(&self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }

    fn native_print(&self) {
        let path = self.out_dir.join("resume-print.html");
        match write_file(&path, self.preview_html.as_bytes()) {
            Ok(()) => eprintln!("Open '{}' in a browser and print it to PDF.", path.display()),
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("resume – resume renderer with PDF export (resume-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} templates");
    eprintln!("  {prog} preview  [output.html] [--store DIR] [--template N]");
    eprintln!("  {prog} export   [output_dir]  [--store DIR] [--template N] [--dump-layout FILE]");
    eprintln!("  {prog} generate <prompt...>   [--store DIR]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --store, -s      Directory holding resumeData.json (default: .)");
    eprintln!("  --template, -t   Template id 1-6 (default: saved or 1)");
    eprintln!("  --dump-layout    Write the frozen capture layout as JSON");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RESUME_FONT            TrueType face used for text");
    eprintln!("  RESUME_SETTLE_MS       Delay before capture (default 500)");
    eprintln!("  OPENROUTER_API_KEY     Required by `generate`");
    eprintln!("  RESUME_AI_MODELS       Comma-separated model list");
    eprintln!("  RESUME_AI_TIMEOUT_SECS Per-model timeout (default 60)");
}

//! One function per subcommand. Each runs a scan, an analysis pass and
//! hands the resulting report to the selected output format.

use crate::cli::{ApplyArgs, Cli, Commands, HashArgs, OutputFormat, ScanArgs};
use crate::render;
use anyhow::{Context as _, Result};
use chrono::Local;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tidysleuth_core::actions::{
    execute, plan_dedupe, plan_organize, prune_empty_dirs, undo, DedupeMode, Journal,
    OrganizeMode, Plan,
};
use tidysleuth_core::analysis::{
    categorize_tree, find_duplicates, find_name_variants, rank_groups, DuplicateOptions,
    DuplicateScan,
};
use tidysleuth_core::report::{
    self, CategoryReport, DuplicateReport, ReportFormat, ScanReport, VariantReport,
};
use tidysleuth_core::scanner::{self, ScanOptions, ScanSummary};
use tidysleuth_core::Config;
use tracing::{info, warn};

impl OutputFormat {
    fn report_format(self) -> Option<ReportFormat> {
        match self {
            Self::Text => None,
            Self::Json => Some(ReportFormat::Json),
            Self::Csv => Some(ReportFormat::Csv),
            Self::Markdown => Some(ReportFormat::Markdown),
        }
    }
}

/// Settings shared by every subcommand.
struct Context {
    config: Config,
    config_source: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
}

impl Context {
    fn writer(&self) -> Result<Box<dyn Write>> {
        Ok(match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout().lock()),
        })
    }

    /// Write a report as text or in the selected structured format.
    fn emit(
        &self,
        text: impl FnOnce(&mut dyn Write) -> io::Result<()>,
        structured: impl FnOnce(&mut dyn Write, ReportFormat) -> tidysleuth_core::Result<()>,
    ) -> Result<()> {
        let mut out = self.writer()?;
        match self.format.report_format() {
            None => text(&mut *out)?,
            Some(format) => structured(&mut *out, format)?,
        }
        out.flush()?;
        if let Some(path) = &self.output {
            info!("report written to {}", path.display());
        }
        Ok(())
    }

    fn scan_options(&self, args: &ScanArgs) -> ScanOptions {
        let mut options = self.config.scan.clone();
        options.exclude.extend(args.exclude.iter().cloned());
        if args.hidden {
            options.include_hidden = true;
        }
        if args.max_depth.is_some() {
            options.max_depth = args.max_depth;
        }
        options
    }

    fn duplicate_options(&self, args: &HashArgs) -> DuplicateOptions {
        let mut options = self.config.duplicates.clone();
        if let Some(algorithm) = args.algorithm {
            options.algorithm = algorithm.into();
        }
        if let Some(min_size) = args.min_size {
            options.min_size = min_size;
        }
        options
    }
}

/// A finished scan plus the cancel flag wired to Ctrl-C, which later
/// analysis passes keep honouring.
struct ScanRun {
    summary: ScanSummary,
    cancel: Arc<AtomicBool>,
}

fn run_scan(ctx: &Context, args: &ScanArgs) -> Result<ScanRun> {
    let handle = scanner::start_scan(args.roots.clone(), ctx.scan_options(args))?;
    let cancel = handle.cancel_flag();

    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("cannot install Ctrl-C handler: {e}");
    }

    let summary = handle.wait()?;
    info!(
        files = summary.tree.file_count(),
        errors = summary.error_count,
        "scanned in {:?}",
        summary.duration
    );
    Ok(ScanRun { summary, cancel })
}

fn ranked_duplicates(ctx: &Context, run: &ScanRun, args: &HashArgs) -> Result<DuplicateScan> {
    let options = ctx.duplicate_options(args);
    let mut scan = find_duplicates(&run.summary.tree, &options, &run.cancel)?;
    rank_groups(&mut scan.groups, &ctx.config.keeper);
    Ok(scan)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("cannot determine working directory")?
            .join(path))
    }
}

fn stamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Save the journal of an applied plan and say how to reverse it.
fn save_journal(journal: &Journal, path: &Path) -> Result<()> {
    journal.save(path)?;
    info!("undo with: tidysleuth undo --apply {}", path.display());
    Ok(())
}

fn emit_journal(ctx: &Context, journal: &Journal) -> Result<()> {
    ctx.emit(
        |out| render::journal(out, journal),
        |out, format| report::write_journal(out, journal, format),
    )
}

pub fn run(cli: Cli) -> Result<()> {
    let (config, config_source) = Config::load(cli.config.as_deref())?;
    let ctx = Context {
        config,
        config_source,
        format: cli.format,
        output: cli.output,
    };

    match cli.command {
        Commands::Scan(args) => scan(&ctx, &args),
        Commands::Dupes { scan, hash } => dupes(&ctx, &scan, &hash),
        Commands::Dedupe {
            scan,
            hash,
            quarantine,
            delete,
            apply,
        } => dedupe(&ctx, &scan, &hash, quarantine, delete, &apply),
        Commands::Variants(args) => variants(&ctx, &args),
        Commands::Categorize(args) => categorize(&ctx, &args),
        Commands::Organize {
            scan,
            dest,
            copy,
            apply,
        } => organize(&ctx, &scan, &dest, copy, &apply),
        Commands::Undo { journal, apply } => undo_journal(&ctx, &journal, apply),
        Commands::Config => print_config(&ctx),
    }
}

fn scan(ctx: &Context, args: &ScanArgs) -> Result<()> {
    let run = run_scan(ctx, args)?;
    let scan_report = ScanReport::new(&run.summary);
    ctx.emit(
        |out| render::scan(out, &scan_report),
        |out, format| report::write_scan(out, &scan_report, format),
    )
}

fn dupes(ctx: &Context, args: &ScanArgs, hash: &HashArgs) -> Result<()> {
    let run = run_scan(ctx, args)?;
    let duplicates = ranked_duplicates(ctx, &run, hash)?;
    let dupe_report = DuplicateReport::new(&duplicates);
    ctx.emit(
        |out| render::duplicates(out, &dupe_report),
        |out, format| report::write_duplicates(out, &dupe_report, format),
    )
}

fn dedupe(
    ctx: &Context,
    args: &ScanArgs,
    hash: &HashArgs,
    quarantine: Option<PathBuf>,
    delete: bool,
    apply: &ApplyArgs,
) -> Result<()> {
    let run = run_scan(ctx, args)?;
    let duplicates = ranked_duplicates(ctx, &run, hash)?;

    let mode = if delete {
        DedupeMode::Delete
    } else {
        let dir = match quarantine {
            Some(dir) => absolute(&dir)?,
            None => absolute(Path::new(&format!("tidysleuth-quarantine-{}", stamp())))?,
        };
        DedupeMode::Quarantine(dir)
    };

    let plan = plan_dedupe(&duplicates.groups, &mode);
    let journal = apply_plan(&plan, apply, &run.summary.tree.root_paths);

    if apply.apply && !plan.is_empty() {
        let path = match (apply.journal.clone(), &mode) {
            (Some(path), _) => path,
            (None, DedupeMode::Quarantine(dir)) => dir.join("journal.json"),
            (None, DedupeMode::Delete) => PathBuf::from(format!("tidysleuth-journal-{}.json", stamp())),
        };
        save_journal(&journal, &path)?;
    }
    emit_journal(ctx, &journal)
}

fn variants(ctx: &Context, args: &ScanArgs) -> Result<()> {
    let run = run_scan(ctx, args)?;
    let groups = find_name_variants(&run.summary.tree);
    let variant_report = VariantReport::new(&groups);
    ctx.emit(
        |out| render::variants(out, &variant_report),
        |out, format| report::write_variants(out, &variant_report, format),
    )
}

fn categorize(ctx: &Context, args: &ScanArgs) -> Result<()> {
    let run = run_scan(ctx, args)?;
    let files = categorize_tree(&run.summary.tree, &ctx.config.categories);
    let category_report = CategoryReport::new(&files);
    ctx.emit(
        |out| render::categories(out, &category_report),
        |out, format| report::write_categories(out, &category_report, format),
    )
}

fn organize(
    ctx: &Context,
    args: &ScanArgs,
    dest: &Path,
    copy: bool,
    apply: &ApplyArgs,
) -> Result<()> {
    let run = run_scan(ctx, args)?;
    let files = categorize_tree(&run.summary.tree, &ctx.config.categories);
    let dest = absolute(dest)?;
    let mode = if copy {
        OrganizeMode::Copy
    } else {
        OrganizeMode::Move
    };

    let plan = plan_organize(&files, &dest, mode);
    let journal = apply_plan(&plan, apply, &run.summary.tree.root_paths);

    if apply.apply && !plan.is_empty() {
        let path = apply
            .journal
            .clone()
            .unwrap_or_else(|| dest.join(format!(".tidysleuth-journal-{}.json", stamp())));
        save_journal(&journal, &path)?;
    }
    emit_journal(ctx, &journal)
}

/// Execute (or preview) `plan`, then prune emptied directories if asked.
fn apply_plan(plan: &Plan, apply: &ApplyArgs, roots: &[PathBuf]) -> Journal {
    let mut journal = execute(plan, !apply.apply);
    if apply.prune_empty {
        prune_empty_dirs(&mut journal, roots);
    }
    journal
}

fn undo_journal(ctx: &Context, path: &Path, apply: bool) -> Result<()> {
    let journal = Journal::load(path)?;
    let reversed = undo(&journal, !apply)
        .with_context(|| format!("cannot undo {}", path.display()))?;
    emit_journal(ctx, &reversed)
}

fn print_config(ctx: &Context) -> Result<()> {
    let mut out = ctx.writer()?;
    match ctx.format {
        OutputFormat::Json => report::json::write(&mut out, &ctx.config)?,
        _ => {
            match &ctx.config_source {
                Some(path) => writeln!(out, "# loaded from {}", path.display())?,
                None => writeln!(out, "# built-in defaults")?,
            }
            out.write_all(ctx.config.to_toml()?.as_bytes())?;
        }
    }
    out.flush()?;
    Ok(())
}

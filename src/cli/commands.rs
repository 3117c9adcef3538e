//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{print_error, print_header, print_info, print_success, print_warning, ScanProgressBar};
use crate::cli::{Args, Commands};
use crate::core::config::{ensure_config_dir, init_config, Config};
use crate::duplicate::{self, DuplicateIndex};
use crate::fingerprint::{Algorithm, Fingerprint, Fingerprinter, MeanFingerprint, PatchFingerprint};
use crate::loader;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Commands::Scan {
            folders,
            fresh,
            no_recursive,
            no_save,
        } => scan_folders(config, folders, *fresh, *no_recursive, *no_save, &shutdown_flag),
        Commands::Hash { files } => {
            hash_files(files);
            Ok(())
        }
        Commands::Add { file, key } => add_file(config, file, *key),
        Commands::Groups { json } => show_groups(config, *json),
        Commands::Lookup { fingerprint } => lookup(config, *fingerprint),
        Commands::Remove {
            fingerprint,
            identity,
        } => remove(config, *fingerprint, identity.as_deref()),
        Commands::Stats => show_stats(config),
        Commands::Clear => clear(config),
        Commands::ShowConfig => {
            show_config(config);
            Ok(())
        }
        Commands::GenerateConfig { output, current } => {
            if *current {
                save_current_config(config, output.clone())
            } else {
                generate_config_file(output.clone())
            }
        }
    }
}

/// Load the snapshot if it exists, otherwise start empty
pub fn open_index(config: &Config) -> Result<DuplicateIndex> {
    let mut index = config.index.new_index();
    let snapshot = &config.index.snapshot_file;

    if snapshot.exists() {
        index
            .load_snapshot(snapshot)
            .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;

        // Mean fingerprints never exceed 255
        if config.index.algorithm == Algorithm::Mean && index.iter().any(|(fp, _)| fp > 255) {
            warn!(
                "Snapshot {} holds keys above 255; it was probably built with the patch algorithm",
                snapshot.display()
            );
        }
    } else {
        info!("No snapshot at {}, starting with an empty index", snapshot.display());
    }

    Ok(index)
}

/// Save the snapshot when autosave is enabled
fn persist(config: &Config, index: &DuplicateIndex) -> Result<()> {
    if !config.index.autosave {
        info!("Autosave disabled, snapshot not written");
        return Ok(());
    }

    index
        .save_snapshot(&config.index.snapshot_file)
        .with_context(|| {
            format!(
                "Failed to save snapshot {}",
                config.index.snapshot_file.display()
            )
        })?;
    Ok(())
}

fn scan_folders(
    config: &Config,
    folders: &[PathBuf],
    fresh: bool,
    no_recursive: bool,
    no_save: bool,
    shutdown_flag: &AtomicBool,
) -> Result<()> {
    let mut index = if fresh {
        config.index.new_index()
    } else {
        open_index(config)?
    };

    let mut options = config.scan.to_scan_options();
    if no_recursive {
        options.recursive = false;
    }

    print_header(&format!(
        "Scanning {} folder(s) [{} / {}]",
        folders.len(),
        index.algorithm(),
        index.policy()
    ));

    let bar = ScanProgressBar::new();
    let report = duplicate::build_index(&mut index, folders, &options, shutdown_flag, |p| {
        bar.update(&p)
    })?;
    bar.finish();

    if report.interrupted {
        print_warning("Scan interrupted; nothing was added and the snapshot was not written");
        return Ok(());
    }

    print_success(&format!(
        "{} files: {} added, {} already indexed, {} skipped, {} rejected ({} ms)",
        report.files_seen,
        report.inserted,
        report.already_present,
        report.skipped,
        report.rejected,
        report.elapsed_ms
    ));

    print_groups(&index);

    if !no_save {
        persist(config, &index)?;
    }

    Ok(())
}

fn hash_files(files: &[PathBuf]) {
    for file in files {
        match fingerprint_both(file) {
            Ok((patch, mean)) => println!(
                "{}  patch={:5} (0x{:04x} {:016b})  mean={:3}",
                file.display(),
                patch,
                patch,
                patch,
                mean
            ),
            Err(e) => {
                error!("{}", e);
                print_error(&format!("{}: {}", file.display(), e));
            }
        }
    }
}

fn fingerprint_both(file: &Path) -> Result<(Fingerprint, Fingerprint)> {
    let buffer = loader::load_pixels(file)?;
    let patch = PatchFingerprint.fingerprint(&buffer)?;
    let mean = MeanFingerprint.fingerprint(&buffer)?;
    Ok((patch, mean))
}

fn add_file(config: &Config, file: &Path, key: Option<Fingerprint>) -> Result<()> {
    let mut index = open_index(config)?;
    let buffer = loader::load_pixels(file)?;
    let identity = buffer.identity().to_string();

    let fingerprint = index
        .insert_with_key(identity.clone(), key, &buffer)
        .with_context(|| format!("Failed to add {}", identity))?;

    let group = index.lookup(fingerprint)?;
    print_success(&format!("{} -> {}", identity, fingerprint));
    if group.len() > 1 {
        print_warning(&format!("Duplicate of: {}", group.join(", ")));
    }

    persist(config, &index)
}

fn print_groups(index: &DuplicateIndex) {
    let groups = index.duplicate_groups();
    if groups.is_empty() {
        print_info("No duplicates found");
        return;
    }

    print_info(&format!("{} duplicate group(s):", groups.len()));
    for (fingerprint, identities) in &groups {
        println!();
        println!("  [{}] {} files", fingerprint, identities.len());
        for identity in identities {
            println!("      {}", identity);
        }
    }
    println!();
}

fn show_groups(config: &Config, json: bool) -> Result<()> {
    let index = open_index(config)?;

    if json {
        let groups = index.duplicate_groups();
        println!("{}", duplicate::snapshot::encode(&groups)?);
    } else {
        print_groups(&index);
    }

    Ok(())
}

fn lookup(config: &Config, fingerprint: Fingerprint) -> Result<()> {
    let index = open_index(config)?;
    for identity in index.lookup(fingerprint)? {
        println!("{}", identity);
    }
    Ok(())
}

fn remove(config: &Config, fingerprint: Fingerprint, identity: Option<&str>) -> Result<()> {
    let mut index = open_index(config)?;
    index.remove(fingerprint, identity)?;

    match identity {
        Some(id) => print_success(&format!("Removed '{}' from {}", id, fingerprint)),
        None => print_success(&format!("Removed fingerprint {}", fingerprint)),
    }

    persist(config, &index)
}

fn show_stats(config: &Config) -> Result<()> {
    let index = open_index(config)?;
    let stats = index.stats();

    print_header("Index Statistics");
    print_info(&format!("Snapshot:             {}", config.index.snapshot_file.display()));
    print_info(&format!("Algorithm:            {}", index.algorithm()));
    print_info(&format!("Duplicate policy:     {}", index.policy()));
    print_info(&format!("Fingerprints:         {}", stats.unique_fingerprints));
    print_info(&format!("Files:                {}", stats.total_identities));
    print_info(&format!("Duplicate groups:     {}", stats.duplicate_groups));
    print_info(&format!("Redundant files:      {}", stats.duplicate_identities));

    Ok(())
}

fn clear(config: &Config) -> Result<()> {
    let mut index = open_index(config)?;
    let removed = index.len();
    index.clear();
    print_success(&format!("Cleared {} fingerprints", removed));
    persist(config, &index)
}

/// Generate a configuration file at the given path or the standard location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let output_path = match output {
        Some(path) => {
            fs::write(&path, Config::generate_default_config())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path
        }
        None => init_config()?,
    };

    info!("Configuration file: {}", output_path.display());
    info!("Edit this file to customize algorithm, policy and scan settings.");

    Ok(())
}

/// Write the active configuration, overrides included, as TOML
pub fn save_current_config(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let output_path = match output {
        Some(path) => path,
        None => ensure_config_dir()?.join("config.toml"),
    };

    config
        .save(&output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("Configuration written to {}", output_path.display());
    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("[index]");
    info!("  algorithm = \"{}\"", config.index.algorithm);
    info!("  duplicate_policy = \"{}\"", config.index.duplicate_policy);
    info!(
        "  snapshot_file = \"{}\"",
        config.index.snapshot_file.display()
    );
    info!("  autosave = {}", config.index.autosave);
    info!("");
    info!("[scan]");
    info!("  recursive = {}", config.scan.recursive);
    info!("  follow_symlinks = {}", config.scan.follow_symlinks);
    info!("  extensions = {:?}", config.scan.extensions);
    info!("  skip_unreadable = {}", config.scan.skip_unreadable);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
    info!("");
    info!(
        "Available algorithms: {}",
        Algorithm::ALL.map(|a| a.as_str()).join(", ")
    );
}

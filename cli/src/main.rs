mod prompt;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use mbrkit_core::describe;
use mbrkit_core::install::{backup_to_sector, read_backup_sector, restore_backup};
use mbrkit_core::track::{summarize_first_track, SectorKind, FIRST_TRACK_SECTORS};
use mbrkit_core::{
    decode_existing, scan, Configuration, DeviceManager, DiscoveredPartition, InstallManager,
    SectorDevice, Template,
};
use mbrkit_platform::{
    has_raw_disk_access, read_sector_file, write_sector_file, AccessMode, FileDisk,
    PlatformDeviceManager,
};
use prompt::{confirm, TerminalPrompt};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "mbrkit")]
#[command(version, about = "Boot menu loader for the master boot record", long_about = None)]
struct Cli {
    /// Log every decoded field and scan step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SectorSource {
    /// Backup file holding exactly one sector
    #[arg(short, long, conflicts_with = "sector")]
    input: Option<PathBuf>,
    /// Sector number on the same disk
    #[arg(short, long)]
    sector: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available disks
    List,
    /// Show the partitions found on a disk
    Scan {
        /// Disk device or image file
        device: String,
        /// Mark partitions already in the installed boot menu
        #[arg(short, long)]
        template: Option<PathBuf>,
    },
    /// Decode the boot loader installed on a disk
    Show {
        device: String,
        #[arg(short, long)]
        template: PathBuf,
        /// Print the configuration as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the boot menu text for a configuration
    Menu {
        #[arg(short, long)]
        config: PathBuf,
        /// Check offsets against the partitions of this disk
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Write the boot loader to a disk
    Install {
        device: String,
        #[arg(short, long)]
        template: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        /// Target sector, 0 is the MBR
        #[arg(short, long, default_value_t = 0)]
        sector: u64,
        /// Save the prepared sector to a file instead of the disk
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Save the installed configuration as editable JSON
    Export {
        device: String,
        #[arg(short, long)]
        template: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Copy the MBR to a file or to another sector
    Backup {
        device: String,
        /// Backup file, a dated name is used when neither target is given
        #[arg(short, long, conflicts_with = "sector")]
        output: Option<PathBuf>,
        #[arg(short, long)]
        sector: Option<u64>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Restore the MBR from a backup, asking about every conflict
    Restore {
        device: String,
        #[command(flatten)]
        source: SectorSource,
    },
    /// List blank and signed sectors on the first track
    FirstTrack { device: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::List => list_devices(),
        Commands::Scan { device, template } => scan_device(&device, template.as_deref()),
        Commands::Show {
            device,
            template,
            json,
        } => show_installed(&device, &template, json),
        Commands::Menu { config, device } => render_menu(&config, device.as_deref()),
        Commands::Install {
            device,
            template,
            config,
            sector,
            output,
            yes,
        } => install(&device, &template, &config, sector, output.as_deref(), yes),
        Commands::Export {
            device,
            template,
            output,
        } => {
            let template = load_template(&template)?;
            let mut disk = open_disk(&device, AccessMode::ReadOnly)?;
            let report = decode_existing(&mut disk, &template)
                .context("No boot loader found to export")?;
            report
                .configuration
                .to_json_file(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Configuration saved to {}", output.display());
            Ok(())
        }
        Commands::Backup {
            device,
            output,
            sector,
            yes,
        } => backup(&device, output, sector, yes),
        Commands::Restore { device, source } => restore(&device, &source),
        Commands::FirstTrack { device } => {
            let mut disk = open_disk(&device, AccessMode::ReadOnly)?;
            let blank = summarize_first_track(&mut disk, SectorKind::Blank)?;
            let signed = summarize_first_track(&mut disk, SectorKind::Signed)?;
            println!("Blank sectors:  {}", if blank.is_empty() { "none" } else { blank.as_str() });
            println!("Signed sectors: {}", if signed.is_empty() { "none" } else { signed.as_str() });
            Ok(())
        }
    }
}

/// Accepts a path, or a name as shown by `list`.
fn resolve_device(device: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(device);
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    match PlatformDeviceManager.get_device_by_id(device)? {
        Some(found) => Ok(PathBuf::from(found.id)),
        None => bail!("Device not found: {}. Use 'mbrkit list' to see available disks.", device),
    }
}

fn open_disk(device: &str, mode: AccessMode) -> anyhow::Result<FileDisk> {
    let path = resolve_device(device)?;
    if mode == AccessMode::ReadWrite && !has_raw_disk_access() {
        warn!("Writing to disks usually requires root privileges");
    }
    FileDisk::open(&path, mode).with_context(|| format!("Cannot open {}", path.display()))
}

fn load_template(path: &Path) -> anyhow::Result<Template> {
    Template::load(path)
        .with_context(|| format!("Cannot load boot loader template {}", path.display()))
}

/// Partitions of `disk`, or none when its partition table cannot be walked.
fn scan_or_empty<D: SectorDevice>(disk: &mut D) -> Vec<DiscoveredPartition> {
    match scan(disk) {
        Ok(report) => report.partitions,
        Err(e) => {
            warn!("Partition table cannot be read: {}", e);
            vec![]
        }
    }
}

fn list_devices() -> anyhow::Result<()> {
    let devices = PlatformDeviceManager.enumerate_devices()?;
    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }
    println!("Available devices:\n");
    for device in devices {
        println!("Device: {}", device.name);
        println!("  Path: {}", device.id);
        println!("  Size: {:.2} GB", device.size as f64 / 1_073_741_824.0);
        println!("  Type: {:?}", device.device_type);
        println!("  Removable: {}", if device.is_removable { "Yes" } else { "No" });
        println!("  System: {}", if device.is_system { "Yes" } else { "No" });
        if !device.mount_points.is_empty() {
            println!("  Mounted at: {:?}", device.mount_points);
        }
        println!();
    }
    Ok(())
}

fn scan_device(device: &str, template: Option<&Path>) -> anyhow::Result<()> {
    let mut disk = open_disk(device, AccessMode::ReadOnly)?;
    let report = scan(&mut disk).context("Cannot read the partition table")?;

    let config = match template {
        Some(path) => {
            let template = load_template(path)?;
            match decode_existing(&mut disk, &template) {
                Ok(report) => report.configuration,
                Err(e) => {
                    debug!("No installed boot loader: {}", e);
                    Configuration::default()
                }
            }
        }
        None => Configuration::default(),
    };

    if report.partitions.is_empty() {
        println!("No partitions have been found.");
    }
    for partition in &report.partitions {
        println!(
            "{:>10}  {}",
            partition.relative_sector_offset,
            describe::available_partition(partition, &config)
        );
    }
    println!("{:>10}  {}", "", describe::skip_boot_option(&config));
    println!("{:>10}  {}", "", describe::next_disk_option(&config));
    for warning in &report.warnings {
        println!("Warning: {:?}", warning);
    }
    Ok(())
}

fn print_entries(config: &Configuration, partitions: &[DiscoveredPartition]) {
    for index in 0..config.bootable_partitions.len() {
        if let Some(line) = describe::bootable_entry(config, index, partitions) {
            println!("{}. {}", index + 1, line);
        }
    }
    if config.default_partition.is_none() {
        println!("Default partition is what was booted last.");
    }
}

fn show_installed(device: &str, template: &Path, json: bool) -> anyhow::Result<()> {
    let template = load_template(template)?;
    let mut disk = open_disk(device, AccessMode::ReadOnly)?;
    let report = decode_existing(&mut disk, &template)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.configuration)?);
        return Ok(());
    }

    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    let config = &report.configuration;
    let partitions = scan_or_empty(&mut disk);
    print_entries(config, &partitions);
    println!();
    println!("Timer key:      {}", config.timer_interrupt_key.name());
    println!("Key mode:       {:?}", config.key_mode());
    println!(
        "Timed boot:     {:?}, {} s",
        config.timed_boot.mode,
        config.timed_boot.timeout_seconds()
    );
    println!("Progress bar:   {:?}", config.progress_bar);
    println!("Hide others:    {}", config.hide_other_primary_partitions);
    println!("Mark active:    {}", config.mark_active_partition);
    println!("\nBoot menu text:\n{}", config.boot_menu_text.replace('\r', ""));
    Ok(())
}

fn render_menu(config_path: &Path, device: Option<&str>) -> anyhow::Result<()> {
    let mut config = Configuration::from_json_file(config_path)
        .with_context(|| format!("Cannot load configuration {}", config_path.display()))?;
    config.validate()?;

    let partitions = match device {
        Some(device) => scan_or_empty(&mut open_disk(device, AccessMode::ReadOnly)?),
        None => vec![],
    };
    let slack = config.regenerate_menu_text(&partitions);
    print_entries(&config, &partitions);
    println!("\n{}", config.boot_menu_text.replace('\r', ""));
    println!("\nFree bytes: {}", slack);
    Ok(())
}

fn install(
    device: &str,
    template: &Path,
    config_path: &Path,
    sector: u64,
    output: Option<&Path>,
    yes: bool,
) -> anyhow::Result<()> {
    let template = load_template(template)?;
    let mut config = Configuration::from_json_file(config_path)
        .with_context(|| format!("Cannot load configuration {}", config_path.display()))?;
    let mode = if output.is_some() {
        AccessMode::ReadOnly
    } else {
        AccessMode::ReadWrite
    };
    let mut disk = open_disk(device, mode)?;
    let partitions = scan_or_empty(&mut disk);

    let manager = InstallManager::new(&template);
    let plan = manager
        .simulate_install(&mut disk, &mut config, &partitions, sector)
        .context("Boot loader cannot be prepared")?;

    println!("Bootable partitions: {}", plan.bootable_partitions);
    println!("Free bytes in menu:  {}", plan.slack);
    for warning in &plan.warnings {
        println!("Warning: {}", warning);
    }

    if let Some(path) = output {
        write_sector_file(path, &plan.image)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Boot loader saved to {}", path.display());
        return Ok(());
    }

    let message = format!(
        "Boot loader will be written to sector {} of {}.",
        plan.target_sector,
        disk.path().display()
    );
    if !yes && !confirm(&mut io::stdin().lock(), &mut io::stdout(), &message) {
        println!("Installation cancelled.");
        return Ok(());
    }
    manager.execute_install(&mut disk, &plan)?;
    println!("Boot loader installed.");
    Ok(())
}

fn backup(
    device: &str,
    output: Option<PathBuf>,
    sector: Option<u64>,
    yes: bool,
) -> anyhow::Result<()> {
    if let Some(sector) = sector {
        let mut disk = open_disk(device, AccessMode::ReadWrite)?;
        let target = disk.read_sector(sector)?;
        if !target.is_blank() {
            let message = if sector >= FIRST_TRACK_SECTORS {
                format!("Sector {} is outside the first track and may hold data.", sector)
            } else {
                format!("Sector {} is not empty and will be overwritten.", sector)
            };
            if !yes && !confirm(&mut io::stdin().lock(), &mut io::stdout(), &message) {
                println!("Backup cancelled.");
                return Ok(());
            }
        }
        backup_to_sector(&mut disk, sector)?;
        println!("MBR saved to sector {}", sector);
        return Ok(());
    }

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "mbr-backup-{}.bin",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ))
    });
    let mut disk = open_disk(device, AccessMode::ReadOnly)?;
    let mbr = disk.read_sector(0)?;
    write_sector_file(&path, &mbr).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("MBR saved to {}", path.display());
    Ok(())
}

fn restore(device: &str, source: &SectorSource) -> anyhow::Result<()> {
    let mut disk = open_disk(device, AccessMode::ReadWrite)?;
    let backup = match (&source.input, source.sector) {
        (Some(path), _) => read_sector_file(path)
            .with_context(|| format!("Cannot read backup {}", path.display()))?,
        (None, Some(sector)) => read_backup_sector(&mut disk, sector)?,
        (None, None) => bail!("Give either --input <file> or --sector <n>"),
    };

    let stdin = io::stdin();
    let mut prompt = TerminalPrompt::new(stdin.lock(), io::stdout());
    match restore_backup(&mut disk, &backup, &mut prompt) {
        Ok(_) => {
            println!("MBR has been restored.");
            Ok(())
        }
        Err(mbrkit_core::MbrError::UserCancelled) => {
            println!("Restore cancelled, nothing was written.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

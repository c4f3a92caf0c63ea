use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info, warn};

use scanner_usb::config::Config;
use scanner_usb::constants::SUPPORTED_VIDS;
use scanner_usb::device::select_scanners;
use scanner_usb::device::usb::RusbTransport;
use scanner_usb::profile::ScannerProfile;
use scanner_usb::server::{scan_channel, spawn_reader, ScanReader};
use scanner_usb::tools;

fn load_profile(cfg: &Config) -> anyhow::Result<ScannerProfile> {
    let profile = match &cfg.profile {
        Some(path) => ScannerProfile::load(path)
            .with_context(|| format!("cannot use profile {}", path.display()))?,
        None if cfg.legacy_enter => ScannerProfile::legacy_enter(),
        None => ScannerProfile::us_keyboard(),
    };
    info!("Using scanner profile {:?}.", profile.name);
    Ok(profile)
}

fn list_devices(transport: &RusbTransport<rusb::Context>) -> anyhow::Result<()> {
    for listing in transport.list_all()? {
        let has_in = listing.tree.as_ref().map(|t| t.has_in_endpoint());
        let known = SUPPORTED_VIDS.contains(&listing.summary.vendor_id);
        println!(
            "{}{} {} [{}] IN endpoint: {}",
            if known { "* " } else { "  " },
            listing.summary,
            listing.name.as_deref().unwrap_or("(cannot open)"),
            listing.speed,
            match has_in {
                Some(true) => "yes",
                Some(false) => "no",
                None => "unknown",
            }
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    tools::initialize_logging(cfg.json, cfg.verbose);
    info!("Starting Scanner USB.");

    let transport = RusbTransport::new().context("failed to initialize libusb")?;
    if cfg.list {
        return list_devices(&transport);
    }

    let profile = Arc::new(load_profile(&cfg)?);
    let handles = select_scanners(&transport, cfg.matcher())?;
    if handles.is_empty() {
        bail!("no device matching {} has an IN endpoint", cfg.matcher());
    }

    if cfg.once {
        let mut reader = ScanReader::open(&transport, &handles[0], profile, cfg.retry_policy())?;
        println!("{}", reader.read_scan()?);
        return Ok(());
    }

    let (tx, rx) = scan_channel();
    let mut tasks = Vec::with_capacity(handles.len());
    for handle in &handles {
        let reader =
            ScanReader::open(&transport, handle, Arc::clone(&profile), cfg.retry_policy())?;
        tasks.push(spawn_reader(reader, tx.clone())?);
    }
    drop(tx);

    while let Ok(scan) = rx.recv_blocking() {
        println!("{}", scan);
    }

    warn!("Every scanner reader has stopped.");
    let mut failed = false;
    for task in tasks {
        if let Err(e) = task.join() {
            error!("Scanner reader failed: {}", e);
            failed = true;
        }
    }
    if failed {
        bail!("scanner reader failed");
    }
    Ok(())
}

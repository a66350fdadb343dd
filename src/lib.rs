pub mod candidates;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod dns;
pub mod driver;
pub mod error;
pub mod http;
pub mod model;
pub mod notify;
pub mod output;
pub mod schedule;
pub mod similarity;
pub mod testutil;
pub mod wildcard;
pub mod worker;

use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::Args;
use crate::config::Config;
use crate::dns::{DnsResolve, TrustDnsResolve};
use crate::driver::{DriverOptions, EnumerationDriver};
use crate::http::{HttpFetch, ReqwestFetch};
use crate::model::{ApexDomain, HostRecord};

/// Reads `-d`/`-f` into a deduplicated list of apexes.
fn load_apexes(args: &Args) -> Result<Vec<ApexDomain>> {
    let names: Vec<String> = if let Some(domain) = &args.domain {
        vec![domain.clone()]
    } else if let Some(file) = &args.file {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("reading apex list {}", file.display()))?;
        let mut seen = HashSet::new();
        text.lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .filter(|l| seen.insert(l.clone()))
            .collect()
    } else {
        anyhow::bail!("one of -d/--domain or -f/--file is required");
    };

    names
        .iter()
        .map(|n| ApexDomain::parse(n).map_err(anyhow::Error::from))
        .collect()
}

fn output_label(args: &Args) -> String {
    args.domain
        .clone()
        .or_else(|| {
            args.file
                .as_ref()
                .and_then(|f| f.file_stem())
                .map(|s| s.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "subrecur".to_string())
}

async fn resolve_server(args: &Args) -> Result<IpAddr> {
    match &args.dns_server {
        Some(pinned) => {
            IpAddr::from_str(pinned).with_context(|| format!("--dns-server {pinned} is not an IP"))
        }
        None => Ok(driver::select_dns_server().await),
    }
}

/// One full run: load inputs, enumerate every apex, write output, apply
/// dictionary feedback, and (if requested) send an email summary. Returns
/// `Ok(())` even when enumeration finds nothing — only startup/input
/// errors are fatal.
pub async fn run(args: Args) -> Result<()> {
    // Fail fast on invalid apexes / unreadable dictionaries before
    // committing to a (possibly scheduled, possibly long-running) pass.
    load_apexes(&args)?;
    dictionary::load(&args.primary_dict)
        .with_context(|| format!("loading primary dictionary {}", args.primary_dict.display()))?;
    if args.loop_query {
        dictionary::load(&args.loop_dict)
            .with_context(|| format!("loading loop dictionary {}", args.loop_dict.display()))?;
    }

    if let Some(ref start_time) = args.start_time {
        let target = schedule::parse_start_time(start_time)?;
        if args.monitor_file.is_none() {
            anyhow::bail!(error::EnumError::MonitorFileRequired);
        }
        info!(%start_time, "scheduled rerun enabled");
        schedule::run_scheduled(target, || {
            let args = args.clone();
            async move {
                if let Err(e) = run_once(args).await {
                    warn!(error = %e, "scheduled run failed");
                }
            }
        })
        .await;
    }

    run_once(args).await
}

async fn run_once(args: Args) -> Result<()> {
    let apexes = load_apexes(&args)?;
    let primary_dict = dictionary::load(&args.primary_dict)?;
    let loop_dict = if args.loop_query {
        dictionary::load(&args.loop_dict)?
    } else {
        HashSet::new()
    };

    let filters = if args.no_filter {
        config::ContentFilters::default()
    } else {
        match Config::load(&args.config) {
            Ok(cfg) => cfg.filters(),
            Err(e) => {
                warn!(error = %e, "no usable config.yaml; continuing without content filters");
                config::ContentFilters::default()
            }
        }
    };

    let server_ip = resolve_server(&args).await?;
    let dns: Arc<dyn DnsResolve> = Arc::new(TrustDnsResolve::new(server_ip));
    let http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetch::new());

    let options = DriverOptions {
        workers: args.threads,
        loop_query: args.loop_query,
        filters,
    };
    let driver = EnumerationDriver::new(dns, http, options);

    let label = output_label(&args);
    let output_path = args.output.clone().unwrap_or_else(|| output::default_output_path(&label));

    let mut all_new_hosts: Vec<HostRecord> = Vec::new();

    let cancel = model::Cancel::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing in-flight probes and writing partial results");
                cancel.trigger();
            }
        })
    };

    for apex in &apexes {
        if cancel.is_set() {
            break;
        }
        info!(%apex, "starting enumeration");

        let (results, discovered_labels) = driver
            .run_apex(apex, &primary_dict, &loop_dict, &cancel)
            .await;

        let snapshot = driver::snapshot(&results).await;
        let existing = output::read_hosts(&output_path).unwrap_or_default();
        for (name, record) in &snapshot {
            if !existing.contains(name) {
                all_new_hosts.push(record.clone());
            }
        }

        output::write_results(&output_path, &snapshot)
            .with_context(|| format!("writing results to {}", output_path.display()))?;

        dictionary::feedback(&args.primary_dict, &discovered_labels)
            .with_context(|| format!("updating dictionary {}", args.primary_dict.display()))?;
        let personal_dict = personal_dict_path(&args.primary_dict);
        dictionary::feedback(&personal_dict, &discovered_labels)
            .with_context(|| format!("updating dictionary {}", personal_dict.display()))?;

        info!(%apex, found = snapshot.len(), "enumeration complete");
    }
    ctrl_c.abort();

    if args.email && !all_new_hosts.is_empty() {
        match Config::load(&args.config) {
            Ok(cfg) => {
                let apex_label = apexes
                    .first()
                    .map(|a| a.as_str().to_string())
                    .unwrap_or_default();
                if let Err(e) = notify::send_summary(&cfg, &apex_label, &all_new_hosts).await {
                    warn!(error = %e, "failed to send notification email");
                }
            }
            Err(e) => warn!(error = %e, "-e given but config.yaml unusable; skipping email"),
        }
    }

    Ok(())
}

fn personal_dict_path(primary: &std::path::Path) -> std::path::PathBuf {
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "subdomains".to_string());
    let dir = primary.parent().unwrap_or_else(|| std::path::Path::new("."));
    dir.join(format!("{stem}_personal.txt"))
}

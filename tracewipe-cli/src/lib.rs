use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{debug, warn};

use tracewipe_core::{
    EngineConfig, EngineEvent, EngineHandle, ErasureEngine, ErasureReport, ErasureTarget,
};

const PROGRESS_BAR_WIDTH: usize = 30;

/// Configuration overrides collected from the command line
#[derive(Debug, Default)]
struct ConfigArgs {
    config: Option<PathBuf>,
    home: Option<PathBuf>,
    no_measure: bool,
}

#[derive(Parser)]
#[command(name = "tracewipe")]
#[command(about = "Erase browser caches, Tor state and temporary files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file (default: <config dir>/tracewipe/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Home directory to expand `~` against
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Erase every known trace location
    Run {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print events and the final report as JSON lines
        #[arg(long, requires = "yes")]
        json: bool,

        /// Don't count files and bytes before deleting
        #[arg(long)]
        no_measure: bool,
    },
    /// List the locations that would be erased
    List,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tracewipe={log_level},tracewipe_core={log_level},tracewipe_cli={log_level}"
        ))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            yes,
            json,
            no_measure,
        } => {
            let config = load_config(ConfigArgs {
                config: cli.config,
                home: cli.home,
                no_measure,
            })?;
            handle_run_command(config, yes, json)
        }
        Commands::List => {
            let config = load_config(ConfigArgs {
                config: cli.config,
                home: cli.home,
                no_measure: false,
            })?;
            handle_list_command(&config)
        }
    }
}

fn load_config(args: ConfigArgs) -> Result<EngineConfig> {
    let mut config = match args.config {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::load_default()?,
    };

    if args.home.is_some() {
        config.home_dir = args.home;
    }
    if args.no_measure {
        config.measure = false;
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn handle_run_command(config: EngineConfig, yes: bool, json: bool) -> Result<()> {
    let engine = ErasureEngine::new(config);

    if !yes {
        display_targets(engine.targets(), engine.config())?;
        let stdin = io::stdin();
        if !confirm_erase(engine.targets(), &mut stdin.lock(), &mut io::stdout())? {
            println!("Erasure cancelled.");
            return Ok(());
        }
    }

    let (sender, receiver) = mpsc::channel();
    let handle = engine.spawn(sender)?;

    let mut stdout = io::stdout();
    let (report, render_error) = follow_run(receiver, handle, json, &mut stdout)?;
    if let Some(err) = render_error {
        return Err(err);
    }

    display_report(&report, json, &mut stdout)?;
    Ok(())
}

/// Render events until the run completes, then join the worker.
///
/// A failed write stops rendering but never the run: the receiver is drained
/// and the worker joined before the write error is handed back.
fn follow_run<W: Write>(
    receiver: mpsc::Receiver<EngineEvent>,
    handle: EngineHandle,
    json: bool,
    output: &mut W,
) -> Result<(ErasureReport, Option<anyhow::Error>)> {
    let mut render_error = None;

    for event in receiver {
        if render_error.is_none() {
            if let Err(err) = render_event(&event, json, output) {
                warn!("Output failed, waiting for the erasure to finish: {}", err);
                render_error = Some(err);
            }
        }
        if event.is_completed() {
            break;
        }
    }

    let report = handle.join()?;
    Ok((report, render_error))
}

fn handle_list_command(config: &EngineConfig) -> Result<()> {
    display_targets(tracewipe_core::target::list(), config)
}

fn display_targets(targets: &[ErasureTarget], config: &EngineConfig) -> Result<()> {
    let home = config.resolve_home();

    println!("{:<20} {:<30} {:<9} {}", "Target", "Label", "Present", "Path");
    println!("{}", "-".repeat(90));

    for target in targets {
        let (present, path) = match target.resolve(home.as_deref()) {
            Some(path) => (
                if path.exists() { "yes" } else { "no" },
                path.display().to_string(),
            ),
            None => ("-", format!("{} (no home directory)", target.path_template)),
        };
        println!(
            "{:<20} {:<30} {:<9} {}",
            target.id, target.label, present, path
        );
    }

    Ok(())
}

fn confirm_erase<R: BufRead, W: Write>(
    targets: &[ErasureTarget],
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(
        output,
        "\nThis will permanently delete {} locations and everything under them. Continue? [y/N]: ",
        targets.len()
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn render_event<W: Write>(event: &EngineEvent, json: bool, output: &mut W) -> Result<()> {
    if json {
        writeln!(output, "{}", serde_json::to_string(event)?)?;
        return Ok(());
    }

    match event {
        EngineEvent::Log { message } => writeln!(output, "{message}")?,
        EngineEvent::Progress { percent } => writeln!(output, "{}", format_progress_bar(*percent))?,
        EngineEvent::Completed { .. } => {}
    }
    Ok(())
}

fn format_progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        percent
    )
}

fn display_report<W: Write>(report: &ErasureReport, json: bool, output: &mut W) -> Result<()> {
    if json {
        writeln!(output, "{}", serde_json::to_string(report)?)?;
        return Ok(());
    }

    writeln!(output, "\nTargets cleared: {}", report.cleared.len())?;
    writeln!(output, "Files removed: {}", report.files_removed)?;
    writeln!(output, "Space freed: {}", report.format_size())?;

    if report.has_failures() {
        writeln!(output, "\nFailed to clear {} targets:", report.failed.len())?;
        for failed in &report.failed {
            writeln!(output, "  - {}: {}", failed.id, failed.error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use tracewipe_core::Footprint;

    /// Writer whose every write fails like a closed pipe
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sandboxed_tor_engine(home: &std::path::Path) -> ErasureEngine {
        let targets = vec![
            ErasureTarget::new(
                "tor-data",
                "Tor client data",
                "~/.tor",
                tracewipe_core::Category::AnonymityNetwork,
                50,
            ),
            ErasureTarget::new(
                "tor-browser-data",
                "Tor Browser data",
                "~/.local/share/torbrowser",
                tracewipe_core::Category::AnonymityNetwork,
                75,
            ),
        ];
        let config = EngineConfig {
            home_dir: Some(home.to_path_buf()),
            ..Default::default()
        };
        ErasureEngine::with_targets(config, targets)
    }

    fn rendered(events: &[EngineEvent], json: bool) -> String {
        let mut out = Vec::new();
        for event in events {
            render_event(event, json, &mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cli_parse_run_command() {
        let cli = Cli::try_parse_from(["tracewipe", "run", "--yes", "--json", "--no-measure"])
            .unwrap();

        match cli.command {
            Commands::Run {
                yes,
                json,
                no_measure,
            } => {
                assert!(yes);
                assert!(json);
                assert!(no_measure);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_json_requires_yes() {
        assert!(Cli::try_parse_from(["tracewipe", "run", "--json"]).is_err());
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "tracewipe",
            "list",
            "--home",
            "/home/alice",
            "--config",
            "/etc/tracewipe.toml",
            "-v",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.home, Some(PathBuf::from("/home/alice")));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/tracewipe.toml")));
        assert!(cli.verbose);
        assert!(!cli.debug);
    }

    #[test]
    fn test_load_config_overrides() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "home_dir = \"/from/file\"\nmeasure = true\n")?;

        let config = load_config(ConfigArgs {
            config: Some(path.clone()),
            home: None,
            no_measure: false,
        })?;
        assert_eq!(config.home_dir, Some(PathBuf::from("/from/file")));
        assert!(config.measure);

        let config = load_config(ConfigArgs {
            config: Some(path),
            home: Some(PathBuf::from("/from/flag")),
            no_measure: true,
        })?;
        assert_eq!(config.home_dir, Some(PathBuf::from("/from/flag")));
        assert!(!config.measure);
        Ok(())
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/tracewipe/config.toml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_confirm_erase() -> Result<()> {
        let targets = tracewipe_core::target::list();

        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false)] {
            let mut output = Vec::new();
            let confirmed = confirm_erase(targets, &mut Cursor::new(answer), &mut output)?;
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert!(String::from_utf8(output)?.contains("delete 5 locations"));
        }
        Ok(())
    }

    #[test]
    fn test_format_progress_bar() {
        assert_eq!(
            format_progress_bar(0),
            format!("[{}]   0%", "-".repeat(PROGRESS_BAR_WIDTH))
        );
        assert_eq!(
            format_progress_bar(100),
            format!("[{}] 100%", "#".repeat(PROGRESS_BAR_WIDTH))
        );
        assert!(format_progress_bar(33).starts_with("[#########-"));
        assert!(format_progress_bar(33).ends_with(" 33%"));
    }

    #[test]
    fn test_render_text_events() {
        let text = rendered(
            &[
                EngineEvent::log("Tor client data cleared."),
                EngineEvent::progress(50),
                EngineEvent::completed("Erasure complete."),
            ],
            false,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Tor client data cleared.");
        assert!(lines[1].ends_with(" 50%"));
    }

    #[test]
    fn test_render_json_events() {
        let text = rendered(
            &[
                EngineEvent::progress(75),
                EngineEvent::completed("Erasure complete."),
            ],
            true,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], r#"{"type":"progress","percent":75}"#);
        assert_eq!(lines[1], r#"{"type":"completed","summary":"Erasure complete."}"#);
    }

    #[test]
    fn test_display_report() -> Result<()> {
        let mut report = ErasureReport::new();
        report.add_cleared("brave-cache", Footprint { files: 3, bytes: 2048 });
        report.add_failure("system-temp", "failed to remove /tmp: Permission denied".to_string());

        let mut out = Vec::new();
        display_report(&report, false, &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("Targets cleared: 1"));
        assert!(text.contains("Files removed: 3"));
        assert!(text.contains("Space freed: 2.00 KB"));
        assert!(text.contains("  - system-temp: failed to remove /tmp: Permission denied"));

        let mut out = Vec::new();
        display_report(&report, true, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["cleared"][0], "brave-cache");
        assert_eq!(value["bytes_freed"], 2048);
        Ok(())
    }

    #[test]
    fn test_display_targets_with_sandbox_home() -> Result<()> {
        let home = TempDir::new()?;
        let config = EngineConfig {
            home_dir: Some(home.path().to_path_buf()),
            ..Default::default()
        };
        display_targets(tracewipe_core::target::list(), &config)
    }

    #[test]
    fn test_follow_run_renders_and_joins() -> Result<()> {
        let home = TempDir::new()?;
        std::fs::create_dir_all(home.path().join(".tor/keys"))?;

        let (sender, receiver) = mpsc::channel();
        let handle = sandboxed_tor_engine(home.path()).spawn(sender)?;

        let mut out = Vec::new();
        let (report, render_error) = follow_run(receiver, handle, true, &mut out)?;

        assert!(render_error.is_none());
        assert_eq!(report.cleared, vec!["tor-data"]);
        let text = String::from_utf8(out)?;
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().last().unwrap().contains(r#""type":"completed""#));
        Ok(())
    }

    #[test]
    fn test_follow_run_finishes_when_output_is_closed() -> Result<()> {
        let home = TempDir::new()?;
        std::fs::create_dir_all(home.path().join(".tor/keys"))?;
        std::fs::write(home.path().join(".tor/keys/secret_id_key"), "secret")?;
        std::fs::create_dir_all(home.path().join(".local/share/torbrowser/Browser"))?;

        let (sender, receiver) = mpsc::channel();
        let handle = sandboxed_tor_engine(home.path()).spawn(sender)?;

        let (report, render_error) = follow_run(receiver, handle, true, &mut ClosedPipe)?;

        let err = render_error.expect("write error is kept");
        let io_err = err.downcast_ref::<io::Error>().expect("io error");
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);

        assert_eq!(report.cleared, vec!["tor-data", "tor-browser-data"]);
        assert!(!report.has_failures());
        assert!(!home.path().join(".tor").exists());
        assert!(!home.path().join(".local/share/torbrowser").exists());
        Ok(())
    }
}

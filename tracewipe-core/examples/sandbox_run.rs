use std::fs;
use std::sync::mpsc;
use tempfile::TempDir;
use tracewipe_core::{EngineConfig, EngineEvent, ErasureEngine, ErasureTarget, target};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fake home with a browser cache and Tor state
    let home = TempDir::new()?;
    for dir in [".cache/chromium/Default/Cache", ".tor/keys"] {
        fs::create_dir_all(home.path().join(dir))?;
    }
    fs::write(home.path().join(".cache/chromium/Default/Cache/data_1"), "x".repeat(4096))?;
    fs::write(home.path().join(".tor/keys/ed25519_master_id_secret_key"), "secret")?;

    // Keep the real /tmp out of it
    let targets = target::list()
        .iter()
        .map(|t| match t.id {
            "system-temp" => ErasureTarget::new(t.id, t.label, "~/tmp", t.category, t.milestone),
            _ => t.clone(),
        })
        .collect();

    let config = EngineConfig {
        home_dir: Some(home.path().to_path_buf()),
        ..Default::default()
    };

    let (sender, receiver) = mpsc::channel();
    let handle = ErasureEngine::with_targets(config, targets).spawn(sender)?;

    for event in receiver {
        match event {
            EngineEvent::Log { message } => println!("log:       {message}"),
            EngineEvent::Progress { percent } => println!("progress:  {percent}%"),
            EngineEvent::Completed { summary } => println!("completed: {summary}"),
        }
    }

    let report = handle.join()?;
    println!(
        "\n{} targets cleared, {} files, {} freed",
        report.cleared.len(),
        report.files_removed,
        report.format_size()
    );

    Ok(())
}

// CLI smoke tests against a throwaway resources root
use anyhow::Result;
use paperlens::storage::{SummaryRecord, INFO_FILE, TITLE_FILE};
use rexpect::spawn;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TIMEOUT_MS: Option<u64> = Some(10_000);

fn command(config: &Path, root: &Path, args: &str) -> String {
    format!(
        "{} --config {} --resources {} {}",
        env!("CARGO_BIN_EXE_paperlens"),
        config.display(),
        root.display(),
        args
    )
}

/// Empty config file so the user's own config never leaks in.
fn workspace() -> Result<(TempDir, std::path::PathBuf, std::path::PathBuf)> {
    let tmp = TempDir::new()?;
    let config = tmp.path().join("config.toml");
    fs::write(&config, "")?;
    let root = tmp.path().join("resources");
    fs::create_dir_all(&root)?;
    Ok((tmp, config, root))
}

fn seed_document(root: &Path, id: &str) -> Result<()> {
    let dir = root.join(id);
    fs::create_dir_all(&dir)?;
    let record = SummaryRecord {
        title: "Attention Is All You Need".to_string(),
        authors: "Vaswani et al.".to_string(),
        tables: vec![format!("{id}*10_table.png")],
        ..Default::default()
    };
    fs::write(dir.join(TITLE_FILE), &record.title)?;
    fs::write(dir.join("10_table.png"), b"png")?;
    fs::write(dir.join(INFO_FILE), serde_json::to_string_pretty(&record)?)?;
    Ok(())
}

#[test]
fn retrieve_unknown_document_fails() -> Result<()> {
    let (_tmp, config, root) = workspace()?;
    let mut session = spawn(&command(&config, &root, "retrieve ghost"), TIMEOUT_MS)?;
    session.exp_string("document not processed: ghost")?;
    session.exp_eof()?;
    Ok(())
}

#[test]
fn retrieve_prints_persisted_record() -> Result<()> {
    let (_tmp, config, root) = workspace()?;
    seed_document(&root, "attention")?;

    let mut session = spawn(&command(&config, &root, "retrieve attention"), TIMEOUT_MS)?;
    session.exp_string("\"title\": \"Attention Is All You Need\"")?;
    session.exp_string("attention*10_table.png")?;
    session.exp_eof()?;
    Ok(())
}

#[test]
fn list_shows_only_completed_documents() -> Result<()> {
    let (_tmp, config, root) = workspace()?;
    seed_document(&root, "attention")?;
    // interrupted run: directory without info.json
    fs::create_dir_all(root.join("half-done"))?;
    fs::write(root.join("half-done").join(TITLE_FILE), "Partial")?;

    let mut session = spawn(&command(&config, &root, "list"), TIMEOUT_MS)?;
    let output = session.exp_eof()?;
    assert!(output.contains("attention"));
    assert!(!output.contains("half-done"));
    Ok(())
}

#[test]
fn image_reference_resolves_to_file() -> Result<()> {
    let (_tmp, config, root) = workspace()?;
    seed_document(&root, "attention")?;

    let mut session = spawn(&command(&config, &root, "image attention*10_table.png"), TIMEOUT_MS)?;
    session.exp_string("10_table.png")?;
    session.exp_eof()?;

    let mut session = spawn(&command(&config, &root, "image attention*../secret"), TIMEOUT_MS)?;
    session.exp_string("Error")?;
    session.exp_eof()?;
    Ok(())
}

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn gait_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("gait");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // The key variable is never set, so the answering facade runs disabled
    let config_content = format!(
        r#"[data]
dir = "{}/data"

[llm]
provider = "openai"
api_key_env = "GAIT_TEST_KEY_NOT_SET"
prompt_for_key = false
"#,
        root.display()
    );

    let config_path = config_dir.join("gait.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn gait_command(config_path: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(gait_binary());
    cmd.arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .current_dir(config_path.parent().unwrap())
        .env_remove("GAIT_TEST_KEY_NOT_SET")
        .env_remove("RUST_LOG");
    cmd
}

fn run_gait(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = gait_command(config_path, args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run gait binary at {:?}: {}", gait_binary(), e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_gait_with_input(config_path: &Path, args: &[&str], input: &str) -> (String, String, bool) {
    let mut child = gait_command(config_path, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run gait binary at {:?}: {}", gait_binary(), e));

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_context_for_named_runner() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gait(&config_path, &["context", "Tell me about Bolt"]);
    assert!(success, "context failed: {}", stderr);
    assert!(stdout.contains("Data for Usain Bolt (runner):"));
    assert!(stdout.contains("- Cadence: 260 steps/minute"));
    assert!(!stdout.contains("Kipchoge"));
}

#[test]
fn test_context_fallback() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gait(&config_path, &["context", "xyz"]);
    assert!(success);
    assert!(stdout.starts_with("Human runners:"));
    assert!(stdout.contains("\nAnimals:"));
    assert!(stdout.contains("Metric definitions:"));
}

#[test]
fn test_context_comparison() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gait(
        &config_path,
        &["context", "How do human runners compare to animals?"],
    );
    assert!(success);
    assert!(stdout.starts_with("Humans vs Animals Comparison:"));
}

#[test]
fn test_efficiency_flag_enriches_context() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gait(
        &config_path,
        &["--efficiency", "context", "Who has the best form?"],
    );
    assert!(success, "context failed: {}", stderr);
    assert!(stdout.contains("Efficiency scores (higher is better):"));
    assert!(stdout.contains("- Animal - Cheetah: 100.0/100"));
}

#[test]
fn test_stride_extension_from_config() {
    let (tmp, config_path) = setup_test_env();
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[extensions]\nstride_length = true\n");
    fs::write(&config_path, content).unwrap();

    let (stdout, _, success) = run_gait(&config_path, &["context", "What is stride length?"]);
    assert!(success);
    assert!(stdout.contains("Stride length data:"));
    assert!(stdout.contains("- Animal - Kangaroo: 9.0 meters"));
    drop(tmp);
}

#[test]
fn test_runners_lists_everyone() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gait(&config_path, &["runners"]);
    assert!(success);
    assert!(stdout.contains("Human Runners:"));
    assert!(stdout.contains("  - Eliud Kipchoge (Marathon world record holder)"));
    assert!(stdout.contains("  - Kangaroo"));
}

#[test]
fn test_stats_report() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gait(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Humans (5):"));
    assert!(stdout.contains("Animals (3):"));
}

#[test]
fn test_init_writes_documents() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gait(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("8 entities, 3 definitions"));

    let data_dir = tmp.path().join("data");
    let runners = fs::read_to_string(data_dir.join("runners_data.json")).unwrap();
    assert!(runners.contains("\"Eliud Kipchoge\""));
    assert!(runners.contains("\"type\": \"human\""));
    assert!(data_dir.join("definitions.json").exists());
}

#[test]
fn test_ask_without_key_reports_error_answer() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gait(&config_path, &["ask", "What is cadence?"]);
    assert!(success);
    assert!(stdout.contains("Retrieved Context:"));
    assert!(stdout.contains("Error querying LLM:"));
}

#[test]
fn test_require_api_key_fails_startup() {
    let (_tmp, config_path) = setup_test_env();
    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("prompt_for_key = false", "prompt_for_key = false\nrequire_api_key = true");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_gait(&config_path, &["ask", "What is cadence?"]);
    assert!(!success);
    assert!(stderr.contains("GAIT_TEST_KEY_NOT_SET"));

    // Retrieval-only commands never need a key
    let (_, _, success) = run_gait(&config_path, &["context", "cadence"]);
    assert!(success);
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[llm]\nprovider = \"ollama\"\n").unwrap();

    let (_, stderr, success) = run_gait(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Unknown llm provider"));
}

#[test]
fn test_chat_session_save_and_load() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gait_with_input(
        &config_path,
        &["chat"],
        "help\nadd_stride\nsave\nload\ncontext Kangaroo\nquit\n",
    );
    assert!(success, "chat failed: {}", stderr);
    assert!(stdout.contains("Runner & Animal Gait Analysis RAG System"));
    assert!(stdout.contains("Added stride_length metric to all runners and animals"));
    assert!(stdout.contains("Data saved to JSON files in"));
    assert!(stdout.contains("Data loaded from JSON files"));
    assert!(stdout.contains("Data for Kangaroo (animal):"));
    assert!(stdout.contains("Thank you for using the Gait Analysis RAG System!"));

    let runners = fs::read_to_string(tmp.path().join("data").join("runners_data.json")).unwrap();
    assert!(runners.contains("\"stride_length\": 9.0"));
}

#[test]
fn test_chat_ends_cleanly_at_eof() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gait_with_input(&config_path, &[], "runners\n");
    assert!(success);
    assert!(stdout.contains("Human Runners:"));
}

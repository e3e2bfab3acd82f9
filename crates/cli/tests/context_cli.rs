use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[allow(deprecated)]
fn paper_context() -> Command {
    let mut cmd = Command::cargo_bin("paper-context").expect("binary");
    cmd.env_remove("PAPER_CONTEXT_API_KEY")
        .env_remove("RUST_LOG")
        .arg("--quiet");
    cmd
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn long_paper() -> String {
    (0..80)
        .map(|i| {
            format!(
                "Section {i} reports that sparse attention variant {i} keeps accuracy while \
                 cutting memory. The ablation for variant {i} compares window sizes, routing \
                 rules and kernel fusion on long documents, and the appendix lists the exact \
                 hyperparameters used for run {i}."
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn small_papers_are_sent_in_full() {
    let temp = tempdir().unwrap();
    let a = write(temp.path(), "a.txt", "Transformers replace recurrence with attention.");
    let b = write(temp.path(), "b.txt", "State space models scale linearly.");

    paper_context()
        .arg("--paper")
        .arg(format!("{}::Attention Paper::Vaswani::2017", a.display()))
        .arg("--paper")
        .arg(b.display().to_string())
        .args(["--question", "How do these compare?"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Full Paper Contexts:"))
        .stdout(predicate::str::contains("Paper 1: Attention Paper"))
        .stdout(predicate::str::contains("First author: Vaswani"))
        .stdout(predicate::str::contains("Paper 2: b"))
        .stdout(predicate::str::contains("State space models scale linearly."));
}

#[test]
fn large_papers_switch_to_retrieved_evidence() {
    let temp = tempdir().unwrap();
    let big = write(temp.path(), "big.txt", &long_paper());
    let other = write(temp.path(), "other.txt", &long_paper().replace("sparse", "dense"));

    let body = run_json(
        paper_context()
            .arg("--paper")
            .arg(big.display().to_string())
            .arg("--paper")
            .arg(other.display().to_string())
            .args(["--question", "What does variant 7 change?"])
            .args(["--model", "gpt-4", "--active", "1"]),
    );

    assert_eq!(body["context"]["mode"], "retrieval");
    assert_eq!(body["budget"]["model_limit_tokens"], 8192);
    let text = body["context"]["context_text"].as_str().unwrap();
    assert!(text.starts_with("Retrieved Paper Evidence:"));
    assert!(text.contains("[P1-C"));
    assert!(text.contains("[P2-C"));
    assert!(
        body["context"]["full_context_tokens"].as_u64().unwrap()
            > body["context"]["context_budget_tokens"].as_u64().unwrap()
    );
    let papers = body["context"]["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 2);
    assert!(papers.iter().all(|p| p["mode"] == "lexical_only"));
}

#[test]
fn papers_without_text_fall_back_to_metadata() {
    let temp = tempdir().unwrap();
    let scanned = write(temp.path(), "scanned.txt", "   \n");

    paper_context()
        .arg("--paper")
        .arg(format!("{}::Scanned Survey::Doe::1999::doe1999", scanned.display()))
        .args(["--question", "What is this about?"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Paper Metadata (no extractable text available):",
        ))
        .stdout(predicate::str::contains("Citation key: doe1999"))
        .stdout(predicate::str::contains("Year: 1999"));
}

#[test]
fn json_report_includes_history_and_stub_embeddings() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "p.txt", "Contrastive pretraining aligns images and text.");
    let history = write(
        temp.path(),
        "history.json",
        r#"[{"role":"user","content":"Hi"},{"role":"assistant","content":"Hello!"}]"#,
    );

    let body = run_json(
        paper_context()
            .arg("--paper")
            .arg(paper.display().to_string())
            .arg("--history")
            .arg(history.display().to_string())
            .args(["--question", "Summarize the method"])
            .args(["--embed-mode", "stub"])
            .args(["--image", "data:image/png;base64,AAAA"]),
    );

    assert_eq!(body["embed_mode"], "stub");
    assert_eq!(body["cap"]["capped"], false);
    let messages = body["cap"]["messages"].as_array().unwrap();
    let roles: Vec<&str> = messages
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "system", "user", "assistant", "user"]);
    assert!(messages[1]["content"]
        .as_str()
        .unwrap()
        .starts_with("Document Context:\nFull Paper Contexts:"));
    assert_eq!(messages[4]["content"][1]["type"], "image_url");
}

#[test]
fn oversized_conversation_is_capped() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "big.txt", &long_paper());
    let turn = "earlier discussion ".repeat(220);
    let history: Vec<Value> = (0..4)
        .map(|i| {
            let role = if i % 2 == 0 { "user" } else { "assistant" };
            serde_json::json!({ "role": role, "content": turn })
        })
        .collect();
    let history = write(
        temp.path(),
        "history.json",
        &serde_json::to_string(&history).unwrap(),
    );

    let body = run_json(
        paper_context()
            .arg("--paper")
            .arg(paper.display().to_string())
            .arg("--history")
            .arg(history.display().to_string())
            .args(["--question", "Which variant is best?"])
            .args(["--input-token-cap", "3000"]),
    );

    assert_eq!(body["budget"]["is_floored"], true);
    assert_eq!(body["cap"]["capped"], true);
    assert_eq!(body["cap"]["limit_tokens"], 3000);
    assert!(
        body["cap"]["estimated_after_tokens"].as_u64().unwrap()
            < body["cap"]["estimated_before_tokens"].as_u64().unwrap()
    );
    let messages = body["cap"]["messages"].as_array().unwrap();
    assert_eq!(messages.last().unwrap()["role"], "user");
}

#[test]
fn unconfigured_http_embeddings_fall_back_to_lexical() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "p.txt", "Mixture of experts routes tokens.");

    paper_context()
        .arg("--paper")
        .arg(paper.display().to_string())
        .args(["--question", "How are tokens routed?"])
        .args(["--embed-mode", "http"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mixture of experts routes tokens."));
}

#[test]
fn config_file_overrides_model_limits() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "p.txt", "Retrieval augmented generation.");
    let config = write(
        temp.path(),
        "paper-context.toml",
        "[models]\n\"my-local\" = 65536\n\n[retrieval]\nactive_paper_min_chunks = 3\n",
    );

    let body = run_json(
        paper_context()
            .arg("--paper")
            .arg(paper.display().to_string())
            .arg("--config")
            .arg(config.display().to_string())
            .args(["--question", "What is RAG?", "--model", "my-local-model"]),
    );

    assert_eq!(body["model"], "my-local-model");
    assert_eq!(body["budget"]["model_limit_tokens"], 65536);
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "p.txt", "text");
    let config = write(temp.path(), "bad.toml", "[retrieval]\nmmr_lambda = 2.0\n");

    paper_context()
        .arg("--paper")
        .arg(paper.display().to_string())
        .arg("--config")
        .arg(config.display().to_string())
        .args(["--question", "q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mmr_lambda"));
}

#[test]
fn missing_paper_file_fails() {
    let temp = tempdir().unwrap();

    paper_context()
        .arg("--paper")
        .arg(temp.path().join("absent.txt").display().to_string())
        .args(["--question", "q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read paper"));
}

#[test]
fn active_paper_out_of_range_fails() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "p.txt", "text");

    paper_context()
        .arg("--paper")
        .arg(paper.display().to_string())
        .args(["--question", "q", "--active", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
#[allow(deprecated)]
fn quiet_flag_overrides_rust_log() {
    let temp = tempdir().unwrap();
    let paper = write(temp.path(), "p.txt", "Sparse attention.");
    let run = |quiet: bool| {
        let mut cmd = Command::cargo_bin("paper-context").expect("binary");
        cmd.env("RUST_LOG", "debug")
            .arg("--paper")
            .arg(paper.display().to_string())
            .args(["--question", "q", "--embed-mode", "stub"]);
        if quiet {
            cmd.arg("--quiet");
        }
        cmd.assert().success()
    };

    run(false).stderr(predicate::str::contains("Embedding mode stub"));
    run(true).stderr(predicate::str::contains("Embedding mode stub").not());
}

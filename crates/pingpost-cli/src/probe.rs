//! Ping probe subprocess wrapper.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;

use pingpost_slack::Artifact;

/// Runs one ping probe and packages the merged output as a delivery artifact.
///
/// An unreachable host is still a report worth delivering, so a non-zero exit
/// status is not an error; only failing to spawn `ping` itself propagates.
pub async fn run_probe(host: &str, count: u64) -> Result<Artifact> {
    let output = Command::new("ping")
        .arg("-c")
        .arg(count.to_string())
        .arg(host)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("failed to run ping for {host}"))?;

    let mut content = output.stdout;
    if !output.stderr.is_empty() {
        content.extend_from_slice(&output.stderr);
    }
    Ok(Artifact::new(
        probe_title(host, current_unix_timestamp()),
        content,
    ))
}

fn probe_title(host: &str, unix_seconds: u64) -> String {
    format!("ping-{host}-{unix_seconds}.txt")
}

fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::{current_unix_timestamp, probe_title};

    #[test]
    fn unit_probe_title_names_host_and_timestamp_with_txt_extension() {
        assert_eq!(
            probe_title("google.com", 1_700_000_000),
            "ping-google.com-1700000000.txt"
        );
    }

    #[test]
    fn unit_current_unix_timestamp_is_past_2023() {
        assert!(current_unix_timestamp() > 1_672_531_200);
    }
}

use clap::Parser;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "pingpost",
    about = "Ping a host on a schedule and post each result into a Slack thread",
    version
)]
pub struct Cli {
    /// Host to probe.
    #[arg(long, default_value = "google.com")]
    pub host: String,

    /// Echo requests per probe.
    #[arg(long, default_value_t = 1, value_parser = parse_positive_u64)]
    pub probe_count: u64,

    /// Seconds between probes.
    #[arg(long, default_value_t = 60, value_parser = parse_positive_u64)]
    pub interval_seconds: u64,

    /// Chain results into one Slack thread instead of posting a fresh
    /// top-level message each iteration.
    #[arg(long)]
    pub threaded: bool,

    /// Slack channel id receiving results.
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub channel: String,

    /// Slack bot token.
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Slack Web API base URL.
    #[arg(long, default_value = "https://slack.com/api")]
    pub api_base: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 30_000, value_parser = parse_positive_u64)]
    pub request_timeout_ms: u64,

    /// Attempts per Slack call before giving up. 1 disables retry.
    #[arg(long, default_value_t = 3, value_parser = parse_positive_usize)]
    pub retry_max_attempts: usize,

    /// Base delay for retry backoff in milliseconds.
    #[arg(long, default_value_t = 500, value_parser = parse_positive_u64)]
    pub retry_base_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn unit_cli_defaults_cover_probe_and_retry_knobs() {
        let cli = Cli::try_parse_from([
            "pingpost",
            "--channel",
            "C1",
            "--bot-token",
            "xoxb-test",
        ])
        .expect("parse");
        assert_eq!(cli.host, "google.com");
        assert_eq!(cli.probe_count, 1);
        assert_eq!(cli.interval_seconds, 60);
        assert!(!cli.threaded);
        assert_eq!(cli.api_base, "https://slack.com/api");
        assert_eq!(cli.request_timeout_ms, 30_000);
        assert_eq!(cli.retry_max_attempts, 3);
        assert_eq!(cli.retry_base_delay_ms, 500);
    }

    #[test]
    fn unit_cli_rejects_zero_interval() {
        let result = Cli::try_parse_from([
            "pingpost",
            "--channel",
            "C1",
            "--bot-token",
            "xoxb-test",
            "--interval-seconds",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unit_cli_threaded_flag_enables_thread_chaining() {
        let cli = Cli::try_parse_from([
            "pingpost",
            "--channel",
            "C1",
            "--bot-token",
            "xoxb-test",
            "--threaded",
            "--host",
            "example.org",
        ])
        .expect("parse");
        assert!(cli.threaded);
        assert_eq!(cli.host, "example.org");
    }
}

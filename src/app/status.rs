use mailcraft::Config;

pub fn render_config(config: &Config) -> String {
    let lines = [
        format!("◆ Mail Craft {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("config      {}", config.config_path.display()),
        format!(
            "api key     {}",
            config
                .masked_api_key()
                .unwrap_or_else(|| "(not set)".to_string())
        ),
        String::new(),
        format!("endpoint    {}", config.service.endpoint),
        format!("model       {}", config.service.model),
        format!(
            "generation  temperature {:.1}, max {} tokens",
            config.service.temperature, config.service.max_output_tokens
        ),
        format!(
            "retries     {} attempts, {}s per attempt, backoff {}ms + <{}ms jitter",
            config.reliability.max_attempts,
            config.service.attempt_timeout_secs,
            config.reliability.base_backoff_ms,
            config.reliability.jitter_ms
        ),
        format!(
            "channel     {} transport, {}s deadline, {} re-send after {}ms",
            config.channel.transport,
            config.channel.call_timeout_secs,
            config.channel.resend_attempts,
            config.channel.resend_delay_ms
        ),
        format!("tone        {}", config.rewrite.default_tone),
        format!("log level   {}", config.observability.log_level),
    ];
    lines.join("\n")
}

const POLL_INTERVAL: &str = "BUFFER_SIM_POLL_MS";

/// Poll cadence of status consumers when nothing else is configured
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

pub fn get_poll_interval() -> u64 {
    let poll_from_env = std::env::var(POLL_INTERVAL);
    poll_from_env.map_or(DEFAULT_POLL_INTERVAL_MS, |res| {
        res.parse()
            .ok()
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    })
}

const LOG_LEVEL: &str = "BUFFER_SIM_LOG";

pub fn get_log_level() -> Option<String> {
    let level_from_env = std::env::var(LOG_LEVEL);
    level_from_env.ok()
}

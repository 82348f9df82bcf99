//! Phase durations read from the environment at startup.

use std::env;

use crate::domain::rules::{TimerConfig, ROUNDS_TOTAL};
use crate::error::AppError;

fn secs_var(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(AppError::config(format!(
                "{name} must be a positive integer number of seconds, got '{raw}'"
            ))),
        },
        Err(_) => Ok(default),
    }
}

impl TimerConfig {
    /// `ROUND_PRESTART_SECS`, `ROUND_SUBMIT_SECS`, `ROUND_JUDGE_SECS`,
    /// `ROUND_SUMMARY_SECS` and `ROUNDS_TOTAL`, falling back to the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = TimerConfig::default();
        let rounds_total = secs_var("ROUNDS_TOTAL", u64::from(ROUNDS_TOTAL))?;
        let rounds_total = u32::try_from(rounds_total)
            .map_err(|_| AppError::config("ROUNDS_TOTAL is out of range"))?;

        Ok(Self {
            prestart_secs: secs_var("ROUND_PRESTART_SECS", defaults.prestart_secs)?,
            submit_secs: secs_var("ROUND_SUBMIT_SECS", defaults.submit_secs)?,
            judge_secs: secs_var("ROUND_JUDGE_SECS", defaults.judge_secs)?,
            summary_secs: secs_var("ROUND_SUMMARY_SECS", defaults.summary_secs)?,
            rounds_total,
        })
    }
}

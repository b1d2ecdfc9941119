use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::config_loader::Settings;

/// What one client may still spend on one endpoint kind.
/// Holds at most a minute's worth and refills continuously.
struct Allowance {
    left: f64,
    per_minute: f64,
    seen: Instant,
}

impl Allowance {
    fn full(per_minute: u32) -> Self {
        Self {
            left: per_minute as f64,
            per_minute: per_minute as f64,
            seen: Instant::now(),
        }
    }

    fn take(&mut self) -> bool {
        let now = Instant::now();
        let minutes = now.duration_since(self.seen).as_secs_f64() / 60.0;
        self.left = (self.left + minutes * self.per_minute).min(self.per_minute);
        self.seen = now;

        if self.left >= 1.0 {
            self.left -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limit categories, one per costly endpoint
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum LimitType {
    Generate, // two completion calls each
    Audio,    // may run a synthesizer
    Export,
}

/// Per-client request limits per endpoint kind.
///
/// A limit of `0` leaves that kind unlimited; [`RateLimiter::default`]
/// limits nothing.
#[derive(Default)]
pub struct RateLimiter {
    allowances: Mutex<HashMap<(String, LimitType), Allowance>>,
    generate_per_minute: u32,
    audio_per_minute: u32,
    export_per_minute: u32,
}

impl RateLimiter {
    pub fn new(generate: u32, audio: u32, export: u32) -> Self {
        Self {
            allowances: Mutex::new(HashMap::new()),
            generate_per_minute: generate,
            audio_per_minute: audio,
            export_per_minute: export,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.rate_limit_generate,
            settings.rate_limit_audio,
            settings.rate_limit_export,
        )
    }

    fn limit(&self, limit_type: LimitType) -> u32 {
        match limit_type {
            LimitType::Generate => self.generate_per_minute,
            LimitType::Audio => self.audio_per_minute,
            LimitType::Export => self.export_per_minute,
        }
    }

    /// True when any kind has a limit configured.
    pub fn is_enabled(&self) -> bool {
        self.generate_per_minute > 0 || self.audio_per_minute > 0 || self.export_per_minute > 0
    }

    fn allowances(&self) -> MutexGuard<'_, HashMap<(String, LimitType), Allowance>> {
        // A panic while holding the lock leaves the map usable.
        self.allowances.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admits one request from `client`, spending from its allowance.
    pub fn check(&self, client: &str, limit_type: LimitType) -> bool {
        let limit = self.limit(limit_type);
        if limit == 0 {
            return true;
        }

        self.allowances()
            .entry((client.to_string(), limit_type))
            .or_insert_with(|| Allowance::full(limit))
            .take()
    }

    /// Requests left for a client/kind, `None` when the kind is unlimited.
    pub fn remaining(&self, client: &str, limit_type: LimitType) -> Option<f64> {
        let limit = self.limit(limit_type);
        if limit == 0 {
            return None;
        }
        let left = self
            .allowances()
            .get(&(client.to_string(), limit_type))
            .map_or(limit as f64, |a| a.left);
        Some(left)
    }

    /// Drop allowances of clients not seen for `max_age_secs`.
    pub fn cleanup(&self, max_age_secs: u64) {
        let now = Instant::now();
        self.allowances()
            .retain(|_, a| now.duration_since(a.seen).as_secs() < max_age_secs);
    }
}

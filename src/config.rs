//! # Stream configuration.
//!
//! [`Config`] centralizes the settings of one stream: the two backoff regimes,
//! the lifecycle bus size and line-reader limits. It is a plain struct with
//! public fields and a documented [`Default`].
//!
//! ## Sentinel values
//! - `max_line_bytes = 0` → no line length limit
//! - `connect_timeout = 0s` → no connect timeout
//! - `read_timeout = 0s` → a silent stream is never considered stalled

use std::time::Duration;

use crate::error::FaultKind;
use crate::policies::BackoffPolicy;

/// Configuration for one stream.
///
/// ## Field semantics
/// - `refused_backoff`: policy for connection faults carrying a status code
/// - `network_backoff`: policy for transport faults and status-less connection faults
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `max_line_bytes`: longest accepted line (`0` = unlimited)
/// - `connect_timeout`: connect timeout for [`HttpStreamFactory`](crate::HttpStreamFactory) (`0s` = none)
/// - `read_timeout`: longest silence on an open stream before it is dropped (`0s` = none)
#[derive(Clone, Debug)]
pub struct Config {
    /// Backoff applied when the remote refuses the connection with a status code.
    ///
    /// Exponential by default; past its ceiling the stream is closed.
    pub refused_backoff: BackoffPolicy,

    /// Backoff applied to network-level failures.
    ///
    /// Linear by default; clamped at its ceiling, retries forever.
    pub network_backoff: BackoffPolicy,

    /// Capacity of the lifecycle event broadcast channel.
    ///
    /// Slow receivers lagging more than `bus_capacity` events skip older ones.
    pub bus_capacity: usize,

    /// Maximum accepted line length in bytes.
    ///
    /// A longer line means the stream is out of sync and is treated as a
    /// transport fault.
    pub max_line_bytes: usize,

    /// Connect timeout used by the HTTP factory.
    pub connect_timeout: Duration,

    /// Longest wait for the next line of an open stream.
    ///
    /// Endpoints send blank keep-alive lines while idle, so silence past this
    /// limit means the connection is half-open. The supervisor treats it as a
    /// transport fault and reconnects with the network backoff.
    pub read_timeout: Duration,
}

impl Config {
    /// Returns the backoff policy for the given fault kind.
    #[inline]
    pub fn backoff_for(&self, kind: FaultKind) -> &BackoffPolicy {
        match kind {
            FaultKind::Refused => &self.refused_backoff,
            FaultKind::Network => &self.network_backoff,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the line length limit as an `Option` (`None` = unlimited).
    #[inline]
    pub fn line_limit(&self) -> Option<usize> {
        if self.max_line_bytes == 0 {
            None
        } else {
            Some(self.max_line_bytes)
        }
    }

    /// Returns the read timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn read_limit(&self) -> Option<Duration> {
        if self.read_timeout == Duration::ZERO {
            None
        } else {
            Some(self.read_timeout)
        }
    }

    /// Returns the connect timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn connect_limit(&self) -> Option<Duration> {
        if self.connect_timeout == Duration::ZERO {
            None
        } else {
            Some(self.connect_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `refused_backoff = 5s × 2^n`, closes once a wait would pass 320s
    /// - `network_backoff = 250ms + 250ms × n`, capped at 16s
    /// - `bus_capacity = 1024`
    /// - `max_line_bytes = 1 MiB`
    /// - `connect_timeout = 30s`
    /// - `read_timeout = 90s` (three missed 30s keep-alives)
    fn default() -> Self {
        Self {
            refused_backoff: BackoffPolicy::refused_default(),
            network_backoff: BackoffPolicy::network_default(),
            bus_capacity: 1024,
            max_line_bytes: 1024 * 1024,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(90),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::Ceiling;

    #[test]
    fn test_backoff_selected_by_kind() {
        let cfg = Config::default();
        assert_eq!(cfg.backoff_for(FaultKind::Refused).ceiling, Ceiling::GiveUp);
        assert_eq!(cfg.backoff_for(FaultKind::Network).ceiling, Ceiling::Clamp);
    }

    #[test]
    fn test_sentinels() {
        let cfg = Config {
            bus_capacity: 0,
            max_line_bytes: 0,
            connect_timeout: Duration::ZERO,
            read_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.line_limit(), None);
        assert_eq!(cfg.connect_limit(), None);
        assert_eq!(cfg.read_limit(), None);
        assert_eq!(Config::default().read_limit(), Some(Duration::from_secs(90)));
    }
}

//!
//! Time sources for the `created` signature parameter
//!
//! The signer never reads the system time directly. It asks an injected [`Clock`],
//! which makes it possible to back it by network time or to pin it in tests.
//!

use crate::BoxError;
use miette::Diagnostic;
use std::{
    future::Future,
    sync::{
        atomic::{AtomicI64, AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, SystemTimeError},
};
use thiserror::Error;
use tracing::{instrument, warn};

/// Clock error
#[derive(Debug, Diagnostic, Error)]
pub enum ClockError {
    /// Reading lies before the UNIX epoch
    #[error("Clock reading lies before the UNIX epoch")]
    BeforeUnixEpoch(#[from] SystemTimeError),

    /// Reading is older than a previous reading of the same clock
    #[error("Clock went backwards ({current} < {previous})")]
    WentBackwards {
        /// Previous reading in seconds since the epoch
        previous: u64,

        /// Current reading in seconds since the epoch
        current: u64,
    },

    /// Adjusted reading can't be represented
    #[error("Clock reading out of range")]
    OutOfRange,

    /// Time lookup failed
    #[error("Time lookup failed")]
    Lookup(#[source] BoxError),

    /// Time lookup didn't finish in time
    #[error("Time lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Conversion between [`SystemTime`] and UNIX timestamps
pub trait UnixTimestampExt: Sized {
    /// Construct from seconds since the epoch
    fn from_unix_timestamp(timestamp: u64) -> Result<Self, ClockError>;

    /// Seconds since the epoch
    fn to_unix_timestamp(&self) -> Result<u64, ClockError>;
}

impl UnixTimestampExt for SystemTime {
    fn from_unix_timestamp(timestamp: u64) -> Result<Self, ClockError> {
        SystemTime::UNIX_EPOCH
            .checked_add(Duration::from_secs(timestamp))
            .ok_or(ClockError::OutOfRange)
    }

    fn to_unix_timestamp(&self) -> Result<u64, ClockError> {
        Ok(self.duration_since(SystemTime::UNIX_EPOCH)?.as_secs())
    }
}

/// Source of the current time
pub trait Clock {
    /// Read the current time
    fn now(&self) -> Result<SystemTime, ClockError>;

    /// Read the current time as seconds since the UNIX epoch
    fn unix_timestamp(&self) -> Result<u64, ClockError> {
        self.now()?.to_unix_timestamp()
    }
}

impl<C> Clock for &C
where
    C: Clock + ?Sized,
{
    fn now(&self) -> Result<SystemTime, ClockError> {
        (**self).now()
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> Result<SystemTime, ClockError> {
        (**self).now()
    }
}

/// Local system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Result<SystemTime, ClockError> {
        Ok(SystemTime::now())
    }
}

/// Clock that always returns the same instant
///
/// `None` marks a timestamp that can't be represented as a [`SystemTime`], every reading fails
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(Option<SystemTime>);

impl FixedClock {
    /// Construct a clock pinned to the instant
    #[must_use]
    pub fn new(time: SystemTime) -> Self {
        Self(Some(time))
    }

    /// Construct a clock pinned to the UNIX timestamp
    #[must_use]
    pub fn from_unix_timestamp(timestamp: u64) -> Self {
        Self(SystemTime::from_unix_timestamp(timestamp).ok())
    }
}

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> Result<SystemTime, ClockError> {
        self.0.ok_or(ClockError::OutOfRange)
    }
}

/// Direction the delta should be adjusted in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaDirection {
    /// Add to the delta
    Add,

    /// Subtract from the delta
    Sub,
}

/// Handle to adjust the delta of a [`MockClock`]
#[derive(Clone, Debug)]
pub struct MockHandle {
    delta: Arc<AtomicI64>,
}

impl MockHandle {
    /// Adjust the delta by the duration in the direction specified
    pub fn adjust(&self, direction: DeltaDirection, delta: Duration) {
        let mut delta = i64::try_from(delta.as_nanos()).unwrap_or(i64::MAX);
        if direction == DeltaDirection::Sub {
            delta = -delta;
        }

        self.delta.fetch_add(delta, Ordering::AcqRel);
    }

    /// Set the delta to the absolute value in nanoseconds
    pub fn set_delta(&self, delta: i64) {
        self.delta.store(delta, Ordering::Release);
    }
}

/// System clock with an adjustable delta
#[derive(Clone, Debug)]
pub struct MockClock {
    delta: Arc<AtomicI64>,
}

impl MockClock {
    /// Construct a mock clock and the handle adjusting it
    #[must_use]
    pub fn new() -> (Self, MockHandle) {
        let delta = Arc::new(AtomicI64::default());
        let handle = MockHandle {
            delta: Arc::clone(&delta),
        };

        (Self { delta }, handle)
    }
}

impl Clock for MockClock {
    fn now(&self) -> Result<SystemTime, ClockError> {
        let now = SystemTime::now();
        let ns_delta = self.delta.load(Ordering::Acquire);
        let adjusted = if ns_delta.is_negative() {
            now.checked_sub(Duration::from_nanos(ns_delta.unsigned_abs()))
        } else {
            now.checked_add(Duration::from_nanos(ns_delta.unsigned_abs()))
        };

        adjusted.ok_or(ClockError::OutOfRange)
    }
}

/// Wrapper rejecting readings that are older than the previous one
#[derive(Debug)]
pub struct Monotonic<C> {
    inner: C,
    last: AtomicU64,
}

impl<C> Monotonic<C> {
    /// Wrap a clock
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: AtomicU64::new(0),
        }
    }
}

impl<C> Clock for Monotonic<C>
where
    C: Clock,
{
    fn now(&self) -> Result<SystemTime, ClockError> {
        let now = self.inner.now()?;
        let current = now.to_unix_timestamp()?;
        let previous = self.last.fetch_max(current, Ordering::AcqRel);

        if current < previous {
            return Err(ClockError::WentBackwards { previous, current });
        }

        Ok(now)
    }
}

/// Reason the fallback clock was consulted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// Lookup exceeded the timeout
    Timeout,

    /// Lookup failed with the contained error message
    Failed(String),
}

/// Where a [`ResolvedTime`] came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeSource {
    /// The primary (network) lookup
    Primary,

    /// The fallback clock
    Fallback(FallbackReason),
}

/// Time resolved through [`resolve`]
///
/// Acts as a [`Clock`] pinned to the resolved instant
#[derive(Clone, Debug)]
pub struct ResolvedTime {
    time: SystemTime,
    source: TimeSource,
}

impl ResolvedTime {
    /// Where the time came from
    #[must_use]
    pub fn source(&self) -> &TimeSource {
        &self.source
    }

    /// Whether the fallback clock had to be used
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, TimeSource::Fallback(..))
    }
}

impl Clock for ResolvedTime {
    #[inline]
    fn now(&self) -> Result<SystemTime, ClockError> {
        Ok(self.time)
    }
}

/// Resolve the current time through a (network) lookup bounded by a timeout
///
/// If the lookup fails or times out, the fallback clock is read instead.
/// The fallback is logged and recorded in [`ResolvedTime::source`].
#[instrument(skip_all, fields(timeout = ?timeout))]
pub async fn resolve<F, Fut, E, C>(
    lookup: F,
    timeout: Duration,
    fallback: &C,
) -> Result<ResolvedTime, ClockError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<SystemTime, E>>,
    E: Into<BoxError>,
    C: Clock + ?Sized,
{
    let error = match tokio::time::timeout(timeout, lookup()).await {
        Ok(Ok(time)) => {
            return Ok(ResolvedTime {
                time,
                source: TimeSource::Primary,
            })
        }
        Ok(Err(error)) => ClockError::Lookup(error.into()),
        Err(..) => ClockError::Timeout(timeout),
    };

    warn!(%error, "time lookup failed, falling back to the local clock");

    let reason = match error {
        ClockError::Timeout(..) => FallbackReason::Timeout,
        other => FallbackReason::Failed(other.to_string()),
    };

    Ok(ResolvedTime {
        time: fallback.now()?,
        source: TimeSource::Fallback(reason),
    })
}

#[cfg(test)]
mod test {
    use super::{
        Clock, ClockError, DeltaDirection, FallbackReason, FixedClock, MockClock, Monotonic,
        TimeSource, UnixTimestampExt,
    };
    use std::{
        future,
        io,
        time::{Duration, SystemTime},
    };

    #[test]
    fn fixed_clock() {
        let clock = FixedClock::from_unix_timestamp(1_658_440_308);
        assert_eq!(clock.unix_timestamp().unwrap(), 1_658_440_308);
    }

    #[test]
    fn can_forward() {
        let (clock, mock) = MockClock::new();

        let now = clock.now().unwrap();
        mock.adjust(DeltaDirection::Add, Duration::from_secs(1));
        let after = clock.now().unwrap();

        let delta = after.duration_since(now).unwrap();
        assert_eq!(delta.as_secs_f32().round() as u8, 1);
    }

    #[test]
    fn can_rewind() {
        let (clock, mock) = MockClock::new();

        let now = clock.now().unwrap();
        mock.adjust(DeltaDirection::Sub, Duration::from_secs(1));
        let after = clock.now().unwrap();

        let delta = now.duration_since(after).unwrap();
        assert_eq!(delta.as_secs_f32().round() as u8, 1);
    }

    #[test]
    fn unrepresentable_timestamp() {
        let clock = FixedClock::from_unix_timestamp(u64::MAX);
        assert!(matches!(clock.now(), Err(ClockError::OutOfRange)));
        assert!(SystemTime::from_unix_timestamp(u64::MAX).is_err());
    }

    #[test]
    fn pre_epoch_is_an_error() {
        let clock = FixedClock::new(SystemTime::UNIX_EPOCH - Duration::from_secs(1));
        assert!(matches!(
            clock.unix_timestamp(),
            Err(ClockError::BeforeUnixEpoch(..))
        ));
    }

    #[test]
    fn monotonic_detects_rewind() {
        let (clock, mock) = MockClock::new();
        let clock = Monotonic::new(clock);

        clock.now().unwrap();
        mock.adjust(DeltaDirection::Sub, Duration::from_secs(60));

        assert!(matches!(
            clock.now(),
            Err(ClockError::WentBackwards { .. })
        ));
    }

    #[tokio::test]
    async fn resolve_prefers_lookup() {
        let fallback = FixedClock::from_unix_timestamp(1);
        let resolved = super::resolve(
            || future::ready(SystemTime::from_unix_timestamp(42).map_err(io::Error::other)),
            Duration::from_secs(1),
            &fallback,
        )
        .await
        .unwrap();

        assert_eq!(resolved.source(), &TimeSource::Primary);
        assert_eq!(resolved.unix_timestamp().unwrap(), 42);
    }

    #[tokio::test]
    async fn resolve_falls_back_on_error() {
        let fallback = FixedClock::from_unix_timestamp(7);
        let resolved = super::resolve(
            || future::ready(Err::<SystemTime, _>(io::Error::other("unreachable"))),
            Duration::from_secs(1),
            &fallback,
        )
        .await
        .unwrap();

        assert!(resolved.is_fallback());
        assert!(matches!(
            resolved.source(),
            TimeSource::Fallback(FallbackReason::Failed(..))
        ));
        assert_eq!(resolved.unix_timestamp().unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_falls_back_on_timeout() {
        let fallback = FixedClock::from_unix_timestamp(7);
        let resolved = super::resolve(
            future::pending::<Result<SystemTime, io::Error>>,
            Duration::from_secs(5),
            &fallback,
        )
        .await
        .unwrap();

        assert_eq!(
            resolved.source(),
            &TimeSource::Fallback(FallbackReason::Timeout)
        );
        assert_eq!(resolved.unix_timestamp().unwrap(), 7);
    }
}

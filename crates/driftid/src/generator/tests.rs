use crate::{
    Accelerator, ClassicGenerator, Config, DEFAULT_BASE_TIME, Error, Generator, IdGenerator,
    Method, MonotonicClock, Options, Result, TimeSource,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::scope;

/// A fixed "now" inside the valid base time window.
pub(crate) const NOW: u64 = 1_760_000_000_000;

/// Unix millis for a time-tick under the default base time.
pub(crate) const fn at_tick(tick: u64) -> u64 {
    DEFAULT_BASE_TIME + tick
}

/// A settable clock. Scripted reads are served first, in order; each one also
/// becomes the clock's new resting value.
#[derive(Clone)]
pub(crate) struct MockClock {
    inner: Arc<MockClockInner>,
}

struct MockClockInner {
    millis: AtomicU64,
    script: Mutex<VecDeque<u64>>,
}

impl MockClock {
    pub(crate) fn at(millis: u64) -> Self {
        Self {
            inner: Arc::new(MockClockInner {
                millis: AtomicU64::new(millis),
                script: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub(crate) fn set(&self, millis: u64) {
        self.inner.millis.store(millis, Ordering::SeqCst);
    }

    pub(crate) fn script(&self, reads: impl IntoIterator<Item = u64>) {
        self.inner.script.lock().unwrap().extend(reads);
    }
}

impl TimeSource<u64> for MockClock {
    fn current_millis(&self) -> u64 {
        if let Some(next) = self.inner.script.lock().unwrap().pop_front() {
            self.inner.millis.store(next, Ordering::SeqCst);
            return next;
        }
        self.inner.millis.load(Ordering::SeqCst)
    }
}

/// A clock that advances by one millisecond every `reads_per_tick` reads, so
/// spin-waits always terminate.
pub(crate) struct TickingClock {
    start: u64,
    reads_per_tick: u64,
    reads: AtomicU64,
}

impl TickingClock {
    pub(crate) fn new(start: u64, reads_per_tick: u64) -> Self {
        Self {
            start,
            reads_per_tick,
            reads: AtomicU64::new(0),
        }
    }
}

impl TimeSource<u64> for TickingClock {
    fn current_millis(&self) -> u64 {
        let reads = self.reads.fetch_add(1, Ordering::Relaxed);
        self.start + reads / self.reads_per_tick
    }
}

pub(crate) fn config(options: Options) -> Config {
    options.validate_at(NOW).unwrap()
}

fn classic_config() -> Config {
    config(
        Options::default()
            .with_method(Method::Classic)
            .with_worker_id(3),
    )
}

#[test]
fn classic_sequence_starts_at_min_and_increments() {
    let config = classic_config();
    let generator = ClassicGenerator::new(config, MockClock::at(at_tick(100)));

    for expected in 5..=8 {
        let parts = config.decode(generator.try_next_id().unwrap());
        assert_eq!(parts.time_tick, 100);
        assert_eq!(parts.worker_id, 3);
        assert_eq!(parts.sequence, expected);
    }
}

#[test]
fn classic_waits_for_next_tick_when_exhausted() {
    let config = config(
        Options::default()
            .with_method(Method::Classic)
            .with_seq_bit_length(3),
    );
    let clock = MockClock::at(at_tick(100));
    let generator = ClassicGenerator::new(config, clock.clone());

    let sequences: Vec<u64> = (0..3)
        .map(|_| config.decode(generator.try_next_id().unwrap()).sequence)
        .collect();
    assert_eq!(sequences, [5, 6, 7]);

    // One read sees the exhausted tick, the wait polls twice before the clock
    // moves on.
    clock.script([at_tick(100), at_tick(100), at_tick(101)]);
    let parts = config.decode(generator.try_next_id().unwrap());
    assert_eq!(parts.time_tick, 101);
    assert_eq!(parts.sequence, 5);
}

#[test]
fn classic_fails_on_clock_rollback_until_clock_recovers() {
    let config = classic_config();
    let clock = MockClock::at(at_tick(100));
    let generator = ClassicGenerator::new(config, clock.clone());

    let before = generator.try_next_id().unwrap();

    clock.set(at_tick(97));
    let expected = Error::ClockRollback {
        last_tick: 100,
        current_tick: 97,
    };
    assert_eq!(generator.try_next_id(), Err(expected.clone()));
    assert_eq!(generator.try_next_id(), Err(expected));

    clock.set(at_tick(100));
    let after = generator.try_next_id().unwrap();
    assert!(after > before);
    assert_eq!(config.decode(after).sequence, 6);
}

#[test]
fn classic_threaded_ids_are_unique() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 4096;

    let generator = ClassicGenerator::new(classic_config(), MonotonicClock::new());
    let seen = Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let mut last = 0;
                for _ in 0..IDS_PER_THREAD {
                    let id = generator.try_next_id().unwrap();
                    assert!(id > last);
                    last = id;
                    assert!(seen.lock().unwrap().insert(id));
                }
            });
        }
    });

    assert_eq!(seen.lock().unwrap().len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn method_parses_codes_and_names() {
    assert_eq!("1".parse::<Method>().unwrap(), Method::Drift);
    assert_eq!("2".parse::<Method>().unwrap(), Method::Classic);
    assert_eq!("3".parse::<Method>().unwrap(), Method::NativeDrift);
    assert_eq!("4".parse::<Method>().unwrap(), Method::NativeClassic);
    assert_eq!("Drift".parse::<Method>().unwrap(), Method::Drift);
    assert_eq!(
        "native-classic".parse::<Method>().unwrap(),
        Method::NativeClassic
    );
    assert!(matches!(
        "5".parse::<Method>(),
        Err(Error::InvalidConfig { field: "method", .. })
    ));
}

#[test]
fn selector_runs_configured_in_process_strategy() {
    let drift = Generator::new(config(Options::default()), MockClock::at(at_tick(100)));
    assert_eq!(drift.active_method(), Method::Drift);

    let classic = Generator::new(classic_config(), MockClock::at(at_tick(100)));
    assert_eq!(classic.active_method(), Method::Classic);

    let ids = classic.try_next_ids(3).unwrap();
    let sequences: Vec<u64> = ids.iter().map(|id| classic.decode(*id).sequence).collect();
    assert_eq!(sequences, [5, 6, 7]);
}

#[test]
fn selector_classic_surfaces_rollback() {
    let clock = MockClock::at(at_tick(100));
    let generator = Generator::new(classic_config(), clock.clone());
    generator.try_next_id().unwrap();

    clock.set(at_tick(50));
    assert!(matches!(
        generator.try_next_id(),
        Err(Error::ClockRollback { .. })
    ));
}

#[test]
fn selector_drift_absorbs_rollback() {
    let options = Options::default().with_turn_back_delay_ms(0);
    let clock = MockClock::at(at_tick(100));
    let generator = Generator::new(config(options), clock.clone());
    let before = generator.try_next_id().unwrap();

    clock.set(at_tick(50));
    let turned_back = generator.try_next_id().unwrap();
    assert!(turned_back < before);
}

struct CountingAccelerator {
    serves: Method,
    next: AtomicU64,
}

impl IdGenerator for CountingAccelerator {
    fn try_next_id(&self) -> Result<u64> {
        Ok(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Accelerator for CountingAccelerator {
    fn supports(&self, method: Method) -> bool {
        method == self.serves
    }
}

struct FailingAccelerator;

impl IdGenerator for FailingAccelerator {
    fn try_next_id(&self) -> Result<u64> {
        Err(Error::Accelerator("extension unavailable".into()))
    }
}

impl Accelerator for FailingAccelerator {
    fn supports(&self, _: Method) -> bool {
        true
    }
}

#[test]
fn selector_delegates_to_capable_accelerator() {
    let accelerator: Arc<dyn Accelerator> = Arc::new(CountingAccelerator {
        serves: Method::NativeDrift,
        next: AtomicU64::new(1_000),
    });
    let generator = Generator::with_accelerator(
        config(Options::default().with_method(Method::NativeDrift)),
        MockClock::at(at_tick(100)),
        Some(accelerator),
    );

    assert_eq!(generator.active_method(), Method::NativeDrift);
    assert_eq!(generator.try_next_id().unwrap(), 1_000);
    assert_eq!(generator.try_next_id().unwrap(), 1_001);
}

#[test]
fn selector_falls_back_without_capable_accelerator() {
    let accelerator: Arc<dyn Accelerator> = Arc::new(CountingAccelerator {
        serves: Method::NativeDrift,
        next: AtomicU64::new(1_000),
    });
    let generator = Generator::with_accelerator(
        config(Options::default().with_method(Method::NativeClassic)),
        MockClock::at(at_tick(100)),
        Some(accelerator),
    );
    assert_eq!(generator.active_method(), Method::Classic);
    assert_eq!(generator.decode(generator.try_next_id().unwrap()).time_tick, 100);

    let generator = Generator::new(
        config(Options::default().with_method(Method::NativeDrift)),
        MockClock::at(at_tick(100)),
    );
    assert_eq!(generator.active_method(), Method::Drift);
}

#[test]
fn selector_passes_accelerator_errors_through() {
    let accelerator: Arc<dyn Accelerator> = Arc::new(FailingAccelerator);
    let generator = Generator::with_accelerator(
        config(Options::default().with_method(Method::NativeClassic)),
        MockClock::at(at_tick(100)),
        Some(accelerator),
    );
    assert_eq!(
        generator.try_next_id(),
        Err(Error::Accelerator("extension unavailable".into()))
    );
}

#[test]
fn selector_from_options_rejects_invalid_config() {
    let options = Options::default()
        .with_worker_id_bit_length(20)
        .with_seq_bit_length(10);
    assert!(matches!(
        Generator::from_options(&options, MockClock::at(NOW)),
        Err(Error::InvalidConfig { .. })
    ));
}

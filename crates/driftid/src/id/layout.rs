use crate::id::IdParts;

/// Bit layout of a generated ID.
///
/// The time-tick occupies everything above the worker and sequence fields, so
/// the number of bits left for time depends on the configured widths:
///
/// ```text
///  Bit Index:  63                   W+S  W+S-1            S  S-1           0
///              +------------------------+----------------+-----------------+
///  Field:      | time-tick (64 - W - S) | worker ID (W)  | sequence (S)    |
///              +------------------------+----------------+-----------------+
///              |<----------- MSB --------- 64 bits --------- LSB --------->|
/// ```
///
/// A time-tick that no longer fits silently loses its high bits. With the
/// default 6 + 6 bit widths that happens roughly 139 years after `base_time`.
///
/// # Example
///
/// ```
/// use driftid::Layout;
///
/// let layout = Layout::new(6, 6);
/// let id = layout.encode(1000, 2, 5);
/// let parts = layout.decode(id);
/// assert_eq!(parts.time_tick, 1000);
/// assert_eq!(parts.worker_id, 2);
/// assert_eq!(parts.sequence, 5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    worker_id_bits: u8,
    seq_bits: u8,
}

impl Layout {
    /// Creates a layout from raw bit widths.
    ///
    /// No range checks happen here; validated widths come from
    /// [`crate::Options::validate`].
    pub const fn new(worker_id_bits: u8, seq_bits: u8) -> Self {
        Self {
            worker_id_bits,
            seq_bits,
        }
    }

    /// Number of bits reserved for the worker code.
    pub const fn worker_id_bits(&self) -> u8 {
        self.worker_id_bits
    }

    /// Number of bits reserved for the sequence.
    pub const fn seq_bits(&self) -> u8 {
        self.seq_bits
    }

    /// Number of bits the time-tick is shifted left by.
    pub const fn timestamp_shift(&self) -> u32 {
        self.worker_id_bits as u32 + self.seq_bits as u32
    }

    /// Largest worker code representable in this layout.
    pub const fn max_worker_id(&self) -> u64 {
        (1u64 << self.worker_id_bits) - 1
    }

    /// Largest sequence value representable in this layout.
    pub const fn max_sequence(&self) -> u64 {
        (1u64 << self.seq_bits) - 1
    }

    /// Packs the three components into an ID.
    pub const fn encode(&self, time_tick: u64, worker_id: u64, sequence: u64) -> u64 {
        (time_tick << self.timestamp_shift())
            | ((worker_id & self.max_worker_id()) << self.seq_bits)
            | (sequence & self.max_sequence())
    }

    /// Splits an ID back into its components.
    pub const fn decode(&self, id: u64) -> IdParts {
        IdParts {
            time_tick: id >> self.timestamp_shift(),
            worker_id: (id >> self.seq_bits) & self.max_worker_id(),
            sequence: id & self.max_sequence(),
        }
    }
}

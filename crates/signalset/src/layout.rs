//! Byte layout of a command's response payload.
//!
//! [resolve_byte_map] answers "which signals live in byte N". A byte with more
//! than one occupant is storage shared by several signals, either sub-byte
//! fields packed together on purpose or a definition error; telling the two
//! apart is left to the caller.

use std::collections::BTreeSet;

use crate::signal::Signal;

/// Per-byte occupancy of a signal list, indexed by byte position.
///
/// Occupants are stored as indices into the signal slice the map was resolved from.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteMap<'a> {
    signals: &'a [Signal],
    bytes: Vec<BTreeSet<usize>>,
}

/// Computes which bytes each signal occupies.
///
/// The map covers `ceil(max(bix + len) / 8)` bytes over all signals that carry a
/// format. Signals without a format or with a zero bit length occupy nothing.
pub fn resolve_byte_map(signals: &[Signal]) -> ByteMap<'_> {
    let total_bits = signals
        .iter()
        .filter_map(Signal::bit_end)
        .max()
        .unwrap_or(0);

    let mut bytes = vec![BTreeSet::new(); total_bits.div_ceil(8)];

    for (index, signal) in signals.iter().enumerate() {
        if let Some(span) = signal.byte_span() {
            for slot in &mut bytes[span] {
                slot.insert(index);
            }
        }
    }

    let map = ByteMap { signals, bytes };
    if log::log_enabled!(log::Level::Trace) {
        for byte in map.shared_bytes() {
            log::trace!("byte {} shared by signals {:?}", byte, map.bytes[byte]);
        }
    }

    map
}

impl<'a> ByteMap<'a> {
    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Indices of the signals occupying `byte`. Empty past the end of the map.
    pub fn indices(&self, byte: usize) -> &BTreeSet<usize> {
        static EMPTY: BTreeSet<usize> = BTreeSet::new();
        self.bytes.get(byte).unwrap_or(&EMPTY)
    }

    /// Signals occupying `byte`, in input order.
    pub fn occupants(&self, byte: usize) -> impl Iterator<Item = &'a Signal> + '_ {
        let signals = self.signals;
        self.indices(byte).iter().map(move |&i| &signals[i])
    }

    /// True when more than one signal occupies `byte`.
    pub fn is_shared(&self, byte: usize) -> bool {
        self.indices(byte).len() > 1
    }

    /// Byte positions with more than one occupant, ascending.
    pub fn shared_bytes(&self) -> impl Iterator<Item = usize> + '_ {
        self.bytes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| (slot.len() > 1).then_some(i))
    }

    /// Occupant sets in ascending byte order.
    pub fn iter(&self) -> std::slice::Iter<'_, BTreeSet<usize>> {
        self.bytes.iter()
    }

    /// The signal list this map was resolved from.
    pub fn signals(&self) -> &'a [Signal] {
        self.signals
    }
}

#[cfg(test)]
mod tests {
    use crate::{keys, signal::Format};

    use super::*;

    fn signal(id: &str, offset: usize, length: usize) -> Signal {
        Signal::new(id, id).with_format(Format::bits(offset, length).unwrap())
    }

    #[test]
    fn test_empty_signal_list() {
        let map = resolve_byte_map(&[]);
        assert!(map.is_empty());
        assert_eq!(map.shared_bytes().count(), 0);
    }

    #[test]
    fn test_signals_without_format_take_no_room() {
        let signals = vec![Signal::new("A", "a"), Signal::new("B", "b")];
        assert!(resolve_byte_map(&signals).is_empty());
    }

    #[test]
    fn test_single_byte_signal() {
        let signals = vec![signal("A", 0, 8)];
        let map = resolve_byte_map(&signals);
        assert_eq!(map.len(), 1);
        assert_eq!(map.indices(0), &BTreeSet::from([0]));
    }

    #[test]
    fn test_signal_spanning_two_bytes() {
        let signals = vec![signal("A", 8, 16)];
        let map = resolve_byte_map(&signals);
        assert_eq!(map.len(), 3);
        assert!(map.indices(0).is_empty());
        assert_eq!(map.indices(1), &BTreeSet::from([0]));
        assert_eq!(map.indices(2), &BTreeSet::from([0]));
    }

    #[test]
    fn test_sub_byte_signal_shares_byte() {
        let signals = vec![signal("A", 0, 8), signal("B", 4, 4)];
        let map = resolve_byte_map(&signals);
        assert_eq!(map.len(), 1);
        assert_eq!(map.indices(0), &BTreeSet::from([0, 1]));
        assert!(map.is_shared(0));
    }

    #[test]
    fn test_overlap_into_next_byte() {
        let signals = vec![signal("A", 0, 8), signal("B", 6, 4)];
        let map = resolve_byte_map(&signals);

        assert_eq!(map.len(), 2);
        assert_eq!(map.indices(0), &BTreeSet::from([0, 1]));
        assert_eq!(map.indices(1), &BTreeSet::from([1]));

        let ids: Vec<_> = map.occupants(0).map(|s| s.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("A"), Some("B")]);
        assert_eq!(map.shared_bytes().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_length_rounds_up_to_whole_bytes() {
        let signals = vec![signal("A", 0, 1), signal("B", 16, 3)];
        let map = resolve_byte_map(&signals);
        assert_eq!(map.len(), 3);
        assert!(map.indices(1).is_empty());
        assert_eq!(map.indices(2), &BTreeSet::from([1]));
    }

    #[test]
    fn test_zero_length_signal_extends_map_but_occupies_nothing() {
        let signals = vec![signal("A", 0, 8), signal("B", 24, 0)];
        let map = resolve_byte_map(&signals);
        assert_eq!(map.len(), 3);
        assert!(map.indices(1).is_empty());
        assert!(map.indices(2).is_empty());
    }

    #[test]
    fn test_missing_bit_offset_counts_as_zero() {
        let mut format = Format::new();
        format.insert(keys::BIT_LENGTH, 12u64).unwrap();
        let signals = vec![Signal::new("A", "a").with_format(format)];

        let map = resolve_byte_map(&signals);
        assert_eq!(map.len(), 2);
        assert_eq!(map.indices(0), &BTreeSet::from([0]));
        assert_eq!(map.indices(1), &BTreeSet::from([0]));
    }

    #[test]
    fn test_indices_past_end_are_empty() {
        let signals = vec![signal("A", 0, 8)];
        let map = resolve_byte_map(&signals);
        assert!(map.indices(10).is_empty());
        assert_eq!(map.occupants(10).count(), 0);
        assert!(!map.is_shared(10));
    }
}

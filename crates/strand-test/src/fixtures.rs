//! Deterministic stream fixtures

use strand_core::{codec, Cid, Commit, StreamState, StreamType, UnixTimestamp};

/// Reference CIDs differing in a single digest byte
pub const FAKE_CID_1: &str = "bafybeig6xv5nwphfmvcnektpnojts33jqcuam7bmye2pb54adnrtccjlsu";
pub const FAKE_CID_2: &str = "bafybeig6xv5nwphfmvcnektpnojts44jqcuam7bmye2pb54adnrtccjlsu";

/// Deterministic CID for a small integer
pub fn fake_cid(n: u64) -> Cid {
    Cid::hash(codec::DAG_CBOR, &n.to_le_bytes())
}

/// Genesis-only tile stream seeded by `seed`
pub fn genesis_state(seed: u64) -> StreamState {
    StreamState::genesis(StreamType::Tile, fake_cid(seed << 32))
}

/// Genesis plus `len` signed commits. Equal arguments give equal (but
/// separately allocated) states.
pub fn linear_history(seed: u64, len: u64) -> StreamState {
    (1..=len).fold(genesis_state(seed), |state, n| {
        append_or_panic(&state, Commit::signed(fake_cid((seed << 32) + n)))
    })
}

/// Append an anchor commit for the current tip
pub fn anchored(state: &StreamState, at: UnixTimestamp) -> StreamState {
    let mut seed = state.tip().cid.to_bytes();
    seed.extend_from_slice(&at.as_secs().to_le_bytes());
    append_or_panic(state, Commit::anchor(Cid::hash(codec::DAG_JOSE, &seed), at))
}

fn append_or_panic(state: &StreamState, commit: Commit) -> StreamState {
    match state.append(commit) {
        Ok(next) => next,
        Err(e) => panic!("fixture produced an invalid log: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_history_is_deterministic() {
        assert_eq!(linear_history(1, 4), linear_history(1, 4));
        assert_ne!(linear_history(1, 4), linear_history(2, 4));
        assert!(linear_history(1, 2).is_prefix_of(&linear_history(1, 5)));
    }

    #[test]
    fn test_anchored() {
        let state = anchored(&linear_history(0, 2), UnixTimestamp(77));
        assert!(state.tip().is_anchor());
        assert_eq!(state.first_anchor_time(), Some(UnixTimestamp(77)));
    }

    #[test]
    fn test_reference_cids_parse() {
        assert_ne!(FAKE_CID_1.parse::<Cid>().unwrap(), FAKE_CID_2.parse::<Cid>().unwrap());
    }
}

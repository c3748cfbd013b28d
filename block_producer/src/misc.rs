use types::primitives::B256;

/// The node moniker, truncated or zero-padded to the 32 graffiti bytes.
#[must_use]
pub fn graffiti_from_moniker(moniker: &str) -> B256 {
    let mut graffiti = B256::ZERO;
    let bytes = moniker.as_bytes();
    let length = bytes.len().min(32);

    graffiti[..length].copy_from_slice(&bytes[..length]);
    graffiti
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_monikers_are_padded() {
        let graffiti = graffiti_from_moniker("node-7");

        assert_eq!(&graffiti[..6], b"node-7");
        assert!(graffiti[6..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn long_monikers_are_truncated() {
        let moniker = "a-rather-long-moniker-that-does-not-fit-in-graffiti";
        let graffiti = graffiti_from_moniker(moniker);

        assert_eq!(graffiti.as_slice(), &moniker.as_bytes()[..32]);
    }

    #[test]
    fn the_empty_moniker_stays_empty() {
        assert!(graffiti_from_moniker("").is_zero());
    }
}

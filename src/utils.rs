//! Identifier minting helpers

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique document id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Mint a UTR-style payment reference. Financial references must be
/// unique, so these come from uuid7 rather than timestamp+random.
pub fn new_utr() -> String {
    let id = uuid7().to_string().replace('-', "").to_uppercase();
    format!("UTR{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_unique_prefixed_ids() {
        let id1 = new_uuid_to_bech32("batch_").unwrap();
        let id2 = new_uuid_to_bech32("batch_").unwrap();

        assert!(id1.starts_with("batch_1"));
        assert_ne!(id1, id2);
    }

    #[test]
    fn utr_references_are_distinct() {
        let a = new_utr();
        let b = new_utr();

        assert!(a.starts_with("UTR"));
        assert!(a.len() > 3);
        assert_ne!(a, b);
    }
}

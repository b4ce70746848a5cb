//! Correlation of mempool data and node state into a confirmation request.

use crate::config::ConfirmationConfig;
use crate::mempool::{MempoolEntry, TxOutput};
use crate::node::proto::ConfRequest;
use crate::watch::types::{WatchError, WatchResult};

/// Height hint for a lookup starting `lookback` blocks below `best_height`.
///
/// Heights below the lookback clamp to 0. Plain unsigned subtraction would
/// wrap to a hint far above the tip; the clamp is deliberate.
pub fn height_hint(best_height: u32, lookback: u32) -> u32 {
    best_height.saturating_sub(lookback)
}

/// The transaction of interest: the first entry reported.
pub fn select_entry(entries: &[MempoolEntry]) -> WatchResult<&MempoolEntry> {
    entries.first().ok_or(WatchError::EmptyMempool)
}

/// Decode a txid from its hex form, byte for byte.
pub fn decode_txid(txid: &str) -> WatchResult<Vec<u8>> {
    hex::decode(txid).map_err(|source| WatchError::MalformedTxid {
        txid: txid.to_string(),
        source,
    })
}

/// Decode the script of the first output.
pub fn select_script(txid: &str, outputs: &[TxOutput]) -> WatchResult<Vec<u8>> {
    let output = outputs.first().ok_or_else(|| WatchError::NoOutputs {
        txid: txid.to_string(),
    })?;
    hex::decode(&output.scriptpubkey).map_err(|source| WatchError::MalformedScript {
        script: output.scriptpubkey.clone(),
        source,
    })
}

/// Assemble the request sent to open the subscription.
pub fn build_conf_request(
    txid: Vec<u8>,
    script: Vec<u8>,
    best_height: u32,
    config: &ConfirmationConfig,
) -> ConfRequest {
    ConfRequest {
        txid,
        script,
        num_confs: config.num_confs,
        height_hint: height_hint(best_height, config.height_hint_lookback),
        include_block: config.include_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(txid: &str) -> MempoolEntry {
        MempoolEntry {
            txid: txid.to_string(),
            fee: None,
            vsize: None,
            value: None,
        }
    }

    fn output(script: &str) -> TxOutput {
        TxOutput {
            scriptpubkey: script.to_string(),
            scriptpubkey_address: None,
        }
    }

    #[test]
    fn test_height_hint() {
        assert_eq!(height_hint(800_000, 6), 799_994);
        assert_eq!(height_hint(6, 6), 0);
        for h in 0..6 {
            assert_eq!(height_hint(h, 6), 0);
        }
    }

    #[test]
    fn test_empty_mempool_guard() {
        assert!(matches!(select_entry(&[]), Err(WatchError::EmptyMempool)));
        let entries = [entry("aa"), entry("bb")];
        assert_eq!(select_entry(&entries).unwrap().txid, "aa");
    }

    #[test]
    fn test_malformed_hex() {
        assert!(matches!(decode_txid("xyz"), Err(WatchError::MalformedTxid { .. })));
        assert!(matches!(decode_txid("abc"), Err(WatchError::MalformedTxid { .. })));
        assert!(matches!(
            select_script("aa", &[output("zz")]),
            Err(WatchError::MalformedScript { .. })
        ));
        assert!(matches!(
            select_script("aa", &[]),
            Err(WatchError::NoOutputs { .. })
        ));
    }

    #[test]
    fn test_build_request() {
        let txid = decode_txid("ab12").unwrap();
        let script = select_script("ab12", &[output("51"), output("00")]).unwrap();
        let req = build_conf_request(txid, script, 800_000, &ConfirmationConfig::default());

        assert_eq!(
            req,
            ConfRequest {
                txid: vec![0xab, 0x12],
                script: vec![0x51],
                num_confs: 1,
                height_hint: 799_994,
                include_block: false,
            }
        );
    }
}

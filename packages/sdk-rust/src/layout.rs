//! Fixed-layout on-chain account decoding.
//!
//! Each account kind is described once by a static [`LayoutSchema`]: an
//! ordered list of `(name, width, kind)` triples.  Offsets are never written
//! by hand; they are the running sum of the widths before a field, so the
//! memcmp offsets used for `getProgramAccounts` and the offsets used by
//! [`LayoutSchema::decode`] cannot drift apart.

use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};

// ─── Schema types ─────────────────────────────────────────────────────────────

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Little-endian unsigned integer, 1–16 bytes wide.
    Int,
    /// Raw bytes (32-byte fields are read back as addresses).
    Bytes,
}

/// One field of a fixed-size binary record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name:  &'static str,
    pub width: usize,
    pub kind:  FieldKind,
}

const fn int(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec { name, width, kind: FieldKind::Int }
}

const fn u64_le(name: &'static str) -> FieldSpec {
    int(name, 8)
}

const fn u128_le(name: &'static str) -> FieldSpec {
    int(name, 16)
}

const fn key(name: &'static str) -> FieldSpec {
    FieldSpec { name, width: 32, kind: FieldKind::Bytes }
}

const fn blob(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec { name, width, kind: FieldKind::Bytes }
}

/// Ordered description of a fixed-size binary record.
#[derive(Debug)]
pub struct LayoutSchema {
    name:   &'static str,
    fields: &'static [FieldSpec],
}

impl LayoutSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Sum of all declared field widths.
    pub fn total_width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Cumulative byte offset of `field`.
    pub fn offset_of(&self, field: &str) -> Result<usize> {
        let mut offset = 0usize;
        for spec in self.fields {
            if spec.name == field {
                return Ok(offset);
            }
            offset += spec.width;
        }
        Err(Error::UnknownField { schema: self.name, field: field.to_string() })
    }

    /// Decode every field of `data`.
    ///
    /// Fails with [`Error::Layout`] when `data` is shorter than
    /// [`total_width`](Self::total_width).  Trailing bytes are ignored.
    pub fn decode<'a>(&self, data: &'a [u8]) -> Result<DecodedRecord<'a>> {
        let needed = self.total_width();
        if data.len() < needed {
            return Err(Error::Layout { schema: self.name, needed, actual: data.len() });
        }

        let mut values = HashMap::with_capacity(self.fields.len());
        let mut offset = 0usize;
        for spec in self.fields {
            let end = offset
                .checked_add(spec.width)
                .filter(|end| *end <= data.len())
                .ok_or(Error::Layout { schema: self.name, needed, actual: data.len() })?;
            let raw = &data[offset..end];
            let value = match spec.kind {
                FieldKind::Int => FieldValue::Int(read_uint_le(raw).ok_or(Error::FieldKind {
                    schema: self.name,
                    field:  spec.name,
                    wanted: "integer of at most 16 bytes",
                })?),
                FieldKind::Bytes => FieldValue::Bytes(raw),
            };
            values.insert(spec.name, value);
            offset = end;
        }

        Ok(DecodedRecord { schema: self.name, values })
    }
}

// ─── Decoded values ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Int(u128),
    Bytes(&'a [u8]),
}

/// Field-name → value mapping produced by [`LayoutSchema::decode`].
#[derive(Debug)]
pub struct DecodedRecord<'a> {
    schema: &'static str,
    values: HashMap<&'static str, FieldValue<'a>>,
}

impl<'a> DecodedRecord<'a> {
    pub fn get(&self, field: &str) -> Result<FieldValue<'a>> {
        self.values
            .get(field)
            .copied()
            .ok_or_else(|| Error::UnknownField { schema: self.schema, field: field.to_string() })
    }

    pub fn int(&self, field: &'static str) -> Result<u128> {
        match self.get(field)? {
            FieldValue::Int(v) => Ok(v),
            FieldValue::Bytes(_) => Err(self.kind_error(field, "integer")),
        }
    }

    pub fn u64(&self, field: &'static str) -> Result<u64> {
        u64::try_from(self.int(field)?).map_err(|_| self.kind_error(field, "u64"))
    }

    pub fn u8(&self, field: &'static str) -> Result<u8> {
        u8::try_from(self.int(field)?).map_err(|_| self.kind_error(field, "u8"))
    }

    pub fn bytes(&self, field: &'static str) -> Result<&'a [u8]> {
        match self.get(field)? {
            FieldValue::Bytes(b) => Ok(b),
            FieldValue::Int(_) => Err(self.kind_error(field, "bytes")),
        }
    }

    pub fn pubkey(&self, field: &'static str) -> Result<Pubkey> {
        let b: [u8; 32] = self
            .bytes(field)?
            .try_into()
            .map_err(|_| self.kind_error(field, "32-byte address"))?;
        Ok(Pubkey::from(b))
    }

    fn kind_error(&self, field: &'static str, wanted: &'static str) -> Error {
        Error::FieldKind { schema: self.schema, field, wanted }
    }
}

fn read_uint_le(raw: &[u8]) -> Option<u128> {
    if raw.len() > 16 {
        return None;
    }
    let mut buf = [0u8; 16];
    buf[..raw.len()].copy_from_slice(raw);
    Some(u128::from_le_bytes(buf))
}

// ─── Raydium AMM v4 ───────────────────────────────────────────────────────────

/// Raydium Liquidity Pool V4 `AmmInfo` account (752 bytes).
///
/// ```text
/// 32 × u64 parameters / fees / pnl (256)
/// swap totals: u128 u128 u64 u128 u128 u64 (80)
/// 13 × Pubkey (416)                                     = 752 bytes
/// ```
pub static AMM_INFO_LAYOUT_V4: LayoutSchema = LayoutSchema::new("amm_info_v4", &[
    u64_le("status"),
    u64_le("nonce"),
    u64_le("orderNum"),
    u64_le("depth"),
    u64_le("coinDecimals"),
    u64_le("pcDecimals"),
    u64_le("state"),
    u64_le("resetFlag"),
    u64_le("minSize"),
    u64_le("volMaxCutRatio"),
    u64_le("amountWaveRatio"),
    u64_le("coinLotSize"),
    u64_le("pcLotSize"),
    u64_le("minPriceMultiplier"),
    u64_le("maxPriceMultiplier"),
    u64_le("systemDecimalsValue"),
    u64_le("minSeparateNumerator"),
    u64_le("minSeparateDenominator"),
    u64_le("tradeFeeNumerator"),
    u64_le("tradeFeeDenominator"),
    u64_le("pnlNumerator"),
    u64_le("pnlDenominator"),
    u64_le("swapFeeNumerator"),
    u64_le("swapFeeDenominator"),
    u64_le("needTakePnlCoin"),
    u64_le("needTakePnlPc"),
    u64_le("totalPnlPc"),
    u64_le("totalPnlCoin"),
    u64_le("poolOpenTime"),
    u64_le("punishPcAmount"),
    u64_le("punishCoinAmount"),
    u64_le("orderbookToInitTime"),
    u128_le("swapCoinInAmount"),
    u128_le("swapPcOutAmount"),
    u64_le("swapCoin2PcFee"),
    u128_le("swapPcInAmount"),
    u128_le("swapCoinOutAmount"),
    u64_le("swapPc2CoinFee"),
    key("poolCoinTokenAccount"),
    key("poolPcTokenAccount"),
    key("coinMintAddress"),
    key("pcMintAddress"),
    key("lpMintAddress"),
    key("ammOpenOrders"),
    key("serumMarket"),
    key("serumProgramId"),
    key("ammTargetOrders"),
    key("poolWithdrawQueue"),
    key("poolTempLpTokenAccount"),
    key("ammOwner"),
    key("pnlOwner"),
]);

// ─── OpenBook / Serum market v3 ───────────────────────────────────────────────

/// Serum DEX v3 `MarketState` account (388 bytes), including the 5-byte
/// `"serum"` head and 7-byte `"padding"` tail.
pub static MARKET_STATE_LAYOUT_V3: LayoutSchema = LayoutSchema::new("market_state_v3", &[
    blob("blobHead", 5),
    u64_le("accountFlags"),
    key("ownAddress"),
    u64_le("vaultSignerNonce"),
    key("baseMint"),
    key("quoteMint"),
    key("baseVault"),
    u64_le("baseDepositsTotal"),
    u64_le("baseFeesAccrued"),
    key("quoteVault"),
    u64_le("quoteDepositsTotal"),
    u64_le("quoteFeesAccrued"),
    u64_le("quoteDustThreshold"),
    key("requestQueue"),
    key("eventQueue"),
    key("bids"),
    key("asks"),
    u64_le("baseLotSize"),
    u64_le("quoteLotSize"),
    u64_le("feeRateBps"),
    u64_le("referrerRebatesAccrued"),
    blob("blobTail", 7),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_widths_match_account_sizes() {
        assert_eq!(AMM_INFO_LAYOUT_V4.total_width(), 752);
        assert_eq!(MARKET_STATE_LAYOUT_V3.total_width(), 388);
    }

    #[test]
    fn mint_offsets_match_known_filters() {
        assert_eq!(AMM_INFO_LAYOUT_V4.offset_of("coinMintAddress").unwrap(), 400);
        assert_eq!(AMM_INFO_LAYOUT_V4.offset_of("pcMintAddress").unwrap(), 432);
        assert_eq!(MARKET_STATE_LAYOUT_V3.offset_of("vaultSignerNonce").unwrap(), 45);
        assert_eq!(MARKET_STATE_LAYOUT_V3.offset_of("bids").unwrap(), 285);
    }

    #[test]
    fn offset_of_is_stable_and_first_field_is_zero() {
        for schema in [&AMM_INFO_LAYOUT_V4, &MARKET_STATE_LAYOUT_V3] {
            assert_eq!(schema.offset_of(schema.fields()[0].name).unwrap(), 0);
            for spec in schema.fields() {
                assert_eq!(schema.offset_of(spec.name).unwrap(), schema.offset_of(spec.name).unwrap());
            }
        }
    }

    #[test]
    fn unknown_field_is_reported() {
        let err = AMM_INFO_LAYOUT_V4.offset_of("notAField").unwrap_err();
        assert!(matches!(err, Error::UnknownField { schema: "amm_info_v4", .. }));
    }

    #[test]
    fn short_buffer_is_rejected_without_partial_output() {
        let data = vec![0u8; 751];
        let err = AMM_INFO_LAYOUT_V4.decode(&data).unwrap_err();
        assert!(matches!(err, Error::Layout { needed: 752, actual: 751, .. }));
    }

    #[test]
    fn decode_reads_each_field_at_its_offset() {
        // Stamp every field with a value derived from its own offset, then
        // check decode reads back exactly that value.
        let schema = &MARKET_STATE_LAYOUT_V3;
        let mut data = vec![0u8; schema.total_width() + 12];
        for spec in schema.fields() {
            let off = schema.offset_of(spec.name).unwrap();
            match spec.kind {
                FieldKind::Int => data[off..off + 8].copy_from_slice(&(off as u64).to_le_bytes()),
                FieldKind::Bytes => data[off..off + spec.width].fill(off as u8),
            }
        }

        let rec = schema.decode(&data).unwrap();
        assert_eq!(rec.u64("vaultSignerNonce").unwrap(), 45);
        assert_eq!(rec.u64("referrerRebatesAccrued").unwrap(), 373);
        assert_eq!(rec.pubkey("bids").unwrap(), Pubkey::from([(285 % 256) as u8; 32]));
        assert_eq!(rec.bytes("blobTail").unwrap(), &[(381 % 256) as u8; 7]);
    }

    #[test]
    fn wide_integers_decode_little_endian() {
        let mut data = vec![0u8; 752];
        let off = AMM_INFO_LAYOUT_V4.offset_of("swapPcInAmount").unwrap();
        data[off..off + 16].copy_from_slice(&(u128::MAX - 7).to_le_bytes());
        let rec = AMM_INFO_LAYOUT_V4.decode(&data).unwrap();
        assert_eq!(rec.int("swapPcInAmount").unwrap(), u128::MAX - 7);
        assert!(matches!(rec.u64("swapPcInAmount"), Err(Error::FieldKind { .. })));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let data = vec![0u8; 388];
        let rec = MARKET_STATE_LAYOUT_V3.decode(&data).unwrap();
        assert!(matches!(rec.pubkey("baseLotSize"), Err(Error::FieldKind { .. })));
        assert!(matches!(rec.u64("bids"), Err(Error::FieldKind { .. })));
        assert!(matches!(rec.pubkey("blobHead"), Err(Error::FieldKind { .. })));
    }
}

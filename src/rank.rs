//! Fractional rank keys for collaboratively ordered lists.
//!
//! A rank key is a base-36 digit string: a fixed-width six-digit integer
//! part plus an optional fraction that never ends in `0`. Entries sort by
//! plain byte comparison of their keys, so the backend and every client
//! agree on the order without decoding anything. Only key *generation*
//! does arithmetic; comparison stays string-shaped all the way down.
//!
//! Design decisions:
//!
//! - Fixed-width integer part. Variable-width integers would need a
//!   length prefix to sort correctly as strings; six digits give about
//!   2.2 billion coarse slots, far more than any grocery list needs.
//! - `next` steps by a whole bucket (36^3) and drops the fraction.
//!   Appending stays cheap and short; precision is only spent by
//!   `between` when somebody squeezes into a gap.
//! - No trailing `0` in fractions. `"i0"` and `"i"` would denote the
//!   same point but compare unequal as strings; canonical form keeps the
//!   string order an exact image of the numeric order.
//! - Keys are immutable. Reordering an entry mints a new key and leaves
//!   every other entry untouched, which is what keeps concurrent drags
//!   from different clients mergeable.

use smallvec::SmallVec;
use thiserror::Error;

/// The digit alphabet, in byte order.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of digits in the fixed-width integer part of every key.
pub const INT_WIDTH: usize = 6;

/// Coarse spacing between successive appended keys: one bucket of 36^3.
pub const STEP: u64 = 46_656;

/// Upper bound on fraction digits. Beyond this a list is so contested
/// that callers re-rank instead of growing keys without limit.
pub const MAX_FRAC: usize = 66;

/// Total number of integer slots in the key space: 36^6.
const KEY_SPACE: u64 = 2_176_782_336;

/// Inline digit capacity. Covers the integer part plus the fraction depth
/// reached by ordinary editing without touching the heap.
const INLINE_DIGITS: usize = 22;

/// Errors from rank key generation and parsing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RankError {
    /// `between` was called with a lower bound at or above the upper
    /// bound. That is a caller bug; the bounds are never swapped silently.
    #[error("invalid range: {lo} is not below {hi}")]
    InvalidRange { lo: String, hi: String },

    /// A key string fell outside the key grammar.
    #[error("malformed rank key {0:?}")]
    MalformedKey(String),

    /// The key space has no headroom left at the requested position.
    /// The list owning the keys must be re-ranked.
    #[error("rank key space exhausted")]
    KeyExhaustion,
}

/// An immutable fractional sort key.
///
/// `RankKey` ordering is the byte ordering of its digits, which by
/// construction equals the numeric ordering of the positions the keys
/// denote. Between any two distinct keys another key can be generated,
/// up to the [`MAX_FRAC`] precision bound.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RankKey {
    digits: SmallVec<[u8; INLINE_DIGITS]>,
}

impl RankKey {
    /// The canonical midpoint of the key space. Seeds the first entry of
    /// an empty list so growth in both directions stays symmetric.
    pub fn middle() -> RankKey {
        return RankKey::from_int(KEY_SPACE / 2);
    }

    /// The key one coarse bucket above this one, fraction dropped.
    ///
    /// Fails with [`RankError::KeyExhaustion`] once the integer part has
    /// no room left for a whole bucket.
    pub fn next(&self) -> Result<RankKey, RankError> {
        let bumped = self.int_value() + STEP;
        if bumped >= KEY_SPACE {
            return Err(RankError::KeyExhaustion);
        }
        return Ok(RankKey::from_int(bumped));
    }

    /// A key strictly between `lo` and `hi`.
    ///
    /// Prefers a fresh integer bucket when one fits; otherwise grows a
    /// fraction on top of `lo`'s integer part. Fails with
    /// [`RankError::InvalidRange`] unless `lo < hi`, and with
    /// [`RankError::KeyExhaustion`] if the midpoint would need a fraction
    /// longer than [`MAX_FRAC`].
    pub fn between(lo: &RankKey, hi: &RankKey) -> Result<RankKey, RankError> {
        if lo >= hi {
            return Err(RankError::InvalidRange {
                lo: lo.to_string(),
                hi: hi.to_string(),
            });
        }

        let int_lo = lo.int_value();
        let int_hi = hi.int_value();

        // A whole bucket fits between the integer parts: stay coarse and
        // keep the key short.
        if int_hi - int_lo > 1 {
            return Ok(RankKey::from_int(int_lo + (int_hi - int_lo) / 2));
        }

        // Same integer part: subdivide between the two fractions.
        // Adjacent integer parts: subdivide between `lo`'s fraction and
        // the open top of the fraction space.
        let upper = if int_lo == int_hi { Some(hi.frac()) } else { None };
        let frac = mid_frac(lo.frac(), upper);
        if frac.len() > MAX_FRAC {
            return Err(RankError::KeyExhaustion);
        }

        let mut key = RankKey::from_int(int_lo);
        key.digits.extend_from_slice(&frac);
        return Ok(key);
    }

    /// Parse a key from its wire form, validating the full grammar:
    /// exactly [`INT_WIDTH`] digits, then at most [`MAX_FRAC`] fraction
    /// digits not ending in `0`, all drawn from [`ALPHABET`].
    pub fn parse(s: &str) -> Result<RankKey, RankError> {
        let bytes = s.as_bytes();
        if bytes.len() < INT_WIDTH || bytes.len() > INT_WIDTH + MAX_FRAC {
            return Err(RankError::MalformedKey(s.to_string()));
        }
        let all_digits = bytes
            .iter()
            .all(|&d| d.is_ascii_digit() || d.is_ascii_lowercase());
        if !all_digits {
            return Err(RankError::MalformedKey(s.to_string()));
        }
        if bytes.len() > INT_WIDTH && bytes[bytes.len() - 1] == ALPHABET[0] {
            return Err(RankError::MalformedKey(s.to_string()));
        }
        return Ok(RankKey {
            digits: SmallVec::from_slice(bytes),
        });
    }

    /// The key's digits as a string slice. This is the wire form.
    pub fn as_str(&self) -> &str {
        // Digits are drawn from the ASCII alphabet at construction.
        return std::str::from_utf8(&self.digits).expect("key digits are ascii");
    }

    /// Render an integer slot as a fixed-width key with no fraction.
    fn from_int(value: u64) -> RankKey {
        debug_assert!(value < KEY_SPACE);
        let mut digits: SmallVec<[u8; INLINE_DIGITS]> = SmallVec::new();
        digits.resize(INT_WIDTH, ALPHABET[0]);
        let mut v = value;
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(v % 36) as usize];
            v /= 36;
        }
        return RankKey { digits };
    }

    /// The integer part as a number.
    fn int_value(&self) -> u64 {
        let mut v = 0u64;
        for &d in &self.digits[..INT_WIDTH] {
            v = v * 36 + digit_value(d) as u64;
        }
        return v;
    }

    /// The fraction digits, possibly empty.
    fn frac(&self) -> &[u8] {
        return &self.digits[INT_WIDTH..];
    }
}

impl std::fmt::Display for RankKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.as_str());
    }
}

impl std::fmt::Debug for RankKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "RankKey({})", self.as_str());
    }
}

/// Numeric value of an alphabet digit.
fn digit_value(d: u8) -> u8 {
    return match d {
        b'0'..=b'9' => d - b'0',
        b'a'..=b'z' => d - b'a' + 10,
        // Keys only ever hold alphabet digits; `parse` enforces it.
        _ => unreachable!("non-alphabet digit in rank key"),
    };
}

/// Midpoint of two fractions, as alphabet digits.
///
/// `lo` is the lower fraction, where empty means zero. `hi` is the upper
/// fraction, or `None` for the open top of the fraction space (one whole).
/// Requires `lo < hi` once `lo` is zero-padded to `hi`'s length; callers
/// establish this from the ordering of the enclosing keys. The result is
/// strictly between the two and never ends in `0`.
fn mid_frac(lo: &[u8], hi: Option<&[u8]>) -> SmallVec<[u8; INLINE_DIGITS]> {
    let mut out = SmallVec::new();
    mid_frac_into(lo, hi, &mut out);
    return out;
}

fn mid_frac_into(lo: &[u8], hi: Option<&[u8]>, out: &mut SmallVec<[u8; INLINE_DIGITS]>) {
    if let Some(hi) = hi {
        // The midpoint shares the longest common prefix of the bounds,
        // with `lo` read as zero-padded.
        let mut n = 0;
        while n < hi.len() && *lo.get(n).unwrap_or(&ALPHABET[0]) == hi[n] {
            n += 1;
        }
        if n > 0 {
            out.extend_from_slice(&hi[..n]);
            let lo_rest = &lo[n.min(lo.len())..];
            return mid_frac_into(lo_rest, Some(&hi[n..]), out);
        }
    }

    let lo_digit = lo.first().map(|&d| digit_value(d)).unwrap_or(0);
    let hi_digit = match hi {
        Some(hi) => digit_value(hi[0]),
        None => 36,
    };

    // A digit fits between the leading digits: one digit settles it.
    if hi_digit - lo_digit > 1 {
        out.push(ALPHABET[((lo_digit + hi_digit) / 2) as usize]);
        return;
    }

    // Leading digits are consecutive. If the upper bound has more digits,
    // its first digit alone already lands strictly between the bounds.
    // Otherwise adopt the lower digit and subdivide the rest of `lo`
    // against an open top.
    match hi {
        Some(hi) if hi.len() > 1 => {
            out.push(hi[0]);
            return;
        }
        _ => {
            out.push(ALPHABET[lo_digit as usize]);
            let lo_rest = if lo.is_empty() { &[][..] } else { &lo[1..] };
            return mid_frac_into(lo_rest, None, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RankKey {
        return RankKey::parse(s).unwrap();
    }

    #[test]
    fn middle_is_the_halfway_slot() {
        assert_eq!(RankKey::middle().to_string(), "i00000");
    }

    #[test]
    fn next_steps_one_bucket() {
        let a = RankKey::middle();
        let b = a.next().unwrap();
        assert_eq!(b.to_string(), "i01000");
        assert!(a < b);
    }

    #[test]
    fn next_drops_the_fraction() {
        let a = key("i000005");
        let b = a.next().unwrap();
        assert_eq!(b.to_string(), "i01000");
        assert!(a < b);
    }

    #[test]
    fn next_exhausts_at_the_top() {
        let top = key("zzzzzz");
        assert_eq!(top.next(), Err(RankError::KeyExhaustion));
    }

    #[test]
    fn between_rejects_inverted_bounds() {
        let a = RankKey::middle();
        let b = a.next().unwrap();
        assert!(matches!(
            RankKey::between(&b, &a),
            Err(RankError::InvalidRange { .. })
        ));
        assert!(matches!(
            RankKey::between(&a, &a),
            Err(RankError::InvalidRange { .. })
        ));
    }

    #[test]
    fn wide_gaps_stay_coarse() {
        let a = RankKey::middle();
        let b = a.next().unwrap();
        let mid = RankKey::between(&a, &b).unwrap();
        assert!(a < mid && mid < b);
        assert_eq!(mid.to_string().len(), INT_WIDTH, "no fraction spent: {mid}");
    }

    #[test]
    fn adjacent_buckets_grow_a_fraction() {
        let a = key("i00000");
        let b = key("i00001");
        let mid = RankKey::between(&a, &b).unwrap();
        assert!(a < mid && mid < b);
        assert_eq!(mid.to_string(), "i00000i");
    }

    #[test]
    fn same_bucket_subdivides_fractions() {
        let a = key("i000004");
        let b = key("i000008");
        let mid = RankKey::between(&a, &b).unwrap();
        assert_eq!(mid.to_string(), "i000006");
    }

    #[test]
    fn consecutive_fraction_digits_recurse() {
        let a = key("i000004");
        let b = key("i000005");
        let mid = RankKey::between(&a, &b).unwrap();
        assert_eq!(mid.to_string(), "i000004i");
        assert!(a < mid && mid < b);
    }

    #[test]
    fn empty_lower_fraction_pads_with_zeros() {
        let a = key("i00000");
        let b = key("i0000001");
        let mid = RankKey::between(&a, &b).unwrap();
        assert!(a < mid && mid < b);
        assert_eq!(mid.to_string(), "i0000000i");
    }

    #[test]
    fn midpoints_never_end_in_zero() {
        let a = key("i00000");
        let mut hi = key("i00001");
        for _ in 0..80 {
            let mid = RankKey::between(&a, &hi).unwrap();
            assert!(a < mid && mid < hi);
            assert_ne!(mid.as_str().as_bytes().last(), Some(&b'0'));
            hi = mid;
        }
    }

    #[test]
    fn thirty_bisections_always_fit() {
        // Squeeze toward the lower bound from the tightest coarse start.
        let lo = key("i00000");
        let mut hi = key("i00001");
        for _ in 0..30 {
            hi = RankKey::between(&lo, &hi).unwrap();
        }
        // And toward the upper bound.
        let hi = key("i00001");
        let mut lo = key("i00000");
        for _ in 0..30 {
            lo = RankKey::between(&lo, &hi).unwrap();
        }
    }

    #[test]
    fn exhaustion_past_the_precision_bound() {
        let mut long = String::from("i00000");
        for _ in 0..MAX_FRAC - 1 {
            long.push('1');
        }
        let a = RankKey::parse(&format!("{long}1")).unwrap();
        let b = RankKey::parse(&format!("{long}2")).unwrap();
        assert_eq!(a.frac().len(), MAX_FRAC);
        assert_eq!(RankKey::between(&a, &b), Err(RankError::KeyExhaustion));
    }

    #[test]
    fn parse_round_trips() {
        for s in ["000000", "i00000", "zzzzzz", "i00000i", "a1b2c39"] {
            assert_eq!(RankKey::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        let overlong = format!("i00000{}1", "1".repeat(MAX_FRAC));
        for s in ["", "i0000", "I00000", "i00 00", "i000000", &overlong] {
            assert!(RankKey::parse(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn ordering_is_string_ordering() {
        let mut keys = vec![
            key("i00001"),
            key("i00000i"),
            key("i00000"),
            key("0zzzzz"),
            key("i000004i"),
            key("i000004"),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let mut by_string = rendered.clone();
        by_string.sort();
        assert_eq!(rendered, by_string);
    }
}

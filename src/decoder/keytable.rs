use serde::{Deserialize, Serialize};

/// US layout, HID Usage Tables chapter 10, keycodes 0..=57.
///
/// Codes 0-3 are reserved or error roll-over, 50 is the non-US `#` key and 57 is
/// Caps Lock. They produce nothing.
const US_UNSHIFTED: [&str; 58] = [
    "", "", "", "", "a", "b", "c", "d", "e", "f", //
    "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", //
    "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", //
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", //
    "\n", "\u{1b}", "\u{8}", "\t", " ", "-", "=", "[", "]", "\\", //
    "", ";", "'", "`", ",", ".", "/", "",
];

const US_SHIFTED: [&str; 58] = [
    "", "", "", "", "A", "B", "C", "D", "E", "F", //
    "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", //
    "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z", //
    "!", "@", "#", "$", "%", "^", "&", "*", "(", ")", //
    "\n", "\u{1b}", "\u{8}", "\t", " ", "_", "+", "{", "}", "|", //
    "", ":", "\"", "~", "<", ">", "?", "",
];

/// Two parallel keycode -> text tables, one per shift state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKeyTable", into = "RawKeyTable")]
pub struct KeyTable {
    unshifted: Vec<String>,
    shifted: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("key tables differ in length: {unshifted} unshifted vs {shifted} shifted")]
pub struct KeyTableMismatch {
    pub unshifted: usize,
    pub shifted: usize,
}

impl KeyTable {
    pub fn new(unshifted: Vec<String>, shifted: Vec<String>) -> Result<Self, KeyTableMismatch> {
        if unshifted.len() != shifted.len() {
            return Err(KeyTableMismatch {
                unshifted: unshifted.len(),
                shifted: shifted.len(),
            });
        }
        Ok(KeyTable { unshifted, shifted })
    }

    pub fn us_english() -> Self {
        KeyTable {
            unshifted: US_UNSHIFTED.iter().map(|s| s.to_string()).collect(),
            shifted: US_SHIFTED.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Number of keycodes covered; valid keycodes are `0..len()`.
    pub fn len(&self) -> usize {
        self.unshifted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unshifted.is_empty()
    }

    pub fn lookup(&self, keycode: u8, shifted: bool) -> Option<&str> {
        let table = if shifted { &self.shifted } else { &self.unshifted };
        table.get(usize::from(keycode)).map(String::as_str)
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        KeyTable::us_english()
    }
}

#[derive(Serialize, Deserialize)]
struct RawKeyTable {
    unshifted: Vec<String>,
    shifted: Vec<String>,
}

impl TryFrom<RawKeyTable> for KeyTable {
    type Error = KeyTableMismatch;

    fn try_from(raw: RawKeyTable) -> Result<Self, Self::Error> {
        KeyTable::new(raw.unshifted, raw.shifted)
    }
}

impl From<KeyTable> for RawKeyTable {
    fn from(table: KeyTable) -> Self {
        RawKeyTable {
            unshifted: table.unshifted,
            shifted: table.shifted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_tables_cover_keycodes_0_to_57() {
        let table = KeyTable::us_english();
        assert_eq!(table.len(), 58);
        assert_eq!(table.lookup(57, false), Some(""));
        assert_eq!(table.lookup(58, false), None);
        assert_eq!(table.lookup(58, true), None);
    }

    #[test]
    fn digits_and_symbols_share_a_keycode() {
        let table = KeyTable::us_english();
        assert_eq!(table.lookup(30, false), Some("1"));
        assert_eq!(table.lookup(30, true), Some("!"));
        assert_eq!(table.lookup(4, false), Some("a"));
        assert_eq!(table.lookup(4, true), Some("A"));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = KeyTable::new(vec!["a".into(), "b".into()], vec!["A".into()]).unwrap_err();
        assert_eq!(err.unshifted, 2);
        assert_eq!(err.shifted, 1);
    }
}

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Image file store for blob columns.

use crate::config::FILENAME_PLACEHOLDER;
use crate::error::BlobError;
use log::debug;
use std::fs;
use std::path::PathBuf;

/// Writes decoded blobs to numbered files.
///
/// The serial number only moves forward within a run and is never persisted:
/// the caller reports [`BlobStore::next_number`] so the next run can carry on
/// from there.
#[derive(Debug)]
pub struct BlobStore {
    dir: PathBuf,
    template: String,
    next_number: u64,
    stored: u64,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>, template: impl Into<String>, first_number: u64) -> Self {
        BlobStore {
            dir: dir.into(),
            template: template.into(),
            next_number: first_number,
            stored: 0,
        }
    }

    /// Decode `hex_digits` and write them to a new file, returning its name.
    ///
    /// Malformed hex does not use up a serial number. A failed write does.
    pub fn store(&mut self, hex_digits: &str, year: &str, plan: &str) -> Result<String, BlobError> {
        let bytes = decode_hex(hex_digits)?;
        let number = self.next_number.to_string();
        let filename = render_filename(&self.template, &[year, plan, &number]);
        self.next_number += 1;

        let path = self.dir.join(&filename);
        fs::write(&path, &bytes).map_err(|source| BlobError::Write { path, source })?;
        self.stored += 1;
        debug!("stored {} bytes as {}", bytes.len(), filename);
        Ok(filename)
    }

    pub fn next_number(&self) -> u64 {
        self.next_number
    }

    pub fn stored(&self) -> u64 {
        self.stored
    }
}

/// Substitute `values`, in order, for the `%v` placeholders of `template`.
/// Placeholders beyond the supplied values are left as they are.
pub fn render_filename(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    let mut values = values.iter();
    while let Some(pos) = rest.find(FILENAME_PLACEHOLDER) {
        let value = match values.next() {
            Some(value) => value,
            None => break,
        };
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + FILENAME_PLACEHOLDER.len()..];
    }
    out.push_str(rest);
    out
}

/// Decode a run of hex digits, either case, into bytes.
pub fn decode_hex(digits: &str) -> Result<Vec<u8>, BlobError> {
    hex::decode(digits).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => BlobError::InvalidDigit {
            digit: c,
            offset: index,
        },
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            BlobError::OddLength(digits.len())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn test_decode() {
        assert_eq!(decode_hex("68656c6c6f").unwrap(), b"hello".to_vec());
        assert_eq!(decode_hex("FF00aB").unwrap(), vec![0xff, 0x00, 0xab]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_errors() {
        assert_matches!(decode_hex("abc"), Err(BlobError::OddLength(3)));
        assert_matches!(
            decode_hex("00zz"),
            Err(BlobError::InvalidDigit {
                digit: 'z',
                offset: 2
            })
        );
        assert_matches!(
            decode_hex("0g"),
            Err(BlobError::InvalidDigit {
                digit: 'g',
                offset: 1
            })
        );
    }

    proptest! {
        #[test]
        fn prop_hex_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
            prop_assert_eq!(decode_hex(&hex::encode(&bytes)).unwrap(), bytes.clone());
            prop_assert_eq!(decode_hex(&hex::encode_upper(&bytes)).unwrap(), bytes);
        }

        #[test]
        fn prop_odd_length_is_rejected(digits in "([0-9a-f]{2}){0,64}[0-9a-f]") {
            prop_assert!(matches!(decode_hex(&digits), Err(BlobError::OddLength(n)) if n == digits.len()));
        }
    }

    #[test]
    fn test_render_filename() {
        assert_eq!(
            render_filename("y%v-p%v-i%v.jpg", &["2020", "7", "1"]),
            "y2020-p7-i1.jpg"
        );
        assert_eq!(render_filename("img%v.bin", &["2020", "7", "1"]), "img2020.bin");
        assert_eq!(render_filename("%v/%v", &["a"]), "a/%v");
        assert_eq!(render_filename("fixed.jpg", &["a", "b", "c"]), "fixed.jpg");
    }

    #[test]
    fn test_store_writes_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BlobStore::new(dir.path(), "y%v-p%v-i%v.jpg", 5);

        let name = store.store("68656c6c6f", "2020", "7").unwrap();
        assert_eq!(name, "y2020-p7-i5.jpg");
        assert_eq!(fs::read(dir.path().join(&name)).unwrap(), b"hello");

        assert_matches!(store.store("6", "2020", "7"), Err(BlobError::OddLength(1)));

        let name = store.store("00", "0000", "0").unwrap();
        assert_eq!(name, "y0000-p0-i6.jpg");
        assert_eq!(store.stored(), 2);
        assert_eq!(store.next_number(), 7);
    }

    #[test]
    fn test_store_write_failure_uses_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BlobStore::new(dir.path().join("missing"), "i%v-%v-%v", 1);
        assert_matches!(store.store("00", "a", "b"), Err(BlobError::Write { .. }));
        assert_eq!(store.stored(), 0);
        assert_eq!(store.next_number(), 2);
    }
}

// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Record ordering.
//!
//! Rows are ordered the way `sort -t, -k1,2` orders them under the C locale:
//! the key fields are joined with `,` and the resulting key compared as one
//! byte string, so `New York` sorts before `New`. Rows with equal keys fall
//! back to comparing the whole row, and the sort is stable.

use csv::StringRecord;

/// The default key: the first two fields.
pub const DEFAULT_KEY_FIELDS: [usize; 2] = [0, 1];

const SEPARATOR: u8 = b',';

/// Sorts `records` in place by the fields at `key_fields` (0-based).
///
/// Key fields missing from a short row are left out of its key.
pub fn sort_records(records: &mut [StringRecord], key_fields: &[usize]) {
    records.sort_by_cached_key(|r| (join(key_fields.iter().filter_map(|&i| r.get(i))), join(r.iter())));
}

fn join<'a>(fields: impl Iterator<Item = &'a str>) -> Vec<u8> {
    let mut key = Vec::new();
    for (n, field) in fields.enumerate() {
        if n > 0 {
            key.push(SEPARATOR);
        }
        key.extend_from_slice(field.as_bytes());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[&[&str]]) -> Vec<StringRecord> {
        rows.iter().map(|r| StringRecord::from(r.to_vec())).collect()
    }

    fn first_fields(records: &[StringRecord]) -> Vec<String> {
        records.iter().map(|r| format!("{},{}", &r[0], &r[1])).collect()
    }

    #[test]
    fn orders_by_first_two_fields() {
        let mut rows = records(&[
            &["b", "2", "1609459200", "x"],
            &["a", "1", "1609545600", "y"],
            &["a", "0", "1609545600", "z"],
        ]);

        sort_records(&mut rows, &DEFAULT_KEY_FIELDS);
        assert_eq!(first_fields(&rows), ["a,0", "a,1", "b,2"]);
    }

    #[test]
    fn comparison_is_bytewise_not_numeric() {
        let mut rows = records(&[&["20200623", "10"], &["20200623", "9"], &["20200623", "B"], &["20200623", "a"]]);

        sort_records(&mut rows, &DEFAULT_KEY_FIELDS);
        assert_eq!(
            first_fields(&rows),
            ["20200623,10", "20200623,9", "20200623,B", "20200623,a"]
        );
    }

    #[test]
    fn equal_keys_fall_back_to_whole_row() {
        let mut rows = records(&[&["a", "1", "z"], &["a", "1", "m"]]);

        sort_records(&mut rows, &DEFAULT_KEY_FIELDS);
        assert_eq!(&rows[0][2], "m");
        assert_eq!(&rows[1][2], "z");
    }

    #[test]
    fn short_rows_sort_first() {
        let mut rows = records(&[&["a", "1"], &["a"]]);

        sort_records(&mut rows, &DEFAULT_KEY_FIELDS);
        assert_eq!(rows[0].len(), 1);
    }

    #[test]
    fn key_is_compared_as_one_string_including_separator() {
        let mut rows = records(&[&["New", "2"], &["New York", "1"]]);

        sort_records(&mut rows, &DEFAULT_KEY_FIELDS);
        assert_eq!(first_fields(&rows), ["New York,1", "New,2"]);
    }

    #[test]
    fn custom_key_fields() {
        let mut rows = records(&[&["x", "1", "b"], &["y", "0", "a"]]);

        sort_records(&mut rows, &[2]);
        assert_eq!(&rows[0][0], "y");
    }
}

#![forbid(unsafe_code)]

use crate::error::Error;
use crate::index::RowIndex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Code reserved for null rows. Dictionary codes therefore span `0..=254`,
/// capping an enum column at 255 distinct values.
pub(crate) const NULL_CODE: u8 = u8::MAX;

pub(crate) const MAX_CARDINALITY: usize = NULL_CODE as usize;

/// Ordered set of distinct string values; position = code.
///
/// The dictionary defines the comparison order of the column: comparisons
/// reduce to code comparisons, so an explicitly supplied ordering (e.g.
/// weekdays) sorts by that ordering rather than lexically. Immutable once
/// built.
#[derive(Debug, Clone)]
pub struct EnumDict {
    values: Vec<Arc<str>>,
    by_value: HashMap<Arc<str>, u8>,
}

impl EnumDict {
    fn from_distinct(values: Vec<Arc<str>>) -> Result<Self, Error> {
        if values.len() > MAX_CARDINALITY {
            return Err(Error::CardinalityExceeded {
                count: values.len(),
            });
        }
        let mut by_value = HashMap::with_capacity(values.len());
        for (code, value) in values.iter().enumerate() {
            by_value.insert(value.clone(), code as u8);
        }
        Ok(Self { values, by_value })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn code_of(&self, value: &str) -> Option<u8> {
        self.by_value.get(value).copied()
    }

    pub fn value_of(&self, code: u8) -> Option<&str> {
        if code == NULL_CODE {
            return None;
        }
        self.values.get(code as usize).map(|v| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|v| v.as_ref())
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.values.iter().map(|v| v.len()).sum()
    }
}

/// Dictionary-encoded nullable string column: one shared dictionary plus a
/// per-row code array.
#[derive(Clone, Debug)]
pub struct EnumColumn {
    dict: Arc<EnumDict>,
    codes: Arc<[u8]>,
}

/// Null-first rank used for code comparison: `NULL_CODE` sorts before code 0.
fn code_rank(code: u8) -> i16 {
    if code == NULL_CODE {
        -1
    } else {
        code as i16
    }
}

impl EnumColumn {
    /// Build with an inferred dictionary: the sorted set of distinct observed
    /// values. Fails with `CardinalityExceeded` past 255 distinct values.
    pub fn infer(values: &[Option<&str>]) -> Result<Self, Error> {
        let distinct: BTreeSet<&str> = values.iter().filter_map(|v| *v).collect();
        if distinct.len() > MAX_CARDINALITY {
            return Err(Error::CardinalityExceeded {
                count: distinct.len(),
            });
        }
        let dict = EnumDict::from_distinct(distinct.into_iter().map(Arc::from).collect())?;
        let codes = values
            .iter()
            .map(|v| match v {
                // The dictionary was built from these values, so the lookup
                // cannot miss.
                Some(s) => dict.code_of(s).unwrap_or(NULL_CODE),
                None => NULL_CODE,
            })
            .collect();
        Ok(Self {
            dict: Arc::new(dict),
            codes,
        })
    }

    /// Build against an explicit dictionary whose order defines comparison
    /// order. Strict: observed values outside the dictionary fail with
    /// `UnknownEnumValue`.
    pub fn with_values(dict_values: &[&str], values: &[Option<&str>]) -> Result<Self, Error> {
        let mut distinct: Vec<Arc<str>> = Vec::with_capacity(dict_values.len());
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for &value in dict_values {
            if seen.insert(value) {
                distinct.push(Arc::from(value));
            }
        }
        let dict = EnumDict::from_distinct(distinct)?;

        let mut codes = Vec::with_capacity(values.len());
        for value in values {
            match value {
                None => codes.push(NULL_CODE),
                Some(s) => match dict.code_of(s) {
                    Some(code) => codes.push(code),
                    None => {
                        return Err(Error::UnknownEnumValue {
                            value: (*s).to_owned(),
                        })
                    }
                },
            }
        }
        Ok(Self {
            dict: Arc::new(dict),
            codes: codes.into(),
        })
    }

    pub(crate) fn from_parts(dict: Arc<EnumDict>, codes: Vec<u8>) -> Self {
        Self {
            dict,
            codes: codes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn dictionary(&self) -> &EnumDict {
        &self.dict
    }

    pub(crate) fn dict_arc(&self) -> Arc<EnumDict> {
        self.dict.clone()
    }

    pub(crate) fn code_at(&self, pos: u32) -> u8 {
        self.codes[pos as usize]
    }

    /// Null-first comparison rank of the code at `pos`.
    pub(crate) fn rank_at(&self, pos: u32) -> i16 {
        code_rank(self.code_at(pos))
    }

    pub(crate) fn value_at(&self, pos: u32) -> Option<&str> {
        self.dict.value_of(self.code_at(pos))
    }

    pub(crate) fn subset(&self, index: &RowIndex) -> EnumColumn {
        EnumColumn {
            dict: self.dict.clone(),
            codes: index.iter().map(|pos| self.code_at(pos)).collect(),
        }
    }

    /// Structural equality by decoded value, so two columns with differently
    /// ordered dictionaries but the same logical content are equal.
    pub(crate) fn equals(
        &self,
        index: &RowIndex,
        other: &EnumColumn,
        other_index: &RowIndex,
    ) -> bool {
        index
            .iter()
            .zip(other_index.iter())
            .all(|(a, b)| self.value_at(a) == other.value_at(b))
    }

    /// O(1) per-element comparison by dictionary code, null first.
    pub(crate) fn compare(&self, i: u32, j: u32) -> Ordering {
        code_rank(self.code_at(i)).cmp(&code_rank(self.code_at(j)))
    }

    /// Codes matching `pred` over the dictionary, as a 256-entry membership
    /// table. This is the dictionary fast path for `like`/`ilike`/`in`: the
    /// predicate runs once per distinct value, the row scan then tests codes.
    pub(crate) fn matching_codes(&self, mut pred: impl FnMut(&str) -> bool) -> [bool; 256] {
        let mut table = [false; 256];
        for (code, value) in self.dict.values.iter().enumerate() {
            if pred(value) {
                table[code] = true;
            }
        }
        table
    }

    /// Rewrite every dictionary value through `f`, re-encoding rows.
    ///
    /// Used by built-in string transforms so an enum column stays enum: the
    /// transform runs once per distinct value, not once per row. The result
    /// dictionary may shrink (e.g. upper-casing "a" and "A" collide).
    pub(crate) fn map_dictionary(&self, f: impl Fn(&str) -> String) -> EnumColumn {
        let mut mapped: Vec<Arc<str>> = Vec::with_capacity(self.dict.len());
        let mut by_value: HashMap<Arc<str>, u8> = HashMap::with_capacity(self.dict.len());
        let mut old_to_new = [NULL_CODE; 256];
        for (old_code, value) in self.dict.values.iter().enumerate() {
            let new_value: Arc<str> = Arc::from(f(value).as_str());
            let new_code = match by_value.get(&new_value) {
                Some(code) => *code,
                None => {
                    // Cannot exceed the source cardinality.
                    let code = mapped.len() as u8;
                    mapped.push(new_value.clone());
                    by_value.insert(new_value, code);
                    code
                }
            };
            old_to_new[old_code] = new_code;
        }
        old_to_new[NULL_CODE as usize] = NULL_CODE;

        let codes: Vec<u8> = self
            .codes
            .iter()
            .map(|&code| old_to_new[code as usize])
            .collect();
        EnumColumn {
            dict: Arc::new(EnumDict {
                values: mapped,
                by_value,
            }),
            codes: codes.into(),
        }
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.dict.byte_size() + self.codes.len()
    }
}

impl PartialEq for EnumDict {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for EnumDict {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inferred_dictionary_is_sorted_distinct() {
        let col = EnumColumn::infer(&[Some("b"), Some("a"), None, Some("b")]).unwrap();
        let dict: Vec<&str> = col.dictionary().iter().collect();
        assert_eq!(dict, vec!["a", "b"]);
        assert_eq!(col.value_at(0), Some("b"));
        assert_eq!(col.value_at(2), None);
        assert_eq!(col.code_at(2), NULL_CODE);
    }

    #[test]
    fn explicit_dictionary_defines_order() {
        let col =
            EnumColumn::with_values(&["mon", "tue", "wed"], &[Some("wed"), Some("mon")]).unwrap();
        assert_eq!(col.code_at(0), 2);
        assert_eq!(col.code_at(1), 0);
        assert_eq!(col.compare(1, 0), Ordering::Less);
    }

    #[test]
    fn strict_mode_rejects_unknown_values() {
        let err = EnumColumn::with_values(&["mon", "tue"], &[Some("foo")]).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownEnumValue {
                value: "foo".to_owned()
            }
        );
    }

    #[test]
    fn cardinality_is_capped_at_255() {
        let owned: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let values: Vec<Option<&str>> = owned.iter().map(|s| Some(s.as_str())).collect();
        let err = EnumColumn::infer(&values).unwrap_err();
        assert_eq!(err, Error::CardinalityExceeded { count: 256 });

        let just_fits: Vec<Option<&str>> = values[..255].to_vec();
        assert!(EnumColumn::infer(&just_fits).is_ok());
    }

    #[test]
    fn map_dictionary_merges_collisions() {
        let col = EnumColumn::infer(&[Some("a"), Some("A"), None]).unwrap();
        let upper = col.map_dictionary(|s| s.to_uppercase());
        assert_eq!(upper.dictionary().len(), 1);
        assert_eq!(upper.value_at(0), Some("A"));
        assert_eq!(upper.value_at(1), Some("A"));
        assert_eq!(upper.value_at(2), None);
    }
}

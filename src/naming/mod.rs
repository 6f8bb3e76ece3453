//! Filename decoding and deterministic file ordering.
//!
//! Instrument exports are named `<group>_<subgroup><index>_<phase>.csv`
//! (e.g. `A_B12_raw.csv`), and the whole index-based workflow hinges on
//! sorting those names the same way every run:
//!
//! - letters compare case-folded to uppercase
//! - the numeric index compares as an integer (`A_B2` before `A_B10`)
//! - for the same sample, the literal phase token `raw` sorts first and
//!   *every* other token sorts second: `subtracted`, but also typos like
//!   `subtractd`. Kept exactly as the instrument workflow behaves; a test
//!   pins it down.
//!
//! Stems that do not match the grammar get a fallback key that compares by
//! the raw stem string and orders after every well-formed key, so malformed
//! and well-formed names are never compared field-wise. This is a known
//! inconsistency of the ordering, not something to quietly repair.

use std::path::PathBuf;

/// Decoded ordering fields of a well-formed stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedName {
    /// First letter group, folded to uppercase.
    pub group: char,
    /// Second letter group, folded to uppercase.
    pub sub_group: char,
    /// Numeric sample index, compared as an integer.
    pub index: u32,
    /// 0 for the literal token `raw`, 1 for anything else.
    pub phase_rank: u8,
}

impl ParsedName {
    pub fn is_raw(&self) -> bool {
        self.phase_rank == 0
    }
}

/// Sort key for a data file stem.
///
/// The variant order matters: every `Parsed` key orders before every
/// `Fallback` key, and `Fallback` keys order among themselves by stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileKey {
    Parsed(ParsedName),
    Fallback(String),
}

impl FileKey {
    /// Decode a stem, falling back to lexicographic stem ordering when it
    /// does not match the grammar.
    pub fn for_stem(stem: &str) -> FileKey {
        parse_stem(stem)
            .map(FileKey::Parsed)
            .unwrap_or_else(|_| FileKey::Fallback(stem.to_string()))
    }
}

/// Why a stem failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParseError {
    pub stem: String,
    pub reason: &'static str,
}

impl std::fmt::Display for NameParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid data file name `{}`: {}", self.stem, self.reason)
    }
}

impl std::error::Error for NameParseError {}

/// Decode a stem against the `<letter>_<letter><digits>_<token>` grammar.
pub fn parse_stem(stem: &str) -> Result<ParsedName, NameParseError> {
    let fail = |reason: &'static str| NameParseError {
        stem: stem.to_string(),
        reason,
    };

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() != 3 {
        return Err(fail("expected three `_`-separated parts"));
    }

    let group = single_letter(parts[0]).ok_or_else(|| fail("first part must be one letter"))?;

    let mut chars = parts[1].chars();
    let sub_group = chars
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .ok_or_else(|| fail("second part must start with a letter"))?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail("second part must end in digits"));
    }
    let index: u32 = digits
        .parse()
        .map_err(|_| fail("sample index is out of range"))?;

    let phase = parts[2];
    if phase.is_empty() {
        return Err(fail("phase token is empty"));
    }
    let phase_rank = if phase.eq_ignore_ascii_case("raw") { 0 } else { 1 };

    Ok(ParsedName {
        group: group.to_ascii_uppercase(),
        sub_group: sub_group.to_ascii_uppercase(),
        index,
        phase_rank,
    })
}

fn single_letter(part: &str) -> Option<char> {
    let mut chars = part.chars();
    let c = chars.next().filter(|c| c.is_ascii_alphabetic())?;
    if chars.next().is_some() {
        return None;
    }
    Some(c)
}

/// A discovered data file plus its decoded sort key.
///
/// Built once at discovery and never mutated; everything downstream refers
/// to files through the order this key produces.
#[derive(Debug, Clone)]
pub struct DataFile {
    pub path: PathBuf,
    pub key: FileKey,
}

impl DataFile {
    pub fn new(path: PathBuf) -> DataFile {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        DataFile {
            key: FileKey::for_stem(&stem),
            path,
        }
    }
}

/// Order discovered files by key. Stable: files with equal keys keep their
/// input relative order.
pub fn sort_data_files(files: &mut [DataFile]) {
    files.sort_by(|a, b| a.key.cmp(&b.key));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(stem: &str) -> FileKey {
        FileKey::for_stem(stem)
    }

    #[test]
    fn decodes_well_formed_stem() {
        let name = parse_stem("A_B12_raw").unwrap();
        assert_eq!(name.group, 'A');
        assert_eq!(name.sub_group, 'B');
        assert_eq!(name.index, 12);
        assert!(name.is_raw());
    }

    #[test]
    fn letters_fold_to_uppercase() {
        assert_eq!(parse_stem("a_b3_RAW").unwrap(), parse_stem("A_B3_raw").unwrap());
    }

    #[test]
    fn index_compares_numerically_not_lexicographically() {
        assert!(key("A_B2_raw") < key("A_B10_raw"));
    }

    #[test]
    fn raw_sorts_before_subtracted_for_same_sample() {
        assert!(key("A_B1_raw") < key("A_B1_subtracted"));
    }

    #[test]
    fn any_non_raw_token_ranks_as_subtracted() {
        // Typos in the phase token silently behave like `subtracted`.
        assert_eq!(key("A_B1_subtractd"), key("A_B1_subtracted"));
        assert!(key("A_B1_raw") < key("A_B1_background"));
    }

    #[test]
    fn key_order_is_group_subgroup_index_phase() {
        let stems = ["A_A1_raw", "A_A1_subtracted", "A_A2_raw", "A_B1_raw", "B_A1_raw"];
        for pair in stems.windows(2) {
            assert!(key(pair[0]) < key(pair[1]), "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn malformed_stems_fall_back_to_stem_ordering() {
        assert!(matches!(key("notes"), FileKey::Fallback(_)));
        assert!(matches!(key("A_B_raw"), FileKey::Fallback(_)));
        assert!(matches!(key("A_B1_raw_v2"), FileKey::Fallback(_)));
        assert!(matches!(key("AB_C1_raw"), FileKey::Fallback(_)));

        // Fallback keys compare by stem, and after every parsed key.
        assert!(key("aardvark") < key("notes"));
        assert!(key("Z_Z99_subtracted") < key("aardvark"));
    }

    #[test]
    fn sort_is_stable_for_duplicate_keys() {
        let mut files = vec![
            DataFile::new(PathBuf::from("one/A_B1_raw.csv")),
            DataFile::new(PathBuf::from("two/A_B1_raw.csv")),
            DataFile::new(PathBuf::from("A_A1_raw.csv")),
        ];
        sort_data_files(&mut files);
        let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, ["A_A1_raw.csv", "one/A_B1_raw.csv", "two/A_B1_raw.csv"]);
    }

    #[test]
    fn sorting_orders_a_directory_of_replicates() {
        let stems = [
            "B_A1_subtracted",
            "A_B10_raw",
            "A_B2_subtracted",
            "A_B2_raw",
            "B_A1_raw",
            "A_B10_subtracted",
        ];
        let mut files: Vec<DataFile> = stems
            .iter()
            .map(|s| DataFile::new(PathBuf::from(format!("{s}.csv"))))
            .collect();
        sort_data_files(&mut files);

        let sorted: Vec<_> = files
            .iter()
            .map(|f| f.path.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            sorted,
            [
                "A_B2_raw",
                "A_B2_subtracted",
                "A_B10_raw",
                "A_B10_subtracted",
                "B_A1_raw",
                "B_A1_subtracted",
            ]
        );
    }
}

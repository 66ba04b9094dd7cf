//! Position-aware candidate filtering.
//!
//! Which characters are allowed depends on where the character sits on the plate:
//! the first one is always a province glyph, the second one is always a letter and
//! the rest are letters or digits.

use crate::error::{LprErrorKind, LprResult};
use crate::loader::LabeledImage;

use std::fmt;

/// Province and region glyphs valid in the first slot, `使` and `领` included.
pub const PROVINCES: [&str; 32] = ["京", "津", "沪", "渝", "冀", "豫", "云", "辽", "黑", "湘", "皖", "鲁",
             "新", "苏", "浙", "赣", "鄂", "桂", "甘", "晋", "蒙", "陕", "吉", "闽", "贵", "青",
             "藏", "川", "宁", "琼", "使", "领"
             ];

pub const LETTERS: [&str; 26] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N",
             "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z"
             ];

pub const ALPHANUMERICS: [&str; 36] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C",
             "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T",
             "U", "V", "W", "X", "Y", "Z"
             ];

const POSITION_MARKER: &str = "word";

/// The set of characters a plate slot may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Province,
    Letter,
    Alphanumeric,
}

impl Alphabet {

    pub fn glyphs(self) -> &'static [&'static str] {
        match self {
            Alphabet::Province => &PROVINCES,
            Alphabet::Letter => &LETTERS,
            Alphabet::Alphanumeric => &ALPHANUMERICS,
        }
    }

    /// Whole-label membership; "AB" is not a letter even though "A" is.
    pub fn contains(self, category: &str) -> bool {
        self.glyphs().contains(&category)
    }
}

/// 1-based index of a character on the plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position(u32);

impl Position {

    pub fn new(index: u32) -> Option<Self> {
        if index == 0 {
            None
        } else {
            Some(Self(index))
        }
    }

    /// Parse the position out of a test file name shaped like `plate_word3.png`.
    ///
    /// The last `word` in the name is the marker and the position runs up to the
    /// next `.`. A name without the marker is an error, so is a marker followed by
    /// anything but a positive integer.
    pub fn from_filename(filename: &str) -> LprResult<Self> {
        let start = filename.rfind(POSITION_MARKER)
            .ok_or_else(|| LprErrorKind::MissingPosition(filename.to_string()))?;
        let rest = &filename[start + POSITION_MARKER.len()..];
        let value = rest.split('.').next().unwrap_or("");
        let invalid = || LprErrorKind::InvalidPosition {
            filename: filename.to_string(),
            value: value.to_string(),
        };
        let index: u32 = value.parse().map_err(|_| invalid())?;
        Ok(Self::new(index).ok_or_else(invalid)?)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn alphabet(self) -> Alphabet {
        match self.0 {
            1 => Alphabet::Province,
            2 => Alphabet::Letter,
            _ => Alphabet::Alphanumeric,
        }
    }
}

impl fmt::Display for Position {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Templates whose category is valid at `position`, in load order.
pub fn filter_candidates(templates: &[LabeledImage], position: Position) -> impl Iterator<Item = &LabeledImage> {
    let alphabet = position.alphabet();
    templates.iter().filter(move |template| alphabet.contains(&template.category))
}


#[cfg(test)]
mod test {

    use image::GrayImage;

    use super::{filter_candidates, Alphabet, Position, ALPHANUMERICS, LETTERS, PROVINCES};
    use crate::error::LprErrorKind;
    use crate::loader::LabeledImage;

    fn labeled(category: &str) -> LabeledImage {
        LabeledImage {
            image: GrayImage::new(2, 2),
            category: category.to_string(),
            filename: format!("{}.png", category),
        }
    }

    #[test]
    fn parses_position_from_filename() {
        assert_eq!(Position::from_filename("plate_word2.png").unwrap().get(), 2);
        assert_eq!(Position::from_filename("word1.jpg").unwrap().get(), 1);
        assert_eq!(Position::from_filename("car7_word13.bmp").unwrap().get(), 13);
        assert_eq!(Position::from_filename("password_word4.png").unwrap().get(), 4);
        assert_eq!(Position::from_filename("word5").unwrap().get(), 5);
    }

    #[test]
    fn missing_marker_is_an_error() {
        let err = Position::from_filename("noword.png").map(|_| ()).unwrap_err();
        // "noword" does contain the marker, but nothing numeric follows it
        assert!(matches!(err.kind(), LprErrorKind::InvalidPosition { .. }));

        let err = Position::from_filename("plate_3.png").unwrap_err();
        assert!(matches!(err.kind(), LprErrorKind::MissingPosition(name) if name == "plate_3.png"));
    }

    #[test]
    fn non_positive_or_non_numeric_positions_fail() {
        for name in ["plate_word0.png", "plate_word-1.png", "plate_wordX.png", "plate_word.png"].iter() {
            let err = Position::from_filename(name).unwrap_err();
            assert!(matches!(err.kind(), LprErrorKind::InvalidPosition { .. }), "{}", name);
        }
    }

    #[test]
    fn position_selects_alphabet() {
        assert_eq!(Position::new(1).unwrap().alphabet(), Alphabet::Province);
        assert_eq!(Position::new(2).unwrap().alphabet(), Alphabet::Letter);
        assert_eq!(Position::new(3).unwrap().alphabet(), Alphabet::Alphanumeric);
        assert_eq!(Position::new(7).unwrap().alphabet(), Alphabet::Alphanumeric);
        assert!(Position::new(0).is_none());
    }

    #[test]
    fn alphabets_have_expected_members() {
        assert_eq!(PROVINCES.len(), 32);
        assert!(Alphabet::Province.contains("使"));
        assert!(Alphabet::Province.contains("领"));
        assert!(!Alphabet::Province.contains("A"));
        assert_eq!(LETTERS.len(), 26);
        assert!(!Alphabet::Letter.contains("1"));
        assert_eq!(ALPHANUMERICS.len(), 36);
        assert!(Alphabet::Alphanumeric.contains("0"));
        assert!(Alphabet::Alphanumeric.contains("Z"));
        assert!(!Alphabet::Alphanumeric.contains("京"));
    }

    #[test]
    fn membership_is_whole_label() {
        assert!(!Alphabet::Letter.contains("AB"));
        assert!(!Alphabet::Letter.contains(""));
        assert!(!Alphabet::Province.contains("京津"));
    }

    #[test]
    fn filters_by_position() {
        let templates: Vec<LabeledImage> = ["京", "A", "7", "沪", "Z", "AB"].iter().map(|c| labeled(c)).collect();
        let pick = |n| -> Vec<String> {
            filter_candidates(&templates, Position::new(n).unwrap())
                .map(|t| t.category.clone())
                .collect()
        };
        assert_eq!(pick(1), vec!["京", "沪"]);
        assert_eq!(pick(2), vec!["A", "Z"]);
        assert_eq!(pick(3), vec!["A", "7", "Z"]);
    }

    #[test]
    fn empty_candidate_set_is_fine() {
        let templates: Vec<LabeledImage> = ["A", "7"].iter().map(|c| labeled(c)).collect();
        assert_eq!(filter_candidates(&templates, Position::new(1).unwrap()).count(), 0);
    }
}

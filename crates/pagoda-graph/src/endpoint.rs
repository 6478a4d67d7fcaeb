use serde::{Deserialize, Serialize};

/// The mark at one end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Tail,
    Arrow,
    Circle,
}

impl Endpoint {
    /// Glyph used when this mark sits at the left end of an edge.
    pub fn left_glyph(&self) -> char {
        match self {
            Self::Tail => '-',
            Self::Arrow => '<',
            Self::Circle => 'o',
        }
    }

    /// Glyph used when this mark sits at the right end of an edge.
    pub fn right_glyph(&self) -> char {
        match self {
            Self::Tail => '-',
            Self::Arrow => '>',
            Self::Circle => 'o',
        }
    }

    pub fn from_left_glyph(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Tail),
            '<' => Some(Self::Arrow),
            'o' => Some(Self::Circle),
            _ => None,
        }
    }

    pub fn from_right_glyph(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Tail),
            '>' => Some(Self::Arrow),
            'o' => Some(Self::Circle),
            _ => None,
        }
    }
}

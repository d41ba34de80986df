use std::fmt;
use std::str::FromStr;

/// How many thumbnails are packed per row at each breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridDensity {
    More,
    #[default]
    Less,
}

impl GridDensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::More => "more",
            Self::Less => "less",
        }
    }

    /// Maximum images per row for the given viewport width.
    pub fn row_capacity(self, viewport_width: f32) -> usize {
        let base = if viewport_width < 850.0 {
            1
        } else if viewport_width < 1050.0 {
            2
        } else if viewport_width < 1550.0 {
            3
        } else {
            4
        };
        match self {
            Self::Less => base,
            Self::More => base + 1,
        }
    }
}

impl fmt::Display for GridDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grid density: {0:?}")]
pub struct UnknownDensity(pub String);

impl FromStr for GridDensity {
    type Err = UnknownDensity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "more" => Ok(Self::More),
            "less" => Ok(Self::Less),
            other => Err(UnknownDensity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_table() {
        let cases = [
            (320.0, 1, 2),
            (849.0, 1, 2),
            (850.0, 2, 3),
            (900.0, 2, 3),
            (1049.0, 2, 3),
            (1050.0, 3, 4),
            (1549.0, 3, 4),
            (1550.0, 4, 5),
            (2560.0, 4, 5),
        ];
        for (width, less, more) in cases {
            assert_eq!(GridDensity::Less.row_capacity(width), less, "less @ {width}");
            assert_eq!(GridDensity::More.row_capacity(width), more, "more @ {width}");
        }
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!("more".parse::<GridDensity>(), Ok(GridDensity::More));
        assert_eq!(" less ".parse::<GridDensity>(), Ok(GridDensity::Less));
        assert!("dense".parse::<GridDensity>().is_err());
        assert_eq!(GridDensity::default(), GridDensity::Less);
        assert_eq!(GridDensity::More.to_string(), "more");
    }
}

use crate::error::{QuizError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::info;

static VOLUME_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vol(\d)").expect("volume pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Volume {
    One,
    Two,
}

impl Volume {
    /// Reads the digit right after `vol` in names like `vol2_ch14.xhtml`.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let digit = VOLUME_DIGIT
            .captures(name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        match digit {
            Some("1") => Ok(Volume::One),
            Some("2") => Ok(Volume::Two),
            _ => Err(QuizError::UnknownVolume {
                file: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volume::One => f.write_str("volume 1"),
            Volume::Two => f.write_str("volume 2"),
        }
    }
}

/// Groups chapter names by volume first and sorts within each group, so
/// every volume-1 chapter precedes every volume-2 chapter regardless of how
/// the names would sort as plain strings.
pub fn order_chapters<I, S>(names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut one = Vec::new();
    let mut two = Vec::new();
    for name in names {
        let name = name.into();
        match Volume::from_file_name(&name)? {
            Volume::One => one.push(name),
            Volume::Two => two.push(name),
        }
    }
    one.sort();
    two.sort();
    one.extend(two);
    Ok(one)
}

/// Tracks the active appendix. Starts on volume 1 and moves to volume 2 at
/// most once; it never moves back.
#[derive(Debug)]
pub struct VolumeSwitcher {
    active: Volume,
    switched: bool,
}

impl Default for VolumeSwitcher {
    fn default() -> Self {
        VolumeSwitcher {
            active: Volume::One,
            switched: false,
        }
    }
}

impl VolumeSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Volume {
        self.active
    }

    pub fn switched(&self) -> bool {
        self.switched
    }

    /// Updates the state for the next chapter file and returns the volume
    /// whose explanations it must be resolved against.
    pub fn observe(&mut self, file_name: &str) -> Result<Volume> {
        match (Volume::from_file_name(file_name)?, self.switched) {
            (Volume::Two, false) => {
                info!(file = file_name, "switching explanations to volume 2");
                self.active = Volume::Two;
                self.switched = true;
            }
            (Volume::One, true) => {
                return Err(QuizError::VolumeRegression {
                    file: file_name.to_string(),
                });
            }
            _ => {}
        }
        Ok(self.active)
    }
}

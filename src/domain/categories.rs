use std::fmt;
use std::str::FromStr;

/// Kind of animal a listing is for.
///
/// Category strings are parsed into these closed enums once, at the point
/// where data enters the system (form fields, store documents); nothing
/// downstream re-interprets raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimalType {
    Dog,
    Cat,
    Rabbit,
    Bird,
    Other,
}

impl AnimalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Rabbit => "rabbit",
            Self::Bird => "bird",
            Self::Other => "other",
        }
    }
}

impl FromStr for AnimalType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "dog" => Ok(Self::Dog),
            "cat" => Ok(Self::Cat),
            "rabbit" => Ok(Self::Rabbit),
            "bird" => Ok(Self::Bird),
            "other" => Ok(Self::Other),
            other => Err(format!("{} is not a known animal type", other)),
        }
    }
}

impl fmt::Display for AnimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size class of a listed pet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

impl PetSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for PetSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("{} is not a known pet size", other)),
        }
    }
}

impl fmt::Display for PetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age bucket derived from a listing's age in whole years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Young,
    Adult,
    Senior,
}

impl AgeGroup {
    /// Bucket a numeric age: 0-2 young, 3-7 adult, 8+ senior
    pub fn from_age(age_years: u32) -> Self {
        if age_years <= 2 {
            Self::Young
        } else if age_years <= 7 {
            Self::Adult
        } else {
            Self::Senior
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Young => "young",
            Self::Adult => "adult",
            Self::Senior => "senior",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "young" => Ok(Self::Young),
            "adult" => Ok(Self::Adult),
            "senior" => Ok(Self::Senior),
            other => Err(format!("{} is not a known age group", other)),
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single subscriber preference dimension: either a concrete category or
/// the wildcard `"any"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference<T> {
    Any,
    Only(T),
}

impl<T: PartialEq> Preference<T> {
    /// Whether this preference admits the given concrete value
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Only(only) => only == value,
        }
    }
}

impl<T> FromStr for Preference<T>
where
    T: FromStr<Err = String>,
{
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("any") {
            Ok(Self::Any)
        } else {
            Ok(Self::Only(value.parse()?))
        }
    }
}

impl<T: fmt::Display> fmt::Display for Preference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(only) => only.fmt(f),
        }
    }
}

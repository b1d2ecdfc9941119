use serde::Serialize;
use std::collections::BTreeMap;

/// CEFR proficiency tier used to calibrate sentence difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProficiencyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 6] = [
        ProficiencyLevel::A1,
        ProficiencyLevel::A2,
        ProficiencyLevel::B1,
        ProficiencyLevel::B2,
        ProficiencyLevel::C1,
        ProficiencyLevel::C2,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "A1",
            ProficiencyLevel::A2 => "A2",
            ProficiencyLevel::B1 => "B1",
            ProficiencyLevel::B2 => "B2",
            ProficiencyLevel::C1 => "C1",
            ProficiencyLevel::C2 => "C2",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "Beginner - Basic phrases and simple sentences",
            ProficiencyLevel::A2 => "Elementary - Simple conversations and everyday situations",
            ProficiencyLevel::B1 => "Intermediate - Express opinions and describe experiences",
            ProficiencyLevel::B2 => "Upper Intermediate - Complex ideas and abstract topics",
            ProficiencyLevel::C1 => "Advanced - Fluent and spontaneous expression",
            ProficiencyLevel::C2 => "Proficient - Near-native level with nuanced understanding",
        }
    }

    /// Exact, case-sensitive lookup by code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

pub const TOPICS: [&str; 20] = [
    "Daily Routine",
    "Food & Cooking",
    "Travel & Transportation",
    "Work & Career",
    "Family & Relationships",
    "Health & Fitness",
    "Shopping & Money",
    "Weather & Seasons",
    "Hobbies & Entertainment",
    "Education & Learning",
    "Technology & Internet",
    "Home & Living",
    "Nature & Environment",
    "Culture & Traditions",
    "Sports & Activities",
    "Clothing & Fashion",
    "Time & Schedules",
    "Emotions & Feelings",
    "City Life & Urban Areas",
    "Holidays & Celebrations",
];

/// Level codes mapped to their descriptions, ordered by code.
pub fn list_levels() -> BTreeMap<&'static str, &'static str> {
    ProficiencyLevel::ALL
        .iter()
        .map(|l| (l.code(), l.description()))
        .collect()
}

pub fn list_topics() -> &'static [&'static str] {
    &TOPICS
}

pub fn is_topic(topic: &str) -> bool {
    TOPICS.contains(&topic)
}

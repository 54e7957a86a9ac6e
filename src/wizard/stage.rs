use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete phase of the wizard, totally ordered 1..5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Intake,
    Profile,
    Pairing,
    Selection,
    Refinement,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Intake,
        Stage::Profile,
        Stage::Pairing,
        Stage::Selection,
        Stage::Refinement,
    ];

    pub fn number(self) -> usize {
        match self {
            Stage::Intake => 1,
            Stage::Profile => 2,
            Stage::Pairing => 3,
            Stage::Selection => 4,
            Stage::Refinement => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Intake => "Intake",
            Stage::Profile => "Drink Profile",
            Stage::Pairing => "Pairings",
            Stage::Selection => "The Menu",
            Stage::Refinement => "Refinement",
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Intake => Some(Stage::Profile),
            Stage::Profile => Some(Stage::Pairing),
            Stage::Pairing => Some(Stage::Selection),
            Stage::Selection => Some(Stage::Refinement),
            Stage::Refinement => None,
        }
    }

    pub fn prev(self) -> Option<Stage> {
        match self {
            Stage::Intake => None,
            Stage::Profile => Some(Stage::Intake),
            Stage::Pairing => Some(Stage::Profile),
            Stage::Selection => Some(Stage::Pairing),
            Stage::Refinement => Some(Stage::Selection),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}. {}", self.number(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_prev_walk_the_linear_order() {
        for pair in Stage::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].prev(), Some(pair[0]));
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(Stage::Intake.prev(), None);
        assert_eq!(Stage::Refinement.next(), None);
    }

    #[test]
    fn display_carries_the_stage_number() {
        assert_eq!(Stage::Selection.to_string(), "04. The Menu");
    }
}

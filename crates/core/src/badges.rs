//! Achievement badge definitions and the inputs they are judged against.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStatus {
    pub badge: Badge,
    pub earned: bool,
}

/// Everything badge evaluation looks at, gathered by the caller from the
/// dashboard stats and quiz history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeInputs {
    pub completed_sessions: u64,
    pub streak_days: u64,
    /// Quiz runs scored at or above the high-score threshold.
    pub high_quiz_scores: u64,
    pub tracked_sessions: u64,
}

const FIRST_STEPS: Badge = Badge {
    name: "First Steps",
    description: "Complete your first study session",
};
const WEEK_WARRIOR: Badge = Badge {
    name: "Week Warrior",
    description: "Study for 7 consecutive days",
};
const QUIZ_MASTER: Badge = Badge {
    name: "Quiz Master",
    description: "Score 90% or higher on 5 quizzes",
};
const TIME_MANAGER: Badge = Badge {
    name: "Time Manager",
    description: "Use time tracker for 30 sessions",
};

/// Evaluate every badge against the inputs, in display order.
pub fn evaluate(inputs: &BadgeInputs) -> Vec<BadgeStatus> {
    vec![
        BadgeStatus {
            badge: FIRST_STEPS,
            earned: inputs.completed_sessions >= 1,
        },
        BadgeStatus {
            badge: WEEK_WARRIOR,
            earned: inputs.streak_days >= 7,
        },
        BadgeStatus {
            badge: QUIZ_MASTER,
            earned: inputs.high_quiz_scores >= 5,
        },
        BadgeStatus {
            badge: TIME_MANAGER,
            earned: inputs.tracked_sessions >= 30,
        },
    ]
}

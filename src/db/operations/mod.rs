pub mod attempts;
pub mod challenges;
pub mod classes;
pub mod content;
pub mod notifications;
pub mod plans;

pub use attempts::{Attempt, AttemptSource};
pub use challenges::{ChallengeProgress, ChallengeTask, ClaimWrite, GoalType};
pub use classes::{Assignment, ClassRecord, StoredRule};
pub use content::{KnowledgePoint, Question, QuestionFilter};
pub use notifications::{DispatchKey, NotificationRecord};
pub use plans::{PlanItem, StudyPlan};

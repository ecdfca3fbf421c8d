use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::db::operations::{classes, Assignment, ClassRecord, DispatchKey, StoredRule};
use crate::db::Database;
use crate::services::notification::{self, CreateNotificationInput, NotificationType};
use crate::services::{require_field, ServiceError};

const DAY_MS: i64 = 86_400_000;
const COMPLETED_STATUS: &str = "completed";

pub type NotificationRule = StoredRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    DueSoon,
    Overdue,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
        }
    }

    fn notification_type(&self) -> NotificationType {
        match self {
            Self::DueSoon => NotificationType::AssignmentDue,
            Self::Overdue => NotificationType::AssignmentOverdue,
        }
    }
}

/// A fired trigger. `days` is the due-soon or overdue day offset and doubles as the dispatch
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerHit {
    pub trigger: Trigger,
    pub days: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleInput {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub due_days: Option<i64>,
    #[serde(default)]
    pub overdue_days: Option<i64>,
    #[serde(default)]
    pub include_parents: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub classes_scanned: usize,
    pub classes_skipped: usize,
    pub classes_failed: usize,
    pub assignments_scanned: usize,
    pub assignments_skipped: usize,
    pub assignments_failed: usize,
    pub notifications_sent: usize,
    pub duplicates_suppressed: usize,
}

impl RunReport {
    fn absorb(&mut self, other: RunReport) {
        self.classes_scanned += other.classes_scanned;
        self.classes_skipped += other.classes_skipped;
        self.classes_failed += other.classes_failed;
        self.assignments_scanned += other.assignments_scanned;
        self.assignments_skipped += other.assignments_skipped;
        self.assignments_failed += other.assignments_failed;
        self.notifications_sent += other.notifications_sent;
        self.duplicates_suppressed += other.duplicates_suppressed;
    }
}

fn ceil_days(ms: i64) -> i64 {
    let whole = ms.div_euclid(DAY_MS);
    if ms.rem_euclid(DAY_MS) > 0 {
        whole + 1
    } else {
        whole
    }
}

/// Decides which reminder, if any, an assignment due at `due_at` gets at `now`.
/// Overdue wins over due-soon; an overdue window of zero days or less never closes.
pub fn evaluate_trigger(due_at: DateTime<Utc>, now: DateTime<Utc>, rule: &NotificationRule) -> Option<TriggerHit> {
    let due_diff_days = ceil_days((due_at - now).num_milliseconds());
    let overdue_diff_days = ceil_days((now - due_at).num_milliseconds()).max(0);

    if due_at < now && (rule.overdue_days <= 0 || overdue_diff_days <= rule.overdue_days) {
        return Some(TriggerHit {
            trigger: Trigger::Overdue,
            days: overdue_diff_days,
        });
    }

    if (0..=rule.due_days).contains(&due_diff_days) {
        return Some(TriggerHit {
            trigger: Trigger::DueSoon,
            days: due_diff_days,
        });
    }

    None
}

/// `child` is set for parent copies so a parent of several students can tell them apart.
fn message(assignment: &Assignment, hit: &TriggerHit, child: Option<&str>) -> (String, String) {
    let subject = match child {
        Some(student_id) => format!("Assignment \"{}\" for student {student_id}", assignment.title),
        None => format!("Assignment \"{}\"", assignment.title),
    };

    match hit.trigger {
        Trigger::DueSoon if hit.days == 0 => ("Assignment due today".to_string(), format!("{subject} is due today.")),
        Trigger::DueSoon => (
            "Assignment due soon".to_string(),
            format!("{subject} is due in {} day(s).", hit.days),
        ),
        Trigger::Overdue => (
            "Assignment overdue".to_string(),
            format!("{subject} is {} day(s) overdue.", hit.days.max(1)),
        ),
    }
}

async fn owned_class(db: &Database, teacher_id: &str, class_id: &str) -> Result<ClassRecord, ServiceError> {
    match classes::get_class(db.pool(), class_id).await? {
        Some(class) if class.teacher_id == teacher_id => Ok(class),
        _ => Err(ServiceError::not_found(format!("class {class_id} not found"))),
    }
}

/// Effective rule for a class; classes without a stored rule get the defaults.
pub async fn get_rule(db: &Database, teacher_id: &str, class_id: &str) -> Result<NotificationRule, ServiceError> {
    let teacher_id = require_field(teacher_id, "teacherId")?;
    let class_id = require_field(class_id, "classId")?;
    owned_class(db, &teacher_id, &class_id).await?;

    Ok(classes::get_notification_rule(db.pool(), &class_id)
        .await?
        .unwrap_or_default())
}

pub async fn update_rule(
    db: &Database,
    teacher_id: &str,
    class_id: &str,
    input: UpdateRuleInput,
) -> Result<NotificationRule, ServiceError> {
    let current = get_rule(db, teacher_id, class_id).await?;

    let rule = NotificationRule {
        enabled: input.enabled.unwrap_or(current.enabled),
        due_days: input.due_days.unwrap_or(current.due_days),
        overdue_days: input.overdue_days.unwrap_or(current.overdue_days),
        include_parents: input.include_parents.unwrap_or(current.include_parents),
    };

    if rule.due_days < 0 {
        return Err(ServiceError::validation("dueDays must be non-negative"));
    }
    if rule.overdue_days < 0 {
        return Err(ServiceError::validation("overdueDays must be non-negative"));
    }

    classes::upsert_notification_rule(db.pool(), class_id.trim(), &rule).await?;
    tracing::info!(class_id = %class_id.trim(), ?rule, "notification rule updated");
    Ok(rule)
}

pub async fn run(
    db: &Database,
    config: &EngineConfig,
    teacher_id: &str,
    class_id: Option<&str>,
) -> Result<RunReport, ServiceError> {
    run_at(db, config, teacher_id, class_id, Utc::now()).await
}

/// Evaluates reminders for one class or every class of the teacher at a fixed instant.
/// A failing class is logged and counted; it does not abort the run.
pub async fn run_at(
    db: &Database,
    config: &EngineConfig,
    teacher_id: &str,
    class_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RunReport, ServiceError> {
    let teacher_id = require_field(teacher_id, "teacherId")?;

    let targets = match class_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => vec![owned_class(db, &teacher_id, id).await?],
        None => classes::list_classes_by_teacher(db.pool(), &teacher_id).await?,
    };

    let results = join_all(targets.iter().map(|class| evaluate_class(db, config, class, now))).await;

    let mut report = RunReport::default();
    for (class, result) in targets.iter().zip(results) {
        match result {
            Ok(class_report) => report.absorb(class_report),
            Err(e) => {
                tracing::warn!(class_id = %class.id, error = %e, "notification run failed for class");
                report.classes_scanned += 1;
                report.classes_failed += 1;
            }
        }
    }

    tracing::info!(
        teacher_id = %teacher_id,
        classes = report.classes_scanned,
        sent = report.notifications_sent,
        duplicates = report.duplicates_suppressed,
        failed = report.classes_failed,
        "notification run finished"
    );

    Ok(report)
}

async fn evaluate_class(
    db: &Database,
    config: &EngineConfig,
    class: &ClassRecord,
    now: DateTime<Utc>,
) -> Result<RunReport, ServiceError> {
    let mut report = RunReport {
        classes_scanned: 1,
        ..RunReport::default()
    };

    let rule = classes::get_notification_rule(db.pool(), &class.id)
        .await?
        .unwrap_or_default();
    if !rule.enabled {
        tracing::debug!(class_id = %class.id, "notification rule disabled");
        report.classes_skipped = 1;
        return Ok(report);
    }

    let students = classes::list_class_members(db.pool(), &class.id).await?;
    let parents = if rule.include_parents {
        classes::list_parents_of(db.pool(), &students).await?
    } else {
        HashMap::new()
    };

    for row in classes::list_assignments(db.pool(), &class.id).await? {
        report.assignments_scanned += 1;

        let assignment = match row {
            Ok(assignment) => assignment,
            Err(e) => {
                tracing::warn!(class_id = %class.id, error = %e, "unreadable assignment skipped");
                report.assignments_skipped += 1;
                continue;
            }
        };
        let Some(due_at) = assignment.due_at else {
            report.assignments_skipped += 1;
            continue;
        };
        let Some(hit) = evaluate_trigger(due_at, now, &rule) else {
            continue;
        };

        if let Err(e) = notify_assignment(db, config, &assignment, &hit, &students, &parents, &mut report).await {
            tracing::warn!(assignment_id = %assignment.id, error = %e, "assignment reminders failed");
            report.assignments_failed += 1;
        }
    }

    Ok(report)
}

async fn notify_assignment(
    db: &Database,
    config: &EngineConfig,
    assignment: &Assignment,
    hit: &TriggerHit,
    students: &[String],
    parents: &HashMap<String, Vec<String>>,
    report: &mut RunReport,
) -> Result<(), ServiceError> {
    let statuses = classes::assignment_statuses(db.pool(), &assignment.id).await?;

    for student_id in students {
        if statuses.get(student_id).map(String::as_str) == Some(COMPLETED_STATUS) {
            continue;
        }

        let recipients = std::iter::once((student_id, None))
            .chain(parents.get(student_id).into_iter().flatten().map(|p| (p, Some(student_id.as_str()))));

        // Parent copies are keyed per student: one reminder per (parent, child) pair.
        for (recipient_id, child) in recipients {
            let (title, content) = message(assignment, hit, child);
            let input = CreateNotificationInput {
                user_id: recipient_id.clone(),
                title,
                content,
                notification_type: hit.trigger.notification_type(),
            };

            if !config.notify_dedup {
                notification::create_notification(db, input).await?;
                report.notifications_sent += 1;
                continue;
            }

            let key = DispatchKey {
                assignment_id: &assignment.id,
                student_id,
                recipient_id,
                trigger: hit.trigger.as_str(),
                window_bucket: hit.days,
            };
            match notification::create_notification_once(db, &key, input).await? {
                Some(_) => report.notifications_sent += 1,
                None => report.duplicates_suppressed += 1,
            }
        }
    }

    Ok(())
}

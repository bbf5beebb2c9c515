//! Central access policy.
//!
//! Every use case names an [`Operation`]; [`rule_for`] maps it to exactly one
//! [`Rule`], and [`evaluate`] applies the rule to the principal and whatever
//! ownership facts the caller loaded. Callers must confirm the target exists
//! before asking, so a missing resource is reported as not found rather than
//! forbidden.

use crate::auth::Principal;
use crate::error::{AppError, AppResult, ForbiddenReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListUsers,
    CreateUser,
    DeleteUser,
    AssignRole,
    RemoveRole,
    ReadOwnProfile,
    EditOwnProfile,
    ListDegrees,
    CreateDegree,
    DeleteDegree,
    ListClasses,
    ListLecturerClasses,
    ReadClass,
    CreateClass,
    UpdateClass,
    DeleteClass,
    ListStudents,
    ReadStudent,
    CreateStudent,
    UpdateStudent,
    DeleteStudent,
    StudentWeightedMean,
    CreateMark,
    ReadMark,
    EditMark,
    DeleteMark,
    ListClassMarks,
    ListMisconduct,
    CreateMisconduct,
    DeleteMisconduct,
    ListCircumstances,
    CreateCircumstance,
    DeleteCircumstance,
    ClassStatistics,
    GlobalStatistics,
    LecturerMetrics,
    RankClasses,
}

#[cfg(test)]
impl Operation {
    pub const ALL: [Operation; 37] = [
        Operation::ListUsers,
        Operation::CreateUser,
        Operation::DeleteUser,
        Operation::AssignRole,
        Operation::RemoveRole,
        Operation::ReadOwnProfile,
        Operation::EditOwnProfile,
        Operation::ListDegrees,
        Operation::CreateDegree,
        Operation::DeleteDegree,
        Operation::ListClasses,
        Operation::ListLecturerClasses,
        Operation::ReadClass,
        Operation::CreateClass,
        Operation::UpdateClass,
        Operation::DeleteClass,
        Operation::ListStudents,
        Operation::ReadStudent,
        Operation::CreateStudent,
        Operation::UpdateStudent,
        Operation::DeleteStudent,
        Operation::StudentWeightedMean,
        Operation::CreateMark,
        Operation::ReadMark,
        Operation::EditMark,
        Operation::DeleteMark,
        Operation::ListClassMarks,
        Operation::ListMisconduct,
        Operation::CreateMisconduct,
        Operation::DeleteMisconduct,
        Operation::ListCircumstances,
        Operation::CreateCircumstance,
        Operation::DeleteCircumstance,
        Operation::ClassStatistics,
        Operation::GlobalStatistics,
        Operation::LecturerMetrics,
        Operation::RankClasses,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `is_admin`
    Admin,
    /// `is_lecturer || is_admin`
    LecturerOrAdmin,
    /// `is_lecturer && class.lecturer_id == principal.id`
    ClassLecturer,
    /// `is_admin || (is_lecturer && class.lecturer_id == principal.id)`
    ClassLecturerOrAdmin,
    /// `target.id == principal.id`
    SelfOnly,
    /// any resolved principal
    Authenticated,
    /// `is_admin || (is_lecturer && target.id == principal.id)`
    LecturerSelfOrAdmin,
}

pub fn rule_for(op: Operation) -> Rule {
    use Operation::*;
    match op {
        ListUsers | CreateUser | DeleteUser | AssignRole | RemoveRole => Rule::Admin,
        CreateDegree | DeleteDegree => Rule::Admin,
        ListClasses | CreateClass | UpdateClass | DeleteClass => Rule::Admin,
        ListStudents | DeleteStudent => Rule::Admin,
        DeleteMisconduct | DeleteCircumstance => Rule::Admin,

        CreateStudent | CreateMark | CreateMisconduct | CreateCircumstance => {
            Rule::LecturerOrAdmin
        }
        ReadStudent | UpdateStudent | StudentWeightedMean => Rule::LecturerOrAdmin,
        ListDegrees | ListMisconduct | ListCircumstances => Rule::LecturerOrAdmin,
        GlobalStatistics | RankClasses => Rule::LecturerOrAdmin,

        ReadMark | EditMark | DeleteMark => Rule::ClassLecturer,

        ReadClass | ClassStatistics | ListClassMarks => Rule::ClassLecturerOrAdmin,

        EditOwnProfile => Rule::SelfOnly,
        ReadOwnProfile => Rule::Authenticated,

        LecturerMetrics | ListLecturerClasses => Rule::LecturerSelfOrAdmin,
    }
}

/// Ownership facts about the target, loaded by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceFacts {
    pub class_lecturer_id: Option<i64>,
    pub target_user_id: Option<i64>,
}

impl ResourceFacts {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn class(lecturer_id: Option<i64>) -> Self {
        Self {
            class_lecturer_id: lecturer_id,
            ..Self::default()
        }
    }

    pub fn target_user(user_id: i64) -> Self {
        Self {
            target_user_id: Some(user_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(ForbiddenReason),
}

#[cfg(test)]
impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

fn allow_if(cond: bool, reason: ForbiddenReason) -> Decision {
    if cond {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

pub fn evaluate(principal: &Principal, op: Operation, facts: &ResourceFacts) -> Decision {
    let owns_class = facts.class_lecturer_id == Some(principal.id);
    let is_target = facts.target_user_id == Some(principal.id);

    match rule_for(op) {
        Rule::Admin => allow_if(principal.is_admin, ForbiddenReason::AdminRequired),
        Rule::LecturerOrAdmin => allow_if(
            principal.is_lecturer || principal.is_admin,
            ForbiddenReason::LecturerOrAdminRequired,
        ),
        Rule::ClassLecturer => {
            if !principal.is_lecturer {
                Decision::Deny(ForbiddenReason::LecturerRequired)
            } else {
                allow_if(owns_class, ForbiddenReason::NotClassLecturer)
            }
        }
        Rule::ClassLecturerOrAdmin => {
            if principal.is_admin {
                Decision::Allow
            } else if !principal.is_lecturer {
                Decision::Deny(ForbiddenReason::LecturerOrAdminRequired)
            } else {
                allow_if(owns_class, ForbiddenReason::NotClassLecturer)
            }
        }
        Rule::SelfOnly => allow_if(is_target, ForbiddenReason::NotSelf),
        Rule::Authenticated => Decision::Allow,
        Rule::LecturerSelfOrAdmin => {
            if principal.is_admin {
                Decision::Allow
            } else if !principal.is_lecturer {
                Decision::Deny(ForbiddenReason::LecturerOrAdminRequired)
            } else {
                allow_if(is_target, ForbiddenReason::NotSelf)
            }
        }
    }
}

/// [`evaluate`], as a `Result` for use with `?`.
pub fn authorize(principal: &Principal, op: Operation, facts: &ResourceFacts) -> AppResult<()> {
    match evaluate(principal, op, facts) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::debug!(
                principal = principal.id,
                operation = ?op,
                reason = reason.as_str(),
                "access denied"
            );
            Err(AppError::Forbidden(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: i64, is_admin: bool, is_lecturer: bool) -> Principal {
        Principal {
            id,
            email: format!("user{}@uni.ac.uk", id),
            is_admin,
            is_lecturer,
        }
    }

    fn owned_by(id: i64) -> ResourceFacts {
        ResourceFacts {
            class_lecturer_id: Some(id),
            target_user_id: Some(id),
        }
    }

    #[test]
    fn plain_user_is_denied_every_privileged_operation() {
        let p = principal(1, false, false);
        for op in Operation::ALL {
            let rule = rule_for(op);
            let d = evaluate(&p, op, &owned_by(1));
            match rule {
                Rule::Authenticated | Rule::SelfOnly => assert!(d.is_allowed(), "{:?}", op),
                _ => assert!(!d.is_allowed(), "{:?} should be denied", op),
            }
        }
    }

    #[test]
    fn lecturer_never_passes_admin_rules() {
        let p = principal(2, false, true);
        for op in Operation::ALL.into_iter().filter(|op| rule_for(*op) == Rule::Admin) {
            assert_eq!(
                evaluate(&p, op, &owned_by(2)),
                Decision::Deny(ForbiddenReason::AdminRequired),
                "{:?}",
                op
            );
        }
    }

    #[test]
    fn admin_passes_everything_except_lecturer_and_self_scoped_rules() {
        let p = principal(3, true, false);
        let other = owned_by(99);
        for op in Operation::ALL {
            let d = evaluate(&p, op, &other);
            match rule_for(op) {
                Rule::ClassLecturer => {
                    assert_eq!(d, Decision::Deny(ForbiddenReason::LecturerRequired))
                }
                Rule::SelfOnly => assert_eq!(d, Decision::Deny(ForbiddenReason::NotSelf)),
                _ => assert!(d.is_allowed(), "{:?}", op),
            }
        }
    }

    #[test]
    fn mark_mutation_needs_owning_lecturer() {
        let lecturer = principal(5, false, true);
        assert!(evaluate(&lecturer, Operation::EditMark, &ResourceFacts::class(Some(5))).is_allowed());
        assert_eq!(
            evaluate(&lecturer, Operation::EditMark, &ResourceFacts::class(Some(6))),
            Decision::Deny(ForbiddenReason::NotClassLecturer)
        );
        assert_eq!(
            evaluate(&lecturer, Operation::DeleteMark, &ResourceFacts::class(None)),
            Decision::Deny(ForbiddenReason::NotClassLecturer)
        );
    }

    #[test]
    fn class_read_is_admin_or_owner() {
        let owner = principal(7, false, true);
        let stranger = principal(8, false, true);
        let admin = principal(9, true, false);
        let facts = ResourceFacts::class(Some(7));
        assert!(evaluate(&owner, Operation::ReadClass, &facts).is_allowed());
        assert!(evaluate(&admin, Operation::ReadClass, &facts).is_allowed());
        assert_eq!(
            evaluate(&stranger, Operation::ClassStatistics, &facts),
            Decision::Deny(ForbiddenReason::NotClassLecturer)
        );
    }

    #[test]
    fn profile_edit_is_self_only() {
        let p = principal(4, true, true);
        assert!(evaluate(&p, Operation::EditOwnProfile, &ResourceFacts::target_user(4)).is_allowed());
        assert_eq!(
            evaluate(&p, Operation::EditOwnProfile, &ResourceFacts::target_user(5)),
            Decision::Deny(ForbiddenReason::NotSelf)
        );
        assert_eq!(
            evaluate(&p, Operation::EditOwnProfile, &ResourceFacts::none()),
            Decision::Deny(ForbiddenReason::NotSelf)
        );
    }

    #[test]
    fn lecturer_metrics_scope() {
        let lecturer = principal(10, false, true);
        assert!(evaluate(&lecturer, Operation::LecturerMetrics, &ResourceFacts::target_user(10)).is_allowed());
        assert_eq!(
            evaluate(&lecturer, Operation::LecturerMetrics, &ResourceFacts::target_user(11)),
            Decision::Deny(ForbiddenReason::NotSelf)
        );
        let admin = principal(12, true, false);
        assert!(evaluate(&admin, Operation::LecturerMetrics, &ResourceFacts::target_user(10)).is_allowed());
    }

    #[test]
    fn authorize_maps_denial_to_forbidden() {
        let p = principal(1, false, false);
        assert!(matches!(
            authorize(&p, Operation::GlobalStatistics, &ResourceFacts::none()),
            Err(AppError::Forbidden(ForbiddenReason::LecturerOrAdminRequired))
        ));
        let lecturer = principal(2, false, true);
        assert!(authorize(&lecturer, Operation::GlobalStatistics, &ResourceFacts::none()).is_ok());
    }
}

use crate::calc::MAX_CREDIT;
use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::store::classes::{self as repo, ClassRow, NewClass};
use crate::store::users;
use crate::usecases::{require_text, RequestCtx};

#[derive(Debug, Clone)]
pub struct ClassInput {
    pub code: String,
    pub name: String,
    pub credit: i64,
    pub lecturer_email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub name: Option<String>,
    pub credit: Option<i64>,
    /// `Some(None)` clears the lecturer.
    pub lecturer_email: Option<Option<String>>,
}

pub(crate) fn load_class(ctx: &RequestCtx<'_>, code: &str) -> AppResult<ClassRow> {
    repo::find_class_by_code(ctx.conn, code)?.ok_or(AppError::NotFound(EntityKind::Class))
}

pub(crate) fn load_class_by_id(ctx: &RequestCtx<'_>, id: i64) -> AppResult<ClassRow> {
    repo::find_class_by_id(ctx.conn, id)?.ok_or(AppError::NotFound(EntityKind::Class))
}

/// Resolves a lecturer by email. The user must exist and hold the lecturer role.
fn resolve_lecturer(ctx: &RequestCtx<'_>, email: &str) -> AppResult<i64> {
    let Some(user) = users::find_principal_by_subject(ctx.conn, email)? else {
        return Err(AppError::NotFound(EntityKind::User));
    };
    if !user.is_lecturer {
        return Err(AppError::invalid(format!("{} is not a lecturer", user.email)));
    }
    Ok(user.id)
}

fn check_credit(credit: i64) -> AppResult<i64> {
    if !(0..=MAX_CREDIT).contains(&credit) {
        return Err(AppError::invalid(format!(
            "credit must be between 0 and {}",
            MAX_CREDIT
        )));
    }
    Ok(credit)
}

pub fn list_classes(ctx: &RequestCtx<'_>) -> AppResult<Vec<ClassRow>> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::ListClasses, &ResourceFacts::none())?;
    repo::list_classes(ctx.conn)
}

/// Classes taught by `lecturer_email`, or by the caller when omitted.
pub fn list_lecturer_classes(
    ctx: &RequestCtx<'_>,
    lecturer_email: Option<&str>,
) -> AppResult<Vec<ClassRow>> {
    let principal = ctx.principal()?;
    let target = match lecturer_email {
        Some(email) => users::find_principal_by_subject(ctx.conn, email)?
            .ok_or(AppError::NotFound(EntityKind::User))?
            .id,
        None => principal.id,
    };
    authorize(
        &principal,
        Operation::ListLecturerClasses,
        &ResourceFacts::target_user(target),
    )?;
    repo::list_classes_for_lecturer(ctx.conn, target)
}

pub fn get_class(ctx: &RequestCtx<'_>, code: &str) -> AppResult<ClassRow> {
    let principal = ctx.principal()?;
    let class = load_class(ctx, code)?;
    authorize(&principal, Operation::ReadClass, &ResourceFacts::class(class.lecturer_id))?;
    Ok(class)
}

pub fn create_class(ctx: &RequestCtx<'_>, input: ClassInput) -> AppResult<ClassRow> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::CreateClass, &ResourceFacts::none())?;

    let code = require_text("code", &input.code)?.to_ascii_uppercase();
    let lecturer_id = match input.lecturer_email.as_deref() {
        Some(email) => Some(resolve_lecturer(ctx, email)?),
        None => None,
    };
    let class = NewClass {
        code: code.clone(),
        name: require_text("name", &input.name)?,
        credit: check_credit(input.credit)?,
        lecturer_id,
    };
    let id = repo::insert_class(ctx.conn, &class)?;
    tracing::info!(class = %code, by = principal.id, "class created");
    load_class_by_id(ctx, id)
}

pub fn update_class(ctx: &RequestCtx<'_>, code: &str, changes: ClassChanges) -> AppResult<ClassRow> {
    let principal = ctx.principal()?;
    let class = load_class(ctx, code)?;
    authorize(&principal, Operation::UpdateClass, &ResourceFacts::class(class.lecturer_id))?;

    let name = match changes.name.as_deref() {
        Some(n) => require_text("name", n)?,
        None => class.name.clone(),
    };
    let credit = match changes.credit {
        Some(c) => check_credit(c)?,
        None => class.credit,
    };
    let lecturer_id = match changes.lecturer_email {
        Some(Some(email)) => Some(resolve_lecturer(ctx, &email)?),
        Some(None) => None,
        None => class.lecturer_id,
    };
    repo::update_class(ctx.conn, class.id, &name, credit, lecturer_id)?;
    load_class_by_id(ctx, class.id)
}

pub fn delete_class(ctx: &RequestCtx<'_>, code: &str) -> AppResult<()> {
    let principal = ctx.principal()?;
    let class = load_class(ctx, code)?;
    authorize(&principal, Operation::DeleteClass, &ResourceFacts::class(class.lecturer_id))?;
    repo::delete_class(ctx.conn, class.id)?;
    tracing::info!(class = %class.code, by = principal.id, "class deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ForbiddenReason;
    use crate::usecases::testutil;

    #[test]
    fn admin_creates_class_with_lecturer() {
        let conn = testutil::conn();
        testutil::user(&conn, "admin@uni.ac.uk", true, false);
        let lecturer = testutil::user(&conn, "lect@uni.ac.uk", false, true);
        testutil::user(&conn, "plain@uni.ac.uk", false, false);
        let claim = testutil::claim("admin@uni.ac.uk", true, false);
        let config = Config::default();
        let ctx = RequestCtx::new(&conn, &config, Some(&claim));

        let input = ClassInput {
            code: "cs101".to_string(),
            name: "Programming".to_string(),
            credit: 20,
            lecturer_email: Some("lect@uni.ac.uk".to_string()),
        };
        let created = create_class(&ctx, input.clone()).expect("create");
        assert_eq!(created.code, "CS101");
        assert_eq!(created.lecturer_id, Some(lecturer));

        assert!(matches!(
            create_class(&ctx, input),
            Err(AppError::Conflict(EntityKind::Class))
        ));

        let not_lecturer = ClassInput {
            code: "CS102".to_string(),
            name: "Data".to_string(),
            credit: 20,
            lecturer_email: Some("plain@uni.ac.uk".to_string()),
        };
        assert!(matches!(
            create_class(&ctx, not_lecturer),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn credit_outside_bounds_is_rejected() {
        let conn = testutil::conn();
        testutil::user(&conn, "admin@uni.ac.uk", true, false);
        let claim = testutil::claim("admin@uni.ac.uk", true, false);
        let config = Config::default();
        let ctx = RequestCtx::new(&conn, &config, Some(&claim));

        let huge = ClassInput {
            code: "BIG1".to_string(),
            name: "Big".to_string(),
            credit: i64::MAX / 10,
            lecturer_email: None,
        };
        assert!(matches!(create_class(&ctx, huge), Err(AppError::InvalidInput(_))));

        let at_limit = ClassInput {
            code: "BIG2".to_string(),
            name: "Big".to_string(),
            credit: MAX_CREDIT,
            lecturer_email: None,
        };
        create_class(&ctx, at_limit).expect("credit at the limit");
        let changes = ClassChanges {
            credit: Some(MAX_CREDIT + 1),
            ..ClassChanges::default()
        };
        assert!(matches!(
            update_class(&ctx, "BIG2", changes),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn class_read_by_code_respects_ownership() {
        let conn = testutil::conn();
        let owner = testutil::user(&conn, "owner@uni.ac.uk", false, true);
        testutil::user(&conn, "other@uni.ac.uk", false, true);
        testutil::class(&conn, "MA100", 10, Some(owner));
        let config = Config::default();

        let owner_claim = testutil::claim("owner@uni.ac.uk", false, true);
        let ctx = RequestCtx::new(&conn, &config, Some(&owner_claim));
        assert_eq!(get_class(&ctx, "MA100").expect("get").credit, 10);
        assert_eq!(list_lecturer_classes(&ctx, None).expect("mine").len(), 1);

        let other_claim = testutil::claim("other@uni.ac.uk", false, true);
        let ctx = RequestCtx::new(&conn, &config, Some(&other_claim));
        assert!(matches!(
            get_class(&ctx, "MA100"),
            Err(AppError::Forbidden(ForbiddenReason::NotClassLecturer))
        ));
        assert!(matches!(
            get_class(&ctx, "NOPE"),
            Err(AppError::NotFound(EntityKind::Class))
        ));
        assert!(matches!(
            list_lecturer_classes(&ctx, Some("owner@uni.ac.uk")),
            Err(AppError::Forbidden(ForbiddenReason::NotSelf))
        ));
    }

    #[test]
    fn update_can_clear_lecturer_and_delete_removes_marks() {
        let conn = testutil::conn();
        testutil::user(&conn, "admin@uni.ac.uk", true, false);
        let lecturer = testutil::user(&conn, "lect@uni.ac.uk", false, true);
        let class_id = testutil::class(&conn, "PH200", 20, Some(lecturer));
        let student = testutil::student(&conn, "S1");
        testutil::mark(&conn, student, class_id, Some(55), None);
        let claim = testutil::claim("admin@uni.ac.uk", true, false);
        let config = Config::default();
        let ctx = RequestCtx::new(&conn, &config, Some(&claim));

        let updated = update_class(
            &ctx,
            "PH200",
            ClassChanges {
                credit: Some(40),
                lecturer_email: Some(None),
                ..ClassChanges::default()
            },
        )
        .expect("update");
        assert_eq!(updated.credit, 40);
        assert_eq!(updated.lecturer_id, None);
        assert_eq!(updated.name, "PH200 name");

        delete_class(&ctx, "PH200").expect("delete");
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM marks", [], |r| r.get(0))
            .expect("count");
        assert_eq!(remaining, 0);
    }
}

mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, seeded_sidecar};

#[test]
fn class_lecturer_owns_marks() {
    let (_ws, mut child, mut stdin, mut reader) = seeded_sidecar("marksd-policy-marks");
    let (s, r) = (&mut stdin, &mut reader);

    let class = request_ok(
        s,
        r,
        "1",
        "classes.create",
        Some("admin-token"),
        json!({ "code": "cs101", "name": "Programming", "credit": 20, "lecturerEmail": "lee@uni.ac.uk" }),
    );
    assert_eq!(class["class"]["code"], "CS101");
    let class_id = class["class"]["id"].as_i64().expect("class id");

    let student = request_ok(
        s,
        r,
        "2",
        "students.create",
        Some("lect-token"),
        json!({ "studentNo": "2024001", "firstName": "Ada", "lastName": "Byron" }),
    );
    let student_id = student["student"]["id"].as_i64().expect("student id");

    let mark = request_ok(
        s,
        r,
        "3",
        "marks.create",
        Some("lect-token"),
        json!({ "studentId": student_id, "classId": class_id, "value": 64 }),
    );
    let mark_id = mark["mark"]["id"].as_i64().expect("mark id");
    assert_eq!(mark["mark"]["value"], 64);

    // Another lecturer sees Forbidden for a mark that exists.
    let e = request_err(
        s,
        r,
        "4",
        "marks.update",
        Some("other-token"),
        json!({ "markId": mark_id, "value": 99 }),
    );
    assert_eq!(error_code(&e), "forbidden");
    assert_eq!(e["details"]["reason"], "not_class_lecturer");

    // ...and NotFound for one that does not.
    let e = request_err(
        s,
        r,
        "5",
        "marks.update",
        Some("other-token"),
        json!({ "markId": mark_id + 100, "value": 99 }),
    );
    assert_eq!(error_code(&e), "not_found");
    assert_eq!(e["details"]["kind"], "mark");

    let edited = request_ok(
        s,
        r,
        "6",
        "marks.update",
        Some("lect-token"),
        json!({ "markId": mark_id, "code": "EN", "notes": "extension granted" }),
    );
    assert_eq!(edited["mark"]["code"], "EN");
    assert!(edited["mark"]["value"].is_null());

    let listed = request_ok(
        s,
        r,
        "7",
        "marks.listForClass",
        Some("lect-token"),
        json!({ "classCode": "CS101" }),
    );
    assert_eq!(listed["marks"].as_array().map(|a| a.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn duplicate_mark_is_conflict_even_for_admin() {
    let (_ws, mut child, mut stdin, mut reader) = seeded_sidecar("marksd-policy-conflict");
    let (s, r) = (&mut stdin, &mut reader);

    let class = request_ok(
        s,
        r,
        "1",
        "classes.create",
        Some("admin-token"),
        json!({ "code": "MA200", "name": "Algebra", "credit": 10 }),
    );
    let class_id = class["class"]["id"].as_i64().expect("class id");
    let student = request_ok(
        s,
        r,
        "2",
        "students.create",
        Some("admin-token"),
        json!({ "studentNo": "S1", "firstName": "A", "lastName": "B" }),
    );
    let student_id = student["student"]["id"].as_i64().expect("student id");

    let params = json!({ "studentId": student_id, "classId": class_id, "value": 50 });
    request_ok(s, r, "3", "marks.create", Some("admin-token"), params.clone());
    let e = request_err(s, r, "4", "marks.create", Some("admin-token"), params);
    assert_eq!(error_code(&e), "conflict");
    assert_eq!(e["details"]["kind"], "mark");

    let e = request_err(
        s,
        r,
        "5",
        "marks.create",
        Some("admin-token"),
        json!({ "studentId": student_id, "classId": class_id, "value": 50, "code": "ABS" }),
    );
    assert_eq!(error_code(&e), "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn plain_user_is_denied_admin_operations() {
    let (_ws, mut child, mut stdin, mut reader) = seeded_sidecar("marksd-policy-plain");
    let (s, r) = (&mut stdin, &mut reader);

    for (i, method) in ["users.list", "classes.list", "students.list"].iter().enumerate() {
        let e = request_err(s, r, &format!("l{}", i), method, Some("plain-token"), json!({}));
        assert_eq!(error_code(&e), "forbidden", "{}", method);
        assert_eq!(e["details"]["reason"], "admin_required");
    }
    let e = request_err(
        s,
        r,
        "c",
        "degrees.create",
        Some("lect-token"),
        json!({ "code": "BSC", "name": "Science" }),
    );
    assert_eq!(e["details"]["reason"], "admin_required");

    let me = request_ok(s, r, "me", "users.me", Some("plain-token"), json!({}));
    let my_id = me["user"]["id"].as_i64().expect("id");
    let updated = request_ok(
        s,
        r,
        "p",
        "users.updateProfile",
        Some("plain-token"),
        json!({ "userId": my_id, "firstName": "Pat", "lastName": "Lee" }),
    );
    assert_eq!(updated["user"]["firstName"], "Pat");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn removed_role_stops_working_with_old_token() {
    let (_ws, mut child, mut stdin, mut reader) = seeded_sidecar("marksd-policy-revoke");
    let (s, r) = (&mut stdin, &mut reader);

    let users = request_ok(s, r, "1", "users.list", Some("admin-token"), json!({}));
    let lee_id = users["users"]
        .as_array()
        .and_then(|a| a.iter().find(|u| u["email"] == "lee@uni.ac.uk"))
        .and_then(|u| u["id"].as_i64())
        .expect("lee");

    request_ok(s, r, "2", "degrees.list", Some("lect-token"), json!({}));
    request_ok(
        s,
        r,
        "3",
        "roles.remove",
        Some("admin-token"),
        json!({ "userId": lee_id, "role": "lecturer" }),
    );
    let e = request_err(s, r, "4", "degrees.list", Some("lect-token"), json!({}));
    assert_eq!(error_code(&e), "forbidden");
    assert_eq!(e["details"]["reason"], "lecturer_or_admin_required");

    drop(stdin);
    let _ = child.wait();
}

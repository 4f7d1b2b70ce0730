mod common;

use std::sync::Arc;

use common::{id_of, message, spawn_app, spawn_app_with_policy, TestApp};
use schoolhub::server::middleware::auth::AdminWrites;
use serde_json::json;

async fn class_with_section(app: &TestApp) -> (String, String) {
    let section = app.create("/api/sections", json!({ "name": "A" })).await;
    let class = app
        .create("/api/classes", json!({ "name": "Grade 2", "sectionIds": [section] }))
        .await;
    (class, section)
}

#[tokio::test]
async fn envelope_and_request_id() {
    let app = spawn_app().await;

    let (status, headers, body) = app.get_with_headers("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert!(headers.contains_key("x-request-id"));

    let resp = app
        .client
        .get(format!("{}/api/sections", app.base))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .expect("send request");
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("trace-me-42")
    );

    let (status, headers, body) = app.get_with_headers("/api/nowhere").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert!(headers.contains_key("x-request-id"));

    let resp = app
        .client
        .post(format!("{}/api/sections", app.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("send request");
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], false);
    assert_eq!(message(&body), "Invalid JSON body");
}

#[tokio::test]
async fn subject_codes_increment() {
    let app = spawn_app().await;

    let (_, first) = app.post("/api/subjects", json!({ "name": "Mathematics" })).await;
    let (_, second) = app
        .post("/api/subjects", json!({ "name": "Mathematics II", "type": "practical" }))
        .await;
    assert_eq!(first["data"]["code"], "MAT001");
    assert_eq!(first["data"]["type"], "theory");
    assert_eq!(second["data"]["code"], "MAT002");
    assert_eq!(second["data"]["type"], "practical");
}

#[tokio::test]
async fn teacher_assignment_rules() {
    let app = spawn_app().await;
    let (class, section) = class_with_section(&app).await;
    let t1 = app
        .create(
            "/api/staff",
            json!({ "firstName": "Ada", "lastName": "L", "email": "ada@school.test", "role": "teacher" }),
        )
        .await;
    let t2 = app
        .create(
            "/api/staff",
            json!({ "firstName": "Bo", "lastName": "K", "email": "bo@school.test", "role": "teacher" }),
        )
        .await;

    let (status, body) = app
        .post(
            "/api/teacher-assignments",
            json!({ "classId": class, "sectionId": section, "teacherIds": [t1], "classTeacherId": t2 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        message(&body),
        "Class teacher must be one of the assigned teachers"
    );

    let assignment = json!({ "classId": class, "sectionId": section, "teacherIds": [t1, t2], "classTeacherId": t1 });
    let id = app.create("/api/teacher-assignments", assignment.clone()).await;
    let (status, body) = app.post("/api/teacher-assignments", assignment).await;
    assert_eq!(status, 409);
    assert_eq!(
        message(&body),
        "Teachers are already assigned to this class & section"
    );

    let (status, body) = app
        .put(
            &format!("/api/teacher-assignments/{id}"),
            json!({ "classTeacherId": t2 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["classTeacher"]["id"], t2.as_str());

    let (status, body) = app
        .get(&format!(
            "/api/teacher-assignments/class/{class}/section/{section}"
        ))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["teachers"].as_array().map(Vec::len), Some(2));

    let (status, body) = app
        .post(
            "/api/staff",
            json!({ "firstName": "Ada", "lastName": "L", "email": "ADA@school.test" }),
        )
        .await;
    assert_eq!(status, 409, "{body}");
}

#[tokio::test]
async fn students_and_attendance() {
    let app = spawn_app().await;
    let (class, section) = class_with_section(&app).await;

    let (status, body) = app
        .post(
            "/api/students",
            json!({
                "admissionNo": "ADM-7",
                "firstName": "Mary Jane",
                "lastName": "Doe",
                "classId": class,
                "sectionId": section,
            }),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["username"], "maryjane.adm-7");
    let student = id_of(&body);

    let (status, body) = app.post("/api/students", json!({ "admissionNo": "ADM-8" })).await;
    assert_eq!(status, 400);
    assert_eq!(
        message(&body),
        "Missing required fields: firstName, lastName, classId, sectionId"
    );

    for mark in ["absent", "late"] {
        let (status, body) = app
            .post(
                "/api/attendance/bulk",
                json!({
                    "classId": class,
                    "sectionId": section,
                    "date": "2026-10-12",
                    "records": [{ "studentId": student, "status": mark }],
                }),
            )
            .await;
        assert_eq!(status, 201, "{body}");
    }

    let (status, body) = app
        .get(&format!(
            "/api/attendance?classId={class}&sectionId={section}&date=2026-10-12"
        ))
        .await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "late");

    let (status, body) = app
        .get(&format!("/api/attendance/student/{student}/summary"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalDays"], 1);
    assert_eq!(body["data"]["attendancePercentage"], 100.0);

    let (status, body) = app.delete(&format!("/api/classes/{class}")).await;
    assert_eq!(status, 409, "{body}");
}

#[tokio::test]
async fn notices_and_complaints() {
    let app = spawn_app().await;

    app.create(
        "/api/notices",
        json!({ "title": "Holiday", "body": "School closed", "publishedOn": "2026-10-01" }),
    )
    .await;
    app.create(
        "/api/notices",
        json!({ "title": "PTA", "body": "Meeting", "audience": "parents", "publishedOn": "2026-10-05" }),
    )
    .await;
    app.create(
        "/api/notices",
        json!({ "title": "Staff room", "body": "Closed", "audience": "staff", "publishedOn": "2026-10-07" }),
    )
    .await;

    let (status, body) = app.get("/api/notices?audience=parents").await;
    assert_eq!(status, 200);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .expect("notices")
        .iter()
        .filter_map(|n| n["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["PTA", "Holiday"]);

    let complaint = app
        .create(
            "/api/complaints",
            json!({ "raisedBy": "A parent", "subject": "Bus", "description": "Late again" }),
        )
        .await;
    let (status, body) = app
        .put(
            &format!("/api/complaints/{complaint}/status"),
            json!({ "status": "in_progress" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "in_progress");

    let (status, body) = app
        .put(
            &format!("/api/complaints/{complaint}/status"),
            json!({ "status": "lost" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(message(&body), "Invalid status: lost");
}

#[tokio::test]
async fn admission_flow() {
    let app = spawn_app().await;
    let (class, _) = class_with_section(&app).await;

    let (status, body) = app
        .post(
            "/api/admissions/applications",
            json!({
                "applicantName": "Sam Small",
                "applyingForClassId": class,
                "guardianName": "Pat Small",
                "guardianPhone": "555-0101",
            }),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["status"], "submitted");
    assert!(body["data"]["applicationNo"]
        .as_str()
        .is_some_and(|n| n.starts_with("APP-")));
    let id = id_of(&body);

    let (status, body) = app
        .put(
            &format!("/api/admissions/applications/{id}/exam"),
            json!({ "examDate": "2026-11-02", "score": 150 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(message(&body), "score must be between 0 and 100");

    let (status, body) = app
        .put(
            &format!("/api/admissions/applications/{id}/exam"),
            json!({ "examDate": "2026-11-02" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["status"], "exam_scheduled");
    assert_eq!(body["data"]["exam"]["maxScore"], 100.0);

    let (status, body) = app
        .get(&format!("/api/admissions/applications/{id}/details"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["applicantName"], "Sam Small");
    assert_eq!(body["data"]["exam"]["examDate"], "2026-11-02");

    let (_, body) = app.get("/api/dashboard/summary").await;
    assert_eq!(body["data"]["pendingApplications"], 1);
    assert_eq!(body["data"]["classes"], 1);

    let (status, _) = app
        .delete(&format!("/api/admissions/applications/{id}"))
        .await;
    assert_eq!(status, 200);
    let (status, _) = app
        .get(&format!("/api/admissions/applications/{id}/details"))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn access_policy_can_refuse_writes() {
    let app = spawn_app_with_policy(Arc::new(AdminWrites)).await;

    let (status, body) = app.post("/api/sections", json!({ "name": "A" })).await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);

    let (status, _) = app.get("/api/sections").await;
    assert_eq!(status, 200);

    let resp = app
        .client
        .post(format!("{}/api/sections", app.base))
        .header("x-role", "admin")
        .json(&json!({ "name": "A" }))
        .send()
        .await
        .expect("send request");
    assert_eq!(resp.status().as_u16(), 201);
}

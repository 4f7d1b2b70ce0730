mod common;

use common::{id_of, message, spawn_app, TestApp};
use serde_json::{json, Value};

/// Two classes with one section each, one subject group per class,
/// T1 teaching both classes and T2 only the first.
struct School {
    app: TestApp,
    c1: String,
    s1: String,
    g1: String,
    c2: String,
    s2: String,
    g2: String,
    math: String,
    t1: String,
    t2: String,
}

async fn teacher(app: &TestApp, first: &str) -> String {
    app.create(
        "/api/staff",
        json!({
            "firstName": first,
            "lastName": "Teacher",
            "email": format!("{}@school.test", first.to_lowercase()),
            "role": "teacher",
        }),
    )
    .await
}

async fn school() -> School {
    let app = spawn_app().await;

    let s1 = app.create("/api/sections", json!({ "name": "A" })).await;
    let s2 = app.create("/api/sections", json!({ "name": "B" })).await;
    let c1 = app
        .create("/api/classes", json!({ "name": "Grade 5", "sectionIds": [s1] }))
        .await;
    let c2 = app
        .create("/api/classes", json!({ "name": "Grade 6", "sectionIds": [s2] }))
        .await;
    let math = app
        .create("/api/subjects", json!({ "name": "Mathematics" }))
        .await;
    let g1 = app
        .create(
            "/api/subject-groups",
            json!({ "name": "G5 core", "classId": c1, "sectionIds": [s1], "subjectIds": [math] }),
        )
        .await;
    let g2 = app
        .create(
            "/api/subject-groups",
            json!({ "name": "G6 core", "classId": c2, "sectionIds": [s2], "subjectIds": [math] }),
        )
        .await;
    let t1 = teacher(&app, "Tess").await;
    let t2 = teacher(&app, "Theo").await;
    app.create(
        "/api/teacher-assignments",
        json!({ "classId": c1, "sectionId": s1, "teacherIds": [t1, t2], "classTeacherId": t1 }),
    )
    .await;
    app.create(
        "/api/teacher-assignments",
        json!({ "classId": c2, "sectionId": s2, "teacherIds": [t1], "classTeacherId": t1 }),
    )
    .await;

    School {
        app,
        c1,
        s1,
        g1,
        c2,
        s2,
        g2,
        math,
        t1,
        t2,
    }
}

impl School {
    fn grade_five(&self, teacher: &str, from: &str, to: &str) -> Value {
        json!({
            "classId": self.c1,
            "sectionId": self.s1,
            "subjectGroupId": self.g1,
            "day": "Monday",
            "subjectId": self.math,
            "teacherId": teacher,
            "timeFrom": from,
            "timeTo": to,
            "roomNo": "101",
        })
    }

    fn grade_six(&self, teacher: &str, from: &str, to: &str) -> Value {
        json!({
            "classId": self.c2,
            "sectionId": self.s2,
            "subjectGroupId": self.g2,
            "day": "Monday",
            "subjectId": self.math,
            "teacherId": teacher,
            "timeFrom": from,
            "timeTo": to,
        })
    }
}

#[tokio::test]
async fn class_section_overlap_is_rejected() {
    let school = school().await;
    let app = &school.app;

    let (status, body) = app
        .post("/api/timetables", school.grade_five(&school.t1, "09:00", "10:00"))
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["class"]["name"], "Grade 5");
    assert_eq!(body["data"]["subject"]["code"], "MAT001");
    assert_eq!(body["data"]["teacher"]["name"], "Tess Teacher");
    assert_eq!(body["data"]["timeFrom"], "09:00");

    let (status, body) = app
        .post("/api/timetables", school.grade_five(&school.t2, "09:30", "10:30"))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    assert_eq!(
        message(&body),
        "Time overlaps with another period for this class/section"
    );
}

#[tokio::test]
async fn teacher_double_booking_is_rejected() {
    let school = school().await;
    let app = &school.app;

    let (status, _) = app
        .post("/api/timetables", school.grade_five(&school.t1, "09:00", "10:00"))
        .await;
    assert_eq!(status, 201);

    let (status, body) = app
        .post("/api/timetables", school.grade_six(&school.t1, "09:30", "10:30"))
        .await;
    assert_eq!(status, 409);
    assert_eq!(message(&body), "Teacher has another class at this time");

    let (_, listed) = app.get("/api/timetables").await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn back_to_back_periods_are_allowed() {
    let school = school().await;
    let app = &school.app;

    for (from, to) in [("09:00", "10:00"), ("10:00", "11:00")] {
        let (status, body) = app
            .post("/api/timetables", school.grade_five(&school.t1, from, to))
            .await;
        assert_eq!(status, 201, "{from}-{to}: {body}");
    }
    let (status, _) = app
        .post("/api/timetables", school.grade_six(&school.t1, "11:00", "12:00"))
        .await;
    assert_eq!(status, 201);
}

#[tokio::test]
async fn request_validation_errors() {
    let school = school().await;
    let app = &school.app;

    let (status, body) = app
        .post("/api/timetables", school.grade_five(&school.t1, "10:00", "09:00"))
        .await;
    assert_eq!(status, 400);
    assert_eq!(message(&body), "timeFrom must be earlier than timeTo");

    let (status, body) = app
        .post("/api/timetables", school.grade_five(&school.t1, "9am", "10:00"))
        .await;
    assert_eq!(status, 400);
    assert_eq!(message(&body), "Invalid time format: 9am");

    let (status, body) = app
        .post("/api/timetables", json!({ "classId": school.c1, "day": "Monday" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        message(&body),
        "Missing required fields: sectionId, subjectGroupId, subjectId, teacherId, timeFrom, timeTo"
    );

    let mut bad_day = school.grade_five(&school.t1, "09:00", "10:00");
    bad_day["day"] = json!("Funday");
    let (status, body) = app.post("/api/timetables", bad_day).await;
    assert_eq!(status, 400);
    assert_eq!(message(&body), "Invalid day: Funday");
}

#[tokio::test]
async fn membership_errors() {
    let school = school().await;
    let app = &school.app;

    // grade 6 group used for a grade 5 period
    let mut wrong_group = school.grade_five(&school.t1, "09:00", "10:00");
    wrong_group["subjectGroupId"] = json!(school.g2);
    let (status, body) = app.post("/api/timetables", wrong_group).await;
    assert_eq!(status, 400);
    assert_eq!(message(&body), "Subject Group does not belong to this Class");

    // T2 is not assigned to grade 6
    let (status, body) = app
        .post("/api/timetables", school.grade_six(&school.t2, "09:00", "10:00"))
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        message(&body),
        "Teacher is not assigned to this class & section"
    );

    let mut missing_group = school.grade_five(&school.t1, "09:00", "10:00");
    missing_group["subjectGroupId"] = json!("no-such-group");
    let (status, body) = app.post("/api/timetables", missing_group).await;
    assert_eq!(status, 404);
    assert_eq!(message(&body), "Subject Group not found");
}

#[tokio::test]
async fn delete_then_delete_again() {
    let school = school().await;
    let app = &school.app;

    let (_, body) = app
        .post("/api/timetables", school.grade_five(&school.t1, "09:00", "10:00"))
        .await;
    let id = id_of(&body);

    let (status, _) = app.get(&format!("/api/timetables/{id}")).await;
    assert_eq!(status, 200);
    let (status, body) = app.delete(&format!("/api/timetables/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    let (status, body) = app.delete(&format!("/api/timetables/{id}")).await;
    assert_eq!(status, 404);
    assert_eq!(message(&body), "Timetable entry not found");
}

#[tokio::test]
async fn weekly_schedules_group_by_day() {
    let school = school().await;
    let app = &school.app;

    let mut friday = school.grade_five(&school.t2, "08:00", "09:00");
    friday["day"] = json!("friday");
    for body in [
        school.grade_five(&school.t1, "11:00", "12:00"),
        friday,
        school.grade_five(&school.t2, "09:00", "10:00"),
    ] {
        let (status, json) = app.post("/api/timetables", body).await;
        assert_eq!(status, 201, "{json}");
    }

    let (status, body) = app
        .get(&format!(
            "/api/timetables/class/{}/section/{}",
            school.c1, school.s1
        ))
        .await;
    assert_eq!(status, 200);
    let days = body["data"].as_array().expect("days");
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["day"], "Monday");
    assert_eq!(days[0]["periods"][0]["timeFrom"], "09:00");
    assert_eq!(days[0]["periods"][1]["timeFrom"], "11:00");
    assert_eq!(days[1]["day"], "Friday");

    let (status, body) = app
        .get(&format!("/api/timetables/teacher/{}", school.t2))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = app.get("/api/timetables?day=Friday").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

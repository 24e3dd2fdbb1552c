use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .env_remove("ROSTERD_WORKSPACE")
        .env_remove("ROSTERD_SEED_DEMO")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn create_student(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, id: &str, first: &str) {
    request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({
            "firstName": first,
            "lastName": "Doe",
            "email": format!("{}@school.edu", first.to_lowercase()),
            "studentId": format!("STU-{}", first),
            "dateOfBirth": "2009-02-14",
            "gradeLevel": 9
        }),
    );
}

#[test]
fn enrollment_is_a_set_and_reports_changes() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    create_student(&mut stdin, &mut reader, "s1", "Ann");
    create_student(&mut stdin, &mut reader, "s2", "Ben");
    let class = request_ok(
        &mut stdin,
        &mut reader,
        "c1",
        "classes.create",
        json!({ "name": "Biology", "subject": "Science", "period": "2nd", "room": "Lab 1" }),
    );
    assert_eq!(class["class"]["term"], "Fall 2024");
    assert_eq!(class["class"]["studentIds"], json!([]));

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "classes.addStudent",
        json!({ "classId": 1, "studentId": 2 }),
    );
    assert_eq!(added["changed"], true);
    let rev = added["revision"].clone();

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.addStudent",
        json!({ "classId": 1, "studentId": 2 }),
    );
    assert_eq!(again["changed"], false);
    assert_eq!(again["revision"], rev);
    assert_eq!(again["class"]["studentIds"], json!([2]));

    request_ok(&mut stdin, &mut reader, "3", "classes.addStudent", json!({ "classId": 1, "studentId": 1 }));
    let roster = request_ok(&mut stdin, &mut reader, "4", "classes.students", json!({ "classId": 1 }));
    assert_eq!(roster["students"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(roster["missingStudentIds"], json!([]));

    let resp = request(&mut stdin, &mut reader, "5", "classes.addStudent", json!({ "classId": 1, "studentId": 9 }));
    assert_eq!(error_code(&resp), "not_found");
    let resp = request(&mut stdin, &mut reader, "6", "classes.addStudent", json!({ "classId": 9, "studentId": 1 }));
    assert_eq!(error_code(&resp), "not_found");

    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "classes.removeStudent",
        json!({ "classId": 1, "studentId": 2 }),
    );
    assert_eq!(removed["changed"], true);
    assert_eq!(removed["class"]["studentIds"], json!([1]));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn deleted_students_show_up_as_missing_from_the_roster() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    create_student(&mut stdin, &mut reader, "s1", "Ann");
    request_ok(
        &mut stdin,
        &mut reader,
        "c1",
        "classes.create",
        json!({ "name": "Biology", "subject": "Science", "period": "2nd", "room": "Lab 1" }),
    );
    request_ok(&mut stdin, &mut reader, "1", "classes.addStudent", json!({ "classId": 1, "studentId": 1 }));
    request_ok(&mut stdin, &mut reader, "2", "students.delete", json!({ "id": 1 }));

    let roster = request_ok(&mut stdin, &mut reader, "3", "classes.students", json!({ "classId": 1 }));
    assert_eq!(roster["students"], json!([]));
    assert_eq!(roster["missingStudentIds"], json!([1]));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn classes_list_filters_by_term_and_search() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "classes.create",
        json!({ "name": "Biology", "subject": "Science", "period": "2nd", "room": "Lab 1" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "Poetry", "subject": "English", "period": "4th", "room": "204", "term": "Spring 2025" }),
    );
    let resp = request(&mut stdin, &mut reader, "3", "classes.create", json!({ "name": "No Room", "subject": "Art", "period": "5th" }));
    assert_eq!(error_code(&resp), "bad_params");

    let spring = request_ok(&mut stdin, &mut reader, "4", "classes.list", json!({ "term": "Spring 2025" }));
    assert_eq!(spring["classes"].as_array().map(|a| a.len()), Some(1));
    let sci = request_ok(&mut stdin, &mut reader, "5", "classes.list", json!({ "query": "scien" }));
    assert_eq!(sci["classes"][0]["name"], "Biology");

    drop(stdin);
    let _ = child.wait();
}

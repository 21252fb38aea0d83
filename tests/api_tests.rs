// tests/api_tests.rs

use agriquest::{config::Config, routes, state::AppState};
use sqlx::sqlite::SqlitePoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // One connection so every query sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers and logs in an account, returning its bearer token.
async fn token_for(client: &reqwest::Client, address: &str, kind: &str, name: &str) -> String {
    let email = unique_email(name);
    let password = "password123";

    let register = client
        .post(format!("{}/api/auth/{}/register", address, kind))
        .json(&serde_json::json!({ "name": name, "email": email, "password": password }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register.status().as_u16(), 201);

    let login = client
        .post(format!("{}/api/auth/{}/login", address, kind))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

fn sample_quiz() -> serde_json::Value {
    serde_json::json!({
        "title": "Farm Basics",
        "subject": "Agriculture",
        "time_limit": 15,
        "difficulty": "Beginner",
        "description": "A small test quiz",
        "questions": [
            {"type": "mc", "text": "Which is a crop?", "correct": "A", "options": [
                {"key": "A", "text": "Rice"},
                {"key": "B", "text": "Laptop"},
                {"key": "C", "text": "Phone"},
                {"key": "D", "text": "Car"}
            ]},
            {"type": "tf", "text": "Cows lay eggs.", "correct": "False"}
        ]
    })
}

#[tokio::test]
async fn unknown_route_is_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("dup");
    let body = serde_json::json!({ "name": "Ana", "email": email, "password": "password123" });

    // Act
    let first = client
        .post(format!("{}/api/auth/students/register", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    let second = client
        .post(format!("{}/api/auth/students/register", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    let invalid = client
        .post(format!("{}/api/auth/students/register", address))
        .json(&serde_json::json!({ "name": "Ana", "email": "not-an-email", "password": "password123" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 409);
    assert_eq!(invalid.status().as_u16(), 400);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("teacher");
    client
        .post(format!("{}/api/auth/teachers/register", address))
        .json(&serde_json::json!({ "name": "Mr T", "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();

    // Act
    let response = client
        .post(format!("{}/api/auth/teachers/login", address))
        .json(&serde_json::json!({ "email": email, "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn teacher_creates_quiz_and_student_sees_it_without_answers() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token_for(&client, &address, "teachers", "teacher").await;

    // Act
    let created = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .json(&sample_quiz())
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let quiz_id = created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let listed: Vec<serde_json::Value> = client
        .get(format!("{}/api/quizzes?subject=Agriculture", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let detail: serde_json::Value = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["question_count"], 2);
    assert_eq!(listed[0]["subject"], "Agriculture");

    let questions = detail["questions"].as_array().unwrap();
    assert_eq!(detail["title"], "Farm Basics");
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["type"], "multiple-choice");
    assert_eq!(questions[0]["options"].as_array().unwrap().len(), 4);
    assert_eq!(questions[1]["type"], "true-false");
    assert!(questions.iter().all(|q| q.get("correct_answer").is_none()));

    let subjects: Vec<serde_json::Value> = client
        .get(format!("{}/api/subjects", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(subjects.len(), 1);
}

#[tokio::test]
async fn invalid_question_persists_nothing() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token_for(&client, &address, "teachers", "teacher").await;
    let mut quiz = sample_quiz();
    quiz["questions"][1]["type"] = serde_json::json!("essay");

    // Act
    let response = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .json(&quiz)
        .send()
        .await
        .unwrap();

    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    assert!(mine.is_empty());
}

#[tokio::test]
async fn missing_prompt_text_is_rejected() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token_for(&client, &address, "teachers", "teacher").await;
    let mut quiz = sample_quiz();
    quiz["questions"][0]
        .as_object_mut()
        .unwrap()
        .remove("text");

    // Act
    let response = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .json(&quiz)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn prompt_that_is_only_markup_is_rejected() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token_for(&client, &address, "teachers", "teacher").await;
    let mut quiz = sample_quiz();
    quiz["questions"][0]["text"] = serde_json::json!("<script>alert(1)</script>");

    // Act
    let response = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .json(&quiz)
        .send()
        .await
        .unwrap();

    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    assert!(mine.is_empty());
}

#[tokio::test]
async fn subject_filter_matches_names_with_ampersands() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token_for(&client, &address, "teachers", "teacher").await;
    let mut quiz = sample_quiz();
    quiz["subject"] = serde_json::json!("Crops & Soil");

    let created = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .json(&quiz)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    // Act
    let filtered: Vec<serde_json::Value> = client
        .get(format!("{}/api/quizzes?subject=Crops%20%26%20Soil", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["title"], "Farm Basics");
}

#[tokio::test]
async fn role_checks_guard_teacher_routes() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let student = token_for(&client, &address, "students", "student").await;

    // Act
    let as_student = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&student)
        .json(&sample_quiz())
        .send()
        .await
        .unwrap();
    let anonymous = client
        .post(format!("{}/api/teacher/quizzes", address))
        .json(&sample_quiz())
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(as_student.status().as_u16(), 403);
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn teacher_search_and_delete() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token_for(&client, &address, "teachers", "teacher").await;
    let other = token_for(&client, &address, "teachers", "other").await;

    let quiz_id = client
        .post(format!("{}/api/teacher/quizzes", address))
        .bearer_auth(&teacher)
        .json(&sample_quiz())
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    // Act
    let hits: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/quizzes?q=farm", address))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let misses: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/quizzes?q=physics", address))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let foreign_delete = client
        .delete(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    let own_delete = client
        .delete(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    let after = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["question_count"], 2);
    assert!(misses.is_empty());
    assert_eq!(foreign_delete.status().as_u16(), 404);
    assert_eq!(own_delete.status().as_u16(), 204);
    assert_eq!(after.status().as_u16(), 404);
}

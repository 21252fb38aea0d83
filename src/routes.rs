// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, quiz, student, subjects, teacher},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, subjects, quizzes, student, teacher).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool and Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/students/register", post(auth::register_student))
        .route("/students/login", post(auth::login_student))
        .route("/teachers/register", post(auth::register_teacher))
        .route("/teachers/login", post(auth::login_teacher));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        // Students only
        .merge(
            Router::new()
                .route("/{id}/attempts", post(quiz::submit_attempt))
                .layer(middleware::from_fn(student_middleware))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let student_routes = Router::new()
        .route("/progress", get(student::get_progress))
        .route("/goals", put(student::update_goals))
        .route("/attempts", get(student::list_attempts))
        .route("/attempts/export", get(student::export_attempts))
        // Auth first, then role check
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let teacher_routes = Router::new()
        .route(
            "/quizzes",
            get(teacher::list_my_quizzes).post(teacher::create_quiz),
        )
        .route("/quizzes/{id}", delete(teacher::delete_quiz))
        .route("/subjects", post(subjects::create_subject))
        .route("/students", get(teacher::list_students))
        .route("/students/export", get(teacher::export_students))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .route("/api/subjects", get(subjects::list_subjects))
        .route("/api/leaderboard", get(quiz::get_leaderboard))
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/student", student_routes)
        .nest("/api/teacher", teacher_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, models::user::Role, utils::jwt::sign_jwt};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    const SECRET: &str = "router_test_secret";

    fn test_state() -> AppState {
        AppState {
            pool: SqlitePool::connect_lazy("sqlite::memory:").unwrap(),
            config: Config {
                database_url: "sqlite::memory:".to_string(),
                jwt_secret: SECRET.to_string(),
                jwt_expiration: 60,
                rust_log: "error".to_string(),
                bind_addr: "127.0.0.1:0".to_string(),
            },
        }
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn student_routes_require_a_token() {
        let app = create_router(test_state());
        let response = app.oneshot(get("/api/student/progress", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = create_router(test_state());
        let response = app
            .oneshot(get("/api/teacher/students", Some("not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let token = sign_jwt(1, Role::Teacher, SECRET, 60).unwrap();
        let app = create_router(test_state());
        let response = app
            .oneshot(get("/api/student/progress", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

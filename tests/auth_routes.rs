use rocket::http::{ContentType, Status};
use rocket::routes;
use serde_json::json;

use task_server::auth::responses::{AuthErrorResponse, LoginResponse, RegisterResponse};
use task_server::auth::routes::{login, register};
use task_server::test_support::{
    TestDatabase, TestDatabaseError, TestRocketBuilder, test_auth_state,
};

#[tokio::test]
async fn register_then_login_issues_a_token_for_the_user() {
    let test_db = match TestDatabase::new_from_env().await {
        Ok(db) => db,
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping auth route test: TEST_DATABASE_URL not set");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let auth = test_auth_state();
    let client = TestRocketBuilder::new()
        .manage_pg_pool(test_db.pool_clone())
        .manage_auth_state(auth.clone())
        .mount_api_routes(routes![register, login])
        .async_client()
        .await;

    let registration = json!({
        "username": "ada",
        "email": "Ada@Example.com",
        "password": "correct horse battery staple"
    });

    let response = client
        .post("/api/v1/register")
        .header(ContentType::JSON)
        .body(registration.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let registered: RegisterResponse = response.into_json().await.expect("register payload");
    assert_eq!(registered.message, "User registered successfully");

    let response = client
        .post("/api/v1/register")
        .header(ContentType::JSON)
        .body(registration.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let error: AuthErrorResponse = response.into_json().await.expect("error payload");
    assert_eq!(error.message, "User already exists");

    let response = client
        .post("/api/v1/register")
        .header(ContentType::JSON)
        .body(json!({ "username": "bob", "email": "bob@example.com" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let error: AuthErrorResponse = response.into_json().await.expect("error payload");
    assert_eq!(error.message, "All fields are required");

    let response = client
        .post("/api/v1/login")
        .header(ContentType::JSON)
        .body(json!({ "email": "ada@example.com", "password": "wrong" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let error: AuthErrorResponse = response.into_json().await.expect("error payload");
    assert_eq!(error.message, "Invalid password");

    let response = client
        .post("/api/v1/login")
        .header(ContentType::JSON)
        .body(json!({ "email": "nobody@example.com", "password": "x" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let error: AuthErrorResponse = response.into_json().await.expect("error payload");
    assert_eq!(error.message, "User not found");

    let response = client
        .post("/api/v1/login")
        .header(ContentType::JSON)
        .body(
            json!({ "email": "ada@example.com", "password": "correct horse battery staple" })
                .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let login: LoginResponse = response.into_json().await.expect("login payload");
    let user_id = auth
        .jwt_service
        .authenticate(&login.token)
        .expect("token verifies");
    assert_eq!(user_id, registered.user_id);

    drop(client);
    test_db.close().await.expect("failed to drop test database");
}

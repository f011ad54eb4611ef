use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use oficina_api::{
    config::AdminSeed, create_router, db, services::user_service, AppState, Config,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    _dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap()
    }
}

async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("api.db").display());
    let db_pool = db::create_db_pool(&database_url).await.unwrap();

    let config = Config {
        database_url,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        jwt_secret: "segredo-de-teste-com-mais-de-32-bytes".into(),
        token_ttl_secs: 3600,
        certificates_dir: dir.path().join("certificates"),
        public_base_url: None,
        bcrypt_cost: 4,
        admin_seed: None,
    };
    let state = AppState::new(db_pool, &config);

    TestApp {
        router: create_router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "localhost:3000");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();

        TestResponse {
            status,
            content_type,
            bytes,
        }
    }

    async fn register(&self, body: Value) -> TestResponse {
        self.send(Method::POST, "/register", None, Some(body)).await
    }

    async fn register_as(&self, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, "/register", Some(token), Some(body)).await
    }

    /// Regista e devolve o id do novo utilizador. Contas de staff são
    /// criadas com o token do administrador.
    async fn register_user(&self, name: &str, email: &str, role: &str) -> i64 {
        let admin = if role == "user" { None } else { Some(self.seed_admin().await) };
        let res = self
            .send(Method::POST, "/register", admin.as_deref(), Some(json!({
                "name": name,
                "email": email,
                "password": "12345",
                "role": role,
                "RA": "RA-1",
                "curso": "ADS",
            })))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.json());
        res.json()["user"]["id"].as_i64().unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn token_for(&self, email: &str) -> String {
        let res = self.login(email, "12345").await;
        assert_eq!(res.status, StatusCode::OK);
        res.json()["token"].as_str().unwrap().to_string()
    }

    async fn seed_admin(&self) -> String {
        let seed = AdminSeed {
            email: "admin@example.com".into(),
            password: "12345".into(),
        };
        user_service::ensure_admin(&self.state.db_pool, &seed, 4)
            .await
            .unwrap();
        self.token_for("admin@example.com").await
    }
}

#[tokio::test]
async fn login_distinguishes_unknown_email_and_wrong_password() {
    let app = test_app().await;
    app.register_user("Aluno", "aluno@example.com", "user").await;

    let res = app.login("ninguem@example.com", "12345").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["message"], "Usuário não encontrado");

    let res = app.login("aluno@example.com", "errada").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["message"], "Credenciais inválidas");

    let res = app.login("Aluno@Example.com", "12345").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_enforces_professor_fields_and_unique_email() {
    let app = test_app().await;
    let admin = app.seed_admin().await;

    let res = app
        .register_as(&admin, json!({
            "name": "Jane", "email": "jane@example.com", "password": "x", "role": "professor", "curso": "ADS"
        }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .register_as(&admin, json!({
            "name": "Jane", "email": "jane@example.com", "password": "x", "role": "professor", "RA": "123"
        }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .register_as(&admin, json!({
            "name": "Jane", "email": "jane@example.com", "password": "x",
            "role": "professor", "RA": "123", "curso": "ADS"
        }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let body = res.json();
    assert!(body.get("token").is_none());
    assert_eq!(body["user"]["RA"], "123");

    let res = app
        .register(json!({ "name": "John", "email": "jane@example.com", "password": "y" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "E-mail já está em uso");
}

#[tokio::test]
async fn token_and_role_checks() {
    let app = test_app().await;
    app.register_user("Aluno", "aluno@example.com", "user").await;
    let student = app.token_for("aluno@example.com").await;

    let res = app.send(Method::GET, "/workshops", None, None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.send(Method::GET, "/workshops", Some("nao-e-um-jwt"), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.send(Method::GET, "/workshops", Some(&student), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!([]));

    let res = app
        .send(Method::POST, "/workshops", Some(&student), Some(json!({ "name": "W1" })))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.send(Method::GET, "/students", Some(&student), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = test_app().await;
    app.register_user("Aluno", "aluno@example.com", "user").await;
    let user = user_service::find_user_by_email(&app.state.db_pool, "aluno@example.com")
        .await
        .unwrap()
        .unwrap();

    let expired = oficina_api::services::token_service::TokenService::new(
        b"segredo-de-teste-com-mais-de-32-bytes",
        -60,
    )
    .issue(&user)
    .unwrap();

    let res = app.send(Method::GET, "/workshops", Some(&expired), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["message"], "Token inválido ou expirado");
}

#[tokio::test]
async fn listing_users_by_role_returns_empty_list() {
    let app = test_app().await;
    let admin = app.seed_admin().await;

    let res = app.send(Method::GET, "/professors", Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!([]));

    app.register_user("Prof", "prof@example.com", "professor").await;
    app.register_user("Aluno", "aluno@example.com", "user").await;

    let res = app.send(Method::GET, "/professors", Some(&admin), None).await;
    let professors = res.json();
    assert_eq!(professors.as_array().unwrap().len(), 1);
    assert_eq!(professors[0]["curso"], "ADS");

    let res = app.send(Method::GET, "/students", Some(&admin), None).await;
    let students = res.json();
    assert_eq!(students.as_array().unwrap().len(), 1);
    assert_eq!(students[0]["email"], "aluno@example.com");
    assert!(students[0]["RA"].is_null());
}

#[tokio::test]
async fn roster_management() {
    let app = test_app().await;
    app.register_user("Prof", "prof@example.com", "professor").await;
    let aluno_id = app.register_user("Aluno", "aluno@example.com", "user").await;
    let prof = app.token_for("prof@example.com").await;

    let res = app
        .send(Method::POST, "/workshops", Some(&prof), Some(json!({ "name": "W1", "description": "d" })))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let workshop_id = res.json()["workshop"]["id"].as_i64().unwrap();

    let add = json!({ "workshopId": workshop_id, "selectedStudentId": aluno_id });
    let res = app.send(Method::POST, "/workshops/students", Some(&prof), Some(add.clone())).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.send(Method::POST, "/workshops/students", Some(&prof), Some(add)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Estudante já vinculado ao workshop");

    let res = app
        .send(Method::GET, &format!("/workshops/{}", workshop_id), Some(&prof), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["professor"]["email"], "prof@example.com");
    assert_eq!(body["students"][0]["id"], aluno_id);
    assert_eq!(body["status"], "ativo");

    let remove = json!({ "workshopId": workshop_id, "studentId": aluno_id });
    let res = app.send(Method::DELETE, "/workshops/students", Some(&prof), Some(remove.clone())).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.send(Method::DELETE, "/workshops/students", Some(&prof), Some(remove)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .send(
            Method::DELETE,
            "/workshops/students",
            Some(&prof),
            Some(json!({ "workshopId": workshop_id + 100, "studentId": aluno_id })),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.send(Method::GET, "/workshops/999", Some(&prof), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn finalize_and_download_certificates() {
    let app = test_app().await;
    app.register_user("Prof Ana", "prof@example.com", "professor").await;
    let aluno_id = app.register_user("Maria Silva", "maria@example.com", "user").await;
    let prof = app.token_for("prof@example.com").await;
    let aluno = app.token_for("maria@example.com").await;

    let res = app
        .send(Method::POST, "/workshops", Some(&prof), Some(json!({ "name": "W1" })))
        .await;
    let workshop_id = res.json()["workshop"]["id"].as_i64().unwrap();
    let certificates_uri = format!("/workshops/{}/certificates", workshop_id);

    let res = app
        .send(
            Method::POST,
            "/workshops/students",
            Some(&prof),
            Some(json!({ "workshopId": workshop_id, "studentId": aluno_id })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    // Nada gerado antes da finalização
    let res = app.send(Method::GET, &certificates_uri, Some(&aluno), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let finalize_uri = format!("/workshops/{}/finalize", workshop_id);
    let res = app.send(Method::POST, &finalize_uri, Some(&aluno), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.send(Method::POST, &finalize_uri, Some(&prof), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["certificates"], 1);

    let res = app.send(Method::POST, &finalize_uri, Some(&prof), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "O workshop já está finalizado.");

    let res = app
        .send(Method::GET, &format!("/workshops/{}", workshop_id), Some(&aluno), None)
        .await;
    let body = res.json();
    assert_eq!(body["status"], "finalizado");
    assert!(!body["dataFinalizacao"].is_null());

    let res = app.send(Method::GET, &certificates_uri, Some(&aluno), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let links = res.json();
    let links = links.as_array().unwrap();
    assert_eq!(links.len(), 1);
    let name = links[0]["name"].as_str().unwrap().to_string();
    assert_eq!(name, format!("Maria_Silva_{}_certificate.pdf", aluno_id));
    assert_eq!(
        links[0]["url"],
        format!("http://localhost:3000/workshops/{}/certificates/{}", workshop_id, name)
    );

    let download_uri = format!("{}/{}", certificates_uri, name);
    let res = app.send(Method::GET, &download_uri, None, None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.send(Method::GET, &download_uri, Some(&aluno), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.content_type.as_deref(), Some("application/pdf"));
    assert!(res.bytes.starts_with(b"%PDF-"));

    let res = app
        .send(Method::GET, &format!("{}/..%2Fapi.db.pdf", certificates_uri), Some(&aluno), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .send(Method::GET, &format!("{}/Outro_9_certificate.pdf", certificates_uri), Some(&aluno), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.send(Method::POST, &certificates_uri, Some(&prof), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["certificates"], 1);
}

#[tokio::test]
async fn certificates_of_unknown_workshop_are_not_found() {
    let app = test_app().await;
    let admin = app.seed_admin().await;

    let res = app.send(Method::GET, "/workshops/42/certificates", Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["message"], "Workshop não encontrado");

    let res = app.send(Method::POST, "/workshops/42/finalize", Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_accounts_need_an_admin_token() {
    let app = test_app().await;
    let professor = json!({
        "name": "Prof", "email": "prof@example.com", "password": "x",
        "role": "professor", "RA": "1", "curso": "ADS"
    });

    let res = app.register(professor.clone()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.json()["message"].is_string());

    let res = app
        .register(json!({ "name": "Eve", "email": "eve@example.com", "password": "x", "role": "admin" }))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    app.register_user("Aluno", "aluno@example.com", "user").await;
    let student = app.token_for("aluno@example.com").await;
    let res = app.register_as(&student, professor.clone()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.register_as("nao-e-um-jwt", professor.clone()).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let admin = app.seed_admin().await;
    let res = app.register_as(&admin, professor).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["user"]["role"], "professor");
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = test_app().await;
    let admin = app.seed_admin().await;

    let assert_json_400 = |res: TestResponse| {
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.content_type.as_deref(), Some("application/json"));
        assert!(res.json()["message"].as_str().is_some_and(|m| !m.is_empty()));
    };

    assert_json_400(app.register(json!({})).await);
    assert_json_400(app.send(Method::GET, "/workshops/abc", Some(&admin), None).await);
    assert_json_400(
        app.send(Method::POST, "/workshops/students", Some(&admin), Some(json!({})))
            .await,
    );
    assert_json_400(
        app.send(Method::GET, "/workshops/abc/certificates/x.pdf", Some(&admin), None)
            .await,
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ não é json"))
        .unwrap();
    let res = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn regenerate_drops_certificates_of_removed_students() {
    let app = test_app().await;
    app.register_user("Prof", "prof@example.com", "professor").await;
    let ana = app.register_user("Ana", "ana@example.com", "user").await;
    let bia = app.register_user("Bia", "bia@example.com", "user").await;
    let prof = app.token_for("prof@example.com").await;

    let res = app
        .send(Method::POST, "/workshops", Some(&prof), Some(json!({ "name": "W1" })))
        .await;
    let workshop_id = res.json()["workshop"]["id"].as_i64().unwrap();
    for student in [ana, bia] {
        let res = app
            .send(
                Method::POST,
                "/workshops/students",
                Some(&prof),
                Some(json!({ "workshopId": workshop_id, "studentId": student })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
    }

    let res = app
        .send(Method::POST, &format!("/workshops/{}/finalize", workshop_id), Some(&prof), None)
        .await;
    assert_eq!(res.json()["certificates"], 2);

    let res = app
        .send(
            Method::DELETE,
            "/workshops/students",
            Some(&prof),
            Some(json!({ "workshopId": workshop_id, "studentId": bia })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let certificates_uri = format!("/workshops/{}/certificates", workshop_id);
    let res = app.send(Method::POST, &certificates_uri, Some(&prof), None).await;
    assert_eq!(res.json()["certificates"], 1);

    let res = app.send(Method::GET, &certificates_uri, Some(&prof), None).await;
    let names: Vec<String> = res
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec![format!("Ana_{}_certificate.pdf", ana)]);

    let res = app
        .send(
            Method::GET,
            &format!("{}/Bia_{}_certificate.pdf", certificates_uri, bia),
            Some(&prof),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

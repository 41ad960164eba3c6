//! Login, logout, Google sign-in, signup and the step guards.

use abacate_integration_tests::{
    CUSTOMER_EMAIL, GOOGLE_CODE, TestContext, location, standard_platform,
};
use reqwest::StatusCode;
use url::Url;

#[tokio::test]
async fn test_steps_require_login() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx.get("/frete").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some("/login?returnUrl=%2Ffrete")
    );

    let response = ctx.get("/pagamento").await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/login?returnUrl=%2Fpagamento")
    );

    let response = ctx.post("/pagamento/finalizar", &[]).await;
    assert!(
        location(&response)
            .as_deref()
            .is_some_and(|target| target.starts_with("/login"))
    );
    assert!(ctx.platform.payloads("completeCheckout").is_empty());
}

#[tokio::test]
async fn test_login_page_renders_return_url() {
    let ctx = TestContext::start(standard_platform()).await;

    let html = ctx.page("/login?returnUrl=%2Fpagamento").await;
    assert!(html.contains("name=\"input\""));
    assert!(html.contains("value=\"/pagamento\""));
    // Google sign-in is hidden without a client id.
    assert!(!html.contains("/login/google"));
}

#[tokio::test]
async fn test_login_associates_cart_and_returns() {
    let ctx = TestContext::start(standard_platform()).await;
    ctx.page("/carrinho").await;

    let target = ctx.login("/frete").await;
    assert_eq!(target, "/frete");

    let cart = ctx.cart();
    assert_eq!(
        ctx.platform.cart_owner(&cart.checkout_id).as_deref(),
        Some(CUSTOMER_EMAIL)
    );

    let html = ctx.page("/frete").await;
    assert!(html.contains("Camiseta Abacate"));
}

#[tokio::test]
async fn test_login_ignores_external_return_url() {
    let ctx = TestContext::start(standard_platform()).await;

    let target = ctx.login("https://evil.example/steal").await;
    assert_eq!(target, "/carrinho");
}

#[tokio::test]
async fn test_login_with_cpf() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx
        .post(
            "/login",
            &[
                ("input", "529.982.247-25"),
                ("pass", abacate_integration_tests::CUSTOMER_PASSWORD),
                ("return_url", "/frete"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));
}

#[tokio::test]
async fn test_wrong_password_shows_message() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx
        .post(
            "/login",
            &[
                ("input", CUSTOMER_EMAIL),
                ("pass", "errada"),
                ("return_url", "/frete"),
            ],
        )
        .await;
    let target = location(&response).expect("redirect");
    assert_eq!(target, "/login?error=credentials&returnUrl=%2Ffrete");

    let html = ctx.page(&target).await;
    assert!(html.contains("E-mail ou senha inválidos."));

    let response = ctx.get("/frete").await;
    assert!(
        location(&response)
            .as_deref()
            .is_some_and(|target| target.starts_with("/login"))
    );
}

#[tokio::test]
async fn test_logout_drops_the_customer() {
    let ctx = TestContext::start(standard_platform()).await;
    ctx.page("/carrinho").await;
    ctx.login("/frete").await;
    assert_eq!(ctx.get("/frete").await.status(), StatusCode::OK);

    let response = ctx.post("/logout", &[]).await;
    assert_eq!(location(&response).as_deref(), Some("/carrinho"));
    assert_eq!(ctx.platform.payloads("logout").len(), 1);

    let response = ctx.get("/frete").await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/login?returnUrl=%2Ffrete")
    );
}

#[tokio::test]
async fn test_google_unavailable_without_client_id() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx.get("/login/google").await;
    let target = location(&response).expect("redirect");
    assert!(target.contains("error=google-unavailable"));
}

#[tokio::test]
async fn test_google_sign_in_round_trip() {
    let ctx = TestContext::start_with(standard_platform(), Some("client-123")).await;
    ctx.page("/carrinho").await;

    let html = ctx.page("/login").await;
    assert!(html.contains("/login/google"));

    let response = ctx.get("/login/google?returnUrl=%2Fpagamento").await;
    let consent = Url::parse(&location(&response).expect("redirect")).expect("consent url");
    assert_eq!(consent.host_str(), Some("accounts.google.com"));
    let param = |name: &str| {
        consent
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };
    assert_eq!(param("client_id").as_deref(), Some("client-123"));
    assert_eq!(
        param("redirect_uri"),
        Some(ctx.url("/callback/google"))
    );
    let state = param("state").expect("state parameter");

    let callback = format!("/callback/google?code={GOOGLE_CODE}&state={state}");
    let response = ctx.get(&callback).await;
    assert_eq!(location(&response).as_deref(), Some("/pagamento"));

    let payloads = ctx.platform.payloads("socialLoginGoogle");
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["code"], GOOGLE_CODE);
}

#[tokio::test]
async fn test_google_callback_rejects_forged_state() {
    let ctx = TestContext::start_with(standard_platform(), Some("client-123")).await;

    ctx.get("/login/google").await;
    let response = ctx
        .get(&format!("/callback/google?code={GOOGLE_CODE}&state=forged"))
        .await;
    let target = location(&response).expect("redirect");
    assert!(target.contains("error=google"));
    assert!(ctx.platform.payloads("socialLoginGoogle").is_empty());
}

#[tokio::test]
async fn test_partial_person_signup_logs_in() {
    let ctx = TestContext::start(standard_platform()).await;
    ctx.page("/carrinho").await;

    let html = ctx.page("/signup?partial=true&returnUrl=%2Ffrete").await;
    assert!(html.contains("/signup/pessoa"));

    let response = ctx
        .post(
            "/signup/pessoa",
            &[
                ("partial", "true"),
                ("return_url", "/frete"),
                ("email", "bia@abacate.test"),
                ("cpf", "111.444.777-35"),
                ("full_name", "Bia Lima"),
                ("birth_date", "1992-03-05"),
                ("primary_phone_number", "(67) 99999-1234"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));
    assert!(ctx.platform.has_customer("bia@abacate.test"));

    let payloads = ctx.platform.payloads("signupPartialPerson");
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["cpf"], "111.444.777-35");
    assert_eq!(payloads[0]["birthDate"], "5/3/1992");
    assert_eq!(payloads[0]["primaryPhoneAreaCode"], "67");
    assert!(payloads[0].get("password").is_none());

    assert_eq!(ctx.get("/frete").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_rejects_invalid_cpf_locally() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx
        .post(
            "/signup/pessoa",
            &[
                ("partial", "true"),
                ("email", "bia@abacate.test"),
                ("cpf", "111.444.777-00"),
                ("full_name", "Bia Lima"),
                ("birth_date", "1992-03-05"),
                ("primary_phone_number", "67999991234"),
            ],
        )
        .await;
    let target = location(&response).expect("redirect");
    assert!(target.contains("error=cpf"));
    assert!(target.contains("partial=true"));
    assert!(ctx.platform.payloads("signupPartialPerson").is_empty());
}

#[tokio::test]
async fn test_full_company_signup_fills_address_from_cep() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx
        .post(
            "/signup/empresa",
            &[
                ("email", "compras@empresa.test"),
                ("cnpj", "11.222.333/0001-81"),
                ("corporate_name", "Empresa Ltda"),
                ("password", "segredo-forte"),
                ("password_confirmation", "segredo-forte"),
                ("primary_phone_number", "6733334444"),
                ("receiver_name", "Recepção"),
                ("cep", "79002-000"),
                ("address_number", "100"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/carrinho"));

    let payloads = ctx.platform.payloads("signupCompany");
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["cnpj"], "11.222.333/0001-81");
    assert_eq!(payloads[0]["address"], "Rua 14 de Julho");
    assert_eq!(payloads[0]["city"], "Campo Grande");
    assert_eq!(payloads[0]["state"], "MS");
}

#[tokio::test]
async fn test_signup_with_taken_email_shows_error() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx
        .post(
            "/signup/pessoa",
            &[
                ("partial", "true"),
                ("email", CUSTOMER_EMAIL),
                ("cpf", "111.444.777-35"),
                ("full_name", "Outra Ana"),
                ("birth_date", "1990-01-01"),
                ("primary_phone_number", "67999991234"),
            ],
        )
        .await;
    let target = location(&response).expect("redirect");
    assert!(target.contains("error=signup"));

    let html = ctx.page(&target).await;
    assert!(html.contains("Não foi possível concluir o cadastro."));
}

//! Shipping, payment and confirmation steps, end to end.

use abacate_integration_tests::{
    CEP, COUPON, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, Customer, FakePlatform, MUG, SHIRT,
    TestContext, location,
    platform::{BOLETO_METHOD_ID, CARD_METHOD_ID, DECLINED_CARD, PIX_METHOD_ID},
    standard_platform,
};
use abacate_storefront::services::cep::CepAddress;
use reqwest::StatusCode;

/// Log in with a fresh cart and create (and so select) an address.
async fn logged_in_with_address() -> TestContext {
    logged_in_with_address_on(standard_platform()).await
}

/// [`logged_in_with_address`] against a custom platform.
async fn logged_in_with_address_on(platform: FakePlatform) -> TestContext {
    let ctx = TestContext::start(platform).await;
    ctx.page("/carrinho").await;
    ctx.login("/frete").await;

    let response = ctx
        .post(
            "/frete/enderecos",
            &[
                ("receiver_name", "Ana Souza"),
                ("cep", "79002-000"),
                ("street", ""),
                ("address_number", "100"),
                ("address_details", "Apto 12"),
                ("neighborhood", ""),
                ("city", ""),
                ("state", ""),
                ("phone", "(67) 99999-1234"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));
    ctx
}

/// Continue from [`logged_in_with_address`] through shipping selection.
async fn ready_for_payment() -> TestContext {
    ready_for_payment_on(standard_platform()).await
}

/// [`ready_for_payment`] against a custom platform.
async fn ready_for_payment_on(platform: FakePlatform) -> TestContext {
    let ctx = logged_in_with_address_on(platform).await;
    let response = ctx
        .post("/frete/selecionar", &[("shipping_quote_id", "pac")])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));
    ctx
}

#[tokio::test]
async fn test_new_address_is_filled_from_cep_and_selected() {
    let ctx = logged_in_with_address().await;

    let addresses = ctx.platform.addresses(CUSTOMER_EMAIL);
    assert_eq!(addresses.len(), 1);
    let address = &addresses[0];
    assert_eq!(address.street.as_deref(), Some("Rua 14 de Julho"));
    assert_eq!(address.neighborhood.as_deref(), Some("Centro"));
    assert_eq!(address.city.as_deref(), Some("Campo Grande"));
    assert_eq!(address.state.as_deref(), Some("MS"));
    assert_eq!(address.cep.as_deref(), Some(CEP));

    let cart = ctx.cart();
    assert_eq!(
        cart.selected_address.map(|a| a.id),
        Some(address.id.clone())
    );

    let html = ctx.page("/frete").await;
    assert!(html.contains("Ana Souza"));
    assert!(html.contains("PAC"));
    assert!(html.contains("Retirada na loja"));
}

#[tokio::test]
async fn test_address_with_bad_phone_is_rejected() {
    let ctx = TestContext::start(standard_platform()).await;
    ctx.page("/carrinho").await;
    ctx.login("/frete").await;

    let response = ctx
        .post(
            "/frete/enderecos",
            &[
                ("receiver_name", "Ana Souza"),
                ("cep", CEP),
                ("address_number", "100"),
                ("phone", "123"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete?error=phone"));
    assert!(ctx.platform.addresses(CUSTOMER_EMAIL).is_empty());
}

#[tokio::test]
async fn test_selecting_another_address_requotes_shipping() {
    let ctx = logged_in_with_address().await;
    let first = ctx.cart().selected_address.map(|a| a.id);

    // A complete form skips the CEP lookup and leaves the selection alone.
    let response = ctx
        .post(
            "/frete/enderecos",
            &[
                ("receiver_name", "Ana Souza"),
                ("cep", "01310-100"),
                ("street", "Avenida Paulista"),
                ("address_number", "1000"),
                ("address_details", ""),
                ("neighborhood", "Bela Vista"),
                ("city", "São Paulo"),
                ("state", "SP"),
                ("phone", "(67) 99999-1234"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));

    let addresses = ctx.platform.addresses(CUSTOMER_EMAIL);
    assert_eq!(addresses.len(), 2);
    let second = addresses[1].id.clone();
    assert_eq!(ctx.cart().selected_address.map(|a| a.id), first);

    let response = ctx
        .post(&format!("/frete/enderecos/{second}/selecionar"), &[])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));
    assert_eq!(
        ctx.cart().selected_address.map(|a| a.id),
        Some(second.clone())
    );

    let quoted = ctx.platform.payloads("shippingSimulation").len();
    let html = ctx.page("/frete").await;
    assert!(html.contains("Avenida Paulista"));
    let simulations = ctx.platform.payloads("shippingSimulation");
    assert!(simulations.len() > quoted);
    assert_eq!(
        simulations.last().map(|p| p["useSelectedAddress"].clone()),
        Some(serde_json::Value::Bool(true))
    );
}

#[tokio::test]
async fn test_shipping_page_without_giftable_products() {
    let platform = FakePlatform::new()
        .with_product(MUG)
        .with_starter_line(MUG.variant_id, 1)
        .with_customer(Customer::new(CUSTOMER_EMAIL, CUSTOMER_PASSWORD))
        .with_cep(CepAddress {
            cep: CEP.to_string(),
            state: "MS".to_string(),
            city: "Campo Grande".to_string(),
            neighborhood: Some("Centro".to_string()),
            street: Some("Rua 14 de Julho".to_string()),
        });
    let ctx = logged_in_with_address_on(platform).await;

    let html = ctx.page("/frete").await;
    assert!(html.contains("Caneca Abacate"));
    assert!(!html.contains(&format!("gift_{}", MUG.variant_id)));
    assert!(!ctx.platform.payloads("productCustomizations").is_empty());
}

#[tokio::test]
async fn test_payment_requires_shipping() {
    let ctx = logged_in_with_address().await;

    let response = ctx.get("/pagamento").await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));
}

#[tokio::test]
async fn test_gift_wrap_offered_lines() {
    let ctx = logged_in_with_address().await;

    let html = ctx.page("/frete").await;
    assert!(html.contains(&format!("gift_{}", SHIRT.variant_id)));
    assert!(!html.contains(&format!("gift_{}", MUG.variant_id)));

    let gift = format!("gift_{}", SHIRT.variant_id);
    let message = format!("message_{}", SHIRT.variant_id);
    let from = format!("from_{}", SHIRT.variant_id);
    let to = format!("to_{}", SHIRT.variant_id);
    let text = format!("text_{}", SHIRT.variant_id);
    let response = ctx
        .post(
            "/frete/presente",
            &[
                (gift.as_str(), "on"),
                (message.as_str(), "sim"),
                (from.as_str(), "Ana"),
                (to.as_str(), "Bia"),
                (text.as_str(), "Parabéns"),
            ],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/frete"));

    let cart = ctx.cart();
    let wrapped = cart
        .products
        .iter()
        .find(|p| p.is_gift())
        .expect("wrapped line");
    assert_eq!(wrapped.quantity, 2);
    assert!(wrapped.gift_message().is_some_and(|m| m.contains("Parabéns")));
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_coupon_toggles_on_shipping_step() {
    let ctx = logged_in_with_address().await;

    ctx.post("/frete/cupom", &[("coupon", COUPON)]).await;
    assert_eq!(ctx.cart().coupon.as_deref(), Some(COUPON));

    // A second submission removes the applied coupon.
    ctx.post("/frete/cupom", &[("coupon", "")]).await;
    assert!(!ctx.cart().has_coupon());
}

#[tokio::test]
async fn test_pix_checkout_reaches_confirmation() {
    let ctx = ready_for_payment().await;

    let html = ctx.page("/pagamento").await;
    assert!(html.contains("Pix"));
    assert!(html.contains("Cartão de Crédito"));

    let response = ctx
        .post("/pagamento/metodo", &[("payment_method_id", PIX_METHOD_ID)])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/pagamento"));

    let checkout_id = ctx.cart().checkout_id;
    let response = ctx.post("/pagamento/finalizar", &[]).await;
    let target = location(&response).expect("redirect");
    assert_eq!(target, format!("/confirmacao?id={checkout_id}"));

    let payloads = ctx.platform.payloads("completeCheckout");
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].get("paymentData").is_none());
    assert!(
        payloads[0]["comments"]
            .as_str()
            .is_some_and(|c| c.starts_with("Comentário Pix "))
    );
    assert_eq!(
        ctx.platform.cart_owner(&checkout_id).as_deref(),
        Some(CUSTOMER_EMAIL)
    );

    let html = ctx.page(&target).await;
    assert!(html.contains("OBRIGADO POR COMPRAR NO ABACATE"));
    assert!(html.contains("15/01/2026"));
    assert!(html.contains(CUSTOMER_EMAIL));
    assert!(html.contains("Rua 14 de Julho"));
    assert!(html.contains("Camiseta Abacate"));
    assert!(html.contains("img.abacate.test/CAM-01.jpg"));

    // The placed checkout is forgotten; the next visit starts a new cart.
    ctx.page("/carrinho").await;
    assert_eq!(ctx.platform.carts().len(), 2);
}

#[tokio::test]
async fn test_boleto_checkout_sends_cpf_and_phone() {
    let ctx = ready_for_payment().await;
    ctx.post("/pagamento/metodo", &[("payment_method_id", BOLETO_METHOD_ID)])
        .await;

    let response = ctx.post("/pagamento/finalizar", &[]).await;
    let target = location(&response).expect("redirect");
    assert!(target.starts_with("/confirmacao?id="));

    let payloads = ctx.platform.payloads("completeCheckout");
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        payloads[0]["paymentData"],
        serde_json::json!({ "cpf": "52998224725", "telefone": "67999991234" })
    );
    assert!(
        payloads[0]["comments"]
            .as_str()
            .is_some_and(|c| c.starts_with("Comentário Boleto "))
    );
}

#[tokio::test]
async fn test_placed_order_survives_failed_follow_up() {
    let ctx = ready_for_payment_on(standard_platform().with_broken("associateCheckout")).await;
    ctx.post("/pagamento/metodo", &[("payment_method_id", PIX_METHOD_ID)])
        .await;

    let checkout_id = ctx.cart().checkout_id;
    let response = ctx.post("/pagamento/finalizar", &[]).await;
    assert_eq!(
        location(&response),
        Some(format!("/confirmacao?id={checkout_id}"))
    );
    assert_eq!(ctx.platform.payloads("completeCheckout").len(), 1);

    // The session dropped the placed checkout even though the follow-up failed.
    ctx.page("/carrinho").await;
    assert_eq!(ctx.platform.carts().len(), 2);
}

#[tokio::test]
async fn test_coupon_and_quantity_on_payment_step() {
    let ctx = ready_for_payment().await;

    let response = ctx.post("/pagamento/cupom", &[("coupon", COUPON)]).await;
    assert_eq!(location(&response).as_deref(), Some("/pagamento"));
    assert_eq!(ctx.cart().coupon.as_deref(), Some(COUPON));

    let response = ctx.post("/pagamento/cupom", &[("coupon", "")]).await;
    assert_eq!(location(&response).as_deref(), Some("/pagamento"));
    assert!(!ctx.cart().has_coupon());

    let response = ctx
        .post(
            &format!("/pagamento/itens/{}", SHIRT.variant_id),
            &[("quantity", "3")],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/pagamento"));
    assert_eq!(ctx.cart().item_count(), 4);
}

#[tokio::test]
async fn test_card_checkout_with_installments() {
    let ctx = ready_for_payment().await;

    ctx.post("/pagamento/metodo", &[("payment_method_id", CARD_METHOD_ID)])
        .await;
    let html = ctx.page("/pagamento").await;
    assert!(html.contains("installment_number"));
    assert!(html.contains("3 parcelas"));

    let response = ctx
        .post("/pagamento/parcelas", &[("installment_number", "3")])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/pagamento"));
    let selected = ctx
        .cart()
        .selected_payment_method
        .and_then(|m| m.selected_installment)
        .map(|i| i.number);
    assert_eq!(selected, Some(3));

    let response = ctx
        .post(
            "/pagamento/finalizar",
            &[
                ("card_number", "4111 1111 1111 1111"),
                ("card_name", "ANA SOUZA"),
                ("card_month", "12"),
                ("card_year", "2030"),
                ("card_cvc", "123"),
            ],
        )
        .await;
    let target = location(&response).expect("redirect");
    assert!(target.starts_with("/confirmacao?id="));

    let payloads = ctx.platform.payloads("completeCheckout");
    assert_eq!(payloads.len(), 1);
    let data = &payloads[0]["paymentData"];
    assert_eq!(data["number"], "4111111111111111");
    assert_eq!(data["month"], "12");
    assert_eq!(data["year"], "2030");
}

#[tokio::test]
async fn test_declined_card_returns_to_payment() {
    let ctx = ready_for_payment().await;
    ctx.post("/pagamento/metodo", &[("payment_method_id", CARD_METHOD_ID)])
        .await;

    let response = ctx
        .post(
            "/pagamento/finalizar",
            &[
                ("card_number", DECLINED_CARD),
                ("card_name", "ANA SOUZA"),
                ("card_month", "12"),
                ("card_year", "30"),
                ("card_cvc", "123"),
            ],
        )
        .await;
    let target = location(&response).expect("redirect");
    assert_eq!(target, "/pagamento?error=checkout");

    let html = ctx.page(&target).await;
    assert!(html.contains("Não foi possível finalizar a compra."));
    assert!(ctx.cart().orders.is_empty());
}

#[tokio::test]
async fn test_incomplete_card_is_rejected_locally() {
    let ctx = ready_for_payment().await;
    ctx.post("/pagamento/metodo", &[("payment_method_id", CARD_METHOD_ID)])
        .await;

    let response = ctx
        .post(
            "/pagamento/finalizar",
            &[("card_number", "4111111111111111"), ("card_month", "13")],
        )
        .await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/pagamento?error=card")
    );
    assert!(ctx.platform.payloads("completeCheckout").is_empty());
}

#[tokio::test]
async fn test_finalize_without_method() {
    let ctx = ready_for_payment().await;

    let response = ctx.post("/pagamento/finalizar", &[]).await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/pagamento?error=payment-method")
    );

    let response = ctx
        .post("/pagamento/parcelas", &[("installment_number", "2")])
        .await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/pagamento?error=payment-method")
    );
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let ctx = TestContext::start(standard_platform()).await;

    let response = ctx.get("/confirmacao?id=chk-missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

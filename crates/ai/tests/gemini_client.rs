use boracrm_ai::{AiError, AssistantService, GeminiClient, Sentiment};
use boracrm_core::contacts::Contact;
use boracrm_core::deals::Deal;
use boracrm_core::Entity;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/models/gemini-3-flash-preview:generateContent";

fn completion(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(Some("test-key".to_string()))
        .unwrap()
        .with_base_url(&server.uri())
}

#[tokio::test]
async fn draft_email_requests_json_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"subject":"Proposta atualizada","body":"Olá Alice, segue a proposta."}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let draft = client_for(&server)
        .draft_email(&Contact::seed()[0], Some(&Deal::seed()[0]), "Enviar proposta")
        .await
        .unwrap();
    assert_eq!(draft.subject, "Proposta atualizada");
}

#[tokio::test]
async fn analysis_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"sentiment":"Positive","riskScore":20,"summary":"Pronto para assinar.","nextSteps":["Enviar contrato","Agendar kickoff","Confirmar jurídico"]}"#,
        )))
        .mount(&server)
        .await;

    let analysis = client_for(&server)
        .analyze_deal(&Deal::seed()[2], &Contact::seed()[2], "Aguardando jurídico")
        .await
        .unwrap();
    assert_eq!(analysis.sentiment, Sentiment::Positive);
    assert_eq!(analysis.risk_score, 20);
    assert_eq!(analysis.next_steps.len(), 3);
}

#[tokio::test]
async fn non_json_text_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Claro! Aqui está o e-mail:")),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .draft_email(&Contact::seed()[0], None, "Olá")
        .await
        .unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn missing_text_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .analyze_deal(&Deal::seed()[0], &Contact::seed()[0], "")
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::MalformedResponse(_)));
}

#[tokio::test]
async fn risk_out_of_range_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"sentiment":"Negative","riskScore":140,"summary":"s","nextSteps":[]}"#,
        )))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .analyze_deal(&Deal::seed()[1], &Contact::seed()[1], "")
        .await
        .unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn api_errors_keep_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .draft_email(&Contact::seed()[0], None, "Olá")
        .await
        .unwrap_err();
    match err {
        AiError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("API key not valid."));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn demo_mode_answers_without_network() {
    let service = AssistantService::new(None).unwrap();
    let contacts = Contact::seed();
    let contact = &contacts[2];
    let deals = Deal::seed();
    let deal = &deals[2];

    let draft = service
        .draft_email(contact, Some(deal), "Confirmar assinatura")
        .await
        .unwrap();
    assert!(draft.body.contains("Confirmar assinatura"));

    let analysis = service.analyze_deal(deal, contact, "").await.unwrap();
    assert!(analysis.risk_score <= 100);
    assert!(analysis.summary.contains("Security Audit"));
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use crate::config::provider::ProviderConfig;
use crate::error::{Error, Result};
use crate::provider::{DepositEvent, PaymentProvider};
use crate::settlement::ledger::CounterParty;
use crate::types::ids::{DepositId, VirtualNuban};

const PAYMENTS_PATH: &str = "/api/v1/payments";

/// REST client for the provider's "list payments for virtual account" endpoint.
pub struct HttpPaymentProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpPaymentProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(HttpPaymentProvider { client, config })
    }

    fn payments_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), PAYMENTS_PATH)
    }

    fn unavailable(account: &VirtualNuban, err: reqwest::Error) -> Error {
        let reason = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Error::ProviderUnavailable {
            account: account.clone(),
            reason,
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn list_deposits(&self, account: &VirtualNuban) -> Result<Vec<DepositEvent>> {
        let response = self.client
            .get(self.payments_url())
            .header(self.config.api_key_header.as_str(), self.config.api_key.as_str())
            .query(&[("virtualNuban", account.as_str())])
            .send()
            .await
            .map_err(|e| Self::unavailable(account, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ProviderUnavailable {
                account: account.clone(),
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.text()
            .await
            .map_err(|e| Self::unavailable(account, e))?;

        let payload: PaymentsResponse = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedProviderResponse {
                account: account.clone(),
                reason: e.to_string(),
            })?;

        let events: Vec<DepositEvent> = payload.data
            .into_iter()
            .filter_map(|payment| payment.into_event(account))
            .collect();

        tracing::debug!(account = %account, count = events.len(), "Fetched deposits from provider");
        Ok(events)
    }
}

#[derive(Deserialize)]
struct PaymentsResponse {
    #[serde(default)]
    data: Vec<PaymentResource>,
}

#[derive(Deserialize)]
struct PaymentResource {
    id: String,
    attributes: PaymentAttributes,
    #[serde(default)]
    relationships: Option<PaymentRelationships>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentAttributes {
    amount: Decimal,
    currency: Option<String>,
    narration: Option<String>,
    payment_reference: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    counter_party: Option<CounterPartyResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterPartyResource {
    account_name: Option<String>,
    account_number: Option<String>,
    bank: Option<BankResource>,
}

#[derive(Deserialize)]
struct BankResource {
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRelationships {
    virtual_nuban: Option<RelationshipLink>,
}

#[derive(Deserialize)]
struct RelationshipLink {
    data: Option<ResourceIdentifier>,
}

#[derive(Deserialize)]
struct ResourceIdentifier {
    id: String,
}

impl PaymentResource {
    fn linked_account(&self) -> Option<&str> {
        self.relationships.as_ref()?
            .virtual_nuban.as_ref()?
            .data.as_ref()
            .map(|d| d.id.as_str())
    }

    /// `None` when the payment is linked to a different virtual account.
    fn into_event(self, account: &VirtualNuban) -> Option<DepositEvent> {
        if let Some(linked) = self.linked_account() {
            if linked != account.as_str() {
                tracing::warn!(
                    account = %account,
                    deposit_id = %self.id,
                    linked_account = linked,
                    "Dropping payment linked to another virtual account"
                );
                return None;
            }
        }

        let attributes = self.attributes;
        let counter_party = attributes.counter_party.map(|cp| CounterParty {
            bank_name: cp.bank.and_then(|b| b.name),
            account_name: cp.account_name,
            account_number: cp.account_number,
        });

        Some(DepositEvent {
            id: DepositId::new(self.id),
            account: account.clone(),
            amount: attributes.amount,
            currency: attributes.currency,
            counter_party: counter_party.unwrap_or_default(),
            narration: attributes.narration,
            payment_reference: attributes.payment_reference,
            created_at: attributes.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, timeout_ms: u64) -> HttpPaymentProvider {
        HttpPaymentProvider::new(ProviderConfig {
            base_url: server.uri(),
            api_key: "secret".to_string(),
            api_key_header: "x-api-key".to_string(),
            request_timeout_ms: timeout_ms,
        })
        .unwrap()
    }

    fn payment(id: &str, amount: i64, linked: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": "Payment",
            "attributes": {
                "amount": amount,
                "currency": "NGN",
                "narration": "Wallet top-up",
                "paymentReference": format!("ref-{}", id),
                "createdAt": "2024-03-01T10:15:00Z",
                "counterParty": {
                    "accountName": "ADA OBI",
                    "accountNumber": "0123456789",
                    "bank": { "name": "First Bank" }
                }
            },
            "relationships": {
                "virtualNuban": { "data": { "id": linked, "type": "VirtualNuban" } }
            }
        })
    }

    #[tokio::test]
    async fn test_lists_deposits_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/payments"))
            .and(query_param("virtualNuban", "8011111111"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [payment("pay-1", 10000, "8011111111"), payment("pay-2", 250, "8011111111")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let events = provider(&server, 1_000)
            .list_deposits(&VirtualNuban::from("8011111111"))
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        let first = &events[0];
        assert_eq!(first.id, DepositId::from("pay-1"));
        assert_eq!(first.amount, dec!(10000));
        assert_eq!(first.counter_party.bank_name.as_deref(), Some("First Bank"));
        assert_eq!(first.counter_party.account_name.as_deref(), Some("ADA OBI"));
        assert_eq!(first.payment_reference.as_deref(), Some("ref-pay-1"));
        assert!(first.created_at.is_some());
    }

    #[tokio::test]
    async fn test_drops_payments_linked_elsewhere() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [payment("pay-1", 100, "8011111111"), payment("pay-x", 100, "8022222222")]
            })))
            .mount(&server)
            .await;

        let events = provider(&server, 1_000)
            .list_deposits(&VirtualNuban::from("8011111111"))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, DepositId::from("pay-1"));
    }

    #[tokio::test]
    async fn test_accepts_minimal_payment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "pay-9", "attributes": { "amount": "1500.50" } }]
            })))
            .mount(&server)
            .await;

        let events = provider(&server, 1_000)
            .list_deposits(&VirtualNuban::from("8011111111"))
            .await
            .unwrap();

        assert_eq!(events[0].amount, dec!(1500.50));
        assert_eq!(events[0].counter_party.bank_name, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = provider(&server, 1_000)
            .list_deposits(&VirtualNuban::from("8011111111"))
            .await;
        assert!(matches!(result, Err(Error::ProviderUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_bad_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"data\": [{\"id\": 1}]"))
            .mount(&server)
            .await;

        let result = provider(&server, 1_000)
            .list_deposits(&VirtualNuban::from("8011111111"))
            .await;
        assert!(matches!(result, Err(Error::MalformedProviderResponse { .. })));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let result = provider(&server, 50)
            .list_deposits(&VirtualNuban::from("8011111111"))
            .await;
        assert!(matches!(result, Err(Error::ProviderUnavailable { .. })));
    }
}

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Contact, ContactSink, SinkError};

const API_BASE: &str = "https://api.brevo.com/v3";

pub struct BrevoSink {
    client: reqwest::Client,
    api_key: Option<String>,
    list_id: i64,
}

impl BrevoSink {
    pub fn new(api_key: Option<String>, list_id: i64) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key,
            list_id,
        })
    }

    fn key(&self) -> Result<&str, SinkError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SinkError::from("Brevo API key not configured"))
    }
}

/// Body for `POST /v3/contacts`. Brevo contacts need a phone; without one
/// there is nothing to send.
pub fn contact_payload(contact: &Contact, list_id: i64) -> Option<Value> {
    let phone = contact.phone.as_deref()?;
    let (first, last) = contact.split_name();
    Some(json!({
        "email": contact.email,
        "attributes": {
            "NOME": contact.name,
            "FIRSTNAME": first,
            "LASTNAME": last,
            "SMS": phone,
        },
        "listIds": [list_id],
        "updateEnabled": true,
    }))
}

#[async_trait]
impl ContactSink for BrevoSink {
    fn id(&self) -> &str {
        "brevo"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn sync_contact(&self, contact: &Contact) -> Result<(), SinkError> {
        let key = self.key()?;
        let Some(body) = contact_payload(contact, self.list_id) else {
            tracing::debug!("Skipping Brevo sync: contact has no phone");
            return Ok(());
        };

        let resp = self
            .client
            .post(format!("{API_BASE}/contacts"))
            .header("api-key", key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::from(format!("Brevo request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(SinkError::from(format!("Brevo returned {status}: {text}")));
        }

        Ok(())
    }

    async fn check(&self) -> Result<(), SinkError> {
        let key = self.key()?;
        let resp = self
            .client
            .get(format!("{API_BASE}/account"))
            .header("api-key", key)
            .send()
            .await
            .map_err(|e| SinkError::from(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            Err(SinkError::from(format!("Status: {status} - {text}")))
        }
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::contact::normalize_phone;
use super::{Contact, ContactSink, SinkError};

const API_BASE: &str = "https://api.manychat.com/fb";

pub struct ManyChatSink {
    client: reqwest::Client,
    api_token: Option<String>,
    tag: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct Subscriber {
    id: Value,
}

#[derive(Deserialize)]
struct Tag {
    id: i64,
    name: String,
}

/// Body for `createSubscriber`. Unusable phones are left out.
pub fn subscriber_payload(contact: &Contact) -> Value {
    let (first, last) = contact.split_name();
    let mut payload = json!({
        "first_name": first,
        "last_name": last,
        "email": contact.email,
        "has_opt_in_sms": true,
        "has_opt_in_email": true,
    });
    if let Some(phone) = contact.phone.as_deref().and_then(normalize_phone) {
        payload["phone"] = Value::String(phone);
    }
    payload
}

impl ManyChatSink {
    pub fn new(api_token: Option<String>, tag: String) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_token,
            tag,
        })
    }

    fn token(&self) -> Result<&str, SinkError> {
        self.api_token
            .as_deref()
            .ok_or_else(|| SinkError::from("ManyChat API token not configured"))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, SinkError> {
        let resp = self
            .client
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(self.token()?)
            .header("accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SinkError::from(format!("ManyChat request failed: {e}")))?;
        ensure_success(resp).await
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SinkError> {
        let resp = self
            .client
            .get(format!("{API_BASE}{path}"))
            .bearer_auth(self.token()?)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| SinkError::from(format!("ManyChat request failed: {e}")))?;
        ensure_success(resp).await
    }

    /// Look the tag up by name, creating it when the page does not have it.
    async fn resolve_tag(&self) -> Result<i64, SinkError> {
        let tags: Envelope<Vec<Tag>> = self
            .get("/page/getTags")
            .await?
            .json()
            .await
            .map_err(|e| SinkError::from(format!("Bad getTags response: {e}")))?;

        if let Some(tag) = tags.data.unwrap_or_default().into_iter().find(|t| t.name == self.tag) {
            return Ok(tag.id);
        }

        tracing::info!(tag = %self.tag, "Creating ManyChat tag");
        let created: Envelope<Tag> = self
            .post("/page/createTag", &json!({ "name": self.tag }))
            .await?
            .json()
            .await
            .map_err(|e| SinkError::from(format!("Bad createTag response: {e}")))?;

        created
            .data
            .map(|t| t.id)
            .ok_or_else(|| SinkError::from(format!("Could not resolve tag '{}'", self.tag)))
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, SinkError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    Err(SinkError::from(format!("ManyChat returned {status}: {text}")))
}

#[async_trait]
impl ContactSink for ManyChatSink {
    fn id(&self) -> &str {
        "manychat"
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }

    async fn sync_contact(&self, contact: &Contact) -> Result<(), SinkError> {
        let created: Envelope<Subscriber> = self
            .post("/subscriber/createSubscriber", &subscriber_payload(contact))
            .await?
            .json()
            .await
            .map_err(|e| SinkError::from(format!("Bad createSubscriber response: {e}")))?;

        let subscriber_id = match (created.status.as_deref(), created.data) {
            (Some("success"), Some(subscriber)) => subscriber.id,
            _ => return Err(SinkError::from("ManyChat did not return a subscriber")),
        };

        let tag_id = self.resolve_tag().await?;
        self.post(
            "/subscriber/addTag",
            &json!({ "subscriber_id": subscriber_id, "tag_id": tag_id }),
        )
        .await?;

        Ok(())
    }

    async fn check(&self) -> Result<(), SinkError> {
        self.get("/page/getInfo").await.map(|_| ())
    }
}

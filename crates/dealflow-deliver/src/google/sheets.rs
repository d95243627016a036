use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{TokenSource, check_status, endpoint};
use crate::error::DeliverError;
use crate::transport::SheetTransport;

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    token: TokenSource,
    spreadsheet_id: String,
    range: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Updates,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Updates {
    #[serde(default)]
    updated_range: Option<String>,
}

impl SheetsClient {
    pub fn new(
        base_url: &str,
        token_path: impl Into<PathBuf>,
        spreadsheet_id: String,
        range: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: TokenSource::new(token_path),
            spreadsheet_id,
            range,
        }
    }
}

#[async_trait]
impl SheetTransport for SheetsClient {
    async fn append(&self, row: &[String]) -> Result<(), DeliverError> {
        let token = self.token.access_token()?;
        let target = format!("{}:append", self.range);
        let url = endpoint(
            &self.base_url,
            &["spreadsheets", self.spreadsheet_id.as_str(), "values", target.as_str()],
        )?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        let body: AppendResponse = check_status(resp).await?.json().await?;
        info!(
            spreadsheet = %self.spreadsheet_id,
            range = body.updates.updated_range.as_deref().unwrap_or(&self.range),
            cells = row.len(),
            "row appended"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_file() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"access_token": "ya29.sheet"}"#).unwrap();
        f
    }

    #[tokio::test]
    async fn appends_row_with_user_entered_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-1/values/Sheet1!A1:append"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(header("authorization", "Bearer ya29.sheet"))
            .and(body_json(serde_json::json!({"values": [["AcmeAI", "71", "Learn More"]]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "spreadsheetId": "sheet-1",
                "updates": {"updatedRange": "Sheet1!A7:C7", "updatedRows": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = token_file();
        let client = SheetsClient::new(
            &server.uri(),
            token.path(),
            "sheet-1".into(),
            "Sheet1!A1".into(),
        );
        let row = vec!["AcmeAI".to_string(), "71".to_string(), "Learn More".to_string()];
        client.append(&row).await.unwrap();
    }

    #[tokio::test]
    async fn api_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let token = token_file();
        let client = SheetsClient::new(&server.uri(), token.path(), "x".into(), "Sheet1!A1".into());
        let err = client.append(&["a".to_string()]).await.unwrap_err();
        match err {
            DeliverError::Server { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

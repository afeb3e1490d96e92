use anyhow::Result;
use chrono::NaiveDate;
use httpmock::prelude::*;
use huat_leads::{build_service, AppConfig, LeadSubmission, SubmitOutcome};
use tempfile::TempDir;

const TEST_KEY: &str = include_str!("fixtures/service_account_key.pem");
const VALUES_PATH: &str = "/v4/spreadsheets/sheet-123/values/Ahuathing!A:R";

fn config_for(server: &MockServer, dead_letters: &TempDir) -> Result<AppConfig> {
    let content = format!(
        r#"
[sheets]
spreadsheet_id = "sheet-123"
client_email = "leads@huat-campaign.iam.gserviceaccount.com"
token_uri = "{}"
api_base_url = "{}"

[retry]
retry_attempts = 1

[dead_letter]
directory = "{}"
"#,
        server.url("/token"),
        server.base_url(),
        dead_letters.path().to_string_lossy().replace('\\', "/"),
    );
    let mut config = AppConfig::from_toml_str(&content)?;
    config.sheets.private_key = Some(TEST_KEY.to_string());
    Ok(config)
}

fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer");
        then.status(200).json_body(serde_json::json!({
            "access_token": "ya29.integration",
            "expires_in": 3599,
            "token_type": "Bearer"
        }));
    })
}

fn mock_sheet(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path(VALUES_PATH)
            .header("authorization", "Bearer ya29.integration");
        then.status(200).json_body(serde_json::json!({
            "range": "Ahuathing!A1:R3",
            "majorDimension": "ROWS",
            "values": [
                ["timestamp", "action", "entry_point", "company_name", "email", "phone_number"],
                ["2026-02-03T08:00:00.000Z", "entry", "landing", "Kedai Kopi", "owner@kedai.my", "+60111"],
                ["2026-02-04T09:30:00.000Z", "entry", "landing", "AJobThing", "HR@AJobThing.com", "+60123"]
            ]
        }));
    })
}

fn lead(email: &str, phone: &str, action: &str) -> LeadSubmission {
    LeadSubmission {
        timestamp: "2026-02-04T10:00:00.000Z".to_string(),
        action: action.to_string(),
        company_name: "AJobThing".to_string(),
        email: email.to_string(),
        phone_number: phone.to_string(),
        ..Default::default()
    }
}

/// 已存在的 email 更新原本那列，新的 email 則新增一列；token 只交換一次
#[tokio::test]
async fn test_upsert_updates_existing_row_and_appends_new_one() -> Result<()> {
    let server = MockServer::start();
    let dead_letters = TempDir::new()?;
    let token = mock_token(&server);
    let read = mock_sheet(&server);

    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A3:R3")
            .query_param("valueInputOption", "USER_ENTERED")
            .header("authorization", "Bearer ya29.integration")
            .body_contains("survey_complete");
        then.status(200).json_body(serde_json::json!({"updatedRows": 1}));
    });
    let append = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}:append", VALUES_PATH))
            .query_param("insertDataOption", "INSERT_ROWS")
            .body_contains("new@ajobthing.com");
        then.status(200).json_body(serde_json::json!({"updates": {"updatedRows": 1}}));
    });

    let service = build_service(&config_for(&server, &dead_letters)?)?;

    let outcome = service
        .submit(lead("hr@ajobthing.com", "+60123", "survey_complete"))
        .await?;
    assert_eq!(outcome, SubmitOutcome::Updated { row: 3 });

    let outcome = service.submit(lead("new@ajobthing.com", "+60999", "entry")).await?;
    assert_eq!(outcome, SubmitOutcome::Appended);

    token.assert_hits(1);
    read.assert_hits(2);
    update.assert();
    append.assert();
    Ok(())
}

#[tokio::test]
async fn test_each_read_side_check_reads_sheet_once() -> Result<()> {
    let server = MockServer::start();
    let dead_letters = TempDir::new()?;
    mock_token(&server);
    let read = mock_sheet(&server);

    let service = build_service(&config_for(&server, &dead_letters)?)?;

    assert!(service.user_exists("hr@ajobthing.com", "+60123").await?);
    assert!(!service.user_exists("hr@ajobthing.com", "+60000").await?);

    let played = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();
    assert!(!service.can_play("hr@ajobthing.com", played).await?);
    assert!(service.can_play("owner@kedai.my", played).await?);

    read.assert_hits(4);
    Ok(())
}

/// 空白的表：先在第 1 列寫入標題列，再新增資料
#[tokio::test]
async fn test_first_append_to_empty_sheet_writes_header() -> Result<()> {
    let server = MockServer::start();
    let dead_letters = TempDir::new()?;
    mock_token(&server);
    let read = server.mock(|when, then| {
        when.method(GET).path(VALUES_PATH);
        then.status(200).json_body(serde_json::json!({
            "range": "Ahuathing!A1:R1",
            "majorDimension": "ROWS"
        }));
    });
    let header = server.mock(|when, then| {
        when.method(PUT)
            .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A1:R1")
            .body_contains("\"timestamp\",\"action\",\"entry_point\"");
        then.status(200).json_body(serde_json::json!({"updatedRows": 1}));
    });
    let append = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{}:append", VALUES_PATH))
            .body_contains("first@ajobthing.com");
        then.status(200).json_body(serde_json::json!({"updates": {"updatedRows": 1}}));
    });

    let service = build_service(&config_for(&server, &dead_letters)?)?;
    let outcome = service.submit(lead("first@ajobthing.com", "+60123", "entry")).await?;

    assert_eq!(outcome, SubmitOutcome::Appended);
    read.assert();
    header.assert();
    append.assert();
    Ok(())
}

#[tokio::test]
async fn test_permission_error_is_reported_and_dead_lettered() -> Result<()> {
    let server = MockServer::start();
    let dead_letters = TempDir::new()?;
    mock_token(&server);
    server.mock(|when, then| {
        when.method(GET).path(VALUES_PATH);
        then.status(403).body("The caller does not have permission");
    });

    let service = build_service(&config_for(&server, &dead_letters)?)?;
    let err = service
        .submit(lead("hr@ajobthing.com", "+60123", "entry"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"));

    let log = std::fs::read_to_string(dead_letters.path().join("dead_letters.jsonl"))?;
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("hr@ajobthing.com"));
    Ok(())
}

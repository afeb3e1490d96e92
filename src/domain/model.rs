use crate::utils::error::{LeadError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 前端送來的 null 一律視為空字串
fn empty_if_null<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 一筆寫入試算表的名單／互動紀錄，欄位與試算表欄位一一對應
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadSubmission {
    #[serde(deserialize_with = "empty_if_null")]
    pub timestamp: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub action: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub entry_point: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub company_name: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub email: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub phone_number: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub survey_q1: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub survey_q2: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub survey_q3: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub gift: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub referral_name: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub referral_company: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub referral_email: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub referral_phone: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub referral_position: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub utm_source: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub utm_medium: String,
    #[serde(deserialize_with = "empty_if_null")]
    pub utm_campaign: String,
}

impl LeadSubmission {
    /// 缺少時間戳記時補上 ISO-8601（毫秒、Z 結尾）
    pub fn fill_timestamp(&mut self, now: DateTime<Utc>) {
        if self.timestamp.trim().is_empty() {
            self.timestamp = format_timestamp(now);
        }
    }

    pub fn validate(&self) -> Result<()> {
        crate::utils::validation::require_field("email", &self.email)
    }

    pub fn apply_utm(&mut self, utm: &UtmParams) {
        self.utm_source = utm.utm_source.clone();
        self.utm_medium = utm.utm_medium.clone();
        self.utm_campaign = utm.utm_campaign.clone();
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub company_name: String,
    pub email: String,
    pub phone: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizData {
    pub resignation_frequency: String,
    pub hiring_plan: String,
    pub headcount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralData {
    pub name: String,
    pub position: String,
    pub company_name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmParams {
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
}

impl UtmParams {
    /// 從落地頁完整網址解析 UTM 參數
    pub fn from_url(landing_url: &str) -> Result<Self> {
        let url = url::Url::parse(landing_url).map_err(|e| {
            LeadError::validation(format!("invalid landing URL '{}': {}", landing_url, e))
        })?;
        Ok(Self::from_query(url.query().unwrap_or("")))
    }

    pub fn from_query(query: &str) -> Self {
        let mut utm = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        {
            match key.as_ref() {
                "utm_source" => utm.utm_source = value.into_owned(),
                "utm_medium" => utm.utm_medium = value.into_owned(),
                "utm_campaign" => utm.utm_campaign = value.into_owned(),
                _ => {}
            }
        }
        utm
    }
}

/// 寫入 `action` 欄的點擊追蹤事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Entry,
    SurveyComplete,
    Referral,
    MoreHuatClick,
    ShareLinkedin,
    ShareWhatsapp,
    TngoClick,
}

impl Interaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interaction::Entry => "entry",
            Interaction::SurveyComplete => "survey_complete",
            Interaction::Referral => "referral",
            Interaction::MoreHuatClick => "more_huat_click",
            Interaction::ShareLinkedin => "share_linkedin",
            Interaction::ShareWhatsapp => "share_whatsapp",
            Interaction::TngoClick => "tngo_click",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayLimitRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub updates: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckUserResponse {
    pub success: bool,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasPlayedResponse {
    pub has_played: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayLimitResponse {
    pub can_play: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preview: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResponse {
    pub ok: bool,
    pub updated: bool,
}

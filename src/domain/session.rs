use crate::domain::model::{
    format_timestamp, Interaction, LeadSubmission, QuizData, ReferralData, UserData, UtmParams,
};
use crate::utils::error::{LeadError, Result};
use crate::utils::phone::format_phone_number;
use crate::utils::validation::{require_field, validate_email};
use chrono::Utc;
use std::fmt;

/// 活動流程：ENTRY -> GAME -> PRE_CLAIM -> REVEAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Entry,
    Game,
    PreClaim,
    Reveal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Entry => "ENTRY",
            Stage::Game => "GAME",
            Stage::PreClaim => "PRE_CLAIM",
            Stage::Reveal => "REVEAL",
        };
        f.write_str(name)
    }
}

/// 單一瀏覽分頁內的活動狀態，不做持久化
#[derive(Debug, Clone, Default)]
pub struct CampaignSession {
    stage: Stage,
    entry_point: String,
    utm: UtmParams,
    user: Option<UserData>,
    phone_number: String,
    taps: u32,
    quiz: Option<QuizData>,
    gift: String,
}

impl CampaignSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn taps(&self) -> u32 {
        self.taps
    }

    pub fn user(&self) -> Option<&UserData> {
        self.user.as_ref()
    }

    fn expect_stage(&self, expected: Stage, action: &str) -> Result<()> {
        if self.stage != expected {
            return Err(LeadError::SessionError {
                stage: self.stage.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    /// 名單表單送出：ENTRY -> GAME；UTM 與入口跟著這次進站記錄
    pub fn start(
        &mut self,
        user: UserData,
        utm: UtmParams,
        entry_point: impl Into<String>,
    ) -> Result<LeadSubmission> {
        self.expect_stage(Stage::Entry, "submit the entry form")?;
        require_field("company_name", &user.company_name)?;
        validate_email("email", &user.email)?;
        require_field("phone", &user.phone)?;

        self.utm = utm;
        self.entry_point = entry_point.into();
        self.phone_number = format_phone_number(&user.country_code, &user.phone);
        self.user = Some(user);
        self.stage = Stage::Game;
        Ok(self.lead(Interaction::Entry))
    }

    /// 小遊戲結束：GAME -> PRE_CLAIM
    pub fn finish_game(&mut self, taps: u32) -> Result<()> {
        self.expect_stage(Stage::Game, "finish the game")?;
        self.taps = taps;
        self.stage = Stage::PreClaim;
        Ok(())
    }

    /// 問卷三題皆為必填：PRE_CLAIM -> REVEAL
    pub fn submit_quiz(&mut self, quiz: QuizData, gift: impl Into<String>) -> Result<LeadSubmission> {
        self.expect_stage(Stage::PreClaim, "submit the survey")?;
        require_field("resignation_frequency", &quiz.resignation_frequency)?;
        require_field("hiring_plan", &quiz.hiring_plan)?;
        require_field("headcount", &quiz.headcount)?;

        self.quiz = Some(quiz);
        self.gift = gift.into();
        self.stage = Stage::Reveal;
        Ok(self.lead(Interaction::SurveyComplete))
    }

    /// 揭曉頁的點擊追蹤
    pub fn record(&self, interaction: Interaction) -> Result<LeadSubmission> {
        self.expect_stage(Stage::Reveal, &format!("record {}", interaction))?;
        Ok(self.lead(interaction))
    }

    /// 推薦表單：姓名、公司、電話與 email 皆為必填，職位可留空
    pub fn refer(&self, referral: ReferralData) -> Result<LeadSubmission> {
        self.expect_stage(Stage::Reveal, "submit a referral")?;
        require_field("referral name", &referral.name)?;
        require_field("referral company", &referral.company_name)?;
        require_field("referral phone", &referral.phone)?;
        validate_email("referral email", &referral.email)?;

        let mut lead = self.lead(Interaction::Referral);
        lead.referral_name = referral.name;
        lead.referral_company = referral.company_name;
        lead.referral_email = referral.email;
        lead.referral_phone = referral.phone;
        lead.referral_position = referral.position;
        Ok(lead)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn lead(&self, interaction: Interaction) -> LeadSubmission {
        let mut lead = LeadSubmission {
            timestamp: format_timestamp(Utc::now()),
            action: interaction.as_str().to_string(),
            entry_point: self.entry_point.clone(),
            phone_number: self.phone_number.clone(),
            gift: self.gift.clone(),
            ..Default::default()
        };
        if let Some(user) = &self.user {
            lead.company_name = user.company_name.clone();
            lead.email = user.email.trim().to_string();
        }
        if let Some(quiz) = &self.quiz {
            lead.survey_q1 = quiz.resignation_frequency.clone();
            lead.survey_q2 = quiz.hiring_plan.clone();
            lead.survey_q3 = quiz.headcount.clone();
        }
        lead.apply_utm(&self.utm);
        lead
    }
}

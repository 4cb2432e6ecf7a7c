use serde::Serialize;

use crate::config::Config;
use crate::models::report::ReportRecord;

/// Best-effort mail relay client. A send failure is the caller's to log;
/// it never fails report generation.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
    frontend_url: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmailPayload {
    from: String,
    to: String,
    subject: String,
    text: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: config.mail_relay_url.clone(),
            from: config.mail_from.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub async fn send_report_email(&self, to: &str, report: &ReportRecord) -> anyhow::Result<()> {
        if self.relay_url.is_empty() {
            tracing::debug!("Mail relay not configured, skipping report email");
            return Ok(());
        }
        if to.is_empty() {
            anyhow::bail!("recipient email is empty");
        }

        let payload = render_email(&self.from, to, &self.frontend_url, report);

        let response = self
            .client
            .post(&self.relay_url)
            .timeout(std::time::Duration::from_secs(10))
            .json(&payload)
            .send()
            .await?;
        response.error_for_status()?;

        tracing::info!(
            user_id = %report.user_id,
            report_id = %report.id,
            "Report email handed to relay"
        );
        Ok(())
    }
}

fn render_email(from: &str, to: &str, frontend_url: &str, report: &ReportRecord) -> EmailPayload {
    let subject = format!(
        "Your weekly diary report ({} ~ {})",
        report.week_start, report.week_end
    );
    let text = format!(
        "Hi {},\n\n\
         Your report for {} ~ {} is ready.\n\
         Average score: {:.1} ({})\n\n\
         Read it here: {}/reports/{}\n",
        report.nickname,
        report.week_start,
        report.week_end,
        report.average_score,
        report.evaluation.label(),
        frontend_url,
        report.id,
    );

    EmailPayload {
        from: from.to_string(),
        to: to.to_string(),
        subject,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Evaluation;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn report() -> ReportRecord {
        ReportRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            nickname: "dawn".into(),
            week_start: "2026-01-05".parse().unwrap(),
            week_end: "2026-01-11".parse().unwrap(),
            average_score: 6.3,
            evaluation: Evaluation::Positive,
            daily_analysis: Json(vec![]),
            patterns: Json(vec![]),
            feedback: Json(vec![]),
            has_partial_data: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_email_cites_week_average_and_link() {
        let report = report();
        let payload = render_email(
            "reports@diarypulse.app",
            "dawn@example.com",
            "http://localhost:3000",
            &report,
        );

        assert!(payload.subject.contains("2026-01-05 ~ 2026-01-11"));
        assert!(payload.text.contains("Average score: 6.3"));
        assert!(payload.text.contains("positive"));
        assert!(payload
            .text
            .contains(&format!("http://localhost:3000/reports/{}", report.id)));
    }
}

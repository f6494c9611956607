//! AI comfort score and clothing advice
//!
//! Two prompts go to a conversational backend inside one session: the first
//! asks for a bare 1-10 comfort score, the second for clothing advice. The
//! session is released whichever way the exchange ends.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::error::WeatherError;
use crate::models::{ComfortAssessment, CurrentConditions};

pub mod gigachat;

pub use gigachat::{GigaChatBackend, GigaChatConfig};

/// A chat service that can open sessions
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn ChatSession>>;
}

/// An open conversation with the chat service
#[async_trait]
pub trait ChatSession: Send {
    /// Send one prompt, return the reply text
    async fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Release the session
    async fn close(self: Box<Self>);
}

/// Produces comfort assessments for current conditions
#[derive(Clone)]
pub struct ComfortAdvisor {
    backend: Arc<dyn ChatBackend>,
}

impl ComfortAdvisor {
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Ask the backend for a score and advice.
    ///
    /// Any failure, including an unparseable score, is `ComfortUnavailable`.
    #[instrument(skip_all)]
    pub async fn assess(&self, conditions: &CurrentConditions) -> Result<ComfortAssessment> {
        let summary = conditions_summary(conditions);
        debug!("Comfort summary: {}", summary);

        let mut session = self
            .backend
            .open_session()
            .await
            .map_err(|e| unavailable("could not open chat session", &e))?;

        let outcome = converse(session.as_mut(), &summary).await;
        session.close().await;

        if let Err(e) = &outcome {
            warn!("Comfort assessment failed: {e}");
        }
        outcome
    }
}

async fn converse(session: &mut dyn ChatSession, summary: &str) -> Result<ComfortAssessment> {
    let reply = session
        .ask(&score_prompt(summary))
        .await
        .map_err(|e| unavailable("score request failed", &e))?;
    let score = parse_comfort_score(&reply).ok_or_else(|| {
        WeatherError::comfort_unavailable(format!("reply is not a 1-10 score: {reply:?}"))
    })?;

    let advice = session
        .ask(&advice_prompt(summary))
        .await
        .map_err(|e| unavailable("advice request failed", &e))?;
    let advice = advice.trim().to_string();
    if advice.is_empty() {
        return Err(WeatherError::comfort_unavailable("empty advice reply"));
    }

    Ok(ComfortAssessment { score, advice })
}

fn unavailable(context: &str, err: &WeatherError) -> WeatherError {
    WeatherError::comfort_unavailable(format!("{context}: {err}"))
}

#[must_use]
pub fn score_prompt(summary: &str) -> String {
    format!(
        "Rate how comfortable this weather is on a scale from 1 to 10, where 1 is awful and 10 is excellent. \
         Reply with the number only. Weather: {summary}"
    )
}

#[must_use]
pub fn advice_prompt(summary: &str) -> String {
    format!("How should I dress for this weather: {summary}")
}

/// Text summary of the conditions, values rounded to whole units
#[must_use]
pub fn conditions_summary(conditions: &CurrentConditions) -> String {
    fn whole(value: Option<f64>, unit: &str) -> String {
        value.map_or_else(|| "unknown".to_string(), |v| format!("{}{unit}", v.round()))
    }

    format!(
        "Precipitation: {}, Temperature: {}, Feels like: {}, Relative humidity: {}, \
         Wind speed: {}, Wind direction: {}, Cloud cover: {}",
        whole(conditions.precipitation, " mm"),
        whole(conditions.temperature, "°C"),
        whole(conditions.feels_like, "°C"),
        whole(conditions.humidity, "%"),
        whole(conditions.wind_speed, " km/h"),
        conditions.wind_direction_label.as_deref().unwrap_or("unknown"),
        whole(conditions.cloud_cover, "%"),
    )
}

/// Extract the first integer in `reply` and accept it if it is within 1..=10
#[must_use]
pub fn parse_comfort_score(reply: &str) -> Option<u8> {
    let digits: String = reply
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    let score: u8 = digits.parse().ok()?;
    (1..=10).contains(&score).then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: replies are popped in order, `None` means failure
    struct ScriptedBackend {
        replies: Mutex<Vec<Option<String>>>,
        fail_open: bool,
        opened: AtomicUsize,
        closed: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Option<&str>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().map(|r| r.map(String::from)).collect()),
                fail_open: false,
                opened: AtomicUsize::new(0),
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct ScriptedSession {
        replies: Vec<Option<String>>,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn open_session(&self) -> Result<Box<dyn ChatSession>> {
            if self.fail_open {
                return Err(WeatherError::network("auth down", 1));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            let replies = std::mem::take(&mut *self.replies.lock().unwrap());
            Ok(Box::new(ScriptedSession {
                replies,
                closed: self.closed.clone(),
            }))
        }
    }

    #[async_trait]
    impl ChatSession for ScriptedSession {
        async fn ask(&mut self, _prompt: &str) -> Result<String> {
            self.replies
                .pop()
                .flatten()
                .ok_or_else(|| WeatherError::network("chat down", 1))
        }

        async fn close(self: Box<Self>) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample_conditions() -> CurrentConditions {
        CurrentConditions {
            temperature: Some(15.4),
            feels_like: Some(14.6),
            humidity: Some(60.0),
            precipitation: Some(0.0),
            wind_speed: Some(11.5),
            wind_direction_degrees: Some(10.0),
            wind_direction_label: Some("North".to_string()),
            cloud_cover: Some(20.0),
            weather_code: Some(0),
            weather_code_label: Some("Clear".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_assess_success() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("8"), Some("Wear a light jacket.")]));
        let advisor = ComfortAdvisor::new(backend.clone());

        let assessment = advisor.assess(&sample_conditions()).await.unwrap();

        assert_eq!(assessment.score, 8);
        assert_eq!(assessment.advice, "Wear a light jacket.");
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_released_when_second_call_fails() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("7"), None]));
        let advisor = ComfortAdvisor::new(backend.clone());

        let err = advisor.assess(&sample_conditions()).await.unwrap_err();

        assert!(matches!(err, WeatherError::ComfortUnavailable { .. }));
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unparseable_score_is_unavailable() {
        let backend = Arc::new(ScriptedBackend::new(vec![Some("pleasant"), Some("Shorts")]));
        let advisor = ComfortAdvisor::new(backend.clone());

        let err = advisor.assess(&sample_conditions()).await.unwrap_err();

        assert!(matches!(err, WeatherError::ComfortUnavailable { .. }));
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_unavailable() {
        let mut backend = ScriptedBackend::new(vec![]);
        backend.fail_open = true;
        let advisor = ComfortAdvisor::new(Arc::new(backend));

        let err = advisor.assess(&sample_conditions()).await.unwrap_err();
        assert!(matches!(err, WeatherError::ComfortUnavailable { .. }));
    }

    #[rstest]
    #[case("7", Some(7))]
    #[case(" 10\n", Some(10))]
    #[case("1", Some(1))]
    #[case("Score: 6/10", Some(6))]
    #[case("0", None)]
    #[case("11", None)]
    #[case("", None)]
    #[case("nine", None)]
    #[case("999999999999", None)]
    fn test_parse_comfort_score(#[case] reply: &str, #[case] expected: Option<u8>) {
        assert_eq!(parse_comfort_score(reply), expected);
    }

    #[test]
    fn test_summary_rounds_values() {
        let summary = conditions_summary(&sample_conditions());
        assert!(summary.contains("Temperature: 15°C"));
        assert!(summary.contains("Feels like: 15°C"));
        assert!(summary.contains("Wind direction: North"));
        assert!(summary.contains("Cloud cover: 20%"));
    }

    #[test]
    fn test_summary_marks_missing_values() {
        let summary = conditions_summary(&CurrentConditions::default());
        assert!(summary.contains("Temperature: unknown"));
        assert!(summary.contains("Wind direction: unknown"));
    }

    #[test]
    fn test_prompts_embed_summary() {
        assert!(score_prompt("S").ends_with("Weather: S"));
        assert!(score_prompt("S").contains("number only"));
        assert!(advice_prompt("S").ends_with(": S"));
    }
}

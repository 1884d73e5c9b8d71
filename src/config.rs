//! Application-level configuration loading, including the optional round
//! fixture used to seed the quiz sequence on first boot.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dao::models::QuizEntity;

/// Default location on disk where the server looks for the JSON round fixture.
const DEFAULT_CONFIG_PATH: &str = "config/round.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ROUND_CONFIG_PATH";

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    fixture: Option<Vec<FixtureQuiz>>,
}

#[derive(Debug, Clone)]
struct FixtureQuiz {
    question: String,
    options: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk. A missing file simply
    /// means no fixture: the round is then seeded over the admin API.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => match raw.try_into() {
                    Ok(app_config) => {
                        let app_config: Self = app_config;
                        info!(
                            path = %path.display(),
                            count = app_config
                                .fixture
                                .as_ref()
                                .map(|quizzes| quizzes.len())
                                .unwrap_or(0),
                            "loaded round fixture from config"
                        );
                        app_config
                    }
                    Err(reason) => {
                        warn!(
                            path = %path.display(),
                            %reason,
                            "invalid round fixture; ignoring it"
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; ignoring it"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; no round fixture"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; ignoring it"
                );
                Self::default()
            }
        }
    }

    /// Materialize the fixture as persistable quiz entities, freshly
    /// identified and positioned in file order.
    pub fn fixture_entities(&self) -> Option<Vec<QuizEntity>> {
        let fixture = self.fixture.as_ref()?;
        Some(
            fixture
                .iter()
                .enumerate()
                .map(|(position, quiz)| QuizEntity {
                    id: Uuid::new_v4(),
                    position: position as u32,
                    question: quiz.question.clone(),
                    options: quiz.options.clone(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    quizzes: Vec<RawQuiz>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single quiz entry inside the configuration file.
struct RawQuiz {
    question: String,
    options: Vec<String>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = String;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        if value.quizzes.is_empty() {
            return Err("fixture declares no quizzes".into());
        }

        let mut fixture = Vec::with_capacity(value.quizzes.len());
        for (position, quiz) in value.quizzes.into_iter().enumerate() {
            if quiz.question.trim().is_empty() {
                return Err(format!("fixture quiz {position} has a blank question"));
            }
            if quiz.options.len() < 2 {
                return Err(format!(
                    "fixture quiz {position} needs at least 2 options (got {})",
                    quiz.options.len()
                ));
            }
            fixture.push(FixtureQuiz {
                question: quiz.question,
                options: quiz.options,
            });
        }

        Ok(Self {
            fixture: Some(fixture),
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_rejects_underspecified_quizzes() {
        let raw = RawConfig {
            quizzes: vec![RawQuiz {
                question: "only one option".into(),
                options: vec!["a".into()],
            }],
        };
        assert!(AppConfig::try_from(raw).is_err());
    }

    #[test]
    fn fixture_entities_are_positioned_in_file_order() {
        let raw = RawConfig {
            quizzes: vec![
                RawQuiz {
                    question: "first".into(),
                    options: vec!["a".into(), "b".into()],
                },
                RawQuiz {
                    question: "second".into(),
                    options: vec!["c".into(), "d".into()],
                },
            ],
        };
        let config = AppConfig::try_from(raw).unwrap();
        let entities = config.fixture_entities().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].position, 0);
        assert_eq!(entities[1].question, "second");
    }

    #[test]
    fn default_config_has_no_fixture() {
        assert!(AppConfig::default().fixture_entities().is_none());
    }
}

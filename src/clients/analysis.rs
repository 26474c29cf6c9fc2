//! Client for the remote game-theory analysis service.
//!
//! The service owns every bit of game-theoretic computation. This client
//! only posts a FEN and passes the response through.

use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::AnalysisError;

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMove {
    pub san: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Rows are the current player's top moves, columns the opponent's replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffMatrix {
    #[serde(default, deserialize_with = "null_as_default")]
    pub row_labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub col_labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matrix: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default)]
    pub best_move: Option<BestMove>,
    #[serde(default)]
    pub payoff_matrix: Option<PayoffMatrix>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dominated_moves: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dominated_rows: Vec<usize>,
    #[serde(default)]
    pub turn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_over: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub checkmate: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub draw: bool,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub current_player_perspective: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinProbability {
    pub win_probability: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mock: bool,
}

impl WinProbability {
    /// Neutral estimate used whenever the ML endpoint cannot answer.
    pub fn unavailable() -> Self {
        WinProbability {
            win_probability: 0.5,
            message: "ML service unavailable".to_string(),
            mock: true,
        }
    }

    /// Local verdict for an analysis that already reports a finished game.
    fn for_finished_game(analysis: &Analysis) -> Self {
        match (analysis.checkmate, analysis.winner.as_deref()) {
            (true, Some(winner)) => {
                let (name, probability) = if winner == "w" {
                    ("White", 1.0)
                } else {
                    ("Black", 0.0)
                };
                WinProbability {
                    win_probability: probability,
                    message: format!("{} has a 100% chance of winning (Checkmate).", name),
                    mock: false,
                }
            }
            _ if analysis.draw => WinProbability {
                win_probability: 0.5,
                message: "Game Over: Draw.".to_string(),
                mock: false,
            },
            _ => WinProbability {
                win_probability: 0.5,
                message: "—".to_string(),
                mock: true,
            },
        }
    }
}

/// Everything the dashboard shows for one analysed position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub fen: String,
    pub analysis: Analysis,
    pub win_probability: WinProbability,
}

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent("ChessDss/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Best move, payoff matrix and dominance for `fen`.
    pub async fn analyze(&self, fen: &str) -> Result<Analysis, AnalysisError> {
        let resp = self
            .client
            .post(format!("{}/api/analyze", self.base_url))
            .json(&json!({ "fen": fen }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AnalysisError::Status(resp.status()));
        }
        Ok(resp.json::<Analysis>().await?)
    }

    /// Win probability for `fen`. Never fails: any error yields
    /// [`WinProbability::unavailable`].
    pub async fn win_probability(&self, fen: &str) -> WinProbability {
        match self.fetch_win_probability(fen).await {
            Ok(prob) => prob,
            Err(e) => {
                warn!("Win probability unavailable: {}", e);
                WinProbability::unavailable()
            }
        }
    }

    async fn fetch_win_probability(&self, fen: &str) -> Result<WinProbability, AnalysisError> {
        let resp = self
            .client
            .post(format!("{}/api/win-probability", self.base_url))
            .json(&json!({ "fen": fen }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AnalysisError::Status(resp.status()));
        }
        Ok(resp.json::<WinProbability>().await?)
    }

    /// Run the analysis and attach a win probability. A finished game gets
    /// its verdict locally instead of a second request.
    pub async fn report(&self, fen: String) -> Result<AnalysisReport, AnalysisError> {
        let analysis = self.analyze(&fen).await?;
        let win_probability = if analysis.game_over {
            WinProbability::for_finished_game(&analysis)
        } else {
            self.win_probability(&fen).await
        };
        debug!("Analysis complete for {}", fen);

        Ok(AnalysisReport {
            fen,
            analysis,
            win_probability,
        })
    }
}

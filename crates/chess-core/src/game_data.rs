use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2"
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub date: Option<String>,
    pub end_time: Option<String>,
    pub eco: Option<String>,
    pub eco_url: Option<String>,
    pub opening: Option<String>,
    pub link: Option<String>,
}

impl GameMetadata {
    /// Human-readable opening name: the `Opening` tag, else the slug of the
    /// `ECOUrl` tag, else the bare ECO code.
    pub fn opening_name(&self) -> String {
        if let Some(name) = self.opening.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(slug) = self
            .eco_url
            .as_deref()
            .and_then(|url| url.trim_end_matches('/').rsplit('/').next())
            .filter(|s| !s.is_empty())
        {
            return slug.replace('-', " ");
        }
        self.eco.clone().unwrap_or_else(|| "Unknown".to_string())
    }

    /// Sort key for "most recent first" ordering (`Date` then `EndTime`).
    pub fn played_at(&self) -> (String, String) {
        (
            self.date.clone().unwrap_or_default(),
            self.end_time.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
    pub pgn: String,
}

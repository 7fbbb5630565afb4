use crate::core::config::Config;
use crate::core::state::{
    CharacterProfile, Risk, Role, SuggestedActor, UNKNOWN_AGE, UNKNOWN_TEXT,
};
use crate::utils::normalize::normalize;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;
use url::Url;

const RECENT_WORKS_LIMIT: usize = 3;

// Lowercase fragments in press text that flag a casting risk.
const CONTROVERSY_KEYWORDS: &[&str] = &[
    "controvers",
    "scandal",
    "lawsuit",
    "arrest",
    "allegation",
    "accused",
    "boycott",
    "backlash",
    "misconduct",
    "indict",
];

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SceneRequest {
    pub user_email: String,
    pub project_id: String,
    pub scene_id: String,
    pub force: bool,
}

/// The per-scene analysis service.
#[async_trait]
pub trait SceneAnalyzer: Send + Sync + Debug {
    /// Returns the characters found in one scene. Any transport, status or
    /// payload problem is an error; so is cancellation through `cancel`.
    async fn analyze(
        &self,
        request: &SceneRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<CharacterItem>>;
}

pub fn create_analyzer(config: &Config) -> Result<Box<dyn SceneAnalyzer>> {
    Ok(Box::new(HttpSceneAnalyzer::new(
        &config.analysis.base_url,
        &config.analysis.endpoint,
    )?))
}

// --- Wire schema ---

#[derive(Deserialize, Debug)]
struct AnalysisEnvelope {
    #[serde(default)]
    ok: bool,
    characters: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CharacterItem {
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub estimated_age: Option<f64>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub personality: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub suggested_actor: Option<SuggestedActorItem>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SuggestedActorItem {
    pub actor_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub movie_personality: Option<Vec<String>>,
    #[serde(default)]
    pub matching_traits: Option<Vec<String>>,
    #[serde(default)]
    pub matching_traits_count: Option<f64>,
    #[serde(default)]
    pub recent_propaganda: Option<String>,
    #[serde(default)]
    pub average_amount_charged_to_film: Option<f64>,
    #[serde(default)]
    pub movies_played_in: Option<Vec<String>>,
}

/// Parses a response body, rejecting `ok: false` and a missing character list.
///
/// Items that do not fit the character schema are skipped one by one, so a
/// single bad entry never costs the rest of the scene.
pub fn parse_envelope(body: &str) -> Result<Vec<CharacterItem>> {
    let envelope: AnalysisEnvelope =
        serde_json::from_str(body).context("Failed to parse scene analysis response")?;

    if !envelope.ok {
        return Err(anyhow!("Scene analysis reported ok: false"));
    }
    let raw = envelope
        .characters
        .ok_or_else(|| anyhow!("Scene analysis response has no characters"))?;

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<CharacterItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed character #{} in scene analysis: {}", i, e);
                None
            }
        })
        .collect())
}

// --- Adapter ---

/// Turns one wire item into a profile for scene `ordinal`, filling every
/// missing attribute with its placeholder. Names that normalize to nothing
/// yield `None`.
pub fn to_profile(item: CharacterItem, ordinal: u32) -> Option<CharacterProfile> {
    let name = item.name.trim().to_string();
    let key = normalize(&name);
    if key.is_empty() {
        debug!("Skipping character with unusable name {:?}", item.name);
        return None;
    }

    let mut profile = CharacterProfile::placeholder(key, name);
    profile.role = role_from_level(item.level.as_deref());
    profile.scenes.insert(ordinal);
    profile.age = item.estimated_age.map(to_age).unwrap_or(UNKNOWN_AGE);
    profile.race = text_or_unknown(item.race);
    profile.gender = text_or_unknown(item.gender);
    profile.description = text_or_unknown(item.description);
    profile.personality = clean_list(item.personality).into_iter().collect();
    profile.suggested_actor = item.suggested_actor.and_then(to_suggested_actor);
    Some(profile)
}

fn role_from_level(level: Option<&str>) -> Role {
    match level.map(str::trim) {
        Some(level) if level.eq_ignore_ascii_case("main") => Role::Lead,
        _ => Role::Supporting,
    }
}

fn to_age(raw: f64) -> u32 {
    if raw.is_finite() && raw > 0.0 {
        raw.round().min(u32::MAX as f64) as u32
    } else {
        UNKNOWN_AGE
    }
}

fn to_count(raw: f64) -> Option<u32> {
    if raw.is_finite() && raw >= 0.0 {
        Some(raw.round().min(u32::MAX as f64) as u32)
    } else {
        None
    }
}

fn text_or_unknown(value: Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN_TEXT.to_string(),
    }
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn to_suggested_actor(item: SuggestedActorItem) -> Option<SuggestedActor> {
    let name = item.actor_name.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let note = item
        .recent_propaganda
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let matching_traits = clean_list(item.matching_traits);
    let movies_played_in = clean_list(item.movies_played_in);
    let match_count = item
        .matching_traits_count
        .and_then(to_count)
        .unwrap_or(matching_traits.len() as u32);

    let reason = if matching_traits.is_empty() {
        "Suggested by scene analysis".to_string()
    } else {
        format!(
            "Shares {} traits: {}",
            matching_traits.len(),
            matching_traits.join(", ")
        )
    };

    Some(SuggestedActor {
        name,
        avatar_url: item
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
        risk: assess_risk(note.as_deref()),
        note,
        reason,
        available: true,
        fee: item
            .average_amount_charged_to_film
            .filter(|f| f.is_finite() && *f > 0.0)
            .unwrap_or(0.0),
        age: UNKNOWN_AGE,
        recent_works: movies_played_in.iter().take(RECENT_WORKS_LIMIT).cloned().collect(),
        match_count,
        matching_traits,
        movie_personality: clean_list(item.movie_personality),
        movies_played_in,
    })
}

/// Medium when the press text mentions anything controversial, else Low.
pub fn assess_risk(signal: Option<&str>) -> Risk {
    let Some(signal) = signal else {
        return Risk::Low;
    };
    let signal = signal.to_lowercase();
    if CONTROVERSY_KEYWORDS.iter().any(|k| signal.contains(k)) {
        Risk::Medium
    } else {
        Risk::Low
    }
}

// --- HTTP ---

#[derive(Debug)]
pub struct HttpSceneAnalyzer {
    url: Url,
    client: reqwest::Client,
}

impl HttpSceneAnalyzer {
    pub fn new(base_url: &str, endpoint: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid analysis base_url: {}", base_url))?;
        let url = base
            .join(endpoint)
            .with_context(|| format!("Invalid analysis endpoint: {}", endpoint))?;

        Ok(Self {
            url,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, request: &SceneRequest) -> Result<Vec<CharacterItem>> {
        let resp = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .with_context(|| format!("Scene analysis request failed for {}", request.scene_id))?;

        let status = resp.status();
        let body = resp.text().await.with_context(|| {
            format!("Failed to read scene analysis response for {}", request.scene_id)
        })?;
        if !status.is_success() {
            return Err(anyhow!("Scene analysis API error ({}): {}", status, body));
        }

        parse_envelope(&body)
    }
}

#[async_trait]
impl SceneAnalyzer for HttpSceneAnalyzer {
    async fn analyze(
        &self,
        request: &SceneRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<CharacterItem>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(anyhow!("Scene analysis for {} cancelled", request.scene_id)),
            result = self.send(request) => result,
        }
    }
}

//! JSON entry points
//!
//! String in, string out, for hosts that only speak JSON. Errors come back
//! as plain messages.

use serde::{Deserialize, Serialize};

use crate::codec::{expand, CompressedState};
use crate::config::DrawConfig;
use crate::invariants::check_matrix;
use crate::roster::{Roster, TeamRecord};
use crate::session::{DrawResult, DrawSession};
use crate::SCHEMA_VERSION;

#[derive(Debug, Clone, Deserialize)]
pub struct DrawRequest {
    pub schema_version: u8,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub config: Option<DrawConfig>,
    /// Custom roster; the embedded 2024/25 roster when absent.
    #[serde(default)]
    pub teams: Option<Vec<TeamRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawResponse {
    pub schema_version: u8,
    #[serde(flatten)]
    pub result: DrawResult,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub schema_version: u8,
    pub fixtures: usize,
    pub complete: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

fn load_roster(teams: Option<Vec<TeamRecord>>) -> Result<Roster, String> {
    match teams {
        Some(records) => Roster::from_records(records),
        None => Roster::ucl_2024(),
    }
    .map_err(|e| format!("Invalid roster: {}", e))
}

/// Runs a whole draw and returns the final state and fixture list.
pub fn run_draw_json(request_json: &str) -> Result<String, String> {
    let request: DrawRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid JSON request: {}", e))?;
    if request.schema_version != SCHEMA_VERSION {
        return Err(format!("Unsupported schema version: {}", request.schema_version));
    }

    let mut config = request.config.unwrap_or_default();
    config.validate().map_err(|e| format!("Invalid config: {}", e))?;
    if request.seed.is_some() {
        config.seed = request.seed;
    }
    let roster = load_roster(request.teams)?;

    let mut session = DrawSession::new(roster, config);
    let result = session.run_to_completion().map_err(|e| format!("Draw failed: {}", e))?;
    let response = DrawResponse {
        schema_version: SCHEMA_VERSION,
        result,
        log: session.decision_log().lines(session.roster()),
    };
    serde_json::to_string(&response).map_err(|e| format!("Failed to serialize response: {}", e))
}

/// Decodes a dashed state string against the embedded roster and checks it.
pub fn verify_state_json(state: &str) -> Result<String, String> {
    let roster = load_roster(None)?;
    let state: CompressedState = state.parse().map_err(|e| format!("Invalid state: {}", e))?;
    let matrix = expand(&roster, &state).map_err(|e| format!("Invalid state: {}", e))?;
    let violation = check_matrix(&roster, &matrix).err().map(|v| v.to_string());

    let response = VerifyResponse {
        schema_version: SCHEMA_VERSION,
        fixtures: state.len(),
        complete: matrix.is_complete(),
        valid: violation.is_none(),
        violation,
    };
    serde_json::to_string(&response).map_err(|e| format!("Failed to serialize response: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_run_draw_json() {
        let request = json!({ "schema_version": 1, "seed": 42 });
        let response = run_draw_json(&request.to_string()).unwrap();
        let parsed: Value = serde_json::from_str(&response).unwrap();

        assert_eq!(parsed["schema_version"], 1);
        assert_eq!(parsed["seed"], 42);
        assert_eq!(parsed["fixtures"].as_array().unwrap().len(), 144);
        assert_eq!(parsed["reveal_order"].as_array().unwrap().len(), 36);
    }

    #[test]
    fn test_same_seed_same_response() {
        let request = json!({ "schema_version": 1, "seed": 5 }).to_string();
        assert_eq!(run_draw_json(&request).unwrap(), run_draw_json(&request).unwrap());
    }

    #[test]
    fn test_rejects_bad_requests() {
        let err = run_draw_json(r#"{"schema_version": 2}"#).unwrap_err();
        assert!(err.contains("Unsupported schema version"));

        assert!(run_draw_json("not json").unwrap_err().starts_with("Invalid JSON request"));

        let request = json!({ "schema_version": 1, "config": { "log_limit": 0 } });
        assert!(run_draw_json(&request.to_string()).unwrap_err().starts_with("Invalid config"));

        let request = json!({ "schema_version": 1, "teams": [] });
        assert!(run_draw_json(&request.to_string()).unwrap_err().starts_with("Invalid roster"));
    }

    #[test]
    fn test_verify_state_json() {
        let response = run_draw_json(&json!({ "schema_version": 1, "seed": 11 }).to_string()).unwrap();
        let parsed: Value = serde_json::from_str(&response).unwrap();
        let state = parsed["state"].as_str().unwrap();

        let verdict: Value = serde_json::from_str(&verify_state_json(state).unwrap()).unwrap();
        assert_eq!(verdict["valid"], true);
        assert_eq!(verdict["complete"], true);
        assert_eq!(verdict["fixtures"], 144);
        assert!(verdict.get("violation").is_none());

        // Real Madrid (ESP) vs Barcelona (ESP)
        let roster = Roster::ucl_2024().unwrap();
        let real = roster.find("Real Madrid").unwrap().0;
        let barca = roster.find("FC Barcelona").unwrap().0;
        let verdict = verify_state_json(&format!("{}-{}", real, barca));
        let verdict: Value = serde_json::from_str(&verdict.unwrap()).unwrap();
        assert_eq!(verdict["valid"], false);
        assert_eq!(verdict["complete"], false);

        assert!(verify_state_json("1-2-3").unwrap_err().starts_with("Invalid state"));
    }
}

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Account lookup: POST /v1/projects/{project_id}/accounts:lookup
//
// Success with a match:
//   { "kind": "identitytoolkit#GetAccountInfoResponse", "users": [ { "localId": "..." } ] }
//
// Success without a match omits `users` entirely:
//   { "kind": "identitytoolkit#GetAccountInfoResponse" }
//
// Failure carries a Google API error envelope:
//   { "error": { "code": 400, "message": "USER_NOT_FOUND", "status": "INVALID_ARGUMENT" } }
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest<'a> {
    pub local_id: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl LookupResponse {
    pub fn contains(&self, uid: &str) -> bool {
        self.users.iter().any(|u| u.local_id == uid)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub local_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// The provider reports a missing identity as an error rather than an
    /// empty result on some paths.
    pub fn is_user_not_found(&self) -> bool {
        self.message.starts_with("USER_NOT_FOUND")
    }
}

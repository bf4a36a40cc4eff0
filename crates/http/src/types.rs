//! Wire types exchanged with the authentication backend

use serde::{Deserialize, Serialize};

/// Body of a successful token refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_response_uses_camel_case() {
        let body = json!({ "accessToken": "abc.def.ghi", "user": { "id": 1 } });
        let response: TokenResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.access_token, "abc.def.ghi");

        let err = serde_json::from_value::<TokenResponse>(json!({ "access_token": "x" }));
        assert!(err.is_err());
    }
}

// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! API URL construction.

/// Path prefix of every v3 endpoint.
pub const API_PREFIX: &str = "api/v3";

/// Strip surrounding slashes and spaces so `"/envs/ "` and `"envs"` address the same endpoint.
pub fn normalize_path(path: &str) -> String {
    path.trim_matches(|c| c == '/' || c == ' ')
        .split('/')
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the full endpoint URL. Query pairs keep their order and are percent-encoded.
pub fn api_url(hostname: &str, path: &str, query: &[(&str, &str)]) -> String {
    let base = format!("https://{}/{}/{}", hostname, API_PREFIX, normalize_path(path));
    if query.is_empty() {
        return base;
    }

    let query_string = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, query_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/envs/"), "envs");
        assert_eq!(normalize_path(" /envs/actions/suspend "), "envs/actions/suspend");
        assert_eq!(normalize_path("class/abc"), "class/abc");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_api_url_without_query() {
        assert_eq!(
            api_url("use.cloudshare.com", "/envs/", &[]),
            "https://use.cloudshare.com/api/v3/envs"
        );
    }

    #[test]
    fn test_api_url_with_query() {
        assert_eq!(
            api_url("h", "envs/actions/getextended", &[("envId", "EN123")]),
            "https://h/api/v3/envs/actions/getextended?envId=EN123"
        );
    }

    #[test]
    fn test_api_url_encodes_query() {
        assert_eq!(
            api_url("h", "envs/actions/create", &[("name", "my env"), ("a&b", "c=d")]),
            "https://h/api/v3/envs/actions/create?name=my%20env&a%26b=c%3Dd"
        );
    }
}

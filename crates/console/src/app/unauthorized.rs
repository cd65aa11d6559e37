//! The `/unauthorized` view: URL encoding of the role-denial redirect and the
//! view model built back from it.

use hafez_auth::{AccessExplanation, Principal, UNAUTHORIZED_PATH, UnauthorizedQuery, UnauthorizedRedirect};
use serde::Serialize;
use url::Url;
use url::form_urlencoded;

/// Base used to resolve console-relative URLs.
const CONSOLE_ORIGIN: &str = "http://console.local/";

/// Where "home" points from the unauthorized view.
pub const HOME_URL: &str = "/";

/// Resolve a console-relative URL (path, query, fragment).
pub fn resolve(url: &str) -> Option<Url> {
    Url::parse(CONSOLE_ORIGIN).ok()?.join(url).ok()
}

/// `/unauthorized?returnUrl=…&reason=unauthorized&requiredRoles=…`
pub fn redirect_url(redirect: &UnauthorizedRedirect) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(redirect.query.pairs())
        .finish();
    format!("{}?{}", redirect.path, query)
}

/// Read the redirect query back from an `/unauthorized` URL.
///
/// Missing parameters read as empty, as the view treats them.
pub fn parse_query(url: &str) -> Option<UnauthorizedQuery> {
    let url = resolve(url)?;
    if url.path() != UNAUTHORIZED_PATH {
        return None;
    }

    let mut query = UnauthorizedQuery {
        return_url: String::new(),
        reason: String::new(),
        required_roles: String::new(),
    };
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "returnUrl" => query.return_url = value.into_owned(),
            "reason" => query.reason = value.into_owned(),
            "requiredRoles" => query.required_roles = value.into_owned(),
            _ => {}
        }
    }
    Some(query)
}

/// What the unauthorized view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnauthorizedView {
    pub attempted_url: String,
    pub required_roles: Vec<String>,
    pub user_roles: Vec<String>,

    /// Why the attempted route was denied, when it still resolves to a route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<AccessExplanation>,
}

impl UnauthorizedView {
    pub fn from_url(url: &str, principal: &Principal) -> Option<Self> {
        let query = parse_query(url)?;
        Some(Self {
            attempted_url: query.return_url.clone(),
            required_roles: query
                .required_role_list()
                .into_iter()
                .map(str::to_string)
                .collect(),
            user_roles: principal.role_names(),
            explanation: None,
        })
    }

    pub fn with_explanation(mut self, explanation: AccessExplanation) -> Self {
        self.explanation = Some(explanation);
        self
    }

    pub fn home_url(&self) -> &'static str {
        HOME_URL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hafez_auth::roles::patterns;

    #[test]
    fn redirect_url_encodes_query() {
        let redirect = UnauthorizedRedirect::new(
            "/orders?page=2",
            &patterns(&["sales", "Sales"]),
        );
        assert_eq!(
            redirect_url(&redirect),
            "/unauthorized?returnUrl=%2Forders%3Fpage%3D2&reason=unauthorized&requiredRoles=sales%2CSales"
        );
    }

    #[test]
    fn query_survives_the_url() {
        let redirect = UnauthorizedRedirect::new(
            "/maintenance-requests/scheduled",
            &patterns(&["maintenance", "Maintenance", "technician"]),
        );
        let parsed = parse_query(&redirect_url(&redirect)).unwrap();
        assert_eq!(parsed, redirect.query);
    }

    #[test]
    fn other_paths_are_not_unauthorized_views() {
        assert_eq!(parse_query("/orders?returnUrl=x"), None);
    }

    #[test]
    fn view_splits_required_roles() {
        let principal = Principal::with_roles(["Technician"]);
        let view = UnauthorizedView::from_url(
            "/unauthorized?returnUrl=%2Forders&reason=unauthorized&requiredRoles=sales%2CSales",
            &principal,
        )
        .unwrap();

        assert_eq!(view.attempted_url, "/orders");
        assert_eq!(view.required_roles, vec!["sales", "Sales"]);
        assert_eq!(view.user_roles, vec!["Technician"]);
        assert_eq!(view.home_url(), "/");
    }

    #[test]
    fn view_tolerates_missing_parameters() {
        let view = UnauthorizedView::from_url("/unauthorized", &Principal::anonymous()).unwrap();
        assert!(view.attempted_url.is_empty());
        assert!(view.required_roles.is_empty());
        assert!(view.user_roles.is_empty());
        assert!(view.explanation.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("explanation").is_none());
    }
}

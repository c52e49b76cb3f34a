//! Request-time access decision.
//!
//! The gate is a pure function of `(path, query, claim)` over a read-only
//! [`RoutePolicy`] and [`GatePaths`]. Resolving the claim from a session and
//! applying the resulting redirect are the caller's job.

use super::policy::RoutePolicy;
use super::role::Role;
use serde::{Deserialize, Serialize};

/// Query parameter carrying the originally requested location to sign-in.
pub const RETURN_TARGET_PARAM: &str = "from";

/// Identity and role established by a validated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    pub user_id: String,
    pub role: Role,
}

/// Well-known locations the gate redirects to or exempts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatePaths {
    #[serde(default = "default_sign_in")]
    pub sign_in: String,
    /// Paths under this prefix belong to the sign-in flow.
    #[serde(default = "default_auth_prefix")]
    pub auth_prefix: String,
    #[serde(default = "default_unauthorized")]
    pub unauthorized: String,
    /// Where signed-in users land by default.
    #[serde(default = "default_landing")]
    pub landing: String,
    /// Paths under these prefixes bypass the gate entirely.
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
}

fn default_sign_in() -> String {
    "/auth/signin".to_string()
}

fn default_auth_prefix() -> String {
    "/auth".to_string()
}

fn default_unauthorized() -> String {
    "/unauthorized".to_string()
}

fn default_landing() -> String {
    "/dashboard".to_string()
}

fn default_public_prefixes() -> Vec<String> {
    ["/health", "/metrics", "/static", "/api/auth"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for GatePaths {
    fn default() -> Self {
        Self {
            sign_in: default_sign_in(),
            auth_prefix: default_auth_prefix(),
            unauthorized: default_unauthorized(),
            landing: default_landing(),
            public_prefixes: default_public_prefixes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathConfigError {
    #[error("path '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("sign-in path '{sign_in}' is outside the auth-flow prefix '{auth_prefix}'")]
    SignInOutsideAuthFlow {
        sign_in: String,
        auth_prefix: String,
    },

    #[error("{name} path '{path}' lies inside the auth-flow prefix")]
    InsideAuthFlow { name: &'static str, path: String },

    #[error("public prefix '{0}' overlaps the auth-flow prefix")]
    PublicAuthFlow(String),

    #[error("unauthorized page itself requires role '{0}'")]
    UnauthorizedRequiresRole(Role),
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Path is exempt from gating.
    Public,
    Allow,
    SignIn { location: String },
    Unauthorized { location: String },
    Landing { location: String },
}

impl Decision {
    pub fn location(&self) -> Option<&str> {
        match self {
            Decision::Public | Decision::Allow => None,
            Decision::SignIn { location }
            | Decision::Unauthorized { location }
            | Decision::Landing { location } => Some(location),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Public | Decision::Allow)
    }

    /// Stable label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Public => "public",
            Decision::Allow => "allow",
            Decision::SignIn { .. } => "sign_in",
            Decision::Unauthorized { .. } => "unauthorized",
            Decision::Landing { .. } => "landing",
        }
    }
}

/// `path` equals `prefix` or continues it with a new segment.
fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: RoutePolicy,
    paths: GatePaths,
}

impl AccessGate {
    pub fn new(policy: RoutePolicy, paths: GatePaths) -> Result<Self, PathConfigError> {
        let named = [
            ("sign-in", &paths.sign_in),
            ("auth-flow", &paths.auth_prefix),
            ("unauthorized", &paths.unauthorized),
            ("landing", &paths.landing),
        ];
        for (_, path) in named {
            if !path.starts_with('/') {
                return Err(PathConfigError::NotAbsolute(path.clone()));
            }
        }
        if let Some(prefix) = paths.public_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(PathConfigError::NotAbsolute(prefix.clone()));
        }

        if !is_under(&paths.sign_in, &paths.auth_prefix) {
            return Err(PathConfigError::SignInOutsideAuthFlow {
                sign_in: paths.sign_in.clone(),
                auth_prefix: paths.auth_prefix.clone(),
            });
        }
        for (name, path) in [("landing", &paths.landing), ("unauthorized", &paths.unauthorized)] {
            if is_under(path, &paths.auth_prefix) {
                return Err(PathConfigError::InsideAuthFlow {
                    name,
                    path: path.clone(),
                });
            }
        }
        if let Some(prefix) = paths.public_prefixes.iter().find(|p| {
            is_under(&paths.auth_prefix, p) || is_under(p, &paths.auth_prefix)
        }) {
            return Err(PathConfigError::PublicAuthFlow(prefix.clone()));
        }

        if let Some(role) = policy.required_role(&paths.unauthorized) {
            if role > Role::Viewer {
                return Err(PathConfigError::UnauthorizedRequiresRole(role));
            }
        }

        Ok(Self { policy, paths })
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub fn paths(&self) -> &GatePaths {
        &self.paths
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.paths
            .public_prefixes
            .iter()
            .any(|prefix| is_under(path, prefix))
    }

    pub fn is_auth_flow(&self, path: &str) -> bool {
        is_under(path, &self.paths.auth_prefix)
    }

    /// Decide what happens to a request for `path` (plus optional raw
    /// `query`, without the leading `?`) given the resolved claim.
    pub fn decide(&self, path: &str, query: Option<&str>, claim: Option<&SessionClaim>) -> Decision {
        if self.is_public(path) {
            return Decision::Public;
        }

        if self.is_auth_flow(path) {
            return match claim {
                Some(_) => Decision::Landing {
                    location: self.paths.landing.clone(),
                },
                None => Decision::Allow,
            };
        }

        let Some(claim) = claim else {
            return Decision::SignIn {
                location: self.sign_in_location(path, query),
            };
        };

        match self.policy.required_role(path) {
            Some(required) if !claim.role.satisfies(required) => Decision::Unauthorized {
                location: self.paths.unauthorized.clone(),
            },
            _ => Decision::Allow,
        }
    }

    /// Sign-in location carrying `path[?query]` as the return target.
    pub fn sign_in_location(&self, path: &str, query: Option<&str>) -> String {
        let target = match query {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        format!(
            "{}?{}={}",
            self.paths.sign_in,
            RETURN_TARGET_PARAM,
            urlencoding::encode(&target)
        )
    }

    /// Accept a return target only if it is a same-origin path outside the
    /// sign-in flow; otherwise fall back to the landing path.
    pub fn sanitize_return_target(&self, candidate: Option<&str>) -> String {
        let acceptable = |target: &str| {
            target.starts_with('/')
                && !target.starts_with("//")
                && !target.contains('\\')
                && !target.chars().any(char::is_control)
                && !self.is_auth_flow(target.split('?').next().unwrap_or(target))
        };

        match candidate {
            Some(target) if acceptable(target) => target.to_string(),
            _ => self.paths.landing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::policy::PolicyEntry;

    fn gate() -> AccessGate {
        AccessGate::new(RoutePolicy::default(), GatePaths::default()).unwrap()
    }

    fn claim(role: Role) -> SessionClaim {
        SessionClaim {
            user_id: "user-1".to_string(),
            role,
        }
    }

    #[test]
    fn unauthenticated_products_redirects_to_sign_in() {
        assert_eq!(
            gate().decide("/products", None, None),
            Decision::SignIn {
                location: "/auth/signin?from=%2Fproducts".to_string()
            }
        );
    }

    #[test]
    fn staff_on_settings_is_unauthorized() {
        assert_eq!(
            gate().decide("/settings", None, Some(&claim(Role::Staff))),
            Decision::Unauthorized {
                location: "/unauthorized".to_string()
            }
        );
    }

    #[test]
    fn viewer_on_dashboard_is_allowed() {
        assert_eq!(
            gate().decide("/dashboard", None, Some(&claim(Role::Viewer))),
            Decision::Allow
        );
    }

    #[test]
    fn signed_in_user_is_sent_away_from_sign_in() {
        assert_eq!(
            gate().decide("/auth/signin", None, Some(&claim(Role::Admin))),
            Decision::Landing {
                location: "/dashboard".to_string()
            }
        );
    }

    #[test]
    fn auth_flow_is_open_without_claim() {
        let gate = gate();
        assert_eq!(gate.decide("/auth/signin", None, None), Decision::Allow);
        assert_eq!(gate.decide("/auth/error", None, None), Decision::Allow);
        for role in Role::ALL {
            assert!(!gate.decide("/auth/error", None, Some(&claim(role))).is_allowed());
        }
    }

    #[test]
    fn role_below_requirement_is_rejected_at_or_above_is_allowed() {
        let gate = gate();
        for entry in gate.policy().entries().to_vec() {
            let path = format!("{}/detail", entry.prefix);
            for role in Role::ALL {
                let decision = gate.decide(&path, None, Some(&claim(role)));
                if role >= entry.role {
                    assert_eq!(decision, Decision::Allow, "{role} on {path}");
                } else {
                    assert_eq!(decision.outcome(), "unauthorized", "{role} on {path}");
                }
            }
        }
    }

    #[test]
    fn return_target_round_trips_path_and_query() {
        let gate = gate();
        let cases = [
            ("/products", None),
            ("/products/7", Some("tab=history&page=2")),
            ("/deliveries", Some("status=%E9%85%8D%E9%80%81%E4%B8%AD")),
            ("/reports/a b", Some("")),
        ];

        for (path, query) in cases {
            let decision = gate.decide(path, query, None);
            let location = decision.location().unwrap();
            let encoded = location.strip_prefix("/auth/signin?from=").unwrap();
            assert!(!encoded.contains('/') && !encoded.contains('?') && !encoded.contains('&'));

            let expected = match query {
                Some(q) => format!("{path}?{q}"),
                None => path.to_string(),
            };
            assert_eq!(urlencoding::decode(encoded).unwrap(), expected);
        }
    }

    #[test]
    fn decisions_are_repeatable() {
        let gate = gate();
        let staff = claim(Role::Staff);
        for (path, claim) in [
            ("/settings", Some(&staff)),
            ("/products", None),
            ("/auth/signin", Some(&staff)),
        ] {
            assert_eq!(gate.decide(path, None, claim), gate.decide(path, None, claim));
        }
    }

    #[test]
    fn paths_without_policy_only_need_a_session() {
        let gate = gate();
        assert_eq!(
            gate.decide("/unauthorized", None, Some(&claim(Role::Viewer))),
            Decision::Allow
        );
        assert_eq!(gate.decide("/unauthorized", None, None).outcome(), "sign_in");
    }

    #[test]
    fn public_prefixes_bypass_the_gate() {
        let gate = gate();
        assert_eq!(gate.decide("/health", None, None), Decision::Public);
        assert_eq!(gate.decide("/api/auth/callback", Some("code=x"), None), Decision::Public);
        assert_eq!(gate.decide("/static/app.css", None, None), Decision::Public);
        assert_eq!(gate.decide("/healthz", None, None).outcome(), "sign_in");
    }

    #[test]
    fn auth_prefix_is_segment_matched() {
        let gate = gate();
        assert!(gate.is_auth_flow("/auth"));
        assert!(gate.is_auth_flow("/auth/signin"));
        assert!(!gate.is_auth_flow("/authors"));
    }

    #[test]
    fn rejects_sign_in_outside_auth_flow() {
        let paths = GatePaths {
            sign_in: "/login".to_string(),
            ..GatePaths::default()
        };
        assert!(matches!(
            AccessGate::new(RoutePolicy::default(), paths),
            Err(PathConfigError::SignInOutsideAuthFlow { .. })
        ));
    }

    #[test]
    fn rejects_landing_inside_auth_flow() {
        let paths = GatePaths {
            landing: "/auth/home".to_string(),
            ..GatePaths::default()
        };
        assert_eq!(
            AccessGate::new(RoutePolicy::default(), paths).unwrap_err(),
            PathConfigError::InsideAuthFlow {
                name: "landing",
                path: "/auth/home".to_string()
            }
        );
    }

    #[test]
    fn rejects_public_auth_flow() {
        let paths = GatePaths {
            public_prefixes: vec!["/auth".to_string()],
            ..GatePaths::default()
        };
        assert_eq!(
            AccessGate::new(RoutePolicy::default(), paths).unwrap_err(),
            PathConfigError::PublicAuthFlow("/auth".to_string())
        );
    }

    #[test]
    fn rejects_guarded_unauthorized_page() {
        let policy = RoutePolicy::new(vec![PolicyEntry::new("/unauthorized", Role::Staff)]).unwrap();
        assert_eq!(
            AccessGate::new(policy, GatePaths::default()).unwrap_err(),
            PathConfigError::UnauthorizedRequiresRole(Role::Staff)
        );
    }

    #[test]
    fn sanitizes_return_targets() {
        let gate = gate();
        assert_eq!(gate.sanitize_return_target(Some("/products?page=2")), "/products?page=2");
        assert_eq!(gate.sanitize_return_target(None), "/dashboard");
        assert_eq!(gate.sanitize_return_target(Some("https://evil.example")), "/dashboard");
        assert_eq!(gate.sanitize_return_target(Some("//evil.example")), "/dashboard");
        assert_eq!(gate.sanitize_return_target(Some("/\\evil.example")), "/dashboard");
        assert_eq!(gate.sanitize_return_target(Some("/auth/signin")), "/dashboard");
    }
}
